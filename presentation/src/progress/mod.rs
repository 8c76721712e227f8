//! Progress display while a round runs

pub mod reporter;
