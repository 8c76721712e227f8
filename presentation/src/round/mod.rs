//! Driving one round from the terminal

mod driver;

pub use driver::{RoundView, drive_round, print_outcome};
