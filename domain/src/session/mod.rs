//! Generation session domain.
//!
//! - [`entities::Message`]: a single message sent to the generation capability
//! - [`options::GenerationOptions`]: per-call model, temperature and output mode
//! - [`stream::StreamEvent`]: one event of a streamed completion

pub mod entities;
pub mod options;
pub mod stream;
