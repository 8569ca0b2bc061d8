//! The one remembered thing between runs: which song, where, and whether it was playing.

mod model;
mod store;

pub use model::SessionState;
pub use store::{SessionError, SessionStore};
