//! Application module: the model the TUI draws and the runtime drives.

mod model;

pub use model::*;
