//! Play / pause / idle state machine over the current folder snapshot.

mod machine;
mod state;

pub use machine::{DEFAULT_VOLUME, Transport};
pub use state::{CurrentTrack, PlaybackState, PollStatus};
