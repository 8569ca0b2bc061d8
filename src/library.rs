//! Folder listing: the filesystem-backed playlist.
//!
//! A folder is listed non-recursively into a [`DirectorySnapshot`] of folders
//! followed by audio files. The snapshot is the only playlist the player has.

mod listing;
mod metadata;
mod model;

pub use listing::absolute_folder;
pub use metadata::{TrackTags, probe};
pub use model::*;
