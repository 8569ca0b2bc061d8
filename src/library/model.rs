use std::path::{Path, PathBuf};

/// Whether a listed entry can be descended into or played.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Folder,
    Audio,
}

/// One row of a folder listing. Identity is `name`; the filesystem keeps it unique.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackEntry {
    /// File or folder name as shown to the user, extension included.
    pub name: String,
    /// Lowercased extension without the dot; empty for folders.
    pub extension: String,
    pub kind: EntryKind,
}

impl TrackEntry {
    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extension: String::new(),
            kind: EntryKind::Folder,
        }
    }

    pub fn audio(name: impl Into<String>) -> Self {
        let name = name.into();
        let extension = Path::new(&name)
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default();
        Self {
            name,
            extension,
            kind: EntryKind::Audio,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }

    pub fn is_playable(&self) -> bool {
        self.kind == EntryKind::Audio
    }
}

/// Raw result of listing a folder: names only, each group sorted ascending.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Listing {
    pub folders: Vec<String>,
    pub files: Vec<String>,
}

/// The ordered entries of one folder at a point in time.
///
/// Rebuilt wholesale on every navigation or refresh.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirectorySnapshot {
    pub dir: PathBuf,
    pub entries: Vec<TrackEntry>,
}

impl DirectorySnapshot {
    /// Folders first, then audio files, keeping the listing's order.
    pub fn from_listing(dir: impl Into<PathBuf>, listing: Listing) -> Self {
        let mut entries = Vec::with_capacity(listing.folders.len() + listing.files.len());
        entries.extend(listing.folders.into_iter().map(TrackEntry::folder));
        entries.extend(listing.files.into_iter().map(TrackEntry::audio));
        Self {
            dir: dir.into(),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrackEntry> {
        self.entries.get(index)
    }

    /// Index of the entry called `name`, if present.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    /// Absolute path of `entry` inside this snapshot's folder.
    pub fn path_of(&self, entry: &TrackEntry) -> PathBuf {
        self.dir.join(&entry.name)
    }

    pub fn has_playable(&self) -> bool {
        self.entries.iter().any(TrackEntry::is_playable)
    }
}
