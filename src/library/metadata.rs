use std::path::Path;
use std::time::Duration;

use lofty::prelude::*;

/// Tags and properties read from an audio file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<Duration>,
}

fn non_empty(v: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Read tags and duration from `path`. Unreadable or untagged files give empty tags.
pub fn probe(path: &Path) -> TrackTags {
    let mut tags = TrackTags::default();

    if let Ok(tagged) = lofty::read_from_path(path) {
        let duration = tagged.properties().duration();
        if !duration.is_zero() {
            tags.duration = Some(duration);
        }

        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            tags.title = non_empty(tag.title());
            tags.artist = non_empty(tag.artist());
            tags.album = non_empty(tag.album());
        }
    }

    tags
}
