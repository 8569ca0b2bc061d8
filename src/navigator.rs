//! Next / previous / shuffle over a folder snapshot.
//!
//! Folders are never played. `next` walks forward to the next audio entry and
//! wraps to the first one. `previous` makes a single hop back and, when that
//! lands on a folder (or there is nothing before), wraps to the last audio entry.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::library::TrackEntry;

/// Index of the first audio entry.
pub fn first_playable(entries: &[TrackEntry]) -> Option<usize> {
    entries.iter().position(TrackEntry::is_playable)
}

/// Index of the last audio entry.
pub fn last_playable(entries: &[TrackEntry]) -> Option<usize> {
    entries.iter().rposition(TrackEntry::is_playable)
}

/// The audio entry following `current`, wrapping to the first one.
///
/// With no current track this is the first audio entry. `None` only when
/// the folder has nothing playable.
pub fn next(current: Option<usize>, entries: &[TrackEntry]) -> Option<usize> {
    let Some(current) = current else {
        return first_playable(entries);
    };

    entries
        .iter()
        .enumerate()
        .skip(current + 1)
        .find(|(_, e)| e.is_playable())
        .map(|(i, _)| i)
        .or_else(|| first_playable(entries))
}

/// The entry just before `current`, or the last audio entry when that entry is
/// a folder or `current` is at the top.
///
/// With no current track there is nothing to go back to.
pub fn previous(current: Option<usize>, entries: &[TrackEntry]) -> Option<usize> {
    let current = current?;

    match current.checked_sub(1).and_then(|i| entries.get(i).map(|e| (i, e))) {
        Some((i, e)) if e.is_playable() => Some(i),
        _ => last_playable(entries),
    }
}

/// Shuffle audio entries among themselves; folders stay on top in their order.
pub fn shuffle<R: Rng + ?Sized>(entries: &[TrackEntry], rng: &mut R) -> Vec<TrackEntry> {
    let (mut shuffled, mut audio): (Vec<TrackEntry>, Vec<TrackEntry>) =
        entries.iter().cloned().partition(TrackEntry::is_folder);
    audio.shuffle(rng);
    shuffled.append(&mut audio);
    shuffled
}
