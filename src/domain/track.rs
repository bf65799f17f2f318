//! Track builder
//!
//! Splits a book selection into up to four ordered chapter sequences. Track
//! membership is fixed here and never re-evaluated by the scheduler.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::corpus::{Book, ChapterRef, PROVERBS, PSALMS};

/// One of the four independent chapter sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Old,
    Psalms,
    Proverbs,
    New,
}

impl TrackKind {
    /// Fixed draw order used by the scheduler
    pub const DRAW_ORDER: [TrackKind; 4] = [
        TrackKind::Old,
        TrackKind::Psalms,
        TrackKind::Proverbs,
        TrackKind::New,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Old => "old",
            TrackKind::Psalms => "psalms",
            TrackKind::Proverbs => "proverbs",
            TrackKind::New => "new",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four tracks built from a selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackSet {
    pub old: Vec<ChapterRef>,
    pub new: Vec<ChapterRef>,
    pub psalms: Vec<ChapterRef>,
    pub proverbs: Vec<ChapterRef>,
}

impl TrackSet {
    /// Expands books (already filtered, canonical order) into tracks
    pub fn build(books: &[Book], isolate_psalms: bool, isolate_proverbs: bool) -> Self {
        let mut tracks = Self::default();

        for book in books {
            let target = if isolate_psalms && book.name == PSALMS {
                &mut tracks.psalms
            } else if isolate_proverbs && book.name == PROVERBS {
                &mut tracks.proverbs
            } else if book.is_old_testament() {
                &mut tracks.old
            } else {
                &mut tracks.new
            };

            target.extend(book.chapters());
        }

        tracks
    }

    pub fn get(&self, kind: TrackKind) -> &[ChapterRef] {
        match kind {
            TrackKind::Old => &self.old,
            TrackKind::Psalms => &self.psalms,
            TrackKind::Proverbs => &self.proverbs,
            TrackKind::New => &self.new,
        }
    }

    /// Total chapters across all tracks
    pub fn len(&self) -> usize {
        TrackKind::DRAW_ORDER.iter().map(|k| self.get(*k).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::corpus::{Corpus, Selection};

    fn books(names: &[&str]) -> Vec<Book> {
        let selection = Selection::Books(names.iter().map(|s| s.to_string()).collect());
        Corpus::canonical().select(&selection).unwrap()
    }

    #[test]
    fn whole_corpus_without_isolation() {
        let all = Corpus::canonical().select(&Selection::All).unwrap();
        let tracks = TrackSet::build(&all, false, false);

        assert_eq!(tracks.old.len(), 929);
        assert_eq!(tracks.new.len(), 260);
        assert!(tracks.psalms.is_empty());
        assert!(tracks.proverbs.is_empty());
        assert_eq!(tracks.old[0].global_id, 1);
        assert_eq!(tracks.new[0].book, "Matthew");
    }

    #[test]
    fn isolation_moves_psalms_and_proverbs() {
        let tracks = TrackSet::build(&books(&["Job", "Psalms", "Proverbs", "Ecclesiastes"]), true, true);

        assert_eq!(tracks.psalms.len(), 150);
        assert_eq!(tracks.proverbs.len(), 31);
        assert_eq!(tracks.old.len(), 42 + 12);
        // Job then Ecclesiastes, canonical order kept
        assert_eq!(tracks.old[41].book, "Job");
        assert_eq!(tracks.old[42].book, "Ecclesiastes");
    }

    #[test]
    fn isolation_only_when_requested() {
        let tracks = TrackSet::build(&books(&["Psalms", "Proverbs"]), false, true);

        assert_eq!(tracks.old.len(), 150);
        assert!(tracks.psalms.is_empty());
        assert_eq!(tracks.proverbs.len(), 31);
    }

    #[test]
    fn ids_increase_within_each_track() {
        let all = Corpus::canonical().select(&Selection::All).unwrap();
        let tracks = TrackSet::build(&all, true, true);

        for kind in TrackKind::DRAW_ORDER {
            let track = tracks.get(kind);
            assert!(track.windows(2).all(|w| w[0].global_id < w[1].global_id));
        }
        assert_eq!(tracks.len(), 1189);
    }

    #[test]
    fn empty_selection_builds_empty_tracks() {
        let tracks = TrackSet::build(&[], true, true);
        assert!(tracks.is_empty());
    }
}
