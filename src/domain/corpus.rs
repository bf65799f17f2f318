//! Corpus index: the canonical ordered table of books and chapters
//!
//! Every chapter carries a global id (`start_id + chapter - 1`). The id is the
//! key used to fetch payloads from the content store, so ids are strictly
//! increasing in canonical order and never shared between chapters.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Books with an ordinal below this index belong to the Old Testament
pub const OLD_NEW_BOUNDARY: usize = 39;

/// Book whose chapters may be isolated into the psalms track
pub const PSALMS: &str = "Psalms";

/// Book whose chapters may be isolated into the proverbs track
pub const PROVERBS: &str = "Proverbs";

/// Canonical book order with chapter counts. Global ids start at 1 (Genesis 1).
const CANONICAL_BOOKS: &[(&str, u32)] = &[
    ("Genesis", 50),
    ("Exodus", 40),
    ("Leviticus", 27),
    ("Numbers", 36),
    ("Deuteronomy", 34),
    ("Joshua", 24),
    ("Judges", 21),
    ("Ruth", 4),
    ("1 Samuel", 31),
    ("2 Samuel", 24),
    ("1 Kings", 22),
    ("2 Kings", 25),
    ("1 Chronicles", 29),
    ("2 Chronicles", 36),
    ("Ezra", 10),
    ("Nehemiah", 13),
    ("Esther", 10),
    ("Job", 42),
    ("Psalms", 150),
    ("Proverbs", 31),
    ("Ecclesiastes", 12),
    ("Songs", 8),
    ("Isaiah", 66),
    ("Jeremiah", 52),
    ("Lamentations", 5),
    ("Ezekiel", 48),
    ("Daniel", 12),
    ("Hosea", 14),
    ("Joel", 3),
    ("Amos", 9),
    ("Obadiah", 1),
    ("Jonah", 4),
    ("Micah", 7),
    ("Nahum", 3),
    ("Habakkuk", 3),
    ("Zephaniah", 3),
    ("Haggai", 2),
    ("Zechariah", 14),
    ("Malachi", 4),
    ("Matthew", 28),
    ("Mark", 16),
    ("Luke", 24),
    ("John", 21),
    ("Acts", 28),
    ("Romans", 16),
    ("1 Corinthians", 16),
    ("2 Corinthians", 13),
    ("Galatians", 6),
    ("Ephesians", 6),
    ("Philippians", 4),
    ("Colossians", 4),
    ("1 Thessalonians", 5),
    ("2 Thessalonians", 3),
    ("1 Timothy", 6),
    ("2 Timothy", 4),
    ("Titus", 3),
    ("Philemon", 1),
    ("Hebrews", 13),
    ("James", 5),
    ("1 Peter", 5),
    ("2 Peter", 3),
    ("1 John", 5),
    ("2 John", 1),
    ("3 John", 1),
    ("Jude", 1),
    ("Revelation", 22),
];

#[derive(Debug, Error, PartialEq)]
pub enum CorpusError {
    #[error("Corpus index is empty")]
    Empty,

    #[error("Book '{0}' has no chapters")]
    NoChapters(String),

    #[error("Book '{name}' starts at id {start_id}, overlapping the previous book (next free id is {expected})")]
    OverlappingIds {
        name: String,
        start_id: u32,
        expected: u32,
    },

    #[error("Book '{name}' ids overflow: start {start_id} + {chapters} chapters exceeds {max}", max = u32::MAX)]
    IdOverflow {
        name: String,
        start_id: u32,
        chapters: u32,
    },

    #[error("Duplicate book name: {0}")]
    DuplicateBook(String),

    #[error("Unknown book: {0}")]
    UnknownBook(String),

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("Failed to parse corpus index: {0}")]
    Parse(String),

    #[error("Failed to read corpus index {path}: {message}")]
    Read { path: String, message: String },
}

/// A named group of consecutive chapters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub name: String,
    /// Position in canonical order
    pub ordinal: usize,
    /// Global id of chapter 1
    pub start_id: u32,
    pub chapter_count: u32,
}

impl Book {
    /// Returns true if this book sits before the Old/New boundary
    pub fn is_old_testament(&self) -> bool {
        self.ordinal < OLD_NEW_BOUNDARY
    }

    /// Returns the reference for a 1-based chapter number, if it exists
    pub fn chapter(&self, chapter: u32) -> Option<ChapterRef> {
        if chapter == 0 || chapter > self.chapter_count {
            return None;
        }

        Some(ChapterRef {
            book: self.name.clone(),
            chapter,
            global_id: self.start_id + chapter - 1,
        })
    }

    /// Iterates over every chapter of the book in order
    pub fn chapters(&self) -> impl Iterator<Item = ChapterRef> + '_ {
        (1..=self.chapter_count).map(move |chapter| ChapterRef {
            book: self.name.clone(),
            chapter,
            global_id: self.start_id + chapter - 1,
        })
    }

    /// Global id one past the last chapter
    fn end_id(&self) -> u32 {
        self.start_id.saturating_add(self.chapter_count)
    }
}

/// A single schedulable chapter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChapterRef {
    pub book: String,
    pub chapter: u32,
    pub global_id: u32,
}

impl fmt::Display for ChapterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.book, self.chapter)
    }
}

/// Entry format produced by the metadata extraction script
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexEntry {
    name: String,
    start_file: u32,
    chapters: u32,
}

/// The ordered book table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    books: Vec<Book>,
}

impl Corpus {
    /// Returns the built-in canonical table (66 books, ids 1..=1189)
    pub fn canonical() -> Self {
        let mut books = Vec::with_capacity(CANONICAL_BOOKS.len());
        let mut next_id = 1;

        for (ordinal, (name, chapter_count)) in CANONICAL_BOOKS.iter().enumerate() {
            books.push(Book {
                name: (*name).to_string(),
                ordinal,
                start_id: next_id,
                chapter_count: *chapter_count,
            });
            next_id += chapter_count;
        }

        Self { books }
    }

    /// Builds a corpus from `(name, start_id, chapter_count)` rows, validating ids
    pub fn from_entries(
        entries: impl IntoIterator<Item = (String, u32, u32)>,
    ) -> Result<Self, CorpusError> {
        let mut books: Vec<Book> = Vec::new();
        let mut seen = HashSet::new();

        for (ordinal, (name, start_id, chapter_count)) in entries.into_iter().enumerate() {
            if chapter_count == 0 {
                return Err(CorpusError::NoChapters(name));
            }

            if start_id.checked_add(chapter_count).is_none() {
                return Err(CorpusError::IdOverflow {
                    name,
                    start_id,
                    chapters: chapter_count,
                });
            }

            if !seen.insert(name.to_lowercase()) {
                return Err(CorpusError::DuplicateBook(name));
            }

            if let Some(prev) = books.last() {
                if start_id < prev.end_id() {
                    return Err(CorpusError::OverlappingIds {
                        name,
                        start_id,
                        expected: prev.end_id(),
                    });
                }
            }

            books.push(Book {
                name,
                ordinal,
                start_id,
                chapter_count,
            });
        }

        if books.is_empty() {
            return Err(CorpusError::Empty);
        }

        Ok(Self { books })
    }

    /// Parses the JSON index format: `[{"name", "startFile", "chapters"}]`
    pub fn from_json(json: &str) -> Result<Self, CorpusError> {
        let entries: Vec<IndexEntry> =
            serde_json::from_str(json).map_err(|e| CorpusError::Parse(e.to_string()))?;

        Self::from_entries(
            entries
                .into_iter()
                .map(|e| (e.name, e.start_file, e.chapters)),
        )
    }

    /// Loads a JSON index from disk
    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        let content = fs::read_to_string(path).map_err(|e| CorpusError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    /// Finds a book by name (case-insensitive)
    pub fn book(&self, name: &str) -> Option<&Book> {
        let name = name.trim();
        self.books.iter().find(|b| b.name.eq_ignore_ascii_case(name))
    }

    /// Total number of chapters across all books
    pub fn chapter_count(&self) -> u32 {
        self.books.iter().map(|b| b.chapter_count).sum()
    }

    /// Returns the selected books in canonical order
    pub fn select(&self, selection: &Selection) -> Result<Vec<Book>, CorpusError> {
        match selection {
            Selection::All => Ok(self.books.clone()),
            Selection::Books(names) => {
                let mut wanted = HashSet::new();
                for name in names {
                    let book = self
                        .book(name)
                        .ok_or_else(|| CorpusError::UnknownBook(name.clone()))?;
                    wanted.insert(book.ordinal);
                }

                Ok(self
                    .books
                    .iter()
                    .filter(|b| wanted.contains(&b.ordinal))
                    .cloned()
                    .collect())
            }
        }
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self::canonical()
    }
}

/// Which books feed the plan
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    /// Explicit book names; an empty list selects nothing
    Books(Vec<String>),
}

impl Selection {
    /// Builds a selection from explicit names plus presets.
    ///
    /// With neither names nor presets the whole corpus is selected.
    pub fn from_parts(books: &[String], presets: &[Preset]) -> Self {
        if books.is_empty() && presets.is_empty() {
            return Selection::All;
        }

        let mut names: Vec<String> = Vec::new();
        let extra = presets
            .iter()
            .flat_map(|p| p.books().iter().map(|b| b.to_string()));

        for name in books.iter().cloned().chain(extra) {
            if !names.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
                names.push(name);
            }
        }

        Selection::Books(names)
    }
}

/// Named groups of books for quick selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    Pentateuch,
    History,
    Wisdom,
    MajorProphets,
    MinorProphets,
    Gospels,
    Paul,
    GeneralEpistles,
}

impl Preset {
    pub const ALL: [Preset; 8] = [
        Preset::Pentateuch,
        Preset::History,
        Preset::Wisdom,
        Preset::MajorProphets,
        Preset::MinorProphets,
        Preset::Gospels,
        Preset::Paul,
        Preset::GeneralEpistles,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Pentateuch => "pentateuch",
            Preset::History => "history",
            Preset::Wisdom => "wisdom",
            Preset::MajorProphets => "major-prophets",
            Preset::MinorProphets => "minor-prophets",
            Preset::Gospels => "gospels",
            Preset::Paul => "paul",
            Preset::GeneralEpistles => "general-epistles",
        }
    }

    pub fn books(&self) -> &'static [&'static str] {
        match self {
            Preset::Pentateuch => &["Genesis", "Exodus", "Leviticus", "Numbers", "Deuteronomy"],
            Preset::History => &[
                "Joshua",
                "Judges",
                "Ruth",
                "1 Samuel",
                "2 Samuel",
                "1 Kings",
                "2 Kings",
                "1 Chronicles",
                "2 Chronicles",
                "Ezra",
                "Nehemiah",
                "Esther",
            ],
            Preset::Wisdom => &["Job", "Psalms", "Proverbs", "Ecclesiastes", "Songs"],
            Preset::MajorProphets => &["Isaiah", "Jeremiah", "Lamentations", "Ezekiel", "Daniel"],
            Preset::MinorProphets => &[
                "Hosea",
                "Joel",
                "Amos",
                "Obadiah",
                "Jonah",
                "Micah",
                "Nahum",
                "Habakkuk",
                "Zephaniah",
                "Haggai",
                "Zechariah",
                "Malachi",
            ],
            Preset::Gospels => &["Matthew", "Mark", "Luke", "John"],
            Preset::Paul => &[
                "Romans",
                "1 Corinthians",
                "2 Corinthians",
                "Galatians",
                "Ephesians",
                "Philippians",
                "Colossians",
                "1 Thessalonians",
                "2 Thessalonians",
                "1 Timothy",
                "2 Timothy",
                "Titus",
                "Philemon",
            ],
            Preset::GeneralEpistles => &[
                "Hebrews",
                "James",
                "1 Peter",
                "2 Peter",
                "1 John",
                "2 John",
                "3 John",
                "Jude",
                "Revelation",
            ],
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = CorpusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Preset::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CorpusError::UnknownPreset(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_totals() {
        let corpus = Corpus::canonical();
        assert_eq!(corpus.books().len(), 66);
        assert_eq!(corpus.chapter_count(), 1189);

        let old: u32 = corpus
            .books()
            .iter()
            .filter(|b| b.is_old_testament())
            .map(|b| b.chapter_count)
            .sum();
        assert_eq!(old, 929);
    }

    #[test]
    fn canonical_ids_are_contiguous() {
        let corpus = Corpus::canonical();
        let ids: Vec<u32> = corpus
            .books()
            .iter()
            .flat_map(|b| b.chapters().map(|c| c.global_id).collect::<Vec<_>>())
            .collect();

        assert_eq!(ids.first(), Some(&1));
        assert!(ids.windows(2).all(|w| w[1] == w[0] + 1));
        assert_eq!(corpus.book("Revelation").unwrap().start_id, 1168);
    }

    #[test]
    fn chapter_lookup() {
        let corpus = Corpus::canonical();
        let exodus = corpus.book("exodus").unwrap();

        let ch = exodus.chapter(3).unwrap();
        assert_eq!(ch.global_id, 53);
        assert_eq!(ch.to_string(), "Exodus 3");
        assert!(exodus.chapter(0).is_none());
        assert!(exodus.chapter(41).is_none());
    }

    #[test]
    fn parse_index_json() {
        let json = r#"[
            {"name": "Genesis", "startFile": 1, "chapters": 50},
            {"name": "Exodus", "startFile": 51, "chapters": 40}
        ]"#;

        let corpus = Corpus::from_json(json).unwrap();
        assert_eq!(corpus.books().len(), 2);
        assert_eq!(corpus.books()[1].ordinal, 1);
        assert_eq!(corpus.books()[1].start_id, 51);
    }

    #[test]
    fn overlapping_ids_rejected() {
        let result = Corpus::from_entries(vec![
            ("A".to_string(), 1, 5),
            ("B".to_string(), 4, 2),
        ]);

        assert!(matches!(result, Err(CorpusError::OverlappingIds { .. })));
    }

    #[test]
    fn ids_past_u32_range_rejected() {
        let json = r#"[
            {"name": "Alpha", "startFile": 4294967295, "chapters": 2},
            {"name": "Beta", "startFile": 5, "chapters": 1}
        ]"#;

        assert_eq!(
            Corpus::from_json(json),
            Err(CorpusError::IdOverflow {
                name: "Alpha".to_string(),
                start_id: u32::MAX,
                chapters: 2,
            })
        );

        let last = Corpus::from_entries(vec![("Omega".to_string(), u32::MAX - 1, 1)]).unwrap();
        assert_eq!(last.books()[0].chapter(1).unwrap().global_id, u32::MAX - 1);
    }

    #[test]
    fn invalid_indexes_rejected() {
        assert_eq!(Corpus::from_entries(vec![]), Err(CorpusError::Empty));
        assert_eq!(
            Corpus::from_entries(vec![("A".to_string(), 1, 0)]),
            Err(CorpusError::NoChapters("A".to_string()))
        );
        assert_eq!(
            Corpus::from_entries(vec![("A".to_string(), 1, 1), ("a".to_string(), 2, 1)]),
            Err(CorpusError::DuplicateBook("a".to_string()))
        );
    }

    #[test]
    fn select_keeps_canonical_order() {
        let corpus = Corpus::canonical();
        let selection = Selection::Books(vec!["John".to_string(), "Genesis".to_string()]);

        let books = corpus.select(&selection).unwrap();
        let names: Vec<_> = books.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Genesis", "John"]);
    }

    #[test]
    fn select_unknown_book() {
        let corpus = Corpus::canonical();
        let selection = Selection::Books(vec!["Hezekiah".to_string()]);

        assert_eq!(
            corpus.select(&selection),
            Err(CorpusError::UnknownBook("Hezekiah".to_string()))
        );
    }

    #[test]
    fn empty_selection_selects_nothing() {
        let corpus = Corpus::canonical();
        assert!(corpus.select(&Selection::Books(vec![])).unwrap().is_empty());
    }

    #[test]
    fn presets_union_with_books() {
        let selection = Selection::from_parts(
            &["Mark".to_string(), "Acts".to_string()],
            &[Preset::Gospels],
        );

        match selection {
            Selection::Books(names) => {
                assert_eq!(names, vec!["Mark", "Acts", "Matthew", "Luke", "John"]);
            }
            Selection::All => panic!("expected explicit selection"),
        }

        assert_eq!(Selection::from_parts(&[], &[]), Selection::All);
    }

    #[test]
    fn preset_books_exist() {
        let corpus = Corpus::canonical();
        for preset in Preset::ALL {
            for name in preset.books() {
                assert!(corpus.book(name).is_some(), "{} in {}", name, preset);
            }
            assert_eq!(preset.as_str().parse::<Preset>().unwrap(), preset);
        }
    }
}
