//! Artifact file names
//!
//! Format: `Day_{n}_{summary}.{ext}` where `n` is 1-based and zero-padded to
//! the width of the plan length, and `summary` lists chapters as
//! `{book prefix}{chapter}` joined by `_`. The whole name is kept within
//! [`MAX_NAME_LEN`] characters; the day prefix alone keeps names unique.

use super::schedule::Day;

/// Maximum length of a generated file name, extension included
pub const MAX_NAME_LEN: usize = 28;

/// Characters of the book name kept in the summary
const BOOK_PREFIX_LEN: usize = 3;

/// Builds the file name for a day of a plan with `plan_len` days
pub fn artifact_name(day: &Day, plan_len: usize, ext: &str) -> String {
    let width = plan_len.max(1).to_string().len();
    let prefix = format!("Day_{:0width$}_", day.number(), width = width);
    let ext = format!(".{}", ext.trim_start_matches('.'));
    let max_summary = MAX_NAME_LEN.saturating_sub(prefix.len() + ext.len());

    let summary = day
        .chapters
        .iter()
        .map(|ch| {
            let book: String = ch.book.chars().take(BOOK_PREFIX_LEN).collect();
            format!("{}{}", book, ch.chapter)
        })
        .collect::<Vec<_>>()
        .join("_");

    let safe: String = summary
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .take(max_summary)
        .collect();

    format!("{}{}{}", prefix, safe, ext)
}
