//! Corpus listing commands

use anyhow::Result;
use serde::Serialize;

use super::output::Output;
use crate::domain::{Corpus, Preset};

#[derive(Serialize)]
struct BookRow<'a> {
    name: &'a str,
    testament: &'static str,
    start_id: u32,
    chapters: u32,
}

#[derive(Serialize)]
struct PresetRow {
    name: &'static str,
    books: &'static [&'static str],
}

/// Lists the books of the active corpus
pub fn list(output: &Output, corpus: &Corpus) -> Result<()> {
    let rows: Vec<BookRow> = corpus
        .books()
        .iter()
        .map(|b| BookRow {
            name: &b.name,
            testament: if b.is_old_testament() { "old" } else { "new" },
            start_id: b.start_id,
            chapters: b.chapter_count,
        })
        .collect();

    if output.is_json() {
        output.data(&rows);
        return Ok(());
    }

    for row in &rows {
        output.row(&[
            row.name,
            row.testament,
            row.start_id.to_string().as_str(),
            row.chapters.to_string().as_str(),
        ]);
    }
    output.blank();
    output.line(&format!(
        "{} books, {} chapters",
        rows.len(),
        corpus.chapter_count()
    ));

    Ok(())
}

/// Lists preset names and the books they expand to
pub fn presets(output: &Output) -> Result<()> {
    let rows: Vec<PresetRow> = Preset::ALL
        .iter()
        .map(|p| PresetRow {
            name: p.as_str(),
            books: p.books(),
        })
        .collect();

    if output.is_json() {
        output.data(&rows);
        return Ok(());
    }

    for row in &rows {
        output.row(&[row.name, row.books.join(", ").as_str()]);
    }

    Ok(())
}
