//! Day artifact writer
//!
//! Writes one file per day into an output directory. Each file is written to
//! a temp name and renamed into place, so a day is either fully present or
//! absent. A `manifest.json` and `CREDITS.txt` are written once all days are
//! done.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use super::fragment::FragmentCleaner;
use crate::domain::{artifact_name, Day};
use crate::pipeline::{DayWriter, WriteError};

const LOCK_FILE: &str = ".bsb-plan.lock";
const MANIFEST_FILE: &str = "manifest.json";
const CREDITS_FILE: &str = "CREDITS.txt";

const CREDITS: &str = "BSB Bible Reading Plan - Credits

This plan was generated with bsb-plan.

License Information:
- Berean Standard Bible (BSB): The Berean Standard Bible is public domain. https://berean.bible/
- Bible Audio: The audio recording is by Barry Hays and has also been placed in the public domain.
";

/// What each day's file contains
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Chapter audio concatenated in reading order
    #[default]
    Audio,
    /// Chapter text fragments under per-chapter headings
    Text,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Audio => "audio",
            ArtifactKind::Text => "text",
        }
    }
}

/// One written day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// 1-based day number
    pub day: usize,
    pub date: Option<NaiveDate>,
    pub file: String,
    pub chapters: Vec<String>,
    pub bytes: usize,
    pub blake3: String,
}

/// Index of everything written in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub generator: String,
    pub kind: ArtifactKind,
    pub days: Vec<ManifestEntry>,
}

/// Writes day artifacts into a directory it holds an exclusive lock on
pub struct DirectoryWriter {
    dir: PathBuf,
    kind: ArtifactKind,
    extension: String,
    plan_len: usize,
    entries: Vec<ManifestEntry>,
    cleaner: FragmentCleaner,
    /// Held for the writer's lifetime; the lock drops with the file
    _lock: File,
}

impl DirectoryWriter {
    /// Creates the directory if needed and locks it for this run
    pub fn create(
        dir: impl Into<PathBuf>,
        kind: ArtifactKind,
        extension: &str,
        plan_len: usize,
    ) -> Result<Self, WriteError> {
        let dir = dir.into();
        let cleaner = FragmentCleaner::new().map_err(|e| WriteError::Cleanup(e.to_string()))?;
        fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;

        let lock_path = dir.join(LOCK_FILE);
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| io_error(&lock_path, e))?;

        lock.try_lock_exclusive()
            .map_err(|_| WriteError::Locked(dir.display().to_string()))?;

        Ok(Self {
            dir,
            kind,
            extension: extension.trim_start_matches('.').to_string(),
            plan_len,
            entries: Vec::new(),
            cleaner,
            _lock: lock,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Writes `contents` to `name` via a temp file and rename
    async fn write_atomic(&self, name: &str, contents: &[u8]) -> Result<(), WriteError> {
        let path = self.dir.join(name);
        let temp_path = self.dir.join(format!(".{}.tmp", name));

        tokio::fs::write(&temp_path, contents)
            .await
            .map_err(|e| io_error(&temp_path, e))?;

        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(io_error(&path, e));
        }

        Ok(())
    }
}

#[async_trait]
impl DayWriter for DirectoryWriter {
    async fn write_day(&mut self, day: &Day, payloads: Vec<Vec<u8>>) -> Result<(), WriteError> {
        let name = artifact_name(day, self.plan_len, &self.extension);
        let body = match self.kind {
            ArtifactKind::Audio => payloads.concat(),
            ArtifactKind::Text => render_text(day, &payloads, &self.cleaner).into_bytes(),
        };

        self.write_atomic(&name, &body).await?;
        tracing::debug!(file = %name, bytes = body.len(), "Wrote day artifact");

        self.entries.push(ManifestEntry {
            day: day.number(),
            date: day.date,
            file: name,
            chapters: day.chapters.iter().map(|c| c.to_string()).collect(),
            bytes: body.len(),
            blake3: blake3::hash(&body).to_hex().to_string(),
        });

        Ok(())
    }

    async fn finish(&mut self) -> Result<(), WriteError> {
        let manifest = Manifest {
            generator: concat!("bsb-plan ", env!("CARGO_PKG_VERSION")).to_string(),
            kind: self.kind,
            days: self.entries.clone(),
        };

        let json = serde_json::to_vec_pretty(&manifest).map_err(|e| WriteError::Io {
            path: MANIFEST_FILE.to_string(),
            message: e.to_string(),
        })?;

        self.write_atomic(MANIFEST_FILE, &json).await?;
        self.write_atomic(CREDITS_FILE, CREDITS.as_bytes()).await?;
        Ok(())
    }
}

/// Joins a day's cleaned fragments under a title, a reading list, and one
/// heading per chapter
fn render_text(day: &Day, fragments: &[Vec<u8>], cleaner: &FragmentCleaner) -> String {
    let mut out = format!("<h1>{}</h1>\n<ul class=\"day-summary\">\n", day.title());
    for chapter in &day.chapters {
        out.push_str(&format!("<li>{}</li>\n", chapter));
    }
    out.push_str("</ul>\n");

    for (chapter, fragment) in day.chapters.iter().zip(fragments) {
        out.push_str(&format!(
            "<div class=\"chapter-container\">\n<h2>{}</h2>\n{}\n</div>\n",
            chapter,
            cleaner.clean(&String::from_utf8_lossy(fragment))
        ));
    }

    out
}

fn io_error(path: &Path, e: std::io::Error) -> WriteError {
    WriteError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChapterRef;
    use tempfile::TempDir;

    fn day(index: usize, chapters: &[(&str, u32)]) -> Day {
        Day {
            index,
            date: NaiveDate::from_ymd_opt(2026, 2, 1),
            chapters: chapters
                .iter()
                .map(|(book, chapter)| ChapterRef {
                    book: book.to_string(),
                    chapter: *chapter,
                    global_id: *chapter,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn audio_days_are_concatenated() {
        let dir = TempDir::new().unwrap();
        let mut writer = DirectoryWriter::create(dir.path(), ArtifactKind::Audio, "mp3", 12).unwrap();

        let d = day(0, &[("Genesis", 1), ("Matthew", 1)]);
        writer
            .write_day(&d, vec![b"AAA".to_vec(), b"BB".to_vec()])
            .await
            .unwrap();

        let written = fs::read(dir.path().join("Day_01_Gen1_Mat1.mp3")).unwrap();
        assert_eq!(written, b"AAABB");
        assert_eq!(writer.entries()[0].bytes, 5);
        assert_eq!(writer.entries()[0].blake3, blake3::hash(b"AAABB").to_hex().to_string());
    }

    #[tokio::test]
    async fn text_days_have_headings_in_order() {
        let dir = TempDir::new().unwrap();
        let mut writer = DirectoryWriter::create(dir.path(), ArtifactKind::Text, "htm", 3).unwrap();

        let d = day(2, &[("John", 3), ("Jude", 1)]);
        writer
            .write_day(&d, vec![b"<p>loved</p>".to_vec(), b"<p>kept</p>".to_vec()])
            .await
            .unwrap();

        let text = fs::read_to_string(dir.path().join("Day_3_Joh3_Jud1.htm")).unwrap();
        assert!(text.starts_with("<h1>Day 3 - 2026-02-01</h1>"));
        let john = text.find("<h2>John 3</h2>").unwrap();
        let jude = text.find("<h2>Jude 1</h2>").unwrap();
        assert!(john < jude);
        assert!(text.contains("<p>loved</p>"));
    }

    #[tokio::test]
    async fn text_fragments_lose_page_chrome() {
        let dir = TempDir::new().unwrap();
        let mut writer = DirectoryWriter::create(dir.path(), ArtifactKind::Text, "htm", 1).unwrap();

        let page = b"<html><body><div id=\"topheading\">Ruth 1</div><h1>Ruth 1</h1>\
<p>In the days when the judges ruled</p></body></html>";
        writer
            .write_day(&day(0, &[("Ruth", 1)]), vec![page.to_vec()])
            .await
            .unwrap();

        let text = fs::read_to_string(dir.path().join("Day_1_Rut1.htm")).unwrap();
        assert!(text.contains("<h2>Ruth 1</h2>\n<p>In the days when the judges ruled</p>\n</div>"));
        assert!(!text.contains("topheading"));
        assert!(!text.contains("<body>"));
        assert_eq!(text.matches("<h1>").count(), 1);
    }

    #[tokio::test]
    async fn finish_writes_manifest_and_credits() {
        let dir = TempDir::new().unwrap();
        let mut writer = DirectoryWriter::create(dir.path(), ArtifactKind::Audio, "mp3", 1).unwrap();
        writer
            .write_day(&day(0, &[("Ruth", 1)]), vec![vec![1, 2, 3]])
            .await
            .unwrap();
        writer.finish().await.unwrap();

        let manifest: Manifest =
            serde_json::from_slice(&fs::read(dir.path().join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(manifest.kind, ArtifactKind::Audio);
        assert_eq!(manifest.days.len(), 1);
        assert_eq!(manifest.days[0].chapters, vec!["Ruth 1"]);
        assert!(dir.path().join(CREDITS_FILE).is_file());

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn second_writer_on_same_dir_is_locked_out() {
        let dir = TempDir::new().unwrap();
        let _first = DirectoryWriter::create(dir.path(), ArtifactKind::Audio, "mp3", 1).unwrap();

        let second = DirectoryWriter::create(dir.path(), ArtifactKind::Audio, "mp3", 1);
        assert!(matches!(second, Err(WriteError::Locked(_))));
    }
}
