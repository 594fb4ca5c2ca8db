use std::{
    io::SeekFrom,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt},
};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Incremental reader over one journal file.
///
/// Each call to [`JournalReader::read_lines`] returns the complete lines
/// appended since the previous call. A trailing line without a newline is
/// held back until the game finishes writing it.
pub struct JournalReader {
    path: PathBuf,
    offset: u64,
    pending: Vec<u8>,
}

impl JournalReader {
    /// Reader positioned at the start of `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: 0,
            pending: Vec::new(),
        }
    }

    /// The journal being read.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every complete line appended since the last call.
    pub async fn read_lines(&mut self) -> Result<Vec<String>> {
        let mut file = File::open(&self.path)
            .await
            .with_context(|| format!("failed to open journal {}", self.path.display()))?;
        let len = file.metadata().await?.len();
        if len < self.offset {
            info!(path = %self.path.display(), "Journal truncated; reading from start");
            self.offset = 0;
            self.pending.clear();
        }
        file.seek(SeekFrom::Start(self.offset))
            .await
            .with_context(|| format!("failed to seek journal {}", self.path.display()))?;
        let mut chunk = Vec::new();
        let read = file
            .read_to_end(&mut chunk)
            .await
            .with_context(|| format!("failed to read journal {}", self.path.display()))?;
        self.offset += read as u64;
        self.pending.extend_from_slice(&chunk);

        let Some(last_newline) = self.pending.iter().rposition(|byte| *byte == b'\n') else {
            return Ok(Vec::new());
        };
        let complete: Vec<u8> = self.pending.drain(..=last_newline).collect();
        let lines: Vec<String> = String::from_utf8_lossy(&complete)
            .lines()
            .map(|line| line.trim_end_matches('\r').to_string())
            .filter(|line| !line.is_empty())
            .collect();
        debug!(path = %self.path.display(), count = lines.len(), "Read journal lines");
        Ok(lines)
    }
}

/// Whether `name` looks like a game journal, e.g. `Journal.2024-03-01T100000.01.log`.
pub fn is_journal_file(name: &str) -> bool {
    name.starts_with("Journal.") && name.ends_with(".log")
}

/// The newest `Journal.*.log` in `dir`, by file name.
///
/// Journal names embed their creation time, so lexical order is chronological.
pub fn latest_journal(dir: &Path) -> Result<Option<PathBuf>> {
    let mut newest: Option<PathBuf> = None;
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry =
            entry.with_context(|| format!("failed to list journal directory {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !is_journal_file(&name) {
            continue;
        }
        let is_newer = newest
            .as_ref()
            .and_then(|current| current.file_name())
            .map_or(true, |current| current.to_string_lossy() < name);
        if is_newer {
            newest = Some(entry.path().to_path_buf());
        }
    }
    Ok(newest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::tempdir;

    #[tokio::test]
    async fn reads_appended_lines_and_holds_partial() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("Journal.2024-03-01T100000.01.log");
        fs::write(&path, "{\"a\":1}\r\n{\"b\":2}\n{\"c\"")?;

        let mut reader = JournalReader::new(&path);
        assert_eq!(reader.read_lines().await?, vec!["{\"a\":1}", "{\"b\":2}"]);
        assert!(reader.read_lines().await?.is_empty());

        let mut file = fs::OpenOptions::new().append(true).open(&path)?;
        writeln!(file, ":3}}")?;
        assert_eq!(reader.read_lines().await?, vec!["{\"c\":3}"]);
        Ok(())
    }

    #[test]
    fn picks_newest_journal_by_name() -> Result<()> {
        let dir = tempdir()?;
        for name in [
            "Journal.2024-03-01T100000.01.log",
            "Journal.2024-03-02T090000.01.log",
            "Journal.161203123456.01.log",
            "Status.json",
        ] {
            fs::write(dir.path().join(name), "")?;
        }
        let latest = latest_journal(dir.path())?.expect("a journal");
        assert!(latest.ends_with("Journal.2024-03-02T090000.01.log"));

        let empty = tempdir()?;
        assert!(latest_journal(empty.path())?.is_none());
        Ok(())
    }
}
