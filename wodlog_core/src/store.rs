//! Result storage.
//!
//! `ResultStore` is the boundary the reconciliation engine talks to.
//! `JsonlResultStore` keeps one JSON result per line with file locking and
//! enforces the one-result-per-athlete-per-day constraint.

use crate::{ResultPayload, WorkoutResult};
use chrono::{NaiveDate, Utc};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by a result store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Second row for the same athlete and date
    #[error("athlete {athlete_id} already has a result on {date}")]
    DuplicateDay { athlete_id: String, date: NaiveDate },

    #[error("no result with id {0}")]
    NotFound(Uuid),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence operations consumed by the engine
pub trait ResultStore {
    /// This athlete's results, most recent date first
    fn list_results_for_athlete(&self, athlete_id: &str) -> StoreResult<Vec<WorkoutResult>>;

    /// Every athlete's results for one day
    fn list_results_for_date(&self, date: NaiveDate) -> StoreResult<Vec<WorkoutResult>>;

    fn create_result(&mut self, payload: &ResultPayload) -> StoreResult<WorkoutResult>;

    fn update_result(&mut self, id: Uuid, payload: &ResultPayload) -> StoreResult<WorkoutResult>;

    fn delete_result(&mut self, id: Uuid) -> StoreResult<()>;
}

/// Newest date first, then latest write first
pub fn sort_most_recent_first(results: &mut [WorkoutResult]) {
    results.sort_by(|a, b| {
        b.date()
            .cmp(&a.date())
            .then_with(|| b.logged_at.cmp(&a.logged_at))
    });
}

/// One line of the store file
enum StoredLine {
    Row(WorkoutResult),
    /// Kept verbatim so rewrites never drop rows this build cannot read
    Unreadable(String),
}

impl StoredLine {
    fn row(&self) -> Option<&WorkoutResult> {
        match self {
            StoredLine::Row(result) => Some(result),
            StoredLine::Unreadable(_) => None,
        }
    }
}

/// JSONL-backed result store with file locking
pub struct JsonlResultStore {
    path: PathBuf,
}

impl JsonlResultStore {
    /// Create a store for the given path; the file is created on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Read all rows under a shared lock
    ///
    /// Lines that fail to parse are skipped with a warning.
    pub fn read_all(&self) -> StoreResult<Vec<WorkoutResult>> {
        let results: Vec<_> = self
            .read_lines()?
            .into_iter()
            .filter_map(|line| match line {
                StoredLine::Row(result) => Some(result),
                StoredLine::Unreadable(_) => None,
            })
            .collect();
        tracing::debug!("Read {} results from {:?}", results.len(), self.path);
        Ok(results)
    }

    /// Every non-blank line, parsed where possible
    fn read_lines(&self) -> StoreResult<Vec<StoredLine>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let reader = BufReader::new(&file);
        let mut lines = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<WorkoutResult>(&line) {
                Ok(result) => lines.push(StoredLine::Row(result)),
                Err(e) => {
                    tracing::warn!("Failed to parse result at line {}: {}", line_num + 1, e);
                    lines.push(StoredLine::Unreadable(line));
                }
            }
        }

        file.unlock()?;
        Ok(lines)
    }

    /// Append one row under an exclusive lock
    fn append(&self, result: &WorkoutResult) -> StoreResult<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(result)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;
        Ok(())
    }

    /// Atomically replace the file with `lines`
    ///
    /// Writes to a temp file in the same directory, syncs, then renames
    /// over the original. Unreadable lines are written back byte for byte.
    fn rewrite(&self, lines: &[StoredLine]) -> StoreResult<()> {
        self.ensure_parent_dir()?;

        let parent = self.path.parent().ok_or_else(|| {
            StoreError::Unavailable(format!("store path {:?} has no parent", self.path))
        })?;
        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            for line in lines {
                match line {
                    StoredLine::Row(result) => serde_json::to_writer(&mut writer, result)?,
                    StoredLine::Unreadable(raw) => writer.write_all(raw.as_bytes())?,
                }
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

impl ResultStore for JsonlResultStore {
    fn list_results_for_athlete(&self, athlete_id: &str) -> StoreResult<Vec<WorkoutResult>> {
        let mut results: Vec<_> = self
            .read_all()?
            .into_iter()
            .filter(|r| r.payload.athlete_id == athlete_id)
            .collect();
        sort_most_recent_first(&mut results);
        Ok(results)
    }

    fn list_results_for_date(&self, date: NaiveDate) -> StoreResult<Vec<WorkoutResult>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| r.date() == date)
            .collect())
    }

    fn create_result(&mut self, payload: &ResultPayload) -> StoreResult<WorkoutResult> {
        let taken = self.read_all()?.iter().any(|r| {
            r.payload.athlete_id == payload.athlete_id && r.date() == payload.date
        });
        if taken {
            return Err(StoreError::DuplicateDay {
                athlete_id: payload.athlete_id.clone(),
                date: payload.date,
            });
        }

        let result = WorkoutResult {
            id: Uuid::new_v4(),
            payload: payload.clone(),
            logged_at: Utc::now(),
        };
        self.append(&result)?;

        tracing::info!("Created result {} for {} on {}", result.id, payload.athlete_id, payload.date);
        Ok(result)
    }

    fn update_result(&mut self, id: Uuid, payload: &ResultPayload) -> StoreResult<WorkoutResult> {
        let mut lines = self.read_lines()?;

        let clash = lines.iter().filter_map(StoredLine::row).any(|r| {
            r.id != id && r.payload.athlete_id == payload.athlete_id && r.date() == payload.date
        });
        if clash {
            return Err(StoreError::DuplicateDay {
                athlete_id: payload.athlete_id.clone(),
                date: payload.date,
            });
        }

        let row = lines
            .iter_mut()
            .find_map(|line| match line {
                StoredLine::Row(r) if r.id == id => Some(r),
                _ => None,
            })
            .ok_or(StoreError::NotFound(id))?;
        row.payload = payload.clone();
        row.logged_at = Utc::now();
        let updated = row.clone();

        self.rewrite(&lines)?;

        tracing::info!("Updated result {}", id);
        Ok(updated)
    }

    fn delete_result(&mut self, id: Uuid) -> StoreResult<()> {
        let mut lines = self.read_lines()?;
        let before = lines.len();
        lines.retain(|line| line.row().map_or(true, |r| r.id != id));
        if lines.len() == before {
            return Err(StoreError::NotFound(id));
        }

        self.rewrite(&lines)?;

        tracing::info!("Deleted result {}", id);
        Ok(())
    }
}
