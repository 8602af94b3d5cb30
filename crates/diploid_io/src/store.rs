//! Sweep artifacts keyed by rule number.
//!
//! A store writes `results<rule>.<ext>` into its directory. Saving the same
//! rule again replaces the previous artifact.

use crate::error::{IoError, Result};
use crate::persistence::{load_json_gz, load_rkyv, save_json_gz, save_rkyv};
use diploid_data::{ResultFormat, SweepResult};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
    format: ResultFormat,
}

impl ResultStore {
    pub fn new<P: Into<PathBuf>>(dir: P, format: ResultFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn format(&self) -> ResultFormat {
        self.format
    }

    /// Artifact path for `rule` in this store's format.
    #[must_use]
    pub fn path_for(&self, rule: u8) -> PathBuf {
        self.dir
            .join(format!("results{}.{}", rule, self.format.extension()))
    }

    /// Validates and writes `result`, returning the artifact path.
    pub fn save(&self, result: &SweepResult) -> Result<PathBuf> {
        validate_sweep(result)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            IoError::FileSystem(e).with_context(format!("creating {}", self.dir.display()))
        })?;

        let path = self.path_for(result.header.rule);
        match self.format {
            ResultFormat::Rkyv => save_rkyv(result, &path)?,
            ResultFormat::JsonGz => save_json_gz(result, &path)?,
        }

        let bytes = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        tracing::info!(
            path = %path.display(),
            rule = result.header.rule,
            runs = result.len(),
            bytes = bytes,
            "Saved sweep result"
        );
        Ok(path)
    }

    /// Loads the artifact for `rule`.
    pub fn load(&self, rule: u8) -> Result<SweepResult> {
        let path = self.path_for(rule);
        if !path.exists() {
            return Err(IoError::not_found(path.display().to_string()));
        }
        load_as(&path, self.format)
    }
}

/// Loads an artifact, picking the format from its extension (rkyv if unknown).
pub fn load_sweep<P: AsRef<Path>>(path: P) -> Result<SweepResult> {
    let path = path.as_ref();
    let format =
        ResultFormat::from_path(&path.to_string_lossy()).unwrap_or(ResultFormat::Rkyv);
    load_as(path, format)
}

fn load_as(path: &Path, format: ResultFormat) -> Result<SweepResult> {
    let result: SweepResult = match format {
        ResultFormat::Rkyv => load_rkyv(path),
        ResultFormat::JsonGz => load_json_gz(path),
    }
    .map_err(|e| e.with_context(format!("loading {}", path.display())))?;
    validate_sweep(&result)?;
    Ok(result)
}

/// Checks that every run matches the header's shape and is complete.
pub fn validate_sweep(result: &SweepResult) -> Result<()> {
    let header = &result.header;
    for (i, run) in result.runs.iter().enumerate() {
        if !run.is_complete() {
            return Err(IoError::validation(format!(
                "run {i} (lambda = {}) is incomplete",
                run.lambda
            )));
        }
        if run.grid.shape() != (header.end_time, header.cells) {
            return Err(IoError::validation(format!(
                "run {i} grid is {:?}, header says {} x {}",
                run.grid.shape(),
                header.end_time,
                header.cells
            )));
        }
    }
    Ok(())
}
