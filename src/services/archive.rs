//! On-disk archive of emitted signals.

use crate::error::NotifyError;
use crate::models::signal::Signal;
use crate::services::notifier::{format_plain, Notifier};
use async_trait::async_trait;
use chrono_tz::Tz;
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes `signal_<date>_<time>_<seq>.json` plus a `.txt` with the plain
/// message for every signal.
pub struct ArchiveNotifier {
    dir: PathBuf,
    timezone: Tz,
}

impl ArchiveNotifier {
    pub fn new(dir: impl Into<PathBuf>, timezone: Tz) -> Self {
        Self {
            dir: dir.into(),
            timezone,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the JSON record for `signal`.
    pub fn record_path(&self, signal: &Signal) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(signal)))
    }
}

fn file_stem(signal: &Signal) -> String {
    format!(
        "signal_{}_{:02}",
        signal.generated_at.format("%Y%m%d_%H%M%S"),
        signal.sequence
    )
}

#[async_trait]
impl Notifier for ArchiveNotifier {
    fn name(&self) -> &'static str {
        "archive"
    }

    async fn notify(&self, signal: &Signal) -> Result<(), NotifyError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let record = self.record_path(signal);
        let json = serde_json::to_vec_pretty(signal)?;
        tokio::fs::write(&record, json).await?;
        tokio::fs::write(
            record.with_extension("txt"),
            format_plain(signal, self.timezone),
        )
        .await?;

        info!(
            sequence = signal.sequence,
            path = %record.display(),
            "Signal archived"
        );
        Ok(())
    }
}
