//! Progress reporting for installs and updates.
//!
//! Callbacks run synchronously on the installing thread and should return
//! quickly.

use std::fmt;
use std::sync::Arc;

/// Step an install or update is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preparing,
    InstallingLoader,
    Extracting,
    WritingProfile,
    ScanningFiles,
    BackingUp,
    RemovingFiles,
    UpdatingProfile,
    Done,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Preparing => "Preparing installer",
            Stage::InstallingLoader => "Installing Forge",
            Stage::Extracting => "Extracting modpack",
            Stage::WritingProfile => "Writing launcher profile",
            Stage::ScanningFiles => "Scanning profile files",
            Stage::BackingUp => "Backing up old files",
            Stage::RemovingFiles => "Removing old files",
            Stage::UpdatingProfile => "Updating launcher profile",
            Stage::Done => "Done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One progress report: overall percentage and the current stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub percent: u8,
    pub stage: Stage,
}

/// Progress callback type
pub type ProgressCallback = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Forwards reports to an optional callback, never letting the percentage
/// go backwards or past 100.
pub(crate) struct ProgressReporter {
    callback: Option<ProgressCallback>,
    last: u8,
}

impl ProgressReporter {
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        Self { callback, last: 0 }
    }

    pub fn report(&mut self, stage: Stage, percent: u8) {
        let percent = percent.clamp(self.last, 100);
        self.last = percent;
        if let Some(ref callback) = self.callback {
            callback(ProgressUpdate { percent, stage });
        }
    }

    /// Report `done` of `total` items mapped linearly onto `start..=end`.
    pub fn report_span(&mut self, stage: Stage, start: u8, end: u8, done: usize, total: usize) {
        let span = end.saturating_sub(start) as usize;
        let offset = if total == 0 { span } else { span * done.min(total) / total };
        self.report(stage, start.saturating_add(offset as u8));
    }
}
