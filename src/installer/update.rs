//! Update an installed modpack profile in place.
//!
//! User data matched by the keeplist (saves, options, screenshots, ...) is
//! never touched. Everything else in the profile is zipped into a backup,
//! deleted, and replaced by the new modpack's files.
//!
//! Progress:
//! - 0%      Check the profile, prepare the Forge installer
//! - 10%     Install Forge if needed
//! - 20%     Scan the profile directory
//! - 30-49%  Back up replaceable files
//! - 50-69%  Delete them
//! - 70-99%  Extract the new files
//! - 100%    Done

use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use super::context::InstallContext;
use super::progress::{ProgressCallback, ProgressReporter, Stage};
use crate::archive::create_backup;
use crate::error::{Error, Result};
use crate::forge::LoaderFactory;
use crate::java::RuntimeLocator;
use crate::keeplist::Keeplist;
use crate::paths;
use crate::profiles::ProfileRecord;

/// What an update did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Zip holding the files that were replaced
    pub backup_path: PathBuf,
    /// Files backed up and removed
    pub replaced: usize,
    /// Files written from the modpack
    pub extracted: usize,
}

pub struct ModpackUpdater {
    ctx: InstallContext,
    profile_id: String,
    keeplist: Keeplist,
    progress_callback: Option<ProgressCallback>,
}

impl ModpackUpdater {
    /// Open `modpack` for updating profile `profile_id` in `dot_minecraft`.
    pub fn new(profile_id: &str, modpack: &Path, dot_minecraft: &Path) -> Result<Self> {
        Ok(Self {
            ctx: InstallContext::open(modpack, dot_minecraft)?,
            profile_id: profile_id.to_string(),
            keeplist: Keeplist::default(),
            progress_callback: None,
        })
    }

    pub fn with_default_dot_minecraft(profile_id: &str, modpack: &Path) -> Result<Self> {
        Self::new(profile_id, modpack, &paths::default_dot_minecraft()?)
    }

    pub fn with_loader_factory(mut self, factory: impl LoaderFactory + 'static) -> Self {
        self.ctx.loader_factory = Box::new(factory);
        self
    }

    pub fn with_runtime_locator(mut self, locator: impl RuntimeLocator + 'static) -> Self {
        self.ctx.runtime_locator = Box::new(locator);
        self
    }

    pub fn with_rng(mut self, rng: rand::rngs::StdRng) -> Self {
        self.ctx.rng = rng;
        self
    }

    pub fn with_keeplist(mut self, keeplist: Keeplist) -> Self {
        self.keeplist = keeplist;
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn prep_installer(&mut self) -> Result<()> {
        self.ctx.prep_installer()
    }

    pub fn is_runtime_installed(&self) -> Option<bool> {
        self.ctx.is_runtime_installed()
    }

    pub fn update(&mut self) -> Result<UpdateSummary> {
        let mut progress = ProgressReporter::new(self.progress_callback.clone());
        progress.report(Stage::Preparing, 0);

        self.ctx.registry.refresh()?;
        let profile = self
            .ctx
            .registry
            .find_by_id(&self.profile_id)
            .cloned()
            .ok_or_else(|| Error::ProfileNotFound(self.profile_id.clone()))?;
        let profile_path = match &profile.game_path {
            Some(path) if super::profile_looks_like_install(&profile) => path.clone(),
            _ => return Err(Error::ProfileNotAnInstall(self.profile_id.clone())),
        };
        if !profile_path.is_dir() {
            return Err(Error::DestinationNotDirectory(profile_path));
        }
        self.ctx.prep_installer()?;

        progress.report(Stage::InstallingLoader, 10);
        self.ctx.ensure_runtime()?;

        progress.report(Stage::ScanningFiles, 20);
        let all_files = profile_files(&profile_path)?;
        let replace = self.keeplist.filter_overwritable(&all_files);
        info!(
            "Replacing {} of {} files in {}",
            replace.len(),
            all_files.len(),
            profile_path.display()
        );

        progress.report(Stage::BackingUp, 30);
        let backup_path =
            paths::backup_zip_path(&self.ctx.dot_minecraft, &self.profile_id, Utc::now());
        create_backup(&backup_path, &profile_path, &replace, &mut |done, total| {
            progress.report_span(Stage::BackingUp, 30, 49, done, total)
        })
        .map_err(|e| Error::ProfileBackupFailed(Box::new(e)))?;

        progress.report(Stage::RemovingFiles, 50);
        let total = replace.len();
        for (done, rel) in replace.iter().enumerate() {
            let path = profile_path.join(rel);
            if let Err(e) = fs::remove_file(&path) {
                warn!("Failed to remove {}: {}", path.display(), e);
            }
            progress.report_span(Stage::RemovingFiles, 50, 69, done + 1, total);
        }

        progress.report(Stage::Extracting, 70);
        let prefix = self.ctx.top_level_dir();
        let extracted = self
            .ctx
            .archive
            .extract_filtered(
                &profile_path,
                prefix.as_deref(),
                Some(&self.keeplist),
                &mut |done, total| progress.report_span(Stage::Extracting, 70, 99, done, total),
            )
            .map_err(|e| Error::UnzipFailed(Box::new(e)))?;

        progress.report(Stage::UpdatingProfile, 99);
        let mut update = ProfileRecord::new(&self.profile_id);
        update.version = self.ctx.loader_version();
        self.ctx.registry.update_profile(&update)?;

        progress.report(Stage::Done, 100);
        info!("Updated profile {}", self.profile_id);
        Ok(UpdateSummary {
            backup_path,
            replaced: replace.len(),
            extracted,
        })
    }
}

/// Relative paths (forward slashes) of every regular file under `dir`.
///
/// Symlinks to files count as files. Symlinked directories are not entered.
pub fn profile_files(dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|source| Error::ProfileFilesFailed {
            path: dir.to_path_buf(),
            source,
        })?;
        let file_type = entry.file_type();
        let is_file = file_type.is_file() || (file_type.is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(dir) {
            files.push(paths::to_generic_string(rel));
        }
    }
    Ok(files)
}
