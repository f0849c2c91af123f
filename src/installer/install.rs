//! Fresh modpack install into a new launcher profile.
//!
//! Steps, with the progress reported at each:
//! - 0%      Check the destination, prepare the Forge installer
//! - 10%     Install Forge if needed
//! - 20-89%  Extract the modpack
//! - 90%     Write the launcher profile
//! - 100%    Done
//!
//! A failing step stops the install. Earlier steps are not undone.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::context::InstallContext;
use super::progress::{ProgressCallback, ProgressReporter, Stage};
use crate::error::{Error, Result};
use crate::forge::LoaderFactory;
use crate::java::RuntimeLocator;
use crate::paths;
use crate::profiles::{names, ProfileRecord};

/// What to call the new profile and where to put it. Unset fields are
/// generated.
#[derive(Debug, Clone, Default)]
pub struct InstallRequest {
    pub id: Option<String>,
    pub name: Option<String>,
    pub icon: Option<String>,
    /// Defaults to `.minecraft/trollauncher/<id>`
    pub destination: Option<PathBuf>,
}

pub struct ModpackInstaller {
    ctx: InstallContext,
    progress_callback: Option<ProgressCallback>,
}

impl ModpackInstaller {
    /// Open `modpack` for installing into the `.minecraft` at `dot_minecraft`.
    pub fn new(modpack: &Path, dot_minecraft: &Path) -> Result<Self> {
        Ok(Self {
            ctx: InstallContext::open(modpack, dot_minecraft)?,
            progress_callback: None,
        })
    }

    /// Open `modpack` for installing into the default `.minecraft`.
    pub fn with_default_dot_minecraft(modpack: &Path) -> Result<Self> {
        Self::new(modpack, &paths::default_dot_minecraft()?)
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

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn dot_minecraft(&self) -> &Path {
        &self.ctx.dot_minecraft
    }

    /// Extract and load the bundled Forge installer. Safe to call repeatedly.
    pub fn prep_installer(&mut self) -> Result<()> {
        self.ctx.prep_installer()
    }

    /// Whether Forge is already installed. `None` until prepared.
    pub fn is_runtime_installed(&self) -> Option<bool> {
        self.ctx.is_runtime_installed()
    }

    /// A random profile name not already in use.
    pub fn unique_profile_name(&mut self) -> String {
        self.ctx.registry.new_unique_name(&mut self.ctx.rng)
    }

    pub fn random_profile_icon(&mut self) -> String {
        names::random_icon(&mut self.ctx.rng)
    }

    /// Install the modpack and add its launcher profile. Returns the profile
    /// as written.
    pub fn install(&mut self, request: &InstallRequest) -> Result<ProfileRecord> {
        let mut progress = ProgressReporter::new(self.progress_callback.clone());
        progress.report(Stage::Preparing, 0);

        self.ctx.registry.refresh()?;
        let id = match &request.id {
            Some(id) if self.ctx.registry.has_id(id) => return Err(Error::IdInUse(id.clone())),
            Some(id) => id.clone(),
            None => self.ctx.registry.new_unique_id(&mut self.ctx.rng),
        };
        let name = match &request.name {
            Some(name) if self.ctx.registry.has_name(name) => {
                return Err(Error::NameInUse(name.clone()))
            }
            Some(name) => name.clone(),
            None => self.ctx.registry.new_unique_name(&mut self.ctx.rng),
        };
        let icon = match &request.icon {
            Some(icon) => icon.clone(),
            None => names::random_icon(&mut self.ctx.rng),
        };
        let destination = request
            .destination
            .clone()
            .unwrap_or_else(|| paths::default_install_path(&self.ctx.dot_minecraft, &id));

        prepare_destination(&destination)?;
        self.ctx.prep_installer()?;

        progress.report(Stage::InstallingLoader, 10);
        self.ctx.ensure_runtime()?;

        progress.report(Stage::Extracting, 20);
        let prefix = self.ctx.top_level_dir();
        let extracted = self
            .ctx
            .archive
            .extract_filtered(&destination, prefix.as_deref(), None, &mut |done, total| {
                progress.report_span(Stage::Extracting, 20, 89, done, total)
            })
            .map_err(|e| Error::UnzipFailed(Box::new(e)))?;
        info!("Extracted {} files to {}", extracted, destination.display());

        progress.report(Stage::WritingProfile, 90);
        let version = self.ctx.loader_version().ok_or(Error::InvalidProfile("version"))?;
        let record = ProfileRecord {
            id: id.clone(),
            name: Some(name),
            icon: Some(icon),
            version: Some(version),
            game_path: Some(destination),
            java_path: self.ctx.runtime_locator.find_compatible_runtime(),
            ..Default::default()
        };
        self.ctx.registry.write_new_profile(&record)?;

        progress.report(Stage::Done, 100);
        let written = self
            .ctx
            .registry
            .find_by_id(&id)
            .cloned()
            .unwrap_or(record);
        info!(
            "Installed modpack as profile '{}'",
            written.name.as_deref().unwrap_or(&id)
        );
        Ok(written)
    }
}

/// Create the destination if needed; it must end up an empty directory.
fn prepare_destination(destination: &Path) -> Result<()> {
    if !destination.exists() {
        fs::create_dir_all(destination).map_err(|source| Error::DestinationCreationFailed {
            path: destination.to_path_buf(),
            source,
        })?;
    }
    if !destination.is_dir() {
        return Err(Error::DestinationNotDirectory(destination.to_path_buf()));
    }
    let mut entries =
        fs::read_dir(destination).map_err(|source| Error::DestinationCreationFailed {
            path: destination.to_path_buf(),
            source,
        })?;
    if entries.next().is_some() {
        return Err(Error::DestinationNotEmpty(destination.to_path_buf()));
    }
    Ok(())
}
