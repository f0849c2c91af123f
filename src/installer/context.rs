//! State shared by installs and updates: the open modpack, the launcher
//! profiles, and the prepared Forge installer.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

use crate::archive::ModpackArchive;
use crate::error::{Error, Result};
use crate::forge::{ForgeLoaderFactory, LoaderFactory, ModLoaderInstaller};
use crate::java::{RuntimeLocator, SystemJava};
use crate::paths;
use crate::profiles::ProfileRegistry;

/// The Forge installer pulled out of the modpack. The temp dir holding the jar
/// lives as long as this does.
struct PreparedLoader {
    loader: Box<dyn ModLoaderInstaller>,
    _temp_dir: TempDir,
}

pub(crate) struct InstallContext {
    pub archive: ModpackArchive,
    pub registry: ProfileRegistry,
    pub dot_minecraft: PathBuf,
    pub loader_factory: Box<dyn LoaderFactory>,
    pub runtime_locator: Box<dyn RuntimeLocator>,
    pub rng: StdRng,
    prepared: Option<PreparedLoader>,
}

impl InstallContext {
    pub fn open(modpack: &Path, dot_minecraft: &Path) -> Result<Self> {
        let archive = ModpackArchive::open(modpack)?;
        let registry = ProfileRegistry::open_in(dot_minecraft)?;
        Ok(Self {
            archive,
            registry,
            dot_minecraft: dot_minecraft.to_path_buf(),
            loader_factory: Box::new(ForgeLoaderFactory),
            runtime_locator: Box::new(SystemJava),
            rng: StdRng::from_entropy(),
            prepared: None,
        })
    }

    pub fn top_level_dir(&self) -> Option<String> {
        self.archive.detect_top_level_dir()
    }

    /// Extract the bundled installer and load it. Does nothing if already done.
    pub fn prep_installer(&mut self) -> Result<()> {
        if self.prepared.is_some() {
            return Ok(());
        }
        let temp_dir = TempDir::new().map_err(Error::PrepTempDirFailed)?;
        let prefix = self.top_level_dir();
        let installer_path = self
            .archive
            .extract_one(temp_dir.path(), paths::INSTALLER_ENTRY, prefix.as_deref())
            .map_err(|e| Error::PrepInstallFailed(Box::new(e)))?;
        let loader = self
            .loader_factory
            .create(&installer_path, &self.dot_minecraft)?;
        debug!("Prepared mod loader {}", loader.version());
        self.prepared = Some(PreparedLoader {
            loader,
            _temp_dir: temp_dir,
        });
        Ok(())
    }

    pub fn is_prepped(&self) -> bool {
        self.prepared.is_some()
    }

    /// `None` until the installer has been prepared.
    pub fn is_runtime_installed(&self) -> Option<bool> {
        self.prepared.as_ref().map(|p| p.loader.is_installed())
    }

    /// Version id of the prepared loader.
    pub fn loader_version(&self) -> Option<String> {
        self.prepared.as_ref().map(|p| p.loader.version().to_string())
    }

    /// Run the loader installer unless the loader is already installed, then
    /// fix up the profile it leaves behind.
    pub fn ensure_runtime(&mut self) -> Result<()> {
        self.prep_installer()?;
        let Some(prepared) = self.prepared.as_ref() else {
            return Ok(());
        };
        if prepared.loader.is_installed() {
            debug!("Mod loader {} already installed", prepared.loader.version());
            return Ok(());
        }
        info!("Installing mod loader {}", prepared.loader.version());
        prepared.loader.install()?;
        self.registry.patch_forge_profile()
    }
}
