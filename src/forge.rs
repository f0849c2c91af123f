//! Forge installer bundled in a modpack.
//!
//! The installer jar carries a `version.json` naming the version it installs
//! (`id`, e.g. `1.14.4-forge-28.1.106`) and the game version it builds on
//! (`inheritsFrom`, e.g. `1.14.4`). Installing means running the jar with
//! Java and letting it write into `.minecraft`.

use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::info;
use zip::ZipArchive;

use crate::archive::reader::read_entry_to_string;
use crate::error::{Error, Result};
use crate::java::{RuntimeLocator, SystemJava};

const VERSION_JSON: &str = "version.json";

/// A mod loader that has to be installed into `.minecraft` before a modpack
/// can run.
pub trait ModLoaderInstaller {
    /// Version id the launcher profile should start, e.g. `1.14.4-forge-28.1.106`
    fn version(&self) -> &str;

    /// Whether the loader version is already present in `.minecraft`.
    fn is_installed(&self) -> bool;

    /// Install the loader. Blocks until the external installer exits.
    fn install(&self) -> Result<()>;
}

/// Builds a [`ModLoaderInstaller`] from the installer extracted from a modpack.
pub trait LoaderFactory {
    fn create(
        &self,
        installer_path: &Path,
        dot_minecraft: &Path,
    ) -> Result<Box<dyn ModLoaderInstaller>>;
}

/// Creates [`ForgeInstaller`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct ForgeLoaderFactory;

impl LoaderFactory for ForgeLoaderFactory {
    fn create(
        &self,
        installer_path: &Path,
        dot_minecraft: &Path,
    ) -> Result<Box<dyn ModLoaderInstaller>> {
        Ok(Box::new(ForgeInstaller::open(installer_path, dot_minecraft)?))
    }
}

#[derive(Debug, Deserialize)]
struct VersionJson {
    #[serde(default)]
    id: String,
    #[serde(default, rename = "inheritsFrom")]
    inherits_from: String,
}

#[derive(Debug, Clone)]
pub struct ForgeInstaller {
    installer_path: PathBuf,
    dot_minecraft: PathBuf,
    forge_version: String,
    minecraft_version: String,
    java: Option<PathBuf>,
}

impl ForgeInstaller {
    /// Validate the installer jar and read its version metadata.
    pub fn open(installer_path: &Path, dot_minecraft: &Path) -> Result<Self> {
        if !installer_path.exists() {
            return Err(Error::ForgeInstallerNonexistent(installer_path.to_path_buf()));
        }
        if !installer_path.is_file() {
            return Err(Error::ForgeInstallerNotRegularFile(installer_path.to_path_buf()));
        }
        let open_failed = |source| Error::ForgeInstallerOpenFailed {
            path: installer_path.to_path_buf(),
            source,
        };
        let file = File::open(installer_path)
            .map_err(|e| open_failed(zip::result::ZipError::Io(e)))?;
        let mut jar = ZipArchive::new(BufReader::new(file)).map_err(open_failed)?;

        let text = read_entry_to_string(&mut jar, VERSION_JSON)
            .ok_or(Error::ForgeVersionJsonMissing)?
            .map_err(Error::ForgeVersionJsonReadFailed)?;
        let version: VersionJson =
            serde_json::from_str(&text).map_err(Error::ForgeVersionJsonParseFailed)?;
        if version.id.is_empty() || version.inherits_from.is_empty() {
            return Err(Error::ForgeVersionJsonInvalid);
        }

        Ok(Self {
            installer_path: installer_path.to_path_buf(),
            dot_minecraft: dot_minecraft.to_path_buf(),
            forge_version: version.id,
            minecraft_version: version.inherits_from,
            java: None,
        })
    }

    /// Run the installer with this Java instead of searching for one.
    pub fn with_java(mut self, java: PathBuf) -> Self {
        self.java = Some(java);
        self
    }

    /// E.g. `1.14.4-forge-28.1.109`
    pub fn forge_version(&self) -> &str {
        &self.forge_version
    }

    /// E.g. `1.14.4`
    pub fn minecraft_version(&self) -> &str {
        &self.minecraft_version
    }

    /// `.minecraft/versions/<id>/<id>.json`
    fn installed_version_path(&self) -> PathBuf {
        self.dot_minecraft
            .join("versions")
            .join(&self.forge_version)
            .join(format!("{}.json", self.forge_version))
    }
}

impl ModLoaderInstaller for ForgeInstaller {
    fn version(&self) -> &str {
        &self.forge_version
    }

    fn is_installed(&self) -> bool {
        self.installed_version_path().exists()
    }

    fn install(&self) -> Result<()> {
        let java = match &self.java {
            Some(java) => java.clone(),
            None => SystemJava.find_any_runtime().ok_or(Error::NoJava)?,
        };
        info!(
            "Running Forge {} installer for Minecraft {} with {}",
            self.forge_version,
            self.minecraft_version,
            java.display()
        );
        let status = Command::new(&java)
            .arg("-jar")
            .arg(&self.installer_path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(Error::ForgeExecuteFailed)?;
        if !status.success() {
            return Err(Error::ForgeInstallFailed(status.to_string()));
        }
        if !self.is_installed() {
            return Err(Error::ForgeBadInstall);
        }
        info!("Installed Forge {}", self.forge_version);
        Ok(())
    }
}
