//! Path handling for modpack installs
//!
//! Zip entry names and keeplist patterns both work on forward-slash relative
//! paths. This module handles:
//! - Converting `\` to `/` in entry names written by Windows tools
//! - Splitting off and stripping a top-level directory
//! - Locating `.minecraft` and the install/backup directories inside it

use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Directory inside a modpack (and inside `.minecraft`) owned by the installer.
pub const MARKER_DIR: &str = "trollauncher";

/// Location of the bundled Forge installer inside a modpack.
pub const INSTALLER_ENTRY: &str = "trollauncher/installer.jar";

/// Name of the launcher's profile registry inside `.minecraft`.
pub const LAUNCHER_PROFILES_FILE: &str = "launcher_profiles.json";

/// Convert Windows path separators to Linux
/// `mods\jei.jar` -> `mods/jei.jar`
pub fn to_linux_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Render a relative path with forward slashes on every platform.
pub fn to_generic_string(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    parts.join("/")
}

/// First component of an entry name, if the entry has a parent directory.
///
/// `Pack/mods/a.jar` -> `Some("Pack")`, `Pack/` -> `Some("Pack")`,
/// `readme.txt` -> `None`
pub fn top_level_component(name: &str) -> Option<&str> {
    let trimmed = name.trim_start_matches('/');
    let idx = trimmed.find('/')?;
    Some(&trimmed[..idx])
}

/// Strip `prefix` from `path` when `prefix` matches its leading components.
/// Paths that don't start with the prefix come back unchanged.
pub fn strip_prefix_components<'a>(path: &'a str, prefix: &str) -> &'a str {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        return path;
    }
    match path.strip_prefix(prefix) {
        Some("") => "",
        Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => path,
    }
}

/// True if a relative entry path stays inside whatever directory it is joined to.
pub fn is_safe_relative(path: &str) -> bool {
    let path = Path::new(path);
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Create parent directories for a path if they don't exist
pub fn ensure_parent_dirs(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Remove a file, treating "already gone" as success.
pub fn remove_file_if_exists(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// `/a/b/launcher_profiles.json` + `backup_` -> `/a/b/backup_launcher_profiles.json`
pub fn add_filename_prefix(path: &Path, prefix: &str) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{prefix}{file_name}"))
}

/// Find the default `.minecraft` directory
///
/// `$HOME/.minecraft` on Unix, `%APPDATA%\.minecraft` on Windows.
pub fn default_dot_minecraft() -> Result<PathBuf> {
    let base = if cfg!(windows) {
        dirs::config_dir()
    } else {
        dirs::home_dir()
    };
    let dot_minecraft = base.ok_or(Error::DotMinecraftNoDefault)?.join(".minecraft");
    if !dot_minecraft.is_dir() {
        return Err(Error::DotMinecraftNoDefault);
    }
    Ok(dot_minecraft)
}

/// Use `dot_minecraft` if given (it must exist), otherwise find the default.
pub fn resolve_dot_minecraft(dot_minecraft: Option<&Path>) -> Result<PathBuf> {
    match dot_minecraft {
        Some(path) if path.is_dir() => Ok(path.to_path_buf()),
        Some(path) => Err(Error::DotMinecraftNonexistent(path.to_path_buf())),
        None => default_dot_minecraft(),
    }
}

pub fn launcher_profiles_path(dot_minecraft: &Path) -> PathBuf {
    dot_minecraft.join(LAUNCHER_PROFILES_FILE)
}

/// Where a new profile is installed when the caller doesn't pick a directory.
pub fn default_install_path(dot_minecraft: &Path, profile_id: &str) -> PathBuf {
    dot_minecraft.join(MARKER_DIR).join(profile_id)
}

/// `<dot>/trollauncher/backups/<id>/<YYYYMMDD_HHMMSS>.zip`, timestamp in UTC.
pub fn backup_zip_path(dot_minecraft: &Path, profile_id: &str, now: DateTime<Utc>) -> PathBuf {
    dot_minecraft
        .join(MARKER_DIR)
        .join("backups")
        .join(profile_id)
        .join(format!("{}.zip", now.format("%Y%m%d_%H%M%S")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_to_linux_path() {
        assert_eq!(to_linux_path("mods\\jei.jar"), "mods/jei.jar");
        assert_eq!(to_linux_path("already/linux/path"), "already/linux/path");
        assert_eq!(to_linux_path("mixed\\path/style"), "mixed/path/style");
    }

    #[test]
    fn test_top_level_component() {
        assert_eq!(top_level_component("Pack/mods/a.jar"), Some("Pack"));
        assert_eq!(top_level_component("Pack/"), Some("Pack"));
        assert_eq!(top_level_component("readme.txt"), None);
    }

    #[test]
    fn test_strip_prefix_components() {
        assert_eq!(strip_prefix_components("Pack/mods/a.jar", "Pack"), "mods/a.jar");
        assert_eq!(strip_prefix_components("Pack/mods/a.jar", "Pack/mods"), "a.jar");
        // Only whole components are stripped
        assert_eq!(strip_prefix_components("Packed/a.jar", "Pack"), "Packed/a.jar");
        assert_eq!(strip_prefix_components("other/a.jar", "Pack"), "other/a.jar");
        assert_eq!(strip_prefix_components("Pack", "Pack"), "");
    }

    #[test]
    fn test_is_safe_relative() {
        assert!(is_safe_relative("mods/a.jar"));
        assert!(is_safe_relative("./mods/a.jar"));
        assert!(!is_safe_relative("../a.jar"));
        assert!(!is_safe_relative("mods/../../a.jar"));
        assert!(!is_safe_relative("/etc/passwd"));
    }

    #[test]
    fn test_add_filename_prefix() {
        let path = Path::new("/home/user/.minecraft/launcher_profiles.json");
        assert_eq!(
            add_filename_prefix(path, "backup_"),
            PathBuf::from("/home/user/.minecraft/backup_launcher_profiles.json")
        );
    }

    #[test]
    fn test_generic_string() {
        let path: PathBuf = ["saves", "world1", "level.dat"].iter().collect();
        assert_eq!(to_generic_string(&path), "saves/world1/level.dat");
    }

    #[test]
    fn test_backup_zip_path() {
        let now = Utc.with_ymd_and_hms(2019, 12, 12, 3, 11, 18).unwrap();
        let path = backup_zip_path(Path::new("/mc"), "abc", now);
        assert_eq!(
            path,
            PathBuf::from("/mc/trollauncher/backups/abc/20191212_031118.zip")
        );
    }
}
