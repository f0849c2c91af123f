//! Modpack install and update orchestration
//!
//! Both flows share the same first phases:
//! 1. Prep     - extract `trollauncher/installer.jar` from the modpack and load it
//! 2. Forge    - run the Forge installer if its version isn't in `.minecraft` yet
//!
//! An install then extracts the whole modpack into an empty directory and adds
//! a launcher profile. An update backs up and replaces everything in an
//! existing profile except files matched by the keeplist.

mod context;
pub mod install;
pub mod progress;
pub mod update;

pub use install::{InstallRequest, ModpackInstaller};
pub use progress::{ProgressCallback, ProgressUpdate, Stage};
pub use update::{ModpackUpdater, UpdateSummary};

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::paths;
use crate::profiles::{ProfileRecord, ProfileRegistry};

/// Launcher directories that mark a game directory as a full `.minecraft`
/// rather than a modpack profile.
const DOT_MINECRAFT_DIRS: &[&str] = &["assets", "libraries", "versions"];

/// Profiles in `dot_minecraft` that look like modpack installs, most
/// recently used first.
pub fn installed_profiles(dot_minecraft: &Path) -> Result<Vec<ProfileRecord>> {
    let registry = ProfileRegistry::open_in(dot_minecraft)?;
    Ok(registry
        .list_profiles()
        .into_iter()
        .filter(profile_looks_like_install)
        .collect())
}

/// A `custom` profile whose game directory looks like an install.
pub fn profile_looks_like_install(profile: &ProfileRecord) -> bool {
    profile.is_custom()
        && profile
            .game_path
            .as_deref()
            .is_some_and(dir_looks_like_install)
}

/// An empty directory, or one holding the bundled installer that isn't a
/// whole `.minecraft`.
pub fn dir_looks_like_install(dir: &Path) -> bool {
    if dir_is_empty(dir) {
        return true;
    }
    let has_installer = dir.join(paths::INSTALLER_ENTRY).is_file();
    let is_dot_minecraft = DOT_MINECRAFT_DIRS
        .iter()
        .all(|name| dir.join(name).is_dir());
    has_installer && !is_dot_minecraft
}

fn dir_is_empty(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn custom(id: &str, game_path: &Path) -> ProfileRecord {
        ProfileRecord {
            id: id.to_string(),
            profile_type: Some("custom".to_string()),
            game_path: Some(game_path.to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn test_dir_heuristic() {
        let dir = tempdir().unwrap();
        let root = dir.path();

        let empty = root.join("empty");
        fs::create_dir_all(&empty).unwrap();
        assert!(dir_looks_like_install(&empty));

        let pack = root.join("pack");
        fs::create_dir_all(pack.join("trollauncher")).unwrap();
        fs::write(pack.join("trollauncher/installer.jar"), b"jar").unwrap();
        assert!(dir_looks_like_install(&pack));

        let vanilla = root.join("vanilla");
        fs::create_dir_all(vanilla.join("trollauncher")).unwrap();
        fs::write(vanilla.join("trollauncher/installer.jar"), b"jar").unwrap();
        for name in DOT_MINECRAFT_DIRS {
            fs::create_dir_all(vanilla.join(name)).unwrap();
        }
        assert!(!dir_looks_like_install(&vanilla));

        let other = root.join("other");
        fs::create_dir_all(other.join("mods")).unwrap();
        assert!(!dir_looks_like_install(&other));

        assert!(!dir_looks_like_install(&root.join("missing")));
    }

    #[test]
    fn test_profile_heuristic() {
        let dir = tempdir().unwrap();
        assert!(profile_looks_like_install(&custom("a", dir.path())));

        let mut release = custom("b", dir.path());
        release.profile_type = Some("latest-release".to_string());
        assert!(!profile_looks_like_install(&release));

        let mut no_dir = custom("c", dir.path());
        no_dir.game_path = None;
        assert!(!profile_looks_like_install(&no_dir));
    }

    #[test]
    fn test_installed_profiles() {
        let dir = tempdir().unwrap();
        let dot_minecraft = dir.path().join(".minecraft");
        let pack = dir.path().join("pack");
        fs::create_dir_all(pack.join("trollauncher")).unwrap();
        fs::write(pack.join("trollauncher/installer.jar"), b"jar").unwrap();
        fs::create_dir_all(&dot_minecraft).unwrap();
        let registry = serde_json::json!({
            "profiles": {
                "pack": {"type": "custom", "gameDir": pack, "lastUsed": "2020-01-01T00:00:00.000Z"},
                "forge": {"type": "custom", "lastVersionId": "1.14.4-forge-28.1.106"},
                "release": {"type": "latest-release", "gameDir": pack}
            }
        });
        fs::write(
            paths::launcher_profiles_path(&dot_minecraft),
            registry.to_string(),
        )
        .unwrap();

        let ids: Vec<String> = installed_profiles(&dot_minecraft)
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["pack"]);

        let err = installed_profiles(&PathBuf::from("/nonexistent/.minecraft")).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InputValidation);
    }
}
