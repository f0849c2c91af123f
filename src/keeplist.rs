//! Keeplist: files that survive a modpack update.
//!
//! Paths are relative to the profile directory and use forward slashes, e.g.
//! `config/my-mod.toml`, `mods/my-mod-1.14.4-0.jar`, `saves/world1/level.dat`.
//! Anything matching a keep pattern is user data and is never backed up,
//! deleted or overwritten by an update.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::error::{Error, Result};

/// Default keep patterns, anchored at the start of the relative path.
pub const DEFAULT_KEEP_PATTERNS: &[&str] = &[
    // Minecraft data
    r"^crash-reports/",
    r"^logs/",
    r"^resourcepacks/",
    r"^saves/",
    r"^screenshots/",
    r"^hotbar\.nbt",
    r"^options\.txt",
    r"^servers\.dat",
    r"^usercache\.json",
    r"^usernamecache\.json",
    // Optifine
    r"^shaderpacks/",
    r"^optionsof\.txt",
    // Reauth
    r"^reauth\.toml",
    // Xaero's maps
    r"^XaeroWaypoints/",
    r"^XaeroWorldMap/",
    // Structurize
    r"^structurize/",
    // Git
    r"^\.git/",
    r"^\.gitignore",
    r"^\.gitmodules",
];

static DEFAULT_KEEP_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    DEFAULT_KEEP_PATTERNS
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
});

/// What an update does with an existing file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    Keep,
    Overwrite,
}

#[derive(Debug, Clone)]
pub struct Keeplist {
    patterns: Vec<Regex>,
}

impl Default for Keeplist {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_KEEP_REGEXES.clone(),
        }
    }
}

impl Keeplist {
    /// Build a keeplist from explicit patterns.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        Ok(Self {
            patterns: compile(patterns)?,
        })
    }

    /// Keep everything this list keeps, plus paths matching `patterns`.
    pub fn with_patterns<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self> {
        self.patterns.extend(compile(patterns)?);
        Ok(self)
    }

    /// Loading a keeplist from a file is not supported; always fails.
    pub fn from_file(path: &Path) -> Result<Self> {
        Err(Error::KeeplistUnsupported(path.to_path_buf()))
    }

    pub fn classify(&self, path: &str) -> PathClass {
        if self.patterns.iter().any(|re| re.is_match(path)) {
            PathClass::Keep
        } else {
            PathClass::Overwrite
        }
    }

    pub fn is_overwrite(&self, path: &str) -> bool {
        self.classify(path) == PathClass::Overwrite
    }

    /// The paths an update may replace, in their original order.
    pub fn filter_overwritable<S: AsRef<str> + Clone>(&self, paths: &[S]) -> Vec<S> {
        paths
            .iter()
            .filter(|path| self.is_overwrite(path.as_ref()))
            .cloned()
            .collect()
    }
}

fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern.as_ref()).map_err(|source| Error::KeeplistPattern {
                pattern: pattern.as_ref().to_string(),
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patterns_compile() {
        assert_eq!(DEFAULT_KEEP_REGEXES.len(), DEFAULT_KEEP_PATTERNS.len());
    }

    #[test]
    fn test_classify_default() {
        let keeplist = Keeplist::default();
        assert_eq!(keeplist.classify("saves/world1/level.dat"), PathClass::Keep);
        assert_eq!(keeplist.classify("options.txt"), PathClass::Keep);
        assert_eq!(keeplist.classify(".git/HEAD"), PathClass::Keep);
        assert_eq!(keeplist.classify("XaeroWorldMap/foo/bar.zip"), PathClass::Keep);
        assert_eq!(keeplist.classify("mods/old.jar"), PathClass::Overwrite);
        assert_eq!(keeplist.classify("config/b.cfg"), PathClass::Overwrite);
        assert_eq!(keeplist.classify("trollauncher/installer.jar"), PathClass::Overwrite);
    }

    #[test]
    fn test_with_patterns_extends_defaults() {
        let keeplist = Keeplist::default().with_patterns(&["^config/"]).unwrap();
        assert_eq!(keeplist.classify("config/b.cfg"), PathClass::Keep);
        assert_eq!(keeplist.classify("saves/world1/level.dat"), PathClass::Keep);
        assert_eq!(keeplist.classify("mods/old.jar"), PathClass::Overwrite);

        let err = Keeplist::default().with_patterns(&["(unclosed"]).unwrap_err();
        assert!(matches!(err, Error::KeeplistPattern { ref pattern, .. } if pattern == "(unclosed"));
    }

    #[test]
    fn test_patterns_are_anchored() {
        let keeplist = Keeplist::default();
        assert_eq!(keeplist.classify("mods/saves/thing.jar"), PathClass::Overwrite);
        assert_eq!(keeplist.classify("config/options.txt"), PathClass::Overwrite);
        // Escaped dots only match a literal dot
        assert_eq!(keeplist.classify("optionsXtxt"), PathClass::Overwrite);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let keeplist = Keeplist::default();
        for path in ["saves/a", "mods/b.jar", "logs/latest.log", "servers.dat"] {
            let first = keeplist.classify(path);
            for _ in 0..10 {
                assert_eq!(keeplist.classify(path), first);
            }
        }
    }

    #[test]
    fn test_filter_overwritable_preserves_order() {
        let keeplist = Keeplist::default();
        let paths = vec![
            "mods/z.jar".to_string(),
            "saves/world1/level.dat".to_string(),
            "config/a.cfg".to_string(),
            "logs/latest.log".to_string(),
            "mods/a.jar".to_string(),
        ];
        let filtered = keeplist.filter_overwritable(&paths);
        assert_eq!(filtered, vec!["mods/z.jar", "config/a.cfg", "mods/a.jar"]);
        for path in &filtered {
            assert!(paths.contains(path));
            assert_eq!(keeplist.classify(path), PathClass::Overwrite);
        }
    }

    #[test]
    fn test_custom_patterns() {
        let keeplist = Keeplist::new(&["^journeymap/", "^config/local\\.toml$"]).unwrap();
        assert_eq!(keeplist.classify("journeymap/data.bin"), PathClass::Keep);
        assert_eq!(keeplist.classify("config/local.toml"), PathClass::Keep);
        assert_eq!(keeplist.classify("saves/world"), PathClass::Overwrite);

        let empty = Keeplist::new::<&str>(&[]).unwrap();
        assert_eq!(empty.classify("saves/world"), PathClass::Overwrite);
    }

    #[test]
    fn test_invalid_pattern() {
        let err = Keeplist::new(&["^saves/("]).unwrap_err();
        assert!(matches!(err, Error::KeeplistPattern { .. }));
    }

    #[test]
    fn test_from_file_unsupported() {
        let err = Keeplist::from_file(Path::new("keeplist.txt")).unwrap_err();
        assert!(matches!(err, Error::KeeplistUnsupported(_)));
    }
}
