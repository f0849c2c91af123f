//! Java runtime detection.
//!
//! Forge installers for the supported game versions need Java 8, but any
//! Java can run the installer jar itself.
//!
//! Search order:
//! 1. The runtime bundled with the vanilla launcher (Windows)
//! 2. `/usr/lib/jvm/*/bin/java` (Linux) or `Program Files\Java\*\bin\javaw.exe` (Windows)
//! 3. `java` / `javaw` on `PATH`
//!
//! A candidate only counts if `<java> -version` runs and reports a version.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// `java version "1.8.0_51"`, `openjdk version "11.0.5" 2019-10-15`
static VERSION_LINE_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"^[^ ]+ version "([^"]+)""#).ok());

static JAVA_8_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^1\.8\.[0-9]+").ok());

/// Finds Java executables.
pub trait RuntimeLocator {
    /// Any working Java.
    fn find_any_runtime(&self) -> Option<PathBuf>;

    /// A Java the modpack can run on (Java 8).
    fn find_compatible_runtime(&self) -> Option<PathBuf>;
}

/// Searches the usual install locations on this machine.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemJava;

impl RuntimeLocator for SystemJava {
    fn find_any_runtime(&self) -> Option<PathBuf> {
        find_java(None)
    }

    fn find_compatible_runtime(&self) -> Option<PathBuf> {
        find_java(Some(is_java_8 as fn(&str) -> bool))
    }
}

/// First candidate that runs and, if `accept` is given, reports an accepted version.
fn find_java(accept: Option<fn(&str) -> bool>) -> Option<PathBuf> {
    let found = candidate_paths()
        .into_iter()
        .find(|path| check_java(path, accept));
    match &found {
        Some(path) => debug!("Using Java at {}", path.display()),
        None => debug!("No suitable Java found"),
    }
    found
}

fn program_files_dirs() -> Vec<PathBuf> {
    if !cfg!(windows) {
        return Vec::new();
    }
    let mut dirs: Vec<PathBuf> = ["PROGRAMFILES", "PROGRAMFILES(X86)"]
        .iter()
        .filter_map(std::env::var_os)
        .map(PathBuf::from)
        .collect();
    dirs.dedup();
    dirs
}

/// Subdirectories of `root`, sorted so the search order is stable.
fn subdirs(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs
}

fn candidate_paths() -> Vec<PathBuf> {
    let program_files = program_files_dirs();
    let mut candidates = Vec::new();

    // C:\Program Files (x86)\Minecraft Launcher\runtime\jre-x64\bin\javaw.exe
    for root in &program_files {
        for launcher in ["Minecraft Launcher", "Minecraft"] {
            candidates.push(root.join(launcher).join(r"runtime\jre-x64\bin\javaw.exe"));
        }
    }

    if cfg!(windows) {
        // C:\Program Files\Java\jre1.8.0_231\bin\javaw.exe
        for root in &program_files {
            for dir in subdirs(&root.join("Java")) {
                candidates.push(dir.join(r"bin\javaw.exe"));
            }
        }
    } else {
        // /usr/lib/jvm/java-8-openjdk-amd64/bin/java
        for dir in subdirs(Path::new("/usr/lib/jvm")) {
            candidates.push(dir.join("bin/java"));
        }
    }

    let command = if cfg!(windows) { "javaw" } else { "java" };
    if let Ok(path) = which::which(command) {
        candidates.push(path);
    }
    candidates
}

/// Extract the version from the first line of `java -version` output.
pub fn parse_version_line(line: &str) -> Option<&str> {
    let re = VERSION_LINE_RE.as_ref()?;
    re.captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Run `<java> -version` and return the reported version.
pub fn java_version(java: &Path) -> Option<String> {
    if !java.is_file() {
        return None;
    }
    let output = Command::new(java).arg("-version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    // Java prints its version to stderr
    let text = if output.stderr.is_empty() {
        String::from_utf8_lossy(&output.stdout).into_owned()
    } else {
        String::from_utf8_lossy(&output.stderr).into_owned()
    };
    let first_line = text.lines().next()?;
    parse_version_line(first_line).map(str::to_string)
}

fn check_java(java: &Path, accept: Option<fn(&str) -> bool>) -> bool {
    match java_version(java) {
        Some(version) => accept.is_none_or(|accept| accept(&version)),
        None => false,
    }
}

/// True if `version` is a Java 8 version string (`1.8.0_232`).
pub fn is_java_8(version: &str) -> bool {
    JAVA_8_RE.as_ref().is_some_and(|re| re.is_match(version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_line() {
        assert_eq!(
            parse_version_line(r#"java version "1.8.0_51""#),
            Some("1.8.0_51")
        );
        assert_eq!(
            parse_version_line(r#"openjdk version "11.0.5" 2019-10-15"#),
            Some("11.0.5")
        );
        assert_eq!(parse_version_line("Picked up _JAVA_OPTIONS: -Xmx1G"), None);
        assert_eq!(parse_version_line(""), None);
    }

    #[test]
    fn test_is_java_8() {
        assert!(is_java_8("1.8.0_232"));
        assert!(!is_java_8("11.0.5"));
        assert!(!is_java_8("1.7.0_80"));
        assert!(!is_java_8("21.1.8.0"));
    }

    #[test]
    fn test_missing_java() {
        assert_eq!(java_version(Path::new("/nonexistent/bin/java")), None);
        assert!(!check_java(Path::new("/nonexistent/bin/java"), None));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_java_executable() {
        let false_bin = Path::new("/bin/false");
        if false_bin.is_file() {
            assert_eq!(java_version(false_bin), None);
        }
    }
}
