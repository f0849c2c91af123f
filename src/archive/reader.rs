//! Read-only access to a modpack zip.
//!
//! The entry list is read once on open (names normalized to forward slashes,
//! order preserved); extraction streams each entry straight to disk.
//!
//! # Top-level directory detection
//!
//! Modpacks are often zipped with an extra wrapper folder (`MyPack/mods/...`).
//! [`ModpackArchive::detect_top_level_dir`] looks at the first entry: if it
//! sits under a directory that isn't one of the well-known roots (`mods`,
//! `config`, `trollauncher`), and every other file shares that first
//! component, that component is treated as the wrapper and stripped on
//! extraction.
//!
//! This can't tell a wrapper apart from a pack whose real content all happens
//! to live in a single directory. Such packs are stripped too.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::keeplist::Keeplist;
use crate::paths;

/// First components that mean the archive is already rooted correctly.
const WELL_KNOWN_ROOTS: &[&str] = &["mods", "config", paths::MARKER_DIR];

/// Information about an entry in the archive.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Path within the archive (forward slashes, case-preserved)
    pub name: String,
    /// Whether this is a directory
    pub is_dir: bool,
    index: usize,
}

/// An open modpack zip.
#[derive(Debug)]
pub struct ModpackArchive {
    path: PathBuf,
    zip: ZipArchive<BufReader<File>>,
    entries: Vec<ArchiveEntry>,
}

impl ModpackArchive {
    /// Open a zip file for reading.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ArchiveNonexistent(path.to_path_buf()));
        }
        if !path.is_file() {
            return Err(Error::ArchiveNotRegularFile(path.to_path_buf()));
        }
        let open_failed = |source| Error::ArchiveOpenFailed {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(|e| open_failed(zip::result::ZipError::Io(e)))?;
        let mut zip = ZipArchive::new(BufReader::new(file)).map_err(open_failed)?;

        let mut entries = Vec::with_capacity(zip.len());
        for index in 0..zip.len() {
            let entry = zip.by_index_raw(index).map_err(open_failed)?;
            entries.push(ArchiveEntry {
                name: paths::to_linux_path(entry.name()),
                is_dir: entry.is_dir(),
                index,
            });
        }
        debug!("Opened {} ({} entries)", path.display(), entries.len());

        Ok(Self {
            path: path.to_path_buf(),
            zip,
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries, in archive order.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Find the wrapper directory shared by every file, if there is one.
    pub fn detect_top_level_dir(&self) -> Option<String> {
        let first = self.entries.first()?;
        let candidate = paths::top_level_component(&first.name)?;
        if WELL_KNOWN_ROOTS.contains(&candidate) {
            return None;
        }
        for entry in self.entries.iter().skip(1).filter(|e| !e.is_dir) {
            if paths::top_level_component(&entry.name) != Some(candidate) {
                return None;
            }
        }
        Some(candidate.to_string())
    }

    /// Extract a single file to `dest_dir/entry_path`.
    ///
    /// The entry is looked up as `add_prefix/entry_path` when a prefix is
    /// given, so a wrapped archive can be read with unwrapped names.
    pub fn extract_one(
        &mut self,
        dest_dir: &Path,
        entry_path: &str,
        add_prefix: Option<&str>,
    ) -> Result<PathBuf> {
        let lookup = match add_prefix {
            Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), entry_path),
            None => entry_path.to_string(),
        };
        let entry = self
            .entries
            .iter()
            .find(|e| e.name == lookup)
            .ok_or_else(|| Error::EntryNotFound(lookup.clone()))?;
        if entry.is_dir {
            return Err(Error::EntryNotFile(lookup));
        }
        if !paths::is_safe_relative(entry_path) {
            return Err(Error::UnsafeEntryPath(entry_path.to_string()));
        }
        let index = entry.index;
        let dest_path = dest_dir.join(entry_path);
        self.write_entry(index, &lookup, &dest_path)?;
        Ok(dest_path)
    }

    /// Extract every file, stripping `strip_prefix` from entry names.
    pub fn extract_all(&mut self, dest_dir: &Path, strip_prefix: Option<&str>) -> Result<usize> {
        self.extract_filtered(dest_dir, strip_prefix, None, &mut |_, _| {})
    }

    /// Extract every file whose stripped path is not kept by `keeplist`.
    ///
    /// Existing files are overwritten. `on_entry(done, total)` is called after
    /// each file entry, extracted or skipped. Stops at the first error; files
    /// already written stay on disk. Returns the number of files written.
    pub fn extract_filtered(
        &mut self,
        dest_dir: &Path,
        strip_prefix: Option<&str>,
        keeplist: Option<&Keeplist>,
        on_entry: &mut dyn FnMut(usize, usize),
    ) -> Result<usize> {
        let files: Vec<(usize, String)> = self
            .entries
            .iter()
            .filter(|e| !e.is_dir)
            .map(|e| (e.index, e.name.clone()))
            .collect();
        let total = files.len();
        let mut extracted = 0;
        let mut skipped = 0;

        for (done, (index, name)) in files.iter().enumerate() {
            let rel_path = match strip_prefix {
                Some(prefix) => paths::strip_prefix_components(name, prefix),
                None => name.as_str(),
            };
            let keep = keeplist.is_some_and(|k| !k.is_overwrite(rel_path));
            if rel_path.is_empty() || keep {
                skipped += 1;
            } else {
                if !paths::is_safe_relative(rel_path) {
                    return Err(Error::UnsafeEntryPath(name.clone()));
                }
                self.write_entry(*index, name, &dest_dir.join(rel_path))?;
                extracted += 1;
            }
            on_entry(done + 1, total);
        }

        info!(
            "Extracted {} files to {} ({} skipped)",
            extracted,
            dest_dir.display(),
            skipped
        );
        Ok(extracted)
    }

    fn write_entry(&mut self, index: usize, name: &str, dest_path: &Path) -> Result<()> {
        let extract_failed = |source| Error::ExtractFailed {
            path: dest_path.to_path_buf(),
            source,
        };
        let mut entry = self.zip.by_index(index).map_err(|source| Error::ArchiveReadFailed {
            name: name.to_string(),
            source,
        })?;
        paths::ensure_parent_dirs(dest_path).map_err(extract_failed)?;
        let mut output = File::create(dest_path).map_err(extract_failed)?;
        io::copy(&mut entry, &mut output).map_err(extract_failed)?;
        Ok(())
    }
}

/// Read a small entry (metadata, not mod jars) into a string.
///
/// Returns `None` if the archive has no entry with that name.
pub fn read_entry_to_string<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    name: &str,
) -> Option<io::Result<String>> {
    let mut entry = zip.by_name(name).ok()?;
    let mut data = String::new();
    Some(entry.read_to_string(&mut data).map(|_| data))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    pub(crate) fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        for (name, data) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, options).unwrap();
            } else {
                zip.start_file(*name, options).unwrap();
                zip.write_all(data).unwrap();
            }
        }
        zip.finish().unwrap();
    }

    fn open_with(entries: &[(&str, &[u8])]) -> (TempDir, ModpackArchive) {
        let temp_dir = TempDir::new().unwrap();
        let zip_path = temp_dir.path().join("pack.zip");
        write_zip(&zip_path, entries);
        let archive = ModpackArchive::open(&zip_path).unwrap();
        (temp_dir, archive)
    }

    #[test]
    fn test_open_missing() {
        let err = ModpackArchive::open(Path::new("/nonexistent/pack.zip")).unwrap_err();
        assert!(matches!(err, Error::ArchiveNonexistent(_)));
    }

    #[test]
    fn test_open_directory() {
        let temp_dir = TempDir::new().unwrap();
        let err = ModpackArchive::open(temp_dir.path()).unwrap_err();
        assert!(matches!(err, Error::ArchiveNotRegularFile(_)));
    }

    #[test]
    fn test_open_not_a_zip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pack.zip");
        fs::write(&path, b"definitely not a zip file").unwrap();
        let err = ModpackArchive::open(&path).unwrap_err();
        assert!(matches!(err, Error::ArchiveOpenFailed { .. }));
    }

    #[test]
    fn test_detect_wrapper_dir() {
        let (_dir, archive) = open_with(&[
            ("MyPack/", b""),
            ("MyPack/mods/a.jar", b"a"),
            ("MyPack/config/b.cfg", b"b"),
            ("MyPack/trollauncher/installer.jar", b"jar"),
        ]);
        assert_eq!(archive.detect_top_level_dir().as_deref(), Some("MyPack"));
    }

    #[test]
    fn test_detect_well_known_root() {
        let (_dir, archive) = open_with(&[("mods/a.jar", b"a"), ("mods/b.jar", b"b")]);
        assert_eq!(archive.detect_top_level_dir(), None);
    }

    #[test]
    fn test_detect_top_level_file() {
        let (_dir, archive) = open_with(&[("readme.txt", b"hi"), ("Pack/mods/a.jar", b"a")]);
        assert_eq!(archive.detect_top_level_dir(), None);
    }

    #[test]
    fn test_detect_mixed_components() {
        let (_dir, archive) = open_with(&[
            ("Pack/mods/a.jar", b"a"),
            ("Other/config/b.cfg", b"b"),
        ]);
        assert_eq!(archive.detect_top_level_dir(), None);

        let (_dir, archive) = open_with(&[("Pack/mods/a.jar", b"a"), ("loose.txt", b"b")]);
        assert_eq!(archive.detect_top_level_dir(), None);
    }

    #[test]
    fn test_detect_ignores_directories() {
        let (_dir, archive) = open_with(&[
            ("Pack/mods/a.jar", b"a"),
            ("Other/", b""),
            ("Pack/config/b.cfg", b"b"),
        ]);
        assert_eq!(archive.detect_top_level_dir().as_deref(), Some("Pack"));
    }

    #[test]
    fn test_extract_all_roundtrip() {
        let files: &[(&str, &[u8])] = &[
            ("mods/a.jar", b"jar bytes \x00\x01\x02"),
            ("config/b.cfg", b"key=value\n"),
            ("config/nested/deep/c.toml", b"[section]\n"),
        ];
        let (dir, mut archive) = open_with(files);
        let dest = dir.path().join("out");
        let count = archive.extract_all(&dest, None).unwrap();
        assert_eq!(count, 3);
        for (name, data) in files {
            assert_eq!(fs::read(dest.join(name)).unwrap(), *data);
        }
    }

    #[test]
    fn test_extract_all_strips_prefix() {
        let (dir, mut archive) = open_with(&[
            ("Pack/", b""),
            ("Pack/mods/a.jar", b"a"),
            ("Pack/options.txt", b"o"),
        ]);
        let dest = dir.path().join("out");
        let prefix = archive.detect_top_level_dir();
        archive.extract_all(&dest, prefix.as_deref()).unwrap();
        assert_eq!(fs::read(dest.join("mods/a.jar")).unwrap(), b"a");
        assert_eq!(fs::read(dest.join("options.txt")).unwrap(), b"o");
        assert!(!dest.join("Pack").exists());
    }

    #[test]
    fn test_extract_filtered_skips_kept() {
        let (dir, mut archive) = open_with(&[
            ("mods/new.jar", b"new"),
            ("saves/world1/level.dat", b"archive level"),
            ("options.txt", b"archive options"),
        ]);
        let dest = dir.path().join("out");
        fs::create_dir_all(dest.join("saves/world1")).unwrap();
        fs::write(dest.join("saves/world1/level.dat"), b"user level").unwrap();

        let mut calls = Vec::new();
        let keeplist = Keeplist::default();
        let count = archive
            .extract_filtered(&dest, None, Some(&keeplist), &mut |done, total| {
                calls.push((done, total))
            })
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(fs::read(dest.join("mods/new.jar")).unwrap(), b"new");
        assert_eq!(fs::read(dest.join("saves/world1/level.dat")).unwrap(), b"user level");
        assert!(!dest.join("options.txt").exists());
        assert_eq!(calls, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_extract_overwrites_existing() {
        let (dir, mut archive) = open_with(&[("mods/a.jar", b"new contents")]);
        let dest = dir.path().join("out");
        fs::create_dir_all(dest.join("mods")).unwrap();
        fs::write(dest.join("mods/a.jar"), b"old contents that are longer").unwrap();
        archive.extract_all(&dest, None).unwrap();
        assert_eq!(fs::read(dest.join("mods/a.jar")).unwrap(), b"new contents");
    }

    #[test]
    fn test_extract_one() {
        let (dir, mut archive) = open_with(&[
            ("Pack/trollauncher/installer.jar", b"jar"),
            ("Pack/mods/a.jar", b"a"),
        ]);
        let dest = dir.path().join("tmp");
        let path = archive
            .extract_one(&dest, paths::INSTALLER_ENTRY, Some("Pack"))
            .unwrap();
        assert_eq!(path, dest.join("trollauncher/installer.jar"));
        assert_eq!(fs::read(&path).unwrap(), b"jar");
        assert!(!dest.join("mods").exists());
    }

    #[test]
    fn test_extract_one_missing_or_dir() {
        let (dir, mut archive) = open_with(&[("trollauncher/", b""), ("mods/a.jar", b"a")]);
        let dest = dir.path().join("tmp");
        let err = archive.extract_one(&dest, paths::INSTALLER_ENTRY, None).unwrap_err();
        assert!(matches!(err, Error::EntryNotFound(_)));
        let err = archive.extract_one(&dest, "trollauncher/", None).unwrap_err();
        assert!(matches!(err, Error::EntryNotFile(_)));
    }

    #[test]
    fn test_extract_rejects_escaping_paths() {
        let (dir, mut archive) = open_with(&[("mods/a.jar", b"a"), ("../evil.txt", b"x")]);
        let dest = dir.path().join("out");
        let err = archive.extract_all(&dest, None).unwrap_err();
        assert!(matches!(err, Error::UnsafeEntryPath(_)));
        assert!(!dir.path().join("evil.txt").exists());
        // Files before the bad entry are left in place
        assert!(dest.join("mods/a.jar").exists());
    }

    #[test]
    fn test_backslash_names_are_normalized() {
        let (dir, mut archive) = open_with(&[("mods\\a.jar", b"a")]);
        assert_eq!(archive.entries()[0].name, "mods/a.jar");
        let dest = dir.path().join("out");
        archive.extract_all(&dest, None).unwrap();
        assert!(dest.join("mods/a.jar").is_file());
    }

    #[test]
    fn test_extract_fails_on_blocked_path() {
        let (dir, mut archive) = open_with(&[("mods/a.jar", b"a")]);
        let dest = dir.path().join("out");
        fs::create_dir_all(&dest).unwrap();
        // A plain file where the "mods" directory should go
        fs::write(dest.join("mods"), b"in the way").unwrap();
        let err = archive.extract_all(&dest, None).unwrap_err();
        assert!(matches!(err, Error::ExtractFailed { .. }));
    }
}
