//! Zip backups of the files an update is about to replace.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::Path;

use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::paths;

/// Write `source_dir/<rel>` for every `rel` in `rel_paths` into a new zip at
/// `target`, using `rel` as the entry name.
///
/// Refuses to touch an existing `target`. Missing parent directories are
/// created. If any file can't be added the partial zip is removed.
/// `on_file(done, total)` is called after each file is added.
pub fn create_backup<S: AsRef<str>>(
    target: &Path,
    source_dir: &Path,
    rel_paths: &[S],
    on_file: &mut dyn FnMut(usize, usize),
) -> Result<()> {
    let write_failed = |source| Error::BackupWriteFailed {
        path: target.to_path_buf(),
        source,
    };
    paths::ensure_parent_dirs(target).map_err(write_failed)?;
    let file = match OpenOptions::new().write(true).create_new(true).open(target) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(Error::BackupExists(target.to_path_buf()))
        }
        Err(e) => return Err(write_failed(e)),
    };

    let result = write_entries(
        ZipWriter::new(BufWriter::new(file)),
        target,
        source_dir,
        rel_paths,
        on_file,
    );
    if result.is_err() {
        if let Err(e) = paths::remove_file_if_exists(target) {
            warn!("Failed to remove partial backup {}: {}", target.display(), e);
        }
    }
    result
}

fn write_entries<S: AsRef<str>>(
    mut zip: ZipWriter<BufWriter<File>>,
    target: &Path,
    source_dir: &Path,
    rel_paths: &[S],
    on_file: &mut dyn FnMut(usize, usize),
) -> Result<()> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(true);
    let total = rel_paths.len();

    for (done, rel) in rel_paths.iter().enumerate() {
        let rel = rel.as_ref();
        let add_failed = |source| Error::BackupAddFailed {
            name: rel.to_string(),
            source,
        };
        let mut input = File::open(source_dir.join(rel)).map_err(add_failed)?;
        zip.start_file(rel, options)
            .map_err(|e| add_failed(io::Error::other(e)))?;
        io::copy(&mut input, &mut zip).map_err(add_failed)?;
        debug!("Backed up {}", rel);
        on_file(done + 1, total);
    }

    zip.finish().map_err(|source| Error::BackupFinishFailed {
        path: target.to_path_buf(),
        source,
    })?;
    info!("Backed up {} files to {}", total, target.display());
    Ok(())
}
