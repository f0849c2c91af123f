//! Error types shared by the installer library.
//!
//! Every fallible operation returns [`Error`]; front-ends print its `Display`
//! and can branch on [`Error::kind`].

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure categories, used by front-ends to pick a presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad user input: missing files, non-empty destinations, etc.
    InputValidation,
    /// Malformed JSON in the launcher profiles or in installer metadata
    Parse,
    /// Profile id or name already taken
    Conflict,
    /// Filesystem or archive I/O failure
    Io,
    /// Java missing, or the Forge installer failed
    ExternalProcess,
    /// Something on disk does not look the way it should
    State,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to detect default '.minecraft' directory")]
    DotMinecraftNoDefault,

    #[error("The '.minecraft' directory does not exist: {}", .0.display())]
    DotMinecraftNonexistent(PathBuf),

    // Launcher profiles
    #[error("Launcher profiles file does not exist: {}", .0.display())]
    RegistryMissing(PathBuf),

    #[error("Failed to read launcher profiles file {}", .path.display())]
    RegistryReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON of launcher profiles file {}", .path.display())]
    RegistryParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Launcher profiles file does not contain profile '{0}'")]
    ProfileNotFound(String),

    #[error("Launcher profiles file does not contain the Forge profile")]
    NoDefaultProfile,

    #[error("Profile ID is not unique: {0}")]
    IdInUse(String),

    #[error("Profile name is not unique: {0}")]
    NameInUse(String),

    #[error("Profile is missing required field '{0}'")]
    InvalidProfile(&'static str),

    #[error("Launcher profiles file is not writable: {}", .0.display())]
    NotWritable(PathBuf),

    #[error("Failed to backup launcher profiles file to {}", .path.display())]
    RegistryBackupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to launcher profiles file {}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Modpack archive
    #[error("Modpack zip file does not exist: {}", .0.display())]
    ArchiveNonexistent(PathBuf),

    #[error("Modpack zip file is not a regular file: {}", .0.display())]
    ArchiveNotRegularFile(PathBuf),

    #[error("Failed to open zip file {}", .path.display())]
    ArchiveOpenFailed {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Failed to read zip entry '{name}'")]
    ArchiveReadFailed {
        name: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Zip file has no entry '{0}'")]
    EntryNotFound(String),

    #[error("Zip entry '{0}' is not a file")]
    EntryNotFile(String),

    #[error("Zip entry '{0}' would extract outside of the destination")]
    UnsafeEntryPath(String),

    #[error("Failed to extract to {}", .path.display())]
    ExtractFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Custom keeplists are not supported: {}", .0.display())]
    KeeplistUnsupported(PathBuf),

    #[error("Invalid keeplist pattern '{pattern}'")]
    KeeplistPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    // Backups
    #[error("Backup file already exists: {}", .0.display())]
    BackupExists(PathBuf),

    #[error("Failed to write backup {}", .path.display())]
    BackupWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to add '{name}' to backup")]
    BackupAddFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to finalize backup {}", .path.display())]
    BackupFinishFailed {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    // Forge installer
    #[error("The Forge installer does not exist: {}", .0.display())]
    ForgeInstallerNonexistent(PathBuf),

    #[error("The Forge installer is not a regular file: {}", .0.display())]
    ForgeInstallerNotRegularFile(PathBuf),

    #[error("Failed to open Forge installer jar file {}", .path.display())]
    ForgeInstallerOpenFailed {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Forge installer jar file does not contain version.json")]
    ForgeVersionJsonMissing,

    #[error("Failed to read version.json from the Forge installer jar file")]
    ForgeVersionJsonReadFailed(#[source] std::io::Error),

    #[error("Failed to parse version.json from the Forge installer jar file")]
    ForgeVersionJsonParseFailed(#[source] serde_json::Error),

    #[error("Bad contents in version.json from the Forge installer jar file")]
    ForgeVersionJsonInvalid,

    #[error("No Java to run the Forge installer")]
    NoJava,

    #[error("Failed to execute the Forge installer")]
    ForgeExecuteFailed(#[source] std::io::Error),

    #[error("Forge installer failed to install (exit status: {0})")]
    ForgeInstallFailed(String),

    #[error("Forge installer ran, but didn't install correctly")]
    ForgeBadInstall,

    // Orchestration
    #[error("Failed to create temporary directory while preparing for modpack install")]
    PrepTempDirFailed(#[source] std::io::Error),

    #[error("Failed to unzip while preparing for modpack install")]
    PrepInstallFailed(#[source] Box<Error>),

    #[error("Failed to create directory for modpack install destination {}", .path.display())]
    DestinationCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("The modpack install destination is not a directory: {}", .0.display())]
    DestinationNotDirectory(PathBuf),

    #[error("The modpack install destination is not an empty directory: {}", .0.display())]
    DestinationNotEmpty(PathBuf),

    #[error("Failed to unzip the modpack zip file")]
    UnzipFailed(#[source] Box<Error>),

    #[error("Profile does not look like a previous install: {0}")]
    ProfileNotAnInstall(String),

    #[error("Failed to get profile files in {}", .path.display())]
    ProfileFilesFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to create backup of profile files")]
    ProfileBackupFailed(#[source] Box<Error>),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        use Error::*;
        match self {
            DotMinecraftNoDefault
            | DotMinecraftNonexistent(_)
            | RegistryMissing(_)
            | ArchiveNonexistent(_)
            | ArchiveNotRegularFile(_)
            | ArchiveOpenFailed { .. }
            | EntryNotFound(_)
            | EntryNotFile(_)
            | UnsafeEntryPath(_)
            | KeeplistUnsupported(_)
            | KeeplistPattern { .. }
            | InvalidProfile(_)
            | ForgeInstallerNonexistent(_)
            | ForgeInstallerNotRegularFile(_)
            | ForgeInstallerOpenFailed { .. }
            | DestinationNotDirectory(_)
            | DestinationNotEmpty(_) => ErrorKind::InputValidation,

            RegistryParseFailed { .. }
            | ForgeVersionJsonMissing
            | ForgeVersionJsonReadFailed(_)
            | ForgeVersionJsonParseFailed(_)
            | ForgeVersionJsonInvalid => ErrorKind::Parse,

            IdInUse(_) | NameInUse(_) => ErrorKind::Conflict,

            RegistryReadFailed { .. }
            | NotWritable(_)
            | RegistryBackupFailed { .. }
            | WriteFailed { .. }
            | ArchiveReadFailed { .. }
            | ExtractFailed { .. }
            | BackupExists(_)
            | BackupWriteFailed { .. }
            | BackupAddFailed { .. }
            | BackupFinishFailed { .. }
            | PrepTempDirFailed(_)
            | PrepInstallFailed(_)
            | DestinationCreationFailed { .. }
            | UnzipFailed(_)
            | ProfileFilesFailed { .. }
            | ProfileBackupFailed(_) => ErrorKind::Io,

            NoJava
            | ForgeExecuteFailed(_)
            | ForgeInstallFailed(_)
            | ForgeBadInstall => ErrorKind::ExternalProcess,

            ProfileNotFound(_) | NoDefaultProfile | ProfileNotAnInstall(_) => ErrorKind::State,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(Error::IdInUse("abc".into()).kind(), ErrorKind::Conflict);
        assert_eq!(Error::NoJava.kind(), ErrorKind::ExternalProcess);
        assert_eq!(
            Error::DestinationNotEmpty(PathBuf::from("/tmp/x")).kind(),
            ErrorKind::InputValidation
        );
        assert_eq!(Error::NoDefaultProfile.kind(), ErrorKind::State);
    }

    #[test]
    fn test_wrapped_source() {
        use std::error::Error as _;
        let err = Error::UnzipFailed(Box::new(Error::EntryNotFound("mods/a.jar".into())));
        assert_eq!(err.to_string(), "Failed to unzip the modpack zip file");
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("Zip file has no entry 'mods/a.jar'"));
    }
}
