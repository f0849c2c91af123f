//! Packwright - Minecraft modpack installer
//!
//! Installs zipped Forge modpacks into launcher profiles and updates them
//! in place, keeping player data like saves and options.

pub mod archive;
pub mod error;
pub mod forge;
pub mod installer;
pub mod java;
pub mod keeplist;
pub mod paths;
pub mod process;
pub mod profiles;

pub use error::{Error, ErrorKind, Result};
pub use installer::{
    InstallRequest, ModpackInstaller, ModpackUpdater, ProgressCallback, ProgressUpdate, Stage,
    UpdateSummary,
};
pub use keeplist::Keeplist;
pub use profiles::{ProfileRecord, ProfileRegistry};
