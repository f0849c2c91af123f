//! Archive handling: reading modpack zips and writing update backups.
//!
//! Both sides use the zip crate.

pub mod backup;
pub mod reader;

pub use backup::create_backup;
pub use reader::{ArchiveEntry, ModpackArchive};
