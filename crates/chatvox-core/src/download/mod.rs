//! Download domain types, events, and errors.
//!
//! Pure data types for the download subsystem. The transfer engine
//! itself lives in the `chatvox-download` crate; everything that crosses
//! a crate or presentation boundary is defined here.

mod errors;
mod events;
mod types;

pub use errors::DownloadError;
pub use events::DownloadEvent;
pub use types::{DownloadStatus, DownloadTask};
