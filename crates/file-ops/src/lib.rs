//! Directory listing for the downloads folder.
//!
//! Stats every entry of a directory and formats it for display: a
//! human-readable size, a timestamp and the configured owner.

mod size;
mod status;

pub use size::pretty_size;
pub use status::{FileStatus, StatusError, get_files_status};
