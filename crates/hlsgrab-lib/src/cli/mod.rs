mod args;
mod download;
mod params;
mod resolved_command;

pub use args::{Command, parse_args};
pub use download::run_download;
pub use params::{DownloadParams, ListRequest};
pub use resolved_command::{ResolvedCommand, load_manifest, resolve_command};
