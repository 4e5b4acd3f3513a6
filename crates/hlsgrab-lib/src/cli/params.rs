use crate::config::Config;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One playlist to download, as given on the command line or in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListRequest {
    pub url: String,
    pub output_dir: PathBuf,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct DownloadParams {
    pub app_config: Config,
    pub requests: Vec<ListRequest>,
}
