use crate::cli::args::Command;
use crate::cli::params::{DownloadParams, ListRequest};
use crate::config::{Config, load_config};
use crate::error::HlsGrabError;
use itertools::Itertools;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub enum ResolvedCommand {
    Download(DownloadParams),
    Batch(DownloadParams),
}

fn resolve_config(
    config_path: Option<&str>,
    workers: Option<usize>,
    scratch_dir: Option<String>,
) -> Result<Config, HlsGrabError> {
    let mut app_config = load_config(config_path)?;
    if let Some(workers) = workers {
        app_config.workers = workers;
    }
    if let Some(scratch_dir) = scratch_dir {
        app_config.scratch_dir = Some(PathBuf::from(scratch_dir));
    }
    app_config.validate()?;
    Ok(app_config)
}

fn validate_request(request: &ListRequest) -> Result<(), HlsGrabError> {
    if request.url.trim().is_empty() {
        return Err(HlsGrabError::CliArgumentValidation {
            details: "Playlist URL must not be empty.".to_string(),
        });
    }
    if request.name.is_empty() || request.name.contains(['/', '\\']) {
        return Err(HlsGrabError::CliArgumentValidation {
            details: format!(
                "Output name {:?} must be a plain file name without extension.",
                request.name
            ),
        });
    }
    Ok(())
}

pub fn load_manifest(manifest_path: &Path) -> Result<Vec<ListRequest>, HlsGrabError> {
    let manifest_error = |reason: String| HlsGrabError::ManifestLoad {
        path: manifest_path.to_path_buf(),
        reason,
    };
    let content = std::fs::read(manifest_path).map_err(|e| manifest_error(e.to_string()))?;
    serde_json::from_slice(&content).map_err(|e| manifest_error(e.to_string()))
}

pub fn resolve_command(command: Command) -> Result<ResolvedCommand, HlsGrabError> {
    match command {
        Command::Download {
            config_path,
            url,
            output_dir,
            name,
            workers,
            scratch_dir,
        } => {
            let app_config = resolve_config(config_path.as_deref(), workers, scratch_dir)?;
            let request = ListRequest {
                url,
                output_dir: PathBuf::from(output_dir),
                name,
            };
            validate_request(&request)?;

            Ok(ResolvedCommand::Download(DownloadParams {
                app_config,
                requests: vec![request],
            }))
        }
        Command::Batch {
            config_path,
            manifest_path,
            workers,
            scratch_dir,
        } => {
            let app_config = resolve_config(config_path.as_deref(), workers, scratch_dir)?;
            let requests = load_manifest(Path::new(&manifest_path))?;
            if requests.is_empty() {
                return Err(HlsGrabError::CliArgumentValidation {
                    details: format!("Manifest {manifest_path} lists no downloads."),
                });
            }
            for request in &requests {
                validate_request(request)?;
            }
            let duplicates = requests
                .iter()
                .map(|request| request.name.as_str())
                .duplicates()
                .collect_vec();
            if !duplicates.is_empty() {
                return Err(HlsGrabError::CliArgumentValidation {
                    details: format!(
                        "Manifest {manifest_path} uses these names more than once: {}",
                        duplicates.join(", ")
                    ),
                });
            }

            Ok(ResolvedCommand::Batch(DownloadParams {
                app_config,
                requests,
            }))
        }
    }
}
