use crate::error::HlsGrabError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// Number of pool workers.
    pub workers: usize,
    /// Where segments are staged. A fresh temporary directory when unset.
    pub scratch_dir: Option<PathBuf>,
    pub output: OutputConfig,
    pub http: HttpConfig,
    pub transcode: TranscodeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: 4,
            scratch_dir: None,
            output: OutputConfig::default(),
            http: HttpConfig::default(),
            transcode: TranscodeConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), HlsGrabError> {
        if self.workers == 0 {
            return Err(HlsGrabError::CliArgumentValidation {
                details: "workers must be greater than 0.".to_string(),
            });
        }
        for (name, value) in [
            ("output.container_extension", &self.output.container_extension),
            ("output.extension", &self.output.extension),
        ] {
            if value.is_empty() || value.contains(['/', '\\']) {
                return Err(HlsGrabError::CliArgumentValidation {
                    details: format!("{name} must be a non-empty file extension."),
                });
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct OutputConfig {
    /// Extension of the assembled segment container.
    pub container_extension: String,
    /// Extension of the transcoded file.
    pub extension: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            container_extension: "ts".to_string(),
            extension: "mp4".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct HttpConfig {
    pub user_agent: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct TranscodeConfig {
    pub program: PathBuf,
    /// Inserted between the stream-copy flags and the output path.
    pub extra_args: Vec<String>,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            extra_args: vec!["-bsf:a".to_string(), "aac_adtstoasc".to_string()],
        }
    }
}
