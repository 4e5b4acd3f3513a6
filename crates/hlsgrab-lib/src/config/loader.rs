use super::Config;
use crate::error::HlsGrabError;
use config::Config as ConfigBuilder;

/// Loads the configuration from an optional file, overlaid with `HLSGRAB__*`
/// environment variables. Missing sections fall back to their defaults.
pub fn load_config(config_path: Option<&str>) -> Result<Config, HlsGrabError> {
    let mut builder = ConfigBuilder::builder();
    if let Some(config_path) = config_path {
        builder = builder.add_source(config::File::with_name(config_path));
    }

    let config_builder = builder
        .add_source(
            config::Environment::with_prefix("HLSGRAB")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    let config: Config = config_builder.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputConfig, TranscodeConfig};
    use std::path::PathBuf;

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_yaml_overrides_selected_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hlsgrab.yaml");
        std::fs::write(
            &path,
            "workers: 8\nscratch_dir: /var/tmp/hlsgrab\ntranscode:\n  program: /usr/local/bin/ffmpeg\n",
        )
        .unwrap();

        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.workers, 8);
        assert_eq!(config.scratch_dir, Some(PathBuf::from("/var/tmp/hlsgrab")));
        assert_eq!(config.transcode.program, PathBuf::from("/usr/local/bin/ffmpeg"));
        assert_eq!(config.transcode.extra_args, TranscodeConfig::default().extra_args);
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hlsgrab.yaml");
        std::fs::write(&path, "workers: 2\nretries: 5\n").unwrap();

        assert!(matches!(
            load_config(path.to_str()),
            Err(HlsGrabError::Config(_))
        ));
    }

    #[test]
    fn test_load_rejects_zero_workers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hlsgrab.yaml");
        std::fs::write(&path, "workers: 0\n").unwrap();

        assert!(matches!(
            load_config(path.to_str()),
            Err(HlsGrabError::CliArgumentValidation { .. })
        ));
    }
}
