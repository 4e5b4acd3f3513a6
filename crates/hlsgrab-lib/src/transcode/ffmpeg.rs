use super::{TranscodeError, Transcoder};
use crate::config::TranscodeConfig;
use futures::future::{BoxFuture, FutureExt};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Remuxes the container with ffmpeg, copying streams without re-encoding.
#[derive(Clone, Debug)]
pub struct FfmpegTranscoder {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl FfmpegTranscoder {
    pub fn new(config: &TranscodeConfig) -> Self {
        Self {
            program: config.program.clone(),
            extra_args: config.extra_args.clone(),
        }
    }

    fn args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-y", "-loglevel", "error", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(input.as_os_str().to_owned());
        args.extend(["-c", "copy"].map(OsString::from));
        args.extend(self.extra_args.iter().map(OsString::from));
        args.push(output.as_os_str().to_owned());
        args
    }
}

impl Transcoder for FfmpegTranscoder {
    fn transcode<'a>(
        &'a self,
        input: &'a Path,
        output: &'a Path,
    ) -> BoxFuture<'a, Result<(), TranscodeError>> {
        async move {
            tracing::debug!(program = %self.program.display(), input = %input.display(), output = %output.display(), "Running transcoder");
            let result = Command::new(&self.program)
                .args(self.args(input, output))
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .output()
                .await
                .map_err(|source| TranscodeError::Spawn {
                    program: self.program.clone(),
                    source,
                })?;

            if result.status.success() {
                Ok(())
            } else {
                Err(TranscodeError::Failed {
                    status: result.status.to_string(),
                    stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
                })
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_copy_streams_and_append_extra_args_before_output() {
        let transcoder = FfmpegTranscoder::new(&TranscodeConfig {
            program: "ffmpeg".into(),
            extra_args: vec!["-bsf:a".to_string(), "aac_adtstoasc".to_string()],
        });
        let args = transcoder.args(Path::new("/out/show.ts"), Path::new("/out/show.mp4"));
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec![
                "-y", "-loglevel", "error", "-i", "/out/show.ts", "-c", "copy", "-bsf:a",
                "aac_adtstoasc", "/out/show.mp4"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_a_spawn_error() {
        let transcoder = FfmpegTranscoder::new(&TranscodeConfig {
            program: "/nonexistent/hlsgrab-ffmpeg".into(),
            extra_args: vec![],
        });
        let result = transcoder
            .transcode(Path::new("/tmp/in.ts"), Path::new("/tmp/out.mp4"))
            .await;
        assert!(matches!(result, Err(TranscodeError::Spawn { .. })));
    }
}
