use hlsgrab_lib::cli::{ResolvedCommand, parse_args, resolve_command, run_download};
use hlsgrab_lib::error::HlsGrabError;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), HlsGrabError> {
    color_eyre::install()?;

    let args = parse_args();
    let command = resolve_command(args.command)?;

    match command {
        ResolvedCommand::Download(params) | ResolvedCommand::Batch(params) => {
            run_download(params).await?
        }
    }

    Ok(())
}
