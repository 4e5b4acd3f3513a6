use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber;

#[derive(Debug, Clone)]
pub enum Command {
    Download {
        config_path: Option<String>,
        url: String,
        output_dir: String,
        name: String,
        workers: Option<usize>,
        scratch_dir: Option<String>,
    },
    Batch {
        config_path: Option<String>,
        manifest_path: String,
        workers: Option<usize>,
        scratch_dir: Option<String>,
    },
}

pub struct Args {
    pub command: Command,
    pub log_level: Level,
}

#[derive(Debug, Parser)]
#[command(
    name = "hlsgrab",
    version,
    author = "Nick Guletskii",
    about = "Download HLS streams segment by segment and remux them into a single file"
)]
struct Cli {
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Sets the level of verbosity",
        action = ArgAction::Count,
        global = true
    )]
    verbose: u8,

    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Sets a custom config file (YAML, TOML or JSON)",
        global = true
    )]
    config: Option<String>,

    #[arg(
        short = 'w',
        long = "workers",
        value_name = "N",
        help = "Overrides the number of download workers",
        global = true
    )]
    workers: Option<usize>,

    #[arg(
        long = "scratch-dir",
        value_name = "DIR",
        help = "Overrides the directory segments are staged in",
        global = true
    )]
    scratch_dir: Option<String>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Download one playlist and remux it
    Download {
        #[arg(value_name = "URL", help = "Playlist URL (media or master playlist)")]
        url: String,

        #[arg(
            short = 'o',
            long = "output-dir",
            value_name = "DIR",
            help = "Directory the assembled and remuxed files are written to",
            default_value = "."
        )]
        output_dir: String,

        #[arg(
            short = 'n',
            long = "name",
            value_name = "NAME",
            help = "Base file name of the outputs, without extension"
        )]
        name: String,
    },

    /// Download every playlist listed in a JSON manifest
    Batch {
        #[arg(
            value_name = "FILE",
            help = "JSON array of {\"url\", \"output_dir\", \"name\"} entries"
        )]
        manifest: String,
    },
}

pub fn parse_args() -> Args {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let mut env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    if let Ok(directive) = "hyper_util=warn".parse() {
        env_filter = env_filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_env_filter(env_filter)
        .init();

    let command = match cli.command {
        CliCommand::Download {
            url,
            output_dir,
            name,
        } => Command::Download {
            config_path: cli.config,
            url,
            output_dir,
            name,
            workers: cli.workers,
            scratch_dir: cli.scratch_dir,
        },
        CliCommand::Batch { manifest } => Command::Batch {
            config_path: cli.config,
            manifest_path: manifest,
            workers: cli.workers,
            scratch_dir: cli.scratch_dir,
        },
    };

    Args { command, log_level }
}
