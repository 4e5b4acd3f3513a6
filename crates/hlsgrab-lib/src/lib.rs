pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod playlist;
pub mod scratch;
pub mod transcode;

pub use config::Config;
pub use error::HlsGrabError;
