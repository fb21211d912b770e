use std::path::PathBuf;

use snafu::prelude::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("No such file or directory: {}", path.display()))]
    ConfigNotFound { path: PathBuf },
    #[snafu(display("Failed to load configuration from {}: {source}", path.display()))]
    ConfigParseError {
        path: PathBuf,
        source: Box<dyn std::error::Error>,
    },
    #[snafu(display("{prefix}: {message}"))]
    ConfigError { message: String, prefix: String },
    #[snafu(display(
        "Address list and alias list do not match: {addresses} addresses, {aliases} aliases"
    ))]
    ConfigMismatch { addresses: usize, aliases: usize },
    #[snafu(display("Invalid address {address}: {source}"))]
    AddressError {
        address: String,
        source: lettre::address::AddressError,
    },
    #[snafu(display("Failed to compose message: {source}"))]
    ComposeError { source: lettre::error::Error },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why a single transmission attempt failed. These never escape a send
/// session, they are logged and counted.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TransmitError {
    #[snafu(display("Failed to connect to {server}: {source}"))]
    ConnectError {
        server: String,
        source: Box<dyn std::error::Error>,
    },
    #[snafu(display("Failed to authenticate as {username}: {source}"))]
    AuthError {
        username: String,
        source: Box<dyn std::error::Error>,
    },
    #[snafu(display("Failed to submit message: {source}"))]
    SubmitError { source: Box<dyn std::error::Error> },
}
