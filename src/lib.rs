pub mod common;
pub mod config;
pub mod service;
pub mod smtp;

pub use common::{format_address, Error, Result};
pub use config::*;
pub use service::{Mailer, ResendPolicy, SendReport};
