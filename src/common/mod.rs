mod address;
mod config;
mod error;
mod models;

pub use address::*;
pub(crate) use config::*;
pub use error::*;
pub use models::*;
