mod config;
mod models;
mod service;

pub use config::*;
pub use models::SendReport;
pub use service::*;
