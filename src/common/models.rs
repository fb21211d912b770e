use lettre::Message;
use snafu::prelude::*;

use super::{ConfigMismatchSnafu, ConfigSnafu, TransmitError};

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// One string or a list of strings. YAML configs use both shapes for
/// recipient addresses and aliases.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn len(&self) -> usize {
        match self {
            OneOrMany::One(_) => 1,
            OneOrMany::Many(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            OneOrMany::One(value) => std::slice::from_ref(value),
            OneOrMany::Many(values) => values,
        };
        values.iter().map(String::as_str)
    }
}

impl From<&str> for OneOrMany {
    fn from(value: &str) -> Self {
        OneOrMany::One(value.to_string())
    }
}

impl From<String> for OneOrMany {
    fn from(value: String) -> Self {
        OneOrMany::One(value)
    }
}

impl From<Vec<String>> for OneOrMany {
    fn from(value: Vec<String>) -> Self {
        OneOrMany::Many(value)
    }
}

impl From<Vec<&str>> for OneOrMany {
    fn from(value: Vec<&str>) -> Self {
        OneOrMany::Many(value.into_iter().map(String::from).collect())
    }
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct SenderIdentity {
    pub address: String,
    pub password: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct RecipientSet {
    pub address: OneOrMany,
    pub alias: Option<OneOrMany>,
}

/// A recipient address with its display name, after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipient {
    pub address: String,
    pub alias: Option<String>,
}

impl RecipientSet {
    /// Pair every address with its alias by position.
    pub fn normalize(&self) -> super::Result<Vec<Recipient>> {
        let aliases: Vec<Option<String>> = match &self.alias {
            Some(aliases) => {
                ensure!(
                    aliases.len() == self.address.len(),
                    ConfigMismatchSnafu {
                        addresses: self.address.len(),
                        aliases: aliases.len(),
                    }
                );
                aliases.iter().map(|a| Some(a.to_string())).collect()
            }
            None => vec![None; self.address.len()],
        };

        Ok(self
            .address
            .iter()
            .zip(aliases)
            .map(|(address, alias)| Recipient {
                address: address.to_string(),
                alias,
            })
            .collect())
    }

    /// Number of recipients a single delivery addresses.
    pub fn count(&self) -> usize {
        self.address.len()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Mail {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Encryption {
    /// TLS from the first byte, usually port 465.
    #[default]
    Ssl,
    StartTls,
    None,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct ServerTarget {
    pub address: String,
    pub port: u16,
    #[serde(default)]
    pub encryption: Encryption,
    /// Seconds.
    pub timeout: Option<u64>,
}

impl ServerTarget {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            encryption: Encryption::default(),
            timeout: None,
        }
    }

    pub fn validate(&self) -> super::Result<()> {
        ensure!(
            self.timeout != Some(0),
            ConfigSnafu {
                message: "timeout must be at least 1 second",
                prefix: "server_information",
            }
        );
        Ok(())
    }
}

impl std::fmt::Display for ServerTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// Delivers one composed message. Implementations own their connection
/// lifecycle: a connection is opened and closed within each call.
pub trait Transmitter {
    fn transmit(&mut self, message: &Message) -> std::result::Result<(), TransmitError>;
}

impl<T: Transmitter + ?Sized> Transmitter for &mut T {
    fn transmit(&mut self, message: &Message) -> std::result::Result<(), TransmitError> {
        (**self).transmit(message)
    }
}
