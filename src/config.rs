use std::path::Path;

use snafu::prelude::*;

use crate::common::{
    compose_message, ConfigNotFoundSnafu, ConfigParseSnafu, Mail, RecipientSet, Result,
    SenderIdentity, ServerTarget,
};
use crate::service::ResendPolicy;

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct Configuration {
    #[serde(rename = "sender_information")]
    pub sender: SenderIdentity,

    #[serde(rename = "recipients_information", alias = "receivers_information")]
    pub recipients: RecipientSet,

    pub mail: Mail,

    #[serde(rename = "server_information")]
    pub server: ServerTarget,

    #[serde(rename = "resend_options", default)]
    pub resend: ResendPolicy,
}

impl Configuration {
    /// Load and validate a YAML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with(path, |path| {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_yaml::from_str(&content)?)
        })
    }

    /// Shared loading path: the existence check, parsing with `parse`, then
    /// validation. Parsers differ in how strictly they type scalars (the
    /// `config` crate turns `password: 1234` into a string, `serde_yaml`
    /// rejects it), everything after parsing is the same.
    pub fn load_with<F>(path: impl AsRef<Path>, parse: F) -> Result<Self>
    where
        F: FnOnce(&Path) -> std::result::Result<Self, Box<dyn std::error::Error>>,
    {
        let path = path.as_ref();
        ensure!(path.exists(), ConfigNotFoundSnafu { path });

        let config = parse(path).context(ConfigParseSnafu { path })?;
        config.validate()?;

        tracing::info!(
            path = %path.display(),
            recipients = config.recipients.count(),
            server = %config.server,
            resend = config.resend.enable,
            "Configuration loaded",
        );
        Ok(config)
    }

    pub fn from_parameters(
        sender: SenderIdentity,
        recipients: RecipientSet,
        mail: Mail,
        server: ServerTarget,
        resend: ResendPolicy,
    ) -> Self {
        Self {
            sender,
            recipients,
            mail,
            server,
            resend,
        }
    }

    /// Check everything a send would reject, without sending.
    pub fn validate(&self) -> Result<()> {
        let recipients = self.recipients.normalize()?;
        compose_message(&self.sender, &recipients, &self.mail)?;
        self.server.validate()?;
        self.resend.validate()
    }

    pub fn into_mailer(self) -> crate::service::Mailer {
        crate::service::Mailer::new(self)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::common::{Encryption, Error, OneOrMany};

    const FULL: &str = r#"
sender_information:
  address: 123@abc.xyz
  password: "******"
  alias: Alice
recipients_information:
  address:
    - 456@def.xyz
    - 789@ghi.xyz
  alias:
    - Bob
    - ""
mail:
  subject: "[NOTIFICATION]"
  body: Hello!
server_information:
  address: smtp.abc.xyz
  port: 465
resend_options:
  enable: true
  times: 3
  enable_random_interval: true
  min_interval: 1
  max_interval: 5
  fixed_interval: 2
"#;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_full_file() {
        let file = write_config(FULL);
        let config = Configuration::from_file(file.path()).unwrap();

        assert_eq!(config.sender.alias.as_deref(), Some("Alice"));
        assert_eq!(config.recipients.count(), 2);
        assert_eq!(config.mail.subject, "[NOTIFICATION]");
        assert_eq!(config.server.port, 465);
        assert_eq!(config.server.encryption, Encryption::Ssl);
        assert_eq!(
            config.resend,
            ResendPolicy {
                enable: true,
                times: Some(3),
                enable_random_interval: true,
                min_interval: Some(1.0),
                max_interval: Some(5.0),
                fixed_interval: Some(2.0),
            }
        );
    }

    #[test]
    fn example_config_loads() {
        let config =
            Configuration::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.yml"))
                .unwrap();
        assert!(!config.resend.enable);
        assert_eq!(config.server.timeout, Some(60));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        match Configuration::from_file(&path) {
            Err(Error::ConfigNotFound { path: missing }) => assert_eq!(missing, path),
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[test]
    fn resend_defaults_to_disabled() {
        let file = write_config(
            r#"
sender_information: {address: 123@abc.xyz, password: pw}
recipients_information: {address: 456@def.xyz}
mail: {subject: Hi, body: Hello!}
server_information: {address: smtp.abc.xyz, port: 25, encryption: none}
"#,
        );
        let config = Configuration::from_file(file.path()).unwrap();
        assert!(!config.resend.enable);
        assert_eq!(config.resend, ResendPolicy::disabled());
        assert_eq!(config.recipients.address, OneOrMany::from("456@def.xyz"));
        assert_eq!(config.server.encryption, Encryption::None);
    }

    #[test]
    fn legacy_receivers_key() {
        let file = write_config(
            r#"
sender_information: {address: 123@abc.xyz, password: pw}
receivers_information: {address: [456@def.xyz, 789@ghi.xyz]}
mail: {subject: Hi, body: Hello!}
server_information: {address: smtp.abc.xyz, port: 465}
"#,
        );
        let config = Configuration::from_file(file.path()).unwrap();
        assert_eq!(config.recipients.count(), 2);
    }

    #[test]
    fn missing_section_fails_at_load() {
        let file = write_config(
            r#"
sender_information: {address: 123@abc.xyz, password: pw}
recipients_information: {address: 456@def.xyz}
mail: {subject: Hi, body: Hello!}
"#,
        );
        let err = Configuration::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigParseError { .. }));
        assert!(err.to_string().contains("server_information"));
    }

    #[test]
    fn mismatched_aliases_fail_at_load() {
        let file = write_config(
            r#"
sender_information: {address: 123@abc.xyz, password: pw}
recipients_information: {address: [456@def.xyz, 789@ghi.xyz], alias: [Bob]}
mail: {subject: Hi, body: Hello!}
server_information: {address: smtp.abc.xyz, port: 465}
"#,
        );
        assert!(matches!(
            Configuration::from_file(file.path()),
            Err(Error::ConfigMismatch { .. })
        ));
    }

    #[test]
    fn invalid_recipient_fails_at_load() {
        let file = write_config(
            r#"
sender_information: {address: 123@abc.xyz, password: pw}
recipients_information: {address: not-an-address}
mail: {subject: Hi, body: Hello!}
server_information: {address: smtp.abc.xyz, port: 465}
"#,
        );
        match Configuration::from_file(file.path()) {
            Err(Error::AddressError { address, .. }) => assert_eq!(address, "not-an-address"),
            other => panic!("expected address error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_sender_fails_at_load() {
        let file = write_config(
            r#"
sender_information: {address: nobody, password: pw}
recipients_information: {address: 456@def.xyz}
mail: {subject: Hi, body: Hello!}
server_information: {address: smtp.abc.xyz, port: 465}
"#,
        );
        assert!(matches!(
            Configuration::from_file(file.path()),
            Err(Error::AddressError { .. })
        ));
    }

    #[test]
    fn empty_recipient_list_fails_at_load() {
        let file = write_config(
            r#"
sender_information: {address: 123@abc.xyz, password: pw}
recipients_information: {address: []}
mail: {subject: Hi, body: Hello!}
server_information: {address: smtp.abc.xyz, port: 465}
"#,
        );
        assert!(matches!(
            Configuration::from_file(file.path()),
            Err(Error::ComposeError { .. })
        ));
    }

    #[test]
    fn zero_timeout_fails_at_load() {
        let file = write_config(
            r#"
sender_information: {address: 123@abc.xyz, password: pw}
recipients_information: {address: 456@def.xyz}
mail: {subject: Hi, body: Hello!}
server_information: {address: smtp.abc.xyz, port: 465, timeout: 0}
"#,
        );
        match Configuration::from_file(file.path()) {
            Err(err @ Error::ConfigError { .. }) => {
                assert!(err.to_string().starts_with("server_information:"))
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn load_with_validates_whatever_the_parser_returns() {
        let file = write_config("ignored");
        let parsed = Configuration::from_parameters(
            SenderIdentity {
                address: "123@abc.xyz".into(),
                password: "pw".into(),
                alias: None,
            },
            RecipientSet {
                address: vec!["a@b.com", "c@d.com"].into(),
                alias: Some(vec!["Bob"].into()),
            },
            Mail {
                subject: "Hi".into(),
                body: "Hello!".into(),
            },
            ServerTarget::new("smtp.abc.xyz", 465),
            ResendPolicy::disabled(),
        );
        assert!(matches!(
            Configuration::load_with(file.path(), |_| Ok(parsed)),
            Err(Error::ConfigMismatch { .. })
        ));
    }

    #[test]
    fn load_with_reports_parser_errors() {
        let file = write_config("ignored");
        let err = Configuration::load_with(file.path(), |_| Err("bad yaml".into())).unwrap_err();
        assert!(matches!(err, Error::ConfigParseError { .. }));
        assert!(err.to_string().ends_with("bad yaml"));
    }

    #[test]
    fn from_parameters_assigns_fields() {
        let config = Configuration::from_parameters(
            SenderIdentity {
                address: "123@abc.xyz".into(),
                password: "******".into(),
                alias: None,
            },
            RecipientSet {
                address: vec!["456@def.xyz", "789@ghi.xyz"].into(),
                alias: Some(vec!["Bob", ""].into()),
            },
            Mail {
                subject: "[NOTIFICATION]".into(),
                body: "Hello!".into(),
            },
            ServerTarget::new("smtp.abc.xyz", 25),
            ResendPolicy::default(),
        );
        assert!(!config.resend.enable);
        assert_eq!(config.server.to_string(), "smtp.abc.xyz:25");
        assert!(config.validate().is_ok());
    }
}
