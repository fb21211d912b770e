use std::time::Duration;

use lettre::{
    transport::smtp::{
        authentication::{Credentials, DEFAULT_MECHANISMS},
        client::{SmtpConnection, TlsParameters},
        extension::ClientId,
    },
    Message,
};
use snafu::ResultExt;

use crate::common::{
    key_file_or_string, AuthSnafu, ConnectSnafu, Encryption, Result, SenderIdentity, ServerTarget,
    SubmitSnafu, TransmitError, Transmitter, DEFAULT_TIMEOUT_SECS,
};

const TRANSMITTER_NAME: &str = "SMTP";

pub struct SmtpTransmitter {
    host: String,
    port: u16,
    encryption: Encryption,
    timeout: Duration,
    username: String,
    credentials: Credentials,
    hello_name: ClientId,
}

impl SmtpTransmitter {
    pub fn new(server: &ServerTarget, sender: &SenderIdentity) -> Result<Self> {
        server.validate()?;
        let password = key_file_or_string(&sender.password, "sender_information.password")?;

        Ok(Self {
            host: server.address.clone(),
            port: server.port,
            encryption: server.encryption,
            timeout: Duration::from_secs(server.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            username: sender.address.clone(),
            credentials: Credentials::new(sender.address.clone(), password),
            hello_name: ClientId::default(),
        })
    }

    fn server(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn connect(&self) -> std::result::Result<SmtpConnection, TransmitError> {
        let server = self.server();
        let tls = match self.encryption {
            Encryption::None => None,
            Encryption::Ssl | Encryption::StartTls => Some(
                TlsParameters::new(self.host.clone())
                    .boxed_local()
                    .context(ConnectSnafu {
                        server: server.as_str(),
                    })?,
            ),
        };
        let implicit_tls = match self.encryption {
            Encryption::Ssl => tls.as_ref(),
            _ => None,
        };

        tracing::debug!(
            transmitter = TRANSMITTER_NAME,
            server = %server,
            encryption = ?self.encryption,
            "Connecting",
        );

        let mut conn = SmtpConnection::connect(
            (self.host.as_str(), self.port),
            Some(self.timeout),
            &self.hello_name,
            implicit_tls,
            None,
        )
        .boxed_local()
        .context(ConnectSnafu {
            server: server.as_str(),
        })?;

        if let (Encryption::StartTls, Some(tls)) = (self.encryption, &tls) {
            conn.starttls(tls, &self.hello_name)
                .boxed_local()
                .context(ConnectSnafu {
                    server: server.as_str(),
                })?;
        }

        Ok(conn)
    }

    fn deliver(
        &self,
        conn: &mut SmtpConnection,
        message: &Message,
    ) -> std::result::Result<(), TransmitError> {
        conn.auth(DEFAULT_MECHANISMS, &self.credentials)
            .boxed_local()
            .context(AuthSnafu {
                username: self.username.as_str(),
            })?;

        let response = conn
            .send(message.envelope(), &message.formatted())
            .boxed_local()
            .context(SubmitSnafu)?;

        tracing::debug!(
            transmitter = TRANSMITTER_NAME,
            code = %response.code(),
            "Message accepted",
        );
        Ok(())
    }
}

impl Transmitter for SmtpTransmitter {
    fn transmit(&mut self, message: &Message) -> std::result::Result<(), TransmitError> {
        let mut conn = self.connect()?;
        let result = self.deliver(&mut conn, message);

        // The connection never outlives the attempt.
        if let Err(err) = conn.quit() {
            tracing::debug!(
                transmitter = TRANSMITTER_NAME,
                server = %self.server(),
                error = %err,
                "QUIT failed",
            );
        }

        result
    }
}
