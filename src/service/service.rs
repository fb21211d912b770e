use crate::common::{compose_message, format_address, Result, Transmitter};
use crate::smtp::SmtpTransmitter;
use crate::Configuration;

use super::models::{SendReport, Session};

pub struct Mailer {
    config: Configuration,
}

impl Mailer {
    pub fn new(config: Configuration) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Send over SMTP to the configured server.
    pub fn send(&self) -> Result<SendReport> {
        let mut transmitter = SmtpTransmitter::new(&self.config.server, &self.config.sender)?;
        self.send_with(&mut transmitter)
    }

    /// Run one send session. Configuration problems are returned before
    /// anything is transmitted; failed attempts only show up in the
    /// report.
    pub fn send_with<T: Transmitter>(&self, mut transmitter: T) -> Result<SendReport> {
        let recipients = self.config.recipients.normalize()?;
        let schedule = self.config.resend.schedule()?;
        let message = compose_message(&self.config.sender, &recipients, &self.config.mail)?;

        let mut session = Session::new(recipients.len());
        let to: Vec<String> = recipients
            .iter()
            .map(|r| format_address(&r.address, r.alias.as_deref()))
            .collect();

        tracing::debug!(
            session = %session.id,
            from = %format_address(&self.config.sender.address, self.config.sender.alias.as_deref()),
            to = %to.join(","),
            attempts = schedule.attempts,
            interval = ?schedule.interval,
            "Starting send session",
        );

        for attempt in 1..=schedule.attempts {
            let delivered = match transmitter.transmit(&message) {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(
                        session = %session.id,
                        attempt = attempt,
                        error = %err,
                        "Transmission failed",
                    );
                    false
                }
            };
            session.record(delivered);

            tracing::info!(
                session = %session.id,
                attempt = attempt,
                recipients = session.recipients,
                "[{}] {}",
                session.report.total(),
                if delivered { "Successful" } else { "Failed" },
            );

            if attempt < schedule.attempts && !schedule.interval.is_zero() {
                std::thread::sleep(schedule.interval);
            }
        }

        Ok(session.report)
    }
}
