pub use uuid::Uuid;

/// Recipient counts across every attempt of a send session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendReport {
    pub success: usize,
    pub failure: usize,
}

impl SendReport {
    pub fn total(&self) -> usize {
        self.success + self.failure
    }
}

impl From<SendReport> for (usize, usize) {
    fn from(value: SendReport) -> Self {
        (value.success, value.failure)
    }
}

impl std::fmt::Display for SendReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Success: {}\nFailure: {}", self.success, self.failure)
    }
}

#[derive(Debug, Clone)]
pub(super) struct Session {
    pub id: Uuid,
    pub recipients: usize,
    pub report: SendReport,
}

impl Session {
    pub fn new(recipients: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipients,
            report: SendReport::default(),
        }
    }

    pub fn record(&mut self, delivered: bool) {
        match delivered {
            true => self.report.success += self.recipients,
            false => self.report.failure += self.recipients,
        }
    }
}
