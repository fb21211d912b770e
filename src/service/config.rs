use std::time::Duration;

use rand::Rng;
use snafu::prelude::*;

use crate::common::{ConfigSnafu, Result};

const PREFIX: &str = "resend_options";

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ResendPolicy {
    pub enable: bool,
    pub times: Option<u32>,
    #[serde(default)]
    pub enable_random_interval: bool,
    /// Seconds.
    pub min_interval: Option<f64>,
    /// Seconds.
    pub max_interval: Option<f64>,
    /// Seconds.
    pub fixed_interval: Option<f64>,
}

/// Attempt count and delay for one send session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Schedule {
    pub attempts: u32,
    pub interval: Duration,
}

fn seconds(value: f64, key: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(value).map_err(|err| {
        ConfigSnafu {
            message: format!("{key} must be a non-negative number of seconds: {err}"),
            prefix: PREFIX,
        }
        .build()
    })
}

fn required<T: Copy>(value: Option<T>, key: &str) -> Result<T> {
    value.with_context(|| ConfigSnafu {
        message: format!("{key} is required when resend is enabled"),
        prefix: PREFIX,
    })
}

impl ResendPolicy {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn fixed(times: u32, interval: f64) -> Self {
        Self {
            enable: true,
            times: Some(times),
            fixed_interval: Some(interval),
            ..Self::default()
        }
    }

    pub fn random(times: u32, min_interval: f64, max_interval: f64) -> Self {
        Self {
            enable: true,
            times: Some(times),
            enable_random_interval: true,
            min_interval: Some(min_interval),
            max_interval: Some(max_interval),
            ..Self::default()
        }
    }

    /// Check the policy is usable when sending.
    pub fn validate(&self) -> Result<()> {
        self.schedule_with(&mut rand::thread_rng()).map(|_| ())
    }

    pub fn schedule(&self) -> Result<Schedule> {
        self.schedule_with(&mut rand::thread_rng())
    }

    /// Resolve the policy into a schedule. A random interval is drawn
    /// once here and reused for every attempt of the session.
    pub fn schedule_with<R: Rng>(&self, rng: &mut R) -> Result<Schedule> {
        if !self.enable {
            return Ok(Schedule {
                attempts: 1,
                interval: Duration::ZERO,
            });
        }

        let attempts = required(self.times, "times")?;
        ensure!(
            attempts >= 1,
            ConfigSnafu {
                message: "times must be at least 1",
                prefix: PREFIX,
            }
        );

        let interval = if self.enable_random_interval {
            let min = seconds(required(self.min_interval, "min_interval")?, "min_interval")?;
            let max = seconds(required(self.max_interval, "max_interval")?, "max_interval")?;
            ensure!(
                min <= max,
                ConfigSnafu {
                    message: format!(
                        "min_interval ({}s) is greater than max_interval ({}s)",
                        min.as_secs_f64(),
                        max.as_secs_f64()
                    ),
                    prefix: PREFIX,
                }
            );
            Duration::from_secs_f64(rng.gen_range(min.as_secs_f64()..=max.as_secs_f64()))
        } else {
            seconds(required(self.fixed_interval, "fixed_interval")?, "fixed_interval")?
        };

        Ok(Schedule { attempts, interval })
    }
}
