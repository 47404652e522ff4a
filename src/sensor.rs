//! Monitoring run over a base CRL and its optional delta CRL

pub mod prtg;

use std::{error::Error as StdError, fmt};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::SensorConfig;
use crate::pki::crl::{
    CrlError, CrlInfo, CrlResult, CrlSource, FreshnessReport, decode_crl, delta_crl_url, evaluate,
};

/// Failures that abort a monitoring run
#[derive(Error, Debug)]
pub enum SensorError {
    #[error("Base CRL check failed")]
    Base(#[source] CrlError),

    #[error("Delta CRL check failed")]
    Delta(#[source] CrlError),
}

/// Warning and error limits on the remaining CRL lifetime, in hours
///
/// A limit is breached once the remaining lifetime drops below it, the same
/// way PRTG applies `limitminwarning`/`limitminerror` to the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Thresholds {
    pub warning_hours: i64,
    pub error_hours: i64,
}

impl Thresholds {
    pub fn status(&self, freshness: &FreshnessReport) -> Status {
        if !freshness.is_valid || freshness.expires_in_hours < self.error_hours {
            Status::Error
        } else if freshness.expires_in_hours < self.warning_hours {
            Status::Warning
        } else {
            Status::Ok
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Status {
    Ok,
    Warning,
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Status::Ok => "OK",
            Status::Warning => "WARNING",
            Status::Error => "ERROR",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrlKind {
    Base,
    Delta,
}

impl fmt::Display for CrlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrlKind::Base => f.write_str("Base"),
            CrlKind::Delta => f.write_str("Delta"),
        }
    }
}

/// One reported value, in hours
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub name: String,
    pub value: i64,
    pub limits: Option<Thresholds>,
}

/// Outcome of a successful monitoring run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorReport {
    pub channels: Vec<Channel>,
    pub status: Status,
    pub text: String,
}

/// A decoded and evaluated CRL
#[derive(Debug, Clone)]
pub struct CrlCheck {
    pub kind: CrlKind,
    pub info: CrlInfo,
    pub freshness: FreshnessReport,
    pub status: Status,
}

impl CrlCheck {
    fn channels(&self, limits: Thresholds) -> [Channel; 2] {
        [
            Channel {
                name: format!("{} CRL expires in", self.kind),
                value: self.freshness.expires_in_hours,
                limits: Some(limits),
            },
            Channel {
                name: format!("{} CRL age", self.kind),
                value: self.freshness.age_hours,
                limits: None,
            },
        ]
    }

    fn summary(&self) -> String {
        format!(
            "{} CRL {} (issuer {}, next update {})",
            self.kind,
            self.status,
            self.info.issuer_common_name(),
            self.info.next_update().format("%Y-%m-%d %H:%M UTC")
        )
    }
}

/// Checks a CRL, and by default its delta CRL, fetched through `S`
pub struct CrlSensor<S> {
    source: S,
    config: SensorConfig,
}

impl<S: CrlSource> CrlSensor<S> {
    pub fn new(source: S, config: SensorConfig) -> Self {
        Self { source, config }
    }

    /// Fetch, decode and evaluate one CRL at `now`
    pub async fn check(&self, url: &str, kind: CrlKind, now: DateTime<Utc>) -> CrlResult<CrlCheck> {
        let bytes = self.source.fetch_crl(url).await?;
        let info = decode_crl(&bytes)?;
        let freshness = evaluate(&info, now);

        let limits = match kind {
            CrlKind::Base => self.config.base,
            CrlKind::Delta => self.config.delta,
        };
        let status = limits.status(&freshness);

        info!(
            "{} CRL from {} issued by {}: valid={}, age={}h, expires in {}h ({})",
            kind,
            url,
            info.issuer_common_name(),
            freshness.is_valid,
            freshness.age_hours,
            freshness.expires_in_hours,
            status
        );

        Ok(CrlCheck {
            kind,
            info,
            freshness,
            status,
        })
    }

    /// Run the base check and, unless disabled, the delta check.
    ///
    /// A base failure always fails the run. A delta failure fails it only when
    /// `delta_failure_is_error` is set, otherwise it is noted in the report text.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<SensorReport, SensorError> {
        let base = self
            .check(&self.config.url, CrlKind::Base, now)
            .await
            .map_err(SensorError::Base)?;

        let mut channels = base.channels(self.config.base).to_vec();
        let mut status = base.status;
        let mut text = base.summary();

        if self.config.skip_delta {
            return Ok(SensorReport {
                channels,
                status,
                text,
            });
        }

        match self.check_delta(now).await {
            Ok(delta) => {
                channels.extend(delta.channels(self.config.delta));
                status = status.max(delta.status);
                text = format!("{text}; {}", delta.summary());
            }
            Err(e) if self.config.delta_failure_is_error => return Err(SensorError::Delta(e)),
            Err(e) => {
                let reason = error_chain(&e);
                warn!("Ignoring delta CRL failure: {}", reason);
                text = format!("{text}; Delta CRL unavailable: {reason}");
            }
        }

        Ok(SensorReport {
            channels,
            status,
            text,
        })
    }

    async fn check_delta(&self, now: DateTime<Utc>) -> CrlResult<CrlCheck> {
        let url = delta_crl_url(&self.config.url)?;
        self.check(&url, CrlKind::Delta, now).await
    }
}

/// Render an error and all of its sources as `outer: inner: root`
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
