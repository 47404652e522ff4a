//! PRTG "EXE/Script Advanced" sensor output
//!
//! The sensor prints a single `<prtg>` document on stdout, either a list of
//! `<result>` channels with a `<text>` line or an `<error>` flag with a message.

use quick_xml::se::to_string;
use serde::Serialize;
use thiserror::Error;

use super::{Channel, SensorReport};

/// PRTG caps the sensor message length
const MAX_TEXT_LEN: usize = 2000;

#[derive(Error, Debug)]
#[error("Failed to serialize PRTG XML: {0}")]
pub struct RenderError(String);

#[derive(Serialize)]
#[serde(rename = "prtg")]
struct PrtgResults<'a> {
    result: Vec<PrtgResult<'a>>,
    text: String,
}

#[derive(Serialize)]
struct PrtgResult<'a> {
    channel: &'a str,
    value: i64,
    unit: &'static str,
    customunit: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    limitmode: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limitminwarning: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limitminerror: Option<i64>,
}

impl<'a> From<&'a Channel> for PrtgResult<'a> {
    fn from(channel: &'a Channel) -> Self {
        Self {
            channel: &channel.name,
            value: channel.value,
            unit: "Custom",
            customunit: "h",
            limitmode: channel.limits.map(|_| 1),
            limitminwarning: channel.limits.map(|l| l.warning_hours),
            limitminerror: channel.limits.map(|l| l.error_hours),
        }
    }
}

#[derive(Serialize)]
#[serde(rename = "prtg")]
struct PrtgError {
    error: u8,
    text: String,
}

/// Render a successful run
pub fn render_report(report: &SensorReport) -> Result<String, RenderError> {
    let output = PrtgResults {
        result: report.channels.iter().map(PrtgResult::from).collect(),
        text: truncate(&report.text),
    };
    to_string(&output).map_err(|e| RenderError(e.to_string()))
}

/// Render a failed run, PRTG shows the sensor in error state with `message`
pub fn render_error(message: &str) -> Result<String, RenderError> {
    let output = PrtgError {
        error: 1,
        text: truncate(message),
    };
    to_string(&output).map_err(|e| RenderError(e.to_string()))
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(MAX_TEXT_LEN) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
