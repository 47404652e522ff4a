use std::{collections::HashMap, ffi::OsString};

use clap::{Parser, error::ErrorKind};

/// PRTG sensor reporting the freshness of a CRL and its delta CRL
///
/// Every option overrides the matching `sensor.*` key from `config/settings`
/// or the `APP_SENSOR__*` environment.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "crl-sensor", version, long_about = None)]
pub struct Cli {
    /// Base CRL URL, ending in .crl
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// HTTP timeout for each CRL download
    #[arg(long, value_name = "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// Do not fetch the delta CRL
    #[arg(long)]
    pub skip_delta: bool,

    /// Report an error when the delta CRL cannot be fetched or decoded
    #[arg(long)]
    pub delta_failure_is_error: bool,

    #[arg(long, value_name = "HOURS", allow_negative_numbers = true)]
    pub base_warning_hours: Option<i64>,

    #[arg(long, value_name = "HOURS", allow_negative_numbers = true)]
    pub base_error_hours: Option<i64>,

    #[arg(long, value_name = "HOURS", allow_negative_numbers = true)]
    pub delta_warning_hours: Option<i64>,

    #[arg(long, value_name = "HOURS", allow_negative_numbers = true)]
    pub delta_error_hours: Option<i64>,
}

/// What the process should do with its command line
#[derive(Debug)]
pub enum Invocation {
    Run(Cli),
    /// Unusable arguments, to be reported through the sensor output
    Invalid(String),
}

/// Parse `args` without exiting the process on bad input.
///
/// Help and version requests come back as `Err` so the caller can let clap
/// print them and exit. Any other parse failure becomes [`Invocation::Invalid`].
pub fn parse_args<I, T>(args: I) -> Result<Invocation, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(Invocation::Run(cli)),
        Err(e)
            if matches!(
                e.kind(),
                ErrorKind::DisplayHelp
                    | ErrorKind::DisplayVersion
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) =>
        {
            Err(e)
        }
        Err(e) => Ok(Invocation::Invalid(usage_message(&e))),
    }
}

/// First line of clap's rendering, without the `error: ` prefix
fn usage_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let line = rendered.lines().next().unwrap_or_default().trim();
    line.strip_prefix("error: ").unwrap_or(line).to_string()
}

impl Cli {
    /// Config keys set on the command line
    pub fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        let mut set = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                overrides.insert(key.to_string(), value);
            }
        };

        set("sensor.url", self.url.clone());
        set("sensor.timeout_secs", self.timeout_secs.map(|v| v.to_string()));
        set("sensor.skip_delta", self.skip_delta.then(|| "true".to_string()));
        set(
            "sensor.delta_failure_is_error",
            self.delta_failure_is_error.then(|| "true".to_string()),
        );
        set(
            "sensor.base.warning_hours",
            self.base_warning_hours.map(|v| v.to_string()),
        );
        set(
            "sensor.base.error_hours",
            self.base_error_hours.map(|v| v.to_string()),
        );
        set(
            "sensor.delta.warning_hours",
            self.delta_warning_hours.map(|v| v.to_string()),
        );
        set(
            "sensor.delta.error_hours",
            self.delta_error_hours.map(|v| v.to_string()),
        );

        overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::prtg;

    #[test]
    fn test_only_given_flags_become_overrides() {
        let cli = Cli::parse_from([
            "crl-sensor",
            "--url",
            "http://pki.contoso.example/Contoso.crl",
            "--skip-delta",
            "--base-error-hours",
            "12",
        ]);

        let overrides = cli.overrides();

        assert_eq!(overrides.len(), 3);
        assert_eq!(
            overrides["sensor.url"],
            "http://pki.contoso.example/Contoso.crl"
        );
        assert_eq!(overrides["sensor.skip_delta"], "true");
        assert_eq!(overrides["sensor.base.error_hours"], "12");
    }

    #[test]
    fn test_no_flags_no_overrides() {
        let cli = Cli::parse_from(["crl-sensor"]);
        assert!(cli.overrides().is_empty());
    }

    #[test]
    fn test_invalid_value_becomes_sensor_error() {
        let invocation = parse_args(["crl-sensor", "--base-warning-hours", "abc"])
            .expect("not a help request");

        let Invocation::Invalid(message) = invocation else {
            panic!("expected invalid arguments, got {invocation:?}");
        };
        assert!(message.contains("abc"), "message: {message}");
        assert!(message.contains("--base-warning-hours"), "message: {message}");
        assert!(!message.starts_with("error:"));

        let xml = prtg::render_error(&message).unwrap();
        assert!(xml.starts_with("<prtg><error>1</error><text>"), "xml: {xml}");
    }

    #[test]
    fn test_unknown_flag_is_invalid() {
        let invocation = parse_args(["crl-sensor", "--no-such-flag"]).unwrap();
        assert!(matches!(invocation, Invocation::Invalid(_)));
    }

    #[test]
    fn test_help_and_version_are_left_to_clap() {
        let help = parse_args(["crl-sensor", "--help"]).unwrap_err();
        assert_eq!(help.kind(), ErrorKind::DisplayHelp);

        let version = parse_args(["crl-sensor", "--version"]).unwrap_err();
        assert_eq!(version.kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_valid_arguments_run() {
        let invocation = parse_args(["crl-sensor", "--timeout-secs", "5"]).unwrap();
        let Invocation::Run(cli) = invocation else {
            panic!("expected a run, got {invocation:?}");
        };
        assert_eq!(cli.timeout_secs, Some(5));
    }
}
