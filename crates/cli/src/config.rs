//! Per-program settings
//!
//! Flags are merged over the gateway configuration file and each program's
//! defaults once, at startup. The resulting `ClientConfig` is not modified
//! afterwards and is passed by reference.

use crate::args::{self, ExampleArgs};
use crate::error::{CliError, Result};
use chrono::NaiveDate;
use meridian_gateway::config::load_config_from_env;
use meridian_gateway::{GatewayConfigFile, SessionOptions};

/// Format of `-sd` / `-ed` dates
pub const DATE_FORMAT: &str = "%Y%m%d";

/// The example programs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Example {
    HistoricalData,
    ReferenceData,
    PortfolioData,
    PageData,
    VwapSubscription,
    TechnicalAnalysis,
}

impl Example {
    pub fn name(&self) -> &'static str {
        match self {
            Self::HistoricalData => "historical_data",
            Self::ReferenceData => "reference_data",
            Self::PortfolioData => "portfolio_data",
            Self::PageData => "page_data",
            Self::VwapSubscription => "vwap_subscription",
            Self::TechnicalAnalysis => "technical_analysis",
        }
    }

    fn default_securities(&self) -> &'static [&'static str] {
        match self {
            Self::HistoricalData => &["IBM US Equity", "MSFT US Equity"],
            Self::ReferenceData => &["IBM US Equity", "VOD LN Equity"],
            Self::PortfolioData => &["P1234567-1 Client"],
            Self::PageData => &[],
            Self::VwapSubscription => &["AAPL US Equity", "IBM US Equity"],
            Self::TechnicalAnalysis => &["IBM US Equity"],
        }
    }

    fn default_fields(&self) -> &'static [&'static str] {
        match self {
            Self::HistoricalData => &["PX_LAST", "VOLUME"],
            Self::ReferenceData => &["PX_LAST", "NAME", "DVD_HIST"],
            Self::PortfolioData => &[
                "PORTFOLIO_MEMBER",
                "PORTFOLIO_MPOSITION",
                "PORTFOLIO_MWEIGHT",
                "PORTFOLIO_DATA",
            ],
            Self::PageData => &[],
            Self::VwapSubscription => &["VWAP"],
            // Study names
            Self::TechnicalAnalysis => &["SMAVG"],
        }
    }

    fn default_options(&self) -> &'static [&'static str] {
        match self {
            Self::VwapSubscription => &["VWAP_START_TIME=09:00"],
            Self::TechnicalAnalysis => &["period=14"],
            _ => &[],
        }
    }

    fn default_topics(&self) -> &'static [&'static str] {
        match self {
            Self::PageData => &["0708/012/0001", "1102/1/274"],
            _ => &[],
        }
    }

    fn uses_dates(&self) -> bool {
        matches!(self, Self::HistoricalData | Self::TechnicalAnalysis)
    }

    pub fn usage(&self) -> String {
        let mut usage = format!(
            "Usage: {}\n\
             \x20   [-s <security>      default: {}]\n\
             \x20   [-f <field>         default: {}]\n\
             \x20   [-o <NAME=VALUE>    default: {}]\n",
            self.name(),
            self.default_securities().join(", "),
            self.default_fields().join(", "),
            self.default_options().join(", "),
        );
        if self.uses_dates() {
            usage.push_str("    [-sd <YYYYMMDD>     default: 20091001]\n");
            usage.push_str("    [-ed <YYYYMMDD>     default: 20091101]\n");
        }
        if *self == Self::PageData {
            usage.push_str(&format!(
                "    [-t <topic>         default: {}]\n",
                self.default_topics().join(", ")
            ));
        }
        usage.push_str("    [-ip <ipAddress>    default: from gateway config]\n");
        usage.push_str("    [-p <tcpPort>       default: from gateway config]\n");
        usage.push_str("    [-h                 print this message]\n");
        usage
    }
}

/// Settings for one run of one program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub example: Example,
    pub session: SessionOptions,
    pub securities: Vec<String>,
    pub fields: Vec<String>,
    /// `(name, value)` pairs from `-o`
    pub options: Vec<(String, String)>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub topics: Vec<String>,
}

fn or_defaults(given: Vec<String>, defaults: &[&str]) -> Vec<String> {
    if given.is_empty() {
        defaults.iter().map(|s| s.to_string()).collect()
    } else {
        given
    }
}

fn parse_date(text: Option<&str>, default: &str) -> Result<NaiveDate> {
    let text = text.unwrap_or(default);
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| CliError::InvalidDate(text.to_string()))
}

fn parse_option(option: &str) -> Result<(String, String)> {
    match option.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(CliError::InvalidOption(option.to_string())),
    }
}

impl ClientConfig {
    /// Read the process arguments and gateway configuration.
    ///
    /// Returns `None` when `-h` was given.
    pub fn from_env(example: Example) -> Result<Option<Self>> {
        let args = args::parse(std::env::args())?;
        if args.help {
            return Ok(None);
        }
        let file = load_config_from_env()?;
        Self::from_args(example, args, &file).map(Some)
    }

    pub fn from_args(example: Example, args: ExampleArgs, file: &GatewayConfigFile) -> Result<Self> {
        let mut session = match example {
            Example::HistoricalData => file.historical_session_options(),
            _ => file.session_options(),
        };
        if let Some(host) = args.host {
            session.host = host;
        }
        if let Some(port) = args.port {
            session.port = port;
        }

        let options = or_defaults(args.options, example.default_options())
            .iter()
            .map(|o| parse_option(o))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            example,
            session,
            securities: or_defaults(args.securities, example.default_securities()),
            fields: or_defaults(args.fields, example.default_fields()),
            options,
            start_date: parse_date(args.start_date.as_deref(), "20091001")?,
            end_date: parse_date(args.end_date.as_deref(), "20091101")?,
            topics: or_defaults(args.topics, example.default_topics()),
        })
    }

    pub fn session_options(&self) -> &SessionOptions {
        &self.session
    }

    /// Value of the `-o` option `name`, if given
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Dates in request form, `YYYYMMDD`
    pub fn date_range(&self) -> (String, String) {
        (
            self.start_date.format(DATE_FORMAT).to_string(),
            self.end_date.format(DATE_FORMAT).to_string(),
        )
    }
}
