//! Command-line flags shared by the example programs
//!
//! The programs accept single-dash flags, some of them multi-letter
//! (`-ip`, `-sd`, `-ed`). Those are rewritten to long flags before clap sees
//! them, and anything unrecognised is dropped, so stray arguments never stop
//! a program from running.

use clap::Parser;

#[derive(Parser, Debug, Default, PartialEq, Eq)]
#[command(disable_help_flag = true, disable_version_flag = true)]
pub struct ExampleArgs {
    /// Security (or portfolio) to request; repeatable
    #[arg(short = 's', long = "security")]
    pub securities: Vec<String>,

    /// Field to request; repeatable
    #[arg(short = 'f', long = "field")]
    pub fields: Vec<String>,

    /// Override or subscription option, `NAME=VALUE`; repeatable
    #[arg(short = 'o', long = "option")]
    pub options: Vec<String>,

    /// Gateway host
    #[arg(long = "ip")]
    pub host: Option<String>,

    /// Gateway port
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// First date, YYYYMMDD
    #[arg(long = "start-date")]
    pub start_date: Option<String>,

    /// Last date, YYYYMMDD
    #[arg(long = "end-date")]
    pub end_date: Option<String>,

    /// Page topic `monitor/page/subpage`; repeatable
    #[arg(short = 't', long = "topic")]
    pub topics: Vec<String>,

    /// Print usage and exit
    #[arg(short = 'h', long = "help")]
    pub help: bool,
}

/// Flags that take a value, as typed by the user and as clap knows them
const VALUE_FLAGS: [(&str, &str); 8] = [
    ("-s", "--security"),
    ("-f", "--field"),
    ("-o", "--option"),
    ("-ip", "--ip"),
    ("-p", "--port"),
    ("-sd", "--start-date"),
    ("-ed", "--end-date"),
    ("-t", "--topic"),
];

/// Keep recognised flags with their values and drop everything else.
///
/// A value flag at the end of the line, with nothing after it, is dropped too.
pub fn normalize<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut kept: Vec<String> = args.next().into_iter().collect();

    while let Some(arg) = args.next() {
        if arg == "-h" || arg == "--help" {
            kept.push("--help".to_string());
            continue;
        }
        let long = VALUE_FLAGS
            .iter()
            .find(|(short, long)| arg == *short || arg == *long)
            .map(|(_, long)| *long);
        match long {
            Some(long) => {
                // `--flag=value` keeps values that start with a dash intact
                if let Some(value) = args.next() {
                    kept.push(format!("{}={}", long, value));
                }
            }
            None => log::debug!("Ignoring argument {:?}", arg),
        }
    }
    kept
}

/// Parse a full command line, program name first
pub fn parse<I>(args: I) -> Result<ExampleArgs, clap::Error>
where
    I: IntoIterator<Item = String>,
{
    ExampleArgs::try_parse_from(normalize(args))
}
