//! Line-oriented printing of response and subscription messages

use meridian_core::items::{field_exceptions, security_error};
use meridian_core::walker::{get_field, get_string, has_field, walk, walk_sequence};
use meridian_core::{Element, ErrorInfo, Message, Names, WalkResult};
use meridian_runner::HandlerError;
use std::fmt::Display;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Where the programs print. Cloned into every handler.
#[derive(Debug, Clone)]
pub enum Output {
    Stdout,
    /// Collects lines in memory
    Buffer(Arc<Mutex<Vec<String>>>),
}

impl Output {
    pub fn stdout() -> Self {
        Self::Stdout
    }

    pub fn buffer() -> Self {
        Self::Buffer(Arc::new(Mutex::new(Vec::new())))
    }

    pub fn line(&self, text: impl Display) -> io::Result<()> {
        match self {
            Self::Stdout => writeln!(io::stdout().lock(), "{}", text),
            Self::Buffer(lines) => {
                // A panicking writer leaves complete lines behind
                lines
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(text.to_string());
                Ok(())
            }
        }
    }

    /// Lines collected so far; empty for stdout
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::Stdout => Vec::new(),
            Self::Buffer(lines) => lines
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }
}

/// `a=1 b=2` for every scalar below `element`
pub fn flatten(element: &Element) -> WalkResult<String> {
    Ok(walk(element)?
        .iter()
        .map(|field| format!("{}={}", field.path, field.value))
        .collect::<Vec<_>>()
        .join(" "))
}

fn print_field_data(out: &Output, field_data: &Element) -> Result<(), HandlerError> {
    if field_data.is_sequence() {
        // Historical: one row per date
        for row in walk_sequence(field_data)? {
            out.line(format!("  {}", flatten(row)?))?;
        }
        return Ok(());
    }
    for field in meridian_core::walker::children(field_data)? {
        if field.is_sequence() {
            out.line(format!("  {}:", field.name()))?;
            for row in walk_sequence(field)? {
                out.line(format!("    {}", flatten(row)?))?;
            }
        } else {
            out.line(format!("  {}", flatten(field)?))?;
        }
    }
    Ok(())
}

/// One `securityData` entry. Security errors and field exceptions are
/// printed in place of (or ahead of) the data.
pub fn print_security_data(out: &Output, security_data: &Element) -> Result<(), HandlerError> {
    out.line(get_string(security_data, Names::SECURITY)?)?;
    if let Some(error) = security_error(security_data)? {
        out.line(format!("  security error: {}", error.info))?;
        return Ok(());
    }
    for exception in field_exceptions(security_data)? {
        out.line(format!("  field exception: {}", exception))?;
    }
    if has_field(security_data, Names::FIELD_DATA) {
        print_field_data(out, get_field(security_data, Names::FIELD_DATA)?)?;
    }
    Ok(())
}

/// A response body: request error, security data, study rows, or anything else
pub fn print_response(out: &Output, body: &Element) -> Result<(), HandlerError> {
    if has_field(body, Names::RESPONSE_ERROR) {
        let info = ErrorInfo::from_element(get_field(body, Names::RESPONSE_ERROR)?)?;
        out.line(format!("Request failed: {}", info))?;
        return Ok(());
    }
    if has_field(body, Names::SECURITY_DATA) {
        let security_data = get_field(body, Names::SECURITY_DATA)?;
        if security_data.is_sequence() {
            for entry in walk_sequence(security_data)? {
                print_security_data(out, entry)?;
            }
        } else {
            print_security_data(out, security_data)?;
        }
        return Ok(());
    }
    if has_field(body, Names::STUDY_DATA) {
        let security = get_string(body, Names::SECURITY)?;
        let rows = walk_sequence(get_field(body, Names::STUDY_DATA)?)?;
        out.line(format!("{} ({} rows)", security, rows.len()))?;
        for row in rows {
            out.line(format!("  {}", flatten(row)?))?;
        }
        return Ok(());
    }
    if has_field(body, Names::SECURITY) {
        // Study for an unknown security
        print_security_data(out, body)?;
        return Ok(());
    }
    out.line(flatten(body)?)?;
    Ok(())
}

/// Subscription started, failed or terminated
pub fn print_subscription_status(
    out: &Output,
    topic: &str,
    message: &Message,
) -> Result<(), HandlerError> {
    let body = &message.body;
    match message.message_type.as_str() {
        Names::SUBSCRIPTION_STARTED => {
            out.line(format!("Subscription started: {}", topic))?;
            for exception in field_exceptions(body)? {
                out.line(format!("  field exception: {}", exception))?;
            }
        }
        Names::SUBSCRIPTION_FAILURE | Names::SUBSCRIPTION_TERMINATED => {
            let verb = if message.message_type == Names::SUBSCRIPTION_FAILURE {
                "failed"
            } else {
                "terminated"
            };
            if has_field(body, Names::REASON) {
                let reason = ErrorInfo::from_element(get_field(body, Names::REASON)?)?;
                out.line(format!("Subscription {}: {}: {}", verb, topic, reason))?;
            } else {
                out.line(format!("Subscription {}: {}", verb, topic))?;
            }
        }
        other => out.line(format!("{}: {}", other, topic))?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::FieldException;

    fn reference_entry() -> Element {
        Element::complex(
            Names::SECURITY_DATA,
            vec![
                Element::scalar(Names::SECURITY, "IBM US Equity"),
                Element::sequence(
                    Names::FIELD_EXCEPTIONS,
                    vec![
                        FieldException {
                            field_id: "NOPE".to_string(),
                            info: ErrorInfo::new("BAD_FLD", "Field not valid"),
                        }
                        .to_element(),
                    ],
                ),
                Element::complex(
                    Names::FIELD_DATA,
                    vec![
                        Element::scalar("PX_LAST", 121.5),
                        Element::sequence(
                            "DVD_HIST",
                            vec![Element::complex(
                                "DVD_HIST",
                                vec![Element::scalar("Dividend Amount", 0.55)],
                            )],
                        ),
                    ],
                ),
            ],
        )
    }

    #[test]
    fn test_security_data_lines() {
        let out = Output::buffer();
        print_security_data(&out, &reference_entry()).unwrap();
        assert_eq!(
            out.lines(),
            vec![
                "IBM US Equity",
                "  field exception: NOPE: BAD_FLD: Field not valid",
                "  PX_LAST=121.5",
                "  DVD_HIST:",
                "    Dividend Amount=0.55",
            ]
        );
    }

    #[test]
    fn test_response_error() {
        let out = Output::buffer();
        let body = Element::complex(
            "ReferenceDataResponse",
            vec![ErrorInfo::new("BAD_ARGS", "no securities").to_element(Names::RESPONSE_ERROR)],
        );
        print_response(&out, &body).unwrap();
        assert_eq!(out.lines(), vec!["Request failed: BAD_ARGS: no securities"]);
    }

    #[test]
    fn test_buffer_survives_poisoned_lock() {
        let out = Output::buffer();
        out.line("before").unwrap();
        let poisoner = out.clone();
        let _ = std::thread::spawn(move || {
            if let Output::Buffer(lines) = &poisoner {
                let _guard = lines.lock().unwrap();
                panic!("writer failed");
            }
        })
        .join();

        out.line("after").unwrap();
        assert_eq!(out.lines(), vec!["before", "after"]);
    }

    #[test]
    fn test_missing_security_is_walk_error() {
        let out = Output::buffer();
        let body = Element::complex(Names::SECURITY_DATA, vec![]);
        assert!(matches!(
            print_security_data(&out, &body),
            Err(HandlerError::Walk(_))
        ));
    }
}
