//! Request/response operations of `//refdata`

use super::params::{self, REQUEST_DATE_FORMAT};
use crate::error::{Result, SimError};
use crate::model::{Holding, MarketModel, SecurityInfo, trading_days};
use chrono::{Datelike, NaiveDate, NaiveTime};
use meridian_core::{
    CorrelationId, Element, ErrorInfo, Event, EventType, FieldException, Message, Names, TypeTag,
};
use meridian_gateway::Operations;

/// Source stamped on simulated error descriptions
pub const ERROR_SOURCE: &str = "meridian-sim";

const HISTORICAL_FIELDS: [&str; 5] = ["PX_LAST", "PX_OPEN", "PX_HIGH", "PX_LOW", "VOLUME"];

pub(super) fn bad_security(message: &str) -> ErrorInfo {
    ErrorInfo::new("BAD_SEC", message)
        .with_subcategory("INVALID_SECURITY")
        .with_source(ERROR_SOURCE, 15)
}

pub(super) fn bad_field(field: &str) -> FieldException {
    FieldException {
        field_id: field.to_string(),
        info: ErrorInfo::new("BAD_FLD", "Field not valid")
            .with_subcategory("INVALID_FIELD")
            .with_source(ERROR_SOURCE, 9),
    }
}

fn field_exceptions(exceptions: Vec<FieldException>) -> Element {
    Element::sequence(
        Names::FIELD_EXCEPTIONS,
        exceptions.iter().map(FieldException::to_element).collect(),
    )
}

/// Keep the last trading day of each period
fn select_periodicity(days: Vec<NaiveDate>, periodicity: &str) -> Result<Vec<NaiveDate>> {
    let period_of: fn(&NaiveDate) -> (i32, u32) = match periodicity {
        "DAILY" => return Ok(days),
        "WEEKLY" => |d| (d.iso_week().year(), d.iso_week().week()),
        "MONTHLY" => |d| (d.year(), d.month()),
        other => {
            return Err(SimError::InvalidArgument(format!(
                "unsupported periodicity {}",
                other
            )));
        }
    };
    Ok(days
        .iter()
        .enumerate()
        .filter(|(i, day)| {
            days.get(i + 1)
                .is_none_or(|next| period_of(next) != period_of(day))
        })
        .map(|(_, day)| *day)
        .collect())
}

fn historical_value(
    model: &MarketModel,
    security: &SecurityInfo,
    field: &str,
    date: NaiveDate,
) -> Element {
    match field {
        "PX_OPEN" => Element::scalar(field, model.open(security, date)),
        "PX_HIGH" => Element::scalar(field, model.high(security, date)),
        "PX_LOW" => Element::scalar(field, model.low(security, date)),
        "VOLUME" => Element::scalar(field, model.volume(security, date)),
        _ => Element::scalar(field, model.close(security, date)),
    }
}

/// `HistoricalDataRequest`: one partial response per security, the last one final
pub fn historical_data(
    model: &MarketModel,
    id: CorrelationId,
    params: &Element,
) -> Result<Vec<Event>> {
    let securities = params::strings(params, Names::SECURITIES)?;
    let fields = params::strings(params, Names::FIELDS)?;
    if securities.is_empty() {
        return Err(SimError::InvalidArgument("no securities requested".to_string()));
    }
    if fields.is_empty() {
        return Err(SimError::InvalidArgument("no fields requested".to_string()));
    }
    let start = params::date(params, Names::START_DATE)?;
    let end = match params::optional_string(params, Names::END_DATE)? {
        Some(_) => params::date(params, Names::END_DATE)?,
        None => model.as_of(),
    };
    let periodicity = params::optional_string(params, Names::PERIODICITY)?
        .unwrap_or_else(|| "DAILY".to_string());
    let days = select_periodicity(trading_days(start, end), &periodicity)?;

    let (known, unknown): (Vec<&String>, Vec<&String>) = fields
        .iter()
        .partition(|f| HISTORICAL_FIELDS.contains(&f.as_str()));
    let response_type = Operations::response_type(Operations::HISTORICAL_DATA);

    let last = securities.len() - 1;
    let events = securities
        .iter()
        .enumerate()
        .map(|(seq, ticker)| {
            let mut children = vec![
                Element::scalar(Names::SECURITY, ticker.as_str()),
                Element::scalar(Names::SEQUENCE_NUMBER, seq as i32),
            ];
            match model.security(ticker) {
                None => {
                    children.push(
                        bad_security("Unknown/Invalid security").to_element(Names::SECURITY_ERROR),
                    );
                }
                Some(security) => {
                    children.push(field_exceptions(
                        unknown.iter().map(|f| bad_field(f)).collect(),
                    ));
                    let rows = days
                        .iter()
                        .map(|day| {
                            let mut row = vec![Element::scalar(
                                Names::DATE,
                                day.and_time(NaiveTime::MIN),
                            )];
                            row.extend(
                                known
                                    .iter()
                                    .map(|f| historical_value(model, security, f, *day)),
                            );
                            Element::complex(Names::FIELD_DATA, row)
                        })
                        .collect();
                    children.push(Element::sequence(Names::FIELD_DATA, rows));
                }
            }

            let body = Element::complex(
                response_type.as_str(),
                vec![Element::complex(Names::SECURITY_DATA, children)],
            );
            let event_type = if seq == last {
                EventType::Response
            } else {
                EventType::PartialResponse
            };
            Event::single(
                event_type,
                Message::new(response_type.as_str(), body).with_correlation_id(id),
            )
        })
        .collect();
    Ok(events)
}

fn override_time(overrides: &[(String, String)], name: &str, default: NaiveTime) -> Result<NaiveTime> {
    match overrides.iter().find(|(field, _)| field == name) {
        None => Ok(default),
        Some((_, value)) => NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| {
            SimError::InvalidArgument(format!("override {} is not HH:MM: {}", name, value))
        }),
    }
}

pub(super) fn vwap_window(overrides: &[(String, String)]) -> Result<(NaiveTime, NaiveTime)> {
    let open = NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN);
    let close = NaiveTime::from_hms_opt(16, 0, 0).unwrap_or(NaiveTime::MIN);
    Ok((
        override_time(overrides, "VWAP_START_TIME", open)?,
        override_time(overrides, "VWAP_END_TIME", close)?,
    ))
}

fn dividend_history(model: &MarketModel, security: &SecurityInfo, field: &str) -> Element {
    let rows = model
        .dividends(security)
        .into_iter()
        .map(|(declared, ex, amount)| {
            Element::complex(
                field,
                vec![
                    Element::scalar("Declared Date", declared),
                    Element::scalar("Ex-Date", ex),
                    Element::scalar("Dividend Amount", amount),
                ],
            )
        })
        .collect();
    Element::sequence(field, rows)
}

fn reference_value(
    model: &MarketModel,
    security: &SecurityInfo,
    field: &str,
    vwap: (NaiveTime, NaiveTime),
) -> Option<Element> {
    let today = model.as_of();
    let element = match field {
        "PX_LAST" => Element::scalar(field, model.close(security, today)),
        "NAME" => Element::scalar(field, security.name.as_str()),
        "CRNCY" => Element::scalar(field, security.currency.as_str()),
        "VOLUME" => Element::scalar(field, model.volume(security, today)),
        "VWAP" => Element::scalar(field, model.vwap(security, today, vwap.0, vwap.1)),
        // Served with a type the client library does not model
        "EQY_FLOAT" => Element::raw(
            field,
            TypeTag::Unknown("decimal128".to_string()),
            format!("{:.4}", model.volume(security, today) as f64 * 0.731),
        ),
        "DVD_HIST" => dividend_history(model, security, field),
        _ => return None,
    };
    Some(element)
}

/// `ReferenceDataRequest`: one final response with a `securityData` entry per security
pub fn reference_data(model: &MarketModel, id: CorrelationId, params: &Element) -> Result<Event> {
    let securities = params::strings(params, Names::SECURITIES)?;
    let fields = params::strings(params, Names::FIELDS)?;
    if securities.is_empty() {
        return Err(SimError::InvalidArgument("no securities requested".to_string()));
    }
    let vwap = vwap_window(&params::overrides(params)?)?;

    let entries = securities
        .iter()
        .enumerate()
        .map(|(seq, ticker)| {
            let mut children = vec![
                Element::scalar(Names::SECURITY, ticker.as_str()),
                Element::scalar(Names::SEQUENCE_NUMBER, seq as i32),
            ];
            match model.security(ticker) {
                None => children.push(
                    bad_security("Unknown/Invalid security").to_element(Names::SECURITY_ERROR),
                ),
                Some(security) => {
                    let mut values = Vec::new();
                    let mut exceptions = Vec::new();
                    for field in &fields {
                        match reference_value(model, security, field, vwap) {
                            Some(value) => values.push(value),
                            None => exceptions.push(bad_field(field)),
                        }
                    }
                    children.push(field_exceptions(exceptions));
                    children.push(Element::complex(Names::FIELD_DATA, values));
                }
            }
            Element::complex(Names::SECURITY_DATA, children)
        })
        .collect();

    Ok(final_response(Operations::REFERENCE_DATA, id, entries))
}

fn portfolio_value(model: &MarketModel, holdings: &[Holding], field: &str) -> Option<Element> {
    let today = model.as_of();
    let price = |ticker: &str| {
        model
            .security(ticker)
            .map(|s| model.close(s, today))
            .unwrap_or(0.0)
    };
    let total: f64 = holdings.iter().map(|h| h.position * price(&h.security)).sum();

    let rows = holdings
        .iter()
        .map(|holding| {
            let security = Element::scalar("Security", holding.security.as_str());
            let cells = match field {
                "PORTFOLIO_MEMBER" => vec![security],
                "PORTFOLIO_MPOSITION" => {
                    vec![security, Element::scalar("Position", holding.position)]
                }
                "PORTFOLIO_MWEIGHT" => {
                    let weight = if total > 0.0 {
                        holding.position * price(&holding.security) / total * 100.0
                    } else {
                        0.0
                    };
                    vec![security, Element::scalar("Weight", (weight * 100.0).round() / 100.0)]
                }
                _ => vec![
                    security,
                    Element::scalar("Position", holding.position),
                    Element::scalar(
                        "Market Value",
                        (holding.position * price(&holding.security) * 100.0).round() / 100.0,
                    ),
                    Element::scalar("Cost", holding.cost),
                    Element::scalar("Cost Date", today.format(REQUEST_DATE_FORMAT).to_string()),
                ],
            };
            Element::complex(field, cells)
        })
        .collect();

    match field {
        "PORTFOLIO_MEMBER" | "PORTFOLIO_MPOSITION" | "PORTFOLIO_MWEIGHT" | "PORTFOLIO_DATA" => {
            Some(Element::sequence(field, rows))
        }
        _ => None,
    }
}

/// `PortfolioDataRequest`: bulk holdings of each requested portfolio
pub fn portfolio_data(model: &MarketModel, id: CorrelationId, params: &Element) -> Result<Event> {
    let portfolios = params::strings(params, Names::SECURITIES)?;
    let fields = params::strings(params, Names::FIELDS)?;
    if portfolios.is_empty() {
        return Err(SimError::InvalidArgument("no portfolios requested".to_string()));
    }

    let entries = portfolios
        .iter()
        .enumerate()
        .map(|(seq, portfolio)| {
            let mut children = vec![
                Element::scalar(Names::SECURITY, portfolio.as_str()),
                Element::scalar(Names::SEQUENCE_NUMBER, seq as i32),
            ];
            match model.portfolio(portfolio) {
                None => children.push(
                    bad_security("Unknown/Invalid portfolio").to_element(Names::SECURITY_ERROR),
                ),
                Some(holdings) => {
                    let mut values = Vec::new();
                    let mut exceptions = Vec::new();
                    for field in &fields {
                        match portfolio_value(model, holdings, field) {
                            Some(value) => values.push(value),
                            None => exceptions.push(bad_field(field)),
                        }
                    }
                    children.push(field_exceptions(exceptions));
                    children.push(Element::complex(Names::FIELD_DATA, values));
                }
            }
            Element::complex(Names::SECURITY_DATA, children)
        })
        .collect();

    Ok(final_response(Operations::PORTFOLIO_DATA, id, entries))
}

fn final_response(operation: &str, id: CorrelationId, entries: Vec<Element>) -> Event {
    let response_type = Operations::response_type(operation);
    let body = Element::complex(
        response_type.as_str(),
        vec![Element::sequence(Names::SECURITY_DATA, entries)],
    );
    Event::single(
        EventType::Response,
        Message::new(response_type, body).with_correlation_id(id),
    )
}

/// Final response reporting a request the gateway could not serve
pub fn request_failure(id: CorrelationId, operation: &str, error: &SimError) -> Event {
    let response_type = Operations::response_type(operation);
    let info = ErrorInfo::new("BAD_ARGS", error.to_string())
        .with_subcategory("INVALID_REQUEST")
        .with_source(ERROR_SOURCE, 1);
    let body = Element::complex(
        response_type.as_str(),
        vec![info.to_element(Names::RESPONSE_ERROR)],
    );
    Event::single(
        EventType::Response,
        Message::new(response_type, body).with_correlation_id(id),
    )
}
