//! Technical analysis studies of `//tasvc`

use super::params;
use super::reference::bad_security;
use crate::error::{Result, SimError};
use crate::model::{MarketModel, SecurityInfo, trading_days, trading_days_before};
use chrono::{NaiveDate, NaiveTime};
use meridian_core::walker::get_f64;
use meridian_core::walker::has_field;
use meridian_core::{CorrelationId, Element, Event, EventType, Message, Names};
use meridian_gateway::Operations;

pub const DEFAULT_PERIOD: usize = 14;

/// Longest look-back a study may ask for
pub const MAX_PERIOD: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Study {
    /// Simple moving average of closes
    MovingAverage,
    /// Relative strength index
    RelativeStrength,
}

impl Study {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "SMAVG" => Ok(Self::MovingAverage),
            "RSI" => Ok(Self::RelativeStrength),
            other => Err(SimError::InvalidArgument(format!("unknown study {}", other))),
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Self::MovingAverage => "SMAVG",
            Self::RelativeStrength => "RSI",
        }
    }

    /// Trading days of history needed before the first output date
    fn lookback(&self, period: usize) -> usize {
        match self {
            Self::MovingAverage => period - 1,
            Self::RelativeStrength => period,
        }
    }

    /// Value over `window`, which ends at the output date and has `lookback + 1` closes
    fn compute(&self, window: &[f64]) -> f64 {
        let value = match self {
            Self::MovingAverage => window.iter().sum::<f64>() / window.len() as f64,
            Self::RelativeStrength => {
                let (gains, losses) = window.windows(2).fold((0.0, 0.0), |(g, l), pair| {
                    let change = pair[1] - pair[0];
                    if change >= 0.0 { (g + change, l) } else { (g, l - change) }
                });
                if losses == 0.0 {
                    100.0
                } else {
                    100.0 - 100.0 / (1.0 + gains / losses)
                }
            }
        };
        (value * 100.0).round() / 100.0
    }
}

fn study_rows(
    model: &MarketModel,
    security: &SecurityInfo,
    study: Study,
    period: usize,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<Element> {
    let lookback = study.lookback(period);
    let days = trading_days(start, end);
    let mut history: Vec<NaiveDate> = trading_days_before(start, lookback);
    let offset = history.len();
    history.extend(days.iter().copied());
    let closes: Vec<f64> = history.iter().map(|d| model.close(security, *d)).collect();

    days.iter()
        .enumerate()
        .map(|(i, day)| {
            let at = offset + i;
            let window = &closes[at.saturating_sub(lookback)..=at];
            Element::complex(
                Names::STUDY_DATA,
                vec![
                    Element::scalar(Names::DATE, day.and_time(NaiveTime::MIN)),
                    Element::scalar(study.field(), study.compute(window)),
                ],
            )
        })
        .collect()
}

/// `studyRequest`: one final response with a row per trading day
pub fn study(model: &MarketModel, id: CorrelationId, params: &Element) -> Result<Event> {
    let ticker = params::required_string(params, Names::SECURITY)?;
    let study = Study::parse(&params::required_string(params, Names::STUDY)?)?;
    let period = if has_field(params, Names::PERIOD) {
        get_f64(params, Names::PERIOD)? as usize
    } else {
        DEFAULT_PERIOD
    };
    if !(2..=MAX_PERIOD).contains(&period) {
        return Err(SimError::InvalidArgument(format!(
            "period must be between 2 and {}, got {}",
            MAX_PERIOD, period
        )));
    }
    let start = params::date(params, Names::START_DATE)?;
    let end = params::date(params, Names::END_DATE)?;

    let mut children = vec![Element::scalar(Names::SECURITY, ticker.as_str())];
    match model.security(&ticker) {
        None => children
            .push(bad_security("Unknown/Invalid security").to_element(Names::SECURITY_ERROR)),
        Some(security) => children.push(Element::sequence(
            Names::STUDY_DATA,
            study_rows(model, security, study, period, start, end),
        )),
    }

    let response_type = Operations::response_type(Operations::STUDY);
    let body = Element::complex(response_type.as_str(), children);
    Ok(Event::single(
        EventType::Response,
        Message::new(response_type, body).with_correlation_id(id),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::Request;
    use meridian_core::walker::{get_field, walk_sequence};
    use meridian_gateway::Services;

    fn request(study: &str) -> Request {
        request_with_period(study, 5)
    }

    fn request_with_period(study: &str, period: i32) -> Request {
        Request::builder(Services::TASVC, Operations::STUDY)
            .set(Names::SECURITY, "IBM US Equity")
            .set(Names::STUDY, study)
            .set(Names::PERIOD, period)
            .set(Names::START_DATE, "20091001")
            .set(Names::END_DATE, "20091009")
            .build()
    }

    #[test]
    fn test_moving_average_rows() {
        let model = MarketModel::new(NaiveDate::from_ymd_opt(2009, 11, 2).unwrap());
        let event = study(&model, CorrelationId::new(3), request("SMAVG").params()).unwrap();
        assert!(event.is_final_response());
        let rows = get_field(&event.messages[0].body, Names::STUDY_DATA).unwrap();
        assert_eq!(walk_sequence(rows).unwrap().len(), 7);
        let first = walk_sequence(rows).unwrap().next().unwrap();
        assert!(get_f64(first, "SMAVG").unwrap() > 0.0);
    }

    #[test]
    fn test_rsi_bounds() {
        let model = MarketModel::new(NaiveDate::from_ymd_opt(2009, 11, 2).unwrap());
        let event = study(&model, CorrelationId::new(3), request("RSI").params()).unwrap();
        let rows = get_field(&event.messages[0].body, Names::STUDY_DATA).unwrap();
        for row in walk_sequence(rows).unwrap() {
            let rsi = get_f64(row, "RSI").unwrap();
            assert!((0.0..=100.0).contains(&rsi));
        }
    }

    #[test]
    fn test_unknown_study_rejected() {
        let model = MarketModel::new(NaiveDate::from_ymd_opt(2009, 11, 2).unwrap());
        assert!(matches!(
            study(&model, CorrelationId::new(3), request("MACD").params()),
            Err(SimError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_bad_study_period() {
        let model = MarketModel::new(NaiveDate::from_ymd_opt(2009, 11, 2).unwrap());
        for period in [1, -3, 1001, 2_000_000_000] {
            let request = request_with_period("SMAVG", period);
            assert!(
                matches!(
                    study(&model, CorrelationId::new(3), request.params()),
                    Err(SimError::InvalidArgument(_))
                ),
                "period {} accepted",
                period
            );
        }
        let event = study(
            &model,
            CorrelationId::new(3),
            request_with_period("RSI", MAX_PERIOD as i32).params(),
        )
        .unwrap();
        assert!(event.is_final_response());
    }

    #[test]
    fn test_compute() {
        assert_eq!(Study::MovingAverage.compute(&[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(Study::RelativeStrength.compute(&[1.0, 2.0, 3.0]), 100.0);
        assert_eq!(Study::RelativeStrength.compute(&[3.0, 2.0, 3.0]), 50.0);
    }
}
