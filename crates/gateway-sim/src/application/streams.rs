//! Subscription streams
//!
//! Each accepted subscription becomes a stream keyed by its correlation id.
//! Streams publish one data event per tick until cancelled or, when
//! `max_ticks` is set, until they have published that many.

use super::reference::{bad_field, bad_security, vwap_window, ERROR_SOURCE};
use crate::model::{MarketModel, SecurityInfo};
use chrono::{Duration, NaiveTime};
use log::{debug, info};
use meridian_core::{
    CorrelationId, Element, ErrorInfo, Event, EventType, FieldException, Message, Names,
    Subscription,
};
use meridian_gateway::Services;
use std::collections::BTreeMap;

/// Message type of subscription data
pub const MARKET_DATA_EVENTS: &str = "MarketDataEvents";
pub const PAGE_UPDATE: &str = "PageUpdate";
pub const ROW_UPDATE: &str = "RowUpdate";

const MARKET_DATA_FIELDS: [&str; 4] = ["LAST_PRICE", "BID", "ASK", "VOLUME"];
const VWAP_FIELDS: [&str; 2] = ["VWAP", "VOLUME"];

/// Width of the ticker column on simulated pages
const TICKER_WIDTH: i32 = 16;
const PRICE_WIDTH: i32 = 10;

#[derive(Debug, Clone)]
enum StreamKind {
    MarketData { security: SecurityInfo },
    Vwap {
        security: SecurityInfo,
        start: NaiveTime,
        end: NaiveTime,
    },
    Page { rows: Vec<SecurityInfo> },
}

#[derive(Debug, Clone)]
struct Stream {
    topic: String,
    fields: Vec<String>,
    kind: StreamKind,
    /// Data events published so far
    ticks: u64,
}

/// Active subscription streams of one client connection
#[derive(Debug, Default)]
pub struct StreamRegistry {
    streams: BTreeMap<CorrelationId, Stream>,
    max_ticks: Option<u64>,
}

fn status(message_type: &str, id: CorrelationId, topic: &str, children: Vec<Element>) -> Event {
    Event::single(
        EventType::SubscriptionStatus,
        Message::new(message_type, Element::complex(message_type, children))
            .with_correlation_id(id)
            .with_topic(topic),
    )
}

fn failure(id: CorrelationId, topic: &str, reason: ErrorInfo) -> Event {
    status(
        Names::SUBSCRIPTION_FAILURE,
        id,
        topic,
        vec![reason.to_element(Names::REASON)],
    )
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Split requested fields into served and unknown; defaults apply when none are requested
fn split_fields(
    requested: &[String],
    supported: &[&str],
    default: &str,
) -> (Vec<String>, Vec<FieldException>) {
    if requested.is_empty() {
        return (vec![default.to_string()], Vec::new());
    }
    let mut served = Vec::new();
    let mut exceptions = Vec::new();
    for field in requested {
        if supported.contains(&field.as_str()) {
            served.push(field.clone());
        } else {
            exceptions.push(bad_field(field));
        }
    }
    (served, exceptions)
}

/// `monitor/page/subpage`, all numeric
fn is_page_topic(topic: &str) -> bool {
    let parts: Vec<&str> = topic.split('/').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

impl StreamRegistry {
    pub fn new(max_ticks: Option<u64>) -> Self {
        Self {
            streams: BTreeMap::new(),
            max_ticks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn contains(&self, id: CorrelationId) -> bool {
        self.streams.contains_key(&id)
    }

    /// Validate and start a subscription; returns its status event
    pub fn subscribe(
        &mut self,
        model: &MarketModel,
        subscription: &Subscription,
        service_open: bool,
    ) -> Event {
        let id = subscription.correlation_id;
        let topic = subscription.topic_string();

        if !service_open {
            return failure(
                id,
                &topic,
                ErrorInfo::new("NOT_AUTHORIZED", "Service not opened")
                    .with_source(ERROR_SOURCE, 2),
            );
        }
        if self.streams.contains_key(&id) {
            return failure(
                id,
                &topic,
                ErrorInfo::new("DUPLICATE", format!("{} is already subscribed", id))
                    .with_source(ERROR_SOURCE, 3),
            );
        }

        let (kind, fields, exceptions) = match self.resolve(model, subscription) {
            Ok(resolved) => resolved,
            Err(reason) => {
                info!("Subscription {} rejected: {}", topic, reason);
                return failure(id, &topic, reason);
            }
        };

        debug!("Stream {} started for {}", id, topic);
        self.streams.insert(
            id,
            Stream {
                topic: topic.clone(),
                fields,
                kind,
                ticks: 0,
            },
        );
        status(
            Names::SUBSCRIPTION_STARTED,
            id,
            &topic,
            vec![Element::sequence(
                Names::FIELD_EXCEPTIONS,
                exceptions.iter().map(FieldException::to_element).collect(),
            )],
        )
    }

    fn resolve(
        &self,
        model: &MarketModel,
        subscription: &Subscription,
    ) -> Result<(StreamKind, Vec<String>, Vec<FieldException>), ErrorInfo> {
        let security = || {
            model
                .security(&subscription.topic)
                .cloned()
                .ok_or_else(|| bad_security("Unknown/Invalid security"))
        };
        let no_fields = || {
            ErrorInfo::new("BAD_FLD", "No valid fields")
                .with_subcategory("INVALID_FIELD")
                .with_source(ERROR_SOURCE, 9)
        };

        match subscription.service.as_str() {
            Services::MKTDATA => {
                let security = security()?;
                let (fields, exceptions) =
                    split_fields(&subscription.fields, &MARKET_DATA_FIELDS, "LAST_PRICE");
                if fields.is_empty() {
                    return Err(no_fields());
                }
                Ok((StreamKind::MarketData { security }, fields, exceptions))
            }
            Services::MKTVWAP => {
                let security = security()?;
                let options = subscription
                    .option_pairs()
                    .map(|(name, value)| (name.to_string(), value.unwrap_or_default().to_string()))
                    .collect::<Vec<_>>();
                let (start, end) = vwap_window(&options).map_err(|e| {
                    ErrorInfo::new("BAD_ARGS", e.to_string())
                        .with_subcategory("INVALID_OPTION")
                        .with_source(ERROR_SOURCE, 4)
                })?;
                let (fields, exceptions) =
                    split_fields(&subscription.fields, &VWAP_FIELDS, "VWAP");
                if fields.is_empty() {
                    return Err(no_fields());
                }
                Ok((StreamKind::Vwap { security, start, end }, fields, exceptions))
            }
            Services::PAGEDATA => {
                if !is_page_topic(&subscription.topic) {
                    return Err(ErrorInfo::new("BAD_SEC", "Invalid page")
                        .with_subcategory("INVALID_TOPIC")
                        .with_source(ERROR_SOURCE, 15));
                }
                let rows = model
                    .tickers()
                    .into_iter()
                    .filter_map(|t| model.security(t).cloned())
                    .collect();
                Ok((StreamKind::Page { rows }, Vec::new(), Vec::new()))
            }
            other => Err(ErrorInfo::new(
                "BAD_ARGS",
                format!("{} does not publish subscriptions", other),
            )
            .with_source(ERROR_SOURCE, 5)),
        }
    }

    /// Cancel streams; returns how many were active
    pub fn unsubscribe(&mut self, ids: &[CorrelationId]) -> usize {
        ids.iter()
            .filter(|id| self.streams.remove(*id).is_some())
            .inspect(|id| debug!("Stream {} cancelled", id))
            .count()
    }

    /// Publish one data event per stream, then retire streams that reached `max_ticks`
    pub fn tick(&mut self, model: &MarketModel) -> Vec<Event> {
        let mut events = Vec::with_capacity(self.streams.len());
        let mut finished = Vec::new();

        for (id, stream) in self.streams.iter_mut() {
            let message = stream
                .publish(model)
                .with_correlation_id(*id)
                .with_topic(stream.topic.as_str());
            events.push(Event::single(EventType::SubscriptionData, message));
            stream.ticks += 1;
            if self.max_ticks.is_some_and(|max| stream.ticks >= max) {
                finished.push(*id);
            }
        }

        for id in finished {
            if let Some(stream) = self.streams.remove(&id) {
                info!("Stream {} reached its tick limit", id);
                events.push(status(
                    Names::SUBSCRIPTION_TERMINATED,
                    id,
                    &stream.topic,
                    vec![ErrorInfo::new("CANCELED", "Tick limit reached")
                        .with_source(ERROR_SOURCE, 6)
                        .to_element(Names::REASON)],
                ));
            }
        }
        events
    }
}

impl Stream {
    fn publish(&self, model: &MarketModel) -> Message {
        match &self.kind {
            StreamKind::MarketData { security } => {
                let last = model.intraday(security, self.ticks);
                let values = self
                    .fields
                    .iter()
                    .map(|field| match field.as_str() {
                        "BID" => Element::scalar(field.as_str(), round2(last - 0.01)),
                        "ASK" => Element::scalar(field.as_str(), round2(last + 0.01)),
                        "VOLUME" => Element::scalar(field.as_str(), 1000 * (self.ticks as i64 + 1)),
                        _ => Element::scalar(field.as_str(), last),
                    })
                    .collect();
                Message::new(MARKET_DATA_EVENTS, Element::complex(MARKET_DATA_EVENTS, values))
            }
            StreamKind::Vwap {
                security,
                start,
                end,
            } => {
                // The averaging window grows by half an hour per tick
                let grown = *start + Duration::minutes(30 * (self.ticks as i64 + 1));
                let until = if grown > *end || grown < *start { *end } else { grown };
                let vwap = model.vwap(security, model.as_of(), *start, until);
                let values = self
                    .fields
                    .iter()
                    .map(|field| match field.as_str() {
                        "VOLUME" => Element::scalar(field.as_str(), 5000 * (self.ticks as i64 + 1)),
                        _ => Element::scalar(field.as_str(), vwap),
                    })
                    .collect();
                Message::new(MARKET_DATA_EVENTS, Element::complex(MARKET_DATA_EVENTS, values))
            }
            StreamKind::Page { rows } => {
                let row_update = |index: usize, security: &SecurityInfo| {
                    let price = model.intraday(security, self.ticks);
                    Element::complex(
                        Names::ROW_UPDATE,
                        vec![
                            Element::scalar(Names::ROW_NUM, index as i32 + 1),
                            Element::sequence(
                                Names::SPAN_UPDATE,
                                vec![
                                    span(1, TICKER_WIDTH, &security.ticker),
                                    span(
                                        TICKER_WIDTH + 1,
                                        PRICE_WIDTH,
                                        &format!("{:>10.2}", price),
                                    ),
                                ],
                            ),
                        ],
                    )
                };

                if self.ticks == 0 || rows.is_empty() {
                    let updates = rows
                        .iter()
                        .enumerate()
                        .map(|(i, s)| row_update(i, s))
                        .collect();
                    Message::new(
                        PAGE_UPDATE,
                        Element::complex(
                            PAGE_UPDATE,
                            vec![Element::sequence(Names::ROW_UPDATE, updates)],
                        ),
                    )
                } else {
                    let index = (self.ticks as usize - 1) % rows.len();
                    Message::new(
                        ROW_UPDATE,
                        Element::complex(
                            ROW_UPDATE,
                            vec![Element::sequence(
                                Names::ROW_UPDATE,
                                vec![row_update(index, &rows[index])],
                            )],
                        ),
                    )
                }
            }
        }
    }
}

fn span(start_col: i32, length: i32, text: &str) -> Element {
    Element::complex(
        Names::SPAN_UPDATE,
        vec![
            Element::scalar(Names::START_COL, start_col),
            Element::scalar(Names::LENGTH, length),
            Element::scalar(Names::TEXT, text),
        ],
    )
}
