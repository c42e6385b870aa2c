//! Subscriptions and subscription lists

use crate::correlation::CorrelationId;
use crate::error::SubscriptionListError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A request for a real-time stream on one topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Service publishing the stream, e.g. `//mktvwap`
    pub service: String,
    /// Topic within the service, e.g. `AAPL US Equity`
    pub topic: String,
    pub fields: Vec<String>,
    /// Options in `NAME=VALUE` form (or a bare `NAME`)
    pub options: Vec<String>,
    pub correlation_id: CorrelationId,
}

impl Subscription {
    pub fn new(
        service: impl Into<String>,
        topic: impl Into<String>,
        correlation_id: CorrelationId,
    ) -> Self {
        Self {
            service: service.into(),
            topic: topic.into(),
            fields: Vec::new(),
            options: Vec::new(),
            correlation_id,
        }
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.extend(options.into_iter().map(Into::into));
        self
    }

    /// Full topic string: `//mktvwap/AAPL US Equity?fields=VWAP&VWAP_START_TIME=09:00`
    pub fn topic_string(&self) -> String {
        let mut topic = format!("{}/{}", self.service, self.topic);
        let mut query = Vec::new();
        if !self.fields.is_empty() {
            query.push(format!("fields={}", self.fields.join(",")));
        }
        query.extend(self.options.iter().cloned());
        if !query.is_empty() {
            topic.push('?');
            topic.push_str(&query.join("&"));
        }
        topic
    }

    /// Options split into `(name, value)`; bare options have no value
    pub fn option_pairs(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.options.iter().map(|opt| match opt.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value.trim())),
            None => (opt.trim(), None),
        })
    }
}

/// Subscriptions to start together; correlation ids are unique within a list
#[derive(Debug, Clone, Default)]
pub struct SubscriptionList {
    items: Vec<Subscription>,
    ids: HashSet<CorrelationId>,
}

impl SubscriptionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, subscription: Subscription) -> Result<(), SubscriptionListError> {
        if subscription.topic.trim().is_empty() {
            return Err(SubscriptionListError::EmptyTopic);
        }
        if !self.ids.insert(subscription.correlation_id) {
            return Err(SubscriptionListError::DuplicateCorrelationId(
                subscription.correlation_id,
            ));
        }
        self.items.push(subscription);
        Ok(())
    }

    pub fn contains(&self, id: CorrelationId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Subscription> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Subscription> {
        self.items
    }
}
