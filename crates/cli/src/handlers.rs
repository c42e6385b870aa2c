//! Handlers used by the example programs

use crate::print::{Output, flatten, print_response, print_subscription_status};
use chrono::Local;
use meridian_core::walker::{get_f64, get_field, get_string, walk_sequence};
use meridian_core::{Message, Names};
use meridian_runner::{EventHandler, HandlerError, SubscriptionHandler};

/// Prints every response message
pub struct ResponsePrinter {
    out: Output,
    responses: usize,
}

impl ResponsePrinter {
    pub fn new(out: Output) -> Self {
        Self { out, responses: 0 }
    }

    pub fn responses(&self) -> usize {
        self.responses
    }
}

impl EventHandler for ResponsePrinter {
    fn on_response(&mut self, message: &Message, _is_final: bool) -> Result<(), HandlerError> {
        self.responses += 1;
        print_response(&self.out, &message.body)
    }
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S%.3f").to_string()
}

/// Prints market data and VWAP ticks for one subscription
pub struct TickPrinter {
    topic: String,
    out: Output,
}

impl TickPrinter {
    pub fn new(topic: impl Into<String>, out: Output) -> Self {
        Self {
            topic: topic.into(),
            out,
        }
    }
}

impl SubscriptionHandler for TickPrinter {
    fn on_data(&mut self, message: &Message) -> Result<(), HandlerError> {
        self.out.line(format!(
            "{} {}: {}",
            timestamp(),
            self.topic,
            flatten(&message.body)?
        ))?;
        Ok(())
    }

    fn on_status(&mut self, message: &Message) -> Result<(), HandlerError> {
        print_subscription_status(&self.out, &self.topic, message)
    }
}

/// Prints page updates: the full page first, then single rows
pub struct PagePrinter {
    topic: String,
    out: Output,
}

impl PagePrinter {
    pub fn new(topic: impl Into<String>, out: Output) -> Self {
        Self {
            topic: topic.into(),
            out,
        }
    }
}

impl SubscriptionHandler for PagePrinter {
    fn on_data(&mut self, message: &Message) -> Result<(), HandlerError> {
        let rows = walk_sequence(get_field(&message.body, Names::ROW_UPDATE)?)?;
        self.out.line(format!(
            "{} {} {} ({} rows)",
            timestamp(),
            self.topic,
            message.message_type,
            rows.len()
        ))?;
        for row in rows {
            let row_num = get_f64(row, Names::ROW_NUM)? as i64;
            for span in walk_sequence(get_field(row, Names::SPAN_UPDATE)?)? {
                let start_col = get_f64(span, Names::START_COL)? as i64;
                let text = get_string(span, Names::TEXT)?;
                self.out
                    .line(format!("  row {:>2} col {:>2}: {}", row_num, start_col, text))?;
            }
        }
        Ok(())
    }

    fn on_status(&mut self, message: &Message) -> Result<(), HandlerError> {
        print_subscription_status(&self.out, &self.topic, message)
    }
}
