//! Deterministic market model
//!
//! Prices are a pure function of the security name and the date, so every
//! run (and every test) sees the same numbers.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Timelike, Weekday};
use std::collections::HashMap;

/// Static description of a simulated security
#[derive(Debug, Clone)]
pub struct SecurityInfo {
    pub ticker: String,
    pub name: String,
    pub currency: String,
    /// Pays dividends (equities do, indices do not)
    pub pays_dividends: bool,
    seed: u64,
}

/// One position in a simulated portfolio
#[derive(Debug, Clone)]
pub struct Holding {
    pub security: String,
    pub position: f64,
    pub cost: f64,
}

/// Universe of securities and portfolios the simulator knows about
#[derive(Debug, Clone)]
pub struct MarketModel {
    securities: HashMap<String, SecurityInfo>,
    portfolios: HashMap<String, Vec<Holding>>,
    /// Date used for point-in-time reference fields
    as_of: NaiveDate,
}

/// FNV-1a, stable across platforms and runs
fn seed_of(name: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in name.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default()
}

pub fn is_trading_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Weekdays from `start` to `end`, inclusive
pub fn trading_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| is_trading_day(*d))
        .collect()
}

/// The `count` weekdays strictly before `date`, oldest first
pub fn trading_days_before(date: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut cursor = date;
    while days.len() < count {
        match cursor.pred_opt() {
            Some(prev) => cursor = prev,
            None => break,
        }
        if is_trading_day(cursor) {
            days.push(cursor);
        }
    }
    days.reverse();
    days
}

impl MarketModel {
    /// Standard universe, reference fields as of `as_of`
    pub fn new(as_of: NaiveDate) -> Self {
        let mut model = Self {
            securities: HashMap::new(),
            portfolios: HashMap::new(),
            as_of,
        };

        for (ticker, name, currency, pays_dividends) in [
            ("IBM US Equity", "INTL BUSINESS MACHINES CORP", "USD", true),
            ("AAPL US Equity", "APPLE INC", "USD", true),
            ("MSFT US Equity", "MICROSOFT CORP", "USD", true),
            ("GOOG US Equity", "ALPHABET INC-CL C", "USD", false),
            ("VOD LN Equity", "VODAFONE GROUP PLC", "GBp", true),
            ("SPX Index", "S&P 500 INDEX", "USD", false),
        ] {
            model.add_security(ticker, name, currency, pays_dividends);
        }

        model.add_portfolio(
            "P1234567-1 Client",
            vec![
                Holding::new("IBM US Equity", 1000.0, 95.50),
                Holding::new("AAPL US Equity", 500.0, 180.20),
                Holding::new("MSFT US Equity", 2000.0, 25.10),
            ],
        );
        model.add_portfolio(
            "P7654321-2 Client",
            vec![
                Holding::new("VOD LN Equity", 10000.0, 1.42),
                Holding::new("GOOG US Equity", 100.0, 540.00),
            ],
        );
        model
    }

    /// Standard universe with reference fields as of today
    pub fn standard() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }

    pub fn add_security(&mut self, ticker: &str, name: &str, currency: &str, pays_dividends: bool) {
        self.securities.insert(
            ticker.to_string(),
            SecurityInfo {
                ticker: ticker.to_string(),
                name: name.to_string(),
                currency: currency.to_string(),
                pays_dividends,
                seed: seed_of(ticker),
            },
        );
    }

    pub fn add_portfolio(&mut self, id: &str, holdings: Vec<Holding>) {
        self.portfolios.insert(id.to_string(), holdings);
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    pub fn security(&self, ticker: &str) -> Option<&SecurityInfo> {
        self.securities.get(ticker)
    }

    pub fn portfolio(&self, id: &str) -> Option<&[Holding]> {
        self.portfolios.get(id).map(Vec::as_slice)
    }

    /// Securities ordered by ticker, used to lay out pages
    pub fn tickers(&self) -> Vec<&str> {
        let mut tickers: Vec<&str> = self.securities.keys().map(String::as_str).collect();
        tickers.sort_unstable();
        tickers
    }

    pub fn close(&self, security: &SecurityInfo, date: NaiveDate) -> f64 {
        let day = (date - epoch()).num_days() as f64;
        let phase = (security.seed % 628) as f64 / 100.0;
        let base = 20.0 + (security.seed % 38_000) as f64 / 100.0;
        round2(base * (1.0 + 0.08 * (day / 45.0 + phase).sin() + 0.02 * (day / 3.0 + phase).cos()))
    }

    pub fn open(&self, security: &SecurityInfo, date: NaiveDate) -> f64 {
        let day = (date - epoch()).num_days() as f64;
        let phase = (security.seed % 628) as f64 / 100.0;
        round2(self.close(security, date) * (1.0 + 0.005 * (day + phase).sin()))
    }

    pub fn high(&self, security: &SecurityInfo, date: NaiveDate) -> f64 {
        let top = self.open(security, date).max(self.close(security, date));
        round2(top * 1.01)
    }

    pub fn low(&self, security: &SecurityInfo, date: NaiveDate) -> f64 {
        let bottom = self.open(security, date).min(self.close(security, date));
        round2(bottom * 0.99)
    }

    pub fn volume(&self, security: &SecurityInfo, date: NaiveDate) -> i64 {
        let day = (date - epoch()).num_days() as u64;
        1_000_000 + ((security.seed ^ day.wrapping_mul(2_654_435_761)) % 9_000_000) as i64
    }

    /// Volume-weighted average price over synthetic five-minute bars between `start` and `end`
    pub fn vwap(
        &self,
        security: &SecurityInfo,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> f64 {
        let close = self.close(security, date);
        let phase = (security.seed % 628) as f64 / 100.0;
        let from = i64::from(start.num_seconds_from_midnight() / 60);
        let to = i64::from(end.num_seconds_from_midnight() / 60).max(from + 1);

        let (mut notional, mut volume) = (0.0, 0.0);
        let mut minute = from;
        while minute < to {
            let price = close * (1.0 + 0.003 * (minute as f64 / 30.0 + phase).sin());
            let size = 1000.0 + ((minute * 7) % 300) as f64;
            notional += price * size;
            volume += size;
            minute += 5;
        }
        round2(notional / volume)
    }

    /// Live price on tick `tick` of the as-of date
    pub fn intraday(&self, security: &SecurityInfo, tick: u64) -> f64 {
        let phase = (security.seed % 628) as f64 / 100.0;
        round2(self.close(security, self.as_of) * (1.0 + 0.001 * (tick as f64 * 0.7 + phase).sin()))
    }

    /// Quarterly dividends declared in the year before the as-of date
    pub fn dividends(&self, security: &SecurityInfo) -> Vec<(NaiveDate, NaiveDate, f64)> {
        if !security.pays_dividends {
            return Vec::new();
        }
        let amount = round2(self.close(security, self.as_of) * 0.006);
        (1..=4)
            .map(|quarter| {
                let declared = self.as_of - Duration::days(91 * quarter);
                (declared, declared + Duration::days(14), amount)
            })
            .collect()
    }
}

impl Holding {
    pub fn new(security: &str, position: f64, cost: f64) -> Self {
        Self {
            security: security.to_string(),
            position,
            cost,
        }
    }
}
