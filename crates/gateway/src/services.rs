//! Service and operation names
//!
//! Services are addressed by name when opened; requests name the operation
//! within the service.

pub struct Services;

impl Services {
    /// Request/response reference data: historical, reference, portfolio
    pub const REFDATA: &'static str = "//refdata";

    /// Technical analysis studies
    pub const TASVC: &'static str = "//tasvc";

    /// Real-time market data subscriptions
    pub const MKTDATA: &'static str = "//mktdata";

    /// Real-time VWAP subscriptions
    pub const MKTVWAP: &'static str = "//mktvwap";

    /// Page (monitor) subscriptions: `<monitor>/<page>/<subpage>`
    pub const PAGEDATA: &'static str = "//pagedata";

    /// Services that publish subscriptions rather than answer requests
    pub fn is_subscription_service(name: &str) -> bool {
        matches!(name, Self::MKTDATA | Self::MKTVWAP | Self::PAGEDATA)
    }

    pub fn all() -> [&'static str; 5] {
        [
            Self::REFDATA,
            Self::TASVC,
            Self::MKTDATA,
            Self::MKTVWAP,
            Self::PAGEDATA,
        ]
    }
}

pub struct Operations;

impl Operations {
    pub const HISTORICAL_DATA: &'static str = "HistoricalDataRequest";
    pub const REFERENCE_DATA: &'static str = "ReferenceDataRequest";
    pub const PORTFOLIO_DATA: &'static str = "PortfolioDataRequest";
    pub const STUDY: &'static str = "studyRequest";

    /// Response message type for an operation: `HistoricalDataRequest` -> `HistoricalDataResponse`
    pub fn response_type(operation: &str) -> String {
        match operation.strip_suffix("Request") {
            Some(stem) => format!("{}Response", stem),
            None => format!("{}Response", operation),
        }
    }
}
