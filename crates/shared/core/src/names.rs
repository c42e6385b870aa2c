//! Well-known element and message names
//!
//! Centralised so the harness, the simulated gateway and the examples agree
//! on spelling.

pub struct Names;

impl Names {
    // Response structure

    pub const SECURITY_DATA: &'static str = "securityData";
    pub const SECURITY: &'static str = "security";
    pub const SEQUENCE_NUMBER: &'static str = "sequenceNumber";
    pub const FIELD_DATA: &'static str = "fieldData";
    pub const DATE: &'static str = "date";
    pub const RESPONSE_ERROR: &'static str = "responseError";

    // Per-item errors

    pub const SECURITY_ERROR: &'static str = "securityError";
    pub const FIELD_EXCEPTIONS: &'static str = "fieldExceptions";
    pub const FIELD_ID: &'static str = "fieldId";
    pub const ERROR_INFO: &'static str = "errorInfo";
    pub const SOURCE: &'static str = "source";
    pub const CODE: &'static str = "code";
    pub const CATEGORY: &'static str = "category";
    pub const SUBCATEGORY: &'static str = "subcategory";
    pub const MESSAGE: &'static str = "message";
    pub const REASON: &'static str = "reason";
    pub const EXCEPTIONS: &'static str = "exceptions";
    pub const DESCRIPTION: &'static str = "description";

    // Request parameters

    pub const SECURITIES: &'static str = "securities";
    pub const FIELDS: &'static str = "fields";
    pub const OVERRIDES: &'static str = "overrides";
    pub const VALUE: &'static str = "value";
    pub const START_DATE: &'static str = "startDate";
    pub const END_DATE: &'static str = "endDate";
    pub const PERIODICITY: &'static str = "periodicitySelection";
    pub const STUDY: &'static str = "study";
    pub const PERIOD: &'static str = "period";
    pub const STUDY_DATA: &'static str = "studyData";

    // Page data

    pub const ROW_UPDATE: &'static str = "rowUpdate";
    pub const ROW_NUM: &'static str = "rowNum";
    pub const SPAN_UPDATE: &'static str = "spanUpdate";
    pub const START_COL: &'static str = "startCol";
    pub const LENGTH: &'static str = "length";
    pub const TEXT: &'static str = "text";

    // Status message types

    pub const SESSION_STARTED: &'static str = "SessionStarted";
    pub const SESSION_STARTUP_FAILURE: &'static str = "SessionStartupFailure";
    pub const SESSION_TERMINATED: &'static str = "SessionTerminated";
    pub const SERVICE_OPENED: &'static str = "ServiceOpened";
    pub const SERVICE_OPEN_FAILURE: &'static str = "ServiceOpenFailure";
    pub const SUBSCRIPTION_STARTED: &'static str = "SubscriptionStarted";
    pub const SUBSCRIPTION_FAILURE: &'static str = "SubscriptionFailure";
    pub const SUBSCRIPTION_TERMINATED: &'static str = "SubscriptionTerminated";
    pub const REQUEST_FAILURE: &'static str = "RequestFailure";
}
