//! Reading request parameters

use crate::error::{Result, SimError};
use chrono::NaiveDate;
use meridian_core::walker::{get_field, get_value, has_field, typed_value, walk_sequence};
use meridian_core::{Element, Names};

/// Format of request dates such as `startDate`
pub const REQUEST_DATE_FORMAT: &str = "%Y%m%d";

/// Values of the repeated parameter `name`; empty when absent
pub fn strings(params: &Element, name: &str) -> Result<Vec<String>> {
    if !has_field(params, name) {
        return Ok(Vec::new());
    }
    walk_sequence(get_field(params, name)?)?
        .map(|entry| Ok(typed_value(entry)?.to_string()))
        .collect()
}

pub fn optional_string(params: &Element, name: &str) -> Result<Option<String>> {
    if !has_field(params, name) {
        return Ok(None);
    }
    Ok(Some(get_value(params, name)?.to_string()))
}

pub fn required_string(params: &Element, name: &str) -> Result<String> {
    optional_string(params, name)?
        .ok_or_else(|| SimError::InvalidArgument(format!("missing parameter {}", name)))
}

pub fn date(params: &Element, name: &str) -> Result<NaiveDate> {
    let text = required_string(params, name)?;
    NaiveDate::parse_from_str(&text, REQUEST_DATE_FORMAT)
        .map_err(|_| SimError::InvalidArgument(format!("{} is not a YYYYMMDD date: {}", name, text)))
}

/// `(fieldId, value)` pairs of the `overrides` table, in request order
pub fn overrides(params: &Element) -> Result<Vec<(String, String)>> {
    if !has_field(params, Names::OVERRIDES) {
        return Ok(Vec::new());
    }
    walk_sequence(get_field(params, Names::OVERRIDES)?)?
        .map(|row| {
            Ok((
                get_value(row, Names::FIELD_ID)?.to_string(),
                get_value(row, Names::VALUE)?.to_string(),
            ))
        })
        .collect()
}
