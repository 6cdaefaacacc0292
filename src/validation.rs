//! Field-level input validation shared by the request payloads.
//!
//! Payloads are deserialized loosely (every field optional) and then checked
//! here in full, so a single response reports every failing field and nothing
//! is written until the whole payload is valid.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

pub const PASSWORD_MIN_LENGTH: usize = 5;
pub const MAX_TEXT_LENGTH: usize = 255;

const PRICE_MAX_DIGITS: usize = 5;
const PRICE_DECIMAL_PLACES: usize = 2;
const INVALID_NUMBER: &str = "A valid number is required.";

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// `Ok(value)` when no error was recorded.
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Lowercases the domain part of an address, leaving the local part alone.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Validates and normalizes an email address.
pub fn email(errors: &mut ValidationErrors, field: &str, value: Option<&str>) -> Option<String> {
    let Some(value) = value else {
        errors.add(field, REQUIRED);
        return None;
    };
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, BLANK);
        return None;
    }
    match value.rsplit_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !local.contains('@')
                && !domain.is_empty()
                && !value.chars().any(char::is_whitespace) =>
        {
            if value.chars().count() > MAX_TEXT_LENGTH {
                errors.add(field, max_length_message(MAX_TEXT_LENGTH));
                return None;
            }
            Some(normalize_email(value))
        }
        _ => {
            errors.add(field, "Enter a valid email address.");
            None
        }
    }
}

pub fn password<'a>(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&'a str>,
    required: bool,
) -> Option<&'a str> {
    match value {
        None => {
            if required {
                errors.add(field, REQUIRED);
            }
            None
        }
        Some("") => {
            errors.add(field, BLANK);
            None
        }
        Some(value) if value.chars().count() < PASSWORD_MIN_LENGTH => {
            errors.add(
                field,
                format!("Ensure this field has at least {PASSWORD_MIN_LENGTH} characters."),
            );
            None
        }
        Some(value) => Some(value),
    }
}

/// A non-blank string of at most `MAX_TEXT_LENGTH` characters.
pub fn text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
    required: bool,
) -> Option<String> {
    let Some(value) = value else {
        if required {
            errors.add(field, REQUIRED);
        }
        return None;
    };
    let value = value.trim().to_string();
    if value.is_empty() {
        errors.add(field, BLANK);
        None
    } else if value.chars().count() > MAX_TEXT_LENGTH {
        errors.add(field, max_length_message(MAX_TEXT_LENGTH));
        None
    } else {
        Some(value)
    }
}

/// Like [`text`] but blank is allowed.
pub fn optional_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
    max_length: Option<usize>,
) -> Option<String> {
    let value = value?;
    match max_length {
        Some(max) if value.chars().count() > max => {
            errors.add(field, max_length_message(max));
            None
        }
        _ => Some(value),
    }
}

pub fn positive_integer(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<i64>,
    required: bool,
) -> Option<i64> {
    match value {
        None => {
            if required {
                errors.add(field, REQUIRED);
            }
            None
        }
        Some(value) if value <= 0 => {
            errors.add(field, "Ensure this value is greater than or equal to 1.");
            None
        }
        Some(value) => Some(value),
    }
}

pub fn price(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<RawDecimal>,
    required: bool,
) -> Option<Price> {
    let Some(value) = value else {
        if required {
            errors.add(field, REQUIRED);
        }
        return None;
    };
    match value.to_string().parse::<Price>() {
        Ok(price) => Some(price),
        Err(message) => {
            errors.add(field, message);
            None
        }
    }
}

fn max_length_message(max: usize) -> String {
    format!("Ensure this field has no more than {max} characters.")
}

/// A decimal as it arrives over JSON: either a number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawDecimal {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for RawDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawDecimal::Number(number) => write!(f, "{number}"),
            RawDecimal::Text(text) => write!(f, "{}", text.trim()),
        }
    }
}

/// Fixed-point price with at most five digits, two of them after the
/// decimal point. Held as cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Price(i64);

impl Price {
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn as_decimal(self) -> Decimal {
        Decimal::new(self.0, PRICE_DECIMAL_PLACES as u32)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = String;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        // Leading zeros never reach the mantissa, so "0.05" counts two digits.
        let decimals = value.scale() as usize;
        let digits = value
            .mantissa()
            .unsigned_abs()
            .to_string()
            .len()
            .max(decimals);

        if digits > PRICE_MAX_DIGITS {
            return Err(format!(
                "Ensure that there are no more than {PRICE_MAX_DIGITS} digits in total."
            ));
        }
        if decimals > PRICE_DECIMAL_PLACES {
            return Err(format!(
                "Ensure that there are no more than {PRICE_DECIMAL_PLACES} decimal places."
            ));
        }
        let max_whole = PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES;
        if digits - decimals > max_whole {
            return Err(format!(
                "Ensure that there are no more than {max_whole} digits before the decimal point."
            ));
        }

        let mut value = value;
        value.rescale(PRICE_DECIMAL_PLACES as u32);
        let cents = i64::try_from(value.mantissa()).map_err(|_| INVALID_NUMBER.to_string())?;
        Ok(Self(cents))
    }
}

impl FromStr for Price {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s)
            .map_err(|_| INVALID_NUMBER.to_string())?
            .try_into()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_decimal())
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Serialize::serialize(&self.as_decimal(), serializer)
    }
}
