//! Field-by-field payload validation. Every problem is collected so the
//! caller sees all field errors at once.

use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::CrmError;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const NOT_AN_INTEGER: &str = "A valid integer is required.";
pub const NOT_A_NUMBER: &str = "A valid number is required.";
pub const NOT_A_BOOLEAN: &str = "Must be a valid boolean.";
pub const NOT_A_DATE: &str = "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";
pub const NEGATIVE: &str = "Ensure this value is greater than or equal to 0.";
pub const NOT_AN_OBJECT: &str = "Invalid data. Expected a dictionary.";

pub fn too_long(max: usize) -> String {
    format!("Ensure this field has no more than {} characters.", max)
}

pub fn does_not_exist(id: i64) -> String {
    format!("Invalid pk \"{}\" - object does not exist.", id)
}

pub struct Payload<'a> {
    fields: Option<&'a Map<String, Value>>,
    errors: HashMap<String, String>,
}

impl<'a> Payload<'a> {
    pub fn new(value: &'a Value) -> Self {
        let mut payload = Self {
            fields: value.as_object(),
            errors: HashMap::new(),
        };
        if payload.fields.is_none() {
            payload.reject("non_field_errors", NOT_AN_OBJECT);
        }
        payload
    }

    /// `null` counts as absent.
    fn get(&self, field: &str) -> Option<&'a Value> {
        self.fields
            .and_then(|fields| fields.get(field))
            .filter(|v| !v.is_null())
    }

    fn fail<T: Default>(&mut self, field: &str, message: impl Into<String>) -> T {
        self.reject(field, message);
        T::default()
    }

    /// Records an error for `field`; the first error per field wins.
    pub fn reject(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    fn string(&mut self, field: &str, max: usize, required: bool) -> String {
        let text = match self.get(field) {
            None if required => return self.fail(field, REQUIRED),
            None => return String::new(),
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(_) => return self.fail(field, "Not a valid string."),
        };
        if required && text.is_empty() {
            return self.fail(field, BLANK);
        }
        if text.chars().count() > max {
            return self.fail(field, too_long(max));
        }
        text
    }

    pub fn text(&mut self, field: &str, max: usize) -> String {
        self.string(field, max, true)
    }

    /// Required string taken verbatim: no trimming and no length cap.
    /// Credentials go through here so they compare exactly as stored.
    pub fn raw_text(&mut self, field: &str) -> String {
        match self.get(field) {
            None => self.fail(field, REQUIRED),
            Some(Value::String(s)) if s.is_empty() => self.fail(field, BLANK),
            Some(Value::String(s)) => s.clone(),
            Some(_) => self.fail(field, "Not a valid string."),
        }
    }

    /// Absent or blank yields an empty string.
    pub fn optional_text(&mut self, field: &str, max: usize) -> String {
        self.string(field, max, false)
    }

    pub fn optional_integer(&mut self, field: &str) -> Option<i64> {
        let parsed = match self.get(field)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        match parsed {
            Some(n) => Some(n),
            None => self.fail(field, NOT_AN_INTEGER),
        }
    }

    pub fn integer(&mut self, field: &str) -> i64 {
        if self.get(field).is_none() {
            return self.fail(field, REQUIRED);
        }
        self.optional_integer(field).unwrap_or_default()
    }

    pub fn number(&mut self, field: &str) -> f64 {
        let parsed = match self.get(field) {
            None => return self.fail(field, REQUIRED),
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(_) => None,
        };
        match parsed.filter(|n| n.is_finite()) {
            Some(n) => n,
            None => self.fail(field, NOT_A_NUMBER),
        }
    }

    pub fn boolean_or(&mut self, field: &str, default: bool) -> bool {
        match self.get(field) {
            None => default,
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => self.fail(field, NOT_A_BOOLEAN),
            },
            Some(Value::Number(n)) => match n.as_i64() {
                Some(1) => true,
                Some(0) => false,
                _ => self.fail(field, NOT_A_BOOLEAN),
            },
            Some(_) => self.fail(field, NOT_A_BOOLEAN),
        }
    }

    pub fn date(&mut self, field: &str) -> NaiveDate {
        let parsed = match self.get(field) {
            None => return self.fail(field, REQUIRED),
            Some(Value::String(s)) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
            Some(_) => None,
        };
        match parsed {
            Some(date) => date,
            None => self.fail(field, NOT_A_DATE),
        }
    }

    /// The collected errors as a failure, whether or not any were recorded.
    pub fn into_error(self) -> CrmError {
        CrmError::Validation {
            field_errors: self.errors,
        }
    }

    pub fn finish(self) -> Result<(), CrmError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.into_error())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn errors(result: Result<(), CrmError>) -> HashMap<String, String> {
        match result {
            Err(CrmError::Validation { field_errors }) => field_errors,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn collects_every_field_error() {
        let body = json!({ "first_name": "", "last_name": "x".repeat(26), "amount": "lots" });
        let mut p = Payload::new(&body);
        p.text("first_name", 25);
        p.text("last_name", 25);
        p.text("email", 100);
        p.number("amount");
        let errs = errors(p.finish());

        assert_eq!(errs["first_name"], BLANK);
        assert_eq!(errs["last_name"], too_long(25));
        assert_eq!(errs["email"], REQUIRED);
        assert_eq!(errs["amount"], NOT_A_NUMBER);
    }

    #[test]
    fn raw_text_keeps_spaces_and_length() {
        let long = "p".repeat(300);
        let body = json!({ "password": " secret ", "long": long, "blank": "" });
        let mut p = Payload::new(&body);
        assert_eq!(p.raw_text("password"), " secret ");
        assert_eq!(p.raw_text("long"), long);
        p.raw_text("blank");
        p.raw_text("missing");
        let errs = errors(p.finish());

        assert_eq!(errs.len(), 2);
        assert_eq!(errs["blank"], BLANK);
        assert_eq!(errs["missing"], REQUIRED);
    }

    #[test]
    fn accepts_well_formed_values() {
        let body = json!({
            "client": "3",
            "amount": 50,
            "signed_status": true,
            "payment_due": "2023-02-28",
            "notes": null
        });
        let mut p = Payload::new(&body);
        assert_eq!(p.integer("client"), 3);
        assert_eq!(p.number("amount"), 50.0);
        assert!(p.boolean_or("signed_status", false));
        assert_eq!(p.date("payment_due"), NaiveDate::from_ymd_opt(2023, 2, 28).unwrap());
        assert_eq!(p.optional_text("notes", 400), "");
        assert!(p.optional_integer("event_status").is_none());
        assert!(p.finish().is_ok());
    }

    #[test]
    fn bad_dates_and_non_objects() {
        let body = json!({ "event_date": "25/02/2023" });
        let mut p = Payload::new(&body);
        p.date("event_date");
        assert_eq!(errors(p.finish())["event_date"], NOT_A_DATE);

        let list = json!([1, 2]);
        let errs = errors(Payload::new(&list).finish());
        assert_eq!(errs["non_field_errors"], NOT_AN_OBJECT);
    }
}
