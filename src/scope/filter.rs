//! Caller-supplied list filters. They are applied on top of a scope and can
//! only remove records from it. Blank values are ignored.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::fmt::Display;
use std::str::FromStr;

use crate::database::models::{Client, Contract, Event};

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Typed query value where an empty or all-space value means "not given".
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// `GET /clients` filters, exact match.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClientFilter {
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl ClientFilter {
    pub fn last_name(&self) -> Option<&str> {
        present(&self.last_name)
    }

    pub fn email(&self) -> Option<&str> {
        present(&self.email)
    }

    pub fn matches(&self, client: &Client) -> bool {
        self.last_name().map_or(true, |v| client.last_name == v)
            && self.email().map_or(true, |v| client.email == v)
    }
}

/// `GET /contracts` filters. Name and email look at the linked client and
/// match case-insensitive substrings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ContractFilter {
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub date_created: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub client: Option<i64>,
}

impl ContractFilter {
    pub fn last_name(&self) -> Option<&str> {
        present(&self.last_name)
    }

    pub fn email(&self) -> Option<&str> {
        present(&self.email)
    }

    /// `client` is the contract's own client.
    pub fn matches(&self, contract: &Contract, client: &Client) -> bool {
        self.last_name().map_or(true, |v| contains_ignore_case(&client.last_name, v))
            && self.email().map_or(true, |v| contains_ignore_case(&client.email, v))
            && self.date_created.map_or(true, |d| contract.date_created == d)
            && self.amount.map_or(true, |a| contract.amount == a)
            && self.client.map_or(true, |id| contract.client == id)
    }
}

/// `GET /events` filters, exact match.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EventFilter {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub event_date: Option<NaiveDate>,
    #[serde(rename = "client__last_name", alias = "last_name")]
    pub last_name: Option<String>,
    #[serde(rename = "client__email", alias = "email")]
    pub email: Option<String>,
}

impl EventFilter {
    pub fn last_name(&self) -> Option<&str> {
        present(&self.last_name)
    }

    pub fn email(&self) -> Option<&str> {
        present(&self.email)
    }

    /// `client` is the event's own client.
    pub fn matches(&self, event: &Event, client: &Client) -> bool {
        self.event_date.map_or(true, |d| event.event_date == d)
            && self.last_name().map_or(true, |v| client.last_name == v)
            && self.email().map_or(true, |v| client.email == v)
    }
}
