use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::identity::UserId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    #[sqlx(rename = "client_id")]
    pub client: i64,
    pub date_created: NaiveDate,
    pub date_updated: NaiveDate,
    pub support_contact: UserId,
    #[sqlx(rename = "event_status_id")]
    pub event_status: i64,
    pub attendees: i32,
    pub event_date: NaiveDate,
    pub notes: String,
}

impl Event {
    pub fn apply(&mut self, fields: EventFields, event_status: i64, today: NaiveDate) {
        self.client = fields.client;
        self.support_contact = fields.support_contact;
        self.event_status = event_status;
        self.attendees = fields.attendees;
        self.event_date = fields.event_date;
        self.notes = fields.notes;
        self.date_updated = today;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFields {
    pub client: i64,
    pub support_contact: UserId,
    #[serde(default)]
    pub event_status: Option<i64>,
    pub attendees: i32,
    pub event_date: NaiveDate,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub fields: EventFields,
    pub event_status: i64,
    pub today: NaiveDate,
}

/// Row of the `event_statuses` lookup table; `status` is unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct EventStatus {
    pub id: i64,
    pub status: bool,
}
