use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::identity::UserId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub mobile: String,
    pub company_name: String,
    pub date_created: NaiveDate,
    pub date_updated: NaiveDate,
    pub sales_contact: UserId,
}

/// Caller-writable client attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub mobile: String,
    pub company_name: String,
}

#[derive(Debug, Clone)]
pub struct NewClient {
    pub fields: ClientFields,
    pub sales_contact: UserId,
    pub today: NaiveDate,
}

impl Client {
    /// Overwrites the writable attributes and restamps ownership and update date.
    pub fn apply(&mut self, fields: ClientFields, sales_contact: UserId, today: NaiveDate) {
        self.first_name = fields.first_name;
        self.last_name = fields.last_name;
        self.email = fields.email;
        self.phone = fields.phone;
        self.mobile = fields.mobile;
        self.company_name = fields.company_name;
        self.sales_contact = sales_contact;
        self.date_updated = today;
    }
}

/// Retrieve representation: the client plus ids of everything linked to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientDetail {
    #[serde(flatten)]
    pub client: Client,
    pub events: Vec<i64>,
    pub contracts: Vec<i64>,
}
