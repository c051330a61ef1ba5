use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::identity::UserId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Contract {
    pub id: i64,
    pub sales_contact: UserId,
    #[sqlx(rename = "client_id")]
    pub client: i64,
    pub date_created: NaiveDate,
    pub date_updated: NaiveDate,
    pub signed_status: bool,
    pub amount: f64,
    pub payment_due: NaiveDate,
}

impl Contract {
    pub fn is_active(&self) -> bool {
        self.signed_status
    }

    pub fn apply(&mut self, fields: ContractFields, sales_contact: UserId, today: NaiveDate) {
        self.client = fields.client;
        self.signed_status = fields.signed_status;
        self.amount = fields.amount;
        self.payment_due = fields.payment_due;
        self.sales_contact = sales_contact;
        self.date_updated = today;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractFields {
    pub client: i64,
    #[serde(default)]
    pub signed_status: bool,
    pub amount: f64,
    pub payment_due: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct NewContract {
    pub fields: ContractFields,
    pub sales_contact: UserId,
    pub today: NaiveDate,
}
