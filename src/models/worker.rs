use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: i64,
    pub name: String,
    pub designation: String,
    pub payment_cents: i64,
    pub effective_date: NaiveDate,
    pub created_at: String,
    pub updated_at: String,
}

impl Worker {
    pub fn effective_date_display(&self) -> String {
        self.effective_date.format("%d %b %Y").to_string()
    }
}

#[derive(Debug, Clone)]
pub struct NewWorker {
    pub name: String,
    pub designation: String,
    pub payment_cents: i64,
    pub effective_date: NaiveDate,
}
