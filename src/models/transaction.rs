use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::dish::DishKind;

/// Storage format for transaction timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
        }
    }

    pub fn is_income(&self) -> bool {
        matches!(self, Self::Income)
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(format!("unknown transaction kind '{}'", other)),
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub kind: TransactionKind,
    pub amount_cents: i64,
    pub description: String,
    pub dish_id: Option<i64>,
    pub quantity: Option<i64>,
    pub timestamp: NaiveDateTime,
}

impl Transaction {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Units sold, counting a dish sale without quantity as one order.
    pub fn order_count(&self) -> i64 {
        self.quantity.unwrap_or(1)
    }
}

/// The joined dish fields embedded in a transaction row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DishRef {
    pub name: String,
    pub kind: DishKind,
    pub category_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionWithDish {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub dish: Option<DishRef>,
}

impl TransactionWithDish {
    pub fn is_income(&self) -> bool {
        self.transaction.kind.is_income()
    }

    pub fn dish_label(&self) -> String {
        match &self.dish {
            Some(dish) => match self.transaction.quantity {
                Some(qty) => format!("{} \u{00d7} {}", dish.name, qty),
                None => dish.name.clone(),
            },
            None => "\u{2014}".to_string(),
        }
    }

    pub fn date_display(&self) -> String {
        self.transaction.timestamp.format("%d %b %Y, %H:%M").to_string()
    }
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount_cents: i64,
    pub description: String,
    pub dish_id: Option<i64>,
    pub quantity: Option<i64>,
    pub timestamp: NaiveDateTime,
}
