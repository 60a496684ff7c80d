use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Vegetarian classification of a dish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DishKind {
    Veg,
    NonVeg,
}

impl DishKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Veg => "veg",
            Self::NonVeg => "non_veg",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Veg => "Veg",
            Self::NonVeg => "Non-Veg",
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            Self::Veg => "\u{1f33f} Veg",
            Self::NonVeg => "\u{1f357} Non-Veg",
        }
    }

    pub fn is_veg(&self) -> bool {
        matches!(self, Self::Veg)
    }
}

impl FromStr for DishKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "veg" => Ok(Self::Veg),
            "non_veg" => Ok(Self::NonVeg),
            other => Err(format!("unknown dish kind '{}'", other)),
        }
    }
}

impl fmt::Display for DishKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dish {
    pub id: i64,
    pub name: String,
    pub price_cents: i64,
    pub kind: DishKind,
    pub description: Option<String>,
    pub is_available: bool,
    pub category_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// A dish joined with its category's display fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DishWithCategory {
    #[serde(flatten)]
    pub dish: Dish,
    pub category_name: Option<String>,
    pub category_icon: Option<String>,
}

impl DishWithCategory {
    pub fn category_label(&self) -> String {
        match (&self.category_icon, &self.category_name) {
            (Some(icon), Some(name)) => format!("{} {}", icon, name),
            (None, Some(name)) => name.clone(),
            _ => super::category::UNCATEGORIZED.to_string(),
        }
    }

    pub fn description_text(&self) -> &str {
        self.dish.description.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone)]
pub struct NewDish {
    pub name: String,
    pub price_cents: i64,
    pub kind: DishKind,
    pub description: Option<String>,
    pub is_available: bool,
    pub category_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        assert_eq!("veg".parse::<DishKind>().unwrap(), DishKind::Veg);
        assert_eq!("non_veg".parse::<DishKind>().unwrap(), DishKind::NonVeg);
        assert!("vegan".parse::<DishKind>().is_err());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&DishKind::NonVeg).unwrap(), "\"non_veg\"");
    }
}
