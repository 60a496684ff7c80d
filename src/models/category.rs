use serde::{Deserialize, Serialize};

/// Label used for dishes without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub icon: String,
}

impl Category {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.icon, self.name)
    }
}
