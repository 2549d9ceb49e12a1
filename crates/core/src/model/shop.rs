use serde::{Deserialize, Serialize};

use super::id_string;

/// Shop or designer profile, cached as `shop.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Shop {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    /// Display title; falls back to `name` when the backend has none.
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub currency_code: Option<String>,
    pub icon_url: Option<String>,
    pub product_count: Option<u64>,
    /// Names of featured collections or bundles.
    pub featured: Vec<String>,
}

impl Shop {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(&self.name)
    }
}
