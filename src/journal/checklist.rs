//! User-editable checklist taxonomy: categories of ordered boolean items.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ChecklistSnapshot;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub order: i64,
}

impl ChecklistItem {
    pub fn new(label: &str, description: &str, order: i64) -> Self {
        Self {
            label: label.to_string(),
            description: description.to_string(),
            image: None,
            order,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("category name must not be empty")]
    EmptyCategoryName,

    #[error("category {0} already exists")]
    DuplicateCategory(String),

    #[error("unknown category {0}")]
    UnknownCategory(String),

    #[error("at least one category must exist")]
    LastCategory,

    #[error("item key and label are required")]
    MissingKeyOrLabel,

    #[error("item {key} already exists in {category}")]
    DuplicateItem { category: String, key: String },

    #[error("unknown item {key} in {category}")]
    UnknownItem { category: String, key: String },
}

/// Category name -> item key -> item. Category order is insertion order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChecklistSchema {
    categories: IndexMap<String, IndexMap<String, ChecklistItem>>,
}

impl ChecklistSchema {
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn contains_item(&self, key: &str) -> bool {
        self.categories.values().any(|items| items.contains_key(key))
    }

    /// Items of `category` sorted by `order`; ties keep storage order.
    pub fn sorted_items(&self, category: &str) -> Vec<(&str, &ChecklistItem)> {
        let mut items: Vec<(&str, &ChecklistItem)> = self
            .categories
            .get(category)
            .map(|items| items.iter().map(|(k, v)| (k.as_str(), v)).collect())
            .unwrap_or_default();
        items.sort_by_key(|(_, item)| item.order);
        items
    }

    /// Every item key in display order (category order, then item order).
    pub fn item_keys(&self) -> Vec<&str> {
        self.categories
            .keys()
            .flat_map(|cat| self.sorted_items(cat).into_iter().map(|(k, _)| k))
            .collect()
    }

    pub fn add_category(&mut self, name: &str) -> Result<(), SchemaError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SchemaError::EmptyCategoryName);
        }
        if self.categories.contains_key(name) {
            return Err(SchemaError::DuplicateCategory(name.to_string()));
        }
        self.categories.insert(name.to_string(), IndexMap::new());
        Ok(())
    }

    pub fn delete_category(&mut self, name: &str) -> Result<(), SchemaError> {
        if !self.categories.contains_key(name) {
            return Err(SchemaError::UnknownCategory(name.to_string()));
        }
        if self.categories.len() <= 1 {
            return Err(SchemaError::LastCategory);
        }
        self.categories.shift_remove(name);
        Ok(())
    }

    /// Append an item after the current highest `order` of its category.
    pub fn add_item(
        &mut self,
        category: &str,
        key: &str,
        label: &str,
        description: &str,
    ) -> Result<(), SchemaError> {
        let (key, label) = (key.trim(), label.trim());
        if key.is_empty() || label.is_empty() {
            return Err(SchemaError::MissingKeyOrLabel);
        }
        let items = self
            .categories
            .get_mut(category)
            .ok_or_else(|| SchemaError::UnknownCategory(category.to_string()))?;
        if items.contains_key(key) {
            return Err(SchemaError::DuplicateItem {
                category: category.to_string(),
                key: key.to_string(),
            });
        }
        let order = items.values().map(|i| i.order).max().map_or(0, |m| m + 1);
        items.insert(key.to_string(), ChecklistItem::new(label, description, order));
        Ok(())
    }

    pub fn delete_item(&mut self, category: &str, key: &str) -> Result<(), SchemaError> {
        let items = self
            .categories
            .get_mut(category)
            .ok_or_else(|| SchemaError::UnknownCategory(category.to_string()))?;
        items
            .shift_remove(key)
            .map(|_| ())
            .ok_or_else(|| SchemaError::UnknownItem {
                category: category.to_string(),
                key: key.to_string(),
            })
    }

    /// Swap `order` with the adjacent item. Returns `false` when there is no neighbour.
    pub fn move_item(
        &mut self,
        category: &str,
        key: &str,
        direction: MoveDirection,
    ) -> Result<bool, SchemaError> {
        let sorted: Vec<String> = self
            .sorted_items(category)
            .into_iter()
            .map(|(k, _)| k.to_string())
            .collect();
        if !self.categories.contains_key(category) {
            return Err(SchemaError::UnknownCategory(category.to_string()));
        }
        let pos = sorted
            .iter()
            .position(|k| k == key)
            .ok_or_else(|| SchemaError::UnknownItem {
                category: category.to_string(),
                key: key.to_string(),
            })?;
        let neighbour = match direction {
            MoveDirection::Up if pos > 0 => &sorted[pos - 1],
            MoveDirection::Down if pos + 1 < sorted.len() => &sorted[pos + 1],
            _ => return Ok(false),
        };

        let Some(items) = self.categories.get_mut(category) else {
            return Err(SchemaError::UnknownCategory(category.to_string()));
        };
        let a = items[key].order;
        let b = items[neighbour.as_str()].order;
        if let Some(item) = items.get_mut(key) {
            item.order = b;
        }
        if let Some(item) = items.get_mut(neighbour.as_str()) {
            item.order = a;
        }
        Ok(true)
    }

    /// Snapshot of the current schema with `checked` keys set to true.
    pub fn snapshot(&self, checked: &HashSet<String>) -> ChecklistSnapshot {
        self.item_keys()
            .into_iter()
            .map(|k| (k.to_string(), checked.contains(k)))
            .collect()
    }

    /// Re-snapshot an existing answer set against the current schema.
    ///
    /// Keys missing from the schema are dropped; `overrides` win over `previous`.
    pub fn resnapshot(
        &self,
        previous: &ChecklistSnapshot,
        overrides: &[(String, bool)],
    ) -> ChecklistSnapshot {
        let mut snap: ChecklistSnapshot = self
            .item_keys()
            .into_iter()
            .map(|k| (k.to_string(), previous.get(k).copied().unwrap_or(false)))
            .collect();
        for (key, value) in overrides {
            if let Some(slot) = snap.get_mut(key) {
                *slot = *value;
            }
        }
        snap
    }

    pub fn default_schema() -> Self {
        let mut schema = Self::default();
        let defaults: [(&str, &[(&str, &str, &str)]); 4] = [
            (
                "Market State",
                &[
                    ("m_range", "Range market", "The market is moving sideways."),
                    ("m_long", "Long trend", "Clear uptrend."),
                    ("m_short", "Short trend", "Clear downtrend."),
                ],
            ),
            (
                "Setup & Play",
                &[
                    ("p_vwap", "VWAP play", "Trade based on VWAP."),
                    ("p_manip", "Manipulation", "Manipulation zone identified."),
                    ("p_wol", "WOL", "Week open level."),
                    ("p_mm", "Market maker", "Market maker setup."),
                ],
            ),
            (
                "Entry & Risk",
                &[
                    ("e_liq", "Liquidity", "Entry after a liquidity sweep."),
                    ("e_val", "Value area", "Entry inside the value area."),
                    ("r_ok", "Risk mgmt (1-2%)", "Risk management respected."),
                ],
            ),
            (
                "Outcome",
                &[
                    ("winner", "Winner", ""),
                    ("looser", "Loser", ""),
                    ("n_plan", "According to plan", ""),
                ],
            ),
        ];
        for (category, items) in defaults {
            let entries = items
                .iter()
                .enumerate()
                .map(|(i, (k, label, desc))| {
                    (k.to_string(), ChecklistItem::new(label, desc, i as i64))
                })
                .collect();
            schema.categories.insert(category.to_string(), entries);
        }
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(schema: &ChecklistSchema, cat: &str) -> Vec<String> {
        schema
            .sorted_items(cat)
            .into_iter()
            .map(|(k, _)| k.to_string())
            .collect()
    }

    #[test]
    fn default_schema_shape() {
        let s = ChecklistSchema::default_schema();
        assert_eq!(s.categories().count(), 4);
        assert_eq!(keys(&s, "Setup & Play"), ["p_vwap", "p_manip", "p_wol", "p_mm"]);
        assert_eq!(s.item_keys().len(), 13);
    }

    #[test]
    fn add_category_rejects_empty_and_duplicates() {
        let mut s = ChecklistSchema::default_schema();
        let before = s.clone();
        assert_eq!(s.add_category("  "), Err(SchemaError::EmptyCategoryName));
        assert_eq!(
            s.add_category("Outcome"),
            Err(SchemaError::DuplicateCategory("Outcome".into()))
        );
        assert_eq!(s, before);
        s.add_category("Psychology").unwrap();
        assert_eq!(s.categories().last(), Some("Psychology"));
    }

    #[test]
    fn last_category_cannot_be_deleted() {
        let mut s = ChecklistSchema::default();
        s.add_category("Only").unwrap();
        s.add_item("Only", "k", "Label", "").unwrap();
        let before = s.clone();
        assert_eq!(s.delete_category("Only"), Err(SchemaError::LastCategory));
        assert_eq!(s, before);
    }

    #[test]
    fn add_item_appends_after_max_order() {
        let mut s = ChecklistSchema::default();
        s.add_category("A").unwrap();
        s.add_item("A", "first", "First", "").unwrap();
        assert_eq!(s.sorted_items("A")[0].1.order, 0);
        s.add_item("A", "second", "Second", "desc").unwrap();
        assert_eq!(s.sorted_items("A")[1].1.order, 1);
        assert_eq!(
            s.add_item("A", "", "x", ""),
            Err(SchemaError::MissingKeyOrLabel)
        );
        assert!(matches!(
            s.add_item("A", "first", "Again", ""),
            Err(SchemaError::DuplicateItem { .. })
        ));
        assert!(matches!(
            s.add_item("B", "k", "K", ""),
            Err(SchemaError::UnknownCategory(_))
        ));
    }

    #[test]
    fn move_swaps_with_neighbour() {
        let mut s = ChecklistSchema::default_schema();
        assert!(s.move_item("Market State", "m_long", MoveDirection::Up).unwrap());
        assert_eq!(keys(&s, "Market State"), ["m_long", "m_range", "m_short"]);
        assert!(s.move_item("Market State", "m_range", MoveDirection::Down).unwrap());
        assert_eq!(keys(&s, "Market State"), ["m_long", "m_short", "m_range"]);
    }

    #[test]
    fn move_at_edges_is_noop() {
        let mut s = ChecklistSchema::default_schema();
        let before = s.clone();
        assert!(!s.move_item("Market State", "m_range", MoveDirection::Up).unwrap());
        assert!(!s.move_item("Market State", "m_short", MoveDirection::Down).unwrap());
        assert_eq!(s, before);
    }

    #[test]
    fn snapshots_follow_schema() {
        let s = ChecklistSchema::default_schema();
        let checked: HashSet<String> = ["p_vwap".to_string(), "bogus".to_string()].into();
        let snap = s.snapshot(&checked);
        assert_eq!(snap.len(), 13);
        assert_eq!(snap.get("p_vwap"), Some(&true));
        assert_eq!(snap.get("m_range"), Some(&false));
        assert!(!snap.contains_key("bogus"));

        let mut previous = snap.clone();
        previous.insert("retired".into(), true);
        let next = s.resnapshot(&previous, &[("winner".into(), true), ("p_vwap".into(), false)]);
        assert_eq!(next.get("winner"), Some(&true));
        assert_eq!(next.get("p_vwap"), Some(&false));
        assert!(!next.contains_key("retired"));
    }

    #[test]
    fn json_round_trip_keeps_category_order() {
        let s = ChecklistSchema::default_schema();
        let back = ChecklistSchema::from_json(&s.to_json()).unwrap();
        assert_eq!(back, s);
        assert_eq!(
            back.categories().collect::<Vec<_>>(),
            ["Market State", "Setup & Play", "Entry & Risk", "Outcome"]
        );
    }

    #[test]
    fn items_without_order_default_to_zero() {
        let s = ChecklistSchema::from_json(r#"{"A": {"x": {"label": "X"}}}"#).unwrap();
        let items = s.sorted_items("A");
        assert_eq!(items[0].1.order, 0);
        assert_eq!(items[0].1.description, "");
    }
}
