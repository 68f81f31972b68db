//! Hymn categories and the static registry that defines them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One numbered collection of hymn sheets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Registry key, e.g. `chansongga`.
    pub id: String,
    /// Display name, also used as the filename prefix for prefixed assets.
    pub name: String,
    /// Highest logical page number; numbers run `1..=total`.
    pub total: u32,
    /// Asset folder under the images directory.
    pub folder: String,
}

impl Category {
    pub fn new(id: &str, name: &str, total: u32, folder: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            total,
            folder: folder.to_string(),
        }
    }

    /// Check whether a logical number lies within `1..=total`.
    pub fn contains(&self, number: u32) -> bool {
        number >= 1 && number <= self.total
    }
}

/// A hard-coded combined asset whose range does not follow the two-page rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrregularRange {
    pub category: String,
    pub first: u32,
    pub last: u32,
}

impl IrregularRange {
    pub fn applies_to(&self, category: &str, number: u32) -> bool {
        self.category == category && number >= self.first && number <= self.last
    }
}

/// Read-only mapping from category identifier to its definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRegistry {
    categories: BTreeMap<String, Category>,
    irregular: Vec<IrregularRange>,
    default_id: String,
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        let mut categories = BTreeMap::new();
        for category in [
            Category::new("chansongga", "찬송가", 559, "chansongga"),
            Category::new("eunhae", "은혜찬송", 308, "eunhae"),
        ] {
            categories.insert(category.id.clone(), category);
        }

        Self {
            categories,
            irregular: vec![IrregularRange {
                category: "chansongga".to_string(),
                first: 551,
                last: 556,
            }],
            default_id: "chansongga".to_string(),
        }
    }
}

impl CategoryRegistry {
    /// Create an empty registry; the first inserted category becomes the default.
    pub fn empty() -> Self {
        Self {
            categories: BTreeMap::new(),
            irregular: Vec::new(),
            default_id: String::new(),
        }
    }

    /// Add or replace a category.
    pub fn insert(&mut self, category: Category) {
        if self.default_id.is_empty() {
            self.default_id = category.id.clone();
        }
        self.categories.insert(category.id.clone(), category);
    }

    pub fn add_irregular(&mut self, range: IrregularRange) {
        if !self.irregular.contains(&range) {
            self.irregular.push(range);
        }
    }

    /// Drop every irregular range, e.g. when a config file supplies its own list.
    pub fn clear_irregular(&mut self) {
        self.irregular.clear();
    }

    pub fn set_default(&mut self, id: &str) -> bool {
        if self.categories.contains_key(id) {
            self.default_id = id.to_string();
            true
        } else {
            false
        }
    }

    pub fn get(&self, id: &str) -> Option<&Category> {
        self.categories.get(id)
    }

    /// The category that is active when a session starts without a choice.
    pub fn default_category(&self) -> Option<&Category> {
        self.categories.get(&self.default_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Every irregular range declared for `category`.
    pub fn irregular_in<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a IrregularRange> + 'a {
        self.irregular.iter().filter(move |r| r.category == category)
    }

    /// Irregular ranges that apply to `number` within `category`.
    pub fn irregular_for<'a>(
        &'a self,
        category: &'a str,
        number: u32,
    ) -> impl Iterator<Item = &'a IrregularRange> + 'a {
        self.irregular
            .iter()
            .filter(move |r| r.applies_to(category, number))
    }
}
