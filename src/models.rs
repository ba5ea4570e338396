//! Data models for items, recipes, and resolved material trees

use serde::Deserialize;

pub type ItemId = i64;

/// Material category an item is bucketed into for cost summation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Equipment,
    CraftResource,
    GatherResource,
}

impl Category {
    /// Map a catalog subtype string to a category. Unknown subtypes
    /// fall back to Equipment.
    pub fn from_subtype(subtype: &str) -> Self {
        match subtype {
            "CraftResource" => Category::CraftResource,
            "GatherResource" => Category::GatherResource,
            _ => Category::Equipment,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Equipment => "Equipment",
            Category::CraftResource => "Craft Resources",
            Category::GatherResource => "Gather Resources",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub subtype: String,
    pub grade: Option<String>,
}

/// One `(material, quantity per crafted unit)` entry of a recipe
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeMaterial {
    pub id: ItemId,
    pub count: i64,
}

/// Node in the resolved bill-of-materials forest
///
/// `count` is the absolute quantity required at this node, already
/// multiplied through by every ancestor multiplier. An empty
/// `children` list means the material is a leaf (no recipe).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialRow {
    pub id: ItemId,
    pub count: i64,
    pub children: Vec<MaterialRow>,
}

/// One equipment slot of the player's selection
#[derive(Debug, Clone)]
pub struct SelectionSlot {
    pub slot: String,
    pub item_id: Option<ItemId>,
    pub quantity: i64,
}

/// Cost totals per category, derived on every read
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CategorySums {
    pub equipment: f64,
    pub craft: f64,
    pub gather: f64,
}

impl CategorySums {
    pub fn total(&self) -> f64 {
        self.equipment + self.craft + self.gather
    }

    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::Equipment => self.equipment,
            Category::CraftResource => self.craft,
            Category::GatherResource => self.gather,
        }
    }

    pub fn add(&mut self, category: Category, amount: f64) {
        match category {
            Category::Equipment => self.equipment += amount,
            Category::CraftResource => self.craft += amount,
            Category::GatherResource => self.gather += amount,
        }
    }
}
