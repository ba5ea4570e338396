//! Read-only catalog snapshots loaded from the database
//!
//! The resolver and the price ledger only ever see these lookup
//! structures, never the database connection, which keeps them pure
//! and testable against hand-built catalogs.

use std::collections::HashMap;

use anyhow::Result;
use rusqlite::Connection;

use crate::models::{Item, ItemId, RecipeMaterial};

/// Maps a craftable item to its list of required materials
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    recipes: HashMap<ItemId, Vec<RecipeMaterial>>,
}

impl RecipeCatalog {
    pub fn from_recipes(recipes: impl IntoIterator<Item = (ItemId, Vec<RecipeMaterial>)>) -> Self {
        Self {
            recipes: recipes.into_iter().collect(),
        }
    }

    pub fn load(conn: &Connection) -> Result<Self> {
        let mut stmt = conn.prepare(
            "SELECT item_id, material_id, count
             FROM recipe_materials
             ORDER BY item_id, ord",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, ItemId>(0)?,
                RecipeMaterial {
                    id: row.get(1)?,
                    count: row.get(2)?,
                },
            ))
        })?;

        let mut recipes: HashMap<ItemId, Vec<RecipeMaterial>> = HashMap::new();
        for row in rows {
            let (item_id, material) = row?;
            recipes.entry(item_id).or_default().push(material);
        }
        Ok(Self { recipes })
    }

    /// Materials of `id`'s recipe. `None` when the item has no recipe
    /// or an empty one, so callers treat both as a raw leaf.
    pub fn lookup(&self, id: ItemId) -> Option<&[RecipeMaterial]> {
        self.recipes
            .get(&id)
            .map(|m| m.as_slice())
            .filter(|m| !m.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &[RecipeMaterial])> {
        self.recipes.iter().map(|(id, m)| (*id, m.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

/// Maps an item to its display metadata
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    items: HashMap<ItemId, Item>,
}

impl ItemCatalog {
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        Self {
            items: items.into_iter().map(|i| (i.id, i)).collect(),
        }
    }

    pub fn load(conn: &Connection) -> Result<Self> {
        let mut stmt = conn.prepare("SELECT id, name, subtype, grade FROM items")?;
        let rows = stmt.query_map([], |row| {
            Ok(Item {
                id: row.get(0)?,
                name: row.get(1)?,
                subtype: row.get(2)?,
                grade: row.get(3)?,
            })
        })?;

        let mut items = HashMap::new();
        for row in rows {
            let item: Item = row?;
            items.insert(item.id, item);
        }
        Ok(Self { items })
    }

    pub fn lookup(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    /// Display name, falling back to the bare id for items missing
    /// from the catalog data.
    pub fn name(&self, id: ItemId) -> String {
        match self.items.get(&id) {
            Some(item) => item.name.clone(),
            None => format!("#{id}"),
        }
    }
}
