//! Bill-of-materials resolver
//!
//! Expands the selected equipment into a forest of material rows.
//! Top-level materials shared by several selected pieces are merged
//! into one row with a summed count, and the merged total is what
//! gets multiplied through the sub-recipes, so a material reached
//! from two different slots is expanded exactly once.

use crate::catalog::RecipeCatalog;
use crate::models::{ItemId, MaterialRow, SelectionSlot};

use std::collections::BTreeMap;

// Cap on recipe nesting. Real catalogs are a handful of tiers deep;
// hitting this means the recipe data contains a cycle.
const MAX_DEPTH: usize = 32;

/// Resolve a selection snapshot into sorted top-level material rows
pub fn resolve(selection: &[SelectionSlot], recipes: &RecipeCatalog) -> Vec<MaterialRow> {
    // Pass 1: accumulate direct materials across all slots, keyed and
    // therefore sorted by material id.
    let mut totals: BTreeMap<ItemId, i64> = BTreeMap::new();
    for slot in selection {
        let Some(item_id) = slot.item_id else { continue };
        if slot.quantity <= 0 {
            continue;
        }
        let Some(materials) = recipes.lookup(item_id) else {
            // Selected item has no recipe; nothing to resolve.
            continue;
        };
        for material in materials {
            *totals.entry(material.id).or_default() += material.count * slot.quantity;
        }
    }

    // Pass 2: expand each merged top-level row through its own recipe.
    totals
        .into_iter()
        .map(|(id, count)| {
            let mut path = vec![id];
            MaterialRow {
                id,
                count,
                children: expand(id, count, recipes, &mut path),
            }
        })
        .collect()
}

/// Children of `id`'s recipe, each scaled by the absolute `multiplier`
/// quantity already required of `id`.
fn expand(
    id: ItemId,
    multiplier: i64,
    recipes: &RecipeCatalog,
    path: &mut Vec<ItemId>,
) -> Vec<MaterialRow> {
    let Some(materials) = recipes.lookup(id) else {
        return Vec::new();
    };
    if path.len() >= MAX_DEPTH {
        eprintln!("warning: recipe nesting exceeds {MAX_DEPTH} at item {id}; treating as a leaf");
        return Vec::new();
    }

    let mut children: Vec<MaterialRow> = materials
        .iter()
        .map(|material| {
            let count = material.count * multiplier;
            let mut grandchildren = Vec::new();
            if path.contains(&material.id) {
                // Cycle in the recipe data; stop here rather than recurse.
                eprintln!(
                    "warning: cyclic recipe detected at item {}; treating as a leaf",
                    material.id
                );
            } else {
                path.push(material.id);
                grandchildren = expand(material.id, count, recipes, path);
                path.pop();
            }
            MaterialRow {
                id: material.id,
                count,
                children: grandchildren,
            }
        })
        .collect();
    children.sort_by_key(|row| row.id);
    children
}
