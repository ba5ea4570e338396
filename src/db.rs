//! Database schema and operations
//!
//! The item and recipe catalogs live in SQLite alongside the three
//! pieces of player state that must outlive a single run: the price
//! ledger, the owned-count ledger, and the current slot selection.

use std::collections::HashMap;

use anyhow::Result;
use rusqlite::Connection;

use crate::models::{Item, ItemId, RecipeMaterial, SelectionSlot};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Item display metadata
        CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            subtype TEXT NOT NULL,
            grade TEXT
        );

        -- Recipe materials (what crafting one unit of item_id consumes)
        CREATE TABLE IF NOT EXISTS recipe_materials (
            item_id INTEGER NOT NULL,
            material_id INTEGER NOT NULL,
            count INTEGER NOT NULL,
            ord INTEGER NOT NULL,
            PRIMARY KEY (item_id, material_id)
        );

        -- Player state: unit prices, price text kept verbatim
        CREATE TABLE IF NOT EXISTS prices (
            item_id INTEGER PRIMARY KEY,
            price TEXT NOT NULL
        );

        -- Player state: owned material counts
        CREATE TABLE IF NOT EXISTS owned (
            item_id INTEGER PRIMARY KEY,
            count TEXT NOT NULL
        );

        -- Player state: equipment slot selection
        CREATE TABLE IF NOT EXISTS selection (
            slot TEXT PRIMARY KEY,
            item_id INTEGER,
            quantity INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_recipe_materials_material
            ON recipe_materials(material_id);
        "#,
    )?;
    Ok(())
}

/// Insert or replace an item
pub fn upsert_item(conn: &Connection, item: &Item) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO items (id, name, subtype, grade)
         VALUES (?1, ?2, ?3, ?4)",
        (item.id, &item.name, &item.subtype, &item.grade),
    )?;
    Ok(())
}

/// Replace the recipe of `item_id` with the given material list
pub fn replace_recipe(conn: &Connection, item_id: ItemId, materials: &[RecipeMaterial]) -> Result<()> {
    conn.execute("DELETE FROM recipe_materials WHERE item_id = ?1", [item_id])?;
    for (ord, m) in materials.iter().enumerate() {
        conn.execute(
            "INSERT INTO recipe_materials (item_id, material_id, count, ord)
             VALUES (?1, ?2, ?3, ?4)",
            (item_id, m.id, m.count, ord as i64),
        )?;
    }
    Ok(())
}

/// Clear all catalog data (for re-import); player state is kept
pub fn clear_catalog(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM recipe_materials;
        DELETE FROM items;
        "#,
    )?;
    Ok(())
}

/// List all items, ordered by id
pub fn list_items(conn: &Connection) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare("SELECT id, name, subtype, grade FROM items ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(Item {
            id: row.get(0)?,
            name: row.get(1)?,
            subtype: row.get(2)?,
            grade: row.get(3)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Recipes that consume `material_id`, with the per-unit quantity
pub fn recipes_using(conn: &Connection, material_id: ItemId) -> Result<Vec<(ItemId, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT item_id, count FROM recipe_materials
         WHERE material_id = ?1 ORDER BY item_id",
    )?;
    let rows = stmt.query_map([material_id], |row| Ok((row.get(0)?, row.get(1)?)))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

pub fn load_prices(conn: &Connection) -> Result<HashMap<ItemId, String>> {
    let mut stmt = conn.prepare("SELECT item_id, price FROM prices")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

    let mut prices = HashMap::new();
    for row in rows {
        let (id, price): (ItemId, String) = row?;
        prices.insert(id, price);
    }
    Ok(prices)
}

/// Persist the whole price ledger, replacing previous contents.
/// Propagation can touch many rows at once, so a full rewrite in one
/// transaction is simpler than tracking dirty entries.
pub fn save_prices<'a>(
    conn: &mut Connection,
    prices: impl Iterator<Item = (ItemId, &'a str)>,
) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM prices", [])?;
    for (id, price) in prices {
        tx.execute(
            "INSERT INTO prices (item_id, price) VALUES (?1, ?2)",
            (id, price),
        )?;
    }
    tx.commit()?;
    Ok(())
}

pub fn load_owned(conn: &Connection) -> Result<HashMap<ItemId, String>> {
    let mut stmt = conn.prepare("SELECT item_id, count FROM owned")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

    let mut owned = HashMap::new();
    for row in rows {
        let (id, count): (ItemId, String) = row?;
        owned.insert(id, count);
    }
    Ok(owned)
}

pub fn set_owned(conn: &Connection, item_id: ItemId, count: &str) -> Result<()> {
    if count.trim().is_empty() {
        conn.execute("DELETE FROM owned WHERE item_id = ?1", [item_id])?;
    } else {
        conn.execute(
            "INSERT OR REPLACE INTO owned (item_id, count) VALUES (?1, ?2)",
            (item_id, count),
        )?;
    }
    Ok(())
}

pub fn set_slot(conn: &Connection, slot: &str, item_id: ItemId, quantity: i64) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO selection (slot, item_id, quantity) VALUES (?1, ?2, ?3)",
        (slot, item_id, quantity),
    )?;
    Ok(())
}

pub fn clear_slot(conn: &Connection, slot: &str) -> Result<()> {
    conn.execute("DELETE FROM selection WHERE slot = ?1", [slot])?;
    Ok(())
}

/// Load the current selection snapshot, ordered by slot name
pub fn load_selection(conn: &Connection) -> Result<Vec<SelectionSlot>> {
    let mut stmt = conn.prepare("SELECT slot, item_id, quantity FROM selection ORDER BY slot")?;
    let rows = stmt.query_map([], |row| {
        Ok(SelectionSlot {
            slot: row.get(0)?,
            item_id: row.get(1)?,
            quantity: row.get(2)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn selection_round_trips() {
        let conn = test_conn();
        set_slot(&conn, "main_hand", 301, 2).unwrap();
        set_slot(&conn, "chest", 302, 1).unwrap();
        set_slot(&conn, "main_hand", 301, 3).unwrap();

        let selection = load_selection(&conn).unwrap();
        assert_eq!(selection.len(), 2);
        assert_eq!(selection[0].slot, "chest");
        assert_eq!(selection[1].slot, "main_hand");
        assert_eq!(selection[1].quantity, 3);

        clear_slot(&conn, "chest").unwrap();
        assert_eq!(load_selection(&conn).unwrap().len(), 1);
    }

    #[test]
    fn prices_round_trip() {
        let mut conn = test_conn();
        let ledger = vec![(101, "12.5"), (201, "26")];
        save_prices(&mut conn, ledger.into_iter()).unwrap();

        let loaded = load_prices(&conn).unwrap();
        assert_eq!(loaded.get(&101).map(String::as_str), Some("12.5"));
        assert_eq!(loaded.get(&201).map(String::as_str), Some("26"));

        // full rewrite drops entries not in the new ledger
        save_prices(&mut conn, vec![(101, "13")].into_iter()).unwrap();
        let loaded = load_prices(&conn).unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn owned_blank_deletes_row() {
        let conn = test_conn();
        set_owned(&conn, 101, "40").unwrap();
        assert_eq!(load_owned(&conn).unwrap().len(), 1);
        set_owned(&conn, 101, "  ").unwrap();
        assert!(load_owned(&conn).unwrap().is_empty());
    }

    #[test]
    fn recipe_replacement_and_reverse_lookup() {
        let conn = test_conn();
        replace_recipe(
            &conn,
            201,
            &[
                RecipeMaterial { id: 101, count: 2 },
                RecipeMaterial { id: 102, count: 1 },
            ],
        )
        .unwrap();
        replace_recipe(&conn, 301, &[RecipeMaterial { id: 201, count: 4 }]).unwrap();

        assert_eq!(recipes_using(&conn, 101).unwrap(), vec![(201, 2)]);
        assert_eq!(recipes_using(&conn, 201).unwrap(), vec![(301, 4)]);

        // replacing drops stale materials
        replace_recipe(&conn, 201, &[RecipeMaterial { id: 102, count: 3 }]).unwrap();
        assert!(recipes_using(&conn, 101).unwrap().is_empty());
    }
}
