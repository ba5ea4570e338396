//! Crafting cost calculator
//!
//! Resolves selected equipment into a bill of materials, tracks unit
//! prices and owned counts, derives craftable intermediates' prices
//! from their ingredients, and reports remaining acquisition cost.

mod catalog;
mod db;
mod import;
mod ledger;
mod models;
mod resolver;
mod summary;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::catalog::{ItemCatalog, RecipeCatalog};
use crate::ledger::{OwnershipLedger, PriceLedger};
use crate::models::{Category, Item, ItemId, RecipeMaterial};
use crate::summary::CostReport;

#[derive(Parser)]
#[command(name = "craft-ledger")]
#[command(about = "Crafting bill-of-materials and cost calculator")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, default_value = "craft_ledger.db")]
    database: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import item and recipe catalogs from a directory of JSON files
    Import {
        /// Path to the game data directory
        data_dir: PathBuf,

        /// Clear existing catalog data before importing
        #[arg(long)]
        clear: bool,
    },

    /// Set or update an equipment slot of the selection
    Select {
        /// Slot name (e.g. "main_hand", "chest")
        slot: String,

        /// Item to craft in this slot
        item_id: ItemId,

        /// How many to craft
        #[arg(default_value = "1")]
        quantity: i64,
    },

    /// Remove a slot from the selection
    Unselect {
        /// Slot name
        slot: String,
    },

    /// Show the current selection
    Selection,

    /// Resolve the selection into materials and show the cost report
    Calc {
        /// Show the full nested materials tree
        #[arg(short, long)]
        verbose: bool,
    },

    /// Set a unit price for a material (empty string clears it)
    Price {
        /// Material item id
        item_id: ItemId,

        /// Unit price
        price: String,
    },

    /// Record how many of a material you already own
    Own {
        /// Material item id
        item_id: ItemId,

        /// Owned count (empty string clears it)
        count: String,
    },

    /// Show the cost summary for the current selection
    Summary,

    /// List all items in the database
    ListItems {
        /// Only items that have a recipe
        #[arg(long)]
        craftable: bool,
    },

    /// Show details for a specific item
    Item {
        /// Item id
        id: ItemId,
    },

    /// Initialize empty database with schema
    Init,

    /// Load sample data for testing (without game data exports)
    LoadSample,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut conn = Connection::open(&cli.database)?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Import { data_dir, clear } => {
            if clear {
                println!("Clearing existing catalog data...");
                db::clear_catalog(&conn)?;
            }

            let stats = import::import_directory(&conn, &data_dir)?;
            println!("\n{}", stats);

            // The persisted price ledger meets the fresh recipe set:
            // re-derive every craftable intermediate's price.
            let recipes = RecipeCatalog::load(&conn)?;
            let mut prices = PriceLedger::from_map(db::load_prices(&conn)?);
            prices.propagate_all(&recipes);
            db::save_prices(&mut conn, prices.iter())?;
        }

        Commands::Select {
            slot,
            item_id,
            quantity,
        } => {
            db::set_slot(&conn, &slot, item_id, quantity)?;
            let items = ItemCatalog::load(&conn)?;
            println!("{}: {} x{}", slot, items.name(item_id), quantity);
        }

        Commands::Unselect { slot } => {
            db::clear_slot(&conn, &slot)?;
            println!("Cleared slot '{}'", slot);
        }

        Commands::Selection => {
            let selection = db::load_selection(&conn)?;
            if selection.is_empty() {
                println!("Nothing selected. Use 'select' to add equipment.");
            } else {
                let items = ItemCatalog::load(&conn)?;
                for slot in selection {
                    match slot.item_id {
                        Some(id) => {
                            println!("{:<16} {} x{}", slot.slot, items.name(id), slot.quantity)
                        }
                        None => println!("{:<16} (empty)", slot.slot),
                    }
                }
            }
        }

        Commands::Calc { verbose } => {
            let (rows, items, prices, ownership) = resolve_current(&conn)?;
            if rows.is_empty() {
                println!("Nothing to resolve. Use 'select' to add equipment.");
            } else {
                if verbose {
                    println!("Materials tree:\n");
                    print!("{}", summary::format_tree(&rows, &items, 0));
                    println!();
                }
                print!("{}", CostReport::build(&rows, &items, &prices, &ownership));
            }
        }

        Commands::Price { item_id, price } => {
            let recipes = RecipeCatalog::load(&conn)?;
            let mut prices = PriceLedger::from_map(db::load_prices(&conn)?);
            prices.set_price(&recipes, item_id, &price);
            db::save_prices(&mut conn, prices.iter())?;

            let items = ItemCatalog::load(&conn)?;
            match prices.price(item_id) {
                Some(p) => println!("{}: {:.2}", items.name(item_id), p),
                None => println!("{}: price cleared", items.name(item_id)),
            }
        }

        Commands::Own { item_id, count } => {
            db::set_owned(&conn, item_id, &count)?;
            let items = ItemCatalog::load(&conn)?;
            println!(
                "{}: owned {}",
                items.name(item_id),
                ledger::parse_count(&count)
            );
        }

        Commands::Summary => {
            let (rows, items, prices, ownership) = resolve_current(&conn)?;
            if rows.is_empty() {
                println!("Nothing to resolve. Use 'select' to add equipment.");
            } else {
                print!("{}", CostReport::build(&rows, &items, &prices, &ownership));
            }
        }

        Commands::ListItems { craftable } => {
            let items = db::list_items(&conn)?;
            if items.is_empty() {
                println!("No items in database. Run 'import' or 'load-sample' first.");
            } else {
                let recipes = RecipeCatalog::load(&conn)?;
                println!("{:<8} {:<28} {:<16} {:<10}", "Id", "Name", "Subtype", "Grade");
                println!("{}", "-".repeat(64));
                for item in items {
                    if craftable && recipes.lookup(item.id).is_none() {
                        continue;
                    }
                    println!(
                        "{:<8} {:<28} {:<16} {:<10}",
                        item.id,
                        item.name,
                        item.subtype,
                        item.grade.as_deref().unwrap_or("-")
                    );
                }
            }
        }

        Commands::Item { id } => {
            let items = ItemCatalog::load(&conn)?;
            let Some(item) = items.lookup(id) else {
                println!("Item {} not found", id);
                return Ok(());
            };
            println!("Item: {}", item.name);
            println!("  Id: {}", item.id);
            println!(
                "  Category: {}",
                Category::from_subtype(&item.subtype).label()
            );
            if let Some(grade) = &item.grade {
                println!("  Grade: {}", grade);
            }

            let recipes = RecipeCatalog::load(&conn)?;
            if let Some(materials) = recipes.lookup(id) {
                println!("  Materials per unit:");
                for m in materials {
                    println!("    {} x{}", items.name(m.id), m.count);
                }
            } else {
                println!("  No recipe (raw material)");
            }

            let used_by = db::recipes_using(&conn, id)?;
            if !used_by.is_empty() {
                println!("  Used by:");
                for (item_id, count) in used_by {
                    println!("    {} (x{} per unit)", items.name(item_id), count);
                }
            }
        }

        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            load_sample_data(&conn)?;

            // Same as after an import: the persisted ledger meets a
            // fresh recipe set.
            let recipes = RecipeCatalog::load(&conn)?;
            let mut prices = PriceLedger::from_map(db::load_prices(&conn)?);
            prices.propagate_all(&recipes);
            db::save_prices(&mut conn, prices.iter())?;

            println!("Sample data loaded successfully!");
        }
    }

    Ok(())
}

type ResolvedState = (
    Vec<models::MaterialRow>,
    ItemCatalog,
    PriceLedger,
    OwnershipLedger,
);

/// Load everything the resolve/summary commands need and resolve the
/// persisted selection.
fn resolve_current(conn: &Connection) -> Result<ResolvedState> {
    let recipes = RecipeCatalog::load(conn)?;
    let items = ItemCatalog::load(conn)?;
    let prices = PriceLedger::from_map(db::load_prices(conn)?);
    let ownership = OwnershipLedger::from_map(db::load_owned(conn)?);
    let selection = db::load_selection(conn)?;
    let rows = resolver::resolve(&selection, &recipes);
    Ok((rows, items, prices, ownership))
}

/// Load a small crafting catalog for trying the tool without game data
fn load_sample_data(conn: &Connection) -> Result<()> {
    db::clear_catalog(conn)?;

    let items = [
        (101, "Iron Ore", "GatherResource", None),
        (102, "Coal", "GatherResource", None),
        (103, "Rough Leather", "GatherResource", None),
        (104, "Magic Essence", "GatherResource", Some("rare")),
        (201, "Iron Ingot", "CraftResource", None),
        (202, "Steel Plate", "CraftResource", Some("uncommon")),
        (203, "Leather Strap", "CraftResource", None),
        (301, "Iron Sword", "Weapon", Some("uncommon")),
        (302, "Steel Cuirass", "Armor", Some("rare")),
    ];
    for (id, name, subtype, grade) in items {
        db::upsert_item(
            conn,
            &Item {
                id,
                name: name.to_string(),
                subtype: subtype.to_string(),
                grade: grade.map(str::to_string),
            },
        )?;
    }

    let recipes: [(ItemId, &[(ItemId, i64)]); 5] = [
        (201, &[(101, 2), (102, 1)]),
        (202, &[(201, 3), (102, 2)]),
        (203, &[(103, 2)]),
        (301, &[(201, 4), (203, 1)]),
        (302, &[(202, 5), (203, 2), (104, 1)]),
    ];
    for (item_id, materials) in recipes {
        let materials: Vec<RecipeMaterial> = materials
            .iter()
            .map(|&(id, count)| RecipeMaterial { id, count })
            .collect();
        db::replace_recipe(conn, item_id, &materials)?;
    }

    println!("Loaded {} sample items", items.len());
    Ok(())
}
