//! Catalog ingestion from game data exports
//!
//! Walks a directory of JSON catalog files and loads items and
//! recipes into the database. A file may carry items, recipes, or
//! both; files that fail to read or parse are reported and counted,
//! never fatal to the rest of the import.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use rusqlite::Connection;
use serde::Deserialize;
use thiserror::Error;
use walkdir::WalkDir;

use crate::db;
use crate::models::{Item, ItemId, RecipeMaterial};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid catalog file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub items: Vec<ItemDef>,
    #[serde(default)]
    pub recipes: Vec<RecipeDef>,
}

#[derive(Debug, Deserialize)]
pub struct ItemDef {
    pub id: ItemId,
    pub name: String,
    pub subtype: String,
    #[serde(default)]
    pub grade: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecipeDef {
    pub item_id: ItemId,
    pub materials: Vec<RecipeMaterial>,
}

pub fn parse_catalog(text: &str) -> Result<CatalogFile, serde_json::Error> {
    serde_json::from_str(text)
}

fn read_catalog_file(path: &Path) -> Result<CatalogFile, ImportError> {
    let text = fs::read_to_string(path).map_err(|source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_catalog(&text).map_err(|source| ImportError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load one parsed catalog file into the database
pub fn ingest(conn: &Connection, catalog: &CatalogFile, stats: &mut ImportStats) -> Result<()> {
    for def in &catalog.items {
        let item = Item {
            id: def.id,
            name: def.name.clone(),
            subtype: def.subtype.clone(),
            grade: def.grade.clone(),
        };
        db::upsert_item(conn, &item)?;
        stats.items += 1;
    }

    for recipe in &catalog.recipes {
        // A self-referential recipe would poison every downstream
        // resolution; drop it at the door.
        if recipe.materials.iter().any(|m| m.id == recipe.item_id) {
            eprintln!(
                "warning: recipe for item {} lists itself as a material; skipping",
                recipe.item_id
            );
            stats.skipped += 1;
            continue;
        }
        db::replace_recipe(conn, recipe.item_id, &recipe.materials)?;
        stats.recipes += 1;
        stats.materials += recipe.materials.len();
    }
    Ok(())
}

/// Import every `*.json` file under `data_dir` into the database
pub fn import_directory(conn: &Connection, data_dir: &Path) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    println!("Scanning {} for catalog files...", data_dir.display());
    for entry in WalkDir::new(data_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.extension().is_some_and(|ext| ext == "json") {
            continue;
        }

        match read_catalog_file(path) {
            Ok(catalog) => {
                ingest(conn, &catalog, &mut stats)?;
                stats.files += 1;
            }
            Err(e) => {
                eprintln!("  {e}");
                stats.errors += 1;
            }
        }
    }

    Ok(stats)
}

#[derive(Debug, Default)]
pub struct ImportStats {
    pub files: usize,
    pub items: usize,
    pub recipes: usize,
    pub materials: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl fmt::Display for ImportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Imported {} items and {} recipes ({} materials) from {} files. Skipped: {}, Errors: {}",
            self.items, self.recipes, self.materials, self.files, self.skipped, self.errors
        )
    }
}
