//! Cost aggregation and text rendering
//!
//! Buckets resolved top-level rows into material categories, prices
//! the remaining quantity of each, and renders the materials tree and
//! cost table for the terminal.

use std::fmt;

use crate::catalog::ItemCatalog;
use crate::ledger::{remaining, OwnershipLedger, PriceLedger};
use crate::models::{Category, CategorySums, MaterialRow};

/// Sum remaining acquisition cost per category over the top-level rows
pub fn summarize(
    rows: &[MaterialRow],
    items: &ItemCatalog,
    prices: &PriceLedger,
    ownership: &OwnershipLedger,
) -> CategorySums {
    let mut sums = CategorySums::default();
    for row in rows {
        let category = category_of(row, items);
        let cost = remaining(row, ownership) as f64 * prices.unit_price(row.id);
        sums.add(category, cost);
    }
    sums
}

fn category_of(row: &MaterialRow, items: &ItemCatalog) -> Category {
    match items.lookup(row.id) {
        Some(item) => Category::from_subtype(&item.subtype),
        None => Category::Equipment,
    }
}

/// Format the resolved forest as an indented tree
pub fn format_tree(rows: &[MaterialRow], items: &ItemCatalog, indent: usize) -> String {
    let mut output = String::new();
    let prefix = "  ".repeat(indent);
    for row in rows {
        output.push_str(&format!("{}{} x{}\n", prefix, items.name(row.id), row.count));
        output.push_str(&format_tree(&row.children, items, indent + 1));
    }
    output
}

/// Cost report over the resolved rows, rendered via Display
#[derive(Debug)]
pub struct CostReport {
    lines: Vec<ReportLine>,
    sums: CategorySums,
}

#[derive(Debug)]
struct ReportLine {
    name: String,
    category: Category,
    required: i64,
    owned: i64,
    remaining: i64,
    unit_price: Option<f64>,
    cost: f64,
}

impl CostReport {
    pub fn build(
        rows: &[MaterialRow],
        items: &ItemCatalog,
        prices: &PriceLedger,
        ownership: &OwnershipLedger,
    ) -> Self {
        let lines = rows
            .iter()
            .map(|row| {
                let left = remaining(row, ownership);
                let unit_price = prices.price(row.id);
                ReportLine {
                    name: items.name(row.id),
                    category: category_of(row, items),
                    required: row.count,
                    owned: row.count - left,
                    remaining: left,
                    unit_price,
                    cost: left as f64 * unit_price.unwrap_or(0.0),
                }
            })
            .collect();
        Self {
            lines,
            sums: summarize(rows, items, prices, ownership),
        }
    }

    pub fn sums(&self) -> &CategorySums {
        &self.sums
    }
}

impl fmt::Display for CostReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<28} {:>10} {:>8} {:>10} {:>10} {:>12}",
            "Material", "Required", "Owned", "Remaining", "Unit", "Cost"
        )?;
        writeln!(f, "{}", "-".repeat(82))?;
        for category in [
            Category::GatherResource,
            Category::CraftResource,
            Category::Equipment,
        ] {
            for line in self.lines.iter().filter(|l| l.category == category) {
                let unit = match line.unit_price {
                    Some(p) => format!("{p:.2}"),
                    None => "-".to_string(),
                };
                writeln!(
                    f,
                    "{:<28} {:>10} {:>8} {:>10} {:>10} {:>12.2}",
                    line.name, line.required, line.owned, line.remaining, unit, line.cost
                )?;
            }
        }
        writeln!(f)?;
        writeln!(f, "Totals:")?;
        for category in [
            Category::GatherResource,
            Category::CraftResource,
            Category::Equipment,
        ] {
            writeln!(f, "  {:<18} {:>12.2}", category.label(), self.sums.get(category))?;
        }
        writeln!(f, "  {:<18} {:>12.2}", "Grand total", self.sums.total())?;
        Ok(())
    }
}
