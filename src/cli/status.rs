use std::{collections::BTreeMap, path::PathBuf};

use clap::Parser;
use routeledger::{Efficiency, Store};
use tracing::instrument;

use super::terminal::{self, Colorize};

#[derive(Debug, Parser, Default)]
#[command(about = "Show route counts per efficiency class")]
pub struct Status {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Suppress headers and format for scripting
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Status {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let store = Store::open(root)?;

        let mut counts: BTreeMap<Efficiency, usize> = BTreeMap::new();
        let mut total_distance = 0.0;
        for route in store.routes() {
            *counts.entry(route.efficiency_class()).or_insert(0) += 1;
            total_distance += route.data.distance_km;
        }
        let total = store.tree().len();
        let skipped = store.load_report().skipped.len();

        if total == 0 && skipped == 0 {
            println!("No routes found yet. Add one with 'routes add'.");
            return Ok(());
        }

        match self.output {
            OutputFormat::Json => Self::output_json(&counts, total, total_distance, skipped)?,
            OutputFormat::Table if self.quiet => println!("{total}"),
            OutputFormat::Table => {
                Self::output_table(&counts, total, total_distance, skipped);
            }
        }

        Ok(())
    }

    fn output_json(
        counts: &BTreeMap<Efficiency, usize>,
        total: usize,
        total_distance: f64,
        skipped: usize,
    ) -> anyhow::Result<()> {
        use serde_json::json;

        let classes: Vec<_> = counts
            .iter()
            .map(|(class, count)| json!({ "efficiency": class, "count": count }))
            .collect();

        let output = json!({
            "total": total,
            "total_distance_km": total_distance,
            "efficiency": classes,
            "skipped_rows": skipped,
        });

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn output_table(
        counts: &BTreeMap<Efficiency, usize>,
        total: usize,
        total_distance: f64,
        skipped: usize,
    ) {
        println!("{}", format!("{:<12} {:>6}", "Efficiency", "Routes").dim());
        for (class, count) in counts {
            println!("{} {count:>6}", terminal::efficiency(*class, 12));
        }
        println!("{}", "─".repeat(19).dim());
        println!("{:<12} {total:>6}", "Total");
        println!("\nTotal distance: {total_distance:.2} km");

        if skipped > 0 {
            println!(
                "{}",
                format!("⚠️  {skipped} malformed row(s) were skipped while loading").warning()
            );
        }
    }
}
