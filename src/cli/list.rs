use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use regex::{Regex, RegexBuilder};
use routeledger::{Efficiency, Route, Store};
use serde::Serialize;
use tracing::instrument;

use super::terminal;

/// Command arguments for `routes list`.
#[derive(Debug, Parser)]
#[command(about = "List routes in identifier order")]
pub struct List {
    /// Output format (default: table).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,

    /// Suppress headers and format rows for scripting.
    #[arg(long)]
    quiet: bool,

    /// Show only routes of these efficiency classes (comma-separated).
    #[arg(long, value_delimiter = ',', value_name = "CLASS")]
    efficiency: Vec<EfficiencyFilter>,

    /// Case-insensitive regular expression matched against name, origin and
    /// destination.
    #[arg(long, value_name = "REGEX")]
    matching: Option<String>,

    /// Limit number of rows returned.
    #[arg(long)]
    limit: Option<usize>,

    /// Skip the first N rows.
    #[arg(long)]
    offset: Option<usize>,
}

/// Supported output formats.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Efficiency classes accepted by `--efficiency`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum EfficiencyFilter {
    Unknown,
    Low,
    Medium,
    High,
}

impl From<EfficiencyFilter> for Efficiency {
    fn from(filter: EfficiencyFilter) -> Self {
        match filter {
            EfficiencyFilter::Unknown => Self::Unknown,
            EfficiencyFilter::Low => Self::Low,
            EfficiencyFilter::Medium => Self::Medium,
            EfficiencyFilter::High => Self::High,
        }
    }
}

struct Filters {
    classes: Vec<Efficiency>,
    regex: Option<Regex>,
}

#[derive(Serialize)]
struct SerializableRow<'a> {
    #[serde(flatten)]
    route: &'a Route,
    efficiency: Efficiency,
}

impl List {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let filters = Filters::new(&self)?;
        let store = Store::open(root)?;
        super::warn_skipped(&store);

        let rows: Vec<&Route> = store
            .routes()
            .filter(|route| filters.matches(route))
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect();

        match self.output {
            OutputFormat::Table => {
                render_table(&rows, self.quiet);
                Ok(())
            }
            OutputFormat::Json => render_json(&rows),
        }
    }
}

impl Filters {
    fn new(cmd: &List) -> anyhow::Result<Self> {
        let regex = if let Some(pattern) = &cmd.matching {
            Some(
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .with_context(|| format!("invalid regex: {pattern}"))?,
            )
        } else {
            None
        };

        Ok(Self {
            classes: cmd.efficiency.iter().copied().map(Efficiency::from).collect(),
            regex,
        })
    }

    fn matches(&self, route: &Route) -> bool {
        if !self.classes.is_empty() && !self.classes.contains(&route.efficiency_class()) {
            return false;
        }

        if let Some(regex) = &self.regex {
            let data = &route.data;
            if !(regex.is_match(data.name.as_str())
                || regex.is_match(&data.origin.label)
                || regex.is_match(&data.destination.label))
            {
                return false;
            }
        }

        true
    }
}

fn render_table(rows: &[&Route], quiet: bool) {
    if quiet {
        for route in rows {
            println!("{}\t{}", route.id, route.data.name);
        }
        return;
    }

    if rows.is_empty() {
        println!("No routes found.");
        return;
    }

    // Origin and destination are dropped on narrow terminals.
    let wide = !terminal::is_narrow();

    let mut headers = vec!["ID", "Name"];
    if wide {
        headers.extend(["From", "To"]);
    }
    headers.extend(["Distance", "Load", "Efficiency"]);

    let data: Vec<Vec<String>> = rows
        .iter()
        .map(|route| {
            let data = &route.data;
            let mut row = vec![route.id.to_string(), data.name.to_string()];
            if wide {
                row.push(data.origin.label.clone());
                row.push(data.destination.label.clone());
            }
            row.push(format!("{:.2} km", data.distance_km));
            row.push(format!("{}/{}", data.current_load, data.capacity));
            row
        })
        .collect();

    // Determine column widths for alignment. The efficiency column is
    // colored, so it is padded separately.
    let widths = headers[..headers.len() - 1]
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            data.iter()
                .map(|row| row[idx].chars().count())
                .max()
                .unwrap_or(0)
                .max(header.len())
        })
        .collect::<Vec<_>>();

    for (header, &width) in headers.iter().zip(&widths) {
        print!("{header:<width$}  ");
    }
    println!("Efficiency");

    for &width in &widths {
        print!("{:-<width$}  ", "");
    }
    println!("{:-<10}", "");

    for (route, row) in rows.iter().zip(data) {
        for (value, &width) in row.iter().zip(&widths) {
            print!("{value:<width$}  ");
        }
        println!("{}", terminal::efficiency(route.efficiency_class(), 0));
    }
}

fn render_json(rows: &[&Route]) -> anyhow::Result<()> {
    let rows: Vec<SerializableRow<'_>> = rows
        .iter()
        .map(|route| SerializableRow {
            route,
            efficiency: route.efficiency_class(),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}
