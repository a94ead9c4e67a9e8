use std::path::PathBuf;

use clap::Parser;
use routeledger::{Endpoint, Route, RouteId, Store};
use tracing::instrument;

use super::terminal::{self, Colorize};

#[derive(Debug, Parser)]
#[command(about = "Display detailed information about a route")]
pub struct Show {
    /// The identifier of the route to display
    id: RouteId,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

impl Show {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let store = Store::open(root)?;
        super::warn_skipped(&store);

        let Some(route) = store.find_by_id(self.id) else {
            anyhow::bail!("Route {} not found", self.id);
        };

        print_route(route, self.output)
    }
}

/// Prints one route in the requested format.
pub fn print_route(route: &Route, output: OutputFormat) -> anyhow::Result<()> {
    match output {
        OutputFormat::Pretty => output_pretty(route),
        OutputFormat::Json => output_json(route)?,
    }
    Ok(())
}

fn output_pretty(route: &Route) {
    let data = &route.data;

    println!("# {} {}", route.id, data.name);
    println!();

    println!("{}", "Route".dim());
    print_endpoint("From", &data.origin);
    print_endpoint("To", &data.destination);
    println!("  Distance:   {:.2} km", data.distance_km);

    println!("\n{}", "Load".dim());
    println!("  Capacity:   {}", data.capacity);
    println!("  Current:    {}", data.current_load);
    if data.capacity > 0.0 {
        println!(
            "  Ratio:      {:.0}%",
            data.current_load / data.capacity * 100.0
        );
    }
    println!(
        "  Efficiency: {}",
        terminal::efficiency(route.efficiency_class(), 0)
    );
}

fn print_endpoint(heading: &str, endpoint: &Endpoint) {
    let padding = " ".repeat(11 - heading.len());
    match endpoint.coordinates {
        Some(position) => println!("  {heading}:{padding}{} ({position})", endpoint.label),
        None => println!("  {heading}:{padding}{}", endpoint.label),
    }
}

fn output_json(route: &Route) -> anyhow::Result<()> {
    use serde_json::json;

    let output = json!({
        "route": route,
        "efficiency": route.efficiency_class(),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
