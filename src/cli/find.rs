use std::path::PathBuf;

use clap::Parser;
use routeledger::Store;
use tracing::instrument;

use super::show::{OutputFormat, print_route};

#[derive(Debug, Parser)]
#[command(about = "Look up a route by name (case-insensitive)")]
pub struct Find {
    /// The name of the route
    name: String,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

impl Find {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let store = Store::open(root)?;
        super::warn_skipped(&store);

        let Some(route) = store.find_by_name(&self.name) else {
            anyhow::bail!("No route named '{}'", self.name.trim());
        };

        print_route(route, self.output)
    }
}
