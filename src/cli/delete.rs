use std::path::PathBuf;

use clap::Parser;
use routeledger::{RouteId, Store};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Delete a route")]
pub struct Delete {
    /// The identifier of the route to delete
    id: RouteId,

    /// Skip confirmation prompts
    #[arg(long, short)]
    yes: bool,
}

impl Delete {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut store = Store::open(root)?;
        super::warn_skipped(&store);

        let Some(route) = store.find_by_id(self.id) else {
            anyhow::bail!("Route {} not found", self.id);
        };

        if !self.yes {
            let proceed = dialoguer::Confirm::new()
                .with_prompt(format!("Delete route {} ({})?", route.id, route.data.name))
                .default(false)
                .interact()?;
            if !proceed {
                println!("Cancelled");
                std::process::exit(130);
            }
        }

        let removed = store.delete(self.id)?;
        store.flush()?;

        println!(
            "{}",
            format!("Deleted route {} ({})", removed.id, removed.data.name).success()
        );
        Ok(())
    }
}
