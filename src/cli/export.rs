use std::path::PathBuf;

use clap::Parser;
use routeledger::Store;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Write all routes to a CSV report")]
pub struct Export {
    /// Where to write the report
    path: PathBuf,
}

impl Export {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let store = Store::open(root)?;
        super::warn_skipped(&store);

        store.export(&self.path)?;

        println!(
            "{}",
            format!(
                "Exported {} routes to {}",
                store.tree().len(),
                self.path.display()
            )
            .success()
        );
        Ok(())
    }
}
