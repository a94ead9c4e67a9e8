use std::path::{Path, PathBuf};

use clap::Parser;
use routeledger::{Config, Store, domain::MalformedRows};
use tracing::instrument;

#[derive(Debug, Parser)]
#[command(about = "Initialize a new route ledger")]
pub struct Init {
    /// CSV file to keep routes in, relative to the ledger root
    #[arg(long, value_name = "PATH")]
    data_file: Option<PathBuf>,

    /// How malformed rows in the data file are handled on load
    #[arg(long, value_enum, default_value_t)]
    malformed_rows: MalformedRows,

    /// Seed the ledger with three example routes
    #[arg(long)]
    samples: bool,
}

impl Init {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        use std::fs;

        let config_dir = root.join(Config::DIR);
        if config_dir.exists() {
            anyhow::bail!(
                "Ledger already initialized (found existing {} directory)",
                Config::DIR
            );
        }

        fs::create_dir_all(&config_dir)
            .map_err(|e| anyhow::anyhow!("Failed to create {} directory: {e}", Config::DIR))?;

        let mut config = Config::default();
        if let Some(data_file) = self.data_file {
            config.set_data_file(data_file);
        }
        config.malformed_rows = self.malformed_rows;
        config
            .save(&Config::path_in(root))
            .map_err(|e| anyhow::anyhow!("Failed to create config.toml: {e}"))?;

        println!("Initialized route ledger in {}", root.display());
        println!("  Created: {}/config.toml", Config::DIR);

        if self.samples {
            let mut store = Store::open(root.to_path_buf())?;
            let added = store.seed_samples()?;
            store.flush()?;
            println!(
                "  Created: {} with {} example routes",
                config.data_file().display(),
                added.len()
            );
        }

        println!();
        println!("Next steps:");
        println!(
            "  routes add --name \"North loop\" --from \"Depot\" --to \"Harbour\" --distance 12.5 \
             --capacity 100 --load 40"
        );

        Ok(())
    }
}
