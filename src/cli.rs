use std::path::PathBuf;

mod add;
mod delete;
mod export;
mod find;
mod init;
mod list;
mod show;
mod status;
mod terminal;
mod update;

use add::Add;
use clap::ArgAction;
use delete::Delete;
use export::Export;
use find::Find;
use init::Init;
use list::List;
use routeledger::{Coordinates, domain::geo};
use show::Show;
use status::Status;
use update::Update;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global=true)]
    verbose: u8,

    /// The path to the root of the route ledger
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::Status(Status::default()))
            .run(self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Show route counts per efficiency class (default)
    Status(Status),

    /// Initialize a new route ledger
    Init(Init),

    /// Add a new route
    Add(Add),

    /// Change the attributes of a route
    ///
    /// Options that are not given keep their current value.
    Update(Update),

    /// Delete a route
    Delete(Delete),

    /// Show detailed information about a route
    Show(Show),

    /// Look up a route by name (case-insensitive)
    Find(Find),

    /// List routes in identifier order
    List(List),

    /// Write all routes to a CSV report
    Export(Export),
}

impl Command {
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        match self {
            Self::Status(command) => command.run(root)?,
            Self::Init(command) => command.run(&root)?,
            Self::Add(command) => command.run(root)?,
            Self::Update(command) => command.run(root)?,
            Self::Delete(command) => command.run(root)?,
            Self::Show(command) => command.run(root)?,
            Self::Find(command) => command.run(root)?,
            Self::List(command) => command.run(root)?,
            Self::Export(command) => command.run(root)?,
        }
        Ok(())
    }
}

/// Endpoint coordinates given on the command line.
#[derive(Debug, Default, clap::Args)]
pub struct CoordinateArgs {
    /// Latitude of the origin
    #[arg(long, allow_negative_numbers = true, requires = "from_lon")]
    from_lat: Option<f64>,

    /// Longitude of the origin
    #[arg(long, allow_negative_numbers = true, requires = "from_lat")]
    from_lon: Option<f64>,

    /// Latitude of the destination
    #[arg(long, allow_negative_numbers = true, requires = "to_lon")]
    to_lat: Option<f64>,

    /// Longitude of the destination
    #[arg(long, allow_negative_numbers = true, requires = "to_lat")]
    to_lon: Option<f64>,
}

impl CoordinateArgs {
    fn origin(&self) -> Option<Coordinates> {
        Some(Coordinates::new(self.from_lat?, self.from_lon?))
    }

    fn destination(&self) -> Option<Coordinates> {
        Some(Coordinates::new(self.to_lat?, self.to_lon?))
    }

    const fn is_empty(&self) -> bool {
        self.from_lat.is_none() && self.to_lat.is_none()
    }
}

/// The great-circle distance between two endpoints, rounded to the stored
/// precision, when both are geocoded.
fn great_circle(origin: Option<Coordinates>, destination: Option<Coordinates>) -> Option<f64> {
    Some(geo::round_km(geo::great_circle_km(origin?, destination?)))
}

/// Reports rows the last load left out of the ledger.
fn warn_skipped(store: &routeledger::Store) {
    use terminal::Colorize;

    for row in &store.load_report().skipped {
        eprintln!(
            "{}",
            format!("⚠️  Skipped line {}: {}", row.line, row.reason).warning()
        );
    }
}
