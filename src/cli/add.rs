use std::path::PathBuf;

use clap::Parser;
use routeledger::{Endpoint, RouteData, RouteName, Store, domain::geo};
use tracing::instrument;

use super::{CoordinateArgs, great_circle, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Add a new route")]
pub struct Add {
    /// Unique name of the route (case-insensitive)
    #[arg(long)]
    name: String,

    /// Where the route starts
    #[arg(long = "from", value_name = "PLACE")]
    origin: String,

    /// Where the route ends
    #[arg(long = "to", value_name = "PLACE")]
    destination: String,

    /// Length in kilometres; computed from the coordinates when omitted
    #[arg(long, value_name = "KM")]
    distance: Option<f64>,

    /// Maximum load the route can carry
    #[arg(long)]
    capacity: f64,

    /// Load currently assigned to the route
    #[arg(long, default_value_t = 0.0)]
    load: f64,

    #[command(flatten)]
    coordinates: CoordinateArgs,
}

impl Add {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut store = Store::open(root)?;
        super::warn_skipped(&store);

        let id = store.add(self.into_data()?)?;
        store.flush()?;

        println!("{}", format!("Added route {id}").success());
        Ok(())
    }

    /// Builds the route from the flags, filling in the distance from the
    /// coordinates when none is given.
    fn into_data(self) -> anyhow::Result<RouteData> {
        let origin = self.coordinates.origin();
        let destination = self.coordinates.destination();

        let distance_km = match self.distance {
            Some(km) => geo::round_km(km),
            None => great_circle(origin, destination).ok_or_else(|| {
                anyhow::anyhow!(
                    "--distance is required unless both endpoints have coordinates"
                )
            })?,
        };

        Ok(RouteData {
            name: RouteName::new(self.name)?,
            distance_km,
            origin: Endpoint {
                label: self.origin,
                coordinates: origin,
            },
            destination: Endpoint {
                label: self.destination,
                coordinates: destination,
            },
            capacity: self.capacity,
            current_load: self.load,
        })
    }
}
