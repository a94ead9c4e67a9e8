use std::path::PathBuf;

use clap::Parser;
use routeledger::{RouteData, RouteId, RouteName, Store, domain::geo};
use tracing::instrument;

use super::{CoordinateArgs, great_circle, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Change the attributes of a route")]
pub struct Update {
    /// The identifier of the route to change
    id: RouteId,

    /// New name (case-insensitive, must not belong to another route)
    #[arg(long)]
    name: Option<String>,

    /// New starting place
    #[arg(long = "from", value_name = "PLACE")]
    origin: Option<String>,

    /// New end place
    #[arg(long = "to", value_name = "PLACE")]
    destination: Option<String>,

    /// New length in kilometres
    #[arg(long, value_name = "KM")]
    distance: Option<f64>,

    /// New capacity
    #[arg(long)]
    capacity: Option<f64>,

    /// New current load
    #[arg(long)]
    load: Option<f64>,

    #[command(flatten)]
    coordinates: CoordinateArgs,
}

impl Update {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut store = Store::open(root)?;
        super::warn_skipped(&store);

        let Some(route) = store.find_by_id(self.id) else {
            anyhow::bail!("Route {} not found", self.id);
        };
        let id = self.id;
        let data = self.apply(route.data.clone())?;

        store.update(id, data)?;
        store.flush()?;

        println!("{}", format!("Updated route {id}").success());
        Ok(())
    }

    /// Applies the given flags onto the current attributes. Flags that are
    /// not given keep their current value.
    fn apply(self, mut data: RouteData) -> anyhow::Result<RouteData> {
        if let Some(name) = self.name {
            data.name = RouteName::new(name)?;
        }
        if let Some(origin) = self.origin {
            data.origin.label = origin;
        }
        if let Some(destination) = self.destination {
            data.destination.label = destination;
        }
        if let Some(capacity) = self.capacity {
            data.capacity = capacity;
        }
        if let Some(load) = self.load {
            data.current_load = load;
        }

        let moved = !self.coordinates.is_empty();
        if let Some(position) = self.coordinates.origin() {
            data.origin.coordinates = Some(position);
        }
        if let Some(position) = self.coordinates.destination() {
            data.destination.coordinates = Some(position);
        }

        // Moving an endpoint invalidates the stored distance unless a new one
        // is given.
        match self.distance {
            Some(km) => data.distance_km = geo::round_km(km),
            None if moved => {
                if let Some(km) =
                    great_circle(data.origin.coordinates, data.destination.coordinates)
                {
                    data.distance_km = km;
                } else {
                    tracing::warn!("Endpoint moved but distance could not be recomputed");
                }
            }
            None => {}
        }

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use routeledger::{Coordinates, Endpoint};

    use super::*;

    fn current() -> RouteData {
        RouteData {
            name: RouteName::new("Ruta Costera").unwrap(),
            distance_km: 12.3,
            origin: Endpoint::new("Terminal Pesquero")
                .at(Coordinates::new(-23.632_961, -70.408_326)),
            destination: Endpoint::new("Balneario Municipal"),
            capacity: 80.0,
            current_load: 50.0,
        }
    }

    fn apply(args: &[&str]) -> anyhow::Result<RouteData> {
        Update::try_parse_from(["update", "2"].iter().chain(args))
            .unwrap()
            .apply(current())
    }

    #[test]
    fn unspecified_fields_keep_current_values() {
        let data = apply(&["--load", "70"]).unwrap();

        let mut expected = current();
        expected.current_load = 70.0;
        assert_eq!(data, expected);
    }

    #[test]
    fn moved_endpoint_recomputes_distance() {
        let data = apply(&["--to-lat", "-23.677722", "--to-lon", "-70.403693"]).unwrap();

        let expected = geo::round_km(geo::great_circle_km(
            Coordinates::new(-23.632_961, -70.408_326),
            Coordinates::new(-23.677_722, -70.403_693),
        ));
        assert!((data.distance_km - expected).abs() < 1e-9);
        assert!((data.distance_km - 12.3).abs() > 1.0);
        assert_eq!(data.destination.label, "Balneario Municipal");
    }

    #[test]
    fn explicit_distance_wins_over_moved_endpoint() {
        let data = apply(&[
            "--distance",
            "9.999",
            "--to-lat",
            "-23.677722",
            "--to-lon",
            "-70.403693",
        ])
        .unwrap();

        assert!((data.distance_km - 10.0).abs() < 1e-9);
    }

    #[test]
    fn moved_endpoint_without_other_side_keeps_distance() {
        let mut ungeocoded = current();
        ungeocoded.origin.coordinates = None;

        let data = Update::try_parse_from(["update", "2", "--to-lat", "-23.6", "--to-lon", "-70.4"])
            .unwrap()
            .apply(ungeocoded)
            .unwrap();

        assert!((data.distance_km - 12.3).abs() < f64::EPSILON);
        assert!(data.destination.coordinates.is_some());
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(apply(&["--name", "   "]).is_err());
    }
}
