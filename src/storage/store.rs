//! A file-backed ledger of routes
//!
//! The [`Store`] ties a ledger root directory (configuration and CSV data
//! file) to the filesystem-agnostic [`RouteTree`]. It is the layer that
//! allocates identifiers and validates routes before the tree sees them.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter},
    path::{Path, PathBuf},
};

use tracing::instrument;

use crate::{
    domain::{
        Config, Coordinates, Endpoint, Route, RouteData, RouteId, RouteName, RouteTree,
        TreeError, ValidationError, tree::Iter, validate,
    },
    storage::table::{self, LoadReport, TableError},
};

/// A file-backed ledger of routes.
///
/// Mutations only touch memory; call [`Store::flush`] to persist them.
#[derive(Debug)]
pub struct Store {
    /// The directory the ledger lives in.
    root: PathBuf,
    config: Config,
    tree: RouteTree,
    report: LoadReport,
}

/// Errors returned when adding or changing routes.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The route failed validation and never reached the tree.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// The tree refused the operation.
    #[error(transparent)]
    Tree(#[from] TreeError),
    /// The routes could not be written.
    #[error(transparent)]
    Save(#[from] TableError),
    /// The largest stored identifier is already `u64::MAX`.
    #[error("no route IDs left after {0}")]
    IdsExhausted(RouteId),
}

impl Store {
    /// Opens the ledger rooted at `root` and loads its routes.
    ///
    /// A missing configuration falls back to the defaults, and a missing data
    /// file loads as an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the data file exists but cannot be read, has an
    /// unexpected header, or holds a malformed row while the configuration
    /// asks to abort on those.
    #[instrument(level = "debug")]
    pub fn open(root: PathBuf) -> Result<Self, TableError> {
        let config = load_config(&root);
        let path = root.join(config.data_file());

        let (tree, report) = match File::open(&path) {
            Ok(file) => table::read_with_config(BufReader::new(file), &config)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No data file at {}, starting empty", path.display());
                (RouteTree::new(), LoadReport::default())
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            loaded = report.loaded,
            skipped = report.skipped.len(),
            "Loaded routes from {}",
            path.display()
        );

        Ok(Self {
            root,
            config,
            tree,
            report,
        })
    }

    /// Discards the in-memory ledger and loads it again from disk.
    ///
    /// Unflushed changes are lost.
    ///
    /// # Errors
    ///
    /// See [`Store::open`].
    pub fn reload(self) -> Result<Self, TableError> {
        Self::open(self.root)
    }

    /// The directory the ledger lives in.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Path of the CSV data file.
    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        self.root.join(self.config.data_file())
    }

    /// What happened while the routes were loaded.
    #[must_use]
    pub const fn load_report(&self) -> &LoadReport {
        &self.report
    }

    /// The underlying tree.
    #[must_use]
    pub const fn tree(&self) -> &RouteTree {
        &self.tree
    }

    /// All routes in ascending identifier order.
    #[must_use]
    pub fn routes(&self) -> Iter<'_> {
        self.tree.iter()
    }

    /// Finds a route by identifier.
    #[must_use]
    pub fn find_by_id(&self, id: RouteId) -> Option<&Route> {
        self.tree.find_by_id(id)
    }

    /// Finds a route by name, ignoring case.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Route> {
        self.tree.find_by_name(name)
    }

    /// Validates and stores a new route under the next free identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the route fails validation, its name is taken, or
    /// no identifier is left above the largest stored one.
    #[instrument(level = "debug", skip(self, data), fields(name = %data.name))]
    pub fn add(&mut self, data: RouteData) -> Result<RouteId, StoreError> {
        validate(&data)?;

        let id = match self.tree.next_id() {
            Some(id) => id,
            None => {
                let last = self.tree.max_id().unwrap_or(RouteId::FIRST);
                return Err(StoreError::IdsExhausted(last));
            }
        };
        self.tree.insert(Route::new(id, data))?;

        tracing::info!("Added route {id}");
        Ok(id)
    }

    /// Validates and applies a full replacement of a route's attributes.
    ///
    /// # Errors
    ///
    /// Returns an error if the route fails validation, does not exist, or the
    /// new name belongs to another route.
    #[instrument(level = "debug", skip(self, data))]
    pub fn update(&mut self, id: RouteId, data: RouteData) -> Result<(), StoreError> {
        validate(&data)?;
        self.tree.update(id, data)?;

        tracing::info!("Updated route {id}");
        Ok(())
    }

    /// Removes a route, returning it.
    ///
    /// # Errors
    ///
    /// Returns an error if the route does not exist.
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&mut self, id: RouteId) -> Result<Route, StoreError> {
        let route = self.tree.delete(id)?;
        tracing::info!("Deleted route {id}");
        Ok(route)
    }

    /// Adds the built-in example routes.
    ///
    /// # Errors
    ///
    /// Returns an error at the first example that cannot be added, e.g.
    /// because a route with the same name already exists.
    pub fn seed_samples(&mut self) -> Result<Vec<RouteId>, StoreError> {
        sample_routes()
            .into_iter()
            .map(|data| self.add(data))
            .collect()
    }

    /// Writes all routes to the data file, replacing it.
    ///
    /// Only routes held in memory are written. Rows that were skipped as
    /// malformed on load (see [`Store::load_report`]) are not in memory and
    /// are therefore dropped from the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    #[instrument(level = "debug", skip(self))]
    pub fn flush(&self) -> Result<(), StoreError> {
        self.export(&self.data_path())
    }

    /// Writes all routes as CSV to an arbitrary file, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn export(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(TableError::from)?;
        }
        let file = File::create(path).map_err(TableError::from)?;
        table::write_routes(BufWriter::new(file), &self.tree)?;
        tracing::debug!("Wrote {} routes to {}", self.tree.len(), path.display());
        Ok(())
    }
}

fn load_config(root: &Path) -> Config {
    let path = Config::path_in(root);
    Config::load(&path).unwrap_or_else(|e| {
        tracing::debug!("Failed to load config: {e}");
        Config::default()
    })
}

/// Three example routes across Antofagasta, one per efficiency class.
#[must_use]
pub fn sample_routes() -> Vec<RouteData> {
    let route = |name: &str,
                 distance_km: f64,
                 (origin, from): (&str, Coordinates),
                 (destination, to): (&str, Coordinates),
                 capacity: f64,
                 current_load: f64| {
        RouteName::new(name).ok().map(|name| RouteData {
            name,
            distance_km,
            origin: Endpoint::new(origin).at(from),
            destination: Endpoint::new(destination).at(to),
            capacity,
            current_load,
        })
    };

    [
        route(
            "Ruta Centro-Norte",
            6.5,
            (
                "Av. Balmaceda 2500, Antofagasta",
                Coordinates::new(-23.641_716, -70.398_352),
            ),
            (
                "Universidad de Antofagasta",
                Coordinates::new(-23.608_692, -70.399_209),
            ),
            100.0,
            20.0,
        ),
        route(
            "Ruta Costera",
            12.3,
            (
                "Terminal Pesquero Antofagasta",
                Coordinates::new(-23.632_961, -70.408_326),
            ),
            (
                "Balneario Municipal Antofagasta",
                Coordinates::new(-23.677_722, -70.403_693),
            ),
            80.0,
            50.0,
        ),
        route(
            "Ruta Mall-Hospital",
            8.9,
            (
                "Mall Plaza Antofagasta",
                Coordinates::new(-23.674_183, -70.404_219),
            ),
            (
                "Hospital Regional de Antofagasta",
                Coordinates::new(-23.635_238, -70.388_189),
            ),
            120.0,
            100.0,
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}
