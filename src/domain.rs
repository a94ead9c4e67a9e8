//! Domain models for the route ledger.
//!
//! This module contains the route record, the ordered tree that stores
//! routes, and the collaborators the tree relies on its callers for:
//! validation, distance calculation and configuration.

/// Route records and their attributes.
pub mod route;
pub use route::{Coordinates, Efficiency, Endpoint, Route, RouteData, RouteId, RouteName};

/// The binary search tree holding all routes.
pub mod tree;
pub use tree::{RouteTree, TreeError};

mod config;
pub use config::{Config, MalformedRows};

pub mod geo;

pub mod validation;
pub use validation::{InvalidField, ValidationError, validate};
