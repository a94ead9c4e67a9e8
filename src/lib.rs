//! Delivery Route Ledger
//!
//! Routes are kept in memory in an ordered binary search tree keyed by
//! identifier, and persisted as a CSV file under a ledger root directory.

pub mod domain;
pub use domain::{
    Config, Coordinates, Efficiency, Endpoint, Route, RouteData, RouteId, RouteName, RouteTree,
    TreeError,
};

/// CSV persistence and the file-backed store.
pub mod storage;
pub use storage::{LoadReport, Store, StoreError};
