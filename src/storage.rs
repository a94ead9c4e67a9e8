/// A file-backed ledger wrapping the [`RouteTree`](crate::RouteTree).
pub mod store;
/// CSV encoding of routes.
pub mod table;

pub use store::{Store, StoreError, sample_routes};
pub use table::{LoadReport, RowError, SkippedRow, TableError};
