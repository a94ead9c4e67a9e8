//! CSV encoding of a route ledger.
//!
//! One header row, then one row per route in ascending identifier order. The
//! `efficiency` column is derived; it is recomputed on every write and ignored
//! on read.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::domain::{
    Config, Coordinates, Endpoint, MalformedRows, Route, RouteData, RouteId, RouteName,
    RouteTree, TreeError, ValidationError,
    route::{EmptyNameError, HalfCoordinatesError},
    validate,
};

/// Column names, in file order.
pub const HEADER: [&str; 12] = [
    "id",
    "name",
    "distance_km",
    "origin",
    "destination",
    "origin_lat",
    "origin_lon",
    "destination_lat",
    "destination_lon",
    "capacity",
    "current_load",
    "efficiency",
];

/// Number of leading columns a file must carry; everything after is derived
/// or unknown and ignored.
const REQUIRED_COLUMNS: usize = 11;

/// Flat, serde-friendly shape of one CSV row.
#[derive(Debug, Serialize, Deserialize)]
struct RouteRow {
    id: u64,
    name: String,
    distance_km: f64,
    origin: String,
    destination: String,
    origin_lat: Option<f64>,
    origin_lon: Option<f64>,
    destination_lat: Option<f64>,
    destination_lon: Option<f64>,
    capacity: f64,
    current_load: f64,
    #[serde(default)]
    efficiency: Option<String>,
}

impl From<&Route> for RouteRow {
    fn from(route: &Route) -> Self {
        let data = &route.data;
        let origin = data.origin.coordinates;
        let destination = data.destination.coordinates;
        Self {
            id: route.id.get(),
            name: data.name.to_string(),
            distance_km: data.distance_km,
            origin: data.origin.label.clone(),
            destination: data.destination.label.clone(),
            origin_lat: origin.map(|c| c.lat),
            origin_lon: origin.map(|c| c.lon),
            destination_lat: destination.map(|c| c.lat),
            destination_lon: destination.map(|c| c.lon),
            capacity: data.capacity,
            current_load: data.current_load,
            efficiency: Some(route.efficiency_class().label().to_string()),
        }
    }
}

impl TryFrom<RouteRow> for Route {
    type Error = RowError;

    fn try_from(row: RouteRow) -> Result<Self, Self::Error> {
        let id = RouteId::new(row.id).ok_or(RowError::ZeroId)?;
        let name = RouteName::new(row.name)?;
        let origin = Coordinates::from_parts(row.origin_lat, row.origin_lon).map_err(|source| {
            RowError::HalfCoordinates {
                side: "origin",
                source,
            }
        })?;
        let destination = Coordinates::from_parts(row.destination_lat, row.destination_lon)
            .map_err(|source| RowError::HalfCoordinates {
                side: "destination",
                source,
            })?;

        Ok(Self::new(
            id,
            RouteData {
                name,
                distance_km: row.distance_km,
                origin: Endpoint {
                    label: row.origin,
                    coordinates: origin,
                },
                destination: Endpoint {
                    label: row.destination,
                    coordinates: destination,
                },
                capacity: row.capacity,
                current_load: row.current_load,
            },
        ))
    }
}

/// Why a single row could not be loaded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowError {
    /// The row is not well-formed CSV or a field does not parse.
    #[error("{0}")]
    Parse(String),
    /// The identifier column is zero.
    #[error("route ID must be a positive integer")]
    ZeroId,
    /// The name column is blank.
    #[error(transparent)]
    EmptyName(#[from] EmptyNameError),
    /// Only one of latitude/longitude is present.
    #[error("{side}: {source}")]
    HalfCoordinates {
        /// `"origin"` or `"destination"`.
        side: &'static str,
        /// The underlying error.
        source: HalfCoordinatesError,
    },
    /// A field holds a value outside its domain.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// The tree refused the route, e.g. as a duplicate.
    #[error(transparent)]
    Rejected(#[from] TreeError),
}

/// A row left out of a load.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    /// 1-based line number in the file.
    pub line: u64,
    /// Why the row was left out.
    pub reason: RowError,
}

/// Summary of a load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Number of routes stored.
    pub loaded: usize,
    /// Rows left out, in file order.
    pub skipped: Vec<SkippedRow>,
}

/// Errors reading or writing a route table.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// CSV-level failure that affects the whole file.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// The header row does not start with the expected columns.
    #[error("unexpected header: expected {expected:?}, found {found:?}")]
    UnexpectedHeader {
        /// The columns a route table starts with.
        expected: Vec<&'static str>,
        /// The header actually found.
        found: Vec<String>,
    },
    /// A malformed row, when the configuration asks to abort on them.
    #[error("line {line}: {reason}")]
    MalformedRow {
        /// 1-based line number in the file.
        line: u64,
        /// Why the row is malformed.
        reason: RowError,
    },
}

/// Writes routes as a CSV table, header first.
///
/// # Errors
///
/// Returns an error if writing to `writer` fails.
pub fn write_routes<'a, W: Write>(
    writer: W,
    routes: impl IntoIterator<Item = &'a Route>,
) -> Result<(), TableError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    writer.write_record(HEADER)?;
    for route in routes {
        writer.serialize(RouteRow::from(route))?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a CSV table into a fresh tree.
///
/// An input without even a header row reads as an empty tree. Rows that fail
/// to parse, fail [`validate`], or are rejected by the tree are handled
/// according to `policy`.
///
/// # Errors
///
/// - [`TableError::UnexpectedHeader`] if the header does not match.
/// - [`TableError::MalformedRow`] for the first bad row under
///   [`MalformedRows::Abort`].
/// - [`TableError::Io`]/[`TableError::Csv`] if the input cannot be read.
#[instrument(level = "debug", skip(reader))]
pub fn read_routes<R: Read>(
    reader: R,
    policy: MalformedRows,
) -> Result<(RouteTree, LoadReport), TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let mut tree = RouteTree::new();
    let mut report = LoadReport::default();

    if headers.is_empty() {
        return Ok((tree, report));
    }
    check_header(&headers)?;

    for result in reader.records() {
        let (line, outcome) = match result {
            Ok(record) => {
                let line = line_of(record.position());
                let outcome = route_from_record(&record, &headers)
                    .and_then(|route| tree.insert(route).map_err(RowError::from));
                (line, outcome)
            }
            Err(error) => {
                if let csv::ErrorKind::Io(_) = error.kind() {
                    return Err(error.into());
                }
                (line_of(error.position()), Err(RowError::Parse(error.to_string())))
            }
        };

        match (outcome, policy) {
            (Ok(()), _) => report.loaded += 1,
            (Err(reason), MalformedRows::Abort) => {
                return Err(TableError::MalformedRow { line, reason });
            }
            (Err(reason), MalformedRows::Skip) => {
                warn!(line, %reason, "skipping malformed route row");
                report.skipped.push(SkippedRow { line, reason });
            }
        }
    }

    Ok((tree, report))
}

/// Reads a table according to the policy in `config`.
///
/// # Errors
///
/// See [`read_routes`].
pub fn read_with_config<R: Read>(
    reader: R,
    config: &Config,
) -> Result<(RouteTree, LoadReport), TableError> {
    read_routes(reader, config.malformed_rows)
}

fn check_header(headers: &csv::StringRecord) -> Result<(), TableError> {
    let matches = headers.len() >= REQUIRED_COLUMNS
        && headers
            .iter()
            .zip(&HEADER[..REQUIRED_COLUMNS])
            .all(|(found, expected)| found == *expected);

    if matches {
        Ok(())
    } else {
        Err(TableError::UnexpectedHeader {
            expected: HEADER.to_vec(),
            found: headers.iter().map(str::to_string).collect(),
        })
    }
}

fn route_from_record(
    record: &csv::StringRecord,
    headers: &csv::StringRecord,
) -> Result<Route, RowError> {
    let row: RouteRow = record
        .deserialize(Some(headers))
        .map_err(|e| RowError::Parse(e.to_string()))?;
    let route = Route::try_from(row)?;
    validate(&route.data)?;
    Ok(route)
}

fn line_of(position: Option<&csv::Position>) -> u64 {
    position.map_or(0, csv::Position::line)
}
