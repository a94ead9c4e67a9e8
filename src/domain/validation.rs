//! Field checks applied before a route reaches the [`RouteTree`](crate::RouteTree).
//!
//! The tree stores any well-typed route. Domain ranges (non-negative distance,
//! positive capacity, load within capacity, plausible coordinates) are checked
//! here instead, by whoever is about to insert or update.

use std::fmt;

use nonempty::NonEmpty;

use crate::domain::route::{Coordinates, RouteData};

/// A single field holding a value outside its domain.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidField {
    /// The origin label is blank.
    #[error("origin cannot be empty")]
    EmptyOrigin,
    /// The destination label is blank.
    #[error("destination cannot be empty")]
    EmptyDestination,
    /// The distance is negative or not a finite number.
    #[error("distance must be a non-negative number, got {0}")]
    Distance(f64),
    /// The capacity is not a finite positive number.
    #[error("capacity must be a positive number, got {0}")]
    Capacity(f64),
    /// The load is negative or not a finite number.
    #[error("current load must be a non-negative number, got {0}")]
    Load(f64),
    /// The load is larger than the capacity.
    #[error("current load {load} exceeds capacity {capacity}")]
    LoadExceedsCapacity {
        /// The offending load.
        load: f64,
        /// The capacity it was compared against.
        capacity: f64,
    },
    /// A latitude outside `[-90, 90]`.
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    /// A longitude outside `[-180, 180]`.
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
}

/// Every invalid field of a route, in field order.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub struct ValidationError {
    /// The failing fields. Never empty.
    pub fields: NonEmpty<InvalidField>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid route: ")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{field}")?;
        }
        Ok(())
    }
}

/// Checks every mutable field of a route.
///
/// # Errors
///
/// Returns a [`ValidationError`] listing all failing fields, not just the
/// first.
pub fn validate(data: &RouteData) -> Result<(), ValidationError> {
    let mut failures = Vec::new();

    if data.origin.label.trim().is_empty() {
        failures.push(InvalidField::EmptyOrigin);
    }
    if data.destination.label.trim().is_empty() {
        failures.push(InvalidField::EmptyDestination);
    }
    if !(data.distance_km.is_finite() && data.distance_km >= 0.0) {
        failures.push(InvalidField::Distance(data.distance_km));
    }

    let capacity_ok = data.capacity.is_finite() && data.capacity > 0.0;
    if !capacity_ok {
        failures.push(InvalidField::Capacity(data.capacity));
    }
    if !(data.current_load.is_finite() && data.current_load >= 0.0) {
        failures.push(InvalidField::Load(data.current_load));
    } else if capacity_ok && data.current_load > data.capacity {
        failures.push(InvalidField::LoadExceedsCapacity {
            load: data.current_load,
            capacity: data.capacity,
        });
    }

    for coordinates in [data.origin.coordinates, data.destination.coordinates]
        .into_iter()
        .flatten()
    {
        check_coordinates(coordinates, &mut failures);
    }

    NonEmpty::from_vec(failures).map_or(Ok(()), |fields| Err(ValidationError { fields }))
}

fn check_coordinates(coordinates: Coordinates, failures: &mut Vec<InvalidField>) {
    if !(-90.0..=90.0).contains(&coordinates.lat) {
        failures.push(InvalidField::Latitude(coordinates.lat));
    }
    if !(-180.0..=180.0).contains(&coordinates.lon) {
        failures.push(InvalidField::Longitude(coordinates.lon));
    }
}
