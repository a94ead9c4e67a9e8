use std::{fmt, num::NonZeroU64, ops::Deref, str::FromStr};

use non_empty_string::NonEmptyString;
use serde::{Serialize, Serializer};

/// The identifier of a route.
///
/// Identifiers are positive integers. They are assigned once, when the route
/// is first stored, and are the sole ordering key of the
/// [`RouteTree`](crate::RouteTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteId(NonZeroU64);

impl RouteId {
    /// The first identifier handed out to an empty store.
    pub const FIRST: Self = Self(NonZeroU64::MIN);

    /// Creates an identifier from a raw integer.
    ///
    /// Returns `None` if `value` is zero.
    #[must_use]
    pub const fn new(value: u64) -> Option<Self> {
        match NonZeroU64::new(value) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// Returns the raw integer value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }

    /// Returns the identifier directly following this one, or `None` if the
    /// identifier space is exhausted.
    #[must_use]
    pub const fn successor(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RouteId {
    type Err = InvalidIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| InvalidIdError(s.to_string()))
    }
}

impl Serialize for RouteId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.get())
    }
}

/// Error returned when a string is not a positive integer.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid route ID '{0}': must be a positive integer")]
pub struct InvalidIdError(String);

/// The display name of a route.
///
/// Names are never empty. Two names are considered the same route name when
/// they are equal ignoring case, see [`RouteName::matches`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteName(NonEmptyString);

impl RouteName {
    /// Creates a route name, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyNameError`] if nothing but whitespace remains.
    pub fn new(name: impl Into<String>) -> Result<Self, EmptyNameError> {
        let name: String = name.into();
        NonEmptyString::new(name.trim().to_string())
            .map(Self)
            .map_err(|_| EmptyNameError)
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Case-insensitive comparison against another name.
    #[must_use]
    pub fn matches(&self, other: &str) -> bool {
        let ours = self.as_str();
        if ours.is_ascii() && other.is_ascii() {
            return ours.eq_ignore_ascii_case(other);
        }
        ours.to_lowercase() == other.to_lowercase()
    }
}

impl Deref for RouteName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl AsRef<str> for RouteName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RouteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteName {
    type Err = EmptyNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for RouteName {
    type Error = EmptyNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Serialize for RouteName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Error returned when a route name is empty.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
#[error("route name cannot be empty")]
pub struct EmptyNameError;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    /// Latitude, positive north.
    pub lat: f64,
    /// Longitude, positive east.
    pub lon: f64,
}

impl Coordinates {
    /// Creates a coordinate pair.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Builds a pair from two optional halves.
    ///
    /// Both halves absent means "not geocoded" and yields `Ok(None)`. Only one
    /// half present is an error.
    ///
    /// # Errors
    ///
    /// Returns [`HalfCoordinatesError`] if exactly one half is present.
    pub fn from_parts(
        lat: Option<f64>,
        lon: Option<f64>,
    ) -> Result<Option<Self>, HalfCoordinatesError> {
        match (lat, lon) {
            (Some(lat), Some(lon)) => Ok(Some(Self::new(lat, lon))),
            (None, None) => Ok(None),
            _ => Err(HalfCoordinatesError),
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lon)
    }
}

/// Error returned when only one of latitude/longitude is given.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
#[error("latitude and longitude must be given together")]
pub struct HalfCoordinatesError;

/// One end of a route: a free-text place and, once geocoded, its position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Endpoint {
    /// Free-text description of the place.
    pub label: String,
    /// Position of the place, if known.
    pub coordinates: Option<Coordinates>,
}

impl Endpoint {
    /// Creates an endpoint that has not been geocoded.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            coordinates: None,
        }
    }

    /// Attaches a position to this endpoint.
    #[must_use]
    pub fn at(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }
}

/// Load classification of a route, derived from `current_load / capacity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Efficiency {
    /// The capacity is not positive, so no ratio exists.
    Unknown,
    /// Less than half full.
    Low,
    /// At least half, but less than 80%, full.
    Medium,
    /// At least 80% full.
    High,
}

impl Efficiency {
    /// Load ratio at which a route stops being [`Efficiency::Low`].
    pub const MEDIUM_THRESHOLD: f64 = 0.5;
    /// Load ratio at which a route becomes [`Efficiency::High`].
    pub const HIGH_THRESHOLD: f64 = 0.8;

    /// Classifies a load against a capacity.
    #[must_use]
    pub fn classify(current_load: f64, capacity: f64) -> Self {
        // NaN capacity falls through to Unknown as well
        if !(capacity > 0.0) {
            return Self::Unknown;
        }
        let ratio = current_load / capacity;
        if ratio < Self::MEDIUM_THRESHOLD {
            Self::Low
        } else if ratio < Self::HIGH_THRESHOLD {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// Label used in tables and exported files.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unknown => "N/A",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for Efficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Efficiency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "n/a" | "unknown" => Ok(Self::Unknown),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown efficiency class '{other}'")),
        }
    }
}

/// Every mutable attribute of a route.
///
/// This is the payload an update replaces wholesale. The identifier lives
/// outside it, in [`Route`], because it can never change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteData {
    /// Unique (case-insensitive) display name.
    pub name: RouteName,
    /// Route length in kilometres.
    pub distance_km: f64,
    /// Where the route starts.
    pub origin: Endpoint,
    /// Where the route ends.
    pub destination: Endpoint,
    /// Maximum load the route can carry.
    pub capacity: f64,
    /// Load currently assigned to the route.
    pub current_load: f64,
}

impl RouteData {
    /// The efficiency class for the current load and capacity.
    ///
    /// Computed on every call, never cached.
    #[must_use]
    pub fn efficiency_class(&self) -> Efficiency {
        Efficiency::classify(self.current_load, self.capacity)
    }
}

/// A stored delivery route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    /// The immutable identifier.
    pub id: RouteId,
    /// The mutable attributes.
    #[serde(flatten)]
    pub data: RouteData,
}

impl Route {
    /// Creates a route from an identifier and its attributes.
    #[must_use]
    pub const fn new(id: RouteId, data: RouteData) -> Self {
        Self { id, data }
    }

    /// The route's name.
    #[must_use]
    pub const fn name(&self) -> &RouteName {
        &self.data.name
    }

    /// The efficiency class for the current load and capacity.
    #[must_use]
    pub fn efficiency_class(&self) -> Efficiency {
        self.data.efficiency_class()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(capacity: f64, current_load: f64) -> RouteData {
        RouteData {
            name: RouteName::new("Test").unwrap(),
            distance_km: 1.0,
            origin: Endpoint::new("A"),
            destination: Endpoint::new("B"),
            capacity,
            current_load,
        }
    }

    #[test]
    fn efficiency_boundaries() {
        assert_eq!(data(100.0, 49.0).efficiency_class(), Efficiency::Low);
        assert_eq!(data(100.0, 50.0).efficiency_class(), Efficiency::Medium);
        assert_eq!(data(100.0, 79.9).efficiency_class(), Efficiency::Medium);
        assert_eq!(data(100.0, 80.0).efficiency_class(), Efficiency::High);
        assert_eq!(data(100.0, 100.0).efficiency_class(), Efficiency::High);
    }

    #[test]
    fn efficiency_is_unknown_without_capacity() {
        assert_eq!(data(0.0, 10.0).efficiency_class(), Efficiency::Unknown);
        assert_eq!(data(-5.0, 0.0).efficiency_class(), Efficiency::Unknown);
        assert_eq!(data(f64::NAN, 1.0).efficiency_class(), Efficiency::Unknown);
        assert_eq!(Efficiency::Unknown.to_string(), "N/A");
    }

    #[test]
    fn efficiency_tracks_field_changes() {
        let mut route = data(100.0, 10.0);
        assert_eq!(route.efficiency_class(), Efficiency::Low);
        route.current_load = 90.0;
        assert_eq!(route.efficiency_class(), Efficiency::High);
    }

    #[test]
    fn names_match_ignoring_case() {
        let name = RouteName::new("Ruta Costera").unwrap();
        assert!(name.matches("ruta costera"));
        assert!(name.matches("RUTA COSTERA"));
        assert!(!name.matches("Ruta Costera 2"));

        let accented = RouteName::new("Ñuñoa").unwrap();
        assert!(accented.matches("ÑUÑOA"));
    }

    #[test]
    fn names_are_trimmed_and_non_empty() {
        assert_eq!(RouteName::new("  Centro  ").unwrap().as_str(), "Centro");
        assert_eq!(RouteName::new("   "), Err(EmptyNameError));
        assert_eq!(RouteName::new(""), Err(EmptyNameError));
    }

    #[test]
    fn ids_must_be_positive() {
        assert_eq!("7".parse::<RouteId>().unwrap().get(), 7);
        assert!("0".parse::<RouteId>().is_err());
        assert!("-3".parse::<RouteId>().is_err());
        assert!("abc".parse::<RouteId>().is_err());
        assert_eq!(RouteId::FIRST.successor().map(RouteId::get), Some(2));
        assert_eq!(RouteId::new(u64::MAX).unwrap().successor(), None);
    }

    #[test]
    fn half_coordinates_are_rejected() {
        assert_eq!(Coordinates::from_parts(None, None), Ok(None));
        assert_eq!(
            Coordinates::from_parts(Some(1.0), Some(2.0)),
            Ok(Some(Coordinates::new(1.0, 2.0)))
        );
        assert_eq!(
            Coordinates::from_parts(Some(1.0), None),
            Err(HalfCoordinatesError)
        );
    }
}
