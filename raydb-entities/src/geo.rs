use itertools::Itertools;
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Distance(pub f64);

impl Distance {
    pub const fn infinite() -> Self {
        Self(f64::INFINITY)
    }

    pub const fn from_meters(meters: f64) -> Self {
        Self(meters)
    }

    pub const fn to_meters(self) -> f64 {
        self.0
    }
}

const MEAN_EARTH_RADIUS: Distance = Distance::from_meters(6_371_000.0);

#[derive(Debug, Error, PartialEq)]
pub enum LocationError {
    #[error("Invalid latitude degrees: {0}")]
    Latitude(f64),
    #[error("Invalid longitude degrees: {0}")]
    Longitude(f64),
    #[error("Failed to parse location: {0}")]
    Parse(String),
}

/// A WGS84 position in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Location {
    pub lon: f64,
    pub lat: f64,
}

impl Location {
    pub fn try_new(lon: f64, lat: f64) -> Result<Self, LocationError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(LocationError::Latitude(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(LocationError::Longitude(lon));
        }
        Ok(Self { lon, lat })
    }

    /// Equirectangular approximation of the distance between
    /// two points.
    ///
    /// Good enough for points within one city, but it
    /// drifts quickly for longer distances.
    pub fn distance(&self, other: &Location) -> Distance {
        let f1 = self.lat.to_radians();
        let f2 = other.lat.to_radians();
        let x = (other.lon.to_radians() - self.lon.to_radians()) * ((f1 + f2) / 2.0).cos();
        let y = f2 - f1;
        Distance::from_meters((x * x + y * y).sqrt() * MEAN_EARTH_RADIUS.to_meters())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}, {}", self.lat, self.lon)
    }
}

/// Parses the `"lat, lon"` form that people type into the chat.
impl FromStr for Location {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .trim()
            .split(',')
            .map(str::trim)
            .collect_tuple()
            .ok_or_else(|| LocationError::Parse(s.to_string()))?;
        // Both parts must carry a decimal point, plain integers are
        // most likely a house or apartment number.
        if !is_decimal(lat) || !is_decimal(lon) {
            return Err(LocationError::Parse(s.to_string()));
        }
        let lat = lat
            .parse::<f64>()
            .map_err(|_| LocationError::Parse(s.to_string()))?;
        let lon = lon
            .parse::<f64>()
            .map_err(|_| LocationError::Parse(s.to_string()))?;
        Self::try_new(lon, lat)
    }
}

fn is_decimal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    match digits.split_once('.') {
        Some((int, frac)) => {
            !int.is_empty()
                && !frac.is_empty()
                && int.chars().all(|c| c.is_ascii_digit())
                && frac.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}
