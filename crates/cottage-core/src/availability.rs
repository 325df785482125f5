//! Availability criteria
//!
//! A stay window is a half-open date range `[start, end)`: the guest arrives
//! on `start` and leaves on `end`, so a stay ending on a given day never
//! conflicts with one starting that day.

use crate::{Cottage, CottageError, Result};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Half-open calendar date range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range; `end` must be strictly after `start`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end <= start {
            return Err(CottageError::ValidationError(format!(
                "date range end {end} must be after start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Range covering `nights` nights starting on `start`
    pub fn from_nights(start: NaiveDate, nights: u32) -> Result<Self> {
        if nights == 0 {
            return Err(CottageError::ValidationError(
                "number of nights must be at least 1".to_string(),
            ));
        }
        let end = start
            .checked_add_days(Days::new(u64::from(nights)))
            .ok_or_else(|| {
                CottageError::ValidationError(format!("{nights} nights from {start} is out of range"))
            })?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether a booking `[booking_start, booking_end)` overlaps this range.
    ///
    /// Touching endpoints do not overlap.
    pub fn overlaps(&self, booking_start: NaiveDate, booking_end: NaiveDate) -> bool {
        booking_start < self.end && booking_end > self.start
    }
}

#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = CottageError;

    fn try_from(raw: RawDateRange) -> Result<Self> {
        Self::new(raw.start, raw.end)
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Conjunctive search criteria for available cottages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityQuery {
    /// Minimum number of guests
    pub min_capacity: u32,

    pub min_bedrooms: u32,

    /// Maximum distance to the lake in meters
    pub max_lake_distance: u32,

    /// Exact city name, compared case-insensitively
    pub city: Option<String>,

    /// Maximum distance to the city in meters
    pub max_city_distance: u32,

    /// Requested stay
    pub window: DateRange,
}

impl AvailabilityQuery {
    /// Criteria that only constrain the stay window
    pub fn new(window: DateRange) -> Self {
        Self {
            min_capacity: 0,
            min_bedrooms: 0,
            max_lake_distance: u32::MAX,
            city: None,
            max_city_distance: u32::MAX,
            window,
        }
    }

    pub fn with_min_capacity(mut self, places: u32) -> Self {
        self.min_capacity = places;
        self
    }

    pub fn with_min_bedrooms(mut self, bedrooms: u32) -> Self {
        self.min_bedrooms = bedrooms;
        self
    }

    pub fn with_max_lake_distance(mut self, meters: u32) -> Self {
        self.max_lake_distance = meters;
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_max_city_distance(mut self, meters: u32) -> Self {
        self.max_city_distance = meters;
        self
    }

    /// Normalized city filter: trimmed and lower-cased, `None` when blank
    pub fn city_filter(&self) -> Option<String> {
        self.city
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_lowercase)
    }

    /// Whether a cottage satisfies every attribute constraint.
    ///
    /// Bookings are not considered here; see [`DateRange::overlaps`].
    pub fn matches(&self, cottage: &Cottage) -> bool {
        let city_ok = match self.city_filter() {
            Some(wanted) => cottage
                .location
                .city_name
                .as_deref()
                .map(|name| name.to_lowercase() == wanted)
                .unwrap_or(false),
            None => true,
        };

        cottage.capacity >= self.min_capacity
            && cottage.number_of_bedrooms >= self.min_bedrooms
            && cottage.distance_to_lake <= self.max_lake_distance
            && cottage.location.distance_to_city <= self.max_city_distance
            && city_ok
    }
}
