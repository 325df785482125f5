//! Cottage Core - Domain models, errors, and shared configuration
//!
//! This crate defines the types shared by the data-access layer and its
//! boundary adapters:
//! - Catalog models (cottages and their embedded location)
//! - Availability criteria and half-open date ranges
//! - Common error types
//! - Configuration management

pub mod availability;
pub mod config;

pub use availability::{AvailabilityQuery, DateRange};
pub use config::{AppConfig, ConfigError, LoggingConfig, StoreConfig, UpdateMode};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for catalog operations
#[derive(Error, Debug)]
pub enum CottageError {
    #[error("Cottage not found: {0}")]
    NotFound(String),

    #[error("Cottage already exists: {0}")]
    AlreadyExists(String),

    #[error("Cottage {id} has {count} active or upcoming booking(s)")]
    ActiveBookings { id: String, count: usize },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Failed to decode binding ?{variable}: {message}")]
    DecodeError { variable: String, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for CottageError {
    fn from(err: ConfigError) -> Self {
        CottageError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CottageError>;

// ============================================================================
// Catalog Models
// ============================================================================

/// A rentable cottage together with its nearest-city location.
///
/// The JSON form is flat and uses the ontology's property names
/// (`cottageID`, `imageURL`, `cityName`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cottage {
    /// Stable external identifier; the store IRI is derived from it
    #[serde(rename = "cottageID")]
    pub cottage_id: String,

    /// Street address
    #[serde(default)]
    pub address: Option<String>,

    /// Image shown in listings
    #[serde(rename = "imageURL", default)]
    pub image_url: Option<String>,

    /// Number of guests the cottage sleeps
    #[serde(default)]
    pub capacity: u32,

    #[serde(default)]
    pub number_of_bedrooms: u32,

    /// Distance to the nearest lake in meters
    #[serde(default)]
    pub distance_to_lake: u32,

    /// Owned location; created and destroyed with the cottage
    #[serde(flatten)]
    pub location: Location,
}

impl Cottage {
    /// Create a cottage with the given id and empty attributes
    pub fn new(cottage_id: impl Into<String>) -> Self {
        Self {
            cottage_id: cottage_id.into(),
            ..Default::default()
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_bedrooms(mut self, bedrooms: u32) -> Self {
        self.number_of_bedrooms = bedrooms;
        self
    }

    /// Set distance to the lake in meters
    pub fn with_lake_distance(mut self, meters: u32) -> Self {
        self.distance_to_lake = meters;
        self
    }

    /// Set the nearest city and the distance to it in meters
    pub fn with_city(mut self, city_name: impl Into<String>, distance_meters: u32) -> Self {
        self.location = Location {
            city_name: Some(city_name.into()),
            distance_to_city: distance_meters,
        };
        self
    }

    /// Reject cottages that cannot be given a stable identity
    pub fn validate(&self) -> Result<()> {
        if self.cottage_id.trim().is_empty() {
            return Err(CottageError::ValidationError(
                "cottageID must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Nearest-city information embedded in a [`Cottage`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub city_name: Option<String>,

    /// Distance to the city in meters
    #[serde(default)]
    pub distance_to_city: u32,
}

// ============================================================================
// Tests
// ============================================================================
