//! Boundary operations of the catalog
//!
//! The entry point used by request layers. Inputs are expected to be
//! validated and dates normalized before they get here.

use chrono::NaiveDate;
use cottage_core::{AvailabilityQuery, Cottage, DateRange, Result, StoreConfig};
use std::sync::Arc;

use crate::http_endpoint::HttpSparqlEndpoint;
use crate::repository::CottageRepository;
use crate::search::AvailabilitySearch;
use crate::SparqlEndpoint;

/// Cottage catalog backed by a SPARQL store
pub struct CottageCatalog {
    repository: CottageRepository,
    search: AvailabilitySearch,
}

impl CottageCatalog {
    /// Catalog over the configured remote store
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let endpoint: Arc<dyn SparqlEndpoint> = Arc::new(HttpSparqlEndpoint::new(config)?);
        Self::with_endpoint(endpoint, config)
    }

    /// Catalog over any endpoint
    pub fn with_endpoint(endpoint: Arc<dyn SparqlEndpoint>, config: &StoreConfig) -> Result<Self> {
        Ok(Self {
            repository: CottageRepository::new(endpoint.clone(), config)?,
            search: AvailabilitySearch::new(endpoint, config)?,
        })
    }

    pub fn repository(&self) -> &CottageRepository {
        &self.repository
    }

    pub async fn list_cottages(&self) -> Result<Vec<Cottage>> {
        self.repository.list().await
    }

    pub async fn add_cottage(&self, cottage: &Cottage) -> Result<()> {
        self.repository.insert(cottage).await
    }

    pub async fn update_cottage(&self, cottage: &Cottage) -> Result<()> {
        self.repository.update(cottage).await
    }

    pub async fn delete_cottage(&self, cottage_id: &str) -> Result<()> {
        self.repository.delete(cottage_id).await
    }

    /// Cottages available for `nights` nights from `start_date`
    #[allow(clippy::too_many_arguments)]
    pub async fn search_availability(
        &self,
        min_capacity: u32,
        min_bedrooms: u32,
        max_lake_distance: u32,
        city: Option<&str>,
        max_city_distance: u32,
        start_date: NaiveDate,
        nights: u32,
    ) -> Result<Vec<Cottage>> {
        let mut query = AvailabilityQuery::new(DateRange::from_nights(start_date, nights)?)
            .with_min_capacity(min_capacity)
            .with_min_bedrooms(min_bedrooms)
            .with_max_lake_distance(max_lake_distance)
            .with_max_city_distance(max_city_distance);
        if let Some(city) = city {
            query = query.with_city(city);
        }
        self.search.search(&query).await
    }
}
