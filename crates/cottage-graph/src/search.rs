//! Availability search
//!
//! Finds cottages that satisfy the capacity, bedroom, distance and city
//! constraints and have no booking overlapping the requested stay. The
//! overlap rule is evaluated by the store inside a `FILTER NOT EXISTS`
//! block using the half-open semantics of [`DateRange::overlaps`].
//!
//! [`DateRange::overlaps`]: cottage_core::DateRange::overlaps

use cottage_core::{AvailabilityQuery, Cottage, Result, StoreConfig};
use std::sync::Arc;

use crate::codec::decode_cottages;
use crate::sparql::{Namespace, StatementBuilder};
use crate::SparqlEndpoint;

// ============================================================================
// Availability Search
// ============================================================================

/// Availability queries against the graph store
pub struct AvailabilitySearch {
    endpoint: Arc<dyn SparqlEndpoint>,
    statements: StatementBuilder,
}

impl AvailabilitySearch {
    /// Create a search over an endpoint using the configured vocabulary
    pub fn new(endpoint: Arc<dyn SparqlEndpoint>, config: &StoreConfig) -> Result<Self> {
        let statements = StatementBuilder::new(
            Namespace::new(config.ontology_namespace.clone())?,
            Namespace::new(config.data_namespace.clone())?,
        );
        Ok(Self {
            endpoint,
            statements,
        })
    }

    /// Cottages free for the whole window that match every constraint.
    ///
    /// Either every matching row decodes or the search fails.
    pub async fn search(&self, query: &AvailabilityQuery) -> Result<Vec<Cottage>> {
        tracing::info!(
            window = %query.window,
            city = ?query.city_filter(),
            "Availability search started"
        );

        let rows = self.endpoint.select(&self.statements.available(query)).await?;
        let cottages = decode_cottages(&rows)?;

        tracing::debug!("Availability search matched {} cottages", cottages.len());
        Ok(cottages)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEndpoint;
    use crate::repository::CottageRepository;
    use chrono::NaiveDate;
    use cottage_core::DateRange;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    async fn seeded() -> (Arc<MemoryEndpoint>, CottageRepository, AvailabilitySearch) {
        let store = Arc::new(MemoryEndpoint::new());
        let config = StoreConfig::default();
        let repo = CottageRepository::new(store.clone(), &config).unwrap();
        let search = AvailabilitySearch::new(store.clone(), &config).unwrap();

        repo.insert(
            &Cottage::new("C1")
                .with_address("Rantatie 1")
                .with_image_url("c1.jpg")
                .with_capacity(6)
                .with_bedrooms(3)
                .with_lake_distance(50)
                .with_city("Lahti", 200),
        )
        .await
        .unwrap();
        repo.insert(
            &Cottage::new("C2")
                .with_address("Järvitie 5")
                .with_image_url("c2.jpg")
                .with_capacity(2)
                .with_bedrooms(1)
                .with_lake_distance(20)
                .with_city("Tampere", 5000),
        )
        .await
        .unwrap();

        (store, repo, search)
    }

    fn ids(cottages: &[Cottage]) -> Vec<&str> {
        let mut ids: Vec<&str> = cottages.iter().map(|c| c.cottage_id.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    #[tokio::test]
    async fn test_constraints_are_conjunctive() {
        let (_, _, search) = seeded().await;
        let window = DateRange::new(day(1), day(8)).unwrap();

        let all = search.search(&AvailabilityQuery::new(window)).await.unwrap();
        assert_eq!(ids(&all), vec!["C1", "C2"]);

        let big = AvailabilityQuery::new(window).with_min_capacity(4);
        assert_eq!(ids(&search.search(&big).await.unwrap()), vec!["C1"]);

        let near_lake = AvailabilityQuery::new(window).with_max_lake_distance(30);
        assert_eq!(ids(&search.search(&near_lake).await.unwrap()), vec!["C2"]);

        let none = AvailabilityQuery::new(window)
            .with_min_capacity(4)
            .with_max_lake_distance(30);
        assert!(search.search(&none).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_city_is_case_insensitive_exact_match() {
        let (_, _, search) = seeded().await;
        let window = DateRange::new(day(1), day(8)).unwrap();

        let lahti = AvailabilityQuery::new(window).with_city("LAHTI");
        assert_eq!(ids(&search.search(&lahti).await.unwrap()), vec!["C1"]);

        let partial = AvailabilityQuery::new(window).with_city("Lah");
        assert!(search.search(&partial).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_booking_excludes_cottage() {
        let (store, repo, search) = seeded().await;
        store.add_booking(
            &repo.codec().cottage_iri("C2"),
            &repo.codec().cottage_iri("b-10-20"),
            day(10),
            day(20),
        );

        let cases = [
            ((20, 30), true),
            ((15, 25), false),
            ((5, 10), true),
            ((9, 11), false),
        ];
        for ((start, end), included) in cases {
            let window = DateRange::new(day(start), day(end)).unwrap();
            let found = search.search(&AvailabilityQuery::new(window)).await.unwrap();
            assert_eq!(
                ids(&found).contains(&"C2"),
                included,
                "window [{start}, {end})"
            );
            // The other cottage is unaffected
            assert!(ids(&found).contains(&"C1"));
        }
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let (store, _, search) = seeded().await;
        store.fail_next_select();
        let window = DateRange::new(day(1), day(2)).unwrap();
        assert!(search.search(&AvailabilityQuery::new(window)).await.is_err());
    }
}
