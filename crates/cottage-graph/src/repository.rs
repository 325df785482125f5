//! Cottage repository
//!
//! CRUD over the graph store. Each method builds its statements, sends them
//! through the endpoint and decodes the answer; nothing is kept between
//! calls.

use chrono::{NaiveDate, Utc};
use cottage_core::{Cottage, CottageError, Result, StoreConfig, UpdateMode};
use std::sync::Arc;

use crate::codec::{decode_cottages, EntityCodec, LOCATION_SUFFIX};
use crate::sparql::{Namespace, StatementBuilder, UpdateOperation, Vocab};
use crate::SparqlEndpoint;

/// Lifecycle operations for cottages and their locations
pub struct CottageRepository {
    endpoint: Arc<dyn SparqlEndpoint>,
    statements: StatementBuilder,
    codec: EntityCodec,
    update_mode: UpdateMode,
}

impl CottageRepository {
    /// Create a repository over an endpoint using the configured vocabulary
    pub fn new(endpoint: Arc<dyn SparqlEndpoint>, config: &StoreConfig) -> Result<Self> {
        let data = Namespace::new(config.data_namespace.clone())?;
        let ontology = Namespace::new(config.ontology_namespace.clone())?;

        Ok(Self {
            endpoint,
            statements: StatementBuilder::new(ontology, data.clone()),
            codec: EntityCodec::new(data),
            update_mode: config.update_mode,
        })
    }

    /// Override the update strategy
    pub fn with_update_mode(mut self, mode: UpdateMode) -> Self {
        self.update_mode = mode;
        self
    }

    pub fn codec(&self) -> &EntityCodec {
        &self.codec
    }

    /// All cottages, in no particular order
    pub async fn list(&self) -> Result<Vec<Cottage>> {
        let rows = self.endpoint.select(&self.statements.list_cottages()).await?;
        let cottages = decode_cottages(&rows)?;
        tracing::debug!("Listed {} cottages", cottages.len());
        Ok(cottages)
    }

    /// Whether a cottage with this id is stored
    pub async fn exists(&self, cottage_id: &str) -> Result<bool> {
        let iri = self.codec.cottage_iri(cottage_id);
        let rows = self
            .endpoint
            .select(&self.statements.cottage_exists(&iri))
            .await?;
        Ok(!rows.is_empty())
    }

    /// Store a new cottage with its location.
    ///
    /// Fails with `AlreadyExists` when the id is taken. The check and the
    /// write are separate requests, so two concurrent inserts of one id can
    /// both pass the check.
    pub async fn insert(&self, cottage: &Cottage) -> Result<()> {
        self.validate(cottage)?;

        if self.exists(&cottage.cottage_id).await? {
            tracing::warn!("Refusing to insert duplicate cottage {}", cottage.cottage_id);
            return Err(CottageError::AlreadyExists(cottage.cottage_id.clone()));
        }

        let request = self
            .statements
            .update(vec![UpdateOperation::InsertData(self.codec.encode(cottage))]);
        self.endpoint.update(&request).await?;

        tracing::info!("Inserted cottage {}", cottage.cottage_id);
        Ok(())
    }

    /// Replace a cottage and its location; an unknown id is created.
    ///
    /// Booking links are kept. In `Atomic` mode the delete and insert travel
    /// in one request. In `DeleteThenInsert` mode they are two requests and
    /// a failure of the second leaves the cottage deleted until it is
    /// written again.
    pub async fn update(&self, cottage: &Cottage) -> Result<()> {
        self.validate(cottage)?;

        let remove = self.delete_operation(&cottage.cottage_id, vec![Vocab::HasBooking]);
        let insert = UpdateOperation::InsertData(self.codec.encode(cottage));

        match self.update_mode {
            UpdateMode::Atomic => {
                let request = self.statements.update(vec![remove, insert]);
                self.endpoint.update(&request).await?;
            }
            UpdateMode::DeleteThenInsert => {
                self.endpoint
                    .update(&self.statements.update(vec![remove]))
                    .await?;
                if let Err(e) = self
                    .endpoint
                    .update(&self.statements.update(vec![insert]))
                    .await
                {
                    tracing::error!(
                        "Cottage {} was deleted but not re-inserted: {}",
                        cottage.cottage_id,
                        e
                    );
                    return Err(e);
                }
            }
        }

        tracing::info!("Updated cottage {}", cottage.cottage_id);
        Ok(())
    }

    /// Delete a cottage and its location, refusing while it has active or
    /// upcoming bookings. Deleting an unknown id is a no-op.
    pub async fn delete(&self, cottage_id: &str) -> Result<()> {
        self.delete_as_of(cottage_id, Utc::now().date_naive()).await
    }

    /// [`delete`](Self::delete) with an explicit notion of today
    pub async fn delete_as_of(&self, cottage_id: &str, today: NaiveDate) -> Result<()> {
        // The IRI of such an id is another cottage's location, never a cottage
        if cottage_id.ends_with(LOCATION_SUFFIX) {
            tracing::debug!("No cottage can have id {}, nothing to delete", cottage_id);
            return Ok(());
        }

        let active = self.active_bookings(cottage_id, today).await?;
        if active > 0 {
            tracing::warn!(
                "Refusing to delete cottage {} with {} active booking(s)",
                cottage_id,
                active
            );
            return Err(CottageError::ActiveBookings {
                id: cottage_id.to_string(),
                count: active,
            });
        }

        let request = self
            .statements
            .update(vec![self.delete_operation(cottage_id, Vec::new())]);
        self.endpoint.update(&request).await?;

        tracing::info!("Deleted cottage {}", cottage_id);
        Ok(())
    }

    /// Number of bookings of the cottage that end after `as_of`
    pub async fn active_bookings(&self, cottage_id: &str, as_of: NaiveDate) -> Result<usize> {
        let iri = self.codec.cottage_iri(cottage_id);
        let rows = self
            .endpoint
            .select(&self.statements.active_bookings(&iri, as_of))
            .await?;
        Ok(rows.len())
    }

    /// Removes the cottage and its location in one operation
    fn delete_operation(&self, cottage_id: &str, keep: Vec<Vocab>) -> UpdateOperation {
        UpdateOperation::DeleteSubjects {
            subjects: vec![
                self.codec.cottage_iri(cottage_id),
                self.codec.location_iri(cottage_id),
            ],
            keep,
        }
    }

    fn validate(&self, cottage: &Cottage) -> Result<()> {
        cottage.validate()?;
        // Such an id would share its IRI with another cottage's location
        if cottage.cottage_id.ends_with(LOCATION_SUFFIX) {
            return Err(CottageError::ValidationError(format!(
                "cottageID must not end with {LOCATION_SUFFIX}"
            )));
        }
        Ok(())
    }
}
