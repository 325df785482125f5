//! Cottage Graph - SPARQL data access for the cottage catalog
//!
//! Translates catalog operations into SPARQL query and update text, sends
//! them to a graph store, and decodes result rows back into cottages.
//!
//! Nothing is cached or shared between operations. Operations that touch
//! the store more than once (insert's existence check, delete's booking
//! check, update in `delete_then_insert` mode) can interleave with
//! concurrent callers on the same id; the store provides no isolation across
//! requests, so last write wins.

use async_trait::async_trait;
use cottage_core::Result;

pub mod catalog;
pub mod codec;
pub mod http_endpoint;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod repository;
pub mod results;
pub mod search;
pub mod sparql;

pub use catalog::CottageCatalog;
pub use codec::EntityCodec;
pub use http_endpoint::HttpSparqlEndpoint;
#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryEndpoint;
pub use repository::CottageRepository;
pub use results::{BindingRow, RdfTerm};
pub use search::AvailabilitySearch;
pub use sparql::{SelectQuery, StatementBuilder, UpdateRequest};

/// Connection to a SPARQL store's query and update endpoints.
///
/// Each call is self-contained: implementations acquire whatever connection
/// they need for the call and release it before returning, on success and
/// on error alike. Errors are returned as they occur; there is no retry.
#[async_trait]
pub trait SparqlEndpoint: Send + Sync {
    /// Evaluate a select query
    async fn select(&self, query: &SelectQuery) -> Result<Vec<BindingRow>>;

    /// Execute an update request
    async fn update(&self, request: &UpdateRequest) -> Result<()>;
}
