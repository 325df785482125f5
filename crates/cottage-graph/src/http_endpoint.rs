//! SPARQL 1.1 Protocol over HTTP
//!
//! Queries and updates are sent as direct POST bodies. The client keeps no
//! idle connections, so every call opens its own connection and drops it
//! when the response has been read or the call fails.

use async_trait::async_trait;
use cottage_core::{CottageError, Result, StoreConfig};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;

use crate::results::{parse_results, BindingRow};
use crate::sparql::{SelectQuery, UpdateRequest};
use crate::SparqlEndpoint;

const SPARQL_QUERY: &str = "application/sparql-query";
const SPARQL_UPDATE: &str = "application/sparql-update";
const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Remote SPARQL store
pub struct HttpSparqlEndpoint {
    client: Client,
    query_url: String,
    update_url: String,
}

impl HttpSparqlEndpoint {
    /// Create an endpoint for the configured store
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(0)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CottageError::StoreError(format!("HTTP client setup failed: {e}")))?;

        Ok(Self {
            client,
            query_url: config.query_endpoint.clone(),
            update_url: config.update_endpoint.clone(),
        })
    }

    pub fn query_url(&self) -> &str {
        &self.query_url
    }

    pub fn update_url(&self) -> &str {
        &self.update_url
    }
}

#[async_trait]
impl SparqlEndpoint for HttpSparqlEndpoint {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<BindingRow>> {
        tracing::debug!(endpoint = %self.query_url, "SPARQL query:\n{}", query.text());

        let response = self
            .client
            .post(&self.query_url)
            .header(CONTENT_TYPE, SPARQL_QUERY)
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .body(query.text().to_string())
            .send()
            .await
            .map_err(|e| CottageError::StoreError(format!("Query request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CottageError::StoreError(format!(
                "Query rejected ({status}): {error_text}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CottageError::StoreError(format!("Failed to read query response: {e}")))?;

        let rows = parse_results(&body)?;
        tracing::debug!("Query returned {} rows", rows.len());
        Ok(rows)
    }

    async fn update(&self, request: &UpdateRequest) -> Result<()> {
        tracing::debug!(endpoint = %self.update_url, "SPARQL update:\n{}", request.text());

        let response = self
            .client
            .post(&self.update_url)
            .header(CONTENT_TYPE, SPARQL_UPDATE)
            .body(request.text().to_string())
            .send()
            .await
            .map_err(|e| CottageError::StoreError(format!("Update request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CottageError::StoreError(format!(
                "Update rejected ({status}): {error_text}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_config() {
        let config = StoreConfig {
            query_endpoint: "http://store:3030/cottages/query".to_string(),
            update_endpoint: "http://store:3030/cottages/update".to_string(),
            ..Default::default()
        };
        let endpoint = HttpSparqlEndpoint::new(&config).unwrap();
        assert_eq!(endpoint.query_url(), "http://store:3030/cottages/query");
        assert_eq!(endpoint.update_url(), "http://store:3030/cottages/update");
    }

    #[tokio::test]
    async fn test_unreachable_store_is_store_error() {
        let config = StoreConfig {
            // Port 9 (discard) on loopback is not expected to accept HTTP
            query_endpoint: "http://127.0.0.1:9/query".to_string(),
            update_endpoint: "http://127.0.0.1:9/update".to_string(),
            timeout_secs: 2,
            ..Default::default()
        };
        let endpoint = HttpSparqlEndpoint::new(&config).unwrap();
        let statements = crate::sparql::StatementBuilder::new(
            crate::sparql::Namespace::new(config.ontology_namespace.clone()).unwrap(),
            crate::sparql::Namespace::new(config.data_namespace.clone()).unwrap(),
        );

        let err = endpoint
            .select(&statements.list_cottages())
            .await
            .unwrap_err();
        assert!(matches!(err, CottageError::StoreError(_)));
    }
}
