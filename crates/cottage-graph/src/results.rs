//! SPARQL 1.1 query results (JSON format)

use cottage_core::{CottageError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// RDF term bound to a result variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RdfTerm {
    Uri {
        value: String,
    },
    Literal {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        datatype: Option<String>,
        #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
        lang: Option<String>,
    },
    /// Legacy form still emitted by some stores
    TypedLiteral {
        value: String,
        datatype: String,
    },
    Bnode {
        value: String,
    },
}

impl RdfTerm {
    pub fn uri(value: impl Into<String>) -> Self {
        Self::Uri {
            value: value.into(),
        }
    }

    pub fn literal(value: impl Into<String>, datatype: Option<&str>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: datatype.map(str::to_string),
            lang: None,
        }
    }

    /// Lexical value (IRI string for URIs)
    pub fn value(&self) -> &str {
        match self {
            Self::Uri { value }
            | Self::Literal { value, .. }
            | Self::TypedLiteral { value, .. }
            | Self::Bnode { value } => value,
        }
    }
}

/// One result row: variable name to bound term. Unbound variables are absent.
pub type BindingRow = HashMap<String, RdfTerm>;

#[derive(Debug, Deserialize)]
struct SparqlResults {
    results: ResultBindings,
}

#[derive(Debug, Deserialize)]
struct ResultBindings {
    bindings: Vec<BindingRow>,
}

/// Parse a `application/sparql-results+json` body into rows
pub fn parse_results(body: &str) -> Result<Vec<BindingRow>> {
    let parsed: SparqlResults = serde_json::from_str(body)
        .map_err(|e| CottageError::StoreError(format!("Malformed SPARQL result set: {e}")))?;
    Ok(parsed.results.bindings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_result_set() {
        let body = r#"{
            "head": { "vars": ["cottage", "capacity", "address", "cityName"] },
            "results": { "bindings": [
                {
                    "cottage": { "type": "uri", "value": "http://example.org/c#C1" },
                    "capacity": {
                        "type": "literal",
                        "datatype": "http://www.w3.org/2001/XMLSchema#integer",
                        "value": "6"
                    },
                    "address": { "type": "literal", "value": "Rantatie 1" },
                    "cityName": { "type": "literal", "value": "Lahti", "xml:lang": "fi" }
                },
                {
                    "cottage": { "type": "bnode", "value": "b0" },
                    "capacity": {
                        "type": "typed-literal",
                        "datatype": "http://www.w3.org/2001/XMLSchema#integer",
                        "value": "2"
                    }
                }
            ] }
        }"#;

        let rows = parse_results(body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["cottage"], RdfTerm::uri("http://example.org/c#C1"));
        assert_eq!(rows[0]["capacity"].value(), "6");
        assert_eq!(rows[0]["address"], RdfTerm::literal("Rantatie 1", None));
        assert!(matches!(
            &rows[0]["cityName"],
            RdfTerm::Literal { lang: Some(lang), .. } if lang == "fi"
        ));
        assert!(!rows[1].contains_key("address"));
        assert_eq!(rows[1]["capacity"].value(), "2");
    }

    #[test]
    fn test_empty_result_set() {
        let rows =
            parse_results(r#"{"head":{"vars":["cottage"]},"results":{"bindings":[]}}"#).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_malformed_body_is_store_error() {
        let err = parse_results("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, CottageError::StoreError(_)));
    }
}
