//! Mapping between cottages and graph statements
//!
//! A cottage is stored as two resources: the cottage itself at
//! `data_namespace + id` and its location at `<cottage IRI>_City`, linked by
//! `:nearestCity`.

use crate::results::BindingRow;
use crate::sparql::{var, Iri, Literal, Namespace, Term, Triple, Vocab};
use cottage_core::{Cottage, CottageError, Location, Result};

/// Suffix that turns a cottage IRI into its location IRI
pub const LOCATION_SUFFIX: &str = "_City";

/// Encodes cottages into triples and decodes result rows into cottages
#[derive(Debug, Clone)]
pub struct EntityCodec {
    data: Namespace,
}

impl EntityCodec {
    pub fn new(data: Namespace) -> Self {
        Self { data }
    }

    /// IRI of the cottage with the given id
    pub fn cottage_iri(&self, cottage_id: &str) -> Iri {
        self.data.iri(cottage_id)
    }

    /// IRI of the location owned by the cottage with the given id
    pub fn location_iri(&self, cottage_id: &str) -> Iri {
        self.cottage_iri(cottage_id).with_suffix(LOCATION_SUFFIX)
    }

    /// Triples for a cottage and its location.
    ///
    /// Absent strings are written as empty strings.
    pub fn encode(&self, cottage: &Cottage) -> Vec<Triple> {
        let iri = self.cottage_iri(&cottage.cottage_id);
        let city = self.location_iri(&cottage.cottage_id);
        let text = |value: &Option<String>| {
            Term::Literal(Literal::string(value.clone().unwrap_or_default()))
        };
        let number = |value: u32| Term::Literal(Literal::integer(value));

        vec![
            Triple::new(&iri, Vocab::Type, Term::Class(Vocab::Cottage)),
            Triple::new(
                &iri,
                Vocab::CottageId,
                Term::Literal(Literal::string(cottage.cottage_id.clone())),
            ),
            Triple::new(&iri, Vocab::Address, text(&cottage.address)),
            Triple::new(&iri, Vocab::ImageUrl, text(&cottage.image_url)),
            Triple::new(&iri, Vocab::Capacity, number(cottage.capacity)),
            Triple::new(
                &iri,
                Vocab::NumberOfBedrooms,
                number(cottage.number_of_bedrooms),
            ),
            Triple::new(&iri, Vocab::DistanceToLake, number(cottage.distance_to_lake)),
            Triple::new(&iri, Vocab::NearestCity, Term::Iri(city.clone())),
            Triple::new(&city, Vocab::Type, Term::Class(Vocab::Location)),
            Triple::new(&city, Vocab::CityName, text(&cottage.location.city_name)),
            Triple::new(
                &city,
                Vocab::DistanceToCity,
                number(cottage.location.distance_to_city),
            ),
        ]
    }
}

/// Decode one cottage row.
///
/// Missing strings decode to `None` and missing integers to `0`; an integer
/// binding that is not a non-negative number fails the row.
pub fn decode_cottage(row: &BindingRow) -> Result<Cottage> {
    let cottage_id = string(row, var::COTTAGE_ID).ok_or_else(|| CottageError::DecodeError {
        variable: var::COTTAGE_ID.to_string(),
        message: "required binding is missing".to_string(),
    })?;

    Ok(Cottage {
        cottage_id,
        address: string(row, var::ADDRESS),
        image_url: string(row, var::IMAGE_URL),
        capacity: integer(row, var::CAPACITY)?,
        number_of_bedrooms: integer(row, var::BEDROOMS)?,
        distance_to_lake: integer(row, var::LAKE_DISTANCE)?,
        location: Location {
            city_name: string(row, var::CITY_NAME),
            distance_to_city: integer(row, var::CITY_DISTANCE)?,
        },
    })
}

/// Decode every row or fail on the first bad one
pub fn decode_cottages(rows: &[BindingRow]) -> Result<Vec<Cottage>> {
    rows.iter().map(decode_cottage).collect()
}

fn string(row: &BindingRow, variable: &str) -> Option<String> {
    row.get(variable).map(|term| term.value().to_string())
}

fn integer(row: &BindingRow, variable: &str) -> Result<u32> {
    match row.get(variable) {
        None => Ok(0),
        Some(term) => term
            .value()
            .trim()
            .parse::<u32>()
            .map_err(|e| CottageError::DecodeError {
                variable: variable.to_string(),
                message: format!("{:?} is not a non-negative integer: {e}", term.value()),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::RdfTerm;
    use crate::sparql::XSD_INTEGER;
    use proptest::prelude::*;

    fn codec() -> EntityCodec {
        EntityCodec::new(Namespace::new("http://example.org/data/cottage#").unwrap())
    }

    /// Result row a store would return for the given triples
    fn row_from_triples(codec: &EntityCodec, cottage_id: &str, triples: &[Triple]) -> BindingRow {
        let iri = codec.cottage_iri(cottage_id);
        let city = codec.location_iri(cottage_id);
        let mut row = BindingRow::new();
        row.insert(var::COTTAGE.to_string(), RdfTerm::uri(iri.as_str()));
        for triple in triples {
            let Term::Literal(literal) = &triple.object else {
                continue;
            };
            let variable = match (triple.subject == city, triple.predicate) {
                (false, Vocab::CottageId) => var::COTTAGE_ID,
                (false, Vocab::Address) => var::ADDRESS,
                (false, Vocab::ImageUrl) => var::IMAGE_URL,
                (false, Vocab::Capacity) => var::CAPACITY,
                (false, Vocab::NumberOfBedrooms) => var::BEDROOMS,
                (false, Vocab::DistanceToLake) => var::LAKE_DISTANCE,
                (true, Vocab::CityName) => var::CITY_NAME,
                (true, Vocab::DistanceToCity) => var::CITY_DISTANCE,
                _ => continue,
            };
            row.insert(
                variable.to_string(),
                RdfTerm::literal(literal.lexical(), literal.datatype()),
            );
        }
        row
    }

    /// Reverse of `sparql::escape`
    fn unescape(text: &str) -> String {
        let mut out = String::new();
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        }
        out
    }

    #[test]
    fn test_iris_are_derived_from_id() {
        let codec = codec();
        assert_eq!(
            codec.cottage_iri("C1").as_str(),
            "http://example.org/data/cottage#C1"
        );
        assert_eq!(
            codec.location_iri("C1").as_str(),
            "http://example.org/data/cottage#C1_City"
        );
    }

    #[test]
    fn test_encode_produces_cottage_and_location() {
        let cottage = Cottage::new("C1").with_capacity(6).with_city("Lahti", 200);
        let triples = codec().encode(&cottage);
        let rendered: Vec<String> = triples.iter().map(ToString::to_string).collect();

        assert_eq!(triples.len(), 11);
        assert!(rendered.contains(&"<http://example.org/data/cottage#C1> a :Cottage .".to_string()));
        assert!(rendered.contains(
            &"<http://example.org/data/cottage#C1> :nearestCity <http://example.org/data/cottage#C1_City> ."
                .to_string()
        ));
        assert!(rendered.contains(
            &"<http://example.org/data/cottage#C1_City> a :Location .".to_string()
        ));
        assert!(rendered.contains(&"<http://example.org/data/cottage#C1> :capacity 6 .".to_string()));
        // Missing strings are written as empty literals, never "null"
        assert!(rendered.contains(&"<http://example.org/data/cottage#C1> :address \"\" .".to_string()));
        assert!(!rendered.iter().any(|t| t.contains("null")));
    }

    #[test]
    fn test_decode_missing_bindings() {
        let mut row = BindingRow::new();
        row.insert(var::COTTAGE_ID.to_string(), RdfTerm::literal("C7", None));

        let cottage = decode_cottage(&row).unwrap();
        assert_eq!(cottage, Cottage::new("C7"));
    }

    #[test]
    fn test_decode_rejects_non_numeric_integer() {
        let mut row = BindingRow::new();
        row.insert(var::COTTAGE_ID.to_string(), RdfTerm::literal("C7", None));
        row.insert(
            var::CAPACITY.to_string(),
            RdfTerm::literal("six", Some(XSD_INTEGER)),
        );

        let err = decode_cottage(&row).unwrap_err();
        assert!(matches!(
            err,
            CottageError::DecodeError { ref variable, .. } if variable == var::CAPACITY
        ));
    }

    #[test]
    fn test_decode_rejects_negative_integer() {
        let mut row = BindingRow::new();
        row.insert(var::COTTAGE_ID.to_string(), RdfTerm::literal("C7", None));
        row.insert(var::CITY_DISTANCE.to_string(), RdfTerm::literal("-5", None));
        assert!(decode_cottage(&row).is_err());
    }

    #[test]
    fn test_decode_requires_id() {
        let row = BindingRow::new();
        assert!(matches!(
            decode_cottage(&row),
            Err(CottageError::DecodeError { .. })
        ));
    }

    #[test]
    fn test_decode_cottages_fails_whole_set() {
        let mut good = BindingRow::new();
        good.insert(var::COTTAGE_ID.to_string(), RdfTerm::literal("C1", None));
        let mut bad = good.clone();
        bad.insert(var::BEDROOMS.to_string(), RdfTerm::literal("3.5", None));

        assert_eq!(decode_cottages(&[good.clone()]).unwrap().len(), 1);
        assert!(decode_cottages(&[good, bad]).is_err());
    }

    fn text_field() -> impl Strategy<Value = String> {
        proptest::string::string_regex("[a-zA-Z0-9 äö\\\\\"\n\r{}<>#.;]{0,24}").unwrap()
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            id in "[A-Za-z0-9 \\\\\"\n]{1,12}",
            address in text_field(),
            image in text_field(),
            city in text_field(),
            capacity in any::<u32>(),
            bedrooms in any::<u32>(),
            lake in any::<u32>(),
            city_distance in any::<u32>(),
        ) {
            let codec = codec();
            let cottage = Cottage::new(id.clone())
                .with_address(address)
                .with_image_url(image)
                .with_capacity(capacity)
                .with_bedrooms(bedrooms)
                .with_lake_distance(lake)
                .with_city(city, city_distance);

            let triples = codec.encode(&cottage);
            let row = row_from_triples(&codec, &id, &triples);
            prop_assert_eq!(decode_cottage(&row).unwrap(), cottage);
        }

        #[test]
        fn prop_escaped_literal_unescapes_to_original(value in "(?s).{0,40}") {
            let rendered = Literal::string(value.clone()).to_string();
            let inner = &rendered[1..rendered.len() - 1];

            // A quote only ever appears escaped, so the literal cannot end early
            let mut escaped = false;
            for c in inner.chars() {
                prop_assert!(escaped || c != '"');
                prop_assert!(c != '\n' && c != '\r');
                escaped = !escaped && c == '\\';
            }
            prop_assert_eq!(unescape(inner), value);
        }
    }
}
