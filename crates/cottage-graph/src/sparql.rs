//! SPARQL statement building
//!
//! Statement text is assembled only from the typed pieces in this module.
//! Values enter the text through [`Literal`] and [`Iri`], whose `Display`
//! implementations are the single place where escaping and encoding happen,
//! so no caller can splice raw user input into a query.

use chrono::NaiveDate;
use cottage_core::{AvailabilityQuery, CottageError, Result};
use std::fmt;

/// XML Schema namespace
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DATE: &str = "http://www.w3.org/2001/XMLSchema#date";

/// Result variable names shared by the statement builder and the codec
pub mod var {
    pub const COTTAGE: &str = "cottage";
    pub const COTTAGE_ID: &str = "cottageID";
    pub const ADDRESS: &str = "address";
    pub const IMAGE_URL: &str = "imageURL";
    pub const CAPACITY: &str = "capacity";
    pub const BEDROOMS: &str = "numberOfBedrooms";
    pub const LAKE_DISTANCE: &str = "distanceToLake";
    pub const CITY: &str = "city";
    pub const CITY_NAME: &str = "cityName";
    pub const CITY_DISTANCE: &str = "distanceToCity";
    pub const BOOKING: &str = "booking";
    pub const START_DATE: &str = "startDate";
    pub const END_DATE: &str = "endDate";

    /// Projection of every cottage query
    pub const COTTAGE_ROW: [&str; 9] = [
        COTTAGE,
        COTTAGE_ID,
        ADDRESS,
        IMAGE_URL,
        CAPACITY,
        BEDROOMS,
        LAKE_DISTANCE,
        CITY_NAME,
        CITY_DISTANCE,
    ];
}

// ============================================================================
// Terms
// ============================================================================

/// Ontology classes and properties, rendered with the default `:` prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vocab {
    /// `rdf:type`, rendered as `a`
    Type,
    Cottage,
    Location,
    Booking,
    CottageId,
    Address,
    ImageUrl,
    Capacity,
    NumberOfBedrooms,
    DistanceToLake,
    NearestCity,
    CityName,
    DistanceToCity,
    HasBooking,
    StartDate,
    EndDate,
}

impl Vocab {
    pub fn local_name(self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Cottage => "Cottage",
            Self::Location => "Location",
            Self::Booking => "Booking",
            Self::CottageId => "cottageID",
            Self::Address => "address",
            Self::ImageUrl => "imageURL",
            Self::Capacity => "capacity",
            Self::NumberOfBedrooms => "numberOfBedrooms",
            Self::DistanceToLake => "distanceToLake",
            Self::NearestCity => "nearestCity",
            Self::CityName => "cityName",
            Self::DistanceToCity => "distanceToCity",
            Self::HasBooking => "hasBooking",
            Self::StartDate => "startDate",
            Self::EndDate => "endDate",
        }
    }
}

impl fmt::Display for Vocab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type => f.write_str("a"),
            other => write!(f, ":{}", other.local_name()),
        }
    }
}

/// Base IRI that local names are appended to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace(String);

impl Namespace {
    /// Accept a base IRI that can be placed between `<` and `>` verbatim
    pub fn new(base: impl Into<String>) -> Result<Self> {
        let base = base.into();
        let forbidden = |c: char| {
            c.is_whitespace() || c.is_control() || "<>\"{}|^`\\".contains(c)
        };
        if base.is_empty() || base.chars().any(forbidden) {
            return Err(CottageError::ConfigError(format!(
                "invalid namespace IRI: {base:?}"
            )));
        }
        Ok(Self(base))
    }

    /// IRI for a local name; everything outside `[A-Za-z0-9-._~]` is
    /// percent-encoded, so distinct names never map to the same IRI.
    pub fn iri(&self, local: &str) -> Iri {
        Iri(format!("{}{}", self.0, urlencoding::encode(local)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Absolute IRI, rendered as `<...>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Iri(String);

impl Iri {
    /// Derived IRI with an encoded suffix appended
    pub fn with_suffix(&self, suffix: &str) -> Iri {
        Iri(format!("{}{}", self.0, urlencoding::encode(suffix)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

/// Escape a string for use inside a double-quoted SPARQL literal
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

/// A literal value. Its text form is always escaped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal(LiteralValue);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LiteralValue {
    String(String),
    Integer(i64),
    Date(NaiveDate),
}

impl Literal {
    pub fn string(value: impl Into<String>) -> Self {
        Self(LiteralValue::String(value.into()))
    }

    pub fn integer(value: impl Into<i64>) -> Self {
        Self(LiteralValue::Integer(value.into()))
    }

    pub fn date(value: NaiveDate) -> Self {
        Self(LiteralValue::Date(value))
    }

    /// Unescaped lexical form, as a store reports it back
    pub fn lexical(&self) -> String {
        match &self.0 {
            LiteralValue::String(s) => s.clone(),
            LiteralValue::Integer(n) => n.to_string(),
            LiteralValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    /// Datatype IRI for typed literals; plain strings have none
    pub fn datatype(&self) -> Option<&'static str> {
        match &self.0 {
            LiteralValue::String(_) => None,
            LiteralValue::Integer(_) => Some(XSD_INTEGER),
            LiteralValue::Date(_) => Some(XSD_DATE),
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match &self.0 {
            LiteralValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            LiteralValue::String(s) => write!(f, "\"{}\"", escape(s)),
            LiteralValue::Integer(n) => write!(f, "{n}"),
            LiteralValue::Date(d) => write!(f, "\"{}\"^^xsd:date", d.format("%Y-%m-%d")),
        }
    }
}

/// Object position of a triple
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Iri(Iri),
    Class(Vocab),
    Literal(Literal),
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(iri) => iri.fmt(f),
            Self::Class(class) => class.fmt(f),
            Self::Literal(literal) => literal.fmt(f),
        }
    }
}

/// A ground statement
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: Iri,
    pub predicate: Vocab,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: &Iri, predicate: Vocab, object: Term) -> Self {
        Self {
            subject: subject.clone(),
            predicate,
            object,
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

// ============================================================================
// Statements
// ============================================================================

/// What a select query asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectKind {
    /// Every cottage with whatever attributes it has
    Cottages,
    /// The cottage resource, if typed as a cottage
    CottageExists(Iri),
    /// Bookings of a cottage ending after `as_of`
    ActiveBookings { cottage: Iri, as_of: NaiveDate },
    /// Cottages matching the criteria with no overlapping booking
    Available(AvailabilityQuery),
}

/// Rendered select query with its intent
#[derive(Debug, Clone)]
pub struct SelectQuery {
    kind: SelectKind,
    text: String,
}

impl SelectQuery {
    pub fn kind(&self) -> &SelectKind {
        &self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// One operation of an update request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOperation {
    /// `INSERT DATA` of ground triples
    InsertData(Vec<Triple>),
    /// Remove every triple of the given subjects, except the kept predicates
    DeleteSubjects { subjects: Vec<Iri>, keep: Vec<Vocab> },
}

impl fmt::Display for UpdateOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsertData(triples) => {
                writeln!(f, "INSERT DATA {{")?;
                for triple in triples {
                    writeln!(f, "  {triple}")?;
                }
                f.write_str("}")
            }
            Self::DeleteSubjects { subjects, keep } => {
                let values = subjects
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(f, "DELETE {{ ?s ?p ?o }} WHERE {{")?;
                writeln!(f, "  VALUES ?s {{ {values} }}")?;
                writeln!(f, "  ?s ?p ?o .")?;
                if !keep.is_empty() {
                    let kept = keep
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ");
                    writeln!(f, "  FILTER(?p NOT IN ({kept}))")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Rendered update request. All operations are sent in one request.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    operations: Vec<UpdateOperation>,
    text: String,
}

impl UpdateRequest {
    pub fn operations(&self) -> &[UpdateOperation] {
        &self.operations
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for UpdateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Builds statements with the fixed prefix preamble
#[derive(Debug, Clone)]
pub struct StatementBuilder {
    ontology: Namespace,
    data: Namespace,
}

impl StatementBuilder {
    pub fn new(ontology: Namespace, data: Namespace) -> Self {
        Self { ontology, data }
    }

    fn prologue(&self) -> String {
        format!(
            "PREFIX : <{}>\nPREFIX cottage: <{}>\nPREFIX xsd: <{XSD}>\n",
            self.ontology.as_str(),
            self.data.as_str()
        )
    }

    fn projection() -> String {
        var::COTTAGE_ROW
            .iter()
            .map(|v| format!("?{v}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn select(&self, kind: SelectKind, body: String) -> SelectQuery {
        SelectQuery {
            kind,
            text: format!("{}{body}", self.prologue()),
        }
    }

    /// All cottages; attributes and location are optional so partially
    /// written cottages still show up
    pub fn list_cottages(&self) -> SelectQuery {
        use var::*;
        let optional = [
            (Vocab::Address, ADDRESS),
            (Vocab::ImageUrl, IMAGE_URL),
            (Vocab::Capacity, CAPACITY),
            (Vocab::NumberOfBedrooms, BEDROOMS),
            (Vocab::DistanceToLake, LAKE_DISTANCE),
        ]
        .iter()
        .map(|(p, v)| format!("  OPTIONAL {{ ?{COTTAGE} {p} ?{v} }}\n"))
        .collect::<String>();

        let body = format!(
            "SELECT {projection} WHERE {{\n\
             \x20 ?{COTTAGE} a {cottage_class} ;\n\
             \x20     {id} ?{COTTAGE_ID} .\n\
             {optional}\
             \x20 OPTIONAL {{\n\
             \x20   ?{COTTAGE} {nearest} ?{CITY} .\n\
             \x20   OPTIONAL {{ ?{CITY} {city_name} ?{CITY_NAME} }}\n\
             \x20   OPTIONAL {{ ?{CITY} {city_distance} ?{CITY_DISTANCE} }}\n\
             \x20 }}\n\
             }}",
            projection = Self::projection(),
            cottage_class = Vocab::Cottage,
            id = Vocab::CottageId,
            nearest = Vocab::NearestCity,
            city_name = Vocab::CityName,
            city_distance = Vocab::DistanceToCity,
        );
        self.select(SelectKind::Cottages, body)
    }

    /// Existence check for a cottage resource
    pub fn cottage_exists(&self, cottage: &Iri) -> SelectQuery {
        let body = format!(
            "SELECT ?{c} WHERE {{\n  VALUES ?{c} {{ {cottage} }}\n  ?{c} a {class} .\n}} LIMIT 1",
            c = var::COTTAGE,
            class = Vocab::Cottage,
        );
        self.select(SelectKind::CottageExists(cottage.clone()), body)
    }

    /// Bookings of a cottage that end after `as_of`
    pub fn active_bookings(&self, cottage: &Iri, as_of: NaiveDate) -> SelectQuery {
        use var::*;
        let body = format!(
            "SELECT ?{BOOKING} ?{START_DATE} ?{END_DATE} WHERE {{\n\
             \x20 {cottage} {has_booking} ?{BOOKING} .\n\
             \x20 ?{BOOKING} {end} ?{END_DATE} .\n\
             \x20 OPTIONAL {{ ?{BOOKING} {start} ?{START_DATE} }}\n\
             \x20 FILTER(?{END_DATE} > {as_of_literal})\n\
             }}",
            has_booking = Vocab::HasBooking,
            end = Vocab::EndDate,
            start = Vocab::StartDate,
            as_of_literal = Literal::date(as_of),
        );
        self.select(
            SelectKind::ActiveBookings {
                cottage: cottage.clone(),
                as_of,
            },
            body,
        )
    }

    /// Cottages satisfying every constraint and free for the whole window
    pub fn available(&self, query: &AvailabilityQuery) -> SelectQuery {
        use var::*;
        let mut filters = vec![
            format!("?{CAPACITY} >= {}", Literal::integer(query.min_capacity)),
            format!("?{BEDROOMS} >= {}", Literal::integer(query.min_bedrooms)),
            format!("?{LAKE_DISTANCE} <= {}", Literal::integer(query.max_lake_distance)),
        ];
        if let Some(city) = query.city_filter() {
            filters.push(format!("lcase(str(?{CITY_NAME})) = {}", Literal::string(city)));
        }
        filters.push(format!(
            "?{CITY_DISTANCE} <= {}",
            Literal::integer(query.max_city_distance)
        ));
        let filters = filters
            .iter()
            .map(|f| format!("  FILTER({f})\n"))
            .collect::<String>();

        let body = format!(
            "SELECT {projection} WHERE {{\n\
             \x20 ?{COTTAGE} a {cottage_class} ;\n\
             \x20     {id} ?{COTTAGE_ID} ;\n\
             \x20     {address} ?{ADDRESS} ;\n\
             \x20     {image} ?{IMAGE_URL} ;\n\
             \x20     {capacity} ?{CAPACITY} ;\n\
             \x20     {bedrooms} ?{BEDROOMS} ;\n\
             \x20     {lake} ?{LAKE_DISTANCE} ;\n\
             \x20     {nearest} ?{CITY} .\n\
             \x20 ?{CITY} {city_name} ?{CITY_NAME} ;\n\
             \x20     {city_distance} ?{CITY_DISTANCE} .\n\
             {filters}\
             \x20 FILTER NOT EXISTS {{\n\
             \x20   ?{COTTAGE} {has_booking} ?{BOOKING} .\n\
             \x20   ?{BOOKING} {start} ?{START_DATE} ;\n\
             \x20       {end} ?{END_DATE} .\n\
             \x20   FILTER(?{START_DATE} < {window_end} && ?{END_DATE} > {window_start})\n\
             \x20 }}\n\
             }}",
            projection = Self::projection(),
            cottage_class = Vocab::Cottage,
            id = Vocab::CottageId,
            address = Vocab::Address,
            image = Vocab::ImageUrl,
            capacity = Vocab::Capacity,
            bedrooms = Vocab::NumberOfBedrooms,
            lake = Vocab::DistanceToLake,
            nearest = Vocab::NearestCity,
            city_name = Vocab::CityName,
            city_distance = Vocab::DistanceToCity,
            has_booking = Vocab::HasBooking,
            start = Vocab::StartDate,
            end = Vocab::EndDate,
            window_start = Literal::date(query.window.start()),
            window_end = Literal::date(query.window.end()),
        );
        self.select(SelectKind::Available(query.clone()), body)
    }

    /// One request carrying all operations, applied by the store as a unit
    pub fn update(&self, operations: Vec<UpdateOperation>) -> UpdateRequest {
        let rendered = operations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ;\n");
        UpdateRequest {
            text: format!("{}{rendered}", self.prologue()),
            operations,
        }
    }
}
