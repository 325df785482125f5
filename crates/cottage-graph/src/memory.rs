//! In-memory SPARQL endpoint for tests
//!
//! Keeps ground triples in a vector and answers each statement from its
//! typed intent instead of parsing the text. Update requests are applied
//! all-or-nothing, like a store applies a single request. Failures can be
//! injected to exercise the transport error paths.

use async_trait::async_trait;
use chrono::NaiveDate;
use cottage_core::{AvailabilityQuery, CottageError, Result, StoreConfig};
use std::sync::{Mutex, MutexGuard};

use crate::codec::decode_cottage;
use crate::results::{BindingRow, RdfTerm};
use crate::sparql::{
    var, Iri, Literal, Namespace, SelectKind, SelectQuery, Term, Triple, UpdateOperation, UpdateRequest,
    Vocab,
};
use crate::SparqlEndpoint;

#[derive(Default)]
struct MemoryState {
    triples: Vec<Triple>,
    update_calls: usize,
    fail_on_update_call: Option<usize>,
    fail_next_select: bool,
    requests: Vec<String>,
}

/// Triple store held in process memory
pub struct MemoryEndpoint {
    state: Mutex<MemoryState>,
    /// Base IRI of ontology classes, used when a class is bound in a result
    ontology: String,
}

impl Default for MemoryEndpoint {
    fn default() -> Self {
        Self {
            state: Mutex::default(),
            ontology: StoreConfig::default().ontology_namespace,
        }
    }
}

impl MemoryEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose classes live in the given ontology namespace
    pub fn with_ontology(ontology: &Namespace) -> Self {
        Self {
            state: Mutex::default(),
            ontology: ontology.as_str().to_string(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| CottageError::StoreError("memory store lock poisoned".to_string()))
    }

    /// Make the `n`-th update call from now (1-based) fail without applying
    pub fn fail_update_call(&self, n: usize) {
        if let Ok(mut state) = self.lock() {
            let target = state.update_calls + n;
            state.fail_on_update_call = Some(target);
        }
    }

    /// Make the next select call fail
    pub fn fail_next_select(&self) {
        if let Ok(mut state) = self.lock() {
            state.fail_next_select = true;
        }
    }

    /// Add triples directly, bypassing the update path
    pub fn insert_triples(&self, triples: impl IntoIterator<Item = Triple>) {
        if let Ok(mut state) = self.lock() {
            for triple in triples {
                insert_unique(&mut state.triples, triple);
            }
        }
    }

    /// Record a booking the way the booking subsystem links it to a cottage
    pub fn add_booking(&self, cottage: &Iri, booking: &Iri, start: NaiveDate, end: NaiveDate) {
        self.insert_triples([
            Triple::new(booking, Vocab::Type, Term::Class(Vocab::Booking)),
            Triple::new(booking, Vocab::StartDate, Term::Literal(Literal::date(start))),
            Triple::new(booking, Vocab::EndDate, Term::Literal(Literal::date(end))),
            Triple::new(cottage, Vocab::HasBooking, Term::Iri(booking.clone())),
        ]);
    }

    /// Snapshot of every stored triple
    pub fn triples(&self) -> Vec<Triple> {
        self.lock().map(|s| s.triples.clone()).unwrap_or_default()
    }

    /// Whether any triple has the given subject
    pub fn has_subject(&self, subject: &Iri) -> bool {
        self.triples().iter().any(|t| &t.subject == subject)
    }

    /// Text of every update request that was applied
    pub fn applied_requests(&self) -> Vec<String> {
        self.lock().map(|s| s.requests.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SparqlEndpoint for MemoryEndpoint {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<BindingRow>> {
        let mut state = self.lock()?;
        if state.fail_next_select {
            state.fail_next_select = false;
            return Err(CottageError::StoreError(
                "Query request failed: connection refused".to_string(),
            ));
        }

        let graph = Graph {
            triples: &state.triples,
            ontology: &self.ontology,
        };
        let triples = graph.triples;
        let rows = match query.kind() {
            SelectKind::Cottages => cottage_subjects(triples)
                .map(|iri| graph.cottage_row(iri))
                .collect(),
            SelectKind::CottageExists(iri) => cottage_subjects(triples)
                .filter(|s| *s == iri)
                .take(1)
                .map(|s| BindingRow::from([(var::COTTAGE.to_string(), RdfTerm::uri(s.as_str()))]))
                .collect(),
            SelectKind::ActiveBookings { cottage, as_of } => bookings_of(triples, cottage)
                .filter(|(_, _, end)| end.map(|e| e > *as_of).unwrap_or(false))
                .map(|(booking, start, end)| graph.booking_row(booking, start, end))
                .collect(),
            SelectKind::Available(criteria) => cottage_subjects(triples)
                .filter(|iri| graph.is_available(iri, criteria))
                .map(|iri| graph.cottage_row(iri))
                .collect(),
        };
        Ok(rows)
    }

    async fn update(&self, request: &UpdateRequest) -> Result<()> {
        let mut state = self.lock()?;
        state.update_calls += 1;
        if state.fail_on_update_call == Some(state.update_calls) {
            state.fail_on_update_call = None;
            return Err(CottageError::StoreError(
                "Update request failed: connection reset".to_string(),
            ));
        }

        let mut triples = state.triples.clone();
        for operation in request.operations() {
            match operation {
                UpdateOperation::InsertData(new) => {
                    for triple in new {
                        insert_unique(&mut triples, triple.clone());
                    }
                }
                UpdateOperation::DeleteSubjects { subjects, keep } => {
                    triples.retain(|t| !subjects.contains(&t.subject) || keep.contains(&t.predicate));
                }
            }
        }
        state.triples = triples;
        state.requests.push(request.text().to_string());
        Ok(())
    }
}

fn insert_unique(triples: &mut Vec<Triple>, triple: Triple) {
    if !triples.contains(&triple) {
        triples.push(triple);
    }
}

fn cottage_subjects(triples: &[Triple]) -> impl Iterator<Item = &Iri> + '_ {
    triples
        .iter()
        .filter(|t| t.predicate == Vocab::Type && t.object == Term::Class(Vocab::Cottage))
        .map(|t| &t.subject)
        .filter(move |s| object(triples, s, Vocab::CottageId).is_some())
}

fn object<'a>(triples: &'a [Triple], subject: &Iri, predicate: Vocab) -> Option<&'a Term> {
    triples
        .iter()
        .find(|t| &t.subject == subject && t.predicate == predicate)
        .map(|t| &t.object)
}

fn bookings_of<'a>(
    triples: &'a [Triple],
    cottage: &'a Iri,
) -> impl Iterator<Item = (&'a Iri, Option<NaiveDate>, Option<NaiveDate>)> + 'a {
    let date = move |booking: &Iri, predicate| match object(triples, booking, predicate) {
        Some(Term::Literal(literal)) => literal.as_date(),
        _ => None,
    };
    triples
        .iter()
        .filter(move |t| &t.subject == cottage && t.predicate == Vocab::HasBooking)
        .filter_map(move |t| match &t.object {
            Term::Iri(booking) => Some((
                booking,
                date(booking, Vocab::StartDate),
                date(booking, Vocab::EndDate),
            )),
            _ => None,
        })
}

/// Read-only view of the stored triples used to answer selects
struct Graph<'a> {
    triples: &'a [Triple],
    ontology: &'a str,
}

impl Graph<'_> {
    fn to_rdf(&self, term: &Term) -> RdfTerm {
        match term {
            Term::Iri(iri) => RdfTerm::uri(iri.as_str()),
            Term::Class(class) => RdfTerm::uri(format!("{}{}", self.ontology, class.local_name())),
            Term::Literal(literal) => RdfTerm::literal(literal.lexical(), literal.datatype()),
        }
    }

    /// Row with every binding the cottage has, as the list query would bind it
    fn cottage_row(&self, cottage: &Iri) -> BindingRow {
        let mut row =
            BindingRow::from([(var::COTTAGE.to_string(), RdfTerm::uri(cottage.as_str()))]);
        let mut bind = |subject: &Iri, predicate: Vocab, variable: &str| {
            if let Some(term) = object(self.triples, subject, predicate) {
                row.insert(variable.to_string(), self.to_rdf(term));
            }
        };

        bind(cottage, Vocab::CottageId, var::COTTAGE_ID);
        bind(cottage, Vocab::Address, var::ADDRESS);
        bind(cottage, Vocab::ImageUrl, var::IMAGE_URL);
        bind(cottage, Vocab::Capacity, var::CAPACITY);
        bind(cottage, Vocab::NumberOfBedrooms, var::BEDROOMS);
        bind(cottage, Vocab::DistanceToLake, var::LAKE_DISTANCE);

        if let Some(Term::Iri(city)) = object(self.triples, cottage, Vocab::NearestCity) {
            bind(city, Vocab::CityName, var::CITY_NAME);
            bind(city, Vocab::DistanceToCity, var::CITY_DISTANCE);
        }
        row
    }

    fn booking_row(
        &self,
        booking: &Iri,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> BindingRow {
        let mut row =
            BindingRow::from([(var::BOOKING.to_string(), RdfTerm::uri(booking.as_str()))]);
        for (variable, date) in [(var::START_DATE, start), (var::END_DATE, end)] {
            if let Some(date) = date {
                row.insert(
                    variable.to_string(),
                    self.to_rdf(&Term::Literal(Literal::date(date))),
                );
            }
        }
        row
    }

    /// Same semantics as the availability query: every attribute must be
    /// bound and match, and no booking may overlap the window
    fn is_available(&self, cottage: &Iri, criteria: &AvailabilityQuery) -> bool {
        let row = self.cottage_row(cottage);
        if var::COTTAGE_ROW.iter().any(|v| !row.contains_key(*v)) {
            return false;
        }
        let attributes_match = decode_cottage(&row)
            .map(|c| criteria.matches(&c))
            .unwrap_or(false);

        attributes_match
            && !bookings_of(self.triples, cottage).any(|(_, start, end)| match (start, end) {
                (Some(start), Some(end)) => criteria.window.overlaps(start, end),
                _ => false,
            })
    }
}
