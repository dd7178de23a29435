//! Entity graph model: terms, triples, graph containers
//!
//! The conversion pipeline builds graphs out of two term shapes only:
//! expanded IRIs and literals (plain or datatyped). Blank nodes never occur;
//! every entity minted from a cue sheet gets a stable IRI derived from its
//! media-root identifier component.

pub mod branch;
pub mod builder;
pub mod vocab;
pub mod write;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// An RDF term (subject, predicate, or object position)
///
/// # Invariants
///
/// - `Term::Iri` always contains an expanded IRI, never a prefixed form.
/// - The predicate position of a triple can only be `Term::Iri`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
    /// Full expanded IRI (e.g., "http://purl.org/ontology/mo/Release")
    Iri(String),

    /// Literal value, plain (xsd:string) when `datatype` is None
    Literal {
        value: String,
        datatype: Option<String>,
    },
}

impl Term {
    /// Create an IRI term from an expanded IRI string
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    /// Create a plain string literal
    pub fn string(value: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: None,
        }
    }

    /// Create a typed literal with an explicit datatype IRI
    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: Some(datatype.into()),
        }
    }

    /// Create an integer literal (xsd:integer)
    pub fn integer(value: i64) -> Self {
        Term::typed(value.to_string(), vocab::xsd::INTEGER)
    }

    /// Check if this is an IRI term
    pub fn is_iri(&self) -> bool {
        matches!(self, Term::Iri(_))
    }

    /// Check if this is a literal
    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal { .. })
    }

    /// Try to get as IRI string
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// Try to get literal components (value, datatype)
    pub fn as_literal(&self) -> Option<(&str, Option<&str>)> {
        match self {
            Term::Literal { value, datatype } => Some((value, datatype.as_deref())),
            _ => None,
        }
    }
}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Term {
    fn cmp(&self, other: &Self) -> Ordering {
        // Type ordering: Iri < Literal
        let type_ord = |t: &Term| -> u8 {
            match t {
                Term::Iri(_) => 0,
                Term::Literal { .. } => 1,
            }
        };

        match type_ord(self).cmp(&type_ord(other)) {
            Ordering::Equal => {}
            ord => return ord,
        }

        match (self, other) {
            (Term::Iri(a), Term::Iri(b)) => a.cmp(b),
            (
                Term::Literal {
                    value: v1,
                    datatype: d1,
                },
                Term::Literal {
                    value: v2,
                    datatype: d2,
                },
            ) => (d1, v1).cmp(&(d2, v2)),
            _ => Ordering::Equal,
        }
    }
}

impl fmt::Display for Term {
    /// N-Triples lexical form, with literal escaping applied
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{}>", iri),
            Term::Literal { value, datatype } => {
                write!(f, "\"{}\"", escape_literal(value))?;
                match datatype {
                    Some(dt) => write!(f, "^^<{}>", dt),
                    None => Ok(()),
                }
            }
        }
    }
}

/// Escape a literal value for N-Triples / Turtle output
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// A single subject-predicate-object statement
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    pub s: Term,
    pub p: Term,
    pub o: Term,
}

impl Triple {
    pub fn new(s: Term, p: Term, o: Term) -> Self {
        Self { s, p, o }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.s, self.p, self.o)
    }
}

/// A collection of RDF triples
///
/// Uses `Vec<Triple>` storage so builders can append freely; call
/// `canonicalize()` (sort + dedupe) before serializing for deterministic,
/// set-semantic output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Graph {
    triples: Vec<Triple>,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a triple to the graph
    pub fn add(&mut self, triple: Triple) {
        self.triples.push(triple);
    }

    /// Add a triple by components
    pub fn add_triple(&mut self, s: Term, p: Term, o: Term) {
        self.add(Triple::new(s, p, o));
    }

    /// Get the number of triples
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    /// Check if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Iterate over triples
    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Sort triples by SPO for deterministic output
    pub fn sort(&mut self) {
        self.triples.sort();
    }

    /// Sort and remove duplicate triples (set semantics)
    pub fn canonicalize(&mut self) {
        self.triples.sort();
        self.triples.dedup();
    }

    /// Get a reference to the triples
    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    /// Group triples by subject
    ///
    /// Returns an iterator yielding (subject_term, triples_for_subject).
    /// The graph should be sorted first for consistent grouping.
    pub fn group_by_subject(&self) -> SubjectGroups<'_> {
        SubjectGroups {
            triples: &self.triples,
            index: 0,
        }
    }

    /// Get all unique subjects in the graph
    pub fn subjects(&self) -> Vec<&Term> {
        let mut subjects: Vec<&Term> = self.triples.iter().map(|t| &t.s).collect();
        subjects.sort();
        subjects.dedup();
        subjects
    }

    /// Collect the distinct predicate/class namespaces used, keyed by prefix
    ///
    /// Only namespaces from the well-known prefix table appear; the entity
    /// namespaces under the publication root are always written expanded.
    pub fn used_prefixes(&self) -> BTreeMap<&'static str, &'static str> {
        let mut used = BTreeMap::new();
        let mut note = |term: &Term| {
            if let Some((prefix, ns, _)) = vocab::compact(term) {
                used.insert(prefix, ns);
            }
            if let Term::Literal {
                datatype: Some(dt), ..
            } = term
            {
                if let Some((prefix, ns, _)) = vocab::compact_iri(dt) {
                    used.insert(prefix, ns);
                }
            }
        };
        for t in &self.triples {
            note(&t.p);
            note(&t.o);
        }
        used
    }
}

impl IntoIterator for Graph {
    type Item = Triple;
    type IntoIter = std::vec::IntoIter<Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.into_iter()
    }
}

impl<'a> IntoIterator for &'a Graph {
    type Item = &'a Triple;
    type IntoIter = std::slice::Iter<'a, Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}

impl FromIterator<Triple> for Graph {
    fn from_iter<T: IntoIterator<Item = Triple>>(iter: T) -> Self {
        Graph {
            triples: iter.into_iter().collect(),
        }
    }
}

impl Extend<Triple> for Graph {
    fn extend<T: IntoIterator<Item = Triple>>(&mut self, iter: T) {
        self.triples.extend(iter);
    }
}

/// Iterator over triples grouped by subject
///
/// Assumes the graph is sorted.
pub struct SubjectGroups<'a> {
    triples: &'a [Triple],
    index: usize,
}

impl<'a> Iterator for SubjectGroups<'a> {
    type Item = (&'a Term, &'a [Triple]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.triples.len() {
            return None;
        }

        let start = self.index;
        let subject = &self.triples[start].s;

        while self.index < self.triples.len() && self.triples[self.index].s == *subject {
            self.index += 1;
        }

        Some((subject, &self.triples[start..self.index]))
    }
}
