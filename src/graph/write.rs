//! Graph serialization
//!
//! Every graph is published in five formats as co-located sibling files
//! sharing a path prefix and differing only by extension. Graphs are
//! canonicalized (sorted, deduplicated) before rendering, so the bytes
//! are deterministic for a given graph.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

use super::vocab::{self, rdf};
use super::{escape_literal, Graph, Term};

/// Serialization formats emitted for every graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfFormat {
    Turtle,
    RdfXml,
    JsonLd,
    N3,
    NTriples,
}

impl RdfFormat {
    /// All formats, in emission order
    pub const ALL: [RdfFormat; 5] = [
        RdfFormat::Turtle,
        RdfFormat::RdfXml,
        RdfFormat::JsonLd,
        RdfFormat::N3,
        RdfFormat::NTriples,
    ];

    /// File extension for this format
    pub fn extension(self) -> &'static str {
        match self {
            RdfFormat::Turtle => "ttl",
            RdfFormat::RdfXml => "rdf",
            RdfFormat::JsonLd => "jsonld",
            RdfFormat::N3 => "n3",
            RdfFormat::NTriples => "nt",
        }
    }
}

/// Serialize a graph to a string in one format
pub fn format_graph(graph: &Graph, format: RdfFormat) -> String {
    let mut canonical = graph.clone();
    canonical.canonicalize();
    render(&canonical, format)
}

/// Write the graph in all five formats as `<prefix>.<ext>` siblings
///
/// The extension is appended rather than substituted, so dots inside the
/// prefix (possible in an identifier component) are preserved. A format
/// that fails to write is logged and skipped; the rest are still
/// attempted. Returns the paths actually written.
pub fn write_all_formats(graph: &Graph, prefix: &Path) -> Vec<PathBuf> {
    if let Some(parent) = prefix.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!(dir = %parent.display(), error = %e, "cannot create output directory");
                return Vec::new();
            }
        }
    }

    let mut canonical = graph.clone();
    canonical.canonicalize();

    let mut written = Vec::new();
    for format in RdfFormat::ALL {
        let path = PathBuf::from(format!("{}.{}", prefix.display(), format.extension()));
        match fs::write(&path, render(&canonical, format)) {
            Ok(()) => written.push(path),
            Err(e) => {
                error!(path = %path.display(), error = %e, "cannot write graph serialization");
            }
        }
    }
    written
}

/// Render an already-canonicalized graph
///
/// The N3 rendering is the Turtle rendering under another extension; the
/// graphs here use no N3-only constructs.
fn render(graph: &Graph, format: RdfFormat) -> String {
    match format {
        RdfFormat::NTriples => n_triples(graph),
        RdfFormat::Turtle | RdfFormat::N3 => turtle(graph),
        RdfFormat::RdfXml => rdf_xml(graph),
        RdfFormat::JsonLd => json_ld(graph),
    }
}

fn n_triples(graph: &Graph) -> String {
    let mut out = String::new();
    for triple in graph.iter() {
        out.push_str(&triple.to_string());
        out.push('\n');
    }
    out
}

fn turtle(graph: &Graph) -> String {
    let mut out = String::new();
    for (prefix, ns) in graph.used_prefixes() {
        out.push_str(&format!("@prefix {prefix}: <{ns}> .\n"));
    }
    for (subject, triples) in graph.group_by_subject() {
        out.push('\n');
        for (i, triple) in triples.iter().enumerate() {
            if i == 0 {
                out.push_str(&turtle_term(subject));
            } else {
                out.push_str(" ;\n   ");
            }
            out.push(' ');
            out.push_str(&turtle_predicate(&triple.p));
            out.push(' ');
            out.push_str(&turtle_term(&triple.o));
        }
        out.push_str(" .\n");
    }
    out
}

fn turtle_predicate(p: &Term) -> String {
    if p.as_iri() == Some(rdf::TYPE) {
        "a".to_string()
    } else {
        turtle_term(p)
    }
}

/// A term in Turtle syntax, compacted against the prefix table when possible
fn turtle_term(term: &Term) -> String {
    match term {
        Term::Iri(iri) => match vocab::compact_iri(iri) {
            Some((prefix, _, name)) => format!("{prefix}:{name}"),
            None => format!("<{iri}>"),
        },
        Term::Literal { value, datatype } => {
            let quoted = format!("\"{}\"", escape_literal(value));
            match datatype {
                Some(dt) => match vocab::compact_iri(dt) {
                    Some((prefix, _, name)) => format!("{quoted}^^{prefix}:{name}"),
                    None => format!("{quoted}^^<{dt}>"),
                },
                None => quoted,
            }
        }
    }
}

fn rdf_xml(graph: &Graph) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!("<rdf:RDF xmlns:rdf=\"{}\"", rdf::NS));
    for (prefix, ns) in graph.used_prefixes() {
        if prefix != "rdf" {
            out.push_str(&format!(" xmlns:{prefix}=\"{ns}\""));
        }
    }
    out.push_str(">\n");
    for (subject, triples) in graph.group_by_subject() {
        let about = subject.as_iri().unwrap_or_default();
        out.push_str(&format!(
            "  <rdf:Description rdf:about=\"{}\">\n",
            xml_escape(about)
        ));
        for triple in triples {
            out.push_str(&property_element(&triple.p, &triple.o));
        }
        out.push_str("  </rdf:Description>\n");
    }
    out.push_str("</rdf:RDF>\n");
    out
}

/// One RDF/XML property element
///
/// Predicates outside the prefix table carry an inline namespace
/// declaration; a predicate whose IRI cannot be split into a namespace
/// and an XML-safe local name cannot be expressed and is skipped.
fn property_element(p: &Term, o: &Term) -> String {
    let Some(iri) = p.as_iri() else {
        return String::new();
    };
    let (name, inline_ns) = match vocab::compact_iri(iri) {
        Some((prefix, _, local_name)) => (format!("{prefix}:{local_name}"), None),
        None => match split_iri(iri) {
            Some((ns, local_name)) => (format!("x:{local_name}"), Some(ns)),
            None => {
                warn!(predicate = iri, "predicate has no XML-safe name, dropped from RDF/XML");
                return String::new();
            }
        },
    };
    let ns_attr = inline_ns
        .map(|ns| format!(" xmlns:x=\"{}\"", xml_escape(ns)))
        .unwrap_or_default();
    match o {
        Term::Iri(target) => format!(
            "    <{name}{ns_attr} rdf:resource=\"{}\"/>\n",
            xml_escape(target)
        ),
        Term::Literal { value, datatype } => {
            let dt_attr = datatype
                .as_ref()
                .map(|dt| format!(" rdf:datatype=\"{}\"", xml_escape(dt)))
                .unwrap_or_default();
            format!(
                "    <{name}{ns_attr}{dt_attr}>{}</{name}>\n",
                xml_escape(value)
            )
        }
    }
}

/// Split an IRI into namespace and XML-safe local name at the last '#' or '/'
fn split_iri(iri: &str) -> Option<(&str, &str)> {
    let split = iri.rfind(|c| c == '#' || c == '/')? + 1;
    let (ns, name) = iri.split_at(split);
    let mut chars = name.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.') {
        return None;
    }
    Some((ns, name))
}

fn xml_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Expanded JSON-LD: one node object per subject, rdf:type lifted to @type
fn json_ld(graph: &Graph) -> String {
    use serde_json::{json, Map, Value};

    let mut nodes = Vec::new();
    for (subject, triples) in graph.group_by_subject() {
        let mut node = Map::new();
        node.insert(
            "@id".to_string(),
            json!(subject.as_iri().unwrap_or_default()),
        );
        let mut types = Vec::new();
        for triple in triples {
            if triple.p.as_iri() == Some(rdf::TYPE) {
                if let Some(class) = triple.o.as_iri() {
                    types.push(json!(class));
                    continue;
                }
            }
            let Some(predicate) = triple.p.as_iri() else {
                continue;
            };
            let object = match &triple.o {
                Term::Iri(iri) => json!({ "@id": iri }),
                Term::Literal {
                    value,
                    datatype: Some(dt),
                } => json!({ "@value": value, "@type": dt }),
                Term::Literal {
                    value,
                    datatype: None,
                } => json!({ "@value": value }),
            };
            if let Value::Array(values) = node
                .entry(predicate.to_string())
                .or_insert_with(|| Value::Array(Vec::new()))
            {
                values.push(object);
            }
        }
        if !types.is_empty() {
            node.insert("@type".to_string(), Value::Array(types));
        }
        nodes.push(Value::Object(node));
    }
    let mut text =
        serde_json::to_string_pretty(&Value::Array(nodes)).unwrap_or_else(|_| "[]".to_string());
    text.push('\n');
    text
}
