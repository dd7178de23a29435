//! RDF vocabulary constants and publication namespaces
//!
//! Constants are organized by vocabulary:
//! - `rdf` - RDF vocabulary (http://www.w3.org/1999/02/22-rdf-syntax-ns#)
//! - `xsd` - XSD vocabulary (http://www.w3.org/2001/XMLSchema#)
//! - `mo` - Music Ontology (http://purl.org/ontology/mo/)
//! - `dc` / `dcterms` - Dublin Core elements and terms
//! - `foaf` - FOAF vocabulary
//! - `mb` - MusicBrainz entity page namespaces
//! - `local` - publication namespaces under the cuegraph data root

use super::Term;

/// RDF vocabulary constants
pub mod rdf {
    /// rdf:type IRI
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

    pub const NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
}

/// XSD vocabulary constants
pub mod xsd {
    /// xsd:string IRI
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

    /// xsd:integer IRI
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";

    /// xsd:date IRI
    pub const DATE: &str = "http://www.w3.org/2001/XMLSchema#date";

    /// xsd:gYear IRI
    pub const G_YEAR: &str = "http://www.w3.org/2001/XMLSchema#gYear";

    pub const NS: &str = "http://www.w3.org/2001/XMLSchema#";
}

/// Music Ontology vocabulary constants
pub mod mo {
    pub const NS: &str = "http://purl.org/ontology/mo/";

    // Classes
    pub const RELEASE: &str = "http://purl.org/ontology/mo/Release";
    pub const RELEASE_EVENT: &str = "http://purl.org/ontology/mo/ReleaseEvent";
    pub const RECORD: &str = "http://purl.org/ontology/mo/Record";
    pub const TRACK: &str = "http://purl.org/ontology/mo/Track";
    pub const SIGNAL: &str = "http://purl.org/ontology/mo/Signal";
    pub const PERFORMANCE: &str = "http://purl.org/ontology/mo/Performance";
    pub const MUSIC_ARTIST: &str = "http://purl.org/ontology/mo/MusicArtist";

    // Properties
    /// Release -> ReleaseEvent
    pub const RELEASE_EVENT_PROP: &str = "http://purl.org/ontology/mo/release_event";
    /// Release -> Record
    pub const RECORD_PROP: &str = "http://purl.org/ontology/mo/record";
    /// Record -> Track
    pub const TRACK_PROP: &str = "http://purl.org/ontology/mo/track";
    /// Record -> number of tracks
    pub const TRACK_COUNT: &str = "http://purl.org/ontology/mo/track_count";
    /// Track -> ordinal position on the record
    pub const TRACK_NUMBER: &str = "http://purl.org/ontology/mo/track_number";
    /// Release (manifestation) -> Signal (expression) it publishes
    pub const PUBLICATION_OF: &str = "http://purl.org/ontology/mo/publication_of";
    /// Signal -> Track carrying it
    pub const PUBLISHED_AS: &str = "http://purl.org/ontology/mo/published_as";
    /// Performance -> Signal captured from it
    pub const RECORDED_AS: &str = "http://purl.org/ontology/mo/recorded_as";
    /// Performance -> Work performed
    pub const PERFORMANCE_OF: &str = "http://purl.org/ontology/mo/performance_of";
    /// Performer -> Performance
    pub const PERFORMED: &str = "http://purl.org/ontology/mo/performed";
    /// Release/Record -> catalogue number issued by the label
    pub const CATALOGUE_NUMBER: &str = "http://purl.org/ontology/mo/catalogue_number";
    /// Signal -> ISRC code
    pub const ISRC: &str = "http://purl.org/ontology/mo/isrc";
    /// Manifestation -> media item it is available as
    pub const AVAILABLE_AS: &str = "http://purl.org/ontology/mo/available_as";
    /// Any music entity -> its MusicBrainz page
    pub const MUSICBRAINZ: &str = "http://purl.org/ontology/mo/musicbrainz";
}

/// Dublin Core elements 1.1
pub mod dc {
    pub const NS: &str = "http://purl.org/dc/elements/1.1/";

    pub const TITLE: &str = "http://purl.org/dc/elements/1.1/title";
}

/// Dublin Core terms
pub mod dcterms {
    pub const NS: &str = "http://purl.org/dc/terms/";

    pub const ISSUED: &str = "http://purl.org/dc/terms/issued";
    pub const DATE: &str = "http://purl.org/dc/terms/date";
}

/// FOAF vocabulary constants
pub mod foaf {
    pub const NS: &str = "http://xmlns.com/foaf/0.1/";

    pub const NAME: &str = "http://xmlns.com/foaf/0.1/name";
}

/// MusicBrainz entity page namespaces
///
/// Appending an MBID to one of these yields the public page IRI for
/// the corresponding MusicBrainz entity.
pub mod mb {
    pub const RELEASE: &str = "https://musicbrainz.org/release/";
    pub const ARTIST: &str = "https://musicbrainz.org/artist/";
    pub const RECORDING: &str = "https://musicbrainz.org/recording/";
    pub const WORK: &str = "https://musicbrainz.org/work/";
}

/// Publication namespaces minted by this tool
///
/// Entity namespaces sit directly under `ROOT` and are subject to branch
/// rebasing. `AUDIO` and `VOCAB` are branch-invariant: audio item and
/// vocabulary IRIs must stay identical across all published variants.
pub mod local {
    /// Publication root for all minted IRIs
    pub const ROOT: &str = "https://data.cuegraph.org/";

    pub const RELEASE: &str = "https://data.cuegraph.org/release/";
    pub const RELEASE_EVENT: &str = "https://data.cuegraph.org/release-event/";
    pub const RECORD: &str = "https://data.cuegraph.org/record/";
    pub const TRACK: &str = "https://data.cuegraph.org/track/";
    pub const SIGNAL: &str = "https://data.cuegraph.org/signal/";
    pub const PERFORMANCE: &str = "https://data.cuegraph.org/performance/";
    pub const PERFORMER: &str = "https://data.cuegraph.org/performer/";

    /// Branch-invariant namespace for audio items and peak artifacts
    pub const AUDIO: &str = "https://data.cuegraph.org/audio/";

    /// Branch-invariant namespace for local vocabulary terms
    pub const VOCAB: &str = "https://data.cuegraph.org/vocab/";

    /// Track -> amplitude peaks artifact
    pub const PEAKS: &str = "https://data.cuegraph.org/vocab/peaks";

    /// Track -> raw local file path (private graph only)
    pub const LOCAL_PATH: &str = "https://data.cuegraph.org/vocab/local_path";
}

/// Well-known prefixes for compact serialization (Turtle, N3, RDF/XML)
///
/// Kept sorted by prefix. The `cgv` prefix covers the local vocabulary
/// namespace; minted entity IRIs are always written expanded.
pub const PREFIXES: &[(&str, &str)] = &[
    ("cgv", local::VOCAB),
    ("dc", dc::NS),
    ("dcterms", dcterms::NS),
    ("foaf", foaf::NS),
    ("mo", mo::NS),
    ("rdf", rdf::NS),
    ("xsd", xsd::NS),
];

/// Split an IRI into (prefix, namespace, local name) against the
/// well-known prefix table
///
/// Returns None when the IRI is not under a known namespace or its local
/// name would not serialize as a valid prefixed name.
pub fn compact_iri(iri: &str) -> Option<(&'static str, &'static str, &str)> {
    for (prefix, ns) in PREFIXES {
        if let Some(local) = iri.strip_prefix(ns) {
            if !local.is_empty()
                && local
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return Some((prefix, ns, local));
            }
        }
    }
    None
}

/// Compact an IRI term against the well-known prefix table
pub fn compact(term: &Term) -> Option<(&'static str, &'static str, &str)> {
    term.as_iri().and_then(compact_iri)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compacts_known_namespaces() {
        assert_eq!(
            compact_iri(mo::TRACK_NUMBER),
            Some(("mo", mo::NS, "track_number"))
        );
        assert_eq!(compact_iri(rdf::TYPE), Some(("rdf", rdf::NS, "type")));
        assert_eq!(
            compact_iri(local::PEAKS),
            Some(("cgv", local::VOCAB, "peaks"))
        );
    }

    #[test]
    fn leaves_minted_entity_iris_expanded() {
        assert_eq!(compact_iri("https://data.cuegraph.org/release/Artist"), None);
        assert_eq!(compact_iri("https://musicbrainz.org/work/abc"), None);
    }

    #[test]
    fn rejects_unsafe_local_names() {
        // a slash in the local name would break prefixed-name syntax
        assert_eq!(compact_iri("http://purl.org/ontology/mo/a/b"), None);
    }
}
