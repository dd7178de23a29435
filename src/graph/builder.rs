//! Entity graph construction
//!
//! Each parsed cue sheet mints one Release, ReleaseEvent and Record, plus
//! a Track, Signal, Performance and Performer per track, all keyed by the
//! sheet's media-root identifier component. Identical inputs always mint
//! identical IRIs, so re-runs are idempotent and external references stay
//! stable.
//!
//! Every public triple lands in the full graph and in exactly one
//! per-entity-kind sub-graph keyed by (kind, component). Track-to-file
//! facts land only in the private graph, which is kept apart from the
//! public set and emitted on request.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{error, warn};

use crate::cue::CueDocument;
use crate::musicbrainz::{valid_mbid, ReleaseEnrichment};
use crate::peaks::{self, PeakComputer, PeaksArtifact};
use crate::roots::{encode_segment, MediaRootResolver};

use super::vocab::{dc, dcterms, foaf, local, mb, mo, rdf, xsd};
use super::{Graph, Term, Triple};

static RE_FULL_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap());

/// The seven public entity kinds, used for sub-graph routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    Release,
    ReleaseEvent,
    Record,
    Track,
    Signal,
    Performance,
    Performer,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Release,
        EntityKind::ReleaseEvent,
        EntityKind::Record,
        EntityKind::Track,
        EntityKind::Signal,
        EntityKind::Performance,
        EntityKind::Performer,
    ];

    /// Namespace this kind's entity IRIs are minted under
    pub fn namespace(self) -> &'static str {
        match self {
            EntityKind::Release => local::RELEASE,
            EntityKind::ReleaseEvent => local::RELEASE_EVENT,
            EntityKind::Record => local::RECORD,
            EntityKind::Track => local::TRACK,
            EntityKind::Signal => local::SIGNAL,
            EntityKind::Performance => local::PERFORMANCE,
            EntityKind::Performer => local::PERFORMER,
        }
    }

    /// Directory name for this kind's published sub-graphs
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Release => "release",
            EntityKind::ReleaseEvent => "release-event",
            EntityKind::Record => "record",
            EntityKind::Track => "track",
            EntityKind::Signal => "signal",
            EntityKind::Performance => "performance",
            EntityKind::Performer => "performer",
        }
    }
}

/// Output of one build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphSet {
    /// Every public triple
    pub full: Graph,
    /// The same triples partitioned by entity kind and identifier component
    pub sub: BTreeMap<(EntityKind, String), Graph>,
    /// Track identity, number and raw local file path; never published
    /// alongside the public graphs
    pub private: Graph,
}

/// Peak computation wiring for audio availability facts
pub struct AudioOptions<'a> {
    /// Amplitude envelope capability
    pub computer: &'a dyn PeakComputer,
    /// Directory peak artifacts are written under, one subdirectory per
    /// identifier component
    pub artifacts_dir: &'a Path,
}

/// Accumulates entity triples for a batch of documents
pub struct GraphBuilder<'a> {
    resolver: &'a MediaRootResolver,
    audio: Option<AudioOptions<'a>>,
    set: GraphSet,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(resolver: &'a MediaRootResolver) -> Self {
        Self {
            resolver,
            audio: None,
            set: GraphSet::default(),
        }
    }

    /// Enable audio availability facts: envelopes computed through
    /// `computer`, artifacts written under `artifacts_dir`
    pub fn with_audio(mut self, computer: &'a dyn PeakComputer, artifacts_dir: &'a Path) -> Self {
        self.audio = Some(AudioOptions {
            computer,
            artifacts_dir,
        });
        self
    }

    /// Emit all triples for one document
    pub fn add_document(&mut self, doc: &CueDocument, enrichment: Option<&ReleaseEnrichment>) {
        let component = self.resolver.resolve(&doc.path).component;

        let release = entity_iri(EntityKind::Release, &component);
        let event = entity_iri(EntityKind::ReleaseEvent, &component);
        let record = entity_iri(EntityKind::Record, &component);

        self.emit(
            EntityKind::Release,
            &component,
            release.clone(),
            rdf::TYPE,
            Term::iri(mo::RELEASE),
        );
        self.emit(
            EntityKind::ReleaseEvent,
            &component,
            event.clone(),
            rdf::TYPE,
            Term::iri(mo::RELEASE_EVENT),
        );
        self.emit(
            EntityKind::Record,
            &component,
            record.clone(),
            rdf::TYPE,
            Term::iri(mo::RECORD),
        );
        self.emit(
            EntityKind::Release,
            &component,
            release.clone(),
            mo::RECORD_PROP,
            record.clone(),
        );
        self.emit(
            EntityKind::Release,
            &component,
            release.clone(),
            mo::RELEASE_EVENT_PROP,
            event.clone(),
        );

        if let Some(title) = present(doc.header.title.as_deref()) {
            self.emit(
                EntityKind::Release,
                &component,
                release.clone(),
                dc::TITLE,
                Term::string(title),
            );
        }

        // The label's own numbering from enrichment is authoritative;
        // CATALOGNUMBER is more specific than the CATALOG (media EAN/UPC)
        // fallback.
        let catalogue = [
            enrichment.and_then(|e| e.catalog_number.as_deref()),
            doc.header.catalog_number.as_deref(),
            doc.header.catalog.as_deref(),
        ]
        .into_iter()
        .find_map(present);
        if let Some(value) = catalogue {
            self.emit(
                EntityKind::Release,
                &component,
                release.clone(),
                mo::CATALOGUE_NUMBER,
                Term::string(value),
            );
        }

        if let Some(mbid) = doc.header.mb_album_id.as_deref().and_then(valid_mbid) {
            self.emit(
                EntityKind::Release,
                &component,
                release.clone(),
                mo::MUSICBRAINZ,
                Term::iri(format!("{}{}", mb::RELEASE, mbid)),
            );
        }

        let issued = present(enrichment.and_then(|e| e.date.as_deref()))
            .or_else(|| present(doc.header.date.as_deref()));
        if let Some(date) = issued {
            self.emit(
                EntityKind::ReleaseEvent,
                &component,
                event.clone(),
                dcterms::ISSUED,
                issued_term(date),
            );
            if let Some(year) = extract_year(date) {
                self.emit(
                    EntityKind::ReleaseEvent,
                    &component,
                    event.clone(),
                    dcterms::DATE,
                    Term::typed(year, xsd::G_YEAR),
                );
            }
        }

        self.emit(
            EntityKind::Record,
            &component,
            record.clone(),
            mo::TRACK_COUNT,
            Term::integer(doc.track_count() as i64),
        );

        for (&number, entry) in &doc.tracks {
            let track = track_iri(EntityKind::Track, &component, number);
            let signal = track_iri(EntityKind::Signal, &component, number);
            let performance = track_iri(EntityKind::Performance, &component, number);
            let performer = track_iri(EntityKind::Performer, &component, number);

            self.emit(
                EntityKind::Track,
                &component,
                track.clone(),
                rdf::TYPE,
                Term::iri(mo::TRACK),
            );
            self.emit(
                EntityKind::Signal,
                &component,
                signal.clone(),
                rdf::TYPE,
                Term::iri(mo::SIGNAL),
            );
            self.emit(
                EntityKind::Performance,
                &component,
                performance.clone(),
                rdf::TYPE,
                Term::iri(mo::PERFORMANCE),
            );
            self.emit(
                EntityKind::Performer,
                &component,
                performer.clone(),
                rdf::TYPE,
                Term::iri(mo::MUSIC_ARTIST),
            );

            self.emit(
                EntityKind::Record,
                &component,
                record.clone(),
                mo::TRACK_PROP,
                track.clone(),
            );
            self.emit(
                EntityKind::Release,
                &component,
                release.clone(),
                mo::PUBLICATION_OF,
                signal.clone(),
            );
            self.emit(
                EntityKind::Signal,
                &component,
                signal.clone(),
                mo::PUBLISHED_AS,
                track.clone(),
            );
            self.emit(
                EntityKind::Performance,
                &component,
                performance.clone(),
                mo::RECORDED_AS,
                signal.clone(),
            );
            self.emit(
                EntityKind::Performer,
                &component,
                performer.clone(),
                mo::PERFORMED,
                performance.clone(),
            );

            self.emit(
                EntityKind::Track,
                &component,
                track.clone(),
                mo::TRACK_NUMBER,
                Term::integer(i64::from(number)),
            );

            if let Some(title) = present(entry.title.as_deref()) {
                self.emit(
                    EntityKind::Track,
                    &component,
                    track.clone(),
                    dc::TITLE,
                    Term::string(title),
                );
            }
            if let Some(name) = present(entry.performer.as_deref()) {
                self.emit(
                    EntityKind::Performer,
                    &component,
                    performer.clone(),
                    foaf::NAME,
                    Term::string(name),
                );
            }
            if let Some(isrc) = present(entry.isrc.as_deref()) {
                self.emit(
                    EntityKind::Signal,
                    &component,
                    signal.clone(),
                    mo::ISRC,
                    Term::string(isrc),
                );
            }
            if let Some(mbid) = entry.mb_track_id.as_deref().and_then(valid_mbid) {
                self.emit(
                    EntityKind::Signal,
                    &component,
                    signal.clone(),
                    mo::MUSICBRAINZ,
                    Term::iri(format!("{}{}", mb::RECORDING, mbid)),
                );
            }
            if let Some(mbid) = entry.mb_artist_id.as_deref().and_then(valid_mbid) {
                self.emit(
                    EntityKind::Performer,
                    &component,
                    performer.clone(),
                    mo::MUSICBRAINZ,
                    Term::iri(format!("{}{}", mb::ARTIST, mbid)),
                );
            }
            if let Some(works) = enrichment.and_then(|e| e.works.get(&number)) {
                for work in works {
                    self.emit(
                        EntityKind::Performance,
                        &component,
                        performance.clone(),
                        mo::PERFORMANCE_OF,
                        Term::iri(format!("{}{}", mb::WORK, work)),
                    );
                }
            }

            if let Some(file_name) = entry.audio_file.as_deref() {
                self.attach_audio(&component, number, file_name, doc, &track);
                // The binding itself is the operational fact, whether or
                // not the file is currently on disk.
                let raw = doc.directory().join(file_name);
                self.set.private.add_triple(
                    track.clone(),
                    Term::iri(local::LOCAL_PATH),
                    Term::string(raw.to_string_lossy()),
                );
            }
            self.set.private.add_triple(
                track.clone(),
                Term::iri(mo::TRACK_NUMBER),
                Term::integer(i64::from(number)),
            );
        }
    }

    /// Canonicalize and return the accumulated graphs
    pub fn finish(mut self) -> GraphSet {
        self.set.full.canonicalize();
        for graph in self.set.sub.values_mut() {
            graph.canonicalize();
        }
        self.set.private.canonicalize();
        self.set
    }

    fn emit(&mut self, kind: EntityKind, component: &str, s: Term, p: &'static str, o: Term) {
        let triple = Triple::new(s, Term::iri(p), o);
        self.set.full.add(triple.clone());
        self.set
            .sub
            .entry((kind, component.to_string()))
            .or_default()
            .add(triple);
    }

    /// Attach availability facts for a track whose bound audio file exists
    ///
    /// The envelope is computed and its artifact written first; only a
    /// fully materialized artifact earns the track its availability and
    /// peaks references. Failures cost exactly those two facts.
    fn attach_audio(
        &mut self,
        component: &str,
        number: u32,
        file_name: &str,
        doc: &CueDocument,
        track: &Term,
    ) {
        let Some(audio) = &self.audio else {
            return;
        };
        let source = doc.directory().join(file_name);
        if !source.is_file() {
            warn!(
                track = number,
                file = %source.display(),
                "bound audio file not found, no availability emitted"
            );
            return;
        }
        let envelope = match audio.computer.compute(&source) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(
                    track = number,
                    file = %source.display(),
                    error = %e,
                    "peak computation failed, no availability emitted"
                );
                return;
            }
        };

        let stem = Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());
        let artifact_name = peaks::artifact_file_name(&encode_segment(&stem));
        let artifact_path = audio.artifacts_dir.join(component).join(&artifact_name);
        let artifact = PeaksArtifact {
            source: file_name.to_string(),
            window: envelope.window,
            peaks: envelope.peaks,
        };
        if let Err(e) = peaks::write_artifact(&artifact_path, &artifact) {
            error!(
                track = number,
                path = %artifact_path.display(),
                error = %e,
                "cannot write peaks artifact, no availability emitted"
            );
            return;
        }

        let item = format!("{}{}/{}", local::AUDIO, component, encode_segment(file_name));
        let peaks_ref = format!("{}{}/{}", local::AUDIO, component, artifact_name);
        self.emit(
            EntityKind::Track,
            component,
            track.clone(),
            mo::AVAILABLE_AS,
            Term::iri(item),
        );
        self.emit(
            EntityKind::Track,
            component,
            track.clone(),
            local::PEAKS,
            Term::iri(peaks_ref),
        );
    }
}

/// IRI for a document-scoped entity
fn entity_iri(kind: EntityKind, component: &str) -> Term {
    Term::iri(format!("{}{}", kind.namespace(), component))
}

/// IRI for a track-scoped entity
fn track_iri(kind: EntityKind, component: &str, number: u32) -> Term {
    Term::iri(format!("{}{}/{}", kind.namespace(), component, number))
}

/// A field value that carries content
///
/// Empty after trimming and all-zero placeholders (0000 dates, zeroed
/// catalog numbers) yield no fact at all.
fn present(value: Option<&str>) -> Option<&str> {
    let trimmed = value?.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '0') {
        None
    } else {
        Some(trimmed)
    }
}

/// Literal for dcterms:issued: typed xsd:date only for a fully specified,
/// valid calendar date; anything partial stays an untyped string
fn issued_term(date: &str) -> Term {
    if let Some(captures) = RE_FULL_DATE.captures(date) {
        if &captures[2] != "00"
            && &captures[3] != "00"
            && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
        {
            return Term::typed(date, xsd::DATE);
        }
    }
    Term::string(date)
}

/// Leading 4-digit year of a date string, unless it is the 0000 sentinel
fn extract_year(date: &str) -> Option<&str> {
    let year = date.get(0..4)?;
    if !year.bytes().all(|b| b.is_ascii_digit()) || year == "0000" {
        return None;
    }
    // a fifth digit would mean this is not a year at all
    if date.as_bytes().get(4).is_some_and(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::parse_cue;
    use crate::graph::Triple;
    use crate::peaks::{Envelope, PeakError};
    use std::fs;
    use std::path::PathBuf;

    const TWO_TRACK: &str = "TITLE \"Test Album\"\n\
        PERFORMER \"Test Artist\"\n\
        REM DATE 1957-09-15\n\
          TRACK 01 AUDIO\n\
            TITLE \"First Song\"\n\
            PERFORMER \"Test Artist\"\n\
            ISRC USRC19900001\n\
          TRACK 02 AUDIO\n\
            TITLE \"Second Song\"\n\
            PERFORMER \"Test Artist\"\n\
            ISRC USRC19900002\n";

    fn build(text: &str, enrichment: Option<&ReleaseEnrichment>) -> GraphSet {
        let doc = parse_cue(Path::new("/music/Artist/Album/album.cue"), text).unwrap();
        let resolver = MediaRootResolver::new(&[PathBuf::from("/music")]).unwrap();
        let mut builder = GraphBuilder::new(&resolver);
        builder.add_document(&doc, enrichment);
        builder.finish()
    }

    fn typed_subjects(graph: &Graph, class: &str) -> Vec<String> {
        graph
            .iter()
            .filter(|t| t.p.as_iri() == Some(rdf::TYPE) && t.o.as_iri() == Some(class))
            .filter_map(|t| t.s.as_iri().map(str::to_string))
            .collect()
    }

    fn objects_of(graph: &Graph, predicate: &str) -> Vec<Term> {
        graph
            .iter()
            .filter(|t| t.p.as_iri() == Some(predicate))
            .map(|t| t.o.clone())
            .collect()
    }

    #[test]
    fn two_track_sheet_mints_the_expected_entities() {
        let set = build(TWO_TRACK, None);

        assert_eq!(
            typed_subjects(&set.full, mo::RELEASE),
            vec!["https://data.cuegraph.org/release/Artist_Album"]
        );
        assert_eq!(typed_subjects(&set.full, mo::RECORD).len(), 1);
        assert_eq!(typed_subjects(&set.full, mo::RELEASE_EVENT).len(), 1);
        assert_eq!(typed_subjects(&set.full, mo::TRACK).len(), 2);
        assert_eq!(typed_subjects(&set.full, mo::SIGNAL).len(), 2);
        assert_eq!(typed_subjects(&set.full, mo::PERFORMANCE).len(), 2);
        assert_eq!(typed_subjects(&set.full, mo::MUSIC_ARTIST).len(), 2);

        assert_eq!(
            objects_of(&set.full, mo::TRACK_COUNT),
            vec![Term::integer(2)]
        );
        assert_eq!(objects_of(&set.full, mo::ISRC).len(), 2);
        // no enrichment, no works
        assert!(objects_of(&set.full, mo::PERFORMANCE_OF).is_empty());
    }

    #[test]
    fn relationship_schema_is_wired_per_track() {
        let set = build(TWO_TRACK, None);
        let release = "https://data.cuegraph.org/release/Artist_Album";
        let expected = [
            (release, mo::RECORD_PROP, "https://data.cuegraph.org/record/Artist_Album"),
            (release, mo::RELEASE_EVENT_PROP, "https://data.cuegraph.org/release-event/Artist_Album"),
            (release, mo::PUBLICATION_OF, "https://data.cuegraph.org/signal/Artist_Album/1"),
            ("https://data.cuegraph.org/record/Artist_Album", mo::TRACK_PROP, "https://data.cuegraph.org/track/Artist_Album/1"),
            ("https://data.cuegraph.org/signal/Artist_Album/1", mo::PUBLISHED_AS, "https://data.cuegraph.org/track/Artist_Album/1"),
            ("https://data.cuegraph.org/performance/Artist_Album/1", mo::RECORDED_AS, "https://data.cuegraph.org/signal/Artist_Album/1"),
            ("https://data.cuegraph.org/performer/Artist_Album/1", mo::PERFORMED, "https://data.cuegraph.org/performance/Artist_Album/1"),
        ];
        for (s, p, o) in expected {
            let triple = Triple::new(Term::iri(s), Term::iri(p), Term::iri(o));
            assert!(
                set.full.iter().any(|t| *t == triple),
                "missing {s} {p} {o}"
            );
        }
    }

    #[test]
    fn every_public_triple_routes_to_exactly_one_subgraph() {
        let set = build(TWO_TRACK, None);
        let mut union: Vec<Triple> = set
            .sub
            .values()
            .flat_map(|graph| graph.iter().cloned())
            .collect();
        union.sort();
        let full: Vec<Triple> = set.full.iter().cloned().collect();
        assert_eq!(union, full);
    }

    #[test]
    fn placeholder_fields_are_elided() {
        let text = "TITLE \"\"\n\
            CATALOG 0000000000000\n\
            REM DATE 0000\n\
              TRACK 01 AUDIO\n\
                TITLE \"Song\"\n";
        let set = build(text, None);
        // the empty release title is gone, the track title survives
        assert_eq!(
            objects_of(&set.full, dc::TITLE),
            vec![Term::string("Song")]
        );
        assert!(objects_of(&set.full, mo::CATALOGUE_NUMBER).is_empty());
        assert!(objects_of(&set.full, dcterms::ISSUED).is_empty());
        assert!(objects_of(&set.full, dcterms::DATE).is_empty());
    }

    #[test]
    fn full_dates_are_typed_and_partial_dates_stay_strings() {
        let full_date = build("REM DATE 1957-09-15\n  TRACK 01 AUDIO\n", None);
        assert_eq!(
            objects_of(&full_date.full, dcterms::ISSUED),
            vec![Term::typed("1957-09-15", xsd::DATE)]
        );
        assert_eq!(
            objects_of(&full_date.full, dcterms::DATE),
            vec![Term::typed("1957", xsd::G_YEAR)]
        );

        let zero_padded = build("REM DATE 1994-00-00\n  TRACK 01 AUDIO\n", None);
        assert_eq!(
            objects_of(&zero_padded.full, dcterms::ISSUED),
            vec![Term::string("1994-00-00")]
        );
        assert_eq!(
            objects_of(&zero_padded.full, dcterms::DATE),
            vec![Term::typed("1994", xsd::G_YEAR)]
        );

        let year_only = build("REM DATE 1994\n  TRACK 01 AUDIO\n", None);
        assert_eq!(
            objects_of(&year_only.full, dcterms::ISSUED),
            vec![Term::string("1994")]
        );

        let impossible = build("REM DATE 2001-02-31\n  TRACK 01 AUDIO\n", None);
        assert_eq!(
            objects_of(&impossible.full, dcterms::ISSUED),
            vec![Term::string("2001-02-31")]
        );
    }

    #[test]
    fn catalogue_preference_is_enriched_then_specific_then_media() {
        let text = "CATALOG 0724349697829\n\
            REM CATALOGNUMBER BLP-1577\n\
              TRACK 01 AUDIO\n";

        let header_only = build(text, None);
        assert_eq!(
            objects_of(&header_only.full, mo::CATALOGUE_NUMBER),
            vec![Term::string("BLP-1577")]
        );

        let enrichment = ReleaseEnrichment {
            release_mbid: "9f8f0a9a-54c8-43a9-9e63-7f06c6b8e686".to_string(),
            catalog_number: Some("BLP 1577".to_string()),
            ..ReleaseEnrichment::default()
        };
        let enriched = build(text, Some(&enrichment));
        assert_eq!(
            objects_of(&enriched.full, mo::CATALOGUE_NUMBER),
            vec![Term::string("BLP 1577")]
        );

        let media_only = build("CATALOG 0724349697829\n  TRACK 01 AUDIO\n", None);
        assert_eq!(
            objects_of(&media_only.full, mo::CATALOGUE_NUMBER),
            vec![Term::string("0724349697829")]
        );
    }

    #[test]
    fn musicbrainz_links_require_valid_ids() {
        let text = "REM MUSICBRAINZ_ALBUM_ID 9f8f0a9a-54c8-43a9-9e63-7f06c6b8e686\n\
              TRACK 01 AUDIO\n\
                REM MUSICBRAINZ_TRACK_ID not-a-uuid\n";
        let set = build(text, None);
        assert_eq!(
            objects_of(&set.full, mo::MUSICBRAINZ),
            vec![Term::iri(
                "https://musicbrainz.org/release/9f8f0a9a-54c8-43a9-9e63-7f06c6b8e686"
            )]
        );
    }

    #[test]
    fn enrichment_works_become_performance_links() {
        let mut enrichment = ReleaseEnrichment {
            release_mbid: "9f8f0a9a-54c8-43a9-9e63-7f06c6b8e686".to_string(),
            date: Some("1957-09-15".to_string()),
            ..ReleaseEnrichment::default()
        };
        enrichment.works.insert(
            1,
            vec![
                "7a42b2e1-5e34-4e29-9f74-1a7c6c3e8e41".to_string(),
                "0c3a5e9b-93a1-4a1f-86f4-32c23ed2fa77".to_string(),
            ],
        );
        let set = build(TWO_TRACK, Some(&enrichment));

        let links = objects_of(&set.full, mo::PERFORMANCE_OF);
        assert_eq!(links.len(), 2);
        assert!(links.contains(&Term::iri(
            "https://musicbrainz.org/work/7a42b2e1-5e34-4e29-9f74-1a7c6c3e8e41"
        )));
        // enrichment date wins over the header REM DATE
        assert_eq!(
            objects_of(&set.full, dcterms::ISSUED),
            vec![Term::typed("1957-09-15", xsd::DATE)]
        );
    }

    #[test]
    fn private_graph_holds_paths_and_numbering_only() {
        let text = "TITLE \"A\"\n\
            FILE \"side_a.flac\" WAVE\n\
              TRACK 01 AUDIO\n\
                TITLE \"One\"\n";
        let set = build(text, None);

        let paths = objects_of(&set.private, local::LOCAL_PATH);
        assert_eq!(
            paths,
            vec![Term::string("/music/Artist/Album/side_a.flac")]
        );
        assert_eq!(objects_of(&set.private, mo::TRACK_NUMBER).len(), 1);
        // the path never reaches the public side
        assert!(objects_of(&set.full, local::LOCAL_PATH).is_empty());
        // availability was not emitted either: no peaks capability wired
        assert!(objects_of(&set.full, mo::AVAILABLE_AS).is_empty());
    }

    #[test]
    fn building_twice_yields_identical_sets() {
        let a = build(TWO_TRACK, None);
        let b = build(TWO_TRACK, None);
        assert_eq!(a, b);
    }

    struct StubPeaks;

    impl PeakComputer for StubPeaks {
        fn compute(&self, _path: &Path) -> Result<Envelope, PeakError> {
            Ok(Envelope {
                window: 4,
                peaks: vec![0.5, 1.0],
            })
        }
    }

    struct FailingPeaks;

    impl PeakComputer for FailingPeaks {
        fn compute(&self, _path: &Path) -> Result<Envelope, PeakError> {
            Err(PeakError::Decode("stub failure".to_string()))
        }
    }

    fn build_with_audio(
        computer: &dyn PeakComputer,
        with_file: bool,
    ) -> (GraphSet, PathBuf, tempfile::TempDir) {
        let media = tempfile::tempdir().unwrap();
        let album = media.path().join("Band").join("Album");
        fs::create_dir_all(&album).unwrap();
        if with_file {
            fs::write(album.join("tone.wav"), b"not really audio").unwrap();
        }
        let cue_path = album.join("album.cue");
        let text = "FILE \"tone.wav\" WAVE\n  TRACK 01 AUDIO\n    TITLE \"One\"\n";
        let doc = parse_cue(&cue_path, text).unwrap();

        let resolver = MediaRootResolver::new(&[media.path().to_path_buf()]).unwrap();
        let artifacts = media.path().join("out").join("peaks");
        let mut builder = GraphBuilder::new(&resolver).with_audio(computer, &artifacts);
        builder.add_document(&doc, None);
        (builder.finish(), artifacts, media)
    }

    #[test]
    fn audio_availability_attaches_item_and_peaks_references() {
        let (set, artifacts, _media) = build_with_audio(&StubPeaks, true);

        assert_eq!(
            objects_of(&set.full, mo::AVAILABLE_AS),
            vec![Term::iri(
                "https://data.cuegraph.org/audio/Band_Album/tone.wav"
            )]
        );
        assert_eq!(
            objects_of(&set.full, local::PEAKS),
            vec![Term::iri(
                "https://data.cuegraph.org/audio/Band_Album/tone.peaks.json"
            )]
        );
        let artifact_path = artifacts.join("Band_Album").join("tone.peaks.json");
        assert!(artifact_path.exists());
        let artifact: PeaksArtifact =
            serde_json::from_str(&fs::read_to_string(artifact_path).unwrap()).unwrap();
        assert_eq!(artifact.source, "tone.wav");
        assert_eq!(artifact.peaks, vec![0.5, 1.0]);
    }

    #[test]
    fn missing_audio_file_emits_no_availability() {
        let (set, artifacts, _media) = build_with_audio(&StubPeaks, false);
        assert!(objects_of(&set.full, mo::AVAILABLE_AS).is_empty());
        assert!(objects_of(&set.full, local::PEAKS).is_empty());
        assert!(!artifacts.exists());
        // the private binding is still recorded
        assert_eq!(objects_of(&set.private, local::LOCAL_PATH).len(), 1);
    }

    #[test]
    fn failed_peak_computation_emits_no_availability() {
        let (set, artifacts, _media) = build_with_audio(&FailingPeaks, true);
        assert!(objects_of(&set.full, mo::AVAILABLE_AS).is_empty());
        assert!(objects_of(&set.full, local::PEAKS).is_empty());
        assert!(!artifacts.exists());
    }

    #[test]
    fn year_extraction_ignores_sentinels_and_non_years() {
        assert_eq!(extract_year("1957-09-15"), Some("1957"));
        assert_eq!(extract_year("1994"), Some("1994"));
        assert_eq!(extract_year("0000"), None);
        assert_eq!(extract_year("19571"), None);
        assert_eq!(extract_year("Sep 1957"), None);
        assert_eq!(extract_year("57"), None);
    }

    #[test]
    fn presence_filter_trims_and_rejects_zeros() {
        assert_eq!(present(Some("  Blue Train  ")), Some("Blue Train"));
        assert_eq!(present(Some("0724349697829")), Some("0724349697829"));
        assert_eq!(present(Some("0000")), None);
        assert_eq!(present(Some("   ")), None);
        assert_eq!(present(None), None);
    }
}
