//! Batch conversion pipeline
//!
//! Discovery, parse, enrichment, graph construction, serialization.
//! Failures are contained at the narrowest scope that leaves the rest of
//! the batch meaningful: a bad line costs nothing, a bad document is
//! skipped, a failed enrichment costs its optional facts, and a failed
//! artifact costs that one file. Only configuration problems (no media
//! roots, unusable output directory, invalid inputs) abort the run.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::cue::{parse_cue, CueDocument};
use crate::error::{Error, Result};
use crate::graph::branch::rebase;
use crate::graph::builder::{GraphBuilder, GraphSet};
use crate::graph::write::write_all_formats;
use crate::musicbrainz::{
    enrich_release, valid_mbid, MusicBrainzClient, RateLimiter, ReleaseEnrichment, RATE_LIMIT_MS,
};
use crate::peaks::SymphoniaPeakComputer;
use crate::roots::MediaRootResolver;

/// Name of the always-produced unbranched output variant
pub const MAIN_VARIANT: &str = "main";

/// Counters reported after a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Cue sheets discovered from the inputs
    pub discovered: usize,
    /// Documents parsed and built into the graph set
    pub converted: usize,
    /// Documents dropped by read or parse failures
    pub skipped: usize,
    /// Documents that got MusicBrainz facts merged in
    pub enriched: usize,
    /// Triples in the full public graph
    pub public_triples: usize,
    /// Serialization and artifact files written
    pub files_written: usize,
}

/// Convert every discovered cue sheet and write all outputs
pub async fn run(config: &Config) -> Result<RunSummary> {
    let resolver = MediaRootResolver::new(&config.roots)?;
    fs::create_dir_all(&config.out)?;

    let cue_paths = discover(&config.inputs, config.recursive)?;
    info!(count = cue_paths.len(), "discovered cue sheets");

    let mut documents = Vec::new();
    let mut skipped = 0usize;
    for path in &cue_paths {
        match read_document(path) {
            Ok(doc) => documents.push(doc),
            Err(e) => {
                error!(path = %path.display(), error = %e, "skipping document");
                skipped += 1;
            }
        }
    }

    warn_on_component_collisions(&resolver, &documents);

    let enrichments = if config.enrich {
        fetch_enrichments(&documents).await
    } else {
        BTreeMap::new()
    };

    let peaks_dir = config.out.join(MAIN_VARIANT).join("peaks");
    let computer = SymphoniaPeakComputer::default();
    let mut builder = GraphBuilder::new(&resolver).with_audio(&computer, &peaks_dir);
    for doc in &documents {
        builder.add_document(doc, enrichments.get(&doc.path));
    }
    let set = builder.finish();

    let mut files_written = write_variant(&set, &config.out, MAIN_VARIANT, "");
    for branch in &config.branches {
        files_written += write_variant(&set, &config.out, branch, branch);
        files_written += copy_tree(&peaks_dir, &config.out.join(branch).join("peaks"));
    }

    if let Some(prefix) = &config.private {
        files_written += write_all_formats(&set.private, prefix).len();
    }

    Ok(RunSummary {
        discovered: cue_paths.len(),
        converted: documents.len(),
        skipped,
        enriched: enrichments.len(),
        public_triples: set.full.len(),
        files_written,
    })
}

/// Collect cue sheet paths from the configured inputs
///
/// Recursive inputs are walked in sorted order so batches are
/// deterministic. Without --recursive every input must name an existing
/// .cue file; anything else aborts the run before any output is written.
fn discover(inputs: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    if recursive {
        for input in inputs {
            if !input.exists() {
                warn!(path = %input.display(), "input path does not exist, skipping");
                continue;
            }
            for entry in WalkDir::new(input).sort_by_file_name() {
                match entry {
                    Ok(entry) if entry.file_type().is_file() && is_cue(entry.path()) => {
                        found.push(entry.path().to_path_buf());
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "cannot access entry during scan"),
                }
            }
        }
    } else {
        for input in inputs {
            if !is_cue(input) {
                return Err(Error::InvalidInput(format!(
                    "{} is not a cue file; use --recursive to scan directories",
                    input.display()
                )));
            }
            if !input.is_file() {
                return Err(Error::InvalidInput(format!(
                    "cue file not found: {}",
                    input.display()
                )));
            }
            found.push(input.clone());
        }
    }
    found.sort();
    found.dedup();
    Ok(found)
}

fn is_cue(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("cue"))
}

/// Read and parse one cue sheet
///
/// Cue sheets in the wild are frequently latin-1; bytes that are not
/// valid UTF-8 are decoded lossily rather than failing the document.
fn read_document(path: &Path) -> Result<CueDocument> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(parse_cue(path, &text)?)
}

/// Surface identifier component collisions before they silently merge
///
/// Documents resolving to the same component mint the same entity IRIs.
/// The derivation is kept as-is for identifier stability; the collision
/// is made loud here instead.
fn warn_on_component_collisions(resolver: &MediaRootResolver, documents: &[CueDocument]) {
    let mut seen: BTreeMap<String, &Path> = BTreeMap::new();
    for doc in documents {
        let component = resolver.resolve(&doc.path).component;
        match seen.get(component.as_str()) {
            Some(first) => warn!(
                component = %component,
                first = %first.display(),
                second = %doc.path.display(),
                "identifier component collision, entities will merge"
            ),
            None => {
                seen.insert(component, doc.path.as_path());
            }
        }
    }
}

/// Fetch MusicBrainz facts for every document carrying a valid release id
///
/// One rate gate is shared by every request of the run. All failures are
/// contained: a document that cannot be enriched still converts with its
/// local facts only.
async fn fetch_enrichments(documents: &[CueDocument]) -> BTreeMap<PathBuf, ReleaseEnrichment> {
    let mut enrichments = BTreeMap::new();
    let limiter = Arc::new(RateLimiter::new(RATE_LIMIT_MS));
    let client = match MusicBrainzClient::new(limiter) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "cannot construct MusicBrainz client, enrichment disabled");
            return enrichments;
        }
    };

    for doc in documents {
        let Some(raw) = doc.header.mb_album_id.as_deref() else {
            debug!(path = %doc.path.display(), "no release id in header, nothing to enrich");
            continue;
        };
        let Some(mbid) = valid_mbid(raw) else {
            warn!(
                path = %doc.path.display(),
                id = raw,
                "malformed MusicBrainz release id, skipping enrichment"
            );
            continue;
        };
        match enrich_release(&client, mbid, doc).await {
            Ok(enrichment) => {
                debug!(path = %doc.path.display(), mbid, "enriched");
                enrichments.insert(doc.path.clone(), enrichment);
            }
            Err(e) => warn!(
                path = %doc.path.display(),
                mbid,
                error = %e,
                "enrichment failed, converting without it"
            ),
        }
    }
    enrichments
}

/// Write one output variant: the full graph plus every per-kind sub-graph
fn write_variant(set: &GraphSet, out: &Path, variant: &str, branch: &str) -> usize {
    let dir = out.join(variant);
    let mut written = write_all_formats(&rebase(&set.full, branch), &dir.join("full")).len();
    for ((kind, component), graph) in &set.sub {
        let stem = if component.is_empty() {
            "_"
        } else {
            component.as_str()
        };
        let prefix = dir.join(kind.as_str()).join(stem);
        written += write_all_formats(&rebase(graph, branch), &prefix).len();
    }
    written
}

/// Copy computed peak artifacts into a branch output directory
///
/// Envelopes are branch-invariant, so they are copied, never recomputed.
fn copy_tree(src: &Path, dst: &Path) -> usize {
    if !src.is_dir() {
        return 0;
    }
    let mut copied = 0;
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "cannot traverse peak artifacts");
                continue;
            }
        };
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            if let Err(e) = fs::create_dir_all(&target) {
                error!(dir = %target.display(), error = %e, "cannot create artifact directory");
            }
        } else if let Err(e) = fs::copy(entry.path(), &target) {
            error!(path = %target.display(), error = %e, "cannot copy peak artifact");
        } else {
            copied += 1;
        }
    }
    copied
}
