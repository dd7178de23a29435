//! Matching local tracks against MusicBrainz and assembling enrichment
//!
//! The linked-data release document is the primary work source: its tracks
//! carry composite positions and direct work references. Position matches
//! are disambiguated by fuzzy title similarity. When the primary source
//! has no work for a matched track (or no track at the position at all),
//! the web service recording's work relations are consulted instead.

use std::collections::BTreeMap;
use strsim::normalized_levenshtein;
use tracing::{debug, warn};

use super::client::{LodRelease, LodTrack, MbError, MbRelease, MusicBrainzClient};
use crate::cue::CueDocument;

/// Minimum similarity, on a 0-100 scale, for a fuzzy title match
pub const TITLE_SIMILARITY_THRESHOLD: f64 = 90.0;

/// Bibliographic facts resolved for one release
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseEnrichment {
    /// The release MBID the facts were fetched for
    pub release_mbid: String,
    /// Release date, possibly partial
    pub date: Option<String>,
    /// First catalogue number attached by a label
    pub catalog_number: Option<String>,
    /// Work MBIDs per local track number; absent number means no work found
    pub works: BTreeMap<u32, Vec<String>>,
}

/// Similarity of two titles on a 0-100 scale
pub fn title_similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b) * 100.0
}

/// Resolve enrichment for one document's release MBID
///
/// Both sources are fetched independently; losing one degrades the result,
/// losing both fails enrichment for the document. Per-track resolution
/// failures only cost that track its works.
pub async fn enrich_release(
    client: &MusicBrainzClient,
    mbid: &str,
    doc: &CueDocument,
) -> Result<ReleaseEnrichment, MbError> {
    let lod = match client.release_document(mbid).await {
        Ok(release) => Some(release),
        Err(e) => {
            warn!(mbid = %mbid, error = %e, "release document fetch failed");
            None
        }
    };
    let lookup = match client.release_lookup(mbid).await {
        Ok(release) => Some(release),
        Err(e) => {
            warn!(mbid = %mbid, error = %e, "release lookup failed");
            None
        }
    };
    if lod.is_none() && lookup.is_none() {
        return Err(MbError::Unavailable(mbid.to_string()));
    }

    let mut enrichment = ReleaseEnrichment {
        release_mbid: mbid.to_string(),
        ..ReleaseEnrichment::default()
    };
    if let Some(release) = &lookup {
        enrichment.date = release.date.clone();
        enrichment.catalog_number = release
            .label_info
            .iter()
            .find_map(|li| li.catalog_number.clone());
    }

    for (number, track) in &doc.tracks {
        let works = resolve_works(
            client,
            lod.as_ref(),
            lookup.as_ref(),
            *number,
            track.title.as_deref(),
        )
        .await;
        if !works.is_empty() {
            enrichment.works.insert(*number, works);
        }
    }

    Ok(enrichment)
}

/// Work MBIDs for one local track, primary source first
async fn resolve_works(
    client: &MusicBrainzClient,
    lod: Option<&LodRelease>,
    lookup: Option<&MbRelease>,
    number: u32,
    local_title: Option<&str>,
) -> Vec<String> {
    if let Some(lod) = lod {
        match select_track(&lod.tracks, number, local_title) {
            TrackMatch::Matched(track) if !track.work_ids.is_empty() => {
                if track.work_ids.len() > 1 {
                    warn!(
                        track = number,
                        works = track.work_ids.len(),
                        "multiple direct work references, linking all"
                    );
                }
                return track.work_ids.clone();
            }
            // A candidate existed but title filtering rejected them all;
            // treat the track as unmatched rather than guessing.
            TrackMatch::Eliminated => return Vec::new(),
            TrackMatch::Matched(_) | TrackMatch::NoPosition => {}
        }
    }

    let Some(lookup) = lookup else {
        return Vec::new();
    };
    let Some(recording) = recording_at_position(lookup, number) else {
        debug!(track = number, "no recording at this position in the release lookup");
        return Vec::new();
    };
    // The secondary source is less specific, so only its first work
    // relation is taken.
    match client.recording_works(&recording).await {
        Ok(works) => works.into_iter().next().map(|w| vec![w.id]).unwrap_or_default(),
        Err(e) => {
            warn!(track = number, error = %e, "recording work lookup failed");
            Vec::new()
        }
    }
}

/// Outcome of matching one local track number against the document tracks
#[derive(Debug)]
pub(crate) enum TrackMatch<'a> {
    /// No external track carries this position
    NoPosition,
    /// Position candidates existed but none survived the title filter
    Eliminated,
    Matched(&'a LodTrack),
}

/// Select the external track for a local track number
///
/// Positions compare as strings on the trailing segment of the composite
/// form ("2.13" matches local track 13). Multiple survivors fall back to
/// fuzzy title similarity; remaining ties keep the first candidate.
pub(crate) fn select_track<'a>(
    tracks: &'a [LodTrack],
    number: u32,
    local_title: Option<&str>,
) -> TrackMatch<'a> {
    let wanted = number.to_string();
    let candidates: Vec<&LodTrack> = tracks
        .iter()
        .filter(|t| t.number.as_deref().map(trailing_number) == Some(wanted.as_str()))
        .collect();

    match candidates.len() {
        0 => TrackMatch::NoPosition,
        1 => TrackMatch::Matched(candidates[0]),
        _ => {
            let Some(local_title) = local_title else {
                warn!(
                    track = number,
                    candidates = candidates.len(),
                    "ambiguous position with no local title, keeping first candidate"
                );
                return TrackMatch::Matched(candidates[0]);
            };
            let close: Vec<&LodTrack> = candidates
                .iter()
                .filter(|t| {
                    t.title
                        .as_deref()
                        .map_or(false, |title| {
                            title_similarity(title, local_title) >= TITLE_SIMILARITY_THRESHOLD
                        })
                })
                .copied()
                .collect();
            match close.len() {
                0 => {
                    warn!(
                        track = number,
                        title = local_title,
                        "no position candidate close enough in title"
                    );
                    TrackMatch::Eliminated
                }
                1 => TrackMatch::Matched(close[0]),
                _ => {
                    warn!(
                        track = number,
                        title = local_title,
                        survivors = close.len(),
                        "multiple candidates close enough in title, keeping first"
                    );
                    TrackMatch::Matched(close[0])
                }
            }
        }
    }
}

/// Trailing segment of a composite "disc.track" position string
fn trailing_number(position: &str) -> &str {
    position.rsplit('.').next().unwrap_or(position)
}

/// First recording occupying the given track position in the lookup
fn recording_at_position(release: &MbRelease, number: u32) -> Option<String> {
    for medium in &release.media {
        for track in &medium.tracks {
            if track.position == Some(number) {
                return track.recording.as_ref().map(|r| r.id.clone());
            }
        }
    }
    None
}
