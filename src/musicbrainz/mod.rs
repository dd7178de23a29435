//! MusicBrainz bibliographic enrichment
//!
//! Two read-only surfaces are consulted: the linked-data release document
//! (per-track work references) and the JSON web service (release dates,
//! catalogue numbers, recording-level work relations as a fallback). All
//! requests flow through a single shared rate gate.
//!
//! Enrichment is best-effort. Failures are logged and the affected
//! document or track simply converts without bibliographic facts.

pub mod client;
pub mod matching;

pub use client::{LodRelease, LodTrack, MbError, MusicBrainzClient, RateLimiter, RATE_LIMIT_MS};
pub use matching::{enrich_release, ReleaseEnrichment, TITLE_SIMILARITY_THRESHOLD};

/// Validate a raw MBID field, returning the trimmed id when it is a
/// well-formed UUID
pub fn valid_mbid(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    uuid::Uuid::parse_str(trimmed).ok().map(|_| trimmed)
}
