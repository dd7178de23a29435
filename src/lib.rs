//! cuegraph converts audio cue sheets into Music Ontology entity graphs.
//!
//! Each cue sheet becomes a small constellation of entities (release,
//! release event, record, tracks, signals, performances, performers)
//! minted under a stable namespace derived from the sheet's location
//! beneath a configured media root. Facts are optionally enriched from
//! MusicBrainz, amplitude envelopes are computed for available audio, and
//! the resulting graphs are serialized in five RDF formats per requested
//! namespace branch.

pub mod config;
pub mod cue;
pub mod error;
pub mod graph;
pub mod musicbrainz;
pub mod peaks;
pub mod pipeline;
pub mod roots;

pub use config::{Args, Config};
pub use error::{Error, Result};
pub use pipeline::RunSummary;
