//! Cue sheet parsing
//!
//! A cue sheet is read line by line into a [`CueDocument`]: one header
//! record for disc-level fields plus one record per `TRACK ... AUDIO`
//! entry. Parsing is total over well-formed text; unrecognized lines are
//! skipped and logged rather than failing the document.

mod document;
mod parser;

pub use document::{CueDocument, CueHeader, TrackRecord};
pub use parser::{parse_cue, ParseError};
