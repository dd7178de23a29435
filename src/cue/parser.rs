//! Line-oriented cue sheet parser
//!
//! The parser walks the sheet once, in one of two states: header (before
//! the first `TRACK` command) and body. Each line is tried against the
//! patterns valid for the current state, in priority order; the first
//! match wins. Lines matching nothing are skipped and logged at debug
//! level, so a sheet full of `FLAGS`, `INDEX 00` and ripper chatter still
//! parses.
//!
//! `FILE` commands fill a one-slot buffer. The next `TRACK` command takes
//! the buffered name as its audio source; a later `FILE` before any
//! `TRACK` simply replaces the slot.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

use super::document::CueDocument;
use super::TrackRecord;

static RE_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*FILE\s+"([^"]*)""#).unwrap());
static RE_TRACK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*TRACK\s+(\d+)\s+AUDIO\b").unwrap());

// Header patterns, in match priority order. The MusicBrainz remarks must
// be tried before the generic REM pattern or they would be swallowed by it.
static RE_REM_ALBUM_ARTIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*REM\s+MUSICBRAINZ_ALBUM_ARTIST_ID\s+(.+)$").unwrap());
static RE_REM_ALBUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*REM\s+MUSICBRAINZ_ALBUM_ID\s+(\S+)").unwrap());
static RE_REM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*REM\s+(\S+)\s+(.+)$").unwrap());
static RE_CATALOG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*CATALOG\s+(.+)$").unwrap());
static RE_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*TITLE\s+(.+)$").unwrap());
static RE_PERFORMER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*PERFORMER\s+(.+)$").unwrap());

// Body-only patterns.
static RE_ISRC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*ISRC\s+(\S+)").unwrap());
static RE_PREGAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*PREGAP\s+(\S+)").unwrap());
static RE_INDEX01: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*INDEX\s+01\s+(\S+)").unwrap());
static RE_REM_TRACK_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*REM\s+MUSICBRAINZ_TRACK_ID\s+(\S+)").unwrap());
static RE_REM_ARTIST_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*REM\s+MUSICBRAINZ_ARTIST_ID\s+(\S+)").unwrap());

/// Error aborting the parse of a single cue sheet
///
/// Only structurally hopeless input fails the parse; unrecognized lines
/// never do. A failed document is skipped by the pipeline, the batch
/// continues.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A TRACK command whose number does not fit a u32
    #[error("invalid track number {value:?} on line {line}")]
    InvalidTrackNumber { line: usize, value: String },
}

/// Parse the text of one cue sheet read from `path`
///
/// The path is stored on the document so audio file names can later be
/// resolved relative to it; this function does not touch the filesystem.
pub fn parse_cue(path: &Path, text: &str) -> Result<CueDocument, ParseError> {
    let mut doc = CueDocument::new(path);
    // Track currently being filled; None while still in the header.
    let mut current: Option<u32> = None;
    // One-slot FILE buffer, consumed by the next TRACK command.
    let mut pending_file: Option<String> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_end();
        if line.trim().is_empty() {
            continue;
        }

        // Structural commands are recognized in both states.
        if let Some(c) = RE_FILE.captures(line) {
            pending_file = Some(c[1].to_string());
            continue;
        }
        if let Some(c) = RE_TRACK.captures(line) {
            let number: u32 =
                c[1].parse()
                    .map_err(|_| ParseError::InvalidTrackNumber {
                        line: line_no,
                        value: c[1].to_string(),
                    })?;
            let record = TrackRecord {
                audio_file: pending_file.take(),
                ..TrackRecord::default()
            };
            if record.audio_file.is_none() {
                debug!(track = number, line = line_no, "track opened without a FILE binding");
            }
            if doc.tracks.insert(number, record).is_some() {
                warn!(track = number, line = line_no, "duplicate track number, replacing earlier record");
            }
            current = Some(number);
            continue;
        }

        match current {
            None => parse_header_line(&mut doc, line, line_no),
            Some(number) => parse_body_line(&mut doc, number, line, line_no),
        }
    }

    if let Some(file) = pending_file {
        warn!(file = %file, path = %path.display(), "FILE command not followed by any TRACK, binding dropped");
    }

    Ok(doc)
}

fn parse_header_line(doc: &mut CueDocument, line: &str, line_no: usize) {
    if let Some(c) = RE_REM_ALBUM_ARTIST.captures(line) {
        doc.header.mb_album_artist_ids = unquote(c[1].trim())
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    } else if let Some(c) = RE_REM_ALBUM.captures(line) {
        doc.header.mb_album_id = Some(c[1].to_string());
    } else if let Some(c) = RE_REM.captures(line) {
        doc.header.set_remark(&c[1], unquote(c[2].trim()));
    } else if let Some(c) = RE_CATALOG.captures(line) {
        doc.header.catalog = Some(unquote(c[1].trim()).to_string());
    } else if let Some(c) = RE_TITLE.captures(line) {
        doc.header.title = Some(unquote(c[1].trim()).to_string());
    } else if let Some(c) = RE_PERFORMER.captures(line) {
        doc.header.performer = Some(unquote(c[1].trim()).to_string());
    } else {
        debug!(line = line_no, text = line, "skipping unrecognized header line");
    }
}

fn parse_body_line(doc: &mut CueDocument, number: u32, line: &str, line_no: usize) {
    // The record for `number` was inserted when the TRACK line matched.
    let Some(track) = doc.tracks.get_mut(&number) else {
        return;
    };
    if let Some(c) = RE_REM_TRACK_ID.captures(line) {
        track.mb_track_id = Some(c[1].to_string());
    } else if let Some(c) = RE_REM_ARTIST_ID.captures(line) {
        track.mb_artist_id = Some(c[1].to_string());
    } else if let Some(c) = RE_TITLE.captures(line) {
        track.title = Some(unquote(c[1].trim()).to_string());
    } else if let Some(c) = RE_PERFORMER.captures(line) {
        track.performer = Some(unquote(c[1].trim()).to_string());
    } else if let Some(c) = RE_ISRC.captures(line) {
        track.isrc = Some(c[1].to_string());
    } else if let Some(c) = RE_PREGAP.captures(line) {
        track.pregap = Some(c[1].to_string());
    } else if let Some(c) = RE_INDEX01.captures(line) {
        track.index = Some(c[1].to_string());
    } else {
        debug!(line = line_no, text = line, "skipping unrecognized track line");
    }
}

/// Strip one pair of surrounding double quotes, if present
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(text: &str) -> CueDocument {
        parse_cue(&PathBuf::from("/music/test/album.cue"), text).unwrap()
    }

    const TWO_TRACK: &str = r#"REM GENRE Jazz
REM DATE 1957
REM DISCID 12345678
REM COMMENT "ExactAudioCopy v1.0b3"
CATALOG 0724349697829
TITLE "Test Album"
PERFORMER "Test Artist"
FILE "side-a.wav" WAVE
  TRACK 01 AUDIO
    TITLE "First Song"
    PERFORMER "Test Artist"
    ISRC USRC19900001
    INDEX 01 00:00:00
  TRACK 02 AUDIO
    TITLE "Second Song"
    PREGAP 00:02:00
    INDEX 01 05:31:44
"#;

    #[test]
    fn parses_header_fields() {
        let doc = parse(TWO_TRACK);
        assert_eq!(doc.header.title.as_deref(), Some("Test Album"));
        assert_eq!(doc.header.performer.as_deref(), Some("Test Artist"));
        assert_eq!(doc.header.genre.as_deref(), Some("Jazz"));
        assert_eq!(doc.header.date.as_deref(), Some("1957"));
        assert_eq!(doc.header.disc_id.as_deref(), Some("12345678"));
        assert_eq!(doc.header.comment.as_deref(), Some("ExactAudioCopy v1.0b3"));
        assert_eq!(doc.header.catalog.as_deref(), Some("0724349697829"));
    }

    #[test]
    fn parses_two_tracks_in_order() {
        let doc = parse(TWO_TRACK);
        assert_eq!(doc.track_count(), 2);
        let numbers: Vec<u32> = doc.tracks.keys().copied().collect();
        assert_eq!(numbers, vec![1, 2]);

        let t1 = &doc.tracks[&1];
        assert_eq!(t1.title.as_deref(), Some("First Song"));
        assert_eq!(t1.isrc.as_deref(), Some("USRC19900001"));
        assert_eq!(t1.index.as_deref(), Some("00:00:00"));

        let t2 = &doc.tracks[&2];
        assert_eq!(t2.title.as_deref(), Some("Second Song"));
        assert_eq!(t2.pregap.as_deref(), Some("00:02:00"));
        assert!(t2.isrc.is_none());
    }

    #[test]
    fn file_binds_to_next_track_only() {
        let doc = parse(TWO_TRACK);
        assert_eq!(doc.tracks[&1].audio_file.as_deref(), Some("side-a.wav"));
        assert!(doc.tracks[&2].audio_file.is_none());
    }

    #[test]
    fn later_file_replaces_buffer() {
        let doc = parse(
            "FILE \"old.wav\" WAVE\nFILE \"new.wav\" WAVE\n  TRACK 01 AUDIO\n",
        );
        assert_eq!(doc.tracks[&1].audio_file.as_deref(), Some("new.wav"));
    }

    #[test]
    fn per_track_files_bind_each_track() {
        let doc = parse(
            "FILE \"01.flac\" WAVE\n  TRACK 01 AUDIO\nFILE \"02.flac\" WAVE\n  TRACK 02 AUDIO\n",
        );
        assert_eq!(doc.tracks[&1].audio_file.as_deref(), Some("01.flac"));
        assert_eq!(doc.tracks[&2].audio_file.as_deref(), Some("02.flac"));
    }

    #[test]
    fn dangling_file_binds_nothing() {
        let doc = parse("  TRACK 01 AUDIO\nFILE \"tail.wav\" WAVE\n");
        assert!(doc.tracks[&1].audio_file.is_none());
    }

    #[test]
    fn musicbrainz_remarks_take_priority_over_generic_rem() {
        let doc = parse(
            "REM MUSICBRAINZ_ALBUM_ID 9f8f0a9a-54c8-43a9-9e63-7f06c6b8e686\n\
             REM MUSICBRAINZ_ALBUM_ARTIST_ID aaa; bbb ;\n",
        );
        assert_eq!(
            doc.header.mb_album_id.as_deref(),
            Some("9f8f0a9a-54c8-43a9-9e63-7f06c6b8e686")
        );
        assert_eq!(doc.header.mb_album_artist_ids, vec!["aaa", "bbb"]);
        assert!(doc.header.extra.is_empty());
    }

    #[test]
    fn unknown_remarks_land_in_extra() {
        let doc = parse("REM REPLAYGAIN_ALBUM_GAIN -7.64 dB\nREM CATALOGNUMBER CDP 7 46095 2\n");
        assert_eq!(
            doc.header.extra.get("replaygain_album_gain").map(String::as_str),
            Some("-7.64 dB")
        );
        assert_eq!(doc.header.catalog_number.as_deref(), Some("CDP 7 46095 2"));
    }

    #[test]
    fn track_level_musicbrainz_ids() {
        let doc = parse(
            "  TRACK 01 AUDIO\n\
             REM MUSICBRAINZ_TRACK_ID 11111111-2222-3333-4444-555555555555\n\
             REM MUSICBRAINZ_ARTIST_ID 66666666-7777-8888-9999-000000000000\n",
        );
        let t = &doc.tracks[&1];
        assert_eq!(
            t.mb_track_id.as_deref(),
            Some("11111111-2222-3333-4444-555555555555")
        );
        assert_eq!(
            t.mb_artist_id.as_deref(),
            Some("66666666-7777-8888-9999-000000000000")
        );
    }

    #[test]
    fn unrecognized_lines_are_skipped() {
        let doc = parse(
            "TITLE \"A\"\n\
               TRACK 01 AUDIO\n\
                 FLAGS DCP\n\
                 INDEX 00 00:00:00\n\
                 TITLE \"B\"\n",
        );
        assert_eq!(doc.header.title.as_deref(), Some("A"));
        assert_eq!(doc.tracks[&1].title.as_deref(), Some("B"));
    }

    #[test]
    fn data_tracks_are_not_records() {
        let doc = parse("  TRACK 01 AUDIO\n  TRACK 02 MODE1/2352\n");
        assert_eq!(doc.track_count(), 1);
    }

    #[test]
    fn oversized_track_number_fails_the_file() {
        let err = parse_cue(
            &PathBuf::from("x.cue"),
            "  TRACK 99999999999 AUDIO\n",
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::InvalidTrackNumber { line: 1, .. }));
    }

    #[test]
    fn parse_is_deterministic() {
        let a = parse(TWO_TRACK);
        let b = parse(TWO_TRACK);
        assert_eq!(a, b);
    }
}
