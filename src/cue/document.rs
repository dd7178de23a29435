//! Parsed cue sheet model

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Disc-level fields collected from the header section of a cue sheet
///
/// All fields are optional; cue sheets in the wild omit most of them.
/// Values are stored verbatim (after quote stripping), including
/// placeholder values like `0000000000000`. Placeholder suppression
/// happens at graph-building time, not here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueHeader {
    /// Album title from the `TITLE` command
    pub title: Option<String>,
    /// Album artist from the `PERFORMER` command
    pub performer: Option<String>,
    /// Media catalog number (typically EAN/UPC) from the `CATALOG` command
    pub catalog: Option<String>,
    /// Label catalogue number from `REM CATALOGNUMBER`
    pub catalog_number: Option<String>,
    /// `REM GENRE`
    pub genre: Option<String>,
    /// `REM DATE`, usually a year but sometimes a full date
    pub date: Option<String>,
    /// `REM COMMENT`, usually the ripper signature
    pub comment: Option<String>,
    /// `REM DISCID` (CDDB disc id)
    pub disc_id: Option<String>,
    /// `REM DISCNUMBER`
    pub disc_number: Option<String>,
    /// `REM TOTALDISCS`
    pub total_discs: Option<String>,
    /// `REM MUSICBRAINZ_ALBUM_ID`, the release MBID used for enrichment
    pub mb_album_id: Option<String>,
    /// `REM MUSICBRAINZ_ALBUM_ARTIST_ID`, split on `;` into one or more ids
    pub mb_album_artist_ids: Vec<String>,
    /// Remaining `REM <KEY> <value>` pairs, keyed by lowercased key
    pub extra: BTreeMap<String, String>,
}

impl CueHeader {
    /// Route a generic `REM <key> <value>` pair into the header
    ///
    /// Known keys land in their dedicated fields; anything else is kept
    /// in `extra` under the lowercased key.
    pub(crate) fn set_remark(&mut self, key: &str, value: &str) {
        let value = value.to_string();
        match key.to_ascii_lowercase().as_str() {
            "genre" => self.genre = Some(value),
            "date" => self.date = Some(value),
            "comment" => self.comment = Some(value),
            "discid" => self.disc_id = Some(value),
            "discnumber" => self.disc_number = Some(value),
            "totaldiscs" => self.total_discs = Some(value),
            "catalognumber" => self.catalog_number = Some(value),
            other => {
                self.extra.insert(other.to_string(), value);
            }
        }
    }
}

/// Per-track fields collected from one `TRACK ... AUDIO` block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackRecord {
    /// Track title
    pub title: Option<String>,
    /// Track artist
    pub performer: Option<String>,
    /// ISRC code
    pub isrc: Option<String>,
    /// `PREGAP` timestamp, kept verbatim
    pub pregap: Option<String>,
    /// `INDEX 01` timestamp, kept verbatim
    pub index: Option<String>,
    /// `REM MUSICBRAINZ_TRACK_ID` (a recording MBID)
    pub mb_track_id: Option<String>,
    /// `REM MUSICBRAINZ_ARTIST_ID`
    pub mb_artist_id: Option<String>,
    /// Audio file name bound from the most recent `FILE` command
    pub audio_file: Option<String>,
}

/// One parsed cue sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueDocument {
    /// Path the document was read from
    pub path: PathBuf,
    /// Disc-level header fields
    pub header: CueHeader,
    /// Track records keyed by track number, iteration is ascending
    pub tracks: BTreeMap<u32, TrackRecord>,
}

impl CueDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            header: CueHeader::default(),
            tracks: BTreeMap::new(),
        }
    }

    /// Directory containing the cue sheet; audio file names resolve
    /// relative to this.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}
