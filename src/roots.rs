//! Media root resolution
//!
//! Every cue sheet is attributed to one configured media root by longest
//! path-prefix match against the sheet's parent directory. The directory
//! path relative to that root becomes the document's identifier component,
//! the single string all entity IRIs for the document are minted from.
//!
//! Comparison is lexical: paths are normalized to slash-separated absolute
//! form (`.`/`..` segments folded) without consulting the filesystem, so
//! resolution is deterministic even for paths that no longer exist.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Characters kept verbatim in identifier components. Everything else is
/// percent-encoded, matching URL path-segment quoting.
const SEGMENT_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'-')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Error)]
pub enum RootError {
    /// Resolution cannot proceed without at least one candidate root
    #[error("no candidate media roots configured")]
    NoRoots,
}

/// Outcome of attributing a document to a media root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootMatch {
    /// The matched (or fallback) root, in normalized form
    pub root: PathBuf,
    /// URI-safe identifier component for the document's directory
    pub component: String,
}

/// Longest-prefix matcher over the configured media roots
#[derive(Debug, Clone)]
pub struct MediaRootResolver {
    /// Normalized candidate roots, in configuration order
    roots: Vec<String>,
}

impl MediaRootResolver {
    /// Build a resolver from the configured candidate roots
    ///
    /// An empty candidate list is a configuration error and fails the run.
    pub fn new(candidates: &[PathBuf]) -> Result<Self, RootError> {
        if candidates.is_empty() {
            return Err(RootError::NoRoots);
        }
        Ok(Self {
            roots: candidates.iter().map(|p| canonical_form(p)).collect(),
        })
    }

    /// Attribute a document to a root and derive its identifier component
    ///
    /// The longest root that is a path prefix of the document's parent
    /// directory wins. When none matches, the first configured root is
    /// used as a fallback and the component is derived from the full
    /// directory path, so the document still converts.
    pub fn resolve(&self, document: &Path) -> RootMatch {
        let dir = canonical_form(document.parent().unwrap_or_else(|| Path::new("")));

        let mut best: Option<&String> = None;
        for root in &self.roots {
            if is_path_prefix(root, &dir) && best.map_or(true, |b| root.len() > b.len()) {
                best = Some(root);
            }
        }

        match best {
            Some(root) => {
                let rel = dir[root.len()..].trim_start_matches('/');
                RootMatch {
                    root: PathBuf::from(root),
                    component: encode_segment(rel),
                }
            }
            None => {
                warn!(
                    directory = %dir,
                    fallback = %self.roots[0],
                    "document outside all media roots, using first root"
                );
                RootMatch {
                    root: PathBuf::from(&self.roots[0]),
                    component: encode_segment(dir.trim_start_matches('/')),
                }
            }
        }
    }
}

/// True when `root` is `dir` itself or an ancestor directory of it
fn is_path_prefix(root: &str, dir: &str) -> bool {
    if dir == root {
        return true;
    }
    if root.ends_with('/') {
        dir.starts_with(root)
    } else {
        dir.starts_with(root) && dir.as_bytes().get(root.len()) == Some(&b'/')
    }
}

/// Normalize a path to slash-separated absolute form
///
/// Relative paths are anchored at the current working directory; `.` and
/// `..` segments are folded lexically, symlinks are not resolved.
pub fn canonical_form(path: &Path) -> String {
    let owned;
    let path = if path.is_absolute() {
        path
    } else {
        owned = std::env::current_dir().unwrap_or_default().join(path);
        &owned
    };

    let mut absolute = false;
    let mut parts: Vec<String> = Vec::new();
    for comp in path.components() {
        match comp {
            Component::Prefix(p) => parts.push(p.as_os_str().to_string_lossy().into_owned()),
            Component::RootDir => absolute = true,
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop();
            }
            Component::Normal(s) => parts.push(s.to_string_lossy().into_owned()),
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// Turn a relative directory path into a URI-safe identifier component
///
/// Path separators and spaces become underscores first, then anything
/// outside the unreserved set is percent-encoded. Distinct directories can
/// collapse to the same component (`a_b` vs `a/b`); callers detect and
/// warn on such collisions rather than rename.
pub fn encode_segment(raw: &str) -> String {
    let substituted: String = raw
        .chars()
        .map(|c| if c == '/' || c == ' ' { '_' } else { c })
        .collect();
    utf8_percent_encode(&substituted, SEGMENT_ENCODE).to_string()
}
