//! Namespace branching
//!
//! A branch is an alternate publication prefix: the same facts re-minted
//! with the branch name inserted as a path segment directly after the
//! namespace root, so parallel variants of one graph can be published
//! side by side. Audio item IRIs and vocabulary terms are branch-invariant
//! because every variant must reference the same artifacts and mean the
//! same things by them.

use super::vocab::local;
use super::{Graph, Term, Triple};

/// Rewrite every locally-minted IRI onto the branch namespace
///
/// Pure with respect to the input: attribute values never change, only
/// identifier namespaces. An empty branch name is the identity.
pub fn rebase(graph: &Graph, branch: &str) -> Graph {
    if branch.is_empty() {
        return graph.clone();
    }
    graph
        .iter()
        .map(|t| {
            Triple::new(
                rebase_term(&t.s, branch),
                rebase_term(&t.p, branch),
                rebase_term(&t.o, branch),
            )
        })
        .collect()
}

fn rebase_term(term: &Term, branch: &str) -> Term {
    match term {
        Term::Iri(iri) => match rebased_iri(iri, branch) {
            Some(rewritten) => Term::Iri(rewritten),
            None => term.clone(),
        },
        literal => literal.clone(),
    }
}

/// The rewritten IRI, or None when the term is not branch-sensitive
fn rebased_iri(iri: &str, branch: &str) -> Option<String> {
    if iri.starts_with(local::AUDIO) || iri.starts_with(local::VOCAB) {
        return None;
    }
    let rest = iri.strip_prefix(local::ROOT)?;
    Some(format!("{}{}/{}", local::ROOT, branch, rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::vocab::{dc, mo, rdf};

    fn sample() -> Graph {
        let mut graph = Graph::new();
        graph.add_triple(
            Term::iri("https://data.cuegraph.org/release/Artist_Album"),
            Term::iri(rdf::TYPE),
            Term::iri(mo::RELEASE),
        );
        graph.add_triple(
            Term::iri("https://data.cuegraph.org/release/Artist_Album"),
            Term::iri(mo::RECORD_PROP),
            Term::iri("https://data.cuegraph.org/record/Artist_Album"),
        );
        graph.add_triple(
            Term::iri("https://data.cuegraph.org/release/Artist_Album"),
            Term::iri(dc::TITLE),
            Term::string("Test Album"),
        );
        graph.add_triple(
            Term::iri("https://data.cuegraph.org/track/Artist_Album/1"),
            Term::iri(mo::AVAILABLE_AS),
            Term::iri("https://data.cuegraph.org/audio/Artist_Album/tone.wav"),
        );
        graph.add_triple(
            Term::iri("https://data.cuegraph.org/track/Artist_Album/1"),
            Term::iri(local::PEAKS),
            Term::iri("https://data.cuegraph.org/audio/Artist_Album/tone.peaks.json"),
        );
        graph
    }

    #[test]
    fn empty_branch_is_identity() {
        let graph = sample();
        assert_eq!(rebase(&graph, ""), graph);
    }

    #[test]
    fn branch_name_becomes_a_path_segment_after_the_root() {
        let rebased = rebase(&sample(), "staging");
        assert!(rebased.iter().any(|t| {
            t.s.as_iri() == Some("https://data.cuegraph.org/staging/release/Artist_Album")
        }));
        assert!(rebased.iter().any(|t| {
            t.o.as_iri() == Some("https://data.cuegraph.org/staging/record/Artist_Album")
        }));
        // nothing in the output still carries an unbranched entity IRI
        assert!(!rebased.iter().any(|t| {
            t.s.as_iri()
                .is_some_and(|iri| iri.starts_with("https://data.cuegraph.org/release/"))
        }));
    }

    #[test]
    fn audio_and_vocabulary_iris_are_invariant() {
        let rebased = rebase(&sample(), "staging");
        assert!(rebased.iter().any(|t| {
            t.o.as_iri() == Some("https://data.cuegraph.org/audio/Artist_Album/tone.wav")
        }));
        assert!(rebased
            .iter()
            .any(|t| t.p.as_iri() == Some(local::PEAKS)));
    }

    #[test]
    fn external_iris_and_literals_pass_through() {
        let rebased = rebase(&sample(), "staging");
        assert!(rebased.iter().any(|t| t.o.as_iri() == Some(mo::RELEASE)));
        assert!(rebased
            .iter()
            .any(|t| t.o.as_literal() == Some(("Test Album", None))));
    }

    #[test]
    fn rebasing_does_not_disturb_the_source_graph() {
        let graph = sample();
        let before = graph.clone();
        let _ = rebase(&graph, "staging");
        assert_eq!(graph, before);
    }

    #[test]
    fn distinct_branches_never_share_entity_iris() {
        let a = rebase(&sample(), "staging");
        let b = rebase(&sample(), "prod");
        let a_subjects: Vec<_> = a.subjects().into_iter().cloned().collect();
        assert!(b
            .subjects()
            .into_iter()
            .all(|subject| !a_subjects.contains(subject)));
    }
}
