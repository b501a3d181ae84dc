//! Boundary-truncation recovery: hits cut off by the end of a target
//! sequence are rescored under truncated interpretations and reported
//! with the interpretation that explains them best.

use covsearch::cm::TruncMode;
use covsearch::pipeline::search;

use super::helpers::{base_config, embed, hairpin_model, target, HAIRPIN_SEQ};

#[test]
fn hit_cut_at_the_3prime_boundary_is_reported_as_truncated() {
    let cm = hairpin_model();
    let cfg = base_config();
    // The last three residues of the hairpin fall off the sequence end.
    let cut = &HAIRPIN_SEQ[..HAIRPIN_SEQ.len() - 3];
    let raw = embed(cut, 40, 0);
    let seqs = vec![target("cut3", 0, &raw)];
    let results = search(&cm, &seqs, &cfg).unwrap();
    assert!(!results.hits.is_empty(), "truncated hit lost");
    let h = &results.hits[0];
    assert_eq!(h.trunc, TruncMode::Three);
    assert_eq!(h.end, raw.len(), "hit should reach the sequence end");
    assert!(results.stats.residues_research_trunc > 0);
}

#[test]
fn interior_hits_are_never_flagged_truncated() {
    let cm = hairpin_model();
    let cfg = base_config();
    let seqs = vec![target("mid", 0, &embed(HAIRPIN_SEQ, 40, 40))];
    let results = search(&cm, &seqs, &cfg).unwrap();
    assert!(!results.hits.is_empty());
    for h in &results.hits {
        assert_eq!(h.trunc, TruncMode::None);
    }
}

#[test]
fn truncation_candidates_are_mutually_exclusive() {
    // A window can touch at most the ends it actually abuts.
    assert_eq!(TruncMode::candidates(false, false), vec![TruncMode::None]);
    assert_eq!(
        TruncMode::candidates(true, false),
        vec![TruncMode::None, TruncMode::Five]
    );
    assert_eq!(
        TruncMode::candidates(false, true),
        vec![TruncMode::None, TruncMode::Three]
    );
    assert_eq!(
        TruncMode::candidates(true, true),
        vec![
            TruncMode::None,
            TruncMode::Five,
            TruncMode::Three,
            TruncMode::Both
        ]
    );
}

#[test]
fn truncated_search_is_idempotent() {
    let cm = hairpin_model();
    let cfg = base_config();
    let cut = &HAIRPIN_SEQ[..HAIRPIN_SEQ.len() - 4];
    let seqs = vec![target("cut3", 0, &embed(cut, 50, 0))];
    let a = search(&cm, &seqs, &cfg).unwrap();
    let b = search(&cm, &seqs, &cfg).unwrap();
    assert_eq!(a.hits.len(), b.hits.len());
    for (x, y) in a.hits.iter().zip(&b.hits) {
        assert_eq!(x.trunc, y.trunc);
        assert_eq!((x.start, x.end), (y.start, y.end));
        assert_eq!(x.bit_score, y.bit_score);
        assert_eq!(x.e_value, y.e_value);
    }
    assert_eq!(
        a.stats.residues_research_trunc,
        b.stats.residues_research_trunc
    );
}
