//! End-to-end cascade behavior over small planted-hit databases.

use covsearch::config::StrandMode;
use covsearch::pipeline::search;
use covsearch::report::render_report;
use covsearch::sequence::Strand;

use super::helpers::{base_config, embed, hairpin_model, target, two_stem_model, HAIRPIN_SEQ, TWO_STEM_SEQ};

#[test]
fn ranked_hits_come_out_in_evalue_order() {
    let cm = hairpin_model();
    let cfg = base_config();
    // One perfect copy, one weakened copy (one loop residue mutated),
    // one decoy.
    let weakened = b"GGGCGGCAACAGCCGCCC";
    let seqs = vec![
        target("decoy", 0, &embed(b"ACGUACGUACGUACGUACGU", 30, 30)),
        target("weak", 1, &embed(weakened, 30, 30)),
        target("strong", 2, &embed(HAIRPIN_SEQ, 30, 30)),
    ];
    let results = search(&cm, &seqs, &cfg).unwrap();
    assert!(results.hits.len() >= 2, "expected both planted copies");
    for pair in results.hits.windows(2) {
        assert!(pair[0].e_value <= pair[1].e_value);
    }
    assert_eq!(results.hits[0].seq_id, "strong");
    // The strong hit scores better than the weakened one.
    let strong = results.hits.iter().find(|h| h.seq_id == "strong").unwrap();
    let weak = results.hits.iter().find(|h| h.seq_id == "weak").unwrap();
    assert!(strong.bit_score > weak.bit_score);
}

#[test]
fn identical_output_for_one_two_and_eight_threads() {
    let cm = hairpin_model();
    let mut seqs = Vec::new();
    for i in 0..10u32 {
        let flank = 15 + 11 * i as usize;
        seqs.push(target(&format!("s{}", i), i, &embed(HAIRPIN_SEQ, flank, 40)));
    }
    let mut cfg = base_config();
    cfg.strands = StrandMode::Both;

    let mut renders = Vec::new();
    for threads in [1usize, 2, 8] {
        cfg.num_threads = threads;
        let results = search(&cm, &seqs, &cfg).unwrap();
        let mut buf = Vec::new();
        render_report(&cm, &cfg, &results, &mut buf).unwrap();
        // Strip the timing line, the only run-dependent output.
        let text: String = String::from_utf8(buf)
            .unwrap()
            .lines()
            .filter(|l| !l.contains("elapsed"))
            .collect::<Vec<_>>()
            .join("\n");
        renders.push(text);
    }
    assert_eq!(renders[0], renders[1]);
    assert_eq!(renders[1], renders[2]);
}

#[test]
fn funnel_survivor_counts_are_monotone() {
    let cm = hairpin_model();
    let cfg = base_config();
    let mut seqs = Vec::new();
    for i in 0..4u32 {
        seqs.push(target(&format!("s{}", i), i, &embed(HAIRPIN_SEQ, 25, 60)));
    }
    seqs.push(target("junk", 4, &embed(b"ACGUGAUCGUAGCUAGCAUC", 40, 40)));
    let s = search(&cm, &seqs, &cfg).unwrap().stats;
    let funnel = [
        s.windows,
        s.pass_ssv,
        s.pass_vit,
        s.pass_vit_bias,
        s.pass_fwd,
        s.pass_fwd_bias,
    ];
    for pair in funnel.windows(2) {
        assert!(pair[0] >= pair[1], "funnel grew: {:?}", funnel);
    }
    assert!(s.envelopes >= s.pass_cyk);
    assert!(s.pass_cyk >= s.hits);
    assert!(s.hits >= 4, "planted copies lost in the funnel");
}

#[test]
fn bifurcated_model_finds_its_own_consensus() {
    let cm = two_stem_model();
    let cfg = base_config();
    let seqs = vec![target("t", 0, &embed(TWO_STEM_SEQ, 35, 35))];
    let results = search(&cm, &seqs, &cfg).unwrap();
    assert!(!results.hits.is_empty());
    let h = &results.hits[0];
    assert!(h.start <= 36 && h.end >= 55, "envelope {}..{}", h.start, h.end);
    assert!(h.included);
}

#[test]
fn alignment_blocks_cover_all_reported_hits() {
    let cm = hairpin_model();
    let cfg = base_config();
    let seqs = vec![target("t", 0, &embed(HAIRPIN_SEQ, 30, 30))];
    let results = search(&cm, &seqs, &cfg).unwrap();
    assert!(!results.hits.is_empty());
    for h in &results.hits {
        let ali = h.alignment.as_ref().expect("alignments requested");
        assert_eq!(ali.ss_line.len(), ali.target_line.len());
    }
}

#[test]
fn nohmm_mode_still_applies_the_envelope_gate() {
    let cm = hairpin_model();
    let mut cfg = base_config();
    cfg.skip_hmm = true;
    let seqs = vec![
        target("hit", 0, &embed(HAIRPIN_SEQ, 30, 30)),
        target("junk", 1, &embed(b"ACGUGAUCGUAGCUAGCAUC", 40, 40)),
    ];
    let results = search(&cm, &seqs, &cfg).unwrap();
    let s = &results.stats;
    // Every window is counted straight through the disabled HMM
    // stages, so the funnel is flat down to the envelope gate.
    assert_eq!(s.windows, s.pass_ssv);
    assert_eq!(s.windows, s.pass_fwd_bias);
    // The glocal gate still prunes: junk windows yield no envelope.
    assert!(s.envelopes < s.windows, "envelope gate disabled");
    assert!(results.hits.iter().any(|h| h.seq_id == "hit"));
    assert!(results.hits.iter().all(|h| h.seq_id == "hit"));
}

#[test]
fn bottomonly_searches_the_minus_strand_only() {
    let cm = hairpin_model();
    let mut cfg = base_config();
    cfg.strands = StrandMode::BottomOnly;
    // Plant the reverse complement: the consensus only exists on the
    // minus strand.
    let rc = b"GGGCGGCUUUUGCCGCCC";
    let seqs = vec![target("t", 0, &embed(rc, 30, 30))];
    let results = search(&cm, &seqs, &cfg).unwrap();
    assert!(!results.hits.is_empty(), "minus-strand hit not recovered");
    for h in &results.hits {
        assert_eq!(h.strand, Strand::Minus);
        // Minus-strand hits report input-strand coordinates with
        // start > end.
        assert!(h.start > h.end, "coordinates {}..{}", h.start, h.end);
    }
    let h = &results.hits[0];
    assert!(h.start >= 31 && h.end <= 48, "envelope {}..{}", h.start, h.end);
}

#[test]
fn skip_filters_mode_is_a_superset_of_the_filtered_run() {
    let cm = hairpin_model();
    let mut cfg = base_config();
    let seqs = vec![target("t", 0, &embed(HAIRPIN_SEQ, 30, 30))];
    let filtered = search(&cm, &seqs, &cfg).unwrap();
    cfg.skip_filters = true;
    let unfiltered = search(&cm, &seqs, &cfg).unwrap();
    assert!(unfiltered.hits.len() >= filtered.hits.len());
    // With filters off, every window survives to the envelope stage.
    assert_eq!(unfiltered.stats.windows, unfiltered.stats.pass_fwd_bias);
}
