//! Model file reading through the public surface, including the
//! filesystem path.

use std::io::Write;

use covsearch::model::file::{parse_model, read_model};
use covsearch::model::NodeKind;

const WRAPPED_MODEL: &str = "\
# two-stem family, wrapped over several lines
NAME  twostem20
W     34
NULL  0.30 0.20 0.20 0.30
ECSSV 0.62 -1.80
ECVIT 0.61 -1.40
ECFWD 0.56 -0.40
ECGFW 0.56  0.10
ECCYK 0.83  0.90
ECINS 0.71  1.95
CONS  GGGAAAACCC
CONS  GGCUUUUGCC
SS    (((....)))
SS    (((....)))
END
this trailing text is never reached
";

#[test]
fn wrapped_model_parses_and_builds_a_bifurcated_tree() {
    let cm = parse_model(WRAPPED_MODEL).unwrap();
    assert_eq!(cm.name, "twostem20");
    assert_eq!(cm.clen, 20);
    assert_eq!(cm.window, 34);
    assert!((cm.null[0] - 0.30).abs() < 1e-12);
    assert!((cm.cal.inside.lambda - 0.71).abs() < 1e-12);
    assert!(cm
        .nodes
        .iter()
        .any(|n| matches!(n.kind, NodeKind::Bifurc { .. })));
    // Children precede parents; the root closes the whole consensus.
    assert_eq!(cm.root, cm.nodes.len() - 1);
    assert_eq!(cm.nodes[cm.root].espan, 20);
}

#[test]
fn read_model_round_trips_through_a_file() {
    let dir = std::env::temp_dir();
    let path = dir.join("covsearch_model_io_test.cov");
    {
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(WRAPPED_MODEL.as_bytes()).unwrap();
    }
    let cm = read_model(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(cm.clen, 20);
    assert_eq!(cm.name, "twostem20");
}

#[test]
fn read_model_reports_the_offending_path() {
    let err = read_model(std::path::Path::new("/nonexistent/f.cov")).unwrap_err();
    assert!(format!("{:#}", err).contains("/nonexistent/f.cov"));
}

#[test]
fn consensus_and_structure_length_mismatch_is_rejected() {
    let bad = "NAME x\nCONS GGGC\nSS (((...)))\n";
    assert!(parse_model(bad).is_err());
}
