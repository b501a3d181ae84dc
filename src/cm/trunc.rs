//! Truncation modes for boundary-adjacent hits.
//!
//! A hit whose envelope touches a sequence end may be an incomplete copy
//! of the family: the missing flank should not be charged deletion
//! penalties. Each mode enables the free-truncation options on the
//! corresponding edge spine of the guide tree during CYK/Inside.
//!
//! Reference: infernal/src/cm_dpsearch_trunc.c (TRMODE_L/TRMODE_R/
//! TRMODE_T marginal-emission and free-entry semantics).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TruncMode {
    /// Complete hit; the ordinary recursion.
    #[default]
    None,
    /// 5' flank of the model may be missing.
    Five,
    /// 3' flank of the model may be missing.
    Three,
    /// Both flanks may be missing (short sequence or hit spanning it).
    Both,
}

impl TruncMode {
    #[inline]
    pub fn allow5(self) -> bool {
        matches!(self, TruncMode::Five | TruncMode::Both)
    }

    #[inline]
    pub fn allow3(self) -> bool {
        matches!(self, TruncMode::Three | TruncMode::Both)
    }

    /// Modes worth trying for an envelope with the given boundary
    /// contacts, the plain mode first.
    pub fn candidates(touches_5p: bool, touches_3p: bool) -> Vec<TruncMode> {
        let mut modes = vec![TruncMode::None];
        if touches_5p {
            modes.push(TruncMode::Five);
        }
        if touches_3p {
            modes.push(TruncMode::Three);
        }
        if touches_5p && touches_3p {
            modes.push(TruncMode::Both);
        }
        modes
    }
}

impl fmt::Display for TruncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TruncMode::None => "no",
            TruncMode::Five => "5'",
            TruncMode::Three => "3'",
            TruncMode::Both => "5'&3'",
        };
        f.pad(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_sets_follow_boundary_contacts() {
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
    fn flags_are_exclusive_per_mode() {
        assert!(!TruncMode::None.allow5() && !TruncMode::None.allow3());
        assert!(TruncMode::Five.allow5() && !TruncMode::Five.allow3());
        assert!(!TruncMode::Three.allow5() && TruncMode::Three.allow3());
        assert!(TruncMode::Both.allow5() && TruncMode::Both.allow3());
    }
}
