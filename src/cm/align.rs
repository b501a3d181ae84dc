//! Rendered envelope alignment, three parallel annotation lines.
//!
//! Reference: infernal/src/cm_alidisplay.c (CM_ALIDISPLAY).

/// Human-readable alignment of one envelope against the model.
///
/// All three lines have identical length. Uppercase target residues
/// align to consensus positions, lowercase are insertions, `-` marks a
/// deleted position and `~` a position lost to truncation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAlignment {
    /// Consensus structure: `<`/`>` for pair halves, `:` unpaired, `.` insert.
    pub ss_line: String,
    /// Model consensus residues, `.` at insert columns.
    pub model_line: String,
    /// Target residues with gap and truncation marks.
    pub target_line: String,
}

impl ParsedAlignment {
    /// Render as an indented block for the hit report.
    pub fn render(&self, indent: usize) -> String {
        let pad = " ".repeat(indent);
        format!(
            "{pad}{}\n{pad}{}\n{pad}{}\n",
            self.ss_line, self.model_line, self.target_line
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_indents_every_line() {
        let a = ParsedAlignment {
            ss_line: "<::>".into(),
            model_line: "GAAC".into(),
            target_line: "GAAC".into(),
        };
        let out = a.render(2);
        for line in out.lines() {
            assert!(line.starts_with("  "));
        }
        assert_eq!(out.lines().count(), 3);
    }
}
