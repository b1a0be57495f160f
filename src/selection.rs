//! # Primary measurement-table selection
//!
//! A filter may carry several measurement tables (typically one per tried
//! aperture). Exactly one of them, the *primary* table, drives the derived
//! statistics and leads the upload order. Selection is deterministic for any
//! input order of the candidates.
//!
//! Tie-break chain, each step narrowing the set of candidates tied on the
//! previous one:
//!
//! 1. largest median source radius,
//! 2. a time-variable radius beats a constant one,
//! 3. largest `_<N>px` aperture tag (absent counts as 0),
//! 4. lexicographically smallest filename.

use std::cmp::Ordering;

use crate::classify::ClassifiedFile;

/// One measurement table in the running for primary, with the radius data
/// read from its backing file.
#[derive(Debug, Clone)]
pub struct TableCandidate {
    pub file: ClassifiedFile,
    /// NaN-ignoring median of the table's `Source_Radius` column. Candidates
    /// whose table could not be read carry `-inf` so they lose every
    /// comparison but stay uploadable.
    pub median_source_radius: f64,
    /// True when the radius column is not constant across rows.
    pub radius_varies: bool,
}

impl TableCandidate {
    pub fn new(file: ClassifiedFile, median_source_radius: f64, radius_varies: bool) -> Self {
        // Non-finite medians (unreadable table, all-NaN column) rank below
        // every real radius.
        let median_source_radius = if median_source_radius.is_finite() {
            median_source_radius
        } else {
            f64::NEG_INFINITY
        };
        TableCandidate {
            file,
            median_source_radius,
            radius_varies,
        }
    }

    /// A candidate whose backing table could not be read at all.
    pub fn unreadable(file: ClassifiedFile) -> Self {
        TableCandidate::new(file, f64::NEG_INFINITY, true)
    }

    fn aperture_tag_px(&self) -> u32 {
        self.file.parsed.aperture_tag_px.unwrap_or(0)
    }
}

/// Total preference order between two candidates. `Greater` means `a` is
/// preferred. The final filename comparison makes the order strict, so the
/// maximum is unique.
fn prefer(a: &TableCandidate, b: &TableCandidate) -> Ordering {
    a.median_source_radius
        .total_cmp(&b.median_source_radius)
        .then(a.radius_varies.cmp(&b.radius_varies))
        .then(a.aperture_tag_px().cmp(&b.aperture_tag_px()))
        .then(b.file.parsed.raw_name.cmp(&a.file.parsed.raw_name))
}

/// Pick the primary table out of a set of candidates.
///
/// Return
/// ----------
/// * The preferred candidate, or `None` when the set is empty.
pub fn select_primary(candidates: &[TableCandidate]) -> Option<&TableCandidate> {
    candidates
        .iter()
        .fold(None, |best: Option<&TableCandidate>, cand| match best {
            Some(best) if prefer(best, cand) == Ordering::Greater => Some(best),
            _ => Some(cand),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::filename::parse;

    fn candidate(name: &str, median: f64, varies: bool) -> TableCandidate {
        TableCandidate::new(classify(parse(name).unwrap()), median, varies)
    }

    fn selected_name(candidates: &[TableCandidate]) -> String {
        select_primary(candidates)
            .unwrap()
            .file
            .raw_name()
            .to_string()
    }

    #[test]
    fn largest_median_radius_wins() {
        let c = vec![
            candidate("TIC1-01_20240101_ObsA_V_4px_measurements.tbl", 3.0, true),
            candidate("TIC1-01_20240101_ObsA_V_9px_measurements.tbl", 5.0, false),
        ];
        assert_eq!(
            selected_name(&c),
            "TIC1-01_20240101_ObsA_V_9px_measurements.tbl"
        );
    }

    #[test]
    fn variable_radius_beats_constant_at_equal_median() {
        let c = vec![
            candidate("TIC1-01_20240101_ObsA_V_a_measurements.tbl", 3.0, false),
            candidate("TIC1-01_20240101_ObsA_V_b_measurements.tbl", 3.0, true),
        ];
        assert_eq!(
            selected_name(&c),
            "TIC1-01_20240101_ObsA_V_b_measurements.tbl"
        );
    }

    #[test]
    fn larger_aperture_tag_breaks_remaining_ties() {
        let c = vec![
            candidate("TIC1-01_20240101_ObsA_V_5px_measurements.tbl", 3.0, true),
            candidate("TIC1-01_20240101_ObsA_V_12px_measurements.tbl", 3.0, true),
        ];
        assert_eq!(
            selected_name(&c),
            "TIC1-01_20240101_ObsA_V_12px_measurements.tbl"
        );
    }

    #[test]
    fn smallest_filename_is_the_final_tie_break() {
        let c = vec![
            candidate("TIC1-01_20240101_ObsA_V_zz_measurements.tbl", 3.0, true),
            candidate("TIC1-01_20240101_ObsA_V_aa_measurements.tbl", 3.0, true),
        ];
        assert_eq!(
            selected_name(&c),
            "TIC1-01_20240101_ObsA_V_aa_measurements.tbl"
        );
    }

    #[test]
    fn selection_is_order_independent() {
        let mut c = vec![
            candidate("TIC1-01_20240101_ObsA_V_aa_measurements.tbl", 3.0, false),
            candidate("TIC1-01_20240101_ObsA_V_bb_measurements.tbl", 3.0, true),
            candidate("TIC1-01_20240101_ObsA_V_cc_measurements.tbl", 2.0, true),
            candidate("TIC1-01_20240101_ObsA_V_dd_measurements.tbl", 3.0, true),
        ];
        let expected = selected_name(&c);
        c.reverse();
        assert_eq!(selected_name(&c), expected);
        c.swap(0, 2);
        assert_eq!(selected_name(&c), expected);
    }

    #[test]
    fn unreadable_tables_lose_to_any_real_radius() {
        let c = vec![
            TableCandidate::unreadable(
                classify(parse("TIC1-01_20240101_ObsA_V_aa_measurements.tbl").unwrap()),
            ),
            candidate("TIC1-01_20240101_ObsA_V_zz_measurements.tbl", 0.5, false),
        ];
        assert_eq!(
            selected_name(&c),
            "TIC1-01_20240101_ObsA_V_zz_measurements.tbl"
        );
    }

    #[test]
    fn empty_candidate_set_yields_none() {
        assert!(select_primary(&[]).is_none());
    }
}
