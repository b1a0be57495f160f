//! # Upload plan
//!
//! Turns a [`ValidationReport`] plus the operator's confirmation into the
//! total order of upload operations. Planning performs no I/O; the plan is
//! executed afterwards by [`portal::execute_plan`](crate::portal::execute_plan).
//!
//! Ordering: one summary per statistics-complete filter first (filter
//! first-seen order), then per filter the primary measurement table, the
//! remaining tables in filename order, the other per-filter files in
//! classification-table order, and finally the single global notes file.
//!
//! A declined confirmation blocks the plan outright: no operations exist, so
//! zero uploads are guaranteed.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::report::ValidationReport;
use crate::run_context::RunContext;
use crate::statistics::{format_two_significant, Statistics};

/// Appended to the public notes when the aperture radius changed over time.
const VARIABLE_RADIUS_NOTE: &str = "aperture radius was variable in time";

/// Portal file kind for every SG1 file upload.
pub const FILE_TYPE: &str = "Light_Curve";

/// PSF and faintest-neighbor Δmag for one filter, resolved by the caller
/// (command-line values for single-filter runs, prompt answers otherwise).
/// Blank `delta_mag` means "leave empty on the portal".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterMetadata {
    pub psf: String,
    pub delta_mag: String,
}

/// The per-filter time-series summary, in the portal's form-field layout.
/// All values are transmitted as strings; derived statistics are formatted
/// here, everything else keeps its original form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryPayload {
    pub planet: String,
    pub tel: String,
    pub telsize: String,
    pub camera: String,
    pub filter: String,
    pub pixscale: String,
    pub psf: String,
    pub photaprad: String,
    pub obsdate: String,
    pub obsdur: String,
    pub obsnum: String,
    pub obstype: String,
    pub transcov: String,
    pub deltamag: String,
    pub tag: String,
    pub groupname: String,
    pub notes: String,
    pub id: String,
}

impl SummaryPayload {
    /// Assemble the payload for one filter.
    pub fn new(
        ctx: &RunContext,
        date: &str,
        observatory: &str,
        filter: &str,
        stats: &Statistics,
        metadata: &FilterMetadata,
        user_notes: &str,
    ) -> Self {
        let mut notes = user_notes.trim().to_string();
        if stats.radius_was_variable {
            if notes.is_empty() {
                notes = VARIABLE_RADIUS_NOTE.to_string();
            } else {
                notes = format!("{notes}; {VARIABLE_RADIUS_NOTE}");
            }
        }

        SummaryPayload {
            planet: ctx.toi_upload_label(),
            tel: observatory.to_string(),
            telsize: ctx.telescope_size.clone(),
            camera: ctx.camera.clone(),
            filter: filter.to_string(),
            pixscale: format_two_significant(stats.pixel_scale_arcsec_per_px),
            psf: metadata.psf.trim().to_string(),
            photaprad: format!("{:.1}", stats.aperture_radius_px),
            obsdate: format!("{}-{}-{}", &date[..4], &date[4..6], &date[6..]),
            obsdur: stats.duration_minutes.to_string(),
            obsnum: stats.row_count.to_string(),
            obstype: "Continuous".to_string(),
            transcov: ctx.coverage.label().to_string(),
            deltamag: metadata.delta_mag.trim().to_string(),
            tag: ctx.upload_tag(date),
            groupname: ctx.group.clone(),
            notes,
            id: ctx.tic_digits.clone(),
        }
    }
}

impl fmt::Display for SummaryPayload {
    /// The observation-summary block shown before the upload decision.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let aperture = self
            .photaprad
            .parse::<f64>()
            .map(|v| format!("{}", v.round() as i64))
            .unwrap_or_default();
        let rows = [
            ("Name", format!("TIC {}", self.id)),
            ("TOI", self.planet.clone()),
            ("Telescope", format!("{} ({} m)", self.tel, self.telsize)),
            ("Camera", self.camera.clone()),
            ("Filter", self.filter.clone()),
            ("Pixel scale (arcsec)", self.pixscale.clone()),
            ("Estimated PSF (arcsec)", self.psf.clone()),
            ("Photometric Aperture Radius (pixel)", aperture),
            ("Transit Coverage", self.transcov.clone()),
            ("Faintest Neighbor delta Mag", self.deltamag.clone()),
            ("Observation date (UT)", self.obsdate.clone()),
            ("Observation duration (m)", self.obsdur.clone()),
            ("Number of Observations", self.obsnum.clone()),
            ("Observation Type", self.obstype.clone()),
            ("Notes", self.notes.clone()),
            ("Group", self.groupname.clone()),
            ("Tag", self.tag.clone()),
        ];
        let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in rows {
            writeln!(f, "{key:<width$}  ->  {value}")?;
        }
        Ok(())
    }
}

/// Form fields accompanying one file upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUploadForm {
    pub planet: String,
    pub file_desc: String,
    pub file_tag: String,
    pub groupname: String,
    /// `"on"` while the run's proprietary period is non-zero.
    pub propflag: String,
    pub tid: String,
}

/// One planned upload operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Submit the per-filter time-series summary.
    Summary {
        filter: String,
        payload: SummaryPayload,
    },
    /// Upload one file. `filter` is `None` for the global notes file.
    File {
        filter: Option<String>,
        name: String,
        form: FileUploadForm,
    },
}

/// An operation with its position in the total upload order (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadItem {
    pub order: usize,
    pub operation: Operation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    NotConfirmed,
}

/// Result of planning: either the ordered operations or the reason nothing
/// may be uploaded.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    Blocked(BlockReason),
    Operations(Vec<UploadItem>),
}

pub struct UploadPlan;

impl UploadPlan {
    /// Build the ordered operation sequence for one confirmed run.
    ///
    /// Arguments
    /// -----------------
    /// * `report`: the frozen validation report.
    /// * `ctx`: run parameters.
    /// * `metadata`: PSF/Δmag per filter, resolved before planning.
    /// * `user_notes`: operator-supplied free-text notes.
    /// * `confirm`: the operator's explicit go-ahead.
    /// * `skip_summary` / `skip_files`: suppress the respective phase.
    ///
    /// Return
    /// ----------
    /// * `Blocked` when not confirmed, otherwise the operations in upload
    ///   order (possibly empty when both phases are skipped).
    pub fn plan(
        report: &ValidationReport,
        ctx: &RunContext,
        metadata: &HashMap<String, FilterMetadata>,
        user_notes: &str,
        confirm: bool,
        skip_summary: bool,
        skip_files: bool,
    ) -> PlanOutcome {
        if !confirm {
            return PlanOutcome::Blocked(BlockReason::NotConfirmed);
        }

        let mut operations = Vec::new();

        if !skip_summary {
            for (filter, payload) in Self::payloads(report, ctx, metadata, user_notes) {
                operations.push(Operation::Summary { filter, payload });
            }
        }

        if !skip_files {
            let propflag = if ctx.proprietary_months > 0 { "on" } else { "off" };
            let form = |desc: &str| FileUploadForm {
                planet: ctx.toi_upload_label(),
                file_desc: desc.to_string(),
                file_tag: ctx.upload_tag(&report.date),
                groupname: ctx.group.clone(),
                propflag: propflag.to_string(),
                tid: ctx.tic_digits.clone(),
            };
            for filter in &report.filters {
                for (name, category) in &filter.upload_files {
                    operations.push(Operation::File {
                        filter: Some(filter.filter_name.clone()),
                        name: name.clone(),
                        form: form(category.description()),
                    });
                }
            }
            // The single global notes file comes last, and only when exactly
            // one exists.
            if let Some(notes_name) = &report.notes_file {
                operations.push(Operation::File {
                    filter: None,
                    name: notes_name.clone(),
                    form: form(crate::classify::FileCategory::NotesText.description()),
                });
            }
        }

        PlanOutcome::Operations(
            operations
                .into_iter()
                .enumerate()
                .map(|(i, operation)| UploadItem {
                    order: i + 1,
                    operation,
                })
                .collect(),
        )
    }

    /// Summary payloads for every statistics-complete filter, in first-seen
    /// order. Also used for the console preview before confirmation.
    pub fn payloads(
        report: &ValidationReport,
        ctx: &RunContext,
        metadata: &HashMap<String, FilterMetadata>,
        user_notes: &str,
    ) -> Vec<(String, SummaryPayload)> {
        report
            .complete_filters()
            .map(|filter| {
                let stats = filter
                    .statistics
                    .as_ref()
                    .expect("complete_filters yields Ok statistics");
                let meta = metadata
                    .get(&filter.filter_name)
                    .cloned()
                    .unwrap_or_default();
                let payload = SummaryPayload::new(
                    ctx,
                    &report.date,
                    &report.observatory,
                    &filter.filter_name,
                    stats,
                    &meta,
                    user_notes,
                );
                (filter.filter_name.clone(), payload)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::directory::DirectoryRecord;
    use crate::filename::parse;
    use crate::report::{FilterOutcome, ValidationReport};
    use crate::run_context::Coverage;
    use crate::statistics::ComputeFailure;

    fn ctx() -> RunContext {
        RunContext::new("12345678.01", "1234.01", "sg1user", Coverage::Full, "0.4", "cam").unwrap()
    }

    fn stats(variable: bool) -> Statistics {
        Statistics {
            aperture_radius_px: 3.4,
            radius_was_variable: variable,
            pixel_scale_arcsec_per_px: 0.39,
            duration_minutes: 123,
            row_count: 200,
        }
    }

    fn report(names: &[&str], outcomes: Vec<FilterOutcome>) -> ValidationReport {
        let classified = names.iter().map(|n| classify(parse(n).unwrap())).collect();
        let record = DirectoryRecord::build(classified, Vec::new(), &ctx()).unwrap();
        ValidationReport::build(&record, &ctx(), &outcomes)
    }

    fn two_filter_report() -> ValidationReport {
        report(
            &[
                "TIC12345678-01_20240101_ObsA_V_measurements.tbl",
                "TIC12345678-01_20240101_ObsA_V_lightcurve.png",
                "TIC12345678-01_20240101_ObsA_R_measurements.tbl",
                "TIC12345678-01_20240101_ObsA_V_notes.txt",
            ],
            vec![
                FilterOutcome {
                    filter_name: "V".into(),
                    primary_table: Some("TIC12345678-01_20240101_ObsA_V_measurements.tbl".into()),
                    statistics: Ok(stats(false)),
                },
                FilterOutcome {
                    filter_name: "R".into(),
                    primary_table: Some("TIC12345678-01_20240101_ObsA_R_measurements.tbl".into()),
                    statistics: Ok(stats(true)),
                },
            ],
        )
    }

    fn plan(
        report: &ValidationReport,
        confirm: bool,
        skip_summary: bool,
        skip_files: bool,
    ) -> PlanOutcome {
        UploadPlan::plan(
            report,
            &ctx(),
            &HashMap::new(),
            "",
            confirm,
            skip_summary,
            skip_files,
        )
    }

    #[test]
    fn declined_confirmation_blocks_regardless_of_skips() {
        let report = two_filter_report();
        for (s, f) in [(false, false), (true, false), (false, true), (true, true)] {
            assert_eq!(
                plan(&report, false, s, f),
                PlanOutcome::Blocked(BlockReason::NotConfirmed)
            );
        }
    }

    #[test]
    fn both_skips_yield_an_empty_sequence_even_when_confirmed() {
        let report = two_filter_report();
        match plan(&report, true, true, true) {
            PlanOutcome::Operations(ops) => assert!(ops.is_empty()),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn summaries_come_first_in_filter_order_then_files_then_notes() {
        let report = two_filter_report();
        let PlanOutcome::Operations(ops) = plan(&report, true, false, false) else {
            panic!("expected operations");
        };
        assert_eq!(ops.len(), 6);
        assert_eq!(ops[0].order, 1);
        assert!(ops.windows(2).all(|w| w[1].order == w[0].order + 1));

        match (&ops[0].operation, &ops[1].operation) {
            (Operation::Summary { filter: a, .. }, Operation::Summary { filter: b, .. }) => {
                assert_eq!(a, "V");
                assert_eq!(b, "R");
            }
            other => panic!("expected two summaries first, got {other:?}"),
        }
        let files: Vec<(&Option<String>, &str)> = ops[2..]
            .iter()
            .map(|item| match &item.operation {
                Operation::File { filter, name, .. } => (filter, name.as_str()),
                other => panic!("expected file operation, got {other:?}"),
            })
            .collect();
        assert_eq!(
            files,
            vec![
                (
                    &Some("V".to_string()),
                    "TIC12345678-01_20240101_ObsA_V_measurements.tbl"
                ),
                (
                    &Some("V".to_string()),
                    "TIC12345678-01_20240101_ObsA_V_lightcurve.png"
                ),
                (
                    &Some("R".to_string()),
                    "TIC12345678-01_20240101_ObsA_R_measurements.tbl"
                ),
                (&None, "TIC12345678-01_20240101_ObsA_V_notes.txt"),
            ]
        );
    }

    #[test]
    fn failed_statistics_withhold_the_summary_but_not_the_files() {
        let report = report(
            &[
                "TIC12345678-01_20240101_ObsA_V_measurements.tbl",
                "TIC12345678-01_20240101_ObsA_V_field.png",
            ],
            vec![FilterOutcome {
                filter_name: "V".into(),
                primary_table: Some("TIC12345678-01_20240101_ObsA_V_measurements.tbl".into()),
                statistics: Err(ComputeFailure::MissingOrInvalidWcs),
            }],
        );
        let PlanOutcome::Operations(ops) = plan(&report, true, false, false) else {
            panic!("expected operations");
        };
        assert!(ops
            .iter()
            .all(|item| matches!(item.operation, Operation::File { .. })));
        assert_eq!(ops.len(), 2);
    }

    #[test]
    fn missing_notes_suppress_the_global_upload_only() {
        let report = report(
            &["TIC12345678-01_20240101_ObsA_V_measurements.tbl"],
            vec![FilterOutcome {
                filter_name: "V".into(),
                primary_table: Some("TIC12345678-01_20240101_ObsA_V_measurements.tbl".into()),
                statistics: Ok(stats(false)),
            }],
        );
        let PlanOutcome::Operations(ops) = plan(&report, true, true, false) else {
            panic!("expected operations");
        };
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0].operation,
            Operation::File { filter: Some(f), .. } if f == "V"
        ));
    }

    #[test]
    fn file_forms_carry_the_proprietary_flag_and_run_tag() {
        let report = two_filter_report();
        let PlanOutcome::Operations(ops) = plan(&report, true, true, false) else {
            panic!("expected operations");
        };
        assert!(!ops.is_empty());
        for item in ops {
            let Operation::File { form, .. } = item.operation else {
                panic!("expected file operation");
            };
            assert_eq!(form.propflag, "on");
            assert_eq!(form.file_tag, "20240101_sg1user_tic12345678_01");
            assert_eq!(form.groupname, "tfopwg");
        }
    }

    #[test]
    fn variable_radius_note_is_merged_into_the_payload_notes() {
        let meta = FilterMetadata {
            psf: "3.41".into(),
            delta_mag: "".into(),
        };
        let payload = SummaryPayload::new(
            &ctx(),
            "20240101",
            "ObsA",
            "R",
            &stats(true),
            &meta,
            "clear skies",
        );
        assert_eq!(payload.notes, "clear skies; aperture radius was variable in time");
        assert_eq!(payload.obsdate, "2024-01-01");
        assert_eq!(payload.photaprad, "3.4");
        assert_eq!(payload.pixscale, "0.39");
        assert_eq!(payload.planet, "TOI1234.01");
        assert_eq!(payload.groupname, "tfopwg");

        let bare = SummaryPayload::new(&ctx(), "20240101", "ObsA", "R", &stats(true), &meta, "");
        assert_eq!(bare.notes, "aperture radius was variable in time");
    }
}
