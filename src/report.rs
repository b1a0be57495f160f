//! # Validation report
//!
//! Read-only aggregation of one directory scan: per filter, which categories
//! are present, missing or unrecognized, which table was selected as primary,
//! and whether statistics could be derived. Globally, the notes status and
//! the rejected filenames.
//!
//! The report is both the console preview shown before the upload decision
//! and the sole input of [`UploadPlan::plan`](crate::plan::UploadPlan::plan).
//! It never mutates the directory model and performs no uploads.

use std::fmt;

use itertools::Itertools;

use crate::classify::FileCategory;
use crate::directory::{DirectoryRecord, NotesStatus, RejectReason};
use crate::run_context::RunContext;
use crate::statistics::{ComputeFailure, Statistics};

/// Per-filter result of primary selection and statistics computation,
/// produced by the pipeline.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub filter_name: String,
    /// Raw name of the selected primary table, if any candidate existed.
    pub primary_table: Option<String>,
    pub statistics: Result<Statistics, ComputeFailure>,
}

/// Everything the report knows about one filter.
#[derive(Debug, Clone)]
pub struct FilterReport {
    pub filter_name: String,
    pub missing_required: Vec<FileCategory>,
    pub missing_optional: Vec<FileCategory>,
    /// Files attributed to this filter whose tail is not in the suffix table.
    pub unrecognized: Vec<String>,
    pub primary_table: Option<String>,
    /// Per-filter files in upload order, with their categories.
    pub upload_files: Vec<(String, FileCategory)>,
    pub statistics: Result<Statistics, ComputeFailure>,
}

/// The frozen report of one run, in filter first-seen order.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub target_title: String,
    pub date: String,
    pub observatory: String,
    pub filters: Vec<FilterReport>,
    pub notes_status: NotesStatus,
    /// Raw name of the notes file when exactly one exists.
    pub notes_file: Option<String>,
    pub rejected: Vec<(String, RejectReason)>,
}

impl ValidationReport {
    /// Aggregate the directory record and the per-filter outcomes. Pure; the
    /// only failures it can carry are the ones already inside its inputs.
    pub fn build(
        record: &DirectoryRecord,
        ctx: &RunContext,
        outcomes: &[FilterOutcome],
    ) -> ValidationReport {
        let filters = record
            .filter_groups
            .iter()
            .map(|group| {
                let outcome = outcomes.iter().find(|o| o.filter_name == group.filter_name);
                let primary_table = outcome.and_then(|o| o.primary_table.clone());
                let statistics = outcome
                    .map(|o| o.statistics.clone())
                    .unwrap_or(Err(ComputeFailure::NoMeasurementTable));

                let missing_required: Vec<FileCategory> = FileCategory::required_per_filter()
                    .filter(|c| group.files_of(*c).is_empty())
                    .collect();
                let missing_optional: Vec<FileCategory> = FileCategory::optional_per_filter()
                    .filter(|c| group.files_of(*c).is_empty())
                    .collect();

                let unrecognized = group
                    .files_of(FileCategory::Unrecognized)
                    .iter()
                    .map(|f| f.raw_name().to_string())
                    .collect();

                let upload_files = group
                    .upload_sequence(primary_table.as_deref())
                    .iter()
                    .map(|f| (f.raw_name().to_string(), f.category))
                    .collect();

                FilterReport {
                    filter_name: group.filter_name.clone(),
                    missing_required,
                    missing_optional,
                    unrecognized,
                    primary_table,
                    upload_files,
                    statistics,
                }
            })
            .collect();

        ValidationReport {
            target_title: ctx.target_title(),
            date: record.date.clone(),
            observatory: record.observatory.clone(),
            filters,
            notes_status: record.notes_status(),
            notes_file: record.notes_file().map(|f| f.raw_name().to_string()),
            rejected: record.rejected.clone(),
        }
    }

    /// True when any filter is missing a required category.
    pub fn has_missing_required(&self) -> bool {
        self.filters.iter().any(|f| !f.missing_required.is_empty())
    }

    /// Filters whose statistics are complete, in first-seen order.
    pub fn complete_filters(&self) -> impl Iterator<Item = &FilterReport> {
        self.filters.iter().filter(|f| f.statistics.is_ok())
    }

    /// Borrowing console renderer.
    pub fn display(&self) -> ReportDisplay<'_> {
        ReportDisplay { report: self }
    }
}

/// Renders the preview shown before the upload decision.
pub struct ReportDisplay<'a> {
    report: &'a ValidationReport,
}

impl fmt::Display for ReportDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.report;
        writeln!(f, "{}", r.target_title)?;
        writeln!(
            f,
            "Detected set -> Date: {}, Observatory: {}, Filter(s): {}",
            r.date,
            r.observatory,
            r.filters.iter().map(|g| g.filter_name.as_str()).join(", ")
        )?;

        for filter in &r.filters {
            writeln!(f, "\nRecognized files (filter {}):", filter.filter_name)?;
            let width = filter
                .upload_files
                .iter()
                .map(|(name, _)| name.len())
                .max()
                .unwrap_or(0);
            for (name, category) in &filter.upload_files {
                writeln!(f, "  \u{2714} {name:<width$}  ->  {}", category.description())?;
            }
            for name in &filter.unrecognized {
                writeln!(f, "  - {name:<width$}  ->  Unrecognized filetype token")?;
            }
        }

        if !r.rejected.is_empty() {
            writeln!(f, "\nRejected files (not used):")?;
            let width = r.rejected.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
            for (name, reason) in &r.rejected {
                writeln!(f, "  - {name:<width$}  ->  {reason}")?;
            }
        }

        writeln!(f, "\nGlobal files:")?;
        match r.notes_status {
            NotesStatus::Present => writeln!(f, "  \u{2714} notes.txt found")?,
            NotesStatus::Missing => writeln!(f, "  - notes.txt missing")?,
            NotesStatus::Duplicate(n) => {
                writeln!(f, "  - {n} notes.txt files found (exactly one expected)")?
            }
        }

        for filter in &r.filters {
            if filter.missing_optional.is_empty() {
                writeln!(
                    f,
                    "\nOptional files not detected (filter {}): None",
                    filter.filter_name
                )?;
            } else {
                writeln!(
                    f,
                    "\nOptional files not detected (filter {}):",
                    filter.filter_name
                )?;
                for category in &filter.missing_optional {
                    writeln!(f, "  \u{2022} {}", category.description())?;
                }
            }
        }

        if r.has_missing_required() {
            writeln!(f, "\nMissing required TFOP files:")?;
            for filter in &r.filters {
                if !filter.missing_required.is_empty() {
                    writeln!(f, "  Filter {}:", filter.filter_name)?;
                    for category in &filter.missing_required {
                        writeln!(f, "    \u{2022} {}", category.description())?;
                    }
                }
            }
        }

        for filter in &r.filters {
            if let Err(failure) = &filter.statistics {
                writeln!(
                    f,
                    "\nSummary unavailable (filter {}): {failure}",
                    filter.filter_name
                )?;
            }
        }
        Ok(())
    }
}
