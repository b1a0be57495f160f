//! # Pipeline
//!
//! Wires the leaf modules into the single pass the utility performs: list the
//! directory, parse and classify every name, freeze the directory record,
//! pick a primary table and derive statistics per filter, and aggregate the
//! validation report.
//!
//! Everything here is synchronous and per-filter independent: a statistics
//! failure in one filter never affects another. The only fatal conditions
//! are the ones [`DirectoryRecord::build`] raises, plus the disallowed-file
//! screen performed on the raw listing.

use camino::Utf8Path;
use tracing::debug;

use crate::classify::{classify, ClassifiedFile, FileCategory};
use crate::directory::{DirectoryRecord, FilterGroup, RejectReason};
use crate::errors::Sg1Error;
use crate::filename::parse;
use crate::report::{FilterOutcome, ValidationReport};
use crate::run_context::RunContext;
use crate::selection::{select_primary, TableCandidate};
use crate::statistics::{self, ComputeFailure};
use crate::table::MeasurementTable;
use crate::wcs;

/// Files ExoFOP must never receive; their presence aborts the run.
const DISALLOWED_SUFFIX: &str = "seeing-profile.gif";
const DISALLOWED_FRAGMENT: &str = "bjd-flux-err";

/// Sorted names of the plain files in the observation directory.
pub fn scan_directory(dir: &Utf8Path) -> Result<Vec<String>, Sg1Error> {
    if !dir.is_dir() {
        return Err(Sg1Error::InvalidDirectory(dir.to_string()));
    }
    let mut names = Vec::new();
    for entry in dir.read_dir_utf8()? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// One classification pass over the listing: parse failures become rejects,
/// everything else a [`ClassifiedFile`].
pub fn classify_names(
    names: &[String],
) -> Result<(Vec<ClassifiedFile>, Vec<(String, RejectReason)>), Sg1Error> {
    for name in names {
        if name.ends_with(DISALLOWED_SUFFIX) || name.contains(DISALLOWED_FRAGMENT) {
            return Err(Sg1Error::DisallowedFile(name.clone()));
        }
    }

    let mut classified = Vec::new();
    let mut rejected = Vec::new();
    for name in names {
        match parse(name) {
            Ok(parsed) => classified.push(classify(parsed)),
            Err(failure) => rejected.push((name.clone(), RejectReason::Parse(failure))),
        }
    }
    Ok((classified, rejected))
}

/// Select the primary table of one filter group and derive its statistics.
fn filter_outcome(dir: &Utf8Path, group: &FilterGroup) -> FilterOutcome {
    let mut candidates = Vec::new();
    let mut tables: Vec<(String, Option<MeasurementTable>)> = Vec::new();
    for file in group.table_candidates() {
        let name = file.raw_name().to_string();
        match MeasurementTable::read(&dir.join(&name)) {
            Ok(table) => {
                let radius = table.column("Source_Radius").unwrap_or(&[]);
                let median = statistics::nan_median(radius).unwrap_or(f64::NEG_INFINITY);
                let varies = statistics::column_varies(radius);
                candidates.push(TableCandidate::new((*file).clone(), median, varies));
                tables.push((name, Some(table)));
            }
            Err(err) => {
                debug!(file = %name, error = %err, "measurement table unreadable");
                candidates.push(TableCandidate::unreadable((*file).clone()));
                tables.push((name, None));
            }
        }
    }

    let Some(primary) = select_primary(&candidates) else {
        return FilterOutcome {
            filter_name: group.filter_name.clone(),
            primary_table: None,
            statistics: Err(ComputeFailure::NoMeasurementTable),
        };
    };
    let primary_name = primary.file.raw_name().to_string();

    let table = tables
        .iter()
        .find(|(name, _)| *name == primary_name)
        .and_then(|(_, table)| table.as_ref());
    let statistics = match table {
        Some(table) => {
            let scales = first_usable_wcs(dir, group);
            statistics::compute(table, scales)
        }
        None => Err(ComputeFailure::UnreadableTable(primary_name.clone())),
    };

    FilterOutcome {
        filter_name: group.filter_name.clone(),
        primary_table: Some(primary_name),
        statistics,
    }
}

/// Per-axis scales from the first plate-solved image with a usable WCS,
/// tried in filename order.
fn first_usable_wcs(dir: &Utf8Path, group: &FilterGroup) -> Option<[f64; 2]> {
    for file in group.files_of(FileCategory::PlateSolvedFits) {
        match wcs::read_pixel_scales(&dir.join(file.raw_name())) {
            Ok(Some(scales)) => return Some(scales),
            Ok(None) => continue,
            Err(err) => {
                debug!(file = %file.raw_name(), error = %err, "plate-solved image unreadable");
                continue;
            }
        }
    }
    None
}

/// Run the whole validation pipeline over one directory.
///
/// Return
/// ----------
/// * The frozen [`ValidationReport`], or a fatal error (invalid or
///   inconsistent directory, disallowed file, nothing recognized).
pub fn run(dir: &Utf8Path, ctx: &RunContext) -> Result<ValidationReport, Sg1Error> {
    let names = scan_directory(dir)?;
    debug!(count = names.len(), "directory listed");
    let (classified, rejected) = classify_names(&names)?;
    let mut record = DirectoryRecord::build(classified, rejected, ctx)?;

    let outcomes: Vec<FilterOutcome> = record
        .filter_groups
        .iter()
        .map(|group| filter_outcome(dir, group))
        .collect();
    for (group, outcome) in record.filter_groups.iter_mut().zip(&outcomes) {
        group.primary_table = outcome.primary_table.clone();
        group.statistics = outcome.statistics.clone().ok();
    }

    Ok(ValidationReport::build(&record, ctx, &outcomes))
}
