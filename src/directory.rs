//! # Directory model
//!
//! Groups classified files into one [`DirectoryRecord`]: per-filter groups in
//! first-seen order, the single global notes file, and the rejected names with
//! their reasons.
//!
//! Two checks are fatal at this stage: every non-rejected file must share one
//! `(date, observatory)` pair, and at least one file must survive rejection.
//! Everything else (missing categories, zero or duplicate notes) is surfaced
//! in the validation report instead.

use std::fmt;

use itertools::Itertools;

use crate::classify::{ClassifiedFile, FileCategory, Scope};
use crate::errors::Sg1Error;
use crate::filename::ParseFailure;
use crate::run_context::RunContext;
use crate::statistics::Statistics;

/// Why a file was excluded from the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Parse(ParseFailure),
    /// The filename's `TIC<digits>-<pp>` prefix does not match the run target.
    TicPlanetMismatch,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Parse(failure) => failure.fmt(f),
            RejectReason::TicPlanetMismatch => f.write_str("TIC/planet mismatch"),
        }
    }
}

/// Presence of the single global notes file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotesStatus {
    Present,
    Missing,
    /// More than one notes file; the count is reported.
    Duplicate(usize),
}

/// All per-filter files of one photometric band.
///
/// `primary_table` and `statistics` are filled by the pipeline after the
/// record is built; the file set itself is frozen at build time.
#[derive(Debug, Clone)]
pub struct FilterGroup {
    pub filter_name: String,
    pub files: Vec<ClassifiedFile>,
    /// Raw name of the measurement table selected to drive statistics.
    pub primary_table: Option<String>,
    pub statistics: Option<Statistics>,
}

impl FilterGroup {
    fn new(filter_name: String) -> Self {
        FilterGroup {
            filter_name,
            files: Vec::new(),
            primary_table: None,
            statistics: None,
        }
    }

    /// Files of one category, sorted by name.
    pub fn files_of(&self, category: FileCategory) -> Vec<&ClassifiedFile> {
        self.files
            .iter()
            .filter(|f| f.category == category)
            .sorted_by_key(|f| f.raw_name())
            .collect()
    }

    /// Raw names of all measurement-table candidates, sorted.
    pub fn table_candidates(&self) -> Vec<&ClassifiedFile> {
        self.files_of(FileCategory::MeasurementsTable)
    }

    /// Per-filter files in upload order: the primary measurement table first,
    /// then the remaining tables in filename order, then every other known
    /// category in classification-table order. Unrecognized files are skipped.
    pub fn upload_sequence(&self, primary: Option<&str>) -> Vec<&ClassifiedFile> {
        let mut ordered = Vec::new();

        let tables = self.table_candidates();
        if let Some(primary) = primary {
            ordered.extend(tables.iter().filter(|f| f.raw_name() == primary).copied());
            ordered.extend(tables.iter().filter(|f| f.raw_name() != primary).copied());
        } else {
            ordered.extend(tables.iter().copied());
        }

        for category in FileCategory::required_per_filter()
            .chain(FileCategory::optional_per_filter())
            .filter(|c| *c != FileCategory::MeasurementsTable)
        {
            ordered.extend(self.files_of(category));
        }
        ordered
    }
}

/// The frozen view of one observation directory.
#[derive(Debug, Clone)]
pub struct DirectoryRecord {
    /// The single observation date shared by all files, `YYYYMMDD`.
    pub date: String,
    /// The single observatory token shared by all files.
    pub observatory: String,
    /// Filter groups in first-seen order.
    pub filter_groups: Vec<FilterGroup>,
    /// Global-scope files (the notes text).
    pub global_files: Vec<ClassifiedFile>,
    /// Rejected names with reasons, in scan order.
    pub rejected: Vec<(String, RejectReason)>,
}

impl DirectoryRecord {
    /// Build the record from one classification pass.
    ///
    /// Arguments
    /// -----------------
    /// * `classified`: all files that parsed and classified, in scan order.
    /// * `rejected`: names already rejected by the parser, in scan order.
    /// * `ctx`: the run context carrying the expected TIC/planet prefix.
    ///
    /// Return
    /// ----------
    /// * The frozen [`DirectoryRecord`], or a fatal error when nothing is
    ///   recognized or the directory mixes dates/observatories.
    pub fn build(
        classified: Vec<ClassifiedFile>,
        mut rejected: Vec<(String, RejectReason)>,
        ctx: &RunContext,
    ) -> Result<Self, Sg1Error> {
        let target_prefix = ctx.target_prefix();
        let mut kept = Vec::new();
        for file in classified {
            if file.parsed.target_prefix() == target_prefix {
                kept.push(file);
            } else {
                rejected.push((file.raw_name().to_string(), RejectReason::TicPlanetMismatch));
            }
        }
        if kept.is_empty() {
            return Err(Sg1Error::NoRecognizedFiles);
        }

        let pairs: Vec<(&str, &str)> = kept
            .iter()
            .map(|f| (f.parsed.date.as_str(), f.parsed.observatory.as_str()))
            .unique()
            .collect();
        if pairs.len() > 1 {
            return Err(Sg1Error::MultipleDatesOrObservatories {
                dates: pairs.iter().map(|p| p.0.to_string()).sorted().unique().collect(),
                observatories: pairs.iter().map(|p| p.1.to_string()).sorted().unique().collect(),
            });
        }
        let (date, observatory) = (pairs[0].0.to_string(), pairs[0].1.to_string());

        let mut filter_groups: Vec<FilterGroup> = Vec::new();
        let mut global_files = Vec::new();
        for file in kept {
            match file.scope {
                Scope::Global => global_files.push(file),
                Scope::PerFilter => {
                    let filter = file.parsed.filter.clone();
                    match filter_groups.iter_mut().find(|g| g.filter_name == filter) {
                        Some(group) => group.files.push(file),
                        None => {
                            let mut group = FilterGroup::new(filter);
                            group.files.push(file);
                            filter_groups.push(group);
                        }
                    }
                }
            }
        }

        Ok(DirectoryRecord {
            date,
            observatory,
            filter_groups,
            global_files,
            rejected,
        })
    }

    /// Presence of the single global notes file.
    pub fn notes_status(&self) -> NotesStatus {
        let count = self
            .global_files
            .iter()
            .filter(|f| f.category == FileCategory::NotesText)
            .count();
        match count {
            0 => NotesStatus::Missing,
            1 => NotesStatus::Present,
            n => NotesStatus::Duplicate(n),
        }
    }

    /// The notes file, when exactly one exists.
    pub fn notes_file(&self) -> Option<&ClassifiedFile> {
        match self.notes_status() {
            NotesStatus::Present => self
                .global_files
                .iter()
                .find(|f| f.category == FileCategory::NotesText),
            _ => None,
        }
    }

    /// Filter names in first-seen order.
    pub fn filter_names(&self) -> Vec<&str> {
        self.filter_groups
            .iter()
            .map(|g| g.filter_name.as_str())
            .collect()
    }
}
