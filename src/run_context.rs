//! # Run context
//!
//! [`RunContext`] carries the per-run parameters every stage of the pipeline
//! consults: the parsed TIC/TOI target, the uploader identity, the observation
//! coverage, and the fixed upload group and proprietary period.
//!
//! It is built once from the command-line arguments, validated eagerly, and
//! passed by reference into [`DirectoryRecord::build`](crate::directory::DirectoryRecord::build)
//! and [`UploadPlan::plan`](crate::plan::UploadPlan::plan). There is no
//! process-wide run state.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::Sg1Error;

/// Fixed ExoFOP upload group for SG1 submissions.
pub const UPLOAD_GROUP: &str = "tfopwg";

/// Fixed proprietary period attached to uploaded data, in months.
pub const PROPRIETARY_PERIOD_MONTHS: u32 = 12;

/// TIC/TOI identifiers look like `12345678.01`: catalog number, dot,
/// two-digit planet index.
static TARGET_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\.(\d{2})$").expect("valid regex"));

/// Transit coverage of the observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    Full,
    Ingress,
    Egress,
    OutOfTransit,
}

impl Coverage {
    /// Parse a user-supplied coverage string, case-insensitively.
    /// Unknown values fall back to [`Coverage::Full`].
    pub fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "ingress" => Coverage::Ingress,
            "egress" => Coverage::Egress,
            "out of transit" => Coverage::OutOfTransit,
            _ => Coverage::Full,
        }
    }

    /// Portal label for this coverage.
    pub fn label(&self) -> &'static str {
        match self {
            Coverage::Full => "Full",
            Coverage::Ingress => "Ingress",
            Coverage::Egress => "Egress",
            Coverage::OutOfTransit => "Out of Transit",
        }
    }
}

/// Immutable parameters of one upload run.
///
/// Fields keep the original string form supplied by the operator; only the
/// TIC/TOI identifiers are decomposed, so that the filename predicate and the
/// summary payload can reuse their parts.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// TIC catalog number, digits only.
    pub tic_digits: String,
    /// Two-digit planet index shared by the TIC and TOI identifiers.
    pub planet_index: String,
    /// Full TOI identifier (`"1234.01"`), absent when the run has no TOI.
    pub toi: Option<String>,
    /// ExoFOP account name, used in the upload tag.
    pub username: String,
    pub coverage: Coverage,
    /// Telescope aperture size in meters, kept as given.
    pub telescope_size: String,
    pub camera: String,
    /// Upload group name, normally [`UPLOAD_GROUP`].
    pub group: String,
    pub proprietary_months: u32,
}

impl RunContext {
    /// Validate and decompose the TIC/TOI arguments into a run context.
    ///
    /// Arguments
    /// -----------------
    /// * `tic`: TIC identifier with planet index, e.g. `"12345678.01"`.
    /// * `toi`: TOI identifier in the same form, or `"0"` when the target has
    ///   no TOI.
    /// * `username`: ExoFOP account name.
    /// * `coverage`: transit coverage of the observation.
    /// * `telescope_size`: telescope aperture in meters (free-form string).
    /// * `camera`: camera name (free-form string).
    ///
    /// Return
    /// ----------
    /// * A validated [`RunContext`], or an error when an identifier is
    ///   malformed or the two planet indices disagree.
    pub fn new(
        tic: &str,
        toi: &str,
        username: &str,
        coverage: Coverage,
        telescope_size: &str,
        camera: &str,
    ) -> Result<Self, Sg1Error> {
        let tic = tic.trim();
        let toi = toi.trim();

        let tic_caps = TARGET_ID
            .captures(tic)
            .ok_or_else(|| Sg1Error::InvalidTargetId(tic.to_string()))?;
        let tic_digits = tic_caps[1].to_string();
        let planet_index = tic_caps[2].to_string();

        let toi = if toi == "0" {
            None
        } else {
            let toi_caps = TARGET_ID
                .captures(toi)
                .ok_or_else(|| Sg1Error::InvalidTargetId(toi.to_string()))?;
            if toi_caps[2] != *planet_index {
                return Err(Sg1Error::PlanetIndexMismatch {
                    tic: planet_index,
                    toi: toi_caps[2].to_string(),
                });
            }
            Some(toi.to_string())
        };

        Ok(RunContext {
            tic_digits,
            planet_index,
            toi,
            username: username.to_string(),
            coverage,
            telescope_size: telescope_size.to_string(),
            camera: camera.to_string(),
            group: UPLOAD_GROUP.to_string(),
            proprietary_months: PROPRIETARY_PERIOD_MONTHS,
        })
    }

    /// Filename prefix every file of this run must carry: `TIC<digits>-<pp>`.
    pub fn target_prefix(&self) -> String {
        format!("TIC{}-{}", self.tic_digits, self.planet_index)
    }

    /// TOI label transmitted to the portal (`"TOI1234.01"`), empty when the
    /// run has no TOI.
    pub fn toi_upload_label(&self) -> String {
        self.toi
            .as_deref()
            .map(|t| format!("TOI{t}"))
            .unwrap_or_default()
    }

    /// Human-readable title of the target for console output.
    pub fn target_title(&self) -> String {
        match &self.toi {
            Some(toi) => format!(
                "TIC {}.{} (TOI {})",
                self.tic_digits, self.planet_index, toi
            ),
            None => format!(
                "TIC {}.{} (no TOI identifier)",
                self.tic_digits, self.planet_index
            ),
        }
    }

    /// Upload tag shared by all operations of one run:
    /// `<date>_<username>_tic<digits>_<pp>`.
    pub fn upload_tag(&self, date: &str) -> String {
        format!(
            "{date}_{}_tic{}_{}",
            self.username, self.tic_digits, self.planet_index
        )
    }
}
