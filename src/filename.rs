//! # SG1 filename grammar
//!
//! Every file in an SG1 observation package follows one strict naming scheme:
//!
//! ```text
//! TIC<digits>-<pp>_<yyyymmdd>_<observatory>_<filter>[_<N>px]_<filetype tail>
//! ```
//!
//! * `pp` — two-digit planet index, matching the TIC/TOI arguments of the run.
//! * `yyyymmdd` — eight digits; no calendar validation beyond the digit count.
//! * `observatory` — non-empty token over `[A-Za-z0-9-]`.
//! * `filter` — non-empty photometric band token over `[A-Za-z0-9+-]`.
//! * `_<N>px` — optional aperture tag in pixels, directly before the tail.
//! * tail — the filetype suffix matched by [`classify`](crate::classify).
//!
//! [`parse`] is a pure function: it either yields a fully populated
//! [`ParsedFilename`] or a [`ParseFailure`], never a partial record.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// Shape of an SG1 filename. Planet index and date are captured loosely so
/// that their length can be checked separately and reported precisely.
static FILENAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^TIC(?P<tic>\d+)-(?P<pp>\d+)_(?P<ymd>\d+)_(?P<obs>[A-Za-z0-9\-]+)_(?P<flt>[A-Za-z0-9\-\+]+)(?:_(?P<px>\d+)px)?_(?P<tail>.+)$",
    )
    .expect("valid regex")
});

/// One filename decomposed against the SG1 grammar. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFilename {
    /// TIC catalog number, digits only.
    pub tic_digits: String,
    /// Two-digit planet index.
    pub planet_index: String,
    /// Observation date, `YYYYMMDD`.
    pub date: String,
    /// Observatory token.
    pub observatory: String,
    /// Photometric filter token.
    pub filter: String,
    /// Optional `_<N>px` aperture tag, in pixels.
    pub aperture_tag_px: Option<u32>,
    /// Filetype tail, without the leading underscore.
    pub file_type_suffix: String,
    /// The filename as listed.
    pub raw_name: String,
}

impl ParsedFilename {
    /// `TIC<digits>-<pp>` prefix of this file, compared against the run target.
    pub fn target_prefix(&self) -> String {
        format!("TIC{}-{}", self.tic_digits, self.planet_index)
    }
}

/// Why a filename was rejected by the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFailure {
    /// The name does not have the `TIC..-.._.._.._.._..` shape at all.
    MalformedStructure,
    /// Planet index present but not exactly two digits.
    InvalidPlanetIndex,
    /// Date present but not exactly eight digits.
    InvalidDate,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ParseFailure::MalformedStructure => "Name does not match pattern",
            ParseFailure::InvalidPlanetIndex => "Planet index must be exactly 2 digits",
            ParseFailure::InvalidDate => "Date must be exactly 8 digits",
        };
        f.write_str(msg)
    }
}

/// Parse one filename against the SG1 grammar.
///
/// Arguments
/// -----------------
/// * `raw_name`: the filename as listed in the observation directory.
///
/// Return
/// ----------
/// * The decomposed [`ParsedFilename`], or the first [`ParseFailure`] found.
pub fn parse(raw_name: &str) -> Result<ParsedFilename, ParseFailure> {
    let caps = FILENAME
        .captures(raw_name)
        .ok_or(ParseFailure::MalformedStructure)?;

    let planet_index = &caps["pp"];
    if planet_index.len() != 2 {
        return Err(ParseFailure::InvalidPlanetIndex);
    }
    let date = &caps["ymd"];
    if date.len() != 8 {
        return Err(ParseFailure::InvalidDate);
    }

    let aperture_tag_px = caps
        .name("px")
        .map(|m| m.as_str().parse::<u32>())
        .transpose()
        .map_err(|_| ParseFailure::MalformedStructure)?;

    Ok(ParsedFilename {
        tic_digits: caps["tic"].to_string(),
        planet_index: planet_index.to_string(),
        date: date.to_string(),
        observatory: caps["obs"].to_string(),
        filter: caps["flt"].to_string(),
        aperture_tag_px,
        file_type_suffix: caps["tail"].to_string(),
        raw_name: raw_name.to_string(),
    })
}
