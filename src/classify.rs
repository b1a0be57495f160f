//! # File classification
//!
//! Maps a parsed filename to its semantic category by matching the filetype
//! tail against a fixed, ordered suffix table. The table order is also the
//! category order used for file uploads, so required entries come first.
//!
//! Matching is case-sensitive and exact: the whole tail must equal a table
//! suffix. A decorated tail such as `v2_measurements.tbl` is unrecognized,
//! never a measurement table with extra tokens.

use crate::filename::ParsedFilename;

/// Semantic file categories of an SG1 observation package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    MeasurementsTable,
    PlotConfig,
    Radec,
    CompstarLightcurve,
    FieldImage,
    FieldZoomImage,
    SeeingProfile,
    PlateSolvedFits,
    NotesText,
    LightcurvePlot,
    NebTable,
    NebCheckZip,
    DmagRmsPlot,
    SubsetCsv,
    /// Tail not in the suffix table. Attributed to its filter for reporting
    /// but excluded from all required/optional accounting.
    Unrecognized,
}

/// Whether a category belongs to one filter or to the whole package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    PerFilter,
    Global,
}

/// One row of the classification table.
#[derive(Debug, Clone, Copy)]
pub struct SuffixSpec {
    pub suffix: &'static str,
    pub category: FileCategory,
    pub scope: Scope,
    pub required: bool,
    /// Portal label, used in the report preview and as the upload description.
    pub description: &'static str,
}

/// The classification table. Row order is the fixed category order for file
/// uploads: required categories first, then optional ones.
pub const SUFFIX_TABLE: [SuffixSpec; 14] = [
    SuffixSpec {
        suffix: "_measurements.tbl",
        category: FileCategory::MeasurementsTable,
        scope: Scope::PerFilter,
        required: true,
        description: "AstroImageJ Photometry Measurement Table",
    },
    SuffixSpec {
        suffix: "_measurements.plotcfg",
        category: FileCategory::PlotConfig,
        scope: Scope::PerFilter,
        required: true,
        description: "AstroImageJ Plot Configuration File",
    },
    SuffixSpec {
        suffix: "_measurements.radec",
        category: FileCategory::Radec,
        scope: Scope::PerFilter,
        required: true,
        description: "AstroImageJ Photometry Aperture File",
    },
    SuffixSpec {
        suffix: "_compstar-lightcurves.png",
        category: FileCategory::CompstarLightcurve,
        scope: Scope::PerFilter,
        required: true,
        description: "Compstar Light Curve Plots",
    },
    SuffixSpec {
        suffix: "_field.png",
        category: FileCategory::FieldImage,
        scope: Scope::PerFilter,
        required: true,
        description: "Field Image with Apertures",
    },
    SuffixSpec {
        suffix: "_field-zoom.png",
        category: FileCategory::FieldZoomImage,
        scope: Scope::PerFilter,
        required: true,
        description: "Zoomed-in FOV",
    },
    SuffixSpec {
        suffix: "_seeing-profile.png",
        category: FileCategory::SeeingProfile,
        scope: Scope::PerFilter,
        required: true,
        description: "Seeing Profile",
    },
    SuffixSpec {
        suffix: "_WCS.fits",
        category: FileCategory::PlateSolvedFits,
        scope: Scope::PerFilter,
        required: true,
        description: "Plate-Solved Image",
    },
    SuffixSpec {
        suffix: "_notes.txt",
        category: FileCategory::NotesText,
        scope: Scope::Global,
        required: true,
        description: "Notes and Results Text",
    },
    SuffixSpec {
        suffix: "_lightcurve.png",
        category: FileCategory::LightcurvePlot,
        scope: Scope::PerFilter,
        required: false,
        description: "Light Curve Plot",
    },
    SuffixSpec {
        suffix: "_measurements_NEB-table.txt",
        category: FileCategory::NebTable,
        scope: Scope::PerFilter,
        required: false,
        description: "NEB Table",
    },
    SuffixSpec {
        suffix: "_measurements_NEBcheck.zip",
        category: FileCategory::NebCheckZip,
        scope: Scope::PerFilter,
        required: false,
        description: "NEB Depth Plots",
    },
    SuffixSpec {
        suffix: "_measurements_dmagRMS-plot.png",
        category: FileCategory::DmagRmsPlot,
        scope: Scope::PerFilter,
        required: false,
        description: "Dmag vs. RMS Plot",
    },
    SuffixSpec {
        suffix: "_subset.csv",
        category: FileCategory::SubsetCsv,
        scope: Scope::PerFilter,
        required: false,
        description: "Photometry Table Subset for Joint Fitting",
    },
];

impl FileCategory {
    /// Table row for this category, if it has one.
    pub fn spec(&self) -> Option<&'static SuffixSpec> {
        SUFFIX_TABLE.iter().find(|s| s.category == *self)
    }

    pub fn scope(&self) -> Scope {
        self.spec().map(|s| s.scope).unwrap_or(Scope::PerFilter)
    }

    pub fn required(&self) -> bool {
        self.spec().map(|s| s.required).unwrap_or(false)
    }

    /// Portal label for this category.
    pub fn description(&self) -> &'static str {
        self.spec()
            .map(|s| s.description)
            .unwrap_or("Unrecognized filetype token")
    }

    /// Required per-filter categories, in table order.
    pub fn required_per_filter() -> impl Iterator<Item = FileCategory> {
        SUFFIX_TABLE
            .iter()
            .filter(|s| s.required && s.scope == Scope::PerFilter)
            .map(|s| s.category)
    }

    /// Optional per-filter categories, in table order.
    pub fn optional_per_filter() -> impl Iterator<Item = FileCategory> {
        SUFFIX_TABLE
            .iter()
            .filter(|s| !s.required && s.scope == Scope::PerFilter)
            .map(|s| s.category)
    }
}

/// A parsed filename with its derived category and scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFile {
    pub parsed: ParsedFilename,
    pub category: FileCategory,
    pub scope: Scope,
}

impl ClassifiedFile {
    pub fn raw_name(&self) -> &str {
        &self.parsed.raw_name
    }
}

/// Classify a parsed filename by its filetype tail.
///
/// The tail must equal a table suffix (sans its leading underscore) outright;
/// anything else is [`FileCategory::Unrecognized`].
pub fn classify(parsed: ParsedFilename) -> ClassifiedFile {
    let best = SUFFIX_TABLE
        .iter()
        .find(|s| s.suffix[1..] == parsed.file_type_suffix);

    match best {
        Some(spec) => ClassifiedFile {
            parsed,
            category: spec.category,
            scope: spec.scope,
        },
        None => ClassifiedFile {
            parsed,
            category: FileCategory::Unrecognized,
            scope: Scope::PerFilter,
        },
    }
}
