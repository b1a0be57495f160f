//! # Derived observation statistics
//!
//! Computes the four derived statistics of one filter group from its primary
//! measurement table and plate-solved image:
//!
//! * photometric aperture radius (median `Source_Radius`, 0.1 px resolution),
//! * pixel scale (mean of the two per-axis WCS scales, arcsec/px),
//! * observation duration in whole minutes, padded by half an exposure on
//!   each end,
//! * number of data rows.
//!
//! Failures are per filter: they block that filter's summary upload only and
//! never abort the run.

use thiserror::Error;

use crate::table::MeasurementTable;

const SECONDS_PER_DAY: f64 = 86_400.0;
const MINUTES_PER_DAY: f64 = 24.0 * 60.0;

/// Why statistics could not be derived for one filter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComputeFailure {
    #[error("no measurement table found")]
    NoMeasurementTable,

    #[error("primary measurement table could not be read: {0}")]
    UnreadableTable(String),

    #[error("measurement table has no data rows")]
    EmptyTable,

    #[error("required column {0} not found in measurement table")]
    MissingColumn(&'static str),

    #[error("no valid WCS solution found in Plate-Solved Image")]
    MissingOrInvalidWcs,
}

/// Derived statistics of one filter group. Computed once, read-only after.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    /// Median source radius, rounded to one decimal place.
    pub aperture_radius_px: f64,
    /// True when the radius column varies across rows.
    pub radius_was_variable: bool,
    /// Mean of the two per-axis pixel scales, arcseconds per pixel.
    pub pixel_scale_arcsec_per_px: f64,
    /// Observation duration, rounded to the nearest minute.
    pub duration_minutes: i64,
    /// Number of data rows in the primary table.
    pub row_count: usize,
}

/// NaN-ignoring median. `None` when no finite value exists.
pub fn nan_median(values: &[f64]) -> Option<f64> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    finite.sort_by(f64::total_cmp);
    let mid = finite.len() / 2;
    if finite.len() % 2 == 1 {
        Some(finite[mid])
    } else {
        Some((finite[mid - 1] + finite[mid]) / 2.0)
    }
}

/// Whether a radius column counts as time-variable: its finite values span a
/// non-zero range, or it has no finite values at all.
pub fn column_varies(values: &[f64]) -> bool {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.iter().copied().filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    !min.is_finite() || max - min > 0.0
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Observation duration in whole minutes: first to last `JD_UTC`, padded by
/// half the first and last exposure.
fn duration_minutes(jd_utc: &[f64], exposure_s: Option<&[f64]>) -> i64 {
    let (t0, t1) = (jd_utc[0], jd_utc[jd_utc.len() - 1]);
    let (e0, e1) = match exposure_s {
        Some(e) if !e.is_empty() => (e[0], e[e.len() - 1]),
        _ => (0.0, 0.0),
    };
    let start = t0 - 0.5 * e0 / SECONDS_PER_DAY;
    let end = t1 + 0.5 * e1 / SECONDS_PER_DAY;
    ((end - start) * MINUTES_PER_DAY).round() as i64
}

/// Compute the statistics of one filter group.
///
/// Arguments
/// -----------------
/// * `table`: the primary measurement table.
/// * `pixel_scales`: per-axis WCS scales in arcsec/px from the first usable
///   plate-solved image, `None` when no image was usable.
///
/// Return
/// ----------
/// * The derived [`Statistics`], or the [`ComputeFailure`] that blocks this
///   filter's summary.
pub fn compute(
    table: &MeasurementTable,
    pixel_scales: Option<[f64; 2]>,
) -> Result<Statistics, ComputeFailure> {
    if table.row_count() == 0 {
        return Err(ComputeFailure::EmptyTable);
    }

    let radius = table
        .column("Source_Radius")
        .ok_or(ComputeFailure::MissingColumn("Source_Radius"))?;
    // A column of NaNs is as good as absent.
    let median_radius =
        nan_median(radius).ok_or(ComputeFailure::MissingColumn("Source_Radius"))?;

    let jd_utc = table
        .column("JD_UTC")
        .ok_or(ComputeFailure::MissingColumn("JD_UTC"))?;

    let scales = pixel_scales.ok_or(ComputeFailure::MissingOrInvalidWcs)?;

    Ok(Statistics {
        aperture_radius_px: round_to_tenth(median_radius),
        radius_was_variable: column_varies(radius),
        pixel_scale_arcsec_per_px: (scales[0] + scales[1]) / 2.0,
        duration_minutes: duration_minutes(jd_utc, table.exposure_column()),
        row_count: table.row_count(),
    })
}

/// Round to two significant digits and format as a plain decimal string, the
/// portal convention for the pixel scale. Integer-valued results keep a
/// trailing `.0`.
pub fn format_two_significant(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return "0.0".to_string();
    }
    let magnitude = value.abs().log10().floor() as i32;
    let factor = 10f64.powi(1 - magnitude);
    let rounded = (value * factor).round() / factor;
    if rounded.fract() == 0.0 {
        format!("{rounded:.1}")
    } else {
        format!("{rounded}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::MeasurementTable;
    use approx::assert_relative_eq;

    fn table_with(radius: Vec<f64>, jd: Vec<f64>, exptime: Option<Vec<f64>>) -> MeasurementTable {
        let mut columns = vec![("Source_Radius", radius), ("JD_UTC", jd)];
        if let Some(e) = exptime {
            columns.push(("EXPTIME", e));
        }
        MeasurementTable::from_columns(columns)
    }

    const SCALES: Option<[f64; 2]> = Some([0.38, 0.40]);

    #[test]
    fn aperture_radius_is_median_rounded_to_one_decimal() {
        let table = table_with(
            vec![3.41, 3.47, 3.52],
            vec![2460000.50, 2460000.51, 2460000.52],
            Some(vec![30.0, 30.0, 30.0]),
        );
        let stats = compute(&table, SCALES).unwrap();
        assert_relative_eq!(stats.aperture_radius_px, 3.5);
        assert!(stats.radius_was_variable);
        assert_eq!(stats.row_count, 3);
    }

    #[test]
    fn constant_radius_is_not_variable() {
        let table = table_with(
            vec![4.0, 4.0],
            vec![2460000.5, 2460000.6],
            Some(vec![30.0, 30.0]),
        );
        let stats = compute(&table, SCALES).unwrap();
        assert!(!stats.radius_was_variable);
        assert_relative_eq!(stats.aperture_radius_px, 4.0);
    }

    #[test]
    fn nan_rows_are_ignored_by_the_median_but_flag_variability() {
        let table = table_with(
            vec![f64::NAN, 3.0, 3.0],
            vec![2460000.5, 2460000.6, 2460000.7],
            None,
        );
        let stats = compute(&table, SCALES).unwrap();
        assert_relative_eq!(stats.aperture_radius_px, 3.0);
        assert!(!stats.radius_was_variable);
        assert!(column_varies(&[f64::NAN]));
    }

    #[test]
    fn duration_pads_half_an_exposure_on_each_end() {
        // 0.05 d between first and last sample plus 30 s of exposure padding:
        // 72 min + 0.5 min = 72.5, rounded to 73.
        let table = table_with(
            vec![3.0, 3.0],
            vec![2460000.50, 2460000.55],
            Some(vec![30.0, 30.0]),
        );
        let stats = compute(&table, SCALES).unwrap();
        assert_eq!(stats.duration_minutes, 73);
    }

    #[test]
    fn missing_exposure_column_means_no_padding() {
        let table = table_with(vec![3.0, 3.0], vec![2460000.50, 2460000.55], None);
        let stats = compute(&table, SCALES).unwrap();
        assert_eq!(stats.duration_minutes, 72);
    }

    #[test]
    fn pixel_scale_is_the_mean_of_both_axes() {
        let table = table_with(vec![3.0], vec![2460000.5], None);
        let stats = compute(&table, SCALES).unwrap();
        assert_relative_eq!(stats.pixel_scale_arcsec_per_px, 0.39);
    }

    #[test]
    fn missing_wcs_blocks_the_filter() {
        let table = table_with(vec![3.0], vec![2460000.5], None);
        assert_eq!(
            compute(&table, None),
            Err(ComputeFailure::MissingOrInvalidWcs)
        );
    }

    #[test]
    fn missing_columns_are_reported_by_name() {
        let no_radius = MeasurementTable::from_columns(vec![("JD_UTC", vec![2460000.5])]);
        assert_eq!(
            compute(&no_radius, SCALES),
            Err(ComputeFailure::MissingColumn("Source_Radius"))
        );
        let no_jd = MeasurementTable::from_columns(vec![("Source_Radius", vec![3.0])]);
        assert_eq!(
            compute(&no_jd, SCALES),
            Err(ComputeFailure::MissingColumn("JD_UTC"))
        );
        let empty = MeasurementTable::from_columns(vec![]);
        assert_eq!(compute(&empty, SCALES), Err(ComputeFailure::EmptyTable));
    }

    #[test]
    fn two_significant_digit_formatting() {
        assert_eq!(format_two_significant(0.3932), "0.39");
        assert_eq!(format_two_significant(1.267), "1.3");
        assert_eq!(format_two_significant(0.0), "0.0");
    }

    #[test]
    fn integer_valued_scales_keep_a_trailing_zero() {
        assert_eq!(format_two_significant(12.4), "12.0");
        assert_eq!(format_two_significant(2.04), "2.0");
        assert_eq!(format_two_significant(120.0), "120.0");
    }
}
