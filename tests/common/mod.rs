use std::fs;
use std::path::Path;

/// Minimal FITS primary header: 80-character cards padded to a 2880-byte
/// block, ending with END.
pub fn fits_header(cards: &[(&str, &str)]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for (key, value) in cards {
        let card = format!("{key:<8}= {value}");
        bytes.extend_from_slice(format!("{card:<80}").as_bytes());
    }
    bytes.extend_from_slice(format!("{:<80}", "END").as_bytes());
    while bytes.len() % 2880 != 0 {
        bytes.push(b' ');
    }
    bytes
}

/// A plate-solved header with 0.0001 deg/px on both axes (0.36 arcsec/px).
pub fn solved_header() -> Vec<u8> {
    fits_header(&[
        ("SIMPLE", "T"),
        ("BITPIX", "16"),
        ("CD1_1", "0.0001"),
        ("CD2_2", "0.0001"),
    ])
}

/// Tab-separated AstroImageJ-style measurement table.
pub fn table_bytes(radii: &[f64], jd: &[f64], exptime: f64) -> Vec<u8> {
    let mut text = String::from("idx\tJD_UTC\tSource_Radius\tEXPTIME\n");
    for (i, (r, t)) in radii.iter().zip(jd).enumerate() {
        text.push_str(&format!("{}\t{t}\t{r}\t{exptime}\n", i + 1));
    }
    text.into_bytes()
}

pub fn write_files(dir: &Path, files: &[(&str, &[u8])]) {
    for (name, bytes) in files {
        fs::write(dir.join(name), bytes).unwrap();
    }
}

/// The full required per-filter file set, with the given measurement table.
pub fn required_set(dir: &Path, filter: &str, table: &[u8]) {
    let prefix = format!("TIC12345678-01_20240101_ObsA_{filter}");
    let solved = solved_header();
    write_files(
        dir,
        &[
            (format!("{prefix}_measurements.tbl").as_str(), table),
            (format!("{prefix}_measurements.plotcfg").as_str(), b"cfg"),
            (format!("{prefix}_measurements.radec").as_str(), b"radec"),
            (format!("{prefix}_compstar-lightcurves.png").as_str(), b"png"),
            (format!("{prefix}_field.png").as_str(), b"png"),
            (format!("{prefix}_field-zoom.png").as_str(), b"png"),
            (format!("{prefix}_seeing-profile.png").as_str(), b"png"),
            (format!("{prefix}_WCS.fits").as_str(), solved.as_slice()),
        ],
    );
}
