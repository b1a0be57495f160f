//! # Plate-solved image pixel scales
//!
//! Minimal FITS primary-header reader, just enough to derive the per-axis
//! pixel scales of a plate-solved image from its world-coordinate transform.
//!
//! FITS headers are 2880-byte blocks of 80-character keyword records ending
//! with `END`. The transform is taken from the `CD` matrix when present,
//! otherwise from `CDELT` with the optional `PC` rotation; per-axis scales
//! are the column norms of the matrix, converted from degrees to arcseconds.

use std::fs::File;
use std::io::Read;

use camino::Utf8Path;

use crate::errors::Sg1Error;

const BLOCK_SIZE: usize = 2880;
const CARD_SIZE: usize = 80;

/// Headers larger than this are treated as not being a FITS file at all.
const MAX_HEADER_BLOCKS: usize = 64;

/// Look up a numeric header value.
fn header_f64(cards: &[(String, String)], key: &str) -> Option<f64> {
    cards
        .iter()
        .find(|(k, _)| k == key)
        .and_then(|(_, v)| v.parse::<f64>().ok())
}

/// Read primary-header cards until the `END` record.
///
/// Returns `None` when no `END` shows up within [`MAX_HEADER_BLOCKS`], which
/// means the file is not a FITS header we can use.
fn read_header(file: &mut File) -> Result<Option<Vec<(String, String)>>, Sg1Error> {
    let mut cards = Vec::new();
    let mut block = [0u8; BLOCK_SIZE];

    for _ in 0..MAX_HEADER_BLOCKS {
        let mut filled = 0;
        while filled < BLOCK_SIZE {
            let n = file.read(&mut block[filled..])?;
            if n == 0 {
                return Ok(None);
            }
            filled += n;
        }

        for card in block.chunks_exact(CARD_SIZE) {
            let key = String::from_utf8_lossy(&card[..8]).trim().to_string();
            if key == "END" {
                return Ok(Some(cards));
            }
            if key.is_empty() || !card[8..].starts_with(b"= ") {
                continue;
            }
            // Strip the inline comment; none of the keys we care about hold
            // strings, so a '/' always starts the comment.
            let text = String::from_utf8_lossy(&card[10..]);
            let value = text.split('/').next().unwrap_or("").trim().to_string();
            cards.push((key, value));
        }
    }
    Ok(None)
}

/// Per-axis scales in degrees/pixel from the WCS linear transform.
fn transform_scales(cards: &[(String, String)]) -> Option<[f64; 2]> {
    let cd = [
        header_f64(cards, "CD1_1"),
        header_f64(cards, "CD1_2"),
        header_f64(cards, "CD2_1"),
        header_f64(cards, "CD2_2"),
    ];
    if cd.iter().any(Option::is_some) {
        let [cd11, cd12, cd21, cd22] = cd.map(|v| v.unwrap_or(0.0));
        return Some([cd11.hypot(cd21), cd12.hypot(cd22)]);
    }

    let cdelt1 = header_f64(cards, "CDELT1")?;
    let cdelt2 = header_f64(cards, "CDELT2")?;
    let pc11 = header_f64(cards, "PC1_1").unwrap_or(1.0);
    let pc12 = header_f64(cards, "PC1_2").unwrap_or(0.0);
    let pc21 = header_f64(cards, "PC2_1").unwrap_or(0.0);
    let pc22 = header_f64(cards, "PC2_2").unwrap_or(1.0);
    Some([
        cdelt1.abs() * pc11.hypot(pc21),
        cdelt2.abs() * pc12.hypot(pc22),
    ])
}

/// Derive the per-axis pixel scales of a plate-solved image, in
/// arcseconds/pixel.
///
/// Return
/// ----------
/// * `Ok(Some([s1, s2]))` when the header carries a usable transform with
///   finite, positive scales.
/// * `Ok(None)` when the file is not a FITS header or the transform is
///   missing or degenerate. The caller tries the next plate-solved image.
pub fn read_pixel_scales(path: &Utf8Path) -> Result<Option<[f64; 2]>, Sg1Error> {
    let mut file = File::open(path)?;
    let Some(cards) = read_header(&mut file)? else {
        return Ok(None);
    };
    let Some(scales_deg) = transform_scales(&cards) else {
        return Ok(None);
    };
    let scales = scales_deg.map(|s| s * 3600.0);
    if scales.iter().all(|s| s.is_finite() && *s > 0.0) {
        Ok(Some(scales))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
pub(crate) fn write_test_header(cards: &[(&str, &str)]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for (key, value) in cards {
        let card = format!("{key:<8}= {value}");
        bytes.extend_from_slice(format!("{card:<80}").as_bytes());
    }
    bytes.extend_from_slice(format!("{:<80}", "END").as_bytes());
    while bytes.len() % BLOCK_SIZE != 0 {
        bytes.push(b' ');
    }
    bytes
}
