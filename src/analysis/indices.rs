//! Derived spectral indices over Sentinel-2 surface reflectance.

use crate::analysis::aggregator::normalized_difference;
use crate::models::BandReading;
use std::collections::BTreeMap;

/// Indices reported next to the raw bands, in output order.
pub const INDEX_NAMES: [&str; 14] = [
    "NDVI_G",
    "NDWI",
    "PSRI",
    "TBVI1",
    "NDVIRE1n",
    "NDVIRE2n",
    "NDVIRE3n",
    "SR_n2",
    "SR_N",
    "BI",
    "CI",
    "SI",
    "B8_minus_B4",
    "NDVI_G_times_PSRI",
];

fn ratio(num: f64, den: f64) -> Option<f64> {
    if den == 0.0 {
        None
    } else {
        Some(num / den)
    }
}

/// Compute one named index. `None` if an input band is missing or a
/// denominator is zero.
pub fn compute_index(name: &str, bands: &BandReading) -> Option<f64> {
    let b = |band: &str| bands.get(band);
    let b8 = || bands.nir();
    let b4 = || bands.red();

    match name {
        "NDVI_G" => normalized_difference(b8()?, b("B3")?),
        "NDWI" => normalized_difference(b("B3")?, b8()?),
        "PSRI" => ratio(b4()? - b("B2")?, b("B6")?),
        "TBVI1" => Some((b("B6")? + 0.5 * b("B5")? - 0.5 * b("B2")?) / 2.0),
        "NDVIRE1n" => normalized_difference(b8()?, b("B5")?),
        "NDVIRE2n" => normalized_difference(b8()?, b("B6")?),
        "NDVIRE3n" => normalized_difference(b8()?, b("B7")?),
        "SR_n2" => ratio(b8()?, b4()?),
        "SR_N" => ratio(b8()?, b("B5")?),
        "BI" => Some((b("B11")?.powi(2) + b("B12")?.powi(2)).sqrt() / 2.0),
        // Chlorophyll index is published as its own output, sharing the
        // red-edge 2 formula.
        "CI" => compute_index("NDVIRE2n", bands),
        "SI" => ratio(b("B11")?, b("B12")?),
        "B8_minus_B4" => Some(b8()? - b4()?),
        "NDVI_G_times_PSRI" => {
            Some(compute_index("NDVI_G", bands)? * compute_index("PSRI", bands)?)
        }
        _ => None,
    }
}

/// Compute every index in [`INDEX_NAMES`] that is defined for `bands`.
pub fn compute_indices(bands: &BandReading) -> BTreeMap<String, f64> {
    INDEX_NAMES
        .iter()
        .filter_map(|name| compute_index(name, bands).map(|v| (name.to_string(), v)))
        .collect()
}
