use crate::error::ExtractError;
use crate::record::GeoPoint;

use super::layout::{FALLBACK_COORDS_RE, GEOMETRY_MARKER, PRIMARY_COORDS_RE};

/// Reads the point from the last script carrying the geometry marker.
///
/// `Ok(None)` when no script has the marker. A marked script whose
/// coordinates match neither pattern is a `CoordinateParse` error.
pub fn resolve<S: AsRef<str>>(scripts: &[S]) -> Result<Option<GeoPoint>, ExtractError> {
    let Some(script) = scripts
        .iter()
        .map(|s| s.as_ref())
        .filter(|s: &&str| s.contains(GEOMETRY_MARKER))
        .last()
    else {
        return Ok(None);
    };

    primary(script)
        .or_else(|| fallback(script))
        .map(Some)
        .ok_or(ExtractError::CoordinateParse)
}

pub fn primary(script: &str) -> Option<GeoPoint> {
    let caps = PRIMARY_COORDS_RE.captures(script)?;
    Some(GeoPoint {
        lon: caps[1].to_string(),
        lat: caps[2].to_string(),
    })
}

pub fn fallback(script: &str) -> Option<GeoPoint> {
    let caps = FALLBACK_COORDS_RE.captures(script)?;
    Some(GeoPoint {
        lon: caps[1].to_string(),
        lat: caps[2].to_string(),
    })
}
