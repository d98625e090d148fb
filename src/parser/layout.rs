//! Structural assumptions about the report markup. Everything that breaks
//! when the site's templates change lives here.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;

pub static LABEL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.field-label").unwrap());

pub static VALUE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.field-item.even").unwrap());

pub static SCRIPT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[type="text/javascript"]"#).unwrap());

/// Longest run of non-digits ending in the ':' separator.
pub static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\D+):").unwrap());

/// Label whose value is rebuilt from the map script instead of the item list.
pub const COORDINATES_LABEL: &str = "Coordinates";

/// Value elements containing this are map widgets, not field data.
pub const MAP_WIDGET_MARKER: &str = "OpenLayers";

/// Script blocks containing this carry the report's geometry.
pub const GEOMETRY_MARKER: &str = "wkt";

pub const LAT_LABEL: &str = "Lat";
pub const LON_LABEL: &str = "Lon";

/// `(LON LAT` with both tokens decimal numbers.
pub static PRIMARY_COORDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((-?\d+\.\d+)\s+(-?\d+\.\d+)").unwrap());

/// `(TOKEN TOKEN)` with nothing else inside the parentheses.
pub static FALLBACK_COORDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^\s()]+)\s+([^\s()]+)\)").unwrap());
