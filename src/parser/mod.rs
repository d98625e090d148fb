pub mod coords;
pub mod fields;
pub mod layout;

use scraper::Html;

use crate::error::ExtractError;
use crate::record::{FieldRecord, ReportId, REPORT_NUMBER_LABEL};
use layout::{LAT_LABEL, LON_LABEL};

/// Report markup → labelled record: labels, values, coordinates, report number.
pub fn extract_report(id: &ReportId, html: &str) -> Result<FieldRecord, ExtractError> {
    let doc = Html::parse_document(html);

    let mut labels = fields::labels(&doc)?;
    let mut values = fields::values(&doc);

    if let Some(point) = coords::resolve(&fields::scripts(&doc))? {
        labels.extend([LAT_LABEL.to_string(), LON_LABEL.to_string()]);
        values.extend([point.lat, point.lon]);
    }

    labels.push(REPORT_NUMBER_LABEL.to_string());
    values.push(id.to_string());

    FieldRecord::new(id.clone(), labels, values)
}

// ── Tests ──
