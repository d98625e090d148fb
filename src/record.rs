use std::fmt;

use crate::error::ExtractError;

/// Label carried by every accepted record.
pub const REPORT_NUMBER_LABEL: &str = "UAC Report Number";

/// Five-digit report number taken from a `/avalanches/NNNNN` link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReportId(String);

impl ReportId {
    /// Accepts exactly five ASCII digits.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.len() == 5 && s.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(s.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coordinates kept as the source text; never round-tripped through floats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoPoint {
    pub lon: String,
    pub lat: String,
}

/// One report's fields, labels and values paired by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRecord {
    id: ReportId,
    labels: Vec<String>,
    values: Vec<String>,
}

impl FieldRecord {
    /// Fails with `FieldCountMismatch` unless both lists have the same length.
    pub fn new(id: ReportId, labels: Vec<String>, values: Vec<String>) -> Result<Self, ExtractError> {
        if labels.len() != values.len() {
            return Err(ExtractError::FieldCountMismatch {
                id,
                labels: labels.len(),
                values: values.len(),
            });
        }
        Ok(Self { id, labels, values })
    }

    pub fn id(&self) -> &ReportId {
        &self.id
    }

    #[cfg(test)]
    pub fn get(&self, label: &str) -> Option<&str> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.values[i].as_str())
    }

    /// Pairs in source order, duplicates included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels
            .iter()
            .zip(&self.values)
            .map(|(l, v)| (l.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_id_requires_five_digits() {
        assert_eq!(ReportId::parse("12345").unwrap().as_str(), "12345");
        assert!(ReportId::parse("1234").is_none());
        assert!(ReportId::parse("123456").is_none());
        assert!(ReportId::parse("12a45").is_none());
    }

    #[test]
    fn record_rejects_count_mismatch() {
        let id = ReportId::parse("10001").unwrap();
        let err = FieldRecord::new(id, vec!["A".into(), "B".into()], vec!["1".into()]).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::FieldCountMismatch { labels: 2, values: 1, .. }
        ));
    }

    #[test]
    fn get_returns_first_occurrence() {
        let id = ReportId::parse("10001").unwrap();
        let r = FieldRecord::new(
            id,
            vec!["Region".into(), "Region".into()],
            vec!["Salt Lake".into(), "Provo".into()],
        )
        .unwrap();
        assert_eq!(r.get("Region"), Some("Salt Lake"));
        assert_eq!(r.iter().count(), 2);
    }
}
