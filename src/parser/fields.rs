use scraper::Html;
use unicode_normalization::UnicodeNormalization;

use crate::error::ExtractError;

use super::layout::{COORDINATES_LABEL, LABEL_RE, LABEL_SEL, MAP_WIDGET_MARKER, SCRIPT_SEL, VALUE_SEL};

/// Field labels in document order, separator stripped, `Coordinates` removed.
pub fn labels(doc: &Html) -> Result<Vec<String>, ExtractError> {
    let mut labels = doc
        .select(&LABEL_SEL)
        .map(|el| parse_label(&el.text().collect::<String>()))
        .collect::<Result<Vec<_>, _>>()?;

    labels.retain(|l| l != COORDINATES_LABEL);
    Ok(labels)
}

pub fn parse_label(raw: &str) -> Result<String, ExtractError> {
    LABEL_RE
        .captures(raw)
        .map(|c| c[1].trim().to_string())
        .filter(|l| !l.is_empty())
        .ok_or_else(|| ExtractError::MalformedLabel(raw.trim().to_string()))
}

/// Non-empty, non-widget value texts, NFKD-normalized.
///
/// Whitespace-only values are kept as-is; anything else is trimmed.
pub fn values(doc: &Html) -> Vec<String> {
    doc.select(&VALUE_SEL)
        .map(|el| normalize(&el.text().collect::<String>()))
        .filter(|v| !v.is_empty() && !v.contains(MAP_WIDGET_MARKER))
        .map(|v| match v.trim() {
            "" => v,
            trimmed => trimmed.to_string(),
        })
        .collect()
}

/// Raw contents of every `text/javascript` script block.
pub fn scripts(doc: &Html) -> Vec<String> {
    doc.select(&SCRIPT_SEL)
        .map(|el| el.text().collect::<String>())
        .collect()
}

pub fn normalize(text: &str) -> String {
    text.nfkd().collect::<String>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_separator_is_stripped() {
        assert_eq!(parse_label("Location:\u{a0}").unwrap(), "Location");
        assert_eq!(parse_label("  Avalanche Date: ").unwrap(), "Avalanche Date");
    }

    #[test]
    fn label_without_separator_is_malformed() {
        assert!(matches!(
            parse_label("Trigger"),
            Err(ExtractError::MalformedLabel(l)) if l == "Trigger"
        ));
        assert!(parse_label("  :").is_err());
    }

    #[test]
    fn coordinates_label_is_dropped() {
        let doc = Html::parse_document(
            r#"<div class="field-label">Region:</div>
               <div class="field-label">Coordinates:</div>
               <div class="field-label">Trigger:</div>"#,
        );
        assert_eq!(labels(&doc).unwrap(), vec!["Region", "Trigger"]);
    }

    #[test]
    fn values_skip_empty_and_widgets() {
        let doc = Html::parse_document(
            r#"<div class="field-item even">Salt Lake</div>
               <div class="field-item even"></div>
               <div class="field-item even"><script>new OpenLayers.Map()</script></div>
               <div class="field-item odd">ignored</div>
               <div class="field-item even">
                 Skier
               </div>"#,
        );
        assert_eq!(values(&doc), vec!["Salt Lake", "Skier"]);
    }

    #[test]
    fn whitespace_only_values_are_kept() {
        let doc = Html::parse_document(
            r#"<div class="field-item even">Ogden</div>
               <div class="field-item even">&nbsp;</div>
               <div class="field-item even">  </div>"#,
        );
        assert_eq!(values(&doc), vec!["Ogden", " ", "  "]);
    }

    #[test]
    fn normalize_folds_compatibility_forms() {
        assert_eq!(normalize("12\u{a0}inches"), "12 inches");
        assert_eq!(normalize("\u{fb01}eld"), "field");
        assert_eq!(normalize("\u{bd}"), "1\u{2044}2");
    }

    #[test]
    fn scripts_keep_only_javascript_blocks() {
        let doc = Html::parse_document(
            r#"<script type="text/javascript">var a = 1;</script>
               <script type="application/json">{"wkt":"x"}</script>"#,
        );
        assert_eq!(scripts(&doc), vec!["var a = 1;"]);
    }
}
