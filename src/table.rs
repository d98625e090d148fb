use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};

use anyhow::{bail, Context, Result};

use crate::record::FieldRecord;

/// Wide table of report rows. Columns are the union of all labels seen, in
/// first-seen order; rows stay in append order.
#[derive(Debug, Default, Clone)]
pub struct Table {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
    /// Each row is indexed by column position; shorter rows mean trailing
    /// columns were added after the row was appended.
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends one row. A label repeated within the record keeps its first value.
    pub fn push(&mut self, record: &FieldRecord) {
        let mut seen = HashSet::new();
        let mut row: Vec<Option<String>> = vec![None; self.columns.len()];

        for (label, value) in record.iter() {
            if !seen.insert(label) {
                continue;
            }
            let pos = self.column_position(label);
            if pos >= row.len() {
                row.resize(pos + 1, None);
            }
            row[pos] = Some(value.to_string());
        }

        self.rows.push(row);
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let pos = *self.positions.get(column)?;
        self.rows.get(row)?.get(pos)?.as_deref()
    }

    /// Rows padded to the full column set.
    pub fn rows(&self) -> impl Iterator<Item = Vec<Option<&str>>> + '_ {
        self.rows.iter().map(|row| {
            (0..self.columns.len())
                .map(|i| row.get(i).and_then(|c| c.as_deref()))
                .collect()
        })
    }

    fn column_position(&mut self, label: &str) -> usize {
        if let Some(&pos) = self.positions.get(label) {
            return pos;
        }
        let pos = self.columns.len();
        self.columns.push(label.to_string());
        self.positions.insert(label.to_string(), pos);
        pos
    }

    /// Header row with a blank index column, then one line per row prefixed
    /// with its 0-based index. Absent cells are written empty.
    pub fn write_csv<W: Write>(&self, w: W) -> Result<()> {
        let mut out = csv::Writer::from_writer(w);

        let mut header = vec![""];
        header.extend(self.columns.iter().map(String::as_str));
        out.write_record(&header)?;

        for (i, row) in self.rows().enumerate() {
            let index = i.to_string();
            let mut line = vec![index.as_str()];
            line.extend(row.into_iter().map(|c| c.unwrap_or("")));
            out.write_record(&line)?;
        }

        out.flush().context("Failed to flush dataset")?;
        Ok(())
    }

    /// Inverse of `write_csv`: empty cells read back as absent.
    pub fn read_csv<R: Read>(r: R) -> Result<Self> {
        let mut input = csv::ReaderBuilder::new().has_headers(false).from_reader(r);
        let mut records = input.records();

        let Some(header) = records.next() else {
            return Ok(Self::new());
        };
        let header = header.context("Failed to read dataset header")?;

        let mut table = Self::new();
        for name in header.iter().skip(1) {
            if table.positions.contains_key(name) {
                bail!("duplicate column {:?} in dataset header", name);
            }
            table.column_position(name);
        }

        for (n, record) in records.enumerate() {
            let record = record.with_context(|| format!("Failed to read dataset row {}", n))?;
            let row = record
                .iter()
                .skip(1)
                .map(|c| (!c.is_empty()).then(|| c.to_string()))
                .collect();
            table.rows.push(row);
        }

        Ok(table)
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ReportId;

    fn record(id: &str, pairs: &[(&str, &str)]) -> FieldRecord {
        FieldRecord::new(
            ReportId::parse(id).unwrap(),
            pairs.iter().map(|(l, _)| l.to_string()).collect(),
            pairs.iter().map(|(_, v)| v.to_string()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn columns_are_union_in_first_seen_order() {
        let mut t = Table::new();
        t.push(&record("10001", &[("Region", "Ogden"), ("Trigger", "Skier")]));
        t.push(&record("10002", &[("Trigger", "Natural"), ("Depth", "3'")]));

        assert_eq!(t.columns(), ["Region", "Trigger", "Depth"]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.cell(0, "Depth"), None);
        assert_eq!(t.cell(1, "Region"), None);
        assert_eq!(t.cell(1, "Depth"), Some("3'"));
    }

    #[test]
    fn column_set_is_order_independent() {
        let a = record("10001", &[("Region", "Ogden"), ("Lat", "41.2")]);
        let b = record("10002", &[("Trigger", "Skier"), ("Region", "Provo")]);

        let mut ab = Table::new();
        ab.push(&a);
        ab.push(&b);
        let mut ba = Table::new();
        ba.push(&b);
        ba.push(&a);

        let set = |t: &Table| t.columns().iter().cloned().collect::<HashSet<_>>();
        assert_eq!(set(&ab), set(&ba));
        assert_eq!(ab.cell(0, "Region"), Some("Ogden"));
        assert_eq!(ba.cell(0, "Region"), Some("Provo"));
    }

    #[test]
    fn duplicate_label_keeps_first_value() {
        let mut t = Table::new();
        t.push(&record(
            "10001",
            &[("Region", "Ogden"), ("Region", "Logan"), ("Trigger", "Skier")],
        ));

        assert_eq!(t.columns(), ["Region", "Trigger"]);
        assert_eq!(t.cell(0, "Region"), Some("Ogden"));
    }

    #[test]
    fn rows_are_padded_to_all_columns() {
        let mut t = Table::new();
        t.push(&record("10001", &[("A", "1")]));
        t.push(&record("10002", &[("B", "2")]));

        let rows: Vec<_> = t.rows().collect();
        assert_eq!(rows, vec![vec![Some("1"), None], vec![None, Some("2")]]);
    }

    #[test]
    fn csv_layout_has_index_column() {
        let mut t = Table::new();
        t.push(&record("10001", &[("Region", "Salt Lake"), ("Comments", "wide, \"deep\"")]));
        t.push(&record("10002", &[("Region", "Provo")]));

        let mut buf = Vec::new();
        t.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(
            text,
            ",Region,Comments\n0,Salt Lake,\"wide, \"\"deep\"\"\"\n1,Provo,\n"
        );
    }

    #[test]
    fn csv_round_trip_preserves_cells() {
        let mut t = Table::new();
        t.push(&record("10001", &[("Region", "Salt Lake"), ("Lat", "40.61"), ("Lon", "-111.6")]));
        t.push(&record("10002", &[("Trigger", "Skier\nremote"), ("Region", "Ogden")]));
        t.push(&record("10003", &[("UAC Report Number", "10003")]));

        let mut buf = Vec::new();
        t.write_csv(&mut buf).unwrap();
        let back = Table::read_csv(buf.as_slice()).unwrap();

        assert_eq!(back.len(), t.len());
        assert_eq!(back.columns(), t.columns());
        assert_eq!(back.rows().collect::<Vec<_>>(), t.rows().collect::<Vec<_>>());
    }

    #[test]
    fn read_empty_input_is_empty_table() {
        let t = Table::read_csv("".as_bytes()).unwrap();
        assert!(t.is_empty());
        assert!(t.columns().is_empty());
    }
}
