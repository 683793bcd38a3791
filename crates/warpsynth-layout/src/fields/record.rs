// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON ground truth for field boxes.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};
use warpsynth_core::error::Result;

use crate::rect::Rectangle;

/// One tagged field box as persisted in the ground-truth tag file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub top: i64,
    pub left: i64,
    pub height: i64,
    pub width: i64,
}

impl FieldRecord {
    /// Back to a rectangle (used for drawing persisted ground truth).
    pub fn rectangle(&self) -> Rectangle {
        Rectangle::new(
            self.top as f64,
            self.left as f64,
            self.height as f64,
            self.width as f64,
        )
        .with_name(Some(self.tag.clone()))
    }
}

/// Build the records for every named field, sorted by tag.
///
/// `values` binds tags to their semantic content; a missing or `null` value
/// is omitted from the record. Coordinates are truncated toward zero.
pub fn field_records(fields: &[Rectangle], values: &BTreeMap<String, Value>) -> Vec<FieldRecord> {
    let mut records: Vec<FieldRecord> = fields
        .iter()
        .filter_map(|field| {
            let tag = field.name.clone()?;
            let value = values.get(&tag).filter(|v| !v.is_null()).cloned();
            Some(FieldRecord {
                tag,
                value,
                top: field.top as i64,
                left: field.left as i64,
                height: field.height as i64,
                width: field.width as i64,
            })
        })
        .collect();
    records.sort_by(|a, b| a.tag.cmp(&b.tag));
    records
}

/// Write field records as pretty-printed JSON.
#[instrument(skip(records), fields(path = %path.as_ref().display(), count = records.len()))]
pub fn write_field_records(path: impl AsRef<Path>, records: &[FieldRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path.as_ref(), json)?;
    debug!("Field records written");
    Ok(())
}

/// Read field records back from JSON.
pub fn read_field_records(path: impl AsRef<Path>) -> Result<Vec<FieldRecord>> {
    let data = std::fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn records_sorted_and_null_values_omitted() {
        let fields = vec![
            Rectangle::new(10.9, 5.2, 4.0, 8.7).with_name(Some("total".into())),
            Rectangle::new(1.0, 2.0, 3.0, 4.0).with_name(Some("date".into())),
            Rectangle::new(0.0, 0.0, 1.0, 1.0),
            Rectangle::new(7.0, 7.0, 1.0, 1.0).with_name(Some("note".into())),
        ];
        let values = BTreeMap::from([
            ("total".to_string(), json!("42.00")),
            ("note".to_string(), Value::Null),
        ]);

        let records = field_records(&fields, &values);
        let tags: Vec<_> = records.iter().map(|r| r.tag.as_str()).collect();
        assert_eq!(tags, vec!["date", "note", "total"]);
        assert_eq!(records[2].top, 10);
        assert_eq!(records[2].width, 8);
        assert_eq!(records[2].value, Some(json!("42.00")));

        let serialized = serde_json::to_value(&records).expect("serialize");
        assert!(serialized[0].get("value").is_none());
        assert!(serialized[1].get("value").is_none());
        assert_eq!(serialized[2]["value"], json!("42.00"));
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ground_truth_tags.json");
        let records = vec![FieldRecord {
            tag: "iban".into(),
            value: Some(json!("DE00")),
            top: 1,
            left: 2,
            height: 3,
            width: 4,
        }];
        write_field_records(&path, &records).expect("write");
        assert_eq!(read_field_records(&path).expect("read"), records);
    }
}
