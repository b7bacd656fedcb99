use crate::config::LineFormat;
use crate::error::{Result, SearchError};
use crate::RecordId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::BufRead;

/// One corpus line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    /// The line as read, without its line terminator.
    pub raw_text: String,
    /// What the term index tokenizes: the selected text columns, or the whole line.
    pub text: String,
    /// The title column; this is what the q-gram index matches against.
    pub title: String,
    /// Display columns by name, empty when the line was too short.
    pub fields: BTreeMap<String, String>,
}

impl Record {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Parse one tab-separated line. `line_no` is 1-based and becomes the id.
pub fn parse_line(line_no: usize, line: &str, format: &LineFormat) -> Result<Record> {
    let id = RecordId::try_from(line_no).map_err(|_| {
        SearchError::invalid(format!("corpus exceeds {} records", RecordId::MAX))
    })?;
    let columns: Vec<&str> = line.split('\t').collect();
    let title = columns.get(format.title_column).ok_or_else(|| SearchError::MalformedRecord {
        line: line_no,
        reason: format!(
            "title column {} missing, line has {} columns",
            format.title_column,
            columns.len()
        ),
    })?;

    let text = match &format.text_columns {
        None => line.to_string(),
        Some(selected) => selected
            .iter()
            .map(|&column| {
                columns.get(column).copied().unwrap_or_else(|| {
                    tracing::warn!(
                        line = line_no,
                        column,
                        "text column missing, using empty value"
                    );
                    ""
                })
            })
            .collect::<Vec<&str>>()
            .join(" "),
    };

    let mut fields = BTreeMap::new();
    for dc in &format.display_columns {
        let value = match columns.get(dc.column) {
            Some(v) => v.to_string(),
            None => {
                tracing::warn!(
                    line = line_no,
                    column = dc.column,
                    field = %dc.name,
                    "display column missing, using empty value"
                );
                String::new()
            }
        };
        fields.insert(dc.name.clone(), value);
    }

    Ok(Record { id, raw_text: line.to_string(), text, title: title.to_string(), fields })
}

/// Read every line of `reader` as a record. Ids follow line order from 1; a
/// malformed line aborts the whole read.
pub fn read_records<R: BufRead>(reader: R, format: &LineFormat) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        records.push(parse_line(idx + 1, &line, format)?);
    }
    Ok(records)
}
