//! CSV output: one row per entity, nested values flattened into columns

use crate::Result;
use port_export_core::{Entity, ExportSet};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use tracing::warn;

/// Columns present on every row, in output order
pub const BASE_COLUMNS: [&str; 7] = [
    "blueprint_id",
    "entity_id",
    "title",
    "created_at",
    "updated_at",
    "created_by",
    "updated_by",
];

/// Separator between key segments of a flattened nested value
pub const PATH_DELIMITER: char = '.';

pub const PROPERTY_PREFIX: &str = "prop_";
pub const RELATION_PREFIX: &str = "rel_";

type Row = BTreeMap<String, String>;

/// Write `set` as CSV: base columns, then the sorted union of flattened
/// property and relation columns.
pub fn write_csv<W: Write>(set: &ExportSet, writer: W) -> Result<()> {
    let rows: Vec<Row> = set
        .iter()
        .flat_map(|(blueprint, entities)| entities.iter().map(move |e| entity_row(blueprint, e)))
        .collect();

    let dynamic: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.keys())
        .map(String::as_str)
        .filter(|column| !BASE_COLUMNS.contains(column))
        .collect();
    let columns: Vec<&str> = BASE_COLUMNS.iter().copied().chain(dynamic).collect();

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&columns)?;
    for row in &rows {
        csv_writer.write_record(
            columns
                .iter()
                .map(|column| row.get(*column).map(String::as_str).unwrap_or("")),
        )?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn entity_row(blueprint: &str, entity: &Entity) -> Row {
    let mut row = Row::new();
    let base = [
        ("blueprint_id", Some(blueprint)),
        ("entity_id", Some(entity.identifier.as_str())),
        ("title", entity.title.as_deref()),
        ("created_at", entity.created_at.as_deref()),
        ("updated_at", entity.updated_at.as_deref()),
        ("created_by", entity.created_by.as_deref()),
        ("updated_by", entity.updated_by.as_deref()),
    ];
    for (column, value) in base {
        row.insert(column.to_string(), value.unwrap_or_default().to_string());
    }

    flatten_map(PROPERTY_PREFIX, &entity.properties, &mut row);
    flatten_map(RELATION_PREFIX, &entity.relations, &mut row);
    row
}

fn flatten_map(prefix: &str, map: &Map<String, Value>, row: &mut Row) {
    for (key, value) in map {
        flatten_value(format!("{prefix}{key}"), value, row);
    }
}

/// Walk nested objects, joining keys with [`PATH_DELIMITER`].
///
/// A literal key containing the delimiter can produce the same column as a
/// nested path; the first value written keeps the column.
fn flatten_value(path: String, value: &Value, row: &mut Row) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, nested) in map {
                flatten_value(format!("{path}{PATH_DELIMITER}{key}"), nested, row);
            }
        }
        _ => {
            if row.contains_key(&path) {
                warn!("Column {} already filled, dropping later value {}", path, value);
            } else {
                row.insert(path, cell(value));
            }
        }
    }
}

/// Text for a leaf value: strings unquoted, null empty, everything else JSON
fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
