//! Table/column listing from the OpenAPI document PostgREST serves at `/rest/v1/`.

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    /// Postgres type as reported in the `format` field (e.g. `uuid`, `timestamp with time zone`).
    pub data_type: String,
    pub required: bool,
    pub primary_key: bool,
}

/// Tables keyed by name, columns in document order.
pub fn tables_from_openapi(doc: &JsonValue) -> BTreeMap<String, Vec<ColumnInfo>> {
    let mut tables = BTreeMap::new();
    let Some(definitions) = doc.get("definitions").and_then(JsonValue::as_object) else {
        return tables;
    };

    for (table, def) in definitions {
        let required: Vec<&str> = def
            .get("required")
            .and_then(JsonValue::as_array)
            .map(|r| r.iter().filter_map(JsonValue::as_str).collect())
            .unwrap_or_default();

        let columns = def
            .get("properties")
            .and_then(JsonValue::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, prop)| {
                        let data_type = prop
                            .get("format")
                            .or_else(|| prop.get("type"))
                            .and_then(JsonValue::as_str)
                            .unwrap_or("unknown")
                            .to_string();
                        let primary_key = prop
                            .get("description")
                            .and_then(JsonValue::as_str)
                            .map(|d| d.contains("<pk/>"))
                            .unwrap_or(false);
                        ColumnInfo {
                            name: name.clone(),
                            data_type,
                            required: required.contains(&name.as_str()),
                            primary_key,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        tables.insert(table.clone(), columns);
    }
    tables
}
