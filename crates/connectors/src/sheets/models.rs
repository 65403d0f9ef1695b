//! Request and response bodies of the Sheets v4 REST API used by the sink.

use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug, Default)]
pub struct Spreadsheet {
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

#[derive(Deserialize, Debug)]
pub struct Sheet {
    pub properties: SheetProperties,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SheetProperties {
    pub title: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateRequest {
    pub requests: Vec<UpdateRequest>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub enum UpdateRequest {
    AddSheet { properties: SheetProperties },
}

/// A block of cells; rows shorter than the range are allowed.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ValueRange {
    #[serde(default)]
    pub values: Vec<Vec<serde_json::Value>>,
}

/// Renders a cell read back from the API as text.
pub fn cell_text(cell: &serde_json::Value) -> String {
    match cell {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
