use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A battery-cycling row as uploaded by the UI (usually parsed from CSV,
/// so numbers often arrive as strings)
pub type BatteryRow = Map<String, Value>;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PredictionRequest {
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<BatteryRow>,
}

/// Numeric fields recognised in a row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictionFeatures {
    pub current: Option<f64>,
    pub voltage: Option<f64>,
    /// Read from `cycle_id`, `cycleId` or `cycle`; always written as `cycle`
    #[serde(rename = "cycle")]
    pub cycle_id: Option<f64>,
    pub time: Option<f64>,
    pub capacity: Option<f64>,
    pub temperature: Option<f64>,
}

impl PredictionFeatures {
    pub fn from_row(row: &BatteryRow) -> Self {
        Self {
            current: numeric_field(row, &["current"]),
            voltage: numeric_field(row, &["voltage"]),
            cycle_id: numeric_field(row, &["cycle_id", "cycleid", "cycle"]),
            time: numeric_field(row, &["time"]),
            capacity: numeric_field(row, &["capacity"]),
            temperature: numeric_field(row, &["temperature"]),
        }
    }

    pub fn present_count(&self) -> usize {
        [
            self.current,
            self.voltage,
            self.cycle_id,
            self.time,
            self.capacity,
            self.temperature,
        ]
        .iter()
        .filter(|v| v.is_some())
        .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub barcode: String,
    pub cycle_life: u32,
    pub confidence: f64,
    pub features: PredictionFeatures,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictionSummary {
    pub total_samples: usize,
    pub average_cycle_life: u32,
    pub batch_count: usize,
    /// RFC 3339
    pub prediction_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PredictionResponse {
    pub success: bool,
    pub results: Vec<PredictionResult>,
    pub summary: PredictionSummary,
}

/// Case-insensitive key lookup, first alias that matches wins
pub fn field<'a>(row: &'a BatteryRow, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|alias| {
        row.iter()
            .find(|(key, _)| key.trim().eq_ignore_ascii_case(alias))
            .map(|(_, value)| value)
    })
}

fn numeric_field(row: &BatteryRow, aliases: &[&str]) -> Option<f64> {
    match field(row, aliases)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}
