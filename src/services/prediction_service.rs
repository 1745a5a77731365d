use crate::{
    models::{
        field, BatteryRow, PredictionFeatures, PredictionResponse, PredictionResult,
        PredictionSummary,
    },
    utils::{spawn_prediction_blocking, AppError},
};
use chrono::Utc;
use serde_json::Value;

pub const BASE_CYCLE_LIFE: i32 = 500;
pub const MIN_CYCLE_LIFE: i32 = 100;
pub const MAX_CYCLE_LIFE: i32 = 800;

const BASE_CONFIDENCE: f64 = 0.5;
const CONFIDENCE_PER_FEATURE: f64 = 0.075;
const MAX_CONFIDENCE: f64 = 0.95;

#[derive(Debug, Clone, Copy)]
enum Condition {
    Above(f64),
    AtLeast(f64),
    Below(f64),
}

impl Condition {
    fn matches(self, value: f64) -> bool {
        match self {
            Condition::Above(t) => value > t,
            Condition::AtLeast(t) => value >= t,
            Condition::Below(t) => value < t,
        }
    }
}

struct FieldRule {
    name: &'static str,
    value: fn(&PredictionFeatures) -> Option<f64>,
    /// First matching step wins
    steps: &'static [(Condition, i32)],
}

static RULES: [FieldRule; 6] = [
    FieldRule {
        name: "current",
        value: |f| f.current,
        steps: &[(Condition::Above(2.0), -100), (Condition::Above(1.0), -50)],
    },
    FieldRule {
        name: "voltage",
        value: |f| f.voltage,
        steps: &[(Condition::Above(4.0), 50), (Condition::Above(3.7), 25)],
    },
    FieldRule {
        name: "cycle",
        value: |f| f.cycle_id,
        steps: &[(Condition::Above(100.0), -80), (Condition::Above(50.0), -40)],
    },
    FieldRule {
        name: "time",
        value: |f| f.time,
        steps: &[(Condition::Above(10000.0), -60), (Condition::Above(5000.0), -30)],
    },
    FieldRule {
        name: "capacity",
        value: |f| f.capacity,
        steps: &[(Condition::Below(0.9), -60), (Condition::AtLeast(0.98), 40)],
    },
    FieldRule {
        name: "temperature",
        value: |f| f.temperature,
        steps: &[(Condition::Above(40.0), -70), (Condition::Above(30.0), -30)],
    },
];

/// Applies the rule table to one feature set. Returns the clamped cycle
/// life and the adjustments that fired.
pub fn estimate_cycle_life(features: &PredictionFeatures) -> (u32, Vec<String>) {
    let mut cycle_life = BASE_CYCLE_LIFE;
    let mut applied = Vec::new();

    for rule in RULES.iter() {
        let Some(value) = (rule.value)(features) else {
            continue;
        };

        if let Some((_, adjustment)) = rule.steps.iter().find(|(cond, _)| cond.matches(value)) {
            cycle_life += adjustment;
            applied.push(format!("{}={} ({:+})", rule.name, value, adjustment));
        }
    }

    (clamp_cycle_life(cycle_life), applied)
}

pub fn clamp_cycle_life(raw: i32) -> u32 {
    raw.clamp(MIN_CYCLE_LIFE, MAX_CYCLE_LIFE) as u32
}

pub fn confidence(features: &PredictionFeatures) -> f64 {
    let raw = BASE_CONFIDENCE + CONFIDENCE_PER_FEATURE * features.present_count() as f64;
    (raw.min(MAX_CONFIDENCE) * 100.0).round() / 100.0
}

fn barcode(row: &BatteryRow, index: usize) -> String {
    match field(row, &["barcode"]) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("CELL-{}", index + 1),
    }
}

pub fn score_row(index: usize, row: &BatteryRow) -> PredictionResult {
    let features = PredictionFeatures::from_row(row);
    let (cycle_life, applied) = estimate_cycle_life(&features);

    let explanation = if applied.is_empty() {
        format!("No adjustment applied, base estimate of {} cycles", BASE_CYCLE_LIFE)
    } else {
        format!(
            "Base {} cycles adjusted by {}, clamped to [{}, {}]",
            BASE_CYCLE_LIFE,
            applied.join(", "),
            MIN_CYCLE_LIFE,
            MAX_CYCLE_LIFE
        )
    };

    PredictionResult {
        barcode: barcode(row, index),
        cycle_life,
        confidence: confidence(&features),
        features,
        explanation,
    }
}

/// `offset` is the index of the batch's first row in the whole upload
fn score_batch(offset: usize, batch: &[BatteryRow]) -> Vec<PredictionResult> {
    batch
        .iter()
        .enumerate()
        .map(|(i, row)| score_row(offset + i, row))
        .collect()
}

/// Scores every row, `batch_size` rows at a time on the prediction pool
pub async fn predict(
    rows: Vec<BatteryRow>,
    batch_size: usize,
) -> Result<PredictionResponse, AppError> {
    if rows.is_empty() {
        return Err(AppError::InvalidRequest("No data provided".to_string()));
    }

    let batch_size = batch_size.max(1);
    let total = rows.len();
    let mut results = Vec::with_capacity(total);
    let mut batch_count = 0;
    let mut remaining = rows.into_iter();

    loop {
        let batch: Vec<BatteryRow> = remaining.by_ref().take(batch_size).collect();
        if batch.is_empty() {
            break;
        }

        let offset = results.len();
        let scored = spawn_prediction_blocking(move || score_batch(offset, &batch))
            .await
            .map_err(|e| AppError::Internal(format!("Prediction batch failed: {}", e)))?;

        results.extend(scored);
        batch_count += 1;
        log::debug!("📦 Batch {} scored ({}/{} rows)", batch_count, results.len(), total);

        tokio::task::yield_now().await;
    }

    let sum: u64 = results.iter().map(|r| r.cycle_life as u64).sum();
    let average_cycle_life = (sum as f64 / total as f64).round() as u32;

    Ok(PredictionResponse {
        success: true,
        summary: PredictionSummary {
            total_samples: total,
            average_cycle_life,
            batch_count,
            prediction_time: Utc::now().to_rfc3339(),
        },
        results,
    })
}
