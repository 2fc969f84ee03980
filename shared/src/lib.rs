use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// Optional field context accompanying an uploaded photograph.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AnalysisContext {
    pub soil_type: Option<SoilType>,
    pub weather: Option<WeatherSnapshot>,
    pub growth_stage: Option<GrowthStage>,
    pub historical_yields: Option<Vec<f64>>,
    pub location: Option<Coordinates>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SoilType {
    Clay,
    Sandy,
    Loamy,
    Silt,
    Peat,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GrowthStage {
    Seedling,
    Vegetative,
    Flowering,
    Mature,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default)]
pub struct WeatherSnapshot {
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub rainfall_mm: f64,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Fertilizer and pesticide guidance looked up for (crop, disease, soil).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TreatmentRecommendation {
    pub fertilizer: String,
    pub fertilizer_dose: String,
    pub pesticide: String,
    pub pesticide_dose: String,
}

/// Advice lists derived from disease, severity, growth stage and weather.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SmartAdvice {
    pub irrigation_advice: String,
    pub prevention_strategies: Vec<String>,
    pub growth_stage_tips: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub struct YieldEstimate {
    /// Predicted yield in tons per acre.
    pub predicted_yield: f64,
    pub confidence: f64,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default)]
pub struct ConfidenceScores {
    pub crop: f64,
    pub disease: f64,
    pub yield_prediction: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RegionInfo {
    pub location: Option<Coordinates>,
    pub weather: Option<WeatherSnapshot>,
    pub soil_type: Option<SoilType>,
}

/// Terminal aggregate of one analysis request. Write-once.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DiagnosisReport {
    pub id: Uuid,
    pub crop: String,
    pub disease: String,
    pub severity_percent: f64,
    pub treatment: TreatmentRecommendation,
    pub advice: SmartAdvice,
    pub yield_estimate: YieldEstimate,
    pub overlay_reference: Option<String>,
    pub confidence_scores: ConfidenceScores,
    pub region_info: Option<RegionInfo>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
    pub detectors: DetectorHealth,
    pub timestamp: DateTime<Utc>,
}

/// Per-family generator availability, so "no model installed" is
/// distinguishable from "rule generators missing".
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DetectorHealth {
    pub crop_model_loaded: bool,
    pub disease_model_loaded: bool,
    pub severity_model_loaded: bool,
    pub crop_generators: usize,
    pub disease_generators: usize,
}
