use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::DiagnosisReport;

/// One content-addressed cache row. The image hash is the unique key;
/// writes always replace the whole row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    pub image_hash: String,
    pub crop: String,
    pub disease: String,
    pub severity_percent: f64,
    pub report: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl CacheEntry {
    pub fn from_report(
        image_hash: impl Into<String>,
        report: &DiagnosisReport,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            image_hash: image_hash.into(),
            crop: report.crop.clone(),
            disease: report.disease.clone(),
            severity_percent: report.severity_percent,
            report: serde_json::to_value(report)?,
            timestamp: report.timestamp,
        })
    }
}
