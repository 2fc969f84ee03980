use shared::{SoilType, WeatherSnapshot, YieldEstimate};

use crate::ensemble::UNKNOWN_CROP;

#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("cannot forecast yield for unidentified crop")]
    UnidentifiedCrop,
    #[error("forecast backend error: {0}")]
    Backend(String),
}

/// External yield subsystem, seen by the pipeline only through this trait.
/// A failed prediction downgrades to a zero-confidence estimate upstream.
pub trait YieldPredictor: Send + Sync {
    fn predict(
        &self,
        crop: &str,
        soil: Option<SoilType>,
        weather: Option<&WeatherSnapshot>,
        history: Option<&[f64]>,
    ) -> Result<YieldEstimate, ForecastError>;
}

/// Rule-based forecaster: per-crop baseline adjusted by soil and weather
/// factors, blended with the historical average when one exists. Confidence
/// starts at 0.85 and loses 0.1 for each missing context input.
pub struct RuleBasedYieldPredictor;

impl YieldPredictor for RuleBasedYieldPredictor {
    fn predict(
        &self,
        crop: &str,
        soil: Option<SoilType>,
        weather: Option<&WeatherSnapshot>,
        history: Option<&[f64]>,
    ) -> Result<YieldEstimate, ForecastError> {
        if crop == UNKNOWN_CROP {
            return Err(ForecastError::UnidentifiedCrop);
        }

        let crop_key = crop.to_lowercase();
        let baseline = baseline_yield(&crop_key);

        let mut modifier = soil_modifier(soil);
        if let Some(w) = weather {
            modifier *= 0.8 + 0.4 * weather_score(&crop_key, w);
        }

        let mut predicted = baseline * modifier;
        let history = history.filter(|h| !h.is_empty());
        if let Some(h) = history {
            let avg = h.iter().sum::<f64>() / h.len() as f64;
            predicted = (predicted + avg) / 2.0;
        }

        let (min_yield, max_yield) = yield_bounds(&crop_key);
        predicted = predicted.clamp(min_yield, max_yield);

        let mut confidence = 0.85;
        if weather.is_none() {
            confidence -= 0.1;
        }
        if history.is_none() {
            confidence -= 0.1;
        }

        Ok(YieldEstimate {
            predicted_yield: predicted,
            confidence,
        })
    }
}

fn baseline_yield(crop: &str) -> f64 {
    match crop {
        "rice" => 5.0,
        "wheat" => 4.5,
        "cotton" => 3.0,
        "maize" => 6.0,
        "soybean" => 2.5,
        "sugarcane" => 80.0,
        _ => 4.0,
    }
}

fn yield_bounds(crop: &str) -> (f64, f64) {
    match crop {
        "rice" => (2.0, 10.0),
        "wheat" => (2.0, 8.0),
        "cotton" => (1.0, 6.0),
        "maize" => (2.0, 12.0),
        "soybean" => (1.0, 5.0),
        "sugarcane" => (40.0, 120.0),
        _ => (1.0, 10.0),
    }
}

fn soil_modifier(soil: Option<SoilType>) -> f64 {
    match soil {
        Some(SoilType::Clay) => 0.8,
        Some(SoilType::Sandy) => 0.7,
        Some(SoilType::Loamy) | None => 1.0,
        Some(SoilType::Silt) => 0.9,
        Some(SoilType::Peat) => 0.6,
    }
}

/// Proximity of the snapshot to the crop's preferred season, in [0, 1].
fn weather_score(crop: &str, weather: &WeatherSnapshot) -> f64 {
    let (ideal_temp, ideal_rain) = match crop {
        "rice" => (28.0, 150.0),
        "wheat" => (22.0, 75.0),
        "cotton" => (30.0, 75.0),
        "maize" => (25.0, 80.0),
        "soybean" => (26.0, 70.0),
        "sugarcane" => (27.0, 200.0),
        _ => (25.0, 100.0),
    };

    let temp_score = 1.0 - ((weather.temperature_c - ideal_temp).abs() / 20.0).min(1.0);
    let rain_score = 1.0 - ((weather.rainfall_mm - ideal_rain).abs() / ideal_rain).min(1.0);
    (temp_score + rain_score) / 2.0
}
