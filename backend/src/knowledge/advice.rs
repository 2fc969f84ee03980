use shared::{GrowthStage, SmartAdvice, WeatherSnapshot};

use crate::ensemble::HEALTHY;

/// Builds the advice lists for stage 5 from whatever context exists.
/// Everything here degrades to sensible generic advice when the weather
/// snapshot or growth stage is missing.
pub fn smart_advice(
    disease: &str,
    severity_percent: f64,
    growth_stage: Option<GrowthStage>,
    weather: Option<&WeatherSnapshot>,
) -> SmartAdvice {
    SmartAdvice {
        irrigation_advice: irrigation_advice(weather, disease, severity_percent),
        prevention_strategies: prevention_strategies(disease, severity_percent),
        growth_stage_tips: growth_stage_tips(growth_stage, disease),
    }
}

fn irrigation_advice(
    weather: Option<&WeatherSnapshot>,
    disease: &str,
    severity_percent: f64,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(w) = weather {
        if w.temperature_c > 35.0 {
            parts.push(
                "Increase irrigation frequency to 2-3 times per week due to extreme heat".into(),
            );
        } else if w.temperature_c > 30.0 {
            parts.push("Increase irrigation frequency due to high temperatures".into());
        } else if w.temperature_c < 15.0 {
            parts.push("Reduce irrigation frequency to prevent frost damage".into());
        }

        if w.humidity_percent > 85.0 {
            parts.push(
                "Reduce irrigation and improve ventilation to prevent fungal diseases".into(),
            );
        } else if w.humidity_percent > 80.0 {
            parts.push("Monitor humidity levels and reduce overhead watering".into());
        }

        if w.rainfall_mm > 100.0 {
            parts.push("Skip irrigation this week due to heavy rainfall".into());
        } else if w.rainfall_mm > 50.0 {
            parts.push("Reduce irrigation due to recent rainfall".into());
        }
    }

    if disease != HEALTHY {
        if severity_percent > 70.0 {
            parts.push(
                "Use drip irrigation to maintain soil moisture without wetting leaves".into(),
            );
        } else if severity_percent > 40.0 {
            parts.push("Avoid overhead watering to prevent disease spread".into());
        } else {
            parts.push("Maintain consistent soil moisture to support plant recovery".into());
        }

        match disease {
            "Late Blight" | "Powdery Mildew" => {
                parts.push("Water early in the day to allow leaves to dry quickly".into());
            }
            "Root Rot" => {
                parts.push("Reduce watering frequency and improve drainage".into());
            }
            _ => {}
        }
    }

    if parts.is_empty() {
        parts.push(
            "Follow standard irrigation schedule for the crop (typically every 4-7 days)".into(),
        );
    }

    parts.join(". ")
}

fn prevention_strategies(disease: &str, severity_percent: f64) -> Vec<String> {
    let mut strategies: Vec<String> = [
        "Regular field monitoring and scouting (check plants 2-3 times per week)",
        "Proper field sanitation - remove and destroy infected plant debris",
        "Practice crop rotation with non-host plants for at least 2-3 years",
        "Use certified disease-resistant varieties when available",
        "Maintain balanced fertilization to keep plants healthy and stress-resistant",
        "Ensure proper plant spacing for adequate air circulation",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let disease_specific: &[&str] = match disease {
        "Late Blight" => &[
            "Avoid overhead irrigation - use drip irrigation instead",
            "Apply preventive fungicide sprays during humid weather",
            "Destroy volunteer plants that may harbor the disease",
        ],
        "Early Blight" => &[
            "Mulch around plants to prevent soil splash",
            "Stake or trellis plants to improve air circulation",
            "Apply copper-based fungicides preventively",
        ],
        "Powdery Mildew" => &[
            "Avoid overhead watering to keep leaves dry",
            "Apply sulfur-based fungicides as preventive measure",
            "Remove and destroy infected leaves immediately",
        ],
        "Bacterial Spot" => &[
            "Use copper-based bactericides preventively",
            "Avoid handling wet plants to prevent spread",
            "Disinfect tools between plants and fields",
        ],
        _ => &[],
    };
    strategies.extend(disease_specific.iter().map(|s| s.to_string()));

    if severity_percent > 70.0 {
        strategies.extend(
            [
                "Implement strict quarantine measures for affected areas",
                "Increase monitoring frequency to daily inspections",
                "Isolate affected plants and destroy them if necessary",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
    } else if severity_percent > 40.0 {
        strategies.extend(
            [
                "Monitor neighboring fields for disease spread",
                "Document disease progression with photos",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
    }

    strategies
}

fn growth_stage_tips(growth_stage: Option<GrowthStage>, disease: &str) -> Vec<String> {
    let mut tips: Vec<String> = match growth_stage {
        Some(GrowthStage::Seedling) => vec![
            "Ensure proper seed treatment".into(),
            "Maintain optimal soil moisture".into(),
            "Protect from early pest attacks".into(),
        ],
        Some(GrowthStage::Vegetative) => vec![
            "Monitor for nutrient deficiencies".into(),
            "Implement weed control measures".into(),
            "Support proper plant spacing".into(),
        ],
        Some(GrowthStage::Flowering) => vec![
            "Avoid stress during critical growth stages".into(),
            "Ensure pollination if applicable".into(),
            "Monitor for flower/fruit drop".into(),
        ],
        Some(GrowthStage::Mature) => vec![
            "Prepare for harvest timing".into(),
            "Monitor for late-season diseases".into(),
            "Plan post-harvest activities".into(),
        ],
        None => Vec::new(),
    };

    if disease != HEALTHY {
        tips.push(format!("Take preventive measures against {disease}"));
    }

    if tips.is_empty() {
        tips = vec![
            "Follow standard cultivation practices".into(),
            "Regular monitoring of crop health".into(),
        ];
    }

    tips
}
