pub mod advice;

use shared::{SoilType, TreatmentRecommendation};

use crate::ensemble::HEALTHY;

pub const DEFAULT_FERTILIZER: &str = "Balanced NPK 14-14-14";
pub const DEFAULT_FERTILIZER_DOSE: &str = "50-100 kg/acre";
pub const NO_PESTICIDE: &str = "No pesticide needed";

/// Pluggable lookup for fertilizer/pesticide guidance. Lookups never fail:
/// unknown keys resolve to documented generic defaults so the pipeline
/// always has a recommendation bundle to report.
pub trait KnowledgeBase: Send + Sync {
    fn lookup(
        &self,
        crop: &str,
        disease: &str,
        soil: Option<SoilType>,
    ) -> TreatmentRecommendation;
}

/// Built-in tables: a crop x soil fertilizer matrix and a per-disease
/// pesticide list. Stands in until a real agronomy data source is wired up
/// behind the same trait.
pub struct StaticKnowledgeBase;

impl KnowledgeBase for StaticKnowledgeBase {
    fn lookup(
        &self,
        crop: &str,
        disease: &str,
        soil: Option<SoilType>,
    ) -> TreatmentRecommendation {
        let (fertilizer, fertilizer_dose) = fertilizer_for(crop, soil);
        let (pesticide, pesticide_dose) = pesticide_for(disease);
        TreatmentRecommendation {
            fertilizer: fertilizer.to_string(),
            fertilizer_dose: fertilizer_dose.to_string(),
            pesticide: pesticide.to_string(),
            pesticide_dose: pesticide_dose.to_string(),
        }
    }
}

fn fertilizer_for(crop: &str, soil: Option<SoilType>) -> (&'static str, &'static str) {
    use SoilType::*;
    // Silt and peat fall back to the loamy row for each crop.
    let soil = soil.unwrap_or(Loamy);
    match (crop.to_lowercase().as_str(), soil) {
        ("rice", Clay) => ("NPK 20-10-10 + Zinc", "120-150 kg/acre"),
        ("rice", Sandy) => ("NPK 15-15-15 + Organic matter", "100-130 kg/acre"),
        ("rice", _) => ("NPK 20-10-10", "100-140 kg/acre"),
        ("wheat", Clay) => ("Urea + DAP + Potash", "90-120 kg/acre"),
        ("wheat", Sandy) => ("NPK 18-18-18 + Lime", "80-110 kg/acre"),
        ("wheat", _) => ("Urea + DAP", "80-120 kg/acre"),
        ("cotton", Clay) => ("NPK 15-15-15 + Boron", "70-100 kg/acre"),
        ("cotton", Sandy) => ("NPK 20-20-20 + Gypsum", "60-90 kg/acre"),
        ("cotton", _) => ("NPK 15-15-15", "60-100 kg/acre"),
        ("maize", Clay) => ("NPK 28-14-14 + Magnesium", "130-180 kg/acre"),
        ("maize", Sandy) => ("NPK 25-10-10 + Organic compost", "120-160 kg/acre"),
        ("maize", _) => ("NPK 28-14-14", "120-180 kg/acre"),
        ("tomato", Clay) => ("NPK 10-20-20 + Calcium nitrate", "80-120 kg/acre"),
        ("tomato", Sandy) => ("NPK 15-15-15 + Epsom salt", "70-100 kg/acre"),
        ("tomato", _) => ("NPK 10-20-20", "75-110 kg/acre"),
        ("potato", Clay) => ("NPK 15-15-30 + Potassium sulfate", "100-140 kg/acre"),
        ("potato", Sandy) => ("NPK 20-10-20 + Compost", "90-130 kg/acre"),
        ("potato", _) => ("NPK 15-15-30", "95-135 kg/acre"),
        _ => (DEFAULT_FERTILIZER, DEFAULT_FERTILIZER_DOSE),
    }
}

fn pesticide_for(disease: &str) -> (&'static str, &'static str) {
    match disease {
        "Late Blight" => ("Mancozeb 75% WP", "2.0-2.5 kg/acre"),
        "Early Blight" => ("Azoxystrobin 23% SC", "200 ml/acre"),
        "Powdery Mildew" => ("Wettable sulfur 80% WP", "2 kg/acre"),
        "Bacterial Spot" => ("Copper hydroxide 77% WP", "1.5-2.0 kg/acre"),
        "Leaf Curl" | "Mosaic Virus" => ("Neem oil", "2-5 ml/L water"),
        HEALTHY => (NO_PESTICIDE, "0"),
        _ => ("Carbendazim 50% WP", "As per label"),
    }
}
