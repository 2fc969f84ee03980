use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::detectors::GeneratorError;
use crate::detectors::features::{DiseaseFeatures, disease_features, hsv_ratio};
use crate::ensemble::HEALTHY;

/// Coarse severity category from a model backend, translated to a fixed
/// percentage midpoint before fusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeverityCategory {
    Mild,
    Moderate,
    Severe,
    Epidemic,
}

impl SeverityCategory {
    pub fn midpoint(self) -> f64 {
        match self {
            SeverityCategory::Mild => 25.0,
            SeverityCategory::Moderate => 50.0,
            SeverityCategory::Severe => 75.0,
            SeverityCategory::Epidemic => 95.0,
        }
    }
}

/// Optional model collaborator for the severity stage. Absence or failure
/// just drops the model signal.
pub trait SeverityModel: Send + Sync {
    fn assess(
        &self,
        image: &DynamicImage,
        disease: &str,
    ) -> Result<SeverityCategory, GeneratorError>;
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SeverityEstimate {
    /// Bounded percentage; 0 exactly for the healthy sentinel, otherwise
    /// within [5, 100].
    pub percent: f64,
    pub signal_count: usize,
}

/// Disease-specific adjustment applied after the signals are averaged.
pub fn disease_multiplier(disease: &str) -> f64 {
    match disease {
        "Powdery Mildew" => 1.2,
        "Early Blight" => 1.0,
        "Late Blight" => 1.3,
        "Bacterial Spot" => 0.9,
        HEALTHY => 0.0,
        _ => 1.0,
    }
}

#[derive(Clone, Default)]
pub struct SeverityEstimator {
    model: Option<Arc<dyn SeverityModel>>,
}

impl SeverityEstimator {
    pub fn new(model: Option<Arc<dyn SeverityModel>>) -> Self {
        Self { model }
    }

    /// Gathers up to three independent signals (model category, weighted
    /// feature score, amplified disease-pixel ratio) and fuses them.
    pub fn estimate(&self, image: &DynamicImage, disease: &str) -> SeverityEstimate {
        if disease_multiplier(disease) == 0.0 {
            return SeverityEstimate {
                percent: 0.0,
                signal_count: 0,
            };
        }

        let mut signals = Vec::with_capacity(3);

        if let Some(model) = &self.model {
            match model.assess(image, disease) {
                Ok(category) => signals.push(category.midpoint()),
                Err(e) => log::warn!("severity model signal dropped: {e}"),
            }
        }

        let features = disease_features(image);
        let feature_signal = feature_severity(&features);
        if feature_signal > 0.0 {
            signals.push(feature_signal);
        }

        if let Some(visual_signal) = visual_severity(image, disease) {
            if visual_signal > 0.0 {
                signals.push(visual_signal);
            }
        }

        combine_signals(&signals, disease)
    }
}

/// Averages whichever signals exist (default 50 when none), applies the
/// disease multiplier, clamps to [5, 100]. Monotonic in every signal.
pub fn combine_signals(signals: &[f64], disease: &str) -> SeverityEstimate {
    let base = if signals.is_empty() {
        50.0
    } else {
        signals.iter().sum::<f64>() / signals.len() as f64
    };

    let multiplier = disease_multiplier(disease);
    if multiplier == 0.0 {
        return SeverityEstimate {
            percent: 0.0,
            signal_count: 0,
        };
    }

    SeverityEstimate {
        percent: (base * multiplier).clamp(5.0, 100.0),
        signal_count: signals.len(),
    }
}

/// Weighted sum of the numeric lesion features: affected-area ratio (x0.5),
/// scaled spot count (x0.3), texture-contrast ratio (x0.2).
pub fn feature_severity(features: &DiseaseFeatures) -> f64 {
    let area = (features.affected_area_ratio * 100.0).min(100.0);
    let spots = (features.spot_count as f64 * 3.0).min(100.0);
    let texture = (features.texture_contrast * 2.0).min(100.0);
    area * 0.5 + spots * 0.3 + texture * 0.2
}

/// Fraction of pixels matching the disease's color/brightness signature,
/// amplified x2. Diseases without a pixel rule contribute no signal.
fn visual_severity(image: &DynamicImage, disease: &str) -> Option<f64> {
    let ratio = match disease {
        "Powdery Mildew" => hsv_ratio(image, |_, _, v| v > 180.0),
        "Early Blight" | "Late Blight" => {
            hsv_ratio(image, |h, s, _| (10.0..=35.0).contains(&h) && s > 50.0)
        }
        "Bacterial Spot" => hsv_ratio(image, |_, _, v| v < 80.0),
        _ => return None,
    };
    Some((ratio * 100.0 * 2.0).min(100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averaged_signals_with_multiplier() {
        // Feature severity 60, model "severe" 75: average 67.5, Late Blight
        // multiplier 1.3 brings it to 87.75.
        let estimate = combine_signals(&[60.0, 75.0], "Late Blight");
        assert!((estimate.percent - 87.75).abs() < 1e-9);
        assert_eq!(estimate.signal_count, 2);
    }

    #[test]
    fn healthy_is_exactly_zero() {
        let estimate = combine_signals(&[90.0, 90.0, 90.0], HEALTHY);
        assert_eq!(estimate.percent, 0.0);
        assert_eq!(estimate.signal_count, 0);
    }

    #[test]
    fn no_signals_defaults_to_moderate() {
        let estimate = combine_signals(&[], "Early Blight");
        assert_eq!(estimate.percent, 50.0);
        assert_eq!(estimate.signal_count, 0);
    }

    #[test]
    fn result_is_always_within_bounds() {
        for signals in [&[1.0][..], &[100.0, 100.0][..], &[0.0, 0.0, 0.0][..]] {
            for disease in ["Late Blight", "Bacterial Spot", "Leaf Curl"] {
                let estimate = combine_signals(signals, disease);
                assert!(estimate.percent >= 5.0 && estimate.percent <= 100.0);
            }
        }
    }

    #[test]
    fn feature_severity_is_monotonic_in_affected_area() {
        let base = DiseaseFeatures {
            spot_count: 10,
            avg_spot_area: 20.0,
            affected_area_ratio: 0.4,
            yellow_ratio: 0.0,
            brown_ratio: 0.0,
            white_ratio: 0.0,
            dark_ratio: 0.0,
            texture_contrast: 40.0,
            edge_density: 0.02,
        };
        let mut smaller = base;
        smaller.affected_area_ratio = 0.2;
        assert!(feature_severity(&smaller) < feature_severity(&base));
    }

    #[test]
    fn category_midpoints() {
        assert_eq!(SeverityCategory::Mild.midpoint(), 25.0);
        assert_eq!(SeverityCategory::Moderate.midpoint(), 50.0);
        assert_eq!(SeverityCategory::Severe.midpoint(), 75.0);
        assert_eq!(SeverityCategory::Epidemic.midpoint(), 95.0);
    }

    #[test]
    fn estimator_zeroes_healthy_without_touching_the_image() {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            8,
            8,
            image::Rgb([0, 0, 0]),
        ));
        let estimate = SeverityEstimator::new(None).estimate(&img, HEALTHY);
        assert_eq!(estimate.percent, 0.0);
    }
}
