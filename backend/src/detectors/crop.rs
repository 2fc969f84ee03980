use image::DynamicImage;

use crate::detectors::features::{color_stats, texture_stats};
use crate::detectors::{CropGenerator, GeneratorError};
use crate::ensemble::{Candidate, SourceKind};

/// Identifies the crop from whole-frame color statistics: dominant hue plus
/// mean saturation/brightness separate the major field crops well enough to
/// seed the ensemble.
pub struct ColorCropGenerator;

impl CropGenerator for ColorCropGenerator {
    fn name(&self) -> &'static str {
        "color-crop"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::FeatureHeuristic
    }

    fn candidates(&self, image: &DynamicImage) -> Result<Vec<Candidate>, GeneratorError> {
        let stats = color_stats(image);
        let hue = stats.dominant_hue;
        let saturation = stats.mean_saturation;
        let brightness = stats.mean_value;

        let candidate = if (30.0..=60.0).contains(&hue) && saturation > 100.0 {
            Some(("Rice", 0.7))
        } else if (60.0..=90.0).contains(&hue) && brightness > 150.0 {
            Some(("Wheat", 0.6))
        } else if (20.0..40.0).contains(&hue) && saturation > 120.0 {
            Some(("Cotton", 0.65))
        } else if (90.0..=110.0).contains(&hue) && brightness > 140.0 {
            Some(("Maize", 0.75))
        } else {
            None
        };

        Ok(candidate
            .map(|(label, confidence)| vec![Candidate::new(label, confidence, self.kind())])
            .unwrap_or_default())
    }
}

/// Second, independent pass over grayscale texture. Canopy structure shows
/// up as variance and edge density; the output corroborates or contradicts
/// the color rule during arbitration.
pub struct TextureCropGenerator;

impl CropGenerator for TextureCropGenerator {
    fn name(&self) -> &'static str {
        "texture-crop"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::VisualHeuristic
    }

    fn candidates(&self, image: &DynamicImage) -> Result<Vec<Candidate>, GeneratorError> {
        let stats = texture_stats(image);
        let variance = stats.variance;
        let edges = stats.edge_density;

        let candidate = if variance > 500.0 && edges > 0.05 {
            Some(("Rice", 0.6))
        } else if variance < 300.0 && edges < 0.03 {
            Some(("Wheat", 0.55))
        } else if (300.0..=600.0).contains(&variance) && (0.03..=0.07).contains(&edges) {
            Some(("Cotton", 0.6))
        } else {
            None
        };

        Ok(candidate
            .map(|(label, confidence)| vec![Candidate::new(label, confidence, self.kind())])
            .unwrap_or_default())
    }
}
