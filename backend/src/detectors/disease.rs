use image::DynamicImage;

use crate::detectors::features::disease_features;
use crate::detectors::{DiseaseGenerator, GeneratorError};
use crate::ensemble::{Candidate, SourceKind};

/// Maps color-distribution and spot features onto the disease labels they
/// indicate: a powdery white coating, yellowing with many lesions, brown
/// wet-looking patches, or dense small spots on low-contrast tissue.
pub struct FeatureDiseaseGenerator;

impl DiseaseGenerator for FeatureDiseaseGenerator {
    fn name(&self) -> &'static str {
        "feature-disease"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::FeatureHeuristic
    }

    fn candidates(
        &self,
        image: &DynamicImage,
        _crop: &str,
    ) -> Result<Vec<Candidate>, GeneratorError> {
        let f = disease_features(image);

        let candidate = if f.white_ratio > 0.02 && f.texture_contrast > 50.0 {
            Some(("Powdery Mildew", 0.8))
        } else if f.yellow_ratio > 0.04 && f.spot_count > 10 {
            Some(("Early Blight", 0.75))
        } else if f.brown_ratio > 0.03 && f.spot_count > 5 {
            Some(("Late Blight", 0.85))
        } else if f.spot_count > 20 && f.texture_contrast < 30.0 {
            Some(("Bacterial Spot", 0.7))
        } else {
            None
        };

        Ok(candidate
            .map(|(label, confidence)| vec![Candidate::new(label, confidence, self.kind())])
            .unwrap_or_default())
    }
}

/// Independent corroboration pass driven by lesion geometry alone: how much
/// of the frame is affected and whether it is one large patch or many small
/// spots.
pub struct VisualDiseaseGenerator;

impl DiseaseGenerator for VisualDiseaseGenerator {
    fn name(&self) -> &'static str {
        "visual-disease"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::VisualHeuristic
    }

    fn candidates(
        &self,
        image: &DynamicImage,
        _crop: &str,
    ) -> Result<Vec<Candidate>, GeneratorError> {
        let f = disease_features(image);

        let candidate = if f.affected_area_ratio > 0.10 {
            Some(("Late Blight", 0.8))
        } else if f.spot_count > 15 {
            Some(("Early Blight", 0.7))
        } else if f.affected_area_ratio > 0.04 && f.spot_count < 10 {
            Some(("Bacterial Spot", 0.65))
        } else {
            None
        };

        Ok(candidate
            .map(|(label, confidence)| vec![Candidate::new(label, confidence, self.kind())])
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn clean_frame_contributes_nothing() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            64,
            64,
            image::Rgb([120, 120, 120]),
        ));
        assert!(
            FeatureDiseaseGenerator
                .candidates(&img, "Rice")
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn large_dark_patch_reads_as_late_blight() {
        let mut img = RgbImage::from_pixel(64, 64, image::Rgb([200, 200, 200]));
        for y in 0..32 {
            for x in 0..64 {
                img.put_pixel(x, y, image::Rgb([20, 20, 20]));
            }
        }
        let candidates = VisualDiseaseGenerator
            .candidates(&DynamicImage::ImageRgb8(img), "Potato")
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].label, "Late Blight");
        assert_eq!(candidates[0].source, SourceKind::VisualHeuristic);
    }
}
