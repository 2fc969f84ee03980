pub mod crop;
pub mod disease;
pub mod features;

use std::sync::Arc;

use image::DynamicImage;
use shared::DetectorHealth;

use crate::ensemble::{Candidate, SourceKind};
use crate::severity::SeverityModel;

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("detector unavailable: {0}")]
    Unavailable(String),
    #[error("detector backend error: {0}")]
    Backend(String),
}

/// Contract for one crop-identification heuristic or model. A failing
/// generator contributes zero candidates; it never fails the stage.
pub trait CropGenerator: Send + Sync {
    fn name(&self) -> &'static str;
    fn kind(&self) -> SourceKind;
    fn candidates(&self, image: &DynamicImage) -> Result<Vec<Candidate>, GeneratorError>;
}

/// Contract for one disease-detection heuristic or model. Receives the crop
/// label decided by the previous stage.
pub trait DiseaseGenerator: Send + Sync {
    fn name(&self) -> &'static str;
    fn kind(&self) -> SourceKind;
    fn candidates(&self, image: &DynamicImage, crop: &str)
    -> Result<Vec<Candidate>, GeneratorError>;
}

/// Explicit registry of every installed detector. Constructed once at
/// startup and handed to the pipeline; replaceable wholesale in tests.
#[derive(Default, Clone)]
pub struct DetectorRegistry {
    crop_generators: Vec<Arc<dyn CropGenerator>>,
    disease_generators: Vec<Arc<dyn DiseaseGenerator>>,
    severity_model: Option<Arc<dyn SeverityModel>>,
}

impl DetectorRegistry {
    /// Empty registry. The pipeline still produces a report from one of
    /// these; every stage falls back to its documented default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in rule generators and no model backends.
    pub fn with_default_heuristics() -> Self {
        let mut registry = Self::new();
        registry.register_crop_generator(Arc::new(crop::ColorCropGenerator));
        registry.register_crop_generator(Arc::new(crop::TextureCropGenerator));
        registry.register_disease_generator(Arc::new(disease::FeatureDiseaseGenerator));
        registry.register_disease_generator(Arc::new(disease::VisualDiseaseGenerator));
        registry
    }

    pub fn register_crop_generator(&mut self, generator: Arc<dyn CropGenerator>) {
        self.crop_generators.push(generator);
    }

    pub fn register_disease_generator(&mut self, generator: Arc<dyn DiseaseGenerator>) {
        self.disease_generators.push(generator);
    }

    pub fn set_severity_model(&mut self, model: Arc<dyn SeverityModel>) {
        self.severity_model = Some(model);
    }

    pub fn crop_generators(&self) -> &[Arc<dyn CropGenerator>] {
        &self.crop_generators
    }

    pub fn disease_generators(&self) -> &[Arc<dyn DiseaseGenerator>] {
        &self.disease_generators
    }

    pub fn severity_model(&self) -> Option<Arc<dyn SeverityModel>> {
        self.severity_model.clone()
    }

    pub fn health(&self) -> DetectorHealth {
        DetectorHealth {
            crop_model_loaded: self
                .crop_generators
                .iter()
                .any(|g| g.kind() == SourceKind::Model),
            disease_model_loaded: self
                .disease_generators
                .iter()
                .any(|g| g.kind() == SourceKind::Model),
            severity_model_loaded: self.severity_model.is_some(),
            crop_generators: self.crop_generators.len(),
            disease_generators: self.disease_generators.len(),
        }
    }
}
