use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use image::DynamicImage;
use shared::{
    AnalysisContext, ConfidenceScores, DiagnosisReport, HealthStatus, RegionInfo, YieldEstimate,
};
use uuid::Uuid;

use crate::cache::cache_service::{CacheService, content_hash};
use crate::detectors::DetectorRegistry;
use crate::ensemble::{CROP_STAGE, Candidate, DISEASE_STAGE, EnsembleResult, HEALTHY, arbitrate};
use crate::forecast::YieldPredictor;
use crate::knowledge::{KnowledgeBase, advice};
use crate::overlay::OverlayRenderer;
use crate::severity::{SeverityEstimate, SeverityEstimator};

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The one hard-terminating condition: nothing downstream can run
    /// without a decoded frame, and no cache row is written.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),
}

/// Orchestrates the eight diagnosis stages. Each request flows strictly
/// forward; every stage after the image decode degrades to a documented
/// default instead of aborting the request.
pub struct CropDoctor {
    registry: Arc<DetectorRegistry>,
    severity: SeverityEstimator,
    knowledge: Arc<dyn KnowledgeBase>,
    yield_predictor: Arc<dyn YieldPredictor>,
    overlay: Arc<OverlayRenderer>,
    cache: CacheService,
}

impl CropDoctor {
    pub fn new(
        registry: DetectorRegistry,
        knowledge: Arc<dyn KnowledgeBase>,
        yield_predictor: Arc<dyn YieldPredictor>,
        overlay: OverlayRenderer,
        cache: CacheService,
    ) -> Self {
        let severity = SeverityEstimator::new(registry.severity_model());
        Self {
            registry: Arc::new(registry),
            severity,
            knowledge,
            yield_predictor,
            overlay: Arc::new(overlay),
            cache,
        }
    }

    pub fn cache(&self) -> &CacheService {
        &self.cache
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy".to_string(),
            detectors: self.registry.health(),
            timestamp: Utc::now(),
        }
    }

    /// Runs the full pipeline on one photograph plus optional context and
    /// returns the compiled report. Fails only on undecodable input.
    pub async fn analyze(
        &self,
        image_bytes: &[u8],
        context: AnalysisContext,
    ) -> Result<DiagnosisReport, AnalysisError> {
        let image_hash = content_hash(image_bytes);

        // Stage 1: decode and identify the crop.
        let image = Arc::new(image::load_from_memory(image_bytes)?);
        let crop = self.run_crop_stage(&image).await;
        log::info!(
            "crop identified: {} (confidence {:.2})",
            crop.label,
            crop.confidence
        );

        // Stage 2: detect the disease on that crop.
        let disease = self.run_disease_stage(&image, &crop.label).await;
        log::info!(
            "disease detected: {} (confidence {:.2}, top-two agree: {})",
            disease.label,
            disease.confidence,
            disease.top_two_agree
        );

        // Stage 3: assess severity.
        let severity = self.run_severity_stage(&image, &disease.label).await;

        // Stage 4: fertilizer and pesticide lookup; never fails, misses
        // resolve to generic defaults inside the knowledge base.
        let treatment = self
            .knowledge
            .lookup(&crop.label, &disease.label, context.soil_type);

        // Stage 5: smart recommendations.
        let advice = advice::smart_advice(
            &disease.label,
            severity.percent,
            context.growth_stage,
            context.weather.as_ref(),
        );

        // Stage 6: yield prediction, degraded to a zero-confidence estimate.
        let yield_estimate = match self.yield_predictor.predict(
            &crop.label,
            context.soil_type,
            context.weather.as_ref(),
            context.historical_yields.as_deref(),
        ) {
            Ok(estimate) => estimate,
            Err(e) => {
                log::warn!("yield stage degraded to default: {e}");
                YieldEstimate {
                    predicted_yield: 0.0,
                    confidence: 0.0,
                }
            }
        };

        // Stage 7: overlay artifact; a failed write costs the reference only.
        let overlay_reference = self
            .run_overlay_stage(&image, &disease.label, severity.percent)
            .await;

        // Stage 8: compile the report and write it through to the cache.
        let region_info = (context.location.is_some()
            || context.weather.is_some()
            || context.soil_type.is_some())
        .then(|| RegionInfo {
            location: context.location,
            weather: context.weather,
            soil_type: context.soil_type,
        });

        let report = DiagnosisReport {
            id: Uuid::new_v4(),
            crop: crop.label,
            disease: disease.label,
            severity_percent: severity.percent,
            treatment,
            advice,
            yield_estimate,
            overlay_reference,
            confidence_scores: ConfidenceScores {
                crop: crop.confidence,
                disease: disease.confidence,
                yield_prediction: yield_estimate.confidence,
            },
            region_info,
            timestamp: Utc::now(),
        };

        if let Err(e) = self.cache.upsert_report(&image_hash, &report).await {
            log::warn!("cache write skipped: {e}");
        }

        Ok(report)
    }

    /// Runs every registered crop generator over the shared frame, joins
    /// them, and arbitrates the pooled candidates. A failing generator is
    /// logged and dropped for this invocation.
    async fn run_crop_stage(&self, image: &Arc<DynamicImage>) -> EnsembleResult {
        let tasks: Vec<_> = self
            .registry
            .crop_generators()
            .iter()
            .cloned()
            .map(|generator| {
                let image = Arc::clone(image);
                tokio::task::spawn_blocking(move || {
                    (generator.name(), generator.candidates(&image))
                })
            })
            .collect();

        let mut pool: Vec<Candidate> = Vec::new();
        for joined in join_all(tasks).await {
            match joined {
                Ok((_, Ok(candidates))) => pool.extend(candidates),
                Ok((name, Err(e))) => log::warn!("crop generator {name} dropped: {e}"),
                Err(e) => log::warn!("crop generator task failed: {e}"),
            }
        }
        arbitrate(pool, &CROP_STAGE)
    }

    async fn run_disease_stage(&self, image: &Arc<DynamicImage>, crop: &str) -> EnsembleResult {
        let tasks: Vec<_> = self
            .registry
            .disease_generators()
            .iter()
            .cloned()
            .map(|generator| {
                let image = Arc::clone(image);
                let crop = crop.to_string();
                tokio::task::spawn_blocking(move || {
                    (generator.name(), generator.candidates(&image, &crop))
                })
            })
            .collect();

        let mut pool: Vec<Candidate> = Vec::new();
        for joined in join_all(tasks).await {
            match joined {
                Ok((_, Ok(candidates))) => pool.extend(candidates),
                Ok((name, Err(e))) => log::warn!("disease generator {name} dropped: {e}"),
                Err(e) => log::warn!("disease generator task failed: {e}"),
            }
        }
        arbitrate(pool, &DISEASE_STAGE)
    }

    async fn run_severity_stage(
        &self,
        image: &Arc<DynamicImage>,
        disease: &str,
    ) -> SeverityEstimate {
        let estimator = self.severity.clone();
        let image = Arc::clone(image);
        let disease_owned = disease.to_string();
        match tokio::task::spawn_blocking(move || estimator.estimate(&image, &disease_owned)).await
        {
            Ok(estimate) => estimate,
            Err(e) => {
                log::warn!("severity stage degraded to default: {e}");
                let percent = if disease == HEALTHY { 0.0 } else { 50.0 };
                SeverityEstimate {
                    percent,
                    signal_count: 0,
                }
            }
        }
    }

    async fn run_overlay_stage(
        &self,
        image: &Arc<DynamicImage>,
        disease: &str,
        severity_percent: f64,
    ) -> Option<String> {
        let renderer = Arc::clone(&self.overlay);
        let image = Arc::clone(image);
        let disease = disease.to_string();
        match tokio::task::spawn_blocking(move || {
            renderer.render(&image, &disease, severity_percent)
        })
        .await
        {
            Ok(Ok(reference)) => Some(reference),
            Ok(Err(e)) => {
                log::warn!("overlay stage produced no artifact: {e}");
                None
            }
            Err(e) => {
                log::warn!("overlay stage task failed: {e}");
                None
            }
        }
    }
}
