use serde::{Deserialize, Serialize};

pub const UNKNOWN_CROP: &str = "Unknown";
pub const HEALTHY: &str = "Healthy";

/// Which family of generator produced a candidate. The variant order is the
/// tie-break priority: model output beats feature heuristics, which beat the
/// corroborating visual pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Model,
    FeatureHeuristic,
    VisualHeuristic,
}

impl SourceKind {
    fn priority(self) -> u8 {
        match self {
            SourceKind::Model => 0,
            SourceKind::FeatureHeuristic => 1,
            SourceKind::VisualHeuristic => 2,
        }
    }
}

/// One (label, confidence, source) triple from a single generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub label: String,
    pub confidence: f64,
    pub source: SourceKind,
}

impl Candidate {
    pub fn new(label: impl Into<String>, confidence: f64, source: SourceKind) -> Self {
        Self {
            label: label.into(),
            confidence: confidence.clamp(0.0, 1.0),
            source,
        }
    }
}

/// Confidence assigned to a below-floor substitution.
#[derive(Debug, Clone, Copy)]
pub enum FallbackConfidence {
    /// Overwrite with a fixed value.
    Fixed(f64),
    /// Keep the primary's confidence, raised to at least this value.
    AtLeast(f64),
}

/// Per-stage arbitration parameters. Primaries below `confidence_floor` are
/// replaced by `fallback_label` with `fallback_confidence`; an empty pool
/// yields the fallback label at `empty_pool_confidence`.
#[derive(Debug, Clone, Copy)]
pub struct StagePolicy {
    pub confidence_floor: f64,
    pub fallback_label: &'static str,
    pub fallback_confidence: FallbackConfidence,
    pub empty_pool_confidence: f64,
}

/// An unrecognized crop carries no confidence at all, even when a weak
/// primary existed.
pub const CROP_STAGE: StagePolicy = StagePolicy {
    confidence_floor: 0.2,
    fallback_label: UNKNOWN_CROP,
    fallback_confidence: FallbackConfidence::Fixed(0.0),
    empty_pool_confidence: 0.0,
};

/// Low-confidence disease evidence is read as positive evidence of health,
/// not missing data, hence the high fallback confidence.
pub const DISEASE_STAGE: StagePolicy = StagePolicy {
    confidence_floor: 0.3,
    fallback_label: HEALTHY,
    fallback_confidence: FallbackConfidence::AtLeast(0.8),
    empty_pool_confidence: 0.9,
};

#[derive(Debug, Clone, Serialize)]
pub struct EnsembleResult {
    pub label: String,
    pub confidence: f64,
    /// Up to two next-highest candidates, kept for the report.
    pub secondary: Vec<Candidate>,
    /// Whether the two highest-ranked candidates carry the same label.
    /// Diagnostic only; never re-scored.
    pub top_two_agree: bool,
    pub fell_back: bool,
}

/// Fuses the pooled candidates of one stage into a single result.
///
/// Candidates are ordered by confidence (descending), ties broken by the
/// fixed `SourceKind` priority rather than registration order. Deterministic
/// for a fixed candidate set; no side effects.
pub fn arbitrate(mut candidates: Vec<Candidate>, policy: &StagePolicy) -> EnsembleResult {
    if candidates.is_empty() {
        return EnsembleResult {
            label: policy.fallback_label.to_string(),
            confidence: policy.empty_pool_confidence,
            secondary: Vec::new(),
            top_two_agree: false,
            fell_back: true,
        };
    }

    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.source.priority().cmp(&b.source.priority()))
            .then_with(|| a.label.cmp(&b.label))
    });

    let primary = &candidates[0];
    let top_two_agree = candidates
        .get(1)
        .map(|second| second.label == primary.label)
        .unwrap_or(false);
    let secondary: Vec<Candidate> = candidates.iter().skip(1).take(2).cloned().collect();

    if primary.confidence < policy.confidence_floor {
        let confidence = match policy.fallback_confidence {
            FallbackConfidence::Fixed(value) => value,
            FallbackConfidence::AtLeast(min) => primary.confidence.max(min),
        };
        return EnsembleResult {
            label: policy.fallback_label.to_string(),
            confidence,
            secondary,
            top_two_agree,
            fell_back: true,
        };
    }

    EnsembleResult {
        label: primary.label.clone(),
        confidence: primary.confidence,
        secondary,
        top_two_agree,
        fell_back: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Vec<Candidate> {
        vec![
            Candidate::new("Late Blight", 0.85, SourceKind::FeatureHeuristic),
            Candidate::new("Early Blight", 0.70, SourceKind::VisualHeuristic),
            Candidate::new("Late Blight", 0.60, SourceKind::Model),
        ]
    }

    #[test]
    fn picks_highest_confidence() {
        let result = arbitrate(pool(), &DISEASE_STAGE);
        assert_eq!(result.label, "Late Blight");
        assert_eq!(result.confidence, 0.85);
        assert_eq!(result.secondary.len(), 2);
        assert!(!result.fell_back);
    }

    #[test]
    fn deterministic_for_fixed_pool() {
        let a = arbitrate(pool(), &DISEASE_STAGE);
        let b = arbitrate(pool(), &DISEASE_STAGE);
        assert_eq!(a.label, b.label);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(
            a.secondary.iter().map(|c| &c.label).collect::<Vec<_>>(),
            b.secondary.iter().map(|c| &c.label).collect::<Vec<_>>()
        );
    }

    #[test]
    fn ties_break_by_source_priority() {
        let candidates = vec![
            Candidate::new("Early Blight", 0.7, SourceKind::VisualHeuristic),
            Candidate::new("Bacterial Spot", 0.7, SourceKind::Model),
        ];
        let result = arbitrate(candidates, &DISEASE_STAGE);
        assert_eq!(result.label, "Bacterial Spot");
    }

    #[test]
    fn below_floor_substitutes_fallback() {
        let candidates = vec![Candidate::new("Late Blight", 0.25, SourceKind::VisualHeuristic)];
        let result = arbitrate(candidates, &DISEASE_STAGE);
        assert_eq!(result.label, HEALTHY);
        assert!(result.confidence >= 0.8);
        assert!(result.fell_back);
    }

    #[test]
    fn below_floor_crop_loses_its_confidence() {
        let candidates = vec![Candidate::new("Rice", 0.15, SourceKind::FeatureHeuristic)];
        let result = arbitrate(candidates, &CROP_STAGE);
        assert_eq!(result.label, UNKNOWN_CROP);
        assert_eq!(result.confidence, 0.0);
        assert!(result.fell_back);
    }

    #[test]
    fn empty_pool_yields_fallback() {
        let crop = arbitrate(Vec::new(), &CROP_STAGE);
        assert_eq!(crop.label, UNKNOWN_CROP);
        assert_eq!(crop.confidence, 0.0);

        let disease = arbitrate(Vec::new(), &DISEASE_STAGE);
        assert_eq!(disease.label, HEALTHY);
        assert_eq!(disease.confidence, 0.9);
    }

    #[test]
    fn agreement_flag_tracks_top_two_labels() {
        let agreeing = vec![
            Candidate::new("Late Blight", 0.9, SourceKind::Model),
            Candidate::new("Late Blight", 0.8, SourceKind::FeatureHeuristic),
        ];
        assert!(arbitrate(agreeing, &DISEASE_STAGE).top_two_agree);

        let disagreeing = vec![
            Candidate::new("Late Blight", 0.9, SourceKind::Model),
            Candidate::new("Early Blight", 0.8, SourceKind::FeatureHeuristic),
        ];
        assert!(!arbitrate(disagreeing, &DISEASE_STAGE).top_two_agree);
    }

    #[test]
    fn keeps_at_most_two_secondaries() {
        let mut candidates = pool();
        candidates.push(Candidate::new("Powdery Mildew", 0.4, SourceKind::VisualHeuristic));
        let result = arbitrate(candidates, &DISEASE_STAGE);
        assert_eq!(result.secondary.len(), 2);
    }

    #[test]
    fn confidence_is_clamped_on_construction() {
        let c = Candidate::new("Rice", 1.4, SourceKind::Model);
        assert_eq!(c.confidence, 1.0);
        let c = Candidate::new("Rice", -0.2, SourceKind::Model);
        assert_eq!(c.confidence, 0.0);
    }
}
