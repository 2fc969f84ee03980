use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use shared::DiagnosisReport;
use tokio::sync::RwLock;

use crate::cache::models::CacheEntry;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("report serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("cache miss")]
    CacheMiss,
}

/// Content address for raw image bytes: hex-encoded SHA-256.
pub fn content_hash(image_data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image_data);
    hex::encode(hasher.finalize())
}

/// Row store behind the cache service. Swapping in a database-backed
/// repository leaves hashing and report serialization untouched.
pub trait CacheRepository: Send + Sync {
    /// Insert or fully replace the row keyed by the entry's hash.
    fn put(&self, entry: CacheEntry) -> impl Future<Output = CacheEntry> + Send;
    fn get(&self, image_hash: &str) -> impl Future<Output = Option<CacheEntry>> + Send;
}

/// In-process repository. Writes replace the whole row under the key, so
/// concurrent writers for the same image are last-writer-wins with no
/// read-modify-write window.
#[derive(Clone, Default)]
pub struct MemoryCacheRepository {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl CacheRepository for MemoryCacheRepository {
    async fn put(&self, entry: CacheEntry) -> CacheEntry {
        self.entries
            .write()
            .await
            .insert(entry.image_hash.clone(), entry.clone());
        entry
    }

    async fn get(&self, image_hash: &str) -> Option<CacheEntry> {
        self.entries.read().await.get(image_hash).cloned()
    }
}

/// Content-addressed store of diagnosis summaries keyed by the SHA-256 of
/// the raw image bytes. Serialization lives here; row storage lives in the
/// repository.
#[derive(Clone, Default)]
pub struct CacheService<R: CacheRepository = MemoryCacheRepository> {
    repository: R,
}

impl CacheService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: CacheRepository> CacheService<R> {
    pub fn with_repository(repository: R) -> Self {
        Self { repository }
    }

    /// Insert-or-full-replace for the given content hash. Idempotent for an
    /// unchanged report.
    pub async fn upsert_report(
        &self,
        image_hash: &str,
        report: &DiagnosisReport,
    ) -> Result<CacheEntry, CacheError> {
        let entry = CacheEntry::from_report(image_hash, report)?;
        Ok(self.repository.put(entry).await)
    }

    pub async fn lookup(&self, image_hash: &str) -> Result<CacheEntry, CacheError> {
        self.repository
            .get(image_hash)
            .await
            .ok_or(CacheError::CacheMiss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::{ConfidenceScores, SmartAdvice, TreatmentRecommendation, YieldEstimate};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    fn report(crop: &str) -> DiagnosisReport {
        DiagnosisReport {
            id: Uuid::new_v4(),
            crop: crop.to_string(),
            disease: "Healthy".to_string(),
            severity_percent: 0.0,
            treatment: TreatmentRecommendation {
                fertilizer: "NPK 20-10-10".into(),
                fertilizer_dose: "100-140 kg/acre".into(),
                pesticide: "No pesticide needed".into(),
                pesticide_dose: "0".into(),
            },
            advice: SmartAdvice {
                irrigation_advice: "Follow standard irrigation schedule".into(),
                prevention_strategies: vec![],
                growth_stage_tips: vec![],
            },
            yield_estimate: YieldEstimate {
                predicted_yield: 5.0,
                confidence: 0.65,
            },
            overlay_reference: None,
            confidence_scores: ConfidenceScores::default(),
            region_info: None,
            timestamp: Utc::now(),
        }
    }

    #[derive(Clone, Default)]
    struct CountingRepository {
        inner: MemoryCacheRepository,
        puts: Arc<AtomicUsize>,
    }

    impl CacheRepository for CountingRepository {
        async fn put(&self, entry: CacheEntry) -> CacheEntry {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.inner.put(entry).await
        }

        async fn get(&self, image_hash: &str) -> Option<CacheEntry> {
            self.inner.get(image_hash).await
        }
    }

    #[test]
    fn identical_bytes_hash_identically() {
        assert_eq!(content_hash(b"field photo"), content_hash(b"field photo"));
        assert_ne!(content_hash(b"field photo"), content_hash(b"other photo"));
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let cache = CacheService::new();
        let report = report("Rice");
        let hash = content_hash(b"bytes");

        let first = cache.upsert_report(&hash, &report).await.unwrap();
        let second = cache.upsert_report(&hash, &report).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.lookup(&hash).await.unwrap(), first);
    }

    #[tokio::test]
    async fn upsert_fully_replaces_the_row() {
        let cache = CacheService::new();
        let hash = content_hash(b"bytes");

        cache.upsert_report(&hash, &report("Rice")).await.unwrap();
        cache.upsert_report(&hash, &report("Wheat")).await.unwrap();

        let row = cache.lookup(&hash).await.unwrap();
        assert_eq!(row.crop, "Wheat");
    }

    #[tokio::test]
    async fn lookup_misses_unknown_hash() {
        let cache = CacheService::new();
        assert!(matches!(
            cache.lookup("deadbeef").await,
            Err(CacheError::CacheMiss)
        ));
    }

    #[tokio::test]
    async fn service_drives_the_injected_repository() {
        let repository = CountingRepository::default();
        let cache = CacheService::with_repository(repository.clone());
        let hash = content_hash(b"bytes");

        cache.upsert_report(&hash, &report("Rice")).await.unwrap();
        cache.upsert_report(&hash, &report("Rice")).await.unwrap();

        assert_eq!(repository.puts.load(Ordering::SeqCst), 2);
        assert_eq!(cache.lookup(&hash).await.unwrap().crop, "Rice");
    }

    #[tokio::test]
    async fn concurrent_upserts_leave_one_coherent_row() {
        let cache = CacheService::new();
        let hash = content_hash(b"bytes");

        let mut handles = Vec::new();
        for crop in ["Rice", "Wheat", "Maize", "Cotton"] {
            let cache = cache.clone();
            let hash = hash.clone();
            handles.push(tokio::spawn(async move {
                cache.upsert_report(&hash, &report(crop)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let row = cache.lookup(&hash).await.unwrap();
        assert_eq!(
            row.report.get("crop").and_then(|v| v.as_str()),
            Some(row.crop.as_str())
        );
    }
}
