//! Multi-model recognition cascade.
//!
//! For every configured model the engine asks the EmbeddingProvider for a
//! query embedding, scans the Repository's gallery for the nearest stored
//! identity, and blends the embedding confidence with the heuristic
//! feature similarity. Every model is always evaluated — the cascade is
//! not first-match-wins — and the globally best combined score decides.

use crate::config::{ConfigError, ModelConfig, RecognitionConfig};
use crate::distance::{DistanceMetric, TruncatedEuclidean};
use crate::features::{FeatureExtractor, FeatureVector};
use crate::similarity;
use crate::types::{Embedding, Identity, PersonRecord, RecognitionResult};
use image::RgbImage;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("embedding request timed out")]
    Timeout,
    #[error("no face found in image")]
    NoFace,
    #[error("provider failure: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
#[error("repository failure: {0}")]
pub struct RepositoryError(pub String);

/// External embedding provider: takes an image and a model identifier,
/// returns a fixed-length numeric vector. Timeout and retry policy are
/// the implementation's concern; any failure here only skips one model.
pub trait EmbeddingProvider {
    fn embed(&self, image: &RgbImage, model: &str) -> Result<Vec<f64>, ProviderError>;
}

/// External storage of enrolled identities, their embeddings and feature
/// vectors. Results are read-only snapshots; consistency is the
/// repository's responsibility.
pub trait Repository {
    /// All stored (identity, embedding) pairs for one model.
    fn embeddings_for_model(
        &self,
        model: &str,
    ) -> Result<HashMap<Identity, Vec<f64>>, RepositoryError>;

    /// Stored feature vector for an identity, if one was enrolled.
    fn features(&self, identity: &Identity) -> Result<Option<FeatureVector>, RepositoryError>;

    /// Demographic record for an identity.
    fn identity(&self, identity: &Identity) -> Result<Option<PersonRecord>, RepositoryError>;
}

/// Output of [`MatchingEngine::enroll`]: everything the caller needs to
/// persist for a new identity. Storage itself stays outside this core.
#[derive(Debug, Clone)]
pub struct EnrollmentRecord {
    pub embedding: Embedding,
    /// `None` when feature extraction produced an entirely empty vector.
    pub features: Option<FeatureVector>,
}

#[derive(Error, Debug)]
pub enum EnrollError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Orchestrates the model cascade over an embedding provider and a
/// repository. Stateless across requests; configuration is fixed at
/// construction.
pub struct MatchingEngine<P, R> {
    provider: P,
    repository: R,
    config: RecognitionConfig,
    extractor: FeatureExtractor,
    metric: Box<dyn DistanceMetric>,
}

impl<P: EmbeddingProvider, R: Repository> MatchingEngine<P, R> {
    /// Build an engine around a validated configuration.
    pub fn new(provider: P, repository: R, config: RecognitionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            provider,
            repository,
            config,
            extractor: FeatureExtractor::new(),
            metric: Box::new(TruncatedEuclidean),
        })
    }

    /// Replace the distance strategy (default: [`TruncatedEuclidean`]).
    pub fn with_metric(mut self, metric: impl DistanceMetric + 'static) -> Self {
        self.metric = Box::new(metric);
        self
    }

    /// Replace the feature extractor (e.g. with tuned eye-detector params).
    pub fn with_extractor(mut self, extractor: FeatureExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Identify the person in an upright photograph.
    ///
    /// Never fails: every failure mode degrades to skipping one model or
    /// to a `matched = false` result.
    pub fn recognize(&self, image: &RgbImage) -> RecognitionResult {
        let query_features = self.extractor.extract(image);
        self.recognize_with_features(image, &query_features)
    }

    /// Like [`recognize`](Self::recognize), for callers that already hold
    /// the query's feature vector.
    pub fn recognize_with_features(
        &self,
        image: &RgbImage,
        query_features: &FeatureVector,
    ) -> RecognitionResult {
        let mut best: Option<RecognitionResult> = None;

        for model in &self.config.cascade {
            let Some(candidate) = self.evaluate_model(model, image, query_features) else {
                continue;
            };
            let is_better = best
                .as_ref()
                .map(|b| candidate.combined_score > b.combined_score)
                .unwrap_or(true);
            if is_better {
                best = Some(candidate);
            }
        }

        match best {
            Some(result) => {
                tracing::info!(
                    identity = %result.identity.as_ref().map(|i| i.as_str()).unwrap_or(""),
                    model = result.winning_model.as_deref().unwrap_or(""),
                    combined_score = result.combined_score,
                    "recognized"
                );
                result
            }
            None => {
                tracing::info!("no model produced a match below its threshold");
                RecognitionResult::no_match()
            }
        }
    }

    /// Run one cascade step. Returns `None` when the model produced no
    /// below-threshold match or had to be skipped.
    fn evaluate_model(
        &self,
        model: &ModelConfig,
        image: &RgbImage,
        query_features: &FeatureVector,
    ) -> Option<RecognitionResult> {
        let query = match self.provider.embed(image, &model.name) {
            Ok(values) => values,
            Err(err) => {
                tracing::warn!(model = %model.name, error = %err, "embedding failed, skipping model");
                return None;
            }
        };
        if query.len() != model.expected_dimensions {
            tracing::warn!(
                model = %model.name,
                expected = model.expected_dimensions,
                got = query.len(),
                "unexpected embedding dimensionality"
            );
        }

        let gallery = match self.repository.embeddings_for_model(&model.name) {
            Ok(gallery) => gallery,
            Err(err) => {
                tracing::warn!(model = %model.name, error = %err, "gallery fetch failed, skipping model");
                return None;
            }
        };
        if gallery.is_empty() {
            tracing::debug!(model = %model.name, "no enrolled embeddings for model");
            return None;
        }

        // Nearest stored identity by distance. Every entry is scanned;
        // equal distances break on identity so HashMap order cannot leak
        // into the result.
        let mut nearest: Option<(&Identity, f64)> = None;
        for (identity, stored) in &gallery {
            let d = self.metric.distance(&query, stored);
            let better = match nearest {
                None => true,
                Some((best_id, best_d)) => {
                    d < best_d || (d == best_d && identity.as_str() < best_id.as_str())
                }
            };
            if better {
                nearest = Some((identity, d));
            }
        }
        let (identity, distance) = nearest?;

        if distance >= model.distance_threshold {
            tracing::debug!(
                model = %model.name,
                distance,
                threshold = model.distance_threshold,
                "nearest identity above threshold"
            );
            return None;
        }

        let embedding_confidence = (1.0 - distance / model.distance_threshold).clamp(0.0, 1.0);

        // Stored features missing is not a penalty: the feature layer is a
        // booster, so score defaults to 1.0.
        let stored_features = self
            .repository
            .features(identity)
            .unwrap_or_else(|err| {
                tracing::warn!(identity = %identity, error = %err, "feature fetch failed");
                None
            });
        let (feature_score, feature_detail) = match &stored_features {
            Some(stored) => {
                let (score, detail) =
                    similarity::compare(query_features, stored, &self.config.feature_weights);
                (score.clamp(0.0, 1.0), detail)
            }
            None => (1.0, Vec::new()),
        };

        let combined_score = self.config.embedding_weight * embedding_confidence
            + self.config.feature_weight * feature_score;

        let person = self.repository.identity(identity).unwrap_or_else(|err| {
            tracing::warn!(identity = %identity, error = %err, "identity lookup failed");
            None
        });

        tracing::debug!(
            model = %model.name,
            identity = %identity,
            distance,
            embedding_confidence,
            feature_score,
            combined_score,
            "cascade step matched"
        );

        Some(RecognitionResult {
            matched: true,
            identity: Some(identity.clone()),
            person,
            embedding_confidence,
            feature_score,
            combined_score,
            winning_model: Some(model.name.clone()),
            distance: Some(distance),
            feature_detail,
        })
    }

    /// Prepare a new identity for storage: the primary model's embedding
    /// plus the heuristic feature vector.
    pub fn enroll(&self, image: &RgbImage) -> Result<EnrollmentRecord, EnrollError> {
        // `new` validated a non-empty cascade, so this cannot trip.
        let primary = self.config.primary().ok_or(ConfigError::EmptyCascade)?;

        let values = self.provider.embed(image, &primary.name)?;
        if values.len() != primary.expected_dimensions {
            tracing::warn!(
                model = %primary.name,
                expected = primary.expected_dimensions,
                got = values.len(),
                "enrolling embedding with unexpected dimensionality"
            );
        }

        let features = self.extractor.extract(image);
        let features = if features.is_empty() {
            None
        } else {
            Some(features)
        };

        Ok(EnrollmentRecord {
            embedding: Embedding {
                values,
                model: primary.name.clone(),
            },
            features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{ColorMeasurement, SkinToneMeasurement};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider serving fixed per-model embeddings and counting calls.
    #[derive(Default)]
    struct FixedProvider {
        by_model: HashMap<String, Vec<f64>>,
        failing: Vec<String>,
        calls: AtomicUsize,
    }

    impl FixedProvider {
        fn with(models: &[(&str, Vec<f64>)]) -> Self {
            Self {
                by_model: models
                    .iter()
                    .map(|(m, v)| (m.to_string(), v.clone()))
                    .collect(),
                failing: Vec::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl EmbeddingProvider for &FixedProvider {
        fn embed(&self, _image: &RgbImage, model: &str) -> Result<Vec<f64>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.iter().any(|m| m == model) {
                return Err(ProviderError::Backend("unavailable".into()));
            }
            self.by_model
                .get(model)
                .cloned()
                .ok_or(ProviderError::NoFace)
        }
    }

    #[derive(Default)]
    struct MemoryRepository {
        embeddings: HashMap<String, HashMap<Identity, Vec<f64>>>,
        features: HashMap<Identity, FeatureVector>,
        people: HashMap<Identity, PersonRecord>,
    }

    impl MemoryRepository {
        fn add_embedding(&mut self, model: &str, id: &str, values: Vec<f64>) {
            self.embeddings
                .entry(model.to_string())
                .or_default()
                .insert(Identity::new(id), values);
        }
    }

    impl Repository for &MemoryRepository {
        fn embeddings_for_model(
            &self,
            model: &str,
        ) -> Result<HashMap<Identity, Vec<f64>>, RepositoryError> {
            Ok(self.embeddings.get(model).cloned().unwrap_or_default())
        }

        fn features(&self, identity: &Identity) -> Result<Option<FeatureVector>, RepositoryError> {
            Ok(self.features.get(identity).cloned())
        }

        fn identity(&self, identity: &Identity) -> Result<Option<PersonRecord>, RepositoryError> {
            Ok(self.people.get(identity).cloned())
        }
    }

    fn facenet_040(threshold_secondary: f64, threshold_tertiary: f64) -> RecognitionConfig {
        RecognitionConfig {
            cascade: vec![
                ModelConfig::new("Facenet", 0.40, 0.5, 128),
                ModelConfig::new("OpenFace", threshold_secondary, 0.3, 128),
                ModelConfig::new("Facenet-liberal", threshold_tertiary, 0.2, 128),
            ],
            ..Default::default()
        }
    }

    fn embedding_at(offset: f64) -> Vec<f64> {
        let mut v = vec![0.0; 128];
        v[0] = offset;
        v
    }

    fn blank_image() -> RgbImage {
        RgbImage::from_pixel(16, 16, image::Rgb([128, 128, 128]))
    }

    /// Minimal vector that scores 1.0 against itself: only bucketed
    /// categorical fields populated.
    fn categorical_features() -> FeatureVector {
        FeatureVector {
            eye_color: Some(ColorMeasurement {
                rgb: [80, 60, 50],
                name: "brown/dark".into(),
            }),
            hair_color: Some(ColorMeasurement {
                rgb: [30, 25, 20],
                name: "brown/dark".into(),
            }),
            skin_tone: Some(SkinToneMeasurement {
                name: "light".into(),
                rgb: [210, 170, 140],
                hue: 25.7,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_scenario_a_exact_scores() {
        // Distance 0.10 against threshold 0.40 with identical features:
        // confidence 0.75, feature score 1.0, combined 0.825.
        let provider = FixedProvider::with(&[
            ("Facenet", embedding_at(0.0)),
            ("OpenFace", embedding_at(0.0)),
            ("Facenet-liberal", embedding_at(0.0)),
        ]);
        let mut repo = MemoryRepository::default();
        repo.add_embedding("Facenet", "id-1", embedding_at(0.10));
        repo.features
            .insert(Identity::new("id-1"), categorical_features());

        let engine =
            MatchingEngine::new(&provider, &repo, facenet_040(0.45, 0.50)).unwrap();
        let query = categorical_features();
        let result = engine.recognize_with_features(&blank_image(), &query);

        assert!(result.matched);
        assert_eq!(result.identity, Some(Identity::new("id-1")));
        assert!((result.embedding_confidence - 0.75).abs() < 1e-9);
        assert!((result.feature_score - 1.0).abs() < 1e-9);
        assert!((result.combined_score - 0.825).abs() < 1e-9);
        assert_eq!(result.winning_model.as_deref(), Some("Facenet"));
        assert!((result.distance.unwrap() - 0.10).abs() < 1e-9);
        assert!(!result.feature_detail.is_empty());
    }

    #[test]
    fn test_scenario_b_empty_repository() {
        let provider = FixedProvider::with(&[
            ("Facenet", embedding_at(0.0)),
            ("OpenFace", embedding_at(0.0)),
            ("Facenet-liberal", embedding_at(0.0)),
        ]);
        let repo = MemoryRepository::default();

        let engine =
            MatchingEngine::new(&provider, &repo, facenet_040(0.45, 0.50)).unwrap();
        let result = engine.recognize(&blank_image());

        assert!(!result.matched);
        assert!(result.identity.is_none());
        assert!(result.winning_model.is_none());
        // All three models were still attempted.
        assert_eq!(provider.call_count(), 3);
    }

    #[test]
    fn test_scenario_c_secondary_model_wins() {
        // Primary nearest distance 0.41 misses its 0.40 threshold; the
        // secondary's 0.30 clears 0.45, so the secondary must win.
        let provider = FixedProvider::with(&[
            ("Facenet", embedding_at(0.0)),
            ("OpenFace", embedding_at(0.0)),
            ("Facenet-liberal", embedding_at(0.0)),
        ]);
        let mut repo = MemoryRepository::default();
        repo.add_embedding("Facenet", "id-1", embedding_at(0.41));
        repo.add_embedding("OpenFace", "id-1", embedding_at(0.30));

        let engine =
            MatchingEngine::new(&provider, &repo, facenet_040(0.45, 0.50)).unwrap();
        let result = engine.recognize(&blank_image());

        assert!(result.matched);
        assert_eq!(result.winning_model.as_deref(), Some("OpenFace"));
        assert!((result.distance.unwrap() - 0.30).abs() < 1e-9);
    }

    #[test]
    fn test_cascade_is_exhaustive_even_after_early_match() {
        // The primary already matches perfectly, yet all models must be
        // asked for an embedding.
        let provider = FixedProvider::with(&[
            ("Facenet", embedding_at(0.0)),
            ("OpenFace", embedding_at(0.0)),
            ("Facenet-liberal", embedding_at(0.0)),
        ]);
        let mut repo = MemoryRepository::default();
        repo.add_embedding("Facenet", "id-1", embedding_at(0.0));

        let engine =
            MatchingEngine::new(&provider, &repo, facenet_040(0.45, 0.50)).unwrap();
        let result = engine.recognize(&blank_image());

        assert!(result.matched);
        assert_eq!(provider.call_count(), 3);
    }

    #[test]
    fn test_later_model_overrides_earlier_on_higher_combined_score() {
        // Both models clear their thresholds for different identities; the
        // later model's blended score is higher and takes the result.
        let provider = FixedProvider::with(&[
            ("Facenet", embedding_at(0.0)),
            ("OpenFace", embedding_at(0.0)),
            ("Facenet-liberal", embedding_at(0.0)),
        ]);
        let mut repo = MemoryRepository::default();
        // Primary: distance 0.30 / 0.40 -> confidence 0.25.
        repo.add_embedding("Facenet", "id-weak", embedding_at(0.30));
        // Secondary: distance 0.05 / 0.45 -> confidence ~0.889.
        repo.add_embedding("OpenFace", "id-strong", embedding_at(0.05));

        let engine =
            MatchingEngine::new(&provider, &repo, facenet_040(0.45, 0.50)).unwrap();
        let result = engine.recognize(&blank_image());

        assert!(result.matched);
        assert_eq!(result.identity, Some(Identity::new("id-strong")));
        assert_eq!(result.winning_model.as_deref(), Some("OpenFace"));
    }

    #[test]
    fn test_provider_failure_skips_only_that_model() {
        let mut provider = FixedProvider::with(&[
            ("Facenet", embedding_at(0.0)),
            ("OpenFace", embedding_at(0.0)),
            ("Facenet-liberal", embedding_at(0.0)),
        ]);
        provider.failing.push("Facenet".to_string());

        let mut repo = MemoryRepository::default();
        repo.add_embedding("Facenet", "id-1", embedding_at(0.0));
        repo.add_embedding("OpenFace", "id-1", embedding_at(0.10));

        let engine =
            MatchingEngine::new(&provider, &repo, facenet_040(0.45, 0.50)).unwrap();
        let result = engine.recognize(&blank_image());

        assert!(result.matched);
        assert_eq!(result.winning_model.as_deref(), Some("OpenFace"));
        assert_eq!(provider.call_count(), 3);
    }

    #[test]
    fn test_missing_stored_features_score_one() {
        // No stored FeatureVector: the booster must not penalize.
        let provider = FixedProvider::with(&[("Facenet", embedding_at(0.0))]);
        let mut repo = MemoryRepository::default();
        repo.add_embedding("Facenet", "id-1", embedding_at(0.20));

        let config = RecognitionConfig {
            cascade: vec![ModelConfig::new("Facenet", 0.40, 1.0, 128)],
            ..Default::default()
        };
        let engine = MatchingEngine::new(&provider, &repo, config).unwrap();
        let result = engine.recognize(&blank_image());

        assert!(result.matched);
        assert!((result.feature_score - 1.0).abs() < 1e-9);
        assert!((result.embedding_confidence - 0.5).abs() < 1e-9);
        assert!((result.combined_score - 0.65).abs() < 1e-9);
        assert!(result.feature_detail.is_empty());
    }

    #[test]
    fn test_combined_score_is_exact_blend() {
        // combined = 0.7 * confidence + 0.3 * feature_score, exactly.
        let provider = FixedProvider::with(&[("Facenet", embedding_at(0.0))]);
        let mut repo = MemoryRepository::default();
        repo.add_embedding("Facenet", "id-1", embedding_at(0.10));
        repo.features
            .insert(Identity::new("id-1"), categorical_features());

        let config = RecognitionConfig {
            cascade: vec![ModelConfig::new("Facenet", 0.40, 1.0, 128)],
            ..Default::default()
        };
        let engine = MatchingEngine::new(&provider, &repo, config).unwrap();
        // Empty query features: no overlap with stored -> feature_score 0.
        let result =
            engine.recognize_with_features(&blank_image(), &FeatureVector::default());

        assert!(result.matched);
        assert_eq!(result.feature_score, 0.0);
        let expected = 0.7 * result.embedding_confidence;
        assert!((result.combined_score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_mixed_dimensionality_gallery_is_comparable() {
        // A 160-dim stored embedding against a 128-dim query must not
        // error; the common prefix decides.
        let provider = FixedProvider::with(&[("Facenet", embedding_at(0.0))]);
        let mut repo = MemoryRepository::default();
        let mut long = vec![0.0; 160];
        long[0] = 0.10;
        for v in long.iter_mut().skip(128) {
            *v = 999.0;
        }
        repo.add_embedding("Facenet", "id-1", long);

        let config = RecognitionConfig {
            cascade: vec![ModelConfig::new("Facenet", 0.40, 1.0, 128)],
            ..Default::default()
        };
        let engine = MatchingEngine::new(&provider, &repo, config).unwrap();
        let result = engine.recognize(&blank_image());

        assert!(result.matched);
        assert!((result.distance.unwrap() - 0.10).abs() < 1e-9);
    }

    #[test]
    fn test_person_record_attached_when_known() {
        let provider = FixedProvider::with(&[("Facenet", embedding_at(0.0))]);
        let mut repo = MemoryRepository::default();
        repo.add_embedding("Facenet", "id-1", embedding_at(0.10));
        repo.people.insert(
            Identity::new("id-1"),
            PersonRecord {
                identity: Identity::new("id-1"),
                first_name: "Jan".into(),
                last_name: "Kowalski".into(),
                date_of_birth: "1990-01-01".into(),
                gender: "M".into(),
            },
        );

        let config = RecognitionConfig {
            cascade: vec![ModelConfig::new("Facenet", 0.40, 1.0, 128)],
            ..Default::default()
        };
        let engine = MatchingEngine::new(&provider, &repo, config).unwrap();
        let result = engine.recognize(&blank_image());

        assert!(result.matched);
        assert_eq!(result.person.unwrap().first_name, "Jan");
    }

    #[test]
    fn test_nearest_identity_wins_within_model() {
        let provider = FixedProvider::with(&[("Facenet", embedding_at(0.0))]);
        let mut repo = MemoryRepository::default();
        repo.add_embedding("Facenet", "id-far", embedding_at(0.35));
        repo.add_embedding("Facenet", "id-near", embedding_at(0.05));

        let config = RecognitionConfig {
            cascade: vec![ModelConfig::new("Facenet", 0.40, 1.0, 128)],
            ..Default::default()
        };
        let engine = MatchingEngine::new(&provider, &repo, config).unwrap();
        let result = engine.recognize(&blank_image());

        assert_eq!(result.identity, Some(Identity::new("id-near")));
    }

    #[test]
    fn test_equidistant_identities_resolve_deterministically() {
        // Two stored embeddings at exactly the same distance: the winner
        // must not depend on gallery iteration order.
        let provider = FixedProvider::with(&[("Facenet", embedding_at(0.0))]);
        let mut repo = MemoryRepository::default();
        repo.add_embedding("Facenet", "id-b", embedding_at(0.10));
        repo.add_embedding("Facenet", "id-a", embedding_at(-0.10));

        let config = RecognitionConfig {
            cascade: vec![ModelConfig::new("Facenet", 0.40, 1.0, 128)],
            ..Default::default()
        };
        let engine = MatchingEngine::new(&provider, &repo, config).unwrap();
        for _ in 0..10 {
            let result = engine.recognize(&blank_image());
            assert_eq!(result.identity, Some(Identity::new("id-a")));
        }
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let provider = FixedProvider::default();
        let repo = MemoryRepository::default();
        let config = RecognitionConfig {
            cascade: vec![],
            ..Default::default()
        };
        assert!(MatchingEngine::new(&provider, &repo, config).is_err());
    }

    #[test]
    fn test_enroll_returns_primary_embedding_and_features() {
        let provider = FixedProvider::with(&[("Facenet", embedding_at(0.25))]);
        let repo = MemoryRepository::default();
        let engine =
            MatchingEngine::new(&provider, &repo, facenet_040(0.45, 0.50)).unwrap();

        let record = engine.enroll(&blank_image()).unwrap();
        assert_eq!(record.embedding.model, "Facenet");
        assert_eq!(record.embedding.values.len(), 128);
        // A real image always yields at least some features.
        assert!(record.features.is_some());
        // Only the primary model is embedded during enrollment.
        assert_eq!(provider.call_count(), 1);
    }

    #[test]
    fn test_enroll_propagates_provider_failure() {
        let mut provider = FixedProvider::with(&[("Facenet", embedding_at(0.0))]);
        provider.failing.push("Facenet".to_string());
        let repo = MemoryRepository::default();
        let engine =
            MatchingEngine::new(&provider, &repo, facenet_040(0.45, 0.50)).unwrap();

        assert!(matches!(
            engine.enroll(&blank_image()),
            Err(EnrollError::Provider(_))
        ));
    }
}
