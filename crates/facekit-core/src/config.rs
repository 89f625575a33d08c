//! Static recognition configuration.
//!
//! Everything here is an explicit object handed to the engine at
//! construction, never ambient global state. Defaults reproduce the
//! production cascade: a conservative primary model, a balanced
//! secondary and a liberal tertiary fallback, all 128-dimensional.

use crate::types::FeatureName;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cascade must contain at least one model")]
    EmptyCascade,
    #[error("model {0}: distance threshold must be positive")]
    BadThreshold(String),
    #[error("feature weights sum to {0:.3}, must be <= 1.0")]
    WeightSum(f64),
    #[error("embedding/feature blend weights must sum to 1.0, got {0:.3}")]
    BadBlend(f64),
}

/// One embedding model in the cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier understood by the EmbeddingProvider.
    pub name: String,
    /// A nearest match is only accepted below this Euclidean distance.
    pub distance_threshold: f64,
    /// Relative precedence of this model within the cascade. Informational:
    /// the final ranking uses combined scores, not this weight.
    pub cascade_weight: f64,
    /// Dimensionality this model is expected to produce. A provider result
    /// of a different length is logged and still used (see distance policy).
    pub expected_dimensions: usize,
}

impl ModelConfig {
    pub fn new(
        name: impl Into<String>,
        distance_threshold: f64,
        cascade_weight: f64,
        expected_dimensions: usize,
    ) -> Self {
        Self {
            name: name.into(),
            distance_threshold,
            cascade_weight,
            expected_dimensions,
        }
    }
}

/// Per-feature weights for the heuristic similarity score.
///
/// The two features without a defined comparison rule (skin_features,
/// age_estimate) default to zero weight; setting them non-zero makes them
/// contribute their 0.5 fallback similarity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureWeights {
    pub eye_color: f64,
    pub hair_color: f64,
    pub eye_distance: f64,
    pub nose_width: f64,
    pub mouth_width: f64,
    pub eyebrow_shape: f64,
    pub skin_features: f64,
    pub facial_asymmetry: f64,
    pub age_estimate: f64,
    pub skin_tone: f64,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self {
            eye_color: 0.20,
            hair_color: 0.15,
            eye_distance: 0.15,
            nose_width: 0.12,
            mouth_width: 0.10,
            eyebrow_shape: 0.10,
            skin_features: 0.0,
            facial_asymmetry: 0.08,
            age_estimate: 0.0,
            skin_tone: 0.10,
        }
    }
}

impl FeatureWeights {
    pub fn weight(&self, feature: FeatureName) -> f64 {
        match feature {
            FeatureName::EyeColor => self.eye_color,
            FeatureName::HairColor => self.hair_color,
            FeatureName::EyeDistance => self.eye_distance,
            FeatureName::NoseWidth => self.nose_width,
            FeatureName::MouthWidth => self.mouth_width,
            FeatureName::EyebrowShape => self.eyebrow_shape,
            FeatureName::SkinFeatures => self.skin_features,
            FeatureName::FacialAsymmetry => self.facial_asymmetry,
            FeatureName::AgeEstimate => self.age_estimate,
            FeatureName::SkinTone => self.skin_tone,
        }
    }

    pub fn sum(&self) -> f64 {
        FeatureName::ALL.iter().map(|&f| self.weight(f)).sum()
    }
}

/// Process-wide recognition configuration: the model cascade, the feature
/// weight table, and the confidence/feature blend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Models tried in order, highest precedence first. All are always
    /// evaluated; order only documents intent.
    pub cascade: Vec<ModelConfig>,
    pub feature_weights: FeatureWeights,
    /// Weight of the embedding confidence in the combined score.
    pub embedding_weight: f64,
    /// Weight of the heuristic feature score in the combined score.
    pub feature_weight: f64,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            cascade: vec![
                ModelConfig::new("Facenet", 0.40, 0.5, 128),
                ModelConfig::new("OpenFace", 0.45, 0.3, 128),
                ModelConfig::new("Facenet", 0.50, 0.2, 128),
            ],
            feature_weights: FeatureWeights::default(),
            embedding_weight: 0.7,
            feature_weight: 0.3,
        }
    }
}

impl RecognitionConfig {
    /// Validate invariants: non-empty cascade, positive thresholds,
    /// feature weights summing to at most 1.0, blend summing to 1.0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cascade.is_empty() {
            return Err(ConfigError::EmptyCascade);
        }
        for model in &self.cascade {
            if model.distance_threshold <= 0.0 {
                return Err(ConfigError::BadThreshold(model.name.clone()));
            }
        }
        let sum = self.feature_weights.sum();
        if sum > 1.0 + 1e-9 {
            return Err(ConfigError::WeightSum(sum));
        }
        let blend = self.embedding_weight + self.feature_weight;
        if (blend - 1.0).abs() > 1e-9 {
            return Err(ConfigError::BadBlend(blend));
        }
        Ok(())
    }

    /// The primary (first, strictest) model of the cascade.
    ///
    /// Panics never: `validate` guarantees a non-empty cascade before an
    /// engine is built around this config.
    pub fn primary(&self) -> Option<&ModelConfig> {
        self.cascade.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = RecognitionConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.cascade.len(), 3);
        assert_eq!(cfg.cascade[0].name, "Facenet");
        assert_eq!(cfg.cascade[1].name, "OpenFace");
        assert!((cfg.embedding_weight - 0.7).abs() < 1e-12);
        assert!((cfg.feature_weight - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let w = FeatureWeights::default();
        assert!((w.sum() - 1.0).abs() < 1e-9, "sum = {}", w.sum());
    }

    #[test]
    fn test_empty_cascade_rejected() {
        let cfg = RecognitionConfig {
            cascade: vec![],
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptyCascade)));
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let cfg = RecognitionConfig {
            cascade: vec![ModelConfig::new("Facenet", -0.1, 1.0, 128)],
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::BadThreshold(_))));
    }

    #[test]
    fn test_overweight_features_rejected() {
        let mut cfg = RecognitionConfig::default();
        cfg.feature_weights.eye_color = 0.9;
        assert!(matches!(cfg.validate(), Err(ConfigError::WeightSum(_))));
    }

    #[test]
    fn test_bad_blend_rejected() {
        let cfg = RecognitionConfig {
            embedding_weight: 0.8,
            feature_weight: 0.3,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::BadBlend(_))));
    }

    #[test]
    fn test_toml_roundtrip() {
        let cfg = RecognitionConfig::default();
        let text = toml::to_string(&cfg).unwrap();
        let back: RecognitionConfig = toml::from_str(&text).unwrap();
        back.validate().unwrap();
        assert_eq!(back.cascade.len(), cfg.cascade.len());
        assert_eq!(back.cascade[0].distance_threshold, 0.40);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let back: RecognitionConfig = toml::from_str("embedding_weight = 0.7\n").unwrap();
        assert_eq!(back.cascade.len(), 3);
        assert!((back.feature_weights.eye_color - 0.20).abs() < 1e-12);
    }
}
