//! facekit-core — Face identification engine.
//!
//! Pairs a heuristic appearance-feature extractor with a multi-model
//! embedding cascade: embedding confidence and feature similarity are
//! blended into one combined score per candidate identity.

pub mod config;
pub mod distance;
pub mod features;
mod imageops;
pub mod matcher;
pub mod similarity;
pub mod types;

pub use config::{ConfigError, FeatureWeights, ModelConfig, RecognitionConfig};
pub use distance::{DistanceMetric, TruncatedEuclidean};
pub use features::{ExtractionError, FeatureExtractor, FeatureVector};
pub use matcher::{
    EmbeddingProvider, EnrollError, EnrollmentRecord, MatchingEngine, ProviderError, Repository,
    RepositoryError,
};
pub use types::{Embedding, FeatureName, FeatureSimilarity, Identity, PersonRecord, RecognitionResult};
