use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, stable identifier for a person (e.g. a national ID number).
///
/// Owned by the Repository; this core only references it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Demographic record for an enrolled person, as stored by the Repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonRecord {
    pub identity: Identity,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub gender: String,
}

/// Fixed-length embedding produced by one named model for one identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f64>,
    /// Name of the model that produced this embedding (e.g. "Facenet").
    pub model: String,
}

impl Embedding {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The ten heuristic appearance features this core measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureName {
    EyeColor,
    HairColor,
    EyeDistance,
    NoseWidth,
    MouthWidth,
    EyebrowShape,
    SkinFeatures,
    FacialAsymmetry,
    AgeEstimate,
    SkinTone,
}

impl FeatureName {
    pub const ALL: [FeatureName; 10] = [
        FeatureName::EyeColor,
        FeatureName::HairColor,
        FeatureName::EyeDistance,
        FeatureName::NoseWidth,
        FeatureName::MouthWidth,
        FeatureName::EyebrowShape,
        FeatureName::SkinFeatures,
        FeatureName::FacialAsymmetry,
        FeatureName::AgeEstimate,
        FeatureName::SkinTone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureName::EyeColor => "eye_color",
            FeatureName::HairColor => "hair_color",
            FeatureName::EyeDistance => "eye_distance",
            FeatureName::NoseWidth => "nose_width",
            FeatureName::MouthWidth => "mouth_width",
            FeatureName::EyebrowShape => "eyebrow_shape",
            FeatureName::SkinFeatures => "skin_features",
            FeatureName::FacialAsymmetry => "facial_asymmetry",
            FeatureName::AgeEstimate => "age_estimate",
            FeatureName::SkinTone => "skin_tone",
        }
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Similarity of one feature between the query and a stored vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSimilarity {
    pub feature: FeatureName,
    pub similarity: f64,
}

/// Outcome of one recognition request.
///
/// Produced once per request and never persisted by this core. A result
/// with `matched = true` always carries a `winning_model` drawn from the
/// configured cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub matched: bool,
    pub identity: Option<Identity>,
    /// Demographic record of the matched identity, when the Repository has one.
    pub person: Option<PersonRecord>,
    /// Embedding-side confidence, clamped to [0, 1].
    pub embedding_confidence: f64,
    /// Heuristic feature similarity, in [0, 1]. 1.0 when no stored features exist.
    pub feature_score: f64,
    /// Blend of confidence and feature score; the quantity the cascade ranks by.
    pub combined_score: f64,
    pub winning_model: Option<String>,
    /// Raw embedding distance of the winning match.
    pub distance: Option<f64>,
    /// Per-feature similarities for the features compared.
    pub feature_detail: Vec<FeatureSimilarity>,
}

impl RecognitionResult {
    /// The "not recognized" result: a normal outcome, not an error.
    pub fn no_match() -> Self {
        Self {
            matched: false,
            identity: None,
            person: None,
            embedding_confidence: 0.0,
            feature_score: 0.0,
            combined_score: 0.0,
            winning_model: None,
            distance: None,
            feature_detail: Vec::new(),
        }
    }
}
