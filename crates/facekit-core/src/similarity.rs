//! Weighted comparison of two feature vectors.
//!
//! The score is a weighted mean over the features present in BOTH
//! vectors; features missing on either side simply drop out of the
//! denominator. No overlap at all scores 0.

use crate::config::FeatureWeights;
use crate::features::FeatureVector;
use crate::types::{FeatureName, FeatureSimilarity};

/// Angle difference (degrees) at which eyebrow similarity bottoms out.
const BROW_ANGLE_RANGE: f64 = 45.0;
/// Sensitivity of the normalized eye-distance comparison.
const EYE_DISTANCE_SCALE: f64 = 5.0;
/// Similarity assigned when a feature is measured on both sides but its
/// comparable fields are inconclusive, and for features with no defined
/// comparison rule.
const INCONCLUSIVE: f64 = 0.5;
/// Same-vs-different bucket similarity for skin tone.
const SKIN_TONE_MISMATCH: f64 = 0.6;

/// Weighted feature score in [0, 1].
pub fn feature_score(a: &FeatureVector, b: &FeatureVector, weights: &FeatureWeights) -> f64 {
    compare(a, b, weights).0
}

/// Weighted feature score plus the per-feature similarities that went
/// into it (one entry per feature present in both vectors).
pub fn compare(
    a: &FeatureVector,
    b: &FeatureVector,
    weights: &FeatureWeights,
) -> (f64, Vec<FeatureSimilarity>) {
    let mut weighted = 0.0f64;
    let mut total_weight = 0.0f64;
    let mut detail = Vec::new();

    for &feature in &FeatureName::ALL {
        let Some(similarity) = feature_similarity(feature, a, b) else {
            continue;
        };
        detail.push(FeatureSimilarity {
            feature,
            similarity,
        });
        let weight = weights.weight(feature);
        weighted += similarity * weight;
        total_weight += weight;
    }

    if total_weight > 0.0 {
        ((weighted / total_weight).clamp(0.0, 1.0), detail)
    } else {
        (0.0, detail)
    }
}

/// Similarity of one feature, or `None` when it is absent in either vector.
fn feature_similarity(feature: FeatureName, a: &FeatureVector, b: &FeatureVector) -> Option<f64> {
    match feature {
        FeatureName::EyeColor => {
            let (x, y) = (a.eye_color.as_ref()?, b.eye_color.as_ref()?);
            Some(color_similarity(&x.name, x.rgb, &y.name, y.rgb))
        }
        FeatureName::HairColor => {
            let (x, y) = (a.hair_color.as_ref()?, b.hair_color.as_ref()?);
            Some(color_similarity(&x.name, x.rgb, &y.name, y.rgb))
        }
        FeatureName::EyeDistance => {
            let (x, y) = (a.eye_distance.as_ref()?, b.eye_distance.as_ref()?);
            match (x.normalized_distance, y.normalized_distance) {
                (Some(d1), Some(d2)) => {
                    Some((1.0 - EYE_DISTANCE_SCALE * (d1 - d2).abs()).max(0.0))
                }
                _ => Some(INCONCLUSIVE),
            }
        }
        FeatureName::NoseWidth => {
            let (x, y) = (a.nose_width.as_ref()?, b.nose_width.as_ref()?);
            Some(width_similarity(x.width_estimate, y.width_estimate))
        }
        FeatureName::MouthWidth => {
            let (x, y) = (a.mouth_width.as_ref()?, b.mouth_width.as_ref()?);
            match (x.width_px, y.width_px) {
                (Some(w1), Some(w2)) => Some(width_similarity(w1 as f64, w2 as f64)),
                _ => Some(INCONCLUSIVE),
            }
        }
        FeatureName::EyebrowShape => {
            let (x, y) = (a.eyebrow_shape.as_ref()?, b.eyebrow_shape.as_ref()?);
            match (x.average_angle, y.average_angle) {
                (Some(a1), Some(a2)) => {
                    Some((1.0 - (a1 - a2).abs() / BROW_ANGLE_RANGE).max(0.0))
                }
                _ => Some(INCONCLUSIVE),
            }
        }
        FeatureName::FacialAsymmetry => {
            let (x, y) = (a.facial_asymmetry.as_ref()?, b.facial_asymmetry.as_ref()?);
            Some((1.0 - (x.score - y.score).abs()).max(0.0))
        }
        FeatureName::SkinTone => {
            let (x, y) = (a.skin_tone.as_ref()?, b.skin_tone.as_ref()?);
            if x.name == y.name {
                Some(1.0)
            } else {
                Some(SKIN_TONE_MISMATCH)
            }
        }
        // No comparison rule is defined for these two; they only matter if
        // someone assigns them a non-zero weight.
        FeatureName::SkinFeatures => {
            a.skin_features.as_ref()?;
            b.skin_features.as_ref()?;
            Some(INCONCLUSIVE)
        }
        FeatureName::AgeEstimate => {
            a.age_estimate.as_ref()?;
            b.age_estimate.as_ref()?;
            Some(INCONCLUSIVE)
        }
    }
}

/// Bucket names equal -> 1.0, otherwise RGB proximity.
fn color_similarity(name1: &str, rgb1: [u8; 3], name2: &str, rgb2: [u8; 3]) -> f64 {
    if name1 == name2 {
        return 1.0;
    }
    let dist = rgb1
        .iter()
        .zip(rgb2.iter())
        .map(|(&a, &b)| {
            let d = a as f64 - b as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt();
    (1.0 - dist / 255.0).max(0.0)
}

/// Relative-difference similarity for width-like measures.
fn width_similarity(w1: f64, w2: f64) -> f64 {
    let max = w1.max(w2);
    if max <= 0.0 {
        // Both zero: indistinguishable.
        return 1.0;
    }
    (1.0 - (w1 - w2).abs() / max).max(0.0)
}
