//! Heuristic appearance-feature extraction.
//!
//! Derives a structured, comparable [`FeatureVector`] from an upright
//! photograph using only classical image-processing primitives. Every
//! sub-extraction is independently guarded: a region that cannot be
//! measured yields `None` for that feature, never an error for the whole
//! vector. The measurements are approximations by design — a booster for
//! embedding matches, not a standalone recognizer.

use crate::imageops::{
    self, connected_components, crop_gray, crop_rgb, dft_magnitude, edge_mask, fractional_rect,
    kmeans_dominant_color, mean_stddev, percentile, rgb_to_hue, sobel_x_abs,
};
use image::imageops::FilterType;
use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

// --- Region-of-interest proportions (fractions of image width/height) ---
const EYE_ROI: (f64, f64, f64, f64) = (0.25, 0.75, 0.15, 0.35);
const HAIR_ROI: (f64, f64, f64, f64) = (0.0, 1.0, 0.0, 0.25);
const CHEEK_ROI: (f64, f64, f64, f64) = (0.10, 0.40, 0.35, 0.65);
const NOSE_ROI: (f64, f64, f64, f64) = (0.35, 0.65, 0.40, 0.70);
const MOUTH_ROI: (f64, f64, f64, f64) = (0.30, 0.70, 0.65, 0.85);
const BROW_ROI: (f64, f64, f64, f64) = (0.25, 0.75, 0.15, 0.30);

// --- Tuning constants ---
const COLOR_CLUSTERS: usize = 3;
const COLOR_KMEANS_ITERATIONS: usize = 10;
const NOSE_GRADIENT_PERCENTILE: f64 = 75.0;
const MOUTH_EDGE_THRESHOLD: f32 = 120.0;
const BROW_EDGE_THRESHOLD: f32 = 80.0;
const BLEMISH_DARK_THRESHOLD: u8 = 80;
const BLEMISH_BLUR_SIGMA: f32 = 1.0;
const BLEMISH_MIN_AREA: usize = 5; // exclusive
const BLEMISH_MAX_AREA: usize = 500; // exclusive
const AGE_TILE_SIZE: u32 = 64;
const AGE_HIGH_PERCENTILE: f64 = 85.0;
const AGE_LOW_PERCENTILE: f64 = 15.0;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has zero area")]
    EmptyImage,
}

/// Dominant-color measurement for an image region (eyes, hair).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorMeasurement {
    pub rgb: [u8; 3],
    /// Coarse color bucket, e.g. "light", "brown/dark", "bluish".
    pub name: String,
}

/// Skin tone: dominant cheek color plus its hue angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkinToneMeasurement {
    pub name: String,
    pub rgb: [u8; 3],
    /// Hue in degrees (0..360).
    pub hue: f64,
}

/// Inter-eye distance. When fewer than two eye candidates are found the
/// measurement is present but inconclusive: distances stay `None` and
/// `eyes_detected` records what the detector saw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EyeDistanceMeasurement {
    pub pixel_distance: Option<f64>,
    /// Pixel distance normalized by image width.
    pub normalized_distance: Option<f64>,
    pub eyes_detected: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoseWidthMeasurement {
    /// Fraction of ROI pixels above the 75th-percentile horizontal gradient.
    pub width_estimate: f64,
    /// ROI width relative to the full image width.
    pub relative_width: f64,
}

/// Bounding box of the largest edge contour in the lower-face ROI.
/// All `None` when no contour was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouthMeasurement {
    pub width_px: Option<u32>,
    pub height_px: Option<u32>,
    pub aspect_ratio: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowShapeClass {
    Straight,
    SlightlyAngled,
    Angled,
    HighlyAngled,
    Unknown,
}

impl BrowShapeClass {
    /// Bucket an absolute average contour angle.
    fn from_angle(angle_degrees: f64) -> Self {
        let a = angle_degrees.abs();
        if a < 10.0 {
            BrowShapeClass::Straight
        } else if a < 20.0 {
            BrowShapeClass::SlightlyAngled
        } else if a < 35.0 {
            BrowShapeClass::Angled
        } else {
            BrowShapeClass::HighlyAngled
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EyebrowMeasurement {
    /// Mean orientation of edge contours in the brow band, degrees.
    pub average_angle: Option<f64>,
    pub shape: BrowShapeClass,
    pub contours: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkinTextureMeasurement {
    /// Dark marks (freckles, moles) with area in (5, 500) px.
    pub blemish_count: usize,
    /// stdev / mean of grayscale intensity.
    pub roughness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AsymmetryLevel {
    Symmetric,
    SlightlyAsymmetric,
    Asymmetric,
}

impl AsymmetryLevel {
    fn from_score(score: f64) -> Self {
        if score < 0.15 {
            AsymmetryLevel::Symmetric
        } else if score < 0.3 {
            AsymmetryLevel::SlightlyAsymmetric
        } else {
            AsymmetryLevel::Asymmetric
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsymmetryMeasurement {
    /// Mean absolute midline-mirror difference, normalized to [0, 1].
    pub score: f64,
    pub level: AsymmetryLevel,
}

/// Ordered age brackets derived from the frequency-domain wrinkle score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeBracket {
    /// 18-25
    Young,
    /// 25-35
    Adult,
    /// 35-50
    Mature,
    /// 50+
    Older,
}

impl AgeBracket {
    fn from_wrinkle_score(score: f64) -> Self {
        if score < 1.5 {
            AgeBracket::Young
        } else if score < 2.0 {
            AgeBracket::Adult
        } else if score < 2.5 {
            AgeBracket::Mature
        } else {
            AgeBracket::Older
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
}

/// The method is explicitly unreliable; confidence is always `Low`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeMeasurement {
    pub wrinkle_score: f64,
    pub bracket: AgeBracket,
    pub confidence: Confidence,
}

/// Structured set of heuristic appearance measurements for one photograph.
///
/// Each field is `None` when that sub-extraction failed; the vector as a
/// whole is always produced. Serializes losslessly for Repository storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub eye_color: Option<ColorMeasurement>,
    pub hair_color: Option<ColorMeasurement>,
    pub eye_distance: Option<EyeDistanceMeasurement>,
    pub nose_width: Option<NoseWidthMeasurement>,
    pub mouth_width: Option<MouthMeasurement>,
    pub eyebrow_shape: Option<EyebrowMeasurement>,
    pub skin_features: Option<SkinTextureMeasurement>,
    pub facial_asymmetry: Option<AsymmetryMeasurement>,
    pub age_estimate: Option<AgeMeasurement>,
    pub skin_tone: Option<SkinToneMeasurement>,
}

impl FeatureVector {
    pub fn is_empty(&self) -> bool {
        self.present_count() == 0
    }

    pub fn present_count(&self) -> usize {
        crate::types::FeatureName::ALL
            .iter()
            .filter(|&&f| self.present(f))
            .count()
    }

    pub fn present(&self, feature: crate::types::FeatureName) -> bool {
        use crate::types::FeatureName::*;
        match feature {
            EyeColor => self.eye_color.is_some(),
            HairColor => self.hair_color.is_some(),
            EyeDistance => self.eye_distance.is_some(),
            NoseWidth => self.nose_width.is_some(),
            MouthWidth => self.mouth_width.is_some(),
            EyebrowShape => self.eyebrow_shape.is_some(),
            SkinFeatures => self.skin_features.is_some(),
            FacialAsymmetry => self.facial_asymmetry.is_some(),
            AgeEstimate => self.age_estimate.is_some(),
            SkinTone => self.skin_tone.is_some(),
        }
    }
}

/// Parameters of the dark-blob eye detector.
#[derive(Debug, Clone)]
pub struct EyeDetectorParams {
    /// Vertical search band, as fractions of image height.
    pub band_top: f64,
    pub band_bottom: f64,
    /// Pixels darker than this percentile of the band are eye candidates.
    pub darkness_percentile: f64,
    /// Accepted blob area, as fractions of the band area.
    pub min_area_fraction: f64,
    pub max_area_fraction: f64,
    /// Blobs wider or taller than this width/height ratio are rejected
    /// (hairlines, shadows).
    pub max_aspect: f64,
}

impl Default for EyeDetectorParams {
    fn default() -> Self {
        Self {
            band_top: 0.15,
            band_bottom: 0.40,
            darkness_percentile: 12.0,
            min_area_fraction: 0.0005,
            max_area_fraction: 0.02,
            max_aspect: 3.0,
        }
    }
}

/// Extracts a [`FeatureVector`] from an upright photograph.
///
/// Stateless apart from its tuning parameters; one instance can serve
/// concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    eye_detector: EyeDetectorParams,
}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_eye_detector(eye_detector: EyeDetectorParams) -> Self {
        Self { eye_detector }
    }

    /// Decode an image file and extract features.
    ///
    /// Decoding is the only hard failure; per-feature problems degrade to
    /// absent fields.
    pub fn extract_path(&self, path: impl AsRef<Path>) -> Result<FeatureVector, ExtractionError> {
        let image = image::open(path)?.to_rgb8();
        if image.width() == 0 || image.height() == 0 {
            return Err(ExtractionError::EmptyImage);
        }
        Ok(self.extract(&image))
    }

    /// Decode an in-memory image and extract features.
    pub fn extract_bytes(&self, bytes: &[u8]) -> Result<FeatureVector, ExtractionError> {
        let image = image::load_from_memory(bytes)?.to_rgb8();
        if image.width() == 0 || image.height() == 0 {
            return Err(ExtractionError::EmptyImage);
        }
        Ok(self.extract(&image))
    }

    /// Extract all ten features. Total: never fails, features that cannot
    /// be measured come back `None`.
    pub fn extract(&self, image: &RgbImage) -> FeatureVector {
        if image.width() == 0 || image.height() == 0 {
            return FeatureVector::default();
        }
        let gray: GrayImage = image::imageops::grayscale(image);

        let vector = FeatureVector {
            eye_color: self.region_color(image, EYE_ROI),
            hair_color: self.region_color(image, HAIR_ROI),
            eye_distance: self.eye_distance(&gray),
            nose_width: self.nose_width(&gray),
            mouth_width: self.mouth_width(&gray),
            eyebrow_shape: self.eyebrow_shape(&gray),
            skin_features: self.skin_texture(&gray),
            facial_asymmetry: self.facial_asymmetry(&gray),
            age_estimate: self.age_estimate(&gray),
            skin_tone: self.skin_tone(image),
        };
        tracing::debug!(
            width = image.width(),
            height = image.height(),
            present = vector.present_count(),
            "feature extraction complete"
        );
        vector
    }

    fn region_color(
        &self,
        image: &RgbImage,
        roi: (f64, f64, f64, f64),
    ) -> Option<ColorMeasurement> {
        let rect = fractional_rect(image.width(), image.height(), roi.0, roi.1, roi.2, roi.3)?;
        let region = crop_rgb(image, rect);
        let rgb = kmeans_dominant_color(&region, COLOR_CLUSTERS, COLOR_KMEANS_ITERATIONS)?;
        Some(ColorMeasurement {
            rgb,
            name: color_name(rgb).to_string(),
        })
    }

    fn skin_tone(&self, image: &RgbImage) -> Option<SkinToneMeasurement> {
        let rect = fractional_rect(
            image.width(),
            image.height(),
            CHEEK_ROI.0,
            CHEEK_ROI.1,
            CHEEK_ROI.2,
            CHEEK_ROI.3,
        )?;
        let region = crop_rgb(image, rect);
        let rgb = kmeans_dominant_color(&region, COLOR_CLUSTERS, COLOR_KMEANS_ITERATIONS)?;
        Some(SkinToneMeasurement {
            name: color_name(rgb).to_string(),
            rgb,
            hue: rgb_to_hue(rgb),
        })
    }

    /// Dark-blob eye detection over the upper-face band.
    fn eye_distance(&self, gray: &GrayImage) -> Option<EyeDistanceMeasurement> {
        let p = &self.eye_detector;
        let rect = fractional_rect(gray.width(), gray.height(), 0.0, 1.0, p.band_top, p.band_bottom)?;
        let band = crop_gray(gray, rect);
        let band_area = (band.width() * band.height()) as usize;

        let values: Vec<f32> = band.as_raw().iter().map(|&v| v as f32).collect();
        let threshold = percentile(&values, p.darkness_percentile);
        // Strict comparison: a uniform band produces no candidates.
        let mask: Vec<bool> = values.iter().map(|&v| v < threshold).collect();

        let min_area = ((band_area as f64 * p.min_area_fraction) as usize).max(1);
        let max_area = (band_area as f64 * p.max_area_fraction) as usize;

        let mut eyes: Vec<(f64, f64)> = connected_components(&mask, band.width(), band.height())
            .into_iter()
            .filter(|c| c.area >= min_area && c.area <= max_area)
            .filter(|c| {
                let aspect = c.width() as f64 / c.height() as f64;
                aspect <= p.max_aspect && aspect >= 1.0 / p.max_aspect
            })
            .map(|c| {
                let (cx, cy) = c.centroid();
                (cx + rect.x as f64, cy + rect.y as f64)
            })
            .collect();
        eyes.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        if eyes.len() >= 2 {
            // Two leftmost candidates.
            let (x1, y1) = eyes[0];
            let (x2, y2) = eyes[1];
            let distance = ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt();
            Some(EyeDistanceMeasurement {
                pixel_distance: Some(distance),
                normalized_distance: Some(distance / gray.width() as f64),
                eyes_detected: eyes.len(),
            })
        } else {
            Some(EyeDistanceMeasurement {
                pixel_distance: None,
                normalized_distance: None,
                eyes_detected: eyes.len(),
            })
        }
    }

    fn nose_width(&self, gray: &GrayImage) -> Option<NoseWidthMeasurement> {
        let rect = fractional_rect(
            gray.width(),
            gray.height(),
            NOSE_ROI.0,
            NOSE_ROI.1,
            NOSE_ROI.2,
            NOSE_ROI.3,
        )?;
        let roi = crop_gray(gray, rect);
        let gradients = sobel_x_abs(&roi);
        if gradients.is_empty() {
            return None;
        }
        let threshold = percentile(&gradients, NOSE_GRADIENT_PERCENTILE);
        let above = gradients.iter().filter(|&&g| g > threshold).count();
        Some(NoseWidthMeasurement {
            width_estimate: above as f64 / gradients.len() as f64,
            relative_width: rect.w as f64 / gray.width() as f64,
        })
    }

    fn mouth_width(&self, gray: &GrayImage) -> Option<MouthMeasurement> {
        let rect = fractional_rect(
            gray.width(),
            gray.height(),
            MOUTH_ROI.0,
            MOUTH_ROI.1,
            MOUTH_ROI.2,
            MOUTH_ROI.3,
        )?;
        let roi = crop_gray(gray, rect);
        let mask = edge_mask(&roi, MOUTH_EDGE_THRESHOLD);
        let largest = connected_components(&mask, roi.width(), roi.height())
            .into_iter()
            .max_by_key(|c| c.area);

        Some(match largest {
            Some(c) => MouthMeasurement {
                width_px: Some(c.width()),
                height_px: Some(c.height()),
                aspect_ratio: Some(c.width() as f64 / c.height() as f64),
            },
            None => MouthMeasurement {
                width_px: None,
                height_px: None,
                aspect_ratio: None,
            },
        })
    }

    fn eyebrow_shape(&self, gray: &GrayImage) -> Option<EyebrowMeasurement> {
        let rect = fractional_rect(
            gray.width(),
            gray.height(),
            BROW_ROI.0,
            BROW_ROI.1,
            BROW_ROI.2,
            BROW_ROI.3,
        )?;
        let roi = crop_gray(gray, rect);
        let mask = edge_mask(&roi, BROW_EDGE_THRESHOLD);
        let components = connected_components(&mask, roi.width(), roi.height());

        if components.is_empty() {
            return Some(EyebrowMeasurement {
                average_angle: None,
                shape: BrowShapeClass::Unknown,
                contours: 0,
            });
        }
        let average = components
            .iter()
            .map(|c| c.orientation_degrees())
            .sum::<f64>()
            / components.len() as f64;
        Some(EyebrowMeasurement {
            average_angle: Some(average),
            shape: BrowShapeClass::from_angle(average),
            contours: components.len(),
        })
    }

    fn skin_texture(&self, gray: &GrayImage) -> Option<SkinTextureMeasurement> {
        let blurred = image::imageops::blur(gray, BLEMISH_BLUR_SIGMA);
        let mask: Vec<bool> = blurred
            .as_raw()
            .iter()
            .map(|&v| v < BLEMISH_DARK_THRESHOLD)
            .collect();
        let blemish_count = connected_components(&mask, gray.width(), gray.height())
            .into_iter()
            .filter(|c| c.area > BLEMISH_MIN_AREA && c.area < BLEMISH_MAX_AREA)
            .count();

        let (mean, stddev) = mean_stddev(gray);
        let roughness = if mean > 0.0 { stddev / mean } else { 0.0 };
        Some(SkinTextureMeasurement {
            blemish_count,
            roughness,
        })
    }

    /// Mean absolute difference between the left half and the mirrored
    /// right half, normalized to [0, 1].
    fn facial_asymmetry(&self, gray: &GrayImage) -> Option<AsymmetryMeasurement> {
        let width = gray.width();
        let height = gray.height();
        let mid = width / 2;
        if mid == 0 {
            return None;
        }
        let left = crop_gray(gray, imageops::Rect { x: 0, y: 0, w: mid, h: height });
        let right = crop_gray(
            gray,
            imageops::Rect { x: mid, y: 0, w: width - mid, h: height },
        );
        let mirrored = image::imageops::flip_horizontal(&right);

        let common = left.width().min(mirrored.width());
        if common == 0 {
            return None;
        }
        let mut total = 0.0f64;
        for y in 0..height {
            for x in 0..common {
                let a = left.get_pixel(x, y)[0] as f64;
                let b = mirrored.get_pixel(x, y)[0] as f64;
                total += (a - b).abs();
            }
        }
        let score = total / (common as f64 * height as f64) / 255.0;
        Some(AsymmetryMeasurement {
            score,
            level: AsymmetryLevel::from_score(score),
        })
    }

    /// Wrinkle proxy: ratio of high-frequency to low-frequency energy in
    /// the magnitude spectrum of a downscaled grayscale tile.
    fn age_estimate(&self, gray: &GrayImage) -> Option<AgeMeasurement> {
        let tile = image::imageops::resize(gray, AGE_TILE_SIZE, AGE_TILE_SIZE, FilterType::Triangle);
        let magnitudes = dft_magnitude(&tile);
        if magnitudes.is_empty() {
            return None;
        }
        let high_cut = percentile(&magnitudes, AGE_HIGH_PERCENTILE);
        let low_cut = percentile(&magnitudes, AGE_LOW_PERCENTILE);

        let (mut high_sum, mut high_n) = (0.0f64, 0usize);
        let (mut low_sum, mut low_n) = (0.0f64, 0usize);
        for &m in &magnitudes {
            if m > high_cut {
                high_sum += m as f64;
                high_n += 1;
            }
            if m < low_cut {
                low_sum += m as f64;
                low_n += 1;
            }
        }
        let high_energy = if high_n > 0 { high_sum / high_n as f64 } else { 0.0 };
        let low_energy = if low_n > 0 { low_sum / low_n as f64 } else { 0.0 };

        let wrinkle_score = high_energy / (low_energy + 1e-6);
        Some(AgeMeasurement {
            wrinkle_score,
            bracket: AgeBracket::from_wrinkle_score(wrinkle_score),
            confidence: Confidence::Low,
        })
    }
}

/// Map an RGB triple to a coarse color-name bucket with fixed thresholds.
fn color_name(rgb: [u8; 3]) -> &'static str {
    let (r, g, b) = (rgb[0] as i32, rgb[1] as i32, rgb[2] as i32);
    if r > 150 && g > 100 && b > 100 {
        if r.max(g).max(b) > 200 {
            "light"
        } else {
            "medium"
        }
    } else if r > g && r > b {
        if r < 150 {
            "brown/dark"
        } else {
            "reddish"
        }
    } else if g > r && g > b {
        "greenish"
    } else if b > r && b > g {
        "bluish"
    } else if (r - g).abs() < 30 && (g - b).abs() < 30 {
        if r < 128 {
            "gray"
        } else {
            "light_gray"
        }
    } else {
        "mixed"
    }
}
