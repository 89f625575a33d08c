//! Classical image-processing primitives used by the feature extractor.
//!
//! Only deterministic, non-learned operations live here: fractional ROI
//! cropping, Sobel gradients, connected components with image moments,
//! k-means color quantization and a naive 2-D DFT. Decoding and the basic
//! resize/blur/flip operations come from the `image` crate.

use image::{GrayImage, RgbImage};

/// Pixel-space rectangle, produced from fractional coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Map fractional bounds (0.0..=1.0 of each axis) to a pixel rectangle.
///
/// Returns `None` when the resulting region would be empty, which is the
/// per-feature "absent" signal for degenerate inputs.
pub fn fractional_rect(
    width: u32,
    height: u32,
    fx0: f64,
    fx1: f64,
    fy0: f64,
    fy1: f64,
) -> Option<Rect> {
    let x0 = (width as f64 * fx0) as u32;
    let x1 = ((width as f64 * fx1) as u32).min(width);
    let y0 = (height as f64 * fy0) as u32;
    let y1 = ((height as f64 * fy1) as u32).min(height);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(Rect {
        x: x0,
        y: y0,
        w: x1 - x0,
        h: y1 - y0,
    })
}

pub fn crop_rgb(img: &RgbImage, rect: Rect) -> RgbImage {
    image::imageops::crop_imm(img, rect.x, rect.y, rect.w, rect.h).to_image()
}

pub fn crop_gray(img: &GrayImage, rect: Rect) -> GrayImage {
    image::imageops::crop_imm(img, rect.x, rect.y, rect.w, rect.h).to_image()
}

/// Mean and standard deviation of grayscale intensity.
pub fn mean_stddev(img: &GrayImage) -> (f64, f64) {
    let n = img.as_raw().len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = img.as_raw().iter().map(|&p| p as f64).sum::<f64>() / n as f64;
    let var = img
        .as_raw()
        .iter()
        .map(|&p| {
            let d = p as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n as f64;
    (mean, var.sqrt())
}

/// The p-th percentile (0..=100) of `values`, by sorting a copy.
pub fn percentile(values: &[f32], p: f64) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f32> = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = (p / 100.0 * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

/// Absolute horizontal Sobel response (3x3), row-major, one value per pixel.
///
/// Border pixels are clamped, matching the replicate border of the
/// reference implementation.
pub fn sobel_x_abs(img: &GrayImage) -> Vec<f32> {
    sobel(img, true)
}

/// Gradient magnitude sqrt(gx^2 + gy^2), row-major.
pub fn gradient_magnitude(img: &GrayImage) -> Vec<f32> {
    let gx = sobel(img, true);
    let gy = sobel(img, false);
    gx.iter()
        .zip(gy.iter())
        .map(|(&x, &y)| (x * x + y * y).sqrt())
        .collect()
}

fn sobel(img: &GrayImage, horizontal: bool) -> Vec<f32> {
    let (w, h) = (img.width() as i64, img.height() as i64);
    let mut out = vec![0.0f32; (w * h) as usize];
    if w == 0 || h == 0 {
        return out;
    }
    // 3x3 Sobel kernels; `horizontal` selects d/dx (vertical edges).
    let kx: [[f32; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
    let ky: [[f32; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];
    let kernel = if horizontal { &kx } else { &ky };

    let sample = |x: i64, y: i64| -> f32 {
        let cx = x.clamp(0, w - 1) as u32;
        let cy = y.clamp(0, h - 1) as u32;
        img.get_pixel(cx, cy)[0] as f32
    };

    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for (ky_i, row) in kernel.iter().enumerate() {
                for (kx_i, &k) in row.iter().enumerate() {
                    acc += k * sample(x + kx_i as i64 - 1, y + ky_i as i64 - 1);
                }
            }
            out[(y * w + x) as usize] = acc.abs();
        }
    }
    out
}

/// Threshold a gradient-magnitude map into a binary edge mask.
pub fn edge_mask(img: &GrayImage, threshold: f32) -> Vec<bool> {
    gradient_magnitude(img)
        .into_iter()
        .map(|g| g > threshold)
        .collect()
}

/// One 8-connected region of a binary mask, with raw image moments
/// accumulated during labeling.
#[derive(Debug, Clone)]
pub struct Component {
    pub area: usize,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    sum_x: f64,
    sum_y: f64,
    sum_xx: f64,
    sum_yy: f64,
    sum_xy: f64,
}

impl Component {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    pub fn centroid(&self) -> (f64, f64) {
        let n = self.area as f64;
        (self.sum_x / n, self.sum_y / n)
    }

    /// Orientation of the region from its second-order central moments:
    /// `0.5 * atan2(2*mu11, mu20 - mu02)`, in degrees.
    pub fn orientation_degrees(&self) -> f64 {
        let n = self.area as f64;
        let (cx, cy) = self.centroid();
        let mu20 = self.sum_xx / n - cx * cx;
        let mu02 = self.sum_yy / n - cy * cy;
        let mu11 = self.sum_xy / n - cx * cy;
        (0.5 * (2.0 * mu11).atan2(mu20 - mu02)).to_degrees()
    }
}

/// Label the 8-connected regions of a row-major binary mask.
///
/// Uses an explicit stack instead of recursion so pathological masks
/// cannot overflow the call stack.
pub fn connected_components(mask: &[bool], width: u32, height: u32) -> Vec<Component> {
    let w = width as usize;
    let h = height as usize;
    debug_assert_eq!(mask.len(), w * h);

    let mut visited = vec![false; mask.len()];
    let mut components = Vec::new();
    let mut stack: Vec<usize> = Vec::new();

    for start in 0..mask.len() {
        if !mask[start] || visited[start] {
            continue;
        }
        let mut comp = Component {
            area: 0,
            min_x: u32::MAX,
            min_y: u32::MAX,
            max_x: 0,
            max_y: 0,
            sum_x: 0.0,
            sum_y: 0.0,
            sum_xx: 0.0,
            sum_yy: 0.0,
            sum_xy: 0.0,
        };
        visited[start] = true;
        stack.push(start);

        while let Some(idx) = stack.pop() {
            let x = idx % w;
            let y = idx / w;
            comp.area += 1;
            comp.min_x = comp.min_x.min(x as u32);
            comp.max_x = comp.max_x.max(x as u32);
            comp.min_y = comp.min_y.min(y as u32);
            comp.max_y = comp.max_y.max(y as u32);
            let (fx, fy) = (x as f64, y as f64);
            comp.sum_x += fx;
            comp.sum_y += fy;
            comp.sum_xx += fx * fx;
            comp.sum_yy += fy * fy;
            comp.sum_xy += fx * fy;

            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nx = x as i64 + dx;
                    let ny = y as i64 + dy;
                    if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                        continue;
                    }
                    let nidx = ny as usize * w + nx as usize;
                    if mask[nidx] && !visited[nidx] {
                        visited[nidx] = true;
                        stack.push(nidx);
                    }
                }
            }
        }
        components.push(comp);
    }
    components
}

/// Representative color of an RGB region via k-means (Lloyd iterations).
///
/// Initialization is deterministic: initial centers are luminance
/// quantiles of the pixel population, so repeated extraction of the same
/// image yields the same color. The dominant cluster is the one with the
/// largest member count.
pub fn kmeans_dominant_color(img: &RgbImage, k: usize, iterations: usize) -> Option<[u8; 3]> {
    let pixels: Vec<[f32; 3]> = img
        .pixels()
        .map(|p| [p[0] as f32, p[1] as f32, p[2] as f32])
        .collect();
    if pixels.is_empty() || k == 0 {
        return None;
    }

    // Luminance-sorted quantile seeding.
    let luma = |p: &[f32; 3]| 0.299 * p[0] + 0.587 * p[1] + 0.114 * p[2];
    let mut order: Vec<usize> = (0..pixels.len()).collect();
    order.sort_by(|&a, &b| {
        luma(&pixels[a])
            .partial_cmp(&luma(&pixels[b]))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut centers: Vec<[f32; 3]> = (0..k)
        .map(|i| pixels[order[(2 * i + 1) * pixels.len() / (2 * k)]])
        .collect();

    let mut assignment = vec![0usize; pixels.len()];
    for _ in 0..iterations {
        // Assign each pixel to its nearest center.
        for (i, p) in pixels.iter().enumerate() {
            let mut best = 0usize;
            let mut best_d = f32::MAX;
            for (c, center) in centers.iter().enumerate() {
                let d = (p[0] - center[0]).powi(2)
                    + (p[1] - center[1]).powi(2)
                    + (p[2] - center[2]).powi(2);
                if d < best_d {
                    best_d = d;
                    best = c;
                }
            }
            assignment[i] = best;
        }
        // Recompute centers; an emptied cluster keeps its old center.
        let mut sums = vec![[0.0f64; 3]; k];
        let mut counts = vec![0usize; k];
        for (i, p) in pixels.iter().enumerate() {
            let c = assignment[i];
            counts[c] += 1;
            for ch in 0..3 {
                sums[c][ch] += p[ch] as f64;
            }
        }
        for c in 0..k {
            if counts[c] > 0 {
                for ch in 0..3 {
                    centers[c][ch] = (sums[c][ch] / counts[c] as f64) as f32;
                }
            }
        }
    }

    let mut counts = vec![0usize; k];
    for &c in &assignment {
        counts[c] += 1;
    }
    let dominant = counts
        .iter()
        .enumerate()
        .max_by_key(|&(_, &n)| n)
        .map(|(c, _)| c)?;

    let c = centers[dominant];
    Some([
        c[0].round().clamp(0.0, 255.0) as u8,
        c[1].round().clamp(0.0, 255.0) as u8,
        c[2].round().clamp(0.0, 255.0) as u8,
    ])
}

/// Hue angle (0..360 degrees) of an RGB triple. Achromatic input maps to 0.
pub fn rgb_to_hue(rgb: [u8; 3]) -> f64 {
    let r = rgb[0] as f64 / 255.0;
    let g = rgb[1] as f64 / 255.0;
    let b = rgb[2] as f64 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    if delta <= f64::EPSILON {
        return 0.0;
    }
    let hue = if max == r {
        ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };
    hue * 60.0
}

/// Magnitude spectrum of the 2-D DFT of a grayscale tile, row-major.
///
/// Naive separable transform; callers downscale to a small tile first so
/// the O(n^3) cost stays negligible.
pub fn dft_magnitude(img: &GrayImage) -> Vec<f32> {
    let w = img.width() as usize;
    let h = img.height() as usize;
    if w == 0 || h == 0 {
        return Vec::new();
    }

    // Row pass.
    let mut row_re = vec![0.0f64; w * h];
    let mut row_im = vec![0.0f64; w * h];
    for y in 0..h {
        for u in 0..w {
            let (mut sr, mut si) = (0.0f64, 0.0f64);
            for x in 0..w {
                let v = img.get_pixel(x as u32, y as u32)[0] as f64;
                let angle = -2.0 * std::f64::consts::PI * (u * x) as f64 / w as f64;
                sr += v * angle.cos();
                si += v * angle.sin();
            }
            row_re[y * w + u] = sr;
            row_im[y * w + u] = si;
        }
    }

    // Column pass, collapsing straight to magnitudes.
    let mut mag = vec![0.0f32; w * h];
    for u in 0..w {
        for v in 0..h {
            let (mut sr, mut si) = (0.0f64, 0.0f64);
            for y in 0..h {
                let angle = -2.0 * std::f64::consts::PI * (v * y) as f64 / h as f64;
                let (c, s) = (angle.cos(), angle.sin());
                let re = row_re[y * w + u];
                let im = row_im[y * w + u];
                sr += re * c - im * s;
                si += re * s + im * c;
            }
            mag[v * w + u] = ((sr * sr + si * si).sqrt()) as f32;
        }
    }
    mag
}
