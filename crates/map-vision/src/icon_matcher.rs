use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::{GrayImage, Luma, RgbaImage};
use map_capture::{extract_region, Footprint, ImageScale};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::ssim::structural_similarity;

/// Edge length both templates and probes are resized to before scoring
pub const REDUCED_EDGE: u32 = 118;

/// Contrast boost applied to probe crops
pub const CONTRAST_FACTOR: f32 = 1.5;

/// Minimum score for circular crops
pub const CIRCLE_THRESHOLD: f64 = 0.85;

/// Minimum score for diamond crops
pub const DIAMOND_THRESHOLD: f64 = 0.89;

/// Label returned when no template reaches the threshold
pub const OTHER_LABEL: &str = "other";

/// Diamond radius of a decision icon, in reference-frame units
pub const ICON_RADIUS: f64 = 100.0;

/// Pixel offsets tried on each axis by the shifted search, in scan order
pub const SHIFT_OFFSETS: [i32; 5] = [-2, -1, 0, 1, 2];

const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// Result of matching a probe against the template library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub label: String,
    pub score: f64,
}

/// Best match found by the shifted search, with the crop that produced it
#[derive(Debug, Clone)]
pub struct ShiftedMatch {
    pub result: MatchResult,
    pub offset: (i32, i32),
    pub crop: RgbaImage,
}

/// Reference icon kept at full and reduced resolution
pub struct TemplateEntry {
    pub name: String,
    pub full: GrayImage,
    pub reduced: GrayImage,
}

/// Labeled reference icons, keyed and iterated in lexicographic name order.
pub struct TemplateLibrary {
    templates: BTreeMap<String, TemplateEntry>,
    reduced_edge: u32,
}

impl TemplateLibrary {
    /// Load every `*.png` under each directory, in order.
    /// A name found in a later directory replaces the earlier template.
    pub fn load(dirs: &[PathBuf], reduced_edge: u32) -> Result<Self> {
        let mut library = Self::empty(reduced_edge);

        for dir in dirs {
            if !dir.is_dir() {
                warn!("Template directory {} not found", dir.display());
                continue;
            }

            let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
                .with_context(|| format!("Failed to list {}", dir.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| {
                    p.extension()
                        .map_or(false, |ext| ext.eq_ignore_ascii_case("png"))
                })
                .collect();
            paths.sort();

            for path in paths {
                match load_template(&path) {
                    Ok((name, gray)) => {
                        debug!("Loaded template {} from {}", name, path.display());
                        library.insert(name, gray);
                    }
                    Err(e) => warn!("Failed to load template {}: {}", path.display(), e),
                }
            }
        }

        info!(
            "TemplateLibrary loaded {} templates from {} dir(s)",
            library.len(),
            dirs.len()
        );
        Ok(library)
    }

    /// Build a library from in-memory full-resolution grayscale icons
    pub fn from_images(
        images: impl IntoIterator<Item = (String, GrayImage)>,
        reduced_edge: u32,
    ) -> Self {
        let mut library = Self::empty(reduced_edge);
        for (name, gray) in images {
            library.insert(name, gray);
        }
        library
    }

    pub fn empty(reduced_edge: u32) -> Self {
        Self {
            templates: BTreeMap::new(),
            reduced_edge,
        }
    }

    fn insert(&mut self, name: String, full: GrayImage) {
        let reduced = image::imageops::resize(
            &full,
            self.reduced_edge,
            self.reduced_edge,
            RESIZE_FILTER,
        );
        self.templates.insert(
            name.clone(),
            TemplateEntry {
                name,
                full,
                reduced,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&TemplateEntry> {
        self.templates.get(name)
    }

    /// Templates in lexicographic name order
    pub fn iter(&self) -> impl Iterator<Item = &TemplateEntry> {
        self.templates.values()
    }

    pub fn names(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn reduced_edge(&self) -> u32 {
        self.reduced_edge
    }
}

/// Decode one icon file; the name is the file stem
fn load_template(path: &Path) -> Result<(String, GrayImage)> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.split('.').next())
        .filter(|s| !s.is_empty())
        .with_context(|| format!("No usable name in {}", path.display()))?
        .to_string();
    let img = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok((name, luma_601(&img.to_rgba8())))
}

/// Grayscale with ITU-R 601 weights, alpha dropped
pub fn luma_601(image: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let p = image.get_pixel(x, y);
        let l = (p[0] as u32 * 19595 + p[1] as u32 * 38470 + p[2] as u32 * 7471 + 0x8000) >> 16;
        Luma([l as u8])
    })
}

/// Stretch pixel values away from the rounded image mean by `factor`.
pub fn enhance_contrast(image: &GrayImage, factor: f32) -> GrayImage {
    let n = (image.width() as u64 * image.height() as u64).max(1);
    let sum: u64 = image.pixels().map(|p| p[0] as u64).sum();
    let mean = (sum as f64 / n as f64 + 0.5) as i32;

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let v = image.get_pixel(x, y)[0] as i32;
        let out = mean as f32 + factor * (v - mean) as f32;
        Luma([out.clamp(0.0, 255.0) as u8])
    })
}

/// Matches crops against a shared template library
#[derive(Clone)]
pub struct IconMatcher {
    library: Arc<TemplateLibrary>,
    contrast_factor: f32,
}

impl IconMatcher {
    pub fn new(library: Arc<TemplateLibrary>, contrast_factor: f32) -> Self {
        Self {
            library,
            contrast_factor,
        }
    }

    pub fn library(&self) -> &TemplateLibrary {
        &self.library
    }

    /// Grayscale, boost contrast, resize to the reduced template edge
    pub fn preprocess(&self, crop: &RgbaImage) -> GrayImage {
        let boosted = enhance_contrast(&luma_601(crop), self.contrast_factor);
        let edge = self.library.reduced_edge();
        image::imageops::resize(&boosted, edge, edge, RESIZE_FILTER)
    }

    /// Score a preprocessed probe against every template.
    ///
    /// Templates are visited in lexicographic order and only a strictly
    /// greater score replaces the current best, so the first name wins ties.
    /// The label is [`OTHER_LABEL`] unless the best score reaches `threshold`.
    pub fn find_best_match(&self, probe: &GrayImage, threshold: f64) -> Result<MatchResult> {
        let mut best_score = -1.0f64;
        let mut best_name = OTHER_LABEL;

        for tmpl in self.library.iter() {
            let score = structural_similarity(probe, &tmpl.reduced)
                .with_context(|| format!("Failed to score against {}", tmpl.name))?;
            if score > best_score {
                best_score = score;
                best_name = tmpl.name.as_str();
            }
        }

        let label = if best_score >= threshold {
            best_name
        } else {
            OTHER_LABEL
        };
        Ok(MatchResult {
            label: label.to_string(),
            score: best_score,
        })
    }

    /// Preprocess a raw crop and match it
    pub fn match_crop(&self, crop: &RgbaImage, threshold: f64) -> Result<MatchResult> {
        self.find_best_match(&self.preprocess(crop), threshold)
    }

    /// Match the diamond icon at reference point (x, y), trying every pixel
    /// offset in `SHIFT_OFFSETS` x `SHIFT_OFFSETS` around the scaled center.
    ///
    /// Offsets are applied in image pixels and scanned `dx` outer, `dy` inner,
    /// both ascending; a later offset must score strictly higher to win. The
    /// winning crop is returned even when its label is [`OTHER_LABEL`].
    pub fn best_shifted_match(
        &self,
        image: &RgbaImage,
        x: f64,
        y: f64,
        threshold: f64,
    ) -> Result<ShiftedMatch> {
        let scale = ImageScale::of(image)?;
        let (cx, cy) = scale.point(x, y);
        let radius = scale.scale(ICON_RADIUS);

        let mut best: Option<ShiftedMatch> = None;
        for dx in SHIFT_OFFSETS {
            for dy in SHIFT_OFFSETS {
                let crop = extract_region(image, (cx + dx, cy + dy), radius, Footprint::Diamond)?;
                let result = self.match_crop(&crop, threshold)?;
                if best.as_ref().map_or(true, |b| result.score > b.result.score) {
                    best = Some(ShiftedMatch {
                        result,
                        offset: (dx, dy),
                        crop,
                    });
                }
            }
        }

        let best = best.context("Shift grid is empty")?;
        debug!(
            "Shifted match at ({}, {}): {} ({:.3}) offset {:?}",
            x, y, best.result.label, best.result.score, best.offset
        );
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn pattern(w: u32, h: u32, seed: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| {
            let v = x.wrapping_mul(seed * 7 + 3) ^ y.wrapping_mul(seed * 11 + 5) ^ (x * y);
            Luma([(v % 256) as u8])
        })
    }

    fn library(names: &[(&str, u32)]) -> Arc<TemplateLibrary> {
        Arc::new(TemplateLibrary::from_images(
            names
                .iter()
                .map(|&(name, seed)| (name.to_string(), pattern(200, 200, seed))),
            REDUCED_EDGE,
        ))
    }

    #[test]
    fn test_template_matches_itself() {
        let lib = library(&[("alpha", 1), ("beta", 2), ("gamma", 3)]);
        let matcher = IconMatcher::new(lib.clone(), CONTRAST_FACTOR);
        for tmpl in lib.iter() {
            let result = matcher.find_best_match(&tmpl.reduced, DIAMOND_THRESHOLD).unwrap();
            assert_eq!(result.label, tmpl.name);
            assert_eq!(result.score, 1.0);
        }
    }

    #[test]
    fn test_ties_go_to_first_name() {
        let same = pattern(150, 150, 4);
        let lib = Arc::new(TemplateLibrary::from_images(
            vec![("zeta".to_string(), same.clone()), ("eta".to_string(), same)],
            REDUCED_EDGE,
        ));
        let matcher = IconMatcher::new(lib.clone(), CONTRAST_FACTOR);
        let probe = lib.get("zeta").unwrap().reduced.clone();
        assert_eq!(matcher.find_best_match(&probe, 0.5).unwrap().label, "eta");
    }

    #[test]
    fn test_below_threshold_is_other() {
        let lib = library(&[("alpha", 1)]);
        let matcher = IconMatcher::new(lib, CONTRAST_FACTOR);
        let probe = GrayImage::from_fn(REDUCED_EDGE, REDUCED_EDGE, |x, _| Luma([(x * 2) as u8]));
        let result = matcher.find_best_match(&probe, CIRCLE_THRESHOLD).unwrap();
        assert_eq!(result.label, OTHER_LABEL);
        assert!(result.score < CIRCLE_THRESHOLD);
    }

    #[test]
    fn test_empty_library() {
        let matcher = IconMatcher::new(Arc::new(TemplateLibrary::empty(REDUCED_EDGE)), 1.5);
        let probe = GrayImage::new(REDUCED_EDGE, REDUCED_EDGE);
        let result = matcher.find_best_match(&probe, 0.0).unwrap();
        assert_eq!(result.label, OTHER_LABEL);
        assert_eq!(result.score, -1.0);
    }

    #[test]
    fn test_contrast_stretches_around_mean() {
        let img = GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 100 } else { 140 }]));
        let out = enhance_contrast(&img, 1.5);
        assert_eq!(out.get_pixel(0, 0)[0], 90);
        assert_eq!(out.get_pixel(1, 0)[0], 150);

        let clipped = enhance_contrast(
            &GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 0 } else { 255 }])),
            1.5,
        );
        assert_eq!(clipped.get_pixel(0, 0)[0], 0);
        assert_eq!(clipped.get_pixel(1, 0)[0], 255);
    }

    #[test]
    fn test_luma_ignores_alpha() {
        let img = RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgba([255, 255, 255, 0])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        let gray = luma_601(&img);
        assert_eq!(gray.get_pixel(0, 0)[0], 255);
        assert_eq!(gray.get_pixel(1, 0)[0], 0);
    }

    /// 1405 wide: scale 0.5, icon radius 50
    fn map_image() -> RgbaImage {
        RgbaImage::from_fn(1405, 400, |x, y| {
            let v = (x.wrapping_mul(13) ^ y.wrapping_mul(29) ^ (x * y / 7)) % 256;
            Rgba([v as u8, (v / 2) as u8, 255 - v as u8, 255])
        })
    }

    #[test]
    fn test_shifted_match_finds_offset() {
        let map = map_image();
        let (cx, cy) = (300, 200);
        let crop = extract_region(&map, (cx + 1, cy - 2), 50, Footprint::Diamond).unwrap();
        let icon = enhance_contrast(&luma_601(&crop), CONTRAST_FACTOR);
        let lib = Arc::new(TemplateLibrary::from_images(
            vec![("chest".to_string(), icon)],
            REDUCED_EDGE,
        ));
        let matcher = IconMatcher::new(lib, CONTRAST_FACTOR);

        let best = matcher
            .best_shifted_match(&map, 600.0, 400.0, DIAMOND_THRESHOLD)
            .unwrap();
        assert_eq!(best.offset, (1, -2));
        assert_eq!(best.result.label, "chest");
        assert_eq!(best.result.score, 1.0);
        assert_eq!(best.crop.dimensions(), (100, 100));
    }

    #[test]
    fn test_shifted_never_below_zero_offset() {
        let map = map_image();
        let lib = library(&[("alpha", 1), ("beta", 2)]);
        let matcher = IconMatcher::new(lib, CONTRAST_FACTOR);

        let best = matcher
            .best_shifted_match(&map, 900.0, 300.0, DIAMOND_THRESHOLD)
            .unwrap();
        let centered = extract_region(&map, (450, 150), 50, Footprint::Diamond).unwrap();
        let direct = matcher.match_crop(&centered, DIAMOND_THRESHOLD).unwrap();
        assert!(best.result.score >= direct.score);
    }

    #[test]
    fn test_load_last_directory_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let white = RgbaImage::from_pixel(20, 20, Rgba([255, 255, 255, 255]));
        let black = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        white.save(first.path().join("bolt.png")).unwrap();
        white.save(first.path().join("anvil.png")).unwrap();
        black.save(second.path().join("bolt.png")).unwrap();
        std::fs::write(second.path().join("notes.txt"), "ignored").unwrap();

        let lib = TemplateLibrary::load(
            &[
                first.path().to_path_buf(),
                second.path().to_path_buf(),
                PathBuf::from("/nonexistent"),
            ],
            REDUCED_EDGE,
        )
        .unwrap();

        assert_eq!(lib.names(), vec!["anvil", "bolt"]);
        let bolt = lib.get("bolt").unwrap();
        assert_eq!(bolt.full.get_pixel(0, 0)[0], 0);
        assert_eq!(bolt.full.dimensions(), (20, 20));
        assert_eq!(bolt.reduced.dimensions(), (REDUCED_EDGE, REDUCED_EDGE));
    }
}
