use anyhow::{Context, Result};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use map_capture::{
    encode_png_base64, extract_region, pixel_at, CacheStatus, FileFetcher, Footprint, ImageLoader,
    ImageScale, TieredCache,
};
use map_data::{
    ArrowSegment, CombatProbe, IconPoint, MapGeometry, RefPoint, ARROW_COLORS, DOOR_CATEGORIES,
    DOOR_GLYPH, IMAGE_CATEGORIES, SSIM_CATEGORIES, SYMBOL_CATEGORIES, SYMBOL_GLYPH_LEFT,
    SYMBOL_GLYPH_RIGHT,
};
use map_state::{
    ArrowMark, ArrowReport, CropMatch, IconDebugRow, IconPair, IconReading, IslandNode, PointMatch,
    VOID_TYPE,
};
use map_vision::icon_matcher::ICON_RADIUS;
use map_vision::palette::{hex_of, rgb};
use map_vision::{classify_island, closest_color, is_minion_color, IconMatcher, TemplateLibrary};

use crate::batch::BatchExecutor;
use crate::config::ReaderConfig;

/// Circle crop radius in reference units
const CIRCLE_RADIUS: f64 = 24.0;
/// Small diamond crop radius in reference units
const SMALL_DIAMOND_RADIUS: f64 = 32.0;
/// Cache scale circle crops are stored under
const CIRCLE_CACHE_SCALE: f64 = 48.0;

/// Label for debug rows that were not decision nodes
pub const SKIPPED_LABEL: &str = "(skipped)";
/// Label for debug rows whose matching failed
pub const FAILED_LABEL: &str = "(failed)";

/// Reads node colors, categories, connectors and icons off run-map images.
pub struct MapReader {
    config: ReaderConfig,
    loader: ImageLoader,
    matcher: IconMatcher,
    geometry: Arc<MapGeometry>,
    executor: BatchExecutor,
}

impl MapReader {
    pub fn new(
        config: ReaderConfig,
        loader: ImageLoader,
        library: Arc<TemplateLibrary>,
        geometry: MapGeometry,
    ) -> Self {
        let matcher = IconMatcher::new(library, config.contrast_factor);
        let executor = BatchExecutor::new(config.concurrency);
        Self {
            config,
            loader,
            matcher,
            geometry: Arc::new(geometry),
            executor,
        }
    }

    /// Wire up file-backed sources, the tiered cache, templates and geometry
    /// from `config`.
    pub fn from_config(config: ReaderConfig) -> Result<Self> {
        let cache = Arc::new(TieredCache::new(
            config.original_capacity,
            config.scaled_capacity,
        ));
        let loader = ImageLoader::new(Arc::new(FileFetcher::new(&config.data_dir)), cache);
        let library = TemplateLibrary::load(&config.resolved_template_dirs(), config.reduced_edge)
            .context("Failed to load icon templates")?;
        let geometry = MapGeometry::load(&config.data_dir)?;

        info!(
            "Map reader ready: {} templates, {} islands, {} workers",
            library.len(),
            geometry.island_centers.len(),
            config.concurrency
        );
        Ok(Self::new(config, loader, Arc::new(library), geometry))
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn geometry(&self) -> &MapGeometry {
        &self.geometry
    }

    /// Resolve a key to its decoded image, through the cache
    pub fn fetch(&self, key: &str) -> Result<Arc<RgbaImage>> {
        self.loader.load(key)
    }

    /// [`Self::fetch`] on the blocking pool, for async callers
    pub async fn fetch_blocking(&self, key: &str) -> Result<Arc<RgbaImage>> {
        let loader = self.loader.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || loader.load(&key))
            .await
            .context("Image load task failed")?
    }

    fn load(&self, key: &str) -> Result<(Arc<RgbaImage>, ImageScale)> {
        let image = self.loader.load(key)?;
        let scale = ImageScale::of(&image)?;
        Ok((image, scale))
    }

    async fn load_blocking(&self, key: &str) -> Result<(Arc<RgbaImage>, ImageScale)> {
        let image = self.fetch_blocking(key).await?;
        let scale = ImageScale::of(&image)?;
        Ok((image, scale))
    }

    /// Palette hex at a reference point, or the raw hex when nothing is close.
    pub fn extract_color(&self, key: &str, x: f64, y: f64) -> Result<String> {
        let (image, scale) = self.load(key)?;
        let pixel = rgb(pixel_at(&image, scale.point(x, y))?);
        let matched = closest_color(pixel);
        debug!("Color at ({}, {}): {:?} -> {}", x, y, pixel, matched.hex());
        Ok(matched.hex().to_string())
    }

    pub fn check_minion(&self, key: &str, x: f64, y: f64) -> Result<bool> {
        let (image, scale) = self.load(key)?;
        let pixel = rgb(pixel_at(&image, scale.point(x, y))?);
        Ok(is_minion_color(pixel))
    }

    /// Classify every island. `centers` replaces the built-in island centers;
    /// combat probes are always the built-in ones, matched by index.
    pub async fn extract_all_categories(
        &self,
        key: &str,
        centers: Option<Vec<RefPoint>>,
    ) -> Result<Vec<IslandNode>> {
        let (image, scale) = self.load_blocking(key).await?;
        let centers = Arc::new(centers.unwrap_or_else(|| self.geometry.island_centers.clone()));
        let geometry = self.geometry.clone();
        let count = centers.len();

        let nodes = self
            .executor
            .run(
                count,
                move |i| {
                    let probe = geometry.combat_probes.get(i).with_context(|| {
                        format!("No combat probe for island {}", i + 1)
                    })?;
                    read_island(&image, scale, i + 1, centers[i], probe)
                },
                |i| IslandNode::void(i + 1),
            )
            .await;
        Ok(nodes)
    }

    /// Circular crop matched at the circle threshold
    pub fn crop_circle(&self, key: &str, x: f64, y: f64) -> Result<CropMatch> {
        let (image, scale) = self.load(key)?;
        let crop = extract_region(
            &image,
            scale.point(x, y),
            scale.scale(CIRCLE_RADIUS),
            Footprint::Circle,
        )?;
        let result = self.matcher.match_crop(&crop, self.config.circle_threshold)?;
        let base64 = encode_png_base64(&crop)?;
        self.loader
            .cache()
            .store_scaled(key, CIRCLE_CACHE_SCALE, Arc::new(crop));

        Ok(CropMatch {
            label: result.label,
            score: result.score,
            base64,
        })
    }

    /// Icon-sized diamond crop matched at the diamond threshold
    pub fn crop_diamond(&self, key: &str, x: f64, y: f64) -> Result<CropMatch> {
        let (image, scale) = self.load(key)?;
        let crop = diamond(&image, scale, x, y, ICON_RADIUS)?;
        let result = self.matcher.match_crop(&crop, self.config.diamond_threshold)?;
        let base64 = encode_png_base64(&crop)?;
        self.loader
            .cache()
            .store_scaled(key, scale.factor(), Arc::new(crop));

        Ok(CropMatch {
            label: result.label,
            score: result.score,
            base64,
        })
    }

    /// Small diamond crop, returned as base64 PNG without matching
    pub fn crop_small_diamond(&self, key: &str, x: f64, y: f64) -> Result<String> {
        let (image, scale) = self.load(key)?;
        encode_png_base64(&diamond(&image, scale, x, y, SMALL_DIAMOND_RADIUS)?)
    }

    pub fn crop_diamond_to_file(&self, key: &str, x: f64, y: f64, path: &Path) -> Result<PathBuf> {
        let (image, scale) = self.load(key)?;
        diamond(&image, scale, x, y, ICON_RADIUS)?
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Saved diamond crop to {}", path.display());
        Ok(path.to_path_buf())
    }

    /// Check both endpoints of every connector for an arrow color.
    pub async fn arrow_check_bulk(&self, key: &str) -> Result<ArrowReport> {
        let (image, scale) = self.load_blocking(key).await?;
        let ascending_len = self.geometry.arrows_a.len();
        let entries: Arc<Vec<Option<ArrowSegment>>> = Arc::new(
            self.geometry
                .arrows_a
                .iter()
                .chain(self.geometry.arrows_d.iter())
                .copied()
                .collect(),
        );

        let count = entries.len();
        let mut marks = self
            .executor
            .run(
                count,
                move |i| read_arrow(&image, scale, entries[i]),
                |_| [ArrowMark::Void; 2],
            )
            .await;

        let descending = marks.split_off(ascending_len);
        Ok(ArrowReport {
            ascending: marks,
            descending,
        })
    }

    /// Read both icons of every node according to its category.
    pub async fn crop_all_decision_icons(
        &self,
        key: &str,
        categories: &[String],
    ) -> Result<Vec<IconPair>> {
        let (image, scale) = self.load_blocking(key).await?;
        let categories = normalize(categories);
        let geometry = self.geometry.clone();
        let matcher = self.matcher.clone();
        let threshold = self.config.shift_threshold;

        let pairs = self
            .executor
            .run(
                categories.len(),
                move |i| {
                    let point = icon_point(&geometry, i)?;
                    read_icon_pair(&image, scale, &matcher, threshold, i + 1, &categories[i], point)
                },
                |i| IconPair::empty(i + 1),
            )
            .await;
        Ok(pairs)
    }

    /// Labels and scores for decision nodes; every other node is skipped.
    pub async fn debug_decision_icon_labels(
        &self,
        key: &str,
        categories: &[String],
    ) -> Result<Vec<IconDebugRow>> {
        let (image, _) = self.load_blocking(key).await?;
        let categories = normalize(categories);
        let geometry = self.geometry.clone();
        let matcher = self.matcher.clone();
        let threshold = self.config.shift_threshold;
        let sentinel_categories = categories.clone();

        let rows = self
            .executor
            .run(
                categories.len(),
                move |i| {
                    let category = &categories[i];
                    if !SSIM_CATEGORIES.contains(&category.as_str()) {
                        return Ok(IconDebugRow {
                            index: i + 1,
                            category: category.clone(),
                            left_label: SKIPPED_LABEL.to_string(),
                            right_label: SKIPPED_LABEL.to_string(),
                            left_score: None,
                            right_score: None,
                        });
                    }

                    let point = icon_point(&geometry, i)?;
                    let left = matcher.best_shifted_match(&image, point.left_x, point.left_y, threshold)?;
                    let right =
                        matcher.best_shifted_match(&image, point.right_x, point.right_y, threshold)?;
                    Ok(IconDebugRow {
                        index: i + 1,
                        category: category.clone(),
                        left_label: left.result.label,
                        right_label: right.result.label,
                        left_score: Some(left.result.score),
                        right_score: Some(right.result.score),
                    })
                },
                |i| IconDebugRow {
                    index: i + 1,
                    category: sentinel_categories[i].clone(),
                    left_label: FAILED_LABEL.to_string(),
                    right_label: FAILED_LABEL.to_string(),
                    left_score: None,
                    right_score: None,
                },
            )
            .await;
        Ok(rows)
    }

    /// Best shifted match around one reference point
    pub fn debug_icon_at_point(
        &self,
        key: &str,
        x: i64,
        y: i64,
        threshold: f64,
    ) -> Result<PointMatch> {
        let (image, _) = self.load(key)?;
        let best = self
            .matcher
            .best_shifted_match(&image, x as f64, y as f64, threshold)?;
        Ok(PointMatch {
            image_url: key.to_string(),
            x,
            y,
            best_label: best.result.label,
            best_score: best.result.score,
            offset: best.offset,
            base64: encode_png_base64(&best.crop)?,
        })
    }

    pub fn status(&self) -> CacheStatus {
        self.loader.cache().status()
    }
}

fn diamond(image: &RgbaImage, scale: ImageScale, x: f64, y: f64, radius: f64) -> Result<RgbaImage> {
    extract_region(
        image,
        scale.point(x, y),
        scale.scale(radius),
        Footprint::Diamond,
    )
}

fn normalize(categories: &[String]) -> Arc<Vec<String>> {
    Arc::new(categories.iter().map(|c| c.trim().to_lowercase()).collect())
}

fn icon_point(geometry: &MapGeometry, index: usize) -> Result<IconPoint> {
    geometry
        .icon_points
        .get(index)
        .copied()
        .with_context(|| format!("No icon point for node {}", index + 1))
}

/// Sample the island center and both combat probes, then classify.
fn read_island(
    image: &RgbaImage,
    scale: ImageScale,
    index: usize,
    center: RefPoint,
    probe: &CombatProbe,
) -> Result<IslandNode> {
    let pixel = rgb(pixel_at(image, scale.point(center.x, center.y))?);
    let matched = closest_color(pixel);
    let island_type = matched.label().unwrap_or(VOID_TYPE).to_string();

    let boss_hex = hex_of(rgb(pixel_at(image, scale.point(probe.boss_x, probe.boss_y))?));
    let minion_hex = hex_of(rgb(pixel_at(
        image,
        scale.point(probe.minion_x, probe.minion_y),
    )?));

    let category = classify_island(&island_type, &boss_hex, &minion_hex);
    debug!(
        "Island {} RGB {:?}, closest {}, type {}, category {}",
        index,
        pixel.0,
        matched.hex(),
        island_type,
        category
    );

    Ok(IslandNode {
        index,
        island_type,
        category,
    })
}

fn read_arrow(
    image: &RgbaImage,
    scale: ImageScale,
    entry: Option<ArrowSegment>,
) -> Result<[ArrowMark; 2]> {
    let Some([[x1, y1], [x2, y2]]) = entry else {
        return Ok([ArrowMark::Skip; 2]);
    };
    let mark = |x: f64, y: f64| -> Result<ArrowMark> {
        let hex = hex_of(rgb(pixel_at(image, scale.point(x, y))?));
        Ok(if ARROW_COLORS.contains(&hex.as_str()) {
            ArrowMark::Arrow
        } else {
            ArrowMark::No
        })
    };
    Ok([mark(x1, y1)?, mark(x2, y2)?])
}

fn read_icon_pair(
    image: &RgbaImage,
    scale: ImageScale,
    matcher: &IconMatcher,
    threshold: f64,
    index: usize,
    category: &str,
    point: IconPoint,
) -> Result<IconPair> {
    let mut pair = IconPair::empty(index);

    if SSIM_CATEGORIES.contains(&category) {
        let left = matcher.best_shifted_match(image, point.left_x, point.left_y, threshold)?;
        let right = matcher.best_shifted_match(image, point.right_x, point.right_y, threshold)?;
        pair.left.label = left.result.label;
        pair.left.base64 = encode_png_base64(&left.crop)?;
        pair.right.label = right.result.label;
        pair.right.base64 = encode_png_base64(&right.crop)?;
    } else if IMAGE_CATEGORIES.contains(&category) {
        let left = diamond(image, scale, point.left_x, point.left_y, ICON_RADIUS)?;
        let right = diamond(image, scale, point.right_x, point.right_y, ICON_RADIUS)?;
        pair.left = IconReading {
            label: category.to_string(),
            base64: encode_png_base64(&left)?,
            ..pair.left
        };
        pair.right = IconReading {
            label: category.to_string(),
            base64: encode_png_base64(&right)?,
            ..pair.right
        };
    } else if DOOR_CATEGORIES.contains(&category) {
        pair.left.label = DOOR_GLYPH.to_string();
        pair.right.label = DOOR_GLYPH.to_string();
    } else if SYMBOL_CATEGORIES.contains(&category) {
        pair.left.label = SYMBOL_GLYPH_LEFT.to_string();
        pair.right.label = SYMBOL_GLYPH_RIGHT.to_string();
    }

    Ok(pair)
}
