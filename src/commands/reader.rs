use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;

use map_data::RefPoint;

use super::RequestError;
use crate::pipeline::MapReader;

const DEFAULT_DIAMOND_FILE: &str = "diamond_crop.png";
const DEFAULT_POINT_THRESHOLD: f64 = 0.85;

/// Image key plus an optional reference point. Fractional coordinates
/// are accepted and truncated toward zero.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PointRequest {
    pub image_url: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoriesRequest {
    pub image_url: Option<String>,
    #[serde(rename = "islandCenters")]
    pub island_centers: Option<Vec<RefPoint>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IconsRequest {
    pub image_url: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiamondFileRequest {
    pub image_url: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub output_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IconPointRequest {
    pub image_url: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub threshold: Option<f64>,
}

fn require_key(image_url: &Option<String>) -> Result<&str, RequestError> {
    image_url
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| RequestError::malformed("Missing image_url"))
}

fn require_point(x: Option<f64>, y: Option<f64>) -> Result<(f64, f64), RequestError> {
    match (x, y) {
        (Some(x), Some(y)) => Ok((x.trunc(), y.trunc())),
        _ => Err(RequestError::malformed("Missing x or y")),
    }
}

fn require_categories(reader: &MapReader, categories: &[String]) -> Result<(), RequestError> {
    let expected = reader.geometry().icon_points.len();
    if categories.is_empty() || categories.len() != expected {
        return Err(RequestError::malformed(format!(
            "categories must be a {}-item list",
            expected
        )));
    }
    Ok(())
}

/// Fetch up front so a missing source is reported as such
fn prefetch(reader: &MapReader, key: &str) -> Result<(), RequestError> {
    reader
        .fetch(key)
        .map(|_| ())
        .map_err(|source| RequestError::Fetch {
            key: key.to_string(),
            source,
        })
}

/// [`prefetch`] without stalling the runtime on the download
async fn prefetch_blocking(reader: &MapReader, key: &str) -> Result<(), RequestError> {
    reader
        .fetch_blocking(key)
        .await
        .map(|_| ())
        .map_err(|source| RequestError::Fetch {
            key: key.to_string(),
            source,
        })
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, RequestError> {
    serde_json::to_value(value).map_err(|e| RequestError::Processing(e.into()))
}

/// Missing coordinates read the top-left pixel.
pub fn extract_color(reader: &MapReader, req: &PointRequest) -> Result<Value, RequestError> {
    let key = require_key(&req.image_url)?;
    prefetch(reader, key)?;
    let hex = reader.extract_color(key, req.x.unwrap_or(0.0).trunc(), req.y.unwrap_or(0.0).trunc())?;
    Ok(serde_json::json!({ "hex": hex }))
}

pub fn check_minion(reader: &MapReader, req: &PointRequest) -> Result<Value, RequestError> {
    let key = require_key(&req.image_url)?;
    prefetch(reader, key)?;
    let minion = reader.check_minion(key, req.x.unwrap_or(0.0).trunc(), req.y.unwrap_or(0.0).trunc())?;
    Ok(serde_json::json!({ "minion": minion }))
}

pub async fn extract_all_categories(
    reader: &MapReader,
    req: &CategoriesRequest,
) -> Result<Value, RequestError> {
    let key = require_key(&req.image_url)?;
    prefetch_blocking(reader, key).await?;
    // An empty list means "use the built-in centers"
    let centers = req.island_centers.clone().filter(|c| !c.is_empty());
    let nodes = reader.extract_all_categories(key, centers).await?;
    Ok(serde_json::json!({ "island_data": to_json(&nodes)? }))
}

pub fn crop_circle(reader: &MapReader, req: &PointRequest) -> Result<Value, RequestError> {
    let key = require_key(&req.image_url)?;
    let (x, y) = require_point(req.x, req.y)?;
    prefetch(reader, key)?;
    to_json(&reader.crop_circle(key, x, y)?)
}

pub fn crop_diamond(reader: &MapReader, req: &PointRequest) -> Result<Value, RequestError> {
    let key = require_key(&req.image_url)?;
    let (x, y) = require_point(req.x, req.y)?;
    prefetch(reader, key)?;
    to_json(&reader.crop_diamond(key, x, y)?)
}

pub fn crop_small_diamond(reader: &MapReader, req: &PointRequest) -> Result<Value, RequestError> {
    let key = require_key(&req.image_url)?;
    let (x, y) = require_point(req.x, req.y)?;
    prefetch(reader, key)?;
    let encoded = reader.crop_small_diamond(key, x, y)?;
    Ok(serde_json::json!({ "image_base64": encoded }))
}

pub fn crop_diamond_to_file(
    reader: &MapReader,
    req: &DiamondFileRequest,
) -> Result<Value, RequestError> {
    let key = require_key(&req.image_url)?;
    let (x, y) = require_point(req.x, req.y)?;
    let path = req
        .output_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DIAMOND_FILE));
    prefetch(reader, key)?;
    let saved = reader.crop_diamond_to_file(key, x, y, &path)?;
    Ok(serde_json::json!({
        "message": format!("Saved diamond crop to {}", saved.display())
    }))
}

pub async fn arrow_check_bulk(reader: &MapReader, req: &PointRequest) -> Result<Value, RequestError> {
    let key = require_key(&req.image_url)?;
    prefetch_blocking(reader, key).await?;
    to_json(&reader.arrow_check_bulk(key).await?)
}

pub async fn crop_all_decision_icons(
    reader: &MapReader,
    req: &IconsRequest,
) -> Result<Value, RequestError> {
    let key = require_key(&req.image_url)?;
    require_categories(reader, &req.categories)?;
    prefetch_blocking(reader, key).await?;
    let icons = reader.crop_all_decision_icons(key, &req.categories).await?;
    Ok(serde_json::json!({ "icons": to_json(&icons)? }))
}

pub async fn debug_decision_icon_labels(
    reader: &MapReader,
    req: &IconsRequest,
) -> Result<Value, RequestError> {
    let key = require_key(&req.image_url)?;
    require_categories(reader, &req.categories)?;
    prefetch_blocking(reader, key).await?;
    to_json(&reader.debug_decision_icon_labels(key, &req.categories).await?)
}

pub fn debug_icon_at_point(
    reader: &MapReader,
    req: &IconPointRequest,
) -> Result<Value, RequestError> {
    let key = require_key(&req.image_url)?;
    let (x, y) = require_point(req.x, req.y)?;
    let threshold = req.threshold.unwrap_or(DEFAULT_POINT_THRESHOLD);
    prefetch(reader, key)?;
    to_json(&reader.debug_icon_at_point(key, x as i64, y as i64, threshold)?)
}

pub fn status(reader: &MapReader) -> Result<Value, RequestError> {
    to_json(&reader.status())
}
