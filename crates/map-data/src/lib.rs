use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod tables;

/// Width of the logical frame all static geometry is authored in.
pub const REFERENCE_WIDTH: f64 = 2810.0;

/// Node colors in declaration order. Order matters: equal-distance ties go to
/// the earlier entry.
pub const PALETTE: &[(&str, &str)] = &[
    ("#F156FF", "decision"),
    ("#2DB38F", "easy"),
    ("#ECD982", "medium"),
    ("#F07E5F", "hard"),
    ("#9843C6", "portal"),
    ("#CA3B5F", "arrival"),
    ("#D7995B", "bronze door"),
    ("#EAE9E8", "silver door"),
    ("#FFDF33", "gold door"),
    ("#6D6DE5", "shop"),
    ("#697785", "time lock"),
    ("#E58F16", "boss"),
];

/// Boss banner color sampled at the boss probe.
pub const BOSS_HEX: &str = "#E58F16";

/// Dark monster backdrop; never a minion marker.
pub const MONSTER_HEX: &str = "#262B34";

/// Island body colors that show through at the minion probe when no minion is drawn.
pub const CANNOT_BE_MINION: [&str; 3] = ["#2DB38F", "#ECD982", "#F07E5F"];

/// Exact colors a connector endpoint can have.
pub const ARROW_COLORS: [&str; 10] = [
    "#F156FF", "#FFFFFF", "#2DB38F", "#ECD982", "#E5E4E2", "#FFD700", "#CD7F32", "#445566",
    "#F07E5F", "#EAE9E8",
];

pub const DOOR_CATEGORIES: [&str; 5] = ["bronze door", "silver door", "door", "gold door", "time lock"];
pub const SYMBOL_CATEGORIES: [&str; 3] = ["portal", "arrival", "shop"];
pub const SSIM_CATEGORIES: [&str; 1] = ["decision"];
pub const IMAGE_CATEGORIES: [&str; 2] = ["battle", "boss"];

pub const DOOR_GLYPH: &str = "𓉞";
pub const SYMBOL_GLYPH_LEFT: &str = "⋆₊˚⊹";
pub const SYMBOL_GLYPH_RIGHT: &str = "࿔⋆";

/// Point in the reference frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RefPoint {
    #[serde(rename = "bgX")]
    pub x: f64,
    #[serde(rename = "bgY")]
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatProbe {
    pub boss_x: f64,
    pub boss_y: f64,
    pub minion_x: f64,
    pub minion_y: f64,
}

/// Both endpoints of a connector, `[[x1, y1], [x2, y2]]`
pub type ArrowSegment = [[f64; 2]; 2];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconPoint {
    pub left_x: f64,
    pub left_y: f64,
    pub right_x: f64,
    pub right_y: f64,
}

/// Static geometry tables for one map layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapGeometry {
    pub island_centers: Vec<RefPoint>,
    pub combat_probes: Vec<CombatProbe>,
    pub arrows_a: Vec<Option<ArrowSegment>>,
    pub arrows_d: Vec<Option<ArrowSegment>>,
    pub icon_points: Vec<IconPoint>,
}

impl Default for MapGeometry {
    fn default() -> Self {
        Self {
            island_centers: tables::ISLAND_CENTERS
                .iter()
                .map(|&(x, y)| RefPoint { x, y })
                .collect(),
            combat_probes: tables::COMBAT_PROBES
                .iter()
                .map(|&(boss_x, boss_y, minion_x, minion_y)| CombatProbe {
                    boss_x,
                    boss_y,
                    minion_x,
                    minion_y,
                })
                .collect(),
            arrows_a: tables::ARROWS_A.to_vec(),
            arrows_d: tables::ARROWS_D.to_vec(),
            icon_points: tables::ICON_POINTS
                .iter()
                .map(|&(left_x, left_y, right_x, right_y)| IconPoint {
                    left_x,
                    left_y,
                    right_x,
                    right_y,
                })
                .collect(),
        }
    }
}

impl MapGeometry {
    /// Load geometry from the data directory.
    /// Uses data_dir/geometry.json when present; tables missing from the file
    /// keep their built-in values.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let geometry_path = data_dir.join("geometry.json");
        if !geometry_path.exists() {
            tracing::debug!(
                "No geometry.json at {}, using built-in tables",
                geometry_path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&geometry_path)
            .with_context(|| format!("Failed to read {}", geometry_path.display()))?;
        let geometry: MapGeometry =
            serde_json::from_str(&content).context("Failed to parse geometry.json")?;

        tracing::info!(
            "Loaded geometry: {} islands, {} icon points",
            geometry.island_centers.len(),
            geometry.icon_points.len()
        );
        Ok(geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_nonexistent() {
        let geometry = MapGeometry::load(Path::new("/nonexistent")).unwrap();
        assert_eq!(geometry.island_centers.len(), 25);
        assert_eq!(geometry.combat_probes.len(), 25);
        assert_eq!(geometry.icon_points.len(), 25);
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("geometry.json"),
            r#"{ "islandCenters": [ { "bgX": 10.0, "bgY": 20.5 } ] }"#,
        )
        .unwrap();

        let geometry = MapGeometry::load(dir.path()).unwrap();
        assert_eq!(geometry.island_centers, vec![RefPoint { x: 10.0, y: 20.5 }]);
        assert_eq!(geometry.arrows_a.len(), 25);
        assert!(geometry.arrows_a[0].is_none());
    }

    #[test]
    fn test_palette_hexes_are_canonical() {
        for (hex, _) in PALETTE {
            assert_eq!(hex.len(), 7);
            assert_eq!(*hex, hex.to_uppercase());
        }
    }
}
