use serde::{Deserialize, Serialize};
use std::fmt;

/// Final category of an island node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IslandCategory {
    #[serde(rename = "boss")]
    Boss,
    #[serde(rename = "minion")]
    Minion,
    #[serde(rename = "battle")]
    Battle,
    #[serde(rename = "decision")]
    Decision,
    #[serde(rename = "shop")]
    Shop,
    #[serde(rename = "portal")]
    Portal,
    #[serde(rename = "door")]
    Door,
    #[serde(rename = "Void")]
    Void,
}

impl IslandCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boss => "boss",
            Self::Minion => "minion",
            Self::Battle => "battle",
            Self::Decision => "decision",
            Self::Shop => "shop",
            Self::Portal => "portal",
            Self::Door => "door",
            Self::Void => "Void",
        }
    }
}

impl fmt::Display for IslandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type label used for islands whose color is not in the palette.
pub const VOID_TYPE: &str = "Void";

/// One classified island. `index` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IslandNode {
    pub index: usize,
    pub island_type: String,
    pub category: IslandCategory,
}

impl IslandNode {
    /// Placeholder for an island that could not be read
    pub fn void(index: usize) -> Self {
        Self {
            index,
            island_type: VOID_TYPE.to_string(),
            category: IslandCategory::Void,
        }
    }
}

/// Label and crop for one side of a decision node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IconReading {
    pub id: String,
    pub label: String,
    pub base64: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconPair {
    pub left: IconReading,
    pub right: IconReading,
}

impl IconPair {
    /// Unlabeled pair for the 1-based node `index`
    pub fn empty(index: usize) -> Self {
        Self {
            left: IconReading {
                id: format!("L{}", index),
                ..Default::default()
            },
            right: IconReading {
                id: format!("R{}", index),
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrowMark {
    #[serde(rename = "arrow")]
    Arrow,
    #[serde(rename = "no")]
    No,
    #[serde(rename = "skip")]
    Skip,
    /// Endpoint could not be read
    #[serde(rename = "Void")]
    Void,
}

/// Connector presence for both diagonals, one endpoint pair per island
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrowReport {
    #[serde(rename = "A")]
    pub ascending: Vec<[ArrowMark; 2]>,
    #[serde(rename = "D")]
    pub descending: Vec<[ArrowMark; 2]>,
}

/// Outcome of matching a single crop against the template library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropMatch {
    pub label: String,
    pub score: f64,
    pub base64: String,
}

/// Per-node labels and scores for inspecting decision-icon matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconDebugRow {
    pub index: usize,
    pub category: String,
    pub left_label: String,
    pub right_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_score: Option<f64>,
}

/// Best shifted match around one reference point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointMatch {
    pub image_url: String,
    pub x: i64,
    pub y: i64,
    pub best_label: String,
    pub best_score: f64,
    /// Pixel offset of the winning crop from the nominal center
    pub offset: (i32, i32),
    pub base64: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serializes_to_wire_names() {
        assert_eq!(serde_json::to_string(&IslandCategory::Void).unwrap(), "\"Void\"");
        assert_eq!(serde_json::to_string(&IslandCategory::Boss).unwrap(), "\"boss\"");
        assert_eq!(IslandCategory::Door.to_string(), "door");
    }

    #[test]
    fn test_empty_icon_pair_ids() {
        let pair = IconPair::empty(7);
        assert_eq!(pair.left.id, "L7");
        assert_eq!(pair.right.id, "R7");
        assert!(pair.left.label.is_empty());
    }

    #[test]
    fn test_arrow_report_keys() {
        let report = ArrowReport {
            ascending: vec![[ArrowMark::Skip, ArrowMark::Skip]],
            descending: vec![[ArrowMark::Arrow, ArrowMark::No]],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["A"][0][0], "skip");
        assert_eq!(json["D"][0][1], "no");
    }
}
