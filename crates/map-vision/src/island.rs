use map_data::BOSS_HEX;
use map_state::IslandCategory;
use serde::{Deserialize, Serialize};

use crate::palette::is_minion_hex;

/// What the combat probes say about a battle island
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombatSubtype {
    Boss,
    Minion,
    None,
}

/// Boss banner takes priority over a minion marker.
pub fn combat_subtype(boss_hex: &str, minion_hex: &str) -> CombatSubtype {
    if boss_hex.eq_ignore_ascii_case(BOSS_HEX) {
        CombatSubtype::Boss
    } else if is_minion_hex(minion_hex) {
        CombatSubtype::Minion
    } else {
        CombatSubtype::None
    }
}

/// Fold an island's color type and its two combat-probe colors into a category.
pub fn classify_island(island_type: &str, boss_hex: &str, minion_hex: &str) -> IslandCategory {
    match island_type.to_lowercase().as_str() {
        "easy" | "medium" | "hard" => match combat_subtype(boss_hex, minion_hex) {
            CombatSubtype::Boss => IslandCategory::Boss,
            CombatSubtype::Minion => IslandCategory::Minion,
            CombatSubtype::None => IslandCategory::Battle,
        },
        "decision" => IslandCategory::Decision,
        "shop" => IslandCategory::Shop,
        "portal" | "arrival" => IslandCategory::Portal,
        "bronze door" | "silver door" | "gold door" | "time lock" => IslandCategory::Door,
        _ => IslandCategory::Void,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_table() {
        let cases = [
            ("easy", "#E58F16", "#2DB38F", IslandCategory::Boss),
            ("hard", "#e58f16", "#FFFFFF", IslandCategory::Boss),
            ("easy", "#000000", "#FFFFFF", IslandCategory::Minion),
            ("medium", "#000000", "#ECD982", IslandCategory::Battle),
            ("easy", "#000000", "#262B34", IslandCategory::Battle),
            ("Decision", "#E58F16", "#FFFFFF", IslandCategory::Decision),
            ("shop", "#000000", "#000000", IslandCategory::Shop),
            ("arrival", "#000000", "#000000", IslandCategory::Portal),
            ("portal", "#000000", "#000000", IslandCategory::Portal),
            ("time lock", "#000000", "#000000", IslandCategory::Door),
            ("gold door", "#000000", "#000000", IslandCategory::Door),
            ("Void", "#E58F16", "#FFFFFF", IslandCategory::Void),
            ("#123456", "#000000", "#FFFFFF", IslandCategory::Void),
        ];
        for (island_type, boss, minion, expected) in cases {
            assert_eq!(
                classify_island(island_type, boss, minion),
                expected,
                "{} / {} / {}",
                island_type,
                boss,
                minion
            );
        }
    }

    #[test]
    fn test_boss_beats_minion() {
        assert_eq!(combat_subtype("#E58F16", "#FFFFFF"), CombatSubtype::Boss);
        assert_eq!(combat_subtype("#E58F17", "#F07E5F"), CombatSubtype::None);
    }
}
