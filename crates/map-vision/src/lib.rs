pub mod icon_matcher;
pub mod island;
pub mod palette;
pub mod ssim;

pub use icon_matcher::{
    enhance_contrast, luma_601, IconMatcher, MatchResult, ShiftedMatch, TemplateEntry,
    TemplateLibrary, CIRCLE_THRESHOLD, CONTRAST_FACTOR, DIAMOND_THRESHOLD, OTHER_LABEL,
    REDUCED_EDGE,
};
pub use island::{classify_island, combat_subtype, CombatSubtype};
pub use palette::{closest_color, is_minion_color, is_minion_hex, is_monster_color, ColorMatch};
pub use ssim::structural_similarity;
