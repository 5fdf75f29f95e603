use image::{Rgb, Rgba};
use map_data::{CANNOT_BE_MINION, MONSTER_HEX, PALETTE};
use std::sync::OnceLock;

/// A palette match is accepted only strictly inside this RGB distance.
pub const ACCEPT_RADIUS: f64 = 20.0;

/// Colors within this distance of the monster backdrop count as monster.
pub const MONSTER_RADIUS: f64 = 10.0;

/// Outcome of classifying one sampled pixel against the palette
#[derive(Debug, Clone, PartialEq)]
pub enum ColorMatch {
    Palette {
        hex: &'static str,
        label: &'static str,
        distance: f64,
    },
    /// No entry close enough; carries the sampled color as `#RRGGBB`
    Unclassified(String),
}

impl ColorMatch {
    /// Canonical palette hex, or the raw sampled hex
    pub fn hex(&self) -> &str {
        match self {
            Self::Palette { hex, .. } => hex,
            Self::Unclassified(hex) => hex,
        }
    }

    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::Palette { label, .. } => Some(*label),
            Self::Unclassified(_) => None,
        }
    }
}

pub fn rgb(pixel: Rgba<u8>) -> Rgb<u8> {
    Rgb([pixel[0], pixel[1], pixel[2]])
}

/// Uppercase `#RRGGBB`
pub fn hex_of(pixel: Rgb<u8>) -> String {
    format!("#{:02X}{:02X}{:02X}", pixel[0], pixel[1], pixel[2])
}

/// Parse `#RRGGBB` (either case)
pub fn parse_hex(hex: &str) -> Option<Rgb<u8>> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

pub fn color_distance(a: Rgb<u8>, b: Rgb<u8>) -> f64 {
    a.0.iter()
        .zip(b.0.iter())
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

fn palette_rgb() -> &'static [(Rgb<u8>, &'static str, &'static str)] {
    static PALETTE_RGB: OnceLock<Vec<(Rgb<u8>, &'static str, &'static str)>> = OnceLock::new();
    PALETTE_RGB.get_or_init(|| {
        PALETTE
            .iter()
            .filter_map(|&(hex, label)| parse_hex(hex).map(|rgb| (rgb, hex, label)))
            .collect()
    })
}

/// Nearest palette entry by Euclidean RGB distance.
/// Ties keep the earlier entry in declaration order.
pub fn closest_color(pixel: Rgb<u8>) -> ColorMatch {
    let mut best: Option<(f64, &'static str, &'static str)> = None;
    for &(entry, hex, label) in palette_rgb() {
        let dist = color_distance(pixel, entry);
        if best.map_or(true, |(d, _, _)| dist < d) {
            best = Some((dist, hex, label));
        }
    }

    match best {
        Some((distance, hex, label)) if distance < ACCEPT_RADIUS => ColorMatch::Palette {
            hex,
            label,
            distance,
        },
        _ => ColorMatch::Unclassified(hex_of(pixel)),
    }
}

pub fn is_monster_color(pixel: Rgb<u8>) -> bool {
    parse_hex(MONSTER_HEX).map_or(false, |monster| color_distance(pixel, monster) <= MONSTER_RADIUS)
}

/// Anything other than an island body color or the monster backdrop is a minion marker.
pub fn is_minion_color(pixel: Rgb<u8>) -> bool {
    let hex = hex_of(pixel);
    !(CANNOT_BE_MINION.contains(&hex.as_str()) || is_monster_color(pixel))
}

/// Hex-string form of [`is_minion_color`]; unparseable input is never a minion.
pub fn is_minion_hex(hex: &str) -> bool {
    if CANNOT_BE_MINION.iter().any(|c| c.eq_ignore_ascii_case(hex)) {
        return false;
    }
    parse_hex(hex).map_or(false, |pixel| !is_monster_color(pixel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_palette_colors() {
        for &(hex, label) in PALETTE {
            let pixel = parse_hex(hex).unwrap();
            match closest_color(pixel) {
                ColorMatch::Palette {
                    hex: h,
                    label: l,
                    distance,
                } => {
                    assert_eq!(h, hex);
                    assert_eq!(l, label);
                    assert_eq!(distance, 0.0);
                }
                other => panic!("{} should classify, got {:?}", hex, other),
            }
        }
    }

    #[test]
    fn test_fuzzy_match_inside_radius() {
        // #2DB38F shifted by (5, -5, 3): distance ~7.7
        let m = closest_color(Rgb([0x32, 0xAE, 0x92]));
        assert_eq!(m.label(), Some("easy"));
        assert_eq!(m.hex(), "#2DB38F");
    }

    #[test]
    fn test_far_colors_return_own_hex() {
        assert_eq!(
            closest_color(Rgb([0, 0, 0])),
            ColorMatch::Unclassified("#000000".to_string())
        );
        // Exactly 20 away from "shop" along blue is not accepted
        let m = closest_color(Rgb([0x6D, 0x6D, 0xE5 - 20]));
        assert_eq!(m.label(), None);
        assert_eq!(m.hex(), "#6D6DD1");
    }

    #[test]
    fn test_hex_roundtrip_and_case() {
        assert_eq!(parse_hex("#e58f16"), Some(Rgb([0xE5, 0x8F, 0x16])));
        assert_eq!(hex_of(Rgb([0xE5, 0x8F, 0x16])), "#E58F16");
        assert_eq!(parse_hex("E58F16"), None);
        assert_eq!(parse_hex("#E58F1"), None);
    }

    #[test]
    fn test_monster_color() {
        assert!(is_monster_color(Rgb([0x26, 0x2B, 0x34])));
        // distance sqrt(97) ~ 9.85
        assert!(is_monster_color(Rgb([0x26 + 6, 0x2B + 6, 0x34 + 5])));
        // distance sqrt(101) ~ 10.05
        assert!(!is_monster_color(Rgb([0x26 + 10, 0x2B + 1, 0x34])));
    }

    #[test]
    fn test_minion_color() {
        assert!(!is_minion_color(Rgb([0x2D, 0xB3, 0x8F])));
        assert!(!is_minion_color(Rgb([0xF0, 0x7E, 0x5F])));
        assert!(!is_minion_color(Rgb([0x26, 0x2B, 0x34])));
        assert!(is_minion_color(Rgb([255, 255, 255])));
        assert!(!is_minion_hex("#ecd982"));
        assert!(is_minion_hex("#ffffff"));
        assert!(!is_minion_hex("not a color"));
    }
}
