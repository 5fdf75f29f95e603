use anyhow::{bail, Result};
use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_polygon_mut};
use imageproc::point::Point;

/// Shape of the region cut out around a node center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Footprint {
    Circle,
    /// Axis-aligned square rotated 45 degrees
    Diamond,
}

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Cut the footprint centered at `center` out of `image`.
///
/// Center and radius are already in pixel space. The result always covers the
/// box `[cx - r, cx + r) x [cy - r, cy + r)`, so its side is `2r`. Pixels
/// outside the footprint, or outside the source image, are fully transparent.
pub fn extract_region(
    image: &RgbaImage,
    center: (i32, i32),
    radius: i32,
    footprint: Footprint,
) -> Result<RgbaImage> {
    if radius <= 0 {
        bail!("Degenerate {:?} footprint: radius {}", footprint, radius);
    }

    let side = (radius * 2) as u32;
    let mask = footprint_mask(side, radius, footprint);

    let (left, top) = (center.0 - radius, center.1 - radius);
    let (w, h) = (image.width() as i64, image.height() as i64);

    Ok(RgbaImage::from_fn(side, side, |x, y| {
        if mask.get_pixel(x, y)[0] != 255 {
            return TRANSPARENT;
        }
        let sx = left as i64 + x as i64;
        let sy = top as i64 + y as i64;
        if sx < 0 || sy < 0 || sx >= w || sy >= h {
            TRANSPARENT
        } else {
            *image.get_pixel(sx as u32, sy as u32)
        }
    }))
}

/// Mask over the crop box only; everything the full-image mask would add lies
/// outside the box and is cropped away anyway.
fn footprint_mask(side: u32, radius: i32, footprint: Footprint) -> GrayImage {
    let mut mask = GrayImage::new(side, side);
    match footprint {
        Footprint::Circle => {
            draw_filled_circle_mut(&mut mask, (radius, radius), radius, Luma([255u8]));
        }
        Footprint::Diamond => {
            let r = radius;
            let vertices = [
                Point::new(r, 0),
                Point::new(0, r),
                Point::new(r, 2 * r),
                Point::new(2 * r, r),
            ];
            draw_polygon_mut(&mut mask, &vertices, Luma([255u8]));
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque_image(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, 90, 255]))
    }

    #[test]
    fn test_side_is_twice_radius() {
        let img = opaque_image(300, 300);
        for footprint in [Footprint::Circle, Footprint::Diamond] {
            for r in [1, 7, 24, 100] {
                let crop = extract_region(&img, (150, 150), r, footprint).unwrap();
                assert_eq!(crop.dimensions(), (2 * r as u32, 2 * r as u32));
            }
        }
    }

    #[test]
    fn test_diamond_outside_transparent() {
        let img = opaque_image(300, 300);
        for r in [3, 17, 40] {
            let crop = extract_region(&img, (150, 150), r, Footprint::Diamond).unwrap();
            for (x, y, px) in crop.enumerate_pixels() {
                let l1 = (x as i32 - r).abs() + (y as i32 - r).abs();
                if l1 > r {
                    assert_eq!(px[3], 0, "({}, {}) outside r={} should be masked", x, y, r);
                }
            }
            // Center comes from the source
            assert_eq!(crop.get_pixel(r as u32, r as u32), img.get_pixel(150, 150));
        }
    }

    #[test]
    fn test_circle_outside_transparent() {
        let img = opaque_image(200, 200);
        let r = 24;
        let crop = extract_region(&img, (100, 100), r, Footprint::Circle).unwrap();
        for (x, y, px) in crop.enumerate_pixels() {
            let dx = x as f64 - r as f64;
            let dy = y as f64 - r as f64;
            if (dx * dx + dy * dy).sqrt() > r as f64 + 1.0 {
                assert_eq!(px[3], 0, "({}, {}) outside the circle", x, y);
            }
        }
        assert_eq!(crop.get_pixel(24, 24), img.get_pixel(100, 100));
    }

    #[test]
    fn test_out_of_bounds_is_transparent() {
        let img = opaque_image(50, 50);
        let crop = extract_region(&img, (0, 0), 10, Footprint::Diamond).unwrap();
        assert_eq!(crop.dimensions(), (20, 20));
        // Left half of the box lies outside the source image
        assert_eq!(crop.get_pixel(5, 10)[3], 0);
        assert_eq!(crop.get_pixel(12, 10)[3], 255);
    }

    #[test]
    fn test_zero_radius_rejected() {
        let img = opaque_image(10, 10);
        assert!(extract_region(&img, (5, 5), 0, Footprint::Circle).is_err());
    }
}
