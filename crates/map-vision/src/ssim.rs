use anyhow::{bail, Result};
use image::GrayImage;

/// Side of the square averaging window
pub const WINDOW: usize = 7;

const DATA_RANGE: f64 = 255.0;
const K1: f64 = 0.01;
const K2: f64 = 0.03;

/// Mean structural similarity of two equal-sized grayscale images.
///
/// Local statistics use a uniform 7x7 window with sample (n - 1) covariance,
/// and the mean is taken over every window that lies fully inside the image.
/// Identical images score exactly 1.0.
pub fn structural_similarity(a: &GrayImage, b: &GrayImage) -> Result<f64> {
    if a.dimensions() != b.dimensions() {
        bail!(
            "SSIM needs equal sizes, got {:?} and {:?}",
            a.dimensions(),
            b.dimensions()
        );
    }
    let (w, h) = (a.width() as usize, a.height() as usize);
    if w < WINDOW || h < WINDOW {
        bail!("SSIM needs at least {}x{} pixels, got {}x{}", WINDOW, WINDOW, w, h);
    }

    let sums = WindowSums::new(a, b);

    let np = (WINDOW * WINDOW) as f64;
    let cov_norm = np / (np - 1.0);
    let c1 = (K1 * DATA_RANGE).powi(2);
    let c2 = (K2 * DATA_RANGE).powi(2);

    let mut total = 0.0;
    let mut count = 0usize;
    for y in 0..=(h - WINDOW) {
        for x in 0..=(w - WINDOW) {
            let [sx, sy, sxx, syy, sxy] = sums.window(x, y);
            let ux = sx / np;
            let uy = sy / np;
            let vx = cov_norm * (sxx / np - ux * ux);
            let vy = cov_norm * (syy / np - uy * uy);
            let vxy = cov_norm * (sxy / np - ux * uy);

            let numerator = (2.0 * ux * uy + c1) * (2.0 * vxy + c2);
            let denominator = (ux * ux + uy * uy + c1) * (vx + vy + c2);
            total += numerator / denominator;
            count += 1;
        }
    }

    Ok(total / count as f64)
}

/// Summed-area tables of x, y, x², y² and xy
struct WindowSums {
    stride: usize,
    table: Vec<[f64; 5]>,
}

impl WindowSums {
    fn new(a: &GrayImage, b: &GrayImage) -> Self {
        let (w, h) = (a.width() as usize, a.height() as usize);
        let stride = w + 1;
        let mut table = vec![[0.0f64; 5]; stride * (h + 1)];

        for y in 0..h {
            let mut row = [0.0f64; 5];
            for x in 0..w {
                let p = a.get_pixel(x as u32, y as u32)[0] as f64;
                let q = b.get_pixel(x as u32, y as u32)[0] as f64;
                let values = [p, q, p * p, q * q, p * q];
                let above = table[y * stride + x + 1];
                let cell = &mut table[(y + 1) * stride + x + 1];
                for k in 0..5 {
                    row[k] += values[k];
                    cell[k] = above[k] + row[k];
                }
            }
        }

        Self { stride, table }
    }

    fn window(&self, x: usize, y: usize) -> [f64; 5] {
        let at = |x: usize, y: usize| self.table[y * self.stride + x];
        let (x1, y1) = (x + WINDOW, y + WINDOW);
        let (br, bl, tr, tl) = (at(x1, y1), at(x, y1), at(x1, y), at(x, y));
        let mut out = [0.0; 5];
        for k in 0..5 {
            out[k] = br[k] - bl[k] - tr[k] + tl[k];
        }
        out
    }
}
