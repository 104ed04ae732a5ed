//! Quantile threshold search.
//!
//! Every banding decision in the generator (elevation classes, temperature
//! and precipitation bands, humidity quantiles, watermap creek/river cuts)
//! goes through one primitive: find the cutoff `t` such that a target
//! fraction of non-masked cells lies strictly above `t`.

use crate::error::{Result, WorldError};
use crate::grid::Grid;

const PRECISION: f64 = 1.0e-6;

/// Count of unmasked cells strictly above `t`. `mask == true` excludes a
/// cell (the ocean mask, for land-only searches).
fn count_above(field: &Grid<f64>, mask: Option<&Grid<bool>>, t: f64) -> usize {
    field
        .positions()
        .filter(|&p| mask.map_or(true, |m| !m.at(p)) && field.at(p) > t)
        .count()
}

fn check_mask(field: &Grid<f64>, mask: Option<&Grid<bool>>) -> Result<usize> {
    if let Some(m) = mask {
        if !field.same_shape(m) {
            return Err(WorldError::ShapeMismatch {
                layer: "threshold mask".to_string(),
                got_width: m.width(),
                got_height: m.height(),
                want_width: field.width(),
                want_height: field.height(),
            });
        }
    }
    let total = field
        .positions()
        .filter(|&p| mask.map_or(true, |m| !m.at(p)))
        .count();
    Ok(total)
}

/// Bisection over `[-max_abs, +max_abs]` for a continuous field.
///
/// Returns `t` minimising `|count(> t) - fraction × unmasked|`; when the
/// bracket collapses below the precision epsilon the candidate with the
/// smaller count error wins.
pub fn find_threshold_f(
    field: &Grid<f64>,
    fraction: f64,
    mask: Option<&Grid<bool>>,
) -> Result<f64> {
    let total = check_mask(field, mask)?;
    let target = fraction * total as f64;

    let max_abs = field
        .iter()
        .fold(0.0f64, |acc, &v| acc.max(v.abs()))
        .max(PRECISION);
    let mut lo = -max_abs;
    let mut hi = max_abs;

    let mut best = 0.0;
    let mut best_err = f64::INFINITY;
    while hi - lo > PRECISION {
        let mid = (lo + hi) / 2.0;
        let count = count_above(field, mask, mid) as f64;
        let err = (count - target).abs();
        if err < best_err {
            best_err = err;
            best = mid;
        }
        if count > target {
            // Too many cells above: raise the cutoff.
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok(best)
}

/// Integer variant: bisection over `[0, 255]` for byte-valued fields.
pub fn find_threshold_u8(
    field: &Grid<f64>,
    fraction: f64,
    mask: Option<&Grid<bool>>,
) -> Result<f64> {
    let total = check_mask(field, mask)?;
    let target = fraction * total as f64;

    let mut lo = 0i32;
    let mut hi = 255i32;
    let mut best = 0i32;
    let mut best_err = f64::INFINITY;
    while lo <= hi {
        let mid = (lo + hi) / 2;
        let count = count_above(field, mask, mid as f64) as f64;
        let err = (count - target).abs();
        if err < best_err {
            best_err = err;
            best = mid;
        }
        if count > target {
            lo = mid + 1;
        } else {
            hi = mid - 1;
        }
    }
    Ok(best as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 16 cells valued 0..16: a 0.25 target must cut just under the top 4.
    #[test]
    fn quarter_of_linear_ramp() {
        let g = Grid::from_vec(4, 4, (0..16).map(f64::from).collect()).unwrap();
        let t = find_threshold_f(&g, 0.25, None).unwrap();
        let above = g.iter().filter(|&&v| v > t).count();
        assert_eq!(above, 4, "threshold {t} leaves {above} cells above, want 4");
    }

    #[test]
    fn masked_search_ignores_excluded_cells() {
        let g = Grid::from_vec(4, 4, (0..16).map(f64::from).collect()).unwrap();
        // Mask out the top half of values: search sees only 0..8.
        let mask_vec: Vec<bool> = (0..16).map(|v| v >= 8).collect();
        let m = Grid::from_vec(4, 4, mask_vec).unwrap();
        let t = find_threshold_f(&g, 0.5, Some(&m)).unwrap();
        let above = g
            .positions()
            .filter(|&p| !m.at(p) && g.at(p) > t)
            .count();
        assert_eq!(above, 4, "half of the 8 unmasked cells must exceed {t}");
    }

    #[test]
    fn mask_shape_mismatch_is_an_error() {
        let g = Grid::filled(4, 4, 0.0f64);
        let m = Grid::filled(3, 4, false);
        assert!(find_threshold_f(&g, 0.5, Some(&m)).is_err());
    }

    /// The returned cutoff is at least as close to
    /// the target count as its epsilon-neighbours.
    #[test]
    fn result_is_locally_optimal() {
        let g = Grid::from_vec(8, 8, (0..64).map(|v| (v as f64).sqrt()).collect()).unwrap();
        for &p in &[0.1, 0.3, 0.5, 0.9] {
            let t = find_threshold_f(&g, p, None).unwrap();
            let target = p * 64.0;
            let err = |t: f64| (g.iter().filter(|&&v| v > t).count() as f64 - target).abs();
            let e = err(t);
            assert!(
                e <= err(t - 1.0e-5) && e <= err(t + 1.0e-5),
                "p={p}: t={t} err={e} is not locally optimal"
            );
        }
    }

    #[test]
    fn integer_variant_stays_in_byte_range() {
        let g = Grid::from_vec(16, 16, (0..256).map(f64::from).collect()).unwrap();
        let t = find_threshold_u8(&g, 0.5, None).unwrap();
        assert!((0.0..=255.0).contains(&t));
        let above = g.iter().filter(|&&v| v > t).count();
        assert!(
            (above as i64 - 128).abs() <= 1,
            "t={t} leaves {above} above, want ~128"
        );
    }
}
