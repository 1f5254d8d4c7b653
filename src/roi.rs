use ndarray::{Array2, s};

/// Rectangular region of interest in source-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoiRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl RoiRect {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Population mean and standard deviation over an ROI, rounded to 8
/// decimal digits.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RoiStats {
    pub mean: f64,
    pub std: f64,
}

const STAT_DECIMALS: i32 = 8;

/// Compute mean and standard deviation of `rect` against a physical frame.
///
/// The rectangle is clamped to the frame bounds; a rectangle with no
/// intersection yields zero statistics. The standard deviation is not
/// Bessel corrected.
pub fn roi_stats(physical: &Array2<f32>, rect: RoiRect) -> RoiStats {
    let (rows, cols) = physical.dim();
    let y0 = rect.y.min(rows);
    let y1 = rect.y.saturating_add(rect.height).min(rows);
    let x0 = rect.x.min(cols);
    let x1 = rect.x.saturating_add(rect.width).min(cols);

    let roi = physical.slice(s![y0..y1, x0..x1]);
    let count = roi.len();
    if count == 0 {
        return RoiStats::default();
    }

    let mut sum = 0_f64;
    for &value in roi.iter() {
        sum += f64::from(value);
    }
    let mean = sum / count as f64;

    let mut squared_sum = 0_f64;
    for &value in roi.iter() {
        let diff = f64::from(value) - mean;
        squared_sum += diff * diff;
    }
    let std = (squared_sum / count as f64).sqrt();

    RoiStats {
        mean: round_to(mean, STAT_DECIMALS),
        std: round_to(std, STAT_DECIMALS),
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, array};

    use super::*;

    #[test]
    fn interior_rect_matches_population_statistics() {
        let physical = array![
            [0.0_f32, 0.0, 0.0, 0.0],
            [0.0, 2.0, 4.0, 0.0],
            [0.0, 6.0, 8.0, 0.0],
            [0.0, 0.0, 0.0, 0.0],
        ];
        let stats = roi_stats(&physical, RoiRect::new(1, 1, 2, 2));
        assert_eq!(stats.mean, 5.0);
        // population std of {2, 4, 6, 8} is sqrt(5)
        assert_eq!(stats.std, 2.23606798);
    }

    #[test]
    fn rect_is_clamped_to_frame_bounds() {
        let physical = array![
            [1.0_f32, 1.0, 1.0, 1.0],
            [1.0, 1.0, 1.0, 1.0],
            [1.0, 1.0, 3.0, 5.0],
            [1.0, 1.0, 7.0, 9.0],
        ];
        let stats = roi_stats(&physical, RoiRect::new(2, 2, 10, 10));
        assert_eq!(stats.mean, 6.0);
        // population std of {3, 5, 7, 9} is sqrt(5)
        assert_eq!(stats.std, 2.23606798);
    }

    #[test]
    fn disjoint_rect_yields_zero_statistics() {
        let physical = Array2::from_elem((4, 4), 42.0_f32);
        let stats = roi_stats(&physical, RoiRect::new(10, 10, 5, 5));
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.std, 0.0);
    }

    #[test]
    fn uniform_frame_has_zero_deviation() {
        let physical = Array2::from_elem((512, 512), 100.0_f32);
        let stats = roi_stats(&physical, RoiRect::new(0, 0, 10, 10));
        assert_eq!(stats.mean, 100.0);
        assert_eq!(stats.std, 0.0);
    }

    #[test]
    fn statistics_are_rounded_to_eight_decimals() {
        let physical = array![[0.0_f32, 0.0, 1.0]];
        let stats = roi_stats(&physical, RoiRect::new(0, 0, 3, 1));
        assert_eq!(stats.mean, 0.33333333);
        assert_eq!(stats.std, 0.47140452);
    }

    #[test]
    fn zero_size_rect_yields_zero_statistics() {
        let physical = Array2::from_elem((4, 4), 42.0_f32);
        let stats = roi_stats(&physical, RoiRect::new(1, 1, 0, 0));
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.std, 0.0);
    }
}
