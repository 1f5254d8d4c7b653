use log::debug;
use ndarray::{Array2, Zip};

use crate::series::Series;

/// Guards the per-frame scaling against division by zero when a frame is
/// uniform.
const RANGE_EPSILON: f32 = 1e-8;

/// The shared contrast window used in matched mode: the minimum and range
/// of the globally narrowest-range frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContrastWindow {
    pub base: f32,
    pub width: f32,
}

/// Find the shared contrast window across every frame of every loaded
/// series.
///
/// The frame with the smallest (max - min) range defines the window; its
/// minimum is the base and its range the width, floored to 1 to avoid
/// division by zero. Returns `None` when no frames are loaded. The scan is
/// linear in the total loaded pixel count and is intentionally not cached,
/// so the window always reflects the currently loaded frames.
pub fn compute_window<'a, I>(series: I) -> Option<ContrastWindow>
where
    I: IntoIterator<Item = &'a Series>,
{
    let mut narrowest: Option<ContrastWindow> = None;
    for series in series {
        for slice in series.slices() {
            let (min, max) = min_max(&slice.physical);
            let width = max - min;
            if narrowest.is_none_or(|window| width < window.width) {
                narrowest = Some(ContrastWindow { base: min, width });
            }
        }
    }
    narrowest.map(|window| ContrastWindow {
        base: window.base,
        width: if window.width == 0.0 { 1.0 } else { window.width },
    })
}

/// Map a physical frame to 8-bit by its own minimum and maximum
/// (independent mode).
///
/// The frame's minimum maps to 0 and its maximum to 255; a frame with zero
/// range maps to all zeros. The frame must be non-empty.
pub fn normalize_independent(physical: &Array2<f32>) -> Array2<u8> {
    let (min, max) = min_max(physical);
    let range = max - min + RANGE_EPSILON;
    debug!(
        "independent window: min {min}, max {max}, width {}",
        max - min
    );
    Zip::from(physical).par_map_collect(|&value| ((value - min) / range * 255.0) as u8)
}

/// Map a physical frame to 8-bit through a shared window (matched mode).
///
/// Values outside the window saturate to 0 or 255 rather than wrapping.
/// The frame must be non-empty.
pub fn normalize_matched(physical: &Array2<f32>, window: ContrastWindow) -> Array2<u8> {
    debug!(
        "matched window: base {}, width {}",
        window.base, window.width
    );
    Zip::from(physical).par_map_collect(|&value| {
        (((value - window.base) / window.width).clamp(0.0, 1.0) * 255.0) as u8
    })
}

fn min_max(frame: &Array2<f32>) -> (f32, f32) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &value in frame.iter() {
        if value < min {
            min = value;
        }
        if value > max {
            max = value;
        }
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use ndarray::{Array2, array};

    use super::*;
    use crate::enums::FolderKind;
    use crate::series::{Series, Slice};

    fn series_of(frames: Vec<Array2<f32>>) -> Series {
        let slices = frames
            .into_iter()
            .enumerate()
            .map(|(index, physical)| Slice {
                display: normalize_independent(&physical),
                physical,
                basename: format!("{index}.dcm"),
            })
            .collect();
        Series::new(slices, vec![PathBuf::from("scan")], 0, FolderKind::Flat)
    }

    #[test]
    fn independent_spans_full_output_range() {
        let physical = array![[0.0_f32, 50.0], [100.0, 25.0]];
        let display = normalize_independent(&physical);
        assert_eq!(display, array![[0_u8, 127], [255, 63]]);
    }

    #[test]
    fn independent_uniform_frame_is_all_zero() {
        let physical = Array2::from_elem((3, 3), 7.0_f32);
        let display = normalize_independent(&physical);
        assert!(display.iter().all(|&value| value == 0));
    }

    #[test]
    fn window_comes_from_narrowest_range_frame() {
        let wide = series_of(vec![array![[0.0_f32, 100.0]]]);
        let narrow = series_of(vec![array![[50.0_f32, 60.0]]]);
        let window = compute_window([&wide, &narrow]).unwrap();
        assert_eq!(window.base, 50.0);
        assert_eq!(window.width, 10.0);
    }

    #[test]
    fn window_width_is_floored_to_one() {
        let uniform = series_of(vec![Array2::from_elem((2, 2), 40.0_f32)]);
        let window = compute_window([&uniform]).unwrap();
        assert_eq!(window.base, 40.0);
        assert_eq!(window.width, 1.0);
    }

    #[test]
    fn window_of_no_frames_is_none() {
        let empty = series_of(Vec::new());
        assert!(compute_window([&empty]).is_none());
    }

    #[test]
    fn matched_defining_frame_spans_full_output_range() {
        let physical = array![[50.0_f32, 60.0]];
        let window = ContrastWindow {
            base: 50.0,
            width: 10.0,
        };
        assert_eq!(normalize_matched(&physical, window), array![[0_u8, 255]]);
    }

    #[test]
    fn matched_saturates_outside_the_window() {
        let window = ContrastWindow {
            base: 0.0,
            width: 100.0,
        };
        let physical = array![[-50.0_f32, 150.0, 50.0]];
        assert_eq!(
            normalize_matched(&physical, window),
            array![[0_u8, 255, 127]]
        );
    }
}
