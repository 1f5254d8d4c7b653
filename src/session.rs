use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use ndarray::Array2;
use thiserror::Error;

use crate::enums::FolderKind;
use crate::export::{self, ExportError, RoiRecord};
use crate::normalizer;
use crate::render::{self, RenderError, RoiOverlay, SnapshotOutcome};
use crate::roi::{self, RoiRect, RoiStats};
use crate::series::Series;
use crate::series_loader::SeriesLoader;

#[derive(Debug, Error)]
pub enum SessionLoadError {
    #[error("no input folders given")]
    NoSeries,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a folder switch. On failure the series keeps its previous
/// slices and folder selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FolderSwitch {
    pub success: bool,
    /// The series' largest valid slice index after the switch.
    pub new_max_index: isize,
    /// Current contrast policy, so the caller knows whether every visible
    /// frame needs re-rendering.
    pub match_contrast_enabled: bool,
}

/// The aggregate root of a comparison session: every loaded series, its
/// folder group, and the contrast policy shared across them.
#[derive(Debug, Clone)]
pub struct Session {
    series: Vec<Series>,
    match_contrast_enabled: bool,
}

impl Session {
    /// Load one series per input folder.
    ///
    /// Each folder is classified as flat or grouped; for a grouped folder
    /// the first sub-folder (by name) starts active. A folder whose files
    /// all fail to decode yields a valid empty series.
    pub fn load(folders: &[impl AsRef<Path>]) -> Result<Session, SessionLoadError> {
        if folders.is_empty() {
            return Err(SessionLoadError::NoSeries);
        }

        let mut series = Vec::with_capacity(folders.len());
        for folder in folders {
            let (kind, candidates) = SeriesLoader::scan_group(folder.as_ref())?;
            let slices = SeriesLoader::load_folder(&candidates[0])?;
            info!(
                "loaded {} slices from {}",
                slices.len(),
                candidates[0].display()
            );
            series.push(Series::new(slices, candidates, 0, kind));
        }

        Ok(Session {
            series,
            match_contrast_enabled: false,
        })
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    /// Largest slice index addressable across every series; -1 when any
    /// series is empty.
    pub fn global_max_index(&self) -> isize {
        self.series
            .iter()
            .map(Series::max_index)
            .min()
            .unwrap_or(-1)
    }

    /// Display rendition of one slice under the current contrast policy.
    ///
    /// Independent mode serves the display frame computed at load time;
    /// matched mode re-derives it through the shared window, which is
    /// scanned from the currently loaded series on every call. An
    /// out-of-range slice index yields an all-zero frame shaped like the
    /// series' first frame (0x0 when the series is empty), so unequal
    /// series lengths never turn navigation into an error.
    pub fn display_slice(&self, series_index: usize, slice_index: usize) -> Array2<u8> {
        let Some(series) = self.series.get(series_index) else {
            return Array2::zeros((0, 0));
        };
        let Some(slice) = series.slice(slice_index) else {
            return Array2::zeros(series.first_shape().unwrap_or((0, 0)));
        };
        if self.match_contrast_enabled {
            if let Some(window) = normalizer::compute_window(&self.series) {
                return normalizer::normalize_matched(&slice.physical, window);
            }
        }
        slice.display.clone()
    }

    /// PNG-encoded rendition of [`Self::display_slice`].
    pub fn png_slice(
        &self,
        series_index: usize,
        slice_index: usize,
    ) -> Result<Vec<u8>, RenderError> {
        render::encode_png(&self.display_slice(series_index, slice_index))
    }

    /// ROI statistics against the physical (not display) values.
    ///
    /// Out-of-range coordinates yield zero statistics.
    pub fn roi_stats(&self, series_index: usize, slice_index: usize, rect: RoiRect) -> RoiStats {
        self.series
            .get(series_index)
            .and_then(|series| series.slice(slice_index))
            .map(|slice| roi::roi_stats(&slice.physical, rect))
            .unwrap_or_default()
    }

    /// File name of one slice, empty when out of range.
    pub fn filename(&self, series_index: usize, slice_index: usize) -> String {
        self.series
            .get(series_index)
            .and_then(|series| series.slice(slice_index))
            .map(|slice| slice.basename.clone())
            .unwrap_or_default()
    }

    /// Basenames of the candidate sub-folders; empty for a flat series.
    pub fn list_subfolders(&self, series_index: usize) -> Vec<String> {
        match self.series.get(series_index) {
            Some(series) if series.kind() == FolderKind::Grouped => {
                series.folders().iter().map(|f| basename(f)).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Name of the folder the series is currently loaded from.
    pub fn current_folder_name(&self, series_index: usize) -> String {
        self.series
            .get(series_index)
            .map(|series| basename(series.active_folder_path()))
            .unwrap_or_default()
    }

    pub fn folder_kind(&self, series_index: usize) -> Option<FolderKind> {
        self.series.get(series_index).map(Series::kind)
    }

    /// Reload one series from another of its candidate folders.
    ///
    /// The switch is atomic: on any failure (bad indices, unreadable or
    /// empty target) the series keeps its previous slices and the result
    /// reports `success: false`. Other series are unaffected either way.
    pub fn switch_folder(&mut self, series_index: usize, folder_index: usize) -> FolderSwitch {
        let failure = FolderSwitch {
            success: false,
            new_max_index: self
                .series
                .get(series_index)
                .map_or(-1, Series::max_index),
            match_contrast_enabled: self.match_contrast_enabled,
        };

        let Some(series) = self.series.get_mut(series_index) else {
            return failure;
        };
        let Some(target) = series.folders().get(folder_index).cloned() else {
            return failure;
        };

        let slices = match SeriesLoader::load_folder(&target) {
            Ok(slices) if !slices.is_empty() => slices,
            Ok(_) => {
                warn!(
                    "no decodable images in {}, keeping previous folder",
                    target.display()
                );
                return failure;
            }
            Err(err) => {
                warn!("failed to read {}: {err}", target.display());
                return failure;
            }
        };

        series.replace(slices, folder_index);
        info!(
            "switched series {series_index} to {} ({} slices)",
            target.display(),
            series.len()
        );
        FolderSwitch {
            success: true,
            new_max_index: series.max_index(),
            match_contrast_enabled: self.match_contrast_enabled,
        }
    }

    /// Select the contrast policy for subsequent display conversions.
    /// Already-encoded frames are unaffected.
    pub fn set_match_contrast(&mut self, enabled: bool) -> bool {
        self.match_contrast_enabled = enabled;
        debug!("match contrast {}", if enabled { "on" } else { "off" });
        self.match_contrast_enabled
    }

    pub fn match_contrast_enabled(&self) -> bool {
        self.match_contrast_enabled
    }

    /// Save the currently displayed slice of every series as PNG files
    /// under `out_dir`, plus one combined strip.
    ///
    /// `current_slices` holds the slice index shown per series (missing
    /// entries default to 0); `overlays`, when given, draws an ROI
    /// rectangle per series. Empty series are skipped.
    pub fn save_snapshots(
        &self,
        out_dir: &Path,
        current_slices: &[usize],
        overlays: Option<&[Option<RoiOverlay>]>,
    ) -> Result<SnapshotOutcome, RenderError> {
        let mut frames = Vec::with_capacity(self.series.len());
        let mut kept_overlays = Vec::with_capacity(self.series.len());
        for (index, series) in self.series.iter().enumerate() {
            if series.is_empty() {
                warn!("series {index} has no frames, skipping snapshot");
                continue;
            }
            let slice_index = current_slices.get(index).copied().unwrap_or(0);
            frames.push((
                format!("series{}_slice{}", index + 1, slice_index + 1),
                self.display_slice(index, slice_index),
            ));
            kept_overlays.push(overlays.and_then(|all| all.get(index).copied().flatten()));
        }

        render::save_snapshots(out_dir, &frames, overlays.map(|_| kept_overlays.as_slice()))
    }

    /// Write the ROI measurement history as a CSV spreadsheet under
    /// `out_dir`.
    pub fn export_history(
        &self,
        out_dir: &Path,
        history: &[Vec<RoiRecord>],
    ) -> Result<PathBuf, ExportError> {
        export::export_history(out_dir, history, self.series.len())
    }
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
