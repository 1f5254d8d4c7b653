use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::warn;

use crate::decoder::{self, DecodedSlice};
use crate::enums::FolderKind;
use crate::normalizer;
use crate::series::Slice;

pub struct SeriesLoader;

impl SeriesLoader {
    /// Load every `.dcm` file under `folder` into an ordered slice stack.
    ///
    /// Files that fail to decode are logged and skipped; a folder whose
    /// files all fail yields an empty (but valid) stack.
    pub fn load_folder(folder: &Path) -> io::Result<Vec<Slice>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(folder)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| is_dicom_file(path))
            .collect();
        paths.sort();

        Ok(Self::load_files(&paths))
    }

    /// Decode and order a list of candidate image files.
    ///
    /// Slices are ordered by their position along the series axis; if any
    /// decoded file lacks a usable position, the whole batch falls back to
    /// ascending file-name order.
    pub fn load_files(paths: &[impl AsRef<Path>]) -> Vec<Slice> {
        let mut decoded = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            match decoder::decode_slice(path) {
                Ok(slice) => decoded.push(slice),
                Err(err) => warn!("skipping {}: {err}", path.display()),
            }
        }

        Self::sort_slices(&mut decoded);
        decoded
            .into_iter()
            .map(|slice| Slice {
                display: normalizer::normalize_independent(&slice.physical),
                physical: slice.physical,
                basename: slice.basename,
            })
            .collect()
    }

    /// Classify a top-level folder and list its candidate acquisition
    /// folders.
    ///
    /// A sub-directory counts as a candidate when it holds at least one
    /// `.dcm` file. More than one candidate makes the group grouped;
    /// otherwise the folder itself is the single flat acquisition.
    pub fn scan_group(folder: &Path) -> io::Result<(FolderKind, Vec<PathBuf>)> {
        let mut subfolders: Vec<PathBuf> = fs::read_dir(folder)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_dir() && contains_dicom_files(path))
            .collect();
        subfolders.sort();

        if subfolders.len() > 1 {
            Ok((FolderKind::Grouped, subfolders))
        } else {
            Ok((FolderKind::Flat, vec![folder.to_path_buf()]))
        }
    }

    fn sort_slices(decoded: &mut [DecodedSlice]) {
        if decoded.iter().all(|slice| slice.sort_key.is_some()) {
            decoded.sort_by(|a, b| {
                a.sort_key
                    .partial_cmp(&b.sort_key)
                    .unwrap_or(Ordering::Equal)
            });
        } else if !decoded.is_empty() {
            warn!("missing series-axis position, sorting by file name");
            decoded.sort_by(|a, b| a.basename.cmp(&b.basename));
        }
    }
}

fn is_dicom_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"))
}

fn contains_dicom_files(folder: &Path) -> bool {
    fs::read_dir(folder)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .any(|entry| is_dicom_file(&entry.path()))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::fs::{self, File};

    use ndarray::Array2;
    use tempfile::TempDir;

    use super::*;

    fn keyed(basename: &str, sort_key: Option<f32>) -> DecodedSlice {
        DecodedSlice {
            physical: Array2::zeros((1, 1)),
            sort_key,
            basename: basename.to_string(),
        }
    }

    #[test]
    fn slices_sort_by_axis_position() {
        let mut decoded = vec![
            keyed("b.dcm", Some(30.0)),
            keyed("a.dcm", Some(10.0)),
            keyed("c.dcm", Some(20.0)),
        ];
        SeriesLoader::sort_slices(&mut decoded);
        let order: Vec<&str> = decoded.iter().map(|s| s.basename.as_str()).collect();
        assert_eq!(order, ["a.dcm", "c.dcm", "b.dcm"]);
    }

    #[test]
    fn one_missing_key_falls_back_to_name_order_for_the_batch() {
        let mut decoded = vec![
            keyed("c.dcm", Some(10.0)),
            keyed("a.dcm", None),
            keyed("b.dcm", Some(20.0)),
        ];
        SeriesLoader::sort_slices(&mut decoded);
        let order: Vec<&str> = decoded.iter().map(|s| s.basename.as_str()).collect();
        assert_eq!(order, ["a.dcm", "b.dcm", "c.dcm"]);
    }

    #[test]
    fn undecodable_files_are_dropped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.dcm"), b"not a dicom file").unwrap();
        fs::write(dir.path().join("ignored.txt"), b"not an image").unwrap();

        let slices = SeriesLoader::load_folder(dir.path()).unwrap();
        assert!(slices.is_empty());
    }

    #[test]
    fn missing_folder_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(SeriesLoader::load_folder(&dir.path().join("absent")).is_err());
    }

    #[test]
    fn folder_with_dicom_subfolders_is_grouped() {
        let dir = TempDir::new().unwrap();
        for name in ["b_scan", "a_scan"] {
            let sub = dir.path().join(name);
            fs::create_dir(&sub).unwrap();
            File::create(sub.join("slice.dcm")).unwrap();
        }
        fs::create_dir(dir.path().join("notes")).unwrap();

        let (kind, folders) = SeriesLoader::scan_group(dir.path()).unwrap();
        assert_eq!(kind, FolderKind::Grouped);
        let names: Vec<_> = folders
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a_scan", "b_scan"]);
    }

    #[test]
    fn folder_without_dicom_subfolders_is_flat() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("slice.dcm")).unwrap();

        let (kind, folders) = SeriesLoader::scan_group(dir.path()).unwrap();
        assert_eq!(kind, FolderKind::Flat);
        assert_eq!(folders, vec![dir.path().to_path_buf()]);
    }
}
