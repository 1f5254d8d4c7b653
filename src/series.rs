use std::path::{Path, PathBuf};

use ndarray::Array2;

use crate::enums::FolderKind;

/// One image slice: the physical intensity grid, its 8-bit display
/// counterpart and the originating file name.
///
/// The display grid is derived from the physical grid and is never the
/// source of truth for statistics.
#[derive(Debug, Clone)]
pub struct Slice {
    pub physical: Array2<f32>,
    pub display: Array2<u8>,
    pub basename: String,
}

/// An ordered stack of slices from one acquisition, together with the
/// candidate folders it can be reloaded from.
#[derive(Debug, Clone)]
pub struct Series {
    slices: Vec<Slice>,
    /// Candidate source folders; never empty (a flat series lists its own
    /// folder as the single candidate).
    folders: Vec<PathBuf>,
    active_folder: usize,
    kind: FolderKind,
}

impl Series {
    pub(crate) fn new(
        slices: Vec<Slice>,
        folders: Vec<PathBuf>,
        active_folder: usize,
        kind: FolderKind,
    ) -> Self {
        Self {
            slices,
            folders,
            active_folder,
            kind,
        }
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Largest valid slice index, -1 when the series is empty.
    pub fn max_index(&self) -> isize {
        self.slices.len() as isize - 1
    }

    pub fn slice(&self, index: usize) -> Option<&Slice> {
        self.slices.get(index)
    }

    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    pub fn folders(&self) -> &[PathBuf] {
        &self.folders
    }

    pub fn active_folder(&self) -> usize {
        self.active_folder
    }

    pub fn active_folder_path(&self) -> &Path {
        &self.folders[self.active_folder]
    }

    pub fn kind(&self) -> FolderKind {
        self.kind
    }

    /// Dimensions (rows, columns) of the first frame, if any.
    pub fn first_shape(&self) -> Option<(usize, usize)> {
        self.slices.first().map(|slice| slice.physical.dim())
    }

    /// Replace the whole slice stack, e.g. after a folder switch.
    pub(crate) fn replace(&mut self, slices: Vec<Slice>, active_folder: usize) {
        self.slices = slices;
        self.active_folder = active_folder;
    }
}
