/// Classification of a top-level input folder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FolderKind {
    /// The folder itself holds the image files of a single acquisition.
    Flat,
    /// The folder holds several sub-folders, each with its own image set,
    /// of which one is active at a time.
    Grouped,
}
