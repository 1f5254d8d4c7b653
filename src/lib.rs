//! # DICOM-compare library
//!
//! This crate serves a high-level API for loading multiple DICOM series
//! side by side and measuring them.
//!
//! This library is part of the dicom-rs ecosystem and leverages its
//! components to represent each input folder as an ordered stack of
//! slices. Every slice is held twice: as raw physical intensities
//! (Hounsfield Units, `pixel * RescaleSlope + RescaleIntercept`) and as an
//! 8-bit display rendition derived from them. ROI statistics are always
//! computed against the physical values, so display quantization never
//! leaks into measurements.
//!
//! Display renditions are produced under one of two contrast policies:
//!  - Independent: each frame is scaled by its own minimum and maximum
//!  - Matched: every frame shares the window of the globally
//!    narrowest-range frame, so intensities are comparable across series
//!
//! Input folders may be flat (the folder itself is one acquisition) or
//! grouped (several sub-folders, one active at a time); the active
//! sub-folder of a series can be switched without disturbing the others.
//! Measurement history can be exported as a CSV spreadsheet and the
//! current view as PNG snapshots.
//!
//! # Examples
//!
//! Load two folders, read the ROI statistics of a 10x10 region on the
//! first slice of the first series, then render that slice as PNG:
//!
//! ```no_run
//! use std::path::PathBuf;
//!
//! use dicom_compare::roi::RoiRect;
//! use dicom_compare::session::Session;
//!
//! let session = Session::load(&[PathBuf::from("scans/a"), PathBuf::from("scans/b")])
//!     .expect("should have loaded the given folders");
//! let stats = session.roi_stats(0, 0, RoiRect::new(230, 180, 10, 10));
//! println!("mean {:.2} std {:.2}", stats.mean, stats.std);
//! let png = session
//!     .png_slice(0, 0)
//!     .expect("should have rendered the first slice");
//! std::fs::write("slice.png", png).expect("should have written the PNG");
//! ```

pub mod decoder;
pub mod enums;
pub mod export;
pub mod normalizer;
pub mod render;
pub mod roi;
pub mod series;
pub mod series_loader;
pub mod session;
