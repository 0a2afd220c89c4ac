//! Camera calibration loaded from plain-text matrix files.
//!
//! Both files use the layout written by common calibration tools: one matrix
//! row per line, values separated by whitespace, `#` starting a comment line.
//! The camera matrix must be 3×3; the distortion file holds a single row or a
//! single column of at least four coefficients.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use nalgebra::{Matrix3, Point2};

use crate::camera::{CameraIntrinsics, RadialTangentialDistortion, UndistortConfig};

#[derive(thiserror::Error, Debug)]
pub enum CalibrationError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: invalid number {token:?}")]
    Parse {
        path: PathBuf,
        line: usize,
        token: String,
    },
    #[error("{path}: rows have different lengths")]
    Ragged { path: PathBuf },
    #[error("{what} must be {expected}, got {rows}x{cols}")]
    Shape {
        what: &'static str,
        expected: &'static str,
        rows: usize,
        cols: usize,
    },
    #[error("camera matrix is not a valid pinhole model")]
    InvalidIntrinsics,
}

/// Parse a whitespace-delimited, row-major matrix.
///
/// `path` is only used for error messages.
pub fn parse_matrix_text(raw: &str, path: &Path) -> Result<Vec<Vec<f64>>, CalibrationError> {
    let mut rows = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .map(|t| {
                t.parse::<f64>().map_err(|_| CalibrationError::Parse {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    token: t.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }
    if let Some(first) = rows.first() {
        if rows.iter().any(|r| r.len() != first.len()) {
            return Err(CalibrationError::Ragged {
                path: path.to_path_buf(),
            });
        }
    }
    Ok(rows)
}

/// Read and parse a matrix file.
pub fn load_matrix_text(path: impl AsRef<Path>) -> Result<Vec<Vec<f64>>, CalibrationError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| CalibrationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_matrix_text(&raw, path)
}

fn shape(rows: &[Vec<f64>]) -> (usize, usize) {
    (rows.len(), rows.first().map_or(0, Vec::len))
}

/// Camera intrinsics and lens distortion, immutable once loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct CalibrationData {
    camera_matrix: Matrix3<f64>,
    distortion: RadialTangentialDistortion,
    intrinsics: CameraIntrinsics,
}

impl CalibrationData {
    pub fn new(
        camera_matrix: Matrix3<f64>,
        distortion: RadialTangentialDistortion,
    ) -> Result<Self, CalibrationError> {
        let scale = camera_matrix[(2, 2)];
        if !scale.is_finite() || scale.abs() < 1e-12 {
            return Err(CalibrationError::InvalidIntrinsics);
        }
        let k = camera_matrix / scale;
        let intrinsics = CameraIntrinsics {
            fx: k[(0, 0)],
            fy: k[(1, 1)],
            cx: k[(0, 2)],
            cy: k[(1, 2)],
            skew: k[(0, 1)],
        };
        if !intrinsics.is_valid() {
            return Err(CalibrationError::InvalidIntrinsics);
        }
        Ok(Self {
            camera_matrix: k,
            distortion,
            intrinsics,
        })
    }

    /// Build from parsed matrices (`K` as 3×3, distortion as one row or column).
    pub fn from_rows(k_rows: &[Vec<f64>], dist_rows: &[Vec<f64>]) -> Result<Self, CalibrationError> {
        let (rows, cols) = shape(k_rows);
        if rows != 3 || cols != 3 {
            return Err(CalibrationError::Shape {
                what: "camera matrix",
                expected: "3x3",
                rows,
                cols,
            });
        }
        let flat: Vec<f64> = k_rows.iter().flatten().copied().collect();
        let camera_matrix = Matrix3::from_row_slice(&flat);

        let (rows, cols) = shape(dist_rows);
        let coeffs: Vec<f64> = if rows == 1 || cols == 1 {
            dist_rows.iter().flatten().copied().collect()
        } else {
            Vec::new()
        };
        let distortion = RadialTangentialDistortion::from_coefficients(&coeffs).ok_or(
            CalibrationError::Shape {
                what: "distortion coefficients",
                expected: "a vector of at least 4 values",
                rows,
                cols,
            },
        )?;
        if coeffs.len() > 5 {
            debug!(
                "ignoring {} distortion coefficients past k3",
                coeffs.len() - 5
            );
        }

        Self::new(camera_matrix, distortion)
    }

    /// Load both calibration files. Any failure here is fatal for a session.
    pub fn load(
        camera_matrix_path: impl AsRef<Path>,
        distortion_path: impl AsRef<Path>,
    ) -> Result<Self, CalibrationError> {
        let k_rows = load_matrix_text(camera_matrix_path)?;
        let dist_rows = load_matrix_text(distortion_path)?;
        Self::from_rows(&k_rows, &dist_rows)
    }

    pub fn camera_matrix(&self) -> &Matrix3<f64> {
        &self.camera_matrix
    }

    pub fn distortion(&self) -> &RadialTangentialDistortion {
        &self.distortion
    }

    pub fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    /// Map a distorted image pixel to undistorted normalized coordinates.
    pub fn undistort_to_normalized(&self, pixel: Point2<f64>) -> Option<Point2<f64>> {
        let distorted = self.intrinsics.pixel_to_normalized(pixel)?;
        self.distortion
            .undistort(distorted, UndistortConfig::default())
    }
}
