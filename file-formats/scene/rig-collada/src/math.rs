//! Numeric decoding helpers for whitespace-delimited document arrays
//!
//! Scene documents store every array (positions, weights, matrices, face
//! indices) as a flat run of whitespace-separated literals. These helpers
//! decode such runs into `glam` types, failing on the first literal that does
//! not parse instead of substituting zeros.

use crate::error::{ColladaError, Result};
use glam::{Mat4, Quat, Vec2, Vec3};

/// Relative tolerance for determinant checks on bind transforms
///
/// The determinant is compared against the cube of the longest basis
/// column, so uniformly scaled transforms pass at any scale.
pub const SINGULAR_EPSILON: f32 = 1.0e-6;

/// Decode a whitespace-delimited list of finite floats
///
/// `context` names the array in error messages.
pub fn parse_floats(text: &str, context: &str) -> Result<Vec<f32>> {
    text.split_whitespace()
        .map(|literal| match literal.parse::<f32>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(ColladaError::MalformedNumber {
                literal: literal.to_string(),
                context: context.to_string(),
            }),
        })
        .collect()
}

/// Decode a whitespace-delimited list of non-negative integers
pub fn parse_indices(text: &str, context: &str) -> Result<Vec<usize>> {
    text.split_whitespace()
        .map(|literal| {
            literal
                .parse::<usize>()
                .map_err(|_| ColladaError::MalformedNumber {
                    literal: literal.to_string(),
                    context: context.to_string(),
                })
        })
        .collect()
}

/// Split a whitespace-delimited name array
pub fn parse_names(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

fn check_stride(values: &[f32], stride: usize, context: &str) -> Result<()> {
    if values.len() % stride != 0 {
        return Err(ColladaError::ParseError(format!(
            "{context}: {} values is not a multiple of stride {stride}",
            values.len()
        )));
    }
    Ok(())
}

/// Group a flat float list into 3-component vectors
pub fn to_vec3s(values: &[f32], context: &str) -> Result<Vec<Vec3>> {
    check_stride(values, 3, context)?;
    Ok(values
        .chunks_exact(3)
        .map(|c| Vec3::new(c[0], c[1], c[2]))
        .collect())
}

/// Group a flat float list into 2-component vectors
pub fn to_vec2s(values: &[f32], context: &str) -> Result<Vec<Vec2>> {
    check_stride(values, 2, context)?;
    Ok(values.chunks_exact(2).map(|c| Vec2::new(c[0], c[1])).collect())
}

/// Build a matrix from 16 floats stored row by row, as the document does
pub fn mat4_from_row_major(values: &[f32], context: &str) -> Result<Mat4> {
    let array: [f32; 16] = values.try_into().map_err(|_| {
        ColladaError::ParseError(format!(
            "{context}: expected 16 matrix values, found {}",
            values.len()
        ))
    })?;
    Ok(Mat4::from_cols_array(&array).transpose())
}

/// Decode a run of row-major matrices (16 floats each)
pub fn mat4s_from_row_major(values: &[f32], context: &str) -> Result<Vec<Mat4>> {
    check_stride(values, 16, context)?;
    values
        .chunks_exact(16)
        .map(|chunk| mat4_from_row_major(chunk, context))
        .collect()
}

/// Split a rigid transform into its translation and rotation
///
/// Scale is discarded; joint transforms only carry position and rotation.
pub fn decompose(matrix: &Mat4) -> (Vec3, Quat) {
    let (_, rotation, translation) = matrix.to_scale_rotation_translation();
    (translation, rotation.normalize())
}

/// Rotation that maps a Z-up document into a Y-up frame
pub fn z_up_correction() -> Mat4 {
    Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2)
}

/// Whether `matrix` can be inverted without producing non-finite values
pub fn is_invertible(matrix: &Mat4) -> bool {
    let det = matrix.determinant();
    let scale = [matrix.x_axis, matrix.y_axis, matrix.z_axis]
        .iter()
        .map(|column| column.truncate().length())
        .fold(0.0f32, f32::max);
    det.is_finite() && scale > 0.0 && det.abs() > SINGULAR_EPSILON * scale.powi(3)
}
