use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{VeneerError, VeneerResult};

/// Decoded instance mask: one coverage byte per pixel, row-major.
///
/// The mask is stretched over its owning overlay's box; coverage `0` is outside the instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedMask {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Coverage bytes, `width * height` long.
    pub coverage: Arc<Vec<u8>>,
}

impl PreparedMask {
    /// Wrap raw coverage bytes, validating the buffer length.
    pub fn from_raw(width: u32, height: u32, coverage: Vec<u8>) -> VeneerResult<Self> {
        if width == 0 || height == 0 {
            return Err(VeneerError::decode("mask dimensions must be non-zero"));
        }
        let expected = (width as usize).saturating_mul(height as usize);
        if coverage.len() != expected {
            return Err(VeneerError::decode(format!(
                "mask buffer holds {} bytes, expected {expected}",
                coverage.len()
            )));
        }
        Ok(Self {
            width,
            height,
            coverage: Arc::new(coverage),
        })
    }

    /// Coverage sampled at normalized coordinates `u, v` in `[0, 1]`.
    ///
    /// Out-of-range coordinates sample as `0`.
    pub fn sample(&self, u: f64, v: f64) -> u8 {
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return 0;
        }
        let x = ((u * f64::from(self.width)) as u32).min(self.width - 1);
        let y = ((v * f64::from(self.height)) as u32).min(self.height - 1);
        self.coverage[(y as usize) * (self.width as usize) + x as usize]
    }

    /// Number of bytes held by the decoded bitmap.
    pub fn byte_len(&self) -> usize {
        self.coverage.len()
    }
}

/// Decode encoded image bytes (PNG, etc.) into a coverage mask.
///
/// Luma is used as coverage; fully transparent pixels are forced to `0`.
pub fn decode_mask(bytes: &[u8]) -> VeneerResult<PreparedMask> {
    let dyn_img = image::load_from_memory(bytes).context("decode mask from memory")?;
    let luma_alpha = dyn_img.to_luma_alpha8();
    let (width, height) = luma_alpha.dimensions();

    let coverage = luma_alpha
        .into_raw()
        .chunks_exact(2)
        .map(|px| if px[1] == 0 { 0 } else { px[0] })
        .collect();

    PreparedMask::from_raw(width, height, coverage)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
