//! Intermediate raster used by format conversion
//!
//! Source bytes are decoded into an [`ImageData`] holding one of three
//! colour models at full resolution. Cropping, edge replication and colour
//! model changes happen here; the byte layouts live in `convert`.

use crate::error::try_filled;
use crate::{Error, Result};

/// Per-pixel samples in one colour model
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Samples {
    Luma(Vec<u8>),
    Rgb(Vec<[u8; 3]>),
    /// Full-range YCbCr, one chroma pair per pixel
    Yuv(Vec<[u8; 3]>),
}

/// Colour model a format reads or writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Model {
    Luma,
    Rgb,
    Yuv,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImageData {
    pub width: u32,
    pub height: u32,
    pub samples: Samples,
}

impl ImageData {
    pub(crate) fn model(&self) -> Model {
        match self.samples {
            Samples::Luma(_) => Model::Luma,
            Samples::Rgb(_) => Model::Rgb,
            Samples::Yuv(_) => Model::Yuv,
        }
    }

    /// Crop or pad to a new size.
    ///
    /// Rows and columns past the new size are dropped from the bottom/right
    /// edge. Added rows and columns repeat the last source row/column; no
    /// scaling or interpolation takes place.
    pub(crate) fn resize(self, width: u32, height: u32) -> Result<Self> {
        if width == self.width && height == self.height {
            return Ok(self);
        }
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidArgument(format!(
                "cannot resize an empty {}x{} image to {width}x{height}",
                self.width, self.height
            )));
        }
        let (sw, sh) = (self.width, self.height);
        let samples = match self.samples {
            Samples::Luma(px) => Samples::Luma(replicate_edges(&px, sw, sh, width, height)?),
            Samples::Rgb(px) => Samples::Rgb(replicate_edges(&px, sw, sh, width, height)?),
            Samples::Yuv(px) => Samples::Yuv(replicate_edges(&px, sw, sh, width, height)?),
        };
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// Change colour model.
    ///
    /// Luma is kept exactly when moving between luma-only and YCbCr; chroma
    /// is filled with `chroma_fill` when widening.
    pub(crate) fn into_model(self, model: Model, chroma_fill: u8) -> Self {
        let samples = match (self.samples, model) {
            (s @ Samples::Luma(_), Model::Luma)
            | (s @ Samples::Rgb(_), Model::Rgb)
            | (s @ Samples::Yuv(_), Model::Yuv) => s,
            (Samples::Luma(px), Model::Rgb) => Samples::Rgb(px.into_iter().map(|l| [l; 3]).collect()),
            (Samples::Luma(px), Model::Yuv) => Samples::Yuv(
                px.into_iter()
                    .map(|l| [l, chroma_fill, chroma_fill])
                    .collect(),
            ),
            (Samples::Rgb(px), Model::Luma) => Samples::Luma(px.into_iter().map(rgb_to_luma).collect()),
            (Samples::Rgb(px), Model::Yuv) => Samples::Yuv(px.into_iter().map(rgb_to_ycbcr).collect()),
            (Samples::Yuv(px), Model::Luma) => Samples::Luma(px.into_iter().map(|p| p[0]).collect()),
            (Samples::Yuv(px), Model::Rgb) => Samples::Rgb(px.into_iter().map(ycbcr_to_rgb).collect()),
        };
        Self {
            width: self.width,
            height: self.height,
            samples,
        }
    }
}

fn replicate_edges<T: Copy + Default>(
    src: &[T],
    sw: u32,
    sh: u32,
    dw: u32,
    dh: u32,
) -> Result<Vec<T>> {
    let (sw, sh, dw, dh) = (sw as usize, sh as usize, dw as usize, dh as usize);
    let mut dst = try_filled(dw.saturating_mul(dh), T::default())?;
    if dw == 0 {
        return Ok(dst);
    }
    for (y, row) in dst.chunks_exact_mut(dw).enumerate() {
        let src_row = &src[y.min(sh - 1) * sw..][..sw];
        let copied = dw.min(sw);
        row[..copied].copy_from_slice(&src_row[..copied]);
        let edge = src_row[sw - 1];
        row[copied..].fill(edge);
    }
    Ok(dst)
}

// BT.601 full-range coefficients in Q16 fixed point.
const Q16_HALF: i32 = 1 << 15;

/// Luma from RGB: `(77 R + 150 G + 29 B + 128) >> 8`
pub(crate) fn rgb_to_luma([r, g, b]: [u8; 3]) -> u8 {
    ((77 * u32::from(r) + 150 * u32::from(g) + 29 * u32::from(b) + 128) >> 8) as u8
}

pub(crate) fn rgb_to_ycbcr([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let y = (19595 * r + 38470 * g + 7471 * b + Q16_HALF) >> 16;
    let cb = ((-11059 * r - 21709 * g + 32768 * b + Q16_HALF) >> 16) + 128;
    let cr = ((32768 * r - 27439 * g - 5329 * b + Q16_HALF) >> 16) + 128;
    [clamp(y), clamp(cb), clamp(cr)]
}

pub(crate) fn ycbcr_to_rgb([y, cb, cr]: [u8; 3]) -> [u8; 3] {
    let y = i32::from(y);
    let cb = i32::from(cb) - 128;
    let cr = i32::from(cr) - 128;
    let r = y + ((91881 * cr + Q16_HALF) >> 16);
    let g = y + ((-22554 * cb - 46802 * cr + Q16_HALF) >> 16);
    let b = y + ((116130 * cb + Q16_HALF) >> 16);
    [clamp(r), clamp(g), clamp(b)]
}

fn clamp(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}
