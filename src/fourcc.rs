//! Four-character format codes and the sample layout table
//!
//! A format tag is four single-byte characters packed little-endian into a
//! `u32`, so `"Y800"` becomes `b'Y' | b'8' << 8 | b'0' << 16 | b'0' << 24`.
//! Only the tags listed in [`FORMATS`] can take part in a conversion; other
//! tags are still valid image metadata.

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A packed four-character format code
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct FourCc(u32);

impl FourCc {
    /// 8-bit grayscale
    pub const Y800: Self = Self::new(b'Y', b'8', b'0', b'0');
    /// Same as Y800
    pub const GREY: Self = Self::new(b'G', b'R', b'E', b'Y');
    /// Same as Y800
    pub const Y8: Self = Self::new(b'Y', b'8', b' ', b' ');
    /// 16-bit little-endian grayscale
    pub const Y16: Self = Self::new(b'Y', b'1', b'6', b' ');
    /// Packed 24-bit R, G, B
    pub const RGB3: Self = Self::new(b'R', b'G', b'B', b'3');
    /// Packed 24-bit B, G, R
    pub const BGR3: Self = Self::new(b'B', b'G', b'R', b'3');
    /// Packed 32-bit R, G, B, padding
    pub const RGB4: Self = Self::new(b'R', b'G', b'B', b'4');
    /// Packed 32-bit B, G, R, padding
    pub const BGR4: Self = Self::new(b'B', b'G', b'R', b'4');
    /// Packed 32-bit B, G, R, alpha
    pub const BA24: Self = Self::new(b'B', b'A', b'2', b'4');
    /// 16-bit little-endian RGB 5:6:5
    pub const RGBP: Self = Self::new(b'R', b'G', b'B', b'P');
    /// 16-bit little-endian RGB 5:5:5
    pub const RGBO: Self = Self::new(b'R', b'G', b'B', b'O');
    /// 16-bit little-endian ARGB 1:5:5:5
    pub const AR15: Self = Self::new(b'A', b'R', b'1', b'5');
    /// 48-bit RGB (named, not convertible)
    pub const RGB0: Self = Self::new(b'R', b'G', b'B', b'0');
    /// 64-bit ARGB (named, not convertible)
    pub const B64A: Self = Self::new(b'b', b'6', b'4', b'a');
    /// Planar YUV 4:2:0, U plane before V
    pub const I420: Self = Self::new(b'I', b'4', b'2', b'0');
    /// Same as I420
    pub const YU12: Self = Self::new(b'Y', b'U', b'1', b'2');
    /// Planar YUV 4:2:0, V plane before U
    pub const YV12: Self = Self::new(b'Y', b'V', b'1', b'2');
    /// Y plane followed by interleaved U, V at 4:2:0
    pub const NV12: Self = Self::new(b'N', b'V', b'1', b'2');
    /// Y plane followed by interleaved V, U at 4:2:0
    pub const NV21: Self = Self::new(b'N', b'V', b'2', b'1');
    /// Packed YUV 4:2:2 as Y0 U Y1 V
    pub const YUYV: Self = Self::new(b'Y', b'U', b'Y', b'V');
    /// Same as YUYV
    pub const YUY2: Self = Self::new(b'Y', b'U', b'Y', b'2');
    /// Packed YUV 4:2:2 as U Y0 V Y1
    pub const UYVY: Self = Self::new(b'U', b'Y', b'V', b'Y');
    /// Planar YUV 4:2:2
    pub const P422: Self = Self::new(b'4', b'2', b'2', b'P');

    /// Create a fourcc code from 4 bytes
    pub const fn new(a: u8, b: u8, c: u8, d: u8) -> Self {
        Self((a as u32) | ((b as u32) << 8) | ((c as u32) << 16) | ((d as u32) << 24))
    }

    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    pub const fn to_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Look up the sample layout for this tag
    pub fn info(self) -> Option<FormatInfo> {
        FORMATS.iter().copied().find(|f| f.fourcc == self)
    }
}

impl From<u32> for FourCc {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<FourCc> for u32 {
    fn from(value: FourCc) -> Self {
        value.0
    }
}

impl FromStr for FourCc {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut bytes = [0u8; 4];
        let mut chars = s.chars();
        for slot in &mut bytes {
            let c = chars.next().ok_or_else(|| Error::InvalidFourCc(s.to_string()))?;
            *slot = u8::try_from(u32::from(c)).map_err(|_| Error::InvalidFourCc(s.to_string()))?;
        }
        if chars.next().is_some() {
            return Err(Error::InvalidFourCc(s.to_string()));
        }
        Ok(Self::from_bytes(bytes))
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.to_bytes() {
            let c = if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc(\"{self}\")")
    }
}

/// Channel placement for packed RGB formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RgbLayout {
    /// One byte per channel at the given offsets within a `bytes`-wide pixel.
    /// A fourth byte, when present, is padding.
    Bytes { bytes: u8, r: u8, g: u8, b: u8 },
    /// 16-bit little-endian word; channels are `(shift, width)` bit fields,
    /// `fill` is OR-ed into every written word.
    Word16 {
        r: (u8, u8),
        g: (u8, u8),
        b: (u8, u8),
        fill: u16,
    },
}

/// Where the chroma samples of a planar YUV format live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromaPlanes {
    /// Two separate planes
    Separate { v_first: bool },
    /// One plane of interleaved pairs
    Interleaved { v_first: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    /// Luma only; `bytes` per sample, little-endian, high byte significant
    Gray { bytes: u8 },
    Rgb(RgbLayout),
    /// Full Y plane followed by subsampled chroma
    YuvPlanar {
        x_shift: u8,
        y_shift: u8,
        chroma: ChromaPlanes,
    },
    /// 4:2:2 macropixels of four bytes; offsets of each component
    YuvPacked { y0: u8, u: u8, y1: u8, v: u8 },
}

/// Layout description of one convertible format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    pub fourcc: FourCc,
    pub kind: FormatKind,
}

const fn gray(fourcc: FourCc, bytes: u8) -> FormatInfo {
    FormatInfo {
        fourcc,
        kind: FormatKind::Gray { bytes },
    }
}

const fn rgb_bytes(fourcc: FourCc, bytes: u8, r: u8, g: u8, b: u8) -> FormatInfo {
    FormatInfo {
        fourcc,
        kind: FormatKind::Rgb(RgbLayout::Bytes { bytes, r, g, b }),
    }
}

const fn rgb_word(fourcc: FourCc, r: (u8, u8), g: (u8, u8), b: (u8, u8), fill: u16) -> FormatInfo {
    FormatInfo {
        fourcc,
        kind: FormatKind::Rgb(RgbLayout::Word16 { r, g, b, fill }),
    }
}

const fn planar(fourcc: FourCc, x_shift: u8, y_shift: u8, chroma: ChromaPlanes) -> FormatInfo {
    FormatInfo {
        fourcc,
        kind: FormatKind::YuvPlanar {
            x_shift,
            y_shift,
            chroma,
        },
    }
}

const fn packed(fourcc: FourCc, y0: u8, u: u8, y1: u8, v: u8) -> FormatInfo {
    FormatInfo {
        fourcc,
        kind: FormatKind::YuvPacked { y0, u, y1, v },
    }
}

/// Every format the conversion engine can read and write
pub const FORMATS: &[FormatInfo] = &[
    gray(FourCc::Y800, 1),
    gray(FourCc::GREY, 1),
    gray(FourCc::Y8, 1),
    gray(FourCc::Y16, 2),
    rgb_bytes(FourCc::RGB3, 3, 0, 1, 2),
    rgb_bytes(FourCc::BGR3, 3, 2, 1, 0),
    rgb_bytes(FourCc::RGB4, 4, 0, 1, 2),
    rgb_bytes(FourCc::BGR4, 4, 2, 1, 0),
    rgb_bytes(FourCc::BA24, 4, 2, 1, 0),
    rgb_word(FourCc::RGBP, (11, 5), (5, 6), (0, 5), 0),
    rgb_word(FourCc::RGBO, (10, 5), (5, 5), (0, 5), 0),
    rgb_word(FourCc::AR15, (10, 5), (5, 5), (0, 5), 0x8000),
    planar(FourCc::I420, 1, 1, ChromaPlanes::Separate { v_first: false }),
    planar(FourCc::YU12, 1, 1, ChromaPlanes::Separate { v_first: false }),
    planar(FourCc::YV12, 1, 1, ChromaPlanes::Separate { v_first: true }),
    planar(FourCc::NV12, 1, 1, ChromaPlanes::Interleaved { v_first: false }),
    planar(FourCc::NV21, 1, 1, ChromaPlanes::Interleaved { v_first: true }),
    planar(FourCc::P422, 1, 0, ChromaPlanes::Separate { v_first: false }),
    packed(FourCc::YUYV, 0, 1, 2, 3),
    packed(FourCc::YUY2, 0, 1, 2, 3),
    packed(FourCc::UYVY, 1, 0, 3, 2),
];

impl FormatInfo {
    /// Horizontal and vertical chroma subsampling as power-of-two shifts
    pub fn chroma_shift(&self) -> (u32, u32) {
        match self.kind {
            FormatKind::YuvPlanar {
                x_shift, y_shift, ..
            } => (u32::from(x_shift), u32::from(y_shift)),
            FormatKind::YuvPacked { .. } => (1, 0),
            FormatKind::Gray { .. } | FormatKind::Rgb(_) => (0, 0),
        }
    }

    pub fn bits_per_pixel(&self) -> u32 {
        match self.kind {
            FormatKind::Gray { bytes } => u32::from(bytes) * 8,
            FormatKind::Rgb(RgbLayout::Bytes { bytes, .. }) => u32::from(bytes) * 8,
            FormatKind::Rgb(RgbLayout::Word16 { .. }) => 16,
            FormatKind::YuvPlanar {
                x_shift, y_shift, ..
            } => 8 + 16 / (1 << (x_shift + y_shift)),
            FormatKind::YuvPacked { .. } => 16,
        }
    }

    /// Round a size up to what the chroma subsampling can represent
    ///
    /// `None` when the rounded size no longer fits in a `u32`.
    pub fn align_size(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        let (xs, ys) = self.chroma_shift();
        Some((round_up(width, xs)?, round_up(height, ys)?))
    }

    /// Number of bytes an image of this format occupies at the given size
    ///
    /// `None` when the size cannot be addressed on this platform.
    pub fn data_len(&self, width: u32, height: u32) -> Option<usize> {
        let (w, h) = self.align_size(width, height)?;
        let (w, h) = (u64::from(w), u64::from(h));
        let pixels = w.checked_mul(h)?;
        let len = match self.kind {
            FormatKind::Gray { bytes } => pixels.checked_mul(u64::from(bytes))?,
            FormatKind::Rgb(RgbLayout::Bytes { bytes, .. }) => pixels.checked_mul(u64::from(bytes))?,
            FormatKind::Rgb(RgbLayout::Word16 { .. }) | FormatKind::YuvPacked { .. } => {
                pixels.checked_mul(2)?
            }
            FormatKind::YuvPlanar {
                x_shift, y_shift, ..
            } => ((w >> x_shift) * (h >> y_shift))
                .checked_mul(2)?
                .checked_add(pixels)?,
        };
        usize::try_from(len).ok()
    }
}

fn round_up(value: u32, shift: u32) -> Option<u32> {
    let mask = (1u32 << shift) - 1;
    Some(value.checked_add(mask)? & !mask)
}
