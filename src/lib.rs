//! Image buffers and scan results for barcode readers
//!
//! This crate holds the parts of a barcode reader that sit around the
//! decoders: an [`Image`] with shared, reference-counted sample data tagged
//! by a [`FourCc`] format code, conversion between gray, RGB and YUV
//! layouts, and the [`Symbol`] results a [`Scanner`] attaches to an image.
//!
//! ```
//! use zedbar_image::{FourCc, Image};
//!
//! let gray = Image::from_gray(&[0, 64, 128, 255, 1, 2, 3, 4], 4, 2).unwrap();
//! let rgb = gray.convert(FourCc::RGB3).unwrap();
//! assert_eq!(rgb.size(), (4, 2));
//! assert_eq!(&rgb.data().unwrap()[..6], &[0, 0, 0, 64, 64, 64]);
//! ```

pub mod bitmap;
pub mod buffer;
pub mod config;
mod convert;
pub mod error;
pub mod fourcc;
pub mod image;
mod image_data;
pub mod scanner;
pub mod symbol;
pub mod xml;

#[cfg(feature = "wasm")]
pub mod wasm;

#[cfg(test)]
mod proptest_convert;

// Re-export main types
pub use bitmap::{pixel_format_fourcc, BitmapFormat, RowOrder};
pub use buffer::{Release, SampleBuffer};
pub use config::{ConvertConfig, UnknownFormatPolicy};
pub use error::{ConversionFailure, Error, Result};
pub use fourcc::{FormatInfo, FormatKind, FourCc};
pub use image::Image;
pub use scanner::{RawSymbol, Scanner, SymbolChain};
pub use symbol::{Addon, CacheState, Point, Symbol, SymbolSet, SymbolType, Symbology};
pub use xml::{SymbolFormatter, XmlFormatter};
