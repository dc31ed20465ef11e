//! Conversion configuration
//!
//! [`ConvertConfig`] is a small builder that controls the policy choices of
//! the conversion engine. The defaults are what [`Image::convert`] uses.
//!
//! ```
//! use zedbar_image::{ConvertConfig, UnknownFormatPolicy};
//!
//! let config = ConvertConfig::new()
//!     .unknown_formats(UnknownFormatPolicy::AssumeRgb3)
//!     .padding_byte(0x00);
//! assert_eq!(config.unknown_format_policy(), UnknownFormatPolicy::AssumeRgb3);
//! ```
//!
//! [`Image::convert`]: crate::Image::convert

/// What to do when the source image carries a tag the format table lacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownFormatPolicy {
    /// Fail with [`Error::Conversion`](crate::Error::Conversion)
    #[default]
    Strict,
    /// Read the source bytes as packed RGB24 (`RGB3`)
    AssumeRgb3,
}

/// Policy knobs for [`Image::convert_with`](crate::Image::convert_with)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
    pub(crate) unknown_formats: UnknownFormatPolicy,
    pub(crate) chroma_fill: u8,
    pub(crate) padding_byte: u8,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ConvertConfig {
    /// Strict unknown-format handling, neutral chroma, opaque padding
    pub fn new() -> Self {
        Self {
            unknown_formats: UnknownFormatPolicy::Strict,
            chroma_fill: 0x80,
            padding_byte: 0xff,
        }
    }

    /// Select how unmapped source tags are treated
    ///
    /// Only the source side is affected. An unmapped target tag always fails
    /// because there is no layout to write.
    pub fn unknown_formats(mut self, policy: UnknownFormatPolicy) -> Self {
        self.unknown_formats = policy;
        self
    }

    /// Chroma value written when luma-only data is widened into YUV
    pub fn chroma_fill(mut self, value: u8) -> Self {
        self.chroma_fill = value;
        self
    }

    /// Value written into the fourth byte of 32-bit RGB formats
    pub fn padding_byte(mut self, value: u8) -> Self {
        self.padding_byte = value;
        self
    }

    pub fn unknown_format_policy(&self) -> UnknownFormatPolicy {
        self.unknown_formats
    }
}
