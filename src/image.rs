//! Image handling and format support
//!
//! An [`Image`] is metadata (size, format tag, sequence number, user data)
//! plus an optional [`SampleBuffer`] and the results of the last scan.
//! Metadata setters never touch the bytes: changing the size or format only
//! changes how existing bytes are read.

use crate::buffer::SampleBuffer;
use crate::config::ConvertConfig;
use crate::convert::{self, Frame};
use crate::fourcc::FourCc;
use crate::scanner::{RawSymbol, SymbolChain};
use crate::symbol::SymbolSet;
use crate::{Error, Result};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque caller data attached to an image
pub type UserData = Arc<dyn Any + Send + Sync>;

/// An image containing barcode data
#[derive(Default)]
pub struct Image {
    width: u32,
    height: u32,
    format: FourCc,
    sequence: u32,
    buffer: Option<SampleBuffer>,
    results: Option<Arc<SymbolChain>>,
    user_data: Option<UserData>,
}

impl Image {
    /// Create a new empty image
    ///
    /// Size, format and sequence are zero and no data is bound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an image that takes ownership of `data`
    pub fn from_vec(data: Vec<u8>, width: u32, height: u32, format: FourCc) -> Result<Self> {
        Self::bound(SampleBuffer::from_vec(data), width, height, format)
    }

    /// Create an image from a copy of `data`
    pub fn from_slice(data: &[u8], width: u32, height: u32, format: FourCc) -> Result<Self> {
        let mut owned = crate::error::try_filled(data.len(), 0)?;
        owned.copy_from_slice(data);
        Self::from_vec(owned, width, height, format)
    }

    /// Create an image over bytes the engine must never free
    pub fn from_static(data: &'static [u8], width: u32, height: u32, format: FourCc) -> Result<Self> {
        Self::bound(SampleBuffer::from_static(data), width, height, format)
    }

    /// Create an image that hands `data` to `cleanup` once no handle needs it
    pub fn with_cleanup<F>(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: FourCc,
        cleanup: F,
    ) -> Result<Self>
    where
        F: FnOnce(Vec<u8>) + Send + Sync + 'static,
    {
        Self::bound(SampleBuffer::with_cleanup(data, cleanup), width, height, format)
    }

    /// Create an image from 8-bit grayscale data
    pub fn from_gray(data: &[u8], width: u32, height: u32) -> Result<Self> {
        if (data.len() as u64) != (width as u64) * (height as u64) {
            return Err(Error::InvalidArgument(format!(
                "grayscale data of {} bytes does not match {width}x{height}",
                data.len()
            )));
        }
        Self::from_slice(data, width, height, FourCc::Y800)
    }

    /// Create an image over an existing shared buffer
    pub fn from_buffer(buffer: SampleBuffer, width: u32, height: u32, format: FourCc) -> Result<Self> {
        Self::bound(buffer, width, height, format)
    }

    fn bound(buffer: SampleBuffer, width: u32, height: u32, format: FourCc) -> Result<Self> {
        if (width == 0 || height == 0) && !buffer.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "{width}x{height} image cannot hold {} bytes of data",
                buffer.len()
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            buffer: Some(buffer),
            ..Self::default()
        })
    }

    /// Get the image width
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the image height
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Set the width; the data is not touched
    pub fn set_width(&mut self, width: u32) {
        self.width = width;
    }

    /// Set the height; the data is not touched
    pub fn set_height(&mut self, height: u32) {
        self.height = height;
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Get the image format
    pub fn format(&self) -> FourCc {
        self.format
    }

    /// Declare how the data is laid out; no conversion takes place
    pub fn set_format(&mut self, format: FourCc) {
        self.format = format;
    }

    /// Page or frame number assigned by the caller
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn set_sequence(&mut self, sequence: u32) {
        self.sequence = sequence;
    }

    pub fn user_data(&self) -> Option<&UserData> {
        self.user_data.as_ref()
    }

    pub fn set_user_data(&mut self, user_data: Option<UserData>) {
        self.user_data = user_data;
    }

    pub fn is_bound(&self) -> bool {
        self.buffer.is_some()
    }

    /// Get access to the raw image data
    pub fn data(&self) -> Result<&[u8]> {
        self.buffer
            .as_ref()
            .map(SampleBuffer::as_slice)
            .ok_or(Error::NullResult)
    }

    /// Length of the bound data, 0 when unbound
    pub fn data_len(&self) -> usize {
        self.buffer.as_ref().map_or(0, SampleBuffer::len)
    }

    pub fn buffer(&self) -> Option<&SampleBuffer> {
        self.buffer.as_ref()
    }

    /// Bind new heap data, releasing this handle's reference to the old one
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.set_buffer(SampleBuffer::from_vec(data));
    }

    /// Bind a shared buffer, releasing this handle's reference to the old one
    pub fn set_buffer(&mut self, buffer: SampleBuffer) {
        self.buffer = Some(buffer);
    }

    /// Release this handle's reference to the data and become unbound
    pub fn free_data(&mut self) {
        self.buffer = None;
    }

    /// Number of handles currently sharing this image's data
    pub fn ref_count(&self) -> usize {
        self.buffer.as_ref().map_or(0, SampleBuffer::ref_count)
    }

    /// Create a second handle to the same data and results
    ///
    /// Metadata is copied, so later size or format changes on one handle do
    /// not show through the other.
    pub fn retain(&self) -> Image {
        Image {
            width: self.width,
            height: self.height,
            format: self.format,
            sequence: self.sequence,
            buffer: self.buffer.clone(),
            results: self.results.clone(),
            user_data: self.user_data.clone(),
        }
    }

    /// Drop this handle; the data is freed if it was the last one
    pub fn release(self) {}

    /// Image format conversion
    ///
    /// Returns a new image with the samples of this one in `format`. The
    /// size may be rounded up when the target format subsamples chroma.
    /// This image is not modified.
    pub fn convert(&self, format: FourCc) -> Result<Image> {
        self.convert_resize_with(format, self.width, self.height, &ConvertConfig::default())
    }

    pub fn convert_with(&self, format: FourCc, config: &ConvertConfig) -> Result<Image> {
        self.convert_resize_with(format, self.width, self.height, config)
    }

    /// Convert and crop or pad to a new size
    ///
    /// Extra rows and columns repeat the last source row/column; surplus
    /// ones are cut from the bottom/right edge. Nothing is scaled.
    pub fn convert_resize(&self, format: FourCc, width: u32, height: u32) -> Result<Image> {
        self.convert_resize_with(format, width, height, &ConvertConfig::default())
    }

    pub fn convert_resize_with(
        &self,
        format: FourCc,
        width: u32,
        height: u32,
        config: &ConvertConfig,
    ) -> Result<Image> {
        let data = self.data()?;
        let converted = convert::convert(
            data,
            Frame {
                format: self.format,
                width: self.width,
                height: self.height,
            },
            Frame {
                format,
                width,
                height,
            },
            config,
        )?;
        Ok(Image {
            width: converted.width,
            height: converted.height,
            format,
            sequence: self.sequence,
            buffer: Some(SampleBuffer::from_vec(converted.data)),
            ..Image::default()
        })
    }

    /// Attach scan results, replacing any previous ones
    pub fn set_results(&mut self, results: SymbolChain) {
        self.results = Some(Arc::new(results));
    }

    pub fn clear_results(&mut self) {
        self.results = None;
    }

    /// Head of the raw result chain left by the last scan
    pub fn first_symbol(&self) -> Option<&RawSymbol> {
        self.results.as_deref().and_then(SymbolChain::head)
    }

    /// Get the symbols found in this image (if it has been scanned)
    ///
    /// Each call walks the result chain from its head and copies every
    /// record, so repeated calls yield equal sets.
    pub fn symbols(&self) -> SymbolSet {
        self.results
            .as_deref()
            .map(SymbolSet::from_chain)
            .unwrap_or_default()
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("sequence", &self.sequence)
            .field("buffer", &self.buffer)
            .field("results", &self.results.as_ref().map_or(0, |r| r.len()))
            .field("user_data", &self.user_data.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SymbolType;

    #[test]
    fn test_new_image_is_unbound() {
        let img = Image::new();
        assert_eq!(img.size(), (0, 0));
        assert_eq!(img.format(), FourCc::default());
        assert_eq!(img.sequence(), 0);
        assert!(!img.is_bound());
        assert_eq!(img.data(), Err(Error::NullResult));
        assert_eq!(img.data_len(), 0);
        assert_eq!(img.ref_count(), 0);
    }

    #[test]
    fn test_metadata_setters_leave_data_alone() {
        let mut img = Image::from_vec(vec![1, 2, 3, 4], 2, 2, FourCc::Y800).unwrap();
        img.set_width(4);
        img.set_height(1);
        img.set_format(FourCc::GREY);
        img.set_sequence(42);
        assert_eq!(img.size(), (4, 1));
        assert_eq!(img.format(), FourCc::GREY);
        assert_eq!(img.sequence(), 42);
        assert_eq!(img.data().unwrap(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_zero_size_with_data_is_rejected() {
        assert!(matches!(
            Image::from_vec(vec![1], 0, 1, FourCc::Y800),
            Err(Error::InvalidArgument(_))
        ));
        assert!(Image::from_vec(Vec::new(), 0, 0, FourCc::Y800).is_ok());
    }

    #[test]
    fn test_from_gray_checks_length() {
        assert!(Image::from_gray(&[0; 5], 2, 2).is_err());
        let img = Image::from_gray(&[0; 4], 2, 2).unwrap();
        assert_eq!(img.format(), FourCc::Y800);
    }

    #[test]
    fn test_set_data_rebinds() {
        let mut img = Image::new();
        img.set_size(2, 1);
        img.set_format(FourCc::Y800);
        img.set_data(vec![7, 8]);
        assert_eq!(img.data().unwrap(), &[7, 8]);
        img.free_data();
        assert!(!img.is_bound());
    }

    #[test]
    fn test_convert_leaves_source_untouched() {
        let src = Image::from_gray(&[0, 1, 2, 3, 4, 5, 6, 7], 4, 2).unwrap();
        let rgb = src.convert(FourCc::RGB3).unwrap();
        assert_eq!(rgb.format(), FourCc::RGB3);
        assert_eq!(rgb.data_len(), 24);
        assert_eq!(src.format(), FourCc::Y800);
        assert_eq!(src.data().unwrap(), &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(rgb.ref_count(), 1);
    }

    #[test]
    fn test_convert_with_oversized_metadata_fails() {
        let mut img = Image::from_vec(vec![0; 8], 2, 2, FourCc::Y16).unwrap();
        img.set_size(u32::MAX, u32::MAX);
        assert!(matches!(img.convert(FourCc::RGB3), Err(Error::InvalidArgument(_))));

        let gray = Image::from_gray(&[0; 4], 2, 2).unwrap();
        assert!(matches!(
            gray.convert_resize(FourCc::I420, u32::MAX, u32::MAX),
            Err(Error::Conversion { .. })
        ));
    }

    #[test]
    fn test_convert_unbound_fails() {
        let mut img = Image::new();
        img.set_format(FourCc::Y800);
        assert_eq!(img.convert(FourCc::RGB3).unwrap_err(), Error::NullResult);
    }

    #[test]
    fn test_convert_keeps_sequence_drops_results() {
        let mut img = Image::from_gray(&[0; 4], 2, 2).unwrap();
        img.set_sequence(9);
        img.set_user_data(Some(Arc::new("tag")));
        img.set_results([RawSymbol::new(SymbolType::QrCode, "x")].into_iter().collect());
        let out = img.convert(FourCc::RGB4).unwrap();
        assert_eq!(out.sequence(), 9);
        assert!(out.symbols().is_empty());
        assert!(out.user_data().is_none());
    }

    #[test]
    fn test_retain_shares_buffer_and_results() {
        let mut img = Image::from_gray(&[1, 2, 3, 4], 2, 2).unwrap();
        img.set_results([RawSymbol::new(SymbolType::Ean8, "12345670")].into_iter().collect());
        let mut sibling = img.retain();
        assert_eq!(img.ref_count(), 2);
        assert!(img.buffer().unwrap().ptr_eq(sibling.buffer().unwrap()));
        assert_eq!(sibling.symbols(), img.symbols());
        sibling.set_width(1);
        assert_eq!(img.width(), 2);
        sibling.release();
        assert_eq!(img.ref_count(), 1);
    }

    #[test]
    fn test_user_data_is_opaque() {
        let mut img = Image::new();
        img.set_user_data(Some(Arc::new(17u32)));
        let data = img.user_data().unwrap();
        assert_eq!(data.downcast_ref::<u32>(), Some(&17));
    }

    #[test]
    fn test_symbols_rewalk_from_head() {
        let mut img = Image::new();
        assert!(img.symbols().is_empty());
        assert!(img.first_symbol().is_none());
        img.set_results(
            [
                RawSymbol::new(SymbolType::Code128, "one").with_cache_count(0),
                RawSymbol::new(SymbolType::Code128, "two").with_cache_count(2),
            ]
            .into_iter()
            .collect(),
        );
        let first = img.symbols();
        let second = img.symbols();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(img.first_symbol().unwrap().data(), b"one");
        img.clear_results();
        assert!(img.symbols().is_empty());
    }
}
