//! Interop with decoded bitmaps from the `image` crate

use crate::fourcc::FourCc;
use crate::image::Image;
use crate::{Error, Result};
use image::imageops;
use image::{ColorType, DynamicImage, ImageBuffer, Pixel};

/// Vertical order of the rows in a source bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowOrder {
    /// First row is the top of the picture, as the `image` crate stores it
    #[default]
    TopDown,
    /// First row is the bottom of the picture; flipped on import
    BottomUp,
}

/// Layout requested from [`Image::to_bitmap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmapFormat {
    /// 24-bit RGB, produces `DynamicImage::ImageRgb8`
    Rgb3,
    /// 32-bit RGB plus alpha, produces `DynamicImage::ImageRgba8`
    Rgb4,
}

/// Format tag matching a bitmap pixel format
///
/// Every pixel format maps to something: formats without a tag of their
/// own are reported as `RGB3`, the layout [`Image::from_dynamic`] produces
/// for them.
pub fn pixel_format_fourcc(color: ColorType) -> FourCc {
    match color {
        ColorType::L8 => FourCc::Y800,
        ColorType::L16 => FourCc::Y16,
        ColorType::Rgb8 => FourCc::RGB3,
        ColorType::Rgba8 => FourCc::RGB4,
        ColorType::Rgb16 => FourCc::RGB0,
        ColorType::Rgba16 => FourCc::B64A,
        other => {
            tracing::debug!(?other, "no dedicated fourcc for pixel format, using RGB3");
            FourCc::RGB3
        }
    }
}

fn oriented<P: Pixel>(
    mut buffer: ImageBuffer<P, Vec<P::Subpixel>>,
    order: RowOrder,
) -> ImageBuffer<P, Vec<P::Subpixel>> {
    if order == RowOrder::BottomUp {
        imageops::flip_vertical_in_place(&mut buffer);
    }
    buffer
}

impl Image {
    /// Import any bitmap as packed 24-bit RGB (`RGB3`)
    pub fn from_dynamic(bitmap: &DynamicImage, order: RowOrder) -> Result<Image> {
        let rgb = oriented(bitmap.to_rgb8(), order);
        let (width, height) = rgb.dimensions();
        Image::from_vec(rgb.into_raw(), width, height, FourCc::RGB3)
    }

    /// Import a bitmap keeping its layout when this crate can read it
    ///
    /// 8-bit gray, RGB and RGBA bitmaps keep their bytes; everything else
    /// goes through [`Image::from_dynamic`].
    pub fn from_dynamic_native(bitmap: &DynamicImage, order: RowOrder) -> Result<Image> {
        let format = pixel_format_fourcc(bitmap.color());
        match bitmap {
            DynamicImage::ImageLuma8(gray) => {
                let gray = oriented(gray.clone(), order);
                let (width, height) = gray.dimensions();
                Image::from_vec(gray.into_raw(), width, height, format)
            }
            DynamicImage::ImageRgb8(rgb) => {
                let rgb = oriented(rgb.clone(), order);
                let (width, height) = rgb.dimensions();
                Image::from_vec(rgb.into_raw(), width, height, format)
            }
            DynamicImage::ImageRgba8(rgba) => {
                let rgba = oriented(rgba.clone(), order);
                let (width, height) = rgba.dimensions();
                Image::from_vec(rgba.into_raw(), width, height, format)
            }
            _ => Image::from_dynamic(bitmap, order),
        }
    }

    /// Export the samples as a top-down bitmap
    pub fn to_bitmap(&self, format: BitmapFormat) -> Result<DynamicImage> {
        let (fourcc, channels) = match format {
            BitmapFormat::Rgb3 => (FourCc::RGB3, 3),
            BitmapFormat::Rgb4 => (FourCc::RGB4, 4),
        };
        let converted = self.convert(fourcc)?;
        let (width, height) = converted.size();
        let expected = width as usize * height as usize * channels;
        let mut data = converted.data()?.to_vec();
        if data.len() < expected {
            return Err(Error::InvalidArgument(format!(
                "{} bytes cannot hold a {width}x{height} bitmap",
                data.len()
            )));
        }
        data.truncate(expected);
        let bitmap = match format {
            BitmapFormat::Rgb3 => ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
            BitmapFormat::Rgb4 => ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageRgba8),
        };
        bitmap.ok_or_else(|| Error::InvalidArgument(format!("cannot build {width}x{height} bitmap")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn test_pixel_format_mapping_is_total() {
        assert_eq!(pixel_format_fourcc(ColorType::L8), FourCc::Y800);
        assert_eq!(pixel_format_fourcc(ColorType::L16), FourCc::Y16);
        assert_eq!(pixel_format_fourcc(ColorType::Rgb8), FourCc::RGB3);
        assert_eq!(pixel_format_fourcc(ColorType::Rgba8), FourCc::RGB4);
        assert_eq!(pixel_format_fourcc(ColorType::Rgb16), FourCc::RGB0);
        assert_eq!(pixel_format_fourcc(ColorType::Rgba16), FourCc::B64A);
        assert_eq!(pixel_format_fourcc(ColorType::La8), FourCc::RGB3);
        assert_eq!(pixel_format_fourcc(ColorType::Rgb32F), FourCc::RGB3);
    }

    #[test]
    fn test_from_dynamic_is_rgb3() {
        let gray = GrayImage::from_fn(3, 2, |x, y| Luma([(x + 10 * y) as u8]));
        let img = Image::from_dynamic(&DynamicImage::ImageLuma8(gray), RowOrder::TopDown).unwrap();
        assert_eq!(img.format(), FourCc::RGB3);
        assert_eq!(img.size(), (3, 2));
        assert_eq!(&img.data().unwrap()[..6], &[0, 0, 0, 1, 1, 1]);
        assert_eq!(&img.data().unwrap()[9..12], &[10, 10, 10]);
    }

    #[test]
    fn test_bottom_up_rows_are_flipped() {
        let gray = GrayImage::from_fn(1, 3, |_, y| Luma([y as u8]));
        let bitmap = DynamicImage::ImageLuma8(gray);
        let img = Image::from_dynamic_native(&bitmap, RowOrder::BottomUp).unwrap();
        assert_eq!(img.format(), FourCc::Y800);
        assert_eq!(img.data().unwrap(), &[2, 1, 0]);
        let img = Image::from_dynamic_native(&bitmap, RowOrder::TopDown).unwrap();
        assert_eq!(img.data().unwrap(), &[0, 1, 2]);
    }

    #[test]
    fn test_native_keeps_rgba() {
        let rgba = RgbaImage::from_pixel(2, 1, Rgba([1, 2, 3, 4]));
        let img = Image::from_dynamic_native(&DynamicImage::ImageRgba8(rgba), RowOrder::TopDown).unwrap();
        assert_eq!(img.format(), FourCc::RGB4);
        assert_eq!(img.data().unwrap(), &[1, 2, 3, 4, 1, 2, 3, 4]);
    }

    #[test]
    fn test_native_falls_back_to_rgb3() {
        let bitmap = DynamicImage::new_luma_a8(2, 2);
        let img = Image::from_dynamic_native(&bitmap, RowOrder::TopDown).unwrap();
        assert_eq!(img.format(), FourCc::RGB3);
        assert_eq!(img.data_len(), 12);
    }

    #[test]
    fn test_to_bitmap_round_trip() {
        let rgb = RgbImage::from_fn(4, 3, |x, y| Rgb([x as u8 * 40, y as u8 * 60, 7]));
        let bitmap = DynamicImage::ImageRgb8(rgb.clone());
        let img = Image::from_dynamic(&bitmap, RowOrder::TopDown).unwrap();

        let back = img.to_bitmap(BitmapFormat::Rgb3).unwrap();
        assert_eq!(back.to_rgb8(), rgb);

        let rgba = img.to_bitmap(BitmapFormat::Rgb4).unwrap();
        assert_eq!(rgba.color(), ColorType::Rgba8);
        assert_eq!(rgba.to_rgba8().get_pixel(3, 2), &Rgba([120, 120, 7, 0xff]));
    }

    #[test]
    fn test_to_bitmap_from_gray() {
        let img = Image::from_gray(&[5, 6, 7, 8], 2, 2).unwrap();
        let bitmap = img.to_bitmap(BitmapFormat::Rgb3).unwrap().to_rgb8();
        assert_eq!(bitmap.get_pixel(1, 1), &Rgb([8, 8, 8]));
    }
}
