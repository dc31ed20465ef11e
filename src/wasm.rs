//! WebAssembly bindings for the image conversion engine.

use wasm_bindgen::prelude::*;

use crate::fourcc::FourCc;
use crate::image::Image;

/// Samples produced by a conversion.
#[wasm_bindgen]
pub struct ConvertedImage {
    width: u32,
    height: u32,
    format: String,
    data: Vec<u8>,
}

#[wasm_bindgen]
impl ConvertedImage {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The four-character format tag (e.g. "RGB3", "I420").
    #[wasm_bindgen(getter)]
    pub fn format(&self) -> String {
        self.format.clone()
    }

    /// Converted sample bytes.
    #[wasm_bindgen(getter)]
    pub fn data(&self) -> Vec<u8> {
        self.data.clone()
    }
}

fn js_error(e: crate::Error) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Convert `data` laid out as `from` into `to`, keeping the size.
///
/// Format tags are four-character strings such as "Y800" or "YUYV".
#[wasm_bindgen]
pub fn convert_image(
    data: &[u8],
    width: u32,
    height: u32,
    from: &str,
    to: &str,
) -> Result<ConvertedImage, JsValue> {
    convert_resize_image(data, width, height, from, to, width, height)
}

/// Convert `data` laid out as `from` into `to`, cropping or padding to
/// `out_width` x `out_height`.
#[wasm_bindgen]
pub fn convert_resize_image(
    data: &[u8],
    width: u32,
    height: u32,
    from: &str,
    to: &str,
    out_width: u32,
    out_height: u32,
) -> Result<ConvertedImage, JsValue> {
    let from: FourCc = from.parse().map_err(js_error)?;
    let to: FourCc = to.parse().map_err(js_error)?;
    let image = Image::from_slice(data, width, height, from).map_err(js_error)?;
    let converted = image
        .convert_resize(to, out_width, out_height)
        .map_err(js_error)?;
    Ok(ConvertedImage {
        width: converted.width(),
        height: converted.height(),
        format: to.to_string(),
        data: converted.data().map_err(js_error)?.to_vec(),
    })
}
