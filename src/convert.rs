//! Format conversion between sample layouts
//!
//! A conversion decodes the source bytes into an [`ImageData`] raster,
//! crops or pads it to the requested size, pads again to the alignment the
//! target format needs, changes colour model and finally encodes the
//! target layout. The source bytes are only read.

use crate::config::{ConvertConfig, UnknownFormatPolicy};
use crate::error::{try_filled, ConversionFailure};
use crate::fourcc::{ChromaPlanes, FormatInfo, FormatKind, FourCc, RgbLayout};
use crate::image_data::{ImageData, Model, Samples};
use crate::{Error, Result};

/// Geometry and layout of one side of a conversion
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    pub format: FourCc,
    pub width: u32,
    pub height: u32,
}

/// Converted sample bytes and the (possibly rounded up) size they describe
#[derive(Debug)]
pub(crate) struct Converted {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

pub(crate) fn convert(
    data: &[u8],
    src: Frame,
    dst: Frame,
    config: &ConvertConfig,
) -> Result<Converted> {
    if src.format == dst.format && src.width == dst.width && src.height == dst.height {
        let mut copy = try_filled(data.len(), 0)?;
        copy.copy_from_slice(data);
        return Ok(Converted {
            data: copy,
            width: dst.width,
            height: dst.height,
        });
    }

    let fail = |reason| Error::Conversion {
        from: src.format,
        to: dst.format,
        reason,
    };

    let src_info = match (src.format.info(), config.unknown_formats) {
        (Some(info), _) => info,
        (None, UnknownFormatPolicy::AssumeRgb3) => {
            tracing::warn!(
                format = %src.format,
                "unmapped source format, reading samples as RGB3 by policy"
            );
            FourCc::RGB3.info().ok_or_else(|| fail(ConversionFailure::UnknownSource))?
        }
        (None, UnknownFormatPolicy::Strict) => return Err(fail(ConversionFailure::UnknownSource)),
    };
    let dst_info = dst
        .format
        .info()
        .ok_or_else(|| fail(ConversionFailure::UnknownTarget))?;
    if dst.width == 0 || dst.height == 0 {
        return Err(fail(ConversionFailure::EmptyTarget));
    }
    let (aligned_w, aligned_h) = dst_info
        .align_size(dst.width, dst.height)
        .ok_or_else(|| fail(ConversionFailure::SizeOverflow))?;

    let needed = src_info.data_len(src.width, src.height).ok_or_else(|| {
        Error::InvalidArgument(format!(
            "{} image of {}x{} is too large to address",
            src.format, src.width, src.height
        ))
    })?;
    if data.len() < needed {
        return Err(Error::InvalidArgument(format!(
            "{} image of {}x{} needs {needed} bytes, buffer holds {}",
            src.format,
            src.width,
            src.height,
            data.len()
        )));
    }

    tracing::debug!(
        from = %src.format,
        to = %dst.format,
        src_width = src.width,
        src_height = src.height,
        dst_width = dst.width,
        dst_height = dst.height,
        "converting image"
    );

    let raster = decode(data, &src_info, src.width, src.height)?
        .resize(src.width, src.height)?
        .resize(dst.width, dst.height)?
        .resize(aligned_w, aligned_h)?
        .into_model(model_of(&dst_info), config.chroma_fill);
    let data = encode(&raster, &dst_info, config)?;
    Ok(Converted {
        data,
        width: aligned_w,
        height: aligned_h,
    })
}

fn model_of(info: &FormatInfo) -> Model {
    match info.kind {
        FormatKind::Gray { .. } => Model::Luma,
        FormatKind::Rgb(_) => Model::Rgb,
        FormatKind::YuvPlanar { .. } | FormatKind::YuvPacked { .. } => Model::Yuv,
    }
}

/// Decode a whole source buffer at its aligned size
fn decode(data: &[u8], info: &FormatInfo, width: u32, height: u32) -> Result<ImageData> {
    let (w, h) = info.align_size(width, height).ok_or_else(|| {
        Error::InvalidArgument(format!("{width}x{height} cannot be aligned for {}", info.fourcc))
    })?;
    let (wu, hu) = (w as usize, h as usize);
    let pixels = wu * hu;

    let samples = match info.kind {
        FormatKind::Gray { bytes } => {
            let bytes = usize::from(bytes);
            Samples::Luma(
                data.chunks_exact(bytes)
                    .take(pixels)
                    .map(|px| px[bytes - 1])
                    .collect(),
            )
        }
        FormatKind::Rgb(RgbLayout::Bytes { bytes, r, g, b }) => Samples::Rgb(
            data.chunks_exact(usize::from(bytes))
                .take(pixels)
                .map(|px| [px[usize::from(r)], px[usize::from(g)], px[usize::from(b)]])
                .collect(),
        ),
        FormatKind::Rgb(RgbLayout::Word16 { r, g, b, .. }) => Samples::Rgb(
            data.chunks_exact(2)
                .take(pixels)
                .map(|px| {
                    let word = u16::from_le_bytes([px[0], px[1]]);
                    [expand(word, r), expand(word, g), expand(word, b)]
                })
                .collect(),
        ),
        FormatKind::YuvPlanar {
            x_shift,
            y_shift,
            chroma,
        } => {
            let (cw, ch) = (wu >> x_shift, hu >> y_shift);
            let (luma, rest) = data.split_at(pixels);
            let chroma_at = chroma_reader(rest, cw * ch, chroma);
            let mut px = try_filled(pixels, [0u8; 3])?;
            for (i, out) in px.iter_mut().enumerate() {
                let (x, y) = (i % wu, i / wu);
                let (u, v) = chroma_at((y >> y_shift) * cw + (x >> x_shift));
                *out = [luma[i], u, v];
            }
            Samples::Yuv(px)
        }
        FormatKind::YuvPacked { y0, u, y1, v } => {
            let mut px = try_filled(pixels, [0u8; 3])?;
            for (pair, macro_px) in px.chunks_exact_mut(2).zip(data.chunks_exact(4)) {
                let (cb, cr) = (macro_px[usize::from(u)], macro_px[usize::from(v)]);
                pair[0] = [macro_px[usize::from(y0)], cb, cr];
                pair[1] = [macro_px[usize::from(y1)], cb, cr];
            }
            Samples::Yuv(px)
        }
    };

    Ok(ImageData {
        width: w,
        height: h,
        samples,
    })
}

/// Encode a raster already aligned for, and in the colour model of, `info`
fn encode(raster: &ImageData, info: &FormatInfo, config: &ConvertConfig) -> Result<Vec<u8>> {
    let (wu, hu) = (raster.width as usize, raster.height as usize);
    let len = info
        .data_len(raster.width, raster.height)
        .ok_or(Error::Allocation {
            requested: usize::MAX,
        })?;
    let mut out = try_filled(len, 0u8)?;

    match (&raster.samples, info.kind) {
        (Samples::Luma(px), FormatKind::Gray { bytes }) => {
            let bytes = usize::from(bytes);
            for (dst, &l) in out.chunks_exact_mut(bytes).zip(px) {
                // wider samples repeat the byte so the full range is used
                dst.fill(l);
            }
        }
        (Samples::Rgb(px), FormatKind::Rgb(RgbLayout::Bytes { bytes, r, g, b })) => {
            let pad = (bytes == 4).then(|| usize::from(6 - r - g - b));
            for (dst, &[pr, pg, pb]) in out.chunks_exact_mut(usize::from(bytes)).zip(px) {
                dst[usize::from(r)] = pr;
                dst[usize::from(g)] = pg;
                dst[usize::from(b)] = pb;
                if let Some(pad) = pad {
                    dst[pad] = config.padding_byte;
                }
            }
        }
        (Samples::Rgb(px), FormatKind::Rgb(RgbLayout::Word16 { r, g, b, fill })) => {
            for (dst, &[pr, pg, pb]) in out.chunks_exact_mut(2).zip(px) {
                let word = fill | narrow(pr, r) | narrow(pg, g) | narrow(pb, b);
                dst.copy_from_slice(&word.to_le_bytes());
            }
        }
        (
            Samples::Yuv(px),
            FormatKind::YuvPlanar {
                x_shift,
                y_shift,
                chroma,
            },
        ) => {
            let (cw, ch) = (wu >> x_shift, hu >> y_shift);
            let (luma, rest) = out.split_at_mut(wu * hu);
            for (dst, p) in luma.iter_mut().zip(px) {
                *dst = p[0];
            }
            let (bw, bh) = (1usize << x_shift, 1usize << y_shift);
            let n = (bw * bh) as u32;
            for cy in 0..ch {
                for cx in 0..cw {
                    let (mut su, mut sv) = (0u32, 0u32);
                    for y in cy * bh..(cy + 1) * bh {
                        for x in cx * bw..(cx + 1) * bw {
                            let p = px[y * wu + x];
                            su += u32::from(p[1]);
                            sv += u32::from(p[2]);
                        }
                    }
                    let u = ((su + n / 2) / n) as u8;
                    let v = ((sv + n / 2) / n) as u8;
                    write_chroma(rest, cw * ch, chroma, cy * cw + cx, u, v);
                }
            }
        }
        (Samples::Yuv(px), FormatKind::YuvPacked { y0, u, y1, v }) => {
            for (dst, pair) in out.chunks_exact_mut(4).zip(px.chunks_exact(2)) {
                dst[usize::from(y0)] = pair[0][0];
                dst[usize::from(y1)] = pair[1][0];
                dst[usize::from(u)] = ((u16::from(pair[0][1]) + u16::from(pair[1][1]) + 1) / 2) as u8;
                dst[usize::from(v)] = ((u16::from(pair[0][2]) + u16::from(pair[1][2]) + 1) / 2) as u8;
            }
        }
        _ => {
            return Err(Error::Conversion {
                from: info.fourcc,
                to: info.fourcc,
                reason: ConversionFailure::UnknownTarget,
            })
        }
    }
    Ok(out)
}

fn chroma_reader(plane: &[u8], len: usize, chroma: ChromaPlanes) -> impl Fn(usize) -> (u8, u8) + '_ {
    move |i| match chroma {
        ChromaPlanes::Separate { v_first } => {
            let (a, b) = (plane[i], plane[len + i]);
            if v_first {
                (b, a)
            } else {
                (a, b)
            }
        }
        ChromaPlanes::Interleaved { v_first } => {
            let (a, b) = (plane[2 * i], plane[2 * i + 1]);
            if v_first {
                (b, a)
            } else {
                (a, b)
            }
        }
    }
}

fn write_chroma(plane: &mut [u8], len: usize, chroma: ChromaPlanes, i: usize, u: u8, v: u8) {
    match chroma {
        ChromaPlanes::Separate { v_first } => {
            let (a, b) = if v_first { (v, u) } else { (u, v) };
            plane[i] = a;
            plane[len + i] = b;
        }
        ChromaPlanes::Interleaved { v_first } => {
            let (a, b) = if v_first { (v, u) } else { (u, v) };
            plane[2 * i] = a;
            plane[2 * i + 1] = b;
        }
    }
}

/// Widen a `(shift, width)` bit field of a 16-bit word to 8 bits
fn expand(word: u16, (shift, width): (u8, u8)) -> u8 {
    let c = (word >> shift) & ((1 << width) - 1);
    ((c << (8 - width)) | (c >> (2 * width - 8))) as u8
}

fn narrow(value: u8, (shift, width): (u8, u8)) -> u16 {
    (u16::from(value) >> (8 - width)) << shift
}
