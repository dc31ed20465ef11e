//! Property-based tests for image metadata and format conversion

use crate::{FourCc, Image};
use proptest::prelude::*;

/// Raster size plus enough random bytes for `channels` per pixel
fn raster(channels: usize) -> impl Strategy<Value = (u32, u32, Vec<u8>)> {
    (1u32..12, 1u32..12).prop_flat_map(move |(w, h)| {
        let len = w as usize * h as usize * channels;
        (Just(w), Just(h), prop::collection::vec(any::<u8>(), len))
    })
}

/// RGB raster whose 2x2 blocks are uniform, so chroma survives subsampling
fn blocky_rgb() -> impl Strategy<Value = (u32, u32, Vec<u8>)> {
    (1u32..6, 1u32..6).prop_flat_map(|(bw, bh)| {
        let blocks = bw as usize * bh as usize;
        prop::collection::vec(any::<[u8; 3]>(), blocks).prop_map(move |colours| {
            let (w, h) = (bw * 2, bh * 2);
            let mut data = Vec::with_capacity(w as usize * h as usize * 3);
            for y in 0..h {
                for x in 0..w {
                    let block = (y / 2 * bw + x / 2) as usize;
                    data.extend_from_slice(&colours[block]);
                }
            }
            (w, h, data)
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_metadata_round_trip(w in any::<u32>(), h in any::<u32>(), tag in any::<u32>(), seq in any::<u32>()) {
        let mut img = Image::new();
        img.set_size(w, h);
        img.set_format(FourCc::from(tag));
        img.set_sequence(seq);
        prop_assert_eq!(img.size(), (w, h));
        prop_assert_eq!(img.format().as_u32(), tag);
        prop_assert_eq!(img.sequence(), seq);
        prop_assert!(!img.is_bound());
    }

    #[test]
    fn prop_identity_conversion_copies(tag in any::<u32>(), (w, h, data) in raster(3)) {
        let img = Image::from_vec(data.clone(), w, h, FourCc::from(tag)).unwrap();
        let out = img.convert(FourCc::from(tag)).unwrap();
        prop_assert_eq!(out.data().unwrap(), &data[..]);
        prop_assert!(!out.buffer().unwrap().ptr_eq(img.buffer().unwrap()));
    }

    #[test]
    fn prop_rgb3_rgb4_round_trip_is_exact((w, h, data) in raster(3)) {
        let img = Image::from_vec(data.clone(), w, h, FourCc::RGB3).unwrap();
        let wide = img.convert(FourCc::RGB4).unwrap();
        prop_assert_eq!(wide.data_len(), data.len() / 3 * 4);
        let back = wide.convert(FourCc::RGB3).unwrap();
        prop_assert_eq!(back.data().unwrap(), &data[..]);
    }

    #[test]
    fn prop_resize_crops_and_replicates(
        (w, h, data) in raster(1),
        out_w in 1u32..16,
        out_h in 1u32..16,
    ) {
        prop_assume!((out_w, out_h) != (w, h));
        let img = Image::from_vec(data.clone(), w, h, FourCc::Y800).unwrap();
        let out = img.convert_resize(FourCc::Y800, out_w, out_h).unwrap();
        prop_assert_eq!(out.size(), (out_w, out_h));
        let px = out.data().unwrap();
        for y in 0..out_h {
            for x in 0..out_w {
                let sx = x.min(w - 1);
                let sy = y.min(h - 1);
                prop_assert_eq!(px[(y * out_w + x) as usize], data[(sy * w + sx) as usize]);
            }
        }
    }

    #[test]
    fn prop_yuv_round_trip_within_tolerance((w, h, data) in blocky_rgb()) {
        let img = Image::from_vec(data.clone(), w, h, FourCc::RGB3).unwrap();
        for yuv in [FourCc::I420, FourCc::NV12, FourCc::YUYV, FourCc::UYVY] {
            let back = img.convert(yuv).unwrap().convert(FourCc::RGB3).unwrap();
            prop_assert_eq!(back.size(), (w, h));
            for (a, b) in data.iter().zip(back.data().unwrap()) {
                prop_assert!(a.abs_diff(*b) <= 3, "{} vs {} through {}", a, b, yuv);
            }
        }
    }
}
