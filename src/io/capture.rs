// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Still capture of the displayed frame for the coach.

use super::media::{MediaSource, VideoFrame};
use anyhow::{bail, Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, RgbImage, RgbaImage};

/// JPEG quality used for coach captures.
pub const DEFAULT_JPEG_QUALITY: u8 = 98;

/// Encode an RGBA frame as JPEG, dropping alpha.
pub fn encode_jpeg(frame: &VideoFrame, quality: u8) -> Result<Vec<u8>> {
    if frame.width == 0 || frame.height == 0 {
        bail!("Cannot encode an empty frame");
    }

    let rgba = RgbaImage::from_raw(frame.width, frame.height, frame.pixels.clone())
        .context("Frame buffer does not match its dimensions")?;
    let rgb: RgbImage = image::DynamicImage::ImageRgba8(rgba).to_rgb8();

    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .encode(rgb.as_raw(), frame.width, frame.height, ExtendedColorType::Rgb8)
        .context("Failed to encode frame as JPEG")?;

    Ok(buffer)
}

/// Capture the frame currently shown by `media` as JPEG.
pub fn capture_frame(media: &mut dyn MediaSource, quality: u8) -> Result<Vec<u8>> {
    let at = media.current_time();
    let frame = media
        .current_frame()
        .with_context(|| format!("No frame available at {:.3}s", at))?;
    let jpeg = encode_jpeg(frame, quality)?;
    log::debug!("Captured frame at {:.3}s ({} bytes)", at, jpeg.len());
    Ok(jpeg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::media::testing::FakeMedia;

    fn gradient(width: u32, height: u32) -> VideoFrame {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[(x * 8) as u8, (y * 8) as u8, 128, 255]);
            }
        }
        VideoFrame {
            width,
            height,
            pixels,
        }
    }

    #[test]
    fn test_encode_produces_decodable_jpeg() {
        let jpeg = encode_jpeg(&gradient(16, 8), DEFAULT_JPEG_QUALITY).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.width(), 16);
        assert_eq!(decoded.height(), 8);
    }

    #[test]
    fn test_mismatched_buffer_is_an_error() {
        let frame = VideoFrame {
            width: 4,
            height: 4,
            pixels: vec![0; 10],
        };
        assert!(encode_jpeg(&frame, 90).is_err());
    }

    #[test]
    fn test_capture_without_frame_fails() {
        let mut media = FakeMedia::loaded(10.0, 1.0);
        let err = capture_frame(&mut media, 90).unwrap_err();
        assert!(err.to_string().contains("1.000"));

        let mut media = FakeMedia::loaded(10.0, 1.0).with_frame(gradient(4, 4));
        assert!(!capture_frame(&mut media, 90).unwrap().is_empty());
    }
}
