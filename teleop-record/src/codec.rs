//! Image codecs for recorded channels.
//!
//! RGB channels use lossy JPEG at a fixed quality; depth channels use
//! deflate over little-endian `f32` bytes, which is lossless and
//! float-preserving.

use std::io::{Cursor, Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::codecs::jpeg::JpegEncoder;
use image::ImageFormat;
use teleop_types::{DepthFrame, RgbFrame};

use crate::{RecordError, Result};

/// JPEG quality used for RGB channels.
pub const JPEG_QUALITY: u8 = 95;

/// Encodes an RGB frame as JPEG bytes.
///
/// # Errors
///
/// Returns [`RecordError::ImageCodec`] if the pixel buffer has the wrong
/// size or the encoder fails.
pub fn encode_rgb(frame: &RgbFrame) -> Result<Vec<u8>> {
    if !frame.has_valid_buffer_size() {
        return Err(RecordError::image_codec(format!(
            "rgb buffer size {} does not match {}x{}",
            frame.pixels.len(),
            frame.width,
            frame.height
        )));
    }
    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY);
    encoder.encode(
        &frame.pixels,
        frame.width,
        frame.height,
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(bytes)
}

/// Decodes JPEG bytes back into an RGB frame.
///
/// # Errors
///
/// Returns [`RecordError::ImageCodec`] on malformed input.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbFrame> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)?.into_rgb8();
    let (width, height) = img.dimensions();
    Ok(RgbFrame::new(width, height, img.into_raw()))
}

/// Encodes a depth frame as deflate-compressed little-endian `f32`
/// bytes. Lossless.
///
/// # Errors
///
/// Returns [`RecordError::ImageCodec`] if the depth buffer has the wrong
/// size, or [`RecordError::Io`] if compression fails.
pub fn encode_depth(frame: &DepthFrame) -> Result<Vec<u8>> {
    if !frame.has_valid_buffer_size() {
        return Err(RecordError::image_codec(format!(
            "depth buffer size {} does not match {}x{}",
            frame.depths.len(),
            frame.width,
            frame.height
        )));
    }
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    for depth in &frame.depths {
        encoder.write_all(&depth.to_le_bytes())?;
    }
    Ok(encoder.finish()?)
}

/// Decodes deflate-compressed depth bytes back into a depth frame.
///
/// # Errors
///
/// Returns [`RecordError::ImageCodec`] if the decompressed byte count
/// does not match `width * height` samples.
pub fn decode_depth(bytes: &[u8], width: u32, height: u32) -> Result<DepthFrame> {
    let mut raw = Vec::new();
    ZlibDecoder::new(Cursor::new(bytes)).read_to_end(&mut raw)?;

    let expected = (width * height) as usize * 4;
    if raw.len() != expected {
        return Err(RecordError::image_codec(format!(
            "depth payload has {} bytes, expected {expected}",
            raw.len()
        )));
    }
    let depths = raw
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    Ok(DepthFrame::new(width, height, depths))
}
