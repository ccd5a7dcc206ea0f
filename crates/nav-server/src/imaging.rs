//! Image compression for vision capability uploads.
//!
//! Frames are resized and re-encoded before upload to cut bandwidth and
//! model cost. Compression is never fatal: any failure passes the original
//! bytes through untouched.

use image::codecs::jpeg::JpegEncoder;
use std::io::Cursor;

/// Max width or height in pixels after resize.
pub const MAX_DIMENSION: u32 = 800;
/// JPEG re-encode quality (1-100).
pub const JPEG_QUALITY: u8 = 75;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionStats {
    pub original_bytes: u64,
    pub compressed_bytes: u64,
    pub ratio_percent: f64,
}

/// Resize to at most `MAX_DIMENSION` on the long edge and re-encode as JPEG.
///
/// Returns the original bytes with no stats when decoding fails or when
/// re-encoding would grow the payload.
pub fn compress_jpeg(bytes: &[u8]) -> (Vec<u8>, Option<CompressionStats>) {
    let original_size = bytes.len();

    let decoded = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(err) => {
            tracing::debug!("image decode failed, passing original through: {err}");
            return (bytes.to_vec(), None);
        }
    };

    let resized = if decoded.width().max(decoded.height()) > MAX_DIMENSION {
        decoded.thumbnail(MAX_DIMENSION, MAX_DIMENSION)
    } else {
        decoded
    };

    let mut output = Cursor::new(Vec::with_capacity(original_size / 2));
    let encoder = JpegEncoder::new_with_quality(&mut output, JPEG_QUALITY);
    if let Err(err) = resized.to_rgb8().write_with_encoder(encoder) {
        tracing::debug!("jpeg encode failed, passing original through: {err}");
        return (bytes.to_vec(), None);
    }

    let compressed = output.into_inner();
    if compressed.len() >= original_size {
        return (bytes.to_vec(), None);
    }

    let stats = CompressionStats {
        original_bytes: original_size as u64,
        compressed_bytes: compressed.len() as u64,
        ratio_percent: (1.0 - compressed.len() as f64 / original_size.max(1) as f64) * 100.0,
    };
    tracing::debug!(
        "image compressed: {} -> {} bytes ({:.1}% reduction)",
        stats.original_bytes,
        stats.compressed_bytes,
        stats.ratio_percent
    );

    (compressed, Some(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    // High-quality JPEG with enough detail that re-encoding at q75 and a
    // quarter of the pixels reliably shrinks it.
    fn detailed_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([
                (x % 256) as u8,
                (y % 256) as u8,
                ((x * 7 + y * 13) % 256) as u8,
            ])
        });
        let mut out = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut out, 100);
        img.write_with_encoder(encoder).unwrap();
        out.into_inner()
    }

    #[test]
    fn oversized_image_is_resized_and_shrunk() {
        let original = detailed_jpeg(1600, 1200);
        let (compressed, stats) = compress_jpeg(&original);

        let stats = stats.expect("compression stats expected");
        assert!(compressed.len() < original.len());
        assert!(stats.ratio_percent > 0.0);

        let reloaded = image::load_from_memory(&compressed).unwrap();
        assert!(reloaded.width().max(reloaded.height()) <= MAX_DIMENSION);
    }

    #[test]
    fn garbage_bytes_pass_through() {
        let garbage = b"definitely not an image".to_vec();
        let (out, stats) = compress_jpeg(&garbage);
        assert_eq!(out, garbage);
        assert!(stats.is_none());
    }
}
