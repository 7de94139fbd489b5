//! Image encoding: composed view → PNG bytes or a base64 data URI.
//!
//! PNG keeps marker edges and page text crisp; the data URI form is what the
//! JSON output embeds so a browser can show the view directly.

use crate::error::ViewerError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, RgbaImage};
use std::io::Cursor;
use tracing::debug;

/// Encode a composed view as PNG.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, ViewerError> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img.clone())
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| ViewerError::ImageEncode(e.to_string()))?;
    debug!("Encoded {}x{} view → {} bytes PNG", img.width(), img.height(), buf.len());
    Ok(buf)
}

/// Encode a composed view as a `data:image/png;base64,…` URI.
pub fn to_data_uri(img: &RgbaImage) -> Result<String, ViewerError> {
    let png = encode_png(img)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(&png)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn encode_small_image() {
        let img = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let png = encode_png(&img).expect("encode should succeed");
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&png).expect("valid png").to_rgba8();
        assert_eq!(decoded, img);
    }

    #[test]
    fn data_uri_prefix() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        let uri = to_data_uri(&img).unwrap();
        let b64 = uri.strip_prefix("data:image/png;base64,").expect("prefix");
        let bytes = STANDARD.decode(b64).expect("valid base64");
        assert!(!bytes.is_empty());
    }
}
