//! QR code decoder using rqrr

use crate::error::{Error, Result};
use crate::qr::QrPayload;
use image::{DynamicImage, GrayImage, Luma, RgbImage, imageops};

/// QR code decoder
pub struct QrDecoder {
    /// White margin added around the image before detection, as a fraction of its side
    margin_ratio: f32,
}

impl QrDecoder {
    /// Create a new QR decoder with default settings
    pub fn new() -> Self {
        Self { margin_ratio: 0.1 }
    }

    /// Decode a QR code from an image
    pub fn decode(&self, img: &DynamicImage) -> Result<QrPayload> {
        let gray = img.to_luma8();

        self.decode_gray(&gray)
    }

    /// Decode a QR code from an RGB bitmap such as the encoder produces
    pub fn decode_rgb(&self, img: &RgbImage) -> Result<QrPayload> {
        let gray = imageops::grayscale(img);

        self.decode_gray(&gray)
    }

    /// Decode a QR code from a grayscale image
    pub fn decode_gray(&self, img: &GrayImage) -> Result<QrPayload> {
        let mut prepared = rqrr::PreparedImage::prepare(self.with_quiet_zone(img));

        let grids = prepared.detect_grids();

        if grids.is_empty() {
            return Err(Error::NoQrCodeFound);
        }

        // Take the first detected QR code
        let grid = &grids[0];

        match grid.decode() {
            Ok((meta, content)) => {
                tracing::debug!(
                    "Decoded QR: version={:?}, ecc_level={:?}, length={}",
                    meta.version,
                    meta.ecc_level,
                    content.len()
                );

                Ok(QrPayload::from_bytes(content.into_bytes()))
            }
            Err(e) => Err(Error::QrDecode(format!("Decode failed: {:?}", e))),
        }
    }

    // Generated codes only carry a one-module light border.
    fn with_quiet_zone(&self, img: &GrayImage) -> GrayImage {
        let side = img.width().max(img.height()) as f32;
        let margin = ((side * self.margin_ratio).round() as u32).max(8);
        let mut padded = GrayImage::from_pixel(
            img.width() + 2 * margin,
            img.height() + 2 * margin,
            Luma([255]),
        );
        imageops::replace(&mut padded, img, i64::from(margin), i64::from(margin));
        padded
    }
}

impl Default for QrDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_image_has_no_code() {
        let decoder = QrDecoder::new();
        let blank = DynamicImage::ImageLuma8(GrayImage::from_pixel(120, 120, Luma([255])));
        assert!(matches!(decoder.decode(&blank), Err(Error::NoQrCodeFound)));
    }

    #[test]
    fn test_decode_dynamic_image() {
        use crate::qr::QrEncoder;

        let image = QrEncoder::new()
            .encode_sized("http://example.com/wp", 234, 234)
            .unwrap();
        let payload = QrDecoder::new()
            .decode(&DynamicImage::ImageRgb8(image))
            .unwrap();
        assert_eq!(payload.as_str(), Some("http://example.com/wp"));
    }
}
