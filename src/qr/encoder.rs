//! QR code encoder

use crate::error::{Error, Result};
use crate::label;
use crate::qr::QrPayload;
use image::{Rgb, RgbImage, imageops};
use qrcode::{EcLevel, QrCode};

const DARK: Rgb<u8> = Rgb([0, 0, 0]);
const LIGHT: Rgb<u8> = Rgb([255, 255, 255]);

/// QR code encoder
///
/// Holds only rendering parameters. Every call to [`QrEncoder::encode`] builds
/// a new code from its payload alone.
#[derive(Debug, Clone)]
pub struct QrEncoder {
    /// Error correction level
    ecc_level: EcLevel,
    /// Pixels per module before rescaling
    module_pixels: u32,
    /// Light modules around the symbol
    border_modules: u32,
}

impl QrEncoder {
    /// Create a new QR encoder with High ECC, 2-pixel modules and a 1-module border
    pub fn new() -> Self {
        Self {
            ecc_level: EcLevel::H,
            module_pixels: 2,
            border_modules: 1,
        }
    }

    /// Error correction level in use
    pub fn ecc_level(&self) -> EcLevel {
        self.ecc_level
    }

    /// Encode data into a QR bitmap at its native size.
    ///
    /// The smallest version that fits the payload is chosen.
    pub fn encode(&self, payload: &QrPayload) -> Result<RgbImage> {
        let code = QrCode::with_error_correction_level(&payload.data, self.ecc_level)
            .map_err(|e| {
                Error::Encoding(format!(
                    "{} bytes do not fit any QR version at {:?}: {}",
                    payload.data.len(),
                    self.ecc_level,
                    e
                ))
            })?;

        tracing::debug!(
            version = ?code.version(),
            modules = code.width(),
            bytes = payload.data.len(),
            "Encoded QR payload"
        );

        let symbol = code
            .render::<Rgb<u8>>()
            .quiet_zone(false)
            .module_dimensions(self.module_pixels, self.module_pixels)
            .dark_color(DARK)
            .light_color(LIGHT)
            .build();

        let margin = self.border_modules * self.module_pixels;
        let mut image =
            RgbImage::from_pixel(symbol.width() + 2 * margin, symbol.height() + 2 * margin, LIGHT);
        imageops::replace(&mut image, &symbol, i64::from(margin), i64::from(margin));

        Ok(image)
    }

    /// Encode a URL and rescale the bitmap to exactly `width` × `height`.
    pub fn encode_sized(&self, url: &str, width: u32, height: u32) -> Result<RgbImage> {
        let native = self.encode(&QrPayload::from_string(url))?;
        Ok(label::resize(&native, width, height))
    }
}

impl Default for QrEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_defaults() {
        let encoder = QrEncoder::new();
        assert_eq!(encoder.ecc_level(), EcLevel::H);
    }

    #[test]
    fn test_native_size_has_border() {
        let encoder = QrEncoder::new();
        let image = encoder
            .encode(&QrPayload::from_string("http://maps.google.com/?q=45.0,-122.0"))
            .unwrap();
        // 37 bytes at level H needs version 5 (37 modules) + 1 module border each side.
        assert_eq!(image.dimensions(), (78, 78));
        assert_eq!(*image.get_pixel(0, 0), LIGHT);
        assert_eq!(*image.get_pixel(2, 2), DARK);
    }

    #[test]
    fn test_encode_sized_exact_dimensions() {
        let encoder = QrEncoder::new();
        let image = encoder.encode_sized("short", 100, 60).unwrap();
        assert_eq!(image.dimensions(), (100, 60));
    }

    #[test]
    fn test_only_black_and_white() {
        let encoder = QrEncoder::new();
        let image = encoder.encode_sized("http://example.com/a", 97, 97).unwrap();
        assert!(image.pixels().all(|p| *p == DARK || *p == LIGHT));
    }

    #[test]
    fn test_payload_too_long() {
        let encoder = QrEncoder::new();
        let url = format!("http://example.com/?q={}", "x".repeat(2000));
        let err = encoder.encode_sized(&url, 78, 78).unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }

    #[test]
    fn test_round_trip() {
        use crate::qr::QrDecoder;

        let encoder = QrEncoder::new();
        let decoder = QrDecoder::new();

        let original = "http://maps.google.com/?q=45.0,-122.0";
        let qr_image = encoder.encode_sized(original, 312, 312).unwrap();
        let decoded = decoder.decode_rgb(&qr_image).unwrap();

        assert_eq!(decoded.as_str(), Some(original));
    }

    #[test]
    fn test_consecutive_codes_are_independent() {
        use crate::qr::QrDecoder;

        let encoder = QrEncoder::new();
        let decoder = QrDecoder::new();

        let long = "http://maps.google.com/?q=45.123456789,-122.987654321";
        let short = "http://x.io/1";
        let _ = encoder.encode_sized(long, 234, 234).unwrap();
        let second = encoder.encode_sized(short, 234, 234).unwrap();

        assert_eq!(
            second,
            QrEncoder::new().encode_sized(short, 234, 234).unwrap()
        );
        assert_eq!(decoder.decode_rgb(&second).unwrap().as_str(), Some(short));
    }
}
