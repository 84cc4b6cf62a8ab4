//! Label composition: a QR bitmap with its title centered underneath
//!
//! ```text
//! +-----------+
//! |           |
//! |  QR code  |  qr height
//! |           |
//! +-----------+
//! |  padding/2|
//! |   Title   |  text height
//! |  padding/2|
//! +-----------+
//! ```
//!
//! A title wider than the QR bitmap is clipped at the left and right edges.

mod font;

pub use font::{LabelFont, TextBounds};

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

/// Background color of labels
pub const PAPER: Rgb<u8> = Rgb([255, 255, 255]);
/// Title color
pub const INK: Rgb<u8> = Rgb([0, 0, 0]);

/// Compose a QR bitmap and a title into one label image.
///
/// The result is as wide as `qr` and `qr.height() + title height + padding`
/// tall. The title's draw origin sits `padding / 2` below the QR bitmap.
pub fn compose(qr: &RgbImage, title: &str, font: &LabelFont, padding: u32) -> RgbImage {
    let bounds = font.measure(title);
    let (qr_width, qr_height) = qr.dimensions();

    let mut canvas = RgbImage::from_pixel(qr_width, qr_height + bounds.height() + padding, PAPER);
    imageops::replace(&mut canvas, qr, 0, 0);

    let text_x = (qr_width as i32 - bounds.width() as i32).div_euclid(2);
    let text_y = (qr_height + padding / 2) as i32;
    font.draw(&mut canvas, title, text_x, text_y, INK);

    if bounds.width() > qr_width {
        tracing::debug!(
            title,
            title_width = bounds.width(),
            qr_width,
            "Title wider than QR code, clipping"
        );
    }

    canvas
}

/// Rescale an image to exactly `width` × `height` with nearest-neighbour sampling.
pub fn resize(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, FilterType::Nearest)
}
