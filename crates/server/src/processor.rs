use std::io::Cursor;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat};

/// The image transformation behind `/remove`. Output is always PNG.
#[async_trait]
pub trait ImageProcessor: Send + Sync {
    async fn process(&self, input: Bytes) -> anyhow::Result<Vec<u8>>;
}

/// Decodes any supported input and re-encodes it as RGBA PNG.
///
/// Stands in for a segmentation model: the alpha channel is preserved but not computed.
pub struct PngNormalizer;

#[async_trait]
impl ImageProcessor for PngNormalizer {
    async fn process(&self, input: Bytes) -> anyhow::Result<Vec<u8>> {
        tokio::task::spawn_blocking(move || encode_rgba_png(&input))
            .await
            .context("image worker panicked")?
    }
}

fn encode_rgba_png(input: &[u8]) -> anyhow::Result<Vec<u8>> {
    let decoded = image::load_from_memory(input).context("failed to decode image")?;
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(decoded.to_rgba8())
        .write_to(&mut out, ImageFormat::Png)
        .context("failed to encode png")?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn sample_jpeg() -> Vec<u8> {
        let img = RgbImage::from_pixel(4, 3, Rgb([200, 10, 10]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Jpeg)
            .expect("encode jpeg");
        out.into_inner()
    }

    #[tokio::test]
    async fn normalizes_jpeg_to_rgba_png() {
        let png = PngNormalizer
            .process(Bytes::from(sample_jpeg()))
            .await
            .expect("process");

        assert_eq!(
            image::guess_format(&png).expect("format"),
            ImageFormat::Png
        );
        let decoded = image::load_from_memory(&png).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
        assert!(decoded.color().has_alpha());
    }

    #[tokio::test]
    async fn rejects_non_image_bytes() {
        let err = PngNormalizer
            .process(Bytes::from_static(b"definitely not an image"))
            .await
            .expect_err("should fail");
        assert!(err.to_string().contains("decode"));
    }
}
