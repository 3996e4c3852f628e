use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::shared::encoded_image::EncodedImage;
use crate::shared::error::ClientError;
use crate::shared::frame::Frame;

/// Compresses a frame into an upload-ready JPEG named after its index.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<EncodedImage, ClientError> {
    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    encoder
        .encode(
            frame.data(),
            frame.width(),
            frame.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| ClientError::Encode(e.to_string()))?;
    Ok(EncodedImage::jpeg(
        bytes,
        format!("frame_{:06}.jpg", frame.index()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encodes_decodable_jpeg() {
        let frame = Frame::solid(64, 48, [200, 100, 50], 7);
        let encoded = encode_jpeg(&frame, 92).unwrap();

        assert_eq!(encoded.mime(), "image/jpeg");
        assert_eq!(encoded.file_name(), "frame_000007.jpg");

        let decoded = image::load_from_memory(encoded.bytes()).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (64, 48));
        let px = decoded.get_pixel(32, 24).0;
        assert!((px[0] as i32 - 200).abs() < 8);
        assert!((px[1] as i32 - 100).abs() < 8);
        assert!((px[2] as i32 - 50).abs() < 8);
    }
}
