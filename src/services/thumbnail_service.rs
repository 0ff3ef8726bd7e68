use crate::error::AppError;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::ImageReader;
use std::io::Cursor;
use tracing::debug;

pub const DEFAULT_THUMBNAIL_SIZE: u32 = 200;
const THUMBNAIL_QUALITY: u8 = 60;
const EXIF_HEADER_BYTES: usize = 128 * 1024;

/// A decoded preview: JPEG thumbnail bytes and the oriented source dimensions.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Thumbnail {
    pub fn data_uri(&self) -> String {
        data_uri("image/jpeg", &self.jpeg)
    }
}

/// Generate a thumbnail from in-memory image bytes.
/// Respects EXIF orientation.
pub fn generate_thumbnail(bytes: &[u8], size: u32) -> Result<Thumbnail, AppError> {
    // 1. Read EXIF (Orientation + Embedded Thumbnail)
    let (exif_thumb, orientation) = read_exif_info(bytes);
    let (width, height) = oriented_dimensions(source_dimensions(bytes)?, orientation);

    // 2. Try EXIF embedded thumbnail (fastest)
    if let Some(thumb) = exif_thumb {
        if orientation == 1 {
            return Ok(Thumbnail { jpeg: thumb, width, height });
        }

        match decode_and_rotate_bytes(&thumb, orientation) {
            Ok(jpeg) => return Ok(Thumbnail { jpeg, width, height }),
            Err(e) => debug!("EXIF thumbnail rotate failed: {}, falling back", e),
        }
    }

    // 3. Fallback: Full decode -> Resize -> Rotate -> Encode
    let mut img = decode_image_dynamic(bytes)?;

    let intermediate_size = size * 4;
    if img.width() > intermediate_size * 2 || img.height() > intermediate_size * 2 {
        img = img.resize(intermediate_size, intermediate_size, FilterType::Nearest);
    }
    img = img.resize(size, size, FilterType::Triangle);

    if orientation != 1 {
        img = apply_orientation(img, orientation);
    }

    let jpeg = encode_jpeg_thumbnail(&img)?;
    Ok(Thumbnail { jpeg, width, height })
}

/// `data:` URI for raw bytes, what a browser file reader would produce.
pub fn data_uri(media_type: &str, bytes: &[u8]) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", media_type, b64)
}

/// Encode a DynamicImage to JPEG bytes at reduced quality.
fn encode_jpeg_thumbnail(img: &image::DynamicImage) -> Result<Vec<u8>, AppError> {
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, THUMBNAIL_QUALITY);
    // JPEG has no alpha channel.
    image::DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)?;
    Ok(buffer.into_inner())
}

/// Decode raw bytes, apply rotation, and re-encode to JPEG.
fn decode_and_rotate_bytes(bytes: &[u8], orientation: u32) -> Result<Vec<u8>, AppError> {
    let img = decode_image_dynamic(bytes)?;
    let rotated = apply_orientation(img, orientation);
    encode_jpeg_thumbnail(&rotated)
}

fn decode_image_dynamic(bytes: &[u8]) -> Result<image::DynamicImage, AppError> {
    Ok(ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?)
}

fn source_dimensions(bytes: &[u8]) -> Result<(u32, u32), AppError> {
    Ok(ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()?)
}

fn oriented_dimensions((width, height): (u32, u32), orientation: u32) -> (u32, u32) {
    match orientation {
        5..=8 => (height, width),
        _ => (width, height),
    }
}

/// Parse EXIF from the head of the blob, return (Embedded Thumbnail, Orientation).
/// Orientation defaults to 1 if not found.
fn read_exif_info(bytes: &[u8]) -> (Option<Vec<u8>>, u32) {
    let header = &bytes[..bytes.len().min(EXIF_HEADER_BYTES)];

    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(header)) {
        Ok(e) => e,
        Err(_) => return (None, 1),
    };

    let orientation = match exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY) {
        Some(field) => match field.value {
            exif::Value::Short(ref v) => *v.first().unwrap_or(&1) as u32,
            exif::Value::Long(ref v) => *v.first().unwrap_or(&1),
            _ => 1,
        },
        None => 1,
    };

    (extract_thumb_from_exif(&exif), orientation)
}

fn extract_thumb_from_exif(exif: &exif::Exif) -> Option<Vec<u8>> {
    let offset_field = exif.get_field(exif::Tag::JPEGInterchangeFormat, exif::In::THUMBNAIL)?;
    let length_field = exif.get_field(exif::Tag::JPEGInterchangeFormatLength, exif::In::THUMBNAIL)?;

    let offset = match offset_field.value {
        exif::Value::Long(ref v) => *v.first()? as usize,
        _ => return None,
    };

    let length = match length_field.value {
        exif::Value::Long(ref v) => *v.first()? as usize,
        _ => return None,
    };

    if !(100..=200_000).contains(&length) {
        return None;
    }

    let buf = exif.buf();
    if offset + length > buf.len() {
        return None;
    }

    let thumb_bytes = &buf[offset..offset + length];
    // Verify JPEG Signature
    if thumb_bytes.len() < 2 || thumb_bytes[0] != 0xFF || thumb_bytes[1] != 0xD8 {
        return None;
    }

    Some(thumb_bytes.to_vec())
}

fn apply_orientation(img: image::DynamicImage, orientation: u32) -> image::DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.fliph().rotate90(),
        6 => img.rotate90(),
        7 => img.fliph().rotate270(),
        8 => img.rotate270(),
        _ => img,
    }
}
