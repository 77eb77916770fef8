//! Image loading for texture data
//!
//! Every format is decoded to RGBA8 so the renderer sees one pixel layout.

use std::path::Path;

use crate::assets::{Asset, AssetError};

/// Decoded image ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Raw RGBA pixel data, row-major from the top-left
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Number of color channels (always 4)
    pub channels: u8,
}

impl ImageData {
    /// Load an image from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|e| AssetError::LoadFailed(format!("Failed to load image {}: {e}", path.display())))?;
        let data = Self::from_dynamic(img);
        log::debug!("Loaded image {}x{} from {}", data.width, data.height, path.display());
        Ok(data)
    }

    /// Decode an image held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| AssetError::LoadFailed(format!("Failed to decode image: {e}")))?;
        Ok(Self::from_dynamic(img))
    }

    fn from_dynamic(img: image::DynamicImage) -> Self {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            data: rgba.into_raw(),
            width,
            height,
            channels: 4,
        }
    }

    /// Create a single-color image
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = width as usize * height as usize;
        Self {
            data: color.repeat(pixel_count),
            width,
            height,
            channels: 4,
        }
    }

    /// Pixel at `(x, y)`, `None` outside the image
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let bytes = self.data.get(offset..offset + 4)?;
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Size of the pixel data in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Whether both dimensions are powers of two
    pub fn is_power_of_two(&self) -> bool {
        self.width.is_power_of_two() && self.height.is_power_of_two()
    }
}

impl Asset for ImageData {
    fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        ImageData::from_bytes(bytes)
    }

    fn extensions() -> &'static [&'static str] {
        &["png", "jpg", "jpeg", "bmp"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba(color));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_solid_color_image() {
        let img = ImageData::solid_color(4, 2, [255, 0, 0, 255]);
        assert_eq!((img.width, img.height, img.channels), (4, 2, 4));
        assert_eq!(img.size_bytes(), 4 * 2 * 4);
        assert_eq!(img.pixel(3, 1), Some([255, 0, 0, 255]));
        assert_eq!(img.pixel(4, 0), None);
    }

    #[test]
    fn test_power_of_two() {
        assert!(ImageData::solid_color(256, 64, [0, 0, 0, 255]).is_power_of_two());
        assert!(!ImageData::solid_color(100, 100, [0, 0, 0, 255]).is_power_of_two());
    }

    #[test]
    fn test_decode_png_bytes() {
        let png = encode_png(3, 2, [10, 20, 30, 255]);
        let img = <ImageData as Asset>::from_bytes(&png).unwrap();
        assert_eq!((img.width, img.height), (3, 2));
        assert_eq!(img.pixel(2, 1), Some([10, 20, 30, 255]));
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        assert!(matches!(
            ImageData::from_bytes(b"definitely not an image"),
            Err(AssetError::LoadFailed(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot.png");
        std::fs::write(&path, encode_png(1, 1, [0, 255, 0, 255])).unwrap();
        let img = ImageData::from_file(&path).unwrap();
        assert_eq!(img.data, vec![0, 255, 0, 255]);
    }
}
