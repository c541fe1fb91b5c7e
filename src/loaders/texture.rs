use crate::error::AssetLoadError;
use crate::scene::Texture;

/// Decodes a PNG or JPEG into an RGBA8 texture
pub fn decode_texture(name: &str, bytes: &[u8]) -> Result<Texture, AssetLoadError> {
    let image = image::load_from_memory(bytes).map_err(|e| AssetLoadError::parse(name, e))?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let pixels = bytemuck::cast_slice::<u8, [u8; 4]>(rgba.as_raw()).to_vec();
    Texture::from_rgba8(width, height, pixels).ok_or_else(|| AssetLoadError::parse(name, "image has no pixels"))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    /// 2x1 PNG: red then blue
    pub fn png() -> Vec<u8> {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([0, 0, 255, 255]));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).expect("encode png");
        bytes.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_decodes_png() {
        let texture = decode_texture("wood.png", &fixtures::png()).unwrap();
        assert_eq!(texture.dimensions(), (2, 1));
        assert_eq!(texture.sample(Vec2::new(0.25, 0.5)).to_hex(), 0xff0000);
        assert_eq!(texture.sample(Vec2::new(0.75, 0.5)).to_hex(), 0x0000ff);
    }

    #[test]
    fn test_corrupt_image_is_parse_error() {
        let err = decode_texture("wood.png", b"\x89PNG nope").unwrap_err();
        assert!(matches!(err, AssetLoadError::Parse { .. }));
    }
}
