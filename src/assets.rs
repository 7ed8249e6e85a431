use crate::error::FolioError;
use crate::types::{Pt, Rect};
use base64::Engine;
use image::GenericImageView;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Where the page logo comes from. Reports use the built-in mark unless
/// told otherwise, so every page always carries a logo.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LogoSource {
    #[default]
    Builtin,
    Path(PathBuf),
    Bytes(Vec<u8>),
    /// `data:image/png;base64,...`
    DataUri(String),
}

impl LogoSource {
    fn describe(&self) -> String {
        match self {
            LogoSource::Builtin => "<built-in mark>".to_string(),
            LogoSource::Path(path) => path.display().to_string(),
            LogoSource::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
            LogoSource::DataUri(uri) => format!("<data uri, {} chars>", uri.len()),
        }
    }

    fn read(&self) -> Result<Vec<u8>, FolioError> {
        match self {
            LogoSource::Builtin => encode_png(&builtin_mark()),
            LogoSource::Path(path) => std::fs::read(path).map_err(|err| {
                FolioError::AssetMissing(format!("logo {}: {}", path.display(), err))
            }),
            LogoSource::Bytes(bytes) => Ok(bytes.clone()),
            LogoSource::DataUri(uri) => parse_data_uri(uri).ok_or_else(|| {
                FolioError::AssetMissing(format!("logo {} is not a data uri", self.describe()))
            }),
        }
    }
}

fn parse_data_uri(uri: &str) -> Option<Vec<u8>> {
    let rest = uri.strip_prefix("data:")?;
    let (header, data) = rest.split_once(',')?;
    if header.contains("base64") {
        base64::engine::general_purpose::STANDARD.decode(data.trim()).ok()
    } else {
        Some(data.as_bytes().to_vec())
    }
}

/// A decoded raster ready to become a PDF image XObject. Pixel data is
/// already in its stream encoding (`filter`).
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub width_px: u32,
    pub height_px: u32,
    pub color_space: &'static str,
    pub filter: &'static str,
    pub data: Vec<u8>,
    /// Zlib-compressed 8-bit alpha channel, when any pixel is translucent.
    pub alpha: Option<Vec<u8>>,
}

impl ImageAsset {
    /// Largest rectangle with the image's aspect ratio that fits `bounds`,
    /// centred in it.
    pub fn fit_centered(&self, bounds: Rect) -> Rect {
        if self.width_px == 0 || self.height_px == 0 {
            return bounds;
        }
        let scale_x = bounds.width.to_f32() / self.width_px as f32;
        let scale_y = bounds.height.to_f32() / self.height_px as f32;
        let scale = scale_x.min(scale_y);
        let width = Pt::from_f32(self.width_px as f32 * scale);
        let height = Pt::from_f32(self.height_px as f32 * scale);
        Rect {
            x: bounds.x + (bounds.width - width).mul_ratio(1, 2),
            y: bounds.y + (bounds.height - height).mul_ratio(1, 2),
            width,
            height,
        }
    }
}

pub(crate) fn zlib_compress(data: &[u8]) -> Vec<u8> {
    miniz_oxide::deflate::compress_to_vec_zlib(data, 6)
}

pub fn decode_image_bytes(data: &[u8]) -> Result<ImageAsset, FolioError> {
    let format = image::guess_format(data)
        .map_err(|err| FolioError::AssetMissing(format!("unrecognised image data: {err}")))?;
    let decoded = image::load_from_memory(data)
        .map_err(|err| FolioError::AssetMissing(format!("image could not be decoded: {err}")))?;
    let (width_px, height_px) = decoded.dimensions();

    if format == image::ImageFormat::Jpeg {
        let color_space = match decoded.color() {
            image::ColorType::L8 | image::ColorType::La8 => "/DeviceGray",
            _ => "/DeviceRGB",
        };
        return Ok(ImageAsset {
            width_px,
            height_px,
            color_space,
            filter: "/DCTDecode",
            data: data.to_vec(),
            alpha: None,
        });
    }

    Ok(rgba_asset(&decoded.to_rgba8()))
}

fn rgba_asset(rgba: &image::RgbaImage) -> ImageAsset {
    let (width_px, height_px) = rgba.dimensions();
    let mut rgb = Vec::with_capacity((width_px * height_px * 3) as usize);
    let mut alpha = Vec::with_capacity((width_px * height_px) as usize);
    let mut translucent = false;
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        translucent |= a != 255;
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }
    ImageAsset {
        width_px,
        height_px,
        color_space: "/DeviceRGB",
        filter: "/FlateDecode",
        data: zlib_compress(&rgb),
        alpha: translucent.then(|| zlib_compress(&alpha)),
    }
}

/// 240x60 transparent canvas with a solid blue bar, 4:1 like the logo slot.
fn builtin_mark() -> image::RgbaImage {
    image::RgbaImage::from_fn(240, 60, |x, y| {
        if (21..40).contains(&y) && (21..220).contains(&x) {
            image::Rgba([0, 84, 150, 255])
        } else {
            image::Rgba([255, 255, 255, 0])
        }
    })
}

fn encode_png(img: &image::RgbaImage) -> Result<Vec<u8>, FolioError> {
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .map_err(|err| FolioError::AssetMissing(format!("png encoding failed: {err}")))?;
    Ok(out.into_inner())
}

pub fn load_logo(source: &LogoSource) -> Result<ImageAsset, FolioError> {
    if matches!(source, LogoSource::Builtin) {
        return Ok(rgba_asset(&builtin_mark()));
    }
    let bytes = source.read()?;
    decode_image_bytes(&bytes).map_err(|err| match err {
        FolioError::AssetMissing(message) => {
            FolioError::AssetMissing(format!("logo {}: {}", source.describe(), message))
        }
        other => other,
    })
}

/// Images referenced by `DrawImage` commands, keyed by resource id.
#[derive(Debug, Clone, Default)]
pub struct ImageRegistry {
    images: BTreeMap<String, ImageAsset>,
}

impl ImageRegistry {
    pub fn insert(&mut self, resource_id: impl Into<String>, image: ImageAsset) {
        self.images.insert(resource_id.into(), image);
    }

    pub fn get(&self, resource_id: &str) -> Option<&ImageAsset> {
        self.images.get(resource_id)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn test_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, _| {
        if x % 2 == 0 {
            image::Rgba([0, 84, 150, 255])
        } else {
            image::Rgba([255, 255, 255, 128])
        }
    });
    encode_png(&img).expect("encode png")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png_with_alpha() {
        let asset = decode_image_bytes(&test_png(4, 2)).expect("decode");
        assert_eq!((asset.width_px, asset.height_px), (4, 2));
        assert_eq!(asset.filter, "/FlateDecode");
        assert!(asset.alpha.is_some());
        let rgb = miniz_oxide::inflate::decompress_to_vec_zlib(&asset.data).expect("inflate");
        assert_eq!(rgb.len(), 4 * 2 * 3);
        assert_eq!(&rgb[..3], &[0, 84, 150]);
    }

    #[test]
    fn data_uri_logo_is_decoded() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(test_png(2, 2));
        let source = LogoSource::DataUri(format!("data:image/png;base64,{encoded}"));
        assert!(load_logo(&source).is_ok());
    }

    #[test]
    fn builtin_mark_is_a_translucent_four_to_one_image() {
        let asset = load_logo(&LogoSource::default()).expect("builtin");
        assert_eq!((asset.width_px, asset.height_px), (240, 60));
        assert!(asset.alpha.is_some());
        let rgb = miniz_oxide::inflate::decompress_to_vec_zlib(&asset.data).expect("inflate");
        let centre = ((30 * 240 + 120) * 3) as usize;
        assert_eq!(&rgb[centre..centre + 3], &[0, 84, 150]);
        // The PNG path decodes to the same raster.
        let via_png = decode_image_bytes(&LogoSource::Builtin.read().expect("png")).expect("decode");
        assert_eq!(via_png.data, asset.data);
    }

    #[test]
    fn missing_or_garbage_logo_is_reported() {
        let missing = LogoSource::Path(PathBuf::from("/nonexistent/folio/logo.png"));
        assert!(matches!(load_logo(&missing), Err(FolioError::AssetMissing(_))));
        let garbage = LogoSource::Bytes(b"not an image".to_vec());
        assert!(matches!(load_logo(&garbage), Err(FolioError::AssetMissing(_))));
    }

    #[test]
    fn fit_preserves_aspect_and_centres() {
        let asset = decode_image_bytes(&test_png(4, 2)).expect("decode");
        let bounds = Rect {
            x: Pt::ZERO,
            y: Pt::ZERO,
            width: Pt::from_f32(144.0),
            height: Pt::from_f32(36.0),
        };
        let placed = asset.fit_centered(bounds);
        assert_eq!(placed.width, Pt::from_f32(72.0));
        assert_eq!(placed.height, Pt::from_f32(36.0));
        assert_eq!(placed.x, Pt::from_f32(36.0));
        assert_eq!(placed.y, Pt::ZERO);
    }
}
