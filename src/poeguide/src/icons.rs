//! Gem icon assets: find which catalog icons are missing on disk,
//! resolve the image URL from a gem's page, and normalize the download
//! to a square PNG.
//!
//! poedb serves some gem art as a wide horizontal sprite strip (the
//! animated gems); only the first frame is wanted.

use crate::error::{Error, Result};
use crate::fetch::POEDB_BASE;
use crate::reconcile::GemRegistry;
use image::DynamicImage;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};

static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").expect("img selector"));

/// English names whose `<name>.png` is absent from the icon directory,
/// in registry order.
pub fn missing_icons(registry: &GemRegistry, icon_dir: &Path) -> Vec<String> {
    registry
        .eng_names()
        .filter(|eng| !icon_dir.join(format!("{eng}.png")).exists())
        .map(str::to_string)
        .collect()
}

/// First gem-art image URL on a gem's page, absolutized against the
/// wiki host when the src is root-relative.
pub fn icon_url_from_page(doc: &Html) -> Result<String> {
    for img in doc.select(&IMG) {
        if let Some(src) = img.value().attr("src") {
            if src.contains("Art/2DItems/Gems") {
                if let Some(path) = src.strip_prefix('/') {
                    return Ok(format!("{POEDB_BASE}/{path}"));
                }
                return Ok(src.to_string());
            }
        }
    }
    Err(Error::IconMissing)
}

/// Crop a wide sprite strip to its square first frame. Images that are
/// already square (or taller than wide) pass through unchanged.
pub fn square_first_frame(img: DynamicImage) -> DynamicImage {
    let (w, h) = (img.width(), img.height());
    if w > h {
        img.crop_imm(0, 0, h, h)
    } else {
        img
    }
}

/// Decode downloaded image bytes (png or webp), square the frame and
/// write `<EngName>.png` into the icon directory.
pub fn save_icon(bytes: &[u8], eng_name: &str, icon_dir: &Path) -> Result<PathBuf> {
    let img = image::load_from_memory(bytes)?;
    let img = square_first_frame(img);
    let path = icon_dir.join(format!("{eng_name}.png"));
    img.save_with_format(&path, image::ImageFormat::Png)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn sprite_strips_are_cropped_to_the_first_frame() {
        let strip = DynamicImage::ImageRgba8(RgbaImage::new(156, 39));
        let framed = square_first_frame(strip);
        assert_eq!((framed.width(), framed.height()), (39, 39));

        let square = DynamicImage::ImageRgba8(RgbaImage::new(39, 39));
        let same = square_first_frame(square);
        assert_eq!((same.width(), same.height()), (39, 39));
    }

    #[test]
    fn icon_url_is_absolutized() {
        let doc = Html::parse_document(concat!(
            "<img src=\"/image/Art/2DItems/Gems/Clarity.webp\">",
            "<img src=\"/image/other.png\">",
        ));
        assert_eq!(
            icon_url_from_page(&doc).unwrap(),
            "https://poedb.tw/image/Art/2DItems/Gems/Clarity.webp"
        );
    }

    #[test]
    fn absolute_urls_pass_through() {
        let doc = Html::parse_document(
            "<img src=\"https://cdn.example/Art/2DItems/Gems/Fireball.webp\">",
        );
        assert_eq!(
            icon_url_from_page(&doc).unwrap(),
            "https://cdn.example/Art/2DItems/Gems/Fireball.webp"
        );
    }

    #[test]
    fn page_without_gem_art_is_an_error() {
        let doc = Html::parse_document("<img src=\"/image/logo.png\">");
        assert!(matches!(icon_url_from_page(&doc), Err(Error::IconMissing)));
    }

    #[test]
    fn missing_icons_checks_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = GemRegistry::default();
        registry.record("Clarity", "명료함", "gem_blue");
        registry.record("Fireball", "화염구", "gem_red");
        std::fs::write(dir.path().join("Clarity.png"), b"png").unwrap();

        let missing = missing_icons(&registry, dir.path());
        assert_eq!(missing, vec!["Fireball".to_string()]);
    }
}
