//! # Raster plumbing
//! The document's fixed in-memory pixel format is RGBA8 ([`image::RgbaImage`]);
//! whatever a PNG on disk contains is normalized on load. Cels backed by disk
//! always live at `<resource dir>/<cel name>.png`, so the file helpers here
//! take full paths built by the cel library.

use crate::geom::{Size, Vec2};

pub use image::RgbaImage;

#[derive(thiserror::Error, Debug)]
pub enum RasterError {
    #[error("{}: {source}", path.display())]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: {source}", path.display())]
    Decode {
        path: std::path::PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("{}: {source}", path.display())]
    Encode {
        path: std::path::PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// A fully transparent canvas.
#[must_use]
pub fn blank(size: Size) -> RgbaImage {
    RgbaImage::new(size.width(), size.height())
}

/// Decode a PNG into the internal format.
pub fn load_png(path: &std::path::Path) -> Result<RgbaImage, RasterError> {
    let dynamic = image::open(path).map_err(|source| RasterError::Decode {
        path: path.to_owned(),
        source,
    })?;
    Ok(dynamic.into_rgba8())
}

/// Encode to PNG, replacing whatever was at `path`.
pub fn save_png(image: &RgbaImage, path: &std::path::Path) -> Result<(), RasterError> {
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|source| RasterError::Encode {
            path: path.to_owned(),
            source,
        })
}

/// Write a fully transparent PNG of the given extent. Used when a file-backed
/// cel is created before any pixels exist for it.
pub fn write_blank_png(path: &std::path::Path, size: Size) -> Result<(), RasterError> {
    save_png(&blank(size), path)
}

/// Delete a cel's backing file.
pub fn remove_file(path: &std::path::Path) -> Result<(), RasterError> {
    std::fs::remove_file(path).map_err(|source| RasterError::Io {
        path: path.to_owned(),
        source,
    })
}

/// Rename a cel's backing file in place.
pub fn rename_file(from: &std::path::Path, to: &std::path::Path) -> Result<(), RasterError> {
    std::fs::rename(from, to).map_err(|source| RasterError::Io {
        path: to.to_owned(),
        source,
    })
}

/// Copy a cel's backing file into another directory tree.
pub fn copy_file(from: &std::path::Path, to: &std::path::Path) -> Result<(), RasterError> {
    std::fs::copy(from, to)
        .map(|_| ())
        .map_err(|source| RasterError::Io {
            path: to.to_owned(),
            source,
        })
}

/// Alpha-composite `top` over `bottom` with its top-left corner at `pos`,
/// rounded to the nearest whole pixel. Parts falling outside the canvas are
/// clipped.
pub fn composite(bottom: &mut RgbaImage, top: &RgbaImage, pos: Vec2) {
    image::imageops::overlay(bottom, top, pos.x.round() as i64, pos.y.round() as i64);
}

#[cfg(test)]
mod test {
    use super::*;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "pegbar_{name}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn blank_is_transparent() {
        let canvas = blank(Size::new(3, 2));
        assert_eq!(canvas.dimensions(), (3, 2));
        assert!(canvas.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }
    #[test]
    fn png_cycle_preserves_pixels() {
        let dir = temp_dir("png_cycle");
        let path = dir.join("dot.png");

        let mut canvas = blank(Size::new(2, 2));
        canvas.put_pixel(1, 0, image::Rgba([255, 10, 20, 255]));
        save_png(&canvas, &path).unwrap();

        let back = load_png(&path).unwrap();
        assert_eq!(back, canvas);
        std::fs::remove_dir_all(dir).unwrap();
    }
    #[test]
    fn load_reports_missing_file() {
        let dir = temp_dir("png_missing");
        let err = load_png(&dir.join("nope.png")).unwrap_err();
        assert!(matches!(err, RasterError::Decode { .. }));
        std::fs::remove_dir_all(dir).unwrap();
    }
    #[test]
    fn composite_places_and_clips() {
        let mut canvas = blank(Size::new(4, 4));
        let mut dot = blank(Size::new(2, 2));
        for (_, _, p) in dot.enumerate_pixels_mut() {
            *p = image::Rgba([0, 255, 0, 255]);
        }

        composite(&mut canvas, &dot, Vec2::new(3.0, -1.0));
        // Only the overlap lands: column 3, row 0.
        assert_eq!(canvas.get_pixel(3, 0).0, [0, 255, 0, 255]);
        assert_eq!(canvas.get_pixel(2, 0).0, [0, 0, 0, 0]);
        assert_eq!(canvas.get_pixel(3, 1).0, [0, 0, 0, 0]);
    }
    #[test]
    fn composite_rounds_position() {
        let mut canvas = blank(Size::new(4, 4));
        let mut dot = blank(Size::MIN);
        dot.put_pixel(0, 0, image::Rgba([9, 9, 9, 255]));

        composite(&mut canvas, &dot, Vec2::new(1.6, 0.4));
        assert_eq!(canvas.get_pixel(2, 0).0, [9, 9, 9, 255]);
    }
}
