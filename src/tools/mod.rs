use image::{GenericImageView, RgbaImage};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Load an image as an RGBA buffer.
pub fn load_rgba<P: AsRef<Path>>(path: P) -> Result<RgbaImage, image::ImageError> {
    Ok(image::open(path)?.to_rgba8())
}

/// Load an image as RGBA, downscaling (aspect preserved) when it exceeds the
/// given maximum width or height.
pub fn load_rgba_within<P: AsRef<Path>>(
    path: P,
    max_width: u32,
    max_height: u32,
) -> Result<RgbaImage, image::ImageError> {
    let img = image::open(path)?;
    let (orig_w, orig_h) = img.dimensions();
    if orig_w > max_width || orig_h > max_height {
        // `resize` keeps the aspect ratio and fits inside the bounds.
        let resized = img.resize(max_width, max_height, image::imageops::FilterType::Triangle);
        Ok(resized.to_rgba8())
    } else {
        Ok(img.to_rgba8())
    }
}

/// Parse `WIDTHxHEIGHT` (also accepts `X` and `*` as the separator).
pub fn parse_dimensions(value: &str) -> Result<(u32, u32), String> {
    let value = value.trim();
    let (w, h) = value
        .split_once(['x', 'X', '*'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let w = w
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("bad width '{w}': {e}"))?;
    let h = h
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("bad height '{h}': {e}"))?;
    if w == 0 || h == 0 {
        return Err(format!("dimensions must be non-zero, got {w}x{h}"));
    }
    Ok((w, h))
}

/// True for the file extensions the frame loaders understand.
pub fn is_image_path(path: &Path) -> bool {
    match path.extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_lowercase();
            ext == "png" || ext == "jpg" || ext == "jpeg"
        }
        None => false,
    }
}

/// List frame images: the path itself when it is a file, otherwise every image
/// directly inside the directory, sorted by name.
///
/// Unlike a dataset walk this surfaces IO errors, so callers can tell a
/// missing directory from an unreadable one.
pub fn frame_paths<P: AsRef<Path>>(root: P) -> io::Result<Vec<PathBuf>> {
    let root = root.as_ref();
    let meta = fs::metadata(root)?;
    if meta.is_file() {
        return Ok(if is_image_path(root) {
            vec![root.to_path_buf()]
        } else {
            Vec::new()
        });
    }

    let mut images = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_file() && is_image_path(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}
