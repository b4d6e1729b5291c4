use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ImageFormat, RgbaImage};

/// The two image attachment points on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Avatar,
    PostImage,
}

/// A decoded attachment. `uri` is the fully inlined `data:` form stored in
/// the post state; `pixels` back the capture overlay.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub uri: String,
    pub pixels: RgbaImage,
    pub source: PathBuf,
}

impl ImageAsset {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Owns the decoded assets behind the post's image references. Each slot
/// holds at most one asset; attaching over an occupied slot drops the
/// previous asset before the new one is stored, so a replaced attachment
/// never outlives its reference.
#[derive(Debug, Default)]
pub struct MediaStore {
    avatar: Option<ImageAsset>,
    post_image: Option<ImageAsset>,
}

impl MediaStore {
    pub fn get(&self, slot: ImageSlot) -> Option<&ImageAsset> {
        match slot {
            ImageSlot::Avatar => self.avatar.as_ref(),
            ImageSlot::PostImage => self.post_image.as_ref(),
        }
    }

    pub fn attach(&mut self, slot: ImageSlot, path: &Path) -> Result<&ImageAsset> {
        let asset = load_asset(path)?;
        let entry = self.slot_mut(slot);
        if let Some(previous) = entry.take() {
            tracing::debug!(
                slot = ?slot,
                previous = %previous.source.display(),
                "releasing replaced image asset"
            );
        }
        Ok(entry.insert(asset))
    }

    /// Drops the asset in `slot`, if any. Returns whether something was held.
    pub fn release(&mut self, slot: ImageSlot) -> bool {
        self.slot_mut(slot).take().is_some()
    }

    fn slot_mut(&mut self, slot: ImageSlot) -> &mut Option<ImageAsset> {
        match slot {
            ImageSlot::Avatar => &mut self.avatar,
            ImageSlot::PostImage => &mut self.post_image,
        }
    }
}

fn load_asset(path: &Path) -> Result<ImageAsset> {
    let bytes = fs::read(path).with_context(|| format!("reading image {}", path.display()))?;
    let format = image::guess_format(&bytes)
        .with_context(|| format!("detecting image format of {}", path.display()))?;
    let pixels = image::load_from_memory_with_format(&bytes, format)
        .with_context(|| format!("decoding image {}", path.display()))?
        .to_rgba8();
    Ok(ImageAsset {
        uri: data_uri(&bytes, format),
        pixels,
        source: path.to_path_buf(),
    })
}

fn data_uri(bytes: &[u8], format: ImageFormat) -> String {
    format!("data:{};base64,{}", format.to_mime_type(), STANDARD.encode(bytes))
}
