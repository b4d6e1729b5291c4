use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use time::OffsetDateTime;

use crate::app::App;
use crate::capture::{
    export_filename, Downloader, FileDownloader, RasterOptions, RasterizerService,
};
use crate::card;
use crate::config::themes;
use crate::config::{AppConfig, ConfigPaths, MAX_SCALE, MIN_SCALE};
use crate::media::ImageSlot;
use crate::post::{BadgeStyle, Platform, PostStore, TextField, Theme};

#[derive(Args, Debug, Clone)]
pub struct CaptureArgs {
    /// Template to render (twitter, linkedin, instagram)
    #[arg(long, default_value = "twitter", value_parser = <Platform as FromStr>::from_str)]
    pub platform: Platform,
    /// Color theme (dark, light); defaults to the template's usual one
    #[arg(long, value_parser = <Theme as FromStr>::from_str)]
    pub theme: Option<Theme>,
    /// Display name shown on the card
    #[arg(long)]
    pub name: Option<String>,
    /// Handle, including any @ prefix
    #[arg(long)]
    pub handle: Option<String>,
    /// Headline shown under the name on LinkedIn
    #[arg(long)]
    pub headline: Option<String>,
    /// Location shown under the username on Instagram
    #[arg(long)]
    pub location: Option<String>,
    /// Post body; hashtags, mentions and links are highlighted
    #[arg(long)]
    pub content: Option<String>,
    /// Likes counter, shown verbatim
    #[arg(long)]
    pub likes: Option<String>,
    /// Attach an avatar image from this file
    #[arg(long)]
    pub avatar: Option<PathBuf>,
    /// Attach a post image from this file
    #[arg(long)]
    pub image: Option<PathBuf>,
    /// Badge color for the verified check (blue, gold, grey, pink, none)
    #[arg(long, value_parser = <BadgeStyle as FromStr>::from_str)]
    pub badge: Option<BadgeStyle>,
    /// Hide the verified badge entirely
    #[arg(long)]
    pub no_badge: bool,
    /// Directory the PNG is written into
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Output resolution multiplier
    #[arg(long)]
    pub scale: Option<u32>,
}

pub fn run_tui(app: &mut App) -> Result<()> {
    app.run()
}

/// Non-interactive capture: seeds a post from config plus flags, renders it
/// off screen and writes the PNG, printing the output path on success.
pub fn capture_post(config: Arc<AppConfig>, paths: ConfigPaths, args: CaptureArgs) -> Result<()> {
    let mut state = config.seed_state();
    state.platform = args.platform;
    state.theme = args
        .theme
        .unwrap_or_else(|| args.platform.default_theme());
    for (field, value) in [
        (TextField::DisplayName, &args.name),
        (TextField::Handle, &args.handle),
        (TextField::Headline, &args.headline),
        (TextField::Location, &args.location),
        (TextField::Content, &args.content),
        (TextField::Likes, &args.likes),
    ] {
        if let Some(value) = value {
            state = state.with_text(field, value.clone());
        }
    }

    let mut store = PostStore::with_state(state);
    store.reset_timestamp();
    if let Some(path) = &args.avatar {
        store
            .attach_image(ImageSlot::Avatar, path)
            .with_context(|| format!("attaching avatar {}", path.display()))?;
    }
    if let Some(path) = &args.image {
        store
            .attach_image(ImageSlot::PostImage, path)
            .with_context(|| format!("attaching post image {}", path.display()))?;
    }
    if args.no_badge && store.get().verification.enabled {
        store.toggle_verified();
    }
    if let Some(style) = args.badge {
        store.set_badge(style);
    }

    let snapshot = store.snapshot();
    let surface = card::render_offscreen(&snapshot, store.media(), config.capture.card_width);
    let options = RasterOptions {
        background: themes::capture_background(snapshot.platform, snapshot.theme),
        scale: args
            .scale
            .unwrap_or(config.capture.scale)
            .clamp(MIN_SCALE, MAX_SCALE),
    };

    let rasterizer = RasterizerService::global()
        .acquire()
        .context("loading rasterizer")?;
    let png = rasterizer
        .rasterize(&surface, options)
        .context("rasterizing card")?;

    let output_dir = args
        .out
        .unwrap_or_else(|| config.capture.resolve_output_dir(&paths));
    let filename = export_filename(snapshot.platform, OffsetDateTime::now_utc());
    let path = FileDownloader::new(output_dir)
        .deliver(&filename, &png)
        .context("writing capture")?;
    println!("{}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_paths(root: &TempDir) -> ConfigPaths {
        let base = root.path();
        let config_dir = base.join("config");
        let data_dir = base.join("data");
        ConfigPaths {
            config_dir: config_dir.clone(),
            config_file: config_dir.join("config.toml"),
            data_dir: data_dir.clone(),
            export_dir: base.join("exports"),
            log_dir: data_dir.join("logs"),
        }
    }

    fn base_args() -> CaptureArgs {
        CaptureArgs {
            platform: Platform::Twitter,
            theme: None,
            name: None,
            handle: None,
            headline: None,
            location: None,
            content: None,
            likes: None,
            avatar: None,
            image: None,
            badge: None,
            no_badge: false,
            out: None,
            scale: None,
        }
    }

    #[test]
    fn platform_flag_parses_case_insensitively() {
        assert_eq!(Platform::from_str("LinkedIn").unwrap(), Platform::LinkedIn);
        assert_eq!(Platform::from_str("instagram").unwrap(), Platform::Instagram);
        assert!(Platform::from_str("myspace").is_err());
    }

    #[test]
    fn capture_writes_a_decodable_png() -> Result<()> {
        let temp = TempDir::new()?;
        let paths = temp_paths(&temp);
        paths.ensure_directories()?;
        let config = Arc::new(AppConfig::default());

        let mut args = base_args();
        args.content = Some("Testing #postmock from the CLI".to_string());
        args.out = Some(temp.path().join("shots"));
        args.scale = Some(1);
        capture_post(config.clone(), paths, args)?;

        let entries: Vec<_> = std::fs::read_dir(temp.path().join("shots"))?
            .collect::<std::io::Result<Vec<_>>>()?;
        assert_eq!(entries.len(), 1);
        let name = entries[0].file_name().into_string().unwrap();
        assert!(name.starts_with("twitter-post-"));
        assert!(name.ends_with(".png"));

        let decoded = image::load_from_memory(&std::fs::read(entries[0].path())?)?.to_rgba8();
        // One pixel block per surface cell at scale 1.
        assert_eq!(decoded.width(), u32::from(config.capture.card_width) * 10);
        Ok(())
    }

    #[test]
    fn capture_fails_cleanly_on_missing_attachment() -> Result<()> {
        let temp = TempDir::new()?;
        let paths = temp_paths(&temp);
        paths.ensure_directories()?;

        let mut args = base_args();
        args.image = Some(temp.path().join("missing.png"));
        let err = capture_post(Arc::new(AppConfig::default()), paths, args)
            .expect_err("attachment must fail");
        assert!(err.to_string().contains("attaching post image"));
        Ok(())
    }
}
