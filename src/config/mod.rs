use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};

use crate::post::{Platform, PostState, TextField};

pub mod themes;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "Postmock";
const APP_NAME: &str = "postmock";

/// Upscale factors observed to produce usable exports; anything outside is
/// clamped on load.
pub const MIN_SCALE: u32 = 1;
pub const MAX_SCALE: u32 = 4;

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            default_cfg.post_load();
            self.write_default_config(&default_cfg)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load();
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub export_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var("POSTMOCK_CONFIG").ok().map(PathBuf::from);
        let override_data = env::var("POSTMOCK_DATA").ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let data_dir = override_data.unwrap_or_else(|| project_dirs.data_dir().to_path_buf());

        // Exports land next to the user's other downloads when possible.
        let export_dir = UserDirs::new()
            .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| data_dir.join("exports"));
        let log_dir = data_dir.join("logs");

        Ok(Self {
            config_dir,
            config_file,
            data_dir,
            export_dir,
            log_dir,
        })
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.data_dir, &self.log_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub default_platform: Platform,
    pub profile: ProfileConfig,
    pub capture: CaptureConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_platform: Platform::Twitter,
            profile: ProfileConfig::default(),
            capture: CaptureConfig::default(),
        }
    }
}

impl AppConfig {
    fn post_load(&mut self) {
        let clamped = self.capture.scale.clamp(MIN_SCALE, MAX_SCALE);
        if clamped != self.capture.scale {
            tracing::warn!(
                configured = self.capture.scale,
                clamped,
                "capture scale out of range, clamping"
            );
            self.capture.scale = clamped;
        }
        if self.capture.card_width < 40 {
            tracing::warn!(
                configured = self.capture.card_width,
                "card width too narrow for the post layout, using 40"
            );
            self.capture.card_width = 40;
        }
    }

    /// Builds the initial editing session, overlaying configured profile
    /// defaults on the built-in ones.
    pub fn seed_state(&self) -> PostState {
        let mut state = PostState::default();
        state.platform = self.default_platform;
        state.theme = self.default_platform.default_theme();
        for (field, value) in [
            (TextField::DisplayName, &self.profile.display_name),
            (TextField::Handle, &self.profile.handle),
            (TextField::Headline, &self.profile.headline),
            (TextField::Location, &self.profile.location),
        ] {
            if let Some(value) = value {
                state = state.with_text(field, value.clone());
            }
        }
        state
    }
}

/// Identity defaults seeded into every new session. Unset entries keep the
/// built-in sample identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub display_name: Option<String>,
    pub handle: Option<String>,
    pub headline: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Output resolution multiplier, independent of on-screen size.
    pub scale: u32,
    /// Width of the off-screen card surface, in terminal cells.
    pub card_width: u16,
    /// Where exported images are written; defaults to the user's download
    /// directory when unset.
    pub output_dir: Option<PathBuf>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            scale: 3,
            card_width: 60,
            output_dir: None,
        }
    }
}

impl CaptureConfig {
    pub fn resolve_output_dir(&self, paths: &ConfigPaths) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| paths.export_dir.clone())
    }
}
