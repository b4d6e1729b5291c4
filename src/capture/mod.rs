use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use image::RgbaImage;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use thiserror::Error;
use time::OffsetDateTime;

use crate::config::themes::Rgb;
use crate::post::Platform;

pub mod cells;
pub mod service;

pub use cells::{CellRasterizer, CellRasterizerFactory};
pub use service::{RasterizerService, ServiceState};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("loading rasterizer: {0}")]
    LibraryLoad(String),
    #[error("rasterizing card: {0}")]
    Rasterize(String),
    #[error("delivering capture to {path}: {source}")]
    Deliver {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An off-screen card rendering. The cell buffer carries the text layout;
/// overlays carry decoded image pixels that replace their placeholder
/// regions in the export.
pub struct CardSurface {
    pub buffer: Buffer,
    pub overlays: Vec<ImageOverlay>,
}

pub struct ImageOverlay {
    pub area: Rect,
    pub pixels: RgbaImage,
}

#[derive(Debug, Clone, Copy)]
pub struct RasterOptions {
    /// Fill behind the card. Passed explicitly so transparent regions come
    /// out deterministic.
    pub background: Rgb,
    /// Output resolution multiplier, independent of the surface size.
    pub scale: u32,
}

/// Turns a card surface into an encoded PNG.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, surface: &CardSurface, options: RasterOptions) -> Result<Vec<u8>, CaptureError>;
}

/// Produces a rasterizer on demand. The service loads through this exactly
/// once per lifecycle, so alternative backends slot in without touching the
/// capture flow.
pub trait RasterizerFactory: Send + Sync {
    fn load(&self) -> Result<Arc<dyn Rasterizer>, CaptureError>;
}

/// Final delivery of an encoded capture.
pub trait Downloader: Send {
    fn deliver(&self, filename: &str, png: &[u8]) -> Result<PathBuf, CaptureError>;
}

/// Writes captures into a fixed output directory, creating it on first use.
pub struct FileDownloader {
    output_dir: PathBuf,
}

impl FileDownloader {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }
}

impl Downloader for FileDownloader {
    fn deliver(&self, filename: &str, png: &[u8]) -> Result<PathBuf, CaptureError> {
        let path = self.output_dir.join(filename);
        fs::create_dir_all(&self.output_dir).map_err(|source| CaptureError::Deliver {
            path: self.output_dir.clone(),
            source,
        })?;
        fs::write(&path, png).map_err(|source| CaptureError::Deliver {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), bytes = png.len(), "capture written");
        Ok(path)
    }
}

/// `<platform>-post-<epoch millis>.png`, matching what the export dialog of
/// a browser would have suggested.
pub fn export_filename(platform: Platform, at: OffsetDateTime) -> String {
    let millis = at.unix_timestamp_nanos() / 1_000_000;
    format!("{platform}-post-{millis}.png")
}

#[derive(Debug)]
pub enum CaptureEvent {
    Finished { path: PathBuf },
    Failed { message: String },
}

/// Runs captures on a background thread so the editor stays responsive.
/// At most one capture is in flight; requests made while one runs are
/// ignored rather than queued.
pub struct CaptureRuntime {
    service: &'static RasterizerService,
    sender: Sender<CaptureEvent>,
    receiver: Receiver<CaptureEvent>,
    in_flight: bool,
}

impl CaptureRuntime {
    pub fn new() -> Self {
        Self::with_service(RasterizerService::global())
    }

    pub fn with_service(service: &'static RasterizerService) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            service,
            sender,
            receiver,
            in_flight: false,
        }
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Starts a capture. Returns `false` without side effects when one is
    /// already running.
    pub fn request(
        &mut self,
        surface: CardSurface,
        options: RasterOptions,
        downloader: Box<dyn Downloader>,
        filename: String,
    ) -> bool {
        if self.in_flight {
            tracing::debug!("capture already in flight, ignoring request");
            return false;
        }
        self.in_flight = true;

        let service = self.service;
        let sender = self.sender.clone();
        thread::spawn(move || {
            let result = service
                .acquire()
                .and_then(|rasterizer| rasterizer.rasterize(&surface, options))
                .and_then(|png| downloader.deliver(&filename, &png));
            let event = match result {
                Ok(path) => CaptureEvent::Finished { path },
                Err(err) => {
                    tracing::error!(%err, "capture failed");
                    CaptureEvent::Failed {
                        message: err.to_string(),
                    }
                }
            };
            let _ = sender.send(event);
        });
        true
    }

    /// Drains the worker channel. Called from the event-loop tick.
    pub fn poll(&mut self) -> Option<CaptureEvent> {
        match self.receiver.try_recv() {
            Ok(event) => {
                self.in_flight = false;
                Some(event)
            }
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

impl Default for CaptureRuntime {
    fn default() -> Self {
        Self::new()
    }
}
