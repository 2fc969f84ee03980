use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use chrono::Utc;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use uuid::Uuid;

use crate::ensemble::HEALTHY;

#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("overlay encode failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("overlay write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders the severity-tinted, annotated artifact for a diagnosis and
/// persists it under a unique time-derived name.
pub struct OverlayRenderer {
    artifact_dir: PathBuf,
    font: Option<FontVec>,
}

impl OverlayRenderer {
    /// The font is loaded once at construction; when none is available the
    /// text annotation is skipped and the tint still renders.
    pub fn new(artifact_dir: impl Into<PathBuf>, font_path: Option<&Path>) -> Self {
        let font = font_path
            .and_then(|path| match std::fs::read(path) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    log::warn!("overlay font {} unreadable: {e}", path.display());
                    None
                }
            })
            .and_then(|bytes| FontVec::try_from_vec(bytes).ok());
        if font.is_none() {
            log::warn!("no overlay font available; annotations will be skipped");
        }
        Self {
            artifact_dir: artifact_dir.into(),
            font,
        }
    }

    /// Composes and persists the overlay, returning the artifact file name.
    pub fn render(
        &self,
        image: &DynamicImage,
        disease: &str,
        severity_percent: f64,
    ) -> Result<String, OverlayError> {
        let composed = self.compose(image, disease, severity_percent);

        let file_name = format!(
            "disease_overlay_{}_{}.png",
            Utc::now().format("%Y%m%d_%H%M%S"),
            Uuid::new_v4()
        );
        std::fs::create_dir_all(&self.artifact_dir)?;
        let path = self.artifact_dir.join(&file_name);
        composed.save(&path)?;
        Ok(file_name)
    }

    /// Pure composition step: identical inputs produce identical pixels.
    /// The healthy sentinel passes the source image through untouched.
    pub fn compose(
        &self,
        image: &DynamicImage,
        disease: &str,
        severity_percent: f64,
    ) -> RgbaImage {
        let mut canvas = image.to_rgba8();
        if disease == HEALTHY {
            return canvas;
        }

        let severity = severity_percent.clamp(0.0, 100.0);
        let tint = severity_color(severity);
        let alpha = severity / 100.0;
        for pixel in canvas.pixels_mut() {
            for channel in 0..3 {
                let original = pixel.0[channel] as f64;
                let overlay = tint.0[channel] as f64;
                pixel.0[channel] = (original * (1.0 - alpha) + overlay * alpha).round() as u8;
            }
        }

        if let Some(font) = &self.font {
            let text = format!("{disease}: {severity:.1}% severity");
            draw_text_mut(
                &mut canvas,
                Rgba([255, 255, 255, 255]),
                10,
                10,
                PxScale::from(24.0),
                font,
                &text,
            );
        }

        canvas
    }
}

/// Marker color for one of the four severity brackets.
fn severity_color(severity: f64) -> Rgba<u8> {
    if severity < 25.0 {
        Rgba([0, 255, 0, 255])
    } else if severity < 50.0 {
        Rgba([255, 255, 0, 255])
    } else if severity < 75.0 {
        Rgba([255, 165, 0, 255])
    } else {
        Rgba([255, 0, 0, 255])
    }
}
