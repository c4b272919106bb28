//! Local CAPTCHA renderer
//!
//! Draws pseudo-glyphs for each character, bends rows with a sine wave,
//! sprinkles salt-and-pepper noise and crosses the text with clutter lines.

use crate::errors::{LabError, Result};
use crate::provider::SampleProvider;
use crate::types::sample::{MAX_CLUTTER, MAX_TEXT_LENGTH};
use crate::types::{Difficulty, Sample, StyleParams};
use image::{GrayImage, Luma};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Characters used for ground-truth text (ambiguous glyphs removed)
const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;

const INK: Luma<u8> = Luma([20]);
const PAPER: Luma<u8> = Luma([245]);

/// Canvas settings for rendered samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub text_length: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 160,
            height: 60,
            text_length: 5,
        }
    }
}

impl RenderSettings {
    /// Whether `text_length` glyphs fit on the canvas
    pub fn fits(&self, text_length: usize) -> bool {
        let cells = (text_length as u64 + 1) * u64::from(GLYPH_WIDTH + 1);
        cells <= u64::from(self.width) && GLYPH_HEIGHT + 2 <= self.height
    }

    /// Reject canvases that could never render a sample
    pub fn validate(&self) -> Result<()> {
        if self.text_length == 0 || self.text_length > MAX_TEXT_LENGTH {
            return Err(LabError::InvalidConfiguration(format!(
                "text_length must be between 1 and {}, got {}",
                MAX_TEXT_LENGTH, self.text_length
            )));
        }
        if !self.fits(self.text_length) {
            return Err(LabError::InvalidConfiguration(format!(
                "{}x{} canvas cannot fit {} characters",
                self.width, self.height, self.text_length
            )));
        }
        Ok(())
    }
}

/// Seeded synthetic sample provider
pub struct SyntheticProvider {
    rng: StdRng,
    settings: RenderSettings,
}

impl SyntheticProvider {
    /// Create provider seeded from OS entropy
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            settings,
        }
    }

    /// Create provider with a fixed seed
    pub fn with_seed(settings: RenderSettings, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            settings,
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    fn random_text(&mut self, length: usize) -> String {
        (0..length)
            .map(|_| CHARSET[self.rng.gen_range(0..CHARSET.len())] as char)
            .collect()
    }

    /// Draw style parameters whose implied score lands near `target`'s band
    fn style_for(&mut self, target: Difficulty) -> StyleParams {
        let (low, high) = target.band();
        let score = self.rng.gen_range(low..high);
        let jitter = 0.08;

        let noise = (score + self.rng.gen_range(-jitter..jitter)).clamp(0.0, 1.0) as f32;
        let distortion = (score + self.rng.gen_range(-jitter..jitter)).clamp(0.0, 1.0) as f32;
        let clutter = ((score * MAX_CLUTTER as f64).round() as i64 + self.rng.gen_range(-1..=1))
            .clamp(0, MAX_CLUTTER as i64) as u32;

        StyleParams {
            noise,
            distortion,
            clutter,
            text_length: self.settings.text_length,
        }
    }

    fn render(&mut self, text: &str, style: &StyleParams) -> GrayImage {
        let RenderSettings { width, height, .. } = self.settings;
        let mut canvas = GrayImage::from_pixel(width, height, PAPER);

        let chars = text.len() as u32;
        let cell = width / (chars + 1);
        let scale = (cell / (GLYPH_WIDTH + 1)).min(height / (GLYPH_HEIGHT + 2)).max(1);
        let left = (width.saturating_sub(cell * chars)) / 2;
        let top = height.saturating_sub(GLYPH_HEIGHT * scale) / 2;

        for (i, c) in text.bytes().enumerate() {
            let x0 = left + i as u32 * cell;
            let wobble = self.rng.gen_range(0..=scale);
            let rows = glyph_rows(c);
            for (gy, bits) in rows.iter().enumerate() {
                for gx in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - gx)) == 0 {
                        continue;
                    }
                    for dy in 0..scale {
                        for dx in 0..scale {
                            let x = x0 + gx * scale + dx;
                            let y = top + gy as u32 * scale + dy + wobble;
                            if x < width && y < height {
                                canvas.put_pixel(x, y, INK);
                            }
                        }
                    }
                }
            }
        }

        let mut canvas = self.distort(&canvas, style.distortion);
        self.draw_clutter(&mut canvas, style.clutter);
        self.add_noise(&mut canvas, style.noise);
        canvas
    }

    fn distort(&mut self, canvas: &GrayImage, strength: f32) -> GrayImage {
        if strength <= 0.0 {
            return canvas.clone();
        }
        let (width, height) = canvas.dimensions();
        let amplitude = strength as f64 * height as f64 / 4.0;
        let period = self.rng.gen_range(height as f64 * 0.8..height as f64 * 2.0);
        let phase = self.rng.gen_range(0.0..std::f64::consts::TAU);

        let mut out = GrayImage::from_pixel(width, height, PAPER);
        for y in 0..height {
            let shift = (amplitude * (std::f64::consts::TAU * y as f64 / period + phase).sin())
                .round() as i64;
            for x in 0..width {
                let src = x as i64 - shift;
                if src >= 0 && (src as u32) < width {
                    out.put_pixel(x, y, *canvas.get_pixel(src as u32, y));
                }
            }
        }
        out
    }

    fn draw_clutter(&mut self, canvas: &mut GrayImage, lines: u32) {
        let (width, height) = canvas.dimensions();
        for _ in 0..lines {
            let (x0, y0) = (self.rng.gen_range(0..width), self.rng.gen_range(0..height));
            let (x1, y1) = (self.rng.gen_range(0..width), self.rng.gen_range(0..height));
            let steps = (x1 as i64 - x0 as i64).abs().max((y1 as i64 - y0 as i64).abs()).max(1);
            for step in 0..=steps {
                let t = step as f64 / steps as f64;
                let x = (x0 as f64 + t * (x1 as f64 - x0 as f64)).round() as u32;
                let y = (y0 as f64 + t * (y1 as f64 - y0 as f64)).round() as u32;
                canvas.put_pixel(x.min(width - 1), y.min(height - 1), INK);
            }
        }
    }

    fn add_noise(&mut self, canvas: &mut GrayImage, noise: f32) {
        if noise <= 0.0 {
            return;
        }
        let probability = noise as f64 * 0.3;
        for pixel in canvas.pixels_mut() {
            if self.rng.gen_bool(probability) {
                *pixel = if self.rng.gen_bool(0.5) { INK } else { PAPER };
            }
        }
    }
}

impl SampleProvider for SyntheticProvider {
    fn generate(&mut self, style: &StyleParams) -> Result<Sample> {
        style.validate()?;
        if !self.settings.fits(style.text_length) {
            return Err(LabError::ProviderError(format!(
                "{}x{} canvas cannot fit {} characters",
                self.settings.width, self.settings.height, style.text_length
            )));
        }

        let text = self.random_text(style.text_length);
        let image = self.render(&text, style);
        Ok(Sample::new(image, text, *style))
    }

    fn refine(&mut self, target: Difficulty) -> Result<Sample> {
        let style = self.style_for(target);
        let achieved = style.implied_level();
        Ok(self.generate(&style)?.with_target(target, achieved))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

/// Pseudo-glyph rows for a character; every row carries at least one stroke
fn glyph_rows(c: u8) -> [u8; GLYPH_HEIGHT as usize] {
    let mut state = (c as u32).wrapping_mul(2_654_435_761) ^ 0x9E37_79B9;
    let mut rows = [0u8; GLYPH_HEIGHT as usize];
    for row in rows.iter_mut() {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        *row = ((state & 0x1F) as u8) | 0x10;
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> SyntheticProvider {
        SyntheticProvider::with_seed(RenderSettings::default(), 7)
    }

    #[test]
    fn test_generate_dimensions_and_text() {
        let mut provider = provider();
        let sample = provider.generate(&StyleParams::default()).unwrap();
        assert_eq!(sample.image().dimensions(), (160, 60));
        assert_eq!(sample.text().len(), 5);
        assert!(sample.text().bytes().all(|b| CHARSET.contains(&b)));
        assert!(sample.target().is_none());
    }

    #[test]
    fn test_generate_rejects_invalid_style() {
        let mut provider = provider();
        let style = StyleParams {
            distortion: 2.0,
            ..Default::default()
        };
        assert!(matches!(provider.generate(&style), Err(LabError::ProviderError(_))));
    }

    #[test]
    fn test_generate_rejects_text_wider_than_canvas() {
        let settings = RenderSettings {
            width: 20,
            height: 60,
            text_length: 5,
        };
        let mut provider = SyntheticProvider::with_seed(settings, 1);
        assert!(provider.generate(&StyleParams::default()).is_err());
    }

    #[test]
    fn test_render_settings_validation() {
        assert!(RenderSettings::default().validate().is_ok());

        for settings in [
            RenderSettings { width: 20, ..Default::default() },
            RenderSettings { height: 8, ..Default::default() },
            RenderSettings { width: 0, height: 0, text_length: 5 },
            RenderSettings { text_length: 0, ..Default::default() },
            RenderSettings { width: 4000, text_length: MAX_TEXT_LENGTH + 1, ..Default::default() },
        ] {
            assert!(
                matches!(settings.validate(), Err(LabError::InvalidConfiguration(_))),
                "{:?} accepted",
                settings
            );
        }
    }

    #[test]
    fn test_refine_sets_target_and_achieved() {
        let mut provider = provider();
        for target in Difficulty::ALL {
            let sample = provider.refine(target).unwrap();
            assert_eq!(sample.target(), Some(target));
            assert_eq!(sample.achieved(), sample.style().implied_level());
        }
    }

    #[test]
    fn test_refine_mostly_lands_in_band() {
        let mut provider = provider();
        let hits = (0..50)
            .filter(|_| provider.refine(Difficulty::Hard).unwrap().achieved() == Difficulty::Hard)
            .count();
        assert!(hits > 25, "only {} of 50 hard draws landed hard", hits);
    }

    #[test]
    fn test_same_seed_same_text() {
        let a = provider().generate(&StyleParams::default()).unwrap();
        let b = provider().generate(&StyleParams::default()).unwrap();
        assert_eq!(a.text(), b.text());
    }

    #[test]
    fn test_glyph_rows_nonempty() {
        for &c in CHARSET {
            assert!(glyph_rows(c).iter().all(|row| *row != 0));
        }
    }
}
