//! Sample and session export
//!
//! Samples are written as PNG under `{text}_{achieved level}.png`; session
//! summaries as pretty-printed JSON.

use crate::errors::Result;
use crate::refinement::SessionSummary;
use crate::types::Sample;
use image::{GrayImage, ImageFormat};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Download name for a sample
pub fn file_name(sample: &Sample) -> String {
    let text: String = sample
        .text()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    let text = if text.is_empty() { "sample".to_string() } else { text };
    format!("{}_{}.png", text, sample.achieved())
}

/// Encode an image as a PNG byte stream
pub fn encode_png(image: &GrayImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Write a sample into `dir`, returning the file path
pub fn save_sample(sample: &Sample, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name(sample));
    fs::write(&path, encode_png(sample.image())?)?;
    tracing::info!(path = %path.display(), "sample exported");
    Ok(path)
}

/// Write a session summary as JSON
pub fn save_report(summary: &SessionSummary, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_string_pretty(summary)?)?;
    tracing::info!(path = %path.display(), "session report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Difficulty, StyleParams};

    #[test]
    fn test_file_name_uses_text_and_level() {
        let sample = Sample::new(GrayImage::new(4, 4), "K7QP", StyleParams::default())
            .with_target(Difficulty::Hard, Difficulty::Medium);
        assert_eq!(file_name(&sample), "K7QP_medium.png");
    }

    #[test]
    fn test_file_name_strips_path_characters() {
        let sample = Sample::new(GrayImage::new(4, 4), "../..", StyleParams::default());
        assert!(file_name(&sample).starts_with("sample_"));
    }

    #[test]
    fn test_encode_png_signature() {
        let bytes = encode_png(&GrayImage::new(8, 8)).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
