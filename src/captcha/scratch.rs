//! Short-lived captcha image file
//!
//! The captcha image is written to disk under a timestamped name, read back, and
//! removed as soon as the guard goes out of scope, on every exit path.

use chrono::Utc;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::{Builder, NamedTempFile};

/// Guard over a captcha image file; the file is deleted on drop
#[derive(Debug)]
pub struct ScratchImage {
    file: NamedTempFile,
}

impl ScratchImage {
    /// Writes `image` to `captcha_<unix seconds>_<random>.png` inside `dir`
    pub fn create(dir: &Path, image: &[u8]) -> std::io::Result<Self> {
        let prefix = format!("captcha_{}_", Utc::now().timestamp());
        let mut file = Builder::new()
            .prefix(&prefix)
            .suffix(".png")
            .tempfile_in(dir)?;
        file.write_all(image)?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Reads the whole file back
    pub fn read_back(&mut self) -> std::io::Result<Vec<u8>> {
        let handle = self.file.as_file_mut();
        handle.seek(SeekFrom::Start(0))?;
        let mut bytes = Vec::new();
        handle.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

/// Stages `image` on disk and returns the bytes read back; the file is gone on return
pub fn stage_image(dir: &Path, image: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut scratch = ScratchImage::create(dir, image)?;
    tracing::debug!("Captcha staged at {}", scratch.path().display());
    scratch.read_back()
}
