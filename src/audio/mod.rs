//! Audio output assembly.
//!
//! The service returns self-delimiting MP3 frames for each chunk, so
//! assembling the narration is appending every chunk's bytes to the output
//! file in order. No re-encoding happens here.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Append-only sink for synthesized audio chunks.
pub struct AudioSink {
    writer: BufWriter<File>,
    path: PathBuf,
    bytes_written: u64,
}

impl AudioSink {
    /// Create the output file, replacing any previous one.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
        }

        let file = File::create(path)
            .with_context(|| format!("Failed to create output file {}", path.display()))?;

        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            bytes_written: 0,
        })
    }

    /// Append one chunk's audio bytes.
    pub fn append(&mut self, audio: &[u8]) -> Result<()> {
        self.writer
            .write_all(audio)
            .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        self.bytes_written += audio.len() as u64;
        Ok(())
    }

    /// Flush and return the total number of bytes written.
    pub fn finish(mut self) -> Result<u64> {
        self.writer
            .flush()
            .with_context(|| format!("Failed to flush {}", self.path.display()))?;
        Ok(self.bytes_written)
    }
}
