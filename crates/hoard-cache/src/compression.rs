//! Compressors for archived files.
//!
//! [`ShellCompressor`] delegates to an external program (bzip2 by default);
//! [`CodecCompressor`] compresses in-process. Both write `<source>.<ext>`.

use crate::types::CompressionType;
use async_trait::async_trait;
use hoard_core::ports::{Compressor, compressed_path};
use hoard_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error};

/// Runs an external compressor on the source file.
///
/// The program is invoked as `<program> <args...> <source>` and must leave
/// its output at `<source>.<extension>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellCompressor {
    pub program: String,
    pub args: Vec<String>,
    pub extension: String,
}

impl Default for ShellCompressor {
    fn default() -> Self {
        Self::bzip2()
    }
}

impl ShellCompressor {
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            extension: extension.into(),
        }
    }

    /// `bzip2 -k -f <source>`: keep the source, overwrite stale output.
    pub fn bzip2() -> Self {
        Self::new("bzip2", vec!["-k".to_string(), "-f".to_string()], "bz2")
    }
}

#[async_trait]
impl Compressor for ShellCompressor {
    fn extension(&self) -> &str {
        &self.extension
    }

    async fn compress(&self, source: &Path) -> Result<PathBuf> {
        let output_path = compressed_path(source, &self.extension);
        debug!(program = %self.program, source = %source.display(), "Running compressor");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                Error::CompressionFailed(format!("Failed to spawn {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(program = %self.program, status = %output.status, stderr = %stderr, "Compressor failed");
            let _ = tokio::fs::remove_file(&output_path).await;
            return Err(Error::CompressionFailed(format!(
                "{} exited with {}: {}",
                self.program, output.status, stderr
            )));
        }

        if !tokio::fs::try_exists(&output_path).await.unwrap_or(false) {
            return Err(Error::CompressionFailed(format!(
                "{} produced no output at {}",
                self.program,
                output_path.display()
            )));
        }

        Ok(output_path)
    }
}

/// Compresses in-process with a streaming codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodecCompressor {
    codec: CompressionType,
}

impl CodecCompressor {
    pub fn new(codec: CompressionType) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> CompressionType {
        self.codec
    }
}

#[async_trait]
impl Compressor for CodecCompressor {
    fn extension(&self) -> &str {
        self.codec.extension()
    }

    async fn compress(&self, source: &Path) -> Result<PathBuf> {
        let codec = self.codec;
        let source = source.to_path_buf();
        let output_path = compressed_path(&source, codec.extension());
        let target = output_path.clone();

        let result = tokio::task::spawn_blocking(move || compress_file(&source, &target, codec))
            .await
            .map_err(|e| Error::Internal(format!("Compression task panicked: {}", e)))?;

        if let Err(e) = result {
            let _ = tokio::fs::remove_file(&output_path).await;
            return Err(Error::CompressionFailed(e.to_string()));
        }
        Ok(output_path)
    }
}

fn compress_file(source: &Path, target: &Path, codec: CompressionType) -> std::io::Result<()> {
    let mut reader = BufReader::new(File::open(source)?);
    let writer = BufWriter::new(File::create(target)?);

    match codec {
        CompressionType::Zstd => {
            let mut encoder = zstd::stream::write::Encoder::new(writer, 3)?;
            std::io::copy(&mut reader, &mut encoder)?;
            encoder.finish()?.flush()?;
        }
        CompressionType::Gzip => {
            let mut encoder =
                flate2::write::GzEncoder::new(writer, flate2::Compression::default());
            std::io::copy(&mut reader, &mut encoder)?;
            encoder.finish()?.flush()?;
        }
        CompressionType::Lz4 => {
            let mut encoder = lz4_flex::frame::FrameEncoder::new(writer);
            std::io::copy(&mut reader, &mut encoder)?;
            encoder.finish().map_err(std::io::Error::other)?.flush()?;
        }
    }
    Ok(())
}

/// Decompress data produced by [`CodecCompressor`].
pub fn decompress(data: &[u8], codec: CompressionType) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let read = match codec {
        CompressionType::Zstd => {
            zstd::stream::read::Decoder::new(data).and_then(|mut d| d.read_to_end(&mut output))
        }
        CompressionType::Gzip => flate2::read::GzDecoder::new(data).read_to_end(&mut output),
        CompressionType::Lz4 => lz4_flex::frame::FrameDecoder::new(data).read_to_end(&mut output),
    };
    read.map_err(|e| Error::Internal(format!("{:?} decompression failed: {}", codec, e)))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn staged(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        tokio::fs::write(&path, data).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_codec_compressors_write_sibling_file() {
        let dir = tempfile::tempdir().unwrap();
        let data = b"Hello, World! This is a test of compression.".repeat(64);
        let source = staged(dir.path(), "notes.txt", &data).await;

        for codec in [CompressionType::Zstd, CompressionType::Gzip, CompressionType::Lz4] {
            let compressor = CodecCompressor::new(codec);
            let output = compressor.compress(&source).await.unwrap();

            assert_eq!(output, dir.path().join(format!("notes.txt.{}", codec.extension())));
            let compressed = tokio::fs::read(&output).await.unwrap();
            assert!(compressed.len() < data.len());
            assert_eq!(decompress(&compressed, codec).unwrap(), data);
        }
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_codec_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let compressor = CodecCompressor::new(CompressionType::Gzip);

        let err = compressor
            .compress(&dir.path().join("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CompressionFailed(_)));
        assert!(!dir.path().join("missing.gz").exists());
    }

    #[tokio::test]
    async fn test_shell_compressor_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let source = staged(dir.path(), "a.txt", b"hello").await;
        let compressor = ShellCompressor::new("false", vec![], "bz2");

        let err = compressor.compress(&source).await.unwrap_err();
        assert!(matches!(err, Error::CompressionFailed(_)));
    }

    #[tokio::test]
    async fn test_shell_compressor_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let source = staged(dir.path(), "a.txt", b"hello").await;
        let compressor = ShellCompressor::new("hoard-no-such-compressor", vec![], "bz2");

        let err = compressor.compress(&source).await.unwrap_err();
        assert!(matches!(err, Error::CompressionFailed(_)));
    }

    #[tokio::test]
    async fn test_shell_compressor_without_output_fails() {
        let dir = tempfile::tempdir().unwrap();
        let source = staged(dir.path(), "a.txt", b"hello").await;
        // exits zero but writes nothing
        let compressor = ShellCompressor::new("true", vec![], "bz2");

        let err = compressor.compress(&source).await.unwrap_err();
        assert!(matches!(err, Error::CompressionFailed(_)));
    }

    #[tokio::test]
    async fn test_shell_compressor_copy_program() {
        let dir = tempfile::tempdir().unwrap();
        let source = staged(dir.path(), "a.txt", b"hello").await;
        // `sh -c 'cp "$0" "$0.copy"' <source>` stands in for a real compressor
        let compressor = ShellCompressor::new(
            "sh",
            vec!["-c".to_string(), "cp \"$0\" \"$0.copy\"".to_string()],
            "copy",
        );

        let output = compressor.compress(&source).await.unwrap();
        assert_eq!(output, dir.path().join("a.txt.copy"));
        assert_eq!(tokio::fs::read(&output).await.unwrap(), b"hello");
    }
}
