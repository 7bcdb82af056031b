//! Logging utilities
//!
//! This module provides a size-based rolling file writer so JSON logs can
//! go to disk without growing without bound.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Default maximum log file size (10MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default maximum number of rotated files to keep
pub const DEFAULT_MAX_FILES: usize = 5;

/// A size-based rolling file writer
///
/// Rotates the log file once it exceeds a size threshold. Rotated files get
/// a numeric suffix (app.log, app.log.1, app.log.2, ...), oldest deleted.
#[derive(Debug)]
pub struct RollingLogWriter {
    inner: Arc<Mutex<RollingInner>>,
}

#[derive(Debug)]
struct RollingInner {
    /// Base path for the log file
    base_path: PathBuf,
    /// Current log file
    file: Option<File>,
    /// Current file size
    current_size: u64,
    /// Maximum file size before rotation
    max_size: u64,
    /// Maximum number of rotated files to keep
    max_files: usize,
}

impl RollingLogWriter {
    /// Create a new rolling writer
    ///
    /// # Arguments
    /// * `path` - Base path for the log file (e.g., /var/log/pyterm.log)
    /// * `max_size` - Maximum file size in bytes before rotation
    /// * `max_files` - Maximum number of rotated files to keep
    pub fn new(path: impl AsRef<Path>, max_size: u64, max_files: usize) -> io::Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if let Some(parent) = base_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Picking up an existing file continues appending to it
        let current_size = fs::metadata(&base_path).map(|m| m.len()).unwrap_or(0);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&base_path)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(RollingInner {
                base_path,
                file: Some(file),
                current_size,
                max_size,
                max_files,
            })),
        })
    }

    /// Create a rolling writer with the default size and file count
    pub fn with_defaults(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::new(path, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_FILES)
    }
}

impl RollingInner {
    /// Shift rotated files up one index and start a fresh file
    fn rotate(&mut self) -> io::Result<()> {
        self.file = None;

        // app.log.{max-1} is deleted, every other suffix moves up by one,
        // then the live file becomes app.log.1
        for i in (1..self.max_files).rev() {
            let from = self.rotated_path(i);
            if from.exists() {
                if i + 1 >= self.max_files {
                    fs::remove_file(&from).ok();
                } else {
                    fs::rename(&from, self.rotated_path(i + 1)).ok();
                }
            }
        }

        if self.base_path.exists() {
            fs::rename(&self.base_path, self.rotated_path(1))?;
        }

        self.file = Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.base_path)?,
        );
        self.current_size = 0;

        Ok(())
    }

    /// Get the path for a rotated file
    fn rotated_path(&self, index: usize) -> PathBuf {
        let mut path = self.base_path.clone();
        let filename = path.file_name().unwrap().to_string_lossy().to_string();
        path.set_file_name(format!("{}.{}", filename, index));
        path
    }
}

impl Write for RollingLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.inner.lock().unwrap();

        if inner.current_size + buf.len() as u64 > inner.max_size {
            inner.rotate()?;
        }

        if let Some(ref mut file) = inner.file {
            let written = file.write(buf)?;
            inner.current_size += written as u64;
            Ok(written)
        } else {
            Err(io::Error::new(io::ErrorKind::Other, "Log file not open"))
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(ref mut file) = inner.file {
            file.flush()
        } else {
            Ok(())
        }
    }
}

impl Clone for RollingLogWriter {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Make the writer usable with tracing-subscriber
impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for RollingLogWriter {
    type Writer = RollingLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_writer_creation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        let writer = RollingLogWriter::with_defaults(&path).unwrap();
        assert!(path.exists());
        drop(writer);
    }

    #[test]
    fn test_writes_reach_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        let mut writer = RollingLogWriter::with_defaults(&path).unwrap();
        writer.write_all(b"Hello, World!\n").unwrap();
        writer.flush().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Hello, World!"));
    }

    #[test]
    fn test_rotation_at_size_threshold() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        // Tiny threshold so a handful of lines forces a rotation
        let mut writer = RollingLogWriter::new(&path, 100, 3).unwrap();

        for i in 0..10 {
            writeln!(writer, "Line {}: This is a test log message", i).unwrap();
        }
        writer.flush().unwrap();

        let rotated = dir.path().join("test.log.1");
        assert!(rotated.exists(), "Rotated file should exist");
    }

    #[test]
    fn test_oldest_file_is_dropped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");

        let mut writer = RollingLogWriter::new(&path, 40, 2).unwrap();

        for i in 0..20 {
            writeln!(writer, "message number {}", i).unwrap();
        }
        writer.flush().unwrap();

        // With max_files 2 only the live file and one rotation may remain
        assert!(path.exists());
        assert!(!dir.path().join("test.log.2").exists());
    }
}
