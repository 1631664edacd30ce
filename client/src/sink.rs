use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::Instant;

use log::{debug, info, warn};
use xframe::FrameSink;

const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

/// Logs every frame and optionally keeps the latest one on disk.
pub struct LogSink {
    output: Option<PathBuf>,
    frames: u64,
    bytes: u64,
    limit: Option<u64>,
    started: Instant,
}

impl LogSink {
    pub fn new(output: Option<PathBuf>) -> Self {
        Self {
            output,
            frames: 0,
            bytes: 0,
            limit: None,
            started: Instant::now(),
        }
    }

    /// Stop after `limit` frames.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn report(&self) {
        let elapsed = self.started.elapsed().as_secs_f64();
        info!("=== Receive Complete ===");
        info!("Frames: {}", self.frames);
        info!("Total received: {} KB", self.bytes / 1024);
        if elapsed > 0.0 {
            info!("Rate: {:.2} frames/s", self.frames as f64 / elapsed);
        }
    }
}

/// True if `frame` starts with the JPEG start-of-image marker.
pub fn looks_like_jpeg(frame: &[u8]) -> bool {
    frame.starts_with(&JPEG_SOI)
}

impl FrameSink for LogSink {
    fn on_frame(&mut self, frame: Vec<u8>) -> ControlFlow<()> {
        self.frames += 1;
        self.bytes += frame.len() as u64;

        if looks_like_jpeg(&frame) {
            debug!("Frame {}: {} bytes", self.frames, frame.len());
        } else {
            warn!("Frame {}: {} bytes, invalid JPEG header", self.frames, frame.len());
        }

        if let Some(path) = &self.output
            && let Err(e) = std::fs::write(path, &frame)
        {
            warn!("Failed to write frame to {:?}: {}", path, e);
        }

        match self.limit {
            Some(limit) if self.frames >= limit => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_like_jpeg() {
        assert!(looks_like_jpeg(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(!looks_like_jpeg(&[0xFF]));
        assert!(!looks_like_jpeg(b"GIF89a"));
    }

    #[test]
    fn test_limit_stops_sink() {
        let mut sink = LogSink::new(None).with_limit(2);
        assert!(sink.on_frame(vec![0xFF, 0xD8]).is_continue());
        assert!(sink.on_frame(vec![1, 2, 3]).is_break());
        assert_eq!(sink.frames, 2);
    }

    #[test]
    fn test_writes_latest_frame() {
        let path = std::env::temp_dir().join(format!("xframe-sink-{}.jpg", std::process::id()));
        let mut sink = LogSink::new(Some(path.clone()));
        let _ = sink.on_frame(vec![0xFF, 0xD8, 1]);
        let _ = sink.on_frame(vec![0xFF, 0xD8, 2]);

        assert_eq!(std::fs::read(&path).unwrap(), vec![0xFF, 0xD8, 2]);
        std::fs::remove_file(&path).unwrap();
    }
}
