use std::path::PathBuf;

use log::{trace, warn};
use xframe::FrameSource;

/// Re-reads a file every cycle.
///
/// Pair it with a capture process that keeps overwriting the same JPEG.
/// The read blocks, so it is moved off the async scheduler with
/// `block_in_place`; this needs the multi-threaded runtime.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl FrameSource for FileSource {
    fn next_frame(&mut self) -> Option<Vec<u8>> {
        match tokio::task::block_in_place(|| std::fs::read(&self.path)) {
            Ok(data) if data.is_empty() => {
                warn!("Captured frame is empty: {:?}", self.path);
                None
            }
            Ok(data) => {
                trace!("Read {} bytes from {:?}", data.len(), self.path);
                Some(data)
            }
            Err(e) => {
                warn!("Error capturing frame from {:?}: {}", self.path, e);
                None
            }
        }
    }
}

/// Synthetic frames for running without a camera.
///
/// Each frame is wrapped in JPEG start/end markers so clients that sniff
/// for `FF D8` accept it, and its body changes every frame.
pub struct PatternSource {
    size: usize,
    counter: u8,
}

impl PatternSource {
    pub fn new(size: usize) -> Self {
        Self { size: size.max(4), counter: 0 }
    }
}

impl FrameSource for PatternSource {
    fn next_frame(&mut self) -> Option<Vec<u8>> {
        let seed = self.counter;
        self.counter = self.counter.wrapping_add(1);

        let mut frame = Vec::with_capacity(self.size);
        frame.extend_from_slice(&[0xFF, 0xD8]);
        frame.extend((0..self.size - 4).map(|i| (i as u8).wrapping_add(seed)));
        frame.extend_from_slice(&[0xFF, 0xD9]);
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_source_frames() {
        let mut source = PatternSource::new(2600);
        let a = source.next_frame().unwrap();
        let b = source.next_frame().unwrap();

        assert_eq!(a.len(), 2600);
        assert_eq!(&a[..2], &[0xFF, 0xD8]);
        assert_eq!(&a[2598..], &[0xFF, 0xD9]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_file_source_missing_file() {
        let mut source = FileSource::new(PathBuf::from("/nonexistent/frame.jpg"));
        assert!(source.next_frame().is_none());
    }

    #[test]
    fn test_file_source_reads_each_cycle() {
        let path = std::env::temp_dir().join(format!("xframe-source-{}.bin", std::process::id()));
        std::fs::write(&path, b"first").unwrap();
        let mut source = FileSource::new(path.clone());
        assert_eq!(source.next_frame().unwrap(), b"first");

        std::fs::write(&path, b"second").unwrap();
        assert_eq!(source.next_frame().unwrap(), b"second");

        std::fs::write(&path, b"").unwrap();
        assert!(source.next_frame().is_none());

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_file_source_on_runtime_worker() {
        let path = std::env::temp_dir().join(format!("xframe-worker-{}.bin", std::process::id()));
        std::fs::write(&path, b"frame").unwrap();

        let mut source = FileSource::new(path.clone());
        assert_eq!(source.next_frame().unwrap(), b"frame");

        std::fs::remove_file(&path).unwrap();
    }
}
