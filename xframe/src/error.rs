use core::fmt;
use std::net::SocketAddr;

#[derive(Debug)]
pub enum Error {
    /// Datagram too short to carry a header and at least one payload byte.
    MalformedHeader { len: usize },
    ChecksumMismatch { frame_id: u32, sequence: u16 },
    /// Sequence number not below the fragment count the header announces.
    SequenceOutOfRange {
        frame_id: u32,
        sequence: u16,
        total_fragments: u16,
    },
    /// Completion check found a sequence number with no stored payload.
    IncompleteFrame { frame_id: u32, missing: u16 },
    FrameTooLarge { fragments: usize },
    EmptyFrame,
    SendFailure {
        addr: SocketAddr,
        source: std::io::Error,
    },
    RegistryUnavailable,
    BufferTooSmall,
    InvalidConfig(&'static str),
    Io(std::io::Error),
}

impl Error {
    /// Returns true for errors that only cost one packet, one frame or one
    /// send cycle. The loops log these and keep running.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::Io(_) | Error::InvalidConfig(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedHeader { len } => {
                write!(f, "Malformed header: datagram of {} bytes", len)
            }
            Error::ChecksumMismatch { frame_id, sequence } => write!(
                f,
                "CRC checksum mismatch for fragment {} of frame {}",
                sequence, frame_id
            ),
            Error::SequenceOutOfRange {
                frame_id,
                sequence,
                total_fragments,
            } => write!(
                f,
                "Fragment {} of frame {} out of range: {} fragments announced",
                sequence, frame_id, total_fragments
            ),
            Error::IncompleteFrame { frame_id, missing } => write!(
                f,
                "Incomplete frame {}: fragment {} missing at assembly",
                frame_id, missing
            ),
            Error::FrameTooLarge { fragments } => {
                write!(f, "Frame too large: {} fragments needed", fragments)
            }
            Error::EmptyFrame => write!(f, "Empty frame"),
            Error::SendFailure { addr, source } => {
                write!(f, "Send to {} failed: {}", addr, source)
            }
            Error::RegistryUnavailable => write!(f, "Client registry unavailable"),
            Error::BufferTooSmall => write!(f, "Buffer too small"),
            Error::InvalidConfig(reason) => write!(f, "Invalid config: {}", reason),
            Error::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::SendFailure { source, .. } => Some(source),
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable() {
        assert!(Error::MalformedHeader { len: 10 }.is_recoverable());
        assert!(Error::ChecksumMismatch { frame_id: 1, sequence: 0 }.is_recoverable());
        assert!(Error::FrameTooLarge { fragments: 70000 }.is_recoverable());
        assert!(
            Error::SequenceOutOfRange { frame_id: 1, sequence: 0, total_fragments: 0 }
                .is_recoverable()
        );
        assert!(!Error::Io(std::io::Error::other("boom")).is_recoverable());
    }

    #[test]
    fn test_display() {
        let err = Error::IncompleteFrame { frame_id: 7, missing: 2 };
        assert_eq!(
            err.to_string(),
            "Incomplete frame 7: fragment 2 missing at assembly"
        );
    }
}
