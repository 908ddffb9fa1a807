//! Compression and container detection by magic bytes
//!
//! Detection never consumes the stream: the sampled prefix is replayed in
//! front of the remaining bytes, so the returned reader yields the stream
//! from its first byte.

use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;
use std::fmt;
use std::io::{self, Chain, Cursor, Read};
use xz2::read::XzDecoder;

use crate::error::{CoreError, Result};

/// Number of leading bytes sampled for detection (one tar header block).
pub const SAMPLE_LEN: usize = 512;

const TAR_MAGIC_OFFSET: usize = 257;
const TAR_CHECKSUM: std::ops::Range<usize> = 148..156;

/// A reader with its sampled prefix pushed back in front.
pub type Rewound<R> = Chain<Cursor<Vec<u8>>, R>;

/// Compression codec wrapping an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Bzip2,
    Zstd,
    Xz,
}

impl Compression {
    /// Identify a codec from the leading bytes of a stream.
    #[must_use]
    pub fn detect(head: &[u8]) -> Option<Self> {
        if head.starts_with(&[0x1f, 0x8b]) {
            Some(Compression::Gzip)
        } else if head.starts_with(b"BZh") {
            Some(Compression::Bzip2)
        } else if head.starts_with(&[0x28, 0xb5, 0x2f, 0xfd]) {
            Some(Compression::Zstd)
        } else if head.starts_with(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]) {
            Some(Compression::Xz)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::Gzip => "gz",
            Compression::Bzip2 => "bzip2",
            Compression::Zstd => "zstd",
            Compression::Xz => "xz",
        }
    }
}

/// Name a compressor that is recognized but has no decoder here.
fn unsupported_compression(head: &[u8]) -> Option<&'static str> {
    if head.starts_with(&[0x04, 0x22, 0x4d, 0x18]) {
        Some("lz4")
    } else if head.starts_with(&[0x1f, 0x9d]) {
        Some("z")
    } else {
        None
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Container format holding the archive entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Tar,
    Zip,
}

impl Container {
    /// Identify a container from the leading bytes of a (decompressed) stream.
    ///
    /// Returns `Err` with the name of a recognized container this crate
    /// cannot read, or with a hex rendering of the leading bytes.
    pub fn detect(head: &[u8]) -> Result<Self> {
        if head.starts_with(b"PK\x03\x04")
            || head.starts_with(b"PK\x05\x06")
            || head.starts_with(b"PK\x07\x08")
        {
            return Ok(Container::Zip);
        }
        if is_tar_header(head) {
            return Ok(Container::Tar);
        }

        let known = if head.starts_with(&[b'7', b'z', 0xbc, 0xaf, 0x27, 0x1c]) {
            Some("7z")
        } else if head.starts_with(b"!<arch>\n") {
            Some("ar")
        } else if head.starts_with(b"070701")
            || head.starts_with(b"070702")
            || head.starts_with(b"070707")
            || head.starts_with(&[0xc7, 0x71])
            || head.starts_with(&[0x71, 0xc7])
        {
            Some("cpio")
        } else {
            None
        };

        match known {
            Some(kind) => Err(CoreError::UnsupportedArchive {
                kind: kind.to_string(),
            }),
            None => Err(CoreError::UnrecognizedArchive {
                leading: hex_prefix(head, 8),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Container::Tar => "tar",
            Container::Zip => "zip",
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Both layers of a detected archive stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedFormat {
    pub compression: Option<Compression>,
    pub container: Container,
}

impl fmt::Display for DetectedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.compression {
            Some(compression) => write!(f, "{}+{}", self.container, compression),
            None => write!(f, "{}", self.container),
        }
    }
}

/// Read up to `len` leading bytes without losing them.
pub fn sample<R: Read>(mut reader: R, len: usize) -> io::Result<(Vec<u8>, Rewound<R>)> {
    let mut head = Vec::with_capacity(len);
    reader.by_ref().take(len as u64).read_to_end(&mut head)?;
    let rewound = Cursor::new(head.clone()).chain(reader);
    Ok((head, rewound))
}

/// Unwrap the compression layer of a stream, if any.
///
/// An unknown or absent codec is not an error: the stream is passed
/// through as uncompressed.
pub fn decompress<'a, R: Read + 'a>(
    reader: R,
) -> Result<(Option<Compression>, Box<dyn Read + 'a>)> {
    let (head, rewound) = sample(reader, SAMPLE_LEN)?;
    let compression = Compression::detect(&head);

    let stream: Box<dyn Read + 'a> = match compression {
        Some(Compression::Gzip) => Box::new(MultiGzDecoder::new(rewound)),
        Some(Compression::Bzip2) => Box::new(MultiBzDecoder::new(rewound)),
        Some(Compression::Zstd) => Box::new(zstd::stream::read::Decoder::new(rewound)?),
        Some(Compression::Xz) => Box::new(XzDecoder::new_multi_decoder(rewound)),
        None => {
            if let Some(kind) = unsupported_compression(&head) {
                return Err(CoreError::UnsupportedCompression {
                    kind: kind.to_string(),
                });
            }
            tracing::debug!("Unknown type of compressed stream, reading it as uncompressed");
            Box::new(rewound)
        }
    };

    if let Some(compression) = compression {
        tracing::debug!("Detected {} compressed stream", compression);
    }

    Ok((compression, stream))
}

/// Detect both layers of an archive stream.
///
/// The compression layer is always unwrapped before the container is
/// inspected. The returned reader yields the decompressed container bytes
/// from the start.
pub fn detect<'a, R: Read + 'a>(
    reader: R,
) -> Result<(DetectedFormat, Rewound<Box<dyn Read + 'a>>)> {
    let (compression, stream) = decompress(reader)?;
    let (head, rewound) = sample(stream, SAMPLE_LEN)?;
    let container = Container::detect(&head)?;

    let format = DetectedFormat {
        compression,
        container,
    };
    tracing::debug!("Detected archive format {}", format);
    Ok((format, rewound))
}

fn is_tar_header(block: &[u8]) -> bool {
    if block.len() >= TAR_MAGIC_OFFSET + 5
        && &block[TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + 5] == b"ustar"
    {
        return true;
    }
    // Pre-POSIX (v7) headers carry no magic; accept them on a valid checksum.
    if block.len() < SAMPLE_LEN || block[0] == 0 {
        return false;
    }
    let Some(recorded) = parse_octal(&block[TAR_CHECKSUM]) else {
        return false;
    };
    let computed: u64 = block[..SAMPLE_LEN]
        .iter()
        .enumerate()
        .map(|(i, b)| {
            if TAR_CHECKSUM.contains(&i) {
                u64::from(b' ')
            } else {
                u64::from(*b)
            }
        })
        .sum();
    recorded == computed
}

fn parse_octal(field: &[u8]) -> Option<u64> {
    let text = std::str::from_utf8(field).ok()?;
    let digits = text.trim_matches(|c: char| c == ' ' || c == '\0');
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 8).ok()
}

fn hex_prefix(bytes: &[u8], len: usize) -> String {
    if bytes.is_empty() {
        return "<empty>".to_string();
    }
    bytes
        .iter()
        .take(len)
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
