use std::io::{self, Read};

use crate::{Error, Result};

/// Compression codec of a `data.tar*` payload member.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TarCompress {
    None,
    Gzip,
    Xz,
    Zstd,
}

impl TarCompress {
    /// Codec for a `.deb` member name, `None` for members that are not the
    /// data payload.
    pub fn from_member_name(name: &str) -> Option<Self> {
        match name.trim_end_matches('/') {
            "data.tar" => Some(Self::None),
            "data.tar.gz" => Some(Self::Gzip),
            "data.tar.xz" => Some(Self::Xz),
            "data.tar.zst" => Some(Self::Zstd),
            _ => None,
        }
    }

    pub fn decoder<R: Read>(self, reader: R) -> Result<Decoder<R>> {
        match self {
            Self::None => Ok(Decoder::Passthrough(reader)),
            Self::Gzip => Ok(Decoder::Gzip(Box::new(flate2::read::GzDecoder::new(reader)))),
            #[cfg(feature = "xz")]
            Self::Xz => Ok(Decoder::Xz(Box::new(xz2::read::XzDecoder::new(reader)))),
            #[cfg(feature = "zstd")]
            Self::Zstd => {
                let decoder = zstd::stream::read::Decoder::new(reader)
                    .map_err(|source| Error::Payload { source })?;
                Ok(Decoder::Zstd(Box::new(decoder)))
            }
            #[allow(unreachable_patterns)]
            other => Err(Error::UnsupportedCompression {
                member: format!("{other:?}"),
            }),
        }
    }
}

/// Decompressing reader over a payload member.
pub enum Decoder<R: Read> {
    Passthrough(R),
    Gzip(Box<flate2::read::GzDecoder<R>>),
    #[cfg(feature = "xz")]
    Xz(Box<xz2::read::XzDecoder<R>>),
    #[cfg(feature = "zstd")]
    Zstd(Box<zstd::stream::read::Decoder<'static, io::BufReader<R>>>),
}

impl<R: Read> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Passthrough(r) => r.read(buf),
            Self::Gzip(d) => d.read(buf),
            #[cfg(feature = "xz")]
            Self::Xz(d) => d.read(buf),
            #[cfg(feature = "zstd")]
            Self::Zstd(d) => d.read(buf),
        }
    }
}
