//! Injectable codecs for the web-font wrappers
//!
//! WOFF tables are zlib streams and a WOFF2 payload is one Brotli stream. The
//! codecs themselves come from the caller; the built-in ones are only
//! compiled in with the `z` and `brotli` features.

use std::error::Error;

use log::debug;

use crate::error::{Codec, FontError};

pub type BoxError = Box<dyn Error + Send + Sync>;

/// Decompress `data`; the `usize` is the expected decompressed size
pub type DecompressFn = dyn Fn(&[u8], usize) -> Result<Vec<u8>, BoxError> + Send + Sync;

/// The codecs a reader may use. A missing codec makes the matching wrapper
/// fail with [`FontError::DecompressorUnavailable`].
pub struct Decompressors {
    pub zlib: Option<Box<DecompressFn>>,
    pub brotli: Option<Box<DecompressFn>>,
}

impl Default for Decompressors {
    /// The built-in codecs for every enabled feature
    fn default() -> Self {
        Self {
            #[cfg(feature = "z")]
            zlib: Some(Box::new(decompress_zlib)),
            #[cfg(not(feature = "z"))]
            zlib: None,
            #[cfg(feature = "brotli")]
            brotli: Some(Box::new(decompress_brotli)),
            #[cfg(not(feature = "brotli"))]
            brotli: None,
        }
    }
}

impl std::fmt::Debug for Decompressors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decompressors")
            .field("zlib", &self.zlib.is_some())
            .field("brotli", &self.brotli.is_some())
            .finish()
    }
}

impl Decompressors {
    pub fn none() -> Self {
        Self {
            zlib: None,
            brotli: None,
        }
    }

    pub fn with_zlib(
        mut self,
        zlib: impl Fn(&[u8], usize) -> Result<Vec<u8>, BoxError> + Send + Sync + 'static,
    ) -> Self {
        self.zlib = Some(Box::new(zlib));
        self
    }

    pub fn with_brotli(
        mut self,
        brotli: impl Fn(&[u8], usize) -> Result<Vec<u8>, BoxError> + Send + Sync + 'static,
    ) -> Self {
        self.brotli = Some(Box::new(brotli));
        self
    }

    pub(crate) fn decompress(
        &self,
        codec: Codec,
        data: &[u8],
        size_hint: usize,
    ) -> Result<Vec<u8>, FontError> {
        let decompress = match codec {
            Codec::Zlib => self.zlib.as_ref(),
            Codec::Brotli => self.brotli.as_ref(),
        }
        .ok_or(FontError::DecompressorUnavailable(codec))?;

        decompress(data, size_hint).map_err(|err| {
            debug!("{codec} decompression failed: {err}");
            FontError::MalformedFont("compressed data failed to decompress")
        })
    }
}

#[cfg(feature = "z")]
fn decompress_zlib(compressed_data: &[u8], size_hint: usize) -> Result<Vec<u8>, BoxError> {
    use flate2::{Decompress, FlushDecompress};
    let mut output: Vec<u8> = Vec::with_capacity(size_hint);
    let mut decompressor = Decompress::new(true);
    decompressor.decompress_vec(compressed_data, &mut output, FlushDecompress::Finish)?;
    Ok(output)
}

#[cfg(feature = "brotli")]
fn decompress_brotli(compressed_data: &[u8], size_hint: usize) -> Result<Vec<u8>, BoxError> {
    use brotli_decompressor::DecompressorWriter;
    use std::io::Write;

    let mut output: Vec<u8> = Vec::with_capacity(size_hint);
    let mut decompressor = DecompressorWriter::new(&mut output, 4096);
    decompressor.write_all(compressed_data)?;
    decompressor.close()?;
    drop(decompressor);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_codec_is_reported() {
        let codecs = Decompressors::none();
        assert!(matches!(
            codecs.decompress(Codec::Brotli, &[1, 2, 3], 3),
            Err(FontError::DecompressorUnavailable(Codec::Brotli))
        ));
    }

    #[test]
    fn injected_codec_is_used() {
        let codecs = Decompressors::none().with_zlib(|data, size| {
            assert_eq!(size, 2);
            Ok(data.iter().rev().copied().collect())
        });
        assert_eq!(codecs.decompress(Codec::Zlib, &[1, 2], 2).unwrap(), vec![2, 1]);
    }

    #[test]
    fn codec_failure_is_malformed() {
        let codecs = Decompressors::none().with_brotli(|_, _| Err("corrupt".into()));
        assert!(matches!(
            codecs.decompress(Codec::Brotli, &[0], 1),
            Err(FontError::MalformedFont(_))
        ));
    }

    #[cfg(feature = "z")]
    #[test]
    fn built_in_zlib_inflates() {
        use flate2::{Compression, write::ZlibEncoder};
        use std::io::Write;

        let original = b"hello hello hello hello".to_vec();
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&original).unwrap();
        let compressed = encoder.finish().unwrap();

        let codecs = Decompressors::default();
        assert_eq!(
            codecs.decompress(Codec::Zlib, &compressed, original.len()).unwrap(),
            original
        );
    }
}
