use font_types::Tag;
use thiserror::Error;

/// Everything that can go wrong while decoding a font
#[derive(Debug, Error)]
pub enum FontError {
    /// The byte layout cannot be a valid instance of what it claims to be
    #[error("malformed font: {0}")]
    MalformedFont(&'static str),

    /// The data is recognised but uses a variant this crate does not implement
    #[error("unsupported format: {0}")]
    UnsupportedFormat(Unsupported),

    /// A table another decoder depends on is absent
    #[error("the '{0}' table is missing")]
    MissingRequiredTable(Tag),

    /// A wrapped font needs a codec that was not configured
    #[error("no {0} decompressor available")]
    DecompressorUnavailable(Codec),

    /// The bytes handed to `restore` are not the bytes the typeface was read from
    #[error("restore integrity check failed: {0}")]
    RestoreIntegrityError(&'static str),
}

/// Recognised-but-unimplemented variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unsupported {
    /// The leading four bytes are not an sfnt, TTC, WOFF or WOFF2 signature
    Signature(u32),
    /// A TrueType Collection was handed to a single-font decode
    FontCollection,
    Os2Version(u16),
    PostVersion(u32),
    /// Composite glyph components positioned by point matching
    PointMatching,
    Woff2Collection,
    /// A WOFF2 transform version this decoder does not know
    Woff2Transform(Tag, u8),
}

/// Codecs that may be injected into the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Zlib,
    Brotli,
}

impl std::fmt::Display for Unsupported {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unsupported::Signature(sig) => write!(f, "unknown font signature 0x{sig:08X}"),
            Unsupported::FontCollection => {
                write!(f, "font collections can only be previewed or read per member")
            }
            Unsupported::Os2Version(version) => write!(f, "OS/2 table version {version}"),
            Unsupported::PostVersion(version) => write!(f, "post table version 0x{version:08X}"),
            Unsupported::PointMatching => write!(f, "composite glyph point matching"),
            Unsupported::Woff2Collection => write!(f, "WOFF2 font collections"),
            Unsupported::Woff2Transform(tag, version) => {
                write!(f, "WOFF2 transform version {version} for '{tag}'")
            }
        }
    }
}

impl std::fmt::Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Codec::Zlib => write!(f, "zlib"),
            Codec::Brotli => write!(f, "brotli"),
        }
    }
}

impl FontError {
    /// True when the input is not a font file at all, as opposed to a font that failed to decode
    pub fn is_not_a_font(&self) -> bool {
        matches!(
            self,
            FontError::UnsupportedFormat(Unsupported::Signature(_))
        )
    }

    /// True when the input is a font that uses a feature this crate deliberately does not implement
    pub fn is_unsupported_feature(&self) -> bool {
        matches!(self, FontError::UnsupportedFormat(kind) if !matches!(kind, Unsupported::Signature(_)))
    }
}

impl From<bytes::TryGetError> for FontError {
    fn from(_value: bytes::TryGetError) -> Self {
        Self::MalformedFont("unexpected end of data")
    }
}

pub(crate) fn usize_will_overflow(a: usize, b: usize) -> bool {
    a.checked_add(b).is_none()
}

pub(crate) fn u32_will_overflow(a: u32, b: u32) -> bool {
    a.checked_add(b).is_none()
}

#[cfg(not(feature = "debug"))]
mod regular {
    macro_rules! bail {
        ($err: expr) => {
            return Err($err.into())
        };
    }
    pub(crate) use bail;

    macro_rules! bail_if {
        ($cond: expr, $msg: literal) => {
            if $cond {
                return Err($crate::error::FontError::MalformedFont($msg));
            }
        };
        ($cond: expr, $err: expr) => {
            if $cond {
                return Err($err.into());
            }
        };
    }
    pub(crate) use bail_if;

    macro_rules! bail_with_msg_if {
        ($cond: expr, $err: expr, $($msg:tt),*) => {
            if $cond {
                log::debug!($($msg),*);
                return Err($err.into());
            }
        };
    }
    pub(crate) use bail_with_msg_if;
}
#[cfg(not(feature = "debug"))]
pub(crate) use regular::*;

#[cfg(feature = "debug")]
mod debug {
    macro_rules! bail {
        ($err: expr) => {
            panic!("{}", $err)
        };
    }
    pub(crate) use bail;

    macro_rules! bail_if {
        ($cond: expr, $($rest:tt)*) => {
            if $cond {
                panic!("{}", stringify!($cond))
            }
        };
    }
    pub(crate) use bail_if;

    macro_rules! bail_with_msg_if {
        ($cond: expr, $err: expr, $($msg:tt),*) => {
            if $cond {
                panic!($($msg),*);
            }
        };
    }
    pub(crate) use bail_with_msg_if;
}
#[cfg(feature = "debug")]
pub(crate) use debug::*;
