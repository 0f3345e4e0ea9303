//! Pure Rust OpenType/TrueType font reader
//!
//! Decodes sfnt fonts, TrueType Collection members and WOFF/WOFF2 web fonts
//! into a [`Typeface`]: metrics, naming, character mapping and per-glyph
//! TrueType outlines. Compression codecs are injectable through
//! [`Decompressors`]; the built-in ones sit behind the `z` and `brotli`
//! features.
//!
//! ```no_run
//! let data = std::fs::read("font.woff2").unwrap();
//! let typeface = openfont::OpenFontReader::new().read(&data).unwrap();
//! let glyph = typeface.glyph_for_codepoint('A' as u32);
//! println!("{} points", glyph.points().len());
//! ```

pub mod buffer;
pub mod decompress;
pub mod directory;
pub mod error;
pub mod glyph;
pub mod preview;
pub mod reader;
pub mod sfnt;
pub mod table_tags;
pub mod tables;
pub mod trim;
pub mod typeface;
pub mod variable_length;
pub mod woff;
pub mod woff2;

#[cfg(test)]
mod test_fonts;

pub use decompress::{BoxError, DecompressFn, Decompressors};
pub use directory::{FontKind, TableDirectory, TableHeader};
pub use error::{Codec, FontError, Unsupported};
pub use glyph::{Bounds, Glyph, GlyphClass, GlyphData, GlyphPoint, TrueTypeOutline};
pub use preview::PreviewFontInfo;
pub use reader::OpenFontReader;
pub use trim::{RestoreTicket, TrimMode};
pub use typeface::{
    DEFAULT_DPI, FsSelection, HintPrograms, LineSpacingChoice, Os2FontStyle, Os2WidthClass,
    OutlineFormat, Typeface, points_to_pixels,
};
pub use woff::decompress_woff1;
pub use woff2::decompress_woff2;

// Round a value up to the nearest multiple of 4. Don't round the value in the
// case that rounding up overflows.
//
// Implemented as a macro to make it generic over the type without horrible type bounds
macro_rules! Round4 {
    ($value:expr) => {
        match $value.checked_add(3) {
            Some(value_plus_3) => value_plus_3 & !3,
            None => $value,
        }
    };
}
pub(crate) use Round4;
