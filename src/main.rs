//! openfont
//!
//! Prints the names and metrics of a font file, and optionally the outline of
//! one glyph.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use openfont::{FontError, LineSpacingChoice, OpenFontReader, PreviewFontInfo, Typeface};
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(version, about = "Inspect an OpenType, TrueType, WOFF or WOFF2 font.")]
struct Args {
    /// The font file to read.
    file: PathBuf,

    /// Only read names and style, which also lists the members of a collection.
    #[arg(long)]
    preview: bool,

    /// Print the outline of the glyph for this character: `A`, `U+0041` or `0x41`.
    #[arg(long, value_parser = parse_codepoint)]
    glyph: Option<u32>,
}

fn parse_codepoint(arg: &str) -> Result<u32, String> {
    let hex = arg
        .strip_prefix("U+")
        .or_else(|| arg.strip_prefix("u+"))
        .or_else(|| arg.strip_prefix("0x"));
    if let Some(hex) = hex {
        return u32::from_str_radix(hex, 16).map_err(|e| format!("bad codepoint '{arg}': {e}"));
    }
    let mut chars = arg.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c as u32),
        _ => Err(format!("expected a single character or U+XXXX, got '{arg}'")),
    }
}

fn print_preview(preview: &PreviewFontInfo, indent: &str) {
    println!("{indent}{}", preview.name());
    if preview.is_font_collection() {
        for member in preview.members() {
            print_preview(member, "  ");
        }
        return;
    }
    println!("{indent}  subfamily: {}", preview.subfamily_name());
    println!("{indent}  postscript name: {}", preview.postscript_name());
    println!(
        "{indent}  weight {} width {:?} style {:?}",
        preview.weight_class(),
        preview.width_class(),
        preview.style()
    );
    println!("{indent}  web font: {}, offset {}", preview.is_web_font(), preview.stream_offset());
}

fn print_typeface(typeface: &Typeface) {
    println!("{} {}", typeface.family_name(), typeface.subfamily_name());
    println!("  postscript name: {}", typeface.postscript_name());
    println!("  outlines: {:?}, {} glyphs", typeface.outline_format(), typeface.glyph_count());
    println!("  units per em: {}", typeface.units_per_em());
    println!(
        "  ascender {} descender {} line gap {}",
        typeface.ascender(),
        typeface.descender(),
        typeface.line_gap()
    );
    println!(
        "  line spacing: typo {} windows {} mac {}",
        typeface.line_spacing(LineSpacingChoice::TypoMetric),
        typeface.line_spacing(LineSpacingChoice::Windows),
        typeface.line_spacing(LineSpacingChoice::Mac)
    );
    println!(
        "  weight {} width {:?} style {:?}",
        typeface.weight_class(),
        typeface.width_class(),
        typeface.style()
    );
    println!("  {} mapped codepoints", typeface.collect_unicodes().len());
}

fn print_glyph(typeface: &Typeface, codepoint: u32) {
    let index = typeface.glyph_index(codepoint);
    let glyph = typeface.glyph(index);
    let name = typeface.glyph_name(index).unwrap_or("?");
    println!("U+{codepoint:04X} -> glyph {index} ({name})");
    println!(
        "  advance {} bounds {:?} class {:?}",
        typeface.advance_width(index),
        glyph.bounds(),
        glyph.class()
    );

    let mut start = 0;
    for (contour, &end) in glyph.contour_end_indices().iter().enumerate() {
        println!("  contour {contour}");
        for point in glyph.points().get(start..=end as usize).unwrap_or_default() {
            let kind = if point.on_curve { "on" } else { "off" };
            println!("    {} {} {kind}", point.x, point.y);
        }
        start = end as usize + 1;
    }
    if !glyph.instructions().is_empty() {
        println!("  {} instruction bytes", glyph.instructions().len());
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error("unable to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Font(#[from] FontError),
}

impl CliError {
    /// 2 for input that is not a font at all, 1 for everything else
    fn exit_status(&self) -> u8 {
        match self {
            CliError::Font(err) if err.is_not_a_font() => 2,
            _ => 1,
        }
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let data = std::fs::read(&args.file)?;
    let reader = OpenFontReader::new();

    if args.preview {
        print_preview(&reader.read_preview(&data)?, "");
        return Ok(());
    }

    let typeface = reader.read(&data)?;
    print_typeface(&typeface);
    if let Some(codepoint) = args.glyph {
        print_glyph(&typeface, codepoint);
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {err}", args.file.display());
            ExitCode::from(err.exit_status())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(file: &str) -> Args {
        Args {
            file: PathBuf::from(file),
            preview: false,
            glyph: None,
        }
    }

    #[test]
    fn unreadable_file_is_reported() {
        let err = run(&args("/nonexistent/openfont/font.ttf")).unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
        assert_eq!(err.exit_status(), 1);
        assert!(err.to_string().starts_with("unable to read file"));
    }

    #[test]
    fn not_a_font_exits_with_2() {
        let path = std::env::temp_dir().join(format!("openfont-cli-{}.txt", std::process::id()));
        std::fs::write(&path, b"plain text, not a font").unwrap();
        let err = run(&args(path.to_str().unwrap())).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, CliError::Font(_)));
        assert_eq!(err.exit_status(), 2);
    }

    #[test]
    fn parses_codepoints() {
        assert_eq!(parse_codepoint("A"), Ok(0x41));
        assert_eq!(parse_codepoint("U+0041"), Ok(0x41));
        assert_eq!(parse_codepoint("0x1F600"), Ok(0x1F600));
        assert!(parse_codepoint("AB").is_err());
    }
}
