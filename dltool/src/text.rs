//! Formatting helpers for sizes and file names.

/// Binary unit prefixes, from bytes up to yobibytes.
const UNITS: [&str; 9] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB", "ZiB", "YiB"];

/// The name used when a collection name sanitizes to nothing.
pub const DEFAULT_OUTPUT_NAME: &str = "default_output_name";

/// Render a byte count with a binary unit and one decimal, e.g. `1.5 MiB`.
pub fn scale1024(bytes: u64) -> String {
    let power = if bytes == 0 {
        0
    } else {
        ((63 - bytes.leading_zeros()) / 10).min(UNITS.len() as u32 - 1)
    };
    let scaled = bytes as f64 / 2f64.powi(10 * power as i32);
    format!("{scaled:.1} {}", UNITS[power as usize])
}

/// Turn an arbitrary name into something usable as a directory or file name.
///
/// Characters that are invalid in file names on common platforms are removed and runs of
/// whitespace are collapsed into a single space.
pub fn sanitize_filename(name: &str) -> String {
    let stripped: String = name
        .chars()
        .filter(|c| !matches!(c, '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|'))
        .collect();
    let sanitized = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if sanitized.is_empty() || sanitized == "." {
        DEFAULT_OUTPUT_NAME.into()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_scale1024() {
        assert_eq!(scale1024(0), "0.0 B");
        assert_eq!(scale1024(1023), "1023.0 B");
        assert_eq!(scale1024(1024), "1.0 KiB");
        assert_eq!(scale1024(1536 * 1024), "1.5 MiB");
        assert_eq!(scale1024(5 << 30), "5.0 GiB");
        assert_eq!(scale1024(u64::MAX), "16.0 EiB");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(
            sanitize_filename("Nintendo - Game Boy Advance"),
            "Nintendo - Game Boy Advance"
        );
        assert_eq!(
            sanitize_filename("Sony - PlayStation: \"Europe\"  <Part 1/2>"),
            "Sony - PlayStation Europe Part 12"
        );
        assert_eq!(sanitize_filename("  tabs\tand\nnewlines  "), "tabs and newlines");
        assert_eq!(sanitize_filename("???"), DEFAULT_OUTPUT_NAME);
        assert_eq!(sanitize_filename(" . "), DEFAULT_OUTPUT_NAME);
    }
}
