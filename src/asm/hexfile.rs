//! Hex image files for ROM and decode-table contents.
//!
//! The format is line oriented:
//! - one byte per line, one or two hex digits, in address order
//! - `N*XX` stands for N copies of byte XX (N is decimal)
//! - `#` starts a comment, blank lines are ignored
//! - an optional `v2.0 raw` first line (Logisim image header) is skipped
//!
//! Images shorter than 256 bytes are zero-padded.

use crate::clocked::MEMORY_SIZE;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Header line written by Logisim and accepted on input.
pub const HEADER: &str = "v2.0 raw";

/// Parse hex image text into a 256-byte image.
pub fn parse_hex(text: &str) -> Result<Vec<u8>, HexFileError> {
    let mut bytes = Vec::with_capacity(MEMORY_SIZE);

    for (index, raw) in text.lines().enumerate() {
        let line_num = index + 1;
        let line = match raw.find('#') {
            Some(idx) => &raw[..idx],
            None => raw,
        }
        .trim();

        if line.is_empty() || (index == 0 && line == HEADER) {
            continue;
        }

        for token in line.split_whitespace() {
            let (count, value) = match token.split_once('*') {
                Some((count, value)) => {
                    let bad_count = || HexFileError::ParseError {
                        line: line_num,
                        message: format!("bad repeat count '{}'", count),
                    };
                    if !count.bytes().all(|b| b.is_ascii_digit()) {
                        return Err(bad_count());
                    }
                    let count = count.parse::<usize>().map_err(|_| bad_count())?;
                    (count, parse_byte(value, line_num)?)
                }
                None => (1, parse_byte(token, line_num)?),
            };

            if bytes.len() + count > MEMORY_SIZE {
                return Err(HexFileError::TooLarge { size: bytes.len() + count });
            }
            bytes.extend(std::iter::repeat(value).take(count));
        }
    }

    bytes.resize(MEMORY_SIZE, 0);
    Ok(bytes)
}

fn parse_byte(token: &str, line: usize) -> Result<u8, HexFileError> {
    let digits_ok = token.bytes().all(|b| b.is_ascii_hexdigit());
    if token.is_empty() || token.len() > 2 || !digits_ok {
        return Err(HexFileError::ParseError {
            line,
            message: format!("expected one or two hex digits, found '{}'", token),
        });
    }
    u8::from_str_radix(token, 16).map_err(|e| HexFileError::ParseError {
        line,
        message: format!("'{}': {}", token, e),
    })
}

/// Load a hex image from disk.
pub fn load_hex<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, HexFileError> {
    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| HexFileError::IoError(e.to_string()))?;
    parse_hex(&text)
}

/// Format an image as hex text, one byte per line.
///
/// Trailing zero bytes are dropped since loading pads them back.
pub fn format_hex(bytes: &[u8]) -> String {
    let used = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    let mut out = String::with_capacity(used * 3);
    for byte in &bytes[..used] {
        out.push_str(&format!("{:02x}\n", byte));
    }
    out
}

/// Save an image to disk in hex format.
pub fn save_hex<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<(), HexFileError> {
    let mut file = std::fs::File::create(path.as_ref())
        .map_err(|e| HexFileError::IoError(e.to_string()))?;
    file.write_all(format_hex(bytes).as_bytes())
        .map_err(|e| HexFileError::IoError(e.to_string()))
}

/// Errors that can occur while reading or writing hex images.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexFileError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("image holds {size} bytes, more than the 256 available")]
    TooLarge { size: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pads_to_full_size() {
        let image = parse_hex("01\n23\n03\n40\n").unwrap();
        assert_eq!(image.len(), MEMORY_SIZE);
        assert_eq!(&image[..5], &[0x01, 0x23, 0x03, 0x40, 0x00]);
    }

    #[test]
    fn test_parse_header_comments_and_runs() {
        let text = "v2.0 raw\n# decode table\n84\n\n0 # wait\n40\n13*0\nC2\n";
        let image = parse_hex(text).unwrap();
        assert_eq!(&image[..3], &[0x84, 0x00, 0x40]);
        assert!(image[3..16].iter().all(|&b| b == 0));
        assert_eq!(image[16], 0xC2);
    }

    #[test]
    fn test_parse_errors_carry_line() {
        let err = parse_hex("01\nzz\n").unwrap_err();
        assert!(matches!(err, HexFileError::ParseError { line: 2, .. }));

        let err = parse_hex("123\n").unwrap_err();
        assert!(matches!(err, HexFileError::ParseError { line: 1, .. }));

        // Signs are not hex digits
        let err = parse_hex("00\n+F\n").unwrap_err();
        assert!(matches!(err, HexFileError::ParseError { line: 2, .. }));
        assert!(parse_hex("3*+1\n").is_err());
        assert!(parse_hex("+3*01\n").is_err());
    }

    #[test]
    fn test_too_large() {
        let err = parse_hex("257*ff\n").unwrap_err();
        assert_eq!(err, HexFileError::TooLarge { size: 257 });
        assert!(parse_hex("256*ff\n").is_ok());
    }

    #[test]
    fn test_format_trims_trailing_zeros() {
        let mut image = vec![0u8; MEMORY_SIZE];
        image[0] = 0x01;
        image[2] = 0xAB;
        assert_eq!(format_hex(&image), "01\n00\nab\n");
        assert_eq!(parse_hex(&format_hex(&image)).unwrap(), image);
        assert_eq!(format_hex(&[0; 4]), "");
    }
}
