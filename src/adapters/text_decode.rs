//! Byte-to-text decoding for terminal-written files.
//!
//! The trading terminal writes its logs as UTF-16LE or UTF-8 (with or without
//! BOM) and its HTML statements as UTF-16.

const BOM: char = '\u{feff}';
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Decode a state log, trying UTF-16LE, then BOM-marked UTF-8, then UTF-8.
///
/// The UTF-16LE candidate is only accepted for input that looks like UTF-16:
/// a little-endian BOM, or NUL high bytes. Plain ASCII of even length would
/// otherwise decode "successfully" into CJK noise.
pub fn decode_log(bytes: &[u8]) -> Option<String> {
    if looks_like_utf16le(bytes) {
        if let Some(text) = decode_utf16(bytes, false) {
            return Some(strip_bom(text));
        }
    }
    if let Some(rest) = bytes.strip_prefix(&UTF8_BOM) {
        return std::str::from_utf8(rest).ok().map(str::to_string);
    }
    std::str::from_utf8(bytes).ok().map(str::to_string)
}

/// Decode a UTF-16 statement, honouring a BOM and defaulting to little-endian.
pub fn decode_statement(bytes: &[u8]) -> Option<String> {
    match bytes {
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, false),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, true),
        _ => decode_utf16(bytes, false),
    }
}

fn looks_like_utf16le(bytes: &[u8]) -> bool {
    if bytes.len() % 2 != 0 {
        return false;
    }
    bytes.starts_with(&[0xFF, 0xFE]) || bytes.iter().skip(1).step_by(2).any(|&b| b == 0)
}

fn decode_utf16(bytes: &[u8], big_endian: bool) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .collect();
    String::from_utf16(&units).ok()
}

fn strip_bom(text: String) -> String {
    match text.strip_prefix(BOM) {
        Some(rest) => rest.to_string(),
        None => text,
    }
}
