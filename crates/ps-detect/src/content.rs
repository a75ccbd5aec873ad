//! Byte-level content checks that compatibility rules condition on.
//!
//! Everything here works on a bounded prefix of the file. The checks answer
//! two questions the rule table asks about images: is this animated, and
//! (for Photoshop documents) which color mode does it use.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// How much of the file the animation and color-mode checks inspect.
pub const SCAN_WINDOW: usize = 64 * 1024;

/// Flags the rule engine receives as facts about an image file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFlags {
    /// True for animated GIF, animated PNG (acTL), or animated WebP (ANIM).
    pub animated: bool,
    /// Photoshop color mode name, when the file is a PSD/PSB.
    pub color_mode: Option<String>,
}

/// Read the animation and color-mode flags for one file.
pub fn scan_flags(path: &Path) -> io::Result<ContentFlags> {
    let data = read_prefix(path, SCAN_WINDOW)?;
    Ok(ContentFlags {
        animated: is_animated_gif(&data) || is_animated_png(&data) || is_animated_webp(&data),
        color_mode: psd_color_mode(&data).map(str::to_owned),
    })
}

/// Read at most `len` bytes from the start of `path`.
pub(crate) fn read_prefix(path: &Path, len: usize) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(len.min(8192));
    File::open(path)?.take(len as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Whether a GIF prefix shows more than one image frame.
///
/// Walks the block structure counting image separators (`0x2C` at block
/// level, not raw byte scanning, which would false-positive on pixel data).
/// A `NETSCAPE2.0` looping extension anywhere in the window also counts as
/// animated, covering files whose second frame lies past the window.
pub fn is_animated_gif(data: &[u8]) -> bool {
    if data.len() < 13 || (!data.starts_with(b"GIF87a") && !data.starts_with(b"GIF89a")) {
        return false;
    }

    if data.windows(11).any(|w| w == b"NETSCAPE2.0") {
        return true;
    }

    // Skip logical screen descriptor and global color table.
    let packed = data[10];
    let gct_size = if packed & 0x80 != 0 {
        3 * (1usize << ((packed & 0x07) + 1))
    } else {
        0
    };
    let mut pos = 13 + gct_size;

    let mut frames = 0u32;
    while pos < data.len() {
        match data[pos] {
            0x2C => {
                frames += 1;
                if frames > 1 {
                    return true;
                }
                if pos + 10 > data.len() {
                    break;
                }
                let img_packed = data[pos + 9];
                let lct_size = if img_packed & 0x80 != 0 {
                    3 * (1usize << ((img_packed & 0x07) + 1))
                } else {
                    0
                };
                // descriptor + local color table + LZW minimum code size byte
                pos += 10 + lct_size + 1;
                pos = skip_sub_blocks(data, pos);
            }
            0x21 => {
                // extension introducer + label
                pos += 2;
                pos = skip_sub_blocks(data, pos);
            }
            0x3B => break,
            _ => pos += 1,
        }
    }
    false
}

fn skip_sub_blocks(data: &[u8], mut pos: usize) -> usize {
    while pos < data.len() {
        let block_size = data[pos] as usize;
        pos += 1;
        if block_size == 0 {
            break;
        }
        pos += block_size;
    }
    pos
}

/// Whether a PNG prefix is an APNG: `acTL` chunk appearing before `IDAT`.
pub fn is_animated_png(data: &[u8]) -> bool {
    const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    if !data.starts_with(&PNG_MAGIC) {
        return false;
    }

    let mut pos = 8;
    while pos + 8 <= data.len() {
        let chunk_len =
            u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        let chunk_type = &data[pos + 4..pos + 8];
        match chunk_type {
            b"acTL" => return true,
            b"IDAT" | b"IEND" => return false,
            _ => {}
        }
        // length + type + data + CRC
        pos = match pos.checked_add(12 + chunk_len) {
            Some(next) => next,
            None => break,
        };
    }
    false
}

/// Whether a WebP prefix carries an `ANIM` chunk.
pub fn is_animated_webp(data: &[u8]) -> bool {
    data.len() >= 12
        && data.starts_with(b"RIFF")
        && &data[8..12] == b"WEBP"
        && data.windows(4).any(|w| w == b"ANIM")
}

/// Photoshop color mode name, when `data` is a PSD/PSB header.
///
/// The mode lives in the big-endian u16 at offset 24 of the file header.
pub fn psd_color_mode(data: &[u8]) -> Option<&'static str> {
    if data.len() < 26 || !data.starts_with(b"8BPS") {
        return None;
    }
    let mode = u16::from_be_bytes([data[24], data[25]]);
    let name = match mode {
        0 => "bitmap",
        1 => "grayscale",
        2 => "indexed",
        3 => "rgb",
        4 => "cmyk",
        7 => "multichannel",
        8 => "duotone",
        9 => "lab",
        _ => "unknown",
    };
    Some(name)
}
