//! Provenance codec: least-significant-bit attribution marking
//!
//! The uploading wallet address is wrapped in a start/end delimiter pair and
//! written one bit per byte into the LSBs of the raw frame stream, starting
//! past a fixed header region so container lengths and offsets stay valid.
//! No byte changes by more than 1, so the file remains playable.
//!
//! Decoding walks the LSBs from the start of the file, reassembles 8-bit
//! groups into characters, and stops at the first end delimiter. Cost is
//! proportional to the marker position when a marker exists; a marker-free
//! file is scanned in full before the decoder gives up.

use crate::error::{MedialockError, MedialockResult};
use std::fs;
use std::path::Path;

/// Bytes left untouched at the front of the stream (container headers)
const HEADER_SKIP: usize = 128;

/// Start delimiter, written immediately before the payload
const START_DELIMITER: u8 = b'\t';

/// End delimiter, written immediately after the payload
const END_DELIMITER: u8 = b'\n';

/// Embed an attribution payload into a byte stream in place.
///
/// Fails when the stream is too small to hold the delimited payload past the
/// header region. Bytes beyond the marker are left untouched.
pub fn embed(data: &mut [u8], payload: &str) -> MedialockResult<()> {
    let mut marker = Vec::with_capacity(payload.len() + 2);
    marker.push(START_DELIMITER);
    marker.extend_from_slice(payload.as_bytes());
    marker.push(END_DELIMITER);

    let bits_needed = marker.len() * 8;
    let capacity = data.len().saturating_sub(HEADER_SKIP);
    if capacity < bits_needed {
        return Err(MedialockError::Embedding(format!(
            "payload needs {} carrier bytes but only {} are available",
            bits_needed, capacity
        )));
    }

    let mut cursor = HEADER_SKIP;
    for byte in &marker {
        for bit_index in (0..8).rev() {
            let bit = (byte >> bit_index) & 1;
            data[cursor] = (data[cursor] & 0xfe) | bit;
            cursor += 1;
        }
    }

    Ok(())
}

/// Extract an attribution payload from a byte stream.
///
/// Returns `None` when no delimiter pair is seen before the end of the
/// stream. The scan stops at the first end delimiter regardless.
pub fn extract(data: &[u8]) -> Option<String> {
    let mut chars = Vec::new();
    let mut current = 0u8;
    let mut bit_count = 0u8;
    let mut start_index: Option<usize> = None;

    for byte in data {
        current = (current << 1) | (byte & 1);
        bit_count += 1;
        if bit_count < 8 {
            continue;
        }

        if current == END_DELIMITER {
            return start_index.map(|start| {
                String::from_utf8_lossy(&chars[start + 1..]).into_owned()
            });
        }
        if current == START_DELIMITER && start_index.is_none() {
            start_index = Some(chars.len());
        }
        chars.push(current);
        current = 0;
        bit_count = 0;
    }

    None
}

/// Embed a payload into a file, writing the marked copy to `output`.
pub fn embed_file(input: &Path, output: &Path, payload: &str) -> MedialockResult<()> {
    let mut data = fs::read(input)?;
    embed(&mut data, payload)?;
    fs::write(output, data)?;
    tracing::debug!(
        input = %input.display(),
        output = %output.display(),
        "provenance marker embedded"
    );
    Ok(())
}

/// Extract a payload from a file, if one is present.
pub fn extract_file(path: &Path) -> MedialockResult<Option<String>> {
    let data = fs::read(path)?;
    Ok(extract(&data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const WALLET: &str = "0xAA01aa01Aa01aA01aa01aA01Aa01aa01AA01aa01";

    fn carrier(len: usize) -> Vec<u8> {
        // Even values everywhere so pre-marker LSBs decode to NUL characters,
        // never to a stray delimiter.
        vec![0x42u8; len]
    }

    #[test]
    fn test_embed_then_extract_roundtrip() {
        let mut data = carrier(4096);
        embed(&mut data, WALLET).unwrap();
        assert_eq!(extract(&data).as_deref(), Some(WALLET));
    }

    #[test]
    fn test_header_region_untouched() {
        let mut data = carrier(4096);
        let original_header = data[..HEADER_SKIP].to_vec();
        embed(&mut data, WALLET).unwrap();
        assert_eq!(&data[..HEADER_SKIP], original_header.as_slice());
    }

    #[test]
    fn test_bytes_change_by_at_most_one() {
        let mut data = carrier(4096);
        let original = data.clone();
        embed(&mut data, WALLET).unwrap();
        for (before, after) in original.iter().zip(data.iter()) {
            assert!(before.abs_diff(*after) <= 1);
        }
    }

    #[test]
    fn test_bytes_beyond_marker_untouched() {
        let mut data = carrier(4096);
        let original = data.clone();
        embed(&mut data, WALLET).unwrap();
        let marker_bits = (WALLET.len() + 2) * 8;
        assert_eq!(
            &data[HEADER_SKIP + marker_bits..],
            &original[HEADER_SKIP + marker_bits..]
        );
    }

    #[test]
    fn test_extract_without_marker_returns_none() {
        let data = carrier(4096);
        assert_eq!(extract(&data), None);
    }

    #[test]
    fn test_embed_rejects_undersized_carrier() {
        // Room for the header but not for the delimited payload
        let mut data = carrier(HEADER_SKIP + 64);
        let result = embed(&mut data, WALLET);
        assert!(matches!(result, Err(MedialockError::Embedding(_))));
    }

    #[test]
    fn test_end_delimiter_without_start_is_no_marker() {
        // Craft a stream whose LSBs spell '\n' with no preceding '\t'
        let mut data = vec![0u8; 64];
        for (i, byte) in data.iter_mut().enumerate().take(8) {
            *byte = (END_DELIMITER >> (7 - i)) & 1;
        }
        assert_eq!(extract(&data), None);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("clip.mp4");
        let output = dir.path().join("clip.marked.mp4");
        fs::write(&input, carrier(8192)).unwrap();

        embed_file(&input, &output, WALLET).unwrap();
        assert_eq!(extract_file(&output).unwrap().as_deref(), Some(WALLET));

        // The input stays marker-free
        assert_eq!(extract_file(&input).unwrap(), None);
    }

    #[test]
    fn test_scan_stops_at_first_end_delimiter() {
        let mut data = carrier(8192);
        embed(&mut data, "first").unwrap();
        // A second marker further in must never be reported
        let offset = HEADER_SKIP + ("first".len() + 2) * 8;
        let mut tail = data.split_off(offset);
        embed(&mut tail, "second").unwrap();
        data.extend_from_slice(&tail);
        assert_eq!(extract(&data).as_deref(), Some("first"));
    }
}
