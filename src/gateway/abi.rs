//! Call-data encoding and return-data decoding for the ERC-20 read calls
//! the gateway issues. Covers only what those four calls need.

use crate::error::{Result, SyncError};

pub const SELECTOR_NAME: &str = "06fdde03";
pub const SELECTOR_SYMBOL: &str = "95d89b41";
pub const SELECTOR_DECIMALS: &str = "313ce567";
pub const SELECTOR_BALANCE_OF: &str = "70a08231";

/// True when the candidate looks like a 20-byte hex address.
pub fn is_address(candidate: &str) -> bool {
    match candidate.strip_prefix("0x") {
        Some(body) => body.len() == 40 && body.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

/// Builds call data for a zero-argument call.
pub fn encode_call(selector: &str) -> String {
    format!("0x{}", selector)
}

/// Builds call data for a call taking a single address argument.
pub fn encode_call_address(selector: &str, address: &str) -> Result<String> {
    if !is_address(address) {
        return Err(SyncError::abi(format!("not an address: {}", address)));
    }
    let body = address.trim_start_matches("0x").to_lowercase();
    Ok(format!("0x{}{:0>64}", selector, body))
}

fn decode_hex(data: &str) -> Result<Vec<u8>> {
    hex::decode(data.trim_start_matches("0x")).map_err(|e| SyncError::abi(e.to_string()))
}

fn word_to_usize(word: &[u8]) -> Result<usize> {
    // Offsets and lengths in any sane return payload fit well inside the
    // low 8 bytes of the word.
    if word.len() != 32 || word[..24].iter().any(|&b| b != 0) {
        return Err(SyncError::abi("oversized length word"));
    }
    let mut value = 0usize;
    for &byte in &word[24..] {
        value = (value << 8) | byte as usize;
    }
    Ok(value)
}

/// Decodes a returned `uint8` word (the `decimals()` result).
pub fn decode_u8(data: &str) -> Result<u8> {
    let bytes = decode_hex(data)?;
    if bytes.len() < 32 {
        return Err(SyncError::abi("return data shorter than one word"));
    }
    let word = &bytes[..32];
    if word[..31].iter().any(|&b| b != 0) {
        return Err(SyncError::abi("uint8 out of range"));
    }
    Ok(word[31])
}

/// Decodes a returned `uint256` word into its decimal-string representation.
pub fn decode_uint(data: &str) -> Result<String> {
    let bytes = decode_hex(data)?;
    if bytes.len() < 32 {
        return Err(SyncError::abi("return data shorter than one word"));
    }
    Ok(bytes_to_decimal(&bytes[..32]))
}

/// Decodes a returned string. Standard tokens answer with an ABI dynamic
/// string; some older contracts answer `symbol()`/`name()` with a
/// NUL-padded `bytes32`, which the single-word branch handles.
pub fn decode_string(data: &str) -> Result<String> {
    let bytes = decode_hex(data)?;
    if bytes.is_empty() {
        return Err(SyncError::abi("empty return data"));
    }

    if bytes.len() == 32 {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(32);
        return Ok(String::from_utf8_lossy(&bytes[..end]).into_owned());
    }

    if bytes.len() < 64 {
        return Err(SyncError::abi("return data too short for a string"));
    }
    let offset = word_to_usize(&bytes[..32])?;
    if bytes.len() < offset + 32 {
        return Err(SyncError::abi("string offset past end of data"));
    }
    let length = word_to_usize(&bytes[offset..offset + 32])?;
    let start = offset + 32;
    if bytes.len() < start + length {
        return Err(SyncError::abi("string length past end of data"));
    }
    Ok(String::from_utf8_lossy(&bytes[start..start + length]).into_owned())
}

/// Converts a big-endian byte amount into its decimal-string representation.
/// Token supplies routinely exceed u128, so the arithmetic runs on base-10
/// digits directly.
fn bytes_to_decimal(bytes: &[u8]) -> String {
    // digits holds the value little-endian, one decimal digit per entry
    let mut digits: Vec<u8> = vec![0];
    for &byte in bytes {
        let mut carry = byte as u32;
        for digit in digits.iter_mut() {
            let value = (*digit as u32) * 256 + carry;
            *digit = (value % 10) as u8;
            carry = value / 10;
        }
        while carry > 0 {
            digits.push((carry % 10) as u8);
            carry /= 10;
        }
    }

    while digits.len() > 1 && *digits.last().unwrap() == 0 {
        digits.pop();
    }
    digits
        .iter()
        .rev()
        .map(|d| char::from(b'0' + d))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn recognizes_addresses() {
        assert!(is_address("0x6b175474e89094c44da98b954eedeac495271d0f"));
        assert!(!is_address("6b175474e89094c44da98b954eedeac495271d0f"));
        assert!(!is_address("0x6b17"));
        assert!(!is_address("0xzz175474e89094c44da98b954eedeac495271d0f"));
    }

    #[test]
    fn encodes_balance_of_call() {
        let data =
            encode_call_address(SELECTOR_BALANCE_OF, "0x6B175474E89094C44Da98b954EedeAC495271d0F")
                .unwrap();
        assert_eq!(
            data,
            "0x70a082310000000000000000000000006b175474e89094c44da98b954eedeac495271d0f"
        );
    }

    #[test]
    fn rejects_non_address_arguments() {
        assert!(encode_call_address(SELECTOR_BALANCE_OF, "dai.eth").is_err());
    }

    #[test]
    fn decodes_uint8_word() {
        let data = format!("0x{:0>64}", "12");
        assert_eq!(decode_u8(&data).unwrap(), 18);
    }

    #[test]
    fn rejects_out_of_range_uint8() {
        let data = format!("0x{:0>64}", "0100");
        assert!(decode_u8(&data).is_err());
    }

    #[test]
    fn decodes_large_uint_to_decimal() {
        // 1e18
        let data = format!("0x{:0>64}", "0de0b6b3a7640000");
        assert_eq!(decode_uint(&data).unwrap(), "1000000000000000000");

        let zero = format!("0x{:0>64}", "0");
        assert_eq!(decode_uint(&zero).unwrap(), "0");
    }

    #[test]
    fn decodes_dynamic_string() {
        // offset 0x20, length 3, "DAI"
        let data = concat!(
            "0x",
            "0000000000000000000000000000000000000000000000000000000000000020",
            "0000000000000000000000000000000000000000000000000000000000000003",
            "4441490000000000000000000000000000000000000000000000000000000000",
        );
        assert_eq!(decode_string(data).unwrap(), "DAI");
    }

    #[test]
    fn decodes_bytes32_fallback() {
        // "MKR" NUL-padded into a single word
        let data = "0x4d4b520000000000000000000000000000000000000000000000000000000000";
        assert_eq!(decode_string(data).unwrap(), "MKR");
    }

    #[test]
    fn rejects_truncated_string_data() {
        let data = concat!(
            "0x",
            "0000000000000000000000000000000000000000000000000000000000000020",
            "00000000000000000000000000000000000000000000000000000000000000ff",
        );
        assert!(decode_string(data).is_err());
    }
}
