use super::digits::DigitString;
use super::error::{BarcodeError, BarcodeResult};

// Check digits & add-on checksums
//------------------------------------------------------------------------------

pub const ISBN_PREFIXES: [&str; 2] = ["978", "979"];

/// Modulo-10 check digit over a 12 digit prefix, weights 1,3,1,3... from the left.
pub fn check_digit(prefix: &str) -> BarcodeResult<u8> {
    let prefix = DigitString::parse(prefix, 12)?;
    Ok(weighted_check_digit(prefix.digits()))
}

fn weighted_check_digit(digits: &[u8]) -> u8 {
    let sum: u32 =
        digits.iter().enumerate().map(|(i, &d)| d as u32 * if i & 1 == 0 { 1 } else { 3 }).sum();
    ((10 - sum % 10) % 10) as u8
}

/// Accepts a 13 digit ISBN with a 978/979 prefix and a matching check digit.
pub fn validate13(candidate: &str) -> BarcodeResult<DigitString> {
    let digits = DigitString::parse(candidate, 13)?;
    if !ISBN_PREFIXES.iter().any(|p| candidate.starts_with(p)) {
        return Err(BarcodeError::InvalidPrefix);
    }
    let expected = weighted_check_digit(&digits.digits()[..12]);
    let found = digits.digits()[12];
    if expected != found {
        return Err(BarcodeError::ChecksumMismatch { expected, found });
    }
    Ok(digits)
}

/// EAN-2 parity selector: the two digit value modulo 4.
pub fn addon2_checksum(digits: &DigitString) -> BarcodeResult<u8> {
    let d = sized(digits, 2)?;
    Ok(((d[0] as u32 * 10 + d[1] as u32) % 4) as u8)
}

/// EAN-5 parity selector: odd positions weighted 3, even positions 9, modulo 10.
pub fn addon5_checksum(digits: &DigitString) -> BarcodeResult<u8> {
    let d = sized(digits, 5)?;
    let sum: u32 =
        d.iter().enumerate().map(|(i, &d)| d as u32 * if i & 1 == 0 { 3 } else { 9 }).sum();
    Ok((sum % 10) as u8)
}

fn sized(digits: &DigitString, len: usize) -> BarcodeResult<&[u8]> {
    if digits.len() != len {
        return Err(BarcodeError::InvalidLength { expected: len, found: digits.len() });
    }
    Ok(digits.digits())
}
