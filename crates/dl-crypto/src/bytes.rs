//! Base64 helpers for signatures and key material.
//!
//! Signatures travel as unpadded base64url. A 64-byte signature always
//! encodes to 86 characters, which has a dedicated fixed-size decoder; any
//! other length goes through the general engine and is rejected later by
//! the length check.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::CryptoError;

/// Raw P-256 signature length (r || s).
pub const SIGNATURE_LENGTH: usize = 64;

/// Unpadded base64url length of a [`SIGNATURE_LENGTH`] signature.
pub const ENCODED_SIGNATURE_LENGTH: usize = 86;

const FULL_BLOCKS: usize = 21;

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decodes a `sig` parameter value into raw bytes.
///
/// Accepts both base64 alphabets and optional `=` padding. The result may
/// have any length; callers check it against [`SIGNATURE_LENGTH`].
pub fn sig_to_bytes(sig: &str) -> Result<Vec<u8>, CryptoError> {
    let normalized: String = sig
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    if let Ok(fixed) = <&[u8; ENCODED_SIGNATURE_LENGTH]>::try_from(normalized.as_bytes()) {
        return decode_sig_fixed(fixed).map(|bytes| bytes.to_vec());
    }

    URL_SAFE_LENIENT
        .decode(normalized.as_bytes())
        .map_err(|err| CryptoError::InvalidBase64(err.to_string()))
}

/// Decodes exactly 86 base64url characters into a 64-byte signature.
///
/// 21 blocks of four characters give 63 bytes; the last two characters
/// carry the final byte. Character classification has no data-dependent
/// branches.
pub fn decode_sig_fixed(
    input: &[u8; ENCODED_SIGNATURE_LENGTH],
) -> Result<[u8; SIGNATURE_LENGTH], CryptoError> {
    let mut output = [0_u8; SIGNATURE_LENGTH];
    let mut invalid: i16 = 0;

    for block in 0..FULL_BLOCKS {
        let i = block * 4;
        let s0 = decode_sextet(input[i]);
        let s1 = decode_sextet(input[i + 1]);
        let s2 = decode_sextet(input[i + 2]);
        let s3 = decode_sextet(input[i + 3]);
        invalid |= s0 | s1 | s2 | s3;

        let o = block * 3;
        output[o] = ((s0 << 2) | (s1 >> 4)) as u8;
        output[o + 1] = ((s1 << 4) | (s2 >> 2)) as u8;
        output[o + 2] = ((s2 << 6) | s3) as u8;
    }

    let s0 = decode_sextet(input[FULL_BLOCKS * 4]);
    let s1 = decode_sextet(input[FULL_BLOCKS * 4 + 1]);
    invalid |= s0 | s1;
    output[SIGNATURE_LENGTH - 1] = ((s0 << 2) | (s1 >> 4)) as u8;

    if invalid & 0x100 != 0 {
        return Err(CryptoError::InvalidBase64(
            "invalid character in signature".to_owned(),
        ));
    }

    Ok(output)
}

/// Maps a base64url character to its 6-bit value, or sets bit 8 when the
/// character is outside the alphabet.
fn decode_sextet(c: u8) -> i16 {
    let c = i16::from(c);
    let upper = range_mask(c, b'A', b'Z');
    let lower = range_mask(c, b'a', b'z');
    let digit = range_mask(c, b'0', b'9');
    let dash = range_mask(c, b'-', b'-');
    let underscore = range_mask(c, b'_', b'_');

    let value = (upper & (c - 65))
        | (lower & (c - 71))
        | (digit & (c + 4))
        | (dash & 62)
        | (underscore & 63);
    let valid = upper | lower | digit | dash | underscore;

    value | (!valid & 0x100)
}

/// All ones when `lo <= c <= hi`, zero otherwise.
fn range_mask(c: i16, lo: u8, hi: u8) -> i16 {
    ((i16::from(lo) - 1 - c) & (c - i16::from(hi) - 1)) >> 8
}

/// Encodes raw signature bytes for the `sig` parameter.
pub fn bytes_to_sig(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decodes standard padded base64 of any length (key material).
pub fn base64_to_bytes(input: &str) -> Result<Vec<u8>, CryptoError> {
    STANDARD
        .decode(input.trim().as_bytes())
        .map_err(|err| CryptoError::InvalidBase64(err.to_string()))
}
