//! EAN-13 check digit and payload normalisation.

use rand::Rng;

use crate::error::{Result, SheetError};

/// Digits in an EAN-13 payload, before the check digit.
pub const PAYLOAD_LEN: usize = 12;

/// Compute the check digit for a 12-digit payload.
///
/// Digits at even (0-based) positions weigh 1, digits at odd positions weigh
/// 3; the check digit brings the weighted sum up to a multiple of ten.
pub fn check_digit(payload: &str) -> Result<char> {
    if payload.len() != PAYLOAD_LEN || !payload.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SheetError::InvalidPayload(payload.to_string()));
    }
    let sum: u32 = payload
        .bytes()
        .enumerate()
        .map(|(idx, b)| {
            let digit = u32::from(b - b'0');
            if idx % 2 == 0 { digit } else { 3 * digit }
        })
        .sum();
    let check = (10 - sum % 10) % 10;
    Ok(char::from(b'0' + check as u8))
}

/// Force a numeric string to exactly 12 digits.
///
/// Longer input keeps its first 12 digits; shorter input is right-padded
/// with uniformly random digits drawn from `rng`.
pub fn coerce_payload<R: Rng + ?Sized>(number: &str, rng: &mut R) -> Result<String> {
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SheetError::InvalidPayload(number.to_string()));
    }
    let mut payload: String = number.chars().take(PAYLOAD_LEN).collect();
    while payload.len() < PAYLOAD_LEN {
        payload.push(char::from(b'0' + rng.gen_range(0..10u8)));
    }
    Ok(payload)
}
