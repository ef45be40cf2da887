use std::fmt;

use rand::Rng;

use crate::barcode::checksum::{PAYLOAD_LEN, check_digit, coerce_payload};
use crate::error::{Result, SheetError};

/// Bars in a complete EAN-13 symbol, guards included.
pub const MODULE_COUNT: usize = 95;

const START_GUARD: [bool; 3] = [true, false, true];
const CENTER_GUARD: [bool; 5] = [false, true, false, true, false];
const END_GUARD: [bool; 3] = [true, false, true];

// 7-bit patterns, most significant bit drawn first.
#[rustfmt::skip]
const L_CODES: [u8; 10] = [
    0b0001101, 0b0011001, 0b0010011, 0b0111101, 0b0100011,
    0b0110001, 0b0101111, 0b0111011, 0b0110111, 0b0001011,
];
#[rustfmt::skip]
const G_CODES: [u8; 10] = [
    0b0100111, 0b0110011, 0b0011011, 0b0100001, 0b0011101,
    0b0111001, 0b0000101, 0b0010001, 0b0001001, 0b0010111,
];
#[rustfmt::skip]
const R_CODES: [u8; 10] = [
    0b1110010, 0b1100110, 0b1101100, 0b1000010, 0b1011100,
    0b1001110, 0b1010000, 0b1000100, 0b1001000, 0b1110100,
];

/// Left-half parity per leading digit; `true` selects the G code.
#[rustfmt::skip]
const PARITY: [[bool; 6]; 10] = [
    [false, false, false, false, false, false],
    [false, false, true,  false, true,  true ],
    [false, false, true,  true,  false, true ],
    [false, false, true,  true,  true,  false],
    [false, true,  false, false, true,  true ],
    [false, true,  true,  false, false, true ],
    [false, true,  true,  true,  false, false],
    [false, true,  false, true,  false, true ],
    [false, true,  false, true,  true,  false],
    [false, true,  true,  false, true,  false],
];

/// A validated 13-digit EAN code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ean13 {
    digits: [u8; 13],
}

impl Ean13 {
    /// Build from an exact 12-digit payload, appending the check digit.
    pub fn from_payload(payload: &str) -> Result<Self> {
        let check = check_digit(payload)?;
        let mut digits = [0u8; 13];
        for (slot, b) in digits.iter_mut().zip(payload.bytes()) {
            *slot = b - b'0';
        }
        digits[PAYLOAD_LEN] = check as u8 - b'0';
        Ok(Self { digits })
    }

    /// Build from a numeric string of any length, truncating or
    /// random-padding it to 12 digits first.
    pub fn from_number<R: Rng + ?Sized>(number: &str, rng: &mut R) -> Result<Self> {
        let payload = coerce_payload(number, rng)?;
        Self::from_payload(&payload)
    }

    /// Parse a complete 13-digit code, verifying its check digit.
    pub fn parse(code: &str) -> Result<Self> {
        if code.len() != 13 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SheetError::InvalidPayload(code.to_string()));
        }
        let parsed = Self::from_payload(&code[..PAYLOAD_LEN])?;
        if parsed.to_string() != code {
            return Err(SheetError::InvalidPayload(code.to_string()));
        }
        Ok(parsed)
    }

    pub fn digits(&self) -> &[u8; 13] {
        &self.digits
    }

    pub fn check_digit(&self) -> u8 {
        self.digits[PAYLOAD_LEN]
    }

    /// Bar pattern, `true` for a dark module.
    pub fn modules(&self) -> [bool; MODULE_COUNT] {
        let mut out = [false; MODULE_COUNT];
        let mut pos = 0;
        let mut push = |bits: &[bool]| {
            out[pos..pos + bits.len()].copy_from_slice(bits);
            pos += bits.len();
        };

        push(&START_GUARD);
        let parity = PARITY[self.digits[0] as usize];
        for (idx, &digit) in self.digits[1..7].iter().enumerate() {
            let table = if parity[idx] { &G_CODES } else { &L_CODES };
            push(&code_bits(table[digit as usize]));
        }
        push(&CENTER_GUARD);
        for &digit in &self.digits[7..] {
            push(&code_bits(R_CODES[digit as usize]));
        }
        push(&END_GUARD);
        out
    }
}

impl fmt::Display for Ean13 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in self.digits {
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

fn code_bits(code: u8) -> [bool; 7] {
    let mut bits = [false; 7];
    for (i, bit) in bits.iter_mut().enumerate() {
        *bit = (code >> (6 - i)) & 1 == 1;
    }
    bits
}
