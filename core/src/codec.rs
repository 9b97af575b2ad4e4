//! Elias gamma / delta bit codes.
//!
//! Values are written into a [`Bits`] buffer packed MSB-first into bytes and read back
//! with a [`BitReader`]. `gamma(k)` costs `2*N - 1` bits and `delta(k)` costs
//! `N + 2*floor(log2 N)` bits, `N` being the bit length of `k`: gamma is never longer below 32,
//! delta is shorter from 32 up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("malformed code at bit {offset}: {reason}")]
    MalformedCode { offset: usize, reason: &'static str },
}

/// Which code family a postings stream is written with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    Gamma,
    #[default]
    Delta,
}

impl CodecKind {
    /// Append `value`, which must be positive: a stream cannot tell the gamma zero
    /// sentinel apart from the prefix of the next code.
    pub fn write(self, out: &mut Bits, value: u64) -> Result<(), CodecError> {
        match self {
            CodecKind::Gamma if value == 0 => {
                Err(CodecError::InvalidInput("gamma streams carry positive integers only".into()))
            }
            CodecKind::Gamma => {
                write_gamma(out, value);
                Ok(())
            }
            CodecKind::Delta => write_delta(out, value),
        }
    }

    /// Read one value of this family. Streams never carry the gamma sentinel.
    pub fn read(self, reader: &mut BitReader<'_>) -> Result<u64, CodecError> {
        match self {
            CodecKind::Gamma => reader.read_gamma(),
            CodecKind::Delta => reader.read_delta(),
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecKind::Gamma => f.write_str("gamma"),
            CodecKind::Delta => f.write_str("delta"),
        }
    }
}

impl FromStr for CodecKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gamma" => Ok(CodecKind::Gamma),
            "delta" => Ok(CodecKind::Delta),
            other => Err(format!("unknown codec '{other}', expected gamma or delta")),
        }
    }
}

/// A growable bit sequence.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Bits {
    bytes: Vec<u8>,
    len: usize,
}

impl Bits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, bit: bool) {
        if self.len % 8 == 0 {
            self.bytes.push(0);
        }
        if bit {
            self.bytes[self.len / 8] |= 0x80 >> (self.len % 8);
        }
        self.len += 1;
    }

    /// Push the `count` low-order bits of `value`, most significant first.
    fn push_low_bits(&mut self, value: u64, count: u32) {
        for shift in (0..count).rev() {
            self.push((value >> shift) & 1 == 1);
        }
    }

    pub fn get(&self, idx: usize) -> Option<bool> {
        if idx >= self.len {
            return None;
        }
        Some(self.bytes[idx / 8] & (0x80 >> (idx % 8)) != 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }

    /// Packed bytes; the unused tail of the last byte is zero.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn shrink_to_fit(&mut self) {
        self.bytes.shrink_to_fit();
    }

    /// Bytes held on the heap by this buffer.
    pub fn heap_bytes(&self) -> usize {
        self.bytes.capacity()
    }
}

impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bits({self})")
    }
}

impl FromStr for Bits {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bits = Bits::new();
        for ch in s.chars() {
            match ch {
                '0' => bits.push(false),
                '1' => bits.push(true),
                other => {
                    return Err(CodecError::InvalidInput(format!(
                        "bit strings may only contain '0' and '1', found {other:?}"
                    )))
                }
            }
        }
        Ok(bits)
    }
}

/// Cursor over a [`Bits`] buffer.
pub struct BitReader<'a> {
    bits: &'a Bits,
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bits: &'a Bits) -> Self {
        Self { bits, pos: 0 }
    }

    /// Number of bits consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bits.len() - self.pos
    }

    fn read_bit(&mut self) -> Option<bool> {
        let bit = self.bits.get(self.pos)?;
        self.pos += 1;
        Some(bit)
    }

    /// Rebuild a value of `1 + count` bits whose leading 1 is implied.
    fn read_implied(&mut self, count: u32, start: usize) -> Result<u64, CodecError> {
        let mut value = 1u64;
        for _ in 0..count {
            let bit = self.read_bit().ok_or(CodecError::MalformedCode {
                offset: start,
                reason: "truncated suffix",
            })?;
            value = (value << 1) | u64::from(bit);
        }
        Ok(value)
    }

    /// Read a gamma code for a positive value.
    pub fn read_gamma(&mut self) -> Result<u64, CodecError> {
        let start = self.pos;
        let mut zeros = 0u32;
        loop {
            match self.read_bit() {
                Some(true) => break,
                Some(false) => zeros += 1,
                None => {
                    return Err(CodecError::MalformedCode {
                        offset: start,
                        reason: "no prefix terminator",
                    })
                }
            }
        }
        if zeros >= u64::BITS {
            return Err(CodecError::MalformedCode {
                offset: start,
                reason: "length prefix overflows u64",
            });
        }
        self.read_implied(zeros, start)
    }

    /// Read a delta code.
    pub fn read_delta(&mut self) -> Result<u64, CodecError> {
        let start = self.pos;
        let len = self.read_gamma()?;
        if len > u64::from(u64::BITS) {
            return Err(CodecError::MalformedCode {
                offset: start,
                reason: "length prefix overflows u64",
            });
        }
        self.read_implied(len as u32 - 1, start)
    }
}

fn bit_length(value: u64) -> u32 {
    u64::BITS - value.leading_zeros()
}

/// Append the gamma code of `value`; zero is written as the single sentinel bit `0`.
pub fn write_gamma(out: &mut Bits, value: u64) {
    if value == 0 {
        out.push(false);
        return;
    }
    let n = bit_length(value);
    for _ in 1..n {
        out.push(false);
    }
    out.push(true);
    out.push_low_bits(value, n - 1);
}

/// Append the delta code of `value`, which must be positive.
pub fn write_delta(out: &mut Bits, value: u64) -> Result<(), CodecError> {
    if value == 0 {
        return Err(CodecError::InvalidInput(
            "delta codes are defined for positive integers only".into(),
        ));
    }
    let n = bit_length(value);
    write_gamma(out, u64::from(n));
    out.push_low_bits(value, n - 1);
    Ok(())
}

pub fn encode_gamma(value: u64) -> Bits {
    let mut bits = Bits::new();
    write_gamma(&mut bits, value);
    bits
}

/// Decode one gamma code from the start of `bits`, returning the value and the number of
/// bits it occupied. A lone `0` bit is the zero sentinel.
pub fn decode_gamma(bits: &Bits) -> Result<(u64, usize), CodecError> {
    if bits.len() == 1 && bits.get(0) == Some(false) {
        return Ok((0, 1));
    }
    let mut reader = BitReader::new(bits);
    let value = reader.read_gamma()?;
    Ok((value, reader.position()))
}

pub fn encode_delta(value: u64) -> Result<Bits, CodecError> {
    let mut bits = Bits::new();
    write_delta(&mut bits, value)?;
    Ok(bits)
}

pub fn decode_delta(bits: &Bits) -> Result<(u64, usize), CodecError> {
    let mut reader = BitReader::new(bits);
    let value = reader.read_delta()?;
    Ok((value, reader.position()))
}

/// Bring a signed integer into the codec's domain.
pub fn code_value(value: i64) -> Result<u64, CodecError> {
    u64::try_from(value)
        .map_err(|_| CodecError::InvalidInput(format!("cannot encode negative value {value}")))
}
