//! Script numbers: signed little-endian integers with a sign bit in the
//! top byte of the last byte, as pushed and consumed by the arithmetic,
//! `OP_CHECKLOCKTIMEVERIFY`, and `OP_CHECKSEQUENCEVERIFY` opcodes.
//!
//! Encoding width is bounded by context: ordinary arithmetic limits operands
//! to 4 bytes, CLTV/CSV accept up to 5, and the coinbase height push (BIP34)
//! is allowed up to 6.

use crate::error::ScriptError;

/// A decoded script number. Internally represented as `i64`, which is wide
/// enough for every width this crate decodes (up to 6 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScriptNum(pub i64);

impl ScriptNum {
    pub fn new(value: i64) -> Self {
        ScriptNum(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    /// Decode a script number from its minimal little-endian encoding.
    ///
    /// `max_size` bounds the accepted byte length (4 for ordinary arithmetic,
    /// 5 for CLTV/CSV operands). When `require_minimal` is set, any encoding
    /// with a redundant top byte is rejected: the value is encoded minimally
    /// unless the high bit of the second-to-last byte is already set (in
    /// which case the extra sign byte is mandatory, not redundant).
    pub fn decode(
        bytes: &[u8],
        max_size: usize,
        require_minimal: bool,
    ) -> Result<ScriptNum, ScriptError> {
        if bytes.len() > max_size {
            return Err(ScriptError::InvalidStackOperation);
        }
        if require_minimal && !bytes.is_empty() {
            let last = bytes[bytes.len() - 1];
            if last & 0x7f == 0 {
                let redundant = bytes.len() <= 1
                    || bytes[bytes.len() - 2] & 0x80 == 0;
                if redundant {
                    return Err(ScriptError::MinimalData);
                }
            }
        }
        if bytes.is_empty() {
            return Ok(ScriptNum(0));
        }

        let mut result: i64 = 0;
        for (i, &byte) in bytes.iter().enumerate() {
            result |= (byte as i64) << (8 * i);
        }

        let last = bytes[bytes.len() - 1];
        if last & 0x80 != 0 {
            result &= !(0x80i64 << (8 * (bytes.len() - 1)));
            result = -result;
        }
        Ok(ScriptNum(result))
    }

    /// Encode into the minimal little-endian representation Bitcoin Script
    /// uses for pushed numbers (empty vector for zero).
    pub fn encode(self) -> Vec<u8> {
        let mut value = self.0;
        if value == 0 {
            return Vec::new();
        }
        let negative = value < 0;
        let mut abs = value.unsigned_abs();
        let mut out = Vec::new();
        while abs > 0 {
            out.push((abs & 0xff) as u8);
            abs >>= 8;
        }
        let last = *out.last().unwrap();
        if last & 0x80 != 0 {
            out.push(if negative { 0x80 } else { 0x00 });
        } else if negative {
            *out.last_mut().unwrap() |= 0x80;
        }
        // silence unused-mut warnings under some toolchains
        let _ = &mut value;
        out
    }

    pub fn to_bool(self) -> bool {
        self.0 != 0
    }
}

impl From<i64> for ScriptNum {
    fn from(value: i64) -> Self {
        ScriptNum(value)
    }
}

impl From<ScriptNum> for i64 {
    fn from(num: ScriptNum) -> Self {
        num.0
    }
}
