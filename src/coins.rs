//! The UTXO ("Coins") codec: the compact, lazily-decoded wire format the
//! chain's persistent store uses for a transaction's unspent outputs.
//!
//! Distinct from the ordinary P2P-message `CompactSize` varint, the
//! chainstate format uses a 7-bit-per-byte big-endian varint (here called
//! [`CVarInt`] for clarity) that never wastes a leading zero group, plus a
//! `compress_amount`/`decompress_amount` bijection that shrinks round
//! satoshi amounts before varint-encoding them.

use crate::error::CoinsError;

// ── CVarInt ──────────────────────────────────────────────────────────────

/// Encodes `n` using the chainstate's 7-bit/byte varint: each byte carries
/// 7 data bits, written most-significant-group first, every byte but the
/// last has its high bit set, and each continuation step already implies
/// a `+1` (so there is exactly one encoding per value — no padding with
/// leading zero groups is possible).
pub fn write_varint(mut n: u64) -> Vec<u8> {
    let mut tmp = Vec::new();
    loop {
        let flag = if tmp.is_empty() { 0x00 } else { 0x80 };
        tmp.push((n & 0x7f) as u8 | flag);
        if n <= 0x7f {
            break;
        }
        n = (n >> 7) - 1;
    }
    tmp.reverse();
    tmp
}

/// Decodes a [`write_varint`]-encoded value from the start of `buf`.
/// Returns the value and the number of bytes consumed.
pub fn read_varint(buf: &[u8]) -> Result<(u64, usize), CoinsError> {
    let mut n: u64 = 0;
    let mut consumed = 0;
    loop {
        let byte = *buf.get(consumed).ok_or(CoinsError::Truncated)?;
        consumed += 1;
        if n > (u64::MAX >> 7) {
            return Err(CoinsError::VarIntOverflow);
        }
        n = (n << 7) | (byte & 0x7f) as u64;
        if byte & 0x80 != 0 {
            n = n.checked_add(1).ok_or(CoinsError::VarIntOverflow)?;
        } else {
            return Ok((n, consumed));
        }
    }
}

// ── Amount compression ───────────────────────────────────────────────────

/// Losslessly remaps a satoshi amount into a smaller integer by factoring
/// out trailing powers of ten, so that round amounts (the overwhelming
/// majority of real outputs) varint-encode to fewer bytes.
pub fn compress_amount(n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    let mut n = n;
    let mut e = 0u64;
    while n % 10 == 0 && e < 9 {
        n /= 10;
        e += 1;
    }
    if e < 9 {
        let d = n % 10;
        n /= 10;
        1 + (n * 9 + d - 1) * 10 + e
    } else {
        1 + (n - 1) * 10 + 9
    }
}

/// Inverse of [`compress_amount`].
pub fn decompress_amount(x: u64) -> u64 {
    if x == 0 {
        return 0;
    }
    let mut x = x - 1;
    let e = x % 10;
    x /= 10;
    let mut n;
    if e < 9 {
        let d = x % 9 + 1;
        x /= 9;
        n = x * 10 + d;
    } else {
        n = x + 1;
    }
    let mut e = e;
    while e > 0 {
        n *= 10;
        e -= 1;
    }
    n
}

// ── Compressed script encoding ───────────────────────────────────────────

/// Compresses a scriptPubKey for chainstate storage, recognizing the
/// common standard patterns; anything else falls back to a raw,
/// varint-length-prefixed copy.
pub fn compress_script(script: &[u8]) -> Vec<u8> {
    if script.len() == 25
        && script[0] == 0x76
        && script[1] == 0xa9
        && script[2] == 0x14
        && script[23] == 0x88
        && script[24] == 0xac
    {
        let mut out = vec![0x01];
        out.extend_from_slice(&script[3..23]);
        return out;
    }
    if script.len() == 23 && script[0] == 0xa9 && script[1] == 0x14 && script[22] == 0x87 {
        let mut out = vec![0x02];
        out.extend_from_slice(&script[2..22]);
        return out;
    }
    if script.len() == 35
        && script[0] == 0x21
        && script[34] == 0xac
        && (script[1] == 0x02 || script[1] == 0x03)
    {
        let mut out = vec![0x03];
        out.extend_from_slice(&script[1..34]);
        return out;
    }
    let mut out = vec![0x00];
    out.extend_from_slice(&write_varint(script.len() as u64));
    out.extend_from_slice(script);
    out
}

/// Decompresses a script previously produced by [`compress_script`].
/// Returns the reconstructed script and the number of bytes consumed
/// from `buf`.
pub fn decompress_script(buf: &[u8]) -> Result<(Vec<u8>, usize), CoinsError> {
    let prefix = *buf.first().ok_or(CoinsError::Truncated)?;
    match prefix {
        0x01 => {
            let hash = buf.get(1..21).ok_or(CoinsError::Truncated)?;
            let mut script = vec![0x76, 0xa9, 0x14];
            script.extend_from_slice(hash);
            script.push(0x88);
            script.push(0xac);
            Ok((script, 21))
        }
        0x02 => {
            let hash = buf.get(1..21).ok_or(CoinsError::Truncated)?;
            let mut script = vec![0xa9, 0x14];
            script.extend_from_slice(hash);
            script.push(0x87);
            Ok((script, 21))
        }
        0x03 => {
            let pk = buf.get(1..34).ok_or(CoinsError::Truncated)?;
            let mut script = vec![0x21];
            script.extend_from_slice(pk);
            script.push(0xac);
            Ok((script, 34))
        }
        0x00 => {
            let (len, n) = read_varint(&buf[1..])?;
            let start = 1 + n;
            let end = start
                .checked_add(len as usize)
                .ok_or(CoinsError::Truncated)?;
            let script = buf.get(start..end).ok_or(CoinsError::Truncated)?.to_vec();
            Ok((script, end))
        }
        other => Err(CoinsError::BadScriptPrefix(other)),
    }
}

// ── Coins entry ───────────────────────────────────────────────────────────

/// One unspent output as recorded in a [`Coins`] entry, decoded lazily:
/// the compressed bytes are copied out at parse time but not decompressed
/// until [`LazyOutput::decode`] is called.
#[derive(Debug, Clone)]
pub struct LazyOutput {
    compressed_script: Vec<u8>,
    compressed_value: u64,
}

impl LazyOutput {
    /// Decompresses the script and value. Re-derived on every call rather
    /// than cached, since callers typically touch a given output once.
    pub fn decode(&self) -> Result<(Vec<u8>, u64), CoinsError> {
        let (script, _) = decompress_script(&self.compressed_script)?;
        Ok((script, decompress_amount(self.compressed_value)))
    }

    /// Raw compressed script payload, for re-serializing unmodified.
    pub fn compressed_script(&self) -> &[u8] {
        &self.compressed_script
    }

    pub fn compressed_value(&self) -> u64 {
        self.compressed_value
    }
}

/// A transaction's full unspent-output set, as stored by the chain's
/// persistent UTXO database.
#[derive(Debug, Clone)]
pub struct Coins {
    pub version: u64,
    /// Block height, or `-1` if the special "unconfirmed" sentinel
    /// (`0x7FFFFFFF`) was stored.
    pub height: i64,
    pub is_coinbase: bool,
    /// `None` at index `i` means output `i` is spent.
    outputs: Vec<Option<LazyOutput>>,
}

impl Coins {
    pub fn output(&self, index: usize) -> Option<&LazyOutput> {
        self.outputs.get(index).and_then(|o| o.as_ref())
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

fn spent_bit(spent_field: &[u8], index: usize) -> bool {
    let byte = spent_field[index / 8];
    (byte >> (7 - (index % 8))) & 1 == 1
}

/// Parses a full `Coins` entry from its chainstate wire encoding.
pub fn parse_coins(buf: &[u8]) -> Result<Coins, CoinsError> {
    let mut pos = 0;

    let (version, n) = read_varint(&buf[pos..])?;
    pos += n;

    let bits_bytes: [u8; 4] = buf
        .get(pos..pos + 4)
        .ok_or(CoinsError::Truncated)?
        .try_into()
        .unwrap();
    pos += 4;
    let bits = u32::from_le_bytes(bits_bytes);
    let is_coinbase = bits & 1 == 1;
    let height_raw = (bits >> 1) as i64;
    let height = if height_raw == 0x7fff_ffff { -1 } else { height_raw };

    let (flen, n) = read_varint(&buf[pos..])?;
    pos += n;
    let flen = flen as usize;
    let spent_field = buf.get(pos..pos + flen).ok_or(CoinsError::Truncated)?;
    pos += flen;

    // `flen` is byte-aligned (`ceil(S / 8)`); recover the real output count
    // `S` by finding the last unspent bit and truncating there, the same
    // technique the chainstate dump's `read_unspentness_mask` uses, rather
    // than iterating all `flen * 8` byte-aligned slots (the trailing ones
    // past `S` carry no data in the buffer at all).
    let num_outputs = (0..flen * 8)
        .rev()
        .find(|&i| !spent_bit(spent_field, i))
        .map_or(0, |last_unspent| last_unspent + 1);

    let mut outputs = Vec::with_capacity(num_outputs);
    for i in 0..num_outputs {
        if spent_bit(spent_field, i) {
            outputs.push(None);
            continue;
        }
        let (_, consumed) = decompress_script(&buf[pos..])?;
        let compressed_script = buf
            .get(pos..pos + consumed)
            .ok_or(CoinsError::Truncated)?
            .to_vec();
        pos += consumed;
        let (compressed_value, n) = read_varint(&buf[pos..])?;
        pos += n;
        outputs.push(Some(LazyOutput {
            compressed_script,
            compressed_value,
        }));
    }

    Ok(Coins {
        version,
        height,
        is_coinbase,
        outputs,
    })
}

/// Fast path for reading a single output by index without materializing
/// the full outputs vector. `txid` identifies which chainstate entry
/// `buffer` belongs to; it is not otherwise consulted during parsing
/// since `buffer` is already scoped to that entry.
pub fn parse_coin(
    buffer: &[u8],
    _txid: &[u8; 32],
    index: usize,
) -> Result<Option<(Vec<u8>, u64)>, CoinsError> {
    let mut pos = 0;
    let (_, n) = read_varint(&buffer[pos..])?;
    pos += n;
    pos += 4; // bits

    let (flen, n) = read_varint(&buffer[pos..])?;
    pos += n;
    let flen = flen as usize;
    let spent_field = buffer.get(pos..pos + flen).ok_or(CoinsError::Truncated)?;
    pos += flen;

    if index / 8 >= flen {
        return Ok(None);
    }

    for i in 0..=index {
        let spent = spent_bit(spent_field, i);
        if i == index {
            if spent {
                return Ok(None);
            }
            let (script, consumed) = decompress_script(&buffer[pos..])?;
            pos += consumed;
            let (value, _) = read_varint(&buffer[pos..])?;
            return Ok(Some((script, decompress_amount(value))));
        }
        if !spent {
            let (_, consumed) = decompress_script(&buffer[pos..])?;
            pos += consumed;
            let (_, n) = read_varint(&buffer[pos..])?;
            pos += n;
        }
    }
    Ok(None)
}
