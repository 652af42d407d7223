//! Non-contextual block validation: the checks a block must pass on its
//! own, without reference to the chain it would extend (no difficulty
//! target, no UTXO lookups). Mirrors Bitcoin Core's `CheckBlock`.
//!
//! This crate does not parse blocks or transactions itself; callers
//! implement [`BlockTransaction`] over their own transaction type and a
//! header proof-of-work/timestamp check ahead of calling
//! [`verify_non_contextual`].

use crate::error::BlockError;
use crate::hash::hash256;
use crate::merkle::merkle_root;
use crate::num::ScriptNum;

/// Scale factor between a transaction's weight units and its legacy
/// byte size (BIP141).
pub const WITNESS_SCALE_FACTOR: u64 = 4;
/// Maximum total block weight (BIP141).
pub const MAX_BLOCK_WEIGHT: u64 = 4_000_000;
/// Maximum legacy (pre-segwit) serialized block size, implied by
/// `MAX_BLOCK_WEIGHT`.
pub const MAX_BLOCK_BASE_SIZE: u64 = MAX_BLOCK_WEIGHT / WITNESS_SCALE_FACTOR;
/// Maximum accumulated sigop cost per block (BIP141).
pub const MAX_BLOCK_SIGOPS_COST: u64 = 80_000;
/// Blocks between each halving of the block subsidy.
pub const SUBSIDY_HALVING_INTERVAL: u32 = 210_000;
/// Number of confirmations before a coinbase output may be spent.
pub const COINBASE_MATURITY: u32 = 100;
/// Satoshis per bitcoin.
pub const COIN_VALUE: u64 = 100_000_000;
/// Total spendable supply; no valid accounting may ever exceed this.
pub const MAX_MONEY: u64 = 21_000_000 * COIN_VALUE;

/// Sentinel returned by [`block_reward`] when an intermediate sum would
/// exceed [`MAX_MONEY`].
pub const REWARD_OVERFLOW: i64 = -1;

/// The subset of transaction-shaped data the block validator needs.
/// Callers implement this over their own transaction type; this crate
/// never parses one itself.
pub trait BlockTransaction {
    fn txid(&self) -> [u8; 32];
    fn is_coinbase(&self) -> bool;
    /// Legacy (non-witness-discounted) sigop count.
    fn legacy_sigop_count(&self) -> u64;
    /// Structural sanity check (non-empty inputs/outputs, no value
    /// overflow, no duplicate inputs) — independent of UTXO context.
    fn basic_sanity_check(&self) -> bool;
}

/// Weight in weight units, per BIP141: `base_size * (scale - 1) +
/// total_size`.
pub fn weight(base_size: u64, total_size: u64) -> u64 {
    base_size * (WITNESS_SCALE_FACTOR - 1) + total_size
}

/// Virtual size in vbytes: `ceil(weight / WITNESS_SCALE_FACTOR)`.
pub fn virtual_size(weight: u64) -> u64 {
    (weight + WITNESS_SCALE_FACTOR - 1) / WITNESS_SCALE_FACTOR
}

/// Block subsidy at `height`, halving every [`SUBSIDY_HALVING_INTERVAL`]
/// blocks and going to zero after the 33rd halving (where the right
/// shift would otherwise hit zero anyway, but this makes it explicit).
pub fn subsidy(height: u32) -> u64 {
    let halvings = height / SUBSIDY_HALVING_INTERVAL;
    if halvings >= 33 {
        return 0;
    }
    (50 * COIN_VALUE) >> halvings
}

/// Total block reward (subsidy + fees), aborting with [`REWARD_OVERFLOW`]
/// if any partial sum would exceed [`MAX_MONEY`].
pub fn block_reward(height: u32, fees: &[u64]) -> i64 {
    let base = subsidy(height);
    if base > MAX_MONEY {
        return REWARD_OVERFLOW;
    }
    let mut total = base;
    for &fee in fees {
        total = match total.checked_add(fee) {
            Some(t) if t <= MAX_MONEY => t,
            _ => return REWARD_OVERFLOW,
        };
    }
    total as i64
}

/// Computes the expected witness commitment: `hash256(witness_merkle_root
/// || witness_nonce)`.
pub fn expected_witness_commitment(witness_merkle_root: [u8; 32], witness_nonce: [u8; 32]) -> [u8; 32] {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(&witness_merkle_root);
    buf[32..].copy_from_slice(&witness_nonce);
    hash256(&buf)
}

/// Scans a coinbase transaction's output scripts (last-to-first, as
/// consensus does) for the witness commitment marker `OP_RETURN
/// 0x24 0xaa21a9ed <32-byte commitment>`.
pub fn find_witness_commitment(coinbase_outputs: &[Vec<u8>]) -> Option<[u8; 32]> {
    for script in coinbase_outputs.iter().rev() {
        if script.len() >= 38
            && script[0] == 0x6a
            && script[1] == 0x24
            && script[2..6] == [0xaa, 0x21, 0xa9, 0xed]
        {
            let mut commitment = [0u8; 32];
            commitment.copy_from_slice(&script[6..38]);
            return Some(commitment);
        }
    }
    None
}

/// Decodes the BIP34 height commitment from a coinbase's first scriptSig
/// push. Accepts both a direct data push of the little-endian height (up
/// to 6 bytes, per [`ScriptNum`]'s coinbase-height width) and the single-byte
/// small-integer opcodes `OP_0`/`OP_1`..`OP_16`, since a height of 0..=16 is
/// minimally encoded as one of those rather than as a push.
pub fn coinbase_height(script_sig: &[u8]) -> Option<i64> {
    let &first = script_sig.first()?;
    match first {
        0x00 => Some(0),
        0x51..=0x60 => Some((first - 0x50) as i64),
        len @ 0x01..=0x4b => {
            let bytes = script_sig.get(1..1 + len as usize)?;
            ScriptNum::decode(bytes, 6, false).ok().map(ScriptNum::value)
        }
        _ => None,
    }
}

/// A non-contextual block check failure: the consensus reason plus the
/// misbehavior score a P2P implementation would attach to the peer that
/// relayed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyFailure {
    pub reason: BlockError,
    pub score: u32,
}

/// Verifies a block's transactions against every context-free rule:
/// non-empty, within the base-size limit, coinbase-shaped, individually
/// sane, within the sigop budget, and merkle-consistent.
///
/// Proof-of-work and timestamp sanity are a header-verifier's
/// responsibility and are checked by the caller before this is called —
/// they carry no [`BlockError`] of their own in this taxonomy.
pub fn verify_non_contextual<T: BlockTransaction>(
    txs: &[T],
    header_merkle_root: [u8; 32],
    base_size: u64,
) -> Result<(), VerifyFailure> {
    if txs.is_empty() {
        return Err(VerifyFailure {
            reason: BlockError::NoTransactions,
            score: 100,
        });
    }
    if base_size > MAX_BLOCK_BASE_SIZE {
        return Err(VerifyFailure {
            reason: BlockError::BadBlockLength,
            score: 100,
        });
    }
    if !txs[0].is_coinbase() {
        return Err(VerifyFailure {
            reason: BlockError::CoinbaseMissing,
            score: 100,
        });
    }
    if txs[1..].iter().any(|t| t.is_coinbase()) {
        return Err(VerifyFailure {
            reason: BlockError::CoinbaseMultiple,
            score: 100,
        });
    }
    for tx in txs {
        if !tx.basic_sanity_check() {
            return Err(VerifyFailure {
                reason: BlockError::BadTransaction,
                score: 100,
            });
        }
    }

    let total_sigops: u64 = txs.iter().map(|t| t.legacy_sigop_count()).sum();
    if total_sigops.saturating_mul(WITNESS_SCALE_FACTOR) > MAX_BLOCK_SIGOPS_COST {
        return Err(VerifyFailure {
            reason: BlockError::BadSigops,
            score: 100,
        });
    }

    let txids: Vec<[u8; 32]> = txs.iter().map(|t| t.txid()).collect();
    let root = merkle_root(&txids).ok_or(VerifyFailure {
        reason: BlockError::DuplicateTransactions,
        score: 100,
    })?;
    if root != header_merkle_root {
        return Err(VerifyFailure {
            reason: BlockError::BadMerkleRoot,
            score: 100,
        });
    }

    Ok(())
}
