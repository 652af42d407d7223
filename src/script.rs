//! `Script`: a thin wrapper over raw script bytes plus the classification
//! helpers the verify driver needs (P2SH detection, witness-program
//! detection) and code-separator-aware subscript extraction.

use crate::engine::{eval_script, execute, ExecContext};
use crate::error::ScriptError;
use crate::stack::{is_true, Stack};
use crate::token::Token;
use crate::tokenizer::parse_script;

/// Maximum serialized script size.
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// A script: raw bytes plus lazy tokenization. Keeps the original bytes
/// around (rather than only the parsed tokens) because P2SH and witness
/// classification both operate on the byte pattern directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    bytes: Vec<u8>,
}

impl Script {
    pub fn new(bytes: Vec<u8>) -> Self {
        Script { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Tokenizes the script. Does not reject over-size scripts itself —
    /// callers enforce `ScriptError::ScriptSize` using [`MAX_SCRIPT_SIZE`]
    /// before invoking execution, matching where consensus checks it.
    pub fn tokens(&self) -> Result<Vec<Token>, ScriptError> {
        parse_script(&self.bytes)
    }

    /// `true` for the BIP16 pattern `OP_HASH160 <20 bytes> OP_EQUAL`.
    pub fn is_p2sh(&self) -> bool {
        self.bytes.len() == 23
            && self.bytes[0] == 0xa9
            && self.bytes[1] == 0x14
            && self.bytes[22] == 0x87
    }

    /// Classifies a witness program: `OP_n <2..40 bytes>` where `n` is
    /// `OP_0` or `OP_1`..`OP_16`. Returns `(version, program)`.
    pub fn witness_program(&self) -> Option<(u8, Vec<u8>)> {
        if self.bytes.len() < 4 || self.bytes.len() > 42 {
            return None;
        }
        let version_byte = self.bytes[0];
        let version = if version_byte == 0x00 {
            0
        } else if (0x51..=0x60).contains(&version_byte) {
            version_byte - 0x50
        } else {
            return None;
        };
        let push_len = self.bytes[1] as usize;
        if push_len < 2 || push_len > 40 {
            return None;
        }
        if self.bytes.len() != 2 + push_len {
            return None;
        }
        Some((version, self.bytes[2..].to_vec()))
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Script::new(bytes)
    }
}

/// Validates a Pay-to-Public-Key-Hash (P2PKH) script pair.
///
/// Executes `script_sig` (the unlocking script) on a fresh stack, then
/// executes `script_pubkey` (the locking script) on the resulting stack.
/// This two-phase model matches Bitcoin's actual execution behavior
/// (post-2010), preventing scriptSig from manipulating scriptPubKey's
/// control flow. Uses stub transaction context and an always-true
/// signature verifier; for real verification under a full set of
/// consensus rules use [`crate::verify::verify_script`].
///
/// Both arguments are raw script bytes (not hex). Use
/// [`crate::hex::decode_hex`] to convert hex strings first.
pub fn validate_p2pkh(script_sig: &[u8], script_pubkey: &[u8]) -> Result<bool, ScriptError> {
    let sig_tokens = parse_script(script_sig)?;
    let pk_tokens = parse_script(script_pubkey)?;

    let ctx = ExecContext {
        flags: crate::flags::VerificationFlags::empty(),
        tx: &crate::engine::StubTxContext,
        checker: &crate::engine::StubVerifier,
        sig_version: crate::txcontext::SigVersion::Base,
    };

    let mut stack = Stack::new();
    eval_script(&sig_tokens, &mut stack, &ctx)?;
    eval_script(&pk_tokens, &mut stack, &ctx)?;

    if stack.is_empty() {
        return Ok(false);
    }
    let top = stack.pop()?;
    Ok(is_true(&top))
}

/// Quick single-script smoke test: parses and executes `script` alone
/// against a fresh stack, in stub mode. Primarily useful for unit tests
/// that don't need the two-phase scriptSig/scriptPubKey split.
pub fn run_script(script: &[u8]) -> Result<bool, ScriptError> {
    let tokens = parse_script(script)?;
    execute(&tokens)
}
