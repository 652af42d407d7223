//! Closed error taxonomies for the three subsystems: the script interpreter
//! (and verify driver), the block validator, and the coins codec.
//!
//! Message text for [`ScriptError`] follows Bitcoin Core's
//! `script_error.cpp` closely; see the crate-level grounding notes.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// All error conditions that can arise during script parsing, execution,
/// or full verification (input + output + P2SH + witness).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ScriptError {
    #[error("script evaluated without error but finished with a false/empty top stack element")]
    EvalFalse,
    #[error("OP_RETURN was encountered")]
    OpReturn,

    // Max sizes
    #[error("script is too big")]
    ScriptSize,
    #[error("push value size limit exceeded")]
    PushSize,
    #[error("operation limit exceeded")]
    OpCount,
    #[error("stack size limit exceeded")]
    StackSize,
    #[error("signature count negative or greater than pubkey count")]
    SigCount,
    #[error("pubkey count negative or limit exceeded")]
    PubkeyCount,

    // Failed verify operations
    #[error("script failed an OP_VERIFY operation")]
    Verify,
    #[error("script failed an OP_EQUALVERIFY operation")]
    EqualVerify,
    #[error("script failed an OP_NUMEQUALVERIFY operation")]
    NumEqualVerify,
    #[error("script failed an OP_CHECKSIGVERIFY operation")]
    CheckSigVerify,
    #[error("script failed an OP_CHECKMULTISIGVERIFY operation")]
    CheckMultisigVerify,

    // Logical / format / canonical errors
    #[error("opcode missing or not understood: 0x{0:02x}")]
    BadOpcode(u8),
    #[error("attempted to use a disabled opcode: 0x{0:02x}")]
    DisabledOpcode(u8),
    #[error("operation not valid with the current stack size")]
    InvalidStackOperation,
    #[error("operation not valid with the current altstack size")]
    InvalidAltstackOperation,
    #[error("invalid OP_IF construction")]
    UnbalancedConditional,

    // CHECKLOCKTIMEVERIFY / CHECKSEQUENCEVERIFY
    #[error("negative locktime")]
    NegativeLocktime,
    #[error("locktime requirement not satisfied")]
    UnsatisfiedLocktime,

    // Malleability
    #[error("signature hash type missing or not understood")]
    SigHashType,
    #[error("non-canonical DER signature")]
    SigDer,
    #[error("data push larger than necessary")]
    MinimalData,
    #[error("OP_IF/NOTIF argument must be minimal")]
    MinimalIf,
    #[error("only push operators allowed in signatures")]
    SigPushOnly,
    #[error("non-canonical signature: S value is unnecessarily high")]
    SigHighS,
    #[error("dummy CHECKMULTISIG argument must be zero")]
    SigNullDummy,
    #[error("signature must be zero for failed CHECK(MULTI)SIG operation")]
    NullFail,
    #[error("public key is neither compressed nor uncompressed")]
    PubkeyType,
    #[error("using non-compressed keys in segwit")]
    WitnessPubkeyType,
    #[error("stack size must be exactly one after execution")]
    CleanStack,

    // softfork safeness
    #[error("NOPx reserved for soft-fork upgrades")]
    DiscourageUpgradableNops,
    #[error("witness version reserved for soft-fork upgrades")]
    DiscourageUpgradableWitnessProgram,

    // segregated witness
    #[error("witness program has incorrect length")]
    WitnessProgramWrongLength,
    #[error("witness program was passed an empty witness")]
    WitnessProgramWitnessEmpty,
    #[error("witness program hash mismatch")]
    WitnessProgramMismatch,
    #[error("witness requires empty scriptSig")]
    WitnessMalleated,
    #[error("witness requires only-redeemscript scriptSig")]
    WitnessMalleatedP2sh,
    #[error("witness provided for non-witness script")]
    WitnessUnexpected,

    #[error("unknown error")]
    UnknownError,

    // --- Parse-time / structural, kept from the teacher crate ---
    #[error("stack underflow: not enough elements on the stack")]
    StackUnderflow,
    #[error("unexpected end of script")]
    UnexpectedEndOfScript,
    #[error("invalid push data encoding")]
    InvalidPushData,
    #[error("invalid hex string")]
    InvalidHex,
}

/// Reasons a transaction can fail the block validator's per-transaction
/// sanity check, feeding into [`crate::block::VerifyResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BlockError {
    #[error("block has no transactions")]
    NoTransactions,
    #[error("block exceeds maximum size")]
    BadBlockLength,
    #[error("first transaction is not a coinbase")]
    CoinbaseMissing,
    #[error("more than one coinbase transaction")]
    CoinbaseMultiple,
    #[error("a transaction failed its sanity check")]
    BadTransaction,
    #[error("accumulated sigop weight exceeds the limit")]
    BadSigops,
    #[error("duplicate transaction hashes produced a malleated merkle root")]
    DuplicateTransactions,
    #[error("computed merkle root does not match the header")]
    BadMerkleRoot,
}

/// Errors arising from parsing or encoding a [`crate::coins::Coins`] entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CoinsError {
    #[error("buffer ended before the expected field could be read")]
    Truncated,
    #[error("varint encodes a value wider than 64 bits")]
    VarIntOverflow,
    #[error("non-minimal varint encoding")]
    VarIntNonMinimal,
    #[error("unrecognized compressed-script prefix byte: 0x{0:02x}")]
    BadScriptPrefix(u8),
    #[error("requested output index is spent or out of range")]
    OutputNotFound,
}
