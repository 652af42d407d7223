//! A Bitcoin consensus-core library: Script parsing and execution, block
//! structural validation, and the UTXO (chainstate) codec.
//!
//! Bitcoin Script is the stack-based programming language used to define
//! spending conditions for Bitcoin transaction outputs. This crate
//! implements the full opcode table (arithmetic, stack manipulation,
//! conditionals, hashing, CHECKSIG/CHECKMULTISIG, CHECKLOCKTIMEVERIFY/
//! CHECKSEQUENCEVERIFY), the BIP16 P2SH extension, and the BIP141/143/144
//! segregated-witness program types (P2WPKH, P2WSH), plus an optional
//! witness v1 MAST script-path spend gated behind a dedicated
//! verification flag. Alongside Script, it validates block-level
//! structural invariants (merkle root, coinbase placement, sigop budget,
//! weight/size limits) and decodes the compact on-disk UTXO entry format
//! used by chainstate databases.
//!
//! # Consensus warning
//!
//! **This crate is NOT consensus-compatible with Bitcoin Core.**
//!
//! A reimplementation of Bitcoin's validation rules cannot guarantee
//! identical behavior to Bitcoin Core's C++ interpreter across every edge
//! case — number encoding boundaries, error ordering, stack overflow
//! semantics, and other subtle behaviors that define Bitcoin's consensus
//! rules.
//!
//! **Do not use this crate to validate real transactions or protect real
//! funds.**
//!
//! This crate is intended for:
//! - **Education** — learning how Bitcoin Script and block validation work internally
//! - **Tooling** — script inspection, debugging, and construction
//! - **Testing** — validating script and block logic before broadcast
//!
//! # What this crate implements
//!
//! - **Tokenizer** ([`tokenizer`]): parses raw script bytes into a
//!   sequence of [`token::Token`]s, handling all four push-data encodings
//!   (direct, PUSHDATA1/2/4).
//! - **Execution engine** ([`engine`]): a stack-based virtual machine
//!   executing the full opcode table under a [`flags::VerificationFlags`]
//!   soft-fork gate.
//! - **Verify driver** ([`verify`]): composes scriptSig/scriptPubKey
//!   execution with P2SH redemption and witness-program verification.
//! - **Witness programs** ([`witness`]): BIP141/143 v0 P2WPKH/P2WSH, and
//!   an optional v1 MAST script-path spend.
//! - **Block validation** ([`block`]): non-contextual structural checks —
//!   merkle root, coinbase rules, sigop budget, weight/size limits,
//!   subsidy schedule, witness commitment.
//! - **UTXO codec** ([`coins`]): the compact chainstate entry format,
//!   including CVarInt and amount/script compression.
//! - **Hash functions** ([`hash`]): SHA-256, RIPEMD-160, HASH160, and HASH256.
//!
//! # Consumed interfaces
//!
//! This crate does not parse or sign transactions itself. Callers supply
//! transaction and signature-checking context by implementing
//! [`txcontext::TxContext`] and [`txcontext::SignatureVerifier`] (see
//! [`engine::StubTxContext`]/[`engine::StubVerifier`] for a permissive
//! reference implementation used in this crate's own tests).
//!
//! # Quick example
//!
//! ```rust
//! use btc_consensus_core::tokenizer::parse_script_hex;
//! use btc_consensus_core::engine::execute;
//!
//! // Simple script: OP_1 OP_1 OP_EQUAL
//! let tokens = parse_script_hex("515187").unwrap();
//! let result = execute(&tokens).unwrap();
//! assert!(result); // 1 == 1
//! ```
//!
//! # Feature flags
//!
//! | Feature     | Description                                        |
//! |-------------|----------------------------------------------------|
//! | `secp256k1` | Enables real ECDSA signature verification for      |
//! |             | OP_CHECKSIG via the `secp256k1` crate.             |
//! | `serde`     | Derives `Serialize`/`Deserialize` for wire-facing   |
//! |             | types where applicable.                            |

pub mod block;
pub mod coins;
pub mod engine;
pub mod error;
pub mod flags;
pub mod hash;
pub mod hex;
pub mod merkle;
pub mod num;
pub mod opcode;
pub mod script;
pub(crate) mod stack;
pub mod token;
pub mod tokenizer;
pub mod txcontext;
pub mod verify;
pub mod witness;
