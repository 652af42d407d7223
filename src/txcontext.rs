//! The interfaces the interpreter consumes but does not implement itself:
//! transaction-shaped context (locktime/sequence/amounts, the sighash
//! algorithm) and signature verification, plus a small cache in front of
//! the latter.
//!
//! Keeping these as traits (rather than concrete transaction/ECDSA types)
//! is what lets this crate verify scripts without owning a transaction
//! format or a specific signing library beyond the optional `secp256k1`
//! default implementation.

use std::collections::HashMap;
use std::sync::Mutex;

/// Which signature-hashing rules apply to the script currently executing.
/// Distinct sigops must hash different preimages depending on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigVersion {
    /// Pre-segwit scriptSig/scriptPubKey evaluation.
    Base,
    /// BIP143 witness v0 (P2WPKH, P2WSH).
    WitnessV0,
    /// Witness v1 script-path spend (the MAST variant this crate executes
    /// behind `VERIFY_MAST`). `VERIFY_MINIMALIF` is only enforced here.
    WitnessV1,
}

/// Read-only view of the spending transaction and the input currently
/// being verified, as required by `OP_CHECKSIG`, `OP_CHECKLOCKTIMEVERIFY`,
/// and `OP_CHECKSEQUENCEVERIFY`.
///
/// A production caller implements this over its own transaction type;
/// this crate never parses a transaction itself.
pub trait TxContext {
    /// nLockTime of the spending transaction.
    fn lock_time(&self) -> u32;

    /// nSequence of the input currently being verified.
    fn input_sequence(&self) -> u32;

    /// `true` once any input of the spending transaction has a sequence
    /// number other than `0xffffffff` (a precondition for nLockTime to be
    /// enforceable at all).
    fn lock_time_disabled(&self) -> bool;

    /// Computes the signature hash (preimage digest) for the input being
    /// verified, given the subscript (with `OP_CODESEPARATOR` history
    /// trimmed per sigversion rules) and sighash type byte.
    fn signature_hash(
        &self,
        subscript: &[u8],
        sighash_type: u8,
        sig_version: SigVersion,
        amount: u64,
    ) -> [u8; 32];

    /// Value in satoshis of the output being spent, needed for BIP143
    /// witness sighashing.
    fn amount(&self) -> u64;
}

/// Verifies a single ECDSA signature against a public key and message
/// digest. Implementations typically wrap `secp256k1`; this crate ships
/// one such implementation behind the `secp256k1` feature (see
/// [`crate::engine::Secp256k1Verifier`]).
pub trait SignatureVerifier {
    /// `sig` excludes the trailing sighash-type byte; `digest` is the
    /// 32-byte sighash already computed by [`TxContext::signature_hash`].
    /// `allow_high_s` is `false` when `VERIFY_LOW_S` requires the
    /// signature's S value not exceed half the curve order.
    fn verify_ecdsa(&self, sig: &[u8], pubkey: &[u8], digest: &[u8; 32], allow_high_s: bool) -> bool;
}

/// Bounded cache of `(signature, pubkey, digest) -> verified` results.
///
/// Re-verifying the same signature across mempool acceptance, block
/// connection, and reorg replay is pure waste once it has been checked
/// once; this is the one piece of shared, mutable state the interpreter
/// touches, so it is always explicit constructor-injected state rather
/// than a global.
pub struct SigCache {
    inner: Mutex<SigCacheInner>,
    capacity: usize,
}

struct SigCacheInner {
    map: HashMap<[u8; 32], bool>,
    order: std::collections::VecDeque<[u8; 32]>,
}

impl SigCache {
    pub fn new(capacity: usize) -> Self {
        SigCache {
            inner: Mutex::new(SigCacheInner {
                map: HashMap::new(),
                order: std::collections::VecDeque::new(),
            }),
            capacity,
        }
    }

    fn key(sig: &[u8], pubkey: &[u8], digest: &[u8; 32], allow_high_s: bool) -> [u8; 32] {
        use crate::hash::sha256;
        let mut buf = Vec::with_capacity(sig.len() + pubkey.len() + 32 + 1);
        buf.extend_from_slice(sig);
        buf.extend_from_slice(pubkey);
        buf.extend_from_slice(digest);
        buf.push(allow_high_s as u8);
        sha256(&buf)
    }

    /// Returns a cached verification result if present.
    pub fn get(&self, sig: &[u8], pubkey: &[u8], digest: &[u8; 32], allow_high_s: bool) -> Option<bool> {
        let key = Self::key(sig, pubkey, digest, allow_high_s);
        let inner = self.inner.lock().expect("sigcache mutex poisoned");
        inner.map.get(&key).copied()
    }

    /// Records a verification result, evicting the oldest entry (FIFO) if
    /// the cache is at capacity.
    pub fn insert(&self, sig: &[u8], pubkey: &[u8], digest: &[u8; 32], allow_high_s: bool, valid: bool) {
        let key = Self::key(sig, pubkey, digest, allow_high_s);
        let mut inner = self.inner.lock().expect("sigcache mutex poisoned");
        if !inner.map.contains_key(&key) {
            if inner.order.len() >= self.capacity {
                if let Some(oldest) = inner.order.pop_front() {
                    inner.map.remove(&oldest);
                }
            }
            inner.order.push_back(key);
        }
        inner.map.insert(key, valid);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("sigcache mutex poisoned").map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A verifier that checks via the cache first, delegating to `inner` and
/// populating the cache on a miss.
pub struct CachedVerifier<'a, V: SignatureVerifier> {
    pub inner: &'a V,
    pub cache: &'a SigCache,
}

impl<'a, V: SignatureVerifier> SignatureVerifier for CachedVerifier<'a, V> {
    fn verify_ecdsa(&self, sig: &[u8], pubkey: &[u8], digest: &[u8; 32], allow_high_s: bool) -> bool {
        if let Some(cached) = self.cache.get(sig, pubkey, digest, allow_high_s) {
            return cached;
        }
        let result = self.inner.verify_ecdsa(sig, pubkey, digest, allow_high_s);
        self.cache.insert(sig, pubkey, digest, allow_high_s, result);
        result
    }
}
