//! The script execution loop: the interpreter core that walks a token
//! sequence against a stack, enforcing every opcode's semantics and the
//! subset of soft-fork rules gated by [`VerificationFlags`].
//!
//! This module evaluates *one* script (scriptSig, scriptPubKey, a P2SH
//! redeem script, or a witness script) onto a stack; composing those
//! evaluations into the full input-verification sequence (P2SH, segwit,
//! CLEANSTACK) is [`crate::verify`]'s job.

use crate::error::ScriptError;
use crate::flags::VerificationFlags;
use crate::hash;
use crate::num::ScriptNum;
use crate::opcode::Opcode;
use crate::stack::{is_true, ConditionStack, Stack};
use crate::token::Token;
use crate::tokenizer::serialize_script;
use crate::txcontext::{SigVersion, SignatureVerifier, TxContext};

/// Maximum number of non-push opcodes (`opcode > OP_16`) a script may
/// execute, including ones that never run because they sit on a dead
/// conditional branch.
const MAX_OPS_PER_SCRIPT: u32 = 201;

const LOCKTIME_THRESHOLD: i64 = 500_000_000;
const SEQUENCE_LOCKTIME_DISABLE_FLAG: u32 = 1 << 31;
const SEQUENCE_LOCKTIME_TYPE_FLAG: u32 = 1 << 22;
const SEQUENCE_LOCKTIME_MASK: u32 = 0x0000ffff;

/// Everything the interpreter needs beyond the script and stack: which
/// soft-fork rules to enforce, and the transaction-shaped collaborators
/// that let `OP_CHECKSIG`/`OP_CHECKLOCKTIMEVERIFY`/`OP_CHECKSEQUENCEVERIFY`
/// do their job without this crate owning a transaction format.
pub struct ExecContext<'a> {
    pub flags: VerificationFlags,
    pub tx: &'a dyn TxContext,
    pub checker: &'a dyn SignatureVerifier,
    pub sig_version: SigVersion,
}

/// A [`TxContext`] for scripts with no real spending transaction attached
/// (unit tests, demos). `OP_CHECKLOCKTIMEVERIFY`/`OP_CHECKSEQUENCEVERIFY`
/// always succeed against it.
pub struct StubTxContext;

impl TxContext for StubTxContext {
    fn lock_time(&self) -> u32 {
        0
    }
    fn input_sequence(&self) -> u32 {
        0xffff_ffff
    }
    fn lock_time_disabled(&self) -> bool {
        true
    }
    fn signature_hash(
        &self,
        _subscript: &[u8],
        _sighash_type: u8,
        _sig_version: SigVersion,
        _amount: u64,
    ) -> [u8; 32] {
        [0u8; 32]
    }
    fn amount(&self) -> u64 {
        0
    }
}

/// A [`SignatureVerifier`] that accepts every signature. Used by [`execute`]
/// for quick smoke-testing of script logic that doesn't care about real
/// signatures.
pub struct StubVerifier;

impl SignatureVerifier for StubVerifier {
    fn verify_ecdsa(&self, _sig: &[u8], _pubkey: &[u8], _digest: &[u8; 32], _allow_high_s: bool) -> bool {
        true
    }
}

/// Real ECDSA verification via `secp256k1`, for callers that enable the
/// `secp256k1` feature and want the non-stub default.
#[cfg(feature = "secp256k1")]
pub struct Secp256k1Verifier;

#[cfg(feature = "secp256k1")]
impl SignatureVerifier for Secp256k1Verifier {
    fn verify_ecdsa(&self, sig: &[u8], pubkey: &[u8], digest: &[u8; 32], allow_high_s: bool) -> bool {
        use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1};

        let secp = Secp256k1::verification_only();
        let signature = match Signature::from_der(sig) {
            Ok(s) => s,
            Err(_) => return false,
        };
        if !allow_high_s {
            let mut normalized = signature;
            normalized.normalize_s();
            if normalized != signature {
                return false;
            }
        }
        let public_key = match PublicKey::from_slice(pubkey) {
            Ok(k) => k,
            Err(_) => return false,
        };
        let message = Message::from_digest(*digest);
        secp.verify_ecdsa(&message, &signature, &public_key).is_ok()
    }
}

/// Executes a token sequence against an empty stack using stub
/// transaction context and an always-true signature verifier, with no
/// soft-fork flags enforced. Convenient for exercising pure stack/
/// arithmetic/control-flow logic without standing up a `TxContext`.
pub fn execute(tokens: &[Token]) -> Result<bool, ScriptError> {
    let ctx = ExecContext {
        flags: VerificationFlags::empty(),
        tx: &StubTxContext,
        checker: &StubVerifier,
        sig_version: SigVersion::Base,
    };
    let mut stack = Stack::new();
    eval_script(tokens, &mut stack, &ctx)?;
    if stack.is_empty() {
        return Ok(false);
    }
    Ok(is_true(stack.pop()?.as_slice()))
}

/// Evaluates `tokens` against `stack` in place, enforcing `ctx.flags`.
///
/// Used directly for a single script, and by [`crate::verify`] to run
/// scriptSig and scriptPubKey back to back on the same stack.
pub fn eval_script(
    tokens: &[Token],
    stack: &mut Stack,
    ctx: &ExecContext,
) -> Result<(), ScriptError> {
    let mut conditions = ConditionStack::new();
    let mut op_count: u32 = 0;
    let mut last_sep: usize = 0;

    log::trace!("eval_script: {} tokens, flags={:?}", tokens.len(), ctx.flags);

    for (ip, token) in tokens.iter().enumerate() {
        // Disabled and unassigned opcodes fail unconditionally, even on a
        // dead conditional branch.
        if let Token::Op(opcode) = token {
            if opcode.is_disabled() {
                log::debug!("disabled opcode 0x{:02x} at ip={ip}", opcode.to_byte());
                return Err(ScriptError::DisabledOpcode(opcode.to_byte()));
            }
            if matches!(opcode, Opcode::OpVerIf | Opcode::OpVerNotIf) {
                return Err(ScriptError::BadOpcode(opcode.to_byte()));
            }
        }
        if let Token::Invalid(byte) = token {
            log::debug!("unassigned opcode byte 0x{byte:02x} at ip={ip}");
            return Err(ScriptError::BadOpcode(*byte));
        }

        if let Token::Op(opcode) = token {
            if opcode.to_byte() > Opcode::Op16.to_byte() {
                op_count += 1;
                if op_count > MAX_OPS_PER_SCRIPT {
                    return Err(ScriptError::OpCount);
                }
            }
        }

        let executing = conditions.all_true();

        match token {
            // ── Conditional flow control (always processed) ──────────
            Token::Op(Opcode::OpIf) | Token::Op(Opcode::OpNotIf) => {
                let mut branch_taken = false;
                if executing {
                    let val = stack.pop()?;
                    if ctx.flags.contains(VerificationFlags::MINIMALIF)
                        && ctx.sig_version == SigVersion::WitnessV1
                        && !(val.is_empty() || val == [0x01])
                    {
                        return Err(ScriptError::MinimalIf);
                    }
                    branch_taken = is_true(&val);
                    if matches!(token, Token::Op(Opcode::OpNotIf)) {
                        branch_taken = !branch_taken;
                    }
                }
                conditions.push(branch_taken);
            }
            Token::Op(Opcode::OpElse) => conditions.toggle_top()?,
            Token::Op(Opcode::OpEndIf) => conditions.pop()?,

            // ── Skip everything else when not executing ──────────────
            _ if !executing => continue,

            // ── PushData ─────────────────────────────────────────────
            Token::PushData { bytes, .. } => {
                if ctx.flags.contains(VerificationFlags::MINIMALDATA) && !token.is_minimal_push() {
                    return Err(ScriptError::MinimalData);
                }
                stack.push(bytes.clone())?;
            }

            // ── Constants ────────────────────────────────────────────
            Token::Op(Opcode::Op0) => stack.push(vec![])?,
            Token::Op(Opcode::Op1Negate) => stack.push(ScriptNum(-1).encode())?,
            Token::Op(op) if (Opcode::Op1.to_byte()..=Opcode::Op16.to_byte()).contains(&op.to_byte()) => {
                let n = (op.to_byte() - Opcode::Op1.to_byte() + 1) as i64;
                stack.push(ScriptNum(n).encode())?;
            }

            // ── Flow control ─────────────────────────────────────────
            Token::Op(Opcode::OpNop) => {}
            Token::Op(reserved @ Opcode::OpVer)
            | Token::Op(reserved @ Opcode::OpReserved)
            | Token::Op(reserved @ Opcode::OpReserved1)
            | Token::Op(reserved @ Opcode::OpReserved2) => {
                return Err(ScriptError::BadOpcode(reserved.to_byte()));
            }
            Token::Op(Opcode::OpVerify) => {
                let val = stack.pop()?;
                if !is_true(&val) {
                    return Err(ScriptError::Verify);
                }
            }
            Token::Op(Opcode::OpReturn) => {
                return Err(ScriptError::OpReturn);
            }

            // ── NOP expansion opcodes ─────────────────────────────────
            Token::Op(Opcode::OpNop1)
            | Token::Op(Opcode::OpNop4)
            | Token::Op(Opcode::OpNop5)
            | Token::Op(Opcode::OpNop6)
            | Token::Op(Opcode::OpNop7)
            | Token::Op(Opcode::OpNop8)
            | Token::Op(Opcode::OpNop9)
            | Token::Op(Opcode::OpNop10) => {
                if ctx.flags.contains(VerificationFlags::DISCOURAGE_UPGRADABLE_NOPS) {
                    return Err(ScriptError::DiscourageUpgradableNops);
                }
            }
            Token::Op(Opcode::OpCheckLockTimeVerify) => {
                exec_checklocktimeverify(stack, ctx)?;
            }
            Token::Op(Opcode::OpCheckSequenceVerify) => {
                exec_checksequenceverify(stack, ctx)?;
            }

            // ── Stack manipulation ───────────────────────────────────
            Token::Op(Opcode::OpToAltStack) => {
                stack.to_alt()?;
            }
            Token::Op(Opcode::OpFromAltStack) => {
                stack.from_alt()?;
            }
            Token::Op(Opcode::OpDup) => {
                let top = stack.peek()?.to_vec();
                stack.push(top)?;
            }
            Token::Op(Opcode::OpDrop) => {
                stack.pop()?;
            }
            Token::Op(Opcode::Op2Dup) => {
                let b = stack.peek_back(0)?.to_vec();
                let a = stack.peek_back(1)?.to_vec();
                stack.push(a)?;
                stack.push(b)?;
            }
            Token::Op(Opcode::Op3Dup) => {
                let c = stack.peek_back(0)?.to_vec();
                let b = stack.peek_back(1)?.to_vec();
                let a = stack.peek_back(2)?.to_vec();
                stack.push(a)?;
                stack.push(b)?;
                stack.push(c)?;
            }
            Token::Op(Opcode::Op2Over) => {
                let a1 = stack.peek_back(3)?.to_vec();
                let a2 = stack.peek_back(2)?.to_vec();
                stack.push(a1)?;
                stack.push(a2)?;
            }
            Token::Op(Opcode::Op2Rot) => {
                let f = stack.remove_back(5)?;
                let e = stack.remove_back(4)?;
                stack.push(f)?;
                stack.push(e)?;
            }
            Token::Op(Opcode::Op2Swap) => {
                stack.swap_back(3, 1)?;
                stack.swap_back(2, 0)?;
            }
            Token::Op(Opcode::Op2Drop) => {
                stack.pop()?;
                stack.pop()?;
            }
            Token::Op(Opcode::OpIfDup) => {
                let top = stack.peek()?.to_vec();
                if is_true(&top) {
                    stack.push(top)?;
                }
            }
            Token::Op(Opcode::OpDepth) => {
                let depth = stack.len() as i64;
                stack.push(ScriptNum(depth).encode())?;
            }
            Token::Op(Opcode::OpNip) => {
                if stack.len() < 2 {
                    return Err(ScriptError::InvalidStackOperation);
                }
                stack.remove(stack.len() - 2)?;
            }
            Token::Op(Opcode::OpOver) => {
                let val = stack.peek_back(1)?.to_vec();
                stack.push(val)?;
            }
            Token::Op(Opcode::OpPick) => {
                let n = pop_usize(stack, ctx)?;
                let val = stack.peek_back(n)?.to_vec();
                stack.push(val)?;
            }
            Token::Op(Opcode::OpRoll) => {
                let n = pop_usize(stack, ctx)?;
                let val = stack.remove_back(n)?;
                stack.push(val)?;
            }
            Token::Op(Opcode::OpRot) => {
                stack.swap_back(2, 1)?;
                stack.swap_back(1, 0)?;
            }
            Token::Op(Opcode::OpSwap) => {
                stack.swap_back(0, 1)?;
            }
            Token::Op(Opcode::OpTuck) => {
                let b = stack.pop()?;
                let a = stack.pop()?;
                stack.push(b.clone())?;
                stack.push(a)?;
                stack.push(b)?;
            }
            Token::Op(Opcode::OpSize) => {
                let size = stack.peek()?.len() as i64;
                stack.push(ScriptNum(size).encode())?;
            }

            // ── Comparison ───────────────────────────────────────────
            Token::Op(Opcode::OpEqual) => {
                let b = stack.pop()?;
                let a = stack.pop()?;
                stack.push_bool(a == b)?;
            }
            Token::Op(Opcode::OpEqualVerify) => {
                let b = stack.pop()?;
                let a = stack.pop()?;
                if a != b {
                    return Err(ScriptError::EqualVerify);
                }
            }

            // ── Arithmetic ───────────────────────────────────────────
            Token::Op(Opcode::Op1Add) => unary_num(stack, ctx, |n| n + 1)?,
            Token::Op(Opcode::Op1Sub) => unary_num(stack, ctx, |n| n - 1)?,
            Token::Op(Opcode::OpNegate) => unary_num(stack, ctx, |n| -n)?,
            Token::Op(Opcode::OpAbs) => unary_num(stack, ctx, |n| n.abs())?,
            Token::Op(Opcode::OpNot) => {
                let val = pop_num(stack, ctx)?;
                stack.push_bool(val.value() == 0)?;
            }
            Token::Op(Opcode::Op0NotEqual) => {
                let val = pop_num(stack, ctx)?;
                stack.push(ScriptNum((val.value() != 0) as i64).encode())?;
            }
            Token::Op(Opcode::OpAdd) => binary_num(stack, ctx, |a, b| a + b)?,
            Token::Op(Opcode::OpSub) => binary_num(stack, ctx, |a, b| a - b)?,
            Token::Op(Opcode::OpBoolAnd) => {
                let (a, b) = pop_num_pair(stack, ctx)?;
                stack.push_bool(a.value() != 0 && b.value() != 0)?;
            }
            Token::Op(Opcode::OpBoolOr) => {
                let (a, b) = pop_num_pair(stack, ctx)?;
                stack.push_bool(a.value() != 0 || b.value() != 0)?;
            }
            Token::Op(Opcode::OpNumEqual) => {
                let (a, b) = pop_num_pair(stack, ctx)?;
                stack.push_bool(a.value() == b.value())?;
            }
            Token::Op(Opcode::OpNumEqualVerify) => {
                let (a, b) = pop_num_pair(stack, ctx)?;
                if a.value() != b.value() {
                    return Err(ScriptError::NumEqualVerify);
                }
            }
            Token::Op(Opcode::OpNumNotEqual) => {
                let (a, b) = pop_num_pair(stack, ctx)?;
                stack.push_bool(a.value() != b.value())?;
            }
            Token::Op(Opcode::OpLessThan) => {
                let (a, b) = pop_num_pair(stack, ctx)?;
                stack.push_bool(a.value() < b.value())?;
            }
            Token::Op(Opcode::OpGreaterThan) => {
                let (a, b) = pop_num_pair(stack, ctx)?;
                stack.push_bool(a.value() > b.value())?;
            }
            Token::Op(Opcode::OpLessThanOrEqual) => {
                let (a, b) = pop_num_pair(stack, ctx)?;
                stack.push_bool(a.value() <= b.value())?;
            }
            Token::Op(Opcode::OpGreaterThanOrEqual) => {
                let (a, b) = pop_num_pair(stack, ctx)?;
                stack.push_bool(a.value() >= b.value())?;
            }
            Token::Op(Opcode::OpMin) => {
                let (a, b) = pop_num_pair(stack, ctx)?;
                stack.push(ScriptNum(a.value().min(b.value())).encode())?;
            }
            Token::Op(Opcode::OpMax) => {
                let (a, b) = pop_num_pair(stack, ctx)?;
                stack.push(ScriptNum(a.value().max(b.value())).encode())?;
            }
            Token::Op(Opcode::OpWithin) => {
                let max = pop_num(stack, ctx)?;
                let min = pop_num(stack, ctx)?;
                let x = pop_num(stack, ctx)?;
                stack.push_bool(x.value() >= min.value() && x.value() < max.value())?;
            }

            // ── Crypto ───────────────────────────────────────────────
            Token::Op(Opcode::OpRipemd160) => {
                let data = stack.pop()?;
                stack.push(hash::ripemd160(&data).to_vec())?;
            }
            Token::Op(Opcode::OpSha1) => {
                let data = stack.pop()?;
                stack.push(hash::sha1(&data).to_vec())?;
            }
            Token::Op(Opcode::OpSha256) => {
                let data = stack.pop()?;
                stack.push(hash::sha256(&data).to_vec())?;
            }
            Token::Op(Opcode::OpHash160) => {
                let data = stack.pop()?;
                stack.push(hash::hash160(&data).to_vec())?;
            }
            Token::Op(Opcode::OpHash256) => {
                let data = stack.pop()?;
                stack.push(hash::hash256(&data).to_vec())?;
            }
            Token::Op(Opcode::OpCodeSeparator) => {
                last_sep = ip + 1;
            }
            Token::Op(Opcode::OpCheckSig) => {
                let result = exec_checksig(stack, tokens, last_sep, ctx)?;
                stack.push_bool(result)?;
            }
            Token::Op(Opcode::OpCheckSigVerify) => {
                let result = exec_checksig(stack, tokens, last_sep, ctx)?;
                if !result {
                    return Err(ScriptError::CheckSigVerify);
                }
            }
            Token::Op(Opcode::OpCheckMultisig) => {
                let result = exec_checkmultisig(stack, tokens, last_sep, ctx, &mut op_count)?;
                stack.push_bool(result)?;
            }
            Token::Op(Opcode::OpCheckMultisigVerify) => {
                let result = exec_checkmultisig(stack, tokens, last_sep, ctx, &mut op_count)?;
                if !result {
                    return Err(ScriptError::CheckMultisigVerify);
                }
            }

            Token::Invalid(byte) => return Err(ScriptError::BadOpcode(*byte)),
            Token::Op(opcode) => return Err(ScriptError::BadOpcode(opcode.to_byte())),
        }

        if op_count > MAX_OPS_PER_SCRIPT {
            return Err(ScriptError::OpCount);
        }
    }

    if !conditions.empty() {
        return Err(ScriptError::UnbalancedConditional);
    }

    Ok(())
}

// ── Arithmetic helpers ────────────────────────────────────────────────

fn pop_num(stack: &mut Stack, ctx: &ExecContext) -> Result<ScriptNum, ScriptError> {
    let bytes = stack.pop()?;
    ScriptNum::decode(&bytes, 4, ctx.flags.contains(VerificationFlags::MINIMALDATA))
}

fn pop_num_pair(stack: &mut Stack, ctx: &ExecContext) -> Result<(ScriptNum, ScriptNum), ScriptError> {
    let b = pop_num(stack, ctx)?;
    let a = pop_num(stack, ctx)?;
    Ok((a, b))
}

fn pop_usize(stack: &mut Stack, ctx: &ExecContext) -> Result<usize, ScriptError> {
    let n = pop_num(stack, ctx)?.value();
    if n < 0 {
        return Err(ScriptError::InvalidStackOperation);
    }
    Ok(n as usize)
}

fn unary_num(
    stack: &mut Stack,
    ctx: &ExecContext,
    f: impl FnOnce(i64) -> i64,
) -> Result<(), ScriptError> {
    let val = pop_num(stack, ctx)?;
    stack.push(ScriptNum(f(val.value())).encode())?;
    Ok(())
}

fn binary_num(
    stack: &mut Stack,
    ctx: &ExecContext,
    f: impl FnOnce(i64, i64) -> i64,
) -> Result<(), ScriptError> {
    let (a, b) = pop_num_pair(stack, ctx)?;
    stack.push(ScriptNum(f(a.value(), b.value())).encode())?;
    Ok(())
}

// ── CLTV / CSV ─────────────────────────────────────────────────────────

fn exec_checklocktimeverify(stack: &mut Stack, ctx: &ExecContext) -> Result<(), ScriptError> {
    if !ctx.flags.contains(VerificationFlags::CHECKLOCKTIMEVERIFY) {
        if ctx.flags.contains(VerificationFlags::DISCOURAGE_UPGRADABLE_NOPS) {
            return Err(ScriptError::DiscourageUpgradableNops);
        }
        return Ok(());
    }
    let top = stack.peek()?;
    let locktime = ScriptNum::decode(top, 5, ctx.flags.contains(VerificationFlags::MINIMALDATA))?.value();
    if locktime < 0 {
        return Err(ScriptError::NegativeLocktime);
    }
    let tx_locktime = ctx.tx.lock_time() as i64;
    let same_kind = (locktime < LOCKTIME_THRESHOLD) == (tx_locktime < LOCKTIME_THRESHOLD);
    if !same_kind || locktime > tx_locktime {
        return Err(ScriptError::UnsatisfiedLocktime);
    }
    if ctx.tx.lock_time_disabled() {
        return Err(ScriptError::UnsatisfiedLocktime);
    }
    Ok(())
}

fn exec_checksequenceverify(stack: &mut Stack, ctx: &ExecContext) -> Result<(), ScriptError> {
    if !ctx.flags.contains(VerificationFlags::CHECKSEQUENCEVERIFY) {
        if ctx.flags.contains(VerificationFlags::DISCOURAGE_UPGRADABLE_NOPS) {
            return Err(ScriptError::DiscourageUpgradableNops);
        }
        return Ok(());
    }
    let top = stack.peek()?;
    let sequence = ScriptNum::decode(top, 5, ctx.flags.contains(VerificationFlags::MINIMALDATA))?.value();
    if sequence < 0 {
        return Err(ScriptError::NegativeLocktime);
    }
    if sequence as u32 & SEQUENCE_LOCKTIME_DISABLE_FLAG != 0 {
        return Ok(());
    }
    let tx_sequence = ctx.tx.input_sequence();
    if tx_sequence & SEQUENCE_LOCKTIME_DISABLE_FLAG != 0 {
        return Err(ScriptError::UnsatisfiedLocktime);
    }
    let seq = sequence as u32;
    let same_kind = (seq & SEQUENCE_LOCKTIME_TYPE_FLAG) == (tx_sequence & SEQUENCE_LOCKTIME_TYPE_FLAG);
    if !same_kind || (seq & SEQUENCE_LOCKTIME_MASK) > (tx_sequence & SEQUENCE_LOCKTIME_MASK) {
        return Err(ScriptError::UnsatisfiedLocktime);
    }
    Ok(())
}

// ── Signature checking ──────────────────────────────────────────────────

/// Strips every occurrence of `to_remove` (encoded as a script push) from
/// `script`. Only meaningful for the legacy sigversion: segwit scripts
/// never apply FindAndDelete.
fn find_and_delete(script: &[u8], to_remove: &[u8]) -> Vec<u8> {
    if to_remove.is_empty() || to_remove.len() > script.len() {
        return script.to_vec();
    }
    let needle_push = {
        let mut v = vec![to_remove.len() as u8];
        v.extend_from_slice(to_remove);
        v
    };
    let mut out = Vec::with_capacity(script.len());
    let mut i = 0;
    while i < script.len() {
        if script[i..].starts_with(&needle_push) {
            i += needle_push.len();
        } else {
            out.push(script[i]);
            i += 1;
        }
    }
    out
}

fn subscript(tokens: &[Token], last_sep: usize, sig_version: SigVersion, sig: &[u8]) -> Vec<u8> {
    let raw = serialize_script(&tokens[last_sep.min(tokens.len())..]);
    match sig_version {
        SigVersion::Base => find_and_delete(&raw, sig),
        SigVersion::WitnessV0 | SigVersion::WitnessV1 => raw,
    }
}

fn check_sighash_type(sighash_type: u8, flags: VerificationFlags) -> Result<(), ScriptError> {
    if !flags.contains(VerificationFlags::STRICTENC) {
        return Ok(());
    }
    let base = sighash_type & !0x80;
    if !(1..=3).contains(&base) {
        return Err(ScriptError::SigHashType);
    }
    Ok(())
}

/// Half the secp256k1 curve order, as a 32-byte big-endian integer. A
/// canonical (low-S) signature's S value must not exceed this.
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

/// Extracts the DER signature's S value (big-endian, sign byte stripped)
/// as a fixed 32-byte buffer, left-padded with zeroes. Returns `None` if
/// the DER framing doesn't parse as a plain two-integer ECDSA signature.
fn der_s_value(sig: &[u8]) -> Option<[u8; 32]> {
    // 0x30 len 0x02 rlen R... 0x02 slen S...
    if sig.len() < 6 || sig[0] != 0x30 || sig[2] != 0x02 {
        return None;
    }
    let rlen = *sig.get(3)? as usize;
    let s_tag_pos = 4 + rlen;
    if sig.get(s_tag_pos).copied()? != 0x02 {
        return None;
    }
    let slen = *sig.get(s_tag_pos + 1)? as usize;
    let s_start = s_tag_pos + 2;
    let s_bytes = sig.get(s_start..s_start + slen)?;
    let trimmed = {
        let mut t = s_bytes;
        while t.len() > 1 && t[0] == 0 {
            t = &t[1..];
        }
        t
    };
    if trimmed.len() > 32 {
        return None;
    }
    let mut out = [0u8; 32];
    out[32 - trimmed.len()..].copy_from_slice(trimmed);
    Some(out)
}

fn check_der_signature(sig: &[u8], flags: VerificationFlags) -> Result<(), ScriptError> {
    if !(flags.contains(VerificationFlags::DERSIG)
        || flags.contains(VerificationFlags::LOW_S)
        || flags.contains(VerificationFlags::STRICTENC))
    {
        return Ok(());
    }
    if sig.len() < 9 || sig.len() > 73 || sig[0] != 0x30 {
        return Err(ScriptError::SigDer);
    }
    if flags.contains(VerificationFlags::LOW_S) {
        if let Some(s) = der_s_value(sig) {
            if s > SECP256K1_HALF_ORDER {
                return Err(ScriptError::SigHighS);
            }
        }
    }
    Ok(())
}

fn check_pubkey_type(
    pubkey: &[u8],
    flags: VerificationFlags,
    sig_version: SigVersion,
) -> Result<(), ScriptError> {
    let compressed = pubkey.len() == 33 && (pubkey[0] == 0x02 || pubkey[0] == 0x03);
    let uncompressed = pubkey.len() == 65 && pubkey[0] == 0x04;
    // WITNESS_PUBKEYTYPE only constrains witness-program signature checks;
    // legacy/Base scripts may still use uncompressed keys.
    if flags.contains(VerificationFlags::WITNESS_PUBKEYTYPE)
        && sig_version != SigVersion::Base
        && !compressed
    {
        return Err(ScriptError::WitnessPubkeyType);
    }
    if flags.contains(VerificationFlags::STRICTENC) && !compressed && !uncompressed {
        return Err(ScriptError::PubkeyType);
    }
    Ok(())
}

fn exec_checksig(
    stack: &mut Stack,
    tokens: &[Token],
    last_sep: usize,
    ctx: &ExecContext,
) -> Result<bool, ScriptError> {
    let pubkey = stack.pop()?;
    let sig = stack.pop()?;
    let result = raw_checksig(&sig, &pubkey, tokens, last_sep, ctx)?;
    if !result && ctx.flags.contains(VerificationFlags::NULLFAIL) && !sig.is_empty() {
        return Err(ScriptError::NullFail);
    }
    Ok(result)
}

fn raw_checksig(
    sig: &[u8],
    pubkey: &[u8],
    tokens: &[Token],
    last_sep: usize,
    ctx: &ExecContext,
) -> Result<bool, ScriptError> {
    check_pubkey_type(pubkey, ctx.flags, ctx.sig_version)?;
    if sig.is_empty() {
        return Ok(false);
    }
    let sighash_type = sig[sig.len() - 1];
    let der = &sig[..sig.len() - 1];
    check_sighash_type(sighash_type, ctx.flags)?;
    check_der_signature(der, ctx.flags)?;

    let sub = subscript(tokens, last_sep, ctx.sig_version, sig);
    let digest = ctx
        .tx
        .signature_hash(&sub, sighash_type, ctx.sig_version, ctx.tx.amount());
    let allow_high_s = !ctx.flags.contains(VerificationFlags::LOW_S);
    Ok(ctx.checker.verify_ecdsa(der, pubkey, &digest, allow_high_s))
}

fn exec_checkmultisig(
    stack: &mut Stack,
    tokens: &[Token],
    last_sep: usize,
    ctx: &ExecContext,
    op_count: &mut u32,
) -> Result<bool, ScriptError> {
    let pubkey_count = pop_usize(stack, ctx)?;
    if pubkey_count > 20 {
        return Err(ScriptError::PubkeyCount);
    }
    *op_count += pubkey_count as u32;
    if *op_count > MAX_OPS_PER_SCRIPT {
        return Err(ScriptError::OpCount);
    }
    let mut pubkeys = Vec::with_capacity(pubkey_count);
    for _ in 0..pubkey_count {
        pubkeys.push(stack.pop()?);
    }

    let sig_count = pop_usize(stack, ctx)?;
    if sig_count > pubkey_count {
        return Err(ScriptError::SigCount);
    }
    let mut sigs = Vec::with_capacity(sig_count);
    for _ in 0..sig_count {
        sigs.push(stack.pop()?);
    }

    // Dummy element consumed for the off-by-one in the original design.
    let dummy = stack.pop()?;
    if ctx.flags.contains(VerificationFlags::NULLDUMMY) && !dummy.is_empty() {
        return Err(ScriptError::SigNullDummy);
    }

    let mut pubkey_idx = 0;
    let mut sig_idx = 0;
    let mut success = true;
    while success && sig_idx < sigs.len() {
        let sig = &sigs[sig_idx];
        let pubkey = &pubkeys[pubkey_idx];
        let matched = if sig.is_empty() {
            false
        } else {
            raw_checksig(sig, pubkey, tokens, last_sep, ctx)?
        };
        if matched {
            sig_idx += 1;
        }
        pubkey_idx += 1;
        if sigs.len() - sig_idx > pubkeys.len() - pubkey_idx {
            success = false;
        }
    }
    success = success && sig_idx == sigs.len();

    if !success && ctx.flags.contains(VerificationFlags::NULLFAIL) {
        for sig in &sigs {
            if !sig.is_empty() {
                return Err(ScriptError::NullFail);
            }
        }
    }

    Ok(success)
}
