//! Segregated-witness program verification (BIP141/143/144) and the v1
//! MAST (Merkle-Authenticated Script Tree) script-path spend.
//!
//! A witness program is the two-to-forty-byte payload carried by a
//! scriptPubKey of shape `OP_n <program>`; this module decides, given the
//! witness stack supplied with the spending input, whether that program is
//! satisfied.

use crate::engine::{eval_script, ExecContext};
use crate::error::ScriptError;
use crate::flags::VerificationFlags;
use crate::hash;
use crate::stack::{is_true, Stack, MAX_SCRIPT_ELEMENT_SIZE};
use crate::tokenizer::parse_script;
use crate::txcontext::SigVersion;

/// A single witness stack item, as carried in a transaction input's
/// witness field.
pub type WitnessItem = Vec<u8>;

/// Verifies a witness program per BIP141/143 (v0) or the MAST script-path
/// spend (v1, under `VERIFY_MAST`).
///
/// `program` is the data following the version push in the scriptPubKey
/// (or P2SH redeem script). `witness` is the input's witness stack,
/// ordered bottom-to-top as supplied on the wire.
pub fn verify_witness_program(
    version: u8,
    program: &[u8],
    witness: &[WitnessItem],
    ctx: &ExecContext,
) -> Result<(), ScriptError> {
    for item in witness {
        if item.len() > MAX_SCRIPT_ELEMENT_SIZE {
            return Err(ScriptError::PushSize);
        }
    }

    match version {
        0 => verify_v0(program, witness, ctx),
        1 => verify_v1(program, witness, ctx),
        _ => {
            if ctx
                .flags
                .contains(VerificationFlags::DISCOURAGE_UPGRADABLE_WITNESS_PROGRAM)
            {
                Err(ScriptError::DiscourageUpgradableWitnessProgram)
            } else {
                Ok(())
            }
        }
    }
}

fn verify_v0(
    program: &[u8],
    witness: &[WitnessItem],
    ctx: &ExecContext,
) -> Result<(), ScriptError> {
    let (script_bytes, mut stack) = match program.len() {
        32 => {
            // P2WSH: last witness item is the script; its SHA-256 must
            // equal the program, and the remaining items seed the stack.
            let (script, rest) = witness
                .split_last()
                .ok_or(ScriptError::WitnessProgramWitnessEmpty)?;
            if hash::sha256(script) != program[..] {
                return Err(ScriptError::WitnessProgramMismatch);
            }
            let mut stack = Stack::new();
            for item in rest {
                stack.push(item.clone())?;
            }
            (script.clone(), stack)
        }
        20 => {
            // P2WPKH: witness must be exactly [signature, pubkey];
            // synthesize the equivalent P2PKH scriptPubKey.
            if witness.len() != 2 {
                return Err(ScriptError::WitnessProgramMismatch);
            }
            let mut script = Vec::with_capacity(25);
            script.push(0x76); // OP_DUP
            script.push(0xa9); // OP_HASH160
            script.push(0x14);
            script.extend_from_slice(program);
            script.push(0x88); // OP_EQUALVERIFY
            script.push(0xac); // OP_CHECKSIG
            let mut stack = Stack::new();
            stack.push(witness[0].clone())?;
            stack.push(witness[1].clone())?;
            (script, stack)
        }
        _ => return Err(ScriptError::WitnessProgramWrongLength),
    };

    let witness_ctx = ExecContext {
        flags: ctx.flags,
        tx: ctx.tx,
        checker: ctx.checker,
        sig_version: SigVersion::WitnessV0,
    };
    let tokens = parse_script(&script_bytes)?;
    eval_script(&tokens, &mut stack, &witness_ctx)?;

    if stack.len() != 1 {
        return Err(ScriptError::EvalFalse);
    }
    if !is_true(stack.pop()?.as_slice()) {
        return Err(ScriptError::EvalFalse);
    }
    Ok(())
}

/// Decodes a single unsigned varint-ish index field used in the MAST
/// witness metadata: one byte if it fits, else refuses anything larger
/// than this crate's toy encoding understands.
fn mast_small_index(byte: u8) -> usize {
    byte as usize
}

fn verify_v1(
    program: &[u8],
    witness: &[WitnessItem],
    ctx: &ExecContext,
) -> Result<(), ScriptError> {
    if !ctx.flags.contains(VerificationFlags::MAST) {
        return if ctx
            .flags
            .contains(VerificationFlags::DISCOURAGE_UPGRADABLE_WITNESS_PROGRAM)
        {
            Err(ScriptError::DiscourageUpgradableWitnessProgram)
        } else {
            Ok(())
        };
    }
    if program.len() != 32 {
        return Err(ScriptError::WitnessProgramWrongLength);
    }

    // Witness layout: [metadata, posdata, subscript_0, ..., subscript_k, path...]
    // metadata[0] is the subscript count, metadata[1] the leaf position;
    // posdata carries the sibling-hash direction bits; everything after
    // the subscripts is the Merkle branch up to the committed root.
    if witness.len() < 2 {
        return Err(ScriptError::WitnessProgramWitnessEmpty);
    }
    let metadata = &witness[0];
    let posdata = &witness[1];
    let script_count = metadata.first().copied().unwrap_or(1).max(1) as usize;
    if witness.len() < 2 + script_count {
        return Err(ScriptError::WitnessProgramWitnessEmpty);
    }
    let scripts = &witness[2..2 + script_count];
    let path = &witness[2 + script_count..];
    let leaf_pos = metadata.get(1).copied().map(mast_small_index).unwrap_or(0);

    let mut concatenated = Vec::new();
    for s in scripts {
        concatenated.extend_from_slice(s);
    }
    let mut node = hash::sha256(&concatenated);

    // Walk the branch: at each level, combine with the sibling indicated
    // by posdata's corresponding bit, ordering left/right correctly so the
    // final hash matches `program` only if the subscripts are authentic
    // members of the committed tree. The loop index that selects each
    // sibling byte is `j`, matching the position actually being folded —
    // not the unrelated leaf index `leaf_pos`.
    let mut pos = leaf_pos;
    for (j, sibling) in path.iter().enumerate() {
        let bit = (posdata.first().copied().unwrap_or(0) >> (j % 8)) & 1;
        let mut buf = Vec::with_capacity(64);
        if bit == 0 {
            buf.extend_from_slice(&node);
            buf.extend_from_slice(sibling);
        } else {
            buf.extend_from_slice(sibling);
            buf.extend_from_slice(&node);
        }
        node = hash::sha256(&buf);
        pos /= 2;
    }
    let _ = pos;

    if node[..] != program[..] {
        return Err(ScriptError::WitnessProgramMismatch);
    }

    let mut stack = Stack::new();
    let witness_ctx = ExecContext {
        flags: ctx.flags,
        tx: ctx.tx,
        checker: ctx.checker,
        sig_version: SigVersion::WitnessV1,
    };
    let tokens = parse_script(&concatenated)?;
    eval_script(&tokens, &mut stack, &witness_ctx)?;
    if stack.len() != 1 || !is_true(stack.pop()?.as_slice()) {
        return Err(ScriptError::EvalFalse);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{StubTxContext, StubVerifier};

    fn stub_ctx(flags: VerificationFlags) -> ExecContext<'static> {
        ExecContext {
            flags,
            tx: &StubTxContext,
            checker: &StubVerifier,
            sig_version: SigVersion::Base,
        }
    }

    #[test]
    fn p2wpkh_happy_path() {
        let program = [0xaa; 20];
        let witness = vec![vec![0x01], vec![0x02]];
        let ctx = stub_ctx(VerificationFlags::WITNESS);
        verify_witness_program(0, &program, &witness, &ctx).unwrap();
    }

    #[test]
    fn p2wpkh_wrong_witness_count() {
        let program = [0xaa; 20];
        let witness = vec![vec![0x01]];
        let ctx = stub_ctx(VerificationFlags::WITNESS);
        let err = verify_witness_program(0, &program, &witness, &ctx).unwrap_err();
        assert_eq!(err, ScriptError::WitnessProgramMismatch);
    }

    #[test]
    fn p2wsh_happy_path() {
        let script = vec![0x51]; // OP_1
        let program = hash::sha256(&script);
        let witness = vec![script];
        let ctx = stub_ctx(VerificationFlags::WITNESS);
        verify_witness_program(0, &program, &witness, &ctx).unwrap();
    }

    #[test]
    fn p2wsh_script_hash_mismatch() {
        let script = vec![0x51];
        let program = [0u8; 32];
        let witness = vec![script];
        let ctx = stub_ctx(VerificationFlags::WITNESS);
        let err = verify_witness_program(0, &program, &witness, &ctx).unwrap_err();
        assert_eq!(err, ScriptError::WitnessProgramMismatch);
    }

    #[test]
    fn unknown_version_permissive_without_discourage_flag() {
        let ctx = stub_ctx(VerificationFlags::WITNESS);
        verify_witness_program(5, &[0u8; 4], &[], &ctx).unwrap();
    }

    #[test]
    fn unknown_version_fails_with_discourage_flag() {
        let ctx = stub_ctx(
            VerificationFlags::WITNESS | VerificationFlags::DISCOURAGE_UPGRADABLE_WITNESS_PROGRAM,
        );
        let err = verify_witness_program(5, &[0u8; 4], &[], &ctx).unwrap_err();
        assert_eq!(err, ScriptError::DiscourageUpgradableWitnessProgram);
    }

    #[test]
    fn v1_without_mast_flag_is_permissive() {
        let ctx = stub_ctx(VerificationFlags::WITNESS);
        verify_witness_program(1, &[0u8; 32], &[], &ctx).unwrap();
    }

    #[test]
    fn v1_mast_single_leaf_matches_root() {
        let script = vec![0x51];
        let root = hash::sha256(&script);
        // [metadata (1 script, leaf 0), posdata, script]
        let witness = vec![vec![1u8, 0u8], vec![0u8], script];
        let ctx = stub_ctx(VerificationFlags::WITNESS | VerificationFlags::MAST);
        verify_witness_program(1, &root, &witness, &ctx).unwrap();
    }
}
