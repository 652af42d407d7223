//! The verify driver: composes scriptSig/scriptPubKey execution with the
//! P2SH (BIP16) and segregated-witness (BIP141) extensions, under a given
//! [`VerificationFlags`] set.
//!
//! This generalizes the teacher's original two-phase P2PKH-only validator
//! ([`crate::script::validate_p2pkh`]) into the full composition spec
//! describes: SIGPUSHONLY, P2SH redemption, witness-program verification,
//! and CLEANSTACK.

use crate::engine::{eval_script, ExecContext};
use crate::error::ScriptError;
use crate::flags::VerificationFlags;
use crate::script::Script;
use crate::stack::{is_true, Stack};
use crate::token::Token;
use crate::tokenizer::parse_script;
use crate::witness::{verify_witness_program, WitnessItem};

/// Verifies that `input_script` (scriptSig) authorizes spending an output
/// locked by `output_script` (scriptPubKey), given the witness stack
/// supplied with the input and the soft-fork rules active in `ctx.flags`.
pub fn verify_script(
    input_script: &Script,
    witness: &[WitnessItem],
    output_script: &Script,
    ctx: &ExecContext,
) -> Result<(), ScriptError> {
    if input_script.len() > crate::script::MAX_SCRIPT_SIZE
        || output_script.len() > crate::script::MAX_SCRIPT_SIZE
    {
        return Err(ScriptError::ScriptSize);
    }

    let input_tokens = input_script.tokens()?;

    if ctx.flags.contains(VerificationFlags::SIGPUSHONLY)
        && !input_tokens.iter().all(Token::is_push_only)
    {
        return Err(ScriptError::SigPushOnly);
    }

    let mut stack = Stack::new();
    eval_script(&input_tokens, &mut stack, ctx)?;

    let pre_output_snapshot = if ctx.flags.contains(VerificationFlags::P2SH) {
        Some(stack.snapshot())
    } else {
        None
    };

    let output_tokens = output_script.tokens()?;
    eval_script(&output_tokens, &mut stack, ctx)?;

    if stack.is_empty() || !is_true(stack.peek()?) {
        return Err(ScriptError::EvalFalse);
    }

    let mut witness_verified = false;

    if ctx.flags.contains(VerificationFlags::WITNESS) {
        if let Some((version, program)) = output_script.witness_program() {
            witness_verified = true;
            if !input_script.is_empty() {
                return Err(ScriptError::WitnessMalleated);
            }
            verify_witness_program(version, &program, witness, ctx)?;
            stack.truncate_keep_top(1);
        }
    }

    if ctx.flags.contains(VerificationFlags::P2SH) && output_script.is_p2sh() {
        let mut redeem_stack_items = pre_output_snapshot.expect("P2SH flag implies a snapshot");
        let redeem_bytes = redeem_stack_items
            .pop()
            .ok_or(ScriptError::InvalidStackOperation)?;
        let mut redeem_stack = Stack::from_items(redeem_stack_items);

        let redeem_tokens = parse_script(&redeem_bytes)?;
        eval_script(&redeem_tokens, &mut redeem_stack, ctx)?;
        if redeem_stack.is_empty() || !is_true(redeem_stack.peek()?) {
            return Err(ScriptError::EvalFalse);
        }

        if ctx.flags.contains(VerificationFlags::WITNESS) {
            if let Some((version, program)) = Script::new(redeem_bytes.clone()).witness_program() {
                witness_verified = true;
                let is_single_push_of_redeem = matches!(
                    input_tokens.as_slice(),
                    [Token::PushData { bytes, .. }] if bytes == &redeem_bytes
                );
                if !is_single_push_of_redeem {
                    return Err(ScriptError::WitnessMalleatedP2sh);
                }
                verify_witness_program(version, &program, witness, ctx)?;
                redeem_stack.truncate_keep_top(1);
            }
        }

        stack = redeem_stack;
    }

    if !witness_verified
        && ctx.flags.contains(VerificationFlags::WITNESS)
        && !witness.is_empty()
    {
        return Err(ScriptError::WitnessUnexpected);
    }

    if ctx.flags.contains(VerificationFlags::CLEANSTACK) && stack.len() != 1 {
        return Err(ScriptError::CleanStack);
    }

    Ok(())
}
