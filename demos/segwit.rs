//! Demonstrates verifying a native P2WPKH (segregated witness) spend
//! through the full verify driver.
//!
//! Run with: `cargo run --example segwit`

use btc_consensus_core::engine::{StubTxContext, StubVerifier};
use btc_consensus_core::flags::VerificationFlags;
use btc_consensus_core::hash;
use btc_consensus_core::script::Script;
use btc_consensus_core::txcontext::SigVersion;
use btc_consensus_core::verify::verify_script;
use btc_consensus_core::engine::ExecContext;

fn main() {
    let fake_sig = vec![0x30u8; 71];
    let fake_pubkey = vec![0x02u8; 33];
    let pubkey_hash = hash::hash160(&fake_pubkey);

    // scriptPubKey: OP_0 <20-byte pubkey hash>
    let mut script_pubkey = vec![0x00, 0x14];
    script_pubkey.extend_from_slice(&pubkey_hash);

    // A witness-spent output carries an empty scriptSig; the signature and
    // pubkey instead ride in the witness stack.
    let witness = vec![fake_sig, fake_pubkey];

    let ctx = ExecContext {
        flags: VerificationFlags::P2SH | VerificationFlags::WITNESS | VerificationFlags::CLEANSTACK,
        tx: &StubTxContext,
        checker: &StubVerifier,
        sig_version: SigVersion::Base,
    };

    let result = verify_script(
        &Script::new(vec![]),
        &witness,
        &Script::new(script_pubkey),
        &ctx,
    );

    match result {
        Ok(()) => println!("P2WPKH witness program verified"),
        Err(e) => println!("verification failed: {e}"),
    }
}
