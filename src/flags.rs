//! Verification flags: the bitmask that gates which soft-fork script rules
//! are enforced for a given evaluation. Consensus itself only ever runs
//! with the full set active; subsets exist for policy/relay and for
//! replaying history before a given soft fork activated.

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct VerificationFlags: u32 {
        /// Evaluate P2SH subscripts (BIP16).
        const P2SH = 1 << 0;
        /// Passing a non-strict-DER signature to a checksig operation fails it.
        const STRICTENC = 1 << 1;
        /// Passing a non-strict-DER signature fails immediately (BIP66).
        const DERSIG = 1 << 2;
        /// Passing a high S-value signature fails it (BIP62 rule 5).
        const LOW_S = 1 << 3;
        /// The dummy CHECKMULTISIG stack item must be exactly empty (BIP62 rule 7).
        const NULLDUMMY = 1 << 4;
        /// scriptSig must consist solely of push operations (BIP62 rule 2).
        const SIGPUSHONLY = 1 << 5;
        /// Pushes must use the shortest possible encoding (BIP62 rule 3).
        const MINIMALDATA = 1 << 6;
        /// Unassigned NOP1/NOP4-NOP10 opcodes fail evaluation.
        const DISCOURAGE_UPGRADABLE_NOPS = 1 << 7;
        /// After evaluation the stack must contain exactly one element.
        const CLEANSTACK = 1 << 8;
        /// Evaluate OP_CHECKLOCKTIMEVERIFY (BIP65).
        const CHECKLOCKTIMEVERIFY = 1 << 9;
        /// Evaluate OP_CHECKSEQUENCEVERIFY (BIP112).
        const CHECKSEQUENCEVERIFY = 1 << 10;
        /// Evaluate segregated witness programs (BIP141/143/144/147).
        const WITNESS = 1 << 11;
        /// Unknown witness versions/program lengths fail evaluation.
        const DISCOURAGE_UPGRADABLE_WITNESS_PROGRAM = 1 << 12;
        /// OP_IF/OP_NOTIF arguments must be minimally encoded (`0x00`/`0x01`).
        /// Only enforced for witness v1 (MAST) execution.
        const MINIMALIF = 1 << 13;
        /// A failed CHECK(MULTI)SIG must have been passed an all-zero signature.
        const NULLFAIL = 1 << 14;
        /// Witness-program signature checks may only use compressed public
        /// keys; does not apply to legacy/Base scriptSig evaluation.
        const WITNESS_PUBKEYTYPE = 1 << 15;
        /// Evaluate witness v1 MAST script-path spends.
        const MAST = 1 << 16;
    }
}

impl VerificationFlags {
    /// The flag set full nodes enforce for relay/mempool policy today.
    pub fn standard() -> VerificationFlags {
        VerificationFlags::P2SH
            | VerificationFlags::STRICTENC
            | VerificationFlags::DERSIG
            | VerificationFlags::LOW_S
            | VerificationFlags::NULLDUMMY
            | VerificationFlags::SIGPUSHONLY
            | VerificationFlags::MINIMALDATA
            | VerificationFlags::DISCOURAGE_UPGRADABLE_NOPS
            | VerificationFlags::CLEANSTACK
            | VerificationFlags::CHECKLOCKTIMEVERIFY
            | VerificationFlags::CHECKSEQUENCEVERIFY
            | VerificationFlags::WITNESS
            | VerificationFlags::DISCOURAGE_UPGRADABLE_WITNESS_PROGRAM
            | VerificationFlags::MINIMALIF
            | VerificationFlags::NULLFAIL
            | VerificationFlags::WITNESS_PUBKEYTYPE
    }
}

impl Default for VerificationFlags {
    fn default() -> Self {
        VerificationFlags::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_includes_p2sh_and_witness() {
        let flags = VerificationFlags::standard();
        assert!(flags.contains(VerificationFlags::P2SH));
        assert!(flags.contains(VerificationFlags::WITNESS));
        assert!(!flags.contains(VerificationFlags::MAST));
    }

    #[test]
    fn empty_flags_enforce_nothing() {
        let flags = VerificationFlags::empty();
        assert!(!flags.contains(VerificationFlags::P2SH));
        assert!(!flags.contains(VerificationFlags::CLEANSTACK));
    }

    #[test]
    fn flags_compose_with_bitor() {
        let flags = VerificationFlags::P2SH | VerificationFlags::WITNESS;
        assert!(flags.contains(VerificationFlags::P2SH));
        assert!(flags.contains(VerificationFlags::WITNESS));
        assert!(!flags.contains(VerificationFlags::NULLFAIL));
    }

    #[test]
    fn default_is_empty() {
        assert_eq!(VerificationFlags::default(), VerificationFlags::empty());
    }
}
