use crate::opcode::Opcode;

/// Which push-data instruction produced a [`Token::PushData`], used by
/// [`Token::is_minimal_push`] to decide whether a smaller encoding of the
/// same bytes existed (the `MINIMALDATA` rule).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushEncoding {
    /// Direct push: the opcode byte itself (1-75) is the data length.
    Direct,
    PushData1,
    PushData2,
    PushData4,
}

/// A parsed script element — an opcode instruction, pushed data, or an
/// unrecognized opcode byte.
///
/// This is the output of the tokenizer and the input to the execution engine.
/// `PushData` carries the raw bytes from any of the four push-data encodings
/// plus which encoding was used, needed to check `MINIMALDATA` compliance.
/// `Invalid` is kept as a token rather than a parse-time error: consensus
/// treats an unassigned opcode byte as always-failing, even when it sits on
/// a dead conditional branch, so the engine — not the tokenizer — is the
/// place that rejects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Data pushed onto the stack by a push-data instruction.
    PushData {
        bytes: Vec<u8>,
        encoding: PushEncoding,
    },

    /// An opcode instruction (any non-push operation).
    Op(Opcode),

    /// A byte with no assigned opcode meaning.
    Invalid(u8),
}

impl Token {
    /// Convenience constructor for tests and callers that don't care about
    /// minimal-push classification.
    pub fn push_data(bytes: Vec<u8>) -> Token {
        let encoding = if bytes.len() <= 75 {
            PushEncoding::Direct
        } else if bytes.len() <= 0xff {
            PushEncoding::PushData1
        } else if bytes.len() <= 0xffff {
            PushEncoding::PushData2
        } else {
            PushEncoding::PushData4
        };
        Token::PushData { bytes, encoding }
    }

    /// `true` for tokens allowed in a push-only script (`SIGPUSHONLY`):
    /// any push-data instruction, plus the constant opcodes at or below
    /// `OP_16` (`OP_0`, `OP_1NEGATE`, `OP_RESERVED`, `OP_1`..`OP_16`).
    /// Anything else — including `Invalid` bytes — is not push-only.
    pub fn is_push_only(&self) -> bool {
        match self {
            Token::PushData { .. } => true,
            Token::Op(op) => op.to_byte() <= Opcode::Op16.to_byte(),
            Token::Invalid(_) => false,
        }
    }

    /// `true` if this token is a push using the smallest encoding capable
    /// of representing its data (the `MINIMALDATA` rule). Non-push tokens
    /// are trivially minimal.
    pub fn is_minimal_push(&self) -> bool {
        let (bytes, encoding) = match self {
            Token::PushData { bytes, encoding } => (bytes, encoding),
            _ => return true,
        };
        let len = bytes.len();
        if len == 1 {
            let b = bytes[0];
            if b == 0x81 || (1..=16).contains(&b) {
                // -1 and 1..16 should use OP_1NEGATE / OP_1..OP_16 instead.
                return false;
            }
        }
        match encoding {
            PushEncoding::Direct => true,
            PushEncoding::PushData1 => len > 75,
            PushEncoding::PushData2 => len > 0xff,
            PushEncoding::PushData4 => len > 0xffff,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::PushData { bytes, .. } => {
                write!(f, "<")?;
                for byte in bytes {
                    write!(f, "{byte:02x}")?;
                }
                write!(f, ">")
            }
            Token::Op(opcode) => write!(f, "{opcode}"),
            Token::Invalid(byte) => write!(f, "OP_INVALIDOPCODE(0x{byte:02x})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_push_data() {
        let token = Token::push_data(vec![0x89, 0xab, 0xcd, 0xef]);
        assert_eq!(format!("{token}"), "<89abcdef>");
    }

    #[test]
    fn display_empty_push_data() {
        let token = Token::push_data(vec![]);
        assert_eq!(format!("{token}"), "<>");
    }

    #[test]
    fn display_opcode() {
        let token = Token::Op(Opcode::OpDup);
        assert_eq!(format!("{token}"), "OP_DUP");
    }

    #[test]
    fn display_invalid() {
        let token = Token::Invalid(0xba);
        assert_eq!(format!("{token}"), "OP_INVALIDOPCODE(0xba)");
    }

    #[test]
    fn minimal_direct_push_is_minimal() {
        let token = Token::push_data(vec![0xaa; 10]);
        assert!(token.is_minimal_push());
    }

    #[test]
    fn pushdata1_for_short_data_is_not_minimal() {
        let token = Token::PushData {
            bytes: vec![0xaa; 10],
            encoding: PushEncoding::PushData1,
        };
        assert!(!token.is_minimal_push());
    }

    #[test]
    fn single_byte_value_one_should_use_op1() {
        let token = Token::PushData {
            bytes: vec![0x01],
            encoding: PushEncoding::Direct,
        };
        assert!(!token.is_minimal_push());
    }

    #[test]
    fn single_byte_negative_one_should_use_op1negate() {
        let token = Token::PushData {
            bytes: vec![0x81],
            encoding: PushEncoding::Direct,
        };
        assert!(!token.is_minimal_push());
    }

    #[test]
    fn single_byte_other_values_are_minimal_direct() {
        let token = Token::PushData {
            bytes: vec![0x42],
            encoding: PushEncoding::Direct,
        };
        assert!(token.is_minimal_push());
    }

    #[test]
    fn pushdata4_for_huge_data_is_minimal() {
        let token = Token::PushData {
            bytes: vec![0; 0x10000],
            encoding: PushEncoding::PushData4,
        };
        assert!(token.is_minimal_push());
    }

    #[test]
    fn push_only_classification() {
        assert!(Token::push_data(vec![0xaa]).is_push_only());
        assert!(Token::Op(Opcode::Op1Negate).is_push_only());
        assert!(Token::Op(Opcode::Op16).is_push_only());
        assert!(!Token::Op(Opcode::OpDup).is_push_only());
        assert!(!Token::Invalid(0xba).is_push_only());
    }

    #[test]
    fn op_is_always_minimal() {
        assert!(Token::Op(Opcode::OpAdd).is_minimal_push());
        assert!(Token::Invalid(0xba).is_minimal_push());
    }
}
