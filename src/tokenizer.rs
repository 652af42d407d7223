use crate::error::ScriptError;
use crate::hex::decode_hex;
use crate::opcode::Opcode;
use crate::token::{PushEncoding, Token};

/// Parses raw script bytes into a sequence of tokens.
///
/// Walks the byte slice left-to-right, dispatching on each byte:
/// - `0x01`-`0x4b`: direct push (byte value = data length)
/// - `0x4c`: OP_PUSHDATA1 (1-byte length prefix)
/// - `0x4d`: OP_PUSHDATA2 (2-byte little-endian length prefix)
/// - `0x4e`: OP_PUSHDATA4 (4-byte little-endian length prefix)
/// - All other bytes: looked up via [`Opcode::from_byte`]
///
/// A push-data instruction that runs past the end of the script halts
/// parsing with `ScriptError::UnexpectedEndOfScript` — there is no sane
/// recovery once the declared length outruns the buffer. A byte with no
/// assigned opcode meaning does *not* stop parsing: it becomes
/// `Token::Invalid`, and consensus requires it fail at execution time even
/// if it sits on a conditional branch that never runs.
pub fn parse_script(bytes: &[u8]) -> Result<Vec<Token>, ScriptError> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    let len = bytes.len();

    while pos < len {
        let byte = bytes[pos];
        pos += 1;

        match byte {
            // Direct push: byte value is the data length (1-75 bytes)
            0x01..=0x4b => {
                let n = byte as usize;
                if pos + n > len {
                    return Err(ScriptError::UnexpectedEndOfScript);
                }
                tokens.push(Token::PushData {
                    bytes: bytes[pos..pos + n].to_vec(),
                    encoding: PushEncoding::Direct,
                });
                pos += n;
            }

            // OP_PUSHDATA1: next 1 byte is the length
            0x4c => {
                if pos >= len {
                    return Err(ScriptError::UnexpectedEndOfScript);
                }
                let n = bytes[pos] as usize;
                pos += 1;
                if pos + n > len {
                    return Err(ScriptError::UnexpectedEndOfScript);
                }
                tokens.push(Token::PushData {
                    bytes: bytes[pos..pos + n].to_vec(),
                    encoding: PushEncoding::PushData1,
                });
                pos += n;
            }

            // OP_PUSHDATA2: next 2 bytes (little-endian) are the length
            0x4d => {
                if pos + 2 > len {
                    return Err(ScriptError::UnexpectedEndOfScript);
                }
                let n = u16::from_le_bytes([bytes[pos], bytes[pos + 1]]) as usize;
                pos += 2;
                if pos + n > len {
                    return Err(ScriptError::UnexpectedEndOfScript);
                }
                tokens.push(Token::PushData {
                    bytes: bytes[pos..pos + n].to_vec(),
                    encoding: PushEncoding::PushData2,
                });
                pos += n;
            }

            // OP_PUSHDATA4: next 4 bytes (little-endian) are the length
            0x4e => {
                if pos + 4 > len {
                    return Err(ScriptError::UnexpectedEndOfScript);
                }
                let n = u32::from_le_bytes([
                    bytes[pos],
                    bytes[pos + 1],
                    bytes[pos + 2],
                    bytes[pos + 3],
                ]) as usize;
                pos += 4;
                if pos + n > len {
                    return Err(ScriptError::UnexpectedEndOfScript);
                }
                tokens.push(Token::PushData {
                    bytes: bytes[pos..pos + n].to_vec(),
                    encoding: PushEncoding::PushData4,
                });
                pos += n;
            }

            // All other bytes: look up as opcode, or keep as Invalid.
            _ => match Opcode::from_byte(byte) {
                Some(opcode) => tokens.push(Token::Op(opcode)),
                None => tokens.push(Token::Invalid(byte)),
            },
        }
    }

    Ok(tokens)
}

/// Parses a hex-encoded script string into tokens.
///
/// Convenience wrapper that decodes the hex string via [`decode_hex`],
/// then passes the resulting bytes to [`parse_script`].
pub fn parse_script_hex(hex: &str) -> Result<Vec<Token>, ScriptError> {
    let bytes = decode_hex(hex)?;
    parse_script(&bytes)
}

/// Re-serializes tokens back into script bytes, using the encoding each
/// push token recorded. Opcode tokens round-trip through `Opcode::to_byte`.
pub fn serialize_script(tokens: &[Token]) -> Vec<u8> {
    let mut out = Vec::new();
    for token in tokens {
        match token {
            Token::PushData { bytes, encoding } => match encoding {
                PushEncoding::Direct => {
                    out.push(bytes.len() as u8);
                    out.extend_from_slice(bytes);
                }
                PushEncoding::PushData1 => {
                    out.push(0x4c);
                    out.push(bytes.len() as u8);
                    out.extend_from_slice(bytes);
                }
                PushEncoding::PushData2 => {
                    out.push(0x4d);
                    out.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
                    out.extend_from_slice(bytes);
                }
                PushEncoding::PushData4 => {
                    out.push(0x4e);
                    out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
                    out.extend_from_slice(bytes);
                }
            },
            Token::Op(opcode) => out.push(opcode.to_byte()),
            Token::Invalid(byte) => out.push(*byte),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_script() {
        let tokens = parse_script(&[]).unwrap();
        assert!(tokens.is_empty());
    }

    #[test]
    fn single_opcode() {
        let tokens = parse_script(&[0x76]).unwrap(); // OP_DUP
        assert_eq!(tokens, vec![Token::Op(Opcode::OpDup)]);
    }

    #[test]
    fn direct_push_3_bytes() {
        let tokens = parse_script(&[0x03, 0xaa, 0xbb, 0xcc]).unwrap();
        assert_eq!(tokens, vec![Token::push_data(vec![0xaa, 0xbb, 0xcc])]);
    }

    #[test]
    fn direct_push_truncated() {
        let err = parse_script(&[0x03, 0xaa, 0xbb]).unwrap_err();
        assert!(matches!(err, ScriptError::UnexpectedEndOfScript));
    }

    #[test]
    fn pushdata1() {
        let tokens = parse_script(&[0x4c, 0x02, 0xde, 0xad]).unwrap();
        assert_eq!(tokens, vec![Token::push_data(vec![0xde, 0xad])]);
    }

    #[test]
    fn pushdata1_missing_length() {
        let err = parse_script(&[0x4c]).unwrap_err();
        assert!(matches!(err, ScriptError::UnexpectedEndOfScript));
    }

    #[test]
    fn pushdata1_truncated_data() {
        let err = parse_script(&[0x4c, 0x05, 0x01, 0x02]).unwrap_err();
        assert!(matches!(err, ScriptError::UnexpectedEndOfScript));
    }

    #[test]
    fn pushdata2() {
        let tokens = parse_script(&[0x4d, 0x03, 0x00, 0xaa, 0xbb, 0xcc]).unwrap();
        assert_eq!(tokens, vec![Token::push_data(vec![0xaa, 0xbb, 0xcc])]);
    }

    #[test]
    fn pushdata2_missing_length() {
        let err = parse_script(&[0x4d, 0x03]).unwrap_err();
        assert!(matches!(err, ScriptError::UnexpectedEndOfScript));
    }

    #[test]
    fn pushdata4() {
        let tokens = parse_script(&[0x4e, 0x03, 0x00, 0x00, 0x00, 0xaa, 0xbb, 0xcc]).unwrap();
        assert_eq!(tokens, vec![Token::push_data(vec![0xaa, 0xbb, 0xcc])]);
    }

    #[test]
    fn pushdata4_missing_length() {
        let err = parse_script(&[0x4e, 0x01, 0x00]).unwrap_err();
        assert!(matches!(err, ScriptError::UnexpectedEndOfScript));
    }

    #[test]
    fn unassigned_byte_becomes_invalid_token() {
        let tokens = parse_script(&[0xba]).unwrap();
        assert_eq!(tokens, vec![Token::Invalid(0xba)]);
    }

    #[test]
    fn op0_parses() {
        let tokens = parse_script(&[0x00]).unwrap();
        assert_eq!(tokens, vec![Token::Op(Opcode::Op0)]);
    }

    #[test]
    fn multi_token_script() {
        let mut script = vec![0x76, 0xa9, 0x14]; // OP_DUP, OP_HASH160, push 20 bytes
        script.extend_from_slice(&[0xab; 20]);
        script.push(0x88); // OP_EQUALVERIFY
        script.push(0xac); // OP_CHECKSIG
        let tokens = parse_script(&script).unwrap();
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[0], Token::Op(Opcode::OpDup));
        assert_eq!(tokens[1], Token::Op(Opcode::OpHash160));
        assert_eq!(tokens[2], Token::push_data(vec![0xab; 20]));
        assert_eq!(tokens[3], Token::Op(Opcode::OpEqualVerify));
        assert_eq!(tokens[4], Token::Op(Opcode::OpCheckSig));
    }

    #[test]
    fn parse_script_hex_roundtrip() {
        let hex = "76a914".to_string() + &"ab".repeat(20) + "88ac";
        let tokens = parse_script_hex(&hex).unwrap();
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[0], Token::Op(Opcode::OpDup));
        assert_eq!(tokens[4], Token::Op(Opcode::OpCheckSig));
    }

    #[test]
    fn parse_script_hex_invalid() {
        let err = parse_script_hex("zzzz").unwrap_err();
        assert!(matches!(err, ScriptError::InvalidHex));
    }

    #[test]
    fn pushdata1_zero_length() {
        let tokens = parse_script(&[0x4c, 0x00]).unwrap();
        assert_eq!(tokens, vec![Token::push_data(vec![])]);
    }

    #[test]
    fn direct_push_1_byte() {
        let tokens = parse_script(&[0x01, 0xff]).unwrap();
        assert_eq!(tokens, vec![Token::push_data(vec![0xff])]);
    }

    #[test]
    fn serialize_roundtrip() {
        let script = vec![0x76, 0xa9, 0x03, 0xaa, 0xbb, 0xcc, 0x88, 0xac];
        let tokens = parse_script(&script).unwrap();
        assert_eq!(serialize_script(&tokens), script);
    }

    #[test]
    fn serialize_pushdata1_roundtrip() {
        let mut script = vec![0x4c, 0x4c];
        script.extend_from_slice(&[0x01; 0x4c]);
        let tokens = parse_script(&script).unwrap();
        assert_eq!(serialize_script(&tokens), script);
    }
}
