//! ABI payload decoding for smart-contract calls
//!
//! Fixed-width decoding of the hex payloads carried by
//! TriggerSmartContract transactions: a 4-byte method signature followed
//! by 32-byte argument segments. Used to recognize token-creation calls
//! to the resource-token factory. All functions are pure; decoding that
//! cannot find what it is looking for yields "no match", never an error.

/// Method signature of the factory's token-creation call
pub const TOKEN_CREATE_METHOD: &str = "2f70d762";

/// The resource-token factory contract
pub const TOKEN_FACTORY_CONTRACT: &str = "TLsV52sRDL79HXGGm9yzwKibb6BeruhUzy";

/// Split a hex payload into the method signature and 32-byte segments.
///
/// Returns the lower-cased 8-char method signature as the first element,
/// followed by 64-char argument segments. Returns `None` when the payload
/// is too short to carry a signature.
pub fn decode_segments(data: &str) -> Option<Vec<String>> {
    let hex_str = data.strip_prefix("0x").unwrap_or(data);
    if hex_str.len() < 8 {
        return None;
    }

    let mut segments = vec![hex_str[..8].to_lowercase()];
    let mut rest = &hex_str[8..];
    while !rest.is_empty() {
        let take = rest.len().min(64);
        segments.push(rest[..take].to_string());
        rest = &rest[take..];
    }

    Some(segments)
}

/// Decode one 32-byte segment as a zero-padded UTF-8 string.
///
/// Trailing zero bytes are padding; an empty or undecodable segment yields
/// an empty string.
pub fn decode_utf8(segment: &str) -> String {
    let bytes = match hex::decode(segment) {
        Ok(b) => b,
        Err(_) => return String::new(),
    };

    let end = bytes
        .iter()
        .rposition(|&b| b != 0)
        .map(|i| i + 1)
        .unwrap_or(0);

    String::from_utf8(bytes[..end].to_vec()).unwrap_or_default()
}

/// A recognized token-creation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCreation {
    pub name: String,
    pub symbol: String,
}

/// Recognize a token-creation call and extract name and symbol.
///
/// The factory call carries six argument segments; the token name sits in
/// segment 4 and the symbol in segment 6. Anything that does not decode to
/// both a name and a symbol is not a match.
pub fn parse_token_creation(data: &str) -> Option<TokenCreation> {
    let segments = decode_segments(data)?;
    if segments[0] != TOKEN_CREATE_METHOD || segments.len() < 7 {
        return None;
    }

    let name = decode_utf8(&segments[4]);
    let symbol = decode_utf8(&segments[6]);
    if name.is_empty() || symbol.is_empty() {
        return None;
    }

    Some(TokenCreation { name, symbol })
}
