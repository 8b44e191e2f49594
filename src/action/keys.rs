/// A single unit of synthetic input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyToken {
    /// Virtual key code of a named special key.
    Code(u16),
    /// Text typed as a keystroke.
    Text(String),
}

impl KeyToken {
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        Some(match key_code(token) {
            Some(code) => Self::Code(code),
            None => Self::Text(token.to_string()),
        })
    }

    pub fn enter() -> Self {
        Self::Code(KEY_RETURN)
    }
}

const KEY_RETURN: u16 = 36;

fn key_code(token: &str) -> Option<u16> {
    let code = match token.to_lowercase().as_str() {
        "enter" | "return" => KEY_RETURN,
        "tab" => 48,
        "esc" | "escape" => 53,
        "space" => 49,
        "up" => 126,
        "down" => 125,
        "left" => 123,
        "right" => 124,
        _ => return None,
    };
    Some(code)
}

/// Parses a comma separated token list such as `y,enter`. Falls back to
/// `fallback` when `raw` yields no tokens.
pub fn parse_sequence(raw: &str, fallback: &str) -> Vec<KeyToken> {
    let tokens: Vec<KeyToken> = raw.split(',').filter_map(KeyToken::parse).collect();
    if tokens.is_empty() {
        return fallback.split(',').filter_map(KeyToken::parse).collect();
    }
    tokens
}

/// Literal text followed by an implicit enter.
pub fn submit_sequence(text: &str) -> Vec<KeyToken> {
    vec![KeyToken::Text(text.to_string()), KeyToken::enter()]
}
