/// Semantic kind of a raw token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    Def,
    Del,
    Else,
    End,
    Err,
    For,
    If,
    Print,
    Read,
    Res,
    Return,
    Url,
    Use,
    Var,

    // Arguments and parameters
    Const,
    Debug,
    Endpoint,
    Halt,
    Method,
    Scope,
    Success,
    Timeout,
    Warns,

    // Syntax
    Bang,
    Comment,
    Comma,
    CompEq,
    Assign,
    GreaterThan,
    GreaterThanEq,
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Colon,
    LessThan,
    LessThanEq,
    NotEqual,

    // Data
    StringLiteral,
    Numeric,
    Identifier,
    PostIncrement,
    PostDecrement,

    Unknown,
}

/// A raw token paired with its kind. String literals have their quotes
/// stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
}

impl Token {
    pub fn new(raw: &str) -> Self {
        let kind = classify(raw);
        let text = if kind == TokenKind::StringLiteral {
            raw[1..raw.len() - 1].to_string()
        } else {
            raw.to_string()
        };
        Token { text, kind }
    }
}

/// Whether `raw` reads as a number. `inf` and `NaN` parse as `f64` but are
/// treated as names.
pub fn is_numeric(raw: &str) -> bool {
    // f64 parsing also accepts "inf" and "NaN"; those are names here.
    raw.chars().any(|c| c.is_ascii_digit()) && raw.parse::<f64>().is_ok()
}

fn is_identifier(raw: &str) -> bool {
    if raw.is_empty() || raw.chars().any(|c| !c.is_alphanumeric() && c != '_') {
        return false;
    }
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.is_alphabetic(),
        _ => true,
    }
}

/// Map a raw token string to its kind.
pub fn classify(raw: &str) -> TokenKind {
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return TokenKind::StringLiteral;
    }
    if is_numeric(raw) {
        return TokenKind::Numeric;
    }

    let kind = match raw {
        "api" | "url" => TokenKind::Url,
        "def" => TokenKind::Def,
        "del" => TokenKind::Del,
        "else" => TokenKind::Else,
        "end" => TokenKind::End,
        "err" => TokenKind::Err,
        "for" => TokenKind::For,
        "if" => TokenKind::If,
        "print" => TokenKind::Print,
        "read" => TokenKind::Read,
        "res" => TokenKind::Res,
        "return" => TokenKind::Return,
        "use" => TokenKind::Use,
        "var" => TokenKind::Var,

        "const" => TokenKind::Const,
        "debug" => TokenKind::Debug,
        "endpoint" => TokenKind::Endpoint,
        "halt" => TokenKind::Halt,
        "method" => TokenKind::Method,
        "scope" => TokenKind::Scope,
        "success" => TokenKind::Success,
        "timeout" => TokenKind::Timeout,
        "warns" => TokenKind::Warns,

        "!" => TokenKind::Bang,
        "#" => TokenKind::Comment,
        "," => TokenKind::Comma,
        "==" => TokenKind::CompEq,
        "=" => TokenKind::Assign,
        ">" => TokenKind::GreaterThan,
        ">=" => TokenKind::GreaterThanEq,
        "{" => TokenKind::OpenBrace,
        "}" => TokenKind::CloseBrace,
        "(" => TokenKind::OpenParen,
        ")" => TokenKind::CloseParen,
        "[" => TokenKind::OpenBracket,
        "]" => TokenKind::CloseBracket,
        ":" => TokenKind::Colon,
        "<" => TokenKind::LessThan,
        "<=" => TokenKind::LessThanEq,
        "!=" => TokenKind::NotEqual,
        _ => TokenKind::Unknown,
    };
    if kind != TokenKind::Unknown {
        return kind;
    }

    if let Some(name) = raw.strip_suffix("++") {
        if is_identifier(name) {
            return TokenKind::PostIncrement;
        }
    }
    if let Some(name) = raw.strip_suffix("--") {
        if is_identifier(name) {
            return TokenKind::PostDecrement;
        }
    }

    if is_identifier(raw) {
        TokenKind::Identifier
    } else {
        TokenKind::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_lose_their_quotes() {
        let tok = Token::new("'hello world'");
        assert_eq!(tok.kind, TokenKind::StringLiteral);
        assert_eq!(tok.text, "hello world");
    }

    #[test]
    fn numbers_and_names() {
        assert_eq!(classify("42"), TokenKind::Numeric);
        assert_eq!(classify("-3.5"), TokenKind::Numeric);
        assert_eq!(classify("inf"), TokenKind::Identifier);
        assert_eq!(classify("x"), TokenKind::Identifier);
        assert_eq!(classify("_"), TokenKind::Unknown);
        assert_eq!(classify("my_var2"), TokenKind::Identifier);
        assert_eq!(classify("a-b"), TokenKind::Unknown);
    }

    #[test]
    fn keywords_and_aliases() {
        assert_eq!(classify("api"), TokenKind::Url);
        assert_eq!(classify("url"), TokenKind::Url);
        assert_eq!(classify("success"), TokenKind::Success);
        assert_eq!(classify("!="), TokenKind::NotEqual);
    }

    #[test]
    fn unary_operators() {
        assert_eq!(classify("count++"), TokenKind::PostIncrement);
        assert_eq!(classify("count--"), TokenKind::PostDecrement);
        assert_eq!(classify("++"), TokenKind::Unknown);
    }
}
