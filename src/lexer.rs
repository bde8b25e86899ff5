use crate::error::{ErrorKind, Result};

/// Characters that always form a token of their own.
const DELIMITERS: &[char] = &['[', ']', '<', '>', '{', '}', '*', '!', ',', ';', '(', ')', ':', '='];

/// Tokenize one raw source line into raw token strings.
///
/// String literals (`'...'`) are kept whole, quotes included. A `#` outside
/// a literal starts a comment running to the end of the line. Blank and
/// pure-comment lines yield no tokens.
pub fn tokenize_line(line: &str) -> Result<Vec<String>> {
    let mut tokens: Vec<String> = Vec::new();
    let mut word = String::new();
    let mut chars = line.chars();

    fn flush(word: &mut String, tokens: &mut Vec<String>) {
        if !word.is_empty() {
            tokens.push(std::mem::take(word));
        }
    }

    while let Some(c) = chars.next() {
        match c {
            '#' => break,
            '\'' => {
                flush(&mut word, &mut tokens);
                let mut literal = String::from('\'');
                let mut closed = false;
                for ch in chars.by_ref() {
                    literal.push(ch);
                    if ch == '\'' {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(ErrorKind::UnterminatedLiteral.into());
                }
                tokens.push(literal);
            }
            c if c.is_whitespace() => flush(&mut word, &mut tokens),
            c if DELIMITERS.contains(&c) => {
                flush(&mut word, &mut tokens);
                tokens.push(c.to_string());
            }
            c => word.push(c),
        }
    }
    flush(&mut word, &mut tokens);

    Ok(tokens)
}
