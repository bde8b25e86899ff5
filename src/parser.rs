use crate::ast::{
    Call, CompareOp, Condition, Def, Operand, OperandKind, StmtKind, Url, UseMode, ValueKind, Var,
};
use crate::config::DEFAULT_TIMEOUT_MS;
use crate::error::{ErrorKind, NebulaError, Result};
use crate::token::{Token, TokenKind};

/// Parse one tokenized line into a statement payload.
///
/// Returns `Ok(None)` when the leading token starts no known statement form;
/// the caller decides how to report that. A known form with malformed
/// arguments is a syntax error.
pub fn parse_statement(raw: &[String]) -> Result<Option<StmtKind>> {
    let tokens: Vec<Token> = raw.iter().map(|t| Token::new(t)).collect();
    let Some(first) = tokens.first() else {
        return Ok(None);
    };
    let mut s = Stream { tokens: &tokens, pos: 0 };

    let kind = match first.kind {
        TokenKind::Def => parse_def(&mut s)?,
        TokenKind::Var => parse_var(&mut s)?,
        TokenKind::If => StmtKind::If(parse_condition(&mut s)?),
        TokenKind::For => StmtKind::For(parse_condition(&mut s)?),
        TokenKind::Else => StmtKind::Else { chained: raw[1..].to_vec() },
        TokenKind::End => {
            s.next()?;
            s.expect_end()?;
            StmtKind::End
        }
        TokenKind::Del => StmtKind::Del { target: parse_single_name(&mut s)? },
        TokenKind::Read => StmtKind::Read { target: parse_single_name(&mut s)? },
        TokenKind::Res => {
            let (target, reference) = parse_field(&mut s, TokenKind::Res)?;
            StmtKind::Res { target, reference }
        }
        TokenKind::Err => {
            let (target, reference) = parse_field(&mut s, TokenKind::Err)?;
            StmtKind::Err { target, reference }
        }
        TokenKind::Url => StmtKind::Url(parse_url(&mut s)?),
        TokenKind::Use => StmtKind::Use(parse_use(&mut s)?),
        TokenKind::Print => {
            s.next()?;
            let value = operand(s.next()?)?;
            s.expect_end()?;
            StmtKind::Print(value)
        }
        TokenKind::Return => {
            s.next()?;
            if s.is_empty() {
                StmtKind::Return(None)
            } else {
                let value = operand(s.next()?)?;
                s.expect_end()?;
                StmtKind::Return(Some(value))
            }
        }
        TokenKind::PostIncrement | TokenKind::PostDecrement => {
            let tok = s.next()?;
            s.expect_end()?;
            let target = tok.text[..tok.text.len() - 2].to_string();
            if tok.kind == TokenKind::PostIncrement {
                StmtKind::UnaryIncrement { target }
            } else {
                StmtKind::UnaryDecrement { target }
            }
        }
        TokenKind::Identifier if s.lookahead() == Some(TokenKind::OpenParen) => {
            let call = parse_call(&mut s)?;
            s.expect_end()?;
            StmtKind::FunctionCall(call)
        }
        _ => return Ok(None),
    };

    Ok(Some(kind))
}

fn syntax(msg: impl Into<String>) -> NebulaError {
    ErrorKind::Syntax(msg.into()).into()
}

// ---------------------------------------------------------------------------
// Token cursor
// ---------------------------------------------------------------------------

struct Stream<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Stream<'a> {
    fn is_empty(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    /// Kind of the token after the next one.
    fn lookahead(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos + 1).map(|t| t.kind)
    }

    fn next(&mut self) -> Result<&'a Token> {
        let tok = self
            .tokens
            .get(self.pos)
            .ok_or_else(|| syntax("expecting more tokens"))?;
        self.pos += 1;
        Ok(tok)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<&'a Token> {
        match self.tokens.get(self.pos) {
            Some(tok) if tok.kind == kind => {
                self.pos += 1;
                Ok(tok)
            }
            Some(tok) => Err(syntax(format!("expecting {} instead of '{}'", what, tok.text))),
            None => Err(syntax(format!("expecting {}", what))),
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_end(&self) -> Result<()> {
        match self.tokens.get(self.pos) {
            None => Ok(()),
            Some(tok) => Err(syntax(format!("unexpected trailing token '{}'", tok.text))),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared pieces
// ---------------------------------------------------------------------------

fn operand(tok: &Token) -> Result<Operand> {
    let kind = match tok.kind {
        TokenKind::StringLiteral => OperandKind::Str,
        TokenKind::Numeric => OperandKind::Numeric,
        TokenKind::Identifier => OperandKind::Name,
        _ => return Err(syntax(format!("'{}' is not a valid value", tok.text))),
    };
    Ok(Operand::new(tok.text.clone(), kind))
}

/// `( )` or `( a, b, ... )`
fn argument_list(s: &mut Stream) -> Result<Vec<Operand>> {
    let mut args = Vec::new();
    s.expect(TokenKind::OpenParen, "'('")?;
    if s.eat(TokenKind::CloseParen) {
        return Ok(args);
    }

    loop {
        let tok = s.next()?;
        args.push(operand(tok)?);
        match s.peek() {
            Some(TokenKind::CloseParen) => {
                s.next()?;
                break;
            }
            Some(TokenKind::Comma) => {
                s.next()?;
                if s.peek() == Some(TokenKind::CloseParen) {
                    return Err(syntax("invalid token after comma"));
                }
            }
            _ => return Err(syntax(format!("invalid token after arg {}", tok.text))),
        }
    }

    Ok(args)
}

fn parse_call(s: &mut Stream) -> Result<Call> {
    let name = s.expect(TokenKind::Identifier, "function name")?.text.clone();
    let args = argument_list(s)?;
    Ok(Call { name, args })
}

/// `<keyword> NAME`
fn parse_single_name(s: &mut Stream) -> Result<String> {
    let keyword = s.next()?.text.clone();
    let name = s
        .expect(TokenKind::Identifier, &format!("a variable after {}", keyword))?
        .text
        .clone();
    s.expect_end()?;
    Ok(name)
}

// ---------------------------------------------------------------------------
// Statement forms
// ---------------------------------------------------------------------------

/// `def NAME [ ( params ) ] : [num|str]`
fn parse_def(s: &mut Stream) -> Result<StmtKind> {
    s.expect(TokenKind::Def, "def")?;
    let name = s.expect(TokenKind::Identifier, "function name")?.text.clone();

    let mut params = Vec::new();
    if s.peek() == Some(TokenKind::OpenParen) {
        for arg in argument_list(s)? {
            if arg.kind != OperandKind::Name {
                return Err(syntax(format!("invalid parameter {} for function {}", arg.text, name)));
            }
            params.push(arg.text);
        }
    }
    s.expect(TokenKind::Colon, "':'")?;

    let returns = if s.is_empty() {
        None
    } else {
        let tok = s.next()?;
        let kind = match tok.text.as_str() {
            "num" => ValueKind::Numeric,
            "str" => ValueKind::Str,
            other => return Err(syntax(format!("unknown return kind {}", other))),
        };
        s.expect_end()?;
        Some(kind)
    };

    Ok(StmtKind::Def(Def { name, params, returns }))
}

/// `var [const] NAME = VALUE`, `var NAME = FN(args)`, `var NAME = IDENT[INT]`
fn parse_var(s: &mut Stream) -> Result<StmtKind> {
    s.expect(TokenKind::Var, "var")?;
    let constant = s.eat(TokenKind::Const);
    let target = s.expect(TokenKind::Identifier, "a variable as lhs")?.text.clone();
    s.expect(TokenKind::Assign, "'='")?;

    let derived = s.peek() == Some(TokenKind::Identifier)
        && matches!(s.lookahead(), Some(TokenKind::OpenParen | TokenKind::OpenBracket));
    if derived && constant {
        return Err(syntax(format!("{} cannot be constant", target)));
    }

    if derived && s.lookahead() == Some(TokenKind::OpenParen) {
        let call = parse_call(s)?;
        s.expect_end()?;
        return Ok(StmtKind::FunctionCallWithResult { target, call });
    }

    if derived {
        let source = s.next()?.text.clone();
        s.expect(TokenKind::OpenBracket, "'['")?;
        let index_tok = s.expect(TokenKind::Numeric, "an index")?;
        let index = index_tok
            .text
            .parse::<usize>()
            .map_err(|_| syntax(format!("invalid index value {} for indexer", index_tok.text)))?;
        s.expect(TokenKind::CloseBracket, "']'")?;
        s.expect_end()?;
        return Ok(StmtKind::Indexer { target, source, index });
    }

    let value = operand(s.next()?)?;
    s.expect_end()?;
    Ok(StmtKind::Var(Var { target, value, constant }))
}

/// `if|for [!] success`, `if|for [!] NAME`, `if|for [!] LHS OP RHS`
fn parse_condition(s: &mut Stream) -> Result<Condition> {
    s.next()?;
    let negated = s.eat(TokenKind::Bang);

    if s.eat(TokenKind::Success) {
        s.expect_end()?;
        return Ok(Condition::LastSuccess { negated });
    }

    let lhs_tok = s.next()?;
    if s.is_empty() {
        if lhs_tok.kind != TokenKind::Identifier {
            return Err(syntax(format!("{} is not a variable", lhs_tok.text)));
        }
        return Ok(Condition::Exists { name: lhs_tok.text.clone(), negated });
    }
    let lhs = operand(lhs_tok)?;

    // The lexer splits `==`, `!=`, `<=`, `>=` into two tokens.
    let mut comp = s.next()?.text.clone();
    if s.peek() == Some(TokenKind::Assign) && matches!(comp.as_str(), "=" | "!" | "<" | ">") {
        comp.push_str(&s.next()?.text);
    }
    let op = match crate::token::classify(&comp) {
        TokenKind::CompEq => CompareOp::Eq,
        TokenKind::NotEqual => CompareOp::NotEq,
        TokenKind::LessThan => CompareOp::Less,
        TokenKind::LessThanEq => CompareOp::LessEq,
        TokenKind::GreaterThan => CompareOp::Greater,
        TokenKind::GreaterThanEq => CompareOp::GreaterEq,
        _ => return Err(syntax(format!("invalid comparison operator {}", comp))),
    };

    let rhs = operand(s.next()?)?;
    s.expect_end()?;
    Ok(Condition::Compare { lhs, op, rhs, negated })
}

/// `res NAME = REF::res` and `err NAME = REF::err`
fn parse_field(s: &mut Stream, property: TokenKind) -> Result<(String, String)> {
    let keyword = s.expect(property, "keyword")?.text.clone();
    let target = s.expect(TokenKind::Identifier, "a variable as lhs")?.text.clone();
    s.expect(TokenKind::Assign, "'='")?;
    let reference = s.expect(TokenKind::Identifier, "a reference")?.text.clone();
    s.expect(TokenKind::Colon, "':'")?;
    s.expect(TokenKind::Colon, "':'")?;
    s.expect(property, &keyword)?;
    s.expect_end()?;
    Ok((target, reference))
}

/// `url NAME = { endpoint: V, method: V, timeout: N, halt: B }`
fn parse_url(s: &mut Stream) -> Result<Url> {
    s.expect(TokenKind::Url, "url")?;
    let target = s.expect(TokenKind::Identifier, "a variable as lhs")?.text.clone();
    s.expect(TokenKind::Assign, "'='")?;
    s.expect(TokenKind::OpenBrace, "'{'")?;

    let mut endpoint = None;
    let mut method = String::from("GET");
    let mut timeout_ms = DEFAULT_TIMEOUT_MS;
    let mut halt = false;
    let mut parsed_params = false;

    while s.peek() != Some(TokenKind::CloseBrace) {
        parsed_params = true;
        let key = s.next()?;
        s.expect(TokenKind::Colon, "':'")?;
        let value = s.next()?;

        match key.kind {
            TokenKind::Endpoint => endpoint = Some(value.text.clone()),
            TokenKind::Method => method = value.text.clone(),
            TokenKind::Timeout => {
                timeout_ms = value
                    .text
                    .parse()
                    .map_err(|_| syntax(format!("invalid timeout {}", value.text)))?;
            }
            TokenKind::Halt => {
                halt = value
                    .text
                    .parse()
                    .map_err(|_| syntax(format!("invalid halt flag {}", value.text)))?;
            }
            _ => return Err(syntax(format!("expecting parameter instead of {}", key.text))),
        }

        if s.peek() != Some(TokenKind::CloseBrace) {
            s.expect(TokenKind::Comma, "','")?;
        }
    }
    s.expect(TokenKind::CloseBrace, "'}'")?;
    s.expect_end()?;

    if !parsed_params {
        return Err(syntax(format!("could not parse parameters for api {}", target)));
    }
    let endpoint = endpoint.ok_or_else(|| syntax(format!("missing endpoint for api {}", target)))?;
    if !method.eq_ignore_ascii_case("get") {
        return Err(syntax(format!("invalid method specified: {}", method)));
    }

    Ok(Url { target, endpoint, method: method.to_uppercase(), timeout_ms, halt })
}

fn parse_use(s: &mut Stream) -> Result<UseMode> {
    s.expect(TokenKind::Use, "use")?;
    let mode = match s.next()?.kind {
        TokenKind::Debug => UseMode::Debug,
        TokenKind::Scope => UseMode::Scope,
        TokenKind::Warns => UseMode::Warns,
        _ => return Err(ErrorKind::InvalidArgument("use".into()).into()),
    };
    s.expect_end()?;
    Ok(mode)
}
