use super::{Expr, Program, Result, ScriptError};

/// Parse script source text into a [`Program`].
pub fn parse_program(source: &str) -> Result<Program> {
    let mut parser = Parser::new(source);
    let mut forms = Vec::new();
    while parser.skip_ws() {
        if parser.eof() {
            break;
        }
        forms.push(parser.parse_expr()?);
    }

    Ok(Program::new(source, forms))
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    index: usize,
}

type ParseResult<T> = std::result::Result<T, ScriptError>;

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            index: 0,
        }
    }

    fn eof(&self) -> bool {
        self.index >= self.bytes.len()
    }

    fn current(&self) -> Option<u8> {
        self.bytes.get(self.index).copied()
    }

    fn advance(&mut self) {
        if self.index < self.bytes.len() {
            self.index += 1;
        }
    }

    fn skip_ws(&mut self) -> bool {
        let mut advanced = false;
        loop {
            while let Some(ch) = self.current() {
                if ch.is_ascii_whitespace() {
                    advanced = true;
                    self.advance();
                } else {
                    break;
                }
            }
            if self.current() == Some(b';') {
                advanced = true;
                while let Some(ch) = self.current() {
                    self.advance();
                    if ch == b'\n' {
                        break;
                    }
                }
                continue;
            }
            break;
        }
        advanced || !self.eof()
    }

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.skip_ws();
        if self.eof() {
            return Err(self.error("unexpected end of input"));
        }

        match self.current().unwrap() {
            b'(' => self.parse_list(),
            b')' => Err(self.error("unexpected ')'")),
            b'"' => self.parse_string(),
            b':' => self.parse_keyword(),
            b'-' | b'+' | b'0'..=b'9' => self.parse_number_or_symbol(),
            _ => self.parse_symbol_or_literal(),
        }
    }

    fn parse_list(&mut self) -> ParseResult<Expr> {
        // consume '('
        self.advance();
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.eof() {
                return Err(self.error("unterminated list"));
            }
            if self.current() == Some(b')') {
                self.advance();
                break;
            }
            items.push(self.parse_expr()?);
        }
        Ok(Expr::List(items))
    }

    fn parse_string(&mut self) -> ParseResult<Expr> {
        // consume opening quote
        self.advance();
        let mut buf = String::new();
        while let Some(ch) = self.current() {
            match ch {
                b'"' => {
                    self.advance();
                    return Ok(Expr::String(buf));
                }
                b'\\' => {
                    self.advance();
                    let escaped = self
                        .current()
                        .ok_or_else(|| self.error("incomplete escape"))?;
                    self.advance();
                    let value = match escaped {
                        b'"' => '"',
                        b'\\' => '\\',
                        b'n' => '\n',
                        b'r' => '\r',
                        b't' => '\t',
                        other => {
                            return Err(self.error(&format!("unknown escape: \\{}", other as char)));
                        }
                    };
                    buf.push(value);
                }
                _ => {
                    // copy whole UTF-8 characters, not raw bytes
                    let rest = &self.src[self.index..];
                    let ch = rest
                        .chars()
                        .next()
                        .ok_or_else(|| self.error("invalid UTF-8 in string literal"))?;
                    buf.push(ch);
                    self.index += ch.len_utf8();
                }
            }
        }
        Err(self.error("unterminated string literal"))
    }

    fn parse_keyword(&mut self) -> ParseResult<Expr> {
        self.advance(); // consume ':'
        let start = self.index;
        while let Some(ch) = self.current() {
            if is_symbol_char(ch) {
                self.advance();
            } else {
                break;
            }
        }
        if start == self.index {
            return Err(self.error("empty keyword"));
        }
        let text = &self.src[start..self.index];
        Ok(Expr::Keyword(text.to_string()))
    }

    fn parse_number_or_symbol(&mut self) -> ParseResult<Expr> {
        let start = self.index;
        if self.current() == Some(b'-') || self.current() == Some(b'+') {
            self.advance();
        }
        let mut has_digit = false;
        while let Some(ch) = self.current() {
            if ch.is_ascii_digit() {
                has_digit = true;
                self.advance();
            } else {
                break;
            }
        }

        let mut is_float = false;
        if self.current() == Some(b'.') {
            if let Some(next) = self.peek_char() {
                if next.is_ascii_digit() {
                    is_float = true;
                    self.advance();
                    while let Some(ch) = self.current() {
                        if ch.is_ascii_digit() {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
            }
        }

        if !has_digit {
            self.index = start;
            return self.parse_symbol_or_literal();
        }

        let text = &self.src[start..self.index];
        if is_float {
            match text.parse::<f64>() {
                Ok(value) => Ok(Expr::Float(value)),
                Err(_) => Err(self.error("invalid float literal")),
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => Ok(Expr::Integer(value)),
                Err(_) => Err(self.error("invalid integer literal")),
            }
        }
    }

    fn parse_symbol_or_literal(&mut self) -> ParseResult<Expr> {
        let start = self.index;
        while let Some(ch) = self.current() {
            if is_symbol_char(ch) {
                self.advance();
            } else {
                break;
            }
        }
        if start == self.index {
            return Err(self.error("unexpected character"));
        }
        let text = &self.src[start..self.index];
        match text {
            "true" => Ok(Expr::Boolean(true)),
            "false" => Ok(Expr::Boolean(false)),
            "null" => Ok(Expr::Null),
            _ => Ok(Expr::Symbol(text.to_string())),
        }
    }

    fn peek_char(&self) -> Option<u8> {
        self.bytes.get(self.index + 1).copied()
    }

    fn error(&self, message: &str) -> ScriptError {
        ScriptError::Syntax(format!("{} at byte {}", message, self.index))
    }
}

fn is_symbol_char(ch: u8) -> bool {
    match ch {
        b'(' | b')' | b'"' | b';' | b':' => false,
        c if c.is_ascii_whitespace() => false,
        _ => true,
    }
}
