//! Go tokenizer with automatic semicolon insertion and doc comment attachment.

/// Token kinds the declaration parser needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    Number(String),
    /// String literal, already unquoted.
    Str(String),
    Char(String),
    Op(&'static str),
    /// Explicit `;` or one inserted at a line end.
    Semi,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    /// Comment group directly above this token.
    pub doc: Vec<String>,
}

/// Tokenizer failure with the line it happened on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub line: usize,
    pub message: String,
}

/// Operators, longest first so prefixes never shadow them.
const OPERATORS: &[&str] = &[
    "<<=", ">>=", "&^=", "...", "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", ":=", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "&^", "~", "+", "-", "*", "/", "%", "&",
    "|", "^", "<", ">", "=", "!", "(", ")", "[", "]", "{", "}", ",", ".", ":", ";",
];

#[derive(Debug, Default)]
struct CommentGroup {
    lines: Vec<String>,
    end_line: usize,
    trailing: bool,
}

struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: usize,
    tokens: Vec<Token>,
    group: Option<CommentGroup>,
    last_line: usize,
}

/// Tokenize Go source. A leading byte order mark is ignored.
pub fn tokenize(src: &str) -> Result<Vec<Token>, LexError> {
    let src = src.strip_prefix('\u{feff}').unwrap_or(src);
    let mut lexer = Lexer {
        src: src.as_bytes(),
        pos: 0,
        line: 1,
        tokens: Vec::new(),
        group: None,
        last_line: 0,
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

impl Lexer<'_> {
    fn run(&mut self) -> Result<(), LexError> {
        while let Some(&c) = self.src.get(self.pos) {
            match c {
                b'\n' => {
                    self.newline();
                    self.pos += 1;
                    self.line += 1;
                }
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'/' if self.peek(1) == Some(b'/') => self.line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.block_comment()?,
                b'"' => {
                    let value = self.interpreted_string()?;
                    self.push(TokenKind::Str(value));
                }
                b'`' => {
                    let value = self.raw_string()?;
                    self.push(TokenKind::Str(value));
                }
                b'\'' => {
                    let value = self.char_literal()?;
                    self.push(TokenKind::Char(value));
                }
                c if c.is_ascii_digit() => {
                    let number = self.number();
                    self.push(TokenKind::Number(number));
                }
                b'.' if self.peek(1).is_some_and(|d| d.is_ascii_digit()) => {
                    let number = self.number();
                    self.push(TokenKind::Number(number));
                }
                c if c == b'_' || c.is_ascii_alphabetic() || c >= 0x80 => {
                    let ident = self.ident();
                    self.push(TokenKind::Ident(ident));
                }
                _ => {
                    let op = self.operator()?;
                    if op == ";" {
                        self.push(TokenKind::Semi);
                    } else {
                        self.push(TokenKind::Op(op));
                    }
                }
            }
        }

        self.newline();
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            line: self.line,
            doc: Vec::new(),
        });
        Ok(())
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn error(&self, message: &str) -> LexError {
        LexError {
            line: self.line,
            message: message.to_string(),
        }
    }

    fn push(&mut self, kind: TokenKind) {
        let doc = match self.group.take() {
            Some(group) if !group.trailing && group.end_line + 1 == self.line => group.lines,
            _ => Vec::new(),
        };
        self.tokens.push(Token {
            kind,
            line: self.line,
            doc,
        });
        self.last_line = self.line;
    }

    /// Insert a semicolon if the line's last token allows one.
    fn newline(&mut self) {
        let Some(last) = self.tokens.last() else {
            return;
        };
        if last.line != self.line {
            return;
        }
        let insert = match &last.kind {
            TokenKind::Ident(word) => !matches!(
                word.as_str(),
                "package"
                    | "import"
                    | "type"
                    | "func"
                    | "var"
                    | "const"
                    | "struct"
                    | "interface"
                    | "map"
                    | "chan"
                    | "go"
                    | "defer"
                    | "if"
                    | "else"
                    | "for"
                    | "switch"
                    | "select"
                    | "case"
                    | "default"
                    | "range"
                    | "goto"
            ),
            TokenKind::Number(_) | TokenKind::Str(_) | TokenKind::Char(_) => true,
            TokenKind::Op(op) => matches!(*op, ")" | "]" | "}" | "++" | "--"),
            TokenKind::Semi | TokenKind::Eof => false,
        };
        if insert {
            self.tokens.push(Token {
                kind: TokenKind::Semi,
                line: self.line,
                doc: Vec::new(),
            });
        }
    }

    fn add_comment(&mut self, text: String, start_line: usize, end_line: usize) {
        let trailing = self.last_line == start_line;
        match &mut self.group {
            Some(group) if !group.trailing && !trailing && group.end_line + 1 >= start_line => {
                group.lines.push(text);
                group.end_line = end_line;
            }
            _ => {
                self.group = Some(CommentGroup {
                    lines: vec![text],
                    end_line,
                    trailing,
                });
            }
        }
    }

    fn line_comment(&mut self) {
        let start = self.pos + 2;
        let end = self.src[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(self.src.len(), |i| start + i);
        let text = String::from_utf8_lossy(&self.src[start..end])
            .trim()
            .to_string();
        self.add_comment(text, self.line, self.line);
        self.pos = end;
    }

    fn block_comment(&mut self) -> Result<(), LexError> {
        let start_line = self.line;
        let start = self.pos + 2;
        let Some(len) = self.src[start..].windows(2).position(|w| w == b"*/") else {
            return Err(self.error("comment not terminated"));
        };
        let body = &self.src[start..start + len];
        let newlines = body.iter().filter(|&&b| b == b'\n').count();
        let text = String::from_utf8_lossy(body)
            .lines()
            .map(|l| l.trim().trim_start_matches('*').trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        // A multi-line comment acts like a newline.
        if newlines > 0 {
            self.newline();
        }
        self.line += newlines;
        self.pos = start + len + 2;
        self.add_comment(text, start_line, self.line);
        Ok(())
    }

    fn interpreted_string(&mut self) -> Result<String, LexError> {
        let mut out = String::new();
        self.pos += 1;
        loop {
            match self.peek(0) {
                None | Some(b'\n') => return Err(self.error("string literal not terminated")),
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some(b'\\') => {
                    let escaped = self.peek(1).ok_or_else(|| self.error("bad escape"))?;
                    match escaped {
                        b'n' => out.push('\n'),
                        b't' => out.push('\t'),
                        b'r' => out.push('\r'),
                        b'\\' => out.push('\\'),
                        b'"' => out.push('"'),
                        b'\'' => out.push('\''),
                        other => {
                            out.push('\\');
                            out.push(other as char);
                        }
                    }
                    self.pos += 2;
                }
                Some(_) => {
                    let ch = self.next_char();
                    out.push(ch);
                }
            }
        }
    }

    fn raw_string(&mut self) -> Result<String, LexError> {
        let start = self.pos + 1;
        let Some(len) = self.src[start..].iter().position(|&b| b == b'`') else {
            return Err(self.error("raw string literal not terminated"));
        };
        let body = &self.src[start..start + len];
        let value = String::from_utf8_lossy(body).replace('\r', "");
        self.line += body.iter().filter(|&&b| b == b'\n').count();
        self.pos = start + len + 1;
        Ok(value)
    }

    fn char_literal(&mut self) -> Result<String, LexError> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek(0) {
                None | Some(b'\n') => return Err(self.error("rune literal not terminated")),
                Some(b'\\') => self.pos += 2,
                Some(b'\'') => {
                    self.pos += 1;
                    return Ok(String::from_utf8_lossy(&self.src[start..self.pos]).to_string());
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn number(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek(0) {
            let exponent_sign = (c == b'+' || c == b'-')
                && self.pos > start
                && matches!(self.src[self.pos - 1], b'e' | b'E' | b'p' | b'P')
                && !self.src[start..self.pos].starts_with(b"0x");
            if c.is_ascii_alphanumeric() || c == b'.' || c == b'_' || exponent_sign {
                self.pos += 1;
            } else {
                break;
            }
        }
        String::from_utf8_lossy(&self.src[start..self.pos]).to_string()
    }

    fn ident(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek(0) {
            if c == b'_' || c.is_ascii_alphanumeric() || c >= 0x80 {
                self.pos += 1;
            } else {
                break;
            }
        }
        String::from_utf8_lossy(&self.src[start..self.pos]).to_string()
    }

    fn next_char(&mut self) -> char {
        let rest = String::from_utf8_lossy(&self.src[self.pos..self.src.len().min(self.pos + 4)])
            .chars()
            .next()
            .unwrap_or('\u{FFFD}');
        self.pos += rest.len_utf8().max(1);
        rest
    }

    fn operator(&mut self) -> Result<&'static str, LexError> {
        let rest = &self.src[self.pos..];
        match OPERATORS.iter().find(|op| rest.starts_with(op.as_bytes())) {
            Some(op) => {
                self.pos += op.len();
                Ok(op)
            }
            None => Err(self.error(&format!("unexpected character {:?}", rest[0] as char))),
        }
    }
}
