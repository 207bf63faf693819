//! Declaration-level Go parser.
//!
//! Reads the package clause and every top-level `type` declaration.
//! Imports, constants, variables and function bodies are skipped by
//! bracket depth without being interpreted.

use super::ast::{InterfaceMethod, Param, SourceFile, StructField, TypeDecl, TypeExpr};
use super::lexer::{LexError, Token, TokenKind};

pub type ParseError = LexError;

type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse_file(mut self) -> ParseResult<SourceFile> {
        self.skip_semis();
        self.expect_keyword("package")?;
        let package = self.expect_ident()?;

        let mut decls = Vec::new();
        loop {
            self.skip_semis();
            match self.kind().clone() {
                TokenKind::Eof => break,
                TokenKind::Ident(word) => match word.as_str() {
                    "type" => self.type_decl(&mut decls)?,
                    "func" => self.skip_func()?,
                    "import" | "var" | "const" => self.skip_decl()?,
                    _ => return Err(self.error(&format!("unexpected `{word}` at top level"))),
                },
                other => return Err(self.error(&format!("unexpected {other:?} at top level"))),
            }
        }

        Ok(SourceFile { package, decls })
    }

    // ------------------------------------------------------------------
    // Token cursor
    // ------------------------------------------------------------------

    fn current(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_kind(&self, offset: usize) -> &TokenKind {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.pos + offset).min(last)].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: &str) -> ParseError {
        LexError {
            line: self.current().line,
            message: message.to_string(),
        }
    }

    fn is_op(&self, op: &str) -> bool {
        matches!(self.kind(), TokenKind::Op(o) if *o == op)
    }

    fn is_keyword(&self, word: &str) -> bool {
        matches!(self.kind(), TokenKind::Ident(w) if w == word)
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.is_op(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: &str) -> ParseResult<()> {
        if self.eat_op(op) {
            Ok(())
        } else {
            Err(self.error(&format!("expected `{op}`, found {:?}", self.kind())))
        }
    }

    fn expect_keyword(&mut self, word: &str) -> ParseResult<()> {
        if self.is_keyword(word) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(&format!("expected `{word}`, found {:?}", self.kind())))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        match self.kind().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(self.error(&format!("expected identifier, found {other:?}"))),
        }
    }

    fn skip_semis(&mut self) {
        while matches!(self.kind(), TokenKind::Semi) {
            self.advance();
        }
    }

    /// End of a declaration or member: `;`, or lookahead of a closing bracket.
    fn end_of_item(&mut self, close: &str) -> ParseResult<()> {
        if matches!(self.kind(), TokenKind::Semi) {
            self.advance();
            Ok(())
        } else if self.is_op(close) || matches!(self.kind(), TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.error(&format!("expected `;` or `{close}`, found {:?}", self.kind())))
        }
    }

    /// Skip a balanced `open ... close` group, the cursor on `open`.
    fn skip_balanced(&mut self) -> ParseResult<()> {
        let mut depth = 0usize;
        loop {
            match self.kind() {
                TokenKind::Op("(" | "[" | "{") => depth += 1,
                TokenKind::Op(")" | "]" | "}") => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.advance();
                        return Ok(());
                    }
                }
                TokenKind::Eof => return Err(self.error("unbalanced brackets")),
                _ => {}
            }
            self.advance();
        }
    }

    // ------------------------------------------------------------------
    // Skipped declarations
    // ------------------------------------------------------------------

    /// `import`, `var` and `const`, single or grouped.
    fn skip_decl(&mut self) -> ParseResult<()> {
        self.advance();
        loop {
            match self.kind() {
                TokenKind::Semi => {
                    self.advance();
                    return Ok(());
                }
                TokenKind::Eof => return Ok(()),
                TokenKind::Op("(" | "[" | "{") => self.skip_balanced()?,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// `func` declarations, including receivers and bodies.
    fn skip_func(&mut self) -> ParseResult<()> {
        self.advance();
        let mut previous = TokenKind::Semi;
        loop {
            match self.kind().clone() {
                TokenKind::Semi | TokenKind::Eof => return Ok(()),
                TokenKind::Op("{") => {
                    let type_literal = matches!(&previous, TokenKind::Ident(w) if w == "struct" || w == "interface");
                    self.skip_balanced()?;
                    if !type_literal {
                        return Ok(());
                    }
                    previous = TokenKind::Op("}");
                }
                TokenKind::Op("(" | "[") => {
                    self.skip_balanced()?;
                    previous = TokenKind::Op(")");
                }
                other => {
                    self.advance();
                    previous = other;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Type declarations
    // ------------------------------------------------------------------

    fn type_decl(&mut self, decls: &mut Vec<TypeDecl>) -> ParseResult<()> {
        let keyword = self.advance();

        if self.eat_op("(") {
            loop {
                self.skip_semis();
                if self.eat_op(")") {
                    break;
                }
                let decl = self.type_spec(&keyword.doc)?;
                decls.push(decl);
                self.end_of_item(")")?;
            }
            return Ok(());
        }

        let decl = self.type_spec(&keyword.doc)?;
        decls.push(decl);
        Ok(())
    }

    fn type_spec(&mut self, group_doc: &[String]) -> ParseResult<TypeDecl> {
        let name_token = self.current().clone();
        let name = self.expect_ident()?;
        let doc = if name_token.doc.is_empty() {
            group_doc.to_vec()
        } else {
            name_token.doc
        };

        let generic = self.is_type_params();
        if generic {
            self.skip_balanced()?;
        }
        let alias = self.eat_op("=");
        let ty = self.type_expr()?;

        Ok(TypeDecl {
            name,
            doc,
            ty,
            alias,
            generic,
            line: name_token.line,
        })
    }

    /// `[T any]` after a type name, as opposed to an array length.
    ///
    /// A parameter name is followed by a constraint (`any`, `~int`, `*T`,
    /// `[]T`) or by `,` and the next name. `[N*2]` reads as a length.
    fn is_type_params(&self) -> bool {
        if !self.is_op("[") || !matches!(self.peek_kind(1), TokenKind::Ident(_)) {
            return false;
        }
        match self.peek_kind(2) {
            TokenKind::Ident(_) => true,
            TokenKind::Op("~" | "[") => true,
            TokenKind::Op(",") => matches!(self.peek_kind(3), TokenKind::Ident(_)),
            TokenKind::Op("*") => matches!(self.peek_kind(3), TokenKind::Ident(_))
                && !matches!(self.peek_kind(4), TokenKind::Op("]")),
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Type expressions
    // ------------------------------------------------------------------

    fn type_expr(&mut self) -> ParseResult<TypeExpr> {
        match self.kind().clone() {
            TokenKind::Op("*") => {
                self.advance();
                Ok(TypeExpr::Pointer(Box::new(self.type_expr()?)))
            }
            TokenKind::Op("(") => {
                self.advance();
                let inner = self.type_expr()?;
                self.expect_op(")")?;
                Ok(inner)
            }
            TokenKind::Op("[") => self.array_or_slice(),
            TokenKind::Op("...") => {
                self.advance();
                Ok(TypeExpr::Variadic(Box::new(self.type_expr()?)))
            }
            TokenKind::Op("<-") => {
                self.advance();
                self.expect_keyword("chan")?;
                Ok(TypeExpr::Chan(Box::new(self.type_expr()?)))
            }
            TokenKind::Ident(word) => match word.as_str() {
                "map" => {
                    self.advance();
                    self.expect_op("[")?;
                    let key = self.type_expr()?;
                    self.expect_op("]")?;
                    let value = self.type_expr()?;
                    Ok(TypeExpr::Map {
                        key: Box::new(key),
                        value: Box::new(value),
                    })
                }
                "chan" => {
                    self.advance();
                    self.eat_op("<-");
                    Ok(TypeExpr::Chan(Box::new(self.type_expr()?)))
                }
                "func" => {
                    self.advance();
                    let (params, results) = self.signature()?;
                    Ok(TypeExpr::Func { params, results })
                }
                "struct" => {
                    self.advance();
                    Ok(TypeExpr::Struct(self.struct_body()?))
                }
                "interface" => {
                    self.advance();
                    Ok(TypeExpr::Interface(self.interface_body()?))
                }
                _ => self.type_name(),
            },
            other => Err(self.error(&format!("expected type, found {other:?}"))),
        }
    }

    fn type_name(&mut self) -> ParseResult<TypeExpr> {
        let first = self.expect_ident()?;
        let base = if self.is_op(".") && matches!(self.peek_kind(1), TokenKind::Ident(_)) {
            self.advance();
            let name = self.expect_ident()?;
            TypeExpr::Qualified {
                package: first,
                name,
            }
        } else {
            TypeExpr::Named(first)
        };

        if self.is_op("[") && !matches!(self.peek_kind(1), TokenKind::Op("]")) {
            self.advance();
            let mut args = vec![self.type_expr()?];
            while self.eat_op(",") {
                if self.is_op("]") {
                    break;
                }
                args.push(self.type_expr()?);
            }
            self.expect_op("]")?;
            return Ok(TypeExpr::Generic {
                base: Box::new(base),
                args,
            });
        }
        Ok(base)
    }

    fn array_or_slice(&mut self) -> ParseResult<TypeExpr> {
        self.expect_op("[")?;
        if self.eat_op("]") {
            return Ok(TypeExpr::Slice(Box::new(self.type_expr()?)));
        }

        let mut len = String::new();
        let mut depth = 0usize;
        loop {
            match self.kind().clone() {
                TokenKind::Op("]") if depth == 0 => break,
                TokenKind::Eof => return Err(self.error("unterminated array length")),
                kind => {
                    match kind {
                        TokenKind::Op("(" | "[") => depth += 1,
                        TokenKind::Op(")" | "]") => depth = depth.saturating_sub(1),
                        _ => {}
                    }
                    len.push_str(&token_text(&kind));
                    self.advance();
                }
            }
        }
        self.expect_op("]")?;
        let elem = self.type_expr()?;
        Ok(TypeExpr::Array {
            len,
            elem: Box::new(elem),
        })
    }

    fn struct_body(&mut self) -> ParseResult<Vec<StructField>> {
        self.expect_op("{")?;
        let mut fields = Vec::new();
        loop {
            self.skip_semis();
            if self.eat_op("}") {
                return Ok(fields);
            }
            fields.push(self.struct_field()?);
            self.end_of_item("}")?;
        }
    }

    fn struct_field(&mut self) -> ParseResult<StructField> {
        let doc = self.current().doc.clone();

        let names = if self.is_embedded_field() {
            Vec::new()
        } else {
            let mut names = vec![self.expect_ident()?];
            while self.eat_op(",") {
                names.push(self.expect_ident()?);
            }
            names
        };

        let ty = self.type_expr()?;
        let tag = match self.kind().clone() {
            TokenKind::Str(tag) => {
                self.advance();
                Some(tag)
            }
            _ => None,
        };

        Ok(StructField {
            names,
            ty,
            tag,
            doc,
        })
    }

    /// Embedded fields are a bare type name: `T`, `*T`, `pkg.T` or `T[A]`.
    fn is_embedded_field(&self) -> bool {
        if self.is_op("*") {
            return true;
        }
        if !matches!(self.kind(), TokenKind::Ident(_)) {
            return false;
        }
        match self.peek_kind(1) {
            TokenKind::Op(".") | TokenKind::Semi | TokenKind::Str(_) | TokenKind::Op("}") => true,
            TokenKind::Op("[") => {
                // `Name []T` and `Name [N]T` are named fields, `List[T]` is embedded.
                if matches!(self.peek_kind(2), TokenKind::Op("]")) {
                    return false;
                }
                let mut depth = 0usize;
                let mut offset = 1;
                loop {
                    match self.peek_kind(offset) {
                        TokenKind::Op("[") => depth += 1,
                        TokenKind::Op("]") => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        TokenKind::Eof => return false,
                        _ => {}
                    }
                    offset += 1;
                }
                matches!(
                    self.peek_kind(offset + 1),
                    TokenKind::Semi | TokenKind::Str(_) | TokenKind::Op("}")
                )
            }
            _ => false,
        }
    }

    fn interface_body(&mut self) -> ParseResult<Vec<InterfaceMethod>> {
        self.expect_op("{")?;
        let mut methods = Vec::new();
        loop {
            self.skip_semis();
            if self.eat_op("}") {
                return Ok(methods);
            }

            let is_method = matches!(self.kind(), TokenKind::Ident(_))
                && matches!(self.peek_kind(1), TokenKind::Op("("));
            if is_method {
                let doc = self.current().doc.clone();
                let name = self.expect_ident()?;
                let (params, results) = self.signature()?;
                methods.push(InterfaceMethod {
                    name,
                    params,
                    results,
                    doc,
                });
            } else {
                // Embedded interfaces and type-set elements.
                self.skip_interface_element()?;
            }
            self.end_of_item("}")?;
        }
    }

    fn skip_interface_element(&mut self) -> ParseResult<()> {
        loop {
            match self.kind() {
                TokenKind::Semi | TokenKind::Op("}") => return Ok(()),
                TokenKind::Eof => return Err(self.error("unterminated interface")),
                TokenKind::Op("(" | "[" | "{") => self.skip_balanced()?,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn signature(&mut self) -> ParseResult<(Vec<Param>, Vec<Param>)> {
        let params = self.param_list()?;
        let results = if self.is_op("(") {
            self.param_list()?
        } else if self.starts_type() {
            vec![Param {
                name: None,
                ty: self.type_expr()?,
            }]
        } else {
            Vec::new()
        };
        Ok((params, results))
    }

    fn starts_type(&self) -> bool {
        match self.kind() {
            TokenKind::Ident(_) => true,
            TokenKind::Op(op) => matches!(*op, "*" | "[" | "(" | "<-"),
            _ => false,
        }
    }

    /// Parameter or result list.
    ///
    /// Entries are read as `name Type` or `Type`. When any entry is named,
    /// the bare identifiers before it are names sharing its type
    /// (`a, b int64`).
    fn param_list(&mut self) -> ParseResult<Vec<Param>> {
        self.expect_op("(")?;
        let mut entries = Vec::new();
        loop {
            self.skip_semis();
            if self.eat_op(")") {
                break;
            }
            entries.push(self.param_entry()?);
            self.skip_semis();
            if !self.eat_op(",") {
                self.skip_semis();
                self.expect_op(")")?;
                break;
            }
        }

        if entries.iter().all(|p: &Param| p.name.is_none()) {
            return Ok(entries);
        }

        let mut params = Vec::with_capacity(entries.len());
        let mut pending = Vec::new();
        for entry in entries {
            match (entry.name, entry.ty) {
                (None, TypeExpr::Named(name)) => pending.push(name),
                (None, ty) => params.push(Param { name: None, ty }),
                (Some(name), ty) => {
                    for shared in pending.drain(..) {
                        params.push(Param {
                            name: Some(shared),
                            ty: ty.clone(),
                        });
                    }
                    params.push(Param {
                        name: Some(name),
                        ty,
                    });
                }
            }
        }
        if !pending.is_empty() {
            return Err(self.error("mixed named and unnamed parameters"));
        }
        Ok(params)
    }

    fn param_entry(&mut self) -> ParseResult<Param> {
        let named = matches!(self.kind(), TokenKind::Ident(_))
            && match self.peek_kind(1) {
                TokenKind::Ident(_) => true,
                TokenKind::Op(op) => match *op {
                    "*" | "(" | "..." | "<-" => true,
                    "[" => matches!(self.peek_kind(2), TokenKind::Op("]") | TokenKind::Number(_)),
                    _ => false,
                },
                _ => false,
            };

        if named {
            let name = self.expect_ident()?;
            let ty = self.type_expr()?;
            Ok(Param {
                name: Some(name),
                ty,
            })
        } else {
            Ok(Param {
                name: None,
                ty: self.type_expr()?,
            })
        }
    }
}

fn token_text(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Ident(s) | TokenKind::Number(s) | TokenKind::Char(s) => s.clone(),
        TokenKind::Str(s) => format!("{s:?}"),
        TokenKind::Op(op) => (*op).to_string(),
        TokenKind::Semi => ";".to_string(),
        TokenKind::Eof => String::new(),
    }
}
