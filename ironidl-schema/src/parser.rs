//! Recursive-descent parser for IDL schemas and textual values.
//!
//! Two grammars share one tokenizer: the schema grammar (type definitions
//! and a service declaration) and the value grammar used for fixtures and
//! tests. Both are all-or-nothing; the first error aborts the parse.

use std::collections::BTreeSet;

use ironidl_core::types::KEYWORDS;
use ironidl_core::{FuncMode, FuncRef, Label, Principal, Type, TypeTable, Value, ValueField};

use crate::error::{Error, GrammarError};
use crate::ir::{IdlProg, resolve_type};
use crate::lexer::{Token, TokenKind, tokenize};
use crate::types::{
    ActorExpr, ArgExpr, Definition, FieldExpr, FuncExpr, MethodExpr, Program, TypeExpr,
};

/// Parses and resolves an IDL schema.
///
/// # Arguments
/// * `source` - Schema source text
///
/// # Returns
/// The resolved program with its type table and service.
///
/// # Errors
/// Returns [`Error::Grammar`] for syntax errors and [`Error::Schema`] for
/// unknown names, duplicate definitions, imports and invalid type tables.
pub fn parse_idl(source: &str) -> Result<IdlProg, Error> {
    let program = parse_program(source)?;
    IdlProg::from_ast(&program)
}

/// Parses schema source into its syntax tree without resolving names.
///
/// # Errors
/// Returns [`Error::Grammar`] for syntax errors.
pub fn parse_program(source: &str) -> Result<Program, Error> {
    let table = TypeTable::new();
    let mut parser = Parser::new(source, &table)?;
    let program = parser.program()?;
    Ok(program)
}

/// Parses a single type expression such as `opt record { a : nat }`.
///
/// # Errors
/// Returns [`Error::Grammar`] for syntax errors.
pub fn parse_type_expr(source: &str) -> Result<TypeExpr, Error> {
    let table = TypeTable::new();
    let mut parser = Parser::new(source, &table)?;
    let ty = parser.data_type()?;
    parser.expect(&TokenKind::Eof, "type")?;
    Ok(ty)
}

/// Parses an argument list such as `(42, "text", opt true)`.
///
/// # Errors
/// Returns [`Error`] for syntax errors and for annotations naming types.
pub fn parse_values(source: &str) -> Result<Vec<Value>, Error> {
    parse_values_with(source, &TypeTable::new())
}

/// Parses an argument list, resolving annotation type names in `table`.
///
/// # Errors
/// Returns [`Error::Grammar`] for syntax errors, [`Error::Schema`] for
/// unknown type names and [`Error::Encoding`] for literals that do not fit
/// their annotation.
pub fn parse_values_with(source: &str, table: &TypeTable) -> Result<Vec<Value>, Error> {
    let mut parser = Parser::new(source, table)?;
    let values = parser.sequence(
        "arguments",
        &TokenKind::LParen,
        &TokenKind::Comma,
        &TokenKind::RParen,
        Parser::value,
    )?;
    parser.expect(&TokenKind::Eof, "arguments")?;
    Ok(values)
}

/// Parses a single value such as `record { id = 1; name = "a" }`.
///
/// # Errors
/// Returns [`Error`] for syntax errors and for annotations naming types.
pub fn parse_value(source: &str) -> Result<Value, Error> {
    let table = TypeTable::new();
    let mut parser = Parser::new(source, &table)?;
    let value = parser.value()?;
    parser.expect(&TokenKind::Eof, "value")?;
    Ok(value)
}

struct Parser<'src, 't> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    expected: BTreeSet<String>,
    table: &'t TypeTable,
}

impl<'src, 't> Parser<'src, 't> {
    fn new(source: &'src str, table: &'t TypeTable) -> Result<Self, Error> {
        Ok(Self {
            source,
            tokens: tokenize(source)?,
            pos: 0,
            expected: BTreeSet::new(),
            table,
        })
    }

    // -- Schema grammar --

    fn program(&mut self) -> Result<Program, Error> {
        let mut definitions = Vec::new();
        loop {
            let offset = self.offset();
            if self.eat_keyword("type") {
                let name = self.ident("definition")?;
                self.expect(&TokenKind::Eq, "definition")?;
                let ty = self.data_type()?;
                definitions.push(Definition::Type { name, ty, offset });
            } else if self.eat_keyword("import") {
                let path = self.text("import")?;
                definitions.push(Definition::Import { path, offset });
            } else {
                break;
            }
            self.expect(&TokenKind::Semi, "definition")?;
        }

        let actor = if self.eat_keyword("service") {
            Some(self.actor()?)
        } else {
            None
        };
        self.expect(&TokenKind::Eof, "program")?;
        Ok(Program { definitions, actor })
    }

    fn actor(&mut self) -> Result<ActorExpr, Error> {
        let name = if self.check_ident() {
            Some(self.ident("service")?)
        } else {
            None
        };
        self.expect(&TokenKind::Colon, "service")?;
        let init_args = if self.check(&TokenKind::LParen) {
            let args = self.tuple()?;
            self.expect(&TokenKind::Arrow, "service")?;
            Some(args)
        } else {
            None
        };
        let ty = if self.check(&TokenKind::LBrace) {
            TypeExpr::Service(self.actor_body()?)
        } else {
            TypeExpr::Named(self.ident("service")?)
        };
        self.eat(&TokenKind::Semi);
        Ok(ActorExpr {
            name,
            init_args,
            ty,
        })
    }

    fn actor_body(&mut self) -> Result<Vec<MethodExpr>, Error> {
        self.sequence(
            "service",
            &TokenKind::LBrace,
            &TokenKind::Semi,
            &TokenKind::RBrace,
            |parser| {
                let name = parser.name("method")?;
                parser.expect(&TokenKind::Colon, "method")?;
                let ty = if parser.check(&TokenKind::LParen) {
                    TypeExpr::Func(parser.func_sig()?)
                } else {
                    TypeExpr::Named(parser.ident("method")?)
                };
                Ok(MethodExpr { name, ty })
            },
        )
    }

    fn func_sig(&mut self) -> Result<FuncExpr, Error> {
        let args = self.tuple()?;
        self.expect(&TokenKind::Arrow, "function")?;
        let rets = self.tuple()?;
        let mut modes = Vec::new();
        loop {
            let mode = if self.eat_keyword("query") {
                FuncMode::Query
            } else if self.eat_keyword("oneway") {
                FuncMode::Oneway
            } else if self.eat_keyword("composite_query") {
                FuncMode::CompositeQuery
            } else {
                break;
            };
            modes.push(mode);
        }
        Ok(FuncExpr { args, rets, modes })
    }

    fn tuple(&mut self) -> Result<Vec<ArgExpr>, Error> {
        self.sequence(
            "argument list",
            &TokenKind::LParen,
            &TokenKind::Comma,
            &TokenKind::RParen,
            |parser| {
                let named =
                    parser.is_label_start(false) && parser.peek_at(1) == &TokenKind::Colon;
                let name = if named {
                    let name = parser.name("argument")?;
                    parser.expect(&TokenKind::Colon, "argument")?;
                    Some(name)
                } else {
                    None
                };
                let ty = parser.data_type()?;
                Ok(ArgExpr { name, ty })
            },
        )
    }

    fn data_type(&mut self) -> Result<TypeExpr, Error> {
        let word = match self.peek() {
            TokenKind::Ident(word) => word.clone(),
            _ => {
                self.expecting("type");
                return Err(self.error("type"));
            }
        };
        let ty = match word.as_str() {
            "opt" => {
                self.advance();
                TypeExpr::Opt(Box::new(self.data_type()?))
            }
            "vec" => {
                self.advance();
                TypeExpr::Vec(Box::new(self.data_type()?))
            }
            "blob" => {
                self.advance();
                TypeExpr::Vec(Box::new(TypeExpr::Primitive(Type::Nat8)))
            }
            "record" => {
                self.advance();
                TypeExpr::Record(self.fields(true)?)
            }
            "variant" => {
                self.advance();
                TypeExpr::Variant(self.fields(false)?)
            }
            "func" => {
                self.advance();
                TypeExpr::Func(self.func_sig()?)
            }
            "service" => {
                self.advance();
                TypeExpr::Service(self.actor_body()?)
            }
            other => {
                if let Some(primitive) = Type::from_keyword(other) {
                    self.advance();
                    TypeExpr::Primitive(primitive)
                } else if KEYWORDS.contains(&other) {
                    self.expecting("type");
                    return Err(self.error("type"));
                } else {
                    self.advance();
                    TypeExpr::Named(word)
                }
            }
        };
        Ok(ty)
    }

    fn fields(&mut self, is_record: bool) -> Result<Vec<FieldExpr>, Error> {
        let rule = if is_record { "record" } else { "variant" };
        let mut next_id = 0u32;
        self.sequence(
            rule,
            &TokenKind::LBrace,
            &TokenKind::Semi,
            &TokenKind::RBrace,
            |parser| {
                let labelled =
                    parser.is_label_start(true) && parser.peek_at(1) == &TokenKind::Colon;
                let field = if labelled {
                    let label = parser.label(rule)?;
                    parser.expect(&TokenKind::Colon, rule)?;
                    FieldExpr {
                        label,
                        ty: parser.data_type()?,
                    }
                } else if is_record {
                    FieldExpr {
                        label: Label::Unnamed(next_id),
                        ty: parser.data_type()?,
                    }
                } else {
                    FieldExpr {
                        label: parser.label(rule)?,
                        ty: TypeExpr::Primitive(Type::Null),
                    }
                };
                next_id = field.label.id().wrapping_add(1);
                Ok(field)
            },
        )
    }

    // -- Value grammar --

    fn value(&mut self) -> Result<Value, Error> {
        let value = match self.peek().clone() {
            TokenKind::Nat(n) => {
                self.advance();
                Value::Nat(n)
            }
            TokenKind::Int(i) => {
                self.advance();
                Value::Int(i)
            }
            TokenKind::Float(x) => {
                self.advance();
                Value::Float64(x)
            }
            TokenKind::Text(_) => Value::Text(self.text("value")?),
            TokenKind::LParen => {
                self.advance();
                let mut value = self.value()?;
                if self.eat(&TokenKind::Colon) {
                    let expr = self.data_type()?;
                    let ty = resolve_type(&expr, self.table)?;
                    value = value.annotate(self.table, &ty)?;
                }
                self.expect(&TokenKind::RParen, "value")?;
                value
            }
            TokenKind::Ident(word) => self.keyword_value(&word)?,
            _ => {
                self.expecting("value");
                return Err(self.error("value"));
            }
        };
        Ok(value)
    }

    fn keyword_value(&mut self, word: &str) -> Result<Value, Error> {
        let value = match word {
            "null" => {
                self.advance();
                Value::Null
            }
            "true" | "false" => {
                self.advance();
                Value::Bool(word == "true")
            }
            "nan" => {
                self.advance();
                Value::Float64(f64::NAN)
            }
            "inf" => {
                self.advance();
                Value::Float64(f64::INFINITY)
            }
            "opt" => {
                self.advance();
                Value::some(self.value()?)
            }
            "vec" => {
                self.advance();
                Value::Vec(self.sequence(
                    "vec",
                    &TokenKind::LBrace,
                    &TokenKind::Semi,
                    &TokenKind::RBrace,
                    Self::value,
                )?)
            }
            "blob" => {
                self.advance();
                Value::Blob(self.bytes("blob")?)
            }
            "record" => {
                self.advance();
                self.record_value()?
            }
            "variant" => {
                self.advance();
                self.expect(&TokenKind::LBrace, "variant")?;
                let field = self.field_value(false, 0)?;
                self.eat(&TokenKind::Semi);
                self.expect(&TokenKind::RBrace, "variant")?;
                Value::Variant(Box::new(field))
            }
            "principal" => {
                self.advance();
                Value::Principal(self.principal()?)
            }
            "service" => {
                self.advance();
                Value::Service(self.principal()?)
            }
            "func" => {
                self.advance();
                let principal = self.principal()?;
                self.expect(&TokenKind::Dot, "func")?;
                let method = self.name("func")?;
                Value::Func(FuncRef::new(principal, method))
            }
            _ => {
                self.expecting("value");
                return Err(self.error("value"));
            }
        };
        Ok(value)
    }

    fn record_value(&mut self) -> Result<Value, Error> {
        let mut next_id = 0u32;
        let fields = self.sequence(
            "record",
            &TokenKind::LBrace,
            &TokenKind::Semi,
            &TokenKind::RBrace,
            |parser| {
                let field = parser.field_value(true, next_id)?;
                next_id = field.label.id().wrapping_add(1);
                Ok(field)
            },
        )?;
        Ok(Value::Record(fields))
    }

    fn field_value(&mut self, is_record: bool, next_id: u32) -> Result<ValueField, Error> {
        let rule = if is_record { "record" } else { "variant" };
        if self.is_label_start(true) && self.peek_at(1) == &TokenKind::Eq {
            let label = self.label(rule)?;
            self.expect(&TokenKind::Eq, rule)?;
            let value = self.value()?;
            Ok(ValueField { label, value })
        } else if is_record {
            Ok(ValueField {
                label: Label::Unnamed(next_id),
                value: self.value()?,
            })
        } else {
            Ok(ValueField {
                label: self.label(rule)?,
                value: Value::Null,
            })
        }
    }

    fn principal(&mut self) -> Result<Principal, Error> {
        let text = self.text("principal")?;
        Ok(Principal::from_text(&text)?)
    }

    // -- Terminals --

    fn ident(&mut self, rule: &'static str) -> Result<String, Error> {
        if self.check_ident() {
            if let TokenKind::Ident(name) = self.advance().kind {
                return Ok(name);
            }
        }
        Err(self.error(rule))
    }

    fn name(&mut self, rule: &'static str) -> Result<String, Error> {
        if matches!(self.peek(), TokenKind::Text(_)) {
            self.text(rule)
        } else {
            self.expecting("text literal");
            self.ident(rule)
        }
    }

    fn label(&mut self, rule: &'static str) -> Result<Label, Error> {
        if let TokenKind::Nat(n) = *self.peek() {
            let Ok(id) = u32::try_from(n) else {
                self.expecting("field id below 2^32");
                return Err(self.error(rule));
            };
            self.advance();
            return Ok(Label::Id(id));
        }
        self.expecting("numeral");
        Ok(Label::Named(self.name(rule)?))
    }

    fn text(&mut self, rule: &'static str) -> Result<String, Error> {
        let start = self.offset();
        let bytes = self.bytes(rule)?;
        String::from_utf8(bytes).map_err(|_| {
            GrammarError::at(
                self.source,
                start,
                rule,
                "text literal with invalid UTF-8",
                Vec::new(),
            )
            .into()
        })
    }

    fn bytes(&mut self, rule: &'static str) -> Result<Vec<u8>, Error> {
        if matches!(self.peek(), TokenKind::Text(_)) {
            if let TokenKind::Text(bytes) = self.advance().kind {
                return Ok(bytes);
            }
        }
        self.expecting("text literal");
        Err(self.error(rule))
    }

    /// Parses `open (item sep)* close`, allowing a trailing separator.
    fn sequence<T>(
        &mut self,
        rule: &'static str,
        open: &TokenKind,
        separator: &TokenKind,
        close: &TokenKind,
        mut item: impl FnMut(&mut Self) -> Result<T, Error>,
    ) -> Result<Vec<T>, Error> {
        self.expect(open, rule)?;
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Ok(items);
            }
            items.push(item(self)?);
            if !self.eat(separator) {
                self.expect(close, rule)?;
                return Ok(items);
            }
        }
    }

    // -- Helpers --

    fn is_label_start(&self, allow_numeral: bool) -> bool {
        match self.peek() {
            TokenKind::Nat(_) => allow_numeral,
            TokenKind::Text(_) => true,
            TokenKind::Ident(name) => !KEYWORDS.contains(&name.as_str()),
            _ => false,
        }
    }

    fn peek(&self) -> &TokenKind {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + ahead)
            .or_else(|| self.tokens.last())
            .map_or(&TokenKind::Eof, |token| &token.kind)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.source.len(), |token| token.start)
    }

    fn advance(&mut self) -> Token {
        self.expected.clear();
        let token = self.tokens.get(self.pos).cloned().unwrap_or(Token {
            kind: TokenKind::Eof,
            start: self.source.len(),
            end: self.source.len(),
        });
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn check(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            true
        } else {
            self.expected.insert(kind.to_string());
            false
        }
    }

    fn check_ident(&mut self) -> bool {
        if matches!(self.peek(), TokenKind::Ident(name) if !KEYWORDS.contains(&name.as_str())) {
            true
        } else {
            self.expecting("identifier");
            false
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        let found = self.check(kind);
        if found {
            self.advance();
        }
        found
    }

    fn eat_keyword(&mut self, word: &str) -> bool {
        if self.peek().is_ident(word) {
            self.advance();
            true
        } else {
            self.expected.insert(format!("`{word}`"));
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, rule: &'static str) -> Result<Token, Error> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(rule))
        }
    }

    fn expecting(&mut self, what: &str) {
        self.expected.insert(what.to_string());
    }

    fn error(&self, rule: &'static str) -> Error {
        let found = match self.peek() {
            TokenKind::Text(_) => "text literal".to_string(),
            kind => kind.to_string(),
        };
        GrammarError::at(
            self.source,
            self.offset(),
            rule,
            found,
            self.expected.iter().cloned().collect(),
        )
        .into()
    }
}
