//! Parser for Rain.
//!
//! Recursive descent over the token stream with two tokens of lookahead.
//! Macro invocations (`@name ...`) are expanded while parsing: the parser
//! runs the macro's declared argument parsers on its own state and splices
//! the node returned by the [`MacroHost`].
//!
//! ```text
//! program  :: (stmt NEWLINE)* END
//! block    :: INDENT (stmt NEWLINE)+ DEDENT
//! compound :: macro_exp | 'func' params ('->' binexpr | block) | binexpr
//! binexpr  :: unexpr (OPERATOR unexpr)*
//! unexpr   :: ('-' | '!') simple | simple
//! simple   :: 'func' params '->' binexpr | 'foreign' (NAME | STRING) params
//!           | array | dict | primary
//! primary  :: prefix ('?'? args | ':' NAME '?'? args | '.' NAME | '[' binexpr ']')*
//! prefix   :: '(' binexpr ')' | NAME | INT | FLOAT | BOOL | STRING | 'null' | 'table'
//! ```

use rain_foundation::{Error, ErrorKind, Result, Span};
use tracing::debug;

use crate::ast::{
    BinaryOp, Binding, Block, Expr, ExprKind, MacroDef, ParserKind, Program, Stmt, StmtKind,
    UnaryOp,
};
use crate::lexer::{Lexer, syntax_error};
use crate::macro_host::{MacroArg, MacroHost, NoMacros, Node};
use crate::token::{Keyword, Operator, Symbol, Token, TokenKind};

/// Parser for Rain source code.
pub struct Parser<'src, 'h> {
    /// Source text (for error messages).
    source: &'src str,
    /// All tokens, ending with [`TokenKind::End`].
    tokens: Vec<Token>,
    /// Index of the current token.
    pos: usize,
    /// Span of the most recently consumed token.
    last: Span,
    /// Macro definitions and expansion.
    host: &'h mut dyn MacroHost,
}

impl<'src, 'h> Parser<'src, 'h> {
    /// Creates a parser, tokenizing the whole source up front.
    ///
    /// # Errors
    /// Returns an error if the source cannot be tokenized.
    pub fn new(source: &'src str, host: &'h mut dyn MacroHost) -> Result<Self> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Self {
            source,
            tokens,
            pos: 0,
            last: Span::file_start(),
            host,
        })
    }

    /// Parses a whole source file.
    ///
    /// # Errors
    /// Returns an error if the source cannot be parsed or a macro fails.
    pub fn parse_program(&mut self) -> Result<Program> {
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::End) {
            stmts.push(self.stmt()?);
            self.expect(&TokenKind::Newline)?;
        }
        Ok(Program { stmts })
    }

    /// Runs one macro argument parser on the current position.
    ///
    /// # Errors
    /// Returns an error if the upcoming tokens don't match the parser kind.
    pub fn parse_arg(&mut self, kind: ParserKind) -> Result<MacroArg> {
        Ok(match kind {
            ParserKind::Compound => MacroArg::Expr(self.compound()?),
            ParserKind::Expr => MacroArg::Expr(self.binexpr()?),
            ParserKind::Args => MacroArg::Exprs(self.fnargs()?),
            ParserKind::Params => MacroArg::Params(self.fnparams(true)?),
            ParserKind::Block => MacroArg::Block(self.block()?),
            ParserKind::ArgBlock => MacroArg::Exprs(self.argblock()?),
            ParserKind::Stmt => MacroArg::Stmt(self.stmt()?),
            ParserKind::Name => MacroArg::Str(self.expect_name()?),
            ParserKind::NameStr => MacroArg::Str(self.expect_name_or_string()?),
            ParserKind::String => MacroArg::Str(self.expect_string()?),
            ParserKind::Int => match self.current().kind {
                TokenKind::Int(value) => {
                    self.advance();
                    MacroArg::Int(value)
                }
                _ => return Err(self.unexpected("integer")),
            },
            ParserKind::Float => match self.current().kind {
                TokenKind::Float(value) => {
                    self.advance();
                    MacroArg::Float(value)
                }
                _ => return Err(self.unexpected("float")),
            },
            ParserKind::Bool => match self.current().kind {
                TokenKind::Bool(value) => {
                    self.advance();
                    MacroArg::Bool(value)
                }
                _ => return Err(self.unexpected("boolean")),
            },
        })
    }

    // ===== Statements =====

    fn block(&mut self) -> Result<Block> {
        let start = self.current().span;
        self.expect(&TokenKind::Indent)?;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::Dedent) {
            stmts.push(self.stmt()?);
            self.expect(&TokenKind::Newline)?;
        }
        self.expect(&TokenKind::Dedent)?;
        Ok(Block::new(stmts, start.through(self.last)))
    }

    fn stmt(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        let kind = match self.current().kind.clone() {
            TokenKind::Keyword(keyword) => match keyword {
                Keyword::Let => {
                    self.advance();
                    self.binding_assign(Binding::Let)?
                }
                Keyword::Export => {
                    self.advance();
                    self.export()?
                }
                Keyword::Import => {
                    self.advance();
                    self.import(start)?
                }
                Keyword::Macro => {
                    self.advance();
                    StmtKind::Macro(self.macro_def()?)
                }
                Keyword::Link => {
                    self.advance();
                    StmtKind::Link(self.expect_string()?)
                }
                Keyword::Library => {
                    self.advance();
                    StmtKind::Library(self.expect_string()?)
                }
                Keyword::If => return self.if_stmt(),
                Keyword::Catch => {
                    self.advance();
                    let name = self.expect_name()?;
                    let body = self.block()?;
                    StmtKind::Catch { name, body }
                }
                Keyword::For => {
                    self.advance();
                    self.for_stmt()?
                }
                Keyword::With => {
                    self.advance();
                    let func = self.binexpr()?;
                    let params = if self.eat_keyword(Keyword::As) {
                        self.fnparams(false)?
                    } else {
                        Vec::new()
                    };
                    let body = self.block()?;
                    StmtKind::With { func, params, body }
                }
                Keyword::While => {
                    self.advance();
                    let pred = self.binexpr()?;
                    let body = self.block()?;
                    StmtKind::While { pred, body }
                }
                Keyword::Until => {
                    self.advance();
                    let pred = self.binexpr()?;
                    let body = self.block()?;
                    StmtKind::Until { pred, body }
                }
                Keyword::Loop => {
                    self.advance();
                    StmtKind::Loop {
                        body: self.block()?,
                    }
                }
                Keyword::Pass => {
                    self.advance();
                    StmtKind::Pass
                }
                Keyword::Break => {
                    self.advance();
                    StmtKind::Break(self.loop_condition()?)
                }
                Keyword::Continue => {
                    self.advance();
                    StmtKind::Continue(self.loop_condition()?)
                }
                Keyword::Return => {
                    self.advance();
                    if self.check(&TokenKind::Newline) {
                        StmtKind::Return(None)
                    } else {
                        StmtKind::Return(Some(self.compound()?))
                    }
                }
                Keyword::Save => {
                    self.advance();
                    StmtKind::Save(self.compound()?)
                }
                _ => self.assign_or_call()?,
            },
            TokenKind::Symbol(Symbol::At) => {
                return Ok(match self.macro_exp()? {
                    Node::Stmt(stmt) => stmt,
                    Node::Expr(expr) => {
                        let span = expr.span;
                        Stmt::new(StmtKind::Expr(expr), span)
                    }
                });
            }
            _ => self.assign_or_call()?,
        };
        Ok(Stmt::new(kind, start.through(self.last)))
    }

    fn binding_assign(&mut self, binding: Binding) -> Result<StmtKind> {
        let span = self.current().span;
        let name = self.expect_name()?;
        self.expect_symbol(Symbol::Assign)?;
        let value = self.compound()?;
        Ok(StmtKind::Assign {
            target: Expr::new(ExprKind::Name(name), span),
            value,
            binding,
        })
    }

    fn export(&mut self) -> Result<StmtKind> {
        if matches!(self.peek().kind, TokenKind::Keyword(Keyword::As)) {
            let name = self.expect_name()?;
            self.expect_keyword(Keyword::As)?;
            self.expect_keyword(Keyword::Foreign)?;
            let symbol = self.expect_name_or_string()?;
            return Ok(StmtKind::ExportForeign { name, symbol });
        }
        self.binding_assign(Binding::Export)
    }

    fn import(&mut self, start: Span) -> Result<StmtKind> {
        let module = self.expect_name_or_string()?;
        let alias = if self.eat_keyword(Keyword::As) {
            Some(self.expect_name()?)
        } else {
            None
        };
        debug!(target: "rain::parser", module = %module, alias = ?alias, "import");
        self.host
            .import(&module, alias.as_deref(), start.through(self.last))?;
        Ok(StmtKind::Import { module, alias })
    }

    fn macro_def(&mut self) -> Result<MacroDef> {
        let span = self.current().span;
        let name = self.expect_name()?;
        if self.host.contains(&name) {
            return Err(Error::new(ErrorKind::MacroRedefinition(name)).at(span));
        }

        let mut parsers = Vec::new();
        for kind in self.fnparams(true)? {
            let parser = ParserKind::from_name(&kind)
                .ok_or_else(|| Error::new(ErrorKind::UnknownParserKind(kind)).at(span))?;
            parsers.push(parser);
        }
        self.expect_keyword(Keyword::As)?;
        let params = self.fnparams(true)?;
        if parsers.len() != params.len() {
            return Err(Error::new(ErrorKind::MacroArity {
                name,
                parsers: parsers.len(),
                params: params.len(),
            })
            .at(span));
        }
        let body = self.block()?;
        debug!(
            target: "rain::parser",
            macro_name = %name,
            line = span.line,
            parsers = parsers.len(),
            "macro defined"
        );

        let def = MacroDef {
            name,
            parsers,
            params,
            body,
        };
        self.host.define(&def, span)?;
        Ok(def)
    }

    fn if_stmt(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        self.expect_keyword(Keyword::If)?;
        let pred = self.binexpr()?;
        let body = self.block()?;

        let mut els = None;
        if self.check(&TokenKind::Newline)
            && matches!(self.peek().kind, TokenKind::Keyword(Keyword::Else))
        {
            self.advance();
            self.advance();
            if matches!(self.current().kind, TokenKind::Keyword(Keyword::If)) {
                let nested = self.if_stmt()?;
                let span = nested.span;
                els = Some(Block::new(vec![nested], span));
            } else {
                els = Some(self.block()?);
            }
        }

        Ok(Stmt::new(StmtKind::If { pred, body, els }, start.through(self.last)))
    }

    fn for_stmt(&mut self) -> Result<StmtKind> {
        let mut names = vec![self.expect_name()?];
        while self.eat_symbol(Symbol::Comma) {
            names.push(self.expect_name()?);
        }
        self.expect_keyword(Keyword::In)?;
        let mut gens = vec![self.binexpr()?];
        while self.eat_symbol(Symbol::Comma) {
            gens.push(self.binexpr()?);
        }
        let body = self.block()?;
        Ok(StmtKind::For { names, gens, body })
    }

    fn loop_condition(&mut self) -> Result<Option<Expr>> {
        if self.eat_keyword(Keyword::If) {
            Ok(Some(self.binexpr()?))
        } else {
            Ok(None)
        }
    }

    fn assign_or_call(&mut self) -> Result<StmtKind> {
        let target = self.primary()?;
        if self.eat_symbol(Symbol::Assign) {
            if !matches!(target.kind, ExprKind::Name(_) | ExprKind::Index { .. }) {
                return Err(self.error_at(target.span, "can't assign to this expression"));
            }
            let value = self.compound()?;
            return Ok(StmtKind::Assign {
                target,
                value,
                binding: Binding::Assign,
            });
        }
        match target.kind {
            ExprKind::Call { .. } | ExprKind::Method { .. } => Ok(StmtKind::Expr(target)),
            _ => Err(self.unexpected("'=' or a call")),
        }
    }

    // ===== Macro invocation =====

    fn macro_exp(&mut self) -> Result<Node> {
        self.expect_symbol(Symbol::At)?;
        let span = self.current().span;
        let mut name = self.expect_name()?;
        while self.eat_symbol(Symbol::Dot) {
            name.push('.');
            name.push_str(&self.expect_name()?);
        }
        let span = span.through(self.last);

        let parsers = self
            .host
            .parsers(&name)
            .ok_or_else(|| Error::new(ErrorKind::UnknownMacro(name.clone())).at(span))?;
        let mut args = Vec::with_capacity(parsers.len());
        for kind in parsers {
            args.push(self.parse_arg(kind)?);
        }
        debug!(target: "rain::parser", macro_name = %name, line = span.line, "invoking macro");
        self.host.invoke(&name, args, span)
    }

    // ===== Expressions =====

    fn compound(&mut self) -> Result<Expr> {
        if self.check(&TokenKind::Symbol(Symbol::At)) {
            let start = self.current().span;
            return match self.macro_exp()? {
                Node::Expr(expr) => Ok(expr),
                Node::Stmt(_) => Err(self.error_at(
                    start,
                    "macro expanded to a statement where an expression is expected",
                )),
            };
        }

        if matches!(self.current().kind, TokenKind::Keyword(Keyword::Func)) {
            let start = self.current().span;
            self.advance();
            let params = self.fnparams(true)?;
            let body = if self.eat_operator(Operator::Arrow) {
                self.arrow_body()?
            } else {
                self.block()?
            };
            return Ok(Expr::new(ExprKind::Func { params, body }, start.through(self.last)));
        }

        self.binexpr()
    }

    fn binexpr(&mut self) -> Result<Expr> {
        self.binexpr_above(0)
    }

    /// Precedence climbing; operators of equal strength associate left.
    fn binexpr_above(&mut self, min: u8) -> Result<Expr> {
        let mut lhs = self.unexpr()?;
        while let Some(op) = self.binary_op() {
            if op.precedence() < min {
                break;
            }
            self.advance();
            let rhs = self.binexpr_above(op.precedence() + 1)?;
            let span = lhs.span.through(rhs.span);
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Ok(lhs)
    }

    fn binary_op(&self) -> Option<BinaryOp> {
        match self.current().kind {
            TokenKind::Operator(op) => BinaryOp::from_operator(op),
            _ => None,
        }
    }

    fn unexpr(&mut self) -> Result<Expr> {
        let start = self.current().span;
        let op = match self.current().kind {
            TokenKind::Operator(Operator::Minus) => UnaryOp::Neg,
            TokenKind::Operator(Operator::Bang) => UnaryOp::Not,
            _ => return self.simple(),
        };
        self.advance();
        let operand = self.simple()?;
        let span = start.through(self.last);

        // negative numeric literals are literals, so module scope can use them
        let kind = match (op, operand.kind) {
            (UnaryOp::Neg, ExprKind::Int(value)) => ExprKind::Int(value.wrapping_neg()),
            (UnaryOp::Neg, ExprKind::Float(value)) => ExprKind::Float(-value),
            (op, kind) => ExprKind::Unary {
                op,
                operand: Box::new(Expr::new(kind, operand.span)),
            },
        };
        Ok(Expr::new(kind, span))
    }

    fn simple(&mut self) -> Result<Expr> {
        let start = self.current().span;
        match self.current().kind {
            TokenKind::Keyword(Keyword::Func) => {
                self.advance();
                let params = self.fnparams(true)?;
                self.expect_operator(Operator::Arrow)?;
                let body = self.arrow_body()?;
                Ok(Expr::new(ExprKind::Func { params, body }, start.through(self.last)))
            }
            TokenKind::Keyword(Keyword::Foreign) => {
                self.advance();
                let name = self.expect_name_or_string()?;
                let params = self.fnparams(true)?;
                Ok(Expr::new(ExprKind::Foreign { name, params }, start.through(self.last)))
            }
            TokenKind::Symbol(Symbol::LBracket) => {
                let items = self.array()?;
                Ok(Expr::new(ExprKind::Array(items), start.through(self.last)))
            }
            TokenKind::Symbol(Symbol::LBrace) => {
                let items = self.dict()?;
                Ok(Expr::new(ExprKind::Dict(items), start.through(self.last)))
            }
            _ => self.primary(),
        }
    }

    fn arrow_body(&mut self) -> Result<Block> {
        let value = self.binexpr()?;
        let span = value.span;
        Ok(Block::new(
            vec![Stmt::new(StmtKind::Return(Some(value)), span)],
            span,
        ))
    }

    fn primary(&mut self) -> Result<Expr> {
        let mut node = self.prefix()?;
        loop {
            let start = node.span;
            if self.eat_symbol(Symbol::Question) {
                let args = self.fnargs()?;
                node = Expr::new(
                    ExprKind::Call {
                        func: Box::new(node),
                        args,
                        catch: true,
                    },
                    start.through(self.last),
                );
            } else if self.check(&TokenKind::Symbol(Symbol::LParen)) {
                let args = self.fnargs()?;
                node = Expr::new(
                    ExprKind::Call {
                        func: Box::new(node),
                        args,
                        catch: false,
                    },
                    start.through(self.last),
                );
            } else if self.eat_symbol(Symbol::Colon) {
                let name = self.expect_name()?;
                let catch = self.eat_symbol(Symbol::Question);
                let args = self.fnargs()?;
                node = Expr::new(
                    ExprKind::Method {
                        recv: Box::new(node),
                        name,
                        args,
                        catch,
                    },
                    start.through(self.last),
                );
            } else if self.eat_symbol(Symbol::Dot) {
                let key_span = self.current().span;
                let name = self.expect_name()?;
                node = Expr::new(
                    ExprKind::Index {
                        lhs: Box::new(node),
                        key: Box::new(Expr::new(ExprKind::Str(name), key_span)),
                    },
                    start.through(self.last),
                );
            } else if self.eat_symbol(Symbol::LBracket) {
                let key = self.binexpr()?;
                self.expect_symbol(Symbol::RBracket)?;
                node = Expr::new(
                    ExprKind::Index {
                        lhs: Box::new(node),
                        key: Box::new(key),
                    },
                    start.through(self.last),
                );
            } else {
                return Ok(node);
            }
        }
    }

    fn prefix(&mut self) -> Result<Expr> {
        let token = self.current().clone();
        let kind = match token.kind {
            TokenKind::Symbol(Symbol::LParen) => {
                self.advance();
                let inner = self.binexpr()?;
                self.expect_symbol(Symbol::RParen)?;
                return Ok(inner);
            }
            TokenKind::Int(value) => ExprKind::Int(value),
            TokenKind::Float(value) => ExprKind::Float(value),
            TokenKind::Bool(value) => ExprKind::Bool(value),
            TokenKind::Str(value) => ExprKind::Str(value),
            TokenKind::Null => ExprKind::Null,
            TokenKind::Table => ExprKind::Table,
            TokenKind::Name(name) => ExprKind::Name(name),
            _ => return Err(self.unexpected("an expression")),
        };
        self.advance();
        Ok(Expr::new(kind, token.span))
    }

    fn array(&mut self) -> Result<Vec<Expr>> {
        self.expect_symbol(Symbol::LBracket)?;
        let mut items = Vec::new();
        while !self.check(&TokenKind::Symbol(Symbol::RBracket)) {
            items.push(self.binexpr()?);
            if !self.eat_symbol(Symbol::Comma) {
                break;
            }
        }
        self.expect_symbol(Symbol::RBracket)?;
        Ok(items)
    }

    fn dict(&mut self) -> Result<Vec<(Expr, Expr)>> {
        self.expect_symbol(Symbol::LBrace)?;
        let mut items = Vec::new();
        while !self.check(&TokenKind::Symbol(Symbol::RBrace)) {
            items.push(self.dict_item()?);
            if !self.eat_symbol(Symbol::Comma) {
                break;
            }
        }
        self.expect_symbol(Symbol::RBrace)?;
        Ok(items)
    }

    fn dict_item(&mut self) -> Result<(Expr, Expr)> {
        let span = self.current().span;
        let key = if let TokenKind::Name(name) = &self.current().kind {
            let key = Expr::new(ExprKind::Str(name.clone()), span);
            self.advance();
            key
        } else {
            self.expect_symbol(Symbol::LBracket)?;
            let key = self.binexpr()?;
            self.expect_symbol(Symbol::RBracket)?;
            key
        };
        self.expect_symbol(Symbol::Assign)?;
        let value = self.binexpr()?;
        Ok((key, value))
    }

    fn fnargs(&mut self) -> Result<Vec<Expr>> {
        self.expect_symbol(Symbol::LParen)?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::Symbol(Symbol::RParen)) {
            args.push(self.binexpr()?);
            while self.eat_symbol(Symbol::Comma) {
                args.push(self.binexpr()?);
            }
        }
        self.expect_symbol(Symbol::RParen)?;
        Ok(args)
    }

    fn argblock(&mut self) -> Result<Vec<Expr>> {
        self.expect(&TokenKind::Indent)?;
        let mut exprs = Vec::new();
        while !self.check(&TokenKind::Dedent) {
            exprs.push(self.compound()?);
            self.expect(&TokenKind::Newline)?;
        }
        self.expect(&TokenKind::Dedent)?;
        Ok(exprs)
    }

    fn fnparams(&mut self, parens: bool) -> Result<Vec<String>> {
        if parens {
            self.expect_symbol(Symbol::LParen)?;
        }
        let mut params = Vec::new();
        if let TokenKind::Name(_) = self.current().kind {
            params.push(self.expect_name()?);
            while self.eat_symbol(Symbol::Comma) {
                params.push(self.expect_name()?);
            }
        }
        if parens {
            self.expect_symbol(Symbol::RParen)?;
        }
        Ok(params)
    }

    // ===== Token helpers =====

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        self.last = self.current().span;
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current().kind == kind
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<()> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn eat_symbol(&mut self, symbol: Symbol) -> bool {
        let matched = self.check(&TokenKind::Symbol(symbol));
        if matched {
            self.advance();
        }
        matched
    }

    fn expect_symbol(&mut self, symbol: Symbol) -> Result<()> {
        self.expect(&TokenKind::Symbol(symbol))
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        let matched = self.check(&TokenKind::Keyword(keyword));
        if matched {
            self.advance();
        }
        matched
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        self.expect(&TokenKind::Keyword(keyword))
    }

    fn eat_operator(&mut self, op: Operator) -> bool {
        let matched = self.check(&TokenKind::Operator(op));
        if matched {
            self.advance();
        }
        matched
    }

    fn expect_operator(&mut self, op: Operator) -> Result<()> {
        self.expect(&TokenKind::Operator(op))
    }

    fn expect_name(&mut self) -> Result<String> {
        if let TokenKind::Name(name) = &self.current().kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.unexpected("name"))
        }
    }

    fn expect_string(&mut self) -> Result<String> {
        if let TokenKind::Str(value) = &self.current().kind {
            let value = value.clone();
            self.advance();
            Ok(value)
        } else {
            Err(self.unexpected("string"))
        }
    }

    fn expect_name_or_string(&mut self) -> Result<String> {
        match &self.current().kind {
            TokenKind::Name(value) | TokenKind::Str(value) => {
                let value = value.clone();
                self.advance();
                Ok(value)
            }
            _ => Err(self.unexpected("name or string")),
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        let found = self.current().kind.to_string();
        self.error_at(
            self.current().span,
            &format!("unexpected {found}; expected {expected}"),
        )
    }

    fn error_at(&self, span: Span, message: &str) -> Error {
        syntax_error(self.source, span, message)
    }
}

/// Parses a source file whose macros are handled by `host`.
///
/// # Errors
/// Returns an error if the source cannot be parsed or a macro fails.
pub fn parse(source: &str, host: &mut dyn MacroHost) -> Result<Program> {
    Parser::new(source, host)?.parse_program()
}

/// Parses a source file that defines and uses no macros.
///
/// # Errors
/// Returns an error if the source cannot be parsed or uses macros.
pub fn parse_program(source: &str) -> Result<Program> {
    parse(source, &mut NoMacros)
}
