//! Syntax trees as Rain values.
//!
//! Macro arguments cross into compiled code as tables, and the table a macro
//! returns is read back into a [`Node`]. A node is a table whose `"type"`
//! key names its kind, with one key per field. Lists are arrays keyed from
//! 0. Optional fields may be absent or null.

use rain_foundation::{Error, ErrorKind, Result, Span};
use rain_runtime::{RBox, Value, table};
use rain_syntax::{
    BinaryOp, Binding, Block, Expr, ExprKind, MacroArg, Node, Stmt, StmtKind, UnaryOp,
};

fn malformed(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::MalformedNode(message.into()))
}

// =============================================================================
// Encoding
// =============================================================================

fn put(target: &RBox, key: &RBox, value: RBox) -> Result<()> {
    // SAFETY: every target is a table built by `RBox::new_table`
    unsafe { table::put(target, key, value) }
        .map_err(|err| malformed(format!("can't encode syntax tree: {err}")))
}

fn node(kind: &str, fields: Vec<(&str, RBox)>) -> Result<RBox> {
    let target = RBox::new_table();
    put(&target, &RBox::string("type"), RBox::string(kind))?;
    for (key, value) in fields {
        put(&target, &RBox::string(key), value)?;
    }
    Ok(target)
}

fn array(items: impl IntoIterator<Item = Result<RBox>>) -> Result<RBox> {
    let target = RBox::new_table();
    for (index, item) in (0i64..).zip(items) {
        put(&target, &RBox::int(index), item?)?;
    }
    Ok(target)
}

fn strings(items: &[String]) -> Result<RBox> {
    array(items.iter().map(|item| Ok(RBox::string(item))))
}

fn exprs(items: &[Expr]) -> Result<RBox> {
    array(items.iter().map(encode_expr))
}

fn optional(expr: Option<&Expr>) -> Result<RBox> {
    expr.map_or(Ok(RBox::null()), encode_expr)
}

fn encode_block(block: &Block) -> Result<RBox> {
    node(
        "block",
        vec![("stmts", array(block.stmts.iter().map(encode_stmt))?)],
    )
}

/// Encodes one parsed macro argument.
///
/// # Errors
/// Returns an error if a list has more items than a table holds.
pub fn encode_arg(arg: &MacroArg) -> Result<RBox> {
    match arg {
        MacroArg::Expr(expr) => encode_expr(expr),
        MacroArg::Exprs(items) => exprs(items),
        MacroArg::Params(names) => strings(names),
        MacroArg::Block(block) => encode_block(block),
        MacroArg::Stmt(stmt) => encode_stmt(stmt),
        MacroArg::Str(text) => Ok(RBox::string(text)),
        MacroArg::Int(value) => Ok(RBox::int(*value)),
        MacroArg::Float(value) => Ok(RBox::float(*value)),
        MacroArg::Bool(value) => Ok(RBox::bool(*value)),
    }
}

/// Encodes an expression.
///
/// # Errors
/// Returns an error if a list has more items than a table holds.
pub fn encode_expr(expr: &Expr) -> Result<RBox> {
    match &expr.kind {
        ExprKind::Null => node("null", vec![]),
        ExprKind::Table => node("table", vec![]),
        ExprKind::Int(value) => node("int", vec![("value", RBox::int(*value))]),
        ExprKind::Float(value) => node("float", vec![("value", RBox::float(*value))]),
        ExprKind::Bool(value) => node("bool", vec![("value", RBox::bool(*value))]),
        ExprKind::Str(value) => node("str", vec![("value", RBox::string(value))]),
        ExprKind::Name(value) => node("name", vec![("value", RBox::string(value))]),
        ExprKind::Array(items) => node("array", vec![("items", exprs(items)?)]),
        ExprKind::Dict(items) => {
            let pairs = array(items.iter().map(|(key, value)| {
                array([encode_expr(key), encode_expr(value)])
            }))?;
            node("dict", vec![("items", pairs)])
        }
        ExprKind::Func { params, body } => node(
            "func",
            vec![("params", strings(params)?), ("body", encode_block(body)?)],
        ),
        ExprKind::Foreign { name, params } => node(
            "foreign",
            vec![("name", RBox::string(name)), ("params", strings(params)?)],
        ),
        ExprKind::Call { func, args, catch } => node(
            "call",
            vec![
                ("func", encode_expr(func)?),
                ("args", exprs(args)?),
                ("catch", RBox::bool(*catch)),
            ],
        ),
        ExprKind::Method {
            recv,
            name,
            args,
            catch,
        } => node(
            "meth",
            vec![
                ("lhs", encode_expr(recv)?),
                ("name", RBox::string(name)),
                ("args", exprs(args)?),
                ("catch", RBox::bool(*catch)),
            ],
        ),
        ExprKind::Index { lhs, key } => node(
            "idx",
            vec![("lhs", encode_expr(lhs)?), ("rhs", encode_expr(key)?)],
        ),
        ExprKind::Unary { op, operand } => node(
            "unary",
            vec![
                ("op", RBox::string(op.as_str())),
                ("val", encode_expr(operand)?),
            ],
        ),
        ExprKind::Binary { op, lhs, rhs } => node(
            "binary",
            vec![
                ("op", RBox::string(op.as_str())),
                ("lhs", encode_expr(lhs)?),
                ("rhs", encode_expr(rhs)?),
            ],
        ),
    }
}

/// Encodes a statement. Expression statements encode as their expression;
/// macro definitions, already registered, encode as `pass`.
///
/// # Errors
/// Returns an error if a list has more items than a table holds.
pub fn encode_stmt(stmt: &Stmt) -> Result<RBox> {
    match &stmt.kind {
        StmtKind::Assign {
            target,
            value,
            binding,
        } => node(
            "assn",
            vec![
                ("lhs", encode_expr(target)?),
                ("rhs", encode_expr(value)?),
                ("let", RBox::bool(*binding == Binding::Let)),
                ("export", RBox::bool(*binding == Binding::Export)),
            ],
        ),
        StmtKind::ExportForeign { name, symbol } => node(
            "export_foreign",
            vec![("name", RBox::string(name)), ("rename", RBox::string(symbol))],
        ),
        StmtKind::Import { module, alias } => node(
            "import",
            vec![
                ("name", RBox::string(module)),
                ("rename", alias.as_deref().map_or(RBox::null(), RBox::string)),
            ],
        ),
        StmtKind::Macro(_) | StmtKind::Pass => node("pass", vec![]),
        StmtKind::Link(name) => node("link", vec![("name", RBox::string(name))]),
        StmtKind::Library(name) => node("library", vec![("name", RBox::string(name))]),
        StmtKind::If { pred, body, els } => node(
            "if",
            vec![
                ("pred", encode_expr(pred)?),
                ("body", encode_block(body)?),
                (
                    "els",
                    els.as_ref().map_or(Ok(RBox::null()), encode_block)?,
                ),
            ],
        ),
        StmtKind::Catch { name, body } => node(
            "catch",
            vec![("name", RBox::string(name)), ("body", encode_block(body)?)],
        ),
        StmtKind::For { names, gens, body } => node(
            "for",
            vec![
                ("names", strings(names)?),
                ("funcs", exprs(gens)?),
                ("body", encode_block(body)?),
            ],
        ),
        StmtKind::With { func, params, body } => node(
            "with",
            vec![
                ("func", encode_expr(func)?),
                ("params", strings(params)?),
                ("body", encode_block(body)?),
            ],
        ),
        StmtKind::While { pred, body } => node(
            "while",
            vec![("pred", encode_expr(pred)?), ("body", encode_block(body)?)],
        ),
        StmtKind::Until { pred, body } => node(
            "until",
            vec![("pred", encode_expr(pred)?), ("body", encode_block(body)?)],
        ),
        StmtKind::Loop { body } => node("loop", vec![("body", encode_block(body)?)]),
        StmtKind::Break(cond) => node("break", vec![("cond", optional(cond.as_ref())?)]),
        StmtKind::Continue(cond) => node("cont", vec![("cond", optional(cond.as_ref())?)]),
        StmtKind::Return(value) => node("return", vec![("value", optional(value.as_ref())?)]),
        StmtKind::Save(value) => node("save", vec![("value", encode_expr(value)?)]),
        StmtKind::Expr(expr) => encode_expr(expr),
        StmtKind::Block(block) => encode_block(block),
        StmtKind::Error(msg) => node("error", vec![("msg", RBox::string(msg))]),
        StmtKind::Warning(msg) => node("warning", vec![("msg", RBox::string(msg))]),
        StmtKind::Hint(msg) => node("hint", vec![("msg", RBox::string(msg))]),
    }
}

// =============================================================================
// Decoding
// =============================================================================

const EXPR_KINDS: [&str; 16] = [
    "null", "table", "int", "float", "bool", "str", "name", "array", "dict", "func", "foreign",
    "call", "meth", "idx", "unary", "binary",
];

fn is_expr_kind(kind: &str) -> bool {
    EXPR_KINDS.contains(&kind)
}

/// Reads nodes out of a value snapshot, stamping every node with the span
/// of the macro invocation.
struct Decoder {
    span: Span,
}

fn kind_of(value: &Value) -> Result<&str> {
    value
        .field("type")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(format!("expected a syntax node, found {value}")))
}

/// A field, with null reading as absent.
fn field<'v>(value: &'v Value, name: &str) -> Option<&'v Value> {
    value.field(name).filter(|v| **v != Value::Null)
}

fn required<'v>(value: &'v Value, kind: &str, name: &str) -> Result<&'v Value> {
    field(value, name).ok_or_else(|| malformed(format!("{kind} node has no {name}")))
}

fn string(value: &Value, kind: &str, name: &str) -> Result<String> {
    required(value, kind, name)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| malformed(format!("{kind}.{name} must be a string")))
}

fn flag(value: &Value, kind: &str, name: &str) -> Result<bool> {
    match field(value, name) {
        None => Ok(false),
        Some(found) => found
            .as_bool()
            .ok_or_else(|| malformed(format!("{kind}.{name} must be a bool"))),
    }
}

fn list<'v>(value: &'v Value, kind: &str, name: &str) -> Result<Vec<&'v Value>> {
    match field(value, name) {
        None => Ok(Vec::new()),
        Some(found) => found
            .as_array()
            .ok_or_else(|| malformed(format!("{kind}.{name} must be an array"))),
    }
}

fn names(value: &Value, kind: &str, name: &str) -> Result<Vec<String>> {
    list(value, kind, name)?
        .into_iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| malformed(format!("{kind}.{name} must hold strings")))
        })
        .collect()
}

impl Decoder {
    fn expr(&self, value: &Value) -> Result<Expr> {
        let kind = match value {
            Value::Int(i) => return Ok(Expr::new(ExprKind::Int(*i), self.span)),
            Value::Float(x) => return Ok(Expr::new(ExprKind::Float(*x), self.span)),
            Value::Bool(b) => return Ok(Expr::new(ExprKind::Bool(*b), self.span)),
            Value::Str(s) => return Ok(Expr::new(ExprKind::Str(s.clone()), self.span)),
            _ => kind_of(value)?,
        };
        let expr = match kind {
            "null" => ExprKind::Null,
            "table" => ExprKind::Table,
            "int" => ExprKind::Int(
                required(value, kind, "value")?
                    .as_int()
                    .ok_or_else(|| malformed("int.value must be an int"))?,
            ),
            "float" => match required(value, kind, "value")? {
                Value::Float(x) => ExprKind::Float(*x),
                _ => return Err(malformed("float.value must be a float")),
            },
            "bool" => ExprKind::Bool(flag(value, kind, "value")?),
            "str" => ExprKind::Str(string(value, kind, "value")?),
            "name" => ExprKind::Name(string(value, kind, "value")?),
            "array" => ExprKind::Array(self.exprs(value, kind, "items")?),
            "dict" => {
                let mut items = Vec::new();
                for pair in list(value, kind, "items")? {
                    let pair = pair
                        .as_array()
                        .filter(|pair| pair.len() == 2)
                        .ok_or_else(|| malformed("dict items must be [key, value] pairs"))?;
                    items.push((self.expr(pair[0])?, self.expr(pair[1])?));
                }
                ExprKind::Dict(items)
            }
            "func" => ExprKind::Func {
                params: names(value, kind, "params")?,
                body: self.block(required(value, kind, "body")?)?,
            },
            "foreign" => ExprKind::Foreign {
                name: string(value, kind, "name")?,
                params: names(value, kind, "params")?,
            },
            "call" => ExprKind::Call {
                func: Box::new(self.expr(required(value, kind, "func")?)?),
                args: self.exprs(value, kind, "args")?,
                catch: flag(value, kind, "catch")?,
            },
            "meth" => ExprKind::Method {
                recv: Box::new(self.expr(required(value, kind, "lhs")?)?),
                name: string(value, kind, "name")?,
                args: self.exprs(value, kind, "args")?,
                catch: flag(value, kind, "catch")?,
            },
            "idx" => ExprKind::Index {
                lhs: Box::new(self.expr(required(value, kind, "lhs")?)?),
                key: Box::new(self.expr(required(value, kind, "rhs")?)?),
            },
            "unary" => {
                let op = string(value, kind, "op")?;
                ExprKind::Unary {
                    op: UnaryOp::from_symbol(&op)
                        .ok_or_else(|| malformed(format!("unknown unary operator {op:?}")))?,
                    operand: Box::new(self.expr(required(value, kind, "val")?)?),
                }
            }
            "binary" => {
                let op = string(value, kind, "op")?;
                ExprKind::Binary {
                    op: BinaryOp::from_symbol(&op)
                        .ok_or_else(|| malformed(format!("unknown binary operator {op:?}")))?,
                    lhs: Box::new(self.expr(required(value, kind, "lhs")?)?),
                    rhs: Box::new(self.expr(required(value, kind, "rhs")?)?),
                }
            }
            other => return Err(malformed(format!("{other} is not an expression"))),
        };
        Ok(Expr::new(expr, self.span))
    }

    fn exprs(&self, value: &Value, kind: &str, name: &str) -> Result<Vec<Expr>> {
        list(value, kind, name)?
            .into_iter()
            .map(|item| self.expr(item))
            .collect()
    }

    fn optional_expr(&self, value: &Value, name: &str) -> Result<Option<Expr>> {
        field(value, name).map(|found| self.expr(found)).transpose()
    }

    /// A `block` node, an array of statements, or a single statement.
    fn block(&self, value: &Value) -> Result<Block> {
        let items = if let Some(items) = value.as_array() {
            items
        } else if matches!(value, Value::Table(_)) && kind_of(value)? == "block" {
            list(value, "block", "stmts")?
        } else {
            return Ok(Block::new(vec![self.stmt(value)?], self.span));
        };
        let stmts = items
            .into_iter()
            .map(|item| self.stmt(item))
            .collect::<Result<_>>()?;
        Ok(Block::new(stmts, self.span))
    }

    fn stmt(&self, value: &Value) -> Result<Stmt> {
        let kind = match value {
            Value::Table(_) => kind_of(value)?,
            _ => return Ok(Stmt::new(StmtKind::Expr(self.expr(value)?), self.span)),
        };
        if is_expr_kind(kind) {
            return Ok(Stmt::new(StmtKind::Expr(self.expr(value)?), self.span));
        }
        let stmt = match kind {
            "block" => StmtKind::Block(self.block(value)?),
            "assn" => {
                let binding = if flag(value, kind, "export")? {
                    Binding::Export
                } else if flag(value, kind, "let")? {
                    Binding::Let
                } else {
                    Binding::Assign
                };
                StmtKind::Assign {
                    target: self.expr(required(value, kind, "lhs")?)?,
                    value: self.expr(required(value, kind, "rhs")?)?,
                    binding,
                }
            }
            "break" => StmtKind::Break(self.optional_expr(value, "cond")?),
            "cont" => StmtKind::Continue(self.optional_expr(value, "cond")?),
            "pass" => StmtKind::Pass,
            "return" => StmtKind::Return(self.optional_expr(value, "value")?),
            "save" => StmtKind::Save(self.expr(required(value, kind, "value")?)?),
            "if" => StmtKind::If {
                pred: self.expr(required(value, kind, "pred")?)?,
                body: self.block(required(value, kind, "body")?)?,
                els: field(value, "els").map(|els| self.block(els)).transpose()?,
            },
            "loop" => StmtKind::Loop {
                body: self.block(required(value, kind, "body")?)?,
            },
            "while" => StmtKind::While {
                pred: self.expr(required(value, kind, "pred")?)?,
                body: self.block(required(value, kind, "body")?)?,
            },
            "until" => StmtKind::Until {
                pred: self.expr(required(value, kind, "pred")?)?,
                body: self.block(required(value, kind, "body")?)?,
            },
            "for" => StmtKind::For {
                names: names(value, kind, "names")?,
                gens: self.exprs(value, kind, "funcs")?,
                body: self.block(required(value, kind, "body")?)?,
            },
            "catch" => StmtKind::Catch {
                name: string(value, kind, "name")?,
                body: self.block(required(value, kind, "body")?)?,
            },
            "with" => StmtKind::With {
                func: self.expr(required(value, kind, "func")?)?,
                params: names(value, kind, "params")?,
                body: self.block(required(value, kind, "body")?)?,
            },
            "import" => StmtKind::Import {
                module: string(value, kind, "name")?,
                alias: field(value, "rename")
                    .map(|_| string(value, kind, "rename"))
                    .transpose()?,
            },
            "link" => StmtKind::Link(string(value, kind, "name")?),
            "library" => StmtKind::Library(string(value, kind, "name")?),
            "export_foreign" => StmtKind::ExportForeign {
                name: string(value, kind, "name")?,
                symbol: string(value, kind, "rename")?,
            },
            "error" => StmtKind::Error(string(value, kind, "msg")?),
            "warning" => StmtKind::Warning(string(value, kind, "msg")?),
            "hint" => StmtKind::Hint(string(value, kind, "msg")?),
            other => return Err(malformed(format!("unknown node type {other:?}"))),
        };
        Ok(Stmt::new(stmt, self.span))
    }
}

/// Reads the value a macro returned. Expression kinds and bare literals
/// become [`Node::Expr`]; null expands to `pass`.
///
/// # Errors
/// Returns [`ErrorKind::MalformedNode`] if the value does not encode a
/// node.
pub fn decode(value: &Value, span: Span) -> Result<Node> {
    let decoder = Decoder { span };
    match value {
        Value::Null => Ok(Node::Stmt(Stmt::new(StmtKind::Pass, span))),
        Value::Table(_) if !is_expr_kind(kind_of(value)?) => decoder.stmt(value).map(Node::Stmt),
        _ => decoder.expr(value).map(Node::Expr),
    }
}
