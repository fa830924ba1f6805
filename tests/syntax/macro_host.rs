//! Integration tests for macro definitions and invocations against a host
//! that expands macros in Rust.

use std::collections::HashMap;

use rain_foundation::{Error, ErrorKind, Result, Span};
use rain_syntax::{
    BinaryOp, Block, Expr, ExprKind, MacroArg, MacroDef, MacroHost, Node, ParserKind, Stmt,
    StmtKind, parse,
};

/// Records definitions, imports and invocations. `sum` adds its arguments,
/// `tag` turns every scalar argument into a string array, and `wrap`
/// splices its block in as a single statement.
#[derive(Default)]
struct Recorder {
    defined: HashMap<String, Vec<ParserKind>>,
    imports: Vec<(String, Option<String>)>,
    invoked: Vec<String>,
}

impl MacroHost for Recorder {
    fn contains(&self, name: &str) -> bool {
        self.defined.contains_key(name)
    }

    fn define(&mut self, def: &MacroDef, _span: Span) -> Result<()> {
        self.defined.insert(def.name.clone(), def.parsers.clone());
        Ok(())
    }

    fn parsers(&self, name: &str) -> Option<Vec<ParserKind>> {
        self.defined.get(name).cloned()
    }

    fn invoke(&mut self, name: &str, args: Vec<MacroArg>, span: Span) -> Result<Node> {
        self.invoked.push(name.to_string());
        let base = name.rsplit('.').next().unwrap_or(name);
        match base {
            "sum" => {
                let mut exprs = Vec::new();
                for arg in args {
                    match arg {
                        MacroArg::Expr(expr) => exprs.push(expr),
                        MacroArg::Exprs(items) => exprs.extend(items),
                        other => return Err(Error::internal(format!("bad argument {other:?}"))),
                    }
                }
                let total = exprs
                    .into_iter()
                    .reduce(|lhs, rhs| {
                        Expr::synthetic(ExprKind::Binary {
                            op: BinaryOp::Add,
                            lhs: Box::new(lhs),
                            rhs: Box::new(rhs),
                        })
                    })
                    .unwrap_or_else(|| Expr::int(0));
                Ok(Node::Expr(Expr::new(total.kind, span)))
            }
            "tag" => {
                let items = args
                    .into_iter()
                    .map(|arg| match arg {
                        MacroArg::Str(text) => Expr::string(text),
                        MacroArg::Int(value) => Expr::string(value.to_string()),
                        MacroArg::Float(value) => Expr::string(value.to_string()),
                        MacroArg::Bool(value) => Expr::string(value.to_string()),
                        other => Expr::string(format!("{other:?}")),
                    })
                    .collect();
                Ok(Node::Expr(Expr::synthetic(ExprKind::Array(items))))
            }
            "wrap" => {
                let Some(MacroArg::Block(block)) = args.into_iter().next() else {
                    return Err(Error::internal("wrap takes a block"));
                };
                Ok(Node::Stmt(Stmt::synthetic(StmtKind::Block(block))))
            }
            _ => Err(Error::new(ErrorKind::UnknownMacro(name.to_string()))),
        }
    }

    fn import(&mut self, module: &str, alias: Option<&str>, _span: Span) -> Result<()> {
        self.imports
            .push((module.to_string(), alias.map(str::to_string)));
        let prefix = alias.unwrap_or(module);
        if self.defined.contains_key("sum") {
            self.defined
                .insert(format!("{prefix}.sum"), vec![ParserKind::Args]);
        }
        Ok(())
    }
}

const SUM: &str = "macro sum(args) as (xs)\n    return xs\n";

fn assigned(stmt: &Stmt) -> &Expr {
    let StmtKind::Assign { value, .. } = &stmt.kind else {
        panic!("expected assignment, got {stmt:?}");
    };
    value
}

#[test]
fn definitions_stay_in_the_tree() {
    let mut host = Recorder::default();
    let program = parse(SUM, &mut host).unwrap();
    let StmtKind::Macro(def) = &program.stmts[0].kind else {
        panic!("expected macro definition");
    };
    assert_eq!(def.name, "sum");
    assert_eq!(def.parsers, vec![ParserKind::Args]);
    assert_eq!(def.params, vec!["xs".to_string()]);
    assert_eq!(host.defined["sum"], vec![ParserKind::Args]);
}

#[test]
fn invocation_runs_the_declared_parsers() {
    let mut host = Recorder::default();
    let source = format!("{SUM}let total = @sum(1, 2, 3)\n");
    let program = parse(&source, &mut host).unwrap();
    let ExprKind::Binary { op, lhs, rhs } = &assigned(&program.stmts[1]).kind else {
        panic!("expected an expansion");
    };
    assert_eq!(*op, BinaryOp::Add);
    assert_eq!(rhs.kind, ExprKind::Int(3));
    assert!(matches!(lhs.kind, ExprKind::Binary { .. }));
    assert_eq!(host.invoked, ["sum"]);
}

#[test]
fn expansions_carry_the_invocation_span() {
    let mut host = Recorder::default();
    let source = format!("{SUM}let total = @sum(1, 2)\n");
    let program = parse(&source, &mut host).unwrap();
    let expr = assigned(&program.stmts[1]);
    assert_eq!(expr.span.line, 3);
}

#[test]
fn nested_invocations_expand_inside_out() {
    let mut host = Recorder::default();
    let source = "\
macro sum(compound, compound) as (a, b)
    return a
let total = @sum @sum 1 2 3
";
    let program = parse(source, &mut host).unwrap();
    assert_eq!(host.invoked, ["sum", "sum"]);
    let ExprKind::Binary { lhs, rhs, .. } = &assigned(&program.stmts[1]).kind else {
        panic!("expected an expansion");
    };
    assert!(matches!(lhs.kind, ExprKind::Binary { .. }));
    assert_eq!(rhs.kind, ExprKind::Int(3));
}

#[test]
fn scalar_parsers() {
    let mut host = Recorder::default();
    let source = "\
macro tag(name, namestr, string, int, float, bool) as (a, b, c, d, e, f)
    pass
let tags = @tag alpha \"beta\" \"gamma\" 4 2.5 true
";
    let program = parse(source, &mut host).unwrap();
    let ExprKind::Array(items) = &assigned(&program.stmts[1]).kind else {
        panic!("expected an array");
    };
    let texts: Vec<_> = items
        .iter()
        .map(|item| match &item.kind {
            ExprKind::Str(text) => text.as_str(),
            other => panic!("expected a string, got {other:?}"),
        })
        .collect();
    assert_eq!(texts, ["alpha", "beta", "gamma", "4", "2.5", "true"]);
}

#[test]
fn block_arguments_splice_as_statements() {
    let mut host = Recorder::default();
    let source = "\
macro wrap(block) as (body)
    return body
let f = func()
    @wrap
        print(1)
        print(2)
    return null
";
    let program = parse(source, &mut host).unwrap();
    let ExprKind::Func { body, .. } = &assigned(&program.stmts[1]).kind else {
        panic!("expected a function");
    };
    let StmtKind::Block(Block { stmts, .. }) = &body.stmts[0].kind else {
        panic!("expected a spliced block, got {:?}", body.stmts[0]);
    };
    assert_eq!(stmts.len(), 2);
    assert!(matches!(body.stmts[1].kind, StmtKind::Return(_)));
}

#[test]
fn statement_expansions_are_rejected_in_expressions() {
    let mut host = Recorder::default();
    let source = "\
macro wrap(block) as (body)
    return body
let x = @wrap
    pass
";
    let err = parse(source, &mut host).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Parse { .. }));
}

#[test]
fn imports_reach_the_host_and_enable_dotted_names() {
    let mut host = Recorder::default();
    let source = format!("{SUM}import lib as l\nlet x = @l.sum(1, 2)\n");
    parse(&source, &mut host).unwrap();
    assert_eq!(host.imports, [("lib".to_string(), Some("l".to_string()))]);
    assert_eq!(host.invoked, ["l.sum"]);
}

#[test]
fn redefinition_is_rejected() {
    let mut host = Recorder::default();
    let source = format!("{SUM}{SUM}");
    let err = parse(&source, &mut host).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MacroRedefinition(ref name) if name == "sum"));
}

#[test]
fn parser_and_parameter_counts_must_match() {
    let mut host = Recorder::default();
    let err = parse("macro m(expr, expr) as (a)\n    return a\n", &mut host).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::MacroArity {
            parsers: 2,
            params: 1,
            ..
        }
    ));
}

#[test]
fn unknown_parser_kind() {
    let mut host = Recorder::default();
    let err = parse("macro m(sentence) as (a)\n    return a\n", &mut host).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownParserKind(ref kind) if kind == "sentence"));
}
