//! Name resolution during lowering.
//!
//! Module scope maps names to global storage: a slot of the unit's exports
//! table or a global data cell. Each function being lowered pushes a frame
//! of stack storage. Lookups try the innermost frame, then module scope;
//! frames of enclosing functions are only reached through closure capture,
//! which [`free_variables`] computes before a function is lowered.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use cranelift_codegen::ir::{StackSlot, Value};
use cranelift_module::DataId;
use rain_syntax::{Binding, Block, Expr, ExprKind, StmtKind};

use crate::constant::ConstBox;
use crate::unit::UnitInterface;

/// A module-scope data cell and the value it will be initialized with.
#[derive(Clone, Debug)]
pub struct GlobalCell {
    /// The cell's data object.
    pub data: DataId,
    /// Current compile-time value.
    pub value: ConstBox,
}

/// Where a module-scope name lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlobalStorage {
    /// Index of a [`GlobalCell`].
    Cell(usize),
    /// Slot in the unit's exports table.
    Export(usize),
}

/// A module-scope name.
#[derive(Clone, Debug)]
pub struct GlobalBinding {
    /// Storage.
    pub storage: GlobalStorage,
    /// The unit this name refers to, for import aliases.
    pub module: Option<Rc<UnitInterface>>,
    /// False for names copied in from the prelude.
    pub own: bool,
}

/// Where a function-scope name lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocalStorage {
    /// A stack slot of the current function.
    Slot(StackSlot),
    /// A pointer computed in the entry block: a parameter cell or a slot of
    /// the closure environment.
    Ptr(Value),
}

/// Whether a `let` right-hand side has finished lowering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindState {
    /// Storage exists but the value is still being lowered.
    Reserved,
    /// Holds its value.
    Bound,
}

/// A function-scope name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalBinding {
    /// Storage.
    pub storage: LocalStorage,
    /// Binding state.
    pub state: BindState,
}

/// Result of a name lookup.
#[derive(Clone, Debug)]
pub enum Resolved<'a> {
    /// In the current function.
    Local(LocalBinding),
    /// At module scope.
    Global(&'a GlobalBinding),
    /// Nowhere.
    Undeclared,
}

#[derive(Debug, Default)]
struct Frame {
    names: HashMap<String, LocalBinding>,
}

/// Scope stack of one unit.
#[derive(Debug, Default)]
pub struct Scopes {
    globals: HashMap<String, GlobalBinding>,
    cells: Vec<GlobalCell>,
    frames: Vec<Frame>,
}

impl Scopes {
    /// Creates module scope with no names.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True while no function is being lowered.
    #[must_use]
    pub fn is_module_scope(&self) -> bool {
        self.frames.is_empty()
    }

    /// Enters a function.
    pub fn push_scope(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Leaves the innermost function.
    pub fn pop_scope(&mut self) {
        self.frames.pop();
    }

    /// Declares a name in the innermost function, replacing any earlier
    /// binding of it there.
    pub fn declare(&mut self, name: &str, storage: LocalStorage, state: BindState) {
        if let Some(frame) = self.frames.last_mut() {
            frame
                .names
                .insert(name.to_string(), LocalBinding { storage, state });
        }
    }

    /// Marks a reserved name of the innermost function as bound.
    pub fn mark_bound(&mut self, name: &str) {
        if let Some(binding) = self
            .frames
            .last_mut()
            .and_then(|frame| frame.names.get_mut(name))
        {
            binding.state = BindState::Bound;
        }
    }

    /// Declares a module-scope name.
    pub fn declare_global(&mut self, name: &str, binding: GlobalBinding) {
        self.globals.insert(name.to_string(), binding);
    }

    /// Resolves a name from the current position.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Resolved<'_> {
        if let Some(&binding) = self.frames.last().and_then(|frame| frame.names.get(name)) {
            return Resolved::Local(binding);
        }
        match self.globals.get(name) {
            Some(binding) => Resolved::Global(binding),
            None => Resolved::Undeclared,
        }
    }

    /// A module-scope binding.
    #[must_use]
    pub fn global(&self, name: &str) -> Option<&GlobalBinding> {
        self.globals.get(name)
    }

    /// Module-scope bindings, in no particular order.
    pub fn globals(&self) -> impl Iterator<Item = (&str, &GlobalBinding)> {
        self.globals.iter().map(|(name, binding)| (name.as_str(), binding))
    }

    /// True if any function being lowered declares `name`.
    #[must_use]
    pub fn in_enclosing_function(&self, name: &str) -> bool {
        self.frames.iter().any(|frame| frame.names.contains_key(name))
    }

    /// Adds a global cell and returns its index.
    pub fn add_cell(&mut self, data: DataId, value: ConstBox) -> usize {
        self.cells.push(GlobalCell { data, value });
        self.cells.len() - 1
    }

    /// A global cell.
    #[must_use]
    pub fn cell(&self, index: usize) -> &GlobalCell {
        &self.cells[index]
    }

    /// A global cell, mutably.
    pub fn cell_mut(&mut self, index: usize) -> &mut GlobalCell {
        &mut self.cells[index]
    }

    /// Every global cell.
    #[must_use]
    pub fn cells(&self) -> &[GlobalCell] {
        &self.cells
    }
}

/// Number of cells a function body binds: one per `let` of a name, per
/// `catch` name and per `for` name. Nested functions are not counted.
#[must_use]
pub fn local_bindings(body: &Block) -> usize {
    body.stmts
        .iter()
        .map(|stmt| match &stmt.kind {
            StmtKind::Assign {
                target,
                binding: Binding::Let,
                ..
            } => usize::from(target.as_name().is_some()),
            StmtKind::Catch { body, .. } => 1 + local_bindings(body),
            StmtKind::For { names, body, .. } => names.len() + local_bindings(body),
            StmtKind::If { body, els, .. } => {
                local_bindings(body) + els.as_ref().map_or(0, local_bindings)
            }
            StmtKind::While { body, .. }
            | StmtKind::Until { body, .. }
            | StmtKind::Loop { body }
            | StmtKind::Block(body) => local_bindings(body),
            _ => 0,
        })
        .sum()
}

/// Names a function literal must capture: every name its body (nested
/// functions included) reads or assigns before binding it, in first-use
/// order, that `enclosing` accepts.
///
/// Bindings are function-wide and follow source order, not control flow.
/// Once a `let`, `catch` or `for` names `x`, every later mention of `x` in
/// the function is the local, even in a branch the binding is not on. A
/// local whose binding did not run reads null. This matches how lowering
/// resolves names, which also walks the body in source order.
pub fn free_variables(
    params: &[String],
    body: &Block,
    enclosing: &dyn Fn(&str) -> bool,
) -> Vec<String> {
    let mut walk = FreeVars {
        bound: HashSet::new(),
        seen: HashSet::new(),
        out: Vec::new(),
        enclosing,
    };
    walk.function(params, body);
    walk.out
}

struct FreeVars<'a> {
    bound: HashSet<String>,
    seen: HashSet<String>,
    out: Vec<String>,
    enclosing: &'a dyn Fn(&str) -> bool,
}

impl FreeVars<'_> {
    fn function(&mut self, params: &[String], body: &Block) {
        let saved = self.bound.clone();
        self.bound.extend(params.iter().cloned());
        self.block(body);
        self.bound = saved;
    }

    fn use_name(&mut self, name: &str) {
        if !self.bound.contains(name) && !self.seen.contains(name) && (self.enclosing)(name) {
            self.seen.insert(name.to_string());
            self.out.push(name.to_string());
        }
    }

    fn block(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.stmt(&stmt.kind);
        }
    }

    fn opt(&mut self, expr: Option<&Expr>) {
        if let Some(expr) = expr {
            self.expr(expr);
        }
    }

    fn stmt(&mut self, stmt: &StmtKind) {
        match stmt {
            StmtKind::Assign {
                target,
                value,
                binding,
            } => {
                match (&target.kind, binding) {
                    (ExprKind::Name(name), Binding::Let) => {
                        self.bound.insert(name.clone());
                    }
                    _ => self.expr(target),
                }
                self.expr(value);
            }
            StmtKind::If { pred, body, els } => {
                self.expr(pred);
                self.block(body);
                if let Some(els) = els {
                    self.block(els);
                }
            }
            StmtKind::Catch { name, body } => {
                self.bound.insert(name.clone());
                self.block(body);
            }
            StmtKind::For { names, gens, body } => {
                for expr in gens {
                    self.expr(expr);
                }
                self.bound.extend(names.iter().cloned());
                self.block(body);
            }
            StmtKind::With { func, params, body } => {
                self.expr(func);
                self.function(params, body);
            }
            StmtKind::While { pred, body } | StmtKind::Until { pred, body } => {
                self.expr(pred);
                self.block(body);
            }
            StmtKind::Loop { body } | StmtKind::Block(body) => self.block(body),
            StmtKind::Break(cond) | StmtKind::Continue(cond) | StmtKind::Return(cond) => {
                self.opt(cond.as_ref());
            }
            StmtKind::Save(expr) | StmtKind::Expr(expr) => self.expr(expr),
            StmtKind::ExportForeign { .. }
            | StmtKind::Import { .. }
            | StmtKind::Macro(_)
            | StmtKind::Link(_)
            | StmtKind::Library(_)
            | StmtKind::Pass
            | StmtKind::Error(_)
            | StmtKind::Warning(_)
            | StmtKind::Hint(_) => {}
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Name(name) => self.use_name(name),
            ExprKind::Array(items) => {
                for item in items {
                    self.expr(item);
                }
            }
            ExprKind::Dict(items) => {
                for (key, value) in items {
                    self.expr(key);
                    self.expr(value);
                }
            }
            ExprKind::Func { params, body } => self.function(params, body),
            ExprKind::Call { func, args, .. } => {
                self.expr(func);
                for arg in args {
                    self.expr(arg);
                }
            }
            ExprKind::Method { recv, args, .. } => {
                self.expr(recv);
                for arg in args {
                    self.expr(arg);
                }
            }
            ExprKind::Index { lhs, key } => {
                self.expr(lhs);
                self.expr(key);
            }
            ExprKind::Unary { operand, .. } => self.expr(operand),
            ExprKind::Binary { lhs, rhs, .. } => {
                self.expr(lhs);
                self.expr(rhs);
            }
            ExprKind::Null
            | ExprKind::Table
            | ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::Bool(_)
            | ExprKind::Str(_)
            | ExprKind::Foreign { .. } => {}
        }
    }
}
