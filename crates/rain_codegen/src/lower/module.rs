//! Module-scope statements: constant folding into static data.

use rain_foundation::{Error, ErrorKind, Result, TypeTag};
use rain_syntax::{BinaryOp, Binding, Expr, ExprKind, Stmt, StmtKind};

use super::Lowerer;
use crate::constant::{ConstBox, ConstValue};
use crate::scope::{GlobalBinding, GlobalStorage};
use crate::static_table::SlotLookup;
use crate::unit::UnitInterface;

/// Statement keyword, for scope errors.
pub(super) fn stmt_name(stmt: &StmtKind) -> &'static str {
    match stmt {
        StmtKind::Assign { .. } => "assignment",
        StmtKind::ExportForeign { .. } => "export as foreign",
        StmtKind::Import { .. } => "import",
        StmtKind::Macro(_) => "macro",
        StmtKind::Link(_) => "link",
        StmtKind::Library(_) => "library",
        StmtKind::If { .. } => "if",
        StmtKind::Catch { .. } => "catch",
        StmtKind::For { .. } => "for",
        StmtKind::With { .. } => "with",
        StmtKind::While { .. } => "while",
        StmtKind::Until { .. } => "until",
        StmtKind::Loop { .. } => "loop",
        StmtKind::Pass => "pass",
        StmtKind::Break(_) => "break",
        StmtKind::Continue(_) => "continue",
        StmtKind::Return(_) => "return",
        StmtKind::Save(_) => "save",
        StmtKind::Expr(_) => "expression",
        StmtKind::Block(_) => "block",
        StmtKind::Error(_) => "error",
        StmtKind::Warning(_) => "warning",
        StmtKind::Hint(_) => "hint",
    }
}

impl Lowerer<'_> {
    /// Copies prelude globals into fresh cells of this unit.
    pub(super) fn seed_prelude(&mut self, prelude: &UnitInterface) -> Result<()> {
        for (name, value) in &prelude.globals {
            let index = self.new_global_cell(value.clone())?;
            self.scopes.declare_global(
                name,
                GlobalBinding {
                    storage: GlobalStorage::Cell(index),
                    module: None,
                    own: false,
                },
            );
        }
        Ok(())
    }

    pub(super) fn module_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match &stmt.kind {
            StmtKind::Assign {
                target,
                value,
                binding,
            } => self.module_assign(target, value, *binding),
            StmtKind::ExportForeign { name, symbol } => {
                let binding = self
                    .scopes
                    .global(name)
                    .ok_or_else(|| Error::unknown_name(name))?;
                self.foreign_exports.push((symbol.clone(), binding.storage));
                Ok(())
            }
            StmtKind::Import { module, alias } => self.module_import(module, alias.as_deref()),
            StmtKind::Link(file) => {
                self.links.push(file.clone());
                Ok(())
            }
            StmtKind::Library(name) => {
                self.libraries.push(name.clone());
                Ok(())
            }
            StmtKind::Macro(_) | StmtKind::Pass => Ok(()),
            StmtKind::Block(block) => {
                for inner in &block.stmts {
                    self.module_stmt(inner).map_err(|err| err.at(inner.span))?;
                }
                Ok(())
            }
            StmtKind::Expr(expr) => self.const_expr(expr).map(drop),
            StmtKind::Error(_) | StmtKind::Warning(_) | StmtKind::Hint(_) => {
                self.advisory(&stmt.kind, stmt.span)
            }
            other => Err(Error::invalid_scope(format!(
                "{} can't be used at module scope",
                stmt_name(other)
            ))),
        }
    }

    fn module_assign(&mut self, target: &Expr, value: &Expr, binding: Binding) -> Result<()> {
        match (&target.kind, binding) {
            (ExprKind::Name(name), Binding::Export) => {
                // The slot exists before the value so the value can refer to it.
                let key = self.string(name)?;
                self.pool
                    .tables_mut()
                    .put(self.exports, key.clone(), ConstBox::null())?;
                let SlotLookup::Found(slot) = self.tables().get_index(self.exports, &key)? else {
                    return Err(Error::internal(format!("export slot for {name} vanished")));
                };
                self.declare_own(name, GlobalStorage::Export(slot));
                let value = self.const_expr(value)?;
                self.pool.tables_mut().put(self.exports, key, value)?;
                Ok(())
            }
            (ExprKind::Name(name), Binding::Let) => {
                let index = self.new_global_cell(ConstBox::null())?;
                self.declare_own(name, GlobalStorage::Cell(index));
                let value = self.const_expr(value)?;
                self.scopes.cell_mut(index).value = value;
                Ok(())
            }
            (ExprKind::Name(name), Binding::Assign) => {
                let value = self.const_expr(value)?;
                let storage = self
                    .scopes
                    .global(name)
                    .map(|binding| binding.storage)
                    .ok_or_else(|| Error::undeclared_global(name))?;
                self.set_global_value(storage, value)
            }
            (ExprKind::Index { lhs, key }, Binding::Assign) => {
                let table = self.const_expr(lhs)?;
                let ConstValue::Table(id) = table.value else {
                    return Err(Error::invalid_scope(format!(
                        "can't assign into {} at module scope",
                        table.tag()
                    )));
                };
                let key = self.const_expr(key)?;
                let value = self.const_expr(value)?;
                self.pool.tables_mut().put(id, key, value).map(drop)
            }
            _ => Err(Error::invalid_scope("can't assign to this expression")),
        }
    }

    fn declare_own(&mut self, name: &str, storage: GlobalStorage) {
        self.scopes.declare_global(
            name,
            GlobalBinding {
                storage,
                module: None,
                own: true,
            },
        );
    }

    fn module_import(&mut self, module: &str, alias: Option<&str>) -> Result<()> {
        let unit = self
            .imports
            .get(module)
            .cloned()
            .ok_or_else(|| Error::new(ErrorKind::ModuleNotFound(module.to_string())))?;
        let name = alias.unwrap_or(module);
        let index = self.new_global_cell(unit.exports.clone())?;
        tracing::debug!(target: "rain::codegen", unit = self.unit, module, alias = name, "import");
        self.scopes.declare_global(
            name,
            GlobalBinding {
                storage: GlobalStorage::Cell(index),
                module: Some(unit),
                own: true,
            },
        );
        Ok(())
    }

    /// Folds a module-scope expression to a constant box.
    pub(super) fn const_expr(&mut self, expr: &Expr) -> Result<ConstBox> {
        self.const_expr_kind(&expr.kind)
            .map_err(|err| err.at(expr.span))
    }

    fn const_expr_kind(&mut self, expr: &ExprKind) -> Result<ConstBox> {
        match expr {
            ExprKind::Null => Ok(ConstBox::null()),
            ExprKind::Int(i) => Ok(ConstBox::int(*i)),
            ExprKind::Float(x) => Ok(ConstBox::float(*x)),
            ExprKind::Bool(b) => Ok(ConstBox::bool(*b)),
            ExprKind::Str(text) => self.string(text),
            ExprKind::Name(name) => {
                let storage = self
                    .scopes
                    .global(name)
                    .map(|binding| binding.storage)
                    .ok_or_else(|| Error::unknown_name(name))?;
                Ok(self.global_value(storage))
            }
            ExprKind::Table => self.static_table("table", Vec::new()),
            ExprKind::Array(items) => {
                let mut entries = Vec::with_capacity(items.len());
                for (index, item) in (0i64..).zip(items) {
                    entries.push((ConstBox::int(index), self.const_expr(item)?));
                }
                self.static_table("array", entries)
            }
            ExprKind::Dict(items) => {
                let mut entries = Vec::with_capacity(items.len());
                for (key, value) in items {
                    entries.push((self.const_expr(key)?, self.const_expr(value)?));
                }
                self.static_table("dict", entries)
            }
            ExprKind::Func { params, body } => {
                let (func, _) = self.lower_function(params, body)?;
                Ok(ConstBox::func(func, arity(params)?))
            }
            ExprKind::Foreign { name, params } => {
                let arity = arity(params)?;
                let func = self.pool.foreign(self.module, name, arity)?;
                Ok(ConstBox::func(func, arity))
            }
            ExprKind::Index { lhs, key } => {
                let key = self.const_expr(key)?;
                if let Some(unit) = lhs
                    .as_name()
                    .and_then(|name| self.scopes.global(name))
                    .and_then(|binding| binding.module.clone())
                {
                    return self.module_member(&unit, &key);
                }
                let table = self.const_expr(lhs)?;
                match table.value {
                    ConstValue::Table(id) => self.tables().get(id, &key),
                    _ => Err(Error::invalid_scope(format!(
                        "can't index {} at module scope",
                        table.tag()
                    ))),
                }
            }
            ExprKind::Binary {
                op: BinaryOp::Attach,
                lhs,
                rhs,
            } => {
                let value = self.const_expr(lhs)?;
                let env = self.const_expr(rhs)?;
                let index = self.new_global_cell(env)?;
                Ok(value.with_env(self.scopes.cell(index).data))
            }
            ExprKind::Call { .. } => Err(Error::invalid_scope(
                "can't call functions at module scope",
            )),
            ExprKind::Method { .. } => {
                Err(Error::invalid_scope("can't call methods at module scope"))
            }
            ExprKind::Unary { .. } => Err(Error::invalid_scope(
                "can't use unary operators at module scope",
            )),
            ExprKind::Binary { .. } => Err(Error::invalid_scope(
                "can't use binary operators at module scope",
            )),
        }
    }

    fn static_table(&mut self, kind: &str, entries: Vec<(ConstBox, ConstBox)>) -> Result<ConstBox> {
        let name = format!("{}.{kind}", self.unit);
        let id = self.pool.tables_mut().alloc(self.module, &name)?;
        for (key, value) in entries {
            self.pool.tables_mut().put(id, key, value)?;
        }
        Ok(ConstBox::table(id))
    }

    /// `alias.name` for an imported unit: its export, else any of its
    /// globals, else null.
    fn module_member(&self, unit: &UnitInterface, key: &ConstBox) -> Result<ConstBox> {
        let ConstValue::Table(exports) = unit.exports.value else {
            return Err(Error::internal("unit exports are not a table"));
        };
        let found = self.tables().get(exports, key)?;
        if found.tag() != TypeTag::Null {
            return Ok(found);
        }
        Ok(match &key.value {
            ConstValue::Str { text, .. } => unit.globals.get(&**text).cloned(),
            _ => None,
        }
        .unwrap_or_else(ConstBox::null))
    }
}

pub(super) fn arity(params: &[String]) -> Result<u32> {
    u32::try_from(params.len()).map_err(|_| Error::codegen("too many parameters"))
}
