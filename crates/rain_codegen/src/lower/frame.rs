//! Per-function lowering state and box-level IR helpers.
//!
//! Every expression lowers to a pointer to a 32-byte box cell. Cells are
//! explicit stack slots; nothing is kept in SSA variables, so blocks never
//! take parameters.

use std::collections::HashMap;

use cranelift_codegen::ir::{
    Block, FuncRef, GlobalValue, InstBuilder, MemFlags, SigRef, StackSlot, StackSlotData,
    StackSlotKind, Type, Value, types,
};
use cranelift_frontend::FunctionBuilder;
use cranelift_module::{DataId, FuncId, Module};
use rain_foundation::Result;
use rain_foundation::abi::{BOX_SIZE, DATA_OFFSET, ENV_OFFSET, SIZE_OFFSET, TAG_OFFSET};

use crate::constant::{ConstBox, ConstValue};
use crate::runtime::box_signature;
use crate::static_table::StaticTables;

pub(crate) fn flags() -> MemFlags {
    MemFlags::trusted()
}

/// Where a raised exception goes inside a `catch` or `?`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Handler {
    /// Cell receiving the exception.
    pub slot: StackSlot,
    /// Where control continues.
    pub target: Block,
}

/// Continuation points of the innermost loop.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LoopTargets {
    pub before: Block,
    pub after: Block,
}

pub(crate) struct FnCtx<'f> {
    pub b: FunctionBuilder<'f>,
    /// Result cell parameter.
    pub ret: Value,
    pub ptr: Type,
    pub handlers: Vec<Handler>,
    pub loops: Vec<LoopTargets>,
    /// Binding cells nulled in the entry block, not yet handed out.
    locals: Vec<StackSlot>,
    funcs: HashMap<FuncId, FuncRef>,
    data: HashMap<DataId, GlobalValue>,
    sigs: HashMap<u32, SigRef>,
}

impl<'f> FnCtx<'f> {
    pub fn new(b: FunctionBuilder<'f>, ret: Value, ptr: Type) -> Self {
        Self {
            b,
            ret,
            ptr,
            handlers: Vec::new(),
            loops: Vec::new(),
            locals: Vec::new(),
            funcs: HashMap::new(),
            data: HashMap::new(),
            sigs: HashMap::new(),
        }
    }

    pub fn func_ref(&mut self, module: &mut dyn Module, id: FuncId) -> FuncRef {
        *self
            .funcs
            .entry(id)
            .or_insert_with(|| module.declare_func_in_func(id, self.b.func))
    }

    /// Address of a data object.
    pub fn data_addr(&mut self, module: &mut dyn Module, id: DataId) -> Value {
        let gv = *self
            .data
            .entry(id)
            .or_insert_with(|| module.declare_data_in_func(id, self.b.func));
        self.b.ins().symbol_value(self.ptr, gv)
    }

    /// Signature reference for calling a box function of `arity` indirectly.
    pub fn sig_ref(&mut self, module: &dyn Module, arity: u32) -> SigRef {
        let sig = box_signature(module, arity);
        *self
            .sigs
            .entry(arity)
            .or_insert_with(|| self.b.import_signature(sig))
    }

    /// Direct call; returns the first result, if any.
    pub fn call(&mut self, module: &mut dyn Module, id: FuncId, args: &[Value]) -> Option<Value> {
        let fref = self.func_ref(module, id);
        let call = self.b.ins().call(fref, args);
        self.b.inst_results(call).first().copied()
    }

    /// Writes a compile-time box into a cell.
    pub fn store_const(
        &mut self,
        module: &mut dyn Module,
        tables: &StaticTables,
        cell: Value,
        value: &ConstBox,
    ) -> Result<()> {
        let data = match &value.value {
            ConstValue::Str { data, .. } => self.data_addr(module, *data),
            ConstValue::Table(id) => self.data_addr(module, tables.header(*id)),
            ConstValue::Func { func, .. } => {
                let fref = self.func_ref(module, *func);
                self.b.ins().func_addr(self.ptr, fref)
            }
            ConstValue::Null | ConstValue::Int(_) | ConstValue::Float(_) | ConstValue::Bool(_) => {
                let bits = i64::from_ne_bytes(value.data_word().to_ne_bytes());
                self.b.ins().iconst(types::I64, bits)
            }
        };
        let size = match value.size_word()? {
            0 => None,
            n => Some(self.b.ins().iconst(types::I32, i64::from(n))),
        };
        let env = value.env.map(|cell| self.data_addr(module, cell));
        self.store_fields(cell, value.tag().as_u8(), data, size, env);
        Ok(())
    }

    pub fn new_slot(&mut self, bytes: u32) -> StackSlot {
        self.b
            .create_sized_stack_slot(StackSlotData::new(StackSlotKind::ExplicitSlot, bytes, 3))
    }

    pub fn slot_addr(&mut self, slot: StackSlot) -> Value {
        self.b.ins().stack_addr(self.ptr, slot, 0)
    }

    /// Allocates `count` binding cells and nulls them at the current
    /// position, which must be the entry block. A path that skips a binding
    /// then reads null instead of a stale stack value.
    pub fn reserve_locals(&mut self, count: usize) {
        for _ in 0..count {
            let slot = self.new_slot(BOX_SIZE);
            let cell = self.slot_addr(slot);
            self.store_null(cell);
            self.locals.push(slot);
        }
    }

    /// A binding cell from the entry-block reserve. Falls back to a cell
    /// nulled here once the reserve runs out.
    pub fn local_slot(&mut self) -> StackSlot {
        if let Some(slot) = self.locals.pop() {
            return slot;
        }
        let slot = self.new_slot(BOX_SIZE);
        let cell = self.slot_addr(slot);
        self.store_null(cell);
        slot
    }

    /// A fresh null cell.
    pub fn new_cell(&mut self) -> Value {
        let slot = self.new_slot(BOX_SIZE);
        let cell = self.slot_addr(slot);
        self.store_null(cell);
        cell
    }

    pub fn store_null(&mut self, cell: Value) {
        let zero = self.b.ins().iconst(types::I64, 0);
        for word in 0..4 {
            self.b.ins().store(flags(), zero, cell, word * 8);
        }
    }

    pub fn copy_box(&mut self, src: Value, dst: Value) {
        for word in 0..4 {
            let value = self.b.ins().load(types::I64, flags(), src, word * 8);
            self.b.ins().store(flags(), value, dst, word * 8);
        }
    }

    /// Writes a box field by field. `data` is an `i64`, `size` an `i32`,
    /// `env` a pointer.
    pub fn store_fields(
        &mut self,
        cell: Value,
        tag: u8,
        data: Value,
        size: Option<Value>,
        env: Option<Value>,
    ) {
        self.store_null(cell);
        let tag = self.b.ins().iconst(types::I8, i64::from(tag));
        self.b.ins().store(flags(), tag, cell, TAG_OFFSET);
        self.b.ins().store(flags(), data, cell, DATA_OFFSET);
        if let Some(size) = size {
            self.b.ins().store(flags(), size, cell, SIZE_OFFSET);
        }
        if let Some(env) = env {
            self.b.ins().store(flags(), env, cell, ENV_OFFSET);
        }
    }

    /// The tag byte, zero-extended to `i32`.
    pub fn load_tag(&mut self, cell: Value) -> Value {
        self.b.ins().uload8(types::I32, flags(), cell, TAG_OFFSET)
    }

    pub fn load_data(&mut self, cell: Value) -> Value {
        self.b.ins().load(self.ptr, flags(), cell, DATA_OFFSET)
    }

    pub fn load_env(&mut self, cell: Value) -> Value {
        self.b.ins().load(self.ptr, flags(), cell, ENV_OFFSET)
    }

    pub fn store_env(&mut self, cell: Value, env: Value) {
        self.b.ins().store(flags(), env, cell, ENV_OFFSET);
    }

    /// Copies `*env` of the box at `func` into `cell` when it is non-null.
    pub fn inject_env(&mut self, func: Value, cell: Value) {
        let env = self.load_env(func);
        let copy = self.b.create_block();
        let done = self.b.create_block();
        self.b.ins().brif(env, copy, &[], done, &[]);
        self.b.switch_to_block(copy);
        self.copy_box(env, cell);
        self.b.ins().jump(done, &[]);
        self.b.switch_to_block(done);
    }

    /// Ends the current block with a jump and continues in `target`.
    pub fn jump_to(&mut self, target: Block) {
        self.b.ins().jump(target, &[]);
        self.b.switch_to_block(target);
    }

    /// Continues in a new block with no predecessors, after a terminator.
    pub fn unreachable_tail(&mut self) {
        let tail = self.b.create_block();
        self.b.switch_to_block(tail);
    }

    pub fn return_status(&mut self, status: i64) {
        let status = self.b.ins().iconst(types::I32, status);
        self.b.ins().return_(&[status]);
    }

    /// Branches on a runtime status: on failure the exception in `src` goes
    /// to the innermost handler, or to the caller with status 1.
    pub fn check_status(&mut self, status: Value, src: Value) {
        let fail = self.b.create_block();
        let ok = self.b.create_block();
        self.b.ins().brif(status, fail, &[], ok, &[]);
        self.b.switch_to_block(fail);
        match self.handlers.last().copied() {
            Some(handler) => {
                let dst = self.slot_addr(handler.slot);
                self.copy_box(src, dst);
                self.b.ins().jump(handler.target, &[]);
            }
            None => {
                let ret = self.ret;
                self.copy_box(src, ret);
                self.return_status(1);
            }
        }
        self.b.switch_to_block(ok);
    }
}
