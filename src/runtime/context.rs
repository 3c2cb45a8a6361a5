//! The interpreter context: heap, roots, value stack and I/O.

use std::io::{self, Write};

use super::{
    error::{Fatal, FatalResult},
    heap::Heap,
    object::{Buffer, Object, PrimFn, Primitive},
    reader::Source,
    value::{Tag, Value},
};
use crate::vm::options::RuntimeOptions;

/// Interpreter state block.
///
/// One 64-bit word per field, in declaration order. Its address is what
/// `ptr-state!` hands out, so scripts can find every root through it. The
/// first ten fields are collection roots.
#[repr(C)]
pub struct State {
    pub nil: Value,
    /// Terms queued by a `^`/`$` directive, emitted by subsequent reads.
    pub read_stack: Value,
    pub interned_atoms: Value,
    pub atom_true: Value,
    pub atom_quote: Value,
    pub atom_push: Value,
    pub atom_pop: Value,
    pub stack: Value,
    pub env: Value,
    pub program: Value,
    pub slots: u64,
    pub capacity: u64,
}

impl State {
    pub const ROOT_COUNT: usize = 10;

    pub fn roots(&self) -> [Value; Self::ROOT_COUNT] {
        [
            self.nil,
            self.read_stack,
            self.interned_atoms,
            self.atom_true,
            self.atom_quote,
            self.atom_push,
            self.atom_pop,
            self.stack,
            self.env,
            self.program,
        ]
    }
}

pub struct Runtime {
    pub(crate) heap: Heap,
    pub(crate) state: Box<State>,
    /// Extra roots held by Rust code across allocations.
    pub(crate) shadow: Vec<Value>,
    pub(crate) source: Source,
    pub(crate) output: Box<dyn Write>,
    options: RuntimeOptions,
}

impl Runtime {
    pub fn new(options: RuntimeOptions, source: impl Into<Vec<u8>>) -> FatalResult<Self> {
        let heap = Heap::new(options.heap_slots);
        log::info!("forsp runtime: {} object slots", heap.capacity());

        let state = Box::new(State {
            nil: Value::NIL,
            read_stack: Value::NIL,
            interned_atoms: Value::NIL,
            atom_true: Value::NIL,
            atom_quote: Value::NIL,
            atom_push: Value::NIL,
            atom_pop: Value::NIL,
            stack: Value::NIL,
            env: Value::NIL,
            program: Value::NIL,
            slots: heap.slots_address(),
            capacity: heap.capacity() as u64,
        });

        let mut rt = Self {
            heap,
            state,
            shadow: Vec::new(),
            source: Source::new(source.into()),
            output: Box::new(io::stdout()),
            options,
        };

        rt.state.atom_true = rt.intern("t")?;
        rt.state.atom_quote = rt.intern("quote")?;
        rt.state.atom_push = rt.intern("push")?;
        rt.state.atom_pop = rt.intern("pop")?;

        let env = rt.install_primitives(Value::NIL)?;
        rt.state.env = env;
        Ok(rt)
    }

    /// Redirects everything `print` produces.
    pub fn with_output(mut self, output: impl Write + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Reads one top-level term and computes it in the initial environment.
    pub fn run(&mut self) -> FatalResult {
        let program = self.read()?;
        self.state.program = program;
        let env = self.state.env;

        let result = self.compute(program, env);
        self.output.flush()?;
        result
    }

    // -----------------------------------------------------------------------
    // Allocation
    // -----------------------------------------------------------------------

    /// Allocates a cell, collecting once if the table is full.
    ///
    /// References carried by `object` are rooted for the duration of the
    /// collection, so callers may pass freshly popped values straight in.
    pub fn alloc(&mut self, object: Object) -> FatalResult<Value> {
        let object = match self.heap.try_allocate(object) {
            Ok(value) => return Ok(value),
            Err(object) => object,
        };

        let base = self.shadow.len();
        object.for_each_reference(|value| self.shadow.push(value));
        self.collect();
        self.shadow.truncate(base);

        self.heap.try_allocate(object).map_err(|_| Fatal::Exhausted {
            capacity: self.heap.capacity(),
        })
    }

    /// Runs `f` with `roots` added to the root set.
    pub fn with_roots<T>(&mut self, roots: &[Value], f: impl FnOnce(&mut Self) -> T) -> T {
        let base = self.shadow.len();
        self.shadow.extend_from_slice(roots);
        let result = f(self);
        self.shadow.truncate(base);
        result
    }

    /// Forces a collection pass; returns the number of freed slots.
    pub fn collect(&mut self) -> usize {
        let roots = self.state.roots();
        self.heap
            .collect(roots.into_iter().chain(self.shadow.iter().copied()))
    }

    pub fn make_number(&mut self, n: i64) -> FatalResult<Value> {
        self.alloc(Object::Number(n))
    }

    pub fn make_pair(&mut self, car: Value, cdr: Value) -> FatalResult<Value> {
        self.alloc(Object::Pair(car, cdr))
    }

    pub fn make_closure(&mut self, body: Value, env: Value) -> FatalResult<Value> {
        self.alloc(Object::Closure { body, env })
    }

    pub fn make_primitive(&mut self, name: &'static str, func: PrimFn) -> FatalResult<Value> {
        self.alloc(Object::Primitive(Primitive { name, func }))
    }

    pub fn make_string(&mut self, buffer: Buffer) -> FatalResult<Value> {
        self.alloc(Object::String(buffer))
    }

    pub fn make_string_from(&mut self, bytes: &[u8]) -> FatalResult<Value> {
        self.make_string(Buffer::Owned(bytes.into()))
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    pub fn object(&self, value: Value) -> Option<&Object> {
        self.heap.get(value)
    }

    pub fn tag_of(&self, value: Value) -> Option<Tag> {
        self.heap.get(value).map(Object::tag)
    }

    pub fn type_name(&self, value: Value) -> &'static str {
        self.tag_of(value).map_or("NULL", Tag::name)
    }

    pub fn is_atom(&self, value: Value) -> bool {
        self.tag_of(value) == Some(Tag::Atom)
    }

    pub fn number(&self, value: Value) -> Option<i64> {
        match self.heap.get(value) {
            Some(Object::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// Integer view used by the arithmetic primitives: anything but a Number is 0.
    pub fn number_or_zero(&self, value: Value) -> i64 {
        self.number(value).unwrap_or(0)
    }

    pub fn atom_bytes(&self, value: Value) -> Option<&[u8]> {
        match self.heap.get(value) {
            Some(Object::Atom(text)) => Some(&text[..]),
            _ => None,
        }
    }

    /// Spelling of an Atom, if it is valid UTF-8.
    pub fn atom_text(&self, value: Value) -> Option<&str> {
        std::str::from_utf8(self.atom_bytes(value)?).ok()
    }

    /// Identity, or two Numbers holding the same integer.
    pub fn equal(&self, a: Value, b: Value) -> bool {
        if a == b {
            return true;
        }
        matches!((self.number(a), self.number(b)), (Some(x), Some(y)) if x == y)
    }

    pub fn mismatch(&self, op: &'static str, expected: &'static str, found: Value) -> Fatal {
        Fatal::TypeMismatch {
            op,
            expected,
            found: self.type_name(found),
        }
    }

    pub fn car(&self, value: Value) -> FatalResult<Value> {
        match self.heap.get(value) {
            Some(Object::Pair(car, _)) => Ok(*car),
            _ => Err(self.mismatch("car", "pair", value)),
        }
    }

    pub fn cdr(&self, value: Value) -> FatalResult<Value> {
        match self.heap.get(value) {
            Some(Object::Pair(_, cdr)) => Ok(*cdr),
            _ => Err(self.mismatch("cdr", "pair", value)),
        }
    }

    // -----------------------------------------------------------------------
    // Value stack
    // -----------------------------------------------------------------------

    pub fn push(&mut self, value: Value) -> FatalResult {
        let stack = self.state.stack;
        self.state.stack = self.make_pair(value, stack)?;
        Ok(())
    }

    pub fn try_pop(&mut self) -> FatalResult<Option<Value>> {
        let stack = self.state.stack;
        if stack.is_nil() {
            return Ok(None);
        }
        let top = self.car(stack)?;
        self.state.stack = self.cdr(stack)?;
        Ok(Some(top))
    }

    pub fn pop(&mut self) -> FatalResult<Value> {
        self.try_pop()?.ok_or(Fatal::StackUnderflow)
    }

    pub fn pop_i64(&mut self) -> FatalResult<i64> {
        let value = self.pop()?;
        Ok(self.number_or_zero(value))
    }

    pub fn push_i64(&mut self, n: i64) -> FatalResult {
        let value = self.make_number(n)?;
        self.push(value)
    }

    /// Stack contents, top first.
    pub fn stack_values(&self) -> Vec<Value> {
        self.list_values(self.state.stack)
    }

    pub fn stack_depth(&self) -> usize {
        self.stack_values().len()
    }
}
