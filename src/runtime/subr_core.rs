//! Builtin primitives.
//!
//! Every primitive takes its operands from the value stack, top first, and
//! pushes its result. Arithmetic treats anything that is not a Number as 0.

use super::{
    context::Runtime,
    error::{Fatal, FatalResult},
    object::{Buffer, Object, PrimFn},
    raw,
    value::Value,
};

pub const CORE_PRIMITIVES: &[(&str, PrimFn)] = &[
    ("push", push),
    ("pop", pop),
    ("cons", cons),
    ("car", car),
    ("cdr", cdr),
    ("eq", eq),
    ("cswap", cswap),
    ("tag", tag),
    ("read", read),
    ("print", print),
];

pub const EXTRA_PRIMITIVES: &[(&str, PrimFn)] = &[
    ("stack", stack),
    ("env", env),
    ("-", sub),
    ("*", mul),
    ("nand", nand),
    ("<<", shl),
    (">>", shr),
    ("make-string", make_string),
    ("string-peek", string_peek),
    ("string-poke", string_poke),
    ("gc", gc),
];

impl Runtime {
    /// Binds every enabled primitive on top of `env`.
    pub(crate) fn install_primitives(&mut self, env: Value) -> FatalResult<Value> {
        let mut tables = vec![CORE_PRIMITIVES, EXTRA_PRIMITIVES];
        if self.options().lowlevel {
            tables.push(raw::LOWLEVEL_PRIMITIVES);
        }

        let mut env = env;
        for &(name, func) in tables.into_iter().flatten() {
            env = self.env_define_prim(env, name, func)?;
        }
        Ok(env)
    }
}

/// Environment dereference: `key push` pushes the value bound to `key`.
fn push(rt: &mut Runtime, env: &mut Value) -> FatalResult {
    let key = rt.pop()?;
    let value = rt.env_find(*env, key)?;
    rt.push(value)
}

/// `value key pop` binds `key` in the current sequence.
fn pop(rt: &mut Runtime, env: &mut Value) -> FatalResult {
    let key = rt.pop()?;
    let value = rt.pop()?;
    *env = rt.env_define(*env, key, value)?;
    Ok(())
}

fn cons(rt: &mut Runtime, _: &mut Value) -> FatalResult {
    let car = rt.pop()?;
    let cdr = rt.pop()?;
    let pair = rt.make_pair(car, cdr)?;
    rt.push(pair)
}

fn car(rt: &mut Runtime, _: &mut Value) -> FatalResult {
    let pair = rt.pop()?;
    let car = rt.car(pair)?;
    rt.push(car)
}

fn cdr(rt: &mut Runtime, _: &mut Value) -> FatalResult {
    let pair = rt.pop()?;
    let cdr = rt.cdr(pair)?;
    rt.push(cdr)
}

fn eq(rt: &mut Runtime, _: &mut Value) -> FatalResult {
    let a = rt.pop()?;
    let b = rt.pop()?;
    let result = if rt.equal(a, b) {
        rt.state.atom_true
    } else {
        rt.state.nil
    };
    rt.push(result)
}

/// Swaps the two values under the condition if it is `t`.
fn cswap(rt: &mut Runtime, _: &mut Value) -> FatalResult {
    let cond = rt.pop()?;
    if cond != rt.state.atom_true {
        return Ok(());
    }

    let a = rt.pop()?;
    let b = rt.pop()?;
    rt.with_roots(&[b], |rt| rt.push(a))?;
    rt.push(b)
}

fn tag(rt: &mut Runtime, _: &mut Value) -> FatalResult {
    let value = rt.pop()?;
    let tag = rt
        .tag_of(value)
        .ok_or_else(|| rt.mismatch("tag", "object", value))?;
    rt.push_i64(tag as i64)
}

fn read(rt: &mut Runtime, _: &mut Value) -> FatalResult {
    let term = rt.read()?;
    rt.push(term)
}

fn print(rt: &mut Runtime, _: &mut Value) -> FatalResult {
    let value = rt.pop()?;
    rt.print_value(value)
}

fn stack(rt: &mut Runtime, _: &mut Value) -> FatalResult {
    let stack = rt.state.stack;
    rt.push(stack)
}

fn env(rt: &mut Runtime, env: &mut Value) -> FatalResult {
    rt.push(*env)
}

fn binop(rt: &mut Runtime, op: fn(i64, i64) -> i64) -> FatalResult {
    let b = rt.pop_i64()?;
    let a = rt.pop_i64()?;
    rt.push_i64(op(a, b))
}

fn sub(rt: &mut Runtime, _: &mut Value) -> FatalResult {
    binop(rt, i64::wrapping_sub)
}

fn mul(rt: &mut Runtime, _: &mut Value) -> FatalResult {
    binop(rt, i64::wrapping_mul)
}

fn nand(rt: &mut Runtime, _: &mut Value) -> FatalResult {
    binop(rt, |a, b| !(a & b))
}

// shift amounts are taken modulo 64
fn shl(rt: &mut Runtime, _: &mut Value) -> FatalResult {
    binop(rt, |a, b| a << (b & 63))
}

fn shr(rt: &mut Runtime, _: &mut Value) -> FatalResult {
    binop(rt, |a, b| a >> (b & 63))
}

fn make_string(rt: &mut Runtime, _: &mut Value) -> FatalResult {
    let len = rt.pop_i64()?;
    let len = usize::try_from(len).map_err(|_| Fatal::InvalidArgument {
        op: "make-string",
        message: format!("negative length {}", len),
    })?;
    let buffer = Buffer::zeroed(len).ok_or_else(|| Fatal::InvalidArgument {
        op: "make-string",
        message: format!("cannot allocate {} bytes", len),
    })?;
    let string = rt.make_string(buffer)?;
    rt.push(string)
}

/// `string offset string-peek` pushes the byte, or 0 when out of bounds.
fn string_peek(rt: &mut Runtime, _: &mut Value) -> FatalResult {
    let offset = rt.pop_i64()?;
    let string = rt.pop()?;
    let byte = match rt.object(string) {
        Some(Object::String(buffer)) => usize::try_from(offset)
            .ok()
            .and_then(|offset| buffer.get(offset))
            .unwrap_or(0),
        _ => return Err(rt.mismatch("string-peek", "string", string)),
    };
    rt.push_i64(byte as i64)
}

/// `string offset value string-poke` stores the low byte of `value`.
fn string_poke(rt: &mut Runtime, _: &mut Value) -> FatalResult {
    let value = rt.pop_i64()?;
    let offset = rt.pop_i64()?;
    let string = rt.pop()?;
    let found = rt.type_name(string);
    match rt.heap.get_mut(string) {
        Some(Object::String(buffer)) => {
            if let Ok(offset) = usize::try_from(offset) {
                buffer.set(offset, value as u8);
            }
            Ok(())
        }
        _ => Err(Fatal::TypeMismatch {
            op: "string-poke",
            expected: "string",
            found,
        }),
    }
}

fn gc(rt: &mut Runtime, _: &mut Value) -> FatalResult {
    rt.collect();
    Ok(())
}
