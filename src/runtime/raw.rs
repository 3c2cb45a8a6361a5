//! Raw memory access.
//!
//! These primitives hand scripts direct access to process memory: reading and
//! writing arbitrary words, forging object handles, and wrapping foreign
//! memory in String objects. They break every guarantee the object model
//! makes and are only installed when `RuntimeOptions::lowlevel` is set. Do not
//! enable them for untrusted programs.
//!
//! This module is the only place that dereferences raw pointers.

use std::slice;

use super::{
    context::{Runtime, State},
    error::{Fatal, FatalResult},
    object::{Buffer, PrimFn},
    value::Value,
};

pub const LOWLEVEL_PRIMITIVES: &[(&str, PrimFn)] = &[
    ("ptr-state!", ptr_state),
    ("ptr-read!", ptr_read),
    ("ptr-write!", ptr_write),
    ("ptr-to-obj!", ptr_to_obj),
    ("ptr-from-obj!", ptr_from_obj),
    ("string-memview", string_memview),
];

/// Borrowed window onto memory owned by someone else.
#[derive(Clone, Copy)]
pub struct RawView {
    addr: *mut u8,
    len: usize,
}

impl RawView {
    /// # Safety
    ///
    /// `addr..addr + len` must stay readable, and writable if the view is
    /// poked, for as long as any String refers to the view.
    pub unsafe fn new(addr: *mut u8, len: usize) -> Self {
        Self { addr, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn read(&self, offset: usize) -> Option<u8> {
        (offset < self.len).then(|| unsafe { self.addr.add(offset).read() })
    }

    pub fn write(&self, offset: usize, byte: u8) {
        if offset < self.len {
            unsafe { self.addr.add(offset).write(byte) }
        }
    }

    pub fn bytes(&self) -> &[u8] {
        if self.addr.is_null() || self.len == 0 {
            return &[];
        }
        unsafe { slice::from_raw_parts(self.addr, self.len) }
    }
}

impl Runtime {
    /// Address `ptr-state!` reports.
    pub fn state_address(&self) -> u64 {
        &*self.state as *const State as u64
    }
}

fn ptr_state(rt: &mut Runtime, _: &mut Value) -> FatalResult {
    let addr = rt.state_address();
    rt.push_i64(addr as i64)
}

fn ptr_read(rt: &mut Runtime, _: &mut Value) -> FatalResult {
    let addr = rt.pop_i64()?;
    let word = unsafe { (addr as usize as *const i64).read_unaligned() };
    rt.push_i64(word)
}

/// `addr word ptr-write!`
fn ptr_write(rt: &mut Runtime, _: &mut Value) -> FatalResult {
    let word = rt.pop_i64()?;
    let addr = rt.pop_i64()?;
    unsafe { (addr as usize as *mut i64).write_unaligned(word) };
    Ok(())
}

fn ptr_to_obj(rt: &mut Runtime, _: &mut Value) -> FatalResult {
    let raw = rt.pop_i64()?;
    rt.push(Value::from_raw(raw as u64))
}

fn ptr_from_obj(rt: &mut Runtime, _: &mut Value) -> FatalResult {
    let value = rt.pop()?;
    rt.push_i64(value.raw() as i64)
}

/// `addr size string-memview` pushes a String viewing `size` bytes at `addr`.
fn string_memview(rt: &mut Runtime, _: &mut Value) -> FatalResult {
    let size = rt.pop_i64()?;
    let addr = rt.pop_i64()?;
    let len = usize::try_from(size).map_err(|_| Fatal::InvalidArgument {
        op: "string-memview",
        message: format!("negative size {}", size),
    })?;

    let view = unsafe { RawView::new(addr as usize as *mut u8, len) };
    let string = rt.make_string(Buffer::View(view))?;
    rt.push(string)
}
