//! Heap object layout.

use super::{context::Runtime, error::Fatal, raw::RawView, value::Tag, value::Value};

/// Signature of a builtin. The second argument is the environment of the
/// sequence currently being computed; a primitive may replace it.
pub type PrimFn = fn(&mut Runtime, &mut Value) -> Result<(), Fatal>;

#[derive(Clone, Copy)]
pub struct Primitive {
    pub name: &'static str,
    pub func: PrimFn,
}

/// Byte storage of a String object.
pub enum Buffer {
    /// Allocated by the runtime and released together with the cell.
    Owned(Box<[u8]>),
    /// Window onto memory the runtime does not own. Never released.
    View(RawView),
}

impl Buffer {
    /// Zero-filled owned buffer, or `None` if `len` bytes cannot be allocated.
    pub fn zeroed(len: usize) -> Option<Self> {
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(len).ok()?;
        bytes.resize(len, 0);
        Some(Buffer::Owned(bytes.into_boxed_slice()))
    }

    pub fn len(&self) -> usize {
        match self {
            Buffer::Owned(bytes) => bytes.len(),
            Buffer::View(view) => view.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, offset: usize) -> Option<u8> {
        match self {
            Buffer::Owned(bytes) => bytes.get(offset).copied(),
            Buffer::View(view) => view.read(offset),
        }
    }

    /// Stores `byte` at `offset`; out-of-bounds writes are ignored.
    pub fn set(&mut self, offset: usize, byte: u8) {
        match self {
            Buffer::Owned(bytes) => {
                if let Some(slot) = bytes.get_mut(offset) {
                    *slot = byte;
                }
            }
            Buffer::View(view) => view.write(offset, byte),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            Buffer::Owned(bytes) => &bytes[..],
            Buffer::View(view) => view.bytes(),
        }
    }
}

/// A heap cell.
///
/// The layout is fixed (`repr(C, u64)`) and the discriminants are the tags
/// the language observes, so a cell is a tag word followed by its payload.
/// A Pair cell is `[tag, car, cdr]`.
#[repr(C, u64)]
pub enum Object {
    Nil = 0,
    Atom(Box<[u8]>) = 1,
    Number(i64) = 2,
    Pair(Value, Value) = 3,
    Closure { body: Value, env: Value } = 4,
    Primitive(Primitive) = 5,
    String(Buffer) = 6,
}

impl Object {
    pub fn tag(&self) -> Tag {
        match self {
            Object::Nil => Tag::Nil,
            Object::Atom(_) => Tag::Atom,
            Object::Number(_) => Tag::Number,
            Object::Pair(..) => Tag::Pair,
            Object::Closure { .. } => Tag::Closure,
            Object::Primitive(_) => Tag::Primitive,
            Object::String(_) => Tag::String,
        }
    }

    /// Outgoing references traced by the collector.
    pub fn for_each_reference(&self, mut visit: impl FnMut(Value)) {
        match self {
            Object::Pair(car, cdr) => {
                visit(*car);
                visit(*cdr);
            }
            Object::Closure { body, env } => {
                visit(*body);
                visit(*env);
            }
            Object::Nil
            | Object::Atom(_)
            | Object::Number(_)
            | Object::Primitive(_)
            | Object::String(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn pair_cell_is_tag_car_cdr() {
        let cell = Object::Pair(Value::from_raw(7), Value::from_raw(9));
        let words = &cell as *const Object as *const u64;
        let words = unsafe { std::slice::from_raw_parts(words, 3) };
        assert_eq!(words, &[Tag::Pair as u64, 7, 9]);
        assert!(size_of::<Object>() >= 3 * size_of::<u64>());
    }

    #[test]
    fn references_are_only_traced_through_pairs_and_closures() {
        let mut seen = Vec::new();
        Object::Closure {
            body: Value::from_raw(3),
            env: Value::from_raw(4),
        }
        .for_each_reference(|v| seen.push(v.raw()));
        Object::Number(12).for_each_reference(|v| seen.push(v.raw()));
        Object::String(Buffer::zeroed(4).unwrap()).for_each_reference(|v| seen.push(v.raw()));
        assert_eq!(seen, vec![3, 4]);
    }

    #[test]
    fn owned_buffer_bounds() {
        let mut buf = Buffer::zeroed(2).unwrap();
        buf.set(1, 0x41);
        buf.set(5, 0x42);
        assert_eq!(buf.get(1), Some(0x41));
        assert_eq!(buf.get(2), None);
        assert_eq!(buf.bytes(), &[0, 0x41]);
        assert!(matches!(buf, Buffer::Owned(_)));
    }
}
