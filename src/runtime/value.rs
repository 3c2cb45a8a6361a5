/// Handle to a heap slot.
///
/// Values are plain slot indices. Slot 0 always holds the Nil sentinel, so
/// `Value::NIL` is usable without consulting the heap. Two values are the same
/// object exactly when their handles are equal. A handle that does not name an
/// occupied slot is *absent*; it can only be produced by the raw primitives.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(transparent)]
pub struct Value(u64);

impl Value {
    pub const NIL: Value = Value(0);

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub const fn is_nil(self) -> bool {
        self.0 == 0
    }

    /// Slot index, or `None` if the handle cannot index a slot table on this target.
    pub fn slot(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

/// Variant tag as observed by the `tag` primitive.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u64)]
pub enum Tag {
    Nil = 0,
    Atom = 1,
    Number = 2,
    Pair = 3,
    Closure = 4,
    Primitive = 5,
    String = 6,
}

impl Tag {
    pub const fn name(self) -> &'static str {
        match self {
            Tag::Nil => "nil",
            Tag::Atom => "atom",
            Tag::Number => "number",
            Tag::Pair => "pair",
            Tag::Closure => "closure",
            Tag::Primitive => "primitive",
            Tag::String => "string",
        }
    }
}
