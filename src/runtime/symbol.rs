use super::{context::Runtime, error::FatalResult, object::Object, value::Value};

impl Runtime {
    pub fn intern(&mut self, text: &str) -> FatalResult<Value> {
        self.intern_bytes(text.as_bytes())
    }

    /// Returns the unique Atom spelled `text`, creating it on first use.
    ///
    /// Spellings are compared byte for byte; they need not be UTF-8. The
    /// registry is an ordinary list of atoms, newest first, searched
    /// linearly.
    pub fn intern_bytes(&mut self, text: &[u8]) -> FatalResult<Value> {
        let mut list = self.state.interned_atoms;
        while let Some(Object::Pair(atom, rest)) = self.heap.get(list) {
            if self.atom_bytes(*atom) == Some(text) {
                return Ok(*atom);
            }
            list = *rest;
        }

        let atom = self.alloc(Object::Atom(text.into()))?;
        let registry = self.state.interned_atoms;
        self.state.interned_atoms = self.make_pair(atom, registry)?;
        Ok(atom)
    }
}
