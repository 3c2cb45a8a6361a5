//! Environments are association lists of `(atom . value)` pairs, newest
//! first. Defining never mutates an existing environment, so a closure that
//! captured one keeps seeing exactly the bindings it was created under.

use super::{
    context::Runtime,
    error::{Fatal, FatalResult},
    object::{Object, PrimFn},
    value::Value,
};

impl Runtime {
    pub fn env_find(&self, env: Value, key: Value) -> FatalResult<Value> {
        let Some(name) = self.atom_bytes(key) else {
            return Err(self.mismatch("env_find", "atom key", key));
        };

        let mut env = env;
        while !env.is_nil() {
            let binding = self.car(env)?;
            if self.car(binding)? == key {
                return self.cdr(binding);
            }
            env = self.cdr(env)?;
        }

        Err(Fatal::Unbound(String::from_utf8_lossy(name).into_owned()))
    }

    /// Returns `env` extended with `key -> value`.
    pub fn env_define(&mut self, env: Value, key: Value, value: Value) -> FatalResult<Value> {
        let binding = self.with_roots(&[env], |rt| rt.make_pair(key, value))?;
        self.make_pair(binding, env)
    }

    pub fn env_define_prim(
        &mut self,
        env: Value,
        name: &'static str,
        func: PrimFn,
    ) -> FatalResult<Value> {
        let key = self.intern(name)?;
        let prim = self.with_roots(&[env], |rt| rt.make_primitive(name, func))?;
        self.env_define(env, key, prim)
    }

    /// Top-level binding of `name`, if any.
    pub fn global(&self, name: &str) -> Option<Value> {
        let mut env = self.state.env;
        while let Some(Object::Pair(binding, rest)) = self.heap.get(env) {
            if let Some(Object::Pair(key, value)) = self.heap.get(*binding) {
                if self.atom_bytes(*key) == Some(name.as_bytes()) {
                    return Some(*value);
                }
            }
            env = *rest;
        }
        None
    }
}
