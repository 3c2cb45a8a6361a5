//! The evaluator.
//!
//! `compute` runs a term sequence left to right against the value stack.
//! `eval` dispatches a single term: atoms are looked up and their binding is
//! invoked (closure), called (primitive) or pushed; lists in term position are
//! not run but captured with the current environment into a closure.
//!
//! Each active `compute` keeps its remaining sequence and its environment in
//! two shadow-root slots. Bindings made by `pop` grow that environment slot
//! and vanish with the frame.

use super::{
    context::Runtime,
    error::{Fatal, FatalResult},
    object::Object,
    value::Value,
};

const TRACE: &str = "forsp::eval";

impl Runtime {
    pub fn compute(&mut self, comp: Value, env: Value) -> FatalResult {
        let frame = self.shadow.len();
        self.shadow.push(comp);
        self.shadow.push(env);
        let result = self.compute_frame(frame);
        self.shadow.truncate(frame);
        result
    }

    fn compute_frame(&mut self, frame: usize) -> FatalResult {
        let (seq_slot, env_slot) = (frame, frame + 1);

        loop {
            let comp = self.shadow[seq_slot];
            if comp == self.state.nil {
                return Ok(());
            }
            if log::log_enabled!(target: TRACE, log::Level::Trace) {
                log::trace!(
                    target: TRACE,
                    "compute: {} (stack depth {})",
                    self.render(comp),
                    self.stack_depth()
                );
            }

            let cmd = self.car(comp)?;
            let rest = self.cdr(comp)?;
            self.shadow[seq_slot] = rest;

            if cmd == self.state.atom_quote {
                if rest == self.state.nil {
                    return Err(Fatal::DanglingQuote);
                }
                let literal = self.car(rest)?;
                self.shadow[seq_slot] = self.cdr(rest)?;
                self.push(literal)?;
                continue;
            }

            // A closure called as the last term replaces this frame.
            if rest == self.state.nil && self.is_atom(cmd) {
                let callee = self.env_find(self.shadow[env_slot], cmd)?;
                if let Some(Object::Closure { body, env }) = self.heap.get(callee) {
                    self.shadow[seq_slot] = *body;
                    self.shadow[env_slot] = *env;
                    continue;
                }
            }

            let mut env = self.shadow[env_slot];
            self.eval(cmd, &mut env)?;
            self.shadow[env_slot] = env;
        }
    }

    pub fn eval(&mut self, term: Value, env: &mut Value) -> FatalResult {
        if log::log_enabled!(target: TRACE, log::Level::Trace) {
            log::trace!(target: TRACE, "eval: {}", self.render(term));
        }

        match self.heap.get(term) {
            Some(Object::Atom(_)) => {
                let value = self.env_find(*env, term)?;
                match self.heap.get(value) {
                    Some(Object::Closure { body, env: captured }) => {
                        let (body, captured) = (*body, *captured);
                        self.compute(body, captured)
                    }
                    Some(Object::Primitive(prim)) => {
                        let func = prim.func;
                        func(self, env)
                    }
                    _ => self.push(value),
                }
            }
            Some(Object::Nil | Object::Pair(..)) => {
                let closure = self.make_closure(term, *env)?;
                self.push(closure)
            }
            _ => self.push(term),
        }
    }

    /// Invokes the closure on top of the stack, as `force` would in the language.
    pub fn force(&mut self) -> FatalResult {
        let callee = self.pop()?;
        match self.heap.get(callee) {
            Some(Object::Closure { body, env }) => {
                let (body, env) = (*body, *env);
                self.compute(body, env)
            }
            _ => Err(self.mismatch("force", "closure", callee)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{
        error::Fatal,
        testing::{run, runtime},
        value::Tag,
    };

    #[test]
    fn arithmetic_operand_order() {
        let (rt, out) = run("(10 3 - print  6 7 * print  8 2 << print  -16 2 >> print)");
        assert_eq!(out, "7\n42\n32\n-4\n");
        assert_eq!(rt.stack_depth(), 0);
    }

    #[test]
    fn quote_pushes_without_evaluating() {
        let (rt, out) = run("('print 'undefined-name '(1 2 cons) stack print)");
        assert_eq!(out, "((1 2 cons) undefined-name print)\n");
        assert_eq!(rt.stack_depth(), 3);
    }

    #[test]
    fn lists_in_term_position_become_closures() {
        let (mut rt, _) = run("((1 2) ())");
        let top = rt.pop().unwrap();
        let below = rt.pop().unwrap();
        assert_eq!(rt.tag_of(top), Some(Tag::Closure));
        assert_eq!(rt.tag_of(below), Some(Tag::Closure));
        assert!(rt.render(top).starts_with("CLOSURE<(), "));
        assert!(rt.render(below).starts_with("CLOSURE<(1 2), "));
    }

    #[test]
    fn pop_binds_for_the_rest_of_the_sequence_only() {
        let (_, out) = run("(5 $x ^x print (9 $x ^x print) $inner inner ^x print)");
        assert_eq!(out, "5\n9\n5\n");
    }

    #[test]
    fn bindings_do_not_leak_out_of_a_closure() {
        let mut rt = runtime("((1 $leaked) $f f ^leaked)");
        assert!(matches!(rt.run(), Err(Fatal::Unbound(name)) if name == "leaked"));
    }

    #[test]
    fn closures_resolve_against_their_capture() {
        let (_, out) = run("(1 $x (^x print) $show 2 $x show ^x print)");
        assert_eq!(out, "1\n2\n");
    }

    #[test]
    fn atoms_bound_to_plain_values_are_pushed() {
        let (_, out) = run("(42 $answer answer print)");
        assert_eq!(out, "42\n");
    }

    #[test]
    fn trailing_quote_is_rejected() {
        let mut rt = runtime("(1 ')");
        assert!(matches!(rt.run(), Err(Fatal::DanglingQuote)));
    }

    #[test]
    fn unbound_atom_is_fatal() {
        let mut rt = runtime("(nope)");
        assert!(matches!(rt.run(), Err(Fatal::Unbound(name)) if name == "nope"));
    }

    #[test]
    fn tail_calls_run_in_constant_stack() {
        // counts down from 100000 through a self-passing closure in tail position
        let source = "(
            ($x x) $force
            (cswap $_ force) $if
            ($self $n (^n 1 - ^self self) () ^n 0 eq if) $loop
            100000 ^loop loop
            'done print
        )";
        let (rt, out) = run(source);
        assert_eq!(out, "done\n");
        assert_eq!(rt.stack_depth(), 0);
    }

    #[test]
    fn force_runs_the_closure_on_top() {
        let mut rt = runtime("(3 4 -)");
        let program = rt.read().unwrap();
        let env = rt.state().env;
        rt.with_roots(&[program], |rt| {
            rt.make_closure(program, env).and_then(|c| rt.push(c))
        })
        .unwrap();
        rt.force().unwrap();
        assert_eq!(rt.pop_i64().unwrap(), -1);
        assert!(matches!(rt.force(), Err(Fatal::StackUnderflow)));
    }
}
