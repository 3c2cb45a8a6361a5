//! Canonical rendering of values.

use std::io::{self, Write};

use super::{context::Runtime, error::FatalResult, heap::Heap, object::Object, value::Value};

pub struct Printer<'a> {
    heap: &'a Heap,
    out: &'a mut dyn Write,
}

impl<'a> Printer<'a> {
    pub fn new(heap: &'a Heap, out: &'a mut dyn Write) -> Self {
        Self { heap, out }
    }

    pub fn print(&mut self, value: Value) -> io::Result<()> {
        let heap = self.heap;
        match heap.get(value) {
            None => self.out.write_all(b"NULL"),
            Some(Object::Nil) => self.out.write_all(b"()"),
            Some(Object::Atom(text)) => self.out.write_all(text),
            Some(Object::Number(n)) => write!(self.out, "{}", n),
            Some(Object::Pair(car, cdr)) => {
                self.out.write_all(b"(")?;
                self.print(*car)?;
                self.print_list_tail(*cdr)
            }
            Some(Object::Closure { body, env }) => {
                self.out.write_all(b"CLOSURE<")?;
                self.print(*body)?;
                write!(self.out, ", {:#x}>", env.raw())
            }
            Some(Object::Primitive(prim)) => write!(self.out, "PRIM<{}>", prim.name),
            Some(Object::String(buffer)) => self.out.write_all(buffer.bytes()),
        }
    }

    fn print_list_tail(&mut self, mut tail: Value) -> io::Result<()> {
        let heap = self.heap;
        loop {
            match heap.get(tail) {
                Some(Object::Nil) => return self.out.write_all(b")"),
                Some(Object::Pair(car, cdr)) => {
                    self.out.write_all(b" ")?;
                    self.print(*car)?;
                    tail = *cdr;
                }
                _ => {
                    self.out.write_all(b" . ")?;
                    self.print(tail)?;
                    return self.out.write_all(b")");
                }
            }
        }
    }
}

impl Runtime {
    /// Writes `value` and a newline to the output sink.
    pub fn print_value(&mut self, value: Value) -> FatalResult {
        let mut printer = Printer::new(&self.heap, &mut *self.output);
        printer.print(value)?;
        self.output.write_all(b"\n")?;
        Ok(())
    }

    /// Renders `value` without a trailing newline. Non-UTF-8 string bytes are
    /// replaced.
    pub fn render(&self, value: Value) -> String {
        let mut buf = Vec::new();
        // writing into a Vec cannot fail
        let _ = Printer::new(&self.heap, &mut buf).print(value);
        String::from_utf8_lossy(&buf).into_owned()
    }
}
