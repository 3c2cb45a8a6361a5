//! Source text to terms.
//!
//! [`Source`] is the lexical layer over the input bytes; [`Runtime::read`]
//! builds terms from it. The `^name` and `$name` directives expand to
//! `quote name push` and `quote name pop`; the expansion is queued in the
//! state block and handed out one term per read.

use super::{
    context::Runtime,
    error::{Fatal, FatalResult},
    value::Value,
};

pub struct Source {
    input: Vec<u8>,
    pos: usize,
}

fn is_white(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n')
}

fn is_directive(c: u8) -> bool {
    matches!(c, b'\'' | b'^' | b'$')
}

fn is_punctuation(c: u8) -> bool {
    is_white(c) || is_directive(c) || matches!(c, b'(' | b')' | b';' | b'"')
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Source {
    pub fn new(input: Vec<u8>) -> Self {
        Self { input, pos: 0 }
    }

    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn advance(&mut self) {
        debug_assert!(!self.at_end());
        self.pos += 1;
    }

    fn next_byte(&mut self) -> FatalResult<u8> {
        let c = self.peek().ok_or(Fatal::UnexpectedEof)?;
        self.advance();
        Ok(c)
    }

    pub fn skip_white_and_comments(&mut self) {
        while let Some(c) = self.peek() {
            if is_white(c) {
                self.advance();
            } else if c == b';' {
                while let Some(c) = self.peek() {
                    self.advance();
                    if c == b'\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Consumes a run of non-punctuation bytes.
    pub fn scan_scalar(&mut self) -> Vec<u8> {
        let start = self.pos;
        while self.peek().is_some_and(|c| !is_punctuation(c)) {
            self.advance();
        }
        self.input[start..self.pos].to_vec()
    }

    /// Consumes a string body; the opening quote is already consumed.
    pub fn scan_string(&mut self) -> FatalResult<Vec<u8>> {
        let mut bytes = Vec::new();
        loop {
            match self.next_byte()? {
                b'"' => return Ok(bytes),
                b'\\' => {
                    let byte = match self.next_byte()? {
                        b'n' => b'\n',
                        b'x' => {
                            let hi = self.next_byte()?;
                            let lo = self.next_byte()?;
                            match (hex_digit(hi), hex_digit(lo)) {
                                (Some(hi), Some(lo)) => hi << 4 | lo,
                                _ => {
                                    return Err(Fatal::InvalidArgument {
                                        op: "read",
                                        message: format!(
                                            "invalid escape \\x{}{}",
                                            hi as char, lo as char
                                        ),
                                    })
                                }
                            }
                        }
                        other => other,
                    };
                    bytes.push(byte);
                }
                byte => bytes.push(byte),
            }
        }
    }
}

impl Runtime {
    /// Reads the next term, draining queued directive terms first.
    pub fn read(&mut self) -> FatalResult<Value> {
        let queued = self.state.read_stack;
        if queued != self.state.nil {
            self.state.read_stack = self.cdr(queued)?;
            return self.car(queued);
        }

        self.source.skip_white_and_comments();
        let c = self.source.peek().ok_or(Fatal::UnexpectedEof)?;
        match c {
            b'\'' => {
                self.source.advance();
                Ok(self.state.atom_quote)
            }
            b'^' => {
                self.source.advance();
                let op = self.state.atom_push;
                self.read_directive('^', op)
            }
            b'$' => {
                self.source.advance();
                let op = self.state.atom_pop;
                self.read_directive('$', op)
            }
            b'(' => {
                self.source.advance();
                self.read_list()
            }
            b'"' => {
                self.source.advance();
                let bytes = self.source.scan_string()?;
                self.make_string_from(&bytes)
            }
            b')' => {
                self.source.advance();
                Err(Fatal::InvalidArgument {
                    op: "read",
                    message: format!("unbalanced ')' at byte {}", self.source.position() - 1),
                })
            }
            _ => {
                let text = self.source.scan_scalar();
                self.scalar(&text)
            }
        }
    }

    fn read_directive(&mut self, directive: char, op: Value) -> FatalResult<Value> {
        let text = self.source.scan_scalar();
        if text.is_empty() {
            return Err(Fatal::EmptyDirective(directive));
        }

        let name = self.scalar(&text)?;
        let terms = [self.state.atom_quote, name, op];
        self.state.read_stack = self.make_list(&terms)?;
        self.read()
    }

    fn read_list(&mut self) -> FatalResult<Value> {
        let base = self.shadow.len();
        let result = self.read_list_items().and_then(|()| {
            let items = self.shadow[base..].to_vec();
            self.make_list(&items)
        });
        self.shadow.truncate(base);
        result
    }

    /// Reads terms onto the shadow stack up to the closing paren.
    fn read_list_items(&mut self) -> FatalResult {
        loop {
            if self.state.read_stack == self.state.nil {
                self.source.skip_white_and_comments();
                if self.source.peek() == Some(b')') {
                    self.source.advance();
                    return Ok(());
                }
            }
            let item = self.read()?;
            self.shadow.push(item);
        }
    }

    /// A base-10 integer literal becomes a Number, anything else an Atom.
    fn scalar(&mut self, text: &[u8]) -> FatalResult<Value> {
        let number = std::str::from_utf8(text)
            .ok()
            .and_then(|text| text.parse::<i64>().ok());
        match number {
            Some(n) => self.make_number(n),
            None => self.intern_bytes(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Source;
    use crate::runtime::{
        error::Fatal,
        object::{Buffer, Object},
        testing::runtime,
        value::Tag,
    };

    #[test]
    fn skips_whitespace_and_comments() {
        let mut src = Source::new(b"  ; comment\n\t ; another\nfoo".to_vec());
        src.skip_white_and_comments();
        assert_eq!(src.scan_scalar(), b"foo");
        assert!(src.at_end());
    }

    #[test]
    fn scalars_stop_at_punctuation() {
        let mut src = Source::new(b"abc(def".to_vec());
        assert_eq!(src.scan_scalar(), b"abc");
        assert_eq!(src.peek(), Some(b'('));
    }

    #[test]
    fn string_escapes() {
        let mut src = Source::new(br#"a\nb\x41\"q" rest"#.to_vec());
        assert_eq!(src.scan_string().unwrap(), b"a\nbA\"q".to_vec());
        assert_eq!(src.peek(), Some(b' '));

        let mut unterminated = Source::new(b"abc".to_vec());
        assert!(matches!(unterminated.scan_string(), Err(Fatal::UnexpectedEof)));

        let mut bad = Source::new(br#"\xZZ""#.to_vec());
        assert!(matches!(bad.scan_string(), Err(Fatal::InvalidArgument { .. })));
    }

    #[test]
    fn numbers_and_atoms() {
        let mut rt = runtime("42 -7 0 x12 - 12x");
        let values = (0..6).map(|_| rt.read().unwrap()).collect::<Vec<_>>();
        assert_eq!(rt.number(values[0]), Some(42));
        assert_eq!(rt.number(values[1]), Some(-7));
        assert_eq!(rt.number(values[2]), Some(0));
        assert_eq!(rt.atom_text(values[3]), Some("x12"));
        assert_eq!(rt.atom_text(values[4]), Some("-"));
        assert_eq!(rt.atom_text(values[5]), Some("12x"));
    }

    #[test]
    fn atoms_read_twice_are_identical() {
        let mut rt = runtime("foo foo");
        let a = rt.read().unwrap();
        let b = rt.read().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn atoms_keep_their_raw_bytes() {
        use crate::{
            runtime::{context::Runtime, print::Printer},
            vm::options::RuntimeOptions,
        };

        let source = b"(\xff \xfe \xff)".to_vec();
        let mut rt = Runtime::new(RuntimeOptions::default(), source).unwrap();
        let list = rt.read().unwrap();
        let items = rt.list_values(list);
        assert_ne!(items[0], items[1]);
        assert_eq!(items[0], items[2]);
        assert_eq!(rt.atom_bytes(items[1]), Some(&b"\xfe"[..]));

        let mut printed = Vec::new();
        Printer::new(rt.heap(), &mut printed).print(list).unwrap();
        assert_eq!(printed, b"(\xff \xfe \xff)");
    }

    #[test]
    fn push_directive_expands_over_three_reads() {
        let mut rt = runtime("^foo");
        let terms = (0..3).map(|_| rt.read().unwrap()).collect::<Vec<_>>();
        assert_eq!(rt.atom_text(terms[0]), Some("quote"));
        assert_eq!(rt.atom_text(terms[1]), Some("foo"));
        assert_eq!(rt.atom_text(terms[2]), Some("push"));
        assert!(matches!(rt.read(), Err(Fatal::UnexpectedEof)));
    }

    #[test]
    fn directives_inside_lists() {
        let mut rt = runtime("($x 'y ^x)");
        let list = rt.read().unwrap();
        assert_eq!(rt.render(list), "(quote x pop quote y quote x push)");
    }

    #[test]
    fn nested_lists_and_nil() {
        let mut rt = runtime("(1 (2 3) () x) ()");
        let list = rt.read().unwrap();
        assert_eq!(rt.render(list), "(1 (2 3) () x)");
        let nil = rt.read().unwrap();
        assert!(nil.is_nil());
    }

    #[test]
    fn strings_are_owned() {
        let mut rt = runtime(r#""hi\x21""#);
        let s = rt.read().unwrap();
        assert_eq!(rt.tag_of(s), Some(Tag::String));
        match rt.object(s) {
            Some(Object::String(buf)) => {
                assert!(matches!(buf, Buffer::Owned(_)));
                assert_eq!(buf.bytes(), b"hi!");
            }
            _ => panic!("expected a string"),
        }
    }

    #[test]
    fn malformed_input() {
        assert!(matches!(runtime("(1 2").read(), Err(Fatal::UnexpectedEof)));
        assert!(matches!(runtime("   ; only a comment").read(), Err(Fatal::UnexpectedEof)));
        assert!(matches!(runtime("^ x").read(), Err(Fatal::EmptyDirective('^'))));
        assert!(matches!(runtime("$(").read(), Err(Fatal::EmptyDirective('$'))));
        assert!(matches!(runtime(")").read(), Err(Fatal::InvalidArgument { .. })));
    }

    #[test]
    fn reading_under_collection_pressure() {
        use crate::{runtime::context::Runtime, vm::options::RuntimeOptions};
        let source = format!("({})", "(1 2 3) ".repeat(30));
        let options = RuntimeOptions {
            heap_slots: 512,
            ..RuntimeOptions::default()
        };
        let mut rt = Runtime::new(options, source).unwrap();
        while rt.heap().live() < rt.heap().capacity() {
            rt.make_number(-1).unwrap();
        }

        let list = rt.read().unwrap();
        assert!(rt.heap().stats.collections > 0);
        let items = rt.list_values(list);
        assert_eq!(items.len(), 30);
        assert!(items.iter().all(|&item| rt.render(item) == "(1 2 3)"));
    }
}
