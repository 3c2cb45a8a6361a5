//! A small runtime for forsp, a Forth/Lisp hybrid: call-by-push-value
//! evaluation over a value stack, with closures, a reader, a printer and a
//! mark-sweep collected object table.

pub mod runtime;
pub mod utils;
pub mod vm;

pub mod prelude {
    pub use crate::runtime::{
        context::{Runtime, State},
        error::{Fatal, FatalResult},
        object::{Buffer, Object},
        value::{Tag, Value},
    };
    pub use crate::vm::options::RuntimeOptions;
}
