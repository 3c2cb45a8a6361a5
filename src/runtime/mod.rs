pub mod context;
pub mod environment;
pub mod error;
pub mod eval;
pub mod heap;
pub mod list;
pub mod object;
pub mod print;
pub mod raw;
pub mod reader;
pub mod subr_core;
pub mod symbol;
pub mod value;

pub use self::{context::Runtime, error::Fatal};
