pub mod bitvec;
pub mod env;
