//! Embedding surface: runtime options and the command-line front end.

pub mod options;
