use std::{ffi::OsString, path::PathBuf};

use crate::utils::env::read_uint_from_str;

pub const DEFAULT_HEAP_SLOTS: usize = 64 * 1024;

pub const USAGE: &str = "\
Usage: forsp [options] <input file>
Options:
  -h, --help: Print this help message
  --heap-slots <count>: Size of the object slot table, accepts k/m suffixes (default: 64k)
  --no-lowlevel: Do not bind the ptr-* and string-memview primitives";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeOptions {
    pub heap_slots: usize,
    pub lowlevel: bool,
    pub filename: Option<PathBuf>,
    pub help: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            heap_slots: DEFAULT_HEAP_SLOTS,
            lowlevel: true,
            filename: None,
            help: false,
        }
    }
}

impl RuntimeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_heap_slots(&mut self, slots: usize) {
        self.heap_slots = slots;
    }

    pub fn parse() -> Result<Self, String> {
        parse_from(pico_args::Arguments::from_env())
    }
}

pub fn parse_from(mut args: pico_args::Arguments) -> Result<RuntimeOptions, String> {
    let mut options = RuntimeOptions::new();

    if args.contains(["-h", "--help"]) {
        options.help = true;
        return Ok(options);
    }

    match args.opt_value_from_str::<_, String>("--heap-slots") {
        Ok(Some(size)) => match read_uint_from_str(&size) {
            Some(slots) => options.set_heap_slots(slots),
            None => return Err(format!("invalid slot count '{}'", size)),
        },
        Ok(None) => (),
        Err(e) => return Err(e.to_string()),
    }

    options.lowlevel = !args.contains("--no-lowlevel");

    options.filename = match args.opt_free_from_str::<PathBuf>() {
        Ok(filename) => filename,
        Err(e) => return Err(e.to_string()),
    };

    let rest: Vec<OsString> = args.finish();
    if !rest.is_empty() {
        return Err(format!("unexpected arguments: {:?}", rest));
    }

    Ok(options)
}
