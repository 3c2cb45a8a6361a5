use std::{io::Write, path::Path, process};

use forsp::{
    prelude::*,
    vm::options::{self, RuntimeOptions},
};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

fn main() {
    env_logger::init();

    let options = match RuntimeOptions::parse() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}\n{}", e, options::USAGE);
            process::exit(1);
        }
    };

    if options.help {
        println!("{}", options::USAGE);
        process::exit(0);
    }

    let Some(path) = options.filename.clone() else {
        eprintln!("{}", options::USAGE);
        process::exit(1);
    };

    if let Err(e) = run_file(&path, options) {
        fail(&e);
    }
}

fn run_file(path: &Path, options: RuntimeOptions) -> FatalResult {
    let source = std::fs::read(path).map_err(|source| Fatal::Load {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("loaded {} ({} bytes)", path.display(), source.len());

    let mut rt = Runtime::new(options, source)?;
    rt.run()
}

fn fail(error: &Fatal) -> ! {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
    let _ = write!(stderr, "FAIL:");
    let _ = stderr.reset();
    let _ = writeln!(stderr, " {}", error);
    let _ = stderr.flush();
    process::abort()
}
