mod commands;
mod session;

use std::env;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use session::Session;

const USAGE: &str = "usage: dcf77-emulator [--transcript <path>]";

fn main() -> ExitCode {
    let transcript = match transcript_arg(env::args().skip(1)) {
        Ok(path) => path,
        Err(err) => {
            eprintln!("{err}\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    match repl(transcript.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("dcf77-emulator: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Reads commands from stdin until EOF, `exit` or `quit`.
fn repl(transcript: Option<&Path>) -> io::Result<()> {
    let mut session = Session::new(transcript)?;
    let mut out = io::stdout().lock();
    writeln!(out, "dcf77 receiver emulator; `help` lists commands")?;
    prompt(&mut out)?;

    for line in io::stdin().lock().lines() {
        match line?.trim() {
            "" => {}
            command if command.eq_ignore_ascii_case("exit") => return Ok(()),
            command if command.eq_ignore_ascii_case("quit") => return Ok(()),
            command => {
                for reply in session.handle_command(command)? {
                    writeln!(out, "{reply}")?;
                }
            }
        }
        prompt(&mut out)?;
    }
    writeln!(out)
}

fn prompt(out: &mut impl Write) -> io::Result<()> {
    write!(out, "dcf77> ")?;
    out.flush()
}

fn transcript_arg(mut args: impl Iterator<Item = String>) -> Result<Option<PathBuf>, String> {
    let path = match args.next().as_deref() {
        None => return Ok(None),
        Some("--transcript") => args.next().ok_or("--transcript needs a path")?,
        Some(other) => match other.strip_prefix("--transcript=") {
            Some(path) => path.to_string(),
            None => return Err(format!("unknown argument `{other}`")),
        },
    };
    match args.next() {
        Some(extra) => Err(format!("unexpected argument `{extra}`")),
        None => Ok(Some(PathBuf::from(path))),
    }
}
