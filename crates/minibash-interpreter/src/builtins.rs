//! Builtin commands executed by the shell itself.
//!
//! Only `echo` for now. It runs in the parent when it is the sole stage
//! of a bare simple command and in the forked child otherwise, writing to
//! whatever fd 1 has been duped to by then.

use std::io::{self, Write};

/// The one recognized builtin name.
pub(crate) const ECHO: &str = "echo";

/// Write `args` separated by single spaces, then a newline. No flags are
/// recognized; the exit status contract for `echo` is always 0.
pub(crate) fn echo(args: &[String], out: &mut impl Write) -> io::Result<()> {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.write_all(b" ")?;
        }
        out.write_all(arg.as_bytes())?;
    }
    out.write_all(b"\n")?;
    out.flush()
}
