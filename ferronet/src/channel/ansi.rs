//! Removal of the terminal escape sequences network devices emit.
//!
//! This is not a terminal emulator. A fixed set of sequences seen on
//! HP ProCurve, Mikrotik and F5 style CLIs is removed by sequential
//! substitution, and `ESC E` (next line) becomes a newline.

use once_cell::sync::Lazy;
use regex::Regex;

static REMOVED_CODES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\x1b7",             // save cursor
        r"\x1b\[r",           // scroll whole screen
        r"\x1b8",             // restore cursor
        r"\x1b\[\d+A",        // cursor up
        r"\x1b\[\d+B",        // cursor down
        r"\x1b\[\d+;\d+H",    // position cursor
        r"\x1b\[\?25h",       // show cursor
        r"\x1b\[\?25l",       // hide cursor
        r"\x1b\[2K",          // erase line
        r"\x1b\[\d+;\d+r",    // scroll region
    ]
    .iter()
    .map(|code| Regex::new(code).unwrap())
    .collect()
});

static NEXT_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1bE").unwrap());

/// Strip the known escape sequences from `output`.
pub fn strip_ansi_escape_codes(output: &str) -> String {
    let mut output = output.to_string();
    for code in REMOVED_CODES.iter() {
        output = code.replace_all(&output, "").into_owned();
    }
    NEXT_LINE.replace_all(&output, "\n").into_owned()
}
