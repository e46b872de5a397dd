//! PowerShell literal quoting.

/// Quote a value as a PowerShell single-quoted string literal.
///
/// Single-quoted strings are never expanded by PowerShell, so the only
/// character that needs escaping is the quote itself, which is escaped by
/// doubling. PowerShell also accepts the typographic quotes U+2018..U+201B as
/// single quotes, so those are doubled too.
///
/// ```
/// assert_eq!(psscript::quote(r"C:\vms\disk.vhdx"), r"'C:\vms\disk.vhdx'");
/// assert_eq!(psscript::quote("it's"), "'it''s'");
/// ```
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if is_single_quote(c) {
            quoted.push(c);
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

const fn is_single_quote(c: char) -> bool {
    matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}')
}
