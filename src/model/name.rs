/// Normalize a project name for comparison.
///
/// Lowercases and collapses every run of `-`, `_` and `.` into a single `-`,
/// so `Foo.Bar`, `foo_bar` and `FOO--bar` all compare equal.
pub fn canonicalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                out.push('-');
                in_separator = true;
            }
        } else {
            out.extend(c.to_lowercase());
            in_separator = false;
        }
    }
    out
}
