//! Scoping of device configuration dumps.
//!
//! A dump is the text answer to `show configuration <path> | display set`.
//! When it carries a start marker, only lines strictly between the start and
//! end markers are considered; everything else is ignored. A marker is a
//! line of its own: marker text inside a quoted value does not count.

/// Marker opening the configuration text in a dump.
pub const START_MARKER: &str = "<configuration-output>";

/// Marker closing the configuration text in a dump.
pub const END_MARKER: &str = "</configuration-output>";

/// Prefix of every `set` line in a dump.
pub const SET_PREFIX: &str = "set ";

/// Returns the non-blank lines of `dump` that are in scope.
pub fn scoped_lines(dump: &str) -> Vec<&str> {
    let has_start = dump.lines().any(|line| is_marker(line, START_MARKER));
    let mut in_scope = !has_start;
    let mut lines = Vec::new();

    for line in dump.lines() {
        if is_marker(line, START_MARKER) {
            in_scope = true;
            continue;
        }
        if is_marker(line, END_MARKER) {
            break;
        }
        if in_scope && !line.trim().is_empty() {
            lines.push(line.trim_end());
        }
    }

    lines
}

fn is_marker(line: &str, marker: &str) -> bool {
    line.trim() == marker
}

/// Returns the in-scope `set` lines with the `set ` prefix removed.
///
/// Lines with other verbs (`deactivate`, `protect`, comments) are skipped.
pub fn set_lines(dump: &str) -> Vec<&str> {
    scoped_lines(dump)
        .into_iter()
        .filter_map(|line| line.trim_start().strip_prefix(SET_PREFIX))
        .collect()
}

/// Returns true if the dump holds no in-scope `set` line.
pub fn is_empty(dump: &str) -> bool {
    set_lines(dump).is_empty()
}

/// Wraps configuration lines in start and end markers.
pub fn wrap<S: AsRef<str>>(lines: &[S]) -> String {
    let mut out = String::from(START_MARKER);
    out.push('\n');
    for line in lines {
        out.push_str(line.as_ref());
        out.push('\n');
    }
    out.push_str(END_MARKER);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unmarked_dump_is_fully_in_scope() {
        let dump = "set application testacc protocol tcp\n\nset application testacc destination-port 80\n";
        assert_eq!(
            set_lines(dump),
            vec![
                "application testacc protocol tcp",
                "application testacc destination-port 80"
            ]
        );
        assert!(!is_empty(dump));
    }

    #[test]
    fn test_markers_bound_the_scope() {
        let dump = "\
set outside before
<configuration-output>
set protocol tcp
set destination-port 80
</configuration-output>
set outside after
";
        assert_eq!(set_lines(dump), vec!["protocol tcp", "destination-port 80"]);
    }

    #[test]
    fn test_end_marker_without_start() {
        let dump = "set a b\n</configuration-output>\nset c d\n";
        assert_eq!(set_lines(dump), vec!["a b"]);
    }

    #[test]
    fn test_marker_text_inside_value() {
        let dump = "\
<configuration-output>
set application app description \"x </configuration-output>\"
set application app protocol tcp
  </configuration-output>
set outside after
";
        assert_eq!(
            set_lines(dump),
            vec![
                "application app description \"x </configuration-output>\"",
                "application app protocol tcp"
            ]
        );
        assert!(!is_empty("set description \"<configuration-output>\"\n"));
    }

    #[test]
    fn test_empty_dumps() {
        assert!(is_empty(""));
        assert!(is_empty("\n\n"));
        assert!(is_empty("<configuration-output>\n</configuration-output>\n"));
        assert!(is_empty("<configuration-output>\n## Last changed\n</configuration-output>"));
    }

    #[test]
    fn test_other_verbs_skipped() {
        let dump = "set a b\ndeactivate a\nset c d\r\n";
        assert_eq!(set_lines(dump), vec!["a b", "c d"]);
        assert_eq!(scoped_lines(dump).len(), 3);
    }

    #[test]
    fn test_wrap() {
        let dump = wrap(&["set a b"]);
        assert_eq!(
            dump,
            "<configuration-output>\nset a b\n</configuration-output>\n"
        );
        assert_eq!(set_lines(&dump), vec!["a b"]);
    }
}
