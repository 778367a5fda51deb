//! Configuration statements and the writer used to render objects into them.

use std::fmt;

/// Statement verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Create or overwrite the addressed configuration.
    Set,
    /// Remove the addressed configuration and everything below it.
    Delete,
}

impl Verb {
    /// Returns the keyword as written in the configuration language.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Set => "set",
            Verb::Delete => "delete",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the configuration language: a verb and its words.
///
/// The words hold the hierarchical path followed by the argument tail. They
/// are stored unquoted; quoting happens on [`Display`](fmt::Display).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    verb: Verb,
    words: Vec<String>,
}

impl Statement {
    /// Creates a statement from a verb and its words.
    pub fn new<I, S>(verb: Verb, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            verb,
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a `set` statement.
    pub fn set<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Verb::Set, words)
    }

    /// Creates a `delete` statement.
    pub fn delete<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Verb::Delete, words)
    }

    /// Returns the verb.
    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// Returns the unquoted words.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Returns the words as they appear on the wire, without the verb.
    pub fn path_text(&self) -> String {
        join_words(&self.words)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.words.is_empty() {
            f.write_str(self.verb.as_str())
        } else {
            write!(f, "{} {}", self.verb, self.path_text())
        }
    }
}

/// Joins words with single spaces, quoting the ones that need it.
pub fn join_words<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|w| quote_word(w.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quotes a word the way the device prints it.
///
/// Words that are empty or contain whitespace or one of `"` `;` `#` `{` `}`
/// are wrapped in double quotes with `"` and `\` escaped. Other words are
/// returned unchanged.
pub fn quote_word(word: &str) -> String {
    let needs_quotes = word.is_empty()
        || word
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | ';' | '#' | '{' | '}'));
    if !needs_quotes {
        return word.to_string();
    }

    let mut quoted = String::with_capacity(word.len() + 2);
    quoted.push('"');
    for c in word.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Accumulates statements under a path prefix.
///
/// Object types call the writer in their declared attribute order, which is
/// what makes rendering deterministic.
///
/// # Example
///
/// ```
/// use devcfg_codec::StatementWriter;
///
/// let mut w = StatementWriter::new(["applications", "application", "web"]);
/// w.set(&["protocol"], "tcp");
/// w.nested(&["term", "t1"], |w| w.set(&["destination-port"], 8080));
/// let lines: Vec<String> = w.finish().iter().map(ToString::to_string).collect();
/// assert_eq!(lines, vec![
///     "set applications application web protocol tcp",
///     "set applications application web term t1 destination-port 8080",
/// ]);
/// ```
#[derive(Debug, Default)]
pub struct StatementWriter {
    prefix: Vec<String>,
    statements: Vec<Statement>,
}

impl StatementWriter {
    /// Creates a writer whose statements all start with `prefix`.
    pub fn new<I, S>(prefix: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefix: prefix.into_iter().map(Into::into).collect(),
            statements: Vec::new(),
        }
    }

    fn words(&self, path: &[&str]) -> Vec<String> {
        self.prefix
            .iter()
            .cloned()
            .chain(path.iter().map(|p| (*p).to_string()))
            .collect()
    }

    /// Emits `set <prefix> <path> <value>`.
    pub fn set(&mut self, path: &[&str], value: impl fmt::Display) {
        let mut words = self.words(path);
        words.push(value.to_string());
        self.statements.push(Statement::set(words));
    }

    /// Emits `set <prefix> <path> <value>` when a value is present.
    pub fn set_opt<T: fmt::Display>(&mut self, path: &[&str], value: Option<&T>) {
        if let Some(value) = value {
            self.set(path, value);
        }
    }

    /// Emits one `set` per value, in order.
    pub fn set_each<T: fmt::Display>(&mut self, path: &[&str], values: &[T]) {
        for value in values {
            self.set(path, value);
        }
    }

    /// Emits `set <prefix> <path>` with no argument.
    pub fn set_flag(&mut self, path: &[&str]) {
        let words = self.words(path);
        self.statements.push(Statement::set(words));
    }

    /// Emits `delete <prefix> <path>`.
    pub fn delete(&mut self, path: &[&str]) {
        let words = self.words(path);
        self.statements.push(Statement::delete(words));
    }

    /// Runs `f` with `path` appended to the prefix.
    pub fn nested(&mut self, path: &[&str], f: impl FnOnce(&mut StatementWriter)) {
        let depth = self.prefix.len();
        self.prefix.extend(path.iter().map(|p| (*p).to_string()));
        f(self);
        self.prefix.truncate(depth);
    }

    /// Consumes the writer, returning statements in write order.
    pub fn finish(self) -> Vec<Statement> {
        self.statements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_statement_display() {
        let stmt = Statement::set(["applications", "application", "web", "protocol", "tcp"]);
        assert_eq!(stmt.to_string(), "set applications application web protocol tcp");
        assert_eq!(stmt.verb(), Verb::Set);

        let stmt = Statement::delete(["applications", "application", "web"]);
        assert_eq!(stmt.to_string(), "delete applications application web");
    }

    #[test]
    fn test_quote_word() {
        assert_eq!(quote_word("tcp"), "tcp");
        assert_eq!(quote_word("two words"), "\"two words\"");
        assert_eq!(quote_word(""), "\"\"");
        assert_eq!(quote_word("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(quote_word("a;b"), "\"a;b\"");
        assert_eq!(quote_word("$9$abc"), "$9$abc");
        assert_eq!(quote_word("path\\to"), "path\\to");
    }

    #[test]
    fn test_statement_quotes_arguments() {
        let stmt = Statement::set(["description", "web servers"]);
        assert_eq!(stmt.to_string(), "set description \"web servers\"");
        assert_eq!(stmt.words()[1], "web servers");
    }

    #[test]
    fn test_writer_nested_restores_prefix() {
        let mut w = StatementWriter::new(["applications"]);
        w.nested(&["application", "a"], |w| {
            w.set(&["protocol"], "udp");
            w.nested(&["term", "t"], |w| w.set_flag(&["alg"]));
        });
        w.set_opt(&["description"], Some(&"x"));
        w.set_opt::<u32>(&["timeout"], None);
        w.set_each(&["member"], &["a", "b"]);
        w.delete(&["application-set"]);

        let lines: Vec<String> = w.finish().iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "set applications application a protocol udp",
                "set applications application a term t alg",
                "set applications description x",
                "set applications member a",
                "set applications member b",
                "delete applications application-set",
            ]
        );
    }
}
