//! Test fixtures for common device configuration
//!
//! Provides reusable configuration lines and dumps

use devcfg_codec::{dump, join_words, tokenize};

/// Configuration lines under a common path prefix
#[derive(Debug, Clone, Default)]
pub struct ConfigLines {
    /// Path prefix words
    pub prefix: Vec<String>,
    /// Lines relative to the prefix
    pub lines: Vec<String>,
}

impl ConfigLines {
    /// Start lines under `prefix`
    pub fn under<I, S>(prefix: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefix: prefix.into_iter().map(Into::into).collect(),
            lines: Vec::new(),
        }
    }

    /// Add a line relative to the prefix, e.g. `"protocol tcp"`
    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    /// Full `set` lines
    pub fn set_lines(&self) -> Vec<String> {
        let prefix = join_words(&self.prefix);
        self.lines
            .iter()
            .map(|line| {
                let rest = join_words(&tokenize(line));
                if prefix.is_empty() {
                    format!("set {rest}")
                } else {
                    format!("set {prefix} {rest}")
                }
            })
            .collect()
    }

    /// Marked dump with full paths
    pub fn dump(&self) -> String {
        dump::wrap(&self.set_lines())
    }

    /// Marked dump relative to the prefix
    pub fn relative_dump(&self) -> String {
        let lines: Vec<String> = self
            .lines
            .iter()
            .map(|line| format!("set {}", join_words(&tokenize(line))))
            .collect();
        dump::wrap(&lines)
    }
}

/// Application fixtures
pub mod application_fixtures {
    use super::*;

    /// The two-line `testacc` dump, unmarked
    pub const TESTACC_DUMP: &str =
        "set application testacc protocol tcp\nset application testacc destination-port 80\n";

    /// A TCP application with a description
    pub fn web_application(name: &str) -> ConfigLines {
        ConfigLines::under(["applications", "application", name])
            .with_line("description \"web front end\"")
            .with_line("protocol tcp")
            .with_line("destination-port 443")
    }

    /// An application made of two terms, with lines of one term split
    pub fn termed_application(name: &str) -> ConfigLines {
        ConfigLines::under(["applications", "application", name])
            .with_line("term t1 protocol tcp")
            .with_line("term t2 protocol udp")
            .with_line("term t1 destination-port 8080")
            .with_line("term t2 destination-port 53")
    }
}

/// RADIUS server fixtures
pub mod radius_fixtures {
    use super::*;

    /// Shared secret used by the fixtures
    pub const SECRET: &str = "testing123";

    /// A server with every option set
    pub fn full_server(address: &str) -> ConfigLines {
        ConfigLines::under(["system", "radius-server", address])
            .with_line(format!("secret {SECRET}"))
            .with_line("port 1812")
            .with_line("accounting-port 1813")
            .with_line("timeout 5")
            .with_line("retry 3")
            .with_line("source-address 192.0.2.254")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_lines() {
        let lines = application_fixtures::web_application("web");
        assert_eq!(
            lines.set_lines()[0],
            "set applications application web description \"web front end\""
        );
        assert_eq!(
            dump::set_lines(&lines.relative_dump()),
            vec![
                "description \"web front end\"",
                "protocol tcp",
                "destination-port 443"
            ]
        );
    }
}
