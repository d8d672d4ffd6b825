use std::fmt::{self, Display};
use std::str::FromStr;

use indexmap::IndexMap;
use tracing::trace;

/// Sectioned `key = value` text, as stored in `.git/config`.
///
/// Sections and keys keep insertion order so serializing is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    sections: IndexMap<String, IndexMap<String, String>>,
}

impl ConfigFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration written by `init`.
    pub fn repository_default() -> Self {
        let mut config = Self::new();
        config.set("core", "repositoryformatversion", "0");
        config.set("core", "filemode", "false");
        config.set("core", "bare", "false");
        config
    }

    /// Parses config lines. Lines that are neither a `[section]` header nor
    /// an indented `key = value` inside a section are skipped.
    pub fn parse<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut config = Self::new();
        let mut current: Option<String> = None;

        for (number, line) in lines.into_iter().enumerate() {
            let line = line.strip_suffix('\r').unwrap_or(line);

            if let Some(name) = parse_section(line) {
                config.sections.entry(name.to_owned()).or_default();
                current = Some(name.to_owned());
                continue;
            }

            match (parse_key_value(line), current.as_deref()) {
                (Some((key, value)), Some(section)) => config.set(section, key, value),
                _ => trace!(line = number + 1, content = line, "skipping config line"),
            }
        }

        config
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|keys| keys.get(key))
            .map(String::as_str)
    }

    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.sections
            .entry(section.to_owned())
            .or_default()
            .insert(key.to_owned(), value.to_owned());
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &IndexMap<String, String>)> {
        self.sections.iter().map(|(name, keys)| (name.as_str(), keys))
    }

    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

fn parse_section(line: &str) -> Option<&str> {
    line.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .filter(|name| !name.is_empty())
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let body = line.trim_start_matches([' ', '\t']);
    if body.len() == line.len() {
        return None;
    }
    let (key, value) = body.split_once(" = ")?;
    (!key.is_empty() && !value.is_empty()).then_some((key, value))
}

impl FromStr for ConfigFile {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s.lines()))
    }
}

impl Display for ConfigFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (section, keys) in &self.sections {
            writeln!(f, "[{section}]")?;
            for (key, value) in keys {
                writeln!(f, "\t{key} = {value}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT: &str = "[core]\n\trepositoryformatversion = 0\n\tfilemode = false\n\tbare = false\n";

    #[test]
    fn serializes_repository_default() {
        assert_eq!(ConfigFile::repository_default().serialize(), DEFAULT);
    }

    #[test]
    fn parses_its_own_output() {
        let config: ConfigFile = DEFAULT.parse().unwrap();
        assert_eq!(config, ConfigFile::repository_default());
        assert_eq!(config.get("core", "bare"), Some("false"));
    }

    #[test]
    fn set_overwrites_and_creates_sections() {
        let mut config = ConfigFile::repository_default();
        config.set("core", "bare", "true");
        config.set("user", "name", "A U Thor");

        assert_eq!(config.get("core", "bare"), Some("true"));
        assert_eq!(
            config.serialize(),
            "[core]\n\trepositoryformatversion = 0\n\tfilemode = false\n\tbare = true\n\
             [user]\n\tname = A U Thor\n"
        );
    }

    #[test]
    fn skips_unrecognized_lines() {
        let config = ConfigFile::parse([
            "\torphan = 1",
            "# comment",
            "[core]",
            "unindented = 1",
            "\tno-separator",
            "\tbare = false",
            "[]",
        ]);

        let sections: Vec<_> = config.sections().map(|(name, _)| name).collect();
        assert_eq!(sections, ["core"]);
        assert_eq!(config.get("core", "bare"), Some("false"));
        assert_eq!(config.get("core", "unindented"), None);
        assert_eq!(config.get("core", "orphan"), None);
    }

    #[test]
    fn repeated_sections_merge() {
        let config = ConfigFile::parse(["[core]", "\ta = 1", "[other]", "[core]", "\ta = 2", "\tb = 3"]);
        assert_eq!(config.get("core", "a"), Some("2"));
        assert_eq!(config.get("core", "b"), Some("3"));
        assert_eq!(config.sections().count(), 2);
    }

    #[test]
    fn accepts_values_with_spaces() {
        let config = ConfigFile::parse(["[user]", "    name = A U Thor", "\turl = a = b\r"]);
        assert_eq!(config.get("user", "name"), Some("A U Thor"));
        assert_eq!(config.get("user", "url"), Some("a = b"));
    }
}
