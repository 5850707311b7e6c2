use std::path::{Path, PathBuf};

/// A single line of an SSH client config.
///
/// Directives keep their raw text alongside the parsed key/value so the
/// file can be round-tripped byte-for-byte; everything the parser does
/// not recognize (comments, blanks, unknown directives) is carried as an
/// opaque `Other` line.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigLine {
    Directive {
        raw: String,
        key: String,
        value: String,
    },
    Other(String),
}

impl ConfigLine {
    fn raw(&self) -> &str {
        match self {
            ConfigLine::Directive { raw, .. } => raw,
            ConfigLine::Other(raw) => raw,
        }
    }
}

/// Kind of block header: `Host` blocks participate in identity-file
/// queries, `Match` blocks are preserved verbatim and never rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Host,
    Match,
}

/// One `Host`/`Match` block: the raw header line plus every line up to
/// the next header.
#[derive(Debug, Clone, PartialEq)]
pub struct HostBlock {
    pub kind: BlockKind,
    pub header: String,
    /// Patterns from a `Host` header (`Host dev prod` has two).
    pub patterns: Vec<String>,
    pub lines: Vec<ConfigLine>,
}

impl HostBlock {
    /// The block's display alias: its patterns joined by spaces.
    pub fn alias(&self) -> String {
        self.patterns.join(" ")
    }

    /// Iterate the parsed `IdentityFile` values of this block.
    pub fn identity_files(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|line| match line {
            ConfigLine::Directive { key, value, .. }
                if key.eq_ignore_ascii_case("identityfile") =>
            {
                Some(value.as_str())
            }
            _ => None,
        })
    }
}

/// A parsed SSH client config: lines before the first block header, then
/// an ordered sequence of blocks.
///
/// `serialize(parse(x)) == x` holds for any input; only lines rewritten
/// through [`SshConfig::rewrite_identity_file`] ever change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SshConfig {
    pub prelude: Vec<ConfigLine>,
    pub blocks: Vec<HostBlock>,
}

impl SshConfig {
    /// Parse config text into blocks.
    ///
    /// Never fails: unparseable lines are preserved as opaque text.
    pub fn parse(content: &str) -> Self {
        let mut config = SshConfig::default();

        // split('\n') keeps a final empty segment for a trailing newline,
        // so rejoining with '\n' reproduces the input exactly.
        for raw in content.split('\n') {
            match parse_header(raw) {
                Some((kind, patterns)) => config.blocks.push(HostBlock {
                    kind,
                    header: raw.to_string(),
                    patterns,
                    lines: Vec::new(),
                }),
                None => {
                    let line = parse_line(raw);
                    match config.blocks.last_mut() {
                        Some(block) => block.lines.push(line),
                        None => config.prelude.push(line),
                    }
                }
            }
        }

        config
    }

    /// Serialize back to config text, byte-for-byte for untouched lines.
    pub fn serialize(&self) -> String {
        let mut out: Vec<&str> = Vec::new();
        for line in &self.prelude {
            out.push(line.raw());
        }
        for block in &self.blocks {
            out.push(&block.header);
            for line in &block.lines {
                out.push(line.raw());
            }
        }
        out.join("\n")
    }

    /// Host blocks whose `IdentityFile` resolves to `path` after `~` and
    /// environment expansion. Exact, case-sensitive comparison; `Host`
    /// patterns themselves are never glob-matched.
    pub fn hosts_referencing(&self, path: &Path) -> Vec<&HostBlock> {
        self.blocks
            .iter()
            .filter(|b| b.kind == BlockKind::Host)
            .filter(|b| b.identity_files().any(|v| expand_path(v) == path))
            .collect()
    }

    /// Aliases of every host block referencing `path`.
    pub fn aliases_referencing(&self, path: &Path) -> Vec<String> {
        self.hosts_referencing(path)
            .iter()
            .map(|b| b.alias())
            .collect()
    }

    /// Rewrite every `IdentityFile` directive resolving to `old` so it
    /// points at `new`, preserving each line's indentation and key
    /// spelling. The new value mirrors the old one's style (a `~/…`
    /// value stays `~/…` when the new path is under the home directory).
    ///
    /// Returns the number of lines rewritten.
    pub fn rewrite_identity_file(&mut self, old: &Path, new: &Path) -> usize {
        let mut rewritten = 0;

        for block in &mut self.blocks {
            if block.kind != BlockKind::Host {
                continue;
            }
            for line in &mut block.lines {
                let ConfigLine::Directive { raw, key, value } = line else {
                    continue;
                };
                if !key.eq_ignore_ascii_case("identityfile") || expand_path(value) != old {
                    continue;
                }

                let new_value = render_like(value, new);
                *raw = splice_value(raw, &new_value);
                *value = new_value;
                rewritten += 1;
            }
        }

        rewritten
    }
}

/// Parse a `Host`/`Match` header line, returning its kind and patterns.
fn parse_header(raw: &str) -> Option<(BlockKind, Vec<String>)> {
    let trimmed = raw.trim();
    let mut tokens = trimmed.split_whitespace();
    let keyword = tokens.next()?;

    if keyword.eq_ignore_ascii_case("host") {
        let patterns: Vec<String> = tokens.map(|t| t.to_string()).collect();
        (!patterns.is_empty()).then_some((BlockKind::Host, patterns))
    } else if keyword.eq_ignore_ascii_case("match") {
        Some((BlockKind::Match, Vec::new()))
    } else {
        None
    }
}

/// Parse a non-header line. Comments and blanks stay opaque; a
/// `Key value` pair becomes a directive with quotes stripped from the
/// parsed value (the raw text keeps them).
fn parse_line(raw: &str) -> ConfigLine {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return ConfigLine::Other(raw.to_string());
    }

    let mut parts = trimmed.splitn(2, [' ', '\t', '=']);
    let key = parts.next().unwrap_or_default();
    let value = parts.next().unwrap_or("").trim();

    if key.is_empty() || value.is_empty() {
        return ConfigLine::Other(raw.to_string());
    }

    ConfigLine::Directive {
        raw: raw.to_string(),
        key: key.to_string(),
        value: strip_quotes(value),
    }
}

/// Remove matching surrounding double quotes from a directive value.
fn strip_quotes(s: &str) -> String {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

/// Replace the value portion of a raw directive line, keeping the
/// leading whitespace, the key token, and the original separator.
fn splice_value(raw: &str, new_value: &str) -> String {
    let indent_len = raw.len() - raw.trim_start().len();
    let after_indent = &raw[indent_len..];

    let key_len = after_indent
        .find([' ', '\t', '='])
        .unwrap_or(after_indent.len());
    let after_key = &after_indent[key_len..];

    let sep_len = after_key.len() - after_key.trim_start_matches([' ', '\t', '=']).len();
    let prefix_len = indent_len + key_len + sep_len;

    let quoted = new_value.contains(' ');
    if quoted {
        format!("{}\"{}\"", &raw[..prefix_len], new_value)
    } else {
        format!("{}{}", &raw[..prefix_len], new_value)
    }
}

/// Render `path` in the same style as `old_value`: keep a `~/` prefix
/// when the old value used one and the new path is under home.
fn render_like(old_value: &str, path: &Path) -> String {
    if old_value.starts_with('~')
        && let Some(home) = dirs::home_dir()
        && let Ok(rest) = path.strip_prefix(&home)
    {
        return format!("~/{}", rest.display());
    }
    path.display().to_string()
}

/// Expand a leading `~` and `$VAR`/`${VAR}` references in a path value.
/// Unknown variables are left in place.
pub fn expand_path(value: &str) -> PathBuf {
    let mut s = value.to_string();

    if s == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = s.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        s = home.join(rest).display().to_string();
    }

    if s.contains('$') {
        s = expand_env(&s);
    }

    PathBuf::from(s)
}

/// Substitute `$VAR` and `${VAR}` with values from the environment.
fn expand_env(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, consumed) = if let Some(inner) = after.strip_prefix('{') {
            match inner.find('}') {
                Some(end) => (&inner[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|ch: char| !ch.is_ascii_alphanumeric() && ch != '_')
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        if name.is_empty() {
            out.push('$');
            rest = after;
            continue;
        }

        match std::env::var(name) {
            Ok(val) => out.push_str(&val),
            Err(_) => {
                out.push('$');
                out.push_str(&after[..consumed]);
            }
        }
        rest = &after[consumed..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# work hosts\nHost prod\n\tHostName prod.example.com\n\tUser deploy\n\tIdentityFile ~/.ssh/work/prod\n\nHost staging backup\n    IdentityFile /etc/keys/staging\n    ForwardAgent yes\n";

    #[test]
    fn round_trip_is_lossless() {
        let config = SshConfig::parse(SAMPLE);
        assert_eq!(config.serialize(), SAMPLE);
    }

    #[test]
    fn round_trip_without_trailing_newline() {
        let content = "Host a\n  IdentityFile /k/a";
        assert_eq!(SshConfig::parse(content).serialize(), content);
    }

    #[test]
    fn round_trip_empty() {
        assert_eq!(SshConfig::parse("").serialize(), "");
    }

    #[test]
    fn parses_blocks_and_patterns() {
        let config = SshConfig::parse(SAMPLE);
        assert_eq!(config.blocks.len(), 2);
        assert_eq!(config.blocks[0].patterns, vec!["prod"]);
        assert_eq!(config.blocks[1].alias(), "staging backup");
        assert_eq!(config.prelude.len(), 1);
    }

    #[test]
    fn finds_hosts_by_expanded_path() {
        let config = SshConfig::parse(SAMPLE);
        let home = dirs::home_dir().unwrap();

        let hits = config.hosts_referencing(&home.join(".ssh/work/prod"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].alias(), "prod");

        let hits = config.hosts_referencing(Path::new("/etc/keys/staging"));
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn no_match_for_unrelated_path() {
        let config = SshConfig::parse(SAMPLE);
        assert!(
            config
                .hosts_referencing(Path::new("/nonexistent"))
                .is_empty()
        );
    }

    #[test]
    fn rewrite_preserves_indentation_and_other_lines() {
        let mut config = SshConfig::parse(SAMPLE);
        let home = dirs::home_dir().unwrap();

        let n = config.rewrite_identity_file(
            &home.join(".ssh/work/prod"),
            &home.join(".ssh/work/prod-new"),
        );
        assert_eq!(n, 1);

        let text = config.serialize();
        assert!(text.contains("\tIdentityFile ~/.ssh/work/prod-new\n"));
        assert!(text.contains("\tHostName prod.example.com\n"));
        assert!(text.contains("    IdentityFile /etc/keys/staging\n"));
        assert!(text.starts_with("# work hosts\n"));
    }

    #[test]
    fn rewrite_absolute_value_stays_absolute() {
        let mut config = SshConfig::parse("Host s\n  IdentityFile /etc/keys/staging\n");
        let n = config.rewrite_identity_file(
            Path::new("/etc/keys/staging"),
            Path::new("/etc/keys/staging2"),
        );
        assert_eq!(n, 1);
        assert_eq!(
            config.serialize(),
            "Host s\n  IdentityFile /etc/keys/staging2\n"
        );
    }

    #[test]
    fn rewrite_updates_every_referencing_block() {
        let content = "Host a\n  IdentityFile /k/shared\nHost b\n  IdentityFile /k/shared\n";
        let mut config = SshConfig::parse(content);
        let n = config.rewrite_identity_file(Path::new("/k/shared"), Path::new("/k/fresh"));
        assert_eq!(n, 2);
        assert!(!config.serialize().contains("/k/shared"));
    }

    #[test]
    fn match_blocks_are_opaque() {
        let content = "Match host *.internal\n  IdentityFile /k/internal\n";
        let mut config = SshConfig::parse(content);

        assert!(
            config
                .hosts_referencing(Path::new("/k/internal"))
                .is_empty()
        );
        let n = config.rewrite_identity_file(Path::new("/k/internal"), Path::new("/k/new"));
        assert_eq!(n, 0);
        assert_eq!(config.serialize(), content);
    }

    #[test]
    fn expand_env_vars() {
        unsafe { std::env::set_var("KEYWARDEN_TEST_DIR", "/opt/keys") };
        assert_eq!(
            expand_path("$KEYWARDEN_TEST_DIR/id"),
            PathBuf::from("/opt/keys/id")
        );
        assert_eq!(
            expand_path("${KEYWARDEN_TEST_DIR}/id"),
            PathBuf::from("/opt/keys/id")
        );
        assert_eq!(
            expand_path("$KEYWARDEN_UNSET_VAR/id"),
            PathBuf::from("$KEYWARDEN_UNSET_VAR/id")
        );
    }

    #[test]
    fn quoted_identity_values_are_unquoted() {
        let config = SshConfig::parse("Host q\n  IdentityFile \"/with space/key\"\n");
        let hits = config.hosts_referencing(Path::new("/with space/key"));
        assert_eq!(hits.len(), 1);
    }
}
