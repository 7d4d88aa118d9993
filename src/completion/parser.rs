//! Completion response parsing

use bitflags::bitflags;

bitflags! {
    /// Hints returned alongside completion candidates
    ///
    /// Passed through unaltered; unknown bits are retained.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Directive: u32 {
        /// The router failed to compute completions
        const ERROR = 1;
        /// Do not add a space after the completion
        const NO_SPACE = 1 << 1;
        /// Do not fall back to file completion
        const NO_FILE_COMP = 1 << 2;
        /// Candidates are file extensions to filter on
        const FILTER_FILE_EXT = 1 << 3;
        /// Candidates are directories to complete in
        const FILTER_DIRS = 1 << 4;
        /// Keep the router's ordering
        const KEEP_ORDER = 1 << 5;
    }
}

impl Default for Directive {
    fn default() -> Self {
        Self::empty()
    }
}

/// One completion candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOption {
    /// Shell-escaped candidate, ready to insert
    pub name: String,
    /// Optional description shown beside the candidate
    pub description: Option<String>,
}

/// Parsed answer to a completion query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionResult {
    /// Directive bitmask reported by the router
    pub directive: Directive,
    /// Candidates, sorted by name
    pub options: Vec<CompletionOption>,
}

/// Parse the textual output of a completion query
///
/// Each line up to the first one starting with `:` is `name<TAB>description`;
/// the `:` line carries the directive. Short flags and empty names are
/// dropped.
#[must_use]
pub fn parse_completions(output: &str) -> CompletionResult {
    let mut result = CompletionResult::default();

    for line in output.lines() {
        let line = line.trim_end_matches('\r');

        if let Some(directive) = line.strip_prefix(':') {
            match directive.trim().parse::<u32>() {
                Ok(bits) => result.directive = Directive::from_bits_retain(bits),
                Err(e) => log::warn!("Ignoring malformed completion directive {directive:?}: {e}"),
            }
            break;
        }

        let (name, description) = match line.split_once('\t') {
            Some((name, description)) => (name, Some(description)),
            None => (line, None),
        };
        if name.is_empty() || is_shorthand_flag(name) {
            continue;
        }

        result.options.push(CompletionOption {
            name: escape_special_characters(name),
            description: description
                .map(str::trim)
                .filter(|description| !description.is_empty())
                .map(ToString::to_string),
        });
    }

    result.options.sort_by(|a, b| a.name.cmp(&b.name));
    result
}

/// Escape a candidate so it survives being typed into the shell
#[must_use]
pub fn escape_special_characters(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$' | '`' | '!') {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    if escaped
        .chars()
        .any(|c| c.is_whitespace() || "#&*;<>?[]|~".contains(c))
    {
        format!("\"{escaped}\"")
    } else {
        escaped
    }
}

fn is_shorthand_flag(arg: &str) -> bool {
    arg.starts_with('-') && !arg.starts_with("--")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_at_the_directive_line() {
        let result = parse_completions(
            "status\tShow status\nadd\tAdd files\n:4\nCompletion ended with directive: ShellCompDirectiveNoFileComp\n",
        );
        assert_eq!(result.directive, Directive::NO_FILE_COMP);
        let names: Vec<_> = result.options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["add", "status"]);
        assert_eq!(result.options[0].description.as_deref(), Some("Add files"));
    }

    #[test]
    fn unknown_directive_bits_are_kept() {
        let result = parse_completions(":130\n");
        assert_eq!(result.directive.bits(), 130);
        assert!(result.directive.contains(Directive::NO_SPACE));
        assert!(result.options.is_empty());
    }

    #[test]
    fn escapes_and_quotes() {
        assert_eq!(escape_special_characters("plain"), "plain");
        assert_eq!(escape_special_characters("$HOME"), "\\$HOME");
        assert_eq!(escape_special_characters("a b"), "\"a b\"");
        assert_eq!(escape_special_characters("x!;"), "\"x\\!;\"");
    }
}
