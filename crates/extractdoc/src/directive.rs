use regex::Regex;

pub const DEFAULT_MARKER: &str = "///";

/// A marker directive recognised on a single source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive<'a> {
    ShowStart,
    ShowEnd,
    TreeInsert,
    InlineText(&'a str),
}

/// Compiled line patterns for one marker token.
#[derive(Debug, Clone)]
pub struct DirectiveMatcher {
    show_start: Regex,
    show_end: Regex,
    tree_insert: Regex,
    inline_text: Regex,
}

impl DirectiveMatcher {
    /// Compile the directive patterns for `marker`. The marker is matched
    /// literally; compilation only fails when it exceeds the regex size limit.
    pub fn new(marker: &str) -> Result<Self, regex::Error> {
        let token = regex::escape(marker);
        let build = |suffix: &str| Regex::new(&format!(r"^\s*{token} {suffix}"));

        Ok(Self {
            show_start: build("!show")?,
            show_end: build("!hide")?,
            tree_insert: build("!tree")?,
            inline_text: build(r"!!(?:\s+(.*)|$)")?,
        })
    }

    pub fn classify<'a>(&self, line: &'a str) -> Option<Directive<'a>> {
        if self.show_start.is_match(line) {
            return Some(Directive::ShowStart);
        }
        if self.show_end.is_match(line) {
            return Some(Directive::ShowEnd);
        }
        if self.tree_insert.is_match(line) {
            return Some(Directive::TreeInsert);
        }

        // A bare `!!` stands for an empty documentation line.
        self.inline_text.captures(line).map(|caps| {
            Directive::InlineText(caps.get(1).map_or("", |text| text.as_str()))
        })
    }
}
