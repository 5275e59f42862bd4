//! Rendered output units: code fences with attribution, tree listings, and
//! literal inline text.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// A fenced block of extracted source lines.
    Code {
        lang: String,
        lines: Vec<String>,
        file_name: String,
        link: String,
    },
    /// Output of the directory listing command, fenced without a language tag.
    Tree(String),
    /// A documentation line inserted verbatim.
    Text(String),
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fragment::Code {
                lang,
                lines,
                file_name,
                link,
            } => {
                writeln!(f, "```{lang}")?;
                writeln!(f, "{}", dedent(lines))?;
                writeln!(f, "```")?;
                write!(f, "<small>[{file_name}]({link})</small>")
            }
            Fragment::Tree(listing) => write!(f, "```\n{listing}\n```"),
            Fragment::Text(text) => f.write_str(text),
        }
    }
}

/// Remove the whitespace prefix shared by every non-empty line and join the
/// result with newlines. Empty lines do not constrain the margin.
pub fn dedent(lines: &[String]) -> String {
    let mut margin: Option<&str> = None;

    for line in lines.iter().filter(|line| !line.trim().is_empty()) {
        let indent = leading_whitespace(line);
        margin = Some(match margin {
            None => indent,
            Some(current) => common_prefix(current, indent),
        });
    }

    let margin = margin.unwrap_or("");
    lines
        .iter()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                &line[margin.len()..]
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn leading_whitespace(line: &str) -> &str {
    let end = line
        .char_indices()
        .find(|(_, ch)| *ch != ' ' && *ch != '\t')
        .map(|(idx, _)| idx)
        .unwrap_or(line.len());
    &line[..end]
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    &a[..len]
}
