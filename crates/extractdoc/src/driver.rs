use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use glob::MatchOptions;
use walkdir::WalkDir;

use crate::error::{ExtractError, ExtractResult};
use crate::paths::absolutize;
use crate::render::Renderer;
use crate::shell::CommandRunner;

/// Where rendered documentation is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

impl Destination {
    /// `-` selects standard output; anything else names a file to create or
    /// overwrite.
    pub fn parse(arg: &str) -> Self {
        if arg == "-" {
            Destination::Stdout
        } else {
            Destination::File(absolutize(Path::new(arg)))
        }
    }

    /// Directory that attribution links are made relative to.
    pub fn base_dir(&self) -> PathBuf {
        match self {
            Destination::Stdout => PathBuf::from("."),
            Destination::File(path) => path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    fn label(&self) -> PathBuf {
        match self {
            Destination::Stdout => PathBuf::from("-"),
            Destination::File(path) => path.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Paths produced by the glob pattern.
    pub matched: usize,
    /// Matches whose rendered text was non-empty.
    pub written: usize,
}

/// Render every path matching `pattern` and stream the output to
/// `destination`, one blob per match followed by a newline.
///
/// The destination is opened before the pattern is resolved, so a pattern
/// without matches still leaves an empty file behind.
pub fn generate<R: CommandRunner>(
    pattern: &str,
    destination: &Destination,
    renderer: &Renderer<R>,
) -> ExtractResult<Summary> {
    let mut sink = Sink::open(destination)?;
    let base_dir = destination.base_dir();

    let paths = resolve(pattern)?;

    let mut summary = Summary::default();
    for path in paths {
        let text = renderer.render(&path, &base_dir)?;
        summary.matched += 1;
        if !text.is_empty() {
            summary.written += 1;
        }

        if !sink.write_chunk(&text)? {
            tracing::debug!("output pipe closed; stopping early");
            break;
        }
    }

    sink.finish()?;
    tracing::info!(
        pattern,
        matched = summary.matched,
        written = summary.written,
        destination = %destination.label().display(),
        "documentation generated"
    );
    Ok(summary)
}

/// Expand `pattern` into the paths to render, in match order.
///
/// Wildcards never match names with a leading dot unless the pattern spells
/// the dot out. A trailing `**` component matches the directory before it
/// together with everything beneath it, in pre-order; a bare `**` matches
/// everything beneath the working directory.
fn resolve(pattern: &str) -> ExtractResult<Vec<PathBuf>> {
    let Some(root) = recursive_root(pattern) else {
        return glob_paths(pattern, pattern);
    };

    if root.is_empty() {
        return Ok(walk_visible(Path::new("."), false)
            .into_iter()
            .map(|path| path.strip_prefix(".").map(Path::to_path_buf).unwrap_or(path))
            .collect());
    }

    let mut paths = Vec::new();
    for dir in glob_paths(pattern, root)?
        .into_iter()
        .filter(|path| path.is_dir())
    {
        paths.extend(walk_visible(&dir, true));
    }
    Ok(paths)
}

/// Returns the part of `pattern` before a trailing `**` component.
fn recursive_root(pattern: &str) -> Option<&str> {
    match pattern.strip_suffix("**")? {
        "" => Some(""),
        "/" => Some("/"),
        root => root.strip_suffix('/'),
    }
}

fn glob_paths(pattern: &str, expr: &str) -> ExtractResult<Vec<PathBuf>> {
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };
    let entries = glob::glob_with(expr, options).map_err(|source| ExtractError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;

    Ok(entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(err) => {
                tracing::warn!(
                    path = %err.path().display(),
                    error = %err.error(),
                    "skipping unreadable glob entry"
                );
                None
            }
        })
        .collect())
}

fn walk_visible(dir: &Path, include_root: bool) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(if include_root { 0 } else { 1 })
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.into_path()),
            Err(err) => {
                tracing::warn!(
                    dir = %dir.display(),
                    error = %err,
                    "skipping unreadable directory entry"
                );
                None
            }
        })
        .collect()
}

fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

struct Sink {
    writer: Box<dyn Write>,
    label: PathBuf,
    stdout: bool,
    closed: bool,
}

impl Sink {
    fn open(destination: &Destination) -> ExtractResult<Self> {
        let writer: Box<dyn Write> = match destination {
            Destination::Stdout => Box::new(io::stdout().lock()),
            Destination::File(path) => {
                let file = File::create(path).map_err(|source| ExtractError::DestinationWrite {
                    path: path.clone(),
                    source,
                })?;
                Box::new(BufWriter::new(file))
            }
        };

        Ok(Self {
            writer,
            label: destination.label(),
            stdout: matches!(destination, Destination::Stdout),
            closed: false,
        })
    }

    /// Writes `text` and a trailing newline. Returns `false` once a stdout
    /// reader has gone away.
    fn write_chunk(&mut self, text: &str) -> ExtractResult<bool> {
        let result = self
            .writer
            .write_all(text.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"));
        self.check(result)
    }

    fn finish(mut self) -> ExtractResult<()> {
        if self.closed {
            return Ok(());
        }
        let result = self.writer.flush();
        self.check(result).map(|_| ())
    }

    fn check(&mut self, result: io::Result<()>) -> ExtractResult<bool> {
        match result {
            Ok(()) => Ok(true),
            Err(err) if self.stdout && should_ignore_pipe_error(&err) => {
                self.closed = true;
                Ok(false)
            }
            Err(source) => Err(ExtractError::DestinationWrite {
                path: self.label.clone(),
                source,
            }),
        }
    }
}

fn should_ignore_pipe_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::WouldBlock
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderOptions;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn pattern_in(dir: &Path, suffix: &str) -> String {
        format!(
            "{}/{suffix}",
            glob::Pattern::escape(dir.to_str().expect("utf-8 temp path"))
        )
    }

    #[test]
    fn parses_dash_as_stdout() {
        assert_eq!(Destination::parse("-"), Destination::Stdout);
        assert_eq!(Destination::Stdout.base_dir(), PathBuf::from("."));
    }

    #[test]
    fn file_destination_is_absolute_and_bases_links_on_its_parent() {
        let destination = Destination::parse("docs/README.md");
        match &destination {
            Destination::File(path) => {
                assert!(path.is_absolute());
                assert!(path.ends_with("docs/README.md"));
            }
            other => panic!("unexpected destination: {other:?}"),
        }
        assert!(destination.base_dir().ends_with("docs"));
    }

    #[test]
    fn writes_one_blob_per_match_with_links_relative_to_destination() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("a.py"), "/// !show\nx = 1\n/// !hide\n").unwrap();
        fs::write(src.join("nested").join("b.py"), "/// !! from b\n").unwrap();
        fs::write(src.join("c.py"), "print('no directives')\n").unwrap();

        let out = dir.path().join("docs").join("OUT.md");
        fs::create_dir_all(out.parent().unwrap()).unwrap();

        let summary = generate(
            &pattern_in(dir.path(), "src/**/*.py"),
            &Destination::File(out.clone()),
            &Renderer::new(RenderOptions::default()).unwrap(),
        )
        .unwrap();

        assert_eq!(summary, Summary { matched: 3, written: 2 });

        let written = fs::read_to_string(&out).unwrap();
        assert!(written.contains("```py\nx = 1\n```\n<small>[a.py](../src/a.py)</small>\n"));
        assert!(written.contains("from b\n"));
        // Four lines for the fence, one per remaining match.
        assert_eq!(written.matches('\n').count(), 6);
    }

    fn tree_with_hidden_entries(root: &Path) {
        let src = root.join("src");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::create_dir_all(src.join(".hidden")).unwrap();
        fs::write(src.join("a.py"), "/// !! visible\n").unwrap();
        fs::write(src.join(".dot.py"), "/// !! dot\n").unwrap();
        fs::write(src.join("sub").join("s.py"), "/// !! sub\n").unwrap();
        fs::write(src.join(".hidden").join("h.py"), "/// !! hidden\n").unwrap();
    }

    #[test]
    fn trailing_double_star_matches_directory_and_everything_below() {
        let dir = tempdir().unwrap();
        tree_with_hidden_entries(dir.path());
        let src = dir.path().join("src");

        let paths = resolve(&pattern_in(dir.path(), "src/**")).unwrap();
        assert_eq!(
            paths,
            vec![
                src.clone(),
                src.join("a.py"),
                src.join("sub"),
                src.join("sub").join("s.py"),
            ]
        );
    }

    #[test]
    fn trailing_double_star_renders_files_directly_inside_the_directory() {
        let dir = tempdir().unwrap();
        tree_with_hidden_entries(dir.path());
        let out = dir.path().join("OUT.md");

        let summary = generate(
            &pattern_in(dir.path(), "src/**"),
            &Destination::File(out.clone()),
            &Renderer::new(RenderOptions::default()).unwrap(),
        )
        .unwrap();

        assert_eq!(summary.matched, 4);
        // The directory match renders its whole listing, hidden entries
        // included; each nested match then renders again on its own.
        assert_eq!(
            fs::read_to_string(&out).unwrap(),
            "dot\nhidden\nvisible\nsub\nvisible\nsub\nsub\n"
        );
    }

    #[test]
    fn wildcards_skip_hidden_files_and_directories() {
        let dir = tempdir().unwrap();
        tree_with_hidden_entries(dir.path());
        let out = dir.path().join("OUT.md");

        let summary = generate(
            &pattern_in(dir.path(), "src/**/*.py"),
            &Destination::File(out.clone()),
            &Renderer::new(RenderOptions::default()).unwrap(),
        )
        .unwrap();

        assert_eq!(summary, Summary { matched: 2, written: 2 });
        assert_eq!(fs::read_to_string(&out).unwrap(), "visible\nsub\n");
    }

    #[test]
    fn explicit_leading_dot_still_matches_hidden_names() {
        let dir = tempdir().unwrap();
        tree_with_hidden_entries(dir.path());

        let paths = resolve(&pattern_in(dir.path(), "src/.*.py")).unwrap();
        assert_eq!(paths, vec![dir.path().join("src").join(".dot.py")]);
    }

    #[test]
    fn recursive_root_only_applies_to_a_trailing_component() {
        assert_eq!(recursive_root("**"), Some(""));
        assert_eq!(recursive_root("/**"), Some("/"));
        assert_eq!(recursive_root("src/**"), Some("src"));
        assert_eq!(recursive_root("src/*/**"), Some("src/*"));
        assert_eq!(recursive_root("src/**/*.py"), None);
        assert_eq!(recursive_root("src/a**"), None);
    }

    #[test]
    fn zero_matches_leave_an_empty_destination() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("OUT.md");

        let summary = generate(
            &pattern_in(dir.path(), "**/*.nothing"),
            &Destination::File(out.clone()),
            &Renderer::new(RenderOptions::default()).unwrap(),
        )
        .unwrap();

        assert_eq!(summary.matched, 0);
        assert_eq!(fs::read_to_string(&out).unwrap(), "");
    }

    #[test]
    fn overwrites_existing_destination() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("OUT.md");
        fs::write(&out, "stale content").unwrap();

        generate(
            &pattern_in(dir.path(), "*.nothing"),
            &Destination::File(out.clone()),
            &Renderer::new(RenderOptions::default()).unwrap(),
        )
        .unwrap();

        assert_eq!(fs::read_to_string(&out).unwrap(), "");
    }

    #[test]
    fn missing_destination_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("missing").join("OUT.md");

        let err = generate(
            &pattern_in(dir.path(), "*.rs"),
            &Destination::File(out),
            &Renderer::new(RenderOptions::default()).unwrap(),
        )
        .unwrap_err();

        assert!(matches!(err, ExtractError::DestinationWrite { .. }));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("OUT.md");

        let err = generate(
            "src/***/x",
            &Destination::File(out),
            &Renderer::new(RenderOptions::default()).unwrap(),
        )
        .unwrap_err();

        assert!(matches!(err, ExtractError::Pattern { .. }));
    }
}
