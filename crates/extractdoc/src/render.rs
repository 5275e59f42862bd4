use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;

use crate::directive::{Directive, DirectiveMatcher, DEFAULT_MARKER};
use crate::error::{ExtractError, ExtractResult};
use crate::fragment::Fragment;
use crate::line::{read_lines, LineRecord};
use crate::paths::link_path;
use crate::shell::{CommandRunner, ShellRunner};
use crate::state::ScanState;

pub const DEFAULT_DEPTH: usize = 3;
pub const DEFAULT_TREE_COMMAND: &str = "tree -L 3 -F .";

/// Knobs shared by every file and directory render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// How many directory levels the path renderer descends into.
    pub depth: usize,
    /// Token that introduces a directive, e.g. `///` in `/// !show`.
    pub marker: String,
    /// Command whose output replaces a `!tree` directive.
    pub tree_command: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            marker: DEFAULT_MARKER.to_string(),
            tree_command: DEFAULT_TREE_COMMAND.to_string(),
        }
    }
}

/// Turns annotated source files into Markdown fragments.
pub struct Renderer<R = ShellRunner> {
    options: RenderOptions,
    matcher: DirectiveMatcher,
    runner: R,
}

impl Renderer<ShellRunner> {
    pub fn new(options: RenderOptions) -> ExtractResult<Self> {
        Self::with_runner(options, ShellRunner)
    }
}

impl<R: CommandRunner> Renderer<R> {
    /// Fails only when the marker cannot be compiled into directive patterns.
    pub fn with_runner(options: RenderOptions, runner: R) -> ExtractResult<Self> {
        let matcher =
            DirectiveMatcher::new(&options.marker).map_err(|source| ExtractError::Marker {
                marker: options.marker.clone(),
                source,
            })?;
        Ok(Self {
            options,
            matcher,
            runner,
        })
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render a single file. Attribution links are expressed relative to `base_dir`.
    pub fn render_file(&self, path: &Path, base_dir: &Path) -> ExtractResult<String> {
        let read_error = |source| ExtractError::FileRead {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(read_error)?;
        let mut reader = BufReader::new(file);
        let lines = read_lines(&mut reader).map_err(read_error)?;

        tracing::debug!(path = %path.display(), lines = lines.len(), "rendering file");
        self.render_lines(path, base_dir, &lines)
    }

    /// Render in-memory contents as though they had been read from `path`.
    pub fn render_str(&self, contents: &str, path: &Path, base_dir: &Path) -> ExtractResult<String> {
        let mut reader = Cursor::new(contents.as_bytes());
        let lines = read_lines(&mut reader).map_err(|source| ExtractError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        self.render_lines(path, base_dir, &lines)
    }

    fn render_lines(
        &self,
        path: &Path,
        base_dir: &Path,
        lines: &[LineRecord],
    ) -> ExtractResult<String> {
        let mut state = ScanState::new();
        let mut fragments = Vec::new();

        for line in lines {
            let directive = self.matcher.classify(&line.text);

            if state.is_visible() {
                match directive {
                    Some(Directive::ShowEnd) => {
                        if let Some(block) = state.exit_region() {
                            fragments.push(self.code_fragment(path, base_dir, block));
                        }
                    }
                    _ => state.push_line(line),
                }
                continue;
            }

            state.clear_block();

            match directive {
                Some(Directive::ShowStart) => state.enter_region(line),
                Some(Directive::TreeInsert) => fragments.push(self.tree_fragment(path)?),
                Some(Directive::InlineText(text)) => fragments.push(Fragment::Text(text.to_string())),
                Some(Directive::ShowEnd) | None => {}
            }
        }

        if let Some(open) = state.finalize() {
            tracing::warn!(
                path = %path.display(),
                line = open.opened_at,
                discarded = open.discarded,
                "region opened with !show is never closed; its lines are dropped"
            );
        }

        Ok(fragments
            .iter()
            .map(Fragment::to_string)
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn code_fragment(&self, path: &Path, base_dir: &Path, lines: Vec<String>) -> Fragment {
        let lang = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Fragment::Code {
            lang,
            lines,
            file_name,
            link: link_path(path, base_dir),
        }
    }

    fn tree_fragment(&self, path: &Path) -> ExtractResult<Fragment> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let listing = self.runner.run(&self.options.tree_command, dir)?;
        Ok(Fragment::Tree(listing.trim_end().to_string()))
    }
}
