use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{ExtractError, ExtractResult};
use crate::render::Renderer;
use crate::shell::CommandRunner;

impl<R: CommandRunner> Renderer<R> {
    /// Render `path` using the configured depth and join the per-file output
    /// with newlines.
    pub fn render(&self, path: &Path, base_dir: &Path) -> ExtractResult<String> {
        Ok(self
            .render_path(path, base_dir, self.options().depth)?
            .join("\n"))
    }

    /// Render a file, or the files beneath a directory up to `level` levels
    /// deep. Children are visited in file-name order and only non-empty
    /// renders are kept; a file passed directly is always returned, even when
    /// it renders to nothing.
    pub fn render_path(
        &self,
        path: &Path,
        base_dir: &Path,
        level: usize,
    ) -> ExtractResult<Vec<String>> {
        let mut rendered = Vec::new();

        if path.is_file() {
            rendered.push(self.render_file(path, base_dir)?);
        }

        if path.is_dir() && level > 0 {
            for child in list_children(path)? {
                let nested = self.render_path(&child, base_dir, level - 1)?;
                rendered.extend(nested.into_iter().filter(|text| !text.is_empty()));
            }
        }

        Ok(rendered)
    }
}

fn list_children(dir: &Path) -> ExtractResult<Vec<PathBuf>> {
    tracing::debug!(dir = %dir.display(), "listing directory");

    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| {
            entry
                .map(walkdir::DirEntry::into_path)
                .map_err(|source| ExtractError::DirectoryRead {
                    path: dir.to_path_buf(),
                    source,
                })
        })
        .collect()
}
