//! Render annotated source files into Markdown documentation.
//!
//! Source files carry marker comments that select what ends up in the docs:
//!
//! - `/// !show` … `/// !hide` fences the enclosed lines as a code block tagged
//!   with the file extension, followed by a link back to the file;
//! - `/// !tree` inserts a directory listing of the file's directory;
//! - `/// !! text` inserts `text` verbatim.
//!
//! [`Renderer`] handles single files and depth-limited directory trees, and
//! [`generate`] streams every match of a glob pattern to a [`Destination`].

mod directive;
mod driver;
mod error;
mod fragment;
mod line;
mod paths;
mod render;
mod shell;
mod state;
mod traverse;

pub use directive::{Directive, DirectiveMatcher, DEFAULT_MARKER};
pub use driver::{generate, Destination, Summary};
pub use error::{ExitCode, ExtractError, ExtractResult};
pub use fragment::{dedent, Fragment};
pub use paths::link_path;
pub use render::{RenderOptions, Renderer, DEFAULT_DEPTH, DEFAULT_TREE_COMMAND};
pub use shell::{CommandRunner, ShellRunner};
