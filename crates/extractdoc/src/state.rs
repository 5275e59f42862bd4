use crate::line::LineRecord;

/// Visibility flag and pending code block for a single file pass.
#[derive(Default)]
pub struct ScanState {
    region: Option<usize>,
    block: Vec<String>,
}

impl ScanState {
    pub fn new() -> Self {
        Self {
            region: None,
            block: Vec::new(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.region.is_some()
    }

    pub fn enter_region(&mut self, line: &LineRecord) {
        self.region = Some(line.number);
    }

    /// Closes the visible region and hands back the accumulated lines, if any.
    pub fn exit_region(&mut self) -> Option<Vec<String>> {
        self.region = None;
        if self.block.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.block))
        }
    }

    pub fn push_line(&mut self, line: &LineRecord) {
        self.block.push(line.text.trim_end().to_string());
    }

    pub fn clear_block(&mut self) {
        self.block.clear();
    }

    /// Returns the opening line and pending line count of a region left open at end of input.
    pub fn finalize(self) -> Option<Unterminated> {
        self.region.map(|opened_at| Unterminated {
            opened_at,
            discarded: self.block.len(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unterminated {
    pub opened_at: usize,
    pub discarded: usize,
}
