//! Line-oriented result model
//!
//! A [`ResultSet`] holds every [`ResultBlock`] produced by one command. The
//! session builds it while reading the reply; callers receive it fully
//! populated and read it back.

use crate::protocol::error::{DictError, Result};
use serde::Serialize;

/// One logical answer: the text lines of a single definition or listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultBlock {
    /// Label of the block, e.g. the description of the source database
    source_name: Option<String>,
    /// Database identifier from a definition header, when there was one
    database: Option<String>,
    lines: Vec<String>,
    #[serde(skip)]
    cursor: usize,
}

impl ResultBlock {
    pub(crate) fn new(source_name: Option<String>) -> Self {
        Self {
            source_name,
            ..Default::default()
        }
    }

    pub(crate) fn with_database(mut self, database: Option<String>) -> Self {
        self.database = database;
        self
    }

    pub(crate) fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// All lines, independent of the read cursor
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether another line can be read
    pub fn has_next(&self) -> bool {
        self.cursor < self.lines.len()
    }

    /// Read the next line and advance the cursor
    ///
    /// Callers check [`has_next`](Self::has_next) first; reading past the
    /// end is reported as [`DictError::BlockExhausted`].
    pub fn next_line(&mut self) -> Result<&str> {
        let line = self.lines.get(self.cursor).ok_or(DictError::BlockExhausted {
            len: self.lines.len(),
        })?;
        self.cursor += 1;
        Ok(line)
    }

    /// Current read position
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Lines joined with `\n`
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Ordered blocks produced by one command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultSet {
    blocks: Vec<ResultBlock>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new block; subsequent appends target it
    pub(crate) fn open_block(&mut self, source_name: Option<String>) -> &mut ResultBlock {
        self.open(ResultBlock::new(source_name))
    }

    pub(crate) fn open(&mut self, block: ResultBlock) -> &mut ResultBlock {
        self.blocks.push(block);
        let last = self.blocks.len() - 1;
        &mut self.blocks[last]
    }

    /// Append a line to the active block, opening an unnamed one if needed
    pub(crate) fn push_line(&mut self, line: impl Into<String>) {
        if self.blocks.is_empty() {
            self.open_block(None);
        }
        if let Some(block) = self.blocks.last_mut() {
            block.push(line);
        }
    }

    /// Index of the most recently opened block
    pub fn active_index(&self) -> Option<usize> {
        self.blocks.len().checked_sub(1)
    }

    pub fn block(&self, index: usize) -> Option<&ResultBlock> {
        self.blocks.get(index)
    }

    /// Mutable access for cursor reads
    pub fn block_mut(&mut self, index: usize) -> Option<&mut ResultBlock> {
        self.blocks.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultBlock> {
        self.blocks.iter()
    }

    /// Lines of every block, in order
    pub fn all_lines(&self) -> impl Iterator<Item = &str> {
        self.blocks
            .iter()
            .flat_map(|block| block.lines.iter().map(String::as_str))
    }

    pub fn into_blocks(self) -> Vec<ResultBlock> {
        self.blocks
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a ResultBlock;
    type IntoIter = std::slice::Iter<'a, ResultBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}
