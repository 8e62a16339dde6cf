//! Definition/repetition levels for walking nested lists without recursion.
//!
//! Every list level and the leaf are treated as nullable, so two columns
//! encoded independently share one level scheme. With `k` list levels
//! (level 0 being the column itself):
//!
//! | definition level | meaning |
//! |---|---|
//! | `2m` | list at level `m` is null |
//! | `2m + 1` | list at level `m` is empty |
//! | `2k` | leaf is null |
//! | `2k + 1` | leaf is valid (maximum) |
//!
//! Repetition level `0` starts a row; `c > 0` starts a new element of a list
//! at level `c - 1`.

use std::ops::Range;

use arrow::{
    array::{cast::AsArray, Array, ListArray},
    datatypes::DataType,
};

use crate::{error::RowCmpError, leaf::LeafColumn, logging::rowcmp_log};

const MAX_LIST_LEVELS: usize = 127;
const NO_LEAF: usize = usize::MAX;

/// Dremel encoding of one list column.
#[derive(Debug)]
pub struct DremelData {
    offsets: Vec<usize>,
    rep_levels: Vec<u8>,
    def_levels: Vec<u8>,
    leaf_index: Vec<usize>,
    max_def_level: u8,
}

struct Frame {
    level: usize,
    start: usize,
    next: usize,
    end: usize,
    first_rep: u8,
}

/// Whether a definition level marks a null (as opposed to an empty list or a
/// valid leaf).
#[inline]
pub(crate) fn is_null_level(def_level: u8) -> bool {
    def_level % 2 == 0
}

impl DremelData {
    /// Encode `list`, whose innermost values have been lowered into `leaf`.
    ///
    /// # Errors
    /// [`RowCmpError::UnsupportedType`] when the list nests deeper than the
    /// level encoding can represent.
    pub(crate) fn encode(list: &ListArray, leaf: &LeafColumn) -> Result<Self, RowCmpError> {
        let mut levels = vec![list];
        let mut values = list.values();
        while let DataType::List(_) = values.data_type() {
            let inner = values.as_list::<i32>();
            levels.push(inner);
            values = inner.values();
        }
        if levels.len() > MAX_LIST_LEVELS {
            return Err(RowCmpError::unsupported(
                list.data_type(),
                "list nesting is too deep to encode",
            ));
        }

        let depth = levels.len();
        let max_def_level = (2 * depth + 1) as u8;
        let mut encoded = Self {
            offsets: Vec::with_capacity(list.len() + 1),
            rep_levels: Vec::with_capacity(values.len()),
            def_levels: Vec::with_capacity(values.len()),
            leaf_index: Vec::with_capacity(values.len()),
            max_def_level,
        };
        let mut stack: Vec<Frame> = Vec::with_capacity(depth + 1);

        for row in 0..list.len() {
            encoded.offsets.push(encoded.def_levels.len());
            stack.push(Frame {
                level: 0,
                start: row,
                next: row,
                end: row + 1,
                first_rep: 0,
            });

            while let Some(frame) = stack.last_mut() {
                if frame.next == frame.end {
                    stack.pop();
                    continue;
                }
                let idx = frame.next;
                frame.next += 1;
                let rep = if idx == frame.start {
                    frame.first_rep
                } else {
                    frame.level as u8
                };
                let level = frame.level;

                if level == depth {
                    let def = if leaf.is_null(idx) {
                        max_def_level - 1
                    } else {
                        max_def_level
                    };
                    encoded.push(rep, def, idx);
                    continue;
                }

                let node = levels[level];
                if node.is_null(idx) {
                    encoded.push(rep, (2 * level) as u8, NO_LEAF);
                    continue;
                }
                let offsets = node.value_offsets();
                let (start, end) = (offsets[idx] as usize, offsets[idx + 1] as usize);
                if start == end {
                    encoded.push(rep, (2 * level + 1) as u8, NO_LEAF);
                } else {
                    stack.push(Frame {
                        level: level + 1,
                        start,
                        next: start,
                        end,
                        first_rep: rep,
                    });
                }
            }
        }
        encoded.offsets.push(encoded.def_levels.len());

        rowcmp_log!(
            log::Level::Trace,
            "dremel_encode",
            "rows={} levels={} entries={}",
            list.len(),
            depth,
            encoded.def_levels.len()
        );
        Ok(encoded)
    }

    fn push(&mut self, rep: u8, def: u8, leaf_index: usize) {
        self.rep_levels.push(rep);
        self.def_levels.push(def);
        self.leaf_index.push(leaf_index);
    }

    /// Level entries belonging to `row`.
    #[inline]
    pub fn row_range(&self, row: usize) -> Range<usize> {
        self.offsets[row]..self.offsets[row + 1]
    }

    /// Repetition level of entry `idx`.
    #[inline]
    pub fn rep_level(&self, idx: usize) -> u8 {
        self.rep_levels[idx]
    }

    /// Definition level of entry `idx`.
    #[inline]
    pub fn def_level(&self, idx: usize) -> u8 {
        self.def_levels[idx]
    }

    /// Position in the leaf column of entry `idx`; only meaningful for leaf entries.
    #[inline]
    pub fn leaf_index(&self, idx: usize) -> usize {
        self.leaf_index[idx]
    }

    /// Definition level of a valid leaf.
    pub fn max_def_level(&self) -> u8 {
        self.max_def_level
    }

    /// Number of encoded rows.
    pub fn num_rows(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub(crate) fn allocated_bytes(&self) -> usize {
        (self.offsets.capacity() + self.leaf_index.capacity()) * std::mem::size_of::<usize>()
            + self.rep_levels.capacity()
            + self.def_levels.capacity()
    }
}
