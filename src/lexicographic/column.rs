use arrow::{
    array::{cast::AsArray, Array, ArrayRef},
    buffer::NullBuffer,
    datatypes::DataType,
};

use crate::{dremel::DremelData, error::RowCmpError, leaf::LeafColumn};

/// A decomposed column lowered into the shape the comparator walks.
#[derive(Debug)]
pub(crate) enum LexColumn {
    Leaf(LeafColumn),
    /// Single-child struct chain. `levels[k]` is the validity of the `k`-th
    /// struct from the top; `leaf` is `None` for the zero-field marker.
    Struct {
        levels: Vec<Option<NullBuffer>>,
        leaf: Option<LeafColumn>,
    },
    List {
        nulls: Option<NullBuffer>,
        dremel: DremelData,
        leaf: LeafColumn,
    },
}

impl LexColumn {
    pub(crate) fn compile(column: &ArrayRef) -> Result<Self, RowCmpError> {
        match column.data_type() {
            DataType::Struct(_) => {
                let mut levels = Vec::new();
                let mut current = column;
                loop {
                    let structs = current.as_struct();
                    levels.push(structs.nulls().cloned());
                    match structs.columns().first() {
                        Some(child) if matches!(child.data_type(), DataType::Struct(_)) => {
                            current = child;
                        }
                        Some(child) => {
                            return Ok(Self::Struct {
                                levels,
                                leaf: Some(LeafColumn::try_new(child.as_ref())?),
                            })
                        }
                        None => return Ok(Self::Struct { levels, leaf: None }),
                    }
                }
            }
            DataType::List(_) => {
                let list = column.as_list::<i32>();
                let mut values = list.values();
                while let DataType::List(_) = values.data_type() {
                    values = values.as_list::<i32>().values();
                }
                let leaf = LeafColumn::try_new(values.as_ref())?;
                let dremel = DremelData::encode(list, &leaf)?;
                Ok(Self::List {
                    nulls: list.nulls().cloned(),
                    dremel,
                    leaf,
                })
            }
            _ => Ok(Self::Leaf(LeafColumn::try_new(column.as_ref())?)),
        }
    }

    pub(crate) fn allocated_bytes(&self) -> usize {
        match self {
            LexColumn::Leaf(leaf) => leaf.allocated_bytes(),
            LexColumn::Struct { leaf, .. } => leaf.as_ref().map_or(0, LeafColumn::allocated_bytes),
            LexColumn::List { dremel, leaf, .. } => dremel.allocated_bytes() + leaf.allocated_bytes(),
        }
    }
}

#[inline]
pub(crate) fn is_null_at(nulls: &Option<NullBuffer>, index: usize) -> bool {
    nulls.as_ref().is_some_and(|nulls| nulls.is_null(index))
}
