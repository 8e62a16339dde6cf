//! Flattening of nested columns into non-branching column chains.
//!
//! A nested column is split into one output column per leaf ("branch"). Each
//! output keeps only the chain of containers leading to its leaf, so a
//! comparator can walk it without ever choosing between siblings. The depth
//! recorded for a branch counts the struct levels above the branch start; the
//! lexicographic comparator uses it to skip branches that sit under a null
//! struct instead of recursing.

mod linked;

use std::sync::Arc;

use arrow::{
    array::{cast::AsArray, Array, ArrayRef, ListArray, StructArray},
    datatypes::{DataType, Field, Fields},
};

use crate::{
    error::RowCmpError,
    logging::rowcmp_log,
    option::{NullOrder, Order},
};
use linked::LinkedColumns;

/// Whether list columns are split as well as structs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecomposeLists {
    /// Lists are leaves (lexicographic path; lists are walked with dremel levels).
    No,
    /// Lists are descended into without opening a branch (equality path).
    Yes,
}

/// Output of [`decompose`].
#[derive(Debug, Clone)]
pub struct Decomposed {
    /// One column per branch, in original column order.
    pub columns: Vec<ArrayRef>,
    /// Per-branch direction; empty when no order array was given.
    pub column_order: Vec<Order>,
    /// Per-branch null precedence; empty when no precedence array was given.
    pub null_precedence: Vec<NullOrder>,
    /// Per-branch count of struct levels above the branch start.
    pub depths: Vec<usize>,
}

pub(crate) fn is_nested(data_type: &DataType) -> bool {
    matches!(data_type, DataType::Struct(_) | DataType::List(_))
}

pub(crate) fn validate_table(
    columns: &[ArrayRef],
    column_order: &[Order],
    null_precedence: &[NullOrder],
) -> Result<(), RowCmpError> {
    if let Some(first) = columns.first() {
        if let Some((idx, column)) = columns
            .iter()
            .enumerate()
            .find(|(_, column)| column.len() != first.len())
        {
            return Err(RowCmpError::configuration(format!(
                "column {idx} has {} rows, column 0 has {}",
                column.len(),
                first.len()
            )));
        }
    }
    if !column_order.is_empty() && column_order.len() != columns.len() {
        return Err(RowCmpError::configuration(format!(
            "column order has {} entries for {} columns",
            column_order.len(),
            columns.len()
        )));
    }
    if !null_precedence.is_empty() && null_precedence.len() != columns.len() {
        return Err(RowCmpError::configuration(format!(
            "null precedence has {} entries for {} columns",
            null_precedence.len(),
            columns.len()
        )));
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum Target {
    New,
    Continue(usize),
}

struct Visit {
    node: usize,
    target: Target,
    depth: usize,
}

struct Branch {
    nodes: Vec<usize>,
    depth: usize,
}

/// Split every nested column of `columns` into branches.
///
/// Struct children other than the first always open a new branch; the first
/// child opens one only when it is a list, in which case the struct is emitted
/// as a zero-field struct carrying its own validity. With
/// [`DecomposeLists::Yes`] lists are descended into, and list ancestors above
/// a branch start are re-attached (without validity, which lives in the
/// branch holding the list itself).
///
/// # Errors
/// [`RowCmpError::Configuration`] when row counts or the order arrays do not
/// line up with the columns.
pub fn decompose(
    columns: &[ArrayRef],
    column_order: &[Order],
    null_precedence: &[NullOrder],
    lists: DecomposeLists,
) -> Result<Decomposed, RowCmpError> {
    validate_table(columns, column_order, null_precedence)?;

    let linked = LinkedColumns::new(columns);
    let mut out = Decomposed {
        columns: Vec::with_capacity(columns.len()),
        column_order: Vec::new(),
        null_precedence: Vec::new(),
        depths: Vec::with_capacity(columns.len()),
    };

    for (col_idx, &root) in linked.roots().iter().enumerate() {
        let branches = if is_nested(linked.data_type(root)) {
            collect_branches(&linked, root, lists)
        } else {
            vec![Branch {
                nodes: vec![root],
                depth: 0,
            }]
        };

        for branch in &branches {
            out.columns.push(rebuild_branch(&linked, &branch.nodes)?);
            out.depths.push(branch.depth);
        }
        if let Some(order) = column_order.get(col_idx) {
            out.column_order.extend(std::iter::repeat(*order).take(branches.len()));
        }
        if let Some(nulls) = null_precedence.get(col_idx) {
            out.null_precedence
                .extend(std::iter::repeat(*nulls).take(branches.len()));
        }
    }

    rowcmp_log!(
        log::Level::Debug,
        "decompose",
        "input_columns={} branches={} lists={:?}",
        columns.len(),
        out.columns.len(),
        lists
    );
    Ok(out)
}

fn collect_branches(linked: &LinkedColumns, root: usize, lists: DecomposeLists) -> Vec<Branch> {
    let mut branches: Vec<Branch> = Vec::new();
    let mut stack = vec![Visit {
        node: root,
        target: Target::New,
        depth: 0,
    }];

    // Branches are opened when a node is visited, so pre-order of the walk is
    // the output order.
    while let Some(Visit {
        node,
        target,
        depth,
    }) = stack.pop()
    {
        let branch = match target {
            Target::New => {
                branches.push(Branch {
                    nodes: Vec::new(),
                    depth,
                });
                branches.len() - 1
            }
            Target::Continue(branch) => branch,
        };
        branches[branch].nodes.push(node);

        let children = &linked.node(node).children;
        match linked.data_type(node) {
            DataType::List(_) if lists == DecomposeLists::Yes => stack.push(Visit {
                node: children[0],
                target: Target::Continue(branch),
                depth: depth + 1,
            }),
            DataType::Struct(_) => {
                let first_is_list = children
                    .first()
                    .is_some_and(|&child| matches!(linked.data_type(child), DataType::List(_)));
                for (child_idx, &child) in children.iter().enumerate().rev() {
                    let target = if child_idx > 0 || first_is_list {
                        Target::New
                    } else {
                        Target::Continue(branch)
                    };
                    stack.push(Visit {
                        node: child,
                        target,
                        depth: depth + 1,
                    });
                }
            }
            _ => {}
        }
    }
    branches
}

fn rebuild_branch(linked: &LinkedColumns, branch: &[usize]) -> Result<ArrayRef, RowCmpError> {
    let (&last, ancestors) = branch
        .split_last()
        .expect("a branch holds at least its starting node");
    let leaf = &linked.node(last).array;
    let mut column = match leaf.data_type() {
        DataType::Struct(fields)
            if fields
                .first()
                .is_some_and(|field| matches!(field.data_type(), DataType::List(_))) =>
        {
            Arc::new(StructArray::new_empty_fields(
                leaf.len(),
                leaf.nulls().cloned(),
            )) as ArrayRef
        }
        _ => leaf.clone(),
    };

    for &ancestor in ancestors.iter().rev() {
        let parent = &linked.node(ancestor).array;
        column = match parent.data_type() {
            DataType::List(_) => wrap_list(parent, column, true)?,
            _ => wrap_struct(parent, column)?,
        };
    }

    for ancestor in linked.ancestors(branch[0]) {
        let parent = &linked.node(ancestor).array;
        if matches!(parent.data_type(), DataType::List(_)) {
            column = wrap_list(parent, column, false)?;
        }
    }
    Ok(column)
}

fn wrap_struct(parent: &ArrayRef, child: ArrayRef) -> Result<ArrayRef, RowCmpError> {
    let parent = parent.as_struct();
    // A branch only continues through a struct's first child.
    let name = parent
        .fields()
        .first()
        .map(|field| field.name().as_str())
        .unwrap_or_default();
    let fields = Fields::from(vec![Field::new(name, child.data_type().clone(), true)]);
    let wrapped = StructArray::try_new(fields, vec![child], parent.nulls().cloned())?;
    Ok(Arc::new(wrapped))
}

fn wrap_list(parent: &ArrayRef, child: ArrayRef, keep_nulls: bool) -> Result<ArrayRef, RowCmpError> {
    let parent = parent.as_list::<i32>();
    let DataType::List(field) = parent.data_type() else {
        unreachable!("as_list checked the list type");
    };
    let field = Arc::new(Field::new(field.name(), child.data_type().clone(), true));
    let nulls = keep_nulls.then(|| parent.nulls().cloned()).flatten();
    let wrapped = ListArray::try_new(field, parent.offsets().clone(), child, nulls)?;
    Ok(Arc::new(wrapped))
}
