//! Lexicographic row ordering over nested tables.
//!
//! A [`PreprocessedTable`] flattens struct nesting into branches, replaces
//! list-of-struct payloads with dense ranks and encodes every remaining list
//! column into definition/repetition levels. Comparators built on it walk
//! flat arrays only.

mod column;
mod comparator;

use arrow::array::{Array, ArrayRef};
use ulid::Ulid;

pub use comparator::{SelfComparator, TwoTableComparator};

use crate::{
    check::{check_lex_compatibility, check_shape_compatibility},
    context::{ComputeContext, Reservation},
    decompose::{decompose, DecomposeLists, Decomposed},
    dremel::DremelData,
    error::RowCmpError,
    logging::rowcmp_log,
    option::{NullOrder, Order},
    rank::transform_lists_of_structs,
};
use column::LexColumn;

/// Comparison-ready bundle derived from one table.
#[derive(Debug)]
pub struct PreprocessedTable {
    columns: Vec<ArrayRef>,
    column_order: Vec<Order>,
    null_precedence: Vec<NullOrder>,
    depths: Vec<usize>,
    compiled: Vec<LexColumn>,
    ranked: Vec<ArrayRef>,
    num_rows: usize,
    identity_token: u64,
    joint: bool,
    safe_for_two_table: bool,
    reservation: Reservation,
}

struct Parts {
    columns: Vec<ArrayRef>,
    column_order: Vec<Order>,
    null_precedence: Vec<NullOrder>,
    depths: Vec<usize>,
    ranked: Vec<ArrayRef>,
    num_rows: usize,
    identity_token: u64,
    joint: bool,
    safe_for_two_table: bool,
}

fn new_identity_token() -> u64 {
    Ulid::new().random() as u64
}

fn or_default<T: Copy + Default>(values: Vec<T>, len: usize) -> Vec<T> {
    if values.is_empty() {
        vec![T::default(); len]
    } else {
        values
    }
}

/// Null placement to rank with, so nulls nested in ranked structs land where
/// `nulls` says once the comparator applies `order` to the ranks.
fn rank_null_order(order: Order, nulls: NullOrder) -> NullOrder {
    match order {
        Order::Ascending => nulls,
        Order::Descending => nulls.reverse(),
    }
}

/// Decompose structs and fill in default order and null precedence.
fn decompose_for_order(
    table: &[ArrayRef],
    column_order: &[Order],
    null_precedence: &[NullOrder],
) -> Result<Decomposed, RowCmpError> {
    let mut decomposed = decompose(table, column_order, null_precedence, DecomposeLists::No)?;
    let len = decomposed.columns.len();
    decomposed.column_order = or_default(std::mem::take(&mut decomposed.column_order), len);
    decomposed.null_precedence = or_default(std::mem::take(&mut decomposed.null_precedence), len);
    Ok(decomposed)
}

impl PreprocessedTable {
    /// Preprocess one table for row-vs-row ordering within it.
    ///
    /// `column_order` and `null_precedence` are either empty (ascending, nulls
    /// first) or hold one entry per column of `table`.
    ///
    /// # Errors
    /// [`RowCmpError::Configuration`] when row counts or the order arrays do
    /// not line up, [`RowCmpError::UnsupportedType`] for columns that cannot be
    /// ordered.
    pub fn create(
        table: &[ArrayRef],
        column_order: &[Order],
        null_precedence: &[NullOrder],
        ctx: &ComputeContext,
    ) -> Result<Self, RowCmpError> {
        let decomposed = decompose_for_order(table, column_order, null_precedence)?;

        let mut columns = Vec::with_capacity(decomposed.columns.len());
        let mut ranked = Vec::new();
        let mut ranked_floating_point = false;
        for ((column, &order), &nulls) in decomposed
            .columns
            .iter()
            .zip(&decomposed.column_order)
            .zip(&decomposed.null_precedence)
        {
            let transformed =
                transform_lists_of_structs(column, None, rank_null_order(order, nulls), ctx)?;
            ranked_floating_point |= transformed.ranked_floating_point;
            ranked.extend(transformed.ranked);
            columns.push(transformed.lhs);
        }
        if ranked_floating_point {
            rowcmp_log!(
                log::Level::Debug,
                ctx: ctx.log(),
                "preprocess_ranked_floats",
                "ranked_columns={}",
                ranked.len()
            );
        }

        let safe_for_two_table = ranked.is_empty();
        Self::assemble(
            Parts {
                columns,
                column_order: decomposed.column_order,
                null_precedence: decomposed.null_precedence,
                depths: decomposed.depths,
                ranked,
                num_rows: table.first().map_or(0, |column| column.len()),
                identity_token: new_identity_token(),
                joint: false,
                safe_for_two_table,
            },
            ctx,
        )
    }

    /// Preprocess two tables together for comparing rows of one against rows
    /// of the other. Rank columns are computed over both tables at once and
    /// both outputs share one identity token.
    ///
    /// # Errors
    /// [`RowCmpError::ShapeMismatch`] when the tables differ in column count
    /// or column types, before any other work; otherwise as [`Self::create`].
    pub fn create_pair(
        lhs: &[ArrayRef],
        rhs: &[ArrayRef],
        column_order: &[Order],
        null_precedence: &[NullOrder],
        ctx: &ComputeContext,
    ) -> Result<(Self, Self), RowCmpError> {
        check_shape_compatibility(lhs, rhs)?;
        let left = decompose_for_order(lhs, column_order, null_precedence)?;
        let right = decompose_for_order(rhs, column_order, null_precedence)?;

        let mut lhs_columns = Vec::with_capacity(left.columns.len());
        let mut rhs_columns = Vec::with_capacity(right.columns.len());
        let (mut lhs_ranked, mut rhs_ranked) = (Vec::new(), Vec::new());
        for (((l, r), &order), &nulls) in left
            .columns
            .iter()
            .zip(&right.columns)
            .zip(&left.column_order)
            .zip(&left.null_precedence)
        {
            let nulls = rank_null_order(order, nulls);
            let transformed = transform_lists_of_structs(l, Some(r), nulls, ctx)?;
            let mut ranks = transformed.ranked.into_iter();
            lhs_ranked.extend(ranks.next());
            rhs_ranked.extend(ranks.next());
            lhs_columns.push(transformed.lhs);
            rhs_columns.push(transformed.rhs.unwrap_or_else(|| r.clone()));
        }

        let identity_token = new_identity_token();
        let lhs_table = Self::assemble(
            Parts {
                columns: lhs_columns,
                column_order: left.column_order.clone(),
                null_precedence: left.null_precedence.clone(),
                depths: left.depths.clone(),
                ranked: lhs_ranked,
                num_rows: lhs.first().map_or(0, |column| column.len()),
                identity_token,
                joint: true,
                safe_for_two_table: true,
            },
            ctx,
        )?;
        // The right side takes the left side's order and precedence.
        let rhs_table = Self::assemble(
            Parts {
                columns: rhs_columns,
                column_order: left.column_order,
                null_precedence: left.null_precedence,
                depths: left.depths,
                ranked: rhs_ranked,
                num_rows: rhs.first().map_or(0, |column| column.len()),
                identity_token,
                joint: true,
                safe_for_two_table: true,
            },
            ctx,
        )?;
        Ok((lhs_table, rhs_table))
    }

    fn assemble(parts: Parts, ctx: &ComputeContext) -> Result<Self, RowCmpError> {
        check_lex_compatibility(&parts.columns)?;
        let compiled = parts
            .columns
            .iter()
            .map(LexColumn::compile)
            .collect::<Result<Vec<_>, _>>()?;

        let bytes = compiled.iter().map(LexColumn::allocated_bytes).sum::<usize>()
            + parts
                .ranked
                .iter()
                .map(|ranks| ranks.len() * std::mem::size_of::<u32>())
                .sum::<usize>();
        let reservation = ctx.memory().reserve(bytes);

        rowcmp_log!(
            log::Level::Debug,
            ctx: ctx.log(),
            "preprocess",
            "rows={} columns={} ranked={} joint={} safe_for_two_table={} bytes={}",
            parts.num_rows,
            parts.columns.len(),
            parts.ranked.len(),
            parts.joint,
            parts.safe_for_two_table,
            reservation.bytes()
        );

        Ok(Self {
            columns: parts.columns,
            column_order: parts.column_order,
            null_precedence: parts.null_precedence,
            depths: parts.depths,
            compiled,
            ranked: parts.ranked,
            num_rows: parts.num_rows,
            identity_token: parts.identity_token,
            joint: parts.joint,
            safe_for_two_table: parts.safe_for_two_table,
            reservation,
        })
    }

    /// Comparator over rows of this table.
    pub fn comparator(&self) -> SelfComparator<'_> {
        SelfComparator::new(self)
    }

    /// Decomposed, rank-transformed columns.
    pub fn columns(&self) -> &[ArrayRef] {
        &self.columns
    }

    /// Direction per decomposed column.
    pub fn column_order(&self) -> &[Order] {
        &self.column_order
    }

    /// Null precedence per decomposed column.
    pub fn null_precedence(&self) -> &[NullOrder] {
        &self.null_precedence
    }

    /// Struct levels elided above each decomposed column.
    pub fn depths(&self) -> &[usize] {
        &self.depths
    }

    /// Rank columns kept alive for the comparators.
    pub fn ranked_columns(&self) -> &[ArrayRef] {
        &self.ranked
    }

    /// Dremel levels of decomposed column `column`, if it is a list.
    pub fn dremel(&self, column: usize) -> Option<&DremelData> {
        match self.compiled.get(column)? {
            LexColumn::List { dremel, .. } => Some(dremel),
            _ => None,
        }
    }

    /// Rows in the source table.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Random token shared by the two halves of a joint build.
    pub fn identity_token(&self) -> u64 {
        self.identity_token
    }

    /// Whether this table came out of [`Self::create_pair`].
    pub fn is_joint(&self) -> bool {
        self.joint
    }

    /// Whether this table may be paired with an independently built one.
    ///
    /// Tables built by [`Self::create`] are safe only when no list-of-struct
    /// column was ranked, whatever the struct's leaf types: ranks computed per
    /// table are not comparable with another table's ranks. Use
    /// [`Self::create_pair`] to compare such tables.
    pub fn is_safe_for_two_table(&self) -> bool {
        self.safe_for_two_table
    }

    /// Bytes accounted against the construction context.
    pub fn reserved_bytes(&self) -> usize {
        self.reservation.bytes()
    }
}
