//! Declarative read queries.
//!
//! A [`Specification`] is plain data: a filter, an ordering and a tracking
//! flag. Backends translate it into their own query language; tests build
//! and compare specifications without a store.

use std::cmp::Ordering;

use crate::entity::{Entity, Value};

// ─── Filter ──────────────────────────────────────────────────────────────────

/// A boolean predicate over an entity's columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
  /// `column = value`
  Eq(&'static str, Value),
  /// `column IN (values)`; an empty list matches nothing.
  In(&'static str, Vec<Value>),
  /// Every inner filter holds; an empty list matches everything.
  And(Vec<Filter>),
}

impl Filter {
  pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
    Self::Eq(column, value.into())
  }

  pub fn is_in<V: Into<Value>>(
    column: &'static str,
    values: impl IntoIterator<Item = V>,
  ) -> Self {
    Self::In(column, values.into_iter().map(Into::into).collect())
  }

  pub fn and(self, other: Filter) -> Self {
    match self {
      Self::And(mut filters) => {
        filters.push(other);
        Self::And(filters)
      }
      first => Self::And(vec![first, other]),
    }
  }

  /// Evaluate the filter against an in-memory entity. Unknown columns never
  /// match.
  pub fn matches<E: Entity>(&self, entity: &E) -> bool {
    match self {
      Self::Eq(column, value) => entity.field(column).as_ref() == Some(value),
      Self::In(column, values) => entity
        .field(column)
        .is_some_and(|field| values.contains(&field)),
      Self::And(filters) => filters.iter().all(|f| f.matches(entity)),
    }
  }

  /// Every column the filter refers to.
  pub fn columns(&self) -> Vec<&'static str> {
    match self {
      Self::Eq(column, _) | Self::In(column, _) => vec![*column],
      Self::And(filters) => filters.iter().flat_map(Filter::columns).collect(),
    }
  }
}

// ─── Order ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
  #[default]
  Ascending,
  Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
  pub column:    &'static str,
  pub direction: Direction,
}

impl Order {
  pub fn asc(column: &'static str) -> Self {
    Self { column, direction: Direction::Ascending }
  }

  pub fn desc(column: &'static str) -> Self {
    Self { column, direction: Direction::Descending }
  }

  /// Compare two entities by this ordering.
  pub fn compare<E: Entity>(&self, a: &E, b: &E) -> Ordering {
    let ord = a
      .field(self.column)
      .partial_cmp(&b.field(self.column))
      .unwrap_or(Ordering::Equal);
    match self.direction {
      Direction::Ascending => ord,
      Direction::Descending => ord.reverse(),
    }
  }
}

// ─── Specification ───────────────────────────────────────────────────────────

/// What to read, in which order, and whether the results are tracked.
///
/// Tracked results are remembered by the repository session that loaded
/// them; a later update of an unchanged tracked row is skipped on save.
/// Untracked results are detached snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct Specification {
  pub filter:  Option<Filter>,
  pub order:   Option<Order>,
  pub tracked: bool,
}

impl Default for Specification {
  fn default() -> Self { Self { filter: None, order: None, tracked: true } }
}

impl Specification {
  /// Every row, tracked, in store order.
  pub fn all() -> Self { Self::default() }

  /// Rows matching `filter`, tracked.
  pub fn matching(filter: Filter) -> Self {
    Self { filter: Some(filter), ..Self::default() }
  }

  pub fn filter(mut self, filter: Filter) -> Self {
    self.filter = Some(match self.filter.take() {
      Some(existing) => existing.and(filter),
      None => filter,
    });
    self
  }

  pub fn order_by(mut self, order: Order) -> Self {
    self.order = Some(order);
    self
  }

  pub fn tracked(mut self, tracked: bool) -> Self {
    self.tracked = tracked;
    self
  }

  pub fn untracked(self) -> Self { self.tracked(false) }

  /// Apply the specification to an in-memory collection.
  pub fn apply<E: Entity>(&self, rows: impl IntoIterator<Item = E>) -> Vec<E> {
    let mut out: Vec<E> = rows
      .into_iter()
      .filter(|row| self.filter.as_ref().is_none_or(|f| f.matches(row)))
      .collect();
    if let Some(order) = &self.order {
      out.sort_by(|a, b| order.compare(a, b));
    }
    out
  }
}
