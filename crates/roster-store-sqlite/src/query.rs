//! SQL text generation for entities and specifications.
//!
//! Table and column names come from `'static` entity metadata and are
//! checked against [`Entity::has_column`] before they reach SQL, so only
//! values travel as bound parameters.

use roster_core::{
  entity::{Entity, ID},
  specification::{Direction, Filter, Specification},
};
use rusqlite::types::Value as SqlValue;

use crate::{Error, Result, encode::encode_value, encode::encode_values};

/// A statement and its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Sql {
  pub text:   String,
  pub params: Vec<SqlValue>,
}

fn checked<E: Entity>(column: &'static str) -> Result<&'static str> {
  if E::has_column(column) {
    Ok(column)
  } else {
    Err(Error::UnknownColumn { entity: E::NAME, column })
  }
}

fn placeholders(n: usize) -> String { vec!["?"; n].join(", ") }

fn render_filter<E: Entity>(
  filter: &Filter,
  text: &mut String,
  params: &mut Vec<SqlValue>,
) -> Result<()> {
  match filter {
    Filter::Eq(column, value) => {
      text.push_str(checked::<E>(*column)?);
      text.push_str(" = ?");
      params.push(encode_value(value.clone()));
    }
    Filter::In(_, values) if values.is_empty() => text.push('0'),
    Filter::In(column, values) => {
      text.push_str(checked::<E>(*column)?);
      text.push_str(" IN (");
      text.push_str(&placeholders(values.len()));
      text.push(')');
      params.extend(values.iter().cloned().map(encode_value));
    }
    Filter::And(filters) if filters.is_empty() => text.push('1'),
    Filter::And(filters) => {
      for (i, inner) in filters.iter().enumerate() {
        if i > 0 {
          text.push_str(" AND ");
        }
        text.push('(');
        render_filter::<E>(inner, text, params)?;
        text.push(')');
      }
    }
  }
  Ok(())
}

fn column_list<E: Entity>() -> String {
  std::iter::once(ID)
    .chain(E::COLUMNS.iter().map(|c| c.name))
    .collect::<Vec<_>>()
    .join(", ")
}

/// `SELECT id, columns... FROM table [WHERE] [ORDER BY] [LIMIT]`
pub fn select<E: Entity>(spec: &Specification, limit: Option<usize>) -> Result<Sql> {
  let mut text = format!("SELECT {} FROM {}", column_list::<E>(), E::TABLE);
  let mut params = Vec::new();

  if let Some(filter) = &spec.filter {
    text.push_str(" WHERE ");
    render_filter::<E>(filter, &mut text, &mut params)?;
  }
  if let Some(order) = &spec.order {
    let dir = match order.direction {
      Direction::Ascending => "ASC",
      Direction::Descending => "DESC",
    };
    text.push_str(&format!(" ORDER BY {} {dir}", checked::<E>(order.column)?));
  }
  if let Some(limit) = limit {
    text.push_str(&format!(" LIMIT {limit}"));
  }

  Ok(Sql { text, params })
}

pub fn exists<E: Entity>() -> String {
  format!("SELECT EXISTS (SELECT 1 FROM {})", E::TABLE)
}

pub fn insert<E: Entity>(entity: &E) -> Sql {
  let names: Vec<&str> = E::COLUMNS.iter().map(|c| c.name).collect();
  Sql {
    text:   format!(
      "INSERT INTO {} ({}) VALUES ({})",
      E::TABLE,
      names.join(", "),
      placeholders(names.len()),
    ),
    params: encode_values(entity.values()),
  }
}

/// Overwrite the mutable columns of the row keyed by `entity.id()`.
pub fn update<E: Entity>(entity: &E) -> Sql {
  let sets: Vec<String> = E::COLUMNS
    .iter()
    .filter(|c| c.mutable)
    .map(|c| format!("{} = ?", c.name))
    .collect();
  let mut params = encode_values(entity.mutable_values());
  params.push(SqlValue::Integer(entity.id()));
  Sql {
    text: format!("UPDATE {} SET {} WHERE {ID} = ?", E::TABLE, sets.join(", ")),
    params,
  }
}

pub fn delete_by_id<E: Entity>(id: i64) -> Sql {
  Sql {
    text:   format!("DELETE FROM {} WHERE {ID} = ?", E::TABLE),
    params: vec![SqlValue::Integer(id)],
  }
}

pub fn delete_where<E: Entity>(filter: &Filter) -> Result<Sql> {
  let mut text = format!("DELETE FROM {} WHERE ", E::TABLE);
  let mut params = Vec::new();
  render_filter::<E>(filter, &mut text, &mut params)?;
  Ok(Sql { text, params })
}

#[cfg(test)]
mod tests {
  use roster_core::{
    person::{Person, columns},
    specification::Order,
  };

  use super::*;

  #[test]
  fn active_point_lookup_renders_both_conditions() {
    let spec = Specification::matching(Filter::eq(columns::ID, 7i64))
      .filter(Filter::eq(columns::IS_DELETED, false));
    let sql = select::<Person>(&spec, Some(1)).unwrap();
    assert_eq!(
      sql.text,
      "SELECT id, name, description, email, is_deleted, created_date FROM person \
       WHERE (id = ?) AND (is_deleted = ?) LIMIT 1"
    );
    assert_eq!(sql.params, vec![SqlValue::Integer(7), SqlValue::Integer(0)]);
  }

  #[test]
  fn list_renders_in_and_order() {
    let spec = Specification::matching(Filter::is_in(columns::ID, [3i64, 1]))
      .order_by(Order::desc(columns::ID));
    let sql = select::<Person>(&spec, None).unwrap();
    assert!(sql.text.ends_with("WHERE id IN (?, ?) ORDER BY id DESC"), "{}", sql.text);
    assert_eq!(sql.params.len(), 2);
  }

  #[test]
  fn empty_in_renders_false() {
    let sql = delete_where::<Person>(&Filter::is_in(columns::ID, Vec::<i64>::new())).unwrap();
    assert_eq!(sql.text, "DELETE FROM person WHERE 0");
    assert!(sql.params.is_empty());
  }

  #[test]
  fn unknown_columns_are_rejected() {
    let spec = Specification::matching(Filter::eq("password", "x"));
    let err = select::<Person>(&spec, None).unwrap_err();
    assert!(matches!(err, Error::UnknownColumn { column: "password", .. }));

    let spec = Specification::all().order_by(Order::asc("nope"));
    assert!(select::<Person>(&spec, None).is_err());
  }

  #[test]
  fn update_skips_created_date() {
    let mut person = Person::new("Ana", None, None);
    person.id = 4;
    let sql = update(&person);
    assert_eq!(
      sql.text,
      "UPDATE person SET name = ?, description = ?, email = ?, is_deleted = ? WHERE id = ?"
    );
    assert_eq!(sql.params.last(), Some(&SqlValue::Integer(4)));
  }
}
