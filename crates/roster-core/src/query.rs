//! Driver-independent statement builder.
//!
//! A [`StatementBuilder`] is a pure function from (target table, excluded
//! columns, identity join, predicates) to a parameterised [`Statement`]. Every
//! statement scoped with [`StatementBuilder::owned_by`] joins the identity
//! table by id (unless it already targets the identity table) and carries the
//! predicate `"user".auth_id = ?`, so a generated statement can never reach a
//! row owned by another caller.
//!
//! Placeholders are positional `?`; parameters appear in `params` in the order
//! their placeholders appear in `sql`.

use std::fmt::Write as _;

use crate::table::{AUTH_ID_COLUMN, IDENTITY, SOFT_DELETE_COLUMN, Table};

// ─── Values ──────────────────────────────────────────────────────────────────

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Null,
  Integer(i64),
  Real(f64),
  Text(String),
}

impl From<i64> for Value {
  fn from(v: i64) -> Self { Self::Integer(v) }
}

impl From<bool> for Value {
  fn from(v: bool) -> Self { Self::Integer(i64::from(v)) }
}

impl From<f64> for Value {
  fn from(v: f64) -> Self { Self::Real(v) }
}

impl From<String> for Value {
  fn from(v: String) -> Self { Self::Text(v) }
}

impl From<&str> for Value {
  fn from(v: &str) -> Self { Self::Text(v.to_owned()) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(v: Option<T>) -> Self { v.map_or(Self::Null, Into::into) }
}

/// An ordered set of column assignments for an insert or update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
  values: Vec<(&'static str, Value)>,
}

impl Row {
  pub fn new() -> Self { Self::default() }

  pub fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
    self.values.push((column, value.into()));
    self
  }

  fn retained<'a>(
    &'a self,
    excluded: &'a [&'static str],
  ) -> impl Iterator<Item = &'a (&'static str, Value)> + 'a {
    self.values.iter().filter(move |(c, _)| !excluded.contains(c))
  }
}

// ─── Column exclusions ───────────────────────────────────────────────────────

/// Columns a non-owning table must never write because another table owns
/// them. Built once and shared; never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnExclusions {
  on_create: Vec<&'static str>,
  on_update: Vec<&'static str>,
}

impl ColumnExclusions {
  /// Exclusions for tables that extend `owner`: every owner column except its
  /// `id` is excluded from inserts, and on updates the `id` too, since updates
  /// target the row by id rather than rewrite it.
  pub fn owned_by(owner: &Table) -> Self {
    let on_create: Vec<&'static str> =
      owner.columns.iter().copied().filter(|c| *c != "id").collect();
    let mut on_update = on_create.clone();
    on_update.push("id");
    Self { on_create, on_update }
  }

  /// Exclusions for the columns owned by the identity sub-aggregate.
  pub fn identity_owned() -> Self { Self::owned_by(&IDENTITY) }

  pub fn on_create(&self) -> &[&'static str] { &self.on_create }

  pub fn on_update(&self) -> &[&'static str] { &self.on_update }
}

// ─── Predicates ──────────────────────────────────────────────────────────────

/// A boolean SQL fragment with its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
  sql:    String,
  params: Vec<Value>,
}

impl Predicate {
  /// `"alias".column = ?`
  pub fn eq(table: &Table, column: &str, value: impl Into<Value>) -> Self {
    Self { sql: format!("{} = ?", qualified(table, column)), params: vec![value.into()] }
  }

  /// `"alias".column IS NULL`
  pub fn is_null(table: &Table, column: &str) -> Self {
    Self { sql: format!("{} IS NULL", qualified(table, column)), params: Vec::new() }
  }

  /// `"alias".column IN (?, ?, …)`; an empty list matches nothing.
  pub fn is_in(table: &Table, column: &str, values: Vec<Value>) -> Self {
    if values.is_empty() {
      return Self { sql: "0".into(), params: Vec::new() };
    }
    let marks = vec!["?"; values.len()].join(", ");
    Self { sql: format!("{} IN ({marks})", qualified(table, column)), params: values }
  }

  /// `NOT EXISTS (SELECT 1 FROM other WHERE "other".other_column = "alias".column)`
  pub fn unreferenced(table: &Table, column: &str, other: &Table, other_column: &str) -> Self {
    Self {
      sql:    format!(
        "NOT EXISTS (SELECT 1 FROM {} AS \"{}\" WHERE {} = {})",
        other.name,
        other.alias,
        qualified(other, other_column),
        qualified(table, column),
      ),
      params: Vec::new(),
    }
  }
}

fn qualified(table: &Table, column: &str) -> String { format!("\"{}\".{column}", table.alias) }

fn labelled(table: &Table, column: &str) -> String {
  format!("{} AS {}", qualified(table, column), StatementBuilder::label(table, column))
}

// ─── Statements ──────────────────────────────────────────────────────────────

/// A rendered, parameterised statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
  pub sql:    String,
  pub params: Vec<Value>,
}

/// An extra table joined into selects, beyond the identity join.
#[derive(Debug, Clone, Copy)]
struct Join<'a> {
  table:         &'a Table,
  column:        &'static str,
  target_column: &'static str,
}

/// Builds statements against one target table.
#[derive(Debug, Clone)]
pub struct StatementBuilder<'a> {
  table:              &'a Table,
  excluded:           &'a [&'static str],
  owner:              Option<String>,
  soft_delete_filter: bool,
  joins:              Vec<Join<'a>>,
  predicates:         Vec<Predicate>,
  order_by:           Vec<String>,
}

impl<'a> StatementBuilder<'a> {
  pub fn new(table: &'a Table) -> Self {
    Self {
      table,
      excluded: &[],
      owner: None,
      soft_delete_filter: true,
      joins: Vec::new(),
      predicates: Vec::new(),
      order_by: Vec::new(),
    }
  }

  /// Drop these columns from any row written through this builder.
  pub fn excluding(mut self, columns: &'a [&'static str]) -> Self {
    self.excluded = columns;
    self
  }

  /// Restrict every statement to rows owned by the identity with `auth_id`.
  pub fn owned_by(mut self, auth_id: impl Into<String>) -> Self {
    self.owner = Some(auth_id.into());
    self
  }

  /// Reach soft-deleted identities too. Used when a statement targets an
  /// explicit primary key rather than the live view.
  pub fn including_archived(mut self) -> Self {
    self.soft_delete_filter = false;
    self
  }

  pub fn filter(mut self, predicate: Predicate) -> Self {
    self.predicates.push(predicate);
    self
  }

  /// Join `table` on `"table".column = "<target>".target_column` in selects;
  /// its columns are appended to the select list.
  pub fn join(
    mut self,
    table: &'a Table,
    column: &'static str,
    target_column: &'static str,
  ) -> Self {
    self.joins.push(Join { table, column, target_column });
    self
  }

  /// Order selects by `"table".column`, ascending.
  pub fn order_by(mut self, table: &Table, column: &str) -> Self {
    self.order_by.push(qualified(table, column));
    self
  }

  fn joins_identity(&self) -> bool { self.owner.is_some() && !self.table.is_identity() }

  /// `"user".id = "<alias>".<identity_key>`
  fn join_condition(&self) -> String {
    let key = self.table.identity_key.unwrap_or("id");
    format!("{} = {}", qualified(&IDENTITY, "id"), qualified(self.table, key))
  }

  /// The ownership predicates, rendered against the identity alias.
  fn ownership(&self) -> Vec<Predicate> {
    let Some(auth_id) = &self.owner else { return Vec::new() };
    let mut preds = vec![Predicate::eq(&IDENTITY, AUTH_ID_COLUMN, auth_id.as_str())];
    if self.soft_delete_filter {
      preds.push(Predicate::is_null(&IDENTITY, SOFT_DELETE_COLUMN));
    }
    preds
  }

  /// Output column label for `column` of `table`, e.g. `person_given_name`.
  pub fn label(table: &Table, column: &str) -> String { format!("{}_{column}", table.alias) }

  /// Select the target's retained columns, then every column of each joined
  /// table, then every identity column when the identity is joined. Columns
  /// are labelled with [`Self::label`].
  pub fn select(&self) -> Statement {
    let mut cols: Vec<String> = self
      .table
      .columns
      .iter()
      .filter(|c| !self.excluded.contains(*c))
      .map(|c| labelled(self.table, c))
      .collect();
    for join in &self.joins {
      cols.extend(join.table.columns.iter().map(|c| labelled(join.table, c)));
    }
    if self.joins_identity() {
      cols.extend(IDENTITY.columns.iter().map(|c| labelled(&IDENTITY, c)));
    }

    let mut sql = format!("SELECT {} FROM {}", cols.join(", "), self.from_clause());
    let mut params = Vec::new();
    self.push_where(&mut sql, &mut params, self.ownership());
    if !self.order_by.is_empty() {
      let _ = write!(sql, " ORDER BY {}", self.order_by.join(", "));
    }
    Statement { sql, params }
  }

  /// `SELECT EXISTS(...)` over the scoped rows.
  pub fn exists(&self) -> Statement {
    let mut sql = format!("SELECT EXISTS(SELECT 1 FROM {}", self.from_clause());
    let mut params = Vec::new();
    self.push_where(&mut sql, &mut params, self.ownership());
    sql.push(')');
    Statement { sql, params }
  }

  /// Inserts carry no predicates; ownership of inserted rows comes from the
  /// key values the caller resolved under an owned scope.
  pub fn insert(&self, row: &Row) -> Statement {
    let retained: Vec<_> = row.retained(self.excluded).collect();
    let cols: Vec<&str> = retained.iter().map(|(c, _)| *c).collect();
    let marks = vec!["?"; cols.len()].join(", ");
    Statement {
      sql:    format!("INSERT INTO {} ({}) VALUES ({marks})", self.table.name, cols.join(", ")),
      params: retained.into_iter().map(|(_, v)| v.clone()).collect(),
    }
  }

  pub fn update(&self, row: &Row) -> Statement {
    let retained: Vec<_> = row.retained(self.excluded).collect();
    let sets: Vec<String> = retained.iter().map(|(c, _)| format!("{c} = ?")).collect();
    let mut params: Vec<Value> = retained.into_iter().map(|(_, v)| v.clone()).collect();

    let mut sql =
      format!("UPDATE {} AS \"{}\" SET {}", self.table.name, self.table.alias, sets.join(", "));

    let mut scope = Vec::new();
    if self.joins_identity() {
      let _ = write!(sql, " FROM {} AS \"{}\"", IDENTITY.name, IDENTITY.alias);
      scope.push(Predicate { sql: self.join_condition(), params: Vec::new() });
    }
    scope.extend(self.ownership());
    self.push_where(&mut sql, &mut params, scope);
    Statement { sql, params }
  }

  /// SQLite has no `DELETE … JOIN`, so the identity join becomes a correlated
  /// `EXISTS` carrying the ownership predicates.
  pub fn delete(&self) -> Statement {
    let mut sql = format!("DELETE FROM {} AS \"{}\"", self.table.name, self.table.alias);
    let mut params = Vec::new();

    let mut scope = Vec::new();
    if self.joins_identity() {
      let mut inner = format!(
        "EXISTS (SELECT 1 FROM {} AS \"{}\" WHERE {}",
        IDENTITY.name,
        IDENTITY.alias,
        self.join_condition()
      );
      let mut inner_params = Vec::new();
      for p in self.ownership() {
        let _ = write!(inner, " AND {}", p.sql);
        inner_params.extend(p.params);
      }
      inner.push(')');
      scope.push(Predicate { sql: inner, params: inner_params });
    } else {
      scope.extend(self.ownership());
    }
    self.push_where(&mut sql, &mut params, scope);
    Statement { sql, params }
  }

  fn from_clause(&self) -> String {
    let mut from = format!("{} AS \"{}\"", self.table.name, self.table.alias);
    for join in &self.joins {
      let _ = write!(
        from,
        " JOIN {} AS \"{}\" ON {} = {}",
        join.table.name,
        join.table.alias,
        qualified(join.table, join.column),
        qualified(self.table, join.target_column)
      );
    }
    if self.joins_identity() {
      let _ = write!(
        from,
        " JOIN {} AS \"{}\" ON {}",
        IDENTITY.name,
        IDENTITY.alias,
        self.join_condition()
      );
    }
    from
  }

  /// Append `WHERE` with `scope` first, then the builder's own predicates.
  fn push_where(&self, sql: &mut String, params: &mut Vec<Value>, scope: Vec<Predicate>) {
    let all: Vec<Predicate> = scope.into_iter().chain(self.predicates.iter().cloned()).collect();
    if all.is_empty() {
      return;
    }
    let clauses: Vec<&str> = all.iter().map(|p| p.sql.as_str()).collect();
    let _ = write!(sql, " WHERE {}", clauses.join(" AND "));
    for p in all {
      params.extend(p.params);
    }
  }
}
