//! The unit of work: one transaction bound to one authenticated caller.

use roster_core::{auth::RequestContext, query::Statement};
use rusqlite::{Connection, OptionalExtension as _, Transaction, params_from_iter};

use crate::{
  Error, Result,
  encode::sql_value,
  error::StorageContext as _,
};

/// A transaction handle carrying the caller it was opened for.
///
/// Dropping a `UnitOfWork`'s transaction without committing rolls back every
/// statement issued through it.
pub struct UnitOfWork<'a> {
  tx:      &'a Transaction<'a>,
  auth_id: &'a str,
  ctx:     &'a RequestContext,
}

impl<'a> UnitOfWork<'a> {
  pub fn auth_id(&self) -> &'a str { self.auth_id }

  pub fn tx(&self) -> &'a Transaction<'a> { self.tx }

  pub fn execute(&self, stmt: &Statement, context: &'static str) -> Result<usize> {
    self
      .tx
      .execute(&stmt.sql, params_from_iter(stmt.params.iter().map(sql_value)))
      .context(context)
  }

  pub fn exists(&self, stmt: &Statement, context: &'static str) -> Result<bool> {
    self
      .tx
      .query_row(&stmt.sql, params_from_iter(stmt.params.iter().map(sql_value)), |r| r.get(0))
      .context(context)
  }

  pub fn query_opt<T>(
    &self,
    stmt: &Statement,
    context: &'static str,
    map: impl FnOnce(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
  ) -> Result<Option<T>> {
    self
      .tx
      .query_row(&stmt.sql, params_from_iter(stmt.params.iter().map(sql_value)), map)
      .optional()
      .context(context)
  }

  pub fn query_all<T>(
    &self,
    stmt: &Statement,
    context: &'static str,
    map: impl FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
  ) -> Result<Vec<T>> {
    let mut prepared = self.tx.prepare(&stmt.sql).context(context)?;
    let rows = prepared
      .query_map(params_from_iter(stmt.params.iter().map(sql_value)), map)
      .context(context)?
      .collect::<rusqlite::Result<Vec<_>>>()
      .context(context)?;
    Ok(rows)
  }

  /// Fail if the request context's deadline has passed.
  pub fn ensure_live(&self, stage: &'static str) -> Result<()> { ensure_live(self.ctx, stage) }
}

fn ensure_live(ctx: &RequestContext, stage: &'static str) -> Result<()> {
  if ctx.is_expired() {
    return Err(Error::Cancelled(stage));
  }
  Ok(())
}

/// Run `work` inside a fresh transaction on `conn`, committing only if it
/// succeeds and the request is still live. Any error rolls everything back.
pub fn in_transaction<T>(
  conn: &mut Connection,
  ctx: &RequestContext,
  auth_id: &str,
  work: impl FnOnce(&UnitOfWork<'_>) -> Result<T>,
) -> Result<T> {
  ensure_live(ctx, "problem beginning transaction")?;
  let tx = conn.transaction().context("problem beginning transaction")?;

  let out = {
    let uow = UnitOfWork { tx: &tx, auth_id, ctx };
    let out = work(&uow)?;
    uow.ensure_live("problem committing transaction")?;
    out
  };

  tx.commit().context("problem committing transaction")?;
  Ok(out)
}
