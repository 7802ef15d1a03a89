//! Unit of work over a single connection.
//!
//! Records are staged with [`Session::add`] and only written, and thus
//! checked against the store's constraints, on [`Session::flush`] or
//! [`Session::commit`].

use std::marker::PhantomData;

use diesel::result::DatabaseErrorKind;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
	db::BoxedSqlConn,
	entity::{Entity, Row},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransactionState {
	/// No transaction is open.
	Idle,
	Active,
	/// A write failed; only a rollback is accepted.
	Failed,
}

/// A unit of work bound to one connection.
///
/// Sessions are cheap and meant to live for a single logical request.
pub struct Session<'c> {
	conn: &'c mut BoxedSqlConn,
	pending: Vec<Row>,
	state: TransactionState,
}

impl<'c> Session<'c> {
	pub fn new(conn: &'c mut BoxedSqlConn) -> Self {
		Self {
			conn,
			pending: Vec::new(),
			state: TransactionState::Idle,
		}
	}

	/// Stages a record. Nothing is validated until the next flush.
	pub fn add<E: Entity>(&mut self, entity: E) {
		self.pending.push(entity.into_row());
	}

	/// Staged records not yet written.
	pub fn pending(&self) -> &[Row] {
		&self.pending
	}

	/// Whether a failed write left the session waiting for a rollback.
	pub fn is_failed(&self) -> bool {
		self.state == TransactionState::Failed
	}

	/// The underlying connection, inside the session's transaction if one is open.
	pub fn connection(&mut self) -> &mut BoxedSqlConn {
		&mut *self.conn
	}

	/// Writes all staged records, opening a transaction if needed.
	///
	/// Records are written in foreign key dependency order, keeping the
	/// staging order within a table. On failure the session must be
	/// rolled back before it can write again.
	pub async fn flush(&mut self) -> Result<(), SessionError> {
		if self.state == TransactionState::Failed {
			return Err(SessionError::TransactionFailed);
		}
		if self.pending.is_empty() {
			return Ok(());
		}
		if self.state == TransactionState::Idle {
			self.conn.begin().await?;
			self.state = TransactionState::Active;
		}

		let mut pending = std::mem::take(&mut self.pending);
		pending.sort_by_key(Row::rank);
		for row in &pending {
			if let Err(err) = row.insert(&mut *self.conn).await {
				self.state = TransactionState::Failed;
				let err = SessionError::from_write(row.table(), err);
				warn!(%row, %err, "failed to write row");
				return Err(err);
			}
		}
		debug!(rows = pending.len(), "flushed session");

		Ok(())
	}

	/// Flushes and commits the open transaction.
	pub async fn commit(&mut self) -> Result<(), SessionError> {
		self.flush().await?;
		if self.state == TransactionState::Active {
			if let Err(err) = self.conn.commit().await {
				self.state = TransactionState::Failed;
				return Err(err.into());
			}
			self.state = TransactionState::Idle;
			debug!("committed session");
		}
		Ok(())
	}

	/// Discards everything since the last commit, staged records included.
	pub async fn rollback(&mut self) -> Result<(), SessionError> {
		let discarded = self.pending.len();
		self.pending.clear();
		if self.state != TransactionState::Idle {
			match self.conn.rollback().await {
				Ok(()) | Err(diesel::result::Error::NotInTransaction) => {
					self.state = TransactionState::Idle;
				}
				Err(err) => {
					self.state = TransactionState::Failed;
					return Err(err.into());
				}
			}
		}
		debug!(discarded, "rolled back session");
		Ok(())
	}

	/// Queries persisted records of one type.
	pub fn query<E: Entity>(&mut self) -> Query<'_, E> {
		Query {
			conn: &mut *self.conn,
			entity: PhantomData,
		}
	}
}

impl Drop for Session<'_> {
	fn drop(&mut self) {
		if self.state == TransactionState::Idle {
			return;
		}
		match self.conn.rollback_now() {
			Ok(true) => debug!(discarded = self.pending.len(), "rolled back dropped session"),
			Ok(false) => {
				warn!("session dropped inside a transaction, the connection is unusable")
			}
			Err(err) => warn!(%err, "failed to roll back dropped session"),
		}
	}
}

/// Reads persisted records of type `E`.
pub struct Query<'s, E> {
	conn: &'s mut BoxedSqlConn,
	entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Query<'_, E> {
	/// All records in insertion order.
	pub async fn all(self) -> Result<Vec<E>, SessionError> {
		Ok(E::load_all(self.conn).await?)
	}

	/// The earliest inserted record.
	pub async fn first(self) -> Result<Option<E>, SessionError> {
		Ok(E::load_first(self.conn).await?)
	}
}

#[derive(Debug, Error)]
pub enum SessionError {
	/// A foreign key references a row that does not exist.
	#[error("referential integrity violated in {table}: {message}")]
	ReferentialIntegrity { table: &'static str, message: String },
	/// A primary key or unique column already holds the value.
	#[error("uniqueness violated in {table}: {message}")]
	Uniqueness { table: &'static str, message: String },
	#[error("transaction has failed and must be rolled back")]
	TransactionFailed,
	#[error("query error: {0}")]
	QueryError(#[from] diesel::result::Error),
}

impl SessionError {
	fn from_write(table: &'static str, err: diesel::result::Error) -> Self {
		match err {
			diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
				Self::ReferentialIntegrity {
					table,
					message: info.message().to_owned(),
				}
			}
			diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
				Self::Uniqueness {
					table,
					message: info.message().to_owned(),
				}
			}
			err => Self::QueryError(err),
		}
	}
}
