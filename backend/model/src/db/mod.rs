use diesel::{
	QueryResult, RunQueryDsl, SqliteConnection,
	connection::{AnsiTransactionManager, SimpleConnection, TransactionManager},
	dsl::sql,
	expression::SqlLiteral,
	migration::MigrationVersion,
	query_dsl::methods::{ExecuteDsl, LoadQuery},
	sql_types::BigInt,
};
use diesel_async::{
	AnsiTransactionManager as AsyncAnsiTransactionManager, AsyncPgConnection,
	RunQueryDsl as AsyncRunQueryDsl, SimpleAsyncConnection,
	TransactionManager as AsyncTransactionManager,
	async_connection_wrapper::AsyncConnectionWrapper,
	methods::{ExecuteDsl as AsyncExecuteDsl, LoadQuery as AsyncLoadQuery},
	pooled_connection::PoolableConnection,
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use futures::future::{BoxFuture, FutureExt, ready};

pub mod schema;

/// A connection to either supported store.
pub enum BoxedSqlConn {
	Pg(AsyncPgConnection),
	Sqlite(SqliteConnection),
}

impl BoxedSqlConn {
	/// Prepares a freshly established physical connection.
	///
	/// SQLite ships with foreign key checks turned off, and the setting is
	/// per connection, so this must run once for every new connection.
	/// Without it, constraint violations are silently accepted.
	pub fn on_connect(&mut self) -> BoxFuture<Result<(), diesel::result::Error>> {
		match self {
			BoxedSqlConn::Pg(_) => ready(Ok(())).boxed(),
			BoxedSqlConn::Sqlite(conn) => {
				ready(conn.batch_execute("PRAGMA foreign_keys = ON")).boxed()
			}
		}
	}

	/// Executes `SELECT 1` to test if the connection is ready for use.
	pub fn ping(&mut self) -> BoxFuture<Result<(), diesel::result::Error>> {
		match self {
			BoxedSqlConn::Pg(conn) => conn.batch_execute("SELECT 1").boxed(),
			BoxedSqlConn::Sqlite(conn) => ready(conn.batch_execute("SELECT 1")).boxed(),
		}
	}

	/// Whether the connection is unusable, or was left inside a transaction.
	pub fn is_broken(&mut self) -> bool {
		match self {
			BoxedSqlConn::Pg(conn) => conn.is_broken(),
			BoxedSqlConn::Sqlite(conn) => {
				AnsiTransactionManager::is_broken_transaction_manager(conn)
			}
		}
	}

	pub fn is_sqlite(&self) -> bool {
		matches!(self, BoxedSqlConn::Sqlite(_))
	}
}

impl BoxedSqlConn {
	pub async fn begin(&mut self) -> QueryResult<()> {
		match self {
			BoxedSqlConn::Pg(conn) => AsyncAnsiTransactionManager::begin_transaction(conn).await,
			BoxedSqlConn::Sqlite(conn) => AnsiTransactionManager::begin_transaction(conn),
		}
	}

	pub async fn commit(&mut self) -> QueryResult<()> {
		match self {
			BoxedSqlConn::Pg(conn) => AsyncAnsiTransactionManager::commit_transaction(conn).await,
			BoxedSqlConn::Sqlite(conn) => AnsiTransactionManager::commit_transaction(conn),
		}
	}

	pub async fn rollback(&mut self) -> QueryResult<()> {
		match self {
			BoxedSqlConn::Pg(conn) => {
				AsyncAnsiTransactionManager::rollback_transaction(conn).await
			}
			BoxedSqlConn::Sqlite(conn) => AnsiTransactionManager::rollback_transaction(conn),
		}
	}

	/// Rolls back the open transaction without awaiting.
	///
	/// Only SQLite can do so; returns `Ok(false)` for PostgreSQL.
	pub fn rollback_now(&mut self) -> QueryResult<bool> {
		match self {
			BoxedSqlConn::Pg(_) => Ok(false),
			BoxedSqlConn::Sqlite(conn) => {
				AnsiTransactionManager::rollback_transaction(conn)?;
				Ok(true)
			}
		}
	}
}

impl<'query> BoxedSqlConn {
	/// Executes the given command, returning the number of rows affected.
	///
	/// Dispatches [RunQueryDsl::execute].
	pub fn execute<Q>(&mut self, query: Q) -> BoxFuture<'query, QueryResult<usize>>
	where
		Q: AsyncExecuteDsl<AsyncPgConnection> + 'query,
		Q: ExecuteDsl<SqliteConnection>,
	{
		match self {
			BoxedSqlConn::Pg(conn) => AsyncExecuteDsl::execute(query, conn),
			BoxedSqlConn::Sqlite(conn) => ready(ExecuteDsl::execute(query, conn)).boxed(),
		}
	}

	/// Executes the given query, returning a [`Vec`] with the returned rows.
	///
	/// Dispatches [RunQueryDsl::load].
	pub fn load<'conn, Q, U>(&'conn mut self, query: Q) -> BoxFuture<'query, QueryResult<Vec<U>>>
	where
		Q: Send,
		Q: AsyncLoadQuery<'query, AsyncPgConnection, U> + 'query,
		Q: LoadQuery<'query, SqliteConnection, U>,
		U: Send + 'query,
		'conn: 'query,
	{
		match self {
			BoxedSqlConn::Pg(conn) => AsyncRunQueryDsl::load(query, conn).boxed(),
			BoxedSqlConn::Sqlite(conn) => ready(RunQueryDsl::load(query, conn)).boxed(),
		}
	}
}

/// Order clause following row insertion.
///
/// SQLite provides `rowid` implicitly; the PostgreSQL migrations declare
/// it as a `BIGSERIAL` column on every table.
pub fn insertion_order() -> SqlLiteral<BigInt> {
	sql::<BigInt>("rowid")
}

const POSTGRESQL_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/postgresql");
const SQLITE_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/sqlite");

/// Run all pending migrations on an owned connection.
///
/// This is not async, so a spawn-blocking wrapper is required.
///
/// Dispatches [MigrationHarness::run_pending_migrations].
pub fn run_migrations(
	mut conn: BoxedSqlConn,
) -> diesel::migration::Result<Vec<MigrationVersion<'static>>> {
	match conn {
		BoxedSqlConn::Pg(conn) => {
			let mut async_wrapper: AsyncConnectionWrapper<AsyncPgConnection> =
				AsyncConnectionWrapper::from(conn);
			async_wrapper
				.run_pending_migrations(POSTGRESQL_MIGRATIONS)
				.map(|versions| {
					versions
						.into_iter()
						.map(|version| version.as_owned())
						.collect()
				})
		}
		BoxedSqlConn::Sqlite(_) => create_all(&mut conn),
	}
}

/// Creates all tables on an empty SQLite store.
///
/// The connection is borrowed, so an in-memory database survives the
/// call. PostgreSQL connections must go through [`run_migrations`].
pub fn create_all(
	conn: &mut BoxedSqlConn,
) -> diesel::migration::Result<Vec<MigrationVersion<'static>>> {
	match conn {
		BoxedSqlConn::Pg(_) => {
			Err("PostgreSQL migrations require an owned connection".into())
		}
		BoxedSqlConn::Sqlite(conn) => {
			conn.run_pending_migrations(SQLITE_MIGRATIONS)
				.map(|versions| {
					versions
						.into_iter()
						.map(|version| version.as_owned())
						.collect()
				})
		}
	}
}
