//! Glue between record types and the [`Session`](crate::session::Session).

use std::fmt::{self, Display};

use diesel::{QueryResult, insert_into};
use futures::future::BoxFuture;
use serde_json::{Map, Value};

use crate::{
	db::{BoxedSqlConn, schema::*},
	submission::{PackageStatus, Submission, SubmissionPackage},
	system::{Arch, Distro, System},
	vendor::Vendor,
};

/// A record type persisted in its own table.
pub trait Entity: Sized + Send + 'static {
	/// Name of the backing table.
	const TABLE: &'static str;

	/// Wraps the record for staging.
	fn into_row(self) -> Row;

	/// Loads all persisted records in insertion order.
	fn load_all(conn: &mut BoxedSqlConn) -> BoxFuture<'_, QueryResult<Vec<Self>>>;

	/// Loads the earliest inserted record, if any.
	fn load_first(conn: &mut BoxedSqlConn) -> BoxFuture<'_, QueryResult<Option<Self>>>;
}

/// Flat external view of a record.
pub trait FlatRecord {
	/// Maps every column name to its scalar value.
	fn serialize(&self) -> Map<String, Value>;
}

pub(crate) fn flat<const N: usize>(fields: [(&str, Value); N]) -> Map<String, Value> {
	fields
		.into_iter()
		.map(|(name, value)| (name.to_owned(), value))
		.collect()
}

macro_rules! impl_entity {
	($entity:ident, $variant:ident, $table:ident) => {
		impl $crate::entity::Entity for $entity {
			const TABLE: &'static str = stringify!($table);

			fn into_row(self) -> $crate::entity::Row {
				$crate::entity::Row::$variant(self)
			}

			fn load_all(
				conn: &mut $crate::db::BoxedSqlConn,
			) -> ::futures::future::BoxFuture<'_, ::diesel::QueryResult<Vec<Self>>> {
				use ::diesel::QueryDsl;

				conn.load($crate::db::schema::$table::table.order($crate::db::insertion_order()))
			}

			fn load_first(
				conn: &mut $crate::db::BoxedSqlConn,
			) -> ::futures::future::BoxFuture<'_, ::diesel::QueryResult<Option<Self>>> {
				use ::diesel::QueryDsl;
				use ::futures::future::FutureExt;

				conn.load(
					$crate::db::schema::$table::table
						.order($crate::db::insertion_order())
						.limit(1),
				)
				.map(|rows| rows.map(|rows: Vec<Self>| rows.into_iter().next()))
				.boxed()
			}
		}
	};
}
pub(crate) use impl_entity;

/// A staged record of any type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
	Arch(Arch),
	Distro(Distro),
	PackageStatus(PackageStatus),
	Vendor(Vendor),
	System(System),
	Submission(Submission),
	SubmissionPackage(SubmissionPackage),
}

impl Row {
	/// Position of the row's table in foreign key dependency order.
	///
	/// A table only references tables of lower rank.
	pub fn rank(&self) -> u8 {
		match self {
			Row::Arch(_) => 0,
			Row::Distro(_) => 1,
			Row::PackageStatus(_) => 2,
			Row::Vendor(_) => 3,
			Row::System(_) => 4,
			Row::Submission(_) => 5,
			Row::SubmissionPackage(_) => 6,
		}
	}

	pub fn table(&self) -> &'static str {
		match self {
			Row::Arch(_) => Arch::TABLE,
			Row::Distro(_) => Distro::TABLE,
			Row::PackageStatus(_) => PackageStatus::TABLE,
			Row::Vendor(_) => Vendor::TABLE,
			Row::System(_) => System::TABLE,
			Row::Submission(_) => Submission::TABLE,
			Row::SubmissionPackage(_) => SubmissionPackage::TABLE,
		}
	}

	/// Writes the row, leaving constraint checks to the store.
	pub async fn insert(&self, conn: &mut BoxedSqlConn) -> QueryResult<usize> {
		match self {
			Row::Arch(row) => conn.execute(insert_into(arches::table).values(row)).await,
			Row::Distro(row) => conn.execute(insert_into(distros::table).values(row)).await,
			Row::PackageStatus(row) => {
				conn.execute(insert_into(package_statuses::table).values(row))
					.await
			}
			Row::Vendor(row) => conn.execute(insert_into(vendors::table).values(row)).await,
			Row::System(row) => conn.execute(insert_into(systems::table).values(row)).await,
			Row::Submission(row) => {
				conn.execute(insert_into(submissions::table).values(row))
					.await
			}
			Row::SubmissionPackage(row) => {
				conn.execute(insert_into(submission_packages::table).values(row))
					.await
			}
		}
	}
}

impl Display for Row {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Row::Arch(row) => write!(f, "<Arch {}>", row.name),
			Row::Distro(row) => write!(f, "<Distro {} {}>", row.name, row.version),
			Row::PackageStatus(row) => write!(f, "<PackageStatus {}>", row.status),
			Row::Vendor(row) => write!(f, "<Vendor {}>", row.vendor_name),
			Row::System(row) => write!(f, "<System {}>", row.hw_uuid),
			Row::Submission(row) => {
				write!(f, "<Submission {} {}>", row.hw_uuid, row.submission_date)
			}
			Row::SubmissionPackage(row) => write!(
				f,
				"<SubmissionPackage {} {} {}-{}>",
				row.hw_uuid, row.pkg_name, row.pkg_version, row.pkg_release
			),
		}
	}
}

#[cfg(test)]
mod test {
	use time::{Date, Month};

	use super::*;

	#[test]
	fn test_rank_follows_references() {
		let system = Row::System(System::new("hw_uuid1", "i586", "Fedora", "16"));
		let package = Row::SubmissionPackage(SubmissionPackage::new(
			"hw_uuid1",
			Date::from_calendar_date(2012, Month::March, 1).unwrap(),
			"python",
			"2.7",
			"3",
			"",
			"i586",
			"repo1",
			"voted",
		));
		assert!(Row::Arch(Arch::new("i586")).rank() < system.rank());
		assert!(Row::Distro(Distro::new("Fedora", "16")).rank() < system.rank());
		assert!(Row::Vendor(Vendor::new("repo1")).rank() < package.rank());
		assert!(Row::PackageStatus(PackageStatus::new("voted")).rank() < package.rank());
		assert!(system.rank() < package.rank());
	}

	#[test]
	fn test_display() {
		assert_eq!(
			Row::Distro(Distro::new("openSUSE", "12.1")).to_string(),
			"<Distro openSUSE 12.1>"
		);
		assert_eq!(Row::Vendor(Vendor::new("repo1")).to_string(), "<Vendor repo1>");
		assert_eq!(Row::System(System::new("hw", "i586", "Fedora", "16")).table(), "systems");
	}
}
