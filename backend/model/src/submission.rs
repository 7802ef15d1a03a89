//! Submissions and the packages reported in them.

use diesel::{ExpressionMethods, Insertable, QueryDsl, Queryable};
use serde_json::{Map, Value};
use time::{Date, OffsetDateTime};

use crate::{
	db::{
		insertion_order,
		schema::{package_statuses, submission_packages, submissions},
	},
	entity::{FlatRecord, flat, impl_entity},
	session::{Session, SessionError},
};

/// An allowed package state, e.g. `voted` or `installed`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Queryable, Insertable)]
#[diesel(table_name = package_statuses)]
pub struct PackageStatus {
	pub status: String,
}

impl PackageStatus {
	pub fn new(status: impl Into<String>) -> Self {
		Self {
			status: status.into(),
		}
	}
}

impl_entity!(PackageStatus, PackageStatus, package_statuses);

impl FlatRecord for PackageStatus {
	fn serialize(&self) -> Map<String, Value> {
		flat([("status", self.status.clone().into())])
	}
}

/// A report sent by a system.
///
/// Identified by the system and the (UTC) day it was received on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Queryable, Insertable)]
#[diesel(table_name = submissions)]
pub struct Submission {
	pub hw_uuid: String,
	pub submission_date: Date,
	/// Version string of the reporting client, e.g. `POPCORN v0.0.1`.
	pub popcorn_version: String,
}

impl Submission {
	/// Creates a submission dated today.
	pub fn new(hw_uuid: impl Into<String>, popcorn_version: impl Into<String>) -> Self {
		Self::with_date(hw_uuid, OffsetDateTime::now_utc().date(), popcorn_version)
	}

	pub fn with_date(
		hw_uuid: impl Into<String>,
		submission_date: Date,
		popcorn_version: impl Into<String>,
	) -> Self {
		Self {
			hw_uuid: hw_uuid.into(),
			submission_date,
			popcorn_version: popcorn_version.into(),
		}
	}

	/// Persisted packages of this submission, in insertion order.
	pub async fn packages(
		&self,
		session: &mut Session<'_>,
	) -> Result<Vec<SubmissionPackage>, SessionError> {
		let query = submission_packages::table
			.filter(submission_packages::hw_uuid.eq(self.hw_uuid.clone()))
			.filter(submission_packages::sub_date.eq(self.submission_date))
			.order(insertion_order());
		Ok(session.connection().load(query).await?)
	}
}

impl_entity!(Submission, Submission, submissions);

impl FlatRecord for Submission {
	fn serialize(&self) -> Map<String, Value> {
		flat([
			("hw_uuid", self.hw_uuid.clone().into()),
			("submission_date", self.submission_date.to_string().into()),
			("popcorn_version", self.popcorn_version.clone().into()),
		])
	}
}

/// A package reported within a [`Submission`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Queryable, Insertable)]
#[diesel(table_name = submission_packages)]
pub struct SubmissionPackage {
	pub hw_uuid: String,
	/// Date of the owning submission.
	pub sub_date: Date,
	pub pkg_name: String,
	pub pkg_version: String,
	pub pkg_release: String,
	pub pkg_epoch: String,
	/// References an [`Arch`](crate::system::Arch).
	pub pkg_arch: String,
	/// References a [`Vendor`](crate::vendor::Vendor).
	pub vendor_name: String,
	/// References a [`PackageStatus`].
	pub pkg_status: String,
}

impl SubmissionPackage {
	#[allow(clippy::too_many_arguments)]
	pub fn new(
		hw_uuid: impl Into<String>,
		sub_date: Date,
		pkg_name: impl Into<String>,
		pkg_version: impl Into<String>,
		pkg_release: impl Into<String>,
		pkg_epoch: impl Into<String>,
		pkg_arch: impl Into<String>,
		vendor_name: impl Into<String>,
		pkg_status: impl Into<String>,
	) -> Self {
		Self {
			hw_uuid: hw_uuid.into(),
			sub_date,
			pkg_name: pkg_name.into(),
			pkg_version: pkg_version.into(),
			pkg_release: pkg_release.into(),
			pkg_epoch: pkg_epoch.into(),
			pkg_arch: pkg_arch.into(),
			vendor_name: vendor_name.into(),
			pkg_status: pkg_status.into(),
		}
	}
}

impl_entity!(SubmissionPackage, SubmissionPackage, submission_packages);

impl FlatRecord for SubmissionPackage {
	fn serialize(&self) -> Map<String, Value> {
		flat([
			("hw_uuid", self.hw_uuid.clone().into()),
			("sub_date", self.sub_date.to_string().into()),
			("pkg_name", self.pkg_name.clone().into()),
			("pkg_version", self.pkg_version.clone().into()),
			("pkg_release", self.pkg_release.clone().into()),
			("pkg_epoch", self.pkg_epoch.clone().into()),
			("pkg_arch", self.pkg_arch.clone().into()),
			("vendor_name", self.vendor_name.clone().into()),
			("pkg_status", self.pkg_status.clone().into()),
		])
	}
}

#[cfg(test)]
mod test {
	use serde_json::json;
	use time::Month;

	use super::*;

	#[test]
	fn test_submission_dated_today() {
		let before = OffsetDateTime::now_utc().date();
		let sub = Submission::new("hw_uuid1", "POPCORN v0.0.1");
		let after = OffsetDateTime::now_utc().date();
		assert!(sub.submission_date == before || sub.submission_date == after);
	}

	#[test]
	fn test_serialize() {
		let date = Date::from_calendar_date(2012, Month::March, 1).unwrap();
		let sub = Submission::with_date("hw_uuid1", date, "POPCORN v0.0.1");
		assert_eq!(
			Value::Object(sub.serialize()),
			json!({
				"hw_uuid": "hw_uuid1",
				"submission_date": "2012-03-01",
				"popcorn_version": "POPCORN v0.0.1",
			})
		);

		let subp = SubmissionPackage::new(
			"hw_uuid1", date, "python", "2.7", "3", "", "i586", "repo1", "voted",
		);
		let flat = subp.serialize();
		assert_eq!(flat.len(), 9);
		assert_eq!(flat["sub_date"], "2012-03-01");
		assert_eq!(flat["pkg_epoch"], "");
		assert_eq!(PackageStatus::new("voted").serialize()["status"], "voted");
	}
}
