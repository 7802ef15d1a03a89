//! Architectures, distribution releases and the systems running them.

use diesel::{ExpressionMethods, Insertable, QueryDsl, Queryable};
use serde_json::{Map, Value};

use crate::{
	db::{
		insertion_order,
		schema::{arches, distros, submissions, systems},
	},
	entity::{FlatRecord, flat, impl_entity},
	session::{Session, SessionError},
	submission::Submission,
};

/// A CPU architecture, e.g. `i586`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Queryable, Insertable)]
#[diesel(table_name = arches)]
pub struct Arch {
	pub name: String,
}

impl Arch {
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into() }
	}
}

impl_entity!(Arch, Arch, arches);

impl FlatRecord for Arch {
	fn serialize(&self) -> Map<String, Value> {
		flat([("name", self.name.clone().into())])
	}
}

/// A distribution release.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Queryable, Insertable)]
#[diesel(table_name = distros)]
pub struct Distro {
	pub name: String,
	pub version: String,
}

impl Distro {
	pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			version: version.into(),
		}
	}

	/// Persisted systems running this release, in insertion order.
	pub async fn systems(&self, session: &mut Session<'_>) -> Result<Vec<System>, SessionError> {
		let query = systems::table
			.filter(systems::distro_name.eq(self.name.clone()))
			.filter(systems::distro_version.eq(self.version.clone()))
			.order(insertion_order());
		Ok(session.connection().load(query).await?)
	}
}

impl_entity!(Distro, Distro, distros);

impl FlatRecord for Distro {
	fn serialize(&self) -> Map<String, Value> {
		flat([
			("name", self.name.clone().into()),
			("version", self.version.clone().into()),
		])
	}
}

/// A machine reporting package usage.
///
/// Both the architecture and the distribution release must already be
/// persisted when the system is written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Queryable, Insertable)]
#[diesel(table_name = systems)]
pub struct System {
	pub hw_uuid: String,
	pub arch: String,
	pub distro_name: String,
	pub distro_version: String,
}

impl System {
	pub fn new(
		hw_uuid: impl Into<String>,
		arch: impl Into<String>,
		distro_name: impl Into<String>,
		distro_version: impl Into<String>,
	) -> Self {
		Self {
			hw_uuid: hw_uuid.into(),
			arch: arch.into(),
			distro_name: distro_name.into(),
			distro_version: distro_version.into(),
		}
	}

	/// Persisted submissions of this system, in insertion order.
	pub async fn submissions(
		&self,
		session: &mut Session<'_>,
	) -> Result<Vec<Submission>, SessionError> {
		let query = submissions::table
			.filter(submissions::hw_uuid.eq(self.hw_uuid.clone()))
			.order(insertion_order());
		Ok(session.connection().load(query).await?)
	}
}

impl_entity!(System, System, systems);

impl FlatRecord for System {
	fn serialize(&self) -> Map<String, Value> {
		flat([
			("hw_uuid", self.hw_uuid.clone().into()),
			("arch", self.arch.clone().into()),
			("distro_name", self.distro_name.clone().into()),
			("distro_version", self.distro_version.clone().into()),
		])
	}
}

#[cfg(test)]
mod test {
	use serde_json::json;

	use super::*;

	#[test]
	fn test_serialize() {
		let system = System::new("hw_uuid1", "i586", "Fedora", "16");
		assert_eq!(
			Value::Object(system.serialize()),
			json!({
				"hw_uuid": "hw_uuid1",
				"arch": "i586",
				"distro_name": "Fedora",
				"distro_version": "16",
			})
		);
		assert_eq!(
			Value::Object(Distro::new("Fedora", "16").serialize()),
			json!({ "name": "Fedora", "version": "16" })
		);
		assert_eq!(Arch::new("i586").serialize()["name"], "i586");
	}
}
