use diesel::{Insertable, Queryable};
use serde_json::{Map, Value};

use crate::{
	db::schema::vendors,
	entity::{FlatRecord, flat, impl_entity},
};

/// Maximum length of a [`Vendor::vendor_name`], in characters.
pub const VENDOR_NAME_LEN: usize = 20;

/// A software vendor, identified by the repository URL packages came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Queryable, Insertable)]
#[diesel(table_name = vendors)]
pub struct Vendor {
	pub vendor_name: String,
	/// Unique across all vendors.
	pub vendor_url: String,
}

impl Vendor {
	/// Creates a vendor named after the first [`VENDOR_NAME_LEN`] characters of its URL.
	///
	/// URLs sharing that prefix produce the same name, and writing the
	/// second one fails on the primary key rather than replacing the first.
	pub fn new(vendor_url: impl Into<String>) -> Self {
		let vendor_url = vendor_url.into();
		// FIXME: derive the name from the vendor information in the RPM header
		let vendor_name = vendor_url.chars().take(VENDOR_NAME_LEN).collect();
		Self {
			vendor_name,
			vendor_url,
		}
	}
}

impl_entity!(Vendor, Vendor, vendors);

impl FlatRecord for Vendor {
	fn serialize(&self) -> Map<String, Value> {
		flat([
			("vendor_name", self.vendor_name.clone().into()),
			("vendor_url", self.vendor_url.clone().into()),
		])
	}
}

#[cfg(test)]
mod test {
	use serde_json::json;

	use super::*;

	#[test]
	fn test_short_url_is_the_name() {
		let vendor = Vendor::new("repo1");
		assert_eq!(vendor.vendor_name, "repo1");
		assert_eq!(vendor.vendor_url, "repo1");
	}

	#[test]
	fn test_name_truncation() {
		let vendor = Vendor::new("http://download.opensuse.org/update/12.1/");
		assert_eq!(vendor.vendor_name, "http://download.open");
		assert_eq!(vendor.vendor_name.chars().count(), VENDOR_NAME_LEN);

		// counted in characters, not bytes
		let vendor = Vendor::new("https://ftp.ünïcödé.example.org/");
		assert_eq!(vendor.vendor_name, "https://ftp.ünïcödé.");
	}

	#[test]
	fn test_shared_prefix_collides() {
		let first = Vendor::new("http://download.opensuse.org/update/12.1/");
		let second = Vendor::new("http://download.opensuse.org/distribution/12.1/");
		assert_eq!(first.vendor_name, second.vendor_name);
		assert_ne!(first.vendor_url, second.vendor_url);
	}

	#[test]
	fn test_serialize() {
		assert_eq!(
			Value::Object(Vendor::new("repo1").serialize()),
			json!({ "vendor_name": "repo1", "vendor_url": "repo1" })
		);
	}
}
