//! Table declarations.
//!
//! The insertion-order `rowid` column is deliberately left out of every
//! table, so default selections match the record structs. Use
//! [`insertion_order`](super::insertion_order) to order by it.

diesel::table! {
	/// CPU architectures, e.g. `i586`.
	arches (name) {
		name -> Varchar,
	}
}

diesel::table! {
	/// Distribution releases.
	distros (name, version) {
		name -> Varchar,
		version -> Varchar,
	}
}

diesel::table! {
	/// Physical or virtual machines reporting to us.
	systems (hw_uuid) {
		/// Opaque hardware identifier sent by the client.
		hw_uuid -> Varchar,
		/// References `arches.name`.
		arch -> Varchar,
		/// References `distros.name`, together with `distro_version`.
		distro_name -> Varchar,
		distro_version -> Varchar,
	}
}

diesel::table! {
	vendors (vendor_name) {
		/// Derived from `vendor_url`, see [`Vendor::new`](crate::vendor::Vendor::new).
		vendor_name -> Varchar,
		vendor_url -> Varchar,
	}
}

diesel::table! {
	/// Allowed states of a reported package.
	package_statuses (status) {
		status -> Varchar,
	}
}

diesel::table! {
	/// At most one submission per system and day.
	submissions (hw_uuid, submission_date) {
		hw_uuid -> Varchar,
		submission_date -> Date,
		/// Version string of the reporting client.
		popcorn_version -> Varchar,
	}
}

diesel::table! {
	/// Packages reported within a submission.
	///
	/// `(hw_uuid, sub_date)` references the owning submission.
	submission_packages (hw_uuid, sub_date, pkg_name, pkg_version, pkg_release, pkg_epoch, pkg_arch) {
		hw_uuid -> Varchar,
		sub_date -> Date,
		pkg_name -> Varchar,
		pkg_version -> Varchar,
		pkg_release -> Varchar,
		/// Empty when the package has no epoch.
		pkg_epoch -> Varchar,
		pkg_arch -> Varchar,
		vendor_name -> Varchar,
		pkg_status -> Varchar,
	}
}

diesel::joinable!(systems -> arches (arch));
diesel::joinable!(submissions -> systems (hw_uuid));
diesel::joinable!(submission_packages -> arches (pkg_arch));
diesel::joinable!(submission_packages -> vendors (vendor_name));
diesel::joinable!(submission_packages -> package_statuses (pkg_status));

diesel::allow_tables_to_appear_in_same_query!(
	arches,
	distros,
	systems,
	vendors,
	package_statuses,
	submissions,
	submission_packages,
);
