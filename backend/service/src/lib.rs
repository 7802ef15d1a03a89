//! Popcorn backend services.

use std::sync::Arc;

use config::{BackendConfig, ConfigError};
use database::{DatabaseError, DatabaseService};
use popcorn_backend_model::session::SessionError;
use thiserror::Error;

pub mod config;
pub mod database;

/// Service container for Popcorn backends.
///
/// All services are wrapped with [`Arc`].
#[derive(Debug, Clone)]
pub struct BackendServices {
	pub config: Arc<BackendConfig>,
	pub database: Arc<DatabaseService>,
}

impl BackendServices {
	#[tracing::instrument(skip(config))]
	pub async fn new(config: BackendConfig) -> Result<Self> {
		let config = Arc::new(config);
		let database = Arc::new(DatabaseService::new(&config.database).await?);

		Ok(Self { config, database })
	}
}

/// Backend errors.
#[derive(Debug, Error)]
pub enum BackendError {
	#[error(transparent)]
	ConfigError(#[from] ConfigError),
	#[error(transparent)]
	DatabaseError(#[from] DatabaseError),
	#[error(transparent)]
	SessionError(#[from] SessionError),
}

/// A specialized [`Result`] for backend errors.
pub type Result<T, E = BackendError> = std::result::Result<T, E>;

impl From<diesel::result::Error> for BackendError {
	fn from(value: diesel::result::Error) -> Self {
		Self::DatabaseError(DatabaseError::QueryError(value))
	}
}

#[cfg(test)]
pub(crate) mod test {
	use database::DatabaseConfig;
	use popcorn_backend_model::{
		session::Session,
		submission::{PackageStatus, Submission, SubmissionPackage},
		system::{Arch, Distro, System},
		vendor::Vendor,
	};

	use crate::*;

	pub async fn test_env() -> BackendServices {
		let config = BackendConfig {
			database: DatabaseConfig {
				url: "sqlite://:memory:".to_string(),
				max_connections: 1,
			},
		};
		BackendServices::new(config).await.unwrap()
	}

	#[tokio::test]
	async fn test_init_services() {
		let env = test_env().await;
		let mut conn = env.database.get().await.unwrap();
		let mut session = Session::new(&mut conn);
		assert!(session.query::<Arch>().all().await.unwrap().is_empty());
	}

	/// Records a submission with its packages, the way a request handler would.
	async fn record(env: &BackendServices) -> Result<Submission> {
		let mut conn = env.database.get().await?;
		let mut session = Session::new(&mut conn);

		let sub = Submission::new("hw_uuid1", "POPCORN v0.0.1");
		session.add(Arch::new("i586"));
		session.add(Arch::new("noarch"));
		session.add(Distro::new("openSUSE", "12.1"));
		session.add(System::new("hw_uuid1", "i586", "openSUSE", "12.1"));
		session.add(PackageStatus::new("voted"));
		session.add(Vendor::new("openSUSE"));
		session.add(sub.clone());
		for name in ["bash", "zypper", "python"] {
			session.add(SubmissionPackage::new(
				"hw_uuid1",
				sub.submission_date,
				name,
				"1.0",
				"1",
				"",
				"i586",
				"openSUSE",
				"voted",
			));
		}
		if let Err(err) = session.commit().await {
			session.rollback().await?;
			return Err(err.into());
		}
		Ok(sub)
	}

	#[tokio::test]
	async fn test_record_submission() {
		let env = test_env().await;
		let sub = record(&env).await.unwrap();

		let mut conn = env.database.get().await.unwrap();
		let mut session = Session::new(&mut conn);
		let names: Vec<_> = sub
			.packages(&mut session)
			.await
			.unwrap()
			.into_iter()
			.map(|subp| subp.pkg_name)
			.collect();
		assert_eq!(names, ["bash", "zypper", "python"]);
		drop(session);
		drop(conn);

		// a second submission on the same day is rejected
		assert!(matches!(
			record(&env).await,
			Err(BackendError::SessionError(SessionError::Uniqueness { .. }))
		));
		let mut conn = env.database.get().await.unwrap();
		let mut session = Session::new(&mut conn);
		assert_eq!(session.query::<Submission>().all().await.unwrap(), vec![sub]);
	}
}
