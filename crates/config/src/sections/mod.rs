// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use camino::Utf8Path;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

mod cache;
mod cleanup;
mod database;
mod http;

pub use self::{
    cache::CacheConfig, cleanup::CleanupConfig, database::DatabaseConfig, http::HttpConfig,
};
use crate::util::ConfigurationSection;

/// Application configuration root
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AppConfig {
    /// Configuration of the HTTP server
    #[serde(default)]
    pub http: HttpConfig,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Configuration of the cleanup engine
    #[serde(default)]
    pub cleanup: CleanupConfig,

    /// Configuration of the statistics cache
    #[serde(default)]
    pub cache: CacheConfig,
}

impl ConfigurationSection for AppConfig {
    fn validate(
        &self,
        figment: &figment::Figment,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        self.http.validate(figment)?;
        self.database.validate(figment)?;
        self.cleanup.validate(figment)?;
        self.cache.validate(figment)?;

        Ok(())
    }
}

impl AppConfig {
    /// Assemble the configuration sources: the YAML file, overridden
    /// by `QBC_`-prefixed environment variables (`QBC_DATABASE__URI`
    /// and the like)
    #[must_use]
    pub fn figment(path: &Utf8Path) -> Figment {
        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("QBC_").split("__"))
    }

    /// Load and validate the configuration from the given file
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration could not be loaded or is
    /// invalid
    pub fn load(path: &Utf8Path) -> Result<Self, anyhow::Error> {
        let figment = Self::figment(path);
        Self::extract(&figment).map_err(anyhow::Error::from_boxed)
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn load_full_config() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    http:
                      listen: 127.0.0.1:8888
                    database:
                      uri: postgresql://localhost/moodle
                    cleanup:
                      batch_size: 500
                ",
            )?;
            jail.set_env("QBC_CLEANUP__AUTO_CLEANUP", "true");

            let config = AppConfig::load(Utf8Path::new("config.yaml")).unwrap();

            assert_eq!(config.http.listen.port(), 8888);
            assert_eq!(&config.database.uri, "postgresql://localhost/moodle");
            assert_eq!(config.cleanup.batch_size, 500);
            assert!(config.cleanup.auto_cleanup);
            assert_eq!(config.cache.statistics_max_age, 3600);

            Ok(())
        });
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        Jail::expect_with(|_jail| {
            let config = AppConfig::load(Utf8Path::new("nonexistent.yaml")).unwrap();

            assert_eq!(config.cleanup.batch_size, 1_000);
            assert!(!config.cleanup.auto_cleanup);

            Ok(())
        });
    }
}
