// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ConfigurationSection;

fn default_statistics_max_age() -> u64 {
    3600
}

/// Configuration of the statistics cache
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheConfig {
    /// How long a cached statistics snapshot stays valid, in seconds
    #[serde(default = "default_statistics_max_age")]
    pub statistics_max_age: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            statistics_max_age: default_statistics_max_age(),
        }
    }
}

impl CacheConfig {
    /// The maximum snapshot age as a [`chrono::Duration`]
    #[must_use]
    pub fn statistics_max_age(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.statistics_max_age).unwrap_or(i64::MAX))
    }
}

impl ConfigurationSection for CacheConfig {
    const PATH: Option<&'static str> = Some("cache");
}

#[cfg(test)]
mod tests {
    use figment::{
        Figment, Jail,
        providers::{Format, Yaml},
    };

    use super::*;

    #[test]
    fn load_config() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    cache:
                      statistics_max_age: 600
                ",
            )?;

            let config = Figment::new()
                .merge(Yaml::file("config.yaml"))
                .extract_inner::<CacheConfig>("cache")?;

            assert_eq!(config.statistics_max_age, 600);
            assert_eq!(config.statistics_max_age(), chrono::Duration::minutes(10));

            Ok(())
        });
    }
}
