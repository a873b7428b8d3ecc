// Copyright 2025 Question Bank Cleaner contributors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ConfigurationSection;

/// Largest accepted batch size; the engine clamps to the same bound
const MAX_BATCH_SIZE: usize = 10_000;

fn default_batch_size() -> usize {
    1_000
}

fn default_throttle_ms() -> u64 {
    100
}

/// Configuration of the cleanup engine
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CleanupConfig {
    /// Batch size used when a request does not specify one
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Whether the scheduled task runs cleanup batches unattended
    #[serde(default)]
    pub auto_cleanup: bool,

    /// Pause between heavy aggregate queries, in milliseconds
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            auto_cleanup: false,
            throttle_ms: default_throttle_ms(),
        }
    }
}

impl CleanupConfig {
    /// The throttle delay as a [`std::time::Duration`]
    #[must_use]
    pub fn throttle(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.throttle_ms)
    }
}

impl ConfigurationSection for CleanupConfig {
    const PATH: Option<&'static str> = Some("cleanup");

    fn validate(
        &self,
        figment: &figment::Figment,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        let annotate = |mut error: figment::Error| {
            error.metadata = figment.find_metadata(Self::PATH.unwrap()).cloned();
            error.profile = Some(figment::Profile::Default);
            error.path = vec![Self::PATH.unwrap().to_owned(), "batch_size".to_owned()];
            Err(error.into())
        };

        if self.batch_size < 1 || self.batch_size > MAX_BATCH_SIZE {
            return annotate(figment::Error::from(format!(
                "batch_size must be between 1 and {MAX_BATCH_SIZE}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use figment::{
        Figment, Jail,
        providers::{Format, Yaml},
    };

    use super::*;
    use crate::ConfigurationSectionExt;

    #[test]
    fn load_config() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    cleanup:
                      batch_size: 250
                      auto_cleanup: true
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            let config = CleanupConfig::extract_or_default(&figment).unwrap();

            assert_eq!(config.batch_size, 250);
            assert!(config.auto_cleanup);
            assert_eq!(config.throttle_ms, 100);

            Ok(())
        });
    }

    #[test]
    fn rejects_out_of_range_batch_size() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    cleanup:
                      batch_size: 0
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            assert!(CleanupConfig::extract_or_default(&figment).is_err());

            Ok(())
        });
    }
}
