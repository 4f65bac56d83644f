//! Service credential discovery
//!
//! Backing services are located the way the guestbook has always been
//! deployed: bound-service credentials in `VCAP_SERVICES` when running on the
//! platform, an explicit environment override next, and a local properties
//! file last. An absent credential is not an error; callers fall back to
//! degraded mode.

use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;
use url::Url;

use crate::error::ConfigError;

/// Env var holding the platform's bound-service credentials.
pub const VCAP_SERVICES_ENV: &str = "VCAP_SERVICES";

/// Env var naming the directory searched for `*.properties` files.
pub const PROPERTIES_DIR_ENV: &str = "GUESTBOOK_PROPERTIES_DIR";

/// How to find one backing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceLookup {
    /// Substring matched against bound service labels and names.
    pub service: &'static str,
    /// Env var consulted when `VCAP_SERVICES` is not set.
    pub env_override: Option<&'static str>,
    /// Properties file consulted last.
    pub properties_file: &'static str,
    /// Key read from the properties file.
    pub properties_key: &'static str,
}

impl ServiceLookup {
    /// Redis presence cache.
    pub const REDIS: ServiceLookup = ServiceLookup {
        service: "redis",
        env_override: Some("REDISURI"),
        properties_file: "redis.properties",
        properties_key: "redis_url",
    };

    /// PostgreSQL visitor store.
    pub const POSTGRES: ServiceLookup = ServiceLookup {
        service: "postgres",
        env_override: Some("DATABASE_URL"),
        properties_file: "postgres.properties",
        properties_key: "postgres_url",
    };
}

/// Where a credential was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    BoundService { label: String },
    Environment { var: String },
    PropertiesFile { path: PathBuf },
}

/// A discovered, syntactically valid service URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUri {
    pub url: Url,
    pub source: CredentialSource,
}

impl ServiceUri {
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

/// Snapshot of the environment inputs used by discovery.
///
/// Discovery reads from this rather than from the process environment so
/// it can be exercised without mutating global state.
#[derive(Debug, Clone, Default)]
pub struct CredentialEnv {
    pub vcap_services: Option<String>,
    pub overrides: Vec<(String, String)>,
    pub properties_dir: PathBuf,
}

impl CredentialEnv {
    /// Capture the relevant variables from the process environment.
    pub fn from_env() -> Self {
        let overrides = [ServiceLookup::REDIS, ServiceLookup::POSTGRES]
            .iter()
            .filter_map(|lookup| lookup.env_override)
            .filter_map(|var| std::env::var(var).ok().map(|value| (var.to_string(), value)))
            .collect();

        Self {
            vcap_services: std::env::var(VCAP_SERVICES_ENV).ok(),
            overrides,
            properties_dir: std::env::var(PROPERTIES_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    fn override_value(&self, var: &str) -> Option<&str> {
        self.overrides
            .iter()
            .find(|(name, _)| name == var)
            .map(|(_, value)| value.as_str())
    }

    /// Locate the URI for one service.
    ///
    /// Precedence: when `VCAP_SERVICES` is present it is authoritative and no
    /// other source is consulted; otherwise the env override, then the
    /// properties file. Malformed values are logged and treated as absent.
    pub fn discover(&self, lookup: &ServiceLookup) -> Option<ServiceUri> {
        let found = match self.find_raw(lookup) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(service = lookup.service, error = %e, "Ignoring service credentials");
                return None;
            }
        };

        let (raw, source) = found?;
        match Url::parse(&raw) {
            Ok(url) => Some(ServiceUri { url, source }),
            Err(e) => {
                tracing::warn!(
                    service = lookup.service,
                    source = ?source,
                    error = %e,
                    "Service URI is not a valid URL"
                );
                None
            }
        }
    }

    fn find_raw(
        &self,
        lookup: &ServiceLookup,
    ) -> Result<Option<(String, CredentialSource)>, ConfigError> {
        if let Some(vcap) = &self.vcap_services {
            let bound = bound_service_uri(vcap, lookup.service)?;
            if bound.is_none() {
                tracing::info!(service = lookup.service, "No {} service bound to this application", lookup.service);
            }
            return Ok(bound.map(|(label, uri)| (uri, CredentialSource::BoundService { label })));
        }

        if let Some(var) = lookup.env_override {
            if let Some(value) = self.override_value(var) {
                tracing::info!(service = lookup.service, var, "Using credentials from environment");
                let cleaned = value.replace(['\n', '\r'], "");
                return Ok(Some((
                    cleaned,
                    CredentialSource::Environment {
                        var: var.to_string(),
                    },
                )));
            }
        }

        let path = self.properties_dir.join(lookup.properties_file);
        match properties_value(&path, lookup.properties_key)? {
            Some(value) => Ok(Some((value, CredentialSource::PropertiesFile { path }))),
            None => {
                tracing::info!(
                    service = lookup.service,
                    path = %path.display(),
                    key = lookup.properties_key,
                    "To use {}, set {} in {}",
                    lookup.service,
                    lookup.properties_key,
                    lookup.properties_file
                );
                Ok(None)
            }
        }
    }
}

/// Find the first bound service whose label or name mentions `service`.
///
/// Returns the service label and its `credentials.uri`.
pub fn bound_service_uri(
    vcap_services: &str,
    service: &str,
) -> Result<Option<(String, String)>, ConfigError> {
    let parsed: JsonValue =
        serde_json::from_str(vcap_services).map_err(|e| ConfigError::MalformedCredentials {
            source_name: VCAP_SERVICES_ENV.to_string(),
            reason: e.to_string(),
        })?;

    let Some(labels) = parsed.as_object() else {
        return Err(ConfigError::MalformedCredentials {
            source_name: VCAP_SERVICES_ENV.to_string(),
            reason: "expected a JSON object keyed by service label".to_string(),
        });
    };

    let needle = service.to_lowercase();
    for (label, instances) in labels {
        let Some(instances) = instances.as_array() else {
            continue;
        };
        for instance in instances {
            let name = instance.get("name").and_then(JsonValue::as_str).unwrap_or("");
            let matches = label.to_lowercase().contains(&needle)
                || name.to_lowercase().contains(&needle);
            if !matches {
                continue;
            }
            let uri = instance
                .get("credentials")
                .and_then(|c| c.get("uri"))
                .and_then(JsonValue::as_str);
            if let Some(uri) = uri {
                return Ok(Some((label.clone(), uri.to_string())));
            }
        }
    }

    Ok(None)
}

/// Read one key from a `key=value` properties file.
///
/// A missing file or an empty value yields `None`.
pub fn properties_value(path: &Path, key: &str) -> Result<Option<String>, ConfigError> {
    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(dotenvy::Error::Io(_)) => return Ok(None),
        Err(e) => {
            return Err(ConfigError::MalformedCredentials {
                source_name: path.display().to_string(),
                reason: e.to_string(),
            })
        }
    };

    for entry in entries {
        let (name, value) = entry.map_err(|e| ConfigError::MalformedCredentials {
            source_name: path.display().to_string(),
            reason: e.to_string(),
        })?;
        if name == key {
            let value = value.trim().to_string();
            return Ok((!value.is_empty()).then_some(value));
        }
    }

    Ok(None)
}
