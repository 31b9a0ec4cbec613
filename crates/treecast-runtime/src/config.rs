#![forbid(unsafe_code)]

//! Provider and logging configuration.
//!
//! [`ProviderConfig`] can be built in code (builder methods), from
//! environment variables, or (with the `policy-config` feature) from a TOML
//! document. Environment lookup is injectable so tests never touch the
//! process environment.
//!
//! | Variable                       | Values                              |
//! |--------------------------------|-------------------------------------|
//! | `TREECAST_PANIC_POLICY`        | `propagate`, `isolate`, `resume`    |
//! | `TREECAST_NOTIFY_ON_MOUNT`     | boolean flag                        |
//! | `TREECAST_TRACE_NOTIFICATIONS` | boolean flag                        |
//! | `TREECAST_LOG`                 | `tracing` env-filter directive      |
//! | `TREECAST_LOG_JSON`            | boolean flag                        |

use treecast_core::PanicPolicy;

use crate::error::ConfigError;

const ENV_PANIC_POLICY: &str = "TREECAST_PANIC_POLICY";
const ENV_NOTIFY_ON_MOUNT: &str = "TREECAST_NOTIFY_ON_MOUNT";
const ENV_TRACE_NOTIFICATIONS: &str = "TREECAST_TRACE_NOTIFICATIONS";
const ENV_LOG: &str = "TREECAST_LOG";
const ENV_LOG_JSON: &str = "TREECAST_LOG_JSON";

#[inline]
fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_policy(key: &str, value: &str) -> Result<PanicPolicy, ConfigError> {
    PanicPolicy::parse(value).ok_or_else(|| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Configuration for a [`Provider`](crate::Provider).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Listener panic policy for the root and every node derived from it.
    pub panic_policy: PanicPolicy,
    /// Broadcast once on mount if the source state changed since the
    /// provider was constructed. Default: true.
    pub notify_on_mount: bool,
    /// Wrap each root broadcast in a `debug` span. Default: false.
    pub trace_notifications: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            panic_policy: PanicPolicy::default(),
            notify_on_mount: true,
            trace_notifications: false,
        }
    }
}

impl ProviderConfig {
    /// Set the listener panic policy.
    #[must_use]
    pub fn with_panic_policy(mut self, policy: PanicPolicy) -> Self {
        self.panic_policy = policy;
        self
    }

    /// Set whether mounting re-broadcasts a changed state.
    #[must_use]
    pub fn with_notify_on_mount(mut self, enabled: bool) -> Self {
        self.notify_on_mount = enabled;
        self
    }

    /// Set whether root broadcasts are wrapped in tracing spans.
    #[must_use]
    pub fn with_trace_notifications(mut self, enabled: bool) -> Self {
        self.trace_notifications = enabled;
        self
    }

    /// Defaults overridden by `TREECAST_*` variables from `get_env`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for an unparseable value.
    pub fn from_env_with<F>(get_env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = get_env(ENV_PANIC_POLICY) {
            config.panic_policy = parse_policy(ENV_PANIC_POLICY, &value)?;
        }
        if let Some(value) = get_env(ENV_NOTIFY_ON_MOUNT) {
            config.notify_on_mount = parse_flag(ENV_NOTIFY_ON_MOUNT, &value)?;
        }
        if let Some(value) = get_env(ENV_TRACE_NOTIFICATIONS) {
            config.trace_notifications = parse_flag(ENV_TRACE_NOTIFICATIONS, &value)?;
        }
        Ok(config)
    }

    /// [`from_env_with`](Self::from_env_with) over the process environment.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Parse a TOML document.
    ///
    /// ```toml
    /// panic_policy = "isolate"
    /// notify_on_mount = false
    /// trace_notifications = true
    /// ```
    ///
    /// Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed TOML, [`ConfigError::InvalidValue`]
    /// for an unknown policy name.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        #[derive(serde::Deserialize)]
        #[serde(deny_unknown_fields)]
        struct Raw {
            panic_policy: Option<String>,
            notify_on_mount: Option<bool>,
            trace_notifications: Option<bool>,
        }

        let raw: Raw = toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = Self::default();
        if let Some(policy) = raw.panic_policy {
            config.panic_policy = parse_policy("panic_policy", &policy)?;
        }
        if let Some(enabled) = raw.notify_on_mount {
            config.notify_on_mount = enabled;
        }
        if let Some(enabled) = raw.trace_notifications {
            config.trace_notifications = enabled;
        }
        Ok(config)
    }
}

/// Configuration for `logging::init_tracing`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `tracing` env-filter directive. Default: `"warn"`.
    pub filter: String,
    /// Emit JSON lines instead of human-readable output. Default: false.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Set the filter directive.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Set JSON output.
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Defaults overridden by `TREECAST_LOG` / `TREECAST_LOG_JSON`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for an unparseable JSON flag.
    pub fn from_env_with<F>(get_env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(filter) = get_env(ENV_LOG) {
            config.filter = filter;
        }
        if let Some(value) = get_env(ENV_LOG_JSON) {
            config.json = parse_flag(ENV_LOG_JSON, &value)?;
        }
        Ok(config)
    }
}
