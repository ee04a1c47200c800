//! Guarded resource configuration
//!
//! Loaded from TOML, optionally overridden from `TOKENGATE_*` environment
//! variables, then validated before a resource is built from it.
//!
//! ```toml
//! default_policy = "traverse:perm(Builders)"
//! use_mode = "checking"
//! granted_keys_lock = "attrread:perm(Admins);attredit:perm(Admins)"
//!
//! [messages]
//! err_traverse = "It's locked."
//! ```

use crate::attributes::FieldLock;
use crate::errors::{GateError, GateResult};
use crate::policy::{AccessPolicy, AccessType};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "TOKENGATE_";

const DEFAULT_ERR_TRAVERSE: &str =
    "It's locked, but it looks like you can use the door with an identity token.";

/// Feedback texts a guarded resource sends to actors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    /// Sent when traversal is refused by the live policy
    pub err_traverse: String,
    /// Sent when an identity token is presented
    pub token_presented: String,
    /// Sent when Granting mode records a new digest
    pub key_recorded: String,
    /// Final feedback on success
    pub access_granted: String,
    /// Final feedback on refusal
    pub access_denied: String,
    /// Final feedback for an unset or unknown use mode
    pub misconfigured: String,
    /// Final feedback for anything that is not an identity token
    pub nothing_happens: String,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            err_traverse: DEFAULT_ERR_TRAVERSE.to_string(),
            token_presented: "You place your token against the door.".to_string(),
            key_recorded: "This token's key has been added to the list of granted keys."
                .to_string(),
            access_granted: "Access Granted!".to_string(),
            access_denied: "Access Denied!".to_string(),
            misconfigured: "The token reader releases a puff of bluish-gray smoke.".to_string(),
            nothing_happens: "Nothing happens.".to_string(),
        }
    }
}

/// Configuration for a guarded resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Canonical policy the resource reverts to after every use
    pub default_policy: String,
    /// Initial use mode; unrecognized values are kept and reported as misconfiguration
    pub use_mode: String,
    /// Lock protecting the granted-keys attribute
    pub granted_keys_lock: String,
    /// Feedback texts
    pub messages: MessageConfig,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            default_policy: "traverse:perm(Builders)".to_string(),
            use_mode: "checking".to_string(),
            granted_keys_lock: FieldLock::admins_only().to_string(),
            messages: MessageConfig::default(),
        }
    }
}

impl GateConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> GateResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> GateResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GateError::from(e).with_context(&format!("reading {}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply overrides from the process environment
    pub fn merge_with_env(&mut self) -> GateResult<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply overrides from `(name, value)` pairs carrying [`ENV_PREFIX`]
    ///
    /// Message texts are addressed by field name alone, e.g.
    /// `TOKENGATE_ACCESS_DENIED`.
    pub fn merge_with_vars<I>(&mut self, vars: I) -> GateResult<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(field) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match field.to_ascii_lowercase().as_str() {
                "default_policy" => self.default_policy = value,
                "use_mode" => self.use_mode = value,
                "granted_keys_lock" => self.granted_keys_lock = value,
                "err_traverse" => self.messages.err_traverse = value,
                "token_presented" => self.messages.token_presented = value,
                "key_recorded" => self.messages.key_recorded = value,
                "access_granted" => self.messages.access_granted = value,
                "access_denied" => self.messages.access_denied = value,
                "misconfigured" => self.messages.misconfigured = value,
                "nothing_happens" => self.messages.nothing_happens = value,
                other => {
                    tracing::warn!(key = %key, field = other, "Ignoring unknown config override");
                }
            }
        }
        Ok(())
    }

    /// Check that the lock strings parse and traverse has a base clause
    pub fn validate(&self) -> GateResult<()> {
        self.default_policy()?;
        self.granted_keys_lock()?;
        Ok(())
    }

    /// Parsed default policy
    pub fn default_policy(&self) -> GateResult<AccessPolicy> {
        AccessPolicy::parse_with_base(&self.default_policy, &AccessType::traverse())
    }

    /// Parsed granted-keys lock
    pub fn granted_keys_lock(&self) -> GateResult<FieldLock> {
        self.granted_keys_lock.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::PermissionLevel;
    use crate::policy::Predicate;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let config = GateConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.granted_keys_lock().unwrap(), FieldLock::admins_only());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = GateConfig::from_toml_str(
            r#"
            use_mode = "granting"

            [messages]
            access_denied = "Red light."
            "#,
        )
        .unwrap();
        assert_eq!(config.use_mode, "granting");
        assert_eq!(config.messages.access_denied, "Red light.");
        assert_eq!(config.messages.access_granted, "Access Granted!");
        assert_eq!(config.default_policy, "traverse:perm(Builders)");
    }

    #[test]
    fn test_validate_rejects_missing_traverse_base() {
        let config = GateConfig {
            default_policy: "get:perm(Builders)".to_string(),
            ..GateConfig::default()
        };
        assert!(matches!(config.validate(), Err(GateError::Invalid { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = GateConfig::default();
        config
            .merge_with_vars(vec![
                ("TOKENGATE_USE_MODE".to_string(), "denying".to_string()),
                ("TOKENGATE_DEFAULT_POLICY".to_string(), "traverse:perm(Admins)".to_string()),
                ("UNRELATED".to_string(), "x".to_string()),
            ])
            .unwrap();
        assert_eq!(config.use_mode, "denying");
        let policy = config.default_policy().unwrap();
        assert_eq!(
            policy.get(&AccessType::traverse()).unwrap().base_predicate(),
            Some(Predicate::Perm(PermissionLevel::Admins))
        );
    }

    #[test]
    fn test_env_overrides_every_message() {
        let mut config = GateConfig::default();
        let fields = [
            "ERR_TRAVERSE",
            "TOKEN_PRESENTED",
            "KEY_RECORDED",
            "ACCESS_GRANTED",
            "ACCESS_DENIED",
            "MISCONFIGURED",
            "NOTHING_HAPPENS",
        ];
        config
            .merge_with_vars(
                fields
                    .iter()
                    .map(|field| (format!("{ENV_PREFIX}{field}"), field.to_lowercase())),
            )
            .unwrap();

        let messages = &config.messages;
        assert_eq!(messages.err_traverse, "err_traverse");
        assert_eq!(messages.token_presented, "token_presented");
        assert_eq!(messages.key_recorded, "key_recorded");
        assert_eq!(messages.access_granted, "access_granted");
        assert_eq!(messages.access_denied, "access_denied");
        assert_eq!(messages.misconfigured, "misconfigured");
        assert_eq!(messages.nothing_happens, "nothing_happens");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_policy = \"traverse:perm(Helpers)\"").unwrap();
        let config = GateConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.default_policy, "traverse:perm(Helpers)");

        let missing = GateConfig::load_from_file(Path::new("/nonexistent/tokengate.toml"));
        assert!(matches!(missing, Err(GateError::NotFound { .. })));
    }
}
