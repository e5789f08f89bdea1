//! Create-request schema and validation.

use serde::Deserialize;

use crate::config::ExchangeConfig;
use oncelink_common::{Error, InvalidParam, Result, SecretText, Ttl, NAMED_DURATIONS};

const PASSWORD_REQUIRED: &str = "The password is required and should not be null or empty.";
const PASSWORD_TOO_LONG: &str = "The password exceeds the maximum supported length.";
const TTL_NOT_INTEGER: &str = "The TTL must be an integer number of seconds.";

/// TTL as supplied by a caller: a JSON number or a string.
///
/// Any other JSON value lands in `Other` so it is reported against `ttl`
/// rather than failing the whole body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TtlInput {
    Seconds(i64),
    Text(String),
    Other(serde_json::Value),
}

/// Which TTL spellings an endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlPolicy {
    /// Integer seconds only.
    Seconds,
    /// Integer seconds or one of the legacy named durations.
    SecondsOrNamed,
}

/// Body of a create request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSecretRequest {
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub ttl: Option<TtlInput>,
}

/// A create request that passed validation.
#[derive(Debug)]
pub struct ValidatedSecret {
    pub password: SecretText,
    pub ttl: Ttl,
}

impl CreateSecretRequest {
    /// Validate every field, reporting all offending fields at once.
    ///
    /// # Errors
    /// - `Validation` listing each invalid field
    pub fn validate(self, config: &ExchangeConfig, policy: TtlPolicy) -> Result<ValidatedSecret> {
        let mut invalid = Vec::new();

        let password = match self.password {
            Some(password) if password.len() > config.max_secret_bytes => {
                invalid.push(InvalidParam::new("password").with_reason(PASSWORD_TOO_LONG));
                None
            }
            Some(password) if !password.is_empty() => Some(SecretText::new(password)),
            _ => {
                invalid.push(InvalidParam::new("password").with_reason(PASSWORD_REQUIRED));
                None
            }
        };

        let ttl = match resolve_ttl(self.ttl, config, policy) {
            Ok(ttl) => Some(ttl),
            Err(params) => {
                invalid.extend(params);
                None
            }
        };

        match (password, ttl) {
            (Some(password), Some(ttl)) if invalid.is_empty() => {
                Ok(ValidatedSecret { password, ttl })
            }
            _ => Err(Error::Validation(invalid)),
        }
    }
}

fn resolve_ttl(
    input: Option<TtlInput>,
    config: &ExchangeConfig,
    policy: TtlPolicy,
) -> std::result::Result<Ttl, Vec<InvalidParam>> {
    let secs = match input {
        None => return config.default_ttl().map_err(into_params),
        Some(TtlInput::Seconds(secs)) => secs,
        Some(TtlInput::Text(text)) => {
            let trimmed = text.trim();
            if let Ok(secs) = trimmed.parse::<i64>() {
                secs
            } else if policy == TtlPolicy::SecondsOrNamed {
                return named_ttl(trimmed, config);
            } else {
                return Err(vec![InvalidParam::new("ttl").with_reason(TTL_NOT_INTEGER)]);
            }
        }
        Some(TtlInput::Other(_)) => {
            return Err(vec![InvalidParam::new("ttl").with_reason(TTL_NOT_INTEGER)]);
        }
    };

    let secs = u64::try_from(secs).map_err(|_| {
        vec![InvalidParam::new("ttl").with_reason("The TTL must be a positive number of seconds.")]
    })?;
    Ttl::new(secs, config.max_ttl_secs).map_err(into_params)
}

fn named_ttl(name: &str, config: &ExchangeConfig) -> std::result::Result<Ttl, Vec<InvalidParam>> {
    let ttl = Ttl::from_name(name).ok_or_else(|| {
        let names: Vec<&str> = NAMED_DURATIONS.iter().map(|(label, _)| *label).collect();
        vec![InvalidParam::new("ttl").with_reason(format!(
            "The TTL must be a number of seconds or one of: {}.",
            names.join(", ")
        ))]
    })?;

    // A deployment may cap TTLs below the longest named duration.
    Ttl::new(ttl.as_secs(), config.max_ttl_secs).map_err(into_params)
}

fn into_params(err: Error) -> Vec<InvalidParam> {
    match err {
        Error::Validation(params) => params,
        other => vec![InvalidParam::new("ttl").with_reason(other.to_string())],
    }
}
