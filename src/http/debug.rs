//! Settings for `--verbose` HTTP output and the masking applied to anything
//! logged about an exchange.

use reqwest::Url;
use reqwest::header::HeaderValue;
use serde_json::Value;

const MASK: &str = "***REDACTED***";

/// Query parameters, headers and JSON fields whose values never reach a log.
const SECRET_NAMES: [&str; 11] = [
    "key",
    "api_key",
    "apikey",
    "token",
    "access_token",
    "authorization",
    "secret",
    "password",
    "x-api-key",
    "x-goog-api-key",
    "openai-organization",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpDebugConfig {
    /// Echo every exchange to stderr.
    pub enabled: bool,
    pub redactor: Redactor,
    pub max_body_chars: usize,
}

impl HttpDebugConfig {
    pub fn from_verbose(verbose: bool) -> Self {
        Self {
            enabled: verbose,
            redactor: Redactor::MASKING,
            max_body_chars: 4_000,
        }
    }

    #[cfg(test)]
    pub fn disabled() -> Self {
        Self::from_verbose(false)
    }
}

/// Replaces secret values with a fixed marker, or passes text through when
/// masking is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redactor {
    masking: bool,
}

impl Redactor {
    pub const MASKING: Self = Self { masking: true };

    #[cfg(test)]
    pub const PASS_THROUGH: Self = Self { masking: false };

    pub fn url(self, url: &Url) -> String {
        if !self.masking || url.query().is_none() {
            return url.to_string();
        }

        let pairs = url
            .query_pairs()
            .map(|(name, value)| {
                let value = if is_secret(&name) {
                    MASK.to_string()
                } else {
                    value.into_owned()
                };
                (name.into_owned(), value)
            })
            .collect::<Vec<_>>();

        let mut masked = url.clone();
        masked.set_query(None);
        if !pairs.is_empty() {
            masked.query_pairs_mut().extend_pairs(pairs);
        }
        masked.to_string()
    }

    pub fn header(self, name: &str, value: &HeaderValue) -> String {
        if self.masking && is_secret(name) {
            return MASK.to_string();
        }
        value.to_str().unwrap_or("<non-utf8>").to_string()
    }

    /// Masks secret fields at any depth of a JSON body. Other bodies pass
    /// through unchanged.
    pub fn body(self, raw: &str) -> String {
        if !self.masking {
            return raw.to_string();
        }

        let Ok(mut json) = serde_json::from_str::<Value>(raw) else {
            return raw.to_string();
        };
        mask_secret_fields(&mut json);
        serde_json::to_string(&json).unwrap_or_else(|_| raw.to_string())
    }
}

/// Keeps the first `max_chars` characters and notes how many were dropped.
pub fn clip(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => {
            let dropped = text[cut..].chars().count();
            format!("{}... <truncated {dropped} chars>", &text[..cut])
        }
    }
}

fn mask_secret_fields(value: &mut Value) {
    match value {
        Value::Object(fields) => {
            for (name, field) in fields.iter_mut() {
                if is_secret(name) {
                    *field = Value::String(MASK.to_string());
                } else {
                    mask_secret_fields(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(mask_secret_fields),
        _ => {}
    }
}

fn is_secret(name: &str) -> bool {
    SECRET_NAMES
        .iter()
        .any(|secret| secret.eq_ignore_ascii_case(name))
}
