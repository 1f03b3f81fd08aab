// ── LocalAPI credential resolution ──
//
// The LocalAPI password is the last five characters of the supervisor
// serial. It can come from four places; the first non-blank one wins.

use secrecy::{ExposeSecret, SecretString};
use strum::Display;

/// Environment variable consulted for the serial suffix.
pub const ENV_SERIAL_SUFFIX: &str = "SUNPOWER_SERIAL_SUFFIX";

/// Where a resolved credential came from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum CredentialSource {
    Explicit,
    AutoFetched,
    Environment,
    /// Last-resort suffix. Stands in for a suffix compiled into the client:
    /// it comes from the profile's `fallback_serial_suffix` instead, so no
    /// device-specific value ships in the binary.
    Fallback,
}

/// Candidate credentials, one per source.
#[derive(Debug, Default)]
pub struct CredentialSources<'a> {
    pub explicit: Option<&'a SecretString>,
    /// Suffix of the serial reported by the supervisor info endpoint.
    pub fetched: Option<&'a SecretString>,
    pub environment: Option<&'a SecretString>,
    pub fallback: Option<&'a SecretString>,
}

impl CredentialSources<'_> {
    /// First non-blank candidate, trimmed, with its source.
    pub fn resolve(&self) -> Option<(SecretString, CredentialSource)> {
        [
            (self.explicit, CredentialSource::Explicit),
            (self.fetched, CredentialSource::AutoFetched),
            (self.environment, CredentialSource::Environment),
            (self.fallback, CredentialSource::Fallback),
        ]
        .into_iter()
        .find_map(|(candidate, source)| {
            let value = candidate?.expose_secret().trim();
            (!value.is_empty()).then(|| (SecretString::from(value.to_owned()), source))
        })
    }
}

/// Read `SUNPOWER_SERIAL_SUFFIX`, ignoring blank values.
pub fn env_credential() -> Option<SecretString> {
    std::env::var(ENV_SERIAL_SUFFIX)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .map(SecretString::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    fn resolved(sources: &CredentialSources<'_>) -> Option<(String, CredentialSource)> {
        sources
            .resolve()
            .map(|(s, src)| (s.expose_secret().to_owned(), src))
    }

    #[test]
    fn first_non_blank_source_wins() {
        let (explicit, fetched, env, fallback) =
            (secret("EXPL1"), secret("FETCH"), secret("ENVVR"), secret("FALLB"));

        let all = CredentialSources {
            explicit: Some(&explicit),
            fetched: Some(&fetched),
            environment: Some(&env),
            fallback: Some(&fallback),
        };
        assert_eq!(
            resolved(&all),
            Some(("EXPL1".into(), CredentialSource::Explicit))
        );

        let no_explicit = CredentialSources {
            explicit: None,
            ..all
        };
        assert_eq!(
            resolved(&no_explicit),
            Some(("FETCH".into(), CredentialSource::AutoFetched))
        );

        let env_only = CredentialSources {
            environment: Some(&env),
            fallback: Some(&fallback),
            ..CredentialSources::default()
        };
        assert_eq!(
            resolved(&env_only),
            Some(("ENVVR".into(), CredentialSource::Environment))
        );

        let fallback_only = CredentialSources {
            fallback: Some(&fallback),
            ..CredentialSources::default()
        };
        assert_eq!(
            resolved(&fallback_only),
            Some(("FALLB".into(), CredentialSource::Fallback))
        );
    }

    #[test]
    fn blank_values_are_skipped_and_trimmed() {
        let (blank, padded) = (secret("   "), secret(" A1651 "));
        let sources = CredentialSources {
            explicit: Some(&blank),
            environment: Some(&padded),
            ..CredentialSources::default()
        };
        assert_eq!(
            resolved(&sources),
            Some(("A1651".into(), CredentialSource::Environment))
        );
    }

    #[test]
    fn nothing_resolves_to_none() {
        let blank = secret("");
        let sources = CredentialSources {
            explicit: Some(&blank),
            ..CredentialSources::default()
        };
        assert!(sources.resolve().is_none());
    }
}
