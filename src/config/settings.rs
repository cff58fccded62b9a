use std::time::Duration;

use anyhow::{bail, Context, Result};
use url::Url;

use crate::executor::BatchMode;
use crate::validate::HeaderMapping;

use super::loader::{LoadedConfig, ProbeProfileConfig};

/// Effective settings after layering CLI flags over the selected profile
/// over top-level config over built-in defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSettings {
    pub profile_name: Option<String>,
    pub base_url: Option<String>,
    /// Used when the header field is left blank.
    pub default_headers: HeaderMapping,
    pub timeout: Option<Duration>,
    pub mode: BatchMode,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            profile_name: None,
            base_url: None,
            default_headers: HeaderMapping::from([(
                "Content-Type".to_string(),
                "application/json".to_string(),
            )]),
            timeout: None,
            mode: BatchMode::Sequential,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SettingsBuilder {
    config: Option<LoadedConfig>,
    requested_profile: Option<String>,
    base_url: Option<String>,
    timeout_ms: Option<u64>,
    concurrency: Option<usize>,
}

impl SettingsBuilder {
    pub fn new(config: Option<LoadedConfig>, requested_profile: Option<String>) -> Self {
        Self {
            config,
            requested_profile,
            ..Self::default()
        }
    }

    pub fn base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: Option<u64>) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn concurrency(mut self, concurrency: Option<usize>) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn build(&self) -> Result<ProbeSettings> {
        let mut settings = ProbeSettings::default();
        let mut base_url = None;
        let mut timeout_ms = None;
        let mut concurrency = None;

        if let Some(loaded) = &self.config {
            let config = &loaded.config;
            base_url = config.base_url.clone();
            timeout_ms = config.timeout_ms;
            concurrency = config.concurrency;
            if let Some(headers) = &config.default_headers {
                settings.default_headers = headers.clone().into_iter().collect();
            }

            if let Some(profile) = resolve_profile(loaded, self.requested_profile.as_deref())? {
                settings.profile_name = Some(profile.name);
                let profile = profile.config;
                base_url = profile.base_url.clone().or(base_url);
                timeout_ms = profile.timeout_ms.or(timeout_ms);
                concurrency = profile.concurrency.or(concurrency);
                if let Some(headers) = &profile.default_headers {
                    settings.default_headers = headers.clone().into_iter().collect();
                }
            }
        } else if let Some(name) = &self.requested_profile {
            bail!("Unknown profile: {name} (no configuration loaded)");
        }

        base_url = self.base_url.clone().or(base_url);
        timeout_ms = self.timeout_ms.or(timeout_ms);
        concurrency = self.concurrency.or(concurrency);

        if let Some(url) = &base_url {
            Url::parse(url).with_context(|| format!("invalid base URL {url}"))?;
        }

        settings.base_url = base_url;
        settings.timeout = timeout_ms.filter(|ms| *ms > 0).map(Duration::from_millis);
        settings.mode = match concurrency {
            Some(limit) if limit > 1 => BatchMode::Concurrent { limit },
            _ => BatchMode::Sequential,
        };

        Ok(settings)
    }
}

struct ResolvedProfile<'a> {
    name: String,
    config: &'a ProbeProfileConfig,
}

/// Profiles are optional. An explicitly requested profile must exist.
fn resolve_profile<'a>(
    loaded: &'a LoadedConfig,
    requested: Option<&str>,
) -> Result<Option<ResolvedProfile<'a>>> {
    let config = &loaded.config;
    if let Some(name) = requested {
        return match config.profiles.get(name) {
            Some(profile) => Ok(Some(ResolvedProfile {
                name: name.to_string(),
                config: profile,
            })),
            None => bail!("Unknown profile: {name} (not in {})", loaded.path.display()),
        };
    }

    if let Some(default) = &config.default_profile {
        return match config.profiles.get(default) {
            Some(profile) => Ok(Some(ResolvedProfile {
                name: default.clone(),
                config: profile,
            })),
            None => bail!(
                "Default profile {default} is not defined in {}",
                loaded.path.display()
            ),
        };
    }

    Ok(None)
}
