//! API key lookup: the `CENSUS_API_KEY` environment variable first, then the
//! config file written by `acs login`.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const API_KEY_ENV: &str = "CENSUS_API_KEY";

/// Supplies the API key, or `None` when no key is configured.
pub trait CredentialProvider {
    fn api_key(&self) -> Option<String>;
}

/// A fixed key (or a fixed absence of one).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticCredential(pub Option<String>);

impl StaticCredential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(Some(key.into()))
    }

    pub fn absent() -> Self {
        Self(None)
    }
}

impl CredentialProvider for StaticCredential {
    fn api_key(&self) -> Option<String> {
        self.0.clone().filter(|k| !k.trim().is_empty())
    }
}

/// Default location of the stored key: `<config dir>/acs-cli/config`.
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("acs-cli").join("config"))
}

/// Environment variable, falling back to a key file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvOrFileCredentials {
    pub env_var: String,
    pub config_file: Option<PathBuf>,
}

impl Default for EnvOrFileCredentials {
    fn default() -> Self {
        Self {
            env_var: API_KEY_ENV.into(),
            config_file: default_config_file(),
        }
    }
}

impl CredentialProvider for EnvOrFileCredentials {
    fn api_key(&self) -> Option<String> {
        if let Ok(key) = std::env::var(&self.env_var)
            && !key.trim().is_empty()
        {
            return Some(key.trim().to_string());
        }
        let path = self.config_file.as_ref()?;
        match fs::read_to_string(path) {
            Ok(stored) if !stored.trim().is_empty() => Some(stored.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                log::debug!("no stored API key at {}: {e}", path.display());
                None
            }
        }
    }
}

/// Write the key to `path`, creating parent directories. The file is owner-only on unix.
pub fn save_api_key<P: AsRef<Path>>(path: P, api_key: &str) -> Result<PathBuf> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config dir {}", parent.display()))?;
    }
    fs::write(path, api_key.trim()).with_context(|| format!("write {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("restrict permissions on {}", path.display()))?;
    }
    Ok(path.to_path_buf())
}
