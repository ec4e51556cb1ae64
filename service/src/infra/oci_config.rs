//! Profile-sectioned provider config file.
//!
//! ```text
//! [DEFAULT]
//! user=ocid1.user.oc1..aaa
//! fingerprint=20:3b:97:13
//! tenancy=ocid1.tenancy.oc1..bbb
//! region=us-ashburn-1
//! key_file=~/.oci/oci_api_key.pem
//! ```
//!
//! Every section is a profile. Keys missing from a section are inherited
//! from `DEFAULT`. The file is validated once at startup; any problem is
//! fatal.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::domain::ConfigError;

pub const DEFAULT_PROFILE: &str = "DEFAULT";

/// Credential context of one profile, after `DEFAULT` inheritance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileConfig {
    pub name: String,
    pub user: Option<String>,
    pub fingerprint: Option<String>,
    pub tenancy: String,
    /// Home region. Scans ignore it and use the subscribed regions.
    pub region: Option<String>,
    pub key_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct OciConfigFile {
    path: PathBuf,
    profiles: Vec<ProfileConfig>,
}

impl OciConfigFile {
    /// Read and validate the config file.
    ///
    /// # Errors
    ///
    /// Unreadable or malformed files, incomplete profiles, and key files
    /// that do not exist.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = Self::parse(&path, &text)?;
        for profile in &config.profiles {
            if !profile.key_file.is_file() {
                return Err(ConfigError::KeyFileMissing {
                    profile: profile.name.clone(),
                    path: profile.key_file.clone(),
                });
            }
        }
        tracing::info!(
            path = %config.path.display(),
            profiles = ?config.profile_names(),
            "provider config loaded",
        );
        Ok(config)
    }

    /// Parse config text without touching the filesystem. `path` is only
    /// used in error messages and to locate the file for the `oci` tool.
    ///
    /// # Errors
    ///
    /// Malformed lines, no sections at all, or a profile without `tenancy`
    /// or `key_file`.
    pub fn parse(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let sections = parse_sections(path, text)?;
        if sections.is_empty() {
            return Err(ConfigError::NoProfiles(path.to_path_buf()));
        }

        let defaults = sections
            .iter()
            .find(|(name, _)| name == DEFAULT_PROFILE)
            .map(|(_, values)| values.clone())
            .unwrap_or_default();

        let mut profiles = Vec::with_capacity(sections.len());
        for (name, own) in sections {
            let mut values = defaults.clone();
            values.extend(own);
            profiles.push(build_profile(name, values)?);
        }
        Ok(Self {
            path: path.to_path_buf(),
            profiles,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Profile names in file order.
    #[must_use]
    pub fn profile_names(&self) -> Vec<String> {
        self.profiles.iter().map(|p| p.name.clone()).collect()
    }

    /// # Errors
    ///
    /// [`ConfigError::UnknownProfile`] if no section has that name.
    pub fn profile(&self, name: &str) -> Result<&ProfileConfig, ConfigError> {
        self.profiles
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))
    }
}

type Section = (String, BTreeMap<String, String>);

/// Sections in first-appearance order. A repeated header continues the
/// earlier section; a repeated key overrides the earlier value.
fn parse_sections(path: &Path, text: &str) -> Result<Vec<Section>, ConfigError> {
    let malformed = |line: usize, reason: &str| ConfigError::Malformed {
        path: path.to_path_buf(),
        line,
        reason: reason.to_string(),
    };

    let mut sections: Vec<Section> = Vec::new();
    let mut current: Option<usize> = None;
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let name = header
                .strip_suffix(']')
                .ok_or_else(|| malformed(line_no, "unterminated section header"))?
                .trim();
            if name.is_empty() {
                return Err(malformed(line_no, "empty section name"));
            }
            current = Some(match sections.iter().position(|(n, _)| n == name) {
                Some(pos) => pos,
                None => {
                    sections.push((name.to_string(), BTreeMap::new()));
                    sections.len() - 1
                }
            });
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| malformed(line_no, "expected key=value"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(malformed(line_no, "empty key"));
        }
        let section =
            current.ok_or_else(|| malformed(line_no, "key outside of a [profile] section"))?;
        sections[section]
            .1
            .insert(key.to_string(), value.trim().to_string());
    }
    Ok(sections)
}

fn build_profile(
    name: String,
    mut values: BTreeMap<String, String>,
) -> Result<ProfileConfig, ConfigError> {
    let mut required = |key: &'static str| {
        values
            .remove(key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingKey {
                profile: name.clone(),
                key,
            })
    };
    let tenancy = required("tenancy")?;
    let key_file = expand_home(&required("key_file")?);
    Ok(ProfileConfig {
        user: values.remove("user"),
        fingerprint: values.remove("fingerprint"),
        region: values.remove("region"),
        tenancy,
        key_file,
        name,
    })
}

fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(raw)
}
