//! Provider ports backed by the `oci` command-line tool.
//!
//! Every call is one `oci` invocation with `--output json`; the tool reads
//! credentials from the same config file this service validated at
//! startup. Listings come back as `{"data": [...], "opc-next-page": "..."}`.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use ociaction_common::{Compartment, Instance, InstanceAction, LifecycleState};

use crate::application::ports::{CloudConnector, CommandRunner, ComputeApi, Page, TenancyApi};
use crate::domain::ProviderError;

use super::oci_config::OciConfigFile;

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(rename = "opc-next-page", default)]
    next_page: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GetResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CliInstance {
    id: String,
    display_name: String,
    compartment_id: String,
    lifecycle_state: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CliCompartment {
    id: String,
    name: String,
    compartment_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CliRegionSubscription {
    region_name: String,
    #[serde(default)]
    status: Option<String>,
}

// ── Invocation ────────────────────────────────────────────────────────────────

/// One `oci` binding: profile, optional region, shared runner.
#[derive(Clone)]
pub struct OciCli {
    runner: Arc<dyn CommandRunner>,
    program: String,
    config_file: String,
    profile: String,
    region: Option<String>,
    tenancy_id: String,
}

impl OciCli {
    async fn call(&self, args: &[&str]) -> Result<Vec<u8>, ProviderError> {
        let mut argv: Vec<&str> = args.to_vec();
        argv.extend([
            "--config-file",
            self.config_file.as_str(),
            "--profile",
            self.profile.as_str(),
            "--output",
            "json",
        ]);
        if let Some(region) = &self.region {
            argv.extend(["--region", region.as_str()]);
        }

        let output = self
            .runner
            .run(&self.program, &argv)
            .await
            .map_err(|e| ProviderError::Api(format!("{e:#}")))?;
        if output.status.success() {
            return Ok(output.stdout);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = format!("{} {}: {}", self.program, args.join(" "), stderr.trim());
        if is_not_found(&stderr) {
            Err(ProviderError::NotFound(detail))
        } else {
            Err(ProviderError::Api(detail))
        }
    }

    async fn list<T: DeserializeOwned>(
        &self,
        args: &[&str],
        page: Option<&str>,
    ) -> Result<Page<T>, ProviderError> {
        let mut argv = args.to_vec();
        if let Some(page) = page {
            argv.extend(["--page", page]);
        }
        let stdout = self.call(&argv).await?;
        decode_list(&stdout)
    }
}

/// The tool reports a missing or forbidden resource with a 404 service
/// error on stderr.
fn is_not_found(stderr: &str) -> bool {
    stderr.contains("NotAuthorizedOrNotFound")
        || stderr.contains("\"status\": 404")
        || stderr.contains("\"status\":404")
}

/// An empty listing prints nothing at all.
fn decode_list<T: DeserializeOwned>(stdout: &[u8]) -> Result<Page<T>, ProviderError> {
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Ok(Page::last(Vec::new()));
    }
    let response: ListResponse<T> =
        serde_json::from_slice(stdout).map_err(|e| ProviderError::Decode(e.to_string()))?;
    Ok(Page {
        items: response.data,
        next_page: response.next_page.filter(|p| !p.is_empty()),
    })
}

#[async_trait]
impl TenancyApi for OciCli {
    fn tenancy_id(&self) -> &str {
        &self.tenancy_id
    }

    async fn list_region_subscriptions(
        &self,
        page: Option<&str>,
    ) -> Result<Page<String>, ProviderError> {
        // Not paginated by the tool; the first page is the whole set.
        if page.is_some() {
            return Ok(Page::last(Vec::new()));
        }
        let listed: Page<CliRegionSubscription> = self
            .list(
                &["iam", "region-subscription", "list", "--tenancy-id", self.tenancy_id.as_str()],
                None,
            )
            .await?;
        let regions = listed
            .items
            .into_iter()
            .filter(|s| s.status.as_deref().is_none_or(|st| st.eq_ignore_ascii_case("READY")))
            .map(|s| s.region_name)
            .collect();
        Ok(Page::last(regions))
    }

    async fn list_compartments(
        &self,
        page: Option<&str>,
    ) -> Result<Page<Compartment>, ProviderError> {
        let listed: Page<CliCompartment> = self
            .list(
                &[
                    "iam",
                    "compartment",
                    "list",
                    "--compartment-id",
                    self.tenancy_id.as_str(),
                    "--compartment-id-in-subtree",
                    "true",
                    "--access-level",
                    "ANY",
                    "--lifecycle-state",
                    "ACTIVE",
                ],
                page,
            )
            .await?;
        Ok(Page {
            items: listed
                .items
                .into_iter()
                .map(|c| Compartment {
                    id: c.id,
                    name: c.name,
                    parent_id: c.compartment_id,
                    tenancy_id: self.tenancy_id.clone(),
                })
                .collect(),
            next_page: listed.next_page,
        })
    }
}

#[async_trait]
impl ComputeApi for OciCli {
    fn region(&self) -> &str {
        self.region.as_deref().unwrap_or_default()
    }

    async fn list_instances(
        &self,
        compartment_id: &str,
        page: Option<&str>,
    ) -> Result<Page<Instance>, ProviderError> {
        let listed: Page<CliInstance> = self
            .list(
                &["compute", "instance", "list", "--compartment-id", compartment_id],
                page,
            )
            .await?;
        Ok(Page {
            items: listed
                .items
                .into_iter()
                .map(|i| self.instance(i))
                .collect(),
            next_page: listed.next_page,
        })
    }

    async fn get_instance(&self, instance_id: &str) -> Result<Option<Instance>, ProviderError> {
        let stdout = match self
            .call(&["compute", "instance", "get", "--instance-id", instance_id])
            .await
        {
            Ok(stdout) => stdout,
            Err(ProviderError::NotFound(_)) => return Ok(None),
            Err(err) => return Err(err),
        };
        let response: GetResponse<CliInstance> =
            serde_json::from_slice(&stdout).map_err(|e| ProviderError::Decode(e.to_string()))?;
        Ok(Some(self.instance(response.data)))
    }

    async fn instance_action(
        &self,
        instance_id: &str,
        action: InstanceAction,
    ) -> Result<(), ProviderError> {
        self.call(&[
            "compute",
            "instance",
            "action",
            "--instance-id",
            instance_id,
            "--action",
            action.as_str(),
        ])
        .await
        .map(drop)
    }
}

impl OciCli {
    /// The tool reports short region keys (`iad`) for some regions; records
    /// carry the region this binding targets instead.
    fn instance(&self, raw: CliInstance) -> Instance {
        Instance {
            id: raw.id,
            display_name: raw.display_name,
            compartment_id: raw.compartment_id,
            region: self.region().to_string(),
            lifecycle_state: LifecycleState::from(raw.lifecycle_state),
        }
    }
}

// ── Connector ─────────────────────────────────────────────────────────────────

/// Hands out [`OciCli`] bindings for the profiles of one config file.
pub struct OciCliConnector {
    runner: Arc<dyn CommandRunner>,
    program: String,
    config: OciConfigFile,
}

impl OciCliConnector {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        program: impl Into<String>,
        config: OciConfigFile,
    ) -> Self {
        Self {
            runner,
            program: program.into(),
            config,
        }
    }

    fn bind(&self, profile: &str, region: Option<String>) -> Result<OciCli, ProviderError> {
        let entry = self
            .config
            .profile(profile)
            .map_err(|_| ProviderError::UnknownProfile(profile.to_string()))?;
        Ok(OciCli {
            runner: Arc::clone(&self.runner),
            program: self.program.clone(),
            config_file: config_path(self.config.path()),
            profile: entry.name.clone(),
            region: region.or_else(|| entry.region.clone()),
            tenancy_id: entry.tenancy.clone(),
        })
    }
}

fn config_path(path: &std::path::Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .display()
        .to_string()
}

impl CloudConnector for OciCliConnector {
    fn profiles(&self) -> Vec<String> {
        self.config.profile_names()
    }

    fn tenancy(&self, profile: &str) -> Result<Box<dyn TenancyApi>, ProviderError> {
        Ok(Box::new(self.bind(profile, None)?))
    }

    fn compute(&self, profile: &str, region: &str) -> Result<Box<dyn ComputeApi>, ProviderError> {
        Ok(Box::new(self.bind(profile, Some(region.to_string()))?))
    }
}
