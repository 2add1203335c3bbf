//! Kubernetes over its REST API.
//!
//! Plain HTTP(S) with an optional bearer token.  Client certificates and
//! kubeconfig are not handled; run `kubectl proxy` and point `master_url`
//! at it (`http://127.0.0.1:8001`) when the cluster needs them.

use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::backend::ClusterBackend;
use crate::error::{Error, Result};
use crate::model::{AppSnapshot, Labels};

// ════════════════════════════════════════════════════════════════════════════
// Resource types: only the fields this crate reads
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ObjectMeta {
    pub name:      String,
    pub namespace: Option<String>,
    pub labels:    Labels,
}

#[derive(Clone, Debug, Deserialize)]
pub struct List<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Pod {
    pub metadata: ObjectMeta,
    pub status:   PodStatus,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PodStatus {
    pub phase: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReplicaSpec {
    pub replicas: Option<u32>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReplicaStatus {
    pub replicas:       Option<u32>,
    pub ready_replicas: Option<u32>,
}

/// Deployments and replication controllers share this shape.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReplicatedResource {
    pub metadata: ObjectMeta,
    pub spec:     ReplicaSpec,
    pub status:   ReplicaStatus,
}

pub type Deployment = ReplicatedResource;
pub type ReplicationController = ReplicatedResource;

impl ReplicatedResource {
    /// Desired replicas.  The API server fills in 1 when unset.
    pub fn desired(&self) -> u32 {
        self.spec.replicas.unwrap_or(1)
    }

    pub fn ready(&self) -> u32 {
        self.status.ready_replicas.unwrap_or(0)
    }

    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            id:        self.metadata.name.clone(),
            replicas:  self.desired(),
            labels:    self.metadata.labels.clone(),
            deploying: self.ready() != self.desired(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// KubernetesClient
// ════════════════════════════════════════════════════════════════════════════

pub struct KubernetesClient {
    agent:      ureq::Agent,
    master_url: String,
    token:      Option<String>,
}

impl KubernetesClient {
    pub fn new(master_url: &str, token_file: Option<&Path>, timeout: Duration) -> Result<Self> {
        let token = token_file.map(read_token).transpose()?;
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        info!(master = master_url, auth = token.is_some(), "kubernetes client ready");
        Ok(KubernetesClient {
            agent,
            master_url: master_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn master_url(&self) -> &str {
        &self.master_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.master_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, req: ureq::Request) -> ureq::Request {
        match &self.token {
            Some(t) => req.set("Authorization", &format!("Bearer {}", t)),
            None    => req,
        }
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        let resp = self
            .authorize(self.agent.get(&url))
            .set("Accept", "application/json")
            .call()
            .map_err(|e| Error::from_ureq("GET", &url, e))?;
        resp.into_json().map_err(|e| Error::Decode { url, reason: e.to_string() })
    }

    fn patch_scale(&self, path: &str, replicas: u32) -> Result<()> {
        let url = self.url(path);
        let body = serde_json::json!({ "spec": { "replicas": replicas } }).to_string();
        debug!(%url, replicas, "PATCH");
        self.authorize(self.agent.request("PATCH", &url))
            .set("Content-Type", "application/merge-patch+json")
            .send_string(&body)
            .map_err(|e| Error::from_ureq("PATCH", &url, e))?;
        Ok(())
    }

    pub fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>> {
        let list: List<Pod> = self.get(&format!("api/v1/namespaces/{}/pods", namespace))?;
        Ok(list.items)
    }

    pub fn list_replication_controllers(&self, namespace: &str) -> Result<Vec<ReplicationController>> {
        let list: List<ReplicationController> =
            self.get(&format!("api/v1/namespaces/{}/replicationcontrollers", namespace))?;
        Ok(list.items)
    }

    pub fn list_deployments(&self, namespace: &str) -> Result<Vec<Deployment>> {
        let list: List<Deployment> =
            self.get(&format!("apis/apps/v1/namespaces/{}/deployments", namespace))?;
        Ok(list.items)
    }

    pub fn scale_deployment(&self, namespace: &str, name: &str, replicas: u32) -> Result<()> {
        info!(deployment = name, replicas, "scaling deployment");
        self.patch_scale(&format!("apis/apps/v1/namespaces/{}/deployments/{}/scale", namespace, name), replicas)
    }

    /// Scaling a controller restarts its pods rather than rolling them.
    pub fn scale_replication_controller(&self, namespace: &str, name: &str, replicas: u32) -> Result<()> {
        info!(controller = name, replicas, "scaling replication controller");
        self.patch_scale(
            &format!("api/v1/namespaces/{}/replicationcontrollers/{}/scale", namespace, name),
            replicas,
        )
    }
}

fn read_token(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map(|t| t.trim().to_string())
        .map_err(|source| Error::TokenFile { path: path.to_path_buf(), source })
}

// ════════════════════════════════════════════════════════════════════════════
// KubernetesBackend: deployments of one namespace
// ════════════════════════════════════════════════════════════════════════════

pub struct KubernetesBackend {
    client:    KubernetesClient,
    namespace: String,
}

impl KubernetesBackend {
    pub fn new(client: KubernetesClient, namespace: impl Into<String>) -> Self {
        KubernetesBackend { client, namespace: namespace.into() }
    }
}

impl ClusterBackend for KubernetesBackend {
    fn name(&self) -> &str {
        "kubernetes"
    }

    fn list_apps(&mut self) -> Result<Vec<AppSnapshot>> {
        let deployments = self.client.list_deployments(&self.namespace)?;
        Ok(deployments.iter().map(ReplicatedResource::snapshot).collect())
    }

    fn scale_app(&mut self, id: &str, replicas: u32) -> Result<()> {
        self.client.scale_deployment(&self.namespace, id, replicas)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const DEPLOYMENTS: &str = r#"{
      "kind": "DeploymentList",
      "apiVersion": "apps/v1",
      "items": [
        {
          "metadata": {
            "name": "nginx",
            "namespace": "default",
            "labels": { "LAUNCHPAD_ENABLE": "true", "LAUNCHPAD_COLOR": "RED" }
          },
          "spec": { "replicas": 3 },
          "status": { "replicas": 3, "readyReplicas": 2 }
        },
        {
          "metadata": { "name": "idle" },
          "spec": { "replicas": 0 },
          "status": {}
        }
      ]
    }"#;

    const PODS: &str = r#"{
      "kind": "PodList",
      "items": [
        { "metadata": { "name": "kube-dns-v20-abc", "namespace": "kube-system" },
          "status": { "phase": "Running" } },
        { "metadata": { "name": "heapster-xyz" }, "status": { "phase": "Pending" } }
      ]
    }"#;

    #[test]
    fn decode_deployments() {
        let list: List<Deployment> = serde_json::from_str(DEPLOYMENTS).unwrap();
        assert_eq!(list.items.len(), 2);

        let nginx = list.items[0].snapshot();
        assert_eq!(nginx.id, "nginx");
        assert_eq!(nginx.replicas, 3);
        assert!(nginx.deploying);
        assert!(nginx.is_enabled());

        let idle = list.items[1].snapshot();
        assert_eq!(idle.replicas, 0);
        assert!(!idle.deploying, "zero desired and zero ready is settled");
    }

    #[test]
    fn decode_pods() {
        let list: List<Pod> = serde_json::from_str(PODS).unwrap();
        assert_eq!(list.items[0].metadata.namespace.as_deref(), Some("kube-system"));
        assert_eq!(list.items[1].status.phase.as_deref(), Some("Pending"));
    }

    #[test]
    fn empty_list_decodes() {
        let list: List<Pod> = serde_json::from_str(r#"{"kind":"PodList"}"#).unwrap();
        assert!(list.items.is_empty());
    }

    #[test]
    fn missing_replicas_defaults_to_one() {
        let rc: ReplicationController = serde_json::from_str(r#"{"metadata":{"name":"rc"}}"#).unwrap();
        assert_eq!(rc.desired(), 1);
        assert!(rc.snapshot().deploying);
    }

    #[test]
    fn urls_join_cleanly() {
        let c = KubernetesClient::new("http://127.0.0.1:8001/", None, Duration::from_secs(1)).unwrap();
        assert_eq!(c.url("/api/v1/namespaces/default/pods"), "http://127.0.0.1:8001/api/v1/namespaces/default/pods");
    }

    #[test]
    fn missing_token_file_is_an_error() {
        let err = KubernetesClient::new("http://x", Some(Path::new("/nonexistent/token")), Duration::from_secs(1));
        assert!(matches!(err, Err(Error::TokenFile { .. })));
    }
}
