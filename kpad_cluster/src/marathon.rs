//! Marathon (DC/OS) over its v2 REST API.

use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::backend::ClusterBackend;
use crate::error::{Error, Result};
use crate::model::{AppSnapshot, Labels};

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct App {
    pub id:          String,
    pub instances:   u32,
    #[serde(default)]
    pub deployments: Vec<DeploymentRef>,
    #[serde(default)]
    pub labels:      Labels,
}

impl App {
    /// App ids come with a leading `/`; the table and the URLs use them
    /// without.
    pub fn short_id(&self) -> &str {
        self.id.trim_start_matches('/')
    }

    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            id:        self.short_id().to_string(),
            replicas:  self.instances,
            labels:    self.labels.clone(),
            deploying: !self.deployments.is_empty(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct DeploymentRef {
    pub id: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Apps {
    pub apps: Vec<App>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id:              String,
    #[serde(default)]
    pub affected_apps:   Vec<String>,
    #[serde(default)]
    pub current_actions: Vec<Action>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Action {
    /// `StartApplication`, `ScaleApplication`, ...
    pub action: String,
    pub app:    String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Tasks {
    pub tasks: Vec<Task>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id:         String,
    pub app_id:     String,
    #[serde(default)]
    pub host:       Option<String>,
    pub staged_at:  Option<String>,
    pub started_at: Option<String>,
}

/// Distinct agents running `tasks`, sorted.
pub fn task_hosts(tasks: &[Task]) -> Vec<&str> {
    let mut hosts: Vec<&str> = tasks.iter().filter_map(|t| t.host.as_deref()).collect();
    hosts.sort_unstable();
    hosts.dedup();
    hosts
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub deployment_id: String,
}

// ════════════════════════════════════════════════════════════════════════════
// MarathonClient
// ════════════════════════════════════════════════════════════════════════════

pub struct MarathonClient {
    agent:    ureq::Agent,
    endpoint: String,
    token:    Option<String>,
}

impl MarathonClient {
    pub fn new(api_endpoint: &str, access_token_file: Option<&Path>, timeout: Duration) -> Result<Self> {
        let token = match access_token_file {
            Some(path) => Some(
                std::fs::read_to_string(path)
                    .map_err(|source| Error::TokenFile { path: path.to_path_buf(), source })?
                    .trim()
                    .to_string(),
            ),
            None => None,
        };
        info!(endpoint = api_endpoint, auth = token.is_some(), "marathon client ready");
        Ok(MarathonClient {
            agent:    ureq::AgentBuilder::new().timeout(timeout).build(),
            endpoint: api_endpoint.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    fn authorize(&self, req: ureq::Request) -> ureq::Request {
        match &self.token {
            Some(t) => req.set("Authorization", &format!("token={}", t)),
            None    => req,
        }
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        let resp = self
            .authorize(self.agent.get(&url))
            .call()
            .map_err(|e| Error::from_ureq("GET", &url, e))?;
        resp.into_json().map_err(|e| Error::Decode { url, reason: e.to_string() })
    }

    /// Apps labelled `LAUNCHPAD_ENABLE==true`.
    pub fn list_apps(&self) -> Result<Vec<App>> {
        let apps: Apps = self.get("v2/apps?label=LAUNCHPAD_ENABLE==true")?;
        Ok(apps.apps)
    }

    pub fn list_deployments(&self) -> Result<Vec<Deployment>> {
        self.get("v2/deployments")
    }

    pub fn list_app_tasks(&self, app_id: &str) -> Result<Vec<Task>> {
        let tasks: Tasks = self.get(&format!("v2/apps/{}/tasks", app_id.trim_start_matches('/')))?;
        Ok(tasks.tasks)
    }

    /// Set the instance count, overriding a running deployment.
    pub fn scale_app(&self, app_id: &str, instances: u32) -> Result<UpdateResult> {
        let url = self.url(&format!("v2/apps/{}?force=true", app_id.trim_start_matches('/')));
        info!(app = app_id, instances, "scaling app");
        let resp = self
            .authorize(self.agent.put(&url))
            .send_json(serde_json::json!({ "instances": instances }))
            .map_err(|e| Error::from_ureq("PUT", &url, e))?;
        resp.into_json().map_err(|e| Error::Decode { url, reason: e.to_string() })
    }
}

pub struct MarathonBackend {
    client: MarathonClient,
}

impl MarathonBackend {
    pub fn new(client: MarathonClient) -> Self {
        MarathonBackend { client }
    }
}

impl ClusterBackend for MarathonBackend {
    fn name(&self) -> &str {
        "marathon"
    }

    fn list_apps(&mut self) -> Result<Vec<AppSnapshot>> {
        Ok(self.client.list_apps()?.iter().map(App::snapshot).collect())
    }

    fn scale_app(&mut self, id: &str, replicas: u32) -> Result<()> {
        let result = self.client.scale_app(id, replicas)?;
        debug!(deployment = %result.deployment_id, "scaling accepted");
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const APPS: &str = r#"{
      "apps": [
        {
          "id": "/testapp",
          "cmd": "sleep 1000",
          "instances": 3,
          "deployments": [ { "id": "testapp-d0" } ],
          "labels": { "key": "value" }
        },
        { "id": "/group/other", "instances": 0 }
      ]
    }"#;

    const DEPLOYMENTS: &str = r#"[
      {
        "id": "testapp-d0",
        "version": "2016-11-30T10:00:00.000Z",
        "affectedApps": ["/testapp"],
        "currentActions": [ { "action": "ScaleApplication", "app": "/testapp" } ],
        "currentStep": 1,
        "totalSteps": 1
      }
    ]"#;

    #[test]
    fn decode_apps() {
        let apps: Apps = serde_json::from_str(APPS).unwrap();
        let first = apps.apps[0].snapshot();
        assert_eq!(first.id, "testapp");
        assert_eq!(first.replicas, 3);
        assert!(first.deploying);
        assert_eq!(first.labels.get("key").map(String::as_str), Some("value"));

        let second = apps.apps[1].snapshot();
        assert_eq!(second.id, "group/other");
        assert!(!second.deploying);
        assert!(second.labels.is_empty());
    }

    #[test]
    fn decode_deployments() {
        let deployments: Vec<Deployment> = serde_json::from_str(DEPLOYMENTS).unwrap();
        assert_eq!(
            deployments[0],
            Deployment {
                id:              "testapp-d0".into(),
                affected_apps:   vec!["/testapp".into()],
                current_actions: vec![Action { action: "ScaleApplication".into(), app: "/testapp".into() }],
            }
        );
    }

    #[test]
    fn decode_tasks_and_update_result() {
        let tasks: Tasks = serde_json::from_str(
            r#"{"tasks":[{"id":"testapp.1","appId":"/testapp","stagedAt":"2016-11-30T10:00:00.000Z","startedAt":null}]}"#,
        )
        .unwrap();
        assert_eq!(tasks.tasks[0].app_id, "/testapp");
        assert!(tasks.tasks[0].started_at.is_none());

        let result: UpdateResult =
            serde_json::from_str(r#"{"version":"v","deploymentId":"5ed4c0c5"}"#).unwrap();
        assert_eq!(result.deployment_id, "5ed4c0c5");
    }

    #[test]
    fn task_hosts_are_distinct() {
        let tasks: Tasks = serde_json::from_str(
            r#"{"tasks":[
              {"id":"web.1","appId":"/web","host":"10.0.0.7","stagedAt":null,"startedAt":null},
              {"id":"web.2","appId":"/web","host":"10.0.0.3","stagedAt":null,"startedAt":null},
              {"id":"web.3","appId":"/web","host":"10.0.0.7","stagedAt":null,"startedAt":null},
              {"id":"web.4","appId":"/web","stagedAt":null,"startedAt":null}
            ]}"#,
        )
        .unwrap();
        assert_eq!(tasks.tasks.len(), 4);
        assert_eq!(task_hosts(&tasks.tasks), vec!["10.0.0.3", "10.0.0.7"]);
        assert!(task_hosts(&[]).is_empty());
    }

    #[test]
    fn update_result_without_version() {
        let result: UpdateResult = serde_json::from_str(r#"{"deploymentId":"9a1b"}"#).unwrap();
        assert_eq!(result.deployment_id, "9a1b");
    }

    #[test]
    fn urls_join_cleanly() {
        let c = MarathonClient::new("https://dcos.example/marathon/", None, Duration::from_secs(1)).unwrap();
        assert_eq!(c.url("v2/apps"), "https://dcos.example/marathon/v2/apps");
    }
}
