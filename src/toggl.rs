use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reqwest::blocking::{Client, Response};
use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::config::{Config, Endpoints};
use crate::models::{
    Client as TogglClientModel, CurrentEntryReply, NewTimeEntry, Project, ProjectPayload,
    ReportLine, StoppedEntryReply, StoppedTimer, SummaryReport, Timer,
};

const USER_AGENT: &str = concat!("toggl-cli/", env!("CARGO_PKG_VERSION"));
const CREATED_WITH: &str = "toggl";
const RUNNING_DURATION: i64 = -1;
const NO_PROJECT: &str = "(no project)";

#[derive(Debug, Error)]
pub enum TogglError {
    #[error("bad URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("timed out after {timeout:?} calling {url}")]
    Timeout { url: String, timeout: Duration },
    #[error("calling {url}: {message}")]
    Network { url: String, message: String },
    #[error("\"{status}\" calling {url}")]
    Status { status: StatusCode, url: String },
    #[error("can't decode response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("can't encode request to {url}: {message}")]
    Encode { url: String, message: String },
    #[error("can't set up HTTP client: {0}")]
    Setup(String),
}

impl TogglError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            TogglError::Status { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
        )
    }
}

#[derive(Clone)]
pub struct TogglClient {
    client: Client,
    token: String,
    workspace_id: u64,
    timeout: Duration,
    endpoints: Endpoints,
}

impl TogglClient {
    pub fn new(config: &Config) -> Result<Self, TogglError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|err| TogglError::Setup(err.to_string()))?;
        Ok(Self {
            client,
            token: config.api_token.clone(),
            workspace_id: config.workspace_id,
            timeout: config.timeout,
            endpoints: config.endpoints.clone(),
        })
    }

    pub fn projects(&self) -> Result<Vec<Project>, TogglError> {
        let url = self.workspace_url("projects");
        let payload: Option<Vec<ProjectPayload>> = self.call_json(Method::GET, &url, None)?;
        let mut projects: Vec<Project> = payload
            .unwrap_or_default()
            .into_iter()
            .map(Project::from)
            .collect();

        match self.clients() {
            Ok(clients) => attach_client_names(&mut projects, &clients),
            Err(err) => log::warn!("Could not fetch clients, showing bare project names: {err}"),
        }

        Ok(projects)
    }

    pub fn clients(&self) -> Result<HashMap<u64, String>, TogglError> {
        let url = self.workspace_url("clients");
        let clients: Option<Vec<TogglClientModel>> = self.call_json(Method::GET, &url, None)?;
        Ok(clients
            .unwrap_or_default()
            .into_iter()
            .map(|client| (client.id, client.name))
            .collect())
    }

    pub fn current_timer(&self) -> Result<Option<Timer>, TogglError> {
        let url = format!("{}/me/time_entries/current", self.endpoints.api);
        let reply: Option<CurrentEntryReply> = self.call_json(Method::GET, &url, None)?;
        Ok(reply.and_then(CurrentEntryReply::into_timer))
    }

    pub fn start_timer(&self, project_id: u64, start: DateTime<Utc>) -> Result<(), TogglError> {
        let url = self.workspace_url("time_entries");
        let entry = NewTimeEntry {
            created_with: CREATED_WITH,
            description: "",
            workspace_id: self.workspace_id,
            project_id,
            start: start.to_rfc3339_opts(SecondsFormat::Secs, true),
            duration: RUNNING_DURATION,
        };
        let body = encode(&url, &entry)?;
        self.call(Method::POST, &url, Some(body)).map(drop)
    }

    pub fn stop_timer(&self, timer_id: u64) -> Result<StoppedTimer, TogglError> {
        let url = self.workspace_url(&format!("time_entries/{timer_id}/stop"));
        let reply: StoppedEntryReply = self.call_json(Method::PATCH, &url, None)?;
        let entry = reply.into_entry();
        Ok(StoppedTimer {
            project_id: entry.project_id.or(entry.pid),
            duration: Duration::from_secs(entry.duration.max(0).unsigned_abs()),
        })
    }

    pub fn report(&self, since: NaiveDate) -> Result<Vec<ReportLine>, TogglError> {
        let since = since.format("%Y-%m-%d").to_string();
        let workspace = self.workspace_id.to_string();
        let url = Url::parse_with_params(
            &self.endpoints.reports,
            &[
                ("since", since.as_str()),
                ("workspace_id", workspace.as_str()),
                ("user_agent", CREATED_WITH),
            ],
        )
        .map_err(|err| TogglError::InvalidUrl {
            url: self.endpoints.reports.clone(),
            message: err.to_string(),
        })?;

        let reply: SummaryReport = self.call_json(Method::GET, url.as_str(), None)?;
        Ok(reply
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|item| ReportLine {
                project: item.title.project.unwrap_or_else(|| NO_PROJECT.to_string()),
                duration: Duration::from_millis(item.time),
            })
            .collect())
    }

    fn workspace_url(&self, path: &str) -> String {
        format!(
            "{}/workspaces/{}/{}",
            self.endpoints.api, self.workspace_id, path
        )
    }

    fn call_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
    ) -> Result<T, TogglError> {
        let response = self.call(method, url, body)?;
        let bytes = response
            .bytes()
            .map_err(|err| self.transport_error(url, err))?;
        serde_json::from_slice(&bytes).map_err(|err| TogglError::Decode {
            url: url.to_string(),
            message: err.to_string(),
        })
    }

    fn call(&self, method: Method, url: &str, body: Option<Vec<u8>>) -> Result<Response, TogglError> {
        let target = Url::parse(url).map_err(|err| TogglError::InvalidUrl {
            url: url.to_string(),
            message: err.to_string(),
        })?;
        let credentials = STANDARD.encode(format!("{}:api_token", self.token));

        log::debug!("{method} {url}");
        let mut request = self
            .client
            .request(method.clone(), target)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Basic {}", credentials));
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request
            .send()
            .map_err(|err| self.transport_error(url, err))?;

        let status = response.status();
        log::trace!("{method} {url} -> {status}");
        if !status.is_success() {
            return Err(TogglError::Status {
                status,
                url: url.to_string(),
            });
        }

        Ok(response)
    }

    fn transport_error(&self, url: &str, err: reqwest::Error) -> TogglError {
        if err.is_timeout() {
            return TogglError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            };
        }
        TogglError::Network {
            url: url.to_string(),
            message: error_chain(&err),
        }
    }
}

fn attach_client_names(projects: &mut [Project], clients: &HashMap<u64, String>) {
    for project in projects {
        project.client_name = project
            .client_id
            .and_then(|id| clients.get(&id))
            .filter(|name| !name.is_empty())
            .cloned();
    }
}

fn encode<T: Serialize>(url: &str, body: &T) -> Result<Vec<u8>, TogglError> {
    serde_json::to_vec(body).map_err(|err| TogglError::Encode {
        url: url.to_string(),
        message: err.to_string(),
    })
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
