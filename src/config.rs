use serde::Deserialize;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const RC_ENV_KEY: &str = "TOGGLRC";
pub const DEFAULT_API_URL: &str = "https://api.track.toggl.com/api/v9";
pub const DEFAULT_REPORTS_URL: &str = "https://api.track.toggl.com/reports/api/v2/summary";

const RC_FILE_NAME: &str = ".togglrc";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("home directory not found (set TOGGLRC to the config file path)")]
    NoHome,
    #[error("can't read config {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("can't parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("missing api_token")]
    MissingToken,
    #[error("missing workspace ID")]
    MissingWorkspace,
    #[error("bad workspace ID {0:?}")]
    BadWorkspace(String),
    #[error("bad timeout {0:?}")]
    BadTimeout(String),
    #[error("timeout must be positive, got {0:?}")]
    NonPositiveTimeout(String),
    #[error("bad {field} {value:?}: {message}")]
    BadUrl {
        field: &'static str,
        value: String,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api: String,
    pub reports: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api: DEFAULT_API_URL.to_string(),
            reports: DEFAULT_REPORTS_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_token: String,
    pub workspace_id: u64,
    pub timeout: Duration,
    pub endpoints: Endpoints,
}

impl Config {
    pub fn new(api_token: String, workspace_id: u64, timeout: Duration) -> Result<Self, ConfigError> {
        let config = Self {
            api_token,
            workspace_id,
            timeout,
            endpoints: Endpoints::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Result<Self, ConfigError> {
        check_url("api_url", &endpoints.api)?;
        check_url("reports_url", &endpoints.reports)?;
        self.endpoints = endpoints;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if self.workspace_id == 0 {
            return Err(ConfigError::MissingWorkspace);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::NonPositiveTimeout(format!("{:?}", self.timeout)));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WorkspaceField {
    Number(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RcFile {
    #[serde(default)]
    api_token: String,
    #[serde(default, alias = "workspace")]
    workspace_id: Option<WorkspaceField>,
    #[serde(default)]
    timeout: Option<String>,
    #[serde(default)]
    api_url: Option<String>,
    #[serde(default)]
    reports_url: Option<String>,
}

pub fn load() -> Result<Config, ConfigError> {
    let path = config_path()?;
    load_from(&path)
}

pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    log::debug!("Reading configuration at path {:?}", path);
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let rc: RcFile = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    from_rc(rc)
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    resolve_config_path(env::var_os(RC_ENV_KEY), dirs::home_dir())
}

fn resolve_config_path(
    override_path: Option<OsString>,
    home: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    if let Some(path) = override_path.filter(|path| !path.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let mut path = home.ok_or(ConfigError::NoHome)?;
    path.push(RC_FILE_NAME);
    Ok(path)
}

fn from_rc(rc: RcFile) -> Result<Config, ConfigError> {
    let workspace_id = match rc.workspace_id {
        None => return Err(ConfigError::MissingWorkspace),
        Some(WorkspaceField::Number(id)) => id,
        Some(WorkspaceField::Text(text)) if text.trim().is_empty() => {
            return Err(ConfigError::MissingWorkspace);
        }
        Some(WorkspaceField::Text(text)) => text
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::BadWorkspace(text.clone()))?,
    };

    let timeout = match rc.timeout.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_TIMEOUT,
        Some(value) => parse_duration(value)?,
    };

    let endpoints = Endpoints {
        api: rc
            .api_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        reports: rc
            .reports_url
            .unwrap_or_else(|| DEFAULT_REPORTS_URL.to_string()),
    };

    let config = Config::new(rc.api_token, workspace_id, timeout)?.with_endpoints(endpoints)?;
    log::trace!(
        "Config: workspace {} timeout {:?} api {}",
        config.workspace_id,
        config.timeout,
        config.endpoints.api
    );
    Ok(config)
}

fn check_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    reqwest::Url::parse(value)
        .map(|_| ())
        .map_err(|err| ConfigError::BadUrl {
            field,
            value: value.to_string(),
            message: err.to_string(),
        })
}

// Go duration syntax: 5s, 1m30s, 250ms, 1.5h.
pub fn parse_duration(value: &str) -> Result<Duration, ConfigError> {
    let bad = || ConfigError::BadTimeout(value.to_string());
    let text = value.trim();
    let (negative, mut rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(bad());
    }

    let mut nanos = 0f64;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        let amount: f64 = number.parse().map_err(|_| bad())?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_len);
        let scale = match unit {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return Err(bad()),
        };

        nanos += amount * scale;
        rest = next;
    }

    if negative && nanos > 0.0 {
        return Err(ConfigError::NonPositiveTimeout(value.to_string()));
    }
    if !nanos.is_finite() || nanos > u64::MAX as f64 {
        return Err(bad());
    }
    Ok(Duration::from_nanos(nanos.round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(json: &str) -> Result<Config, ConfigError> {
        let rc: RcFile = serde_json::from_str(json).unwrap();
        from_rc(rc)
    }

    #[test]
    fn loads_numeric_workspace_and_timeout() {
        let config = parse(r#"{"api_token": "abc", "workspace_id": 123456, "timeout": "5s"}"#).unwrap();
        assert_eq!(config.api_token, "abc");
        assert_eq!(config.workspace_id, 123456);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.endpoints, Endpoints::default());
    }

    #[test]
    fn loads_string_workspace_under_legacy_key() {
        let config = parse(r#"{"api_token": "abc", "workspace": "123456"}"#).unwrap();
        assert_eq!(config.workspace_id, 123456);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn rejects_missing_fields() {
        assert!(matches!(
            parse(r#"{"workspace_id": 1}"#),
            Err(ConfigError::MissingToken)
        ));
        assert!(matches!(
            parse(r#"{"api_token": "  ", "workspace_id": 1}"#),
            Err(ConfigError::MissingToken)
        ));
        assert!(matches!(
            parse(r#"{"api_token": "abc"}"#),
            Err(ConfigError::MissingWorkspace)
        ));
        assert!(matches!(
            parse(r#"{"api_token": "abc", "workspace": ""}"#),
            Err(ConfigError::MissingWorkspace)
        ));
        assert!(matches!(
            parse(r#"{"api_token": "abc", "workspace": "acme"}"#),
            Err(ConfigError::BadWorkspace(_))
        ));
    }

    #[test]
    fn rejects_bad_timeouts() {
        assert!(matches!(
            parse(r#"{"api_token": "abc", "workspace_id": 1, "timeout": "0s"}"#),
            Err(ConfigError::NonPositiveTimeout(_))
        ));
        assert!(matches!(
            parse(r#"{"api_token": "abc", "workspace_id": 1, "timeout": "-1s"}"#),
            Err(ConfigError::NonPositiveTimeout(_))
        ));
        assert!(matches!(
            parse(r#"{"api_token": "abc", "workspace_id": 1, "timeout": "soon"}"#),
            Err(ConfigError::BadTimeout(_))
        ));
    }

    #[test]
    fn rejects_bad_endpoint_override() {
        assert!(matches!(
            parse(r#"{"api_token": "abc", "workspace_id": 1, "api_url": "not a url"}"#),
            Err(ConfigError::BadUrl { field: "api_url", .. })
        ));
    }

    #[test]
    fn endpoint_override_drops_trailing_slash() {
        let config = parse(
            r#"{"api_token": "abc", "workspace_id": 1, "api_url": "http://127.0.0.1:9000/api/v9/"}"#,
        )
        .unwrap();
        assert_eq!(config.endpoints.api, "http://127.0.0.1:9000/api/v9");
        assert_eq!(config.endpoints.reports, DEFAULT_REPORTS_URL);
    }

    #[test]
    fn config_new_validates() {
        assert!(Config::new("token".to_string(), 123, Duration::from_secs(30)).is_ok());
        assert!(Config::new(String::new(), 123, Duration::from_secs(30)).is_err());
        assert!(Config::new("token".to_string(), 0, Duration::from_secs(30)).is_err());
        assert!(Config::new("token".to_string(), 123, Duration::ZERO).is_err());
    }

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("10us").unwrap(), Duration::from_micros(10));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("5").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("5 seconds").is_err());
        assert!(parse_duration("1d").is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"api_token": "43c48580e5ad47fa820608eca77eb161", "workspace": "123456", "timeout": "5s"}}"#
        )
        .unwrap();

        let config = load_from(file.path()).unwrap();
        assert_eq!(config.api_token, "43c48580e5ad47fa820608eca77eb161");
        assert_eq!(config.workspace_id, 123456);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn load_from_reports_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(load_from(&missing), Err(ConfigError::Read { .. })));

        let malformed = dir.path().join("togglrc");
        fs::write(&malformed, "{not json").unwrap();
        assert!(matches!(load_from(&malformed), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn config_path_prefers_override() {
        let path = resolve_config_path(
            Some(OsString::from("/tmp/custom-rc")),
            Some(PathBuf::from("/home/someone")),
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/tmp/custom-rc"));
    }

    #[test]
    fn config_path_falls_back_to_home() {
        let path =
            resolve_config_path(Some(OsString::new()), Some(PathBuf::from("/home/someone"))).unwrap();
        assert_eq!(path, PathBuf::from("/home/someone/.togglrc"));
        assert!(matches!(resolve_config_path(None, None), Err(ConfigError::NoHome)));
    }
}
