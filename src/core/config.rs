//! Session configuration and connection strings

use super::connection_kind::ConnectionKind;
use super::error::{DatabaseError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// What disposing a session does with a still-active transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisposeAction {
    #[default]
    Rollback,
    Commit,
}

/// Configuration for a [`DatabaseSession`](super::session::DatabaseSession)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Timeout in seconds for commands that carry none
    pub command_timeout_secs: Option<u64>,
    /// Open a closed connection for commands outside a transaction
    pub auto_open: bool,
    pub dispose_action: DisposeAction,
    /// Invoke the before-execute hook
    pub log_before_execute: bool,
    /// Invoke the after-build hook
    pub log_after_build: bool,
    /// Session-wide parameter prefix, overriding the dialect's
    pub parameter_prefix: Option<String>,
    /// Bind missing positional values as null output parameters
    pub allow_unbound_outputs: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            command_timeout_secs: None,
            auto_open: true,
            dispose_action: DisposeAction::Rollback,
            log_before_execute: false,
            log_after_build: false,
            parameter_prefix: None,
            allow_unbound_outputs: false,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| DatabaseError::invalid_argument(format!("invalid session config: {}", e)))
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout_secs = Some(timeout.as_secs());
        self
    }

    pub fn with_auto_open(mut self, auto_open: bool) -> Self {
        self.auto_open = auto_open;
        self
    }

    pub fn with_dispose_action(mut self, action: DisposeAction) -> Self {
        self.dispose_action = action;
        self
    }

    pub fn with_log_before_execute(mut self, enabled: bool) -> Self {
        self.log_before_execute = enabled;
        self
    }

    pub fn with_log_after_build(mut self, enabled: bool) -> Self {
        self.log_after_build = enabled;
        self
    }

    pub fn with_parameter_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.parameter_prefix = Some(prefix.into());
        self
    }

    pub fn with_unbound_outputs(mut self, allow: bool) -> Self {
        self.allow_unbound_outputs = allow;
        self
    }

    /// Default command timeout as a duration
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}

/// Connection string builder
pub struct ConnectionBuilder {
    kind: ConnectionKind,
    host: Option<String>,
    port: Option<u16>,
    database: Option<String>,
    username: Option<String>,
    password: Option<String>,
    options: BTreeMap<String, String>,
}

impl ConnectionBuilder {
    pub fn new(kind: ConnectionKind) -> Self {
        Self {
            kind,
            host: None,
            port: None,
            database: None,
            username: None,
            password: None,
            options: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> ConnectionKind {
        self.kind
    }

    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Database name, or the file path for file-based engines
    pub fn database<S: Into<String>>(mut self, database: S) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn username<S: Into<String>>(mut self, username: S) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password<S: Into<String>>(mut self, password: S) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Add a driver option, appended verbatim
    pub fn option<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Render the connection string for the kind's driver
    pub fn build_connection_string(&self) -> String {
        if self.kind.is_odbc() {
            return self.odbc_string();
        }
        match self.kind.base() {
            ConnectionKind::Sqlite => self
                .database
                .clone()
                .unwrap_or_else(|| ":memory:".to_string()),
            ConnectionKind::Postgres => {
                let mut parts = Vec::new();
                if let Some(host) = &self.host {
                    parts.push(format!("host={}", host));
                }
                if let Some(port) = self.port {
                    parts.push(format!("port={}", port));
                }
                if let Some(database) = &self.database {
                    parts.push(format!("dbname={}", database));
                }
                if let Some(username) = &self.username {
                    parts.push(format!("user={}", username));
                }
                if let Some(password) = &self.password {
                    parts.push(format!("password={}", password));
                }
                for (key, value) in &self.options {
                    parts.push(format!("{}={}", key, value));
                }
                parts.join(" ")
            }
            ConnectionKind::MySql => {
                let host = self.host.as_deref().unwrap_or("localhost");
                let port = self.port.unwrap_or(3306);
                let database = self.database.as_deref().unwrap_or("");
                let username = self.username.as_deref().unwrap_or("root");
                let password = self.password.as_deref().unwrap_or("");
                let mut url = format!(
                    "mysql://{}:{}@{}:{}/{}",
                    username, password, host, port, database
                );
                if !self.options.is_empty() {
                    let query: Vec<String> =
                        self.options.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                    url.push('?');
                    url.push_str(&query.join("&"));
                }
                url
            }
            ConnectionKind::Oracle => {
                let host = self.host.as_deref().unwrap_or("localhost");
                let port = self.port.unwrap_or(1521);
                let service = self.database.as_deref().unwrap_or("");
                self.key_values(vec![
                    ("Data Source", Some(format!("{}:{}/{}", host, port, service))),
                    ("User Id", self.username.clone()),
                    ("Password", self.password.clone()),
                ])
            }
            ConnectionKind::Access => self.key_values(vec![
                ("Provider", Some("Microsoft.ACE.OLEDB.12.0".to_string())),
                ("Data Source", self.database.clone()),
                ("Password", self.password.clone()),
            ]),
            _ => {
                let server = match (&self.host, self.port) {
                    (Some(host), Some(port)) => Some(format!("{},{}", host, port)),
                    (Some(host), None) => Some(host.clone()),
                    (None, _) => None,
                };
                self.key_values(vec![
                    ("Server", server),
                    ("Database", self.database.clone()),
                    ("User Id", self.username.clone()),
                    ("Password", self.password.clone()),
                ])
            }
        }
    }

    fn odbc_string(&self) -> String {
        let driver = match self.kind.base() {
            ConnectionKind::MsSql => "ODBC Driver 18 for SQL Server",
            ConnectionKind::MySql => "MySQL ODBC 8.0 Unicode Driver",
            ConnectionKind::Postgres => "PostgreSQL Unicode",
            ConnectionKind::Sqlite => "SQLite3 ODBC Driver",
            ConnectionKind::Oracle => "Oracle ODBC Driver",
            ConnectionKind::Db2 => "IBM DB2 ODBC DRIVER",
            ConnectionKind::Sybase => "Adaptive Server Enterprise",
            ConnectionKind::Firebird => "Firebird/InterBase(r) driver",
            ConnectionKind::Informix => "IBM INFORMIX ODBC DRIVER",
            _ => "Microsoft Access Driver (*.mdb, *.accdb)",
        };
        self.key_values(vec![
            ("Driver", Some(format!("{{{}}}", driver))),
            ("Server", self.host.clone()),
            ("Port", self.port.map(|p| p.to_string())),
            ("Database", self.database.clone()),
            ("Uid", self.username.clone()),
            ("Pwd", self.password.clone()),
        ])
    }

    fn key_values(&self, pairs: Vec<(&str, Option<String>)>) -> String {
        let mut out = String::new();
        let options = self.options.iter().map(|(k, v)| (k.as_str(), Some(v.clone())));
        for (key, value) in pairs.into_iter().chain(options) {
            if let Some(value) = value {
                out.push_str(&format!("{}={};", key, value));
            }
        }
        out
    }
}
