use crate::config::ManagerConfig;
use crate::error::{Error, Result};
use serde_json::Value;

/// Access to the manager's REST API.
///
/// The reconciliation core only ever needs JSON in and JSON out, so the seam
/// is two methods; tests implement it with scripted responses instead of a
/// live endpoint.
pub trait ManagerClient {
    /// GET a path relative to the versioned API base.
    fn get(&self, path: &str) -> Result<Value>;

    /// POST a path relative to the versioned API base, with an optional JSON
    /// body. A rejected or failed submission is an error carrying the
    /// serialized body.
    fn post(&self, path: &str, body: Option<&Value>) -> Result<Value>;
}

/// Blocking HTTP implementation against a live manager.
pub struct HttpManagerClient {
    base_url: String,
    username: String,
    password: String,
    http: reqwest::blocking::Client,
}

impl HttpManagerClient {
    pub fn new(config: &ManagerConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent("nodectl")
            .danger_accept_invalid_certs(!config.validate_certs)
            .build()
            .map_err(|e| Error::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url(),
            username: config.username.clone(),
            password: config.password.clone(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl ManagerClient for HttpManagerClient {
    fn get(&self, path: &str) -> Result<Value> {
        let response = self
            .http
            .get(self.url(path))
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/json")
            .send()
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(Error::Transport(format!("HTTP {}: {}", status, text)));
        }

        response
            .json()
            .map_err(|e| Error::Transport(format!("Invalid JSON response: {}", e)))
    }

    fn post(&self, path: &str, body: Option<&Value>) -> Result<Value> {
        let serialized = body.map(Value::to_string).unwrap_or_default();
        let remote = |cause: String| Error::Remote {
            body: serialized.clone(),
            cause,
        };

        let mut request = self
            .http
            .post(self.url(path))
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/json")
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().map_err(|e| remote(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(remote(format!("HTTP {}: {}", status, text)));
        }

        // Delete responses can have an empty body; treat that as null.
        let text = response.text().map_err(|e| remote(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| remote(format!("Invalid JSON response: {}", e)))
    }
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Scripted stand-in for a live manager. Responses are consumed in
    /// order; calls are recorded for assertion.
    #[derive(Default)]
    pub struct ScriptedClient {
        get_responses: RefCell<VecDeque<Result<Value>>>,
        post_responses: RefCell<VecDeque<Result<Value>>>,
        pub get_calls: RefCell<Vec<String>>,
        pub post_calls: RefCell<Vec<(String, Option<Value>)>>,
    }

    impl ScriptedClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_get(&self, response: Result<Value>) {
            self.get_responses.borrow_mut().push_back(response);
        }

        pub fn push_post(&self, response: Result<Value>) {
            self.post_responses.borrow_mut().push_back(response);
        }

        pub fn get_count(&self) -> usize {
            self.get_calls.borrow().len()
        }

        pub fn post_count(&self) -> usize {
            self.post_calls.borrow().len()
        }
    }

    impl ManagerClient for ScriptedClient {
        fn get(&self, path: &str) -> Result<Value> {
            self.get_calls.borrow_mut().push(path.to_string());
            self.get_responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| {
                    Err(Error::Transport(format!("no scripted GET for {}", path)))
                })
        }

        fn post(&self, path: &str, body: Option<&Value>) -> Result<Value> {
            self.post_calls
                .borrow_mut()
                .push((path.to_string(), body.cloned()));
            self.post_responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| {
                    Err(Error::Transport(format!("no scripted POST for {}", path)))
                })
        }
    }
}
