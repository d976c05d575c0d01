//! Shared test helpers: a recording mock of the Koyeb platform and
//! helpers to build handler dependencies around it.

#![allow(dead_code)]

use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;

use koyeb_bot::bot::BotDeps;
use koyeb_bot::koyeb::AppPlatform;
use koyeb_bot::koyeb_errors::KoyebError;

/// Records every call made against it; optionally fails authentication
/// or every non-auth action.
#[derive(Default)]
pub struct MockPlatform {
    calls: StdMutex<Vec<String>>,
    pub fail_auth: bool,
    pub fail_actions: bool,
}

impl MockPlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_auth() -> Arc<Self> {
        Arc::new(Self {
            fail_auth: true,
            ..Self::default()
        })
    }

    pub fn failing_actions() -> Arc<Self> {
        Arc::new(Self {
            fail_actions: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn action_result(&self) -> Result<(), KoyebError> {
        if self.fail_actions {
            Err(KoyebError::Api {
                status: 500,
                body: "boom".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AppPlatform for MockPlatform {
    async fn authenticate(&self, api_key: &str) -> Result<String, KoyebError> {
        self.record(format!("authenticate {api_key}"));
        if self.fail_auth {
            Err(KoyebError::Auth("invalid API key".to_string()))
        } else {
            Ok(format!("token-{api_key}"))
        }
    }

    async fn create_app(&self, _token: &str, name: &str) -> Result<String, KoyebError> {
        self.record(format!("create_app {name}"));
        if self.fail_actions {
            Err(KoyebError::Api {
                status: 500,
                body: "boom".to_string(),
            })
        } else {
            Ok(format!("app-{name}"))
        }
    }

    async fn delete_app(&self, _token: &str, app_id: &str) -> Result<(), KoyebError> {
        self.record(format!("delete_app {app_id}"));
        self.action_result()
    }

    async fn list_apps(&self, _token: &str) -> Result<String, KoyebError> {
        self.record("list_apps".to_string());
        Ok("apps: one, two".to_string())
    }

    async fn get_app(&self, _token: &str, app_id: &str) -> Result<String, KoyebError> {
        self.record(format!("get_app {app_id}"));
        if self.fail_actions {
            Err(KoyebError::Api {
                status: 404,
                body: "no such app".to_string(),
            })
        } else {
            Ok(format!("app {app_id}: healthy"))
        }
    }

    async fn deploy(&self, _token: &str, app_id: &str) -> Result<(), KoyebError> {
        self.record(format!("deploy {app_id}"));
        self.action_result()
    }

    async fn redeploy(&self, _token: &str, app_id: &str) -> Result<(), KoyebError> {
        self.record(format!("redeploy {app_id}"));
        self.action_result()
    }

    async fn get_logs(&self, _token: &str, app_id: &str) -> Result<String, KoyebError> {
        self.record(format!("get_logs {app_id}"));
        Ok("log line 1\nlog line 2".to_string())
    }

    async fn get_env_vars(&self, _token: &str, app_id: &str) -> Result<String, KoyebError> {
        self.record(format!("get_env_vars {app_id}"));
        Ok("PORT=8080".to_string())
    }

    async fn get_env_var(
        &self,
        _token: &str,
        app_id: &str,
        key: &str,
    ) -> Result<String, KoyebError> {
        self.record(format!("get_env_var {app_id} {key}"));
        Ok(format!("{key}=8080"))
    }

    async fn set_env_var(
        &self,
        _token: &str,
        app_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), KoyebError> {
        self.record(format!("set_env_var {app_id} {key}={value}"));
        self.action_result()
    }

    async fn delete_env_var(
        &self,
        _token: &str,
        app_id: &str,
        key: &str,
    ) -> Result<(), KoyebError> {
        self.record(format!("delete_env_var {app_id} {key}"));
        self.action_result()
    }
}

/// Dependencies backed by the given mock, without persistence.
pub fn deps_with(platform: Arc<MockPlatform>) -> BotDeps {
    BotDeps::new(platform, None)
}

/// Put a chat's session directly into a logged-in state with an app
/// selected, bypassing the login flow.
pub async fn log_in_with_app(deps: &BotDeps, chat_id: i64, app_id: &str) {
    deps.sessions
        .update(chat_id, |session| {
            session.log_in("token-test".to_string());
            session.selected_app_id = Some(app_id.to_string());
            session.hydrated = true;
        })
        .await;
}
