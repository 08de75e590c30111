use serde::{Deserialize, Serialize};

/// External login: identifies a user at a third-party identity provider
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserLoginInfo {
    pub login_provider: String,
    pub provider_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl UserLoginInfo {
    pub fn new(login_provider: impl Into<String>, provider_key: impl Into<String>) -> Self {
        Self {
            login_provider: login_provider.into(),
            provider_key: provider_key.into(),
            display_name: None,
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}
