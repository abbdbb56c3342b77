use serde::{Deserialize, Serialize};

/// The signed-in account a session belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    pub role: Role,
}

impl UserProfile {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Farmer,
    Consumer,
    Admin,
    Unknown,
}

impl Role {
    /// Maps the role string stored on the account record. Anything
    /// unrecognised becomes [`Role::Unknown`].
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "farmer" => Role::Farmer,
            "consumer" => Role::Consumer,
            "admin" => Role::Admin,
            _ => Role::Unknown,
        }
    }

    pub fn dashboard(self) -> Dashboard {
        match self {
            Role::Farmer => Dashboard::FarmerTools,
            Role::Consumer => Dashboard::Marketplace,
            Role::Admin => Dashboard::Moderation,
            Role::Unknown => Dashboard::RoleSelection,
        }
    }
}

/// Top-level view a role lands on after login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dashboard {
    /// Listing management, crop diagnosis and the assistant.
    FarmerTools,
    /// Product browsing, cart and checkout.
    Marketplace,
    /// User and content moderation.
    Moderation,
    /// Account has no usable role yet.
    RoleSelection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "hi")]
    Hindi,
    #[serde(rename = "te")]
    Telugu,
}

impl Language {
    /// Unknown codes fall back to English, as the assistant backend does.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "hi" => Language::Hindi,
            "te" => Language::Telugu,
            _ => Language::English,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Telugu => "te",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}
