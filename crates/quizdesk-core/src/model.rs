//! Wire types shared across the admin console.
//!
//! All entities are owned by the backend; these are transient copies used to
//! render lists and to build request bodies.

use serde::{Deserialize, Serialize};

// ============================================================================
// Users
// ============================================================================

/// A student registered through the Telegram bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend row id.
    pub id: u64,
    /// Telegram identifier, used as the key in every user endpoint.
    pub telegram_id: i64,
    /// Display name (mutable).
    pub name: String,
}

/// Body of the rename endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameUser {
    /// New display name.
    pub name: String,
}

/// Filters students for the send-to-student picker.
///
/// A user matches when `query` is a case-insensitive substring of the name or
/// a substring of the telegram id. A blank query matches everyone.
#[must_use]
pub fn filter_users<'a>(users: &'a [User], query: &str) -> Vec<&'a User> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return users.iter().collect();
    }
    users
        .iter()
        .filter(|u| {
            u.name.to_lowercase().contains(&query) || u.telegram_id.to_string().contains(&query)
        })
        .collect()
}

// ============================================================================
// Trainings ("hand works")
// ============================================================================

/// How the backend should pick questions for a new training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingMode {
    /// Explicit per-tag counts.
    Tags,
    /// Every question carries all given tags; fixed total count.
    HardFilter,
}

/// Request body of the training creation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTrainingRequest {
    /// Training name.
    pub name: String,
    /// Tag to requested count; empty in hard filter mode.
    pub questions: std::collections::BTreeMap<String, u32>,
    /// Selection mode.
    pub mode: TrainingMode,
    /// Tags every question must carry (hard filter only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hard_tags: Option<Vec<String>>,
    /// Total number of questions (hard filter only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions_count: Option<i64>,
}

/// Response of the training creation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedTraining {
    /// Training id.
    pub id: u64,
    /// Stored name.
    pub name: String,
    /// Short identifier students enter in the bot.
    pub identificator: String,
    /// Shareable deep link, when the backend could build one.
    #[serde(default)]
    pub link: Option<String>,
}

impl CreatedTraining {
    /// What to hand to the administrator for copying: the link when present,
    /// otherwise the identifier.
    #[must_use]
    pub fn share_target(&self) -> &str {
        self.link.as_deref().unwrap_or(&self.identificator)
    }
}

/// A row of the training list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandWork {
    /// Training id.
    pub id: u64,
    /// Name.
    pub name: String,
    /// Short identifier.
    pub identificator: String,
    /// Creation timestamp as sent by the backend.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Number of selected questions.
    #[serde(default)]
    pub questions_count: u32,
    /// Shareable link.
    #[serde(default)]
    pub link: Option<String>,
}

/// Body of the send-to-student endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendTrainingRequest {
    /// Recipient.
    pub telegram_id: i64,
    /// Link to deliver.
    pub link: String,
    /// Training name shown in the message.
    pub name: String,
}

impl SendTrainingRequest {
    /// Builds the request for a freshly created training.
    #[must_use]
    pub fn for_training(training: &CreatedTraining, telegram_id: i64) -> Self {
        Self {
            telegram_id,
            link: training.share_target().to_string(),
            name: training.name.clone(),
        }
    }
}

// ============================================================================
// Generic responses
// ============================================================================

/// `{ "ok": true }` acknowledgement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OkResponse {
    /// Whether the backend applied the change.
    #[serde(default)]
    pub ok: bool,
}

/// Acknowledgement carrying a human-readable message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Whether the backend applied the change.
    #[serde(default)]
    pub ok: bool,
    /// Localized message.
    #[serde(default)]
    pub message: String,
}

/// Result of an Excel bulk import into the pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    /// Whether the import ran.
    #[serde(default)]
    pub ok: bool,
    /// Number of imported questions.
    #[serde(default)]
    pub imported_count: u32,
    /// Localized summary.
    #[serde(default)]
    pub message: String,
}

/// Response of the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token.
    pub token: String,
}

/// Body of the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Admin password.
    pub password: String,
}
