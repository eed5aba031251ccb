use serde::{Deserialize, Serialize};

/// A client record as returned by `GET /clients`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// Server-assigned identifier
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Client {
    /// Minimal client with only the required fields set
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Client {
            id: id.into(),
            name: name.into(),
            email: None,
            phone: None,
            company: None,
            notes: None,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Body for `POST /clients` and `PUT /clients/{id}`.
///
/// Optional fields serialize as `null` when unset so an edit can clear them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientPayload {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub notes: Option<String>,
}
