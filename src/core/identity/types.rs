// src/core/identity/types.rs
use serde::{Serialize, Deserialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Admin,
    SecurityEngineer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
            Role::SecurityEngineer => "SECURITY_ENGINEER",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateAlgorithm {
    #[serde(rename = "FaceID_v4")]
    FaceIdV4,
    #[serde(rename = "Fingerprint_SHA256")]
    FingerprintSha256,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiometricTemplate {
    pub id: Uuid,
    pub identity_id: Uuid,
    pub algorithm: TemplateAlgorithm,
    pub embedding: Vec<f64>,
    pub salt: String,
    pub data_hash: String,
    pub encrypted_data: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub enrolled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<BiometricTemplate>,
}

impl Identity {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            role,
            enrolled: false,
            template: None,
        }
    }

    pub fn attach_template(&mut self, template: BiometricTemplate) {
        self.template = Some(template);
        self.enrolled = true;
    }
}
