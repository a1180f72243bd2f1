//! Fixtures shared by the integration suites.
#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use campus_gate::{Nlu, NluError, Role, SiteRoute};

/// Standard base64 of the claims JSON.
pub fn plain_token(claims: &str) -> String {
    STANDARD.encode(claims)
}

/// `header.payload.signature` with an unpadded URL-safe payload.
pub fn compact_token(claims: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    format!("{header}.{}.c2lnbmF0dXJl", URL_SAFE_NO_PAD.encode(claims))
}

pub fn role_token(role: &str) -> String {
    plain_token(&format!(r#"{{"email":"user@school.test","roles":["{role}"]}}"#))
}

/// Answers every prompt with the same text and records the prompts.
pub struct StubNlu {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl StubNlu {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl Nlu for StubNlu {
    async fn translate_text(&self, prompt: &str) -> Result<String, NluError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

/// Always unreachable.
pub struct DownNlu;

#[async_trait]
impl Nlu for DownNlu {
    async fn translate_text(&self, _prompt: &str) -> Result<String, NluError> {
        Err(NluError::Transport("connection refused".to_string()))
    }
}

/// Route catalog with the same page names under every role.
pub fn catalog() -> Vec<SiteRoute> {
    vec![
        SiteRoute::new("/admin", "Home", "Admin dashboard", Role::Admin),
        SiteRoute::new("/admin/students", "Students", "Manage every student", Role::Admin),
        SiteRoute::new("/admin/teachers", "Teachers", "Manage teachers", Role::Admin),
        SiteRoute::new("/teacher", "Home", "Teacher dashboard", Role::Teacher),
        SiteRoute::new("/teacher/students", "Students", "Your students", Role::Teacher),
        SiteRoute::new("/teacher/classes", "Classes", "Your classes", Role::Teacher),
        SiteRoute::new("/student", "Home", "Student dashboard", Role::Student),
        SiteRoute::new("/student/grades", "Grades", "Your grades", Role::Student),
        SiteRoute::new("/student/classes", "Classes", "Your classes", Role::Student),
    ]
}
