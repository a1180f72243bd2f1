//! Shared fixtures for unit tests: token builders, NLU stubs and a route
//! catalog.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use proptest::prelude::*;

use crate::identity::Role;
use crate::navigation::SiteRoute;
use crate::nlu::{Nlu, NluError};

/// Plain token: standard base64 of the claims JSON.
pub fn plain_token(claims: &str) -> String {
    STANDARD.encode(claims)
}

/// Compact token: `header.payload.signature` with an unpadded URL-safe
/// payload.
pub fn compact_token(claims: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims);
    format!("{header}.{payload}.c2ln")
}

/// Plain token for a user holding exactly `role`.
pub fn role_token(role: &str) -> String {
    plain_token(&format!(r#"{{"email":"user@school.test","roles":["{role}"]}}"#))
}

/// Path tails appended to an area prefix: empty or a few lowercase segments.
pub fn arb_path_suffix() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,8}", 0..4).prop_map(|segments| {
        segments
            .iter()
            .map(|s| format!("/{s}"))
            .collect::<String>()
    })
}

/// Always answers with the same text, optionally after a delay.
pub struct StaticNlu {
    reply: String,
    delay: Option<Duration>,
}

impl StaticNlu {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Nlu for StaticNlu {
    async fn translate_text(&self, _prompt: &str) -> Result<String, NluError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.reply.clone())
    }
}

/// Answers with a fixed text and keeps every prompt it was sent.
pub struct RecordingNlu {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl RecordingNlu {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Nlu for RecordingNlu {
    async fn translate_text(&self, prompt: &str) -> Result<String, NluError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

/// Never reachable.
pub struct FailingNlu;

#[async_trait]
impl Nlu for FailingNlu {
    async fn translate_text(&self, _prompt: &str) -> Result<String, NluError> {
        Err(NluError::Transport("connection refused".to_string()))
    }
}

/// A small dashboard catalog with overlapping page names across roles.
pub fn school_catalog() -> Vec<SiteRoute> {
    vec![
        SiteRoute::new("/admin", "Dashboard", "Admin overview", Role::Admin),
        SiteRoute::new("/admin/students", "Students", "Manage all students", Role::Admin),
        SiteRoute::new("/admin/teachers", "Teachers", "Manage teaching staff", Role::Admin),
        SiteRoute::new("/admin/classes", "Classes", "All classes in the school", Role::Admin),
        SiteRoute::new("/teacher", "Dashboard", "Teacher overview", Role::Teacher),
        SiteRoute::new("/teacher/students", "Students", "Students in your classes", Role::Teacher),
        SiteRoute::new("/teacher/classes", "Classes", "Classes you teach", Role::Teacher),
        SiteRoute::new("/student", "Dashboard", "Student overview", Role::Student),
        SiteRoute::new("/student/grades", "Grades", "Your grades", Role::Student),
        SiteRoute::new("/student/classes", "Classes", "Classes you attend", Role::Student),
    ]
}
