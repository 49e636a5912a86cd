// Common test utilities and helpers for all test modules

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

use whisper_inbox::api::AppState;
use whisper_inbox::config::Config;
use whisper_inbox::core::credentials::{hash_password, Password};
use whisper_inbox::core::errors::InboxError;
use whisper_inbox::core::models::{NewUser, UserId};
use whisper_inbox::engine::mailer::CodeMailer;
use whisper_inbox::state::memory_store::MemoryStore;
use whisper_inbox::state::UserDirectory;

pub const TEST_PASSWORD: &str = "correct horse";

/// A code handed to a mailer
#[derive(Debug, Clone)]
pub struct SentCode {
    pub email: String,
    pub username: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Mailer that keeps every code it is asked to send
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentCode>>,
}

impl RecordingMailer {
    pub fn last_code_for(&self, username: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|sent| sent.username == username)
            .map(|sent| sent.code.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl CodeMailer for RecordingMailer {
    async fn send_verification_code(
        &self,
        email: &str,
        username: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), InboxError> {
        self.sent.lock().unwrap().push(SentCode {
            email: email.to_string(),
            username: username.to_string(),
            code: code.to_string(),
            expires_at,
        });
        Ok(())
    }
}

/// Mailer whose transport is always down
pub struct FailingMailer;

#[async_trait]
impl CodeMailer for FailingMailer {
    async fn send_verification_code(
        &self,
        _email: &str,
        _username: &str,
        _code: &str,
        _expires_at: DateTime<Utc>,
    ) -> Result<(), InboxError> {
        Err(InboxError::DeliveryFailed("smtp unreachable".to_string()))
    }
}

/// Everything a test needs to drive the services and peek at the store
pub struct TestHarness {
    pub app_state: AppState,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
}

pub fn harness() -> TestHarness {
    harness_with_config(Config::test_config())
}

pub fn harness_with_config(config: Config) -> TestHarness {
    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(RecordingMailer::default());
    let app_state = AppState::new(config, store.clone(), store.clone(), mailer.clone())
        .expect("app state should build");
    TestHarness {
        app_state,
        store,
        mailer,
    }
}

/// A pending user inserted straight into the store with a chosen expiry
pub async fn insert_pending_user(
    store: &MemoryStore,
    username: &str,
    code: &str,
    expires_at: DateTime<Utc>,
) -> UserId {
    let password_hash = hash_password(&Password::new(TEST_PASSWORD)).unwrap();
    store
        .create_unverified_user(NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash,
            verify_code: code.to_string(),
            verify_code_expiry: expires_at,
        })
        .await
        .unwrap()
}

/// Register through the service and verify with the code the mailer saw
pub async fn register_verified(harness: &TestHarness, username: &str) -> UserId {
    let user_id = harness
        .app_state
        .registrar
        .register(
            username,
            &format!("{}@example.com", username),
            Password::new(TEST_PASSWORD),
        )
        .await
        .unwrap();
    let code = harness.mailer.last_code_for(username).unwrap();
    harness.app_state.verifier.verify(username, &code).await.unwrap();
    user_id
}

pub fn in_an_hour() -> DateTime<Utc> {
    Utc::now() + Duration::hours(1)
}

pub fn an_hour_ago() -> DateTime<Utc> {
    Utc::now() - Duration::hours(1)
}
