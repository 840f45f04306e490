//! In-memory conversation store keyed by conversation id.
//!
//! The store is owned by one task and takes `&mut self` for every mutation, so
//! each conversation has exactly one writer. Independent conversations share
//! nothing.

mod validate;

pub use validate::validate_message;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::dialogue::DialogueEngine;
use crate::error::Result;
use crate::models::config::ScatterConfig;
use crate::models::message::{ChatRequest, ChatResponse};

struct Session {
    engine: DialogueEngine,
    last_touched: Instant,
}

/// Conversations by id, with idle expiry and a size cap.
pub struct ConversationStore {
    sessions: HashMap<String, Session>,
    config: ScatterConfig,
    clock: Arc<dyn Clock>,
}

impl ConversationStore {
    pub fn new(config: ScatterConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: ScatterConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: HashMap::new(),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &ScatterConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn contains(&self, conversation_id: &str) -> bool {
        self.sessions.contains_key(conversation_id)
    }

    /// The engine for a conversation, if it is still held.
    pub fn get(&self, conversation_id: &str) -> Option<&DialogueEngine> {
        self.sessions.get(conversation_id).map(|session| &session.engine)
    }

    /// Validate a request and route it to its conversation.
    pub fn handle(&mut self, request: ChatRequest) -> Result<ChatResponse> {
        self.handle_at(request, Instant::now())
    }

    /// [`handle`](Self::handle) with an explicit "now" for expiry bookkeeping.
    ///
    /// A missing, null or unknown `conversation_id` starts a new conversation;
    /// the response carries its id.
    pub fn handle_at(&mut self, request: ChatRequest, now: Instant) -> Result<ChatResponse> {
        let message = validate_message(&request.message, self.config.input.max_message_length)?;

        let id = match request.conversation_id {
            Some(id) if self.sessions.contains_key(&id) => id,
            requested => {
                if let Some(unknown) = requested {
                    debug!(conversation_id = %unknown, "unknown conversation; starting a new one");
                }
                self.make_room();
                Uuid::new_v4().to_string()
            }
        };

        let dialogue = &self.config.dialogue;
        let clock = &self.clock;
        let session = self.sessions.entry(id).or_insert_with_key(|id| {
            info!(conversation_id = %id, "conversation started");
            Session {
                engine: DialogueEngine::from_config(dialogue, Arc::clone(clock))
                    .with_conversation_id(id.clone()),
                last_touched: now,
            }
        });

        session.last_touched = now;
        Ok(session.engine.process_message(&message))
    }

    /// Parse a JSON body and handle it.
    pub fn handle_json(&mut self, body: &str) -> Result<ChatResponse> {
        let request = ChatRequest::from_json(body).inspect_err(|e| {
            warn!(error = %e, "request rejected");
        })?;
        self.handle(request)
    }

    /// Start a new conversation in place of `conversation_id`.
    ///
    /// The old id is dropped; the new one is returned. `None` if the id is not
    /// held.
    pub fn reset(&mut self, conversation_id: &str) -> Option<String> {
        let mut session = self.sessions.remove(conversation_id)?;
        let new_id = session.engine.reset().to_string();
        session.last_touched = Instant::now();
        self.sessions.insert(new_id.clone(), session);
        Some(new_id)
    }

    /// Drop a conversation outright.
    pub fn remove(&mut self, conversation_id: &str) -> Option<DialogueEngine> {
        self.sessions
            .remove(conversation_id)
            .map(|session| session.engine)
    }

    /// Drop conversations idle for longer than the configured TTL. Returns how
    /// many were removed.
    pub fn evict_expired(&mut self, now: Instant) -> usize {
        let ttl = Duration::from_secs(self.config.sessions.ttl_secs);
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| now.saturating_duration_since(session.last_touched) <= ttl);

        let evicted = before - self.sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = self.sessions.len(), "expired conversations evicted");
        }
        evicted
    }

    fn make_room(&mut self) {
        let max_sessions = self.config.sessions.max_sessions;
        if max_sessions == 0 {
            return;
        }
        while self.sessions.len() >= max_sessions && self.evict_least_recent() {}
    }

    fn evict_least_recent(&mut self) -> bool {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|(_, session)| session.last_touched)
            .map(|(id, _)| id.clone());

        match oldest {
            Some(id) => {
                info!(conversation_id = %id, "session cap reached; evicting least recent");
                self.sessions.remove(&id);
                true
            }
            None => false,
        }
    }
}
