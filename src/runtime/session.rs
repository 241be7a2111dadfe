//! Continuation tokens and the in-memory conversation store behind them.
//!
//! A completed run hands its caller an opaque [`ContinuationToken`]; passing
//! it to the next `start` resumes the conversation so follow-up turns (and
//! the guardrail judging them) see prior context. The store is bounded and
//! in-memory only: when the bound is hit the oldest conversation is evicted,
//! and an evicted or unknown token simply starts a fresh conversation.

use std::collections::VecDeque;
use std::fmt;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::Message;

/// Opaque handle resuming a prior run's conversation.
///
/// Tokens carry no structure a caller should rely on; today they are v4
/// uuids.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ContinuationToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

struct StoreInner {
    entries: FxHashMap<String, Vec<Message>>,
    order: VecDeque<String>,
}

/// Bounded in-memory map from continuation token to conversation history.
pub struct SessionStore {
    inner: Mutex<StoreInner>,
    capacity: usize,
}

impl SessionStore {
    /// Creates a store holding at most `capacity` conversations.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                entries: FxHashMap::default(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    /// Looks up the conversation behind a token.
    ///
    /// Returns `None` for unknown or evicted tokens. The stored history is
    /// left in place so a token can be resumed more than once.
    #[must_use]
    pub fn resume(&self, token: &ContinuationToken) -> Option<Vec<Message>> {
        self.inner.lock().entries.get(token.as_str()).cloned()
    }

    /// Stores a conversation and returns the token to resume it with.
    ///
    /// Evicts the oldest conversation when the capacity bound is exceeded.
    #[must_use]
    pub fn store(&self, history: Vec<Message>) -> ContinuationToken {
        let token = ContinuationToken::generate();
        let mut inner = self.inner.lock();
        inner.entries.insert(token.as_str().to_string(), history);
        inner.order.push_back(token.as_str().to_string());
        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }
        token
    }

    /// Number of conversations currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
