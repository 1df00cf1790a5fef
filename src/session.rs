//! Per-shopper session context.
//!
//! Carries the identifiers and tokens a storefront client needs and the
//! shopper's recent searches. It is handed to whatever needs it instead of
//! being looked up from process-wide state.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

pub const GUEST_SESSION: &str = "guest";
pub const SESSION_HEADER: &str = "x-session-id";
pub const RECENT_SEARCH_LIMIT: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    session_id: String,
    auth_token: Option<String>,
    admin_token: Option<String>,
    recent_searches: VecDeque<String>,
}

impl Default for SessionContext {
    fn default() -> Self { Self::new(Uuid::new_v4().to_string()) }
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self { session_id: session_id.into(), auth_token: None, admin_token: None, recent_searches: VecDeque::new() }
    }

    pub fn guest() -> Self { Self::new(GUEST_SESSION) }

    pub fn session_id(&self) -> &str { &self.session_id }
    pub fn auth_token(&self) -> Option<&str> { self.auth_token.as_deref() }
    pub fn admin_token(&self) -> Option<&str> { self.admin_token.as_deref() }
    pub fn is_authenticated(&self) -> bool { self.auth_token.is_some() }
    pub fn is_admin(&self) -> bool { self.admin_token.is_some() }

    pub fn sign_in(&mut self, token: impl Into<String>) { self.auth_token = Some(token.into()); }
    pub fn grant_admin(&mut self, token: impl Into<String>) { self.admin_token = Some(token.into()); }

    pub fn sign_out(&mut self) {
        self.auth_token = None;
        self.admin_token = None;
    }

    pub fn recent_searches(&self) -> impl Iterator<Item = &str> { self.recent_searches.iter().map(String::as_str) }

    /// Most recent first, no case-insensitive duplicates, at most
    /// [`RECENT_SEARCH_LIMIT`] entries. Blank queries are ignored.
    pub fn record_search(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() { return; }
        self.recent_searches.retain(|q| !q.eq_ignore_ascii_case(query));
        self.recent_searches.push_front(query.to_string());
        self.recent_searches.truncate(RECENT_SEARCH_LIMIT);
    }

    pub fn clear_searches(&mut self) { self.recent_searches.clear(); }
}
