// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Named authentication contexts for cross-session testing.
//!
//! Sessions are registered before a scan starts and are read-only while
//! workers run, so the registry hands out cheap clones instead of guarding
//! the map with a lock.

use std::collections::HashMap;

use crate::utils::{cookie_header_value, parse_cookie_string};

/// A named authentication context: cookies plus optional extra headers
/// (bearer tokens, API keys).
#[derive(Debug, Clone)]
pub struct Session {
    pub name: String,
    pub cookies: Vec<(String, String)>,
    pub headers: HashMap<String, String>,
}

impl Session {
    pub fn new(name: &str, cookie_str: &str) -> Self {
        Self {
            name: name.to_string(),
            cookies: parse_cookie_string(cookie_str),
            headers: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Value for the `Cookie:` request header, or None without cookies.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            None
        } else {
            Some(cookie_header_value(&self.cookies))
        }
    }
}

/// Registry of sessions keyed by name. Populated during initialization.
#[derive(Debug, Default, Clone)]
pub struct SessionManager {
    sessions: HashMap<String, Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_session(&mut self, name: &str, cookie_str: &str) {
        self.sessions
            .insert(name.to_string(), Session::new(name, cookie_str));
    }

    pub fn insert(&mut self, session: Session) {
        self.sessions.insert(session.name.clone(), session);
    }

    pub fn get(&self, name: &str) -> Option<&Session> {
        self.sessions.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.sessions.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
