//! Session records held on behalf of authenticated users

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::masking::mask_cookie;

/// Most period contexts a single record tracks
pub const MAX_TRACKED_PERIODS: usize = 10;

/// Cookies issued by a portal, kept as a `Cookie` header value (`a=1; b=2`).
///
/// `Debug` and `Display` never print cookie values.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CookieSet(String);

impl CookieSet {
    pub fn new(header_value: impl Into<String>) -> Self {
        Self(header_value.into())
    }

    /// Build a cookie set from `(name, value)` pairs, later names replacing earlier ones
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut ordered: Vec<(String, String)> = Vec::new();
        for (name, value) in pairs {
            let name = name.into();
            let value = value.into();
            match ordered.iter_mut().find(|(existing, _)| *existing == name) {
                Some(slot) => slot.1 = value,
                None => ordered.push((name, value)),
            }
        }
        Self(
            ordered
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Raw header value, for the connectors only
    pub fn header_value(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Iterate over `(name, value)` pairs
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .split(';')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.split_once('=').unwrap_or((part, "")))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Merge another set into this one; cookies of `other` win on name clashes
    pub fn merged_with(&self, other: &CookieSet) -> CookieSet {
        CookieSet::from_pairs(self.pairs().chain(other.pairs()))
    }
}

impl fmt::Debug for CookieSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CookieSet").field(&mask_cookie(&self.0)).finish()
    }
}

impl fmt::Display for CookieSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", mask_cookie(&self.0))
    }
}

/// Progress of the registration portal login that follows every primary login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SecondaryLoginState {
    /// Handshake still running in the background
    #[default]
    Pending,
    Established,
    Failed,
    /// Was established, but the portal later bounced a request to its login page
    Expired,
}

/// Registration-round ids captured when a period's details were loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodContext {
    pub period_id: String,
    pub round_id: String,
    pub round_student_id: String,
}

/// Everything held server-side for one login
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub token: String,
    pub username: String,
    /// User-info snapshot returned by the identity portal
    pub profile: Option<Value>,
    pub primary_cookies: CookieSet,
    pub bearer_token: Option<String>,
    pub secondary_cookies: Option<CookieSet>,
    pub secondary: SecondaryLoginState,
    pub periods: HashMap<String, PeriodContext>,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Create a record right after a successful primary login
    pub fn new(
        token: impl Into<String>,
        username: impl Into<String>,
        primary_cookies: CookieSet,
        bearer_token: Option<String>,
        profile: Option<Value>,
    ) -> Self {
        let now = Utc::now();
        Self {
            token: token.into(),
            username: username.into(),
            profile,
            primary_cookies,
            bearer_token,
            secondary_cookies: None,
            secondary: SecondaryLoginState::Pending,
            periods: HashMap::new(),
            created_at: now,
            last_accessed_at: now,
        }
    }

    pub fn secondary_logged_in(&self) -> bool {
        self.secondary == SecondaryLoginState::Established && self.secondary_cookies.is_some()
    }

    /// Apply an update. Each variant replaces whole fields.
    pub fn apply(&mut self, update: SessionUpdate) {
        match update {
            SessionUpdate::SecondaryEstablished(cookies) => {
                self.secondary_cookies = Some(cookies);
                self.secondary = SecondaryLoginState::Established;
            }
            SessionUpdate::SecondaryFailed => {
                self.secondary_cookies = None;
                self.secondary = SecondaryLoginState::Failed;
            }
            SessionUpdate::SecondaryExpired => {
                self.secondary_cookies = None;
                self.secondary = SecondaryLoginState::Expired;
                self.periods.clear();
            }
            SessionUpdate::SecondaryCookies(cookies) => {
                if self.secondary == SecondaryLoginState::Established {
                    self.secondary_cookies = Some(cookies);
                }
            }
            SessionUpdate::Period(context) => {
                // Reloading a known period always refreshes its ids
                if self.periods.len() < MAX_TRACKED_PERIODS
                    || self.periods.contains_key(&context.period_id)
                {
                    self.periods.insert(context.period_id.clone(), context);
                }
            }
            SessionUpdate::Profile(profile) => {
                self.profile = Some(profile);
            }
        }
    }
}

/// Mutations the orchestrator may apply to a record it created
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    SecondaryEstablished(CookieSet),
    SecondaryFailed,
    SecondaryExpired,
    /// Cookies refreshed by a registration portal call
    SecondaryCookies(CookieSet),
    Period(PeriodContext),
    /// Fresh user-info snapshot from the identity portal
    Profile(Value),
}
