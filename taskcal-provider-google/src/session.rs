//! Google credential capability.
//!
//! A session is stored at ~/.config/taskcal/providers/google/session.toml
//! (owner-only on unix). It is in one of three states:
//!   Unauthenticated  no session file
//!   Authenticated    access token still valid
//!   Expired          access token past `expires_at`
//!
//! `SessionState::action` decides the transition: interactive consent from
//! Unauthenticated, a token refresh from Expired, consent again when an
//! expired session has no refresh token. `Session::ensure_authenticated`
//! carries it out.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use google_calendar::{AccessToken, Client};
use serde::{Deserialize, Serialize};

use crate::app_config::{self, Credentials, base_dir};
use crate::oauth;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// Account identifier, the primary calendar's summary (the user's email)
    pub account: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, PartialEq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated(SessionData),
    Expired(SessionData),
}

/// What `Session::ensure_authenticated` has to do for a given state.
#[derive(Debug, PartialEq)]
pub enum SessionAction {
    Reuse(SessionData),
    Refresh(SessionData),
    Bootstrap,
}

impl SessionState {
    pub fn action(self) -> SessionAction {
        match self {
            SessionState::Authenticated(data) => SessionAction::Reuse(data),
            SessionState::Expired(data) if !data.refresh_token.is_empty() => {
                SessionAction::Refresh(data)
            }
            SessionState::Expired(_) | SessionState::Unauthenticated => SessionAction::Bootstrap,
        }
    }
}

/// Token fields of an OAuth token response.
#[derive(Debug, Clone)]
pub struct Grant {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

impl From<AccessToken> for Grant {
    fn from(tokens: AccessToken) -> Self {
        Grant {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
        }
    }
}

impl SessionData {
    pub fn from_grant(account: &str, tokens: &Grant, now: DateTime<Utc>) -> Self {
        SessionData {
            account: account.to_string(),
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            expires_at: now + Duration::seconds(tokens.expires_in),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Apply a refresh response. Google usually omits the refresh token on
    /// refresh, in which case the stored one is kept.
    pub fn refreshed(&self, tokens: &Grant, now: DateTime<Utc>) -> Self {
        let refresh_token = if tokens.refresh_token.is_empty() {
            self.refresh_token.clone()
        } else {
            tokens.refresh_token.clone()
        };

        SessionData {
            account: self.account.clone(),
            access_token: tokens.access_token.clone(),
            refresh_token,
            expires_at: now + Duration::seconds(tokens.expires_in),
        }
    }
}

/// Where the session lives on disk.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn default_location() -> Result<Self> {
        Ok(Self::at(base_dir()?.join("session.toml")))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        SessionStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<SessionData>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path).with_context(|| {
            format!("Failed to read Google session from {}", self.path.display())
        })?;

        let data = toml::from_str(&contents).with_context(|| {
            format!("Failed to parse Google session from {}", self.path.display())
        })?;

        Ok(Some(data))
    }

    pub fn state(&self, now: DateTime<Utc>) -> Result<SessionState> {
        Ok(match self.load()? {
            None => SessionState::Unauthenticated,
            Some(data) if data.is_expired_at(now) => SessionState::Expired(data),
            Some(data) => SessionState::Authenticated(data),
        })
    }

    pub fn save(&self, data: &SessionData) -> Result<()> {
        let contents = toml::to_string_pretty(data).context("Failed to serialize session")?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write session to {}", self.path.display()))?;

        // Owner-only: the file holds OAuth tokens
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to set permissions on {}", self.path.display()))?;
        }

        Ok(())
    }
}

/// An authenticated session, ready to call the Calendar API.
pub struct Session {
    creds: Credentials,
    data: SessionData,
}

impl Session {
    /// Load the stored session, refreshing or bootstrapping it as needed.
    pub async fn ensure_authenticated() -> Result<Self> {
        let creds = app_config::load()?;
        let store = SessionStore::default_location()?;
        tracing::debug!(path = %store.path().display(), "Loading Google session");

        let data = match store.state(Utc::now())?.action() {
            SessionAction::Reuse(data) => data,
            SessionAction::Refresh(data) => {
                tracing::debug!(account = %data.account, "Refreshing expired access token");
                let data = refresh(&creds, &data).await?;
                store.save(&data)?;
                data
            }
            SessionAction::Bootstrap => {
                let data = oauth::bootstrap(&creds).await?;
                store.save(&data)?;
                data
            }
        };

        Ok(Session { creds, data })
    }

    pub fn account(&self) -> &str {
        &self.data.account
    }

    pub fn client(&self) -> Client {
        Client::new(
            self.creds.client_id.clone(),
            self.creds.client_secret.clone(),
            oauth::redirect_uri(),
            self.data.access_token.clone(),
            self.data.refresh_token.clone(),
        )
    }
}

async fn refresh(creds: &Credentials, data: &SessionData) -> Result<SessionData> {
    let client = Client::new(
        creds.client_id.clone(),
        creds.client_secret.clone(),
        oauth::redirect_uri(),
        data.access_token.clone(),
        data.refresh_token.clone(),
    );

    let tokens = client
        .refresh_access_token()
        .await
        .context("Failed to refresh Google access token")?;

    Ok(data.refreshed(&Grant::from(tokens), Utc::now()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn data(expires_at: DateTime<Utc>) -> SessionData {
        SessionData {
            account: "me@example.com".into(),
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            expires_at,
        }
    }

    fn tokens(access: &str, refresh: &str, expires_in: i64) -> Grant {
        Grant {
            access_token: access.into(),
            refresh_token: refresh.into(),
            expires_in,
        }
    }

    #[test]
    fn no_file_is_unauthenticated() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("session.toml"));

        assert_eq!(store.state(now()).unwrap(), SessionState::Unauthenticated);
    }

    #[test]
    fn valid_token_is_authenticated() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("session.toml"));
        let saved = data(now() + Duration::minutes(30));
        store.save(&saved).unwrap();

        assert_eq!(store.state(now()).unwrap(), SessionState::Authenticated(saved));
    }

    #[test]
    fn token_at_expiry_is_expired() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("session.toml"));
        let saved = data(now());
        store.save(&saved).unwrap();

        assert_eq!(store.state(now()).unwrap(), SessionState::Expired(saved));
    }

    #[test]
    fn unauthenticated_session_bootstraps() {
        assert_eq!(SessionState::Unauthenticated.action(), SessionAction::Bootstrap);
    }

    #[test]
    fn valid_session_is_reused() {
        let saved = data(now() + Duration::minutes(30));
        assert_eq!(
            SessionState::Authenticated(saved.clone()).action(),
            SessionAction::Reuse(saved)
        );
    }

    #[test]
    fn expired_session_with_refresh_token_refreshes() {
        let saved = data(now());
        assert_eq!(
            SessionState::Expired(saved.clone()).action(),
            SessionAction::Refresh(saved)
        );
    }

    #[test]
    fn expired_session_without_refresh_token_bootstraps() {
        let saved = SessionData {
            refresh_token: String::new(),
            ..data(now())
        };
        assert_eq!(SessionState::Expired(saved).action(), SessionAction::Bootstrap);
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("providers/google/session.toml"));
        store.save(&data(now())).unwrap();

        assert!(store.path().exists());
        assert_eq!(store.load().unwrap(), Some(data(now())));
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("session.toml"));
        store.save(&data(now())).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, "not = [valid").unwrap();

        assert!(SessionStore::at(path).state(now()).is_err());
    }

    #[test]
    fn refresh_keeps_old_refresh_token_when_omitted() {
        let old = data(now());
        let new = old.refreshed(&tokens("new-access", "", 3600), now());

        assert_eq!(new.access_token, "new-access");
        assert_eq!(new.refresh_token, "refresh");
        assert_eq!(new.expires_at, now() + Duration::hours(1));
        assert_eq!(new.account, "me@example.com");
    }

    #[test]
    fn refresh_takes_rotated_refresh_token() {
        let new = data(now()).refreshed(&tokens("a", "rotated", 60), now());
        assert_eq!(new.refresh_token, "rotated");
    }

    #[test]
    fn from_grant_sets_expiry_relative_to_now() {
        let data = SessionData::from_grant("me@example.com", &tokens("a", "r", 3599), now());
        assert_eq!(data.expires_at, now() + Duration::seconds(3599));
        assert!(!data.is_expired_at(now()));
    }
}
