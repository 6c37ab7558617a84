//! The two OAuth files kept in the secrets directory:
//! - `client_secret.json`: the desktop-app client credentials downloaded from Google Cloud Console
//! - `token.json`: the access and refresh tokens issued by Google after consent

use crate::api::OAUTH_SCOPES;
use crate::{utils, Result};
use anyhow::{ensure, Context};
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// The loopback redirect that Google sends the browser back to. The consent flow adds a port.
const LOOPBACK: &str = "http://localhost";
const LOOPBACK_IP: &str = "http://127.0.0.1";

/// Access tokens this close to expiry are refreshed before use.
const REFRESH_MARGIN_MINUTES: i64 = 5;

/// A JSON document together with the path it is persisted to. Writes are readable only by the
/// owner.
#[derive(Debug, Clone)]
pub(super) struct JsonFile<T> {
    path: PathBuf,
    value: T,
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned + Debug,
{
    pub(super) async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let value = utils::deserialize(&path).await?;
        Ok(Self { path, value })
    }

    /// Writes `value` to `path` and returns the handle.
    pub(super) async fn create(path: impl Into<PathBuf>, value: T) -> Result<Self> {
        let file = Self {
            path: path.into(),
            value,
        };
        file.persist().await?;
        Ok(file)
    }

    pub(super) async fn persist(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.value)
            .with_context(|| format!("Unable to serialize {}", self.path.display()))?;
        utils::write(&self.path, json).await?;

        #[cfg(unix)]
        {
            use std::fs::Permissions;
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, Permissions::from_mode(0o600))
                .await
                .with_context(|| format!("Unable to restrict {}", self.path.display()))?;
        }
        Ok(())
    }

    pub(super) fn get(&self) -> &T {
        &self.value
    }

    pub(super) fn get_mut(&mut self) -> &mut T {
        &mut self.value
    }

    pub(super) fn path(&self) -> &Path {
        &self.path
    }
}

/// `client_secret.json`. Google wraps desktop-app credentials in an `installed` object:
///
/// ```json
/// {
///   "installed": {
///     "client_id": "YOUR_CLIENT_ID.apps.googleusercontent.com",
///     "client_secret": "YOUR_CLIENT_SECRET",
///     "redirect_uris": ["http://localhost"],
///     "auth_uri": "https://accounts.google.com/o/oauth2/auth",
///     "token_uri": "https://oauth2.googleapis.com/token"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ClientCredentials {
    installed: InstalledApp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct InstalledApp {
    client_id: String,
    client_secret: String,
    redirect_uris: Vec<String>,
    auth_uri: String,
    token_uri: String,
}

impl ClientCredentials {
    /// Reads the credentials and checks that they allow a loopback redirect.
    pub(crate) async fn read(path: &Path) -> Result<Self> {
        let credentials: Self = utils::deserialize(path).await.with_context(|| {
            format!(
                "Unable to read the OAuth client secret file at {}",
                path.display()
            )
        })?;
        ensure!(
            credentials
                .installed
                .redirect_uris
                .iter()
                .any(|uri| uri == LOOPBACK || uri == LOOPBACK_IP),
            "The OAuth client in {} must list {LOOPBACK} as a redirect URI",
            path.display()
        );
        Ok(credentials)
    }

    /// The loopback redirect without a port.
    pub(crate) fn loopback(&self) -> &str {
        LOOPBACK
    }

    pub(super) fn client_id(&self) -> &str {
        &self.installed.client_id
    }

    pub(super) fn client_secret(&self) -> &str {
        &self.installed.client_secret
    }

    pub(super) fn auth_uri(&self) -> &str {
        &self.installed.auth_uri
    }

    pub(super) fn token_uri(&self) -> &str {
        &self.installed.token_uri
    }
}

/// `token.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct StoredToken {
    scopes: Vec<String>,
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl StoredToken {
    pub(super) fn new(
        scopes: Vec<String>,
        access_token: String,
        refresh_token: String,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            scopes,
            access_token,
            refresh_token,
            expires_at,
        }
    }

    /// Opens `token.json`, failing if a required scope was not granted.
    pub(super) async fn open(path: impl Into<PathBuf>) -> Result<JsonFile<Self>> {
        let file: JsonFile<Self> = JsonFile::open(path)
            .await
            .context("Unable to read the token JSON file")?;
        for &scope in OAUTH_SCOPES {
            ensure!(
                file.get().scopes.iter().any(|s| s == scope),
                "OAuth scope '{scope}' is missing."
            );
        }
        Ok(file)
    }

    pub(super) fn access_token(&self) -> &str {
        &self.access_token
    }

    pub(super) fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    /// True when the access token expires within the refresh margin of `now`.
    pub(super) fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now + Duration::minutes(REFRESH_MARGIN_MINUTES)
    }

    /// Records a refreshed access token. Google only sometimes rotates the refresh token.
    pub(super) fn refreshed(
        &mut self,
        access_token: String,
        expires_at: DateTime<Utc>,
        refresh_token: Option<String>,
    ) {
        self.access_token = access_token;
        self.expires_at = expires_at;
        if let Some(refresh_token) = refresh_token {
            self.refresh_token = refresh_token;
        }
    }
}
