//! OAuth 2.0 authentication for the Google Sheets API.
//!
//! This module handles:
//! - Running the installed-app consent flow, with PKCE, and a local loopback callback server
//! - Saving access and refresh tokens in `token.json`
//! - Refreshing the access token when it is about to expire

use crate::api::files::{ClientCredentials, JsonFile, StoredToken};
use crate::api::OAUTH_SCOPES;
use crate::Result;
use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Utc};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, Uri};
use hyper_util::rt::TokioIo;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use std::collections::HashMap;
use std::convert::Infallible;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

/// How long the consent flow waits for the browser to come back.
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

const CALLBACK_PAGE: &str = "Authorization received. You can close this window and return to the \
terminal.";

type GoogleClient = BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Holds the OAuth client credentials and the token file, and hands out access tokens.
#[derive(Debug, Clone)]
pub(crate) struct TokenProvider {
    credentials: ClientCredentials,
    token: JsonFile<StoredToken>,
}

impl TokenProvider {
    /// Runs the consent flow in the browser and saves the resulting tokens to `token_path`.
    pub(crate) async fn initialize(
        secret_path: impl Into<PathBuf>,
        token_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        let credentials = ClientCredentials::read(&secret_path.into()).await?;
        let token = consent_flow(&credentials).await?;
        let token = JsonFile::create(token_path, token).await?;
        info!("Tokens saved to {}", token.path().display());
        Ok(Self { credentials, token })
    }

    /// Loads existing credentials and tokens. This never opens a browser.
    pub(crate) async fn load(
        secret_path: impl Into<PathBuf>,
        token_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        let credentials = ClientCredentials::read(&secret_path.into()).await?;
        let token = StoredToken::open(token_path).await?;
        Ok(Self { credentials, token })
    }

    /// The current access token, which may be expired.
    pub(crate) fn token(&self) -> &str {
        self.token.get().access_token()
    }

    /// Returns an access token, refreshing it first if it is expired or about to expire.
    pub(crate) async fn token_with_refresh(&mut self) -> Result<&str> {
        if self.token.get().is_stale_at(Utc::now()) {
            debug!("Access token is expired, refreshing");
            self.refresh().await?;
        }
        Ok(self.token())
    }

    /// Exchanges the refresh token for a new access token and saves it.
    pub(crate) async fn refresh(&mut self) -> Result<()> {
        let client = oauth_client(&self.credentials, self.credentials.loopback())?;
        let refresh_token = RefreshToken::new(self.token.get().refresh_token().to_string());
        let response = client
            .exchange_refresh_token(&refresh_token)
            .request_async(&http_client()?)
            .await
            .map_err(|e| anyhow!("Unable to refresh the OAuth token: {e}"))?;
        let refresh_token = response.refresh_token().map(|t| t.secret().clone());
        self.token.get_mut().refreshed(
            response.access_token().secret().clone(),
            expires_at(response.expires_in()),
            refresh_token,
        );
        self.token.persist().await
    }
}

fn oauth_client(secret: &ClientCredentials, redirect: &str) -> Result<GoogleClient> {
    Ok(BasicClient::new(ClientId::new(secret.client_id().to_string()))
        .set_client_secret(ClientSecret::new(secret.client_secret().to_string()))
        .set_auth_uri(AuthUrl::new(secret.auth_uri().to_string()).context("Bad auth_uri")?)
        .set_token_uri(TokenUrl::new(secret.token_uri().to_string()).context("Bad token_uri")?)
        .set_redirect_uri(RedirectUrl::new(redirect.to_string()).context("Bad redirect URI")?))
}

/// Token requests must not follow redirects.
fn http_client() -> Result<oauth2::reqwest::Client> {
    oauth2::reqwest::ClientBuilder::new()
        .redirect(oauth2::reqwest::redirect::Policy::none())
        .build()
        .context("Unable to build the HTTP client for OAuth")
}

fn expires_at(expires_in: Option<Duration>) -> DateTime<Utc> {
    let seconds = expires_in.map(|d| d.as_secs()).unwrap_or(3600);
    Utc::now() + chrono::Duration::seconds(i64::try_from(seconds).unwrap_or(3600))
}

/// Opens a loopback listener, prints the consent URL, waits for Google to redirect back, and
/// exchanges the authorization code for tokens.
async fn consent_flow(secret: &ClientCredentials) -> Result<StoredToken> {
    let listener = TcpListener::bind(("127.0.0.1", 0))
        .await
        .context("Unable to start the local OAuth callback server")?;
    let port = listener.local_addr()?.port();
    let redirect = format!("{}:{port}", secret.loopback());
    let client = oauth_client(secret, &redirect)?;

    let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
    let (auth_url, csrf) = client
        .authorize_url(CsrfToken::new_random)
        .add_scopes(OAUTH_SCOPES.iter().map(|s| Scope::new(s.to_string())))
        .add_extra_param("access_type", "offline")
        .add_extra_param("prompt", "consent")
        .set_pkce_challenge(pkce_challenge)
        .url();

    let (tx, rx) = mpsc::channel::<Uri>(4);
    let server = tokio::spawn(serve_callbacks(listener, tx));
    info!("Open this URL in your browser to authorize access to your sheet:\n\n{auth_url}\n");
    info!("Waiting for the authorization callback on {redirect}");

    let code = tokio::time::timeout(CALLBACK_TIMEOUT, wait_for_code(rx, csrf.secret())).await;
    server.abort();
    let code = code.context("Timed out waiting for the OAuth callback")??;

    let response = client
        .exchange_code(AuthorizationCode::new(code))
        .set_pkce_verifier(pkce_verifier)
        .request_async(&http_client()?)
        .await
        .map_err(|e| anyhow!("Unable to exchange the authorization code: {e}"))?;

    let refresh_token = response
        .refresh_token()
        .context("Google did not return a refresh token")?
        .secret()
        .clone();
    let scopes = match response.scopes() {
        Some(scopes) => scopes.iter().map(|s| s.to_string()).collect(),
        None => OAUTH_SCOPES.iter().map(|s| s.to_string()).collect(),
    };
    Ok(StoredToken::new(
        scopes,
        response.access_token().secret().clone(),
        refresh_token,
        expires_at(response.expires_in()),
    ))
}

/// Accepts connections until aborted, forwarding each request URI.
async fn serve_callbacks(listener: TcpListener, tx: mpsc::Sender<Uri>) {
    loop {
        let stream = match listener.accept().await {
            Ok((stream, _)) => stream,
            Err(e) => {
                warn!("OAuth callback accept failed: {e}");
                continue;
            }
        };
        let tx = tx.clone();
        let service = service_fn(move |req: Request<Incoming>| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(req.uri().clone()).await;
                Ok::<_, Infallible>(Response::new(CALLBACK_PAGE.to_string()))
            }
        });
        tokio::spawn(async move {
            if let Err(e) = http1::Builder::new()
                .keep_alive(false)
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                debug!("OAuth callback connection error: {e}");
            }
        });
    }
}

/// Waits for a callback that carries either a code or an error. Other requests, such as a
/// browser asking for a favicon, are ignored.
async fn wait_for_code(mut rx: mpsc::Receiver<Uri>, expected_state: &str) -> Result<String> {
    while let Some(uri) = rx.recv().await {
        let params = query_params(&uri)?;
        if let Some(error) = params.get("error") {
            bail!("Authorization was not granted: {error}");
        }
        if let Some(code) = params.get("code") {
            if params.get("state").map(String::as_str) != Some(expected_state) {
                bail!("The OAuth callback state does not match, aborting");
            }
            return Ok(code.clone());
        }
        debug!("Ignoring request to {uri}");
    }
    bail!("The OAuth callback server stopped unexpectedly")
}

fn query_params(uri: &Uri) -> Result<HashMap<String, String>> {
    let url = Url::parse(&format!("http://localhost{uri}"))
        .with_context(|| format!("Unable to parse the callback URI '{uri}'"))?;
    Ok(url.query_pairs().into_owned().collect())
}
