//! IMAP transport and session operations
//!
//! Provides timeout-bounded wrappers around `async-imap` operations. All
//! network calls use TLS, and timeouts are derived from the tool config.
//! Every tool operation opens exactly one session, owns it exclusively for
//! the duration of the operation, and releases it best-effort at the end.

use std::sync::Arc;
use std::time::Duration;

use async_imap::types::Fetch;
use async_imap::{Client, Session};
use futures::TryStreamExt;
use rustls::ClientConfig;
use rustls::RootCertStore;
use rustls_pki_types::ServerName;
use secrecy::ExposeSecret;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tracing::debug;

use crate::config::Config;
use crate::errors::{AppError, AppResult};

/// Type alias for the authenticated IMAP session over TLS
///
/// Wraps the TLS stream type to simplify signatures throughout the codebase.
pub type TriageSession = Session<tokio_rustls::client::TlsStream<TcpStream>>;

/// Get socket timeout duration from config
fn socket_timeout(config: &Config) -> Duration {
    Duration::from_millis(config.socket_timeout_ms)
}

/// Connect to the IMAP server and authenticate
///
/// Performs the full connection sequence with timeouts:
/// 1. TCP connect
/// 2. TLS handshake with system root certificates
/// 3. Read IMAP greeting
/// 4. LOGIN authentication
///
/// A single attempt; no retry-on-connect. A caller wanting resilience must
/// re-invoke the whole operation.
///
/// # Errors
///
/// - `Timeout` if any connection phase times out
/// - `AuthFailed` if the server rejects the credentials
/// - `ConnectionFailed` for TCP, TLS, or greeting failures
pub async fn connect_authenticated(config: &Config) -> AppResult<TriageSession> {
    let connect_duration = Duration::from_millis(config.connect_timeout_ms);
    let greeting_duration = Duration::from_millis(config.greeting_timeout_ms);

    debug!(host = %config.imap_host, port = config.imap_port, "connecting to IMAP server");
    let tcp = timeout(
        connect_duration,
        TcpStream::connect((config.imap_host.as_str(), config.imap_port)),
    )
    .await
    .map_err(|_| AppError::Timeout("tcp connect timeout".to_owned()))
    .and_then(|r| r.map_err(|e| AppError::ConnectionFailed(format!("tcp connect failed: {e}"))))?;

    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let tls_config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    let connector = TlsConnector::from(Arc::new(tls_config));

    let server_name = ServerName::try_from(config.imap_host.clone())
        .map_err(|_| AppError::InvalidInput("invalid IMAP host for TLS SNI".to_owned()))?;
    let tls_stream = timeout(greeting_duration, connector.connect(server_name, tcp))
        .await
        .map_err(|_| AppError::Timeout("TLS handshake timeout".to_owned()))
        .and_then(|r| {
            r.map_err(|e| AppError::ConnectionFailed(format!("TLS handshake failed: {e}")))
        })?;

    let mut client = Client::new(tls_stream);
    let greeting = timeout(greeting_duration, client.read_response())
        .await
        .map_err(|_| AppError::Timeout("IMAP greeting timeout".to_owned()))
        .and_then(|r| {
            r.map_err(|e| AppError::ConnectionFailed(format!("IMAP greeting failed: {e}")))
        })?;

    if greeting.is_none() {
        return Err(AppError::ConnectionFailed(
            "IMAP server closed connection before greeting".to_owned(),
        ));
    }

    let pass = config.app_password.expose_secret();
    let session = timeout(
        greeting_duration,
        client.login(config.email_address.as_str(), pass),
    )
    .await
    .map_err(|_| AppError::Timeout("IMAP login timeout".to_owned()))
    .and_then(|r| r.map_err(|(e, _)| AppError::AuthFailed(e.to_string())))?;

    debug!("authenticated IMAP session established");
    Ok(session)
}

/// Best-effort LOGOUT and session teardown
///
/// Disconnect failures are never surfaced; a closed-but-unacknowledged
/// session is not a caller-visible fault.
pub async fn logout_quietly(config: &Config, session: &mut TriageSession) {
    match timeout(socket_timeout(config), session.logout()).await {
        Ok(Ok(())) => debug!("IMAP session logged out"),
        Ok(Err(e)) => debug!(error = %e, "LOGOUT failed; dropping session"),
        Err(_) => debug!("LOGOUT timed out; dropping session"),
    }
}

/// Select a mailbox in read-write mode
///
/// # Errors
///
/// - `NotFound` if the mailbox cannot be selected
pub async fn select_mailbox(
    config: &Config,
    session: &mut TriageSession,
    mailbox: &str,
) -> AppResult<()> {
    timeout(socket_timeout(config), session.select(mailbox))
        .await
        .map_err(|_| AppError::Timeout(format!("SELECT timed out for mailbox '{mailbox}'")))
        .and_then(|r| {
            r.map(|_| ())
                .map_err(|e| AppError::NotFound(format!("cannot select mailbox '{mailbox}': {e}")))
        })
}

/// Select a mailbox in read-only mode
///
/// Uses `EXAMINE` to avoid flag side effects. Used by draft verification.
pub async fn examine_mailbox(
    config: &Config,
    session: &mut TriageSession,
    mailbox: &str,
) -> AppResult<()> {
    timeout(socket_timeout(config), session.examine(mailbox))
        .await
        .map_err(|_| AppError::Timeout(format!("EXAMINE timed out for mailbox '{mailbox}'")))
        .and_then(|r| {
            r.map(|_| ())
                .map_err(|e| AppError::NotFound(format!("cannot examine mailbox '{mailbox}': {e}")))
        })
}

/// Search for messages matching a query
///
/// Runs `UID SEARCH` and returns matching UIDs in descending order (newest
/// first by server sequence when the provider yields ascending ids).
pub async fn uid_search(
    config: &Config,
    session: &mut TriageSession,
    query: &str,
) -> AppResult<Vec<u32>> {
    let set = timeout(socket_timeout(config), session.uid_search(query))
        .await
        .map_err(|_| AppError::Timeout("UID SEARCH timed out".to_owned()))
        .and_then(|r| r.map_err(|e| AppError::Internal(format!("uid search failed: {e}"))))?;
    let mut uids: Vec<u32> = set.into_iter().collect();
    uids.sort_unstable_by(|a, b| b.cmp(a));
    Ok(uids)
}

/// Fetch a single message with a custom query
///
/// Runs a `UID FETCH` for a specific UID and returns the first result.
///
/// # Errors
///
/// - `NotFound` if the UID does not exist in the selected mailbox
/// - `Timeout` or `Internal` for network/protocol errors
pub async fn fetch_one(
    config: &Config,
    session: &mut TriageSession,
    uid: u32,
    query: &str,
) -> AppResult<Fetch> {
    let stream = timeout(
        socket_timeout(config),
        session.uid_fetch(uid.to_string(), query),
    )
    .await
    .map_err(|_| AppError::Timeout("UID FETCH timed out".to_owned()))
    .and_then(|r| r.map_err(|e| AppError::Internal(format!("uid fetch failed: {e}"))))?;
    let fetches: Vec<Fetch> = timeout(socket_timeout(config), stream.try_collect())
        .await
        .map_err(|_| AppError::Timeout("UID FETCH stream timed out".to_owned()))
        .and_then(|r| r.map_err(|e| AppError::Internal(format!("uid fetch stream failed: {e}"))))?;

    fetches
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("message uid {uid} not found")))
}

/// Fetch full RFC822 message source
///
/// Returns raw bytes of the entire message.
pub async fn fetch_raw_message(
    config: &Config,
    session: &mut TriageSession,
    uid: u32,
) -> AppResult<Vec<u8>> {
    let fetch = fetch_one(config, session, uid, "UID RFC822").await?;
    let body = fetch
        .body()
        .ok_or_else(|| AppError::Internal("message has no RFC822 body".to_owned()))?;
    Ok(body.to_vec())
}

/// Store flags or labels on a message
///
/// Runs `UID STORE` with a store query string, e.g. `+FLAGS.SILENT (\Flagged)`
/// or `+X-GM-LABELS ("URGENT")`.
pub async fn uid_store(
    config: &Config,
    session: &mut TriageSession,
    uid: u32,
    query: &str,
) -> AppResult<()> {
    let stream = timeout(
        socket_timeout(config),
        session.uid_store(uid.to_string(), query),
    )
    .await
    .map_err(|_| AppError::Timeout("UID STORE timed out".to_owned()))
    .and_then(|r| r.map_err(|e| AppError::Internal(format!("uid store failed: {e}"))))?;
    let _: Vec<Fetch> = timeout(socket_timeout(config), stream.try_collect())
        .await
        .map_err(|_| AppError::Timeout("UID STORE stream timed out".to_owned()))
        .and_then(|r| r.map_err(|e| AppError::Internal(format!("uid store stream failed: {e}"))))?;
    Ok(())
}

/// Create a mailbox (used for label create-or-reuse)
///
/// The provider returns an error when the mailbox already exists; the caller
/// treats that as success.
pub async fn create_mailbox(
    config: &Config,
    session: &mut TriageSession,
    mailbox: &str,
) -> AppResult<()> {
    timeout(socket_timeout(config), session.create(mailbox))
        .await
        .map_err(|_| AppError::Timeout("CREATE timed out".to_owned()))
        .and_then(|r| r.map_err(|e| AppError::Internal(format!("CREATE failed: {e}"))))
}

/// Append a raw RFC822 message to a mailbox with flags and an internal date
///
/// Used to persist composed drafts.
pub async fn append_with_flags(
    config: &Config,
    session: &mut TriageSession,
    mailbox: &str,
    flags: &str,
    internal_date: &str,
    content: &[u8],
) -> AppResult<()> {
    timeout(
        socket_timeout(config),
        session.append(mailbox, Some(flags), Some(internal_date), content),
    )
    .await
    .map_err(|_| AppError::Timeout("APPEND timed out".to_owned()))
    .and_then(|r| r.map_err(|e| AppError::Internal(format!("APPEND failed: {e}"))))
}

/// Permanently remove all messages marked `\Deleted` in the selected mailbox
///
/// Runs a plain `EXPUNGE`, purging the whole mailbox in one batch operation.
pub async fn expunge(config: &Config, session: &mut TriageSession) -> AppResult<()> {
    let stream = timeout(socket_timeout(config), session.expunge())
        .await
        .map_err(|_| AppError::Timeout("EXPUNGE timed out".to_owned()))
        .and_then(|r| r.map_err(|e| AppError::Internal(format!("EXPUNGE failed: {e}"))))?;
    let _: Vec<u32> = timeout(socket_timeout(config), stream.try_collect())
        .await
        .map_err(|_| AppError::Timeout("EXPUNGE stream timed out".to_owned()))
        .and_then(|r| r.map_err(|e| AppError::Internal(format!("EXPUNGE stream failed: {e}"))))?;
    Ok(())
}
