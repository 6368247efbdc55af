use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::{AuthError, CurrentUser, Session, SessionEvent, SessionProvider, SessionSubscription};

type SessionCache = Arc<RwLock<HashMap<String, Session>>>;

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Process-wide view of who is signed in.
///
/// Created once at start-up and shared through `AppState`. A watcher task
/// follows the provider's change feed and evicts sessions as soon as they end,
/// so the next request made with that cookie is sent back to sign-in. The same
/// task periodically drops sessions that ended without anyone asking for them.
pub struct SessionContext {
    provider: Arc<dyn SessionProvider>,
    cache: SessionCache,
    stop: CancellationToken,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl SessionContext {
    /// Must be called from within a tokio runtime.
    pub fn start(provider: Arc<dyn SessionProvider>) -> Arc<Self> {
        Self::start_with_sweep(provider, DEFAULT_SWEEP_INTERVAL)
    }

    pub fn start_with_sweep(provider: Arc<dyn SessionProvider>, sweep_every: Duration) -> Arc<Self> {
        let cache: SessionCache = Arc::new(RwLock::new(HashMap::new()));
        let stop = CancellationToken::new();
        let subscription = provider.on_session_change();
        let watcher = tokio::spawn(watch_sessions(
            subscription,
            Arc::clone(&provider),
            Arc::clone(&cache),
            sweep_every,
            stop.clone(),
        ));

        Arc::new(Self {
            provider,
            cache,
            stop,
            watcher: Mutex::new(Some(watcher)),
        })
    }

    pub fn provider(&self) -> &Arc<dyn SessionProvider> {
        &self.provider
    }

    /// Resolves a cookie token. Unknown, ended or unverifiable sessions all
    /// read as "no session".
    pub async fn resolve(&self, token: Option<&str>) -> Option<Session> {
        let token = token.filter(|t| !t.is_empty())?;

        let cached = self.cache.read().await.get(token).cloned();
        if let Some(session) = cached {
            if !session.is_expired() {
                return Some(session);
            }
            self.cache.write().await.remove(token);
        }

        match self.provider.current_session(token).await {
            Ok(Some(session)) => {
                self.cache
                    .write()
                    .await
                    .insert(token.to_string(), session.clone());
                Some(session)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Session lookup failed, treating request as signed out: {e}");
                None
            }
        }
    }

    pub async fn current_user(&self, token: Option<&str>) -> Option<CurrentUser> {
        self.resolve(token).await.map(|s| s.user)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self.provider.sign_in(email, password).await?;
        self.remember(&session).await;
        Ok(session)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self.provider.sign_up(email, password).await?;
        self.remember(&session).await;
        Ok(session)
    }

    pub async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        self.cache.write().await.remove(token);
        self.provider.sign_out(token).await
    }

    pub async fn cached_sessions(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Stops the watcher and drops the subscription.
    pub async fn shutdown(&self) {
        self.stop.cancel();
        let handle = match self.watcher.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Session watcher ended abnormally: {e}");
            }
        }
        self.cache.write().await.clear();
        info!("Session context stopped");
    }

    async fn remember(&self, session: &Session) {
        self.cache
            .write()
            .await
            .insert(session.token.clone(), session.clone());
    }
}

async fn watch_sessions(
    mut subscription: SessionSubscription,
    provider: Arc<dyn SessionProvider>,
    cache: SessionCache,
    sweep_every: Duration,
    stop: CancellationToken,
) {
    let mut sweep = tokio::time::interval(sweep_every);
    sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let event = tokio::select! {
            _ = stop.cancelled() => break,
            _ = sweep.tick() => {
                sweep_expired(provider.as_ref(), &cache).await;
                continue;
            }
            event = subscription.next() => event,
        };

        match event {
            Some(SessionEvent::SignedOut { token }) | Some(SessionEvent::Expired { token }) => {
                if cache.write().await.remove(&token).is_some() {
                    debug!("Evicted ended session from cache");
                }
            }
            Some(SessionEvent::SignedIn { user_id, .. }) => {
                debug!("Session opened for user {user_id}");
            }
            Some(SessionEvent::Missed(n)) => {
                warn!("Session watcher missed {n} events, clearing cache");
                cache.write().await.clear();
            }
            None => break,
        }
    }
    subscription.unsubscribe();
}

async fn sweep_expired(provider: &dyn SessionProvider, cache: &SessionCache) {
    cache.write().await.retain(|_, session| !session.is_expired());
    match provider.purge_expired().await {
        Ok(0) => {}
        Ok(n) => info!("Purged {n} expired sessions"),
        Err(e) => warn!("Expired session purge failed: {e}"),
    }
}
