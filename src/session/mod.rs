//! Identity lifecycle: restore, login, server-side validation and logout.
//!
//! Two tiers of "signed in" are exposed. [`SessionManager::has_identity`]
//! only checks for a known username and is what route guards use.
//! [`SessionManager::is_authenticated`] is true only after a login or a
//! successful validation in this process.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{RecipeStateError, Result};
use crate::meal_plan::MealPlanStore;
use crate::notify::Notifier;
use crate::storage::{DurableStore, PROFILE_PIC_KEY, USERNAME_KEY};
use crate::transport::{ApiTransport, USER_INFORMATION_PATH};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdentity {
    pub username: Option<String>,
    pub profile_pic: Option<String>,
    pub is_authenticated: bool,
}

/// Result of a [`SessionManager::validate_session`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Server confirmed the session.
    Valid,
    /// No username is known; nothing was sent.
    NoIdentity,
    /// Server rejected the session; identity and meal plan were cleared.
    Rejected,
    /// Server could not be reached; identity was kept.
    Unreachable,
    /// Identity changed while the request was in flight; the result was dropped.
    Superseded,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }
}

pub struct SessionManager {
    storage: Arc<dyn DurableStore>,
    transport: Arc<dyn ApiTransport>,
    meal_plan: Arc<MealPlanStore>,
    notifier: Notifier,
    identity: Mutex<SessionIdentity>,
}

impl SessionManager {
    /// Restore the cached identity from storage. The session always starts
    /// unauthenticated and must be validated.
    pub fn restore(
        storage: Arc<dyn DurableStore>,
        transport: Arc<dyn ApiTransport>,
        meal_plan: Arc<MealPlanStore>,
        notifier: Notifier,
    ) -> Result<Self> {
        let identity = SessionIdentity {
            username: storage.get(USERNAME_KEY)?.filter(|u| !u.is_empty()),
            profile_pic: storage.get(PROFILE_PIC_KEY)?.filter(|p| !p.is_empty()),
            is_authenticated: false,
        };

        match &identity.username {
            Some(username) => info!("Restored cached identity for {}", username),
            None => debug!("No cached identity"),
        }

        Ok(Self {
            storage,
            transport,
            meal_plan,
            notifier,
            identity: Mutex::new(identity),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionIdentity>> {
        self.identity
            .lock()
            .map_err(|_| RecipeStateError::Storage("session lock poisoned".to_string()))
    }

    pub fn identity(&self) -> SessionIdentity {
        self.lock().map(|i| i.clone()).unwrap_or_default()
    }

    pub fn username(&self) -> Option<String> {
        self.identity().username
    }

    pub fn profile_pic(&self) -> Option<String> {
        self.identity().profile_pic
    }

    /// A username is known. Cheap, no network.
    pub fn has_identity(&self) -> bool {
        self.lock().map(|i| i.username.is_some()).unwrap_or(false)
    }

    /// Logged in or validated against the server in this process.
    pub fn is_authenticated(&self) -> bool {
        self.lock().map(|i| i.is_authenticated).unwrap_or(false)
    }

    pub fn meal_plan(&self) -> &Arc<MealPlanStore> {
        &self.meal_plan
    }

    /// Record a completed login. Credential exchange happens elsewhere.
    pub fn login(&self, username: &str) -> Result<()> {
        let mut identity = self.lock()?;
        self.storage.set(USERNAME_KEY, username)?;
        identity.username = Some(username.to_string());
        identity.is_authenticated = true;
        info!("Logged in as {}", username);
        Ok(())
    }

    /// Set the profile picture. Only a non-empty value is persisted; `None`
    /// clears the in-memory value and leaves storage alone.
    pub fn set_profile_pic(&self, pic: Option<&str>) -> Result<()> {
        let mut identity = self.lock()?;
        self.apply_profile_pic(&mut identity, pic)
    }

    fn apply_profile_pic(&self, identity: &mut SessionIdentity, pic: Option<&str>) -> Result<()> {
        match pic.filter(|p| !p.is_empty()) {
            Some(pic) => {
                self.storage.set(PROFILE_PIC_KEY, pic)?;
                identity.profile_pic = Some(pic.to_string());
            }
            None => identity.profile_pic = None,
        }
        Ok(())
    }

    /// Clear identity in memory and storage, then the meal plan.
    ///
    /// The identity lock is held throughout, so no caller sees a partially
    /// cleared state. Memory is always reset; the first storage failure, if
    /// any, is returned after every removal has been attempted.
    pub fn logout(&self) -> Result<()> {
        let mut identity = self.lock()?;
        self.clear_identity(&mut identity)
    }

    fn clear_identity(&self, identity: &mut SessionIdentity) -> Result<()> {
        let previous = identity.username.take();
        identity.profile_pic = None;
        identity.is_authenticated = false;

        let results = [
            self.storage.remove(USERNAME_KEY),
            self.storage.remove(PROFILE_PIC_KEY),
            self.meal_plan.clear(),
        ];

        match &previous {
            Some(username) => info!("Logged out {}", username),
            None => debug!("Logout with no identity"),
        }

        for result in results {
            if let Err(e) = result {
                warn!("Logout left storage partially cleared: {}", e);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Check the session with the server.
    ///
    /// Never fails: a rejection logs out, a network failure only drops the
    /// authenticated flag.
    pub async fn validate_session(&self) -> ValidationOutcome {
        let Some(username) = self.username() else {
            if let Ok(mut identity) = self.lock() {
                identity.is_authenticated = false;
            }
            debug!("No username known, skipping session validation");
            return ValidationOutcome::NoIdentity;
        };

        let response = self.transport.get(USER_INFORMATION_PATH).await;

        let Ok(mut identity) = self.lock() else {
            return ValidationOutcome::Unreachable;
        };
        if identity.username.as_deref() != Some(username.as_str()) {
            debug!("Identity changed during validation for {}, result dropped", username);
            return ValidationOutcome::Superseded;
        }

        match response {
            Ok(response) if response.is_success() => {
                identity.is_authenticated = true;
                // A response without a picture keeps the current one
                let pic = response.body.pointer("/data/profilePic").and_then(Value::as_str);
                if let Some(pic) = pic {
                    if let Err(e) = self.apply_profile_pic(&mut identity, Some(pic)) {
                        warn!("Failed to persist profile picture for {}: {}", username, e);
                    }
                }
                info!("Session validated for {}", username);
                ValidationOutcome::Valid
            }
            Ok(response) => {
                warn!(
                    "Session for {} rejected by server (status {}), logging out",
                    username, response.status
                );
                // Still under the lock taken for the identity check above
                if let Err(e) = self.clear_identity(&mut identity) {
                    warn!("Logout after rejected session failed: {}", e);
                }
                drop(identity);
                self.notifier
                    .warning("Session expired", "Please log in again.");
                ValidationOutcome::Rejected
            }
            Err(e) => {
                identity.is_authenticated = false;
                warn!("Could not validate session for {}: {}", username, e);
                ValidationOutcome::Unreachable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecipeSummary;
    use crate::notify::test_support::RecordingSink;
    use crate::notify::Severity;
    use crate::storage::{MemoryStore, MEAL_PLAN_KEY};
    use crate::transport::test_support::{MockTransport, Reply};
    use crate::transport::{ApiResponse, TransportError};
    use serde_json::json;

    struct Fixture {
        storage: Arc<MemoryStore>,
        transport: Arc<MockTransport>,
        sink: Arc<RecordingSink>,
        session: SessionManager,
    }

    fn fixture(transport: MockTransport, cached_user: Option<&str>) -> Fixture {
        let storage = Arc::new(MemoryStore::new());
        if let Some(user) = cached_user {
            storage.set(USERNAME_KEY, user).unwrap();
            storage.set(PROFILE_PIC_KEY, "old.png").unwrap();
        }
        let transport = Arc::new(transport);
        let sink = Arc::new(RecordingSink::default());
        let meal_plan = Arc::new(MealPlanStore::load(storage.clone()).unwrap());
        let session = SessionManager::restore(
            storage.clone(),
            transport.clone(),
            meal_plan,
            Notifier::new(sink.clone()),
        )
        .unwrap();
        Fixture {
            storage,
            transport,
            sink,
            session,
        }
    }

    #[test]
    fn test_restore_starts_unauthenticated() {
        let f = fixture(MockTransport::new(), Some("alice"));
        let identity = f.session.identity();
        assert_eq!(identity.username.as_deref(), Some("alice"));
        assert_eq!(identity.profile_pic.as_deref(), Some("old.png"));
        assert!(!identity.is_authenticated);
        assert!(f.session.has_identity());
        assert!(!f.session.is_authenticated());
    }

    #[test]
    fn test_login_persists_username() {
        let f = fixture(MockTransport::new(), None);
        assert!(!f.session.has_identity());

        f.session.login("bob").unwrap();
        assert!(f.session.is_authenticated());
        assert_eq!(f.storage.get(USERNAME_KEY).unwrap(), Some("bob".to_string()));
        assert!(f.transport.calls().is_empty());
    }

    #[test]
    fn test_set_profile_pic_persists_only_non_empty() {
        let f = fixture(MockTransport::new(), Some("alice"));

        f.session.set_profile_pic(Some("new.png")).unwrap();
        assert_eq!(f.session.profile_pic().as_deref(), Some("new.png"));
        assert_eq!(f.storage.get(PROFILE_PIC_KEY).unwrap(), Some("new.png".to_string()));

        f.session.set_profile_pic(None).unwrap();
        assert_eq!(f.session.profile_pic(), None);
        assert_eq!(f.storage.get(PROFILE_PIC_KEY).unwrap(), Some("new.png".to_string()));

        f.session.set_profile_pic(Some("")).unwrap();
        assert_eq!(f.session.profile_pic(), None);
        assert_eq!(f.storage.get(PROFILE_PIC_KEY).unwrap(), Some("new.png".to_string()));
    }

    #[test]
    fn test_logout_clears_identity_and_meal_plan() {
        let f = fixture(MockTransport::new(), Some("alice"));
        f.session.login("alice").unwrap();
        f.session.meal_plan().add(RecipeSummary::new(1)).unwrap();

        f.session.logout().unwrap();

        assert_eq!(f.session.identity(), SessionIdentity::default());
        assert!(f.session.meal_plan().is_empty());
        assert_eq!(f.storage.get(USERNAME_KEY).unwrap(), None);
        assert_eq!(f.storage.get(PROFILE_PIC_KEY).unwrap(), None);
        assert_eq!(f.storage.get(MEAL_PLAN_KEY).unwrap(), None);
        assert!(f.storage.is_empty());
    }

    #[tokio::test]
    async fn test_validate_without_username_skips_network() {
        let f = fixture(MockTransport::new(), None);
        let outcome = f.session.validate_session().await;
        assert_eq!(outcome, ValidationOutcome::NoIdentity);
        assert!(!outcome.is_valid());
        assert!(f.transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_validate_success_updates_profile_pic() {
        let transport = MockTransport::new().ok(
            USER_INFORMATION_PATH,
            json!({"data": {"profilePic": "fresh.png", "username": "alice"}}),
        );
        let f = fixture(transport, Some("alice"));

        assert_eq!(f.session.validate_session().await, ValidationOutcome::Valid);
        assert!(f.session.is_authenticated());
        assert_eq!(f.session.profile_pic().as_deref(), Some("fresh.png"));
        assert_eq!(f.storage.get(PROFILE_PIC_KEY).unwrap(), Some("fresh.png".to_string()));
        assert_eq!(f.transport.calls(), vec![USER_INFORMATION_PATH.to_string()]);
    }

    #[tokio::test]
    async fn test_validate_rejection_logs_out() {
        let transport = MockTransport::new().reply(
            USER_INFORMATION_PATH,
            Reply::Respond(ApiResponse::new(401, json!({"message": "unauthorized"}))),
        );
        let f = fixture(transport, Some("alice"));
        f.session.meal_plan().add(RecipeSummary::new(1)).unwrap();

        assert_eq!(f.session.validate_session().await, ValidationOutcome::Rejected);
        assert_eq!(f.session.identity(), SessionIdentity::default());
        assert!(f.session.meal_plan().is_empty());
        assert_eq!(f.storage.get(USERNAME_KEY).unwrap(), None);
        assert_eq!(f.storage.get(MEAL_PLAN_KEY).unwrap(), None);

        let received = f.sink.received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].2, Severity::Warning);
    }

    #[tokio::test]
    async fn test_validate_network_error_keeps_identity() {
        let transport = MockTransport::new().reply(
            USER_INFORMATION_PATH,
            Reply::Fail(TransportError::Network("connection refused".to_string())),
        );
        let f = fixture(transport, Some("alice"));
        f.session.login("alice").unwrap();
        f.session.meal_plan().add(RecipeSummary::new(1)).unwrap();

        assert_eq!(f.session.validate_session().await, ValidationOutcome::Unreachable);
        let identity = f.session.identity();
        assert_eq!(identity.username.as_deref(), Some("alice"));
        assert_eq!(identity.profile_pic.as_deref(), Some("old.png"));
        assert!(!identity.is_authenticated);
        assert_eq!(f.session.meal_plan().len(), 1);
        assert_eq!(f.storage.get(USERNAME_KEY).unwrap(), Some("alice".to_string()));
        assert!(f.sink.received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validate_without_picture_keeps_current() {
        let transport =
            MockTransport::new().ok(USER_INFORMATION_PATH, json!({"data": {"username": "alice"}}));
        let f = fixture(transport, Some("alice"));

        assert_eq!(f.session.validate_session().await, ValidationOutcome::Valid);
        assert_eq!(f.session.profile_pic().as_deref(), Some("old.png"));
        assert_eq!(f.storage.get(PROFILE_PIC_KEY).unwrap(), Some("old.png".to_string()));
    }

    /// Memory store whose meal plan key cannot be deleted.
    #[derive(Default)]
    struct StuckPlanStore {
        inner: MemoryStore,
    }

    impl DurableStore for StuckPlanStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.inner.set(key, value)
        }
        fn remove(&self, key: &str) -> Result<()> {
            if key == MEAL_PLAN_KEY {
                return Err(RecipeStateError::Storage("locked".to_string()));
            }
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_failed_plan_removal_does_not_reach_next_user() {
        let storage = Arc::new(StuckPlanStore::default());
        let meal_plan = Arc::new(MealPlanStore::load(storage.clone()).unwrap());
        let session = SessionManager::restore(
            storage,
            Arc::new(MockTransport::new()),
            meal_plan,
            Notifier::default(),
        )
        .unwrap();

        session.login("alice").unwrap();
        session.meal_plan().add(RecipeSummary::new(1)).unwrap();

        assert!(session.logout().is_err());
        assert_eq!(session.identity(), SessionIdentity::default());
        assert!(session.meal_plan().is_empty());

        session.login("bob").unwrap();
        assert!(session.meal_plan().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_during_rejected_validation_is_kept() {
        let transport = MockTransport::new().reply(
            USER_INFORMATION_PATH,
            Reply::Delayed(
                std::time::Duration::from_secs(1),
                ApiResponse::new(401, json!({"message": "unauthorized"})),
            ),
        );
        let f = Arc::new(fixture(transport, Some("alice")));

        let validating = {
            let f = f.clone();
            tokio::spawn(async move { f.session.validate_session().await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        f.session.login("bob").unwrap();
        f.session.meal_plan().add(RecipeSummary::new(3)).unwrap();

        assert_eq!(validating.await.unwrap(), ValidationOutcome::Superseded);
        assert_eq!(f.session.username().as_deref(), Some("bob"));
        assert!(f.session.is_authenticated());
        assert_eq!(f.session.meal_plan().len(), 1);
        assert!(f.sink.received.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_during_validation_wins() {
        let transport = MockTransport::new().reply(
            USER_INFORMATION_PATH,
            Reply::Delayed(
                std::time::Duration::from_secs(1),
                ApiResponse::new(200, json!({"data": {"profilePic": "late.png"}})),
            ),
        );
        let f = Arc::new(fixture(transport, Some("alice")));

        let validating = {
            let f = f.clone();
            tokio::spawn(async move { f.session.validate_session().await })
        };
        // Let the validation reach its in-flight request
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        f.session.logout().unwrap();

        assert_eq!(validating.await.unwrap(), ValidationOutcome::Superseded);
        assert_eq!(f.session.identity(), SessionIdentity::default());
    }
}
