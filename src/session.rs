//! Authentication state and the transitions that move it.
//!
//! The session is either still being validated at startup (`Unknown`), known
//! to be anonymous, or authenticated. Only a successful register, login or
//! refresh enters `Authenticated`; only logout or a failed refresh leaves it.

use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info, warn};

use crate::api::PhonebookApi;
use crate::api::models::{AuthResponse, BearerToken, LoginRequest, SignupRequest, User};
use crate::contacts::ContactRepository;
use crate::error::{Error, ValidationError};
use crate::storage::{PersistedSession, TokenStore};
use crate::utils::is_valid_email;

pub const NAME_LEN: (usize, usize) = (3, 50);
pub const PASSWORD_LEN: (usize, usize) = (6, 50);

fn check_length(field: &'static str, value: &str, (min, max): (usize, usize)) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Required(field));
    }
    let len = value.chars().count();
    if (min..=max).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::Length { field, min, max })
    }
}

fn check_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::Required("email"));
    }
    if !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

/// Registration form rules: name 3–50 characters, a valid email, password 6–50 characters.
pub fn validate_signup(req: &SignupRequest) -> Result<(), ValidationError> {
    check_length("name", &req.name, NAME_LEN)?;
    check_email(&req.email)?;
    check_length("password", &req.password, PASSWORD_LEN)
}

/// Login only needs a valid email and a non-empty password.
pub fn validate_login(req: &LoginRequest) -> Result<(), ValidationError> {
    check_email(&req.email)?;
    if req.password.is_empty() {
        return Err(ValidationError::Required("password"));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub token: Option<BearerToken>,
    pub is_logged_in: bool,
    pub is_refreshing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unknown,
    Anonymous,
    Authenticated,
}

impl Session {
    /// Runtime state for a fresh process: defaults plus whatever token survived.
    pub fn rehydrate(persisted: PersistedSession) -> Self {
        let is_refreshing = persisted.token.is_some();
        Self {
            token: persisted.token,
            is_refreshing,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.is_logged_in {
            SessionPhase::Authenticated
        } else if self.is_refreshing {
            SessionPhase::Unknown
        } else {
            SessionPhase::Anonymous
        }
    }

    fn authenticate(&mut self, user: User, token: BearerToken) {
        self.user = user;
        self.token = Some(token);
        self.is_logged_in = true;
        self.is_refreshing = false;
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Result of a logout: local state is cleared either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutOutcome {
    Confirmed,
    LocalOnly(Error),
}

struct Inner {
    session: Session,
    // Bumped by every login/register/logout so an older refresh cannot land.
    epoch: u64,
}

pub struct SessionController {
    api: Arc<dyn PhonebookApi>,
    store: Arc<dyn TokenStore>,
    inner: Mutex<Inner>,
}

impl SessionController {
    /// Builds the controller from whatever the token store holds.
    pub fn rehydrate(api: Arc<dyn PhonebookApi>, store: Arc<dyn TokenStore>) -> Self {
        let token = store.load().unwrap_or_else(|e| {
            warn!("could not read persisted token: {e}");
            None
        });
        let session = Session::rehydrate(PersistedSession { token });
        debug!("session rehydrated in phase {:?}", session.phase());
        Self {
            api,
            store,
            inner: Mutex::new(Inner { session, epoch: 0 }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> Session {
        self.lock().session.clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().session.phase()
    }

    pub fn is_logged_in(&self) -> bool {
        self.lock().session.is_logged_in
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().session.is_refreshing
    }

    pub fn user(&self) -> User {
        self.lock().session.user.clone()
    }

    /// The bearer credential for authenticated calls, present only once the
    /// session is authenticated.
    pub fn credential(&self) -> Option<BearerToken> {
        let inner = self.lock();
        if inner.session.is_logged_in {
            inner.session.token.clone()
        } else {
            None
        }
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, Error> {
        let req = SignupRequest {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        validate_signup(&req)?;
        match self.api.signup(&req).await {
            Ok(resp) => Ok(self.establish(resp, "registered")),
            Err(e) => {
                warn!("registration failed: {e}");
                Err(e)
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, Error> {
        let req = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        validate_login(&req)?;
        match self.api.login(&req).await {
            Ok(resp) => Ok(self.establish(resp, "logged in")),
            Err(e) => {
                warn!("login failed: {e}");
                Err(e)
            }
        }
    }

    fn establish(&self, resp: AuthResponse, what: &str) -> User {
        let AuthResponse { user, token } = resp;
        {
            let mut inner = self.lock();
            inner.epoch += 1;
            inner.session.authenticate(user.clone(), token.clone());
        }
        // Persisting is best-effort; the in-memory session stays authenticated.
        if let Err(e) = self.store.save(&token) {
            warn!("could not persist token: {e}");
        }
        info!("{what} as {}", user.email.as_deref().or(user.name.as_deref()).unwrap_or("<unknown>"));
        user
    }

    /// Ends the session. The remote call is best-effort; local state, the
    /// persisted token and the contact list are cleared regardless.
    pub async fn logout(&self, contacts: &ContactRepository) -> LogoutOutcome {
        let token = {
            let inner = self.lock();
            inner.session.token.clone()
        };

        let remote = match &token {
            Some(token) => self.api.logout(token).await,
            None => Err(Error::MissingCredential),
        };

        {
            let mut inner = self.lock();
            inner.epoch += 1;
            inner.session.reset();
        }
        if let Err(e) = self.store.clear() {
            warn!("could not clear persisted token: {e}");
        }
        contacts.clear();

        match remote {
            Ok(()) => {
                info!("logged out");
                LogoutOutcome::Confirmed
            }
            Err(e) => {
                warn!("logout not confirmed by server, cleared locally: {e}");
                LogoutOutcome::LocalOnly(e)
            }
        }
    }

    /// Validates the persisted token at startup. Without one, settles on
    /// `Anonymous` without touching the network and returns `Ok(None)`.
    /// An already authenticated session is left as is.
    pub async fn refresh(&self) -> Result<Option<User>, Error> {
        let (token, epoch) = {
            let mut inner = self.lock();
            if inner.session.is_logged_in {
                debug!("session already authenticated, skipping refresh");
                return Ok(Some(inner.session.user.clone()));
            }
            match inner.session.token.clone() {
                Some(token) => {
                    inner.session.is_refreshing = true;
                    (token, inner.epoch)
                }
                None => {
                    inner.session.is_refreshing = false;
                    debug!("no persisted token, session is anonymous");
                    return Ok(None);
                }
            }
        };

        let result = self.api.current_user(&token).await;

        let mut inner = self.lock();
        if inner.epoch != epoch {
            debug!("discarding refresh result: session changed while it was in flight");
            return result.map(Some);
        }
        match result {
            Ok(user) => {
                inner.session.authenticate(user.clone(), token);
                info!("session restored");
                Ok(Some(user))
            }
            Err(e) => {
                inner.session.reset();
                drop(inner);
                warn!("session refresh failed: {e}");
                if e == Error::Unauthorized {
                    if let Err(store_err) = self.store.clear() {
                        warn!("could not clear rejected token: {store_err}");
                    }
                }
                Err(e)
            }
        }
    }
}
