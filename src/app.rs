use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::api::PhonebookApi;
use crate::api::client::{ApiClient, DEFAULT_BASE_URL};
use crate::api::models::{Contact, ContactId, User};
use crate::contacts::{ContactListState, ContactRepository};
use crate::error::Error;
use crate::filter::FilterView;
use crate::guard::{self, Route};
use crate::session::{LogoutOutcome, Session, SessionController};
use crate::storage::{self, FileTokenStore, MemoryTokenStore, TokenStore};

pub const BASE_URL_ENV: &str = "PHONEBOOK_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Config {
    fn toml_path() -> Option<PathBuf> {
        Some(storage::config_dir()?.join("config.toml"))
    }

    /// Reads `config.toml`, then applies the environment override.
    pub fn load() -> Self {
        let mut config = Self::toml_path()
            .and_then(|path| fs::read_to_string(path).ok())
            .and_then(|text| match toml::from_str::<Config>(&text) {
                Ok(config) => Some(config),
                Err(e) => {
                    warn!("ignoring invalid config.toml: {e}");
                    None
                }
            })
            .unwrap_or_default();

        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                config.base_url = url;
            }
        }
        config.base_url = crate::utils::normalize_url(&config.base_url);
        config
    }

    pub fn save(&self) -> Result<(), Error> {
        let path = Self::toml_path().ok_or_else(|| Error::Storage("no config dir".into()))?;
        let text = toml::to_string_pretty(self).map_err(|e| Error::Storage(e.to_string()))?;
        storage::write_atomic(&path, &text)
    }
}

/// The whole client: session, contact list and search filter wired together.
pub struct Phonebook {
    pub session: SessionController,
    pub contacts: ContactRepository,
    pub filter: FilterView,
}

impl Phonebook {
    pub fn new(api: Arc<dyn PhonebookApi>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            session: SessionController::rehydrate(Arc::clone(&api), store),
            contacts: ContactRepository::new(api),
            filter: FilterView::new(),
        }
    }

    /// Builds the HTTP-backed client, persisting the token next to the config.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let api: Arc<dyn PhonebookApi> = Arc::new(ApiClient::new(&config.base_url)?);
        let store: Arc<dyn TokenStore> = match FileTokenStore::default_path() {
            Some(path) => Arc::new(FileTokenStore::new(path)),
            None => {
                warn!("no config directory available, session will not persist");
                Arc::new(MemoryTokenStore::new())
            }
        };
        info!("using {}", config.base_url);
        Ok(Self::new(api, store))
    }

    /// Startup: validate the persisted token, if any. A rejected token is not
    /// an error here; the session simply settles on anonymous.
    pub async fn start(&self) -> Option<User> {
        self.session.refresh().await.unwrap_or_default()
    }

    pub fn session(&self) -> Session {
        self.session.snapshot()
    }

    pub fn resolve(&self, route: Route) -> Route {
        guard::resolve(route, &self.session.snapshot())
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, Error> {
        self.session.register(name, email, password).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, Error> {
        self.session.login(email, password).await
    }

    pub async fn logout(&self) -> LogoutOutcome {
        self.filter.clear();
        self.session.logout(&self.contacts).await
    }

    pub async fn fetch_contacts(&self) -> Result<Arc<Vec<Contact>>, Error> {
        self.contacts.fetch_all(self.session.credential().as_ref()).await
    }

    pub async fn add_contact(&self, name: &str, number: &str) -> Result<Contact, Error> {
        self.contacts
            .add(self.session.credential().as_ref(), name, number)
            .await
    }

    pub async fn delete_contact(&self, id: &ContactId) -> Result<Contact, Error> {
        self.contacts.delete(self.session.credential().as_ref(), id).await
    }

    pub fn contact_state(&self) -> ContactListState {
        self.contacts.snapshot()
    }

    /// The list as currently filtered by the search box.
    pub fn visible_contacts(&self) -> Arc<Vec<Contact>> {
        self.filter.filtered(&self.contacts.items())
    }
}
