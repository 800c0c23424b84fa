#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use phonebook_client::Error;
use phonebook_client::api::PhonebookApi;
use phonebook_client::api::models::{
    AuthResponse, BearerToken, Contact, ContactId, LoginRequest, NewContact, SignupRequest, User,
};

struct Account {
    name: String,
    password: String,
}

#[derive(Default)]
struct State {
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, String>,
    contacts: HashMap<String, Vec<Contact>>,
    next_token: u64,
    next_id: u64,
    offline: bool,
    latency: HashMap<String, Duration>,
}

/// In-memory stand-in for the connections service.
///
/// Latency keys: `current`, `logout`, `list`, `create:<name>`, `delete:<id>`.
#[derive(Default)]
pub struct FakeApi {
    state: Mutex<State>,
    calls: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn with_user(self, name: &str, email: &str, password: &str) -> Self {
        self.state().accounts.insert(
            email.to_string(),
            Account {
                name: name.to_string(),
                password: password.to_string(),
            },
        );
        self
    }

    pub fn issue_token(&self, email: &str) -> BearerToken {
        let mut st = self.state();
        st.next_token += 1;
        let token = format!("tok{}", st.next_token);
        st.tokens.insert(token.clone(), email.to_string());
        BearerToken::new(token)
    }

    pub fn seed_contacts(&self, email: &str, entries: &[(&str, &str)]) -> Vec<Contact> {
        let mut st = self.state();
        let mut created = Vec::new();
        for (name, number) in entries {
            st.next_id += 1;
            created.push(Contact {
                id: ContactId::new(format!("c{}", st.next_id)),
                name: name.to_string(),
                number: number.to_string(),
            });
        }
        st.contacts
            .entry(email.to_string())
            .or_default()
            .extend(created.iter().cloned());
        created
    }

    pub fn server_contacts(&self, email: &str) -> Vec<Contact> {
        self.state().contacts.get(email).cloned().unwrap_or_default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    pub fn set_latency(&self, key: &str, delay: Duration) {
        self.state().latency.insert(key.to_string(), delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn token_is_live(&self, token: &BearerToken) -> bool {
        self.state().tokens.contains_key(token.as_str())
    }

    async fn enter(&self, key: &str) -> Result<(), Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (offline, delay) = {
            let st = self.state();
            (st.offline, st.latency.get(key).copied())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if offline {
            return Err(Error::Transport("connection refused".into()));
        }
        Ok(())
    }

    fn owner(&self, token: &BearerToken) -> Result<String, Error> {
        self.state()
            .tokens
            .get(token.as_str())
            .cloned()
            .ok_or(Error::Unauthorized)
    }

    fn auth_response(&self, email: &str) -> AuthResponse {
        let name = self.state().accounts.get(email).map(|a| a.name.clone());
        AuthResponse {
            user: User {
                name,
                email: Some(email.to_string()),
            },
            token: self.issue_token(email),
        }
    }
}

#[async_trait]
impl PhonebookApi for FakeApi {
    async fn signup(&self, req: &SignupRequest) -> Result<AuthResponse, Error> {
        self.enter("signup").await?;
        {
            let mut st = self.state();
            if st.accounts.contains_key(&req.email) {
                return Err(Error::BadRequest("User with this email already exists".into()));
            }
            st.accounts.insert(
                req.email.clone(),
                Account {
                    name: req.name.clone(),
                    password: req.password.clone(),
                },
            );
        }
        Ok(self.auth_response(&req.email))
    }

    async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, Error> {
        self.enter("login").await?;
        let ok = self
            .state()
            .accounts
            .get(&req.email)
            .is_some_and(|a| a.password == req.password);
        if !ok {
            return Err(Error::BadRequest("Invalid email or password".into()));
        }
        Ok(self.auth_response(&req.email))
    }

    async fn logout(&self, token: &BearerToken) -> Result<(), Error> {
        self.enter("logout").await?;
        self.owner(token)?;
        self.state().tokens.remove(token.as_str());
        Ok(())
    }

    async fn current_user(&self, token: &BearerToken) -> Result<User, Error> {
        self.enter("current").await?;
        let email = self.owner(token)?;
        let name = self.state().accounts.get(&email).map(|a| a.name.clone());
        Ok(User {
            name,
            email: Some(email),
        })
    }

    async fn list_contacts(&self, token: &BearerToken) -> Result<Vec<Contact>, Error> {
        self.enter("list").await?;
        let email = self.owner(token)?;
        Ok(self.server_contacts(&email))
    }

    async fn create_contact(&self, token: &BearerToken, contact: &NewContact) -> Result<Contact, Error> {
        self.enter(&format!("create:{}", contact.name)).await?;
        let email = self.owner(token)?;
        let mut st = self.state();
        st.next_id += 1;
        let created = Contact {
            id: ContactId::new(format!("c{}", st.next_id)),
            name: contact.name.clone(),
            number: contact.number.clone(),
        };
        st.contacts.entry(email).or_default().push(created.clone());
        Ok(created)
    }

    async fn delete_contact(&self, token: &BearerToken, id: &ContactId) -> Result<Contact, Error> {
        self.enter(&format!("delete:{id}")).await?;
        let email = self.owner(token)?;
        let mut st = self.state();
        let list = st.contacts.entry(email).or_default();
        let pos = list.iter().position(|c| &c.id == id).ok_or(Error::NotFound)?;
        Ok(list.remove(pos))
    }
}
