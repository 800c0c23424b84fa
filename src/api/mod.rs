pub mod client;
pub mod models;

use async_trait::async_trait;

use crate::error::Error;
use models::{AuthResponse, BearerToken, Contact, ContactId, LoginRequest, NewContact, SignupRequest, User};

/// The remote connections service. `ApiClient` talks to it over HTTPS; tests
/// substitute an in-memory implementation.
#[async_trait]
pub trait PhonebookApi: Send + Sync {
    async fn signup(&self, req: &SignupRequest) -> Result<AuthResponse, Error>;
    async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, Error>;
    async fn logout(&self, token: &BearerToken) -> Result<(), Error>;
    async fn current_user(&self, token: &BearerToken) -> Result<User, Error>;
    async fn list_contacts(&self, token: &BearerToken) -> Result<Vec<Contact>, Error>;
    async fn create_contact(&self, token: &BearerToken, contact: &NewContact) -> Result<Contact, Error>;
    async fn delete_contact(&self, token: &BearerToken, id: &ContactId) -> Result<Contact, Error>;
}
