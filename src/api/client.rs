use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client as HttpClient;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::api::PhonebookApi;
use crate::api::models::{
    AuthResponse, BearerToken, Contact, ContactId, LoginRequest, NewContact, SignupRequest, User,
};
use crate::error::Error;

pub const DEFAULT_BASE_URL: &str = "https://connections-api.goit.global";

pub struct ApiClient {
    http: HttpClient,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, Error> {
        Ok(Self {
            http: HttpClient::new(),
            base_url: Self::base_api(base_url)?,
        })
    }

    // A trailing slash keeps `Url::join` from dropping the last path segment.
    fn base_api(base_url: &str) -> Result<Url, Error> {
        let normalized = crate::utils::normalize_url(base_url);
        let trimmed = normalized.trim_end_matches('/');
        Ok(Url::parse(&format!("{}/", trimmed))?)
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn with_auth(req: RequestBuilder, token: Option<&BearerToken>) -> RequestBuilder {
        match token {
            Some(t) => req.bearer_auth(t.as_str()),
            None => req,
        }
    }

    fn request(&self, method: Method, path: &str, token: Option<&BearerToken>) -> Result<RequestBuilder, Error> {
        let url = self.endpoint(path)?;
        debug!("{method} {url}");
        Ok(Self::with_auth(self.http.request(method, url), token))
    }

    async fn check(resp: Response) -> Result<Response, Error> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let err = Error::from_status(status.as_u16(), &body);
        warn!("{} {} failed: {err}", status.as_u16(), status.canonical_reason().unwrap_or(""));
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, Error> {
        let resp = Self::check(req.send().await?).await?;
        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|e| Error::Decode(e.to_string()))
    }
}

#[async_trait]
impl PhonebookApi for ApiClient {
    async fn signup(&self, req: &SignupRequest) -> Result<AuthResponse, Error> {
        let builder = self.request(Method::POST, "users/signup", None)?.json(req);
        Self::send_json(builder).await
    }

    async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, Error> {
        let builder = self.request(Method::POST, "users/login", None)?.json(req);
        Self::send_json(builder).await
    }

    async fn logout(&self, token: &BearerToken) -> Result<(), Error> {
        let builder = self.request(Method::POST, "users/logout", Some(token))?;
        Self::check(builder.send().await?).await?;
        Ok(())
    }

    async fn current_user(&self, token: &BearerToken) -> Result<User, Error> {
        let builder = self.request(Method::GET, "users/current", Some(token))?;
        Self::send_json(builder).await
    }

    async fn list_contacts(&self, token: &BearerToken) -> Result<Vec<Contact>, Error> {
        let builder = self.request(Method::GET, "contacts", Some(token))?;
        Self::send_json(builder).await
    }

    async fn create_contact(&self, token: &BearerToken, contact: &NewContact) -> Result<Contact, Error> {
        let builder = self.request(Method::POST, "contacts", Some(token))?.json(contact);
        Self::send_json(builder).await
    }

    async fn delete_contact(&self, token: &BearerToken, id: &ContactId) -> Result<Contact, Error> {
        let path = format!("contacts/{}", id.as_str());
        let builder = self.request(Method::DELETE, &path, Some(token))?;
        Self::send_json(builder).await
    }
}
