//! In-memory contact list kept in step with the remote service.
//!
//! Each call mutates the list once, when its own response arrives. Calls are
//! never serialized against each other; because every mutation targets a
//! distinct id, the outcome does not depend on completion order.

use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};

use crate::api::PhonebookApi;
use crate::api::models::{BearerToken, Contact, ContactId, NewContact};
use crate::error::{Error, ValidationError};
use crate::utils::eq_ignore_case;

pub const MIN_FIELD_LEN: usize = 3;
pub const MAX_FIELD_LEN: usize = 50;

/// What readers see: an immutable list plus request status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactListState {
    pub items: Arc<Vec<Contact>>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Default)]
struct Inner {
    items: Arc<Vec<Contact>>,
    in_flight: usize,
    error: Option<String>,
    epoch: u64,
}

impl Inner {
    fn replace_items(&mut self, items: Vec<Contact>) {
        self.items = Arc::new(items);
    }
}

/// Ticket handed out when a call starts, checked when it completes.
struct Pending {
    epoch: u64,
}

pub struct ContactRepository {
    api: Arc<dyn PhonebookApi>,
    inner: Mutex<Inner>,
}

fn check_length(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if (MIN_FIELD_LEN..=MAX_FIELD_LEN).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::Length {
            field,
            min: MIN_FIELD_LEN,
            max: MAX_FIELD_LEN,
        })
    }
}

/// Local checks run before an add is sent: field lengths and a
/// case-insensitive name collision against `items`. The service does not
/// reject duplicate names, so this is the only place they are caught.
pub fn validate_new_contact(items: &[Contact], contact: &NewContact) -> Result<(), ValidationError> {
    check_length("name", &contact.name)?;
    check_length("number", &contact.number)?;
    if items.iter().any(|c| eq_ignore_case(&c.name, &contact.name)) {
        return Err(ValidationError::DuplicateName(contact.name.clone()));
    }
    Ok(())
}

impl ContactRepository {
    pub fn new(api: Arc<dyn PhonebookApi>) -> Self {
        Self {
            api,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> ContactListState {
        let inner = self.lock();
        ContactListState {
            items: Arc::clone(&inner.items),
            loading: inner.in_flight > 0,
            error: inner.error.clone(),
        }
    }

    pub fn items(&self) -> Arc<Vec<Contact>> {
        Arc::clone(&self.lock().items)
    }

    pub fn is_loading(&self) -> bool {
        self.lock().in_flight > 0
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn find(&self, id: &ContactId) -> Option<Contact> {
        self.lock().items.iter().find(|c| &c.id == id).cloned()
    }

    fn begin(&self) -> Pending {
        let mut inner = self.lock();
        inner.in_flight += 1;
        inner.error = None;
        Pending { epoch: inner.epoch }
    }

    /// Applies a completed call. Returns `false` when the list was cleared
    /// while the call was outstanding; its result is then dropped.
    fn finish<T>(
        &self,
        pending: Pending,
        op: &str,
        result: &Result<T, Error>,
        apply: impl FnOnce(&mut Inner, &T),
    ) -> bool {
        let mut inner = self.lock();
        if inner.epoch != pending.epoch {
            debug!("{op}: list was cleared while the call was in flight, ignoring result");
            return false;
        }
        inner.in_flight = inner.in_flight.saturating_sub(1);
        match result {
            Ok(value) => apply(&mut *inner, value),
            Err(e) => {
                warn!("{op} failed: {e}");
                inner.error = Some(e.to_string());
            }
        }
        true
    }

    pub async fn fetch_all(&self, credential: Option<&BearerToken>) -> Result<Arc<Vec<Contact>>, Error> {
        let token = credential.ok_or(Error::MissingCredential)?;
        let pending = self.begin();
        let result = self.api.list_contacts(token).await;
        let applied = self.finish(pending, "fetch contacts", &result, |inner, list| {
            inner.replace_items(list.clone());
            inner.error = None;
        });
        result.map(|list| if applied { self.items() } else { Arc::new(list) })
    }

    pub async fn add(&self, credential: Option<&BearerToken>, name: &str, number: &str) -> Result<Contact, Error> {
        let contact = NewContact {
            name: name.trim().to_string(),
            number: number.trim().to_string(),
        };
        validate_new_contact(&self.items(), &contact)?;
        let token = credential.ok_or(Error::MissingCredential)?;

        let pending = self.begin();
        let result = self.api.create_contact(token, &contact).await;
        self.finish(pending, "add contact", &result, |inner, created| {
            let mut next = Vec::with_capacity(inner.items.len() + 1);
            next.extend(inner.items.iter().cloned());
            next.push(created.clone());
            inner.replace_items(next);
        });
        result
    }

    pub async fn delete(&self, credential: Option<&BearerToken>, id: &ContactId) -> Result<Contact, Error> {
        let token = credential.ok_or(Error::MissingCredential)?;
        let pending = self.begin();
        let result = self.api.delete_contact(token, id).await;
        self.finish(pending, "delete contact", &result, |inner, deleted| {
            let next = inner.items.iter().filter(|c| c.id != deleted.id).cloned().collect();
            inner.replace_items(next);
        });
        result
    }

    /// Drops the list and any outstanding call results. No network.
    pub fn clear(&self) {
        let mut inner = self.lock();
        let epoch = inner.epoch + 1;
        *inner = Inner {
            epoch,
            ..Inner::default()
        };
    }
}
