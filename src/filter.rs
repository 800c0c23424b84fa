use std::sync::{Arc, Mutex};

use crate::api::models::Contact;
use crate::utils::contains_ignore_case;

/// Contacts whose name contains `name`, ignoring case. An empty filter keeps everything.
pub fn filter_contacts(items: &[Contact], name: &str) -> Vec<Contact> {
    if name.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|c| contains_ignore_case(&c.name, name))
        .cloned()
        .collect()
}

struct Memo {
    items: Arc<Vec<Contact>>,
    name: String,
    result: Arc<Vec<Contact>>,
}

/// Search box state plus a one-entry cache of the last derived list.
///
/// The cache is keyed by the identity of the items snapshot and the filter
/// string, so it recomputes only when either changes.
#[derive(Default)]
pub struct FilterView {
    name: Mutex<String>,
    memo: Mutex<Option<Memo>>,
}

impl FilterView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> String {
        self.name.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.lock().unwrap_or_else(|p| p.into_inner()) = name.into();
    }

    pub fn clear(&self) {
        self.set_name(String::new());
    }

    pub fn filtered(&self, items: &Arc<Vec<Contact>>) -> Arc<Vec<Contact>> {
        let name = self.name();
        if name.is_empty() {
            return Arc::clone(items);
        }

        let mut memo = self.memo.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(m) = memo.as_ref() {
            if Arc::ptr_eq(&m.items, items) && m.name == name {
                return Arc::clone(&m.result);
            }
        }
        let result = Arc::new(filter_contacts(items, &name));
        *memo = Some(Memo {
            items: Arc::clone(items),
            name,
            result: Arc::clone(&result),
        });
        result
    }
}
