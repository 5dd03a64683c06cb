//! Shared fakes for the controller tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use serde::Serialize;

use estate_admin::api::models::{Building, Device, Location, Page, Reading, Role, TokenPair, User};
use estate_admin::api::{ListQuery, Resource, ResourceApi};
use estate_admin::auth::{AuthSession, MemoryTokenStore, Navigator};
use estate_admin::error::{AppError, AppResult};

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: AtomicUsize,
}

impl RecordingNavigator {
    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Error the fake answers with until cleared.
#[derive(Debug, Clone)]
pub enum Failure {
    Http(u16, &'static str),
    Validation(&'static str, &'static str),
    Network,
}

impl Failure {
    fn to_error(&self) -> AppError {
        match self {
            Self::Http(status, message) => AppError::Http {
                status: *status,
                message: (*message).to_string(),
            },
            Self::Validation(field, message) => AppError::Validation {
                status: 400,
                fields: BTreeMap::from([((*field).to_string(), vec![(*message).to_string()])]),
            },
            Self::Network => AppError::Network("connection refused".to_string()),
        }
    }
}

/// In-memory stand-in for the remote API of one resource kind.
pub struct FakeApi<T> {
    session: AuthSession,
    pub navigator: Arc<RecordingNavigator>,
    pages: Mutex<HashMap<(u64, String), Page<T>>>,
    remote: Mutex<BTreeMap<i64, T>>,
    next_id: Mutex<i64>,
    pub list_failure: Mutex<Option<Failure>>,
    pub update_failure: Mutex<Option<Failure>>,
    pub create_failure: Mutex<Option<Failure>>,
    pub list_calls: Mutex<Vec<ListQuery>>,
    pub get_calls: Mutex<Vec<i64>>,
    pub updates: Mutex<Vec<(i64, T)>>,
    pub creates: Mutex<Vec<serde_json::Value>>,
    pub patches: Mutex<Vec<(i64, serde_json::Value)>>,
}

impl<T: Resource> FakeApi<T> {
    pub fn logged_in() -> Self {
        let store = MemoryTokenStore::with_tokens(TokenPair {
            access: "access-token".to_string(),
            refresh: "refresh-token".to_string(),
        });
        Self::with_store(store)
    }

    pub fn anonymous() -> Self {
        Self::with_store(MemoryTokenStore::new())
    }

    fn with_store(store: MemoryTokenStore) -> Self {
        let navigator = Arc::new(RecordingNavigator::default());
        let session = AuthSession::new(Arc::new(store), navigator.clone());
        Self {
            session,
            navigator,
            pages: Mutex::new(HashMap::new()),
            remote: Mutex::new(BTreeMap::new()),
            next_id: Mutex::new(1000),
            list_failure: Mutex::new(None),
            update_failure: Mutex::new(None),
            create_failure: Mutex::new(None),
            list_calls: Mutex::new(Vec::new()),
            get_calls: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            creates: Mutex::new(Vec::new()),
            patches: Mutex::new(Vec::new()),
        }
    }

    /// Serve `items` for `(page, search)` with a total of `count` records.
    pub fn with_page(self, page: u64, search: &str, count: u64, items: Vec<T>) -> Self {
        {
            let mut remote = self.remote.lock().unwrap();
            for item in &items {
                remote.insert(item.id(), item.clone());
            }
        }
        self.pages.lock().unwrap().insert(
            (page, search.to_string()),
            Page {
                count,
                next: None,
                previous: None,
                results: items,
            },
        );
        self
    }

    pub fn fail_lists(&self, failure: Failure) {
        *self.list_failure.lock().unwrap() = Some(failure);
    }

    pub fn fail_updates(&self, failure: Failure) {
        *self.update_failure.lock().unwrap() = Some(failure);
    }

    pub fn fail_creates(&self, failure: Failure) {
        *self.create_failure.lock().unwrap() = Some(failure);
    }

    pub fn remote(&self, id: i64) -> Option<T> {
        self.remote.lock().unwrap().get(&id).cloned()
    }

    pub fn list_count(&self) -> usize {
        self.list_calls.lock().unwrap().len()
    }

    pub fn last_list(&self) -> Option<ListQuery> {
        self.list_calls.lock().unwrap().last().cloned()
    }

    pub fn redirects(&self) -> usize {
        self.navigator.redirects()
    }
}

impl<T: Resource> ResourceApi<T> for FakeApi<T> {
    fn session(&self) -> &AuthSession {
        &self.session
    }

    async fn list(&self, query: &ListQuery) -> AppResult<Page<T>> {
        self.list_calls.lock().unwrap().push(query.clone());
        if let Some(failure) = self.list_failure.lock().unwrap().as_ref() {
            return Err(failure.to_error());
        }
        Ok(self
            .pages
            .lock()
            .unwrap()
            .get(&(query.page, query.search.clone()))
            .cloned()
            .unwrap_or(Page {
                count: 0,
                next: None,
                previous: None,
                results: Vec::new(),
            }))
    }

    async fn get(&self, id: i64) -> AppResult<T> {
        self.get_calls.lock().unwrap().push(id);
        self.remote
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(AppError::Http {
                status: 404,
                message: "Not found.".to_string(),
            })
    }

    async fn create<P: Serialize + Sync>(&self, payload: &P) -> AppResult<T> {
        let mut value = serde_json::to_value(payload).unwrap();
        self.creates.lock().unwrap().push(value.clone());
        if let Some(failure) = self.create_failure.lock().unwrap().as_ref() {
            return Err(failure.to_error());
        }
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            *next
        };
        value["id"] = serde_json::Value::from(id);
        let record: T = serde_json::from_value(value).map_err(|e| AppError::Decode(e.to_string()))?;
        self.remote.lock().unwrap().insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, id: i64, record: &T) -> AppResult<T> {
        if let Some(failure) = self.update_failure.lock().unwrap().as_ref() {
            return Err(failure.to_error());
        }
        self.updates.lock().unwrap().push((id, record.clone()));
        self.remote.lock().unwrap().insert(id, record.clone());
        Ok(record.clone())
    }

    async fn patch<P: Serialize + Sync>(&self, id: i64, partial: &P) -> AppResult<T> {
        let partial = serde_json::to_value(partial).unwrap();
        self.patches.lock().unwrap().push((id, partial.clone()));
        let current = self.get(id).await?;
        let mut merged = serde_json::to_value(current).unwrap();
        if let (Some(target), Some(fields)) = (merged.as_object_mut(), partial.as_object()) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        let record: T = serde_json::from_value(merged).map_err(|e| AppError::Decode(e.to_string()))?;
        self.remote.lock().unwrap().insert(id, record.clone());
        Ok(record)
    }
}

pub fn building(id: i64, number: i64) -> Building {
    Building {
        id,
        number,
        owner: Some(1),
        address: Some(format!("{number} Main Street")),
        floors: Some(3),
    }
}

pub fn buildings(ids: std::ops::RangeInclusive<i64>) -> Vec<Building> {
    ids.map(|id| building(id, id * 10)).collect()
}

pub fn user(id: i64, username: &str, first_name: &str, last_name: &str, role: Role) -> User {
    User {
        id,
        username: username.to_string(),
        role,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: format!("{username}@example.com"),
        is_active: true,
    }
}

pub fn device(id: i64, owner: Option<i64>) -> Device {
    Device {
        id,
        number: id,
        house: 7,
        location: Location::Kitchen,
        device_type: "water".to_string(),
        last_state: "ok".to_string(),
        owner,
    }
}

pub fn reading(id: i64, user: Option<i64>) -> Reading {
    Reading {
        id,
        device: 3,
        serial_number: 123_456,
        date: Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap(),
        reading_value: 12.5,
        unit: "m3".to_string(),
        power: 0.0,
        method: "radio".to_string(),
        battery_level: 87.0,
        user,
    }
}
