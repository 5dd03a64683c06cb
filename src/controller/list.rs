//! Paginated list screen state shared by every resource kind.
//!
//! A load is split in two halves so that overlapping requests resolve
//! deterministically:
//!
//! ```text
//! let ticket = controller.begin_search("ab")?;   // phase = Loading, generation bumped
//! let result = controller.api().list(&ticket.query).await;
//! controller.complete(ticket, result);          // ignored unless ticket is the latest
//! ```
//!
//! The async helpers (`mount`, `set_search_query`, `set_page`, `refresh`)
//! run both halves in sequence.

use std::collections::{BTreeMap, HashSet};
use std::marker::PhantomData;

use serde_json::Value;

use crate::api::models::Page;
use crate::api::{total_pages, ListQuery, Resource, ResourceApi};
use crate::controller::picker::UserSelection;
use crate::error::{AppError, AppResult, ErrorState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListPhase {
    Idle,
    Loading,
    Loaded,
    Error(ErrorState),
    /// Redirected to login; nothing was fetched.
    LoginRequired,
}

/// A list request issued by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    generation: u64,
    pub query: ListQuery,
}

impl ListRequest {
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Local editable copy of a record plus display labels for its references.
#[derive(Debug, Clone, PartialEq)]
pub struct EditBuffer<T> {
    pub record: T,
    pub labels: BTreeMap<String, String>,
}

pub struct ResourceListController<T: Resource, A: ResourceApi<T>> {
    api: A,
    phase: ListPhase,
    items: Vec<T>,
    page: u64,
    total_pages: u64,
    total_count: u64,
    search_query: String,
    selected: Option<EditBuffer<T>>,
    generation: u64,
    _kind: PhantomData<fn() -> T>,
}

impl<T: Resource, A: ResourceApi<T>> ResourceListController<T, A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            phase: ListPhase::Idle,
            items: Vec::new(),
            page: 1,
            total_pages: 0,
            total_count: 0,
            search_query: String::new(),
            selected: None,
            generation: 0,
            _kind: PhantomData,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn phase(&self) -> &ListPhase {
        &self.phase
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn total_pages(&self) -> u64 {
        self.total_pages
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn selected(&self) -> Option<&EditBuffer<T>> {
        self.selected.as_ref()
    }

    pub fn error(&self) -> Option<&ErrorState> {
        match &self.phase {
            ListPhase::Error(state) => Some(state),
            _ => None,
        }
    }

    /// First load: page 1, empty search.
    pub fn begin_mount(&mut self) -> Option<ListRequest> {
        self.page = 1;
        self.search_query.clear();
        self.begin_load()
    }

    /// New search text; always restarts from page 1.
    pub fn begin_search(&mut self, query: impl Into<String>) -> Option<ListRequest> {
        self.search_query = query.into();
        self.page = 1;
        self.begin_load()
    }

    /// `None` without any state change when `page` is outside `[1, total_pages]`.
    pub fn begin_page(&mut self, page: u64) -> Option<ListRequest> {
        if page < 1 || page > self.total_pages {
            tracing::debug!(
                resource = %T::KIND,
                page,
                total_pages = self.total_pages,
                "page out of range"
            );
            return None;
        }
        self.page = page;
        self.begin_load()
    }

    /// Reload the current page and search.
    pub fn begin_refresh(&mut self) -> Option<ListRequest> {
        self.begin_load()
    }

    fn begin_load(&mut self) -> Option<ListRequest> {
        self.generation += 1;

        if self.api.session().require_auth_or_redirect().is_err() {
            self.items.clear();
            self.phase = ListPhase::LoginRequired;
            return None;
        }

        self.phase = ListPhase::Loading;
        Some(ListRequest {
            generation: self.generation,
            query: ListQuery::new(self.page, self.search_query.clone()),
        })
    }

    /// Apply the outcome of `request`. Returns false if it was superseded.
    pub fn complete(&mut self, request: ListRequest, result: AppResult<Page<T>>) -> bool {
        if request.generation != self.generation {
            tracing::debug!(
                resource = %T::KIND,
                stale = request.generation,
                current = self.generation,
                "discarding stale list response"
            );
            return false;
        }

        match result {
            Ok(page) => {
                let received = page.results.len();
                let mut seen = HashSet::new();
                self.items = page
                    .results
                    .into_iter()
                    .filter(|record| seen.insert(record.id()))
                    .collect();
                if self.items.len() != received {
                    tracing::warn!(
                        resource = %T::KIND,
                        received,
                        kept = self.items.len(),
                        "dropped rows with duplicate ids"
                    );
                }
                self.total_count = page.count;
                self.total_pages = total_pages(page.count);
                self.phase = ListPhase::Loaded;
            }
            Err(e) if e.requires_login() => {
                self.api.session().redirect_to_login();
                self.items.clear();
                self.phase = ListPhase::LoginRequired;
            }
            Err(e) => {
                tracing::error!(resource = %T::KIND, error = %e, "list failed");
                self.items.clear();
                self.phase =
                    ListPhase::Error(ErrorState::new(format!("Error fetching {}", T::KIND), &e));
            }
        }
        true
    }

    async fn run(&mut self, request: Option<ListRequest>) -> bool {
        let Some(request) = request else {
            return false;
        };
        let result = self.api.list(&request.query).await;
        self.complete(request, result)
    }

    pub async fn mount(&mut self) -> bool {
        let request = self.begin_mount();
        self.run(request).await
    }

    pub async fn set_search_query(&mut self, query: impl Into<String>) -> bool {
        let request = self.begin_search(query);
        self.run(request).await
    }

    pub async fn set_page(&mut self, page: u64) -> bool {
        let request = self.begin_page(page);
        self.run(request).await
    }

    pub async fn refresh(&mut self) -> bool {
        let request = self.begin_refresh();
        self.run(request).await
    }

    /// Open `record` for editing. The list entry is left untouched.
    pub fn select(&mut self, record: &T) {
        self.selected = Some(EditBuffer {
            record: record.clone(),
            labels: BTreeMap::new(),
        });
    }

    /// Open the loaded row with `id`, if present.
    pub fn select_id(&mut self, id: i64) -> bool {
        match self.items.iter().find(|item| item.id() == id).cloned() {
            Some(record) => {
                self.select(&record);
                true
            }
            None => false,
        }
    }

    /// Set one field of the edit buffer.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidField` when nothing is selected, the field is
    /// `id` or unknown, or the value does not fit the field's type. The buffer
    /// is unchanged on error.
    pub fn edit_field(&mut self, field: &str, value: Value) -> AppResult<()> {
        let buffer = self
            .selected
            .as_mut()
            .ok_or_else(|| AppError::InvalidField("no record selected".to_string()))?;

        if field == "id" {
            return Err(AppError::InvalidField("id is assigned by the server".to_string()));
        }

        let mut json = serde_json::to_value(&buffer.record)
            .map_err(|e| AppError::InvalidField(e.to_string()))?;
        let Some(object) = json.as_object_mut() else {
            return Err(AppError::InvalidField(format!(
                "{} is not an object",
                T::KIND.singular()
            )));
        };
        if !object.contains_key(field) {
            return Err(AppError::InvalidField(format!(
                "{} has no field '{field}'",
                T::KIND.singular()
            )));
        }
        object.insert(field.to_string(), value);

        buffer.record =
            serde_json::from_value(json).map_err(|e| AppError::InvalidField(format!("{field}: {e}")))?;
        buffer.labels.remove(field);
        Ok(())
    }

    /// Merge a picked user into the edit buffer.
    ///
    /// # Errors
    ///
    /// Same as [`Self::edit_field`].
    pub fn merge_user(&mut self, field: &str, selection: &UserSelection) -> AppResult<()> {
        self.edit_field(field, Value::from(selection.id))?;
        if let Some(buffer) = self.selected.as_mut() {
            buffer
                .labels
                .insert(field.to_string(), selection.display_name.clone());
        }
        Ok(())
    }

    /// Send the edit buffer with `update` and reconcile the loaded rows.
    ///
    /// On failure the buffer is kept so the edits can be retried.
    pub async fn save(&mut self) -> bool {
        let Some(buffer) = self.selected.as_ref() else {
            return false;
        };
        let id = buffer.record.id();
        let result = self.api.update(id, &buffer.record).await;

        match result {
            Ok(_) => {
                if let Some(buffer) = self.selected.take() {
                    if let Some(item) = self.items.iter_mut().find(|item| item.id() == id) {
                        *item = buffer.record;
                    }
                }
                self.phase = ListPhase::Loaded;
                tracing::info!(resource = %T::KIND, id, "saved");
                true
            }
            Err(e) => {
                if e.requires_login() {
                    self.api.session().redirect_to_login();
                }
                tracing::error!(resource = %T::KIND, id, error = %e, "save failed");
                self.phase = ListPhase::Error(ErrorState::new(
                    format!("Error updating {}", T::KIND.singular()),
                    &e,
                ));
                false
            }
        }
    }

    /// Drop the edit buffer without saving.
    pub fn close(&mut self) {
        self.selected = None;
    }
}
