//! User picker modal: filter, choose or create a user for a host form.

use crate::api::models::{User, UserDraft};
use crate::api::{ListQuery, ResourceApi};
use crate::error::ErrorState;

/// Value handed to the host form when a user is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSelection {
    pub id: i64,
    pub display_name: String,
    pub user: User,
}

impl From<User> for UserSelection {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name(),
            user,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserFilterField {
    Username,
    FirstName,
    LastName,
    Email,
    Role,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilters {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Raw role code as typed, e.g. `"20"`; empty means any role.
    pub role: String,
}

impl UserFilters {
    /// The single full-text parameter the users endpoint accepts.
    #[must_use]
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.username, self.first_name, self.last_name, self.email
        )
    }

    #[must_use]
    pub fn to_query(&self) -> ListQuery {
        ListQuery::new(1, self.search_text()).with_filter("role", self.role.clone())
    }
}

/// Modal flow for choosing (or creating) the user referenced by a form field.
pub struct UserPickerController<A, F>
where
    A: ResourceApi<User>,
    F: FnMut(UserSelection),
{
    api: A,
    label: Option<String>,
    on_select: F,
    is_open: bool,
    filters: UserFilters,
    results: Vec<User>,
    is_searching: bool,
    error: Option<ErrorState>,
}

impl<A, F> UserPickerController<A, F>
where
    A: ResourceApi<User>,
    F: FnMut(UserSelection),
{
    pub fn new(api: A, label: Option<String>, on_select: F) -> Self {
        Self {
            api,
            label,
            on_select,
            is_open: false,
            filters: UserFilters::default(),
            results: Vec::new(),
            is_searching: false,
            error: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Text on the button that opens the picker.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("NA")
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_searching(&self) -> bool {
        self.is_searching
    }

    pub fn filters(&self) -> &UserFilters {
        &self.filters
    }

    pub fn results(&self) -> &[User] {
        &self.results
    }

    pub fn error(&self) -> Option<&ErrorState> {
        self.error.as_ref()
    }

    /// Open the modal and list users without filters.
    pub async fn open(&mut self) {
        self.is_open = true;
        self.error = None;
        self.fetch(ListQuery::new(1, "")).await;
    }

    pub fn update_filter(&mut self, field: UserFilterField, value: impl Into<String>) {
        let value = value.into();
        match field {
            UserFilterField::Username => self.filters.username = value,
            UserFilterField::FirstName => self.filters.first_name = value,
            UserFilterField::LastName => self.filters.last_name = value,
            UserFilterField::Email => self.filters.email = value,
            UserFilterField::Role => self.filters.role = value,
        }
    }

    pub async fn search(&mut self) {
        let query = self.filters.to_query();
        self.fetch(query).await;
    }

    async fn fetch(&mut self, query: ListQuery) {
        self.is_searching = true;
        match self.api.list(&query).await {
            Ok(page) => {
                self.results = page.results;
                self.error = None;
            }
            Err(e) => {
                tracing::error!(error = %e, "Error fetching users");
                self.error = Some(ErrorState::new("Error fetching users", &e));
            }
        }
        self.is_searching = false;
    }

    /// Choose an already listed user.
    pub fn pick(&mut self, user: User) {
        self.select(user);
    }

    /// Create a user and choose it. The modal stays open on failure.
    pub async fn create_and_select(&mut self, draft: &UserDraft) -> bool {
        match self.api.create(draft).await {
            Ok(user) => {
                tracing::info!(id = user.id, username = %user.username, "user created");
                self.results.push(user.clone());
                self.filters = UserFilters::default();
                self.select(user);
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Error saving user");
                self.error = Some(ErrorState::new("Error saving user", &e));
                false
            }
        }
    }

    pub fn close(&mut self) {
        self.is_open = false;
    }

    fn select(&mut self, user: User) {
        let selection = UserSelection::from(user);
        self.label = Some(selection.display_name.clone());
        (self.on_select)(selection);
        self.is_open = false;
    }
}
