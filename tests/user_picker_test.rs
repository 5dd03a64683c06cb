//! User picker flow: search, pick, create, and the host merge contract.
//!
//! Run with: cargo test --test user_picker_test

mod common;

use std::cell::RefCell;

use common::{building, user, FakeApi, Failure};
use estate_admin::api::models::{Role, User, UserDraft};
use estate_admin::controller::{
    ResourceListController, UserFilterField, UserFilters, UserPickerController, UserSelection,
};

fn users_api() -> FakeApi<User> {
    FakeApi::logged_in()
        .with_page(
            1,
            "",
            3,
            vec![
                user(1, "admin", "Ada", "Min", Role::Admin),
                user(2, "jo", "Jo", "March", Role::Resident),
                user(3, "joey", "Joey", "Tribbiani", Role::BuildingOwner),
            ],
        )
        .with_page(1, "jo   ", 1, vec![user(2, "jo", "Jo", "March", Role::Resident)])
}

#[test]
fn search_text_joins_all_text_filters() {
    let filters = UserFilters {
        username: "jo".to_string(),
        role: "20".to_string(),
        ..UserFilters::default()
    };
    assert_eq!(filters.search_text(), "jo   ");

    let query = filters.to_query();
    assert_eq!(query.page, 1);
    assert_eq!(query.search, "jo   ");
    assert_eq!(query.filter("role"), Some("20"));

    let no_role = UserFilters::default().to_query();
    assert_eq!(no_role.search, "   ");
    assert_eq!(no_role.filter("role"), None);
}

#[tokio::test]
async fn open_lists_users_unfiltered() {
    let mut picker = UserPickerController::new(users_api(), None, |_| {});
    assert!(!picker.is_open());
    assert_eq!(picker.label(), "NA");

    picker.open().await;

    assert!(picker.is_open());
    assert!(!picker.is_searching());
    assert_eq!(picker.results().len(), 3);
    let query = picker.api().last_list().unwrap();
    assert_eq!(query.search, "");
    assert!(query.filters.is_empty());
}

#[tokio::test]
async fn update_filter_does_not_hit_the_api() {
    let mut picker = UserPickerController::new(users_api(), None, |_| {});
    picker.open().await;

    picker.update_filter(UserFilterField::Username, "jo");
    picker.update_filter(UserFilterField::Email, "x@y");
    picker.update_filter(UserFilterField::Email, "");

    assert_eq!(picker.api().list_count(), 1);
    assert_eq!(picker.filters().username, "jo");
    assert_eq!(picker.filters().email, "");
}

#[tokio::test]
async fn search_sends_joined_text_and_separate_role_then_pick_selects_once() {
    let calls = RefCell::new(Vec::new());
    let mut picker = UserPickerController::new(users_api(), Some("Ada Min".to_string()), |selection| {
        calls.borrow_mut().push(selection);
    });
    picker.open().await;

    picker.update_filter(UserFilterField::Username, "jo");
    picker.update_filter(UserFilterField::Role, "20");
    picker.search().await;

    let query = picker.api().last_list().unwrap();
    assert_eq!(query.search, "jo   ");
    assert_eq!(query.filter("role"), Some("20"));
    assert_eq!(picker.results().len(), 1);

    let chosen = picker.results()[0].clone();
    let lists_before = picker.api().list_count();
    picker.pick(chosen);

    assert!(!picker.is_open());
    assert_eq!(picker.label(), "Jo March");
    assert_eq!(picker.api().list_count(), lists_before);
    drop(picker);

    let calls = calls.into_inner();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].id, 2);
    assert_eq!(calls[0].display_name, "Jo March");
}

#[tokio::test]
async fn search_failure_keeps_previous_results() {
    let mut picker = UserPickerController::new(users_api(), None, |_| {});
    picker.open().await;
    picker.api().fail_lists(Failure::Http(503, "maintenance"));

    picker.search().await;

    assert_eq!(picker.results().len(), 3);
    let error = picker.error().unwrap();
    assert_eq!(error.status, Some(503));
    assert!(picker.is_open());
}

#[tokio::test]
async fn create_and_select_hands_back_the_new_user() {
    let mut selected: Option<UserSelection> = None;
    let draft = UserDraft {
        username: "newbie".to_string(),
        role: Some(Role::Resident),
        first_name: "New".to_string(),
        last_name: "Bie".to_string(),
        email: "newbie@example.com".to_string(),
    };

    let mut picker = UserPickerController::new(users_api(), None, |selection| selected = Some(selection));
    picker.open().await;
    picker.update_filter(UserFilterField::Username, "newbie");

    assert!(picker.create_and_select(&draft).await);

    assert!(!picker.is_open());
    assert_eq!(picker.filters(), &UserFilters::default());
    assert_eq!(picker.results().last().unwrap().username, "newbie");
    let payload = picker.api().creates.lock().unwrap()[0].clone();
    assert_eq!(payload["role"], 20);
    assert_eq!(payload["username"], "newbie");
    drop(picker);

    let selected = selected.expect("on_select called");
    assert_eq!(selected.display_name, "New Bie");
    assert_eq!(selected.user.role, Role::Resident);
}

#[tokio::test]
async fn create_failure_keeps_the_modal_open() {
    let mut called = 0;
    let mut picker = UserPickerController::new(users_api(), None, |_| called += 1);
    picker.open().await;
    picker
        .api()
        .fail_creates(Failure::Validation("username", "A user with that username already exists."));

    let draft = UserDraft {
        username: "jo".to_string(),
        role: Some(Role::Resident),
        ..UserDraft::default()
    };
    assert!(!picker.create_and_select(&draft).await);

    assert!(picker.is_open());
    let error = picker.error().unwrap();
    assert_eq!(error.message, "Error saving user");
    assert_eq!(error.status, Some(400));
    drop(picker);
    assert_eq!(called, 0);
}

#[tokio::test]
async fn host_form_merges_the_selection_into_its_own_buffer() {
    let mut host = ResourceListController::new(
        FakeApi::logged_in().with_page(1, "", 1, vec![building(1, 10)]),
    );
    host.mount().await;
    host.select_id(1);

    let mut chosen = None;
    {
        let mut picker = UserPickerController::new(users_api(), None, |selection| chosen = Some(selection));
        picker.open().await;
        let jo = picker.results()[1].clone();
        picker.pick(jo);
    }
    // Picker is gone; nothing in the host changed yet.
    assert_eq!(host.selected().unwrap().record.owner, Some(1));

    host.merge_user("owner", &chosen.unwrap()).unwrap();
    assert!(host.save().await);

    assert_eq!(host.items()[0].owner, Some(2));
}
