//! User name resolution for record references.
//!
//! Run with: cargo test --test directory_test

mod common;

use std::sync::Arc;

use common::{building, user, FakeApi};
use estate_admin::api::models::{House, Role, User};
use estate_admin::config::Config;
use estate_admin::services::{UserDirectory, UNKNOWN_NAME};

fn directory() -> UserDirectory<FakeApi<User>> {
    let api = FakeApi::logged_in().with_page(
        1,
        "",
        2,
        vec![
            user(1, "owner", "Olive", "Owner", Role::BuildingOwner),
            user(2, "res", "Rex", "Ident", Role::Resident),
        ],
    );
    UserDirectory::new(Arc::new(api), &Config::with_base_url("http://unused"))
}

#[test]
fn names_are_fetched_once_then_cached() {
    let directory = directory();

    tokio_test::block_on(async {
        assert_eq!(directory.display_name(1).await.unwrap(), "Olive Owner");
        assert_eq!(directory.display_name(1).await.unwrap(), "Olive Owner");
    });

    assert_eq!(*directory_gets(&directory), vec![1]);
}

#[test]
fn missing_references_fall_back_to_placeholder() {
    let directory = directory();
    let house = House {
        id: 7,
        number: "3A".to_string(),
        building: 1,
        resident: None,
    };
    let mut orphan = building(9, 90);
    orphan.owner = Some(404);

    let (house_labels, building_labels) = tokio_test::block_on(async {
        (
            directory.labels_for(&house).await,
            directory.labels_for(&orphan).await,
        )
    });

    assert_eq!(house_labels["resident"], UNKNOWN_NAME);
    assert_eq!(building_labels["owner"], UNKNOWN_NAME);
}

#[test]
fn remember_and_invalidate() {
    let directory = directory();
    let renamed = user(2, "res", "Rexine", "Ident", Role::Resident);

    tokio_test::block_on(async {
        directory.remember(&renamed).await;
        assert_eq!(directory.display_name(2).await.unwrap(), "Rexine Ident");

        directory.invalidate(2).await;
        assert_eq!(directory.display_name(2).await.unwrap(), "Rex Ident");

        let labels = directory.labels_for(&building(1, 10)).await;
        assert_eq!(labels["owner"], "Olive Owner");
    });

    assert_eq!(*directory_gets(&directory), vec![2, 1]);
}

fn directory_gets(directory: &UserDirectory<FakeApi<User>>) -> std::sync::MutexGuard<'_, Vec<i64>> {
    directory.api().get_calls.lock().unwrap()
}
