#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use phonebook_lib::{AddOutcome, Contact, ContactInput, ContactStore};

pub async fn memory_store() -> ContactStore {
    ContactStore::open_in_memory()
        .await
        .expect("open in-memory contact store")
}

pub fn input(name: &str, phone: &str, email: &str, address: &str) -> ContactInput {
    ContactInput::normalized(name, phone, email, address)
}

pub async fn add_ok(store: &ContactStore, name: &str, phone: &str) -> Contact {
    match store
        .add(&input(name, phone, "", ""))
        .await
        .expect("add contact")
    {
        AddOutcome::Added(contact) => contact,
        AddOutcome::DuplicatePhone => panic!("unexpected duplicate phone {phone}"),
    }
}
