//! End-to-end wizard flow against an on-disk store
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test wizard_flow
//! ```

use std::sync::Arc;
use std::time::Duration;

use listing_wizard::session::{self, Role, Session};
use listing_wizard::store::{FileStore, KeyValueStore};
use listing_wizard::wizard::{
    DraftPersistence, SimulatedSubmission, SubmissionMode, WizardController, WizardError,
    WizardStep, DRAFT_KEY,
};
use serde_json::json;
use tempfile::TempDir;

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn open_store(dir: &TempDir) -> Arc<FileStore> {
    Arc::new(FileStore::open(dir.path().join("store.json")).unwrap())
}

fn start(store: Arc<FileStore>) -> Result<WizardController, WizardError> {
    let session = Session::from_store(store.as_ref());
    WizardController::create(
        session,
        DraftPersistence::new(store, Duration::from_secs(2)),
        Arc::new(SimulatedSubmission::new(Duration::from_secs(2))),
    )
}

fn fill_everything(c: &WizardController) {
    c.update_field("title", json!("Luxury Downtown Apartment"));
    c.update_field("description", json!("Modern apartment in the heart of downtown"));
    c.update_field("price", json!("2500"));
    c.update_field("propertyType", json!("apartment"));
    c.update_field("status", json!("available"));
    c.update_field("bedrooms", json!("2"));
    c.update_field("bathrooms", json!("2"));
    c.update_field("squareFootage", json!("1200"));
    c.update_field(
        "address",
        json!({
            "street": "123 Main Street",
            "city": "New York",
            "state": "NY",
            "zipCode": "10001",
            "country": "United States"
        }),
    );
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_wizard_refuses_anonymous_session() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    assert!(matches!(start(store), Err(WizardError::Unauthenticated)));
}

#[tokio::test(start_paused = true)]
async fn test_draft_survives_restart() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    session::sign_in(store.as_ref(), Some("abc".into()), Role::User).unwrap();

    let first = start(store.clone()).unwrap();
    first.update_field("title", json!("Cozy cottage"));
    first.update_field("address.city", json!("Portland"));
    tokio::time::sleep(Duration::from_secs(3)).await;
    drop(first);

    // Reopen the file as a fresh process would
    let reopened = open_store(&dir);
    let second = start(reopened).unwrap();
    let payload = second.payload();
    assert_eq!(payload.text("title").as_deref(), Some("Cozy cottage"));
    assert_eq!(payload.text("address.city").as_deref(), Some("Portland"));
    assert_eq!(second.current_step(), WizardStep::BasicInfo);
}

#[tokio::test(start_paused = true)]
async fn test_full_create_flow_clears_draft() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    session::sign_in(store.as_ref(), None, Role::Admin).unwrap();

    let c = start(store.clone()).unwrap();
    assert!(c.session().is_admin());
    fill_everything(&c);
    c.add_images(vec!["front.jpg".into(), "kitchen.jpg".into()]);

    for expected in 2..=5 {
        let step = c.go_next().unwrap();
        assert_eq!(step.index(), expected);
    }
    c.close();
    assert!(store.get(DRAFT_KEY).unwrap().is_some());

    let receipt = c.submit().await.unwrap();
    assert!(!receipt.listing_id.is_empty());
    assert!(c.is_complete());
    assert_eq!(store.get(DRAFT_KEY).unwrap(), None);

    let reopened = open_store(&dir);
    assert_eq!(reopened.get(DRAFT_KEY).unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn test_edit_flow_keeps_listing_id_and_draft() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    session::sign_in(store.as_ref(), Some("abc".into()), Role::User).unwrap();
    store
        .set(DRAFT_KEY, r#"{"title":"Someone else's draft"}"#)
        .unwrap();

    let existing = listing_wizard::wizard::FormPayload::from_value(json!({
        "title": "Existing listing",
    }))
    .unwrap();
    let c = WizardController::edit(
        Session::from_store(store.as_ref()),
        "listing-7",
        existing,
        DraftPersistence::new(store.clone(), Duration::from_secs(2)),
        Arc::new(SimulatedSubmission::new(Duration::from_millis(50))),
    )
    .unwrap();

    assert_eq!(c.mode(), &SubmissionMode::Edit { id: "listing-7".into() });
    assert_eq!(c.payload().text("title").as_deref(), Some("Existing listing"));

    fill_everything(&c);
    while c.current_step() != WizardStep::Review {
        c.go_next().unwrap();
    }
    let receipt = c.submit().await.unwrap();
    assert_eq!(receipt.listing_id, "listing-7");
}

#[tokio::test]
async fn test_sign_out_blocks_new_sessions() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    session::sign_in(store.as_ref(), Some("abc".into()), Role::Seeker).unwrap();
    assert!(start(store.clone()).is_ok());

    session::sign_out(store.as_ref()).unwrap();
    assert!(matches!(start(store), Err(WizardError::Unauthenticated)));
}
