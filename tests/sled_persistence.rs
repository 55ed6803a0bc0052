mod common;

use std::sync::Arc;

use petsim::pet::{Achievement, ManualClock, PetType};
use petsim::storage::{PetStore, SledPetStoreBuilder};

#[test]
fn pet_survives_reopen_with_decay_resumed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = Arc::new(ManualClock::new(common::noon()));

    {
        let service = common::sled_service(dir.path(), clock.clone());
        service.adopt("alice", Some("dog")).expect("adopt");
        service.feed("alice").expect("feed");
        service.sleep("alice").expect("sleep");
    }

    // 65 - 10 sleep = 55 hunger at noon. 15s later, 10 of them awake.
    clock.advance_secs(15);
    let service = common::sled_service(dir.path(), clock.clone());
    let pet = service.get("alice").expect("reload");
    assert_eq!(pet.pet_type, PetType::Dog);
    assert_eq!(pet.counters.feed_count, 1);
    assert_eq!(pet.counters.sleep_count, 1);
    assert!(pet.achievements.is_unlocked(Achievement::FirstMeal));
    assert!(!pet.is_sleeping);
    assert!((pet.stats.hunger - 54.0).abs() < 1e-9);
}

#[test]
fn sleep_window_persists_across_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = Arc::new(ManualClock::new(common::noon()));
    {
        let service = common::sled_service(dir.path(), clock.clone());
        service.adopt("bob", None).unwrap();
        service.sleep("bob").unwrap();
    }
    clock.advance_secs(2);
    let service = common::sled_service(dir.path(), clock.clone());
    assert!(!service.play("bob").unwrap().outcome.is_applied());
}

#[test]
fn list_returns_every_stored_pet() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = Arc::new(ManualClock::new(common::noon()));
    let service = common::sled_service(dir.path(), clock);
    for user in ["carol", "alice", "bob"] {
        service.adopt(user, None).unwrap();
    }
    drop(service);

    let store = SledPetStoreBuilder::new(dir.path())
        .without_flush()
        .open()
        .expect("reopen");
    let ids: Vec<String> = store.list().unwrap().into_iter().map(|p| p.user_id).collect();
    assert_eq!(ids, vec!["alice", "bob", "carol"]);
}
