mod common;

use std::sync::Arc;
use std::thread;

use chrono::Duration;
use petsim::pet::{Achievement, ActionOutcome, DayCycle, PetError, PetType, RefusalReason};

#[test]
fn full_day_of_care() {
    let (service, clock) = common::memory_service(common::noon());

    let adopted = service.adopt("Alice", Some("rabbit")).expect("adopt");
    assert!(adopted.created);
    let status = service.status(&adopted.state);
    assert_eq!((status.hunger, status.happiness, status.energy), (50, 70, 60));
    assert_eq!(status.level, 1);
    assert_eq!(status.experience_to_next, 50);

    let fed = service.feed("alice").expect("feed");
    assert_eq!(
        fed.outcome.effects().map(|e| e.unlocked.clone()),
        Some(vec![Achievement::FirstMeal])
    );

    for _ in 0..5 {
        clock.advance_secs(10);
        assert!(service.play("alice").expect("play").outcome.is_applied());
    }
    let pet = service.get("alice").expect("get");
    assert!(pet.achievements.is_unlocked(Achievement::Playful));
    assert_eq!(pet.counters.play_count, 5);
    assert_eq!(pet.counters.total_interactions, 6);

    for _ in 0..3 {
        clock.advance_secs(10);
        assert!(service.sleep("alice").expect("sleep").outcome.is_applied());
    }
    let pet = service.get("alice").expect("get");
    assert!(pet.achievements.is_unlocked(Achievement::GoodNight));
    assert!(pet.is_sleeping);
    assert!(!pet.achievements.is_unlocked(Achievement::NightOwl));

    let night = service.night_interaction("alice").expect("night");
    assert!(night.state.achievements.is_unlocked(Achievement::NightOwl));
    assert_eq!(night.state.counters.total_interactions, 9);
}

#[test]
fn refusal_is_reported_not_raised() {
    let (service, clock) = common::memory_service(common::noon());
    service.adopt("bob", None).unwrap();
    service.sleep("bob").unwrap();

    clock.advance_secs(1);
    let again = service.sleep("bob").unwrap();
    assert_eq!(again.outcome, ActionOutcome::Refused(RefusalReason::AlreadySleeping));
    assert_eq!(again.state.counters.sleep_count, 1);

    // Feeding a sleeping pet is allowed.
    assert!(service.feed("bob").unwrap().outcome.is_applied());
}

#[test]
fn night_schedule_follows_configured_hours() {
    let (service, clock) = common::memory_service(common::late_night());
    service.adopt("owl", None).unwrap();

    let report = service.feed("owl").unwrap();
    assert!(report.night_interaction);
    assert_eq!(report.state.counters.night_interactions, 1);

    // Refused actions never count.
    service.sleep("owl").unwrap();
    let refused = service.play("owl").unwrap();
    assert!(!refused.night_interaction);
    assert_eq!(refused.state.counters.night_interactions, 2);

    clock.set(common::noon() + Duration::days(1));
    let day = service.clean("owl").unwrap();
    assert!(!day.night_interaction);
    assert_eq!(day.state.counters.night_interactions, 2);
}

#[test]
fn disabled_day_cycle_never_records_night() {
    let clock = Arc::new(petsim::pet::ManualClock::new(common::late_night()));
    let service = petsim::service::PetService::new(
        Arc::new(petsim::storage::MemoryPetStore::new()),
        clock,
        petsim::pet::Rules::default(),
    )
    .with_day_cycle(DayCycle {
        enabled: false,
        ..DayCycle::default()
    });
    service.adopt("owl", None).unwrap();
    let report = service.feed("owl").unwrap();
    assert!(!report.night_interaction);
    assert_eq!(report.state.counters.night_interactions, 0);
}

#[test]
fn concurrent_feeds_do_not_lose_updates() {
    let (service, _) = common::memory_service(common::noon());
    service.adopt("crowd", None).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = service.clone();
            thread::spawn(move || {
                for _ in 0..25 {
                    service.feed("crowd").expect("feed");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread");
    }

    let pet = service.get("crowd").unwrap();
    assert_eq!(pet.counters.feed_count, 200);
    assert_eq!(pet.counters.total_interactions, 200);
}

#[test]
fn user_ids_are_normalized_consistently() {
    let (service, _) = common::memory_service(common::noon());
    service.adopt("  CaSe_User ", None).unwrap();
    assert_eq!(service.get("case_user").unwrap().user_id, "case_user");
    assert!(matches!(service.get("../etc"), Err(PetError::InvalidUserId(_))));
}

#[test]
fn leaderboard_limits_are_capped() {
    let (service, _) = common::memory_service(common::noon());
    for i in 0..15 {
        service
            .adopt(&format!("user{:02}", i), Some(PetType::ALL[i % 4].as_str()))
            .unwrap();
    }
    assert_eq!(service.leaderboard(None).unwrap().len(), 10);
    assert_eq!(service.leaderboard(Some(3)).unwrap().len(), 3);
    assert_eq!(service.leaderboard(Some(1_000)).unwrap().len(), 15);

    let stats = service.global_stats().unwrap();
    assert_eq!(stats.total_pets, 15);
    // cat, dog and rabbit have 4 each; cat wins the tie.
    assert_eq!(stats.most_popular_type, PetType::Cat);
    assert_eq!(stats.most_popular_count, 4);
}
