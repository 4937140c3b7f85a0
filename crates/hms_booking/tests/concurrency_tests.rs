//! Racing callers against one engine.


use fixtures::{create_engine, create_slot, create_user};
use hms_booking::BookingError;
use hms_common::models::Role;
use std::sync::Arc;
use tokio::sync::Barrier;

const CALLERS: usize = 16;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_exactly_one_of_many_racing_consumers_wins() {
    let (engine, _clock) = create_engine();
    let doctor = create_user(&engine, "Gregory House", Role::Provider).await;
    let slot_id = create_slot(&engine, &doctor, 11, 10).await.id;
    let barrier = Arc::new(Barrier::new(CALLERS));

    let mut tasks = Vec::new();
    for i in 0..CALLERS {
        let engine = engine.clone();
        let barrier = barrier.clone();
        let patient = create_user(&engine, &format!("Patient {}", i), Role::Consumer).await;
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            engine.reserve(patient.id, slot_id).await
        }));
    }

    let mut winners = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => winners += 1,
            Err(err) => assert_eq!(err, BookingError::SlotUnavailable),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(engine.store().all_reservations().unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_one_consumer_racing_for_many_slots_gets_one() {
    let (engine, _clock) = create_engine();
    let doctor = create_user(&engine, "Gregory House", Role::Provider).await;
    let patient_id = create_user(&engine, "Alan Turing", Role::Consumer).await.id;
    let mut slots = Vec::new();
    for hour in 8..16 {
        slots.push(create_slot(&engine, &doctor, 11, hour).await);
    }
    let barrier = Arc::new(Barrier::new(slots.len()));

    let mut tasks = Vec::new();
    for slot in &slots {
        let engine = engine.clone();
        let barrier = barrier.clone();
        let slot_id = slot.id;
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            engine.reserve(patient_id, slot_id).await
        }));
    }

    let mut winners = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => winners += 1,
            Err(err) => assert_eq!(err, BookingError::AlreadyReserved),
        }
    }

    assert_eq!(winners, 1);
    let booked = engine
        .store()
        .all_slots()
        .unwrap()
        .into_iter()
        .filter(|slot| slot.booked)
        .count();
    assert_eq!(booked, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_different_slots_are_reserved_in_parallel() {
    let (engine, _clock) = create_engine();
    let doctor = create_user(&engine, "Gregory House", Role::Provider).await;

    let mut tasks = Vec::new();
    for hour in 8..16 {
        let slot = create_slot(&engine, &doctor, 12, hour).await;
        let patient = create_user(&engine, &format!("Patient {}", hour), Role::Consumer).await;
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            engine.reserve(patient.id, slot.id).await
        }));
    }

    for task in tasks {
        assert!(task.await.unwrap().is_ok());
    }
    assert_eq!(engine.store().all_reservations().unwrap().len(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_cancel_and_reserve_race_keeps_slot_consistent() {
    let (engine, _clock) = create_engine();
    let doctor = create_user(&engine, "Gregory House", Role::Provider).await;
    let holder = create_user(&engine, "Alan Turing", Role::Consumer).await;
    let slot_id = create_slot(&engine, &doctor, 11, 10).await.id;
    engine.reserve(holder.id, slot_id).await.unwrap();

    let barrier = Arc::new(Barrier::new(CALLERS + 1));
    let mut tasks = Vec::new();
    for i in 0..CALLERS {
        let engine = engine.clone();
        let barrier = barrier.clone();
        let patient = create_user(&engine, &format!("Patient {}", i), Role::Consumer).await;
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            engine.reserve(patient.id, slot_id).await.is_ok()
        }));
    }
    let holder_id = holder.id;
    let canceller = {
        let engine = engine.clone();
        let barrier = barrier.clone();
        tokio::spawn(async move {
            barrier.wait().await;
            engine.cancel(holder_id).await
        })
    };

    canceller.await.unwrap().unwrap();
    let mut winners = 0;
    for task in tasks {
        if task.await.unwrap() {
            winners += 1;
        }
    }

    let reservations = engine.store().all_reservations().unwrap();
    let booked = engine.store().all_slots().unwrap()[0].booked;
    assert!(winners <= 1);
    assert_eq!(reservations.len(), winners);
    assert_eq!(booked, winners == 1);
}
