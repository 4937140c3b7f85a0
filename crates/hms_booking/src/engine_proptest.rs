#[cfg(test)]
mod tests {
    use crate::error::BookingError;
    use crate::test_support::harness;
    use chrono::Duration;
    use hms_db::MemoryBookingStore;
    use proptest::prelude::*;
    use std::collections::{HashMap, HashSet};

    #[derive(Debug, Clone)]
    enum Op {
        Reserve { consumer: usize, slot: usize },
        Cancel { consumer: usize },
        Advance { minutes: i64 },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0..4usize, 0..5usize)
                .prop_map(|(consumer, slot)| Op::Reserve { consumer, slot }),
            2 => (0..4usize).prop_map(|consumer| Op::Cancel { consumer }),
            1 => (1..240i64).prop_map(|minutes| Op::Advance { minutes }),
        ]
    }

    // booked <=> exactly one reservation, and one reservation per consumer
    fn check_invariants(store: &MemoryBookingStore) -> Result<(), TestCaseError> {
        let slots = store.all_slots().unwrap();
        let reservations = store.all_reservations().unwrap();

        let mut per_slot: HashMap<_, usize> = HashMap::new();
        let mut consumers = HashSet::new();
        for reservation in &reservations {
            *per_slot.entry(reservation.slot_id).or_default() += 1;
            prop_assert!(
                consumers.insert(reservation.consumer_id),
                "consumer {} holds two reservations",
                reservation.consumer_id
            );
        }
        for slot in &slots {
            let holders = per_slot.get(&slot.id).copied().unwrap_or(0);
            prop_assert_eq!(slot.booked, holders == 1, "slot {} out of sync", slot.id);
            prop_assert!(holders <= 1);
        }
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_random_operations_keep_slots_and_ledger_in_sync(
            ops in prop::collection::vec(op_strategy(), 1..40)
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            rt.block_on(async {
                let h = harness();
                let doctor = h.provider("Gregory House").await;
                let mut consumers = Vec::new();
                for i in 0..4 {
                    consumers.push(h.consumer(&format!("Patient {}", i)).await);
                }
                let mut slots = Vec::new();
                for hour in 0..5 {
                    slots.push(h.slot(&doctor, 10, 9 + hour, 0).await);
                }

                for op in ops {
                    match op {
                        Op::Reserve { consumer, slot } => {
                            let holds = h
                                .engine
                                .reservation_for_consumer(consumers[consumer].id)
                                .await
                                .unwrap()
                                .is_some();
                            match h.engine.reserve(consumers[consumer].id, slots[slot].id).await {
                                Ok(_) => prop_assert!(!holds),
                                Err(BookingError::AlreadyReserved) => prop_assert!(holds),
                                Err(BookingError::SlotUnavailable) => {}
                                Err(other) => return Err(TestCaseError::fail(other.to_string())),
                            }
                        }
                        Op::Cancel { consumer } => {
                            match h.engine.cancel(consumers[consumer].id).await {
                                Ok(_) | Err(BookingError::NotFound(_)) => {}
                                Err(other) => return Err(TestCaseError::fail(other.to_string())),
                            }
                        }
                        Op::Advance { minutes } => h.clock.advance(Duration::minutes(minutes)),
                    }
                    check_invariants(h.engine.store())?;
                }
                Ok::<(), TestCaseError>(())
            })?;
        }
    }
}
