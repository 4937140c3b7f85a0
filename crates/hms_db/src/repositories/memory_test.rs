#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::repositories::{MemoryBookingStore, ReservationLedger, SlotRepository};
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
    use hms_common::models::{NewSlot, Reservation, Slot};
    use uuid::Uuid;

    fn slot() -> Slot {
        let new_slot = NewSlot {
            date: NaiveDate::from_ymd_opt(2030, 1, 11).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
        };
        Slot::new(
            Uuid::new_v4(),
            &new_slot,
            Utc.with_ymd_and_hms(2030, 1, 1, 8, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryBookingStore::new();
        let other = store.clone();
        let slot = store.create_slot(slot()).await.unwrap();

        assert_eq!(other.get_slot(slot.id).await.unwrap(), Some(slot));
        assert_eq!(other.all_slots().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_no_trace() {
        let store = MemoryBookingStore::new();
        let slot = store.create_slot(slot()).await.unwrap();
        let first = Reservation::for_slot(Uuid::new_v4(), &slot, Utc::now());
        store.commit_reservation(&first).await.unwrap();

        let second = Reservation::for_slot(Uuid::new_v4(), &slot, Utc::now());
        let err = store.commit_reservation(&second).await.unwrap_err();

        assert!(matches!(err, DbError::Conflict(_)));
        let reservations = store.all_reservations().unwrap();
        assert_eq!(reservations, vec![first]);
    }

    #[tokio::test]
    async fn test_release_of_unknown_reservation_is_not_found() {
        let store = MemoryBookingStore::new();
        let slot = store.create_slot(slot()).await.unwrap();
        let reservation = Reservation::for_slot(Uuid::new_v4(), &slot, Utc::now());

        let err = store.release_reservation(&reservation).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
        assert!(!store.get_slot(slot.id).await.unwrap().unwrap().booked);
    }
}
