#[cfg(test)]
mod tests {
    use crate::lock::LockTable;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_key_is_serialized() {
        let table = Arc::new(LockTable::<u32>::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let table = table.clone();
            let inside = inside.clone();
            let max_inside = max_inside.clone();
            tasks.push(tokio::spawn(async move {
                let _guard = table.lock(7).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let table = LockTable::<u32>::new();
        let _first = table.lock(1).await;

        let second = tokio::time::timeout(Duration::from_millis(100), table.lock(2)).await;
        assert!(second.is_ok());
        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn test_held_key_blocks_second_caller() {
        let table = LockTable::<u32>::new();
        let guard = table.lock(1).await;

        let blocked = tokio::time::timeout(Duration::from_millis(50), table.lock(1)).await;
        assert!(blocked.is_err());

        drop(guard);
        let unblocked = tokio::time::timeout(Duration::from_millis(100), table.lock(1)).await;
        assert!(unblocked.is_ok());
    }

    #[tokio::test]
    async fn test_idle_entries_are_evicted() {
        let table = LockTable::<String>::new();
        {
            let _guard = table.lock("slot-a".to_string()).await;
            assert_eq!(table.len(), 1);
        }
        assert!(table.is_empty());
    }
}
