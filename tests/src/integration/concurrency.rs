//! # Concurrency Scenarios
//!
//! Parallel admissions against one contract must never push
//! `batteries_shipped` past the threshold, whatever the interleaving.

#[cfg(test)]
mod tests {
    use crate::support::{admit_with_retry, LockBypassClient, Stack};
    use bq_03_admission_engine::{AdmissionConfig, CreateShipment, ErrorCode, ShipmentAdmissionApi};
    use shared_types::{ActorId, ShipmentQuery, ShipmentStatus};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::task::JoinSet;

    fn command(i: usize, quantity: u64) -> CreateShipment {
        CreateShipment::new("C-CONC", quantity, ActorId::new(format!("op-{i}")))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_parallel_admissions_never_exceed_threshold() {
        let stack = Stack::new();
        stack.seed("C-CONC", 20, 100).await;

        let mut tasks = JoinSet::new();
        for i in 0..64 {
            let engine = stack.engine.clone();
            let quantity = (i % 7 + 1) as u64;
            tasks.spawn(async move {
                (quantity, admit_with_retry(&engine, command(i, quantity), 1).await)
            });
        }

        let mut approved_total = 0;
        while let Some(joined) = tasks.join_next().await {
            let (quantity, result) = joined.unwrap();
            if let Ok(admission) = result {
                if admission.status == ShipmentStatus::Approved {
                    approved_total += quantity;
                }
            }
        }

        let contract = stack.contract("C-CONC").await;
        assert!(contract.batteries_shipped <= contract.threshold);
        assert_eq!(contract.batteries_shipped, 20 + approved_total);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_unit_admissions_fill_threshold_exactly() {
        const K: usize = 40;
        let stack = Stack::new();
        stack.seed("C-CONC", 0, K as u64).await;

        let mut tasks = JoinSet::new();
        for i in 0..K {
            let engine = stack.engine.clone();
            tasks.spawn(async move { admit_with_retry(&engine, command(i, 1), 10_000).await });
        }

        let mut blocked = 0;
        while let Some(joined) = tasks.join_next().await {
            let admission = joined.unwrap().unwrap();
            if admission.status == ShipmentStatus::Blocked {
                blocked += 1;
            }
        }

        let contract = stack.contract("C-CONC").await;
        assert_eq!(blocked, 0);
        assert_eq!(contract.batteries_shipped, K as u64);
        assert!(!contract.is_locked);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_exactly_one_blocked_when_demand_exceeds_threshold() {
        let stack = Stack::new();
        stack.seed("C-CONC", 0, 10).await;

        let mut tasks = JoinSet::new();
        for i in 0..25 {
            let engine = stack.engine.clone();
            tasks.spawn(async move { admit_with_retry(&engine, command(i, 1), 10_000).await });
        }

        let (mut approved, mut blocked, mut locked) = (0, 0, 0);
        while let Some(joined) = tasks.join_next().await {
            match joined.unwrap() {
                Ok(a) if a.status == ShipmentStatus::Approved => approved += 1,
                Ok(_) => blocked += 1,
                Err(e) => {
                    assert_eq!(e.code(), ErrorCode::ContractLocked);
                    locked += 1;
                }
            }
        }

        assert_eq!((approved, blocked, locked), (10, 1, 14));
        let contract = stack.contract("C-CONC").await;
        assert!(contract.is_locked);
        assert_eq!(contract.batteries_shipped, 10);

        let blocked_records = stack
            .ledger
            .shipments()
            .into_iter()
            .filter(|s| s.status == ShipmentStatus::Blocked)
            .count();
        assert_eq!(blocked_records, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_ledger_guards_hold_without_the_lock() {
        let stack = Stack::with_locks(Arc::new(LockBypassClient), AdmissionConfig::default());
        stack.seed("C-CONC", 0, 30).await;
        stack.ledger.set_op_latency(Duration::from_millis(2));

        let mut tasks = JoinSet::new();
        for i in 0..40 {
            let engine = stack.engine.clone();
            tasks.spawn(async move { (i, admit_with_retry(&engine, command(i, 2), 1).await) });
        }

        let mut approved_total = 0;
        let mut conflicts = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined.unwrap().1 {
                Ok(a) if a.status == ShipmentStatus::Approved => approved_total += 2,
                Err(e) if e.code() == ErrorCode::AtomicUpdateConflict => conflicts += 1,
                _ => {}
            }
        }
        stack.ledger.set_op_latency(Duration::ZERO);

        let contract = stack.contract("C-CONC").await;
        assert!(contract.batteries_shipped <= 30);
        assert_eq!(contract.batteries_shipped, approved_total);
        assert!(conflicts > 0);

        let approved_records: u64 = stack
            .engine
            .list_shipments(ShipmentQuery {
                status: Some(ShipmentStatus::Approved),
                ..ShipmentQuery::default()
            })
            .await
            .unwrap()
            .total as u64;
        assert_eq!(approved_records * 2, approved_total);
    }
}
