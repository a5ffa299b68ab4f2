//! # Failure Modes
//!
//! Backend outages, lock expiry and lock-token hygiene across crates.

#[cfg(test)]
mod tests {
    use crate::support::{contract_key, Stack};
    use bq_01_lock_client::{
        Acquisition, DistributedLockClient, InMemoryLockBackend, LockClient, LockConfig,
    };
    use bq_03_admission_engine::{
        handle_create_shipment, AdmissionConfig, CreateShipment, ErrorCode, ShipmentAdmissionApi,
    };
    use shared_types::ActorId;
    use std::time::Duration;

    fn lock_client() -> DistributedLockClient<InMemoryLockBackend> {
        DistributedLockClient::new(InMemoryLockBackend::new(), LockConfig::default())
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let locks = lock_client();
        let key = contract_key("C-1");
        let token = locks
            .acquire(&key, Duration::from_secs(5))
            .await
            .unwrap()
            .token()
            .unwrap();

        locks.release(&key, &token).await.unwrap();
        locks.release(&key, &token).await.unwrap();
        assert!(!locks.is_held(&key).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_release_does_not_evict_new_holder() {
        let locks = lock_client();
        let key = contract_key("C-1");
        let stale = locks
            .acquire(&key, Duration::from_millis(100))
            .await
            .unwrap()
            .token()
            .unwrap();

        tokio::time::advance(Duration::from_millis(150)).await;
        let fresh = locks.acquire(&key, Duration::from_secs(5)).await.unwrap();
        assert!(matches!(fresh, Acquisition::Acquired(_)));

        locks.release(&key, &stale).await.unwrap();
        assert!(locks.is_held(&key).await.unwrap());
        assert_eq!(
            locks.acquire(&key, Duration::from_secs(5)).await.unwrap(),
            Acquisition::Held
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_lock_expiry_mid_admission_is_a_conflict() {
        let stack = Stack::with_config(AdmissionConfig {
            lock_ttl: Duration::from_millis(100),
            ..AdmissionConfig::default()
        });
        stack.seed("C-1", 0, 10).await;
        stack.ledger.set_op_latency(Duration::from_millis(60));

        let response = handle_create_shipment(
            &stack.engine,
            CreateShipment::new("C-1", 1, ActorId::new("op")),
        )
        .await;

        assert!(!response.success);
        let error = response.error.unwrap();
        assert_eq!(error.code, ErrorCode::AtomicUpdateConflict);
        assert!(error.retryable);

        stack.ledger.set_op_latency(Duration::ZERO);
        assert_eq!(stack.contract("C-1").await.batteries_shipped, 0);
    }

    #[tokio::test]
    async fn test_lock_service_outage_writes_nothing() {
        let stack = Stack::new();
        stack.seed("C-1", 0, 10).await;
        stack.locks.backend().set_available(false);

        let err = stack
            .engine
            .admit_shipment(CreateShipment::new("C-1", 1, ActorId::new("op")))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::BackendUnavailable);
        assert_eq!(stack.ledger.stats().begun, 0);
    }

    #[tokio::test]
    async fn test_ledger_outage_releases_lock_for_next_request() {
        let stack = Stack::new();
        stack.seed("C-1", 0, 10).await;
        stack.ledger.set_available(false);

        let err = stack
            .engine
            .admit_shipment(CreateShipment::new("C-1", 1, ActorId::new("op")))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BackendUnavailable);

        stack.ledger.set_available(true);
        let result = stack
            .engine
            .admit_shipment(CreateShipment::new("C-1", 1, ActorId::new("op")))
            .await
            .unwrap();
        assert!(result.is_approved());
    }

    #[tokio::test]
    async fn test_blocked_alert_survives_dispatcher_failure() {
        let stack = Stack::new();
        stack.seed("C-1", 8, 10).await;
        stack.dispatcher.set_failing(true);

        let response = handle_create_shipment(
            &stack.engine,
            CreateShipment::new("C-1", 5, ActorId::new("op")),
        )
        .await;
        assert!(response.success);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["data"]["status"], "BLOCKED");

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(stack.dispatcher.count(), 1);
        assert!(stack.contract("C-1").await.is_locked);
    }
}
