//! # Broadcast Flow
//!
//! Engine outcome → broadcaster → room bus → subscribers, end to end.

#[cfg(test)]
mod tests {
    use crate::support::{contract_key, Stack};
    use bq_03_admission_engine::{CreateShipment, ShipmentAdmissionApi};
    use shared_bus::{EventFilter, Room, RoomEvent, Subscription};
    use shared_types::{ActorId, Role};
    use std::time::Duration;
    use tokio::time::timeout;

    async fn next(sub: &mut Subscription) -> RoomEvent {
        timeout(Duration::from_secs(1), sub.recv())
            .await
            .expect("timeout")
            .expect("bus open")
    }

    async fn nothing_for(sub: &mut Subscription) {
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sub.try_recv().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_approved_shipment_reaches_contract_room_only() {
        let stack = Stack::new();
        stack.seed("C-1", 0, 60).await;
        let mut room = stack.bus.subscribe(EventFilter::contract(contract_key("C-1")));
        let mut other = stack.bus.subscribe(EventFilter::contract(contract_key("C-2")));
        let mut global = stack.bus.subscribe(EventFilter::global());

        stack
            .engine
            .admit_shipment(CreateShipment::new("C-1", 5, ActorId::new("op")))
            .await
            .unwrap();

        let delivered = next(&mut room).await;
        let json = delivered.event.to_json();
        assert_eq!(json["event"], "shipment:created");
        assert_eq!(json["contractKey"], "C-1");
        assert_eq!(json["status"], "APPROVED");
        assert_eq!(json["batteriesShipped"], 5);
        assert_eq!(json["contractStatus"], "ACTIVE");

        nothing_for(&mut other).await;
        nothing_for(&mut global).await;
    }

    #[tokio::test]
    async fn test_blocked_shipment_alerts_global_and_roles() {
        let stack = Stack::new();
        stack.seed("C-1", 55, 60).await;
        let mut room = stack.bus.subscribe(EventFilter::contract(contract_key("C-1")));
        let mut admins = stack.bus.subscribe(EventFilter::role(Role::Admin));
        let mut managers = stack.bus.subscribe(EventFilter::role(Role::Manager));
        let mut viewers = stack.bus.subscribe(EventFilter::role(Role::Viewer));
        let mut global = stack.bus.subscribe(EventFilter::global());

        stack
            .engine
            .admit_shipment(CreateShipment::new("C-1", 10, ActorId::new("op")))
            .await
            .unwrap();

        let created = next(&mut room).await.event.to_json();
        assert_eq!(created["status"], "BLOCKED");
        assert!(created["blockReason"].as_str().unwrap().contains("65/60"));
        assert_eq!(created["contractStatus"], "LOCKED");

        for sub in [&mut admins, &mut managers, &mut global] {
            let alert = next(sub).await.event.to_json();
            assert_eq!(alert["event"], "contract:threshold_exceeded");
            assert_eq!(alert["projectedTotal"], 65);
            assert_eq!(alert["threshold"], 60);
        }
        nothing_for(&mut viewers).await;
    }

    #[tokio::test]
    async fn test_manual_unlock_reaches_contract_and_alert_roles() {
        let stack = Stack::new();
        stack.seed("C-1", 0, 10).await;
        let mut room = stack.bus.subscribe(EventFilter::contract(contract_key("C-1")));
        let mut managers = stack.bus.subscribe(EventFilter::role(Role::Manager));

        stack
            .engine
            .set_contract_lock("C-1", true, ActorId::new("admin"), Some("audit".into()))
            .await
            .unwrap();
        for sub in [&mut room, &mut managers] {
            let locked = next(sub).await.event.to_json();
            assert_eq!(locked["isLocked"], true);
            assert_eq!(locked["reason"], "audit");
        }

        stack
            .engine
            .set_contract_lock("C-1", false, ActorId::new("admin"), None)
            .await
            .unwrap();

        for sub in [&mut room, &mut managers] {
            let event = next(sub).await;
            let json = event.event.to_json();
            assert_eq!(json["event"], "contract:lock_changed");
            assert_eq!(json["isLocked"], false);
            assert_eq!(json["changedBy"], "admin");
        }
    }

    #[tokio::test]
    async fn test_redundant_unlock_broadcasts_nothing() {
        let stack = Stack::new();
        stack.seed("C-1", 0, 10).await;
        let mut room = stack.bus.subscribe(EventFilter::contract(contract_key("C-1")));

        stack
            .engine
            .set_contract_lock("C-1", false, ActorId::new("admin"), None)
            .await
            .unwrap();

        nothing_for(&mut room).await;
    }

    #[tokio::test]
    async fn test_subscriber_joining_multiple_rooms() {
        let stack = Stack::new();
        stack.seed("C-1", 9, 10).await;
        let mut dashboard = stack.bus.subscribe(
            EventFilter::contract(contract_key("C-1")).join(Room::Global),
        );

        stack
            .engine
            .admit_shipment(CreateShipment::new("C-1", 5, ActorId::new("op")))
            .await
            .unwrap();

        let first = next(&mut dashboard).await;
        let second = next(&mut dashboard).await;
        assert_eq!(first.event.name(), "shipment:created");
        assert_eq!(second.event.name(), "contract:threshold_exceeded");
        assert!(second.sequence > first.sequence);
        nothing_for(&mut dashboard).await;
    }

    #[tokio::test]
    async fn test_admin_dashboard_receives_each_alert_once() {
        let stack = Stack::new();
        stack.seed("C-1", 9, 10).await;
        let mut dashboard =
            stack.bus.subscribe(EventFilter::global().join(Room::Role(Role::Admin)));

        stack
            .engine
            .admit_shipment(CreateShipment::new("C-1", 5, ActorId::new("op")))
            .await
            .unwrap();

        let alert = next(&mut dashboard).await;
        assert_eq!(alert.event.name(), "contract:threshold_exceeded");
        assert!(alert.rooms.contains(&Room::Global));
        assert!(alert.rooms.contains(&Room::Role(Role::Admin)));
        nothing_for(&mut dashboard).await;
    }

    #[tokio::test]
    async fn test_broadcaster_stops_when_engine_dropped() {
        let stack = Stack::new();
        stack.seed("C-1", 0, 10).await;
        stack
            .engine
            .admit_shipment(CreateShipment::new("C-1", 1, ActorId::new("op")))
            .await
            .unwrap();

        let crate::support::Stack {
            engine, broadcaster, ..
        } = stack;
        drop(engine);
        let processed = timeout(Duration::from_secs(1), broadcaster)
            .await
            .expect("broadcaster stopped")
            .unwrap();
        assert_eq!(processed, 1);
    }
}
