//! # Integration Test Flows
//!
//! Tests that the address book, the hodl escrow and the gateways work
//! together through one contract host.
//!
//! ## Flows Tested:
//!
//! 1. **One user, both contracts**: record keeping and escrow interleaved
//! 2. **Swapped gateway**: a custom `TransferGateway` sees every release
//! 3. **Concurrent callers**: units of work serialize on the table store
//! 4. **Telemetry**: committed and rejected units show up in the metrics

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use qc_11_native_contracts::contracts::hodl::DEFAULT_DEADLINE;
    use qc_11_native_contracts::prelude::*;
    use quantum_telemetry::{encode_metrics, init_test_tracing, register_metrics};
    use shared_types::{Asset, Name, PermissionLevel, Symbol};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const ALICE: Name = Name::from_static("alice");
    const SYS: Symbol = Symbol::from_static("SYS", 4);

    fn sys(units: i64) -> Asset {
        Asset::new(units * 10_000, SYS).unwrap()
    }

    fn upsert(user: Name, age: u64) -> Action {
        Action::new(
            accounts::ADDRESSBOOK,
            actions::UPSERT,
            vec![PermissionLevel::active(user)],
            &UpsertPayload {
                user,
                first_name: "First".into(),
                last_name: "Last".into(),
                age,
                street: "Main St".into(),
                city: "Springfield".into(),
                state: "IL".into(),
            },
        )
        .unwrap()
    }

    fn deposit(from: Name, quantity: Asset) -> Action {
        Action::new(
            accounts::TOKEN,
            actions::TRANSFER,
            vec![PermissionLevel::active(from)],
            &TransferPayload {
                from,
                to: accounts::HODL,
                quantity,
                memo: "hodl".into(),
            },
        )
        .unwrap()
    }

    fn party(hodler: Name) -> Action {
        Action::new(
            accounts::HODL,
            actions::PARTY,
            vec![PermissionLevel::active(hodler)],
            &PartyPayload { hodler },
        )
        .unwrap()
    }

    /// Gateway that accepts everything and remembers it.
    #[derive(Default)]
    struct RecordingGateway {
        seen: Mutex<Vec<TransferRequest>>,
    }

    #[async_trait]
    impl TransferGateway for RecordingGateway {
        async fn transfer(&self, request: &TransferRequest) -> Result<(), GatewayError> {
            self.seen.lock().push(request.clone());
            Ok(())
        }
    }

    // =============================================================================
    // FLOWS
    // =============================================================================

    #[tokio::test]
    async fn test_one_user_across_both_contracts() {
        init_test_tracing();
        let host = create_test_host().unwrap();
        host.gateway().issue(ALICE, sys(100));

        host.push_action(upsert(ALICE, 30)).await.unwrap();
        host.push_action(deposit(ALICE, sys(40))).await.unwrap();
        host.clock().set(DEFAULT_DEADLINE.saturating_add(60));
        host.push_action(party(ALICE)).await.unwrap();

        let inbox: Vec<Name> = host
            .notifications()
            .inbox(ALICE)
            .iter()
            .map(|note| note.action)
            .collect();
        assert_eq!(inbox, vec![actions::NOTIFY, actions::TRANSFER, actions::TRANSFER]);

        assert_eq!(host.gateway().balance_of(ALICE, SYS), sys(100));
        assert_eq!(host.usage_counter().record(ALICE).emplaced, 1);

        // Escrow rows are gone, the address book record stays
        let book = AddressBook::new(accounts::ADDRESSBOOK, AddressBookConfig::default()).unwrap();
        assert!(host.read(|db| book.record(db, ALICE)).await.unwrap().is_some());
        assert_eq!(host.read(ChainDatabase::row_count).await, 1);
    }

    #[tokio::test]
    async fn test_custom_gateway_sees_release() {
        let gateway = Arc::new(RecordingGateway::default());
        let clock = Arc::new(ManualClock::new(DEFAULT_DEADLINE.saturating_sub(10)));
        let mut host = ContractHost::new(
            Arc::new(InMemoryNotificationChannel::new()),
            Arc::clone(&gateway),
            Arc::new(InMemoryUsageCounter::new(accounts::ADDRESSBOOK)),
            Arc::clone(&clock),
            HostConfig::default(),
        )
        .unwrap();
        host.deploy(Arc::new(
            Hodl::new(accounts::HODL, HodlConfig::default()).unwrap(),
        ))
        .unwrap();

        host.push_action(deposit(ALICE, sys(7))).await.unwrap();
        clock.advance(11);
        host.push_action(party(ALICE)).await.unwrap();

        let seen = gateway.seen.lock().clone();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].from, accounts::HODL);
        assert_eq!(seen[1].to, ALICE);
        assert_eq!(seen[1].quantity, sys(7));
        assert_eq!(seen[1].memo, PARTY_MEMO);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_upserts_serialize() {
        let host = Arc::new(create_test_host().unwrap());
        let users: Vec<Name> = (b'a'..=b'z')
            .map(|c| format!("user{}", c as char).parse().unwrap())
            .collect();

        let handles: Vec<_> = users
            .iter()
            .enumerate()
            .map(|(i, &user)| {
                let host = Arc::clone(&host);
                tokio::spawn(async move { host.push_action(upsert(user, 20 + i as u64)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let book = AddressBook::new(accounts::ADDRESSBOOK, AddressBookConfig::default()).unwrap();
        let records = host.read(|db| book.records_by_age(db)).await.unwrap();
        assert_eq!(records.len(), users.len());
        assert!(records.windows(2).all(|w| w[0].age <= w[1].age));

        let stats = host.stats().await;
        assert_eq!(stats.actions_succeeded, users.len() as u64);
        assert_eq!(stats.usage_calls, users.len() as u64);
        assert_eq!(host.notifications().delivered(), users.len());
    }

    #[tokio::test]
    async fn test_rejected_deposit_leaves_no_trace() {
        let host = create_test_host().unwrap();
        host.gateway().issue(ALICE, sys(1));

        let err = host.push_action(deposit(ALICE, sys(2))).await.unwrap_err();

        assert!(matches!(
            err,
            ContractError::Gateway(GatewayError::InsufficientFunds { .. })
        ));
        assert_eq!(host.read(ChainDatabase::row_count).await, 0);
        assert!(host.notifications().inbox(ALICE).is_empty());
        assert!(host.gateway().transfers().is_empty());
    }

    #[tokio::test]
    async fn test_metrics_record_outcomes() {
        register_metrics().unwrap();
        let host = create_test_host().unwrap();

        host.push_action(upsert(ALICE, 30)).await.unwrap();
        let _ = host.push_action(party(ALICE)).await;

        let text = encode_metrics().unwrap();
        assert!(text.contains("qc_contracts_actions_total"));
        assert!(text.contains("outcome=\"committed\""));
        assert!(text.contains("qc_contracts_effects_total"));
    }
}
