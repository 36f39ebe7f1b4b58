//! # Hodl Escrow Tests (qc-11)
//!
//! Deposits are made the way users make them: a `transfer` to the escrow
//! on the token contract, which the escrow sees as a notification.
//!
//! ## Test Categories
//!
//! 1. **Deposits** - accumulation, order independence, rejected deposits
//! 2. **Misaddressed transfers** - ignored without error or state change
//! 3. **Party** - deadline, double claim, authorization, gateway failure

use qc_11_native_contracts::contracts::hodl::DEFAULT_DEADLINE;
use qc_11_native_contracts::prelude::*;
use serde::Serialize;
use shared_types::{Asset, Name, PermissionLevel, Symbol, TimePointSec};

// =============================================================================
// TEST HELPERS
// =============================================================================

const ALICE: Name = Name::from_static("alice");
const BOB: Name = Name::from_static("bob");
const SYS: Symbol = Symbol::from_static("SYS", 4);

/// `units` whole tokens of `4,SYS`.
fn sys(units: i64) -> Asset {
    Asset::new(units * 10_000, SYS).unwrap()
}

fn funded_host() -> InMemoryHost {
    let host = create_test_host().unwrap();
    host.gateway().issue(ALICE, sys(1_000));
    host.gateway().issue(BOB, sys(1_000));
    host
}

fn transfer(from: Name, to: Name, quantity: Asset) -> Action {
    Action::new(
        accounts::TOKEN,
        actions::TRANSFER,
        vec![PermissionLevel::active(from)],
        &TransferPayload {
            from,
            to,
            quantity,
            memo: String::new(),
        },
    )
    .unwrap()
}

async fn deposit(host: &InMemoryHost, from: Name, quantity: Asset) -> Result<ActionReceipt, ContractError> {
    host.push_action(transfer(from, accounts::HODL, quantity)).await
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

async fn escrowed(host: &InMemoryHost, holder: Name) -> Option<Asset> {
    let hodl = Hodl::new(accounts::HODL, HodlConfig::default()).unwrap();
    host.read(|db| hodl.balance_of(db, holder)).await.unwrap()
}

fn after_deadline(host: &InMemoryHost) {
    host.clock().set(DEFAULT_DEADLINE.saturating_add(1));
}

// =============================================================================
// DEPOSITS
// =============================================================================

#[tokio::test]
async fn test_deposits_accumulate_then_party_releases_all() {
    let host = funded_host();

    deposit(&host, ALICE, sys(100)).await.unwrap();
    deposit(&host, ALICE, sys(50)).await.unwrap();
    assert_eq!(escrowed(&host, ALICE).await, Some(sys(150)));
    assert_eq!(host.gateway().balance_of(ALICE, SYS), sys(850));
    assert_eq!(host.gateway().balance_of(accounts::HODL, SYS), sys(150));

    after_deadline(&host);
    let receipt = host.push_action(party(ALICE)).await.unwrap();

    assert_eq!(
        receipt.transfers,
        vec![TransferRequest {
            token_contract: accounts::TOKEN,
            from: accounts::HODL,
            to: ALICE,
            quantity: sys(150),
            memo: PARTY_MEMO.to_string(),
        }]
    );
    assert_eq!(escrowed(&host, ALICE).await, None);
    assert_eq!(host.gateway().balance_of(ALICE, SYS), sys(1_000));
    assert_eq!(host.gateway().balance_of(accounts::HODL, SYS).amount, 0);
    assert_eq!(receipt.notifications_for(ALICE).count(), 1);
}

#[tokio::test]
async fn test_deposit_order_does_not_matter() {
    let host = funded_host();
    for units in [7, 11, 13] {
        deposit(&host, ALICE, sys(units)).await.unwrap();
    }
    for units in [13, 7, 11] {
        deposit(&host, BOB, sys(units)).await.unwrap();
    }

    assert_eq!(escrowed(&host, ALICE).await, Some(sys(31)));
    assert_eq!(escrowed(&host, ALICE).await, escrowed(&host, BOB).await);
}

#[tokio::test]
async fn test_holders_are_isolated() {
    let host = funded_host();
    deposit(&host, ALICE, sys(5)).await.unwrap();

    assert_eq!(escrowed(&host, BOB).await, None);
}

#[tokio::test]
async fn test_escrow_pays_for_balance_rows() {
    let host = funded_host();
    deposit(&host, ALICE, sys(5)).await.unwrap();

    assert!(host.read(|db| db.ram_usage(accounts::HODL)).await > 0);
    assert_eq!(host.read(|db| db.ram_usage(ALICE)).await, 0);
}

#[tokio::test]
async fn test_deposit_at_deadline_rejected() {
    let host = funded_host();
    host.clock().set(DEFAULT_DEADLINE);

    let err = deposit(&host, ALICE, sys(10)).await.unwrap_err();

    assert!(matches!(err, ContractError::DeadlinePassed { .. }));
    assert_eq!(escrowed(&host, ALICE).await, None);
    // The user's transfer is part of the rejected unit
    assert_eq!(host.gateway().balance_of(ALICE, SYS), sys(1_000));
}

#[tokio::test]
async fn test_zero_deposit_rejected() {
    let host = funded_host();
    let err = deposit(&host, ALICE, Asset::new(0, SYS).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, ContractError::InvalidAmount { .. }));
}

#[tokio::test]
async fn test_wrong_denomination_rejected() {
    let host = funded_host();
    let eos = Symbol::from_static("EOS", 4);
    host.gateway().issue(ALICE, Asset::new(100, eos).unwrap());

    let err = deposit(&host, ALICE, Asset::new(100, eos).unwrap())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ContractError::WrongDenomination {
            expected: SYS,
            got: eos
        }
    );
    assert_eq!(host.gateway().balance_of(ALICE, eos).amount, 100);
}

#[tokio::test]
async fn test_overdrawn_deposit_rolls_back_balance() {
    let host = funded_host();
    deposit(&host, ALICE, sys(10)).await.unwrap();

    let err = deposit(&host, ALICE, sys(5_000)).await.unwrap_err();

    assert!(matches!(
        err,
        ContractError::Gateway(GatewayError::InsufficientFunds { .. })
    ));
    assert_eq!(escrowed(&host, ALICE).await, Some(sys(10)));
}

#[tokio::test]
async fn test_external_transfer_notice_deposits() {
    let host = funded_host();
    let receipt = host
        .notify_transfer(TransferPayload {
            from: ALICE,
            to: accounts::HODL,
            quantity: sys(3),
            memo: "settled elsewhere".into(),
        })
        .await
        .unwrap();

    assert!(receipt.transfers.is_empty());
    assert_eq!(escrowed(&host, ALICE).await, Some(sys(3)));
}

/// Transfer arguments laid out field by field, bypassing `Symbol` checks.
#[derive(Serialize)]
struct UncheckedTransfer {
    from: Name,
    to: Name,
    amount: i64,
    symbol_code: u64,
    precision: u8,
    memo: String,
}

#[tokio::test]
async fn test_out_of_range_precision_is_a_decode_error() {
    let host = funded_host();
    let forged = Action::new(
        accounts::TOKEN,
        actions::TRANSFER,
        vec![PermissionLevel::active(ALICE)],
        &UncheckedTransfer {
            from: ALICE,
            to: accounts::HODL,
            amount: 0,
            symbol_code: SYS.code().raw(),
            precision: 60,
            memo: String::new(),
        },
    )
    .unwrap();

    let err = host.push_action(forged).await.unwrap_err();

    assert!(matches!(err, ContractError::Decode { .. }));
    assert_eq!(host.read(ChainDatabase::row_count).await, 0);
    // The host keeps serving
    deposit(&host, ALICE, sys(1)).await.unwrap();
    assert_eq!(escrowed(&host, ALICE).await, Some(sys(1)));
}

// =============================================================================
// MISADDRESSED TRANSFERS
// =============================================================================

#[tokio::test]
async fn test_outgoing_transfer_is_ignored() {
    let host = funded_host();
    let rows_before = host.read(ChainDatabase::row_count).await;

    let receipt = host
        .notify_transfer(TransferPayload {
            from: accounts::HODL,
            to: BOB,
            quantity: sys(1),
            memo: String::new(),
        })
        .await
        .unwrap();

    assert_eq!(host.read(ChainDatabase::row_count).await, rows_before);
    assert_eq!(escrowed(&host, BOB).await, None);
    assert_eq!(receipt.console.len(), 1);
}

#[tokio::test]
async fn test_notified_transfer_to_someone_else_is_ignored() {
    let hodl = Hodl::new(accounts::HODL, HodlConfig::default()).unwrap();
    let action = transfer(ALICE, BOB, sys(9));
    let auth = DeclaredAuthorizations::from_action(&action);
    let mut db = ChainDatabase::new();
    let mut outbox = Outbox::new();

    {
        let mut ctx = ActionContext::new(
            accounts::HODL,
            &action,
            TimePointSec::ZERO,
            &mut db,
            &auth,
            &mut outbox,
        );
        hodl.on_notify(&mut ctx, &action).unwrap();
    }

    assert_eq!(db.row_count(), 0);
    assert!(outbox.inline_actions().is_empty());
}

#[tokio::test]
async fn test_transfer_from_other_token_contract_is_ignored() {
    let hodl = Hodl::new(accounts::HODL, HodlConfig::default()).unwrap();
    let mut action = transfer(ALICE, accounts::HODL, sys(9));
    action.account = Name::from_static("fake.token");
    let auth = DeclaredAuthorizations::from_action(&action);
    let mut db = ChainDatabase::new();
    let mut outbox = Outbox::new();

    {
        let mut ctx = ActionContext::new(
            accounts::HODL,
            &action,
            TimePointSec::ZERO,
            &mut db,
            &auth,
            &mut outbox,
        );
        hodl.on_notify(&mut ctx, &action).unwrap();
    }

    assert_eq!(db.row_count(), 0);
    assert!(outbox.console().is_empty());
}

// =============================================================================
// PARTY
// =============================================================================

#[tokio::test]
async fn test_party_before_deadline_keeps_balance() {
    let host = funded_host();
    deposit(&host, ALICE, sys(20)).await.unwrap();

    host.clock().set(DEFAULT_DEADLINE);
    let err = host.push_action(party(ALICE)).await.unwrap_err();

    assert!(matches!(err, ContractError::TooEarly { .. }));
    assert_eq!(escrowed(&host, ALICE).await, Some(sys(20)));
}

#[tokio::test]
async fn test_second_party_has_nothing_to_claim() {
    let host = funded_host();
    deposit(&host, ALICE, sys(20)).await.unwrap();
    after_deadline(&host);

    host.push_action(party(ALICE)).await.unwrap();
    let err = host.push_action(party(ALICE)).await.unwrap_err();

    assert_eq!(err, ContractError::NothingToClaim { holder: ALICE });
    assert_eq!(host.gateway().transfers().len(), 2);
}

#[tokio::test]
async fn test_party_requires_holder() {
    let host = funded_host();
    deposit(&host, ALICE, sys(20)).await.unwrap();
    after_deadline(&host);

    let stolen = Action::new(
        accounts::HODL,
        actions::PARTY,
        vec![PermissionLevel::active(BOB)],
        &PartyPayload { hodler: ALICE },
    )
    .unwrap();
    let err = host.push_action(stolen).await.unwrap_err();

    assert_eq!(err, ContractError::Unauthorized { account: ALICE });
    assert_eq!(escrowed(&host, ALICE).await, Some(sys(20)));
}

#[tokio::test]
async fn test_failed_release_keeps_balance() {
    let host = funded_host();
    deposit(&host, ALICE, sys(20)).await.unwrap();
    after_deadline(&host);

    host.gateway().fail_next();
    let err = host.push_action(party(ALICE)).await.unwrap_err();

    assert!(matches!(
        err,
        ContractError::Gateway(GatewayError::Unavailable(_))
    ));
    assert_eq!(escrowed(&host, ALICE).await, Some(sys(20)));

    // Retry succeeds once the gateway is back
    host.push_action(party(ALICE)).await.unwrap();
    assert_eq!(escrowed(&host, ALICE).await, None);
}

#[tokio::test]
async fn test_deposits_closed_after_deadline_but_party_open() {
    let host = funded_host();
    deposit(&host, ALICE, sys(1)).await.unwrap();
    after_deadline(&host);

    assert!(deposit(&host, ALICE, sys(1)).await.is_err());
    assert!(host.push_action(party(ALICE)).await.is_ok());

    let stats = host.stats().await;
    assert_eq!(stats.actions_succeeded, 2);
    assert_eq!(stats.actions_failed, 1);
    assert_eq!(stats.transfers_dispatched, 2);
}
