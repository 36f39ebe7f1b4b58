//! # Contract Host Service
//!
//! Runs native contracts against the shared table store.
//!
//! ## Unit of Work
//!
//! The pushed action may target a deployed contract or a gateway account
//! (a user `transfer` on the token contract is how escrow deposits are
//! made). It is executed together with all inline actions it spawns as one
//! atomic unit:
//!
//! 1. Write-lock the database and open an undo session
//! 2. Run the action, then inline actions breadth-first. Notified contracts
//!    (`require_recipient`, token transfers) run `on_notify` in the same unit
//! 3. Dispatch queued transfers, then usage counter increments
//! 4. Commit, then deliver notifications to accounts outside the host
//!
//! Any error in steps 2-3 undoes every table mutation and discards the
//! remaining effects. A panic in a contract unwinds through the undo
//! session guard, which reverts the unit before the lock is released.
//!
//! ## Inline Authority
//!
//! A contract may only send inline actions carrying its own authority.

use crate::adapters::{
    DeclaredAuthorizations, InMemoryNotificationChannel, InMemoryTokenLedger,
    InMemoryUsageCounter, ManualClock,
};
use crate::contracts::hodl::DEFAULT_DEADLINE;
use crate::contracts::{AddressBook, AddressBookConfig, Contract, Hodl, HodlConfig};
use crate::domain::context::{ActionContext, Outbox};
use crate::domain::entities::{
    Action, ActionReceipt, Notification, TransferRequest, UsageCall,
};
use crate::domain::table::ChainDatabase;
use crate::errors::ContractError;
use crate::events::{accounts, actions, CountPayload, TransferPayload};
use crate::ports::inbound::ContractApi;
use crate::ports::outbound::{
    AuthorizationGate, Clock, NotificationChannel, TransferGateway, UsageCounter,
};

use async_trait::async_trait;
use quantum_telemetry::{
    contract_span, observe_action_duration, record_action, record_effect, ActionOutcome,
};
use serde::{Deserialize, Serialize};
use shared_types::{Name, PermissionLevel, TimePointSec};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// Contract host configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Maximum nesting of inline actions below the pushed action.
    pub max_inline_depth: usize,
    /// Account whose `transfer` actions go to the transfer gateway.
    pub token_contract: Name,
    /// Account whose `count` actions go to the usage counter.
    pub usage_counter: Name,
    /// Maximum effects (notifications + transfers + counts) per unit.
    pub max_pending_effects: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            max_inline_depth: 4,
            token_contract: accounts::TOKEN,
            usage_counter: accounts::USAGE_COUNTER,
            max_pending_effects: 256,
        }
    }
}

impl HostConfig {
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.max_inline_depth == 0 {
            return Err(ContractError::InvalidConfig(
                "max_inline_depth must be at least 1".into(),
            ));
        }
        if self.max_pending_effects == 0 {
            return Err(ContractError::InvalidConfig(
                "max_pending_effects must be at least 1".into(),
            ));
        }
        if self.token_contract.is_empty() || self.usage_counter.is_empty() {
            return Err(ContractError::InvalidConfig(
                "gateway accounts must not be empty".into(),
            ));
        }
        if self.token_contract == self.usage_counter {
            return Err(ContractError::InvalidConfig(
                "token_contract and usage_counter must differ".into(),
            ));
        }
        Ok(())
    }
}

/// Statistics for the contract host.
#[derive(Debug, Default, Clone)]
pub struct HostStats {
    /// Units of work started (pushed actions and transfer notices).
    pub actions_executed: u64,
    /// Units committed.
    pub actions_succeeded: u64,
    /// Units rolled back for any reason other than missing authority.
    pub actions_failed: u64,
    /// Units rolled back for missing authority.
    pub actions_rejected: u64,
    /// Inline actions executed in committed units.
    pub inline_actions: u64,
    pub notifications_delivered: u64,
    pub transfers_dispatched: u64,
    pub usage_calls: u64,
}

/// Effects accumulated while a unit runs.
#[derive(Debug, Default)]
struct UnitOfWork {
    console: Vec<String>,
    notifications: Vec<Notification>,
    transfers: Vec<TransferRequest>,
    usage: Vec<UsageCall>,
    inline_actions: usize,
}

impl UnitOfWork {
    fn pending_effects(&self) -> usize {
        self.notifications.len() + self.transfers.len() + self.usage.len()
    }
}

/// How the root of a unit enters the host.
#[derive(Clone, Copy, Debug)]
enum Entry {
    /// Action pushed by a caller.
    Push,
    /// Transfer that already happened on the token contract.
    TransferNotice,
}

fn parties(from: Name, to: Name) -> Vec<Name> {
    if from == to {
        vec![from]
    } else {
        vec![from, to]
    }
}

fn check_inline_authority(sender: Name, action: &Action) -> Result<(), ContractError> {
    match action.authorization.iter().find(|level| level.actor != sender) {
        Some(level) => Err(ContractError::Unauthorized {
            account: level.actor,
        }),
        None => Ok(()),
    }
}

/// The contract host.
///
/// Generic over its driven ports so tests can swap any gateway.
pub struct ContractHost<N, G, U, C>
where
    N: NotificationChannel,
    G: TransferGateway,
    U: UsageCounter,
    C: Clock,
{
    config: HostConfig,
    contracts: HashMap<Name, Arc<dyn Contract>>,
    db: Arc<RwLock<ChainDatabase>>,
    notifications: Arc<N>,
    gateway: Arc<G>,
    usage_counter: Arc<U>,
    clock: Arc<C>,
    stats: Arc<RwLock<HostStats>>,
}

impl<N, G, U, C> ContractHost<N, G, U, C>
where
    N: NotificationChannel,
    G: TransferGateway,
    U: UsageCounter,
    C: Clock,
{
    /// Create a host with no contracts deployed.
    pub fn new(
        notifications: Arc<N>,
        gateway: Arc<G>,
        usage_counter: Arc<U>,
        clock: Arc<C>,
        config: HostConfig,
    ) -> Result<Self, ContractError> {
        config.validate()?;
        Ok(Self {
            config,
            contracts: HashMap::new(),
            db: Arc::new(RwLock::new(ChainDatabase::new())),
            notifications,
            gateway,
            usage_counter,
            clock,
            stats: Arc::new(RwLock::new(HostStats::default())),
        })
    }

    /// Deploy `contract` on its account.
    pub fn deploy(&mut self, contract: Arc<dyn Contract>) -> Result<(), ContractError> {
        let account = contract.account();
        if account == self.config.token_contract || account == self.config.usage_counter {
            return Err(ContractError::InvalidConfig(format!(
                "{account} is reserved for a gateway"
            )));
        }
        if self.contracts.contains_key(&account) {
            return Err(ContractError::InvalidConfig(format!(
                "a contract is already deployed on {account}"
            )));
        }
        info!("[qc-11] Deployed contract on {}", account);
        self.contracts.insert(account, contract);
        Ok(())
    }

    #[must_use]
    pub fn is_deployed(&self, account: Name) -> bool {
        self.contracts.contains_key(&account)
    }

    #[must_use]
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn notifications(&self) -> &Arc<N> {
        &self.notifications
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    pub fn usage_counter(&self) -> &Arc<U> {
        &self.usage_counter
    }

    pub fn clock(&self) -> &Arc<C> {
        &self.clock
    }

    /// Get current host statistics.
    pub async fn stats(&self) -> HostStats {
        self.stats.read().await.clone()
    }

    /// Run a read-only query against committed state.
    pub async fn read<R>(&self, query: impl FnOnce(&ChainDatabase) -> R) -> R {
        let db = self.db.read().await;
        query(&db)
    }

    /// Returns true if actions on `account` can be executed: a deployed
    /// contract or one of the gateways.
    #[must_use]
    pub fn is_routable(&self, account: Name) -> bool {
        self.is_deployed(account)
            || account == self.config.token_contract
            || account == self.config.usage_counter
    }

    /// Execute `action` as one unit of work.
    #[instrument(skip(self, action), fields(contract = %action.account, action = %action.name))]
    pub async fn push_action(&self, action: Action) -> Result<ActionReceipt, ContractError> {
        if !self.is_routable(action.account) {
            let err = ContractError::UnknownContract(action.account);
            self.record_failure(action.account, action.name, &err, 0).await;
            return Err(err);
        }
        self.execute(action, Entry::Push).await
    }

    /// Hand an external token transfer to the hosted contracts among its
    /// parties.
    #[instrument(skip(self, transfer), fields(from = %transfer.from, to = %transfer.to))]
    pub async fn notify_transfer(
        &self,
        transfer: TransferPayload,
    ) -> Result<ActionReceipt, ContractError> {
        let action = Action::new(
            self.config.token_contract,
            actions::TRANSFER,
            vec![PermissionLevel::active(transfer.from)],
            &transfer,
        )?;
        self.execute(action, Entry::TransferNotice).await
    }

    // =========================================================================
    // UNIT OF WORK
    // =========================================================================

    async fn execute(&self, root: Action, entry: Entry) -> Result<ActionReceipt, ContractError> {
        let started = Instant::now();
        let (contract, name) = (root.account, root.name);
        let now = self.clock.now();

        let mut db = self.db.write().await;
        let mut session = db.start_undo_session()?;

        let outcome = match self.run_unit(&mut session, now, &root, entry) {
            Ok(work) => self.dispatch_effects(&work).await.map(|()| work),
            Err(err) => Err(err),
        };
        let work = match outcome {
            Ok(work) => {
                let writes = session.commit();
                debug!(writes, "unit of work committed");
                work
            }
            Err(err) => {
                let reverted = session.undo();
                drop(db);
                self.record_failure(contract, name, &err, reverted).await;
                return Err(err);
            }
        };
        drop(db);

        for notification in &work.notifications {
            self.notifications.deliver(notification.clone()).await;
            record_effect("notification");
        }

        {
            let mut stats = self.stats.write().await;
            stats.actions_executed += 1;
            stats.actions_succeeded += 1;
            stats.inline_actions += work.inline_actions as u64;
            stats.notifications_delivered += work.notifications.len() as u64;
            stats.transfers_dispatched += work.transfers.len() as u64;
            stats.usage_calls += work.usage.len() as u64;
        }
        record_action(
            &contract.to_string(),
            &name.to_string(),
            ActionOutcome::Committed,
        );
        observe_action_duration(started.elapsed().as_secs_f64());
        info!(
            inline = work.inline_actions,
            notifications = work.notifications.len(),
            "[qc-11] {}::{} committed",
            contract,
            name
        );

        Ok(ActionReceipt {
            contract,
            action: name,
            console: work.console,
            notifications: work.notifications,
            transfers: work.transfers,
            usage: work.usage,
            inline_actions: work.inline_actions,
            executed_at: now,
        })
    }

    fn run_unit(
        &self,
        db: &mut ChainDatabase,
        now: TimePointSec,
        root: &Action,
        entry: Entry,
    ) -> Result<UnitOfWork, ContractError> {
        let mut work = UnitOfWork::default();

        let spawned = match entry {
            Entry::Push => self.dispatch(db, now, root, &mut work)?,
            Entry::TransferNotice => {
                let transfer: TransferPayload = root.decode()?;
                let hosted = parties(transfer.from, transfer.to)
                    .into_iter()
                    .filter(|party| self.is_deployed(*party))
                    .collect();
                self.run_receivers(db, now, root, hosted, &mut work)?
            }
        };
        self.check_effects(&work)?;

        let mut queue: VecDeque<(Action, usize)> =
            spawned.into_iter().map(|action| (action, 1)).collect();
        while let Some((action, depth)) = queue.pop_front() {
            if depth > self.config.max_inline_depth {
                return Err(ContractError::InlineDepthExceeded {
                    depth,
                    max: self.config.max_inline_depth,
                });
            }
            work.inline_actions += 1;
            let spawned = self.dispatch(db, now, &action, &mut work)?;
            self.check_effects(&work)?;
            queue.extend(spawned.into_iter().map(|next| (next, depth + 1)));
        }
        Ok(work)
    }

    /// Route one action to a gateway or a hosted contract. Returns the
    /// inline actions it spawned.
    fn dispatch(
        &self,
        db: &mut ChainDatabase,
        now: TimePointSec,
        action: &Action,
        work: &mut UnitOfWork,
    ) -> Result<Vec<Action>, ContractError> {
        if action.account == self.config.token_contract && action.name == actions::TRANSFER {
            let transfer: TransferPayload = action.decode()?;
            DeclaredAuthorizations::from_action(action).require_auth(transfer.from)?;
            work.transfers.push(TransferRequest {
                token_contract: action.account,
                from: transfer.from,
                to: transfer.to,
                quantity: transfer.quantity,
                memo: transfer.memo,
            });
            return self.run_receivers(db, now, action, parties(transfer.from, transfer.to), work);
        }

        if action.account == self.config.usage_counter && action.name == actions::COUNT {
            let count: CountPayload = action.decode()?;
            let caller = action
                .authorization
                .first()
                .map(|level| level.actor)
                .ok_or(ContractError::Unauthorized {
                    account: action.account,
                })?;
            work.usage.push(UsageCall {
                caller,
                user: count.user,
                kind: count.kind,
            });
            return Ok(Vec::new());
        }

        if !self.is_deployed(action.account) {
            return Err(ContractError::UnknownContract(action.account));
        }
        self.run_receivers(db, now, action, vec![action.account], work)
    }

    /// Run `action` on each receiver in turn. The first receiver equal to
    /// `action.account` applies it; everyone else is notified. Recipients
    /// added by contracts are appended as they appear.
    fn run_receivers(
        &self,
        db: &mut ChainDatabase,
        now: TimePointSec,
        action: &Action,
        initial: Vec<Name>,
        work: &mut UnitOfWork,
    ) -> Result<Vec<Action>, ContractError> {
        let auth = DeclaredAuthorizations::from_action(action);
        let mut spawned = Vec::new();
        let mut seen = initial.clone();
        let mut receivers: VecDeque<Name> = initial.into();

        while let Some(receiver) = receivers.pop_front() {
            let Some(contract) = self.contracts.get(&receiver) else {
                work.notifications.push(Notification::of(receiver, action));
                continue;
            };

            let _span = contract_span!("apply", receiver = %receiver, action = %action.name).entered();
            let mut outbox = Outbox::new();
            {
                let mut ctx = ActionContext::new(receiver, action, now, db, &auth, &mut outbox);
                if receiver == action.account {
                    contract.apply(&mut ctx, action)?;
                } else {
                    contract.on_notify(&mut ctx, action)?;
                }
            }

            let (inline, recipients, console) = outbox.into_parts();
            for sent in &inline {
                check_inline_authority(receiver, sent)?;
            }
            spawned.extend(inline);
            work.console.extend(console);
            for recipient in recipients {
                if !seen.contains(&recipient) {
                    seen.push(recipient);
                    receivers.push_back(recipient);
                }
            }
        }
        Ok(spawned)
    }

    fn check_effects(&self, work: &UnitOfWork) -> Result<(), ContractError> {
        if work.pending_effects() > self.config.max_pending_effects {
            return Err(ContractError::TooManyEffects {
                max: self.config.max_pending_effects,
            });
        }
        Ok(())
    }

    async fn dispatch_effects(&self, work: &UnitOfWork) -> Result<(), ContractError> {
        for transfer in &work.transfers {
            self.gateway.transfer(transfer).await?;
            record_effect("transfer");
        }
        for call in &work.usage {
            self.usage_counter.count(call).await?;
            record_effect("usage");
        }
        Ok(())
    }

    async fn record_failure(&self, contract: Name, action: Name, err: &ContractError, reverted: usize) {
        let outcome = if err.is_authorization() {
            ActionOutcome::Rejected
        } else {
            ActionOutcome::Failed
        };
        {
            let mut stats = self.stats.write().await;
            stats.actions_executed += 1;
            match outcome {
                ActionOutcome::Rejected => stats.actions_rejected += 1,
                _ => stats.actions_failed += 1,
            }
        }
        record_action(&contract.to_string(), &action.to_string(), outcome);
        warn!(
            reverted,
            outcome = outcome.as_str(),
            "[qc-11] {}::{} rolled back: {}",
            contract,
            action,
            err
        );
    }
}

/// Host wired to the in-memory adapters.
pub type InMemoryHost =
    ContractHost<InMemoryNotificationChannel, InMemoryTokenLedger, InMemoryUsageCounter, ManualClock>;

/// Create a host with in-memory adapters and both contracts deployed with
/// their default configuration (for testing).
///
/// The clock starts one hour before the escrow deadline.
pub fn create_test_host() -> Result<InMemoryHost, ContractError> {
    let mut host = ContractHost::new(
        Arc::new(InMemoryNotificationChannel::new()),
        Arc::new(InMemoryTokenLedger::new()),
        Arc::new(InMemoryUsageCounter::new(accounts::ADDRESSBOOK)),
        Arc::new(ManualClock::new(DEFAULT_DEADLINE.saturating_sub(3600))),
        HostConfig::default(),
    )?;
    host.deploy(Arc::new(AddressBook::new(
        accounts::ADDRESSBOOK,
        AddressBookConfig::default(),
    )?))?;
    host.deploy(Arc::new(Hodl::new(accounts::HODL, HodlConfig::default())?))?;
    Ok(host)
}

// =============================================================================
// ContractApi Implementation
// =============================================================================

#[async_trait]
impl<N, G, U, C> ContractApi for ContractHost<N, G, U, C>
where
    N: NotificationChannel,
    G: TransferGateway,
    U: UsageCounter,
    C: Clock,
{
    async fn push_action(&self, action: Action) -> Result<ActionReceipt, ContractError> {
        ContractHost::push_action(self, action).await
    }

    async fn notify_transfer(
        &self,
        transfer: TransferPayload,
    ) -> Result<ActionReceipt, ContractError> {
        ContractHost::notify_transfer(self, transfer).await
    }
}
