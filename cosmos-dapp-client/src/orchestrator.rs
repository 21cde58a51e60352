use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info};

use crate::{
    chain::ChainDescriptor,
    definitions::SUCCESS_DISPLAY_WINDOW,
    errors::{ExecuteError, WalletError},
    executor::TransactionExecutor,
    msg::{BroadcastResult, ContractCallRequest},
    session::WalletSession,
    timer::{format_duration, CountdownEvent, CountdownHandle, RateLimitTimer},
};

/// What a dApp surface renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurfaceState {
    pub in_flight: bool,
    pub error: Option<String>,
    /// Hash of the last successful transaction, cleared after the display window
    pub success: Option<String>,
    /// Seconds until the contract accepts the action again
    pub countdown: Option<u64>,
}

impl SurfaceState {
    /// The action button is enabled only when nothing is pending.
    pub fn can_perform(&self) -> bool {
        !self.in_flight && self.countdown.is_none()
    }

    pub fn rate_limit_notice(&self) -> Option<String> {
        self.countdown.map(|seconds| {
            format!(
                "Rate limit exceeded. You can try again in {}",
                format_duration(seconds)
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Another action of this surface was still in flight, nothing was sent
    Busy,
    Completed(Result<BroadcastResult, ExecuteError>),
}

#[derive(Default)]
struct Timers {
    countdown: Option<CountdownHandle>,
    success_reset: Option<JoinHandle<()>>,
}

impl Timers {
    fn cancel(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            countdown.cancel();
        }
        if let Some(success_reset) = self.success_reset.take() {
            success_reset.abort();
        }
    }
}

struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
    state: &'a watch::Sender<SurfaceState>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|state| state.in_flight = false);
        self.flag.store(false, Ordering::Release);
    }
}

/// Single entry point of one dApp surface (faucet, donation or swap).
///
/// At most one `perform` runs at a time; the orchestrator owns the timers it
/// starts and cancels them on the next action, on `teardown` and on drop.
pub struct ClaimOrchestrator {
    executor: TransactionExecutor,
    in_flight: AtomicBool,
    generation: Arc<AtomicU64>,
    state: Arc<watch::Sender<SurfaceState>>,
    timers: Mutex<Timers>,
    success_window: Duration,
}

impl ClaimOrchestrator {
    pub fn new(executor: TransactionExecutor) -> ClaimOrchestrator {
        let (state, _) = watch::channel(SurfaceState::default());

        ClaimOrchestrator {
            executor,
            in_flight: AtomicBool::new(false),
            generation: Arc::new(AtomicU64::new(0)),
            state: Arc::new(state),
            timers: Mutex::new(Timers::default()),
            success_window: SUCCESS_DISPLAY_WINDOW,
        }
    }

    pub fn with_success_window(mut self, window: Duration) -> ClaimOrchestrator {
        self.success_window = window;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<SurfaceState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SurfaceState {
        self.state.borrow().clone()
    }

    fn timers(&self) -> MutexGuard<'_, Timers> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn perform(
        &self,
        session: &WalletSession,
        chain: &ChainDescriptor,
        req: &ContractCallRequest,
    ) -> Dispatch {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(action = %req.action, "Action already in flight, ignored");
            return Dispatch::Busy;
        }

        let _guard = InFlightGuard {
            flag: &self.in_flight,
            state: &self.state,
        };

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.timers().cancel();
        self.state.send_modify(|state| {
            *state = SurfaceState {
                in_flight: true,
                ..SurfaceState::default()
            }
        });

        let result = self.executor.execute(session, chain, req).await;

        if self.generation.load(Ordering::Acquire) != generation {
            debug!(action = %req.action, "Surface torn down during broadcast, result not shown");
            return Dispatch::Completed(result);
        }

        match &result {
            Ok(BroadcastResult::Success { tx_hash, .. }) => {
                self.state
                    .send_modify(|state| state.success = Some(tx_hash.clone()));
                self.schedule_success_reset(generation);
            }
            Ok(BroadcastResult::RateLimited {
                retry_after_seconds,
            }) => {
                info!(action = %req.action, retry_after_seconds, "Rate limited");
                self.start_countdown(*retry_after_seconds);
            }
            Ok(BroadcastResult::Rejected { message }) => self.set_error(message.clone()),
            Ok(BroadcastResult::WalletUnavailable) => {
                self.set_error(WalletError::NotConnected.to_string())
            }
            Err(err) => self.set_error(err.to_string()),
        }

        Dispatch::Completed(result)
    }

    fn set_error(&self, message: String) {
        self.state.send_modify(|state| state.error = Some(message));
    }

    fn start_countdown(&self, seconds: u64) {
        self.state
            .send_modify(|state| state.countdown = Some(seconds));

        let state = self.state.clone();
        let handle = RateLimitTimer::start(seconds, move |event| match event {
            CountdownEvent::Tick(remaining) => {
                state.send_modify(|state| state.countdown = Some(remaining))
            }
            CountdownEvent::Completed => state.send_modify(|state| state.countdown = None),
        });

        self.timers().countdown = Some(handle);
    }

    fn schedule_success_reset(&self, generation: u64) {
        let state = self.state.clone();
        let current = self.generation.clone();
        let window = self.success_window;

        let task = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            if current.load(Ordering::Acquire) == generation {
                state.send_if_modified(|state| state.success.take().is_some());
            }
        });

        self.timers().success_reset = Some(task);
    }

    /// Clears error and success notices, the countdown keeps running.
    pub fn reset_status(&self) {
        if let Some(success_reset) = self.timers().success_reset.take() {
            success_reset.abort();
        }
        self.state.send_modify(|state| {
            state.error = None;
            state.success = None;
        });
    }

    /// Cancels every timer of this surface.
    pub fn teardown(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.timers().cancel();
        self.state.send_modify(|state| state.countdown = None);
    }
}

impl Drop for ClaimOrchestrator {
    fn drop(&mut self) {
        self.timers().cancel();
    }
}

#[cfg(test)]
mod test {
    use std::{sync::Arc, time::Duration};

    use cosmwasm_std::coin;

    use crate::{
        chain::ChainDescriptor,
        errors::{ExecuteError, ValidationError},
        executor::TransactionExecutor,
        mock::{test_address, FakeClientFactory, FakeProvider},
        msg::{BroadcastResult, ContractAction, ContractCallRequest},
        session::WalletSession,
    };

    use super::*;

    async fn setup(factory: Arc<FakeClientFactory>) -> (ChainDescriptor, WalletSession, ClaimOrchestrator) {
        let chain = ChainDescriptor::neutron_testnet().unwrap();
        let mut session = WalletSession::with_provider(Arc::new(FakeProvider::new(&chain)));
        session.connect(&chain).await.unwrap();

        let orchestrator = ClaimOrchestrator::new(TransactionExecutor::new(factory));
        (chain, session, orchestrator)
    }

    #[tokio::test(start_paused = true)]
    async fn claim_success_is_shown_then_cleared() {
        let factory = Arc::new(FakeClientFactory::succeeding("ADCA1F"));
        let chain = ChainDescriptor::neutron_testnet().unwrap();
        let mut session = WalletSession::with_provider(Arc::new(FakeProvider::new(&chain)));
        let orchestrator = ClaimOrchestrator::new(TransactionExecutor::new(factory.clone()));

        assert!(!session.is_connected());
        let address = session.connect(&chain).await.unwrap();
        assert!(address.to_string().starts_with("neutron1"));

        let dispatch = orchestrator
            .perform(&session, &chain, &ContractCallRequest::claim(test_address(7)))
            .await;
        assert!(matches!(
            dispatch,
            Dispatch::Completed(Ok(BroadcastResult::Success { ref tx_hash, .. })) if tx_hash == "ADCA1F"
        ));

        let state = orchestrator.state();
        assert_eq!(state.success.as_deref(), Some("ADCA1F"));
        assert_eq!(state.countdown, None);
        assert_eq!(state.error, None);
        assert!(!state.in_flight);

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert_eq!(orchestrator.state().success.as_deref(), Some("ADCA1F"));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(orchestrator.state(), SurfaceState::default());
        assert_eq!(factory.submissions().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn second_perform_while_in_flight_is_ignored() {
        let factory = Arc::new(FakeClientFactory::succeeding("ADCA").with_latency(Duration::from_secs(2)));
        let (chain, session, orchestrator) = setup(factory.clone()).await;
        let req = ContractCallRequest::claim(test_address(7));

        let mut states = orchestrator.subscribe();
        let (first, second) = tokio::join!(
            orchestrator.perform(&session, &chain, &req),
            orchestrator.perform(&session, &chain, &req)
        );

        assert!(matches!(first, Dispatch::Completed(Ok(_))));
        assert_eq!(second, Dispatch::Busy);
        assert_eq!(factory.submissions().len(), 1);
        assert!(states.has_changed().unwrap());
        assert!(!states.borrow_and_update().in_flight);

        // the flag is released once the first call finishes
        assert!(matches!(
            orchestrator.perform(&session, &chain, &req).await,
            Dispatch::Completed(Ok(_))
        ));
        assert_eq!(factory.submissions().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_drives_countdown() {
        let factory = Arc::new(FakeClientFactory::failing(
            "Rate limit exceeded. You can claim again in 45 seconds",
        ));
        let (chain, session, orchestrator) = setup(factory.clone()).await;
        let req = ContractCallRequest::claim(test_address(7));

        orchestrator.perform(&session, &chain, &req).await;

        let state = orchestrator.state();
        assert_eq!(state.countdown, Some(45));
        assert_eq!(state.error, None);
        assert!(!state.can_perform());
        assert_eq!(
            state.rate_limit_notice().as_deref(),
            Some("Rate limit exceeded. You can try again in 45s")
        );

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(orchestrator.state().countdown, Some(35));

        tokio::time::sleep(Duration::from_secs(40)).await;
        assert_eq!(orchestrator.state().countdown, None);
        assert!(orchestrator.state().can_perform());
    }

    #[tokio::test(start_paused = true)]
    async fn new_action_cancels_running_countdown() {
        let factory = Arc::new(FakeClientFactory::failing(
            "Rate limit exceeded. You can claim again in 120 seconds",
        ));
        let (chain, session, orchestrator) = setup(factory.clone()).await;
        let req = ContractCallRequest::claim(test_address(7));

        orchestrator.perform(&session, &chain, &req).await;
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(orchestrator.state().countdown, Some(117));

        factory.succeed("BEEF");
        orchestrator.perform(&session, &chain, &req).await;
        assert_eq!(orchestrator.state().countdown, None);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(orchestrator.state().countdown, None);
        assert_eq!(orchestrator.state().success.as_deref(), Some("BEEF"));
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_stops_countdown() {
        let factory = Arc::new(FakeClientFactory::failing(
            "Rate limit exceeded. You can claim again in 30 seconds",
        ));
        let (chain, session, orchestrator) = setup(factory).await;

        orchestrator
            .perform(&session, &chain, &ContractCallRequest::claim(test_address(7)))
            .await;
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(orchestrator.state().countdown, Some(29));

        orchestrator.teardown();
        let mut states = orchestrator.subscribe();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(!states.has_changed().unwrap());
        assert_eq!(states.borrow_and_update().countdown, None);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_during_broadcast_starts_no_timer() {
        let factory = Arc::new(
            FakeClientFactory::failing("Rate limit exceeded. You can claim again in 30 seconds")
                .with_latency(Duration::from_secs(2)),
        );
        let (chain, session, orchestrator) = setup(factory.clone()).await;
        let req = ContractCallRequest::claim(test_address(7));

        let (dispatch, _) = tokio::join!(orchestrator.perform(&session, &chain, &req), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            orchestrator.teardown();
        });

        assert_eq!(
            dispatch,
            Dispatch::Completed(Ok(BroadcastResult::RateLimited {
                retry_after_seconds: 30
            }))
        );
        assert!(orchestrator.timers().countdown.is_none());
        assert!(orchestrator.timers().success_reset.is_none());

        tokio::time::sleep(Duration::from_secs(5)).await;
        let state = orchestrator.state();
        assert_eq!(state.countdown, None);
        assert!(!state.in_flight);
        assert!(state.can_perform());

        factory.succeed("BEEF");
        let (dispatch, _) = tokio::join!(orchestrator.perform(&session, &chain, &req), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            orchestrator.teardown();
        });
        assert!(matches!(dispatch, Dispatch::Completed(Ok(BroadcastResult::Success { .. }))));
        assert!(orchestrator.timers().success_reset.is_none());
    }

    #[tokio::test]
    async fn failures_become_displayable_errors() {
        let factory = Arc::new(FakeClientFactory::failing("out of gas"));
        let (chain, session, orchestrator) = setup(factory.clone()).await;

        orchestrator
            .perform(&session, &chain, &ContractCallRequest::claim(test_address(7)))
            .await;
        assert_eq!(orchestrator.state().error.as_deref(), Some("out of gas"));
        assert!(orchestrator.state().can_perform());

        orchestrator.reset_status();
        assert_eq!(orchestrator.state(), SurfaceState::default());

        let mut req = ContractCallRequest::claim(test_address(7));
        req.action = ContractAction::Swap;
        let dispatch = orchestrator.perform(&session, &chain, &req).await;
        assert_eq!(
            dispatch,
            Dispatch::Completed(Err(ExecuteError::Validation(
                ValidationError::NonPositiveAmount
            )))
        );
        assert_eq!(
            orchestrator.state().error.as_deref(),
            Some("Amount must be greater than 0")
        );
        assert_eq!(factory.submissions().len(), 1);

        let disconnected = WalletSession::new(None);
        orchestrator.perform(&disconnected, &chain, &req).await;
        assert_eq!(
            orchestrator.state().error.as_deref(),
            Some("Please connect your wallet first")
        );
    }

    #[tokio::test]
    async fn donate_end_to_end() {
        let factory = Arc::new(FakeClientFactory::succeeding("D0NA7E"));
        let (chain, session, orchestrator) = setup(factory.clone()).await;

        let req = ContractCallRequest::donate(test_address(5), None, "5", &chain).unwrap();
        orchestrator.perform(&session, &chain, &req).await;

        assert_eq!(orchestrator.state().success.as_deref(), Some("D0NA7E"));
        assert_eq!(
            factory.submissions()[0].funds,
            vec![coin(5_000_000, "untrn")]
        );
    }
}
