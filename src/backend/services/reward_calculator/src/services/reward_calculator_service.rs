use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::engine::{InflationModel, RewardCalculatorEngine};
use crate::models::{
    chain::{Balance, ChainId, ChainProfile, EraIndex},
    config::ServiceConfig,
    exposure::ValidatorExposure,
    snapshot::ChainStateSnapshot,
};
use crate::repositories::traits::{ChainStateSource, ChainStateUpdate};
use crate::utils::errors::{RewardCalculatorServiceError, ServiceResult};
use crate::utils::scale::StorageDecoder;

type EngineReply = oneshot::Sender<ServiceResult<RewardCalculatorEngine>>;

enum Command {
    Setup,
    Throttle,
    Update(ChainProfile),
    Fetch { request_id: Uuid, reply: EngineReply },
    Status(oneshot::Sender<ServiceStatus>),
}

struct SubscriptionEvent {
    subscription_id: u64,
    chain_id: ChainId,
    update: ChainStateUpdate,
}

struct ActiveSubscription {
    id: u64,
    task: JoinHandle<()>,
}

/// Caller waiting for the first snapshot of `chain_id`.
struct PendingRequest {
    request_id: Uuid,
    chain_id: ChainId,
    reply: EngineReply,
}

/// Point-in-time view of the service state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStatus {
    pub is_active: bool,
    pub chain_id: ChainId,
    /// Generation of the current snapshot, if any.
    pub generation: Option<u64>,
    pub pending_requests: usize,
}

/// Handle to the reward calculator service.
///
/// All state lives in a single task; the handle only sends it messages, so
/// snapshot replacement and request queueing are never interleaved. The task
/// stops once every handle has been dropped.
#[derive(Clone)]
pub struct RewardCalculatorService {
    commands: mpsc::UnboundedSender<Command>,
    config: Arc<ServiceConfig>,
}

impl RewardCalculatorService {
    /// Start the service task for `chain`. The service is inactive until `setup`.
    pub fn spawn(
        config: ServiceConfig,
        chain: ChainProfile,
        source: Arc<dyn ChainStateSource>,
    ) -> ServiceResult<Self> {
        config.validate()?;
        chain.validate()?;

        let inflation = InflationModel::new(config.constants)?;
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let state = ServiceState {
            inflation,
            chain,
            source,
            events: events_tx,
            is_active: false,
            subscription: None,
            next_subscription_id: 0,
            total_issuance: None,
            validators: None,
            snapshot: None,
            generation: 0,
            pending: VecDeque::new(),
        };

        tokio::spawn(state.run(commands_rx, events_rx));

        Ok(Self {
            commands: commands_tx,
            config: Arc::new(config),
        })
    }

    /// Start following chain state. No-op when already active.
    pub fn setup(&self) -> ServiceResult<()> {
        self.send(Command::Setup)
    }

    /// Stop following chain state and fail pending requests. The last
    /// snapshot keeps being served.
    pub fn throttle(&self) -> ServiceResult<()> {
        self.send(Command::Throttle)
    }

    /// Switch to another chain, discarding the current snapshot.
    pub fn update(&self, chain: ChainProfile) -> ServiceResult<()> {
        chain.validate()?;
        self.send(Command::Update(chain))
    }

    /// Switch to a chain listed in the service configuration.
    pub fn update_to_chain(&self, id: ChainId) -> ServiceResult<()> {
        let chain = self
            .config
            .chain(id)
            .cloned()
            .ok_or(RewardCalculatorServiceError::UnknownChain(id))?;
        self.send(Command::Update(chain))
    }

    /// Calculator over the current snapshot, waiting up to `timeout` for the
    /// first one to arrive.
    pub async fn fetch_calculator(
        &self,
        timeout: Duration,
    ) -> ServiceResult<RewardCalculatorEngine> {
        let request_id = Uuid::new_v4();
        let (reply, receiver) = oneshot::channel();
        self.send(Command::Fetch { request_id, reply })?;

        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(RewardCalculatorServiceError::UnexpectedMissingResult),
            Err(_) => {
                debug!(%request_id, ?timeout, "calculator request timed out");
                Err(RewardCalculatorServiceError::Timeout)
            }
        }
    }

    pub async fn fetch_calculator_default(&self) -> ServiceResult<RewardCalculatorEngine> {
        self.fetch_calculator(self.config.default_timeout()).await
    }

    pub async fn status(&self) -> ServiceResult<ServiceStatus> {
        let (reply, receiver) = oneshot::channel();
        self.send(Command::Status(reply))?;
        receiver
            .await
            .map_err(|_| RewardCalculatorServiceError::ServiceStopped)
    }

    fn send(&self, command: Command) -> ServiceResult<()> {
        self.commands
            .send(command)
            .map_err(|_| RewardCalculatorServiceError::ServiceStopped)
    }
}

struct ServiceState {
    inflation: InflationModel,
    chain: ChainProfile,
    source: Arc<dyn ChainStateSource>,
    events: mpsc::UnboundedSender<SubscriptionEvent>,
    is_active: bool,
    subscription: Option<ActiveSubscription>,
    next_subscription_id: u64,
    total_issuance: Option<Balance>,
    validators: Option<(EraIndex, Vec<ValidatorExposure>)>,
    snapshot: Option<Arc<ChainStateSnapshot>>,
    generation: u64,
    pending: VecDeque<PendingRequest>,
}

impl ServiceState {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: mpsc::UnboundedReceiver<SubscriptionEvent>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(event) = events.recv() => self.handle_event(event),
            }
        }

        self.cancel_subscription();
        self.fail_pending(RewardCalculatorServiceError::ServiceStopped);
        debug!(chain = %self.chain.id, "reward calculator service stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Setup => self.setup(),
            Command::Throttle => self.throttle(),
            Command::Update(chain) => self.update(chain),
            Command::Fetch { request_id, reply } => self.fetch(request_id, reply),
            Command::Status(reply) => {
                let _ = reply.send(self.status());
            }
        }
    }

    fn setup(&mut self) {
        if self.is_active {
            return;
        }

        self.is_active = true;
        info!(
            chain = %self.chain.id,
            name = %self.chain.name,
            "reward calculator service activated"
        );
        self.subscribe();
    }

    fn throttle(&mut self) {
        if !self.is_active {
            return;
        }

        self.is_active = false;
        self.cancel_subscription();
        self.fail_pending(RewardCalculatorServiceError::ServiceStopped);
        info!(chain = %self.chain.id, "reward calculator service throttled");
    }

    fn update(&mut self, chain: ChainProfile) {
        if chain.id == self.chain.id {
            // Same chain, possibly new metadata: engines built from now on use it.
            self.chain = chain;
            return;
        }

        info!(from = %self.chain.id, to = %chain.id, "switching reward calculator chain");

        self.cancel_subscription();
        self.chain = chain;
        self.total_issuance = None;
        self.validators = None;
        self.snapshot = None;

        if self.is_active {
            self.subscribe();
        }
    }

    fn fetch(&mut self, request_id: Uuid, reply: EngineReply) {
        if let Some(snapshot) = &self.snapshot {
            let _ = reply.send(self.build_engine(snapshot.clone()));
            return;
        }

        self.pending.retain(|request| !request.reply.is_closed());
        self.pending.push_back(PendingRequest {
            request_id,
            chain_id: self.chain.id,
            reply,
        });

        debug!(
            %request_id,
            chain = %self.chain.id,
            pending = self.pending.len(),
            "calculator request queued until chain state arrives"
        );
    }

    fn status(&self) -> ServiceStatus {
        ServiceStatus {
            is_active: self.is_active,
            chain_id: self.chain.id,
            generation: self.snapshot.as_ref().map(|snapshot| snapshot.generation()),
            pending_requests: self
                .pending
                .iter()
                .filter(|request| !request.reply.is_closed())
                .count(),
        }
    }

    fn subscribe(&mut self) {
        self.next_subscription_id += 1;
        let subscription_id = self.next_subscription_id;
        let chain_id = self.chain.id;
        let source = self.source.clone();
        let events = self.events.clone();

        let task = tokio::spawn(async move {
            let mut updates = match source.subscribe(chain_id).await {
                Ok(updates) => updates,
                Err(e) => {
                    let _ = events.send(SubscriptionEvent {
                        subscription_id,
                        chain_id,
                        update: ChainStateUpdate::Failed(e.to_string()),
                    });
                    return;
                }
            };

            while let Some(update) = updates.recv().await {
                let event = SubscriptionEvent {
                    subscription_id,
                    chain_id,
                    update,
                };

                if events.send(event).is_err() {
                    break;
                }
            }

            debug!(%chain_id, subscription_id, "chain state subscription closed");
        });

        self.subscription = Some(ActiveSubscription {
            id: subscription_id,
            task,
        });
    }

    fn cancel_subscription(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.task.abort();
            debug!(
                chain = %self.chain.id,
                subscription_id = subscription.id,
                "chain state subscription cancelled"
            );
        }
    }

    fn handle_event(&mut self, event: SubscriptionEvent) {
        let is_current = self
            .subscription
            .as_ref()
            .map_or(false, |subscription| subscription.id == event.subscription_id);

        if !is_current || event.chain_id != self.chain.id {
            debug!(
                chain = %event.chain_id,
                subscription_id = event.subscription_id,
                "dropping update from inactive subscription"
            );
            return;
        }

        match event.update {
            ChainStateUpdate::TotalIssuance(raw) => {
                match StorageDecoder::decode_total_issuance(&raw) {
                    Ok(total_issuance) => {
                        self.total_issuance = Some(total_issuance);
                        self.publish_snapshot();
                    }
                    Err(e) => {
                        warn!(
                            chain = %self.chain.id,
                            error = %e,
                            "failed to decode total issuance"
                        );
                    }
                }
            }
            ChainStateUpdate::Validators { era, exposures } => {
                if let Err(e) = exposures.iter().try_for_each(ValidatorExposure::validate) {
                    warn!(
                        chain = %self.chain.id,
                        era,
                        error = %e,
                        "rejecting validator exposures"
                    );
                    return;
                }

                self.validators = Some((era, exposures));
                self.publish_snapshot();
            }
            ChainStateUpdate::Failed(reason) => {
                error!(
                    chain = %self.chain.id,
                    %reason,
                    "chain state subscription reported failure"
                );
            }
        }
    }

    fn publish_snapshot(&mut self) {
        let (Some(total_issuance), Some((era, validators))) =
            (self.total_issuance, &self.validators)
        else {
            return;
        };

        self.generation += 1;
        let snapshot = Arc::new(ChainStateSnapshot::new(
            self.chain.id,
            *era,
            self.generation,
            total_issuance,
            validators.clone(),
        ));
        self.snapshot = Some(snapshot.clone());

        info!(
            chain = %self.chain.id,
            era = *era,
            generation = self.generation,
            validators = snapshot.validators().len(),
            "chain state snapshot updated"
        );

        let pending = std::mem::take(&mut self.pending);
        let mut waiting = VecDeque::with_capacity(pending.len());
        for request in pending {
            if request.chain_id != snapshot.chain_id() {
                waiting.push_back(request);
                continue;
            }

            if request.reply.send(self.build_engine(snapshot.clone())).is_err() {
                debug!(request_id = %request.request_id, "calculator requester went away");
            }
        }
        self.pending = waiting;
    }

    fn build_engine(
        &self,
        snapshot: Arc<ChainStateSnapshot>,
    ) -> ServiceResult<RewardCalculatorEngine> {
        Ok(RewardCalculatorEngine::new(
            snapshot,
            self.inflation,
            self.chain.eras_per_day,
        )?)
    }

    fn fail_pending(&mut self, error: RewardCalculatorServiceError) {
        for request in self.pending.drain(..) {
            let _ = request.reply.send(Err(error.clone()));
        }
    }
}
