use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chat_core::ChatMessage;
use relay_llm::ChatTransport;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::ConversationConfig;
use crate::error::{StoreError, SubmitRejected};
use crate::exchange::builder::prepare_exchange;
use crate::exchange::events::{ExchangeEvent, ExchangeOutcome};
use crate::exchange::runner::Exchange;
use crate::exchange::state::ExchangeState;
use crate::flow::FlowRegulator;
use crate::identity::ModelIdentity;
use crate::signal::FallbackDetector;
use crate::storage::ExchangeStore;

/// Bound of the per-exchange event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Caller side of a running exchange.
pub struct ExchangeHandle {
    exchange_id: String,
    events: mpsc::Receiver<ExchangeEvent>,
}

impl ExchangeHandle {
    pub fn exchange_id(&self) -> &str {
        &self.exchange_id
    }

    /// Next event; `None` once the exchange has finished and all events were read.
    pub async fn recv(&mut self) -> Option<ExchangeEvent> {
        self.events.recv().await
    }

    pub fn into_stream(self) -> ReceiverStream<ExchangeEvent> {
        ReceiverStream::new(self.events)
    }
}

struct ActiveExchange {
    id: String,
    cancel_token: CancellationToken,
    settled: Arc<AtomicBool>,
    task: JoinHandle<ExchangeOutcome>,
}

/// Orchestrates exchanges for one conversation, one at a time.
///
/// Owns the sealed history and is the only place a cancellation token is
/// created or replaced.
pub struct Conversation {
    id: String,
    model: ModelIdentity,
    config: ConversationConfig,
    transport: Arc<dyn ChatTransport>,
    store: Option<Arc<dyn ExchangeStore>>,
    history: Arc<RwLock<Vec<ChatMessage>>>,
    active: Option<ActiveExchange>,
}

impl Conversation {
    pub fn new(transport: Arc<dyn ChatTransport>, model: ModelIdentity) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            model,
            config: ConversationConfig::default(),
            transport,
            store: None,
            history: Arc::new(RwLock::new(Vec::new())),
            active: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_config(mut self, config: ConversationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn ExchangeStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_history(mut self, messages: Vec<ChatMessage>) -> Self {
        self.history = Arc::new(RwLock::new(messages));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn model(&self) -> &ModelIdentity {
        &self.model
    }

    pub async fn history(&self) -> Vec<ChatMessage> {
        self.history.read().await.clone()
    }

    /// Replace the in-memory history with the stored transcript.
    pub async fn restore(&self) -> Result<usize, StoreError> {
        let Some(store) = &self.store else {
            return Ok(0);
        };
        let messages = store.load(&self.id).await?;
        let count = messages.len();
        *self.history.write().await = messages;
        log::info!("[{}] Restored {} messages", self.id, count);
        Ok(count)
    }

    /// True while an exchange has not yet reached a terminal state.
    pub fn is_busy(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.settled.load(Ordering::Acquire))
    }

    /// `InFlight` while an exchange runs, otherwise `Idle`. Building happens
    /// inside [`submit`](Self::submit) and terminal states belong to the
    /// exchange's outcome, so neither is observable here.
    pub fn state(&self) -> ExchangeState {
        if self.is_busy() {
            ExchangeState::InFlight
        } else {
            ExchangeState::Idle
        }
    }

    /// Start an exchange for `text` plus image `attachments`.
    ///
    /// Rejected without side effects when an exchange is still in flight or
    /// when there is nothing to send.
    pub async fn submit(
        &mut self,
        text: &str,
        attachments: &[String],
    ) -> Result<ExchangeHandle, SubmitRejected> {
        if text.trim().is_empty() && attachments.is_empty() {
            return Err(SubmitRejected::EmptyInput);
        }
        if self.is_busy() {
            log::debug!("[{}] Submission rejected: exchange in flight", self.id);
            return Err(SubmitRejected::Busy);
        }
        // A settled task only has its terminal send left; let it finish detached.
        self.active = None;

        let user_message = ChatMessage::user_with_attachments(text, attachments);
        let sealed = self.history.read().await.clone();
        let prepared = prepare_exchange(&self.id, &sealed, user_message, &self.model, &self.config);
        if prepared.history.truncated {
            log::info!(
                "[{}] History trimmed for dispatch: {} messages dropped",
                self.id,
                prepared.history.dropped
            );
        }

        let exchange_id = Uuid::new_v4().to_string();
        let cancel_token = CancellationToken::new();
        let settled = Arc::new(AtomicBool::new(false));
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let regulator = self
            .config
            .flow
            .regulates(&self.model.id)
            .then(|| FlowRegulator::from_config(&self.config.flow));
        let mut exchange = Exchange::new(
            exchange_id.clone(),
            prepared.user_message,
            cancel_token.clone(),
            event_tx,
        )
        .with_regulator(regulator)
        .with_fallback(FallbackDetector::from_config(&self.config.fallback));

        let transport = Arc::clone(&self.transport);
        let history = Arc::clone(&self.history);
        let store = self.store.clone();
        let conversation_id = self.id.clone();
        let payload = prepared.payload;
        let task_settled = Arc::clone(&settled);

        let task = tokio::spawn(async move {
            let outcome = exchange.drive(transport.as_ref(), &payload).await;
            seal(&history, store.as_deref(), &conversation_id, &outcome).await;
            task_settled.store(true, Ordering::Release);
            exchange.announce(&outcome).await;
            outcome
        });

        self.active = Some(ActiveExchange {
            id: exchange_id.clone(),
            cancel_token,
            settled,
            task,
        });

        Ok(ExchangeHandle {
            exchange_id,
            events: event_rx,
        })
    }

    /// Request cancellation of the in-flight exchange. Returns immediately;
    /// the exchange drains its paced text and ends as `aborted`.
    pub fn stop(&self) -> bool {
        match &self.active {
            Some(active) if !active.settled.load(Ordering::Acquire) => {
                log::info!("[{}] Stop requested for exchange {}", self.id, active.id);
                active.cancel_token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Wait for the current exchange (if any) to finish.
    pub async fn wait(&mut self) -> Option<ExchangeOutcome> {
        let active = self.active.take()?;
        match active.task.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                log::error!("[{}] Exchange task {} failed: {}", self.id, active.id, e);
                None
            }
        }
    }

    /// Change the target model. An in-flight exchange is aborted first and
    /// its outcome returned.
    pub async fn switch_model(&mut self, model: ModelIdentity) -> Option<ExchangeOutcome> {
        let interrupted = if self.is_busy() {
            self.stop();
            self.wait().await
        } else {
            None
        };
        log::info!("[{}] Model switched {} -> {}", self.id, self.model.id, model.id);
        self.model = model;
        interrupted
    }
}

async fn seal(
    history: &RwLock<Vec<ChatMessage>>,
    store: Option<&dyn ExchangeStore>,
    conversation_id: &str,
    outcome: &ExchangeOutcome,
) {
    let messages = outcome.sealed_messages();
    history.write().await.extend(messages.iter().cloned());

    if let Some(store) = store {
        if let Err(e) = store.append(conversation_id, &messages).await {
            log::warn!(
                "[{}] Failed to persist exchange {}: {}",
                conversation_id,
                outcome.exchange_id,
                e
            );
        }
    }
}
