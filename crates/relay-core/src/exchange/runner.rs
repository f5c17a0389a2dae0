use chat_core::ChatMessage;
use futures::StreamExt;
use relay_llm::{ChatPayload, ChatTransport, DeltaStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::exchange::events::{ExchangeEvent, ExchangeOutcome};
use crate::exchange::state::ExchangeState;
use crate::flow::FlowRegulator;
use crate::signal::{FallbackDetector, Routed, SearchStatusChannel};

/// One request/response cycle and all of its mutable state.
///
/// The cancellation token is the only way to interrupt it; the regulator and
/// signal state belong to this exchange alone and end with it.
///
/// With pacing on, `search_status`, `search_cleared` and `fallback` events go
/// out as soon as their delta arrives, ahead of the paced text of that delta.
/// Only content is paced.
pub struct Exchange {
    id: String,
    state: ExchangeState,
    user_message: ChatMessage,
    cancel_token: CancellationToken,
    event_tx: mpsc::Sender<ExchangeEvent>,
    regulator: Option<FlowRegulator>,
    search: SearchStatusChannel,
    fallback: FallbackDetector,
    content: String,
    error: Option<String>,
}

impl Exchange {
    pub fn new(
        id: impl Into<String>,
        user_message: ChatMessage,
        cancel_token: CancellationToken,
        event_tx: mpsc::Sender<ExchangeEvent>,
    ) -> Self {
        Self {
            id: id.into(),
            state: ExchangeState::Building,
            user_message,
            cancel_token,
            event_tx,
            regulator: None,
            search: SearchStatusChannel::new(),
            fallback: FallbackDetector::from_config(&chat_core::FallbackConfig::default()),
            content: String::new(),
            error: None,
        }
    }

    /// Pace content through `regulator` instead of emitting it directly.
    pub fn with_regulator(mut self, regulator: Option<FlowRegulator>) -> Self {
        self.regulator = regulator;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackDetector) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// Drive the exchange and emit the terminal event.
    pub async fn run(mut self, transport: &dyn ChatTransport, payload: &ChatPayload) -> ExchangeOutcome {
        let outcome = self.drive(transport, payload).await;
        self.announce(&outcome).await;
        outcome
    }

    /// Drive the exchange to a terminal state without emitting the terminal
    /// event, so the caller can seal the outcome first.
    pub async fn drive(&mut self, transport: &dyn ChatTransport, payload: &ChatPayload) -> ExchangeOutcome {
        self.transition(ExchangeState::InFlight);
        log::info!(
            "[{}] Sending {} messages to model {}",
            self.id,
            payload.messages.len(),
            payload.model
        );

        let cancel_token = self.cancel_token.clone();
        let opened = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => None,
            result = transport.open(payload) => Some(result),
        };

        match opened {
            None => self.abort().await,
            Some(Err(error)) => self.fail(error.to_string()).await,
            Some(Ok(stream)) => self.pump(stream, &cancel_token).await,
        }

        self.outcome()
    }

    /// Emit the terminal event for `outcome`.
    pub async fn announce(&self, outcome: &ExchangeOutcome) {
        self.emit(outcome.terminal_event()).await;
    }

    async fn pump(&mut self, mut stream: DeltaStream, cancel_token: &CancellationToken) {
        loop {
            let regulating = self
                .regulator
                .as_ref()
                .is_some_and(FlowRegulator::is_running);

            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => {
                    self.abort().await;
                    return;
                }
                slice = next_slice(&mut self.regulator), if regulating => {
                    if let Some(content) = slice {
                        self.emit(ExchangeEvent::Delta { content }).await;
                    }
                }
                item = stream.next() => match item {
                    Some(Ok(delta)) => self.on_delta(delta).await,
                    Some(Err(error)) => {
                        self.fail(error.to_string()).await;
                        return;
                    }
                    None => {
                        self.complete().await;
                        return;
                    }
                },
            }
        }
    }

    async fn on_delta(&mut self, delta: String) {
        match self.search.route(delta) {
            Routed::Status(status) => {
                log::debug!("[{}] Search status: {}", self.id, status.state);
                self.emit(ExchangeEvent::SearchStatus { status }).await;
            }
            Routed::Content { text, cleared } => {
                if cleared {
                    self.emit(ExchangeEvent::SearchCleared).await;
                }
                if let Some(notice) = self.fallback.observe(&text) {
                    log::warn!(
                        "[{}] Upstream reported a model fallback; suggesting {}",
                        self.id,
                        notice.suggested_model
                    );
                    self.emit(ExchangeEvent::Fallback {
                        suggested_model: notice.suggested_model,
                        reason: notice.reason,
                    })
                    .await;
                }

                self.content.push_str(&text);
                match self.regulator.as_mut() {
                    Some(regulator) => regulator.push(&text),
                    None => self.emit(ExchangeEvent::Delta { content: text }).await,
                }
            }
        }
    }

    async fn complete(&mut self) {
        self.settle(ExchangeState::Completed).await;
        log::info!("[{}] Exchange completed ({} chars)", self.id, self.content.chars().count());
    }

    async fn abort(&mut self) {
        self.settle(ExchangeState::Aborted).await;
        log::info!(
            "[{}] Exchange aborted ({} chars kept)",
            self.id,
            self.content.chars().count()
        );
    }

    async fn fail(&mut self, message: String) {
        log::warn!("[{}] Exchange failed: {}", self.id, message);
        self.error = Some(message);
        self.settle(ExchangeState::Errored).await;
    }

    /// Flush paced text and close out signal state before a terminal state.
    async fn settle(&mut self, state: ExchangeState) {
        if let Some(rest) = self.regulator.as_mut().and_then(FlowRegulator::drain) {
            self.emit(ExchangeEvent::Delta { content: rest }).await;
        }
        if self.search.clear() {
            self.emit(ExchangeEvent::SearchCleared).await;
        }
        self.transition(state);
    }

    fn transition(&mut self, next: ExchangeState) {
        log::debug!("[{}] {} -> {}", self.id, self.state, next);
        self.state = next;
    }

    fn outcome(&self) -> ExchangeOutcome {
        let assistant_message =
            (!self.content.is_empty()).then(|| ChatMessage::assistant(self.content.clone()));
        ExchangeOutcome {
            exchange_id: self.id.clone(),
            state: self.state,
            user_message: self.user_message.clone(),
            assistant_message,
            content: self.content.clone(),
            error: self.error.clone(),
        }
    }

    /// Send `event`, waiting for channel capacity only until cancellation.
    /// Once cancelled, events that do not fit are dropped; the outcome still
    /// carries the full content.
    async fn emit(&self, event: ExchangeEvent) {
        if !self.cancel_token.is_cancelled() {
            tokio::select! {
                biased;
                permit = self.event_tx.reserve() => {
                    if let Ok(permit) = permit {
                        permit.send(event);
                    }
                    return;
                }
                _ = self.cancel_token.cancelled() => {}
            }
        }

        if let Err(e) = self.event_tx.try_send(event) {
            log::debug!("[{}] Event not delivered after cancellation: {}", self.id, e);
        }
    }
}

async fn next_slice(regulator: &mut Option<FlowRegulator>) -> Option<String> {
    match regulator {
        Some(regulator) => regulator.tick().await,
        None => None,
    }
}
