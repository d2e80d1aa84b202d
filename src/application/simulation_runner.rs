//! SimulationRunner - Drives sessions against the ports.
//!
//! The runner resolves a session's inputs through the catalog ports, starts
//! the [`SimulationSession`] aggregate and hands back a [`SessionHandle`].
//! Each handle owns one session behind a `tokio::sync::Mutex` and runs the
//! async producers around it:
//!
//! - a timer task ticking once per configured interval
//! - option generation, bounded by a timeout and backed by scripted content
//! - the grace-delay completion of threshold terminations
//!
//! Every transition drains the aggregate's events to the broadcast channel
//! and publishes the domain events through the `EventPublisher` port.
//! Finished results go to the `SessionResultSink` on a spawned task.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::EngineConfig;
use crate::domain::catalog::{Persona, PersonaFilter, Stage};
use crate::domain::foundation::{ErrorCode, EventEnvelope, PersonaId, SessionId, SessionStatus};
use crate::domain::simulation::{
    Message, ResponseOption, ScenarioTable, SessionMode, SessionResult, SessionSnapshot,
    SimulationError, SimulationEvent, SimulationSession, StageSequencer, TurnOutcome,
    TurnProgress,
};
use crate::ports::{
    EventPublisher, OptionGenerator, PersonaCatalog, SessionResultSink, StageSource, TrackSource,
};

use super::errors::RunnerError;
use super::stages::resolve_stages;

/// Buffered events per session before slow subscribers start lagging.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Command to start a session.
#[derive(Debug, Clone)]
pub struct StartSession {
    pub persona_id: PersonaId,
    pub track_key: String,
    pub mode: SessionMode,
}

/// Starts and drives simulation sessions.
pub struct SimulationRunner {
    personas: Arc<dyn PersonaCatalog>,
    stages: Arc<dyn StageSource>,
    tracks: Arc<dyn TrackSource>,
    generator: Option<Arc<dyn OptionGenerator>>,
    publisher: Option<Arc<dyn EventPublisher>>,
    sink: Option<Arc<dyn SessionResultSink>>,
    scenarios: &'static ScenarioTable,
    config: EngineConfig,
}

impl SimulationRunner {
    pub fn new(
        personas: Arc<dyn PersonaCatalog>,
        stages: Arc<dyn StageSource>,
        tracks: Arc<dyn TrackSource>,
        config: EngineConfig,
    ) -> Self {
        Self {
            personas,
            stages,
            tracks,
            generator: None,
            publisher: None,
            sink: None,
            scenarios: ScenarioTable::bundled(),
            config,
        }
    }

    /// Uses a generator for response menus. Without one, every menu comes
    /// from the scripted scenario table.
    pub fn with_generator(mut self, generator: Arc<dyn OptionGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn SessionResultSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_scenarios(mut self, scenarios: &'static ScenarioTable) -> Self {
        self.scenarios = scenarios;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Personas available for selection.
    pub async fn personas(&self, filter: &PersonaFilter) -> Result<Vec<Persona>, RunnerError> {
        Ok(self.personas.get_personas(filter).await?)
    }

    /// Resolves persona, track and stages, then starts a session.
    ///
    /// # Errors
    ///
    /// - `Collaborator(PersonaNotFound)` for an unknown persona
    /// - `Simulation(Configuration)` if no stages resolve, or the persona
    ///   does not take outreach on the requested channel
    pub async fn start_session(&self, cmd: StartSession) -> Result<SessionHandle, RunnerError> {
        // 1. Persona
        let persona = self.personas.get_persona(&cmd.persona_id).await?;
        if let SessionMode::ColdOutreach { channel } = cmd.mode {
            if !persona.channel.accepts(channel) {
                return Err(SimulationError::configuration(format!(
                    "persona {} is not reachable by {}",
                    persona.id,
                    channel.key()
                ))
                .into());
            }
        }

        // 2. Track, with configured defaults for unknown keys
        let track = match self.tracks.get_track_config(&cmd.track_key).await {
            Ok(track) => track,
            Err(err) if err.code == ErrorCode::TrackNotFound => {
                tracing::warn!(
                    track_key = %cmd.track_key,
                    "Track not configured, using default rewards"
                );
                self.config.rewards.fallback_track(&cmd.track_key)
            }
            Err(err) => return Err(err.into()),
        };

        // 3. Stages and scripts
        let plan = StageSequencer::plan(cmd.mode, &cmd.track_key);
        let stages = resolve_stages(self.stages.as_ref(), &plan).await?;
        let mut rng = match self.config.session.scenario_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let scripts = self
            .scenarios
            .scripts_for(persona.personality, &stages, &mut rng);

        // 4. Aggregate
        let mut session = SimulationSession::new(cmd.mode, self.config.session_settings());
        session.start(persona, stages, track, scripts)?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (shutdown, _) = watch::channel(false);
        let inner = Arc::new(SessionInner {
            id: session.id(),
            session: Mutex::new(session),
            events,
            shutdown,
            generator: self.generator.clone(),
            publisher: self.publisher.clone(),
            sink: self.sink.clone(),
            config: self.config.clone(),
        });

        {
            let mut session = inner.session.lock().await;
            inner.dispatch(&mut session).await;
        }
        let timer = spawn_timer(Arc::clone(&inner));

        Ok(SessionHandle {
            inner,
            timer: Arc::new(timer),
        })
    }
}

/// Shared state of one running session.
struct SessionInner {
    id: SessionId,
    session: Mutex<SimulationSession>,
    events: broadcast::Sender<SimulationEvent>,
    shutdown: watch::Sender<bool>,
    generator: Option<Arc<dyn OptionGenerator>>,
    publisher: Option<Arc<dyn EventPublisher>>,
    sink: Option<Arc<dyn SessionResultSink>>,
    config: EngineConfig,
}

impl SessionInner {
    /// Fans out pending events. Called with the session lock held so
    /// subscribers see transitions in order.
    async fn dispatch(&self, session: &mut SimulationSession) {
        for event in session.take_events() {
            match event.to_envelope() {
                Ok(Some(envelope)) => self.publish(envelope).await,
                Ok(None) => {}
                Err(e) => tracing::error!(
                    session_id = %self.id,
                    error = %e,
                    "Failed to serialize simulation event"
                ),
            }

            if matches!(event, SimulationEvent::SessionEnded(_)) {
                if let Some(result) = session.result().cloned() {
                    self.persist(result);
                }
            }

            // No receivers is fine; presentation is optional.
            let _ = self.events.send(event);
        }
    }

    async fn publish(&self, envelope: EventEnvelope) {
        let Some(publisher) = &self.publisher else {
            return;
        };
        let event_type = envelope.event_type.clone();
        if let Err(e) = publisher.publish(envelope).await {
            tracing::warn!(
                session_id = %self.id,
                event_type = %event_type,
                error = %e,
                "Failed to publish simulation event"
            );
        }
    }

    fn persist(&self, result: SessionResult) {
        let Some(sink) = self.sink.clone() else {
            return;
        };
        let session_id = self.id;
        tokio::spawn(async move {
            if let Err(e) = sink.persist(result).await {
                tracing::warn!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to persist session result"
                );
            }
        });
    }

    /// One timer tick. Returns false once the timer should stop.
    async fn tick(&self) -> bool {
        let mut session = self.session.lock().await;
        let keep_running = match session.tick() {
            Ok(outcome) => !outcome.ended,
            Err(e) => {
                tracing::debug!(session_id = %self.id, error = %e, "Timer stopped");
                false
            }
        };
        self.dispatch(&mut session).await;
        keep_running
    }

    /// Completes a threshold termination after the grace delay.
    async fn complete_after_grace(self: Arc<Self>) {
        time::sleep(self.config.session.grace_delay()).await;

        let mut session = self.session.lock().await;
        if let Err(e) = session.complete_scheduled_termination().map(|_| ()) {
            tracing::debug!(
                session_id = %self.id,
                error = %e,
                "Scheduled termination lost the race"
            );
        }
        self.dispatch(&mut session).await;
    }
}

/// Timer task: ticks until the session leaves `playing` or the handle stops it.
fn spawn_timer(inner: Arc<SessionInner>) -> JoinHandle<()> {
    // Subscribe before spawning so an immediate stop is not missed.
    let mut shutdown = inner.shutdown.subscribe();
    tokio::spawn(async move {
        let period = inner.config.timer.tick_interval().max(time::Duration::from_millis(1));
        let mut interval = time::interval(period);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::debug!(session_id = %inner.id, "Timer shut down");
                        break;
                    }
                }

                _ = interval.tick() => {
                    if !inner.tick().await {
                        break;
                    }
                }
            }
        }
    })
}

/// Handle to a running session.
///
/// Cheap to clone; all clones drive the same session. Only one
/// [`request_options`](Self::request_options) runs per turn; an overlapping
/// call fails with `InvalidState`.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionInner>,
    timer: Arc<JoinHandle<()>>,
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.inner.id
    }

    /// Subscribes to the session's events from now on.
    ///
    /// Events emitted before subscribing (including `SessionStarted`) are
    /// reflected in [`snapshot`](Self::snapshot).
    pub fn subscribe(&self) -> broadcast::Receiver<SimulationEvent> {
        self.inner.events.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.session.lock().await.snapshot()
    }

    pub async fn status(&self) -> SessionStatus {
        self.inner.session.lock().await.status()
    }

    pub async fn result(&self) -> Option<SessionResult> {
        self.inner.session.lock().await.result().cloned()
    }

    /// Produces the menu for the current turn.
    ///
    /// The generator runs without the session lock, so the timer keeps
    /// ticking and may end the session meanwhile; that case yields an empty
    /// menu. When generation fails, times out or returns nothing usable, the
    /// scripted options of the current exchange are used, then those of the
    /// next exchange, and finally the stage is skipped and the next stage is
    /// tried the same way. An empty menu means the session has ended.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the session is not accepting turns (not playing, a
    /// termination is pending, or options are already being generated).
    /// Nothing is mutated.
    pub async fn request_options(&self) -> Result<Vec<ResponseOption>, RunnerError> {
        loop {
            let request = {
                let mut session = self.inner.session.lock().await;
                session.begin_generation()?;
                let request = GenerationRequest::capture(&session);
                self.inner.dispatch(&mut session).await;
                request
            };

            let generated = match request {
                Some(request) => self.run_generation(request).await,
                None => None,
            };

            let mut session = self.inner.session.lock().await;
            if !session.status().is_playing() {
                session.abandon_generation();
                tracing::debug!(
                    session_id = %self.inner.id,
                    "Session ended while options were generating"
                );
                return Ok(Vec::new());
            }

            let mut count = 0;
            if let Some(options) = generated {
                count = session.present_options(options, false)?;
            }
            if count == 0 {
                let scripted = session.scripted_options();
                count = session.present_options(scripted, true)?;
            }
            if count == 0 && session.advance_exchange()? {
                tracing::info!(
                    session_id = %self.inner.id,
                    "No options for this exchange, retrying with the next one"
                );
                let scripted = session.scripted_options();
                count = session.present_options(scripted, true)?;
            }

            if count > 0 {
                let options = session.state().options.clone();
                self.inner.dispatch(&mut session).await;
                return Ok(options);
            }

            let ended = session.skip_stage()?;
            self.inner.dispatch(&mut session).await;
            if ended {
                return Ok(Vec::new());
            }
        }
    }

    /// Submits the option at `index` of the current menu.
    ///
    /// A threshold crossing schedules the end of the session after the
    /// configured grace delay.
    ///
    /// # Errors
    ///
    /// `InvalidState` when not playing, while options are generating, while
    /// a termination is pending, or for an index outside the menu.
    pub async fn submit(&self, index: usize) -> Result<TurnOutcome, RunnerError> {
        let mut session = self.inner.session.lock().await;
        let outcome = session.submit_choice(index)?;
        self.inner.dispatch(&mut session).await;

        if let TurnProgress::TerminationScheduled(_) = outcome.progress {
            tokio::spawn(Arc::clone(&self.inner).complete_after_grace());
        }
        Ok(outcome)
    }

    /// Ends the session because the player left, then stops the timer.
    ///
    /// The session is discarded: no result is produced or persisted, and
    /// later turns fail with `InvalidState`. Returns false if the session
    /// had already ended.
    pub async fn stop(&self) -> bool {
        let exited = {
            let mut session = self.inner.session.lock().await;
            let exited = session.exit();
            self.inner.dispatch(&mut session).await;
            exited
        };
        let _ = self.inner.shutdown.send(true);
        exited
    }

    /// True once the timer task has exited.
    pub fn timer_finished(&self) -> bool {
        self.timer.is_finished()
    }

    async fn run_generation(&self, request: GenerationRequest) -> Option<Vec<ResponseOption>> {
        let generator = self
            .inner
            .generator
            .as_ref()
            .filter(|_| self.inner.config.generation.enabled)?;
        let timeout = self.inner.config.generation.timeout();

        let call = generator.generate_response_options(
            &request.persona,
            &request.stage,
            &request.history,
        );
        match time::timeout(timeout, call).await {
            Ok(Ok(options)) => Some(options),
            Ok(Err(e)) => {
                tracing::warn!(
                    session_id = %self.inner.id,
                    generator = generator.name(),
                    kind = e.kind(),
                    error = %e,
                    "Option generation failed, using scripted options"
                );
                None
            }
            Err(_) => {
                tracing::warn!(
                    session_id = %self.inner.id,
                    generator = generator.name(),
                    timeout_ms = timeout.as_millis() as u64,
                    "Option generation timed out, using scripted options"
                );
                None
            }
        }
    }
}

/// Inputs for one generation call, copied out so the lock can be released.
struct GenerationRequest {
    persona: Persona,
    stage: Stage,
    history: Vec<Message>,
}

impl GenerationRequest {
    fn capture(session: &SimulationSession) -> Option<Self> {
        Some(Self {
            persona: session.persona()?.clone(),
            stage: session.current_stage()?.clone(),
            history: session.state().messages.clone(),
        })
    }
}
