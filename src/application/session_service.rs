use crate::adapters::inbound::FrameReader;
use crate::adapters::outbound::FrameWriter;
use crate::common::SessionResult;
use crate::config::Config;
use crate::domains::logger::DynLogger;
use crate::domains::operations::{Agent, DurationMeasurer, OperationSynthesizer};
use crate::domains::scene::{apply_layout, Layout, SimulationBackend};
use crate::domains::session::{
    AssignmentSequence, Identifiers, SessionParameters, SessionPhase, SessionState,
};
use crate::domains::timeline::{AssemblyPlan, CompositeSchedule, TimelineAssembler};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDuration {
    pub task_index: usize,
    pub agent: Agent,
    pub operation: String,
    pub seconds: f64,
    pub encoded: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationReport {
    pub iteration: usize,
    pub layout: Layout,
    pub durations: Vec<TaskDuration>,
    pub schedule: CompositeSchedule,
    pub same_agent_overlaps: Vec<(String, String)>,
    pub makespan_seconds: f64,
}

/// What a completed session did, iteration by iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub parameters: Option<SessionParameters>,
    pub identifiers: Option<Identifiers>,
    pub iterations: Vec<IterationReport>,
}

impl SessionReport {
    fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            started_at: Utc::now(),
            finished_at: None,
            parameters: None,
            identifiers: None,
            iterations: Vec::new(),
        }
    }

    pub async fn write_json<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}

type Reader<S> = FrameReader<ReadHalf<S>>;
type Writer<S> = FrameWriter<WriteHalf<S>>;

/// Cached per-session values used by every iteration.
struct SessionContext {
    params: SessionParameters,
    ids: Identifiers,
    measurer: DurationMeasurer,
    assembler: TimelineAssembler,
}

/// Serves one planner session against a simulation backend.
///
/// Strictly request/response: each frame is fully handled, backend work
/// included, before the next one is read. Any failure ends the session.
pub struct SessionService<B: SimulationBackend> {
    config: Config,
    logger: DynLogger,
    backend: B,
    synthesizer: OperationSynthesizer,
}

impl<B: SimulationBackend> SessionService<B> {
    pub fn new(config: Config, logger: DynLogger, backend: B) -> Self {
        let synthesizer =
            OperationSynthesizer::new(config.human.clone(), config.robot.clone());
        Self {
            config,
            logger,
            backend,
            synthesizer,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Runs the whole exchange on `stream` and shuts its write side down on
    /// the way out, whether the session completed or failed.
    pub async fn run<S>(&mut self, stream: S, cancel: CancellationToken) -> SessionResult<SessionReport>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let session_id = Uuid::new_v4();
        let span = tracing::info_span!("session", id = %session_id);
        self.serve(session_id, stream, cancel).instrument(span).await
    }

    async fn serve<S>(
        &mut self,
        session_id: Uuid,
        stream: S,
        cancel: CancellationToken,
    ) -> SessionResult<SessionReport>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        let mut reader = FrameReader::new(read_half, &self.config.protocol, cancel);
        let mut writer = FrameWriter::new(write_half, self.config.protocol.outbound_framing);
        let mut report = SessionReport::new(session_id);
        let mut state = SessionState::new();

        self.logger.info(&format!("Session {} started", session_id));
        let outcome = self
            .exchange(&mut state, &mut reader, &mut writer, &mut report)
            .await;
        if let Err(e) = writer.shutdown().await {
            tracing::debug!(error = %e, "stream already closed");
        }

        match outcome {
            Ok(()) => {
                report.finished_at = Some(Utc::now());
                self.logger.info(&format!(
                    "Session {} closed after {} iterations",
                    session_id,
                    report.iterations.len()
                ));
                Ok(report)
            }
            Err(e) => {
                tracing::error!(phase = %state.phase(), iteration = state.iteration(), error = %e, "session aborted");
                self.logger.error(&format!(
                    "Session {} aborted in {} (iteration {}): {}",
                    session_id,
                    state.phase(),
                    state.iteration(),
                    e
                ));
                Err(e)
            }
        }
    }

    async fn exchange<S>(
        &mut self,
        state: &mut SessionState,
        reader: &mut Reader<S>,
        writer: &mut Writer<S>,
        report: &mut SessionReport,
    ) -> SessionResult<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        state.advance();
        let params = SessionParameters::from_matrix(&reader.receive_matrix("parameters").await?)?;
        state.advance();
        let ids = Identifiers::from_tokens(&reader.receive_string_list("identifiers").await?)?;
        state.set_total_iterations(params.iteration_count());

        tracing::info!(
            iterations = params.iteration_count(),
            tasks = params.task_count,
            items = params.item_count,
            "session parameters received"
        );
        report.parameters = Some(params.clone());
        report.identifiers = Some(ids.clone());

        let fixed_point = params.fixed_point();
        let context = SessionContext {
            measurer: DurationMeasurer::new(fixed_point),
            assembler: TimelineAssembler::new(fixed_point, &self.config.timeline.composite_prefix),
            params,
            ids,
        };

        while state.advance() == SessionPhase::ReceiveLayout {
            let record = self.iteration(state, &context, reader, writer).await?;
            report.iterations.push(record);
        }
        Ok(())
    }

    async fn iteration<S>(
        &mut self,
        state: &mut SessionState,
        context: &SessionContext,
        reader: &mut Reader<S>,
        writer: &mut Writer<S>,
    ) -> SessionResult<IterationReport>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let iteration = state.iteration();
        let SessionContext {
            params,
            ids,
            measurer,
            assembler,
        } = context;
        self.logger.info(&format!(
            "Iteration {}/{} started",
            iteration,
            state.total_iterations()
        ));

        let layout = Layout::from_matrix(&reader.receive_matrix("layout").await?, params)?;
        state.advance();
        apply_layout(&mut self.backend, &layout, ids).await?;

        state.advance();
        let assignment =
            AssignmentSequence::from_matrix(&reader.receive_matrix("assignment").await?, params.task_count)?;

        state.advance();
        let mut operations = Vec::with_capacity(assignment.len());
        let mut durations = Vec::with_capacity(assignment.len());
        for (task_index, agent) in assignment.tasks() {
            let mut operation = self
                .synthesizer
                .synthesize(&mut self.backend, agent, task_index, ids)
                .await?;
            let measurement = measurer.measure(&mut self.backend, &mut operation).await?;
            self.logger.info(&format!(
                "Iteration {}: task {} by {} ({}) takes {:.3}s",
                iteration, task_index, agent, operation.name, measurement.seconds
            ));
            durations.push(TaskDuration {
                task_index,
                agent,
                operation: operation.name.clone(),
                seconds: measurement.seconds,
                encoded: measurement.encoded,
            });
            operations.push(operation);
        }

        state.advance();
        let encoded: Vec<i32> = durations.iter().map(|d| d.encoded).collect();
        writer.send_durations(&encoded).await?;

        state.advance();
        let order = reader.receive_matrix("assembly order").await?;
        state.advance();
        let schedule = reader.receive_matrix("schedule").await?;
        let plan = AssemblyPlan::from_matrices(&order, &schedule, operations.len())?;

        state.advance();
        let composite = assembler
            .assemble(&mut self.backend, iteration, &operations, &plan)
            .await?;
        let overlaps = composite.same_agent_overlaps();
        for (first, second) in &overlaps {
            self.logger.warn(&format!(
                "Iteration {}: {} and {} overlap on the same agent",
                iteration, first, second
            ));
        }
        let makespan = composite.makespan();

        state.advance();
        writer.send_ack(iteration as u32).await?;
        self.logger.info(&format!(
            "Iteration {} assembled as {} (makespan {:.3}s)",
            iteration, composite.name, makespan
        ));

        Ok(IterationReport {
            iteration,
            layout,
            durations,
            schedule: composite,
            same_agent_overlaps: overlaps,
            makespan_seconds: makespan,
        })
    }
}
