use crate::common::{FixedPoint, IntMatrix, SessionError, SessionResult};
use crate::domains::operations::types::{Agent, Operation};
use crate::domains::scene::ports::{CompositeHandle, OperationHandle, SimulationBackend};
use crate::domains::session::params::expect_shape;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Assembly order plus raw start offsets, as received from the planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyPlan {
    /// Position `i` names the operation (0-based, task order) placed at `offsets[i]`.
    pub order: Vec<usize>,
    pub offsets: Vec<i32>,
}

impl AssemblyPlan {
    pub fn from_matrices(
        order: &IntMatrix,
        schedule: &IntMatrix,
        task_count: usize,
    ) -> SessionResult<Self> {
        expect_shape(order, "assembly order", 1, task_count)?;
        expect_shape(schedule, "schedule", 1, task_count)?;
        Self::new(
            order
                .as_slice()
                .iter()
                .map(|&i| {
                    usize::try_from(i).map_err(|_| {
                        SessionError::InvalidAssemblyOrder(format!("negative index {}", i))
                    })
                })
                .collect::<SessionResult<Vec<_>>>()?,
            schedule.as_slice().to_vec(),
            task_count,
        )
    }

    /// Rejects out-of-range or repeated indices and negative offsets.
    pub fn new(order: Vec<usize>, offsets: Vec<i32>, task_count: usize) -> SessionResult<Self> {
        if order.len() != offsets.len() {
            return Err(SessionError::InvalidAssemblyOrder(format!(
                "{} positions but {} offsets",
                order.len(),
                offsets.len()
            )));
        }
        let mut seen = HashSet::new();
        for &index in &order {
            if index >= task_count {
                return Err(SessionError::InvalidAssemblyOrder(format!(
                    "index {} out of range for {} operations",
                    index, task_count
                )));
            }
            if !seen.insert(index) {
                return Err(SessionError::InvalidAssemblyOrder(format!(
                    "operation {} placed twice",
                    index
                )));
            }
        }
        if let Some((position, &value)) = offsets.iter().enumerate().find(|(_, v)| **v < 0) {
            return Err(SessionError::NegativeOffset { position, value });
        }
        Ok(Self { order, offsets })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledOperation {
    pub name: String,
    pub task_index: usize,
    pub agent: Agent,
    pub handle: OperationHandle,
    pub start_seconds: f64,
    pub duration_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub name: String,
    pub agent: Agent,
    pub start: f64,
    pub duration: f64,
}

impl Interval {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Touching intervals do not overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

/// One iteration's Gantt container.
///
/// Non-overlap is not enforced; `intervals` exposes the placement so a
/// checker can inspect it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeSchedule {
    pub name: String,
    pub handle: CompositeHandle,
    pub entries: Vec<ScheduledOperation>,
}

impl CompositeSchedule {
    /// Ordered by start time; ties keep assembly order.
    pub fn intervals(&self) -> Vec<Interval> {
        let mut intervals: Vec<Interval> = self
            .entries
            .iter()
            .map(|e| Interval {
                name: e.name.clone(),
                agent: e.agent,
                start: e.start_seconds,
                duration: e.duration_seconds.unwrap_or(0.0),
            })
            .collect();
        intervals.sort_by_key(|i| OrderedFloat(i.start));
        intervals
    }

    /// Pairs of the same agent whose intervals overlap.
    pub fn same_agent_overlaps(&self) -> Vec<(String, String)> {
        let intervals = self.intervals();
        let mut pairs = Vec::new();
        for (i, a) in intervals.iter().enumerate() {
            for b in &intervals[i + 1..] {
                if a.agent == b.agent && a.overlaps(b) {
                    pairs.push((a.name.clone(), b.name.clone()));
                }
            }
        }
        pairs
    }

    pub fn makespan(&self) -> f64 {
        self.intervals()
            .iter()
            .map(|i| OrderedFloat(i.end()))
            .max()
            .map(|m| m.0)
            .unwrap_or(0.0)
    }
}

pub struct TimelineAssembler {
    fixed_point: FixedPoint,
    composite_prefix: String,
}

impl TimelineAssembler {
    pub fn new(fixed_point: FixedPoint, composite_prefix: impl Into<String>) -> Self {
        Self {
            fixed_point,
            composite_prefix: composite_prefix.into(),
        }
    }

    /// Creates a fresh composite and places `operations[order[i]]` at `offsets[i] / multiplier`.
    pub async fn assemble(
        &self,
        backend: &mut dyn SimulationBackend,
        iteration: usize,
        operations: &[Operation],
        plan: &AssemblyPlan,
    ) -> SessionResult<CompositeSchedule> {
        let name = format!("{}{}", self.composite_prefix, iteration);
        let handle = backend.create_composite_operation(&name).await?;
        let mut entries = Vec::with_capacity(plan.order.len());

        for (&index, &raw) in plan.order.iter().zip(&plan.offsets) {
            let operation = operations.get(index).ok_or_else(|| {
                SessionError::InvalidAssemblyOrder(format!(
                    "index {} out of range for {} operations",
                    index,
                    operations.len()
                ))
            })?;
            let start = self.fixed_point.decode(raw);
            backend.add_child(handle, operation.handle).await?;
            backend
                .set_child_start_time(handle, operation.handle, start)
                .await?;
            tracing::debug!(composite = %name, operation = %operation.name, start, "child placed");
            entries.push(ScheduledOperation {
                name: operation.name.clone(),
                task_index: operation.task_index,
                agent: operation.agent,
                handle: operation.handle,
                start_seconds: start,
                duration_seconds: operation.duration_seconds,
            });
        }

        Ok(CompositeSchedule {
            name,
            handle,
            entries,
        })
    }
}
