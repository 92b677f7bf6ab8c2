use crate::adapters::inbound::FrameReader;
use crate::adapters::outbound::{write_matrix, write_string_list};
use crate::common::IntMatrix;
use crate::config::ProtocolConfig;
use crate::domains::logger::DynLogger;
use crate::domains::operations::Agent;
use crate::domains::scene::{ItemPose, Layout, Pose, Vec3};
use crate::domains::session::{AssignmentSequence, Identifiers, SessionParameters};
use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// What the planner sends: session settings plus one layout and one
/// assignment per iteration. Short lists repeat their last entry.
#[derive(Debug, Clone)]
pub struct PlannerScript {
    pub parameters: SessionParameters,
    pub identifiers: Identifiers,
    pub layouts: Vec<Layout>,
    pub assignments: Vec<AssignmentSequence>,
}

impl PlannerScript {
    /// Random layouts in front of the robot and random task splits,
    /// reproducible from `seed`.
    pub fn random(parameters: SessionParameters, identifiers: Identifiers, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let rounds = parameters.iteration_count().max(1);
        let layouts = (0..rounds)
            .map(|_| Layout {
                items: (1..=parameters.item_count)
                    .map(|index| ItemPose {
                        index,
                        pose: Pose::new(
                            Vec3::new(rng.gen_range(300.0..700.0), rng.gen_range(-300.0..300.0), 0.0),
                            Vec3::new(0.0, 0.0, rng.gen_range(-PI..PI)),
                        ),
                    })
                    .collect(),
            })
            .collect();
        let assignments = (0..rounds)
            .map(|_| {
                AssignmentSequence::new(
                    (0..parameters.task_count)
                        .map(|_| if rng.gen_bool(0.5) { Agent::Human } else { Agent::Robot })
                        .collect(),
                )
            })
            .collect();
        Self {
            parameters,
            identifiers,
            layouts,
            assignments,
        }
    }

    fn layout(&self, iteration: usize) -> Option<&Layout> {
        self.layouts
            .get(iteration - 1)
            .or_else(|| self.layouts.last())
    }

    fn assignment(&self, iteration: usize) -> Option<&AssignmentSequence> {
        self.assignments
            .get(iteration - 1)
            .or_else(|| self.assignments.last())
    }
}

/// Longest operation first, each starting when the previous one ends.
/// Offsets stay in the fixed-point units of `durations`.
pub fn back_to_back(durations: &[i32]) -> (Vec<usize>, Vec<i32>) {
    let mut order: Vec<usize> = (0..durations.len()).collect();
    order.sort_by(|a, b| durations[*b].cmp(&durations[*a]));
    let mut offsets = Vec::with_capacity(order.len());
    let mut start = 0i32;
    for &index in &order {
        offsets.push(start);
        start = start.saturating_add(durations[index]);
    }
    (order, offsets)
}

/// One iteration as seen from the planner side.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedIteration {
    pub iteration: usize,
    pub durations: Vec<i32>,
    pub order: Vec<usize>,
    pub offsets: Vec<i32>,
}

/// Reference planner client. It speaks the planner side of the protocol and
/// schedules naively; it exists to drive the service end to end.
pub struct PlannerStub {
    protocol: ProtocolConfig,
    logger: DynLogger,
}

impl PlannerStub {
    pub fn new(protocol: ProtocolConfig, logger: DynLogger) -> Self {
        Self { protocol, logger }
    }

    pub async fn run<S>(&self, stream: S, script: &PlannerScript) -> Result<Vec<PlannedIteration>>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let (read_half, mut write_half) = tokio::io::split(stream);
        let mut reader = FrameReader::new(read_half, &self.protocol, CancellationToken::new());
        let framing = self.protocol.outbound_framing;
        let params = &script.parameters;

        write_matrix(&mut write_half, &params.to_matrix()).await?;
        write_string_list(&mut write_half, &script.identifiers.to_tokens()).await?;

        let mut planned = Vec::with_capacity(params.iteration_count());
        for iteration in 1..=params.iteration_count() {
            let (Some(layout), Some(assignment)) =
                (script.layout(iteration), script.assignment(iteration))
            else {
                bail!("script has no layout or assignment for iteration {}", iteration);
            };
            write_matrix(&mut write_half, &layout.to_matrix(params)?).await?;
            write_matrix(&mut write_half, &assignment.to_matrix()).await?;

            let durations = reader.receive_int_list("durations", framing).await?;
            if durations.len() != params.task_count {
                bail!(
                    "expected {} durations, received {}",
                    params.task_count,
                    durations.len()
                );
            }

            let (order, offsets) = back_to_back(&durations);
            let order_row = order.iter().map(|&i| i as i32).collect();
            write_matrix(&mut write_half, &IntMatrix::row_vector(order_row)).await?;
            write_matrix(&mut write_half, &IntMatrix::row_vector(offsets.clone())).await?;

            let ack = reader.receive_int_list("acknowledgment", framing).await?;
            if ack != [iteration as i32] {
                bail!("iteration {} acknowledged as {:?}", iteration, ack);
            }
            self.logger.info(&format!(
                "Planner: iteration {} durations {:?}, order {:?}",
                iteration, durations, order
            ));
            planned.push(PlannedIteration {
                iteration,
                durations,
                order,
                offsets,
            });
        }

        write_half.shutdown().await?;
        Ok(planned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(simulation_count: i32) -> SessionParameters {
        SessionParameters {
            simulation_count,
            decimal_precision: 2,
            fixed_point_multiplier: 100,
            task_count: 3,
            item_count: 3,
            coordinates_per_item: 6,
        }
    }

    fn ids() -> Identifiers {
        let tokens: Vec<String> = ["c", "H", "R", "t", "f", "Jack", "UR5e", "p"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Identifiers::from_tokens(&tokens).unwrap()
    }

    #[test]
    fn longest_first_without_gaps() {
        let (order, offsets) = back_to_back(&[120, 300, 50]);
        assert_eq!(order, vec![1, 0, 2]);
        assert_eq!(offsets, vec![0, 300, 420]);
    }

    #[test]
    fn equal_durations_keep_task_order() {
        let (order, _) = back_to_back(&[10, 10, 10]);
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn random_script_is_reproducible() {
        let a = PlannerScript::random(params(4), ids(), 7);
        let b = PlannerScript::random(params(4), ids(), 7);
        assert_eq!(a.layouts, b.layouts);
        assert_eq!(a.assignments, b.assignments);
        assert_eq!(a.layouts.len(), 3);
        assert_eq!(a.layouts[0].items.len(), 3);
    }

    #[test]
    fn short_script_repeats_last_entry() {
        let mut script = PlannerScript::random(params(4), ids(), 1);
        script.layouts.truncate(1);
        assert_eq!(script.layout(3), script.layouts.first());
    }
}
