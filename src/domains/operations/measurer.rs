use super::types::{Agent, Operation};
use crate::common::{BackendError, BackendResult, FixedPoint};
use crate::domains::scene::ports::{OperationHandle, SimulationBackend};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub seconds: f64,
    /// `round(seconds, precision) * multiplier`, as sent to the planner.
    pub encoded: i32,
}

/// Obtains the duration of a synthesized operation.
///
/// Human task graphs are timed analytically by the backend at synthesis time.
/// Robot trajectories only have a duration once played, so they are run
/// silently and the clock is rewound afterwards.
pub struct DurationMeasurer {
    fixed_point: FixedPoint,
}

impl DurationMeasurer {
    pub fn new(fixed_point: FixedPoint) -> Self {
        Self { fixed_point }
    }

    pub async fn measure(
        &self,
        backend: &mut dyn SimulationBackend,
        operation: &mut Operation,
    ) -> BackendResult<Measurement> {
        let seconds = match operation.agent {
            Agent::Human => backend.get_duration(operation.handle).await,
            Agent::Robot => measure_by_playback(backend, operation.handle).await,
        }
        .map_err(|e| as_measurement_error(&operation.name, e))?;

        if !seconds.is_finite() || seconds < 0.0 {
            return Err(BackendError::Measurement {
                operation: operation.name.clone(),
                reason: format!("invalid duration {}", seconds),
            });
        }

        let encoded = self
            .fixed_point
            .encode(seconds)
            .map_err(|e| BackendError::Measurement {
                operation: operation.name.clone(),
                reason: e.to_string(),
            })?;
        operation.duration_seconds = Some(seconds);
        Ok(Measurement { seconds, encoded })
    }
}

/// Rewinds even when playback or the duration read fails.
async fn measure_by_playback(
    backend: &mut dyn SimulationBackend,
    operation: OperationHandle,
) -> BackendResult<f64> {
    backend.set_current_operation(operation).await?;
    let duration = match backend.play_silently().await {
        Ok(()) => backend.get_duration(operation).await,
        Err(e) => Err(e),
    };
    let rewound = backend.rewind().await;
    let seconds = duration?;
    rewound?;
    Ok(seconds)
}

fn as_measurement_error(operation: &str, err: BackendError) -> BackendError {
    match err {
        BackendError::Measurement { .. } => err,
        other => BackendError::Measurement {
            operation: operation.to_string(),
            reason: other.to_string(),
        },
    }
}
