use crate::common::{FixedPoint, IntMatrix, SessionError, SessionResult, MAX_DECIMAL_PRECISION};
use crate::domains::operations::types::Agent;
use serde::{Deserialize, Serialize};

/// Columns of the parameters frame.
pub const PARAMETER_COUNT: usize = 6;
/// Tokens of the identifier frame.
pub const IDENTIFIER_COUNT: usize = 8;
/// Position (3) plus RPY rotation (3).
pub const COORDINATES_PER_POSE: usize = 6;

/// The planner's `simulationCount` is one larger than the number of rounds
/// actually played. Kept exactly as the planner sends it.
pub const SIMULATION_COUNT_OFFSET: i32 = 1;

pub fn expect_shape(
    matrix: &IntMatrix,
    frame: &str,
    rows: usize,
    cols: usize,
) -> SessionResult<()> {
    if matrix.shape() != (rows, cols) {
        return Err(SessionError::ShapeMismatch {
            frame: frame.to_string(),
            expected: format!("{}x{}", rows, cols),
            actual: format!("{}x{}", matrix.rows(), matrix.cols()),
        });
    }
    Ok(())
}

/// Integer settings received once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionParameters {
    pub simulation_count: i32,
    pub decimal_precision: u32,
    pub fixed_point_multiplier: i32,
    pub task_count: usize,
    pub item_count: usize,
    pub coordinates_per_item: usize,
}

impl SessionParameters {
    pub fn from_matrix(matrix: &IntMatrix) -> SessionResult<Self> {
        expect_shape(matrix, "parameters", 1, PARAMETER_COUNT)?;
        let v = matrix.as_slice();

        let non_negative = |idx: usize, what: &str| -> SessionResult<usize> {
            usize::try_from(v[idx]).map_err(|_| SessionError::ShapeMismatch {
                frame: "parameters".to_string(),
                expected: format!("non-negative {}", what),
                actual: v[idx].to_string(),
            })
        };

        let decimal_precision = non_negative(1, "decimal precision")? as u32;
        let task_count = non_negative(3, "task count")?;
        let item_count = non_negative(4, "item count")?;
        let coordinates_per_item = non_negative(5, "coordinates per item")?;

        if decimal_precision > MAX_DECIMAL_PRECISION {
            return Err(SessionError::ShapeMismatch {
                frame: "parameters".to_string(),
                expected: format!("decimal precision at most {}", MAX_DECIMAL_PRECISION),
                actual: decimal_precision.to_string(),
            });
        }
        // An empty duration list would put nothing on the wire.
        if task_count == 0 {
            return Err(SessionError::ShapeMismatch {
                frame: "parameters".to_string(),
                expected: "at least one task".to_string(),
                actual: "0".to_string(),
            });
        }
        if v[2] <= 0 {
            return Err(SessionError::ShapeMismatch {
                frame: "parameters".to_string(),
                expected: "positive fixed-point multiplier".to_string(),
                actual: v[2].to_string(),
            });
        }
        if coordinates_per_item != COORDINATES_PER_POSE {
            return Err(SessionError::ShapeMismatch {
                frame: "parameters".to_string(),
                expected: format!("{} coordinates per item", COORDINATES_PER_POSE),
                actual: coordinates_per_item.to_string(),
            });
        }

        Ok(Self {
            simulation_count: v[0],
            decimal_precision,
            fixed_point_multiplier: v[2],
            task_count,
            item_count,
            coordinates_per_item,
        })
    }

    pub fn to_matrix(&self) -> IntMatrix {
        IntMatrix::row_vector(vec![
            self.simulation_count,
            self.decimal_precision as i32,
            self.fixed_point_multiplier,
            self.task_count as i32,
            self.item_count as i32,
            self.coordinates_per_item as i32,
        ])
    }

    /// Rounds executed by the loop: `simulation_count - 1`, never negative.
    pub fn iteration_count(&self) -> usize {
        (self.simulation_count - SIMULATION_COUNT_OFFSET).max(0) as usize
    }

    pub fn fixed_point(&self) -> FixedPoint {
        FixedPoint::new(self.decimal_precision, self.fixed_point_multiplier)
    }

    pub fn layout_width(&self) -> usize {
        self.item_count * self.coordinates_per_item
    }
}

/// Naming templates used to address backend entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identifiers {
    pub object_prefix: String,
    pub human_operation_prefix: String,
    pub robot_operation_prefix: String,
    pub target_name: String,
    pub frame_prefix: String,
    pub human_name: String,
    pub robot_name: String,
    pub waypoint_prefix: String,
}

impl Identifiers {
    /// Takes the first eight tokens in protocol order; extra tokens are ignored.
    pub fn from_tokens(tokens: &[String]) -> SessionResult<Self> {
        if tokens.len() < IDENTIFIER_COUNT {
            return Err(SessionError::MissingIdentifier {
                expected: IDENTIFIER_COUNT,
                received: tokens.len(),
            });
        }
        Ok(Self {
            object_prefix: tokens[0].clone(),
            human_operation_prefix: tokens[1].clone(),
            robot_operation_prefix: tokens[2].clone(),
            target_name: tokens[3].clone(),
            frame_prefix: tokens[4].clone(),
            human_name: tokens[5].clone(),
            robot_name: tokens[6].clone(),
            waypoint_prefix: tokens[7].clone(),
        })
    }

    pub fn to_tokens(&self) -> Vec<String> {
        vec![
            self.object_prefix.clone(),
            self.human_operation_prefix.clone(),
            self.robot_operation_prefix.clone(),
            self.target_name.clone(),
            self.frame_prefix.clone(),
            self.human_name.clone(),
            self.robot_name.clone(),
            self.waypoint_prefix.clone(),
        ]
    }

    pub fn object_name(&self, index: usize) -> String {
        format!("{}{}", self.object_prefix, index)
    }

    pub fn frame_name(&self, index: usize) -> String {
        format!("{}{}", self.frame_prefix, index)
    }

    pub fn operation_name(&self, agent: Agent, task_index: usize) -> String {
        match agent {
            Agent::Human => format!("{}{}", self.human_operation_prefix, task_index),
            Agent::Robot => format!("{}{}", self.robot_operation_prefix, task_index),
        }
    }

    pub fn waypoint_name(&self, point: usize, task_index: usize) -> String {
        format!("{}{}op{}", self.waypoint_prefix, point, task_index)
    }
}

/// Per-task agent choice, task index 1 at position 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentSequence(Vec<Agent>);

impl AssignmentSequence {
    pub fn from_matrix(matrix: &IntMatrix, task_count: usize) -> SessionResult<Self> {
        expect_shape(matrix, "assignment", 1, task_count)?;
        let agents = matrix
            .as_slice()
            .iter()
            .enumerate()
            .map(|(i, &tag)| {
                Agent::from_tag(tag).ok_or(SessionError::UnknownAgentTag { task: i + 1, tag })
            })
            .collect::<SessionResult<Vec<_>>>()?;
        Ok(Self(agents))
    }

    pub fn new(agents: Vec<Agent>) -> Self {
        Self(agents)
    }

    /// Yields `(task_index, agent)` with 1-based task indices.
    pub fn tasks(&self) -> impl Iterator<Item = (usize, Agent)> + '_ {
        self.0.iter().enumerate().map(|(i, a)| (i + 1, *a))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_matrix(&self) -> IntMatrix {
        IntMatrix::row_vector(self.0.iter().map(|a| a.tag()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params_matrix(values: [i32; 6]) -> IntMatrix {
        IntMatrix::row_vector(values.to_vec())
    }

    #[test]
    fn parameters_decode_in_protocol_order() {
        let p = SessionParameters::from_matrix(&params_matrix([4, 3, 1000, 4, 4, 6])).unwrap();
        assert_eq!(p.simulation_count, 4);
        assert_eq!(p.decimal_precision, 3);
        assert_eq!(p.fixed_point_multiplier, 1000);
        assert_eq!(p.task_count, 4);
        assert_eq!(p.layout_width(), 24);
        assert_eq!(p.iteration_count(), 3);
    }

    #[test]
    fn single_simulation_runs_no_rounds() {
        let p = SessionParameters::from_matrix(&params_matrix([1, 3, 1000, 2, 2, 6])).unwrap();
        assert_eq!(p.iteration_count(), 0);
        let p = SessionParameters::from_matrix(&params_matrix([0, 3, 1000, 2, 2, 6])).unwrap();
        assert_eq!(p.iteration_count(), 0);
    }

    #[test]
    fn parameters_reject_wrong_shape() {
        let m = IntMatrix::row_vector(vec![2, 3, 1000]);
        assert!(matches!(
            SessionParameters::from_matrix(&m),
            Err(SessionError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn parameters_reject_zero_multiplier() {
        assert!(SessionParameters::from_matrix(&params_matrix([2, 3, 0, 4, 4, 6])).is_err());
    }

    #[test]
    fn parameters_reject_unusable_precision() {
        let outcome = SessionParameters::from_matrix(&params_matrix([2, 400, 1000, 1, 1, 6]));
        assert!(matches!(
            outcome,
            Err(SessionError::ShapeMismatch { ref actual, .. }) if actual == "400"
        ));
        let p = SessionParameters::from_matrix(&params_matrix([2, 15, 1, 1, 1, 6])).unwrap();
        assert_eq!(p.fixed_point().encode(12.0), Ok(12));
    }

    #[test]
    fn parameters_reject_zero_tasks() {
        assert!(matches!(
            SessionParameters::from_matrix(&params_matrix([2, 3, 1000, 0, 4, 6])),
            Err(SessionError::ShapeMismatch { ref expected, .. }) if expected == "at least one task"
        ));
    }

    #[test]
    fn identifiers_require_eight_tokens() {
        let tokens: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert!(matches!(
            Identifiers::from_tokens(&tokens),
            Err(SessionError::MissingIdentifier { expected: 8, received: 3 })
        ));
    }

    #[test]
    fn identifier_names_follow_templates() {
        let tokens: Vec<String> = [
            "YAOSC_cube",
            "HumanPickAndPlace",
            "RobotPickAndPlace",
            "NewTray",
            "fr_cube",
            "Jack",
            "UR5e",
            "point",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let ids = Identifiers::from_tokens(&tokens).unwrap();
        assert_eq!(ids.object_name(2), "YAOSC_cube2");
        assert_eq!(ids.operation_name(Agent::Robot, 3), "RobotPickAndPlace3");
        assert_eq!(ids.operation_name(Agent::Human, 1), "HumanPickAndPlace1");
        assert_eq!(ids.waypoint_name(8, 4), "point8op4");
        assert_eq!(ids.to_tokens(), tokens);
    }

    #[test]
    fn assignment_rejects_unknown_tag() {
        let m = IntMatrix::row_vector(vec![0, 1, 2]);
        assert!(matches!(
            AssignmentSequence::from_matrix(&m, 3),
            Err(SessionError::UnknownAgentTag { task: 3, tag: 2 })
        ));
    }

    #[test]
    fn assignment_tasks_are_one_based() {
        let m = IntMatrix::row_vector(vec![0, 1, 1]);
        let seq = AssignmentSequence::from_matrix(&m, 3).unwrap();
        let tasks: Vec<_> = seq.tasks().collect();
        assert_eq!(tasks, vec![(1, Agent::Robot), (2, Agent::Human), (3, Agent::Human)]);
    }
}
