use super::human::HumanStrategy;
use super::robot::RobotStrategy;
use super::types::{Agent, Operation};
use crate::common::BackendResult;
use crate::config::{HumanConfig, RobotConfig};
use crate::domains::scene::ports::SimulationBackend;
use crate::domains::session::params::Identifiers;
use async_trait::async_trait;

/// Builds one agent-specific operation for a task.
#[async_trait]
pub trait OperationStrategy: Send + Sync {
    fn agent(&self) -> Agent;

    async fn synthesize(
        &self,
        backend: &mut dyn SimulationBackend,
        task_index: usize,
        ids: &Identifiers,
    ) -> BackendResult<Operation>;
}

/// Dispatches a task to the strategy of its assigned agent.
pub struct OperationSynthesizer {
    human: Box<dyn OperationStrategy>,
    robot: Box<dyn OperationStrategy>,
}

impl OperationSynthesizer {
    pub fn new(human: HumanConfig, robot: RobotConfig) -> Self {
        Self {
            human: Box::new(HumanStrategy::new(human)),
            robot: Box::new(RobotStrategy::new(robot)),
        }
    }

    pub fn strategy_for(&self, agent: Agent) -> &dyn OperationStrategy {
        match agent {
            Agent::Human => self.human.as_ref(),
            Agent::Robot => self.robot.as_ref(),
        }
    }

    pub async fn synthesize(
        &self,
        backend: &mut dyn SimulationBackend,
        agent: Agent,
        task_index: usize,
        ids: &Identifiers,
    ) -> BackendResult<Operation> {
        self.strategy_for(agent)
            .synthesize(backend, task_index, ids)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_matches_agent() {
        let synth = OperationSynthesizer::new(HumanConfig::default(), RobotConfig::default());
        assert_eq!(synth.strategy_for(Agent::Human).agent(), Agent::Human);
        assert_eq!(synth.strategy_for(Agent::Robot).agent(), Agent::Robot);
    }
}
