use super::synthesizer::OperationStrategy;
use super::types::{Agent, Hand, HumanTask, Operation};
use crate::common::BackendResult;
use crate::config::HumanConfig;
use crate::domains::scene::ports::{ObjectHandle, PostureHandle, SimulationBackend};
use crate::domains::scene::types::{Pose, Vec3};
use crate::domains::session::params::Identifiers;
use async_trait::async_trait;

/// Scene facts a Human pick-and-place is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct HumanPickPlace {
    pub human: ObjectHandle,
    pub object: ObjectHandle,
    pub pick: Pose,
    pub grasp_frame: Pose,
    pub place_target: Pose,
    pub leaned: PostureHandle,
    pub home: PostureHandle,
}

impl HumanPickPlace {
    pub fn effector(&self) -> Hand {
        Hand::for_lateral(self.pick.position.y)
    }

    /// Get, hold leaned, put, return home. Each step follows the previous one.
    pub fn plan(&self, settings: &HumanConfig) -> Vec<HumanTask> {
        let grasp_target = self
            .grasp_frame
            .translated_local(Vec3::new(0.0, 0.0, settings.grasp_offset));
        let t = self.place_target.position;
        let place = Pose::from_translation(Vec3::new(t.x, t.y, t.z + settings.place_z_offset));

        vec![
            HumanTask::Get {
                human: self.human,
                object: self.object,
                target: self.pick,
                effector: self.effector(),
                grasp_target,
                keep_uninvolved_hand_still: true,
            },
            HumanTask::Pose {
                human: self.human,
                posture: self.leaned,
                duration: settings.pose_duration_s,
            },
            HumanTask::Put {
                human: self.human,
                object: self.object,
                target: place,
            },
            HumanTask::Pose {
                human: self.human,
                posture: self.home,
                duration: settings.pose_duration_s,
            },
        ]
    }
}

pub struct HumanStrategy {
    settings: HumanConfig,
}

impl HumanStrategy {
    pub fn new(settings: HumanConfig) -> Self {
        Self { settings }
    }

    async fn gather(
        &self,
        backend: &mut dyn SimulationBackend,
        task_index: usize,
        ids: &Identifiers,
    ) -> BackendResult<HumanPickPlace> {
        let human = backend.find_object(&ids.human_name).await?;

        // The human ends up in the home posture.
        let leaned = backend
            .capture_posture(human, &self.settings.leaned_posture)
            .await?;
        backend.refresh_display().await;
        let home = backend
            .capture_posture(human, &self.settings.home_posture)
            .await?;
        backend.refresh_display().await;

        let frame = backend.find_object(&ids.frame_name(task_index)).await?;
        let object = backend.find_object(&ids.object_name(task_index)).await?;
        let target = backend.find_object(&ids.target_name).await?;

        Ok(HumanPickPlace {
            human,
            object,
            pick: backend.absolute_pose(object).await?,
            grasp_frame: backend.absolute_pose(frame).await?,
            place_target: backend.absolute_pose(target).await?,
            leaned,
            home,
        })
    }
}

#[async_trait]
impl OperationStrategy for HumanStrategy {
    fn agent(&self) -> Agent {
        Agent::Human
    }

    async fn synthesize(
        &self,
        backend: &mut dyn SimulationBackend,
        task_index: usize,
        ids: &Identifiers,
    ) -> BackendResult<Operation> {
        let facts = self.gather(backend, task_index, ids).await?;
        let name = ids.operation_name(Agent::Human, task_index);
        let handle = backend.create_human_operation(&name).await?;

        let mut previous = None;
        for step in facts.plan(&self.settings) {
            let task = backend.create_task(handle, &step, previous).await?;
            backend.apply_task(handle, task).await?;
            backend.refresh_display().await;
            previous = Some(task);
        }

        tracing::debug!(operation = %name, hand = ?facts.effector(), "human operation synthesized");
        Ok(Operation::new(name, task_index, Agent::Human, handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(pick_y: f64) -> HumanPickPlace {
        HumanPickPlace {
            human: ObjectHandle(1),
            object: ObjectHandle(2),
            pick: Pose::from_translation(Vec3::new(400.0, pick_y, 10.0)),
            grasp_frame: Pose::from_translation(Vec3::new(400.0, pick_y, 25.0)),
            place_target: Pose::new(Vec3::new(-200.0, 300.0, 50.0), Vec3::new(0.0, 0.0, 1.0)),
            leaned: PostureHandle(7),
            home: PostureHandle(8),
        }
    }

    #[test]
    fn plan_has_four_steps_in_order() {
        let steps = facts(5.0).plan(&HumanConfig::default());
        let labels: Vec<&str> = steps.iter().map(|s| s.label()).collect();
        assert_eq!(labels, vec!["get", "pose", "put", "pose"]);
    }

    #[test]
    fn hand_follows_lateral_sign() {
        assert_eq!(facts(0.0).effector(), Hand::Right);
        assert_eq!(facts(120.0).effector(), Hand::Right);
        assert_eq!(facts(-0.5).effector(), Hand::Left);
    }

    #[test]
    fn grasp_and_place_offsets_are_applied() {
        let steps = facts(-40.0).plan(&HumanConfig::default());
        match &steps[0] {
            HumanTask::Get {
                effector,
                grasp_target,
                target,
                ..
            } => {
                assert_eq!(*effector, Hand::Left);
                assert_eq!(grasp_target.position, Vec3::new(400.0, -40.0, 55.0));
                assert_eq!(target.position.z, 10.0);
            }
            other => panic!("expected get step, got {:?}", other),
        }
        match &steps[2] {
            HumanTask::Put { target, .. } => {
                assert_eq!(target.position, Vec3::new(-200.0, 300.0, 70.0));
                assert_eq!(target.rotation, Vec3::ZERO);
            }
            other => panic!("expected put step, got {:?}", other),
        }
    }

    #[test]
    fn pose_steps_use_cached_postures() {
        let steps = facts(1.0).plan(&HumanConfig::default());
        assert_eq!(
            steps[1],
            HumanTask::Pose {
                human: ObjectHandle(1),
                posture: PostureHandle(7),
                duration: 0.7
            }
        );
        assert!(matches!(
            steps[3],
            HumanTask::Pose { posture: PostureHandle(8), .. }
        ));
    }
}
