use crate::common::{BackendResult, FixedPointOverflow, IntMatrix, SessionResult};
use crate::domains::scene::ports::SimulationBackend;
use crate::domains::scene::types::{Pose, Vec3};
use crate::domains::session::params::{expect_shape, Identifiers, SessionParameters};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPose {
    /// 1-based, matching the object name suffix.
    pub index: usize,
    pub pose: Pose,
}

/// Decoded item poses for one iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub items: Vec<ItemPose>,
}

impl Layout {
    pub fn from_matrix(matrix: &IntMatrix, params: &SessionParameters) -> SessionResult<Self> {
        expect_shape(matrix, "layout", 1, params.layout_width())?;
        let fp = params.fixed_point();
        let items = matrix
            .as_slice()
            .chunks_exact(params.coordinates_per_item)
            .enumerate()
            .map(|(i, c)| ItemPose {
                index: i + 1,
                pose: Pose::new(
                    Vec3::new(fp.decode(c[0]), fp.decode(c[1]), fp.decode(c[2])),
                    Vec3::new(fp.decode(c[3]), fp.decode(c[4]), fp.decode(c[5])),
                ),
            })
            .collect();
        Ok(Self { items })
    }

    /// Inverse of `from_matrix`, used by the planner side.
    pub fn to_matrix(&self, params: &SessionParameters) -> Result<IntMatrix, FixedPointOverflow> {
        let fp = params.fixed_point();
        let data = self
            .items
            .iter()
            .flat_map(|item| {
                let p = item.pose.position;
                let r = item.pose.rotation;
                [p.x, p.y, p.z, r.x, r.y, r.z]
            })
            .map(|v| fp.encode(v))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(IntMatrix::row_vector(data))
    }
}

/// Pushes every item pose into the scene: orientation first, absolutely,
/// then position relative to the working frame.
pub async fn apply_layout<B: SimulationBackend + ?Sized>(
    backend: &mut B,
    layout: &Layout,
    ids: &Identifiers,
) -> BackendResult<()> {
    for item in &layout.items {
        let object = backend.find_object(&ids.object_name(item.index)).await?;
        backend
            .set_absolute_pose(object, Pose::from_rotation(item.pose.rotation))
            .await?;
        backend
            .set_relative_position(object, item.pose.position)
            .await?;
        tracing::debug!(
            item = item.index,
            x = item.pose.position.x,
            y = item.pose.position.y,
            z = item.pose.position.z,
            "item placed"
        );
        backend.refresh_display().await;
    }
    Ok(())
}
