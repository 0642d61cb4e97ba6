//! JSON job files.

use std::path::Path;

use anyhow::{Context, Result};
use foampath::foampath_mesh::TriangleMesh;
use foampath::foampath_select::{Camera, SelectionRegion, SensingVolume};
use foampath::{Model, PipelineEvent, SelectionTarget};
use serde::{Deserialize, Serialize};

/// How the job's mesh is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    /// Printed entirely in foam; only base constraints apply.
    Foam,
    /// Foam and sensing regions on the surface.
    #[default]
    Everyday,
}

/// Everything the viewer would hand the pipeline for one model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Model name, also the default output stem.
    pub name: String,
    /// Model kind.
    #[serde(default)]
    pub kind: JobKind,
    /// Mesh buffers and world transform.
    pub mesh: TriangleMesh,
    /// Camera the regions were drawn with.
    #[serde(default)]
    pub camera: Camera,
    /// Foam region in normalized screen space.
    #[serde(default)]
    pub foam_region: Option<SelectionRegion>,
    /// Sensing region in normalized screen space.
    #[serde(default)]
    pub sense_region: Option<SelectionRegion>,
    /// Sensing volume; replaces `sense_region` when both are given.
    #[serde(default)]
    pub sense_volume: Option<SensingVolume>,
}

impl Job {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading job {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing job {}", path.display()))
    }

    pub fn model(&self) -> Result<Model> {
        let model = match self.kind {
            JobKind::Foam => Model::foam(&self.name, self.mesh.clone()),
            JobKind::Everyday => Model::everyday(&self.name, self.mesh.clone()),
        };
        model.with_context(|| format!("loading mesh of {}", self.name))
    }

    /// Selection events in the order a user would produce them.
    pub fn events(&self) -> Vec<PipelineEvent> {
        let mut events = Vec::new();
        if let Some(region) = &self.foam_region {
            events.push(PipelineEvent::RegionFinalized {
                target: SelectionTarget::Foam,
                region: region.clone(),
            });
        }
        if let Some(volume) = &self.sense_volume {
            events.push(PipelineEvent::VolumePlaced(volume.clone()));
        } else if let Some(region) = &self.sense_region {
            events.push(PipelineEvent::RegionFinalized {
                target: SelectionTarget::Sense,
                region: region.clone(),
            });
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOB: &str = r#"{
        "name": "square",
        "mesh": {
            "vertices": [0, 0, 0, 8, 0, 0, 8, 8, 0, 0, 8, 0],
            "indices": [0, 1, 2, 0, 2, 3]
        },
        "foam_region": { "points": [[-1, -1], [1, -1], [1, 1], [-1, 1], [-1, -1]] },
        "sense_region": { "points": [[-0.1, -0.1], [0.1, -0.1], [0.1, 0.1], [-0.1, 0.1]] }
    }"#;

    #[test]
    fn test_parse_job() {
        let job: Job = serde_json::from_str(JOB).unwrap();
        assert_eq!(job.kind, JobKind::Everyday);
        assert_eq!(job.mesh.num_triangles(), 2);
        assert_eq!(job.events().len(), 2);
        assert!(job.model().unwrap().everyday_state().is_some());
    }

    #[test]
    fn test_volume_replaces_sense_region() {
        let mut job: Job = serde_json::from_str(JOB).unwrap();
        job.sense_volume = Some(SensingVolume::at(
            Default::default(),
            2.0,
            foampath::foampath_math::Point3::new(4.0, 4.0, 0.0),
        ));
        let events = job.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], PipelineEvent::VolumePlaced(_)));
    }
}
