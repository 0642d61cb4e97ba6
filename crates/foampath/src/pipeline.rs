//! Event-driven recomputation of selections, toolpaths and programs.
//!
//! A [`Pipeline`] holds the settings every stage reads. Each
//! [`PipelineEvent`] updates those settings or one model's selections and
//! then synchronously reruns the stages downstream of the change. Earlier
//! stage outputs are kept; later ones are replaced as a whole.

use foampath_gcode::{emit_base_constraints, emit_layers, Extruder, MachineProfile, MotionProgram};
use foampath_math::{Point3, Transform};
use foampath_mesh::SpatialMesh;
use foampath_select::{
    select, select_in_volume, Camera, SelectionPolicy, SelectionRegion, SensingVolume,
};
use foampath_toolpath::{assemble_layers, bottom_boundary, generate, LayerSettings, ToolpathConfig};
use std::fmt;

use crate::config::{BaseSettings, FoampathConfig};
use crate::error::Result;
use crate::model::{EverydayState, Model, ModelKind, SelectionTarget};

/// Settings shared by every stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineContext {
    /// Camera used to project regions onto the mesh.
    pub camera: Camera,
    /// Face-inclusion policy for region selection.
    pub policy: SelectionPolicy,
    /// Sampling, planning and layer stacking.
    pub toolpath: ToolpathConfig,
    /// Printer parameters.
    pub machine: MachineProfile,
    /// Head that prints foam programs.
    pub extruder: Extruder,
    /// Base-constraint outline.
    pub base: BaseSettings,
}

impl PipelineContext {
    /// Context from a loaded configuration and a camera.
    pub fn from_config(config: FoampathConfig, camera: Camera) -> Self {
        Self {
            camera,
            policy: config.selection,
            toolpath: config.toolpath,
            machine: config.machine,
            extruder: config.extruder,
            base: config.base,
        }
    }
}

/// A discrete change that triggers recomputation.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// A lasso or box was released over the model.
    RegionFinalized {
        /// Region receiving the selection.
        target: SelectionTarget,
        /// Closed region in normalized screen space.
        region: SelectionRegion,
    },
    /// A sensing volume was placed; it replaces the sensing selection.
    VolumePlaced(SensingVolume),
    /// New sampling grid spacing.
    GridSizeChanged(f64),
    /// New layer stacking parameters.
    LayersChanged(LayerSettings),
    /// New selection policy, used by the next region.
    PolicyChanged(SelectionPolicy),
    /// The view moved, used by the next region.
    CameraChanged(Camera),
    /// New printer or head.
    MachineChanged {
        /// Printer parameters.
        profile: MachineProfile,
        /// Head that prints foam programs.
        extruder: Extruder,
    },
    /// Drop one selection.
    ClearSelection(SelectionTarget),
}

/// Recoverable condition reported alongside a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// The model is a foam model and carries no selections.
    NotEveryday,
    /// The region selected no triangles.
    EmptySelection(SelectionTarget),
    /// Sampling needs a foam selection first.
    NoFoamSelection,
    /// The foam selection produced no sample points.
    NoSamples,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::NotEveryday => write!(f, "foam models have no surface selections"),
            Notice::EmptySelection(target) => write!(f, "{target:?} selection is empty"),
            Notice::NoFoamSelection => write!(f, "select a foam region before sampling"),
            Notice::NoSamples => write!(f, "foam region produced no sample points"),
        }
    }
}

/// First stage rerun by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Sample,
    Stack,
    Emit,
}

/// What one event did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineOutcome {
    /// Recoverable conditions met along the way.
    pub notices: Vec<Notice>,
    /// Whether the model's program was replaced.
    pub program_updated: bool,
}

impl PipelineOutcome {
    fn notice(&mut self, notice: Notice) {
        log::warn!("{notice}");
        self.notices.push(notice);
    }
}

/// Runs the selection to program chain in response to events.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    context: PipelineContext,
}

impl Pipeline {
    /// Pipeline over `context`.
    pub fn new(context: PipelineContext) -> Self {
        Self { context }
    }

    /// Current settings.
    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// Apply `event` to the settings and to `model`, then rerun every stage
    /// downstream of the change.
    pub fn handle(&mut self, model: &mut Model, event: PipelineEvent) -> Result<PipelineOutcome> {
        let mut outcome = PipelineOutcome::default();

        let stage = match event {
            PipelineEvent::PolicyChanged(policy) => {
                self.context.policy = policy;
                return Ok(outcome);
            }
            PipelineEvent::CameraChanged(camera) => {
                self.context.camera = camera;
                return Ok(outcome);
            }
            PipelineEvent::GridSizeChanged(grid_size) => {
                let mut toolpath = self.context.toolpath.clone();
                toolpath.grid_size = grid_size;
                toolpath.validate()?;
                self.context.toolpath = toolpath;
                Stage::Sample
            }
            PipelineEvent::LayersChanged(layers) => {
                layers.validate()?;
                self.context.toolpath.layers = layers;
                Stage::Stack
            }
            PipelineEvent::MachineChanged { profile, extruder } => {
                profile.validate()?;
                self.context.machine = profile;
                self.context.extruder = extruder;
                Stage::Emit
            }
            PipelineEvent::RegionFinalized { target, region } => {
                let ModelKind::Everyday(state) = &mut model.kind else {
                    outcome.notice(Notice::NotEveryday);
                    return Ok(outcome);
                };
                let selection = select(&model.mesh, &self.context.camera, &region, self.context.policy)?;
                if selection.is_empty() {
                    outcome.notice(Notice::EmptySelection(target));
                }
                state.set_selection(target, Some(selection));
                Stage::Sample
            }
            PipelineEvent::VolumePlaced(volume) => {
                let ModelKind::Everyday(state) = &mut model.kind else {
                    outcome.notice(Notice::NotEveryday);
                    return Ok(outcome);
                };
                let selection = select_in_volume(&model.mesh, &volume)?;
                if selection.is_empty() {
                    outcome.notice(Notice::EmptySelection(SelectionTarget::Sense));
                }
                state.sense = Some(selection);
                Stage::Sample
            }
            PipelineEvent::ClearSelection(target) => {
                let ModelKind::Everyday(state) = &mut model.kind else {
                    outcome.notice(Notice::NotEveryday);
                    return Ok(outcome);
                };
                state.set_selection(target, None);
                Stage::Sample
            }
        };

        let ModelKind::Everyday(state) = &mut model.kind else {
            return Ok(outcome);
        };
        let world = &model.mesh.mesh().transform;
        self.run_from(stage, state, world, &mut outcome)?;
        Ok(outcome)
    }

    fn run_from(
        &self,
        stage: Stage,
        state: &mut EverydayState,
        world: &Transform,
        outcome: &mut PipelineOutcome,
    ) -> Result<()> {
        if stage <= Stage::Sample {
            state.clear_derived();
            let Some(foam) = state.foam.as_ref().filter(|s| !s.is_empty()) else {
                outcome.notice(Notice::NoFoamSelection);
                outcome.program_updated = true;
                return Ok(());
            };
            let foam = SpatialMesh::new(foam.sub_mesh.clone().with_transform(world.clone()))?;
            let sense = state
                .sense
                .as_ref()
                .filter(|s| !s.is_empty())
                .map(|s| SpatialMesh::new(s.sub_mesh.clone().with_transform(world.clone())))
                .transpose()?;

            state.toolpath = generate(&foam, sense.as_ref(), &self.context.toolpath)?;
            if state.toolpath.is_empty() {
                outcome.notice(Notice::NoSamples);
            }
        } else if stage <= Stage::Stack {
            state.toolpath.layers = assemble_layers(&state.toolpath.paths, &self.context.toolpath.layers);
        }

        state.program = emit_layers(&state.toolpath.layers, &self.context.machine, self.context.extruder)?;
        outcome.program_updated = true;
        log::info!(
            "program has {} lines, E={:.4}",
            state.program.body.len(),
            state.program.total_extrusion
        );
        Ok(())
    }

    /// Outline program around the part of `model` resting on the bed.
    pub fn base_constraints(&self, model: &Model) -> Result<MotionProgram> {
        let base = &self.context.base;
        base.validate()?;
        let boundary = bottom_boundary(model.mesh.mesh(), base.z_threshold)?;
        Ok(emit_base_constraints(
            &boundary,
            base.offset,
            &self.context.machine,
            base.extruder,
            base.layer_height,
        )?)
    }

    /// Rapid move command to `target` at the free-move speed.
    pub fn move_to(&self, target: &Point3) -> String {
        foampath_gcode::move_to_position(&self.context.machine, target)
    }
}
