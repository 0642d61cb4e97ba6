//! Loaded models and the state derived from them.

use foampath_gcode::MotionProgram;
use foampath_mesh::{SpatialMesh, TriangleMesh};
use foampath_select::SelectionResult;
use foampath_toolpath::ToolpathResult;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Which region a selection pass writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionTarget {
    /// Regular foam coverage.
    #[default]
    Foam,
    /// Sensing inlay.
    Sense,
}

/// Selections and everything derived from them for one everyday model.
///
/// Each stage output is replaced as a whole when an upstream input changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EverydayState {
    /// Regular foam selection.
    pub foam: Option<SelectionResult>,
    /// Sensing selection.
    pub sense: Option<SelectionResult>,
    /// Samples, paths and stacked strokes.
    pub toolpath: ToolpathResult,
    /// Emitted foam program.
    pub program: MotionProgram,
}

impl EverydayState {
    /// Selection for `target`, if one has been made.
    pub fn selection(&self, target: SelectionTarget) -> Option<&SelectionResult> {
        match target {
            SelectionTarget::Foam => self.foam.as_ref(),
            SelectionTarget::Sense => self.sense.as_ref(),
        }
    }

    pub(crate) fn set_selection(&mut self, target: SelectionTarget, selection: Option<SelectionResult>) {
        match target {
            SelectionTarget::Foam => self.foam = selection,
            SelectionTarget::Sense => self.sense = selection,
        }
    }

    /// Drop samples, paths, strokes and program.
    pub fn clear_derived(&mut self) {
        self.toolpath = ToolpathResult::default();
        self.program = MotionProgram::default();
    }
}

/// What a model is loaded as.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelKind {
    /// A model printed entirely in foam. It carries no selections.
    Foam,
    /// An everyday object whose surface receives foam and sensing regions.
    Everyday(EverydayState),
}

/// A named mesh plus its kind-specific state.
#[derive(Debug)]
pub struct Model {
    /// Display name.
    pub name: String,
    /// Mesh with its spatial index.
    pub mesh: SpatialMesh,
    /// Variant payload.
    pub kind: ModelKind,
}

impl Model {
    /// Load a foam model.
    pub fn foam(name: impl Into<String>, mesh: TriangleMesh) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            mesh: SpatialMesh::new(mesh)?,
            kind: ModelKind::Foam,
        })
    }

    /// Load an everyday model with no selections.
    pub fn everyday(name: impl Into<String>, mesh: TriangleMesh) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            mesh: SpatialMesh::new(mesh)?,
            kind: ModelKind::Everyday(EverydayState::default()),
        })
    }

    /// Everyday state, or `None` for foam models.
    pub fn everyday_state(&self) -> Option<&EverydayState> {
        match &self.kind {
            ModelKind::Everyday(state) => Some(state),
            ModelKind::Foam => None,
        }
    }

    /// Emitted foam program, empty until a selection has been toolpathed.
    pub fn program(&self) -> Option<&MotionProgram> {
        self.everyday_state().map(|s| &s.program)
    }
}
