//! References to external collaborators' objects: companion-mod presets,
//! status effects and cosmetic customization profiles.

use uuid::Uuid;

/// A named preset inside a companion-mod container.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModPresetRef {
    /// Mod container (directory) identifier. Empty means "no mod".
    pub container: String,
    /// Preset name within the container.
    pub preset: String,
}

impl ModPresetRef {
    pub fn new(container: impl Into<String>, preset: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            preset: preset.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.container.is_empty()
    }
}

/// A companion-mod toggled on while the owning source is applied.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModAssociation {
    pub preset: ModPresetRef,
    /// Request a character redraw after toggling.
    pub redraw: bool,
}

impl ModAssociation {
    pub fn new(preset: ModPresetRef) -> Self {
        Self {
            preset,
            redraw: false,
        }
    }

    /// Identity used to de-duplicate mod applications.
    pub fn key(&self) -> &str {
        &self.preset.container
    }
}

/// A status-effect reference: either a single status or a preset bundling
/// several statuses.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Moodle {
    Status(Uuid),
    Preset { id: Uuid, statuses: Vec<Uuid> },
}

impl Moodle {
    /// Identity used to de-duplicate status applications.
    pub fn id(&self) -> Uuid {
        match self {
            Moodle::Status(id) => *id,
            Moodle::Preset { id, .. } => *id,
        }
    }

    /// Individual status ids this reference expands to.
    pub fn status_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        let (single, many) = match self {
            Moodle::Status(id) => (Some(*id), &[][..]),
            Moodle::Preset { statuses, .. } => (None, statuses.as_slice()),
        };
        single.into_iter().chain(many.iter().copied())
    }

    pub fn is_valid(&self) -> bool {
        !self.id().is_nil()
    }
}

/// Cosmetic customization profile requested by a source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CustomizeProfile {
    pub id: Uuid,
    /// Higher priority wins; ties go to the later source.
    pub priority: i32,
}
