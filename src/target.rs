// What the host tells us about the current target and focus target.

use cgmath::Vector3;

use crate::types::Rgb24;

/// Packed target colors as the game reports them: the low 32 bits tint the
/// outline, the high 32 bits tint the fill.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TargetColors(pub u64);

impl TargetColors {
    pub const fn new(outline: u32, fill: u32) -> Self {
        TargetColors(((fill as u64) << 32) | outline as u64)
    }

    pub const fn outline(self) -> Rgb24 {
        Rgb24::new(self.0 as u32)
    }

    pub const fn fill(self) -> Rgb24 {
        Rgb24::new((self.0 >> 32) as u32)
    }
}

/// Opaque identity used to tell whether two targets are the same entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityId(pub u64);

/// One tracked entity, already decoded from host memory.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedEntity {
    pub id: EntityId,
    /// Base (feet) position.
    pub position: Vector3<f32>,
    /// Where the nameplate hangs. `None` if the host couldn't resolve it.
    pub nameplate: Option<Vector3<f32>>,
    /// Characters get the second, base-position visibility check.
    pub is_character: bool,
    pub colors: TargetColors,
}

/// Per-frame view of one target, with its role this frame.
#[derive(Clone, Copy, Debug)]
pub struct TargetSnapshot<'a> {
    pub entity: &'a TrackedEntity,
    pub is_focus: bool,
    pub is_same_as_primary: bool,
}

impl<'a> TargetSnapshot<'a> {
    /// The primary target's snapshot. It is trivially the same entity as itself.
    pub fn primary(entity: &'a TrackedEntity) -> Self {
        Self {
            entity,
            is_focus: false,
            is_same_as_primary: true,
        }
    }

    pub fn focus(entity: &'a TrackedEntity, primary: Option<&TrackedEntity>) -> Self {
        Self {
            entity,
            is_focus: true,
            is_same_as_primary: primary.is_some_and(|p| p.id == entity.id),
        }
    }
}

/// Supplies the current target and focus target.
pub trait TargetProvider {
    fn target(&self) -> Option<TrackedEntity>;
    fn focus_target(&self) -> Option<TrackedEntity>;
}

/// Host state read fresh every frame to decide whether indicators run at all.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HostConditions {
    pub in_pvp: bool,
    pub bound_by_duty: bool,
    pub in_combat: bool,
}

impl HostConditions {
    /// No indicators in player-versus-player, or in combat inside a duty.
    pub fn suppresses_indicators(self) -> bool {
        self.in_pvp || (self.bound_by_duty && self.in_combat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: u64) -> TrackedEntity {
        TrackedEntity {
            id: EntityId(id),
            position: Vector3::new(0.0, 0.0, 0.0),
            nameplate: None,
            is_character: true,
            colors: TargetColors::default(),
        }
    }

    #[test]
    fn colors_split_into_masked_halves() {
        let colors = TargetColors(0xFF11_2233_EE44_5566);
        assert_eq!(colors.outline(), Rgb24::new(0x44_5566));
        assert_eq!(colors.fill(), Rgb24::new(0x11_2233));
        assert_eq!(TargetColors::new(0x44_5566, 0x11_2233).0, 0x0011_2233_0044_5566);
    }

    #[test]
    fn focus_snapshot_detects_same_entity() {
        let a = entity(1);
        let b = entity(2);
        assert!(TargetSnapshot::focus(&a, Some(&a)).is_same_as_primary);
        assert!(!TargetSnapshot::focus(&a, Some(&b)).is_same_as_primary);
        assert!(!TargetSnapshot::focus(&a, None).is_same_as_primary);
        assert!(TargetSnapshot::primary(&a).is_same_as_primary);
    }

    #[test]
    fn gating() {
        let base = HostConditions::default();
        assert!(!base.suppresses_indicators());
        assert!(HostConditions { in_pvp: true, ..base }.suppresses_indicators());
        assert!(!HostConditions { bound_by_duty: true, ..base }.suppresses_indicators());
        assert!(!HostConditions { in_combat: true, ..base }.suppresses_indicators());
        assert!(HostConditions { bound_by_duty: true, in_combat: true, ..base }.suppresses_indicators());
    }
}
