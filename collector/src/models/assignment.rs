use serde::{Deserialize, Serialize};

use super::{GuidanceSystem, StepGroup};

/// Counterbalanced system order for one participant, one system per block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemAssignment {
    pub group_a: GuidanceSystem,
    pub group_b: GuidanceSystem,
    pub group_c: GuidanceSystem,
    /// True when the participant id fell outside the Latin square and the
    /// fixed default order was used instead.
    pub is_default: bool,
}

impl SystemAssignment {
    pub fn system_for(&self, group: StepGroup) -> GuidanceSystem {
        match group {
            StepGroup::A => self.group_a,
            StepGroup::B => self.group_b,
            StepGroup::C => self.group_c,
        }
    }
}

/// 12-row Latin square: participant id -> system order across groups A/B/C.
const LATIN_SQUARE: [[GuidanceSystem; 3]; 12] = {
    use GuidanceSystem::{FullCv, StaticAr, StepAwareCv};
    [
        [StaticAr, FullCv, StepAwareCv],
        [StaticAr, FullCv, StepAwareCv],
        [StaticAr, FullCv, StepAwareCv],
        [StaticAr, FullCv, StepAwareCv],
        [FullCv, StepAwareCv, StaticAr],
        [FullCv, StepAwareCv, StaticAr],
        [FullCv, StepAwareCv, StaticAr],
        [FullCv, StepAwareCv, StaticAr],
        [StepAwareCv, StaticAr, FullCv],
        [StepAwareCv, StaticAr, FullCv],
        [StepAwareCv, StaticAr, FullCv],
        [StepAwareCv, StaticAr, FullCv],
    ]
};

const DEFAULT_ORDER: [GuidanceSystem; 3] = [
    GuidanceSystem::StaticAr,
    GuidanceSystem::FullCv,
    GuidanceSystem::StepAwareCv,
];

/// Resolves the three-group assignment for a participant. Total over all ids:
/// anything outside 1..=12 gets the fixed default order.
pub fn assignment_for(participant_id: u32) -> SystemAssignment {
    let (order, is_default) = match participant_id {
        1..=12 => (LATIN_SQUARE[(participant_id - 1) as usize], false),
        _ => (DEFAULT_ORDER, true),
    };
    SystemAssignment {
        group_a: order[0],
        group_b: order[1],
        group_c: order[2],
        is_default,
    }
}

/// Latin-square lookup for a single group. Pure, no error cases.
pub fn resolve_system(participant_id: u32, group: StepGroup) -> GuidanceSystem {
    assignment_for(participant_id).system_for(group)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_square_row_is_a_permutation() {
        for id in 1..=12 {
            let a = resolve_system(id, StepGroup::A);
            let b = resolve_system(id, StepGroup::B);
            let c = resolve_system(id, StepGroup::C);
            assert_ne!(a, b, "participant {id}");
            assert_ne!(b, c, "participant {id}");
            assert_ne!(a, c, "participant {id}");
        }
    }

    #[test]
    fn out_of_range_ids_fall_back_to_default_order() {
        for id in [0, 13, 42, 100] {
            let assignment = assignment_for(id);
            assert!(assignment.is_default);
            assert_eq!(assignment.group_a, GuidanceSystem::StaticAr);
            assert_eq!(assignment.group_b, GuidanceSystem::FullCv);
            assert_eq!(assignment.group_c, GuidanceSystem::StepAwareCv);
        }
    }

    #[test]
    fn participant_seven_gets_second_square_block() {
        assert_eq!(resolve_system(7, StepGroup::A), GuidanceSystem::FullCv);
        assert_eq!(resolve_system(7, StepGroup::B), GuidanceSystem::StepAwareCv);
        assert_eq!(resolve_system(7, StepGroup::C), GuidanceSystem::StaticAr);
    }
}
