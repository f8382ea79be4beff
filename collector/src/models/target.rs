/// One step's designated correct component: display label plus the set of
/// answer tokens accepted as correct (component numbers, matched exactly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub label: &'static str,
    pub accepted: &'static [&'static str],
}

const STEP_TARGETS: [Target; 9] = [
    Target {
        label: "2. Platform",
        accepted: &["2"],
    },
    Target {
        label: "11. Anti-Tip Assembly",
        accepted: &["11"],
    },
    Target {
        label: "9. 5 in.caster / 1. Lower Ladder",
        accepted: &["9", "1"],
    },
    Target {
        label: "3. Mounting Bracket",
        accepted: &["3"],
    },
    Target {
        label: "5. Brace",
        accepted: &["5"],
    },
    Target {
        label: "4. Piece Support / 12. Tightening Knob",
        accepted: &["4", "12"],
    },
    Target {
        label: "6. Shelf Brace",
        accepted: &["6"],
    },
    Target {
        label: "10. Locking Pin",
        accepted: &["10"],
    },
    Target {
        label: "8. Wire Grid Shelf -L- / 7. Wire Grid Shelf -S-",
        accepted: &["8", "7"],
    },
];

const UNKNOWN_TARGET: Target = Target {
    label: "N/A",
    accepted: &[],
};

/// Total over all step ids; anything outside 1..=9 gets the sentinel.
pub fn lookup_target(step_id: u8) -> Target {
    match step_id {
        1..=9 => STEP_TARGETS[(step_id - 1) as usize],
        _ => UNKNOWN_TARGET,
    }
}
