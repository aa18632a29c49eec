/// One of the five held-key movement flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveFlag {
    Forward,
    Back,
    Left,
    Right,
    Sprinting,
}

/// A discrete outcome of a keyboard transition.
///
/// The player consumes actions, never raw key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// A movement flag changed to the given held state.
    Move(MoveFlag, bool),
    /// Jump key went down. The player decides whether it is grounded.
    Jump,
    /// Debug overlay key went down.
    ToggleDebug,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_action_carries_flag_and_state() {
        let a = Action::Move(MoveFlag::Sprinting, true);
        assert!(matches!(a, Action::Move(MoveFlag::Sprinting, true)));
    }

    #[test]
    fn discrete_actions_are_distinct() {
        assert_ne!(Action::Jump, Action::ToggleDebug);
    }
}
