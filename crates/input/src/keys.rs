use crate::action::{Action, MoveFlag};
use std::collections::HashMap;
use winit::keyboard::KeyCode;

/// Currently-held movement keys.
///
/// Flags change only on key transitions; nothing clears them wholesale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub sprinting: bool,
}

impl MoveInput {
    pub fn set(&mut self, flag: MoveFlag, held: bool) {
        match flag {
            MoveFlag::Forward => self.forward = held,
            MoveFlag::Back => self.back = held,
            MoveFlag::Left => self.left = held,
            MoveFlag::Right => self.right = held,
            MoveFlag::Sprinting => self.sprinting = held,
        }
    }

    /// `(right_axis, forward_axis)`, each in `-1..=1`.
    pub fn axes(&self) -> (f64, f64) {
        let axis = |pos: bool, neg: bool| (pos as i8 - neg as i8) as f64;
        (axis(self.right, self.left), axis(self.forward, self.back))
    }
}

/// Physical key assignments.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub movement: HashMap<KeyCode, MoveFlag>,
    pub jump: KeyCode,
    pub toggle_debug: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let movement = HashMap::from([
            (KeyCode::KeyW, MoveFlag::Forward),
            (KeyCode::KeyS, MoveFlag::Back),
            (KeyCode::KeyD, MoveFlag::Right),
            (KeyCode::KeyA, MoveFlag::Left),
            (KeyCode::ShiftLeft, MoveFlag::Sprinting),
            (KeyCode::ShiftRight, MoveFlag::Sprinting),
        ]);
        Self {
            movement,
            jump: KeyCode::Space,
            toggle_debug: KeyCode::KeyB,
        }
    }
}

/// Last recorded down/up state per key code.
#[derive(Debug, Default)]
pub struct KeyTracker {
    states: HashMap<KeyCode, bool>,
}

impl KeyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a transition. Returns `false` when it repeats the recorded state.
    pub fn transition(&mut self, code: KeyCode, down: bool) -> bool {
        let previous = self.states.insert(code, down);
        previous != Some(down)
    }

    pub fn is_down(&self, code: KeyCode) -> bool {
        self.states.get(&code).copied().unwrap_or(false)
    }
}

/// Turns raw key transitions into [`MoveInput`] updates and [`Action`]s.
#[derive(Debug, Default)]
pub struct InputRouter {
    bindings: KeyBindings,
    tracker: KeyTracker,
    move_input: MoveInput,
}

impl InputRouter {
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            tracker: KeyTracker::new(),
            move_input: MoveInput::default(),
        }
    }

    pub fn move_input(&self) -> MoveInput {
        self.move_input
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// Feed one key transition. Repeats of the recorded state yield `None`.
    ///
    /// Two codes may map to the same flag (left/right shift); the flag follows
    /// whichever of them transitioned last.
    pub fn handle_key(&mut self, code: KeyCode, down: bool) -> Option<Action> {
        if !self.tracker.transition(code, down) {
            return None;
        }

        if let Some(&flag) = self.bindings.movement.get(&code) {
            self.move_input.set(flag, down);
            tracing::debug!(?code, ?flag, down, "movement flag changed");
            return Some(Action::Move(flag, down));
        }

        if !down {
            return None;
        }
        if code == self.bindings.jump {
            Some(Action::Jump)
        } else if code == self.bindings.toggle_debug {
            Some(Action::ToggleDebug)
        } else {
            None
        }
    }
}
