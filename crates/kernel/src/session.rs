/// Commands that change session-wide state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    ToggleDebug,
}

/// State shared by everything rendered in one run, passed by reference.
#[derive(Debug, Clone, Default)]
pub struct Session {
    debug_enabled: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug_enabled
    }

    pub fn apply(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::ToggleDebug => {
                self.debug_enabled = !self.debug_enabled;
                tracing::info!(enabled = self.debug_enabled, "debug overlay toggled");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_starts_off_and_toggles() {
        let mut session = Session::new();
        assert!(!session.debug_enabled());
        session.apply(SessionCommand::ToggleDebug);
        assert!(session.debug_enabled());
        session.apply(SessionCommand::ToggleDebug);
        assert!(!session.debug_enabled());
    }
}
