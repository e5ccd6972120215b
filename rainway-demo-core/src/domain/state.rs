use crate::domain::{PeerId, Roster, SessionState};

/// Everything the demo UI renders: session status plus the peer roster
#[derive(Debug, Clone)]
pub struct DemoState<P, S> {
    pub(crate) session: SessionState,
    pub(crate) own_peer_id: Option<PeerId>,
    /// Display string of the last session failure
    pub(crate) session_error: Option<String>,
    pub(crate) roster: Roster<P, S>,
}

impl<P, S> Default for DemoState<P, S> {
    fn default() -> Self {
        Self {
            session: SessionState::Disconnected,
            own_peer_id: None,
            session_error: None,
            roster: Roster::new(),
        }
    }
}

impl<P, S> DemoState<P, S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn own_peer_id(&self) -> Option<PeerId> {
        self.own_peer_id
    }

    pub fn session_error(&self) -> Option<&str> {
        self.session_error.as_deref()
    }

    pub fn roster(&self) -> &Roster<P, S> {
        &self.roster
    }

    /// Status line of the session badge
    pub fn status_line(&self) -> String {
        match (self.session, self.own_peer_id) {
            (SessionState::Connected, Some(id)) => format!("Connected as {}", id),
            (state, _) => state.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state: DemoState<(), ()> = DemoState::new();
        assert_eq!(state.session(), SessionState::Disconnected);
        assert!(state.own_peer_id().is_none());
        assert!(state.roster().is_empty());
        assert_eq!(state.status_line(), "Disconnected");
    }

    #[test]
    fn test_status_line_connected() {
        let mut state: DemoState<(), ()> = DemoState::new();
        state.session = SessionState::Connected;
        state.own_peer_id = Some(PeerId::new(77));
        assert_eq!(state.status_line(), "Connected as 77");
    }
}
