// Connection lifecycle state machine, kept pure for testability.
// Invariants: at most one retry may be pending at a time; connect is
// a no-op while an attempt or retry is already in flight; disconnect
// is idempotent and cancels the pending retry.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnEvent {
    ConnectRequested,
    Opened,
    /// Transport error or close, regardless of cause.
    TransportClosed,
    RetryElapsed,
    DisconnectRequested,
}

/// What the driver must do after a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnAction {
    None,
    OpenTransport,
    ScheduleRetry,
    /// Cancel the pending retry and close the live connection.
    Teardown,
}

#[derive(Debug, Default)]
pub struct ConnMachine {
    state: ConnState,
}

impl ConnMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnState {
        self.state
    }

    pub fn handle(&mut self, event: ConnEvent) -> ConnAction {
        match (self.state, event) {
            (ConnState::Disconnected, ConnEvent::ConnectRequested) => {
                self.state = ConnState::Connecting;
                ConnAction::OpenTransport
            }
            // Already connecting, connected, or holding the single
            // pending retry: a duplicate connect must not stack.
            (_, ConnEvent::ConnectRequested) => ConnAction::None,

            (ConnState::Connecting, ConnEvent::Opened) => {
                self.state = ConnState::Connected;
                ConnAction::None
            }
            // Stale open completing after a disconnect.
            (_, ConnEvent::Opened) => ConnAction::None,

            (ConnState::Connecting | ConnState::Connected, ConnEvent::TransportClosed) => {
                self.state = ConnState::Reconnecting;
                ConnAction::ScheduleRetry
            }
            (_, ConnEvent::TransportClosed) => ConnAction::None,

            (ConnState::Reconnecting, ConnEvent::RetryElapsed) => {
                self.state = ConnState::Connecting;
                ConnAction::OpenTransport
            }
            (_, ConnEvent::RetryElapsed) => ConnAction::None,

            (_, ConnEvent::DisconnectRequested) => {
                self.state = ConnState::Disconnected;
                ConnAction::Teardown
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_from_idle_opens_the_transport() {
        let mut machine = ConnMachine::new();
        assert_eq!(machine.handle(ConnEvent::ConnectRequested), ConnAction::OpenTransport);
        assert_eq!(machine.state(), ConnState::Connecting);
    }

    #[test]
    fn connect_is_a_no_op_while_connecting_or_connected() {
        let mut machine = ConnMachine::new();
        machine.handle(ConnEvent::ConnectRequested);
        assert_eq!(machine.handle(ConnEvent::ConnectRequested), ConnAction::None);
        machine.handle(ConnEvent::Opened);
        assert_eq!(machine.state(), ConnState::Connected);
        assert_eq!(machine.handle(ConnEvent::ConnectRequested), ConnAction::None);
    }

    #[test]
    fn transport_close_schedules_exactly_one_retry() {
        let mut machine = ConnMachine::new();
        machine.handle(ConnEvent::ConnectRequested);
        machine.handle(ConnEvent::Opened);
        assert_eq!(machine.handle(ConnEvent::TransportClosed), ConnAction::ScheduleRetry);
        assert_eq!(machine.state(), ConnState::Reconnecting);
        // A second close report must not stack another retry.
        assert_eq!(machine.handle(ConnEvent::TransportClosed), ConnAction::None);
    }

    #[test]
    fn connect_while_retry_pending_does_not_duplicate_the_timer() {
        let mut machine = ConnMachine::new();
        machine.handle(ConnEvent::ConnectRequested);
        machine.handle(ConnEvent::Opened);
        machine.handle(ConnEvent::TransportClosed);
        assert_eq!(machine.handle(ConnEvent::ConnectRequested), ConnAction::None);
        assert_eq!(machine.state(), ConnState::Reconnecting);
    }

    #[test]
    fn retry_elapsed_reopens_the_transport() {
        let mut machine = ConnMachine::new();
        machine.handle(ConnEvent::ConnectRequested);
        machine.handle(ConnEvent::Opened);
        machine.handle(ConnEvent::TransportClosed);
        assert_eq!(machine.handle(ConnEvent::RetryElapsed), ConnAction::OpenTransport);
        assert_eq!(machine.state(), ConnState::Connecting);
    }

    #[test]
    fn failed_open_cycles_back_through_reconnecting() {
        let mut machine = ConnMachine::new();
        machine.handle(ConnEvent::ConnectRequested);
        assert_eq!(machine.handle(ConnEvent::TransportClosed), ConnAction::ScheduleRetry);
        assert_eq!(machine.state(), ConnState::Reconnecting);
    }

    #[test]
    fn disconnect_is_idempotent_and_cancels_the_retry() {
        let mut machine = ConnMachine::new();
        machine.handle(ConnEvent::ConnectRequested);
        machine.handle(ConnEvent::Opened);
        machine.handle(ConnEvent::TransportClosed);
        assert_eq!(machine.handle(ConnEvent::DisconnectRequested), ConnAction::Teardown);
        assert_eq!(machine.state(), ConnState::Disconnected);
        assert_eq!(machine.handle(ConnEvent::DisconnectRequested), ConnAction::Teardown);
        // The cancelled retry firing later must not reconnect.
        assert_eq!(machine.handle(ConnEvent::RetryElapsed), ConnAction::None);
    }
}
