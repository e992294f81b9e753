//! `ThrowdownClient` and the driver task behind it.
//!
//! The driver is an actor: one Tokio task owns the connection handle, the
//! [`SessionMachine`] and the countdown ticker, and nothing else touches
//! them. It waits on three event sources and handles one event at a time:
//!
//! ```text
//!  intents ──mpsc──▶ ┌────────┐ ──send()──▶ ConnectionHandle ──▶ server
//!  server msgs ─────▶│ driver │
//!  ticker ──────────▶└────────┘ ──watch──▶ SessionState snapshots
//! ```
//!
//! After every event it pauses or resumes the ticker to match the
//! countdown and publishes a new snapshot if the state changed.

use throwdown_protocol::{Choice, ClientMessage, JsonCodec, ServerMessage};
use throwdown_session::{
    Identity, IdentityProvider, SessionConfig, SessionError, SessionMachine, SessionState,
};
use throwdown_tick::TickScheduler;
use throwdown_transport::{
    ConnectParams, ConnectionHandle, Subscription, Transport, TransportError, WebSocketTransport,
};
use tokio::sync::{mpsc, watch};

use crate::{ClientConfig, ThrowdownError};

/// The connection type the client drives.
pub type ServerConnection = ConnectionHandle<ServerMessage, ClientMessage>;

/// Intents forwarded from the public handle to the driver.
#[derive(Debug)]
enum Command {
    JoinQueue { ranked: bool },
    LeaveQueue,
    SubmitChoice(Choice),
    Reset,
    Shutdown,
}

/// Handle to a running client session.
///
/// Intent methods are fire-and-forget: they never fail and never block.
/// Intents that don't fit the current phase are ignored by the session,
/// and intents after [`shutdown`](Self::shutdown) go nowhere.
///
/// Dropping the client stops the driver and closes the connection.
pub struct ThrowdownClient {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SessionState>,
    connected: watch::Receiver<bool>,
}

impl ThrowdownClient {
    /// Resolves the player's identity and connects over WebSocket.
    ///
    /// # Errors
    /// - [`SessionError::IdentityPending`] if the provider hasn't resolved
    ///   the identity yet
    /// - [`TransportError::IdentityRequired`] for a guest when
    ///   `config.allow_guest` is `false`
    /// - any other [`TransportError`] from connecting
    pub async fn connect<P>(config: &ClientConfig, identity: &P) -> Result<Self, ThrowdownError>
    where
        P: IdentityProvider,
    {
        Self::connect_with(&WebSocketTransport, config, identity).await
    }

    /// Like [`connect`](Self::connect), over any transport.
    pub async fn connect_with<T, P>(
        transport: &T,
        config: &ClientConfig,
        identity: &P,
    ) -> Result<Self, ThrowdownError>
    where
        T: Transport,
        TransportError: From<T::Error>,
        P: IdentityProvider,
    {
        let params = match identity.identity().await {
            Identity::Pending => return Err(SessionError::IdentityPending.into()),
            Identity::Token(token) => ConnectParams::authenticated(&config.endpoint, token),
            Identity::Guest => ConnectParams {
                endpoint: config.endpoint.clone(),
                token: None,
                allow_anonymous: config.allow_guest,
            },
        };

        let session = SessionConfig {
            guest: params.is_anonymous(),
            ..config.session.clone()
        };
        let connection = ServerConnection::open(transport, &params, JsonCodec).await?;
        Ok(Self::spawn(connection, session))
    }

    /// Starts a driver for an already-open connection.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(connection: ServerConnection, config: SessionConfig) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let machine = SessionMachine::new(config);
        let (state_tx, state_rx) = watch::channel(machine.state().clone());
        let connected = connection.watch_connected();

        let subscription = connection.add_listener(move |msg: &ServerMessage| {
            let _ = inbound_tx.send(msg.clone());
        });

        let driver = Driver {
            machine,
            connection,
            _subscription: subscription,
            inbound: inbound_rx,
            commands: commands_rx,
            ticker: TickScheduler::every_second(),
            state: state_tx,
        };
        tokio::spawn(driver.run());

        Self {
            commands: commands_tx,
            state: state_rx,
            connected,
        }
    }

    /// Asks to enter matchmaking. Guests are always queued as casual.
    pub fn join_queue(&self, ranked: bool) {
        self.command(Command::JoinQueue { ranked });
    }

    pub fn leave_queue(&self) {
        self.command(Command::LeaveQueue);
    }

    /// Submits a gesture. Only the first submission per round is sent.
    pub fn submit_choice(&self, choice: Choice) {
        self.command(Command::SubmitChoice(choice));
    }

    /// Returns the session to idle, clearing any failure.
    pub fn reset(&self) {
        self.command(Command::Reset);
    }

    /// The latest published snapshot.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// A receiver that is notified whenever the state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Whether the connection is still open.
    pub fn connected(&self) -> bool {
        *self.connected.borrow()
    }

    pub fn watch_connected(&self) -> watch::Receiver<bool> {
        self.connected.clone()
    }

    /// Closes the connection and stops the driver. Safe to call repeatedly.
    pub fn shutdown(&self) {
        self.command(Command::Shutdown);
    }

    fn command(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::debug!("client shut down, dropping intent");
        }
    }
}

/// The driver state. Runs inside a Tokio task.
struct Driver {
    machine: SessionMachine,
    connection: ServerConnection,
    _subscription: Subscription<ServerMessage>,
    inbound: mpsc::UnboundedReceiver<ServerMessage>,
    commands: mpsc::UnboundedReceiver<Command>,
    ticker: TickScheduler,
    state: watch::Sender<SessionState>,
}

impl Driver {
    /// Runs until shutdown or until the client is dropped.
    async fn run(mut self) {
        let id = self.connection.id();
        tracing::info!(%id, "client driver started");

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },

                Some(message) = self.inbound.recv() => self.handle_message(message),

                tick = self.ticker.wait_for_tick() => {
                    self.machine.advance(tick.elapsed_periods());
                }
            }
            self.sync();
        }

        self.connection.close();
        tracing::info!(%id, "client driver stopped");
    }

    fn handle_command(&mut self, command: Command) {
        let outbound = match command {
            Command::JoinQueue { ranked } => self.machine.join_queue(ranked),
            Command::LeaveQueue => self.machine.leave_queue(),
            Command::SubmitChoice(choice) => self.machine.submit_choice(choice),
            Command::Reset => {
                self.machine.reset();
                None
            }
            Command::Shutdown => None,
        };
        if let Some(message) = outbound {
            self.connection.send(&message);
        }
    }

    fn handle_message(&mut self, message: ServerMessage) {
        let new_countdown = matches!(
            message,
            ServerMessage::MatchFound { .. } | ServerMessage::RoundStart { .. }
        );
        if self.machine.apply(message) && new_countdown {
            self.ticker.restart();
        }
    }

    /// Matches the ticker to the countdown and publishes the state if it
    /// changed.
    fn sync(&mut self) {
        let current = self.machine.state();
        self.ticker.set_running(current.countdown_active());
        self.state.send_if_modified(|published| {
            if published == current {
                false
            } else {
                *published = current.clone();
                true
            }
        });
    }
}
