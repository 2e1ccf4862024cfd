//! CGT engine client
//!
//! This crate provides a client that drives a combinatorial game theory
//! engine through line-delimited JSON over the stdio of a spawned process.
//!
//! Each call is one exchange: exactly one request line out, one response
//! line in. A session serves one call at a time; run several sessions for
//! concurrent queries.

pub mod protocol;

pub use cgt_core::{
    CgtError, DomineeringRequest, EngineConfig, EngineFailure, GameValue, ProtocolVersion,
    Request, Result, SnortRequest, Temperature, VertexColor, VertexColoring,
};
pub use cgt_transport::{LineChannel, ProcessTransport, Transport};

use std::fmt;
use tracing::{debug, info};

/// Lifecycle of a client session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Engine not started yet
    Unopened,
    /// Engine running and ready for requests
    Open,
    /// Session ended, no reopening
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Unopened => write!(f, "unopened"),
            SessionState::Open => write!(f, "open"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

enum Session<T> {
    Unopened,
    Open(T),
    Closed,
}

/// Client for a CGT engine session
pub struct CgtClient<T: Transport = ProcessTransport> {
    config: EngineConfig,
    session: Session<T>,
}

impl CgtClient<ProcessTransport> {
    /// Create a client for the engine described by `config` without starting it
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            session: Session::Unopened,
        }
    }

    /// Create a client and start the engine
    pub async fn spawn(config: EngineConfig) -> Result<Self> {
        let mut client = Self::new(config);
        client.open().await?;
        Ok(client)
    }

    /// Start the engine process. Only valid on an unopened session.
    pub async fn open(&mut self) -> Result<()> {
        if !matches!(self.session, Session::Unopened) {
            return Err(CgtError::InvalidState(self.state().to_string()));
        }

        let transport = ProcessTransport::open(&self.config).await?;
        info!(
            "Session open (protocol {}, engine {})",
            self.config.protocol,
            self.config.program.display()
        );
        self.session = Session::Open(transport);
        Ok(())
    }

    /// Recent engine stderr lines while the session is open
    pub fn stderr_tail(&self) -> Vec<String> {
        self.transport()
            .map(ProcessTransport::stderr_tail)
            .unwrap_or_default()
    }
}

impl<T: Transport> CgtClient<T> {
    /// Open session over an already connected transport
    pub fn with_transport(transport: T, protocol: ProtocolVersion) -> Self {
        Self {
            config: EngineConfig::default().with_protocol(protocol),
            session: Session::Open(transport),
        }
    }

    pub fn state(&self) -> SessionState {
        match self.session {
            Session::Unopened => SessionState::Unopened,
            Session::Open(_) => SessionState::Open,
            Session::Closed => SessionState::Closed,
        }
    }

    pub fn protocol(&self) -> ProtocolVersion {
        self.config.protocol
    }

    /// The live transport, if the session is open
    pub fn transport(&self) -> Option<&T> {
        match &self.session {
            Session::Open(transport) => Some(transport),
            _ => None,
        }
    }

    /// Evaluate a Domineering position
    pub async fn domineering(&mut self, request: &DomineeringRequest) -> Result<GameValue> {
        let protocol = self.protocol();
        let transport = self.open_transport()?;
        let line = protocol::encode_domineering(protocol, request)?;
        exchange(transport, &line).await
    }

    /// Evaluate a Snort position
    pub async fn snort(&mut self, request: &SnortRequest) -> Result<GameValue> {
        let protocol = self.protocol();
        let transport = self.open_transport()?;
        let line = protocol::encode_snort(protocol, request)?;
        exchange(transport, &line).await
    }

    /// Evaluate any supported request
    pub async fn request(&mut self, request: &Request) -> Result<GameValue> {
        let protocol = self.protocol();
        let transport = self.open_transport()?;
        let line = protocol::encode_request(protocol, request)?;
        exchange(transport, &line).await
    }

    /// End the session and reclaim the engine
    pub async fn close(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.session, Session::Closed) {
            Session::Open(mut transport) => {
                transport.close().await?;
                info!("Session closed");
                Ok(())
            }
            Session::Unopened => Ok(()),
            Session::Closed => Err(CgtError::InvalidState(SessionState::Closed.to_string())),
        }
    }

    fn open_transport(&mut self) -> Result<&mut T> {
        let state = self.state();
        match &mut self.session {
            Session::Open(transport) => Ok(transport),
            _ => Err(CgtError::InvalidState(state.to_string())),
        }
    }
}

/// One request line out, one response line in
async fn exchange<T: Transport>(transport: &mut T, line: &[u8]) -> Result<GameValue> {
    transport.send_line(line).await?;
    let response = transport.receive_line().await?;
    let value = protocol::decode_response(&response)?;
    debug!("Engine value: {}", value);
    Ok(value)
}
