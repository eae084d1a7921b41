//! An in-process stand-in for an ETH relay module.
//!
//! [`SimulatedModule`] answers the implemented subset of the command table
//! the way the hardware does. It can be driven in memory through
//! [`pair`] or served over TCP with [`SimulatorServer`].

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use bytes::BytesMut;
use ethrelay_frame::{
    opcode_name, MAX_CHANNELS, GET_MODULE_INFO, GET_RELAY_STATE, GET_UNLOCK_TIME, LOG_OUT,
    SEND_PASSWORD, SET_RELAY_OFF, SET_RELAY_ON, SET_RELAY_STATE,
};
use ethrelay_transport::Transport;
use tracing::{debug, info, warn};

use crate::module::ModuleProfile;

/// Seconds reported by `get_unlock_time` once a password has been accepted.
const RELOCK_SECS: u8 = 30;

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Device-side state of one simulated module.
#[derive(Debug, Clone)]
pub struct SimulatedModule {
    model_id: u8,
    hardware_version: u8,
    firmware_version: u8,
    relay_count: usize,
    password: Option<Vec<u8>>,
    unlocked: bool,
    relays: [u8; 3],
    fail_writes: bool,
    requests: Vec<Vec<u8>>,
}

impl SimulatedModule {
    /// A module reporting `model_id`. Unknown ids get zero relays.
    pub fn new(model_id: u8) -> Self {
        let relay_count = ModuleProfile::lookup(model_id)
            .map(|p| p.relay_count)
            .unwrap_or(0);
        Self {
            model_id,
            hardware_version: 1,
            firmware_version: 4,
            relay_count,
            password: None,
            unlocked: false,
            relays: [0; 3],
            fail_writes: false,
            requests: Vec::new(),
        }
    }

    pub fn with_password(mut self, password: impl AsRef<[u8]>) -> Self {
        self.password = Some(password.as_ref().to_vec());
        self
    }

    pub fn with_versions(mut self, hardware: u8, firmware: u8) -> Self {
        self.hardware_version = hardware;
        self.firmware_version = firmware;
        self
    }

    /// Initial relay bit vector.
    pub fn with_relays(mut self, bits: [u8; 3]) -> Self {
        self.relays = self.mask(bits);
        self
    }

    /// Make every set command answer with the failure flag.
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Change relay state behind the client's back.
    pub fn set_relays(&mut self, bits: [u8; 3]) {
        self.relays = self.mask(bits);
    }

    pub fn relays(&self) -> [u8; 3] {
        self.relays
    }

    /// Every request received so far, opcode first.
    pub fn requests(&self) -> &[Vec<u8>] {
        &self.requests
    }

    pub fn is_unlocked(&self) -> bool {
        self.password.is_none() || self.unlocked
    }

    /// Reset per-connection state; the hardware relocks on a fresh socket.
    pub fn on_connect(&mut self) {
        self.unlocked = false;
    }

    /// Consume one request from `input` and produce its response.
    ///
    /// Returns `None` if `input` does not yet hold a complete request. An
    /// unrecognised opcode is consumed and answered with nothing.
    pub fn handle(&mut self, input: &mut BytesMut) -> Option<Vec<u8>> {
        let opcode = *input.first()?;
        let payload_len = match opcode {
            SET_RELAY_ON | SET_RELAY_OFF => 2,
            SET_RELAY_STATE => 3,
            // Password length is implied by the size of the write.
            SEND_PASSWORD => input.len() - 1,
            _ => 0,
        };
        if input.len() < 1 + payload_len {
            return None;
        }

        let request = input.split_to(1 + payload_len);
        self.requests.push(request.to_vec());
        let payload = &request[1..];
        debug!(opcode = opcode_name(opcode), "simulator request");

        let response = match opcode {
            GET_UNLOCK_TIME => vec![match (&self.password, self.unlocked) {
                (None, _) => 255,
                (Some(_), false) => 0,
                (Some(_), true) => RELOCK_SECS,
            }],
            SEND_PASSWORD => {
                let accepted = self.password.as_deref().is_none_or(|pw| pw == payload);
                if accepted {
                    self.unlocked = true;
                    vec![2]
                } else {
                    vec![1]
                }
            }
            LOG_OUT => {
                self.unlocked = false;
                vec![1]
            }
            _ if !self.is_unlocked() => {
                warn!(opcode = opcode_name(opcode), "request while locked");
                let len = match opcode {
                    GET_MODULE_INFO | GET_RELAY_STATE => 3,
                    SET_RELAY_ON | SET_RELAY_OFF | SET_RELAY_STATE => 1,
                    _ => 0,
                };
                vec![0; len]
            }
            GET_MODULE_INFO => vec![self.model_id, self.hardware_version, self.firmware_version],
            GET_RELAY_STATE => self.relays.to_vec(),
            SET_RELAY_STATE => {
                if self.fail_writes {
                    vec![0]
                } else {
                    self.relays = self.mask([payload[0], payload[1], payload[2]]);
                    vec![1]
                }
            }
            SET_RELAY_ON | SET_RELAY_OFF => {
                let (channel, pulse) = (usize::from(payload[0]), payload[1]);
                if self.fail_writes || channel == 0 || channel > self.relay_count {
                    vec![0]
                } else {
                    let on = opcode == SET_RELAY_ON;
                    // A pulse has always already elapsed here, leaving the
                    // relay in the opposite state.
                    let end_state = if pulse == 0 { on } else { !on };
                    let (byte, bit) = ((channel - 1) / 8, (channel - 1) % 8);
                    if end_state {
                        self.relays[byte] |= 1 << bit;
                    } else {
                        self.relays[byte] &= !(1 << bit);
                    }
                    vec![1]
                }
            }
            _ => Vec::new(),
        };
        Some(response)
    }

    fn mask(&self, bits: [u8; 3]) -> [u8; 3] {
        let count = self.relay_count.min(MAX_CHANNELS);
        let mask = if count == 0 { 0 } else { u32::MAX >> (32 - count) };
        let value = u32::from_le_bytes([bits[0], bits[1], bits[2], 0]) & mask;
        let [b0, b1, b2, _] = value.to_le_bytes();
        [b0, b1, b2]
    }
}

struct Shared {
    module: SimulatedModule,
    inbound: BytesMut,
    outbound: VecDeque<u8>,
    written: Vec<u8>,
    closed: bool,
}

/// Client end of an in-memory connection to a [`SimulatedModule`].
///
/// Reading past the last response returns EOF, which the client sees as the
/// module closing the connection.
pub struct SimulatedStream {
    shared: Arc<Mutex<Shared>>,
}

/// Inspection handle for the module behind a [`SimulatedStream`].
#[derive(Clone)]
pub struct SimulatorHandle {
    shared: Arc<Mutex<Shared>>,
}

/// Connect a fresh in-memory stream to `module`.
pub fn pair(mut module: SimulatedModule) -> (SimulatedStream, SimulatorHandle) {
    module.on_connect();
    let shared = Arc::new(Mutex::new(Shared {
        module,
        inbound: BytesMut::new(),
        outbound: VecDeque::new(),
        written: Vec::new(),
        closed: false,
    }));
    (
        SimulatedStream {
            shared: shared.clone(),
        },
        SimulatorHandle { shared },
    )
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    // A panicking test thread must not hide the state from the assertions.
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Read for SimulatedStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut shared = lock(&self.shared);
        let n = buf.len().min(shared.outbound.len());
        for (slot, byte) in buf.iter_mut().zip(shared.outbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for SimulatedStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut shared = lock(&self.shared);
        if shared.closed {
            return Err(std::io::Error::new(
                ErrorKind::BrokenPipe,
                "simulated stream closed",
            ));
        }
        shared.written.extend_from_slice(buf);
        shared.inbound.extend_from_slice(buf);

        let Shared {
            module,
            inbound,
            outbound,
            ..
        } = &mut *shared;
        while let Some(response) = module.handle(inbound) {
            outbound.extend(response);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Transport for SimulatedStream {
    fn close(&mut self) -> std::io::Result<()> {
        lock(&self.shared).closed = true;
        Ok(())
    }

    fn peer_endpoint(&self) -> String {
        "simulator".to_string()
    }
}

impl SimulatorHandle {
    /// Every byte the client has written, in order.
    pub fn written(&self) -> Vec<u8> {
        lock(&self.shared).written.clone()
    }

    /// Requests parsed by the module, opcode first.
    pub fn requests(&self) -> Vec<Vec<u8>> {
        lock(&self.shared).module.requests().to_vec()
    }

    /// Opcodes of every parsed request.
    pub fn opcodes(&self) -> Vec<u8> {
        lock(&self.shared)
            .module
            .requests()
            .iter()
            .map(|r| r[0])
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.shared).closed
    }

    pub fn relays(&self) -> [u8; 3] {
        lock(&self.shared).module.relays()
    }

    pub fn set_relays(&self, bits: [u8; 3]) {
        lock(&self.shared).module.set_relays(bits);
    }

    pub fn fail_writes(&self, fail: bool) {
        lock(&self.shared).module.fail_writes(fail);
    }
}

/// Serves a [`SimulatedModule`] to TCP clients, one connection at a time.
pub struct SimulatorServer {
    listener: TcpListener,
    module: SimulatedModule,
}

impl SimulatorServer {
    pub fn bind(addr: impl ToSocketAddrs, module: SimulatedModule) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        info!(addr = ?listener.local_addr().ok(), model = module.model_id, "simulator listening");
        Ok(Self { listener, module })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Module state as left by the last connection.
    pub fn module(&self) -> &SimulatedModule {
        &self.module
    }

    /// Accept one client and serve it until it disconnects.
    pub fn serve_one(&mut self) -> std::io::Result<()> {
        let (stream, peer) = self.listener.accept()?;
        debug!(%peer, "simulator accepted connection");
        self.serve_connection(stream)
    }

    /// Serve clients until `running` is cleared.
    pub fn run(&mut self, running: &AtomicBool) -> std::io::Result<()> {
        self.listener.set_nonblocking(true)?;
        while running.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    debug!(%peer, "simulator accepted connection");
                    stream.set_nonblocking(false)?;
                    if let Err(err) = self.serve_connection(stream) {
                        warn!(%peer, error = %err, "simulated connection ended with error");
                    }
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    std::thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn serve_connection(&mut self, mut stream: TcpStream) -> std::io::Result<()> {
        self.module.on_connect();
        let mut inbound = BytesMut::new();
        let mut chunk = [0u8; 256];
        loop {
            let read = match stream.read(&mut chunk) {
                Ok(0) => return Ok(()),
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::ConnectionReset => return Ok(()),
                Err(err) => return Err(err),
            };
            inbound.extend_from_slice(&chunk[..read]);
            while let Some(response) = self.module.handle(&mut inbound) {
                if !response.is_empty() {
                    stream.write_all(&response)?;
                }
            }
        }
    }
}
