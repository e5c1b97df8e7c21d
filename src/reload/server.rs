//! WebSocket server for live reload.
//!
//! Plain-text protocol over one long-lived socket per browser tab:
//! - client → server: the page path it is viewing (heartbeat, every second)
//! - server → client: a page path to reload (clients ignore other paths)
//!
//! Sockets live on std threads (acceptor + poller, like the HTTP server);
//! heartbeats are bridged into a `tokio::sync::broadcast` channel that pages
//! subscribe to.

use std::{
    io::ErrorKind,
    net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener, TcpStream},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use anyhow::Result;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tungstenite::{WebSocket, protocol::Message};

use crate::{core::RoutePath, debug, log};

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Poll interval for accepting and reading clients
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Heartbeats buffered per subscriber before lagging
const HEARTBEAT_CAPACITY: usize = 256;

/// A connected browser tab
struct Client {
    ws: WebSocket<TcpStream>,
    addr: SocketAddr,
}

/// Shared publish/subscribe socket for all pages.
pub struct LiveReloadChannel {
    port: u16,
    clients: Arc<Mutex<Vec<Client>>>,
    heartbeats: broadcast::Sender<RoutePath>,
    shutdown: Arc<AtomicBool>,
}

impl std::fmt::Debug for LiveReloadChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveReloadChannel")
            .field("port", &self.port)
            .field("clients", &self.client_count())
            .finish()
    }
}

impl LiveReloadChannel {
    /// Bind `127.0.0.1:<base_port>` (retrying higher ports) and start serving.
    pub fn start(base_port: u16) -> Result<Arc<Self>> {
        let (listener, port) =
            try_bind_port(IpAddr::V4(Ipv4Addr::LOCALHOST), base_port, MAX_PORT_RETRIES)?;
        listener.set_nonblocking(true)?;

        if port != base_port && base_port != 0 {
            log!("reload"; "port {} in use, using {} instead", base_port, port);
        }

        let (heartbeats, _) = broadcast::channel(HEARTBEAT_CAPACITY);
        let channel = Arc::new(Self {
            port,
            clients: Arc::new(Mutex::new(Vec::new())),
            heartbeats,
            shutdown: Arc::new(AtomicBool::new(false)),
        });

        let clients = Arc::clone(&channel.clients);
        let shutdown = Arc::clone(&channel.shutdown);
        thread::spawn(move || accept_loop(&listener, &clients, &shutdown));

        let clients = Arc::clone(&channel.clients);
        let shutdown = Arc::clone(&channel.shutdown);
        let heartbeats = channel.heartbeats.clone();
        thread::spawn(move || poll_loop(&clients, &heartbeats, &shutdown));

        debug!("reload"; "ws://127.0.0.1:{}", port);
        Ok(channel)
    }

    /// The actually bound port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Receive the route of every heartbeat from any client.
    pub fn subscribe(&self) -> broadcast::Receiver<RoutePath> {
        self.heartbeats.subscribe()
    }

    /// Sender side of the heartbeat bus, for handing to pages.
    pub fn heartbeat_sender(&self) -> broadcast::Sender<RoutePath> {
        self.heartbeats.clone()
    }

    /// Push a reload notice for `route` to every client.
    ///
    /// Clients that fail to receive it are dropped. Returns the number reached.
    pub fn notify(&self, route: &RoutePath) -> usize {
        let msg = Message::Text(route.to_string().into());
        let mut clients = self.clients.lock();

        clients.retain_mut(|client| match client.ws.send(msg.clone()) {
            Ok(()) => true,
            Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => {
                // Queued in the write buffer, flushed on the next poll
                true
            }
            Err(e) => {
                debug!("reload"; "client {} dropped: {}", client.addr, e);
                false
            }
        });

        debug!("reload"; "reload {} sent to {} clients", route, clients.len());
        clients.len()
    }

    /// Number of connected clients.
    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    /// Stop accepting and close every client.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let mut clients = self.clients.lock();
        for mut client in clients.drain(..) {
            let _ = client.ws.close(None);
            let _ = client.ws.flush();
        }
    }
}

impl Drop for LiveReloadChannel {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

// =============================================================================
// Threads
// =============================================================================

fn accept_loop(listener: &TcpListener, clients: &Mutex<Vec<Client>>, shutdown: &AtomicBool) {
    while !shutdown.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, addr)) => {
                // Blocking handshake, non-blocking reads afterwards
                let _ = stream.set_nonblocking(false);
                match tungstenite::accept(stream) {
                    Ok(ws) => {
                        let _ = ws.get_ref().set_nonblocking(true);
                        let mut clients = clients.lock();
                        clients.push(Client { ws, addr });
                        debug!("reload"; "client connected: {} (total: {})", addr, clients.len());
                    }
                    Err(e) => debug!("reload"; "handshake failed: {}", e),
                }
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                log!("reload"; "accept error: {}", e);
                thread::sleep(POLL_INTERVAL);
            }
        }
    }
}

fn poll_loop(
    clients: &Mutex<Vec<Client>>,
    heartbeats: &broadcast::Sender<RoutePath>,
    shutdown: &AtomicBool,
) {
    while !shutdown.load(Ordering::SeqCst) {
        thread::sleep(POLL_INTERVAL);

        let mut clients = clients.lock();
        clients.retain_mut(|client| loop {
            match client.ws.read() {
                Ok(Message::Text(text)) => {
                    if let Some(route) = parse_heartbeat(text.as_str()) {
                        // No subscribers is fine
                        let _ = heartbeats.send(route);
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("reload"; "client closed: {}", client.addr);
                    break false;
                }
                Ok(_) => {}
                Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => {
                    // Drain, then flush pongs and queued notices
                    break match client.ws.flush() {
                        Ok(()) => true,
                        Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => {
                            true
                        }
                        Err(_) => false,
                    };
                }
                Err(e) => {
                    debug!("reload"; "client {} disconnected: {}", client.addr, e);
                    break false;
                }
            }
        });
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Parse a heartbeat body into a route. Empty or non-path bodies are ignored.
pub(crate) fn parse_heartbeat(text: &str) -> Option<RoutePath> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }
    Some(RoutePath::from_browser(text))
}

/// Try binding to port, retry with incremented port if in use
pub(crate) fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind WebSocket server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
