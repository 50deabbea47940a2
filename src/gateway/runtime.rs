//! Runtime
//!
//! Single cooperative event loop. Console lines, broker events and poll ticks
//! are handled one at a time, each to completion, so the [`Gateway`] needs no
//! locking.
//!
//! ```text
//!   stdin thread ──GatewayEvent──┐
//!   mqtt pump ─────BrokerEvent───┼──► select! ──► Gateway
//!   tick(200 ms) ────────────────┘
//! ```

use std::io::Write;
use std::time::Duration;

use crossbeam::channel::{self, select, Receiver};

use crate::broker::{BrokerClient, BrokerEvent};
use crate::error::Result;
use crate::protocol::Response;
use crate::serial::SerialBus;

use super::Gateway;

/// Input forwarded to the runtime by helper threads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// One line typed on the console
    Console(String),
    Shutdown,
}

/// Event loop driving a [`Gateway`]
pub struct Runtime<C: BrokerClient, B: SerialBus, W: Write> {
    gateway: Gateway<C, B>,
    events: Receiver<GatewayEvent>,
    broker_events: Receiver<BrokerEvent>,
    poll_interval: Duration,
    /// Console responses are written here
    output: W,
}

impl<C: BrokerClient, B: SerialBus, W: Write> Runtime<C, B, W> {
    pub fn new(
        gateway: Gateway<C, B>,
        events: Receiver<GatewayEvent>,
        broker_events: Receiver<BrokerEvent>,
        poll_interval: Duration,
        output: W,
    ) -> Self {
        Self {
            gateway,
            events,
            broker_events,
            poll_interval,
            output,
        }
    }

    /// Run until [`GatewayEvent::Shutdown`] or until the console channel closes
    pub fn run(&mut self) -> Result<()> {
        tracing::info!("Runtime started (poll every {:?})", self.poll_interval);

        let events = self.events.clone();
        let broker_events = self.broker_events.clone();
        let closed: Receiver<BrokerEvent> = channel::never();
        let ticker = channel::tick(self.poll_interval);
        let mut broker_open = true;

        self.poll_once();

        loop {
            let broker = if broker_open { &broker_events } else { &closed };

            select! {
                recv(events) -> msg => match msg {
                    Ok(GatewayEvent::Console(line)) => self.handle_console(&line),
                    Ok(GatewayEvent::Shutdown) => {
                        tracing::info!("Shutdown requested");
                        break;
                    }
                    Err(_) => {
                        tracing::info!("Console closed");
                        break;
                    }
                },
                recv(broker) -> msg => match msg {
                    Ok(event) => self.handle_broker(event),
                    Err(_) => {
                        tracing::warn!("Broker event channel closed");
                        broker_open = false;
                    }
                },
                recv(ticker) -> _ => self.poll_once(),
            }
        }

        let stats = self.gateway.transport().stats();
        tracing::info!(
            "Runtime stopped: {} polls, {} bytes received, {} frames sent",
            stats.polls,
            stats.rx_bytes,
            stats.tx_frames
        );
        Ok(())
    }

    /// Execute a console line and print its response
    pub fn handle_console(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        tracing::debug!("console: {}", line);
        let response = Response::from_result(self.gateway.execute_line(line));
        if !response.is_ok() {
            tracing::warn!("'{}' failed: {}", line, response.render());
        }

        if let Err(e) = writeln!(self.output, "{}", response.render()).and_then(|_| self.output.flush()) {
            tracing::warn!("Failed to write console response: {}", e);
        }
    }

    pub fn handle_broker(&mut self, event: BrokerEvent) {
        if let Err(e) = self.gateway.handle_broker_event(event) {
            tracing::error!("Broker event handling failed: {}", e);
        }
    }

    /// One receive cycle; skipped while the UART is unconfigured
    pub fn poll_once(&mut self) {
        if !self.gateway.transport().is_configured() {
            return;
        }
        match self.gateway.poll_serial() {
            Ok(0) => {}
            Ok(n) => tracing::trace!("Drained {} bytes from UART", n),
            Err(e) => tracing::warn!("UART poll failed: {}", e),
        }
    }

    pub fn gateway(&self) -> &Gateway<C, B> {
        &self.gateway
    }

    pub fn output(&self) -> &W {
        &self.output
    }
}
