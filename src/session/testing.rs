//! In-memory transport for session tests

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::client::{CallError, RemoteEndpoint, ResolveError, Transport};
use crate::protocol::{PlaybackCommand, ServiceAddress};

/// How a mock host misbehaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Host process is gone (connection refused)
    Down,
    /// Host answers too late
    Timeout,
    /// Service was unbound
    Unbound,
    /// Service raised an error
    Fault,
}

/// One simulated remote service
#[derive(Default)]
pub struct MockHost {
    calls: Mutex<Vec<PlaybackCommand>>,
    failure: Mutex<Option<Failure>>,
}

impl MockHost {
    pub fn fail_with(&self, failure: Failure) {
        *self.failure.lock().unwrap() = Some(failure);
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn calls(&self) -> Vec<PlaybackCommand> {
        self.calls.lock().unwrap().clone()
    }

    fn failure(&self) -> Option<Failure> {
        *self.failure.lock().unwrap()
    }
}

#[derive(Default)]
struct Counters {
    resolves: AtomicU32,
    invokes: AtomicU32,
}

/// Transport whose hosts live in memory
#[derive(Clone, Default)]
pub struct MockTransport {
    hosts: Arc<Mutex<HashMap<ServiceAddress, Arc<MockHost>>>>,
    counters: Arc<Counters>,
}

impl MockTransport {
    /// Register (or fetch) the host at `addr` (`host:port/service`)
    pub fn host(&self, addr: &str) -> Arc<MockHost> {
        let address: ServiceAddress = addr.parse().unwrap();
        Arc::clone(self.hosts.lock().unwrap().entry(address).or_default())
    }

    pub fn resolves(&self) -> u32 {
        self.counters.resolves.load(Ordering::SeqCst)
    }

    pub fn invokes(&self) -> u32 {
        self.counters.invokes.load(Ordering::SeqCst)
    }
}

fn refused() -> io::Error {
    io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused")
}

impl Transport for MockTransport {
    type Endpoint = MockEndpoint;

    async fn resolve(&self, address: &ServiceAddress) -> Result<MockEndpoint, ResolveError> {
        self.counters.resolves.fetch_add(1, Ordering::SeqCst);

        let host = self
            .hosts
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .ok_or_else(|| ResolveError::NotBound(address.service_name().to_string()))?;

        match host.failure() {
            Some(Failure::Down) => Err(ResolveError::Transport(refused())),
            Some(Failure::Timeout) => Err(ResolveError::Timeout(Duration::from_secs(1))),
            Some(Failure::Unbound) => Err(ResolveError::NotBound(
                address.service_name().to_string(),
            )),
            Some(Failure::Fault) | None => Ok(MockEndpoint {
                address: address.clone(),
                host,
                counters: Arc::clone(&self.counters),
            }),
        }
    }

    async fn list(&self, hostname: &str, port: u16) -> Result<Vec<String>, ResolveError> {
        let mut names: Vec<String> = self
            .hosts
            .lock()
            .unwrap()
            .keys()
            .filter(|a| a.hostname() == hostname && a.port() == port)
            .map(|a| a.service_name().to_string())
            .collect();
        names.sort();
        Ok(names)
    }
}

pub struct MockEndpoint {
    address: ServiceAddress,
    host: Arc<MockHost>,
    counters: Arc<Counters>,
}

impl RemoteEndpoint for MockEndpoint {
    fn address(&self) -> &ServiceAddress {
        &self.address
    }

    async fn invoke(&self, command: PlaybackCommand) -> Result<(), CallError> {
        self.counters.invokes.fetch_add(1, Ordering::SeqCst);

        match self.host.failure() {
            Some(Failure::Down) => Err(CallError::Transport(refused())),
            Some(Failure::Timeout) => Err(CallError::Timeout(Duration::from_secs(1))),
            Some(Failure::Unbound) => Err(CallError::NotBound(
                self.address.service_name().to_string(),
            )),
            Some(Failure::Fault) => Err(CallError::Remote("player exploded".into())),
            None => {
                self.host.calls.lock().unwrap().push(command);
                Ok(())
            }
        }
    }
}
