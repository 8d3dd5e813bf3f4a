//! In-memory link device for host tests
//!
//! Frames pushed through the handle are handed out by `receive()` in order;
//! every transmitted frame is recorded for inspection.

use super::netdev::{LinkDevice, NetworkError};
use crate::net::ethernet::MacAddress;
use alloc::collections::VecDeque;
use alloc::sync::Arc;
use alloc::vec::Vec;
use spin::Mutex;

#[derive(Default)]
struct QueueState {
    rx: VecDeque<Vec<u8>>,
    tx: Vec<Vec<u8>>,
    fail_tx: bool,
    receive_calls: usize,
}

/// Link device backed by two in-memory queues
pub struct QueueDevice {
    mac: MacAddress,
    state: Arc<Mutex<QueueState>>,
}

/// Test-side handle onto a `QueueDevice`
#[derive(Clone)]
pub struct QueueHandle {
    state: Arc<Mutex<QueueState>>,
}

impl QueueDevice {
    pub fn new(mac: MacAddress) -> (Self, QueueHandle) {
        let state = Arc::new(Mutex::new(QueueState::default()));
        (
            Self {
                mac,
                state: state.clone(),
            },
            QueueHandle { state },
        )
    }
}

impl QueueHandle {
    /// Queue a frame for the next `receive()`
    pub fn push_rx(&self, frame: Vec<u8>) {
        self.state.lock().rx.push_back(frame);
    }

    /// Frames transmitted so far
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state.lock().tx.clone()
    }

    /// Make every following `transmit()` fail with `HardwareError`
    pub fn fail_transmit(&self) {
        self.state.lock().fail_tx = true;
    }

    /// Number of `receive()` calls made by the stack
    pub fn receive_calls(&self) -> usize {
        self.state.lock().receive_calls
    }
}

impl LinkDevice for QueueDevice {
    fn transmit(&mut self, frame: &[u8]) -> Result<(), NetworkError> {
        let mut state = self.state.lock();
        if state.fail_tx {
            return Err(NetworkError::HardwareError);
        }
        state.tx.push(frame.to_vec());
        Ok(())
    }

    fn receive(&mut self, buffer: &mut [u8]) -> Result<usize, NetworkError> {
        let mut state = self.state.lock();
        state.receive_calls += 1;
        match state.rx.pop_front() {
            Some(frame) if frame.len() > buffer.len() => Err(NetworkError::BufferTooSmall),
            Some(frame) => {
                buffer[..frame.len()].copy_from_slice(&frame);
                Ok(frame.len())
            }
            None => Ok(0),
        }
    }

    fn mac_address(&self) -> MacAddress {
        self.mac
    }
}
