// src/core/attacks/capture.rs
use std::time::Duration;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::{distributions::Alphanumeric, Rng};
use tokio::time::Instant;
use uuid::Uuid;

/// Packets retained before the oldest are discarded.
pub const CAPTURE_CAPACITY: usize = 256;

/// A biometric sample observed on the wire.
#[derive(Debug, Clone)]
pub struct CapturedPacket {
    pub identity_id: Uuid,
    pub embedding: Vec<f64>,
    pub nonce: String,
    pub captured_on: DateTime<Utc>,
    captured_at: Instant,
}

impl CapturedPacket {
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.captured_at)
    }
}

#[derive(Default)]
pub struct PacketCapture {
    packets: Mutex<Vec<CapturedPacket>>,
}

impl PacketCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an observed sample and returns the number of packets held.
    /// Only the newest [`CAPTURE_CAPACITY`] packets are kept.
    pub fn record(&self, identity_id: Uuid, embedding: Vec<f64>) -> usize {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(char::from)
            .collect();

        let mut packets = self.packets.lock();
        packets.push(CapturedPacket {
            identity_id,
            embedding,
            nonce,
            captured_on: Utc::now(),
            captured_at: Instant::now(),
        });
        if packets.len() > CAPTURE_CAPACITY {
            let excess = packets.len() - CAPTURE_CAPACITY;
            packets.drain(..excess);
        }
        packets.len()
    }

    /// Most recent packet captured for `identity_id`.
    pub fn latest_for(&self, identity_id: Uuid) -> Option<CapturedPacket> {
        self.packets
            .lock()
            .iter()
            .rev()
            .find(|packet| packet.identity_id == identity_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.packets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.lock().is_empty()
    }
}
