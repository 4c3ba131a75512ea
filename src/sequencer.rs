// MIT License - Copyright (c) 2026 Peter Wright
// Rust translation of the outbound request queue

use std::sync::LazyLock;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error};

use crate::codec::encode_frame;
use crate::constants::Request;
use crate::error::{ConcordError, Result};

/// Encoded equipment-list request (`02 02`, checksum `04`).
pub static EQUIPMENT_LIST_REQUEST: LazyLock<Vec<u8>> =
    LazyLock::new(|| request_frame(Request::EquipmentList));

/// Encoded dynamic-data-refresh request (`02 20`, checksum `22`).
pub static DYNAMIC_REFRESH_REQUEST: LazyLock<Vec<u8>> =
    LazyLock::new(|| request_frame(Request::DynamicDataRefresh));

/// Encode a single-byte request, length byte included.
pub fn request_frame(request: Request) -> Vec<u8> {
    encode_frame(&[0x02, request.as_u8()])
}

/// Bounded FIFO of encoded frames waiting for a quiet link.
///
/// Owned by the I/O loop. Other tasks enqueue through an [`OutboundHandle`].
#[derive(Debug)]
pub struct OutboundQueue {
    tx: mpsc::Sender<Vec<u8>>,
    rx: mpsc::Receiver<Vec<u8>>,
}

impl OutboundQueue {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self { tx, rx }
    }

    /// Place the equipment-list request at the head of the queue.
    ///
    /// Called before the link is opened so it is the first frame transmitted.
    pub fn seed(&self) -> Result<()> {
        self.enqueue(Request::EquipmentList)
    }

    /// Queue a request without waiting.
    pub fn enqueue(&self, request: Request) -> Result<()> {
        let frame = match request {
            Request::EquipmentList => EQUIPMENT_LIST_REQUEST.clone(),
            Request::DynamicDataRefresh => DYNAMIC_REFRESH_REQUEST.clone(),
        };
        self.try_enqueue_frame(frame)
    }

    /// Queue an encoded frame without waiting. A full queue is an error.
    pub fn try_enqueue_frame(&self, frame: Vec<u8>) -> Result<()> {
        match self.tx.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                error!("Outbound queue full, request dropped");
                Err(ConcordError::QueueFull)
            }
            Err(TrySendError::Closed(_)) => Err(ConcordError::ChannelClosed),
        }
    }

    /// Next frame to transmit, if any.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        self.rx.try_recv().ok()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn handle(&self) -> OutboundHandle {
        OutboundHandle {
            tx: self.tx.clone(),
        }
    }
}

/// Cloneable producer side of the outbound queue.
#[derive(Debug, Clone)]
pub struct OutboundHandle {
    tx: mpsc::Sender<Vec<u8>>,
}

impl OutboundHandle {
    /// Queue a request, waiting for capacity if the queue is full.
    pub async fn request(&self, request: Request) -> Result<()> {
        debug!("Queueing {:?} request", request);
        self.send_frame(request_frame(request)).await
    }

    /// Queue an encoded frame, waiting for capacity if the queue is full.
    pub async fn send_frame(&self, frame: Vec<u8>) -> Result<()> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| ConcordError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precomputed_frames() {
        assert_eq!(*EQUIPMENT_LIST_REQUEST, b"\n020204");
        assert_eq!(*DYNAMIC_REFRESH_REQUEST, b"\n022022");
    }

    #[test]
    fn test_seed_is_first() {
        let mut queue = OutboundQueue::new(4);
        queue.seed().unwrap();
        queue.enqueue(Request::DynamicDataRefresh).unwrap();
        assert_eq!(queue.next_frame().unwrap(), *EQUIPMENT_LIST_REQUEST);
        assert_eq!(queue.next_frame().unwrap(), *DYNAMIC_REFRESH_REQUEST);
        assert!(queue.next_frame().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_full_queue_is_reported() {
        let queue = OutboundQueue::new(1);
        queue.seed().unwrap();
        assert!(matches!(
            queue.enqueue(Request::DynamicDataRefresh),
            Err(ConcordError::QueueFull)
        ));
    }

    #[tokio::test]
    async fn test_handle_waits_for_capacity() {
        let mut queue = OutboundQueue::new(1);
        queue.seed().unwrap();
        let handle = queue.handle();

        let pending = tokio::spawn(async move { handle.request(Request::DynamicDataRefresh).await });
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        assert_eq!(queue.next_frame().unwrap(), *EQUIPMENT_LIST_REQUEST);
        pending.await.unwrap().unwrap();
        assert_eq!(queue.next_frame().unwrap(), *DYNAMIC_REFRESH_REQUEST);
    }

    #[tokio::test]
    async fn test_handle_after_queue_dropped() {
        let handle = OutboundQueue::new(1).handle();
        assert!(matches!(
            handle.request(Request::EquipmentList).await,
            Err(ConcordError::ChannelClosed)
        ));
    }
}
