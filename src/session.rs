// MIT License - Copyright (c) 2026 Peter Wright
// Rust translation of the serial I/O loop

use std::sync::{Arc, OnceLock};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, WriteHalf};
use tokio::sync::{RwLock, watch};
use tracing::{debug, error, info, warn};

use crate::codec::{Decoded, FrameDecoder};
use crate::config::ClientConfig;
use crate::constants::{Command, UNNAMED_ZONE, ZoneStatusSubCommand};
use crate::devices::identity::PanelIdentity;
use crate::devices::zone::{Zone, ZoneKind, ZoneRegistry};
use crate::error::{ConcordError, Result};
use crate::event::{EventSender, PanelEvent};
use crate::sequencer::{DYNAMIC_REFRESH_REQUEST, OutboundQueue};
use crate::tokens::TokenTable;

/// Progress of the startup handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Waiting for the panel to identify itself
    Handshaking,
    /// Panel identified, equipment list streaming in
    Enumerating,
    /// Equipment list complete, live status updates requested
    Live,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Handshaking => "handshaking",
            Self::Enumerating => "enumerating",
            Self::Live => "live",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A frame waiting on the quiet link.
#[derive(Debug)]
enum Outbound {
    Queued(Vec<u8>),
    /// The dynamic refresh that completes the handshake.
    Refresh,
}

/// The single task that owns the serial link.
///
/// Each iteration makes one read attempt. Frames are validated, acknowledged
/// and dispatched; only when the link is quiet is a queued request written.
pub struct IoLoop {
    decoder: FrameDecoder,
    queue: OutboundQueue,
    registry: Arc<RwLock<ZoneRegistry>>,
    identity: Arc<OnceLock<PanelIdentity>>,
    state: watch::Sender<SessionState>,
    events: EventSender,
    events_dropped: bool,
    tokens: Arc<TokenTable>,
    shutdown: watch::Receiver<bool>,
    max_io_errors: u32,
    /// Frame being written; kept until `write_all` and `flush` both succeed.
    in_flight: Option<Outbound>,
    /// Dynamic refresh owed after the equipment list completed.
    refresh_pending: bool,
}

impl IoLoop {
    pub fn new(
        config: &ClientConfig,
        queue: OutboundQueue,
        events: EventSender,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Handshaking);
        Self {
            decoder: FrameDecoder::new(config.read_timeout),
            queue,
            registry: Arc::new(RwLock::new(ZoneRegistry::new())),
            identity: Arc::new(OnceLock::new()),
            state,
            events,
            events_dropped: false,
            tokens: config.tokens.clone(),
            shutdown,
            max_io_errors: config.max_consecutive_io_errors.max(1),
            in_flight: None,
            refresh_pending: false,
        }
    }

    pub fn registry(&self) -> Arc<RwLock<ZoneRegistry>> {
        self.registry.clone()
    }

    pub fn identity(&self) -> Arc<OnceLock<PanelIdentity>> {
        self.identity.clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Run until shutdown is requested or the link is lost.
    pub async fn run<S>(mut self, stream: S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (mut reader, mut writer) = tokio::io::split(stream);
        let mut io_errors = 0u32;

        loop {
            if *self.shutdown.borrow() {
                info!("I/O loop stopping");
                return Ok(());
            }

            let step = match self.decoder.decode(&mut reader, &mut writer).await {
                Ok(Decoded::Frame(payload)) => {
                    self.dispatch(&payload).await;
                    Ok(())
                }
                Ok(Decoded::Idle) => self.write_pending(&mut writer).await,
                Ok(Decoded::Noise(byte)) => {
                    debug!("No SOM, discarding {:02X}", byte);
                    Ok(())
                }
                Ok(Decoded::Rejected(reason)) => {
                    warn!("---> {}, NAK sent", reason.description());
                    Ok(())
                }
                Ok(Decoded::Incomplete) => {
                    debug!("Link went quiet mid-frame, discarding partial frame");
                    Ok(())
                }
                Err(e) => Err(e),
            };

            match step {
                Ok(()) => io_errors = 0,
                Err(e) => {
                    io_errors += 1;
                    error!(
                        "Serial I/O error ({}/{}): {}",
                        io_errors, self.max_io_errors, e
                    );
                    if io_errors >= self.max_io_errors {
                        error!("Serial link lost");
                        return Err(ConcordError::LinkLost { errors: io_errors });
                    }
                    tokio::time::sleep(self.decoder.poll_timeout()).await;
                }
            }
        }
    }

    /// Write one outbound frame while the link is quiet.
    ///
    /// A frame that fails to write stays in flight and is retried on the next
    /// quiet poll. Queued requests go out before the owed dynamic refresh.
    async fn write_pending<S>(&mut self, writer: &mut WriteHalf<S>) -> std::io::Result<()>
    where
        S: AsyncWrite,
    {
        if self.in_flight.is_none() {
            self.in_flight = match self.queue.next_frame() {
                Some(frame) => Some(Outbound::Queued(frame)),
                None if std::mem::take(&mut self.refresh_pending) => Some(Outbound::Refresh),
                None => None,
            };
        }
        let frame: &[u8] = match &self.in_flight {
            Some(Outbound::Queued(frame)) => frame.as_slice(),
            Some(Outbound::Refresh) => DYNAMIC_REFRESH_REQUEST.as_slice(),
            None => return Ok(()),
        };
        debug!("W: {:02X?}", frame);
        writer.write_all(frame).await?;
        writer.flush().await?;

        if let Some(Outbound::Refresh) = self.in_flight.take() {
            self.set_state(SessionState::Live);
        }
        Ok(())
    }

    async fn dispatch(&mut self, payload: &[u8]) {
        let Some(&code) = payload.first() else {
            debug!("Empty frame");
            return;
        };
        let Some(command) = Command::from_u8(code) else {
            debug!("? {:02X?}", payload);
            return;
        };
        if payload.len() < command.min_len() {
            warn!(
                "{:?} frame too short ({} bytes, need {})",
                command,
                payload.len(),
                command.min_len()
            );
            return;
        }

        match command {
            Command::PanelType => self.on_panel_type(payload).await,
            Command::ZoneData => self.on_zone_data(payload).await,
            Command::ZoneStatus => self.on_zone_status(payload).await,
            Command::EquipmentListDone => self.on_equipment_list_done().await,
            Command::ZoneStatusEx => self.on_zone_status_ex(payload),
            other => debug!("Ignoring {:?}: {:02X?}", other, payload),
        }
    }

    async fn on_panel_type(&mut self, payload: &[u8]) {
        let Some(identity) = PanelIdentity::decode(payload) else {
            return;
        };
        if self.identity.set(identity.clone()).is_err() {
            debug!("Panel identity already known, ignoring repeat");
            return;
        }

        info!(
            "Panel Type: {} ({:#04x}), hw={}, sw={}, serial={}",
            identity.panel_type,
            identity.panel_type.as_u8(),
            identity.hardware_version,
            identity.software_version,
            identity.serial_number
        );
        if *self.state.borrow() == SessionState::Handshaking {
            self.set_state(SessionState::Enumerating);
        }
        self.emit(PanelEvent::PanelDefined(identity)).await;
    }

    async fn on_zone_data(&mut self, payload: &[u8]) {
        let &[_, partition, area, group, id_hi, id_lo, kind, status, ref name_tokens @ ..] =
            payload
        else {
            return;
        };
        let id = u32::from(u16::from_be_bytes([id_hi, id_lo]));
        let name = if name_tokens.is_empty() {
            UNNAMED_ZONE.to_string()
        } else {
            self.tokens.decode(name_tokens)
        };

        let mut zone = Zone::new(id, name, status);
        zone.partition = partition;
        zone.area = area;
        zone.group = group;
        zone.kind = ZoneKind::from_u8(kind);

        let zone = self.registry.write().await.define(zone);
        info!("Zone List: {}: {}, status={}", zone.id, zone.name, zone.status);
        self.emit(PanelEvent::ZoneDefined(zone)).await;
    }

    async fn on_zone_status(&mut self, payload: &[u8]) {
        let &[_, partition, area, id_hi, id_lo, status, ..] = payload else {
            return;
        };
        let id = u32::from(u16::from_be_bytes([id_hi, id_lo]));

        let updated = self.registry.write().await.update_status(id, status);
        let Some((zone, previous_status)) = updated else {
            warn!(
                "Zone Status: UNSOL zone={}, status={}, part={}, area={}",
                id, status, partition, area
            );
            return;
        };

        info!(
            "Zone Status: {}, zone={}, old={}, new={}",
            zone.name, zone.id, previous_status, zone.status
        );
        self.emit(PanelEvent::ZoneUpdated {
            zone,
            previous_status,
        })
        .await;
    }

    async fn on_equipment_list_done(&mut self) {
        let zones = self.registry.read().await.len();
        info!("Equipment list complete ({} zones), requesting live updates", zones);
        self.refresh_pending = true;
    }

    fn on_zone_status_ex(&self, payload: &[u8]) {
        match ZoneStatusSubCommand::from_u8(payload[1]) {
            Some(ZoneStatusSubCommand::SirenSynchronize) => debug!("-> Siren Synchronize"),
            Some(ZoneStatusSubCommand::TouchpadDisplay) => {
                if let &[_, _, partition, area, message_type, ref text @ ..] = payload {
                    debug!(
                        "-> Touchpad Display: part={}, area={}, type={}, text={}",
                        partition,
                        area,
                        message_type,
                        self.tokens.decode(text)
                    );
                } else {
                    warn!("Touchpad display frame too short: {:02X?}", payload);
                }
            }
            None => debug!("ZS? {:02X?}", payload),
        }
    }

    fn set_state(&self, state: SessionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            info!("Session state: {} -> {}", previous, state);
        }
    }

    /// Deliver an event, waiting for the consumer if the channel is full.
    async fn emit(&mut self, event: PanelEvent) {
        if self.events_dropped {
            return;
        }
        let delivered = tokio::select! {
            sent = self.events.send(event) => sent.is_ok(),
            _ = self.shutdown.wait_for(|stop| *stop) => true,
        };
        if !delivered {
            debug!("Event receiver dropped, discarding events");
            self.events_dropped = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, DuplexStream, ReadBuf};
    use tokio::task::JoinHandle;
    use tokio::time::timeout;

    use super::*;
    use crate::codec::encode_payload;
    use crate::constants::{ACK, NAK};
    use crate::event::{EventReceiver, event_channel};
    use crate::sequencer::{DYNAMIC_REFRESH_REQUEST, EQUIPMENT_LIST_REQUEST};

    const POLL: Duration = Duration::from_millis(20);
    const WAIT: Duration = Duration::from_secs(2);

    const PANEL_TYPE: [u8; 10] = [0x01, 0x14, 0x07, 0x01, 0x40, 0x92, 0x01, 0x45, 0x10, 0x76];

    struct Harness {
        panel: DuplexStream,
        events: EventReceiver,
        shutdown: watch::Sender<bool>,
        registry: Arc<RwLock<ZoneRegistry>>,
        identity: Arc<OnceLock<PanelIdentity>>,
        state: watch::Receiver<SessionState>,
        task: JoinHandle<Result<()>>,
    }

    impl Harness {
        fn start(config: ClientConfig) -> Self {
            Self::start_with(config, |link| link)
        }

        /// Start the loop on a link wrapped around the loop's end of the pipe.
        fn start_with<L, F>(config: ClientConfig, wrap: F) -> Self
        where
            F: FnOnce(DuplexStream) -> L,
            L: AsyncRead + AsyncWrite + Send + 'static,
        {
            let queue = OutboundQueue::new(config.outbound_capacity);
            queue.seed().unwrap();
            let (event_tx, events) = event_channel(config.event_capacity);
            let (shutdown, shutdown_rx) = watch::channel(false);
            let io_loop = IoLoop::new(&config, queue, event_tx, shutdown_rx);
            let registry = io_loop.registry();
            let identity = io_loop.identity();
            let state = io_loop.watch_state();
            let (panel, link) = tokio::io::duplex(4096);
            let task = tokio::spawn(io_loop.run(wrap(link)));
            Self {
                panel,
                events,
                shutdown,
                registry,
                identity,
                state,
                task,
            }
        }

        fn default_config() -> ClientConfig {
            ClientConfig::builder().read_timeout(POLL).build()
        }

        async fn send(&mut self, payload: &[u8]) {
            self.panel
                .write_all(&encode_payload(payload).unwrap())
                .await
                .unwrap();
        }

        async fn read_bytes(&mut self, n: usize) -> Vec<u8> {
            let mut buf = vec![0u8; n];
            timeout(WAIT, self.panel.read_exact(&mut buf))
                .await
                .expect("timed out waiting for bytes")
                .unwrap();
            buf
        }

        async fn expect_ack(&mut self) {
            assert_eq!(self.read_bytes(1).await, vec![ACK]);
        }

        /// Consume the seeded request, written on the first quiet poll.
        async fn expect_equipment_list_request(&mut self) {
            let frame = self.read_bytes(EQUIPMENT_LIST_REQUEST.len()).await;
            assert_eq!(frame, *EQUIPMENT_LIST_REQUEST);
        }

        async fn wait_for_state(&mut self, want: SessionState) {
            timeout(WAIT, self.state.wait_for(|s| *s == want))
                .await
                .expect("timed out waiting for session state")
                .unwrap();
        }

        async fn next_event(&mut self) -> PanelEvent {
            timeout(WAIT, self.events.recv())
                .await
                .expect("timed out waiting for event")
                .expect("event channel closed")
        }

        async fn stop(self) -> Result<()> {
            self.shutdown.send_replace(true);
            timeout(WAIT, self.task).await.expect("loop did not stop").unwrap()
        }
    }

    /// Link whose first write fails, as a serial port might on a glitch.
    struct FailFirstWrite {
        inner: DuplexStream,
        failed: bool,
    }

    impl AsyncRead for FailFirstWrite {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Pin::new(&mut self.inner).poll_read(cx, buf)
        }
    }

    impl AsyncWrite for FailFirstWrite {
        fn poll_write(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            if !self.failed {
                self.failed = true;
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "transient write failure",
                )));
            }
            Pin::new(&mut self.inner).poll_write(cx, buf)
        }

        fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Pin::new(&mut self.inner).poll_flush(cx)
        }

        fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Pin::new(&mut self.inner).poll_shutdown(cx)
        }
    }

    fn zone_data(id: u16, status: u8, name: &[u8]) -> Vec<u8> {
        let [hi, lo] = id.to_be_bytes();
        let mut payload = vec![0x03, 0x00, 0x01, 0x0D, hi, lo, 0x01, status];
        payload.extend_from_slice(name);
        payload
    }

    fn zone_status(id: u16, status: u8) -> Vec<u8> {
        let [hi, lo] = id.to_be_bytes();
        vec![0x21, 0x00, 0x01, hi, lo, status]
    }

    #[tokio::test]
    async fn test_first_frame_is_equipment_list_request() {
        let mut h = Harness::start(Harness::default_config());
        h.expect_equipment_list_request().await;
        assert_eq!(*h.state.borrow(), SessionState::Handshaking);
        h.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_handshake_and_zone_lifecycle() {
        let mut h = Harness::start(Harness::default_config());
        h.expect_equipment_list_request().await;

        h.send(&PANEL_TYPE).await;
        h.expect_ack().await;
        match h.next_event().await {
            PanelEvent::PanelDefined(identity) => {
                assert_eq!(identity.hardware_version, "G1");
                assert_eq!(identity.software_version, "16530");
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(*h.state.borrow(), SessionState::Enumerating);

        // "GARDEN MOTION"
        h.send(&zone_data(5, 0, &[0x17, 0x11, 0x22, 0x14, 0x15, 0x1E, 0x2B, 0x92]))
            .await;
        h.expect_ack().await;
        h.send(&zone_data(6, 0, &[])).await;
        h.expect_ack().await;

        match h.next_event().await {
            PanelEvent::ZoneDefined(zone) => {
                assert_eq!(zone.id, 5);
                assert_eq!(zone.name, "GARDEN MOTION");
                assert_eq!(zone.group, 0x0D);
                assert_eq!(zone.kind, ZoneKind::Wireless);
            }
            other => panic!("unexpected event {other:?}"),
        }
        match h.next_event().await {
            PanelEvent::ZoneDefined(zone) => {
                assert_eq!(zone.id, 6);
                assert_eq!(zone.name, UNNAMED_ZONE);
            }
            other => panic!("unexpected event {other:?}"),
        }

        // No refresh before the list is done
        assert_eq!(*h.state.borrow(), SessionState::Enumerating);
        let mut buf = [0u8; 1];
        assert!(timeout(POLL * 3, h.panel.read(&mut buf)).await.is_err());

        h.send(&[0x08]).await;
        h.expect_ack().await;
        let refresh = h.read_bytes(DYNAMIC_REFRESH_REQUEST.len()).await;
        assert_eq!(refresh, *DYNAMIC_REFRESH_REQUEST);
        h.wait_for_state(SessionState::Live).await;

        h.send(&zone_status(5, 1)).await;
        h.expect_ack().await;
        match h.next_event().await {
            PanelEvent::ZoneUpdated {
                zone,
                previous_status,
            } => {
                assert_eq!(zone.id, 5);
                assert_eq!(zone.status, 1);
                assert_eq!(previous_status, 0);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(h.registry.read().await.get(5).unwrap().status, 1);

        h.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_write_is_retried() {
        let mut h = Harness::start_with(Harness::default_config(), |inner| FailFirstWrite {
            inner,
            failed: false,
        });

        // The seeded request survives the failed first write
        h.expect_equipment_list_request().await;

        h.send(&PANEL_TYPE).await;
        h.expect_ack().await;
        assert!(matches!(h.next_event().await, PanelEvent::PanelDefined(_)));
        h.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_follows_list_done_when_queue_is_full() {
        let config = ClientConfig::builder()
            .read_timeout(POLL)
            .outbound_capacity(1)
            .build();
        let mut h = Harness::start(config);

        // List done arrives while the seeded request still fills the queue
        h.send(&[0x08]).await;
        h.expect_ack().await;
        h.expect_equipment_list_request().await;
        let refresh = h.read_bytes(DYNAMIC_REFRESH_REQUEST.len()).await;
        assert_eq!(refresh, *DYNAMIC_REFRESH_REQUEST);
        h.wait_for_state(SessionState::Live).await;
        h.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_zone_status_has_no_event() {
        let mut h = Harness::start(Harness::default_config());
        h.expect_equipment_list_request().await;

        h.send(&zone_status(42, 1)).await;
        h.expect_ack().await;
        h.send(&zone_data(1, 0, &[])).await;
        h.expect_ack().await;

        // The first event is the zone definition, nothing for zone 42
        match h.next_event().await {
            PanelEvent::ZoneDefined(zone) => assert_eq!(zone.id, 1),
            other => panic!("unexpected event {other:?}"),
        }
        assert!(h.registry.read().await.get(42).is_none());
        h.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_identity_is_write_once() {
        let mut h = Harness::start(Harness::default_config());
        h.expect_equipment_list_request().await;

        h.send(&PANEL_TYPE).await;
        h.expect_ack().await;
        let mut second = PANEL_TYPE;
        second[1] = 0x11;
        h.send(&second).await;
        h.expect_ack().await;
        h.send(&zone_data(2, 0, &[])).await;
        h.expect_ack().await;

        assert!(matches!(h.next_event().await, PanelEvent::PanelDefined(_)));
        assert!(matches!(h.next_event().await, PanelEvent::ZoneDefined(_)));
        assert_eq!(
            h.identity.get().unwrap().panel_type,
            crate::constants::PanelType::Concord
        );
        h.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_bad_checksum_is_nacked_and_ignored() {
        let mut h = Harness::start(Harness::default_config());
        h.expect_equipment_list_request().await;

        let mut frame = encode_payload(&zone_data(3, 0, &[])).unwrap();
        let last = frame.len() - 1;
        frame[last] = if frame[last] == b'0' { b'1' } else { b'0' };
        h.panel.write_all(&frame).await.unwrap();
        assert_eq!(h.read_bytes(1).await, vec![NAK]);

        h.send(&zone_data(4, 0, &[])).await;
        h.expect_ack().await;
        match h.next_event().await {
            PanelEvent::ZoneDefined(zone) => assert_eq!(zone.id, 4),
            other => panic!("unexpected event {other:?}"),
        }
        assert!(h.registry.read().await.get(3).is_none());
        h.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_and_short_frames_are_dropped() {
        let mut h = Harness::start(Harness::default_config());
        h.expect_equipment_list_request().await;

        h.send(&[0x7F, 0x01]).await;
        h.expect_ack().await;
        h.send(&[0x21, 0x00, 0x01]).await;
        h.expect_ack().await;
        h.send(&[0x22, 0x09, 0x00, 0x01, 0x00, 0x17, 0x11]).await;
        h.expect_ack().await;
        h.send(&[0x22, 0x33]).await;
        h.expect_ack().await;
        h.send(&[0x04, 0x01, 0x02]).await;
        h.expect_ack().await;

        assert!(timeout(POLL * 3, h.events.recv()).await.is_err());
        assert!(h.registry.read().await.is_empty());
        assert_eq!(*h.state.borrow(), SessionState::Handshaking);
        h.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_link_lost_after_consecutive_errors() {
        let config = ClientConfig::builder()
            .read_timeout(POLL)
            .max_consecutive_io_errors(3)
            .build();
        let h = Harness::start(config);
        let Harness {
            panel,
            mut events,
            task,
            shutdown: _shutdown,
            ..
        } = h;
        drop(panel);

        let result = timeout(WAIT, task).await.unwrap().unwrap();
        assert!(matches!(result, Err(ConcordError::LinkLost { errors: 3 })));
        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_dropped_receiver_does_not_stall() {
        let mut h = Harness::start(Harness::default_config());
        h.expect_equipment_list_request().await;
        let (_, closed) = event_channel(1);
        h.events = closed;

        for id in 1..=3 {
            h.send(&zone_data(id, 0, &[])).await;
            h.expect_ack().await;
        }
        assert_eq!(h.registry.read().await.len(), 3);
        h.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_full_event_channel_applies_backpressure() {
        let config = ClientConfig::builder()
            .read_timeout(POLL)
            .event_capacity(1)
            .build();
        let mut h = Harness::start(config);
        h.expect_equipment_list_request().await;

        h.send(&zone_data(1, 0, &[])).await;
        h.expect_ack().await;
        h.send(&zone_data(2, 0, &[])).await;
        h.expect_ack().await;
        h.send(&zone_data(3, 0, &[])).await;

        // The loop is parked delivering zone 2, so zone 3 is not acknowledged yet
        let mut buf = [0u8; 1];
        assert!(timeout(POLL * 3, h.panel.read(&mut buf)).await.is_err());

        for expected in 1..=2 {
            match h.next_event().await {
                PanelEvent::ZoneDefined(zone) => assert_eq!(zone.id, expected),
                other => panic!("unexpected event {other:?}"),
            }
        }
        h.expect_ack().await;
        assert_eq!(h.next_event().await.zone().unwrap().id, 3);
        h.stop().await.unwrap();
    }
}
