//! Radio Control Logic
//!
//! The [`Radio`] context owns the transceiver, the peer directory and both
//! frame queues, and runs the cooperative radio task.
//!
//! ```text
//!   publish_*() ──► pub_queue ──┐
//!                               ▼
//!   on_tx_done() ──► schedule ─► run() ──► Transceiver::load/transmit
//!                               ▲  │
//!   on_rx_done() ──► rx_queue ──┘  └──► RadioEventListener
//! ```
//!
//! Every entry point returns immediately. Work that needs the task records
//! a [`Schedule`] request; the caller collects it with
//! [`Radio::take_schedule`] and invokes [`Radio::run`] when it is due. `run`
//! itself returns the next request.

pub mod listener;
pub mod pairing;
pub mod peers;
pub mod persist;
pub mod publish;
pub mod scan;
pub mod state;

pub use listener::RadioEventListener;
pub use pairing::PairingButton;
pub use peers::{PeerDirectory, PeerError, PeerRecord};
pub use persist::PersistError;
pub use publish::PublishError;
pub use scan::ScanCache;
pub use state::RadioState;

use embedded_storage::Storage;
use heapless::Vec;
use rand_core::RngCore;

use crate::config::{
    RadioConfig, HEADER_LEN, MAX_FRAME_LEN, MAX_PAYLOAD_LEN, MAX_PEERS, MIN_FRAME_LEN,
    QUEUE_CAPACITY,
};
use crate::hal::{SecureElement, SerialNumberError, Transceiver};
use crate::protocol::{self, Header, Message, MessageType, ANNOUNCE_FRAME_LEN};
use crate::queue::FrameQueue;
use crate::types::{DeviceAddress, Schedule};

/// Radio task context
///
/// Generic over the board peripherals so the same logic runs against the
/// real drivers and the simulation HAL.
pub struct Radio<T, S, E, R, L = ()> {
    config: RadioConfig,
    transceiver: T,
    storage: S,
    secure_element: E,
    rng: R,
    listener: L,

    address: Option<DeviceAddress>,
    message_id: u16,
    state: RadioState,
    transmit_count: u8,
    tx_in_flight: bool,

    enroll_pending: bool,
    enrollment_mode: bool,
    listening: bool,
    scanning: bool,
    automatic_pairing: bool,

    scan_cache: ScanCache,
    directory: PeerDirectory,
    pub_queue: FrameQueue<QUEUE_CAPACITY>,
    rx_queue: FrameQueue<QUEUE_CAPACITY>,
    schedule: Schedule,
}

impl<T, S, E, R, L> Radio<T, S, E, R, L>
where
    T: Transceiver,
    S: Storage,
    E: SecureElement,
    R: RngCore,
    L: RadioEventListener,
{
    /// Bring the radio up
    ///
    /// Requests the serial number and loads the peer directory. If the
    /// directory needs rewriting, an immediate run is requested.
    pub fn new(
        config: RadioConfig,
        transceiver: T,
        mut storage: S,
        mut secure_element: E,
        rng: R,
        listener: L,
    ) -> Self {
        secure_element.request_serial_number();

        let mut directory = PeerDirectory::new();
        persist::load(&mut storage, &mut directory);
        let schedule = if directory.is_dirty() {
            Schedule::Now
        } else {
            Schedule::Idle
        };

        Self {
            config,
            transceiver,
            storage,
            secure_element,
            rng,
            listener,
            address: None,
            message_id: 0,
            state: RadioState::Sleep,
            transmit_count: 0,
            tx_in_flight: false,
            enroll_pending: false,
            enrollment_mode: false,
            listening: false,
            scanning: false,
            automatic_pairing: false,
            scan_cache: ScanCache::new(),
            directory,
            pub_queue: FrameQueue::new(),
            rx_queue: FrameQueue::new(),
            schedule,
        }
    }

    // ========================================================================
    // Task
    // ========================================================================

    /// Run the radio task once and return when it wants to run next
    pub fn run(&mut self) -> Schedule {
        self.schedule = Schedule::Idle;

        if self.directory.is_dirty() {
            self.save_directory();
        }

        let Some(address) = self.address else {
            self.secure_element.request_serial_number();
            return Schedule::Now;
        };

        if self.state == RadioState::Transmitting {
            if self.tx_in_flight {
                // The completion callback plans the next step
                return self.take_schedule();
            }
            if self.transmit_count > 0 {
                self.transceiver.transmit();
                self.tx_in_flight = true;
                return self.take_schedule();
            }
            self.state = RadioState::Sleep;
        }

        if self.enroll_pending {
            self.enroll_pending = false;
            let header = Header::new(address, self.next_message_id());
            if let Some(frame) = protocol::encode_frame(&header, &[MessageType::Enroll.as_u8()]) {
                debug!("enrollment frame sent");
                self.start_transmission(&frame, self.config.enrollment_repeats);
            }
            return self.take_schedule();
        }

        self.dispatch_received(address);

        let mut payload = [0u8; MAX_PAYLOAD_LEN];
        if let Some(len) = self.pub_queue.pop_into(&mut payload) {
            let header = Header::new(address, self.next_message_id());
            if let Some(frame) = protocol::encode_frame(&header, &payload[..len]) {
                trace!("publish {} bytes, id {}", len, header.message_id);
                self.start_transmission(&frame, self.config.publish_repeats);
            }
        }

        if self.listening && self.transmit_count == 0 {
            self.transceiver.listen(None);
            self.state = RadioState::Listening;
        } else if !self.listening && self.state == RadioState::Listening {
            self.transceiver.sleep();
            self.state = RadioState::Sleep;
        }

        self.take_schedule()
    }

    /// Take the pending run request, leaving `Idle`
    pub fn take_schedule(&mut self) -> Schedule {
        core::mem::take(&mut self.schedule)
    }

    // ========================================================================
    // Driver callbacks
    // ========================================================================

    /// The transceiver finished sending a frame
    pub fn on_tx_done(&mut self) {
        self.tx_in_flight = false;

        if self.transmit_count == 0 {
            self.plan(Schedule::Now);
        } else {
            self.transmit_count -= 1;
            let backoff = match self.config.backoff_window_ms {
                0 => 0,
                window => self.rng.next_u32() % window,
            };
            self.plan(Schedule::In(backoff));
        }

        if self.listening {
            self.transceiver.listen(None);
        }
    }

    /// The transceiver received a frame
    pub fn on_rx_done(&mut self, frame: &[u8]) {
        if frame.len() < MIN_FRAME_LEN || frame.len() > MAX_FRAME_LEN {
            return;
        }
        let Some(header) = Header::parse(frame) else {
            return;
        };
        let sender = header.sender;
        let tag = MessageType::from_u8(frame[HEADER_LEN]);

        if self.enrollment_mode && frame.len() == MIN_FRAME_LEN && tag == Some(MessageType::Enroll) {
            if let Err(e) = self.peer_add(sender) {
                debug!("enrollment of {} ignored: {}", sender, e);
            }
            return;
        }

        if frame.len() == ANNOUNCE_FRAME_LEN
            && matches!(tag, Some(MessageType::Attach | MessageType::Detach))
        {
            self.handle_announcement(sender, frame);
            return;
        }

        match self.directory.accept(sender, header.message_id) {
            Some(true) => {
                if frame.len() > MIN_FRAME_LEN {
                    if self.rx_queue.push(frame).is_err() {
                        warn!("rx queue full, frame from {} dropped", sender);
                    }
                    self.plan(Schedule::Now);
                }
            }
            Some(false) => {}
            None => {
                if self.scanning && self.scan_cache.push(sender) {
                    self.listener.on_scan_find_device(sender);
                }
                if self.automatic_pairing {
                    if let Err(e) = self.peer_add(sender) {
                        debug!("automatic pairing of {} failed: {}", sender, e);
                    }
                }
            }
        }
    }

    /// The secure element answered a serial-number request
    pub fn on_serial_number(&mut self, serial: Result<u64, SerialNumberError>) {
        if let Some(address) = self.address {
            trace!("serial number already known: {}", address);
            return;
        }

        match serial.ok().and_then(DeviceAddress::from_serial) {
            Some(address) => {
                info!("device address {}", address);
                self.address = Some(address);
                self.listener.on_init_done(address);
            }
            None => {
                warn!("serial number read failed");
                self.listener.on_init_failure();
            }
        }
        self.plan(Schedule::Now);
    }

    // ========================================================================
    // Control
    // ========================================================================

    /// Keep the receiver armed between transmissions
    pub fn listen(&mut self) {
        self.listening = true;
        self.plan(Schedule::Now);
    }

    /// Power the receiver down after the current transmission
    pub fn sleep(&mut self) {
        self.listening = false;
        self.plan(Schedule::Now);
    }

    /// Broadcast an enrollment frame on the next run
    pub fn enroll_to_gateway(&mut self) {
        self.enroll_pending = true;
        self.plan(Schedule::Now);
    }

    /// Accept enrollment frames and pair their senders
    ///
    /// Only frames heard while the receiver is on count; the receiver itself
    /// is controlled by [`listen`](Self::listen) and [`sleep`](Self::sleep).
    pub fn enrollment_start(&mut self) {
        self.enrollment_mode = true;
    }

    /// Stop accepting enrollment frames
    pub fn enrollment_stop(&mut self) {
        self.enrollment_mode = false;
    }

    /// Report unpaired devices through `on_scan_find_device`
    pub fn scan_start(&mut self) {
        self.scan_cache.clear();
        self.scanning = true;
    }

    /// Stop reporting unpaired devices
    pub fn scan_stop(&mut self) {
        self.scanning = false;
    }

    /// Pair with every unpaired device that is heard
    pub fn automatic_pairing_start(&mut self) {
        self.automatic_pairing = true;
    }

    /// Stop automatic pairing
    pub fn automatic_pairing_stop(&mut self) {
        self.automatic_pairing = false;
    }

    // ========================================================================
    // Peers
    // ========================================================================

    /// Pair with `address` and broadcast an attach announcement to it
    ///
    /// # Errors
    ///
    /// `DirectoryFull` (after raising `on_attach_failure`) or `AlreadyPaired`.
    pub fn peer_add(&mut self, address: DeviceAddress) -> Result<(), PeerError> {
        self.attach(address)?;
        self.announce(&Message::Attach(address));
        Ok(())
    }

    /// Unpair `address` and broadcast a detach announcement to it
    ///
    /// # Errors
    ///
    /// `NotPaired` if the address is not in the directory.
    pub fn peer_remove(&mut self, address: DeviceAddress) -> Result<(), PeerError> {
        self.detach(address)?;
        self.announce(&Message::Detach(address));
        Ok(())
    }

    /// Unpair every peer
    ///
    /// # Errors
    ///
    /// `Storage` if the directory could not be persisted after a removal;
    /// the remaining peers are kept.
    pub fn peer_purge_all(&mut self) -> Result<(), PeerError> {
        while let Some(address) = self.directory.records().last().map(|peer| peer.address) {
            self.peer_remove(address)?;
            if self.directory.is_dirty() {
                return Err(PeerError::Storage);
            }
        }
        Ok(())
    }

    /// Up to `max_n` paired addresses, in directory order
    #[must_use]
    pub fn peer_addresses(&self, max_n: usize) -> Vec<DeviceAddress, MAX_PEERS> {
        self.directory.list(max_n)
    }

    /// Check if `address` is paired
    #[must_use]
    pub fn is_peer(&self, address: DeviceAddress) -> bool {
        self.directory.contains(address)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// This device's address, once the serial number has been read
    #[must_use]
    pub const fn device_address(&self) -> Option<DeviceAddress> {
        self.address
    }

    /// Current radio state
    #[must_use]
    pub const fn state(&self) -> RadioState {
        self.state
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &RadioConfig {
        &self.config
    }

    /// Peer directory
    #[must_use]
    pub const fn directory(&self) -> &PeerDirectory {
        &self.directory
    }

    /// Event listener
    #[must_use]
    pub const fn listener(&self) -> &L {
        &self.listener
    }

    /// Event listener, mutably
    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    /// Transceiver driver
    #[must_use]
    pub const fn transceiver(&self) -> &T {
        &self.transceiver
    }

    /// Transceiver driver, mutably
    pub fn transceiver_mut(&mut self) -> &mut T {
        &mut self.transceiver
    }

    /// Secure element driver
    #[must_use]
    pub const fn secure_element(&self) -> &E {
        &self.secure_element
    }

    /// Persistent storage
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Persistent storage, mutably
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    // ========================================================================
    // Internals
    // ========================================================================

    pub(crate) fn plan(&mut self, schedule: Schedule) {
        self.schedule = self.schedule.earliest(schedule);
    }

    fn next_message_id(&mut self) -> u16 {
        let id = self.message_id;
        self.message_id = self.message_id.wrapping_add(1);
        id
    }

    fn start_transmission(&mut self, frame: &[u8], repeats: u8) {
        self.transceiver.load(frame);
        self.transceiver.transmit();
        self.tx_in_flight = true;
        self.transmit_count = repeats;
        self.state = RadioState::Transmitting;
    }

    /// Queue an attach/detach announcement for broadcast
    fn announce(&mut self, message: &Message<'_>) {
        match message.encode() {
            Ok(payload) => {
                if self.pub_queue.push(&payload).is_err() {
                    warn!("publish queue full, announcement dropped");
                }
            }
            Err(e) => warn!("announcement not encodable: {}", e),
        }
        self.plan(Schedule::Now);
    }

    /// Attach/detach frame from another node; only acted on if it targets us
    fn handle_announcement(&mut self, sender: DeviceAddress, frame: &[u8]) {
        let Some((_, message)) = protocol::decode_frame(frame) else {
            return;
        };
        let result = match message {
            Message::Attach(target) if Some(target) == self.address => self.attach(sender),
            Message::Detach(target) if Some(target) == self.address => self.detach(sender),
            _ => return,
        };
        if let Err(e) = result {
            debug!("announcement from {} ignored: {}", sender, e);
        }
    }

    /// Add to the directory and persist, without broadcasting
    fn attach(&mut self, address: DeviceAddress) -> Result<(), PeerError> {
        match self.directory.add(address) {
            Ok(()) => {}
            Err(PeerError::DirectoryFull) => {
                warn!("peer directory full, {} not attached", address);
                self.listener.on_attach_failure(address);
                return Err(PeerError::DirectoryFull);
            }
            Err(e) => return Err(e),
        }

        self.save_directory();
        info!("peer {} attached", address);
        self.listener.on_attach(address);
        Ok(())
    }

    /// Remove from the directory and persist, without broadcasting
    fn detach(&mut self, address: DeviceAddress) -> Result<(), PeerError> {
        self.directory.remove(address)?;
        self.save_directory();
        info!("peer {} detached", address);
        self.listener.on_detach(address);
        Ok(())
    }

    fn save_directory(&mut self) {
        match persist::save(&mut self.storage, &mut self.directory) {
            Ok(()) => {}
            Err(PersistError::OutOfSpace) => {
                warn!("storage too small for peer directory");
                // Retrying cannot help
                self.directory.mark_clean();
            }
            Err(PersistError::Storage(_)) => {
                warn!("peer directory save failed, retrying");
                self.plan(Schedule::Now);
            }
        }
    }

    /// Drain the receive queue into the listener
    fn dispatch_received(&mut self, address: DeviceAddress) {
        let mut frame = [0u8; MAX_FRAME_LEN];
        while let Some(len) = self.rx_queue.pop_into(&mut frame) {
            if let Some((header, message)) = protocol::decode_frame(&frame[..len]) {
                dispatch(&mut self.listener, address, header.sender, message);
            }
        }
    }
}

/// Deliver one decoded message to the listener
fn dispatch<L: RadioEventListener>(
    listener: &mut L,
    own: DeviceAddress,
    peer: DeviceAddress,
    message: Message<'_>,
) {
    match message {
        Message::PushButton { event_count } => listener.on_push_button(peer, event_count),
        Message::Thermometer { channel, temperature } => {
            listener.on_thermometer(peer, channel, temperature);
        }
        Message::Humidity { channel, percentage } => listener.on_humidity(peer, channel, percentage),
        Message::Illuminance { channel, lux } => listener.on_illuminance(peer, channel, lux),
        Message::Barometer {
            channel,
            pressure,
            altitude,
        } => listener.on_barometer(peer, channel, pressure, altitude),
        Message::Co2 { concentration } => listener.on_co2(peer, concentration),
        Message::Battery {
            format,
            voltage,
            percentage,
        } => listener.on_battery(peer, format, voltage, percentage),
        Message::Buffer(data) => listener.on_buffer(peer, data),
        Message::Info(firmware) => listener.on_info(peer, firmware),
        Message::NodeStateSet {
            target,
            state_id,
            state,
        } if target == own => listener.on_node_state_set(peer, state_id, state),
        Message::NodeStateGet { target, state_id } if target == own => {
            listener.on_node_state_get(peer, state_id);
        }
        Message::NodeBuffer { target, data } if target == own => listener.on_node_buffer(peer, data),
        // Pairing frames are handled on receipt; node messages for others are ignored
        Message::Enroll
        | Message::Attach(_)
        | Message::Detach(_)
        | Message::NodeStateSet { .. }
        | Message::NodeStateGet { .. }
        | Message::NodeBuffer { .. } => {}
    }
}
