//! Fan-out output port.

use crate::pipeline::id::PortId;
use crate::pipeline::in_port::InPort;
use crate::pipeline::packet::DataPacket;
use crate::pipeline::port::PortDirection;
use std::sync::Arc;

/// Output port of a stream task: an ordered set of receiving [`InPort`]s.
///
/// Sending hands one deep copy to every receiver except the first connected
/// one, which receives the original packet.
pub struct OutPort {
    receivers: Vec<Arc<InPort>>,
    id: PortId,
}

impl OutPort {
    pub fn new() -> Self {
        Self {
            receivers: Vec::new(),
            id: PortId::unassigned(PortDirection::Output),
        }
    }

    pub fn id(&self) -> &PortId {
        &self.id
    }

    pub(crate) fn set_id(&mut self, id: PortId) {
        self.id = id;
    }

    /// Add a receiver. Connecting the same port twice is logged and ignored.
    pub fn connect(&mut self, port: Arc<InPort>) -> bool {
        if self.is_connected(&port) {
            tracing::warn!("{}: already connected to {}", self.id, port.id());
            return false;
        }
        tracing::debug!("{}: connected to {}", self.id, port.id());
        self.receivers.push(port);
        true
    }

    pub fn disconnect(&mut self, port: &Arc<InPort>) -> bool {
        let before = self.receivers.len();
        self.receivers.retain(|p| !Arc::ptr_eq(p, port));
        self.receivers.len() != before
    }

    pub fn is_connected(&self, port: &Arc<InPort>) -> bool {
        self.receivers.iter().any(|p| Arc::ptr_eq(p, port))
    }

    pub fn receivers(&self) -> &[Arc<InPort>] {
        &self.receivers
    }

    pub fn receiver_count(&self) -> usize {
        self.receivers.len()
    }

    /// Deliver `packet` to every receiver. With no receivers the packet is
    /// dropped.
    ///
    /// Receivers are served from the last connected down to the first, so
    /// the original packet is handed over last. A full lossless receiver
    /// blocks this call.
    pub fn send(&self, packet: DataPacket) {
        match self.receivers.split_first() {
            None => {
                tracing::debug!(
                    "{}: no receivers, discarding packet {}",
                    self.id,
                    packet.number()
                );
            }
            Some((first, rest)) => {
                for receiver in rest.iter().rev() {
                    receiver.enqueue(packet.clone());
                }
                first.enqueue(packet);
            }
        }
    }
}

impl Default for OutPort {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OutPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutPort")
            .field("id", &self.id)
            .field("receivers", &self.receivers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::value::Value;
    use std::time::Duration;

    #[test]
    fn test_send_without_receivers_drops() {
        let port = OutPort::new();
        port.send(DataPacket::new(0));
        assert_eq!(port.receiver_count(), 0);
    }

    #[test]
    fn test_fan_out_first_gets_original() {
        let a = Arc::new(InPort::new());
        let b = Arc::new(InPort::new());
        let c = Arc::new(InPort::new());
        let mut out = OutPort::new();
        out.connect(Arc::clone(&a));
        out.connect(Arc::clone(&b));
        out.connect(Arc::clone(&c));

        let packet = DataPacket::new(5).with_channels([Value::int(1), Value::int(2)]);
        let original_buffer = packet.channels().as_ptr();
        out.send(packet);

        let pa = a.receive(Duration::ZERO).unwrap().unwrap();
        let pb = b.receive(Duration::ZERO).unwrap().unwrap();
        let pc = c.receive(Duration::ZERO).unwrap().unwrap();

        assert_eq!(pa.channels().as_ptr(), original_buffer);
        assert_ne!(pb.channels().as_ptr(), original_buffer);
        assert_ne!(pc.channels().as_ptr(), original_buffer);
        for p in [&pa, &pb, &pc] {
            assert_eq!(p.number(), 5);
            assert_eq!(p.channels()[1].as_int(), 2);
        }
    }

    #[test]
    fn test_connect_twice_is_noop() {
        let a = Arc::new(InPort::new());
        let mut out = OutPort::new();
        assert!(out.connect(Arc::clone(&a)));
        assert!(!out.connect(Arc::clone(&a)));
        assert_eq!(out.receiver_count(), 1);

        out.send(DataPacket::new(0));
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn test_disconnect() {
        let a = Arc::new(InPort::new());
        let mut out = OutPort::new();
        out.connect(Arc::clone(&a));
        assert!(out.disconnect(&a));
        assert!(!out.disconnect(&a));
        assert!(!out.is_connected(&a));
    }
}
