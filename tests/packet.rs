use cryptal::packet::{IoResult, PacketWrapper, Transport};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Default)]
struct Pipe {
    buf: VecDeque<u8>,
    eof: bool,
}

/// One end of an in-memory duplex byte pipe, pairing two of which gives a
/// loopback transport for both sides of a conversation.
struct ChannelTransport {
    outbound: Rc<RefCell<Pipe>>,
    inbound: Rc<RefCell<Pipe>>,
}

impl Transport for ChannelTransport {
    fn read(&mut self, buf: &mut [u8]) -> IoResult {
        let mut p = self.inbound.borrow_mut();
        if p.buf.is_empty() {
            return if p.eof { IoResult::Eof } else { IoResult::WouldBlock };
        }
        let n = buf.len().min(p.buf.len());
        for slot in buf[..n].iter_mut() {
            *slot = p.buf.pop_front().unwrap();
        }
        IoResult::Done(n)
    }

    fn write(&mut self, buf: &[u8]) -> IoResult {
        self.outbound.borrow_mut().buf.extend(buf.iter().copied());
        IoResult::Done(buf.len())
    }

    fn output_eof(&mut self) {
        self.outbound.borrow_mut().eof = true;
    }
}

fn make_pair() -> (ChannelTransport, ChannelTransport) {
    let a_to_b = Rc::new(RefCell::new(Pipe::default()));
    let b_to_a = Rc::new(RefCell::new(Pipe::default()));
    (
        ChannelTransport { outbound: Rc::clone(&a_to_b), inbound: Rc::clone(&b_to_a) },
        ChannelTransport { outbound: b_to_a, inbound: a_to_b },
    )
}

fn recording_wrapper(
    transport: ChannelTransport,
) -> (PacketWrapper<ChannelTransport>, Rc<RefCell<Vec<(u8, Vec<u8>)>>>) {
    let received: Rc<RefCell<Vec<(u8, Vec<u8>)>>> = Rc::new(RefCell::new(Vec::new()));
    let received_for_cb = Rc::clone(&received);
    let wrapper = PacketWrapper::new(
        transport,
        Some(Box::new(move |_w: &mut PacketWrapper<ChannelTransport>, ptype, payload: &[u8]| {
            received_for_cb.borrow_mut().push((ptype, payload.to_vec()));
        })),
        None,
        None,
    );
    (wrapper, received)
}

#[test]
fn several_packets_arrive_in_order_with_payloads_intact() {
    let (a, b) = make_pair();
    let (mut sender, _) = recording_wrapper(a);
    let (mut receiver, received) = recording_wrapper(b);

    sender.send(1, b"alpha");
    sender.send(2, b"beta");
    sender.send(3, b"");
    receiver.on_readable();

    assert_eq!(*received.borrow(), vec![(1, b"alpha".to_vec()), (2, b"beta".to_vec()), (3, Vec::new())]);
}

#[test]
fn eof_half_closes_the_receiver_exactly_once() {
    let (a, b) = make_pair();
    let (mut sender, _) = recording_wrapper(a);
    sender.send_eof();

    let eof_count = Rc::new(RefCell::new(0u32));
    let count_for_cb = Rc::clone(&eof_count);
    let mut receiver = PacketWrapper::new(
        b,
        None,
        Some(Box::new(move |_w: &mut PacketWrapper<ChannelTransport>| {
            *count_for_cb.borrow_mut() += 1;
        })),
        None,
    );
    receiver.on_readable();
    receiver.on_readable();

    assert_eq!(*eof_count.borrow(), 1);
    assert!(receiver.incoming_eof());
}

#[test]
fn sending_after_local_eof_is_a_noop() {
    let (a, b) = make_pair();
    let (mut sender, _) = recording_wrapper(a);
    let (mut receiver, received) = recording_wrapper(b);

    sender.send(1, b"before");
    sender.send_eof();
    sender.send(2, b"after");
    receiver.on_readable();

    assert_eq!(*received.borrow(), vec![(1, b"before".to_vec())]);
}

#[test]
fn destroying_from_within_the_packet_callback_leaves_the_wrapper_inert() {
    let (a, b) = make_pair();
    let (mut sender, _) = recording_wrapper(a);
    sender.send(9, b"payload");

    let mut receiver = PacketWrapper::new(
        b,
        Some(Box::new(|w: &mut PacketWrapper<ChannelTransport>, _ptype, _payload: &[u8]| {
            w.destroy();
        })),
        None,
        None,
    );
    receiver.on_readable();
    assert!(receiver.is_destroyed());

    receiver.on_readable();
    receiver.on_writable();
    receiver.send(1, b"ignored");
}

#[test]
fn shortcircuit_hands_the_transport_to_its_new_owner() {
    let (a, b) = make_pair();
    let (mut sender, _) = recording_wrapper(a);
    sender.send(4, b"switch");

    let handed_off: Rc<RefCell<Option<ChannelTransport>>> = Rc::new(RefCell::new(None));
    let handed_off_for_cb = Rc::clone(&handed_off);
    let mut receiver = PacketWrapper::new(
        b,
        Some(Box::new(move |w: &mut PacketWrapper<ChannelTransport>, _ptype, _payload: &[u8]| {
            let sink = Rc::clone(&handed_off_for_cb);
            w.shortcircuit(move |transport| {
                *sink.borrow_mut() = Some(transport);
            });
        })),
        None,
        None,
    );
    receiver.on_readable();

    assert!(receiver.is_shortcircuited());
    assert!(receiver.is_destroyed());
    assert!(handed_off.borrow().is_some());
}

#[test]
#[should_panic(expected = "oversize frame")]
fn a_declared_frame_length_past_the_cap_is_fatal() {
    let (a, b) = make_pair();
    a.outbound.borrow_mut().buf.extend(200_000_000u32.to_be_bytes());
    let (mut receiver, _) = recording_wrapper(b);
    receiver.on_readable();
}
