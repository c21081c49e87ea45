use stationlink::config::DeviceConfig;
use stationlink::network::application::mqtt::{Publisher, QoS};
use stationlink::signal::{Bit, EventGroup, ReadinessSignal};
use stationlink::system::command::{Choice, Request};
use stationlink::system::interpreter::*;
use stationlink::system::queue::EventQueue;
use stationlink::system::serial::{SerialTransport, UartEvent};
use std::collections::VecDeque;

#[derive(Debug, Default)]
struct MockUart {
    pending: Vec<u8>,
    reads: Vec<(usize, u32)>,
    flushes: usize,
}

impl MockUart {
    fn with_input(data: &[u8]) -> Self {
        Self {
            pending: data.to_vec(),
            ..Default::default()
        }
    }
}

impl SerialTransport for MockUart {
    type Error = ();

    fn read_bytes(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error> {
        self.reads.push((buf.len(), timeout_ms));
        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }

    fn flush_input(&mut self) -> Result<(), Self::Error> {
        self.flushes += 1;
        self.pending.clear();
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Published {
    topic: String,
    payload: String,
    qos: QoS,
    retain: bool,
}

#[derive(Debug, Default)]
struct RecordingPublisher {
    sent: Vec<Published>,
    fail: bool,
}

impl Publisher for RecordingPublisher {
    type Error = &'static str;

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), Self::Error> {
        self.sent.push(Published {
            topic: topic.to_string(),
            payload: String::from_utf8(payload.to_vec()).unwrap(),
            qos,
            retain,
        });
        if self.fail { Err("broker unreachable") } else { Ok(()) }
    }
}

#[derive(Default)]
struct MockQueue {
    events: VecDeque<UartEvent>,
    resets: usize,
}

impl EventQueue<UartEvent> for MockQueue {
    fn receive(&mut self) -> Option<UartEvent> {
        self.events.pop_front()
    }

    fn reset(&mut self) {
        self.resets += 1;
        self.events.clear();
    }
}

type Interpreter<'a> = CommandInterpreter<MockUart, RecordingPublisher, &'a EventGroup>;

fn device() -> DeviceConfig {
    DeviceConfig::new("7f3a", "game/player/7f3a", "game/torget").unwrap()
}

fn interpreter<'a>(flags: &'a EventGroup, input: &[u8]) -> Interpreter<'a> {
    CommandInterpreter::new(
        MockUart::with_input(input),
        RecordingPublisher::default(),
        flags,
        device(),
    )
}

fn feed(interp: &mut Interpreter<'_>, line: &[u8]) -> Outcome {
    let mut queue = MockQueue::default();
    interp.on_receive_event(UartEvent::Data(line.len()), &mut queue)
}

#[test]
fn test_vote_ok_publishes_once() {
    let flags = EventGroup::new();
    let mut interp = interpreter(&flags, b"/v ok");

    assert_eq!(feed(&mut interp, b"/v ok"), Outcome::Voted(Choice::Ok));
    assert_eq!(
        interp.publisher().sent,
        vec![Published {
            topic: "game/player/7f3a".to_string(),
            payload: r#"{"val":"ok"}"#.to_string(),
            qos: QoS::AtLeastOnce,
            retain: false,
        }]
    );
    assert_eq!(flags.bits(), 0);
}

#[test]
fn test_every_vote_payload() {
    let cases: [(&[u8], &str); 5] = [
        (b"/v ok", r#"{"val":"ok"}"#),
        (b"/v neka", r#"{"val":"neka"}"#),
        (b"/v lyckas", r#"{"val":"lyckas"}"#),
        (b"/v sabotage", r#"{"val":"sabotage"}"#),
        (b"/v starta", r#"{"val":"starta"}"#),
    ];

    for (line, payload) in cases {
        let flags = EventGroup::new();
        let mut interp = interpreter(&flags, line);
        feed(&mut interp, line);
        assert_eq!(interp.publisher().sent.len(), 1);
        assert_eq!(interp.publisher().sent[0].payload, payload);
    }
}

#[test]
fn test_vote_matches_anywhere_in_line() {
    let flags = EventGroup::new();
    let line = b"please /v ok now";
    let mut interp = interpreter(&flags, line);

    assert_eq!(feed(&mut interp, line), Outcome::Voted(Choice::Ok));
    assert_eq!(interp.publisher().sent[0].payload, r#"{"val":"ok"}"#);
}

#[test]
fn test_chat_message() {
    let flags = EventGroup::new();
    let line = b":hello world";
    let mut interp = interpreter(&flags, line);

    assert_eq!(feed(&mut interp, line), Outcome::Chatted);
    let sent = &interp.publisher().sent;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].topic, "game/torget");
    assert_eq!(sent[0].payload, r#"{"id":"7f3a","data":"hello world"}"#);
    assert!(sent[0].payload.contains(r#""data":"hello world""#));
}

#[test]
fn test_chat_message_is_escaped() {
    let flags = EventGroup::new();
    let line = br#":say "hi""#;
    let mut interp = interpreter(&flags, line);

    feed(&mut interp, line);
    assert_eq!(
        interp.publisher().sent[0].payload,
        r#"{"id":"7f3a","data":"say \"hi\""}"#
    );
}

#[test]
fn test_full_line_of_quotes_is_published() {
    let flags = EventGroup::new();
    let mut line = vec![b':'];
    line.extend(std::iter::repeat_n(b'"', SERIAL_BUFFER_SIZE - 2));
    let mut interp = interpreter(&flags, &line);

    assert_eq!(feed(&mut interp, &line), Outcome::Chatted);
    let sent = &interp.publisher().sent;
    assert_eq!(sent.len(), 1);
    let expected = format!(
        r#"{{"id":"7f3a","data":"{}"}}"#,
        "\\\"".repeat(SERIAL_BUFFER_SIZE - 2)
    );
    assert_eq!(sent[0].payload, expected);
}

#[test]
fn test_full_line_of_control_characters_is_published() {
    let flags = EventGroup::new();
    let mut line = vec![b':'];
    line.extend(std::iter::repeat_n(0x01, SERIAL_BUFFER_SIZE - 2));
    let mut interp = interpreter(&flags, &line);

    assert_eq!(feed(&mut interp, &line), Outcome::Chatted);
    let sent = &interp.publisher().sent;
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].payload.matches("\\u0001").count(),
        SERIAL_BUFFER_SIZE - 2
    );
    assert!(sent[0].payload.starts_with(r#"{"id":"7f3a","data":""#));
}

#[test]
fn test_chat_line_terminator_stripped() {
    let flags = EventGroup::new();
    let line = b":gg\r\n";
    let mut interp = interpreter(&flags, line);

    feed(&mut interp, line);
    assert_eq!(interp.publisher().sent[0].payload, r#"{"id":"7f3a","data":"gg"}"#);
}

#[test]
fn test_requests_raise_bits_without_publishing() {
    let cases: [(&[u8], Request, Bit); 3] = [
        (b"/r reg", Request::Register, Bit::RegistrationRequested),
        (b"/r csr", Request::Certificate, Bit::CertificateRequested),
        (b"/r start", Request::StartGame, Bit::GameStartRequested),
    ];

    for (line, request, bit) in cases {
        let flags = EventGroup::new();
        let mut interp = interpreter(&flags, line);

        assert_eq!(feed(&mut interp, line), Outcome::Requested(request));
        assert!(flags.is_set(bit));
        assert_eq!(flags.bits(), bit.mask());
        assert!(interp.publisher().sent.is_empty());
    }
}

#[test]
fn test_garbage_does_nothing() {
    let flags = EventGroup::new();
    let line = b"garbage text";
    let mut interp = interpreter(&flags, line);

    assert_eq!(feed(&mut interp, line), Outcome::Unrecognized);
    assert_eq!(flags.bits(), 0);
    assert!(interp.publisher().sent.is_empty());
}

#[test]
fn test_empty_data_is_not_dispatched() {
    let flags = EventGroup::new();
    let mut interp = interpreter(&flags, b"");
    let mut queue = MockQueue::default();

    assert_eq!(
        interp.on_receive_event(UartEvent::Data(0), &mut queue),
        Outcome::Empty
    );
    assert!(interp.transport().reads.is_empty());

    let mut interp = interpreter(&flags, b"\r\n");
    assert_eq!(feed(&mut interp, b"\r\n"), Outcome::Empty);
    assert!(interp.publisher().sent.is_empty());
}

#[test]
fn test_single_bounded_read_per_event() {
    let flags = EventGroup::new();
    let long = vec![b'x'; 600];
    let mut interp = interpreter(&flags, &long);
    let mut queue = MockQueue::default();

    interp.on_receive_event(UartEvent::Data(long.len()), &mut queue);

    assert_eq!(
        interp.transport().reads,
        vec![(SERIAL_BUFFER_SIZE - 1, READ_TIMEOUT_MS)]
    );
}

#[test]
fn test_no_stale_bytes_from_previous_line() {
    let flags = EventGroup::new();
    let mut interp = interpreter(&flags, b"xxxxxxx /v ok/r reg");
    let mut queue = MockQueue::default();

    assert_eq!(
        interp.on_receive_event(UartEvent::Data(13), &mut queue),
        Outcome::Voted(Choice::Ok)
    );
    // a shorter line must not pick up the tail of the previous one
    assert_eq!(
        interp.on_receive_event(UartEvent::Data(6), &mut queue),
        Outcome::Requested(Request::Register)
    );
    assert_eq!(interp.publisher().sent.len(), 1);
}

#[test]
fn test_fifo_overflow_resynchronizes() {
    let flags = EventGroup::new();
    let mut interp = interpreter(&flags, b"/v ok");
    let mut queue = MockQueue::default();
    queue.events.extend([UartEvent::Data(5), UartEvent::Data(3)]);

    assert_eq!(
        interp.on_receive_event(UartEvent::FifoOverflow, &mut queue),
        Outcome::Resynchronized
    );
    assert_eq!(interp.transport().flushes, 1);
    assert!(interp.transport().pending.is_empty());
    assert_eq!(queue.resets, 1);
    assert!(queue.events.is_empty());
    assert!(interp.publisher().sent.is_empty());
    assert_eq!(flags.bits(), 0);
}

#[test]
fn test_buffer_full_resynchronizes() {
    let flags = EventGroup::new();
    let mut interp = interpreter(&flags, b"/r reg");
    let mut queue = MockQueue::default();

    assert_eq!(
        interp.on_receive_event(UartEvent::BufferFull, &mut queue),
        Outcome::Resynchronized
    );
    assert_eq!(interp.transport().flushes, 1);
    assert_eq!(queue.resets, 1);
}

#[test]
fn test_line_errors_are_reported_only() {
    let flags = EventGroup::new();
    let mut interp = interpreter(&flags, b"/v ok");
    let mut queue = MockQueue::default();

    assert_eq!(
        interp.on_receive_event(UartEvent::ParityError, &mut queue),
        Outcome::LineError(LineError::Parity)
    );
    assert_eq!(
        interp.on_receive_event(UartEvent::FrameError, &mut queue),
        Outcome::LineError(LineError::Frame)
    );
    assert_eq!(
        interp.on_receive_event(UartEvent::Other(42), &mut queue),
        Outcome::UnknownEvent(42)
    );
    assert_eq!(interp.transport().flushes, 0);
    assert!(interp.transport().reads.is_empty());
    assert_eq!(queue.resets, 0);
    assert!(interp.publisher().sent.is_empty());
}

#[test]
fn test_publish_failure_is_not_retried() {
    let flags = EventGroup::new();
    let mut interp = CommandInterpreter::new(
        MockUart::with_input(b"/v neka"),
        RecordingPublisher {
            fail: true,
            ..Default::default()
        },
        &flags,
        device(),
    );
    let mut queue = MockQueue::default();

    assert_eq!(
        interp.on_receive_event(UartEvent::Data(7), &mut queue),
        Outcome::Voted(Choice::Neka)
    );
    assert_eq!(interp.publisher().sent.len(), 1);
}

#[test]
fn test_run_processes_events_in_order() {
    let flags = EventGroup::new();
    let mut interp = interpreter(&flags, b"/r csr/v lyckas");
    let mut queue = MockQueue::default();
    queue
        .events
        .extend([UartEvent::Data(6), UartEvent::ParityError, UartEvent::Data(9)]);

    interp.run(&mut queue);

    assert!(flags.is_set(Bit::CertificateRequested));
    assert_eq!(interp.publisher().sent.len(), 1);
    assert_eq!(interp.publisher().sent[0].payload, r#"{"val":"lyckas"}"#);
}
