use criterion::{Criterion, Throughput};
use std::hint::black_box;
use stationlink::config::DeviceConfig;
use stationlink::network::application::mqtt::{Publisher, QoS};
use stationlink::signal::EventGroup;
use stationlink::system::command::classify;
use stationlink::system::interpreter::CommandInterpreter;
use stationlink::system::queue::EventQueue;
use stationlink::system::serial::{SerialTransport, UartEvent};

const LINES: &[&str] = &[
    "/v ok",
    "please vote /v starta now",
    ":good game everyone",
    "/r start",
    "completely unrelated console noise that matches nothing at all",
];

struct LoopbackUart {
    line: &'static [u8],
}

impl SerialTransport for LoopbackUart {
    type Error = ();

    fn read_bytes(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.line.len());
        buf[..n].copy_from_slice(&self.line[..n]);
        Ok(n)
    }

    fn flush_input(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

struct NullPublisher;

impl Publisher for NullPublisher {
    type Error = ();

    fn publish(&mut self, _: &str, payload: &[u8], _: QoS, _: bool) -> Result<(), Self::Error> {
        black_box(payload);
        Ok(())
    }
}

struct NoQueue;

impl EventQueue<UartEvent> for NoQueue {
    fn receive(&mut self) -> Option<UartEvent> {
        None
    }

    fn reset(&mut self) {}
}

pub fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    for line in LINES {
        group.throughput(Throughput::Bytes(line.len() as u64));
        group.bench_function(*line, |b| b.iter(|| classify(black_box(line))));
    }
    group.finish();
}

pub fn bench_dispatch(c: &mut Criterion) {
    let flags = EventGroup::new();
    let device = DeviceConfig::new("7f3a", "game/player/7f3a", "game/torget").unwrap();
    let line: &'static [u8] = b":good game everyone";
    let mut interpreter =
        CommandInterpreter::new(LoopbackUart { line }, NullPublisher, &flags, device);

    c.bench_function("dispatch_chat", |b| {
        b.iter(|| interpreter.on_receive_event(UartEvent::Data(line.len()), &mut NoQueue))
    });
}
