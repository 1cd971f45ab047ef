//! Integration tests for the touch-to-datagram pipeline.
//!
//! These tests exercise tapdeck-sender end-to-end: an input source feeds
//! `ProcessTouchUseCase`, which submits to the real `OutboundQueue`, whose
//! sender task writes to a transport.  The last test goes over a loopback UDP
//! socket and decodes what arrives.

use std::io::Cursor;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tapdeck_core::{
    decode_event, ClassifierConfig, LayoutConfig, Mode, ModeHandle, SemanticEvent, TouchClassifier,
};
use tapdeck_sender::application::process_touch::ProcessTouchUseCase;
use tapdeck_sender::infrastructure::input_source::scripted::ScriptedTouchSource;
use tapdeck_sender::infrastructure::input_source::trace::TraceInputSource;
use tapdeck_sender::infrastructure::input_source::{InputSource, RawTouchEvent};
use tapdeck_sender::infrastructure::network::{
    DatagramTransport, OutboundQueue, TransportError, UdpTransport,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<String>>,
}

#[async_trait]
impl DatagramTransport for RecordingTransport {
    async fn send(&self, datagram: &[u8]) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push(String::from_utf8(datagram.to_vec()).unwrap());
        Ok(())
    }
}

fn classifier(mode: Mode) -> TouchClassifier {
    TouchClassifier::new(
        1000.0,
        800.0,
        LayoutConfig::default(),
        ClassifierConfig::default(),
        ModeHandle::new(mode),
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_touch_frames_through_queue_preserve_order() {
    // Arrange
    let transport = Arc::new(RecordingTransport::default());
    let (queue, sender_task) = OutboundQueue::spawn(64, Arc::clone(&transport));
    let mut use_case = ProcessTouchUseCase::new(classifier(Mode::Relative), Arc::new(queue));

    // Two fingers on keys, one dragging on the trackpad, one resting palm.
    let source = ScriptedTouchSource::new()
        .frame([
            RawTouchEvent::Down { id: 1, x: 150.0, y: 400.0, size: 40.0 },
            RawTouchEvent::Down { id: 2, x: 850.0, y: 400.0, size: 40.0 },
            RawTouchEvent::Down { id: 3, x: 300.0, y: 700.0, size: 40.0 },
            RawTouchEvent::Down { id: 4, x: 600.0, y: 700.0, size: 900.0 },
        ])
        .frame([
            RawTouchEvent::Move { id: 3, x: 306.0, y: 700.0, size: 40.0 },
            RawTouchEvent::Move { id: 4, x: 700.0, y: 700.0, size: 900.0 },
            RawTouchEvent::Up { id: 2 },
        ])
        .frame([RawTouchEvent::Up { id: 1 }, RawTouchEvent::Up { id: 3 }]);
    let rx = source.start().expect("start");

    // Act
    let stats = use_case.run(&rx, &AtomicBool::new(true));
    drop(use_case);
    let outbound = sender_task.await.expect("sender task");

    // Assert
    assert_eq!(
        *transport.sent.lock().unwrap(),
        vec!["KDs", "KDl", "12.0", "KUl", "KUs"]
    );
    assert_eq!(stats.events_produced, 5);
    assert_eq!(outbound.sent, 5);
}

#[tokio::test]
async fn test_trace_replay_with_mode_switch_and_resize() {
    // Arrange
    let trace = "\
# switch to absolute, then use a 2000 px wide surface
mode absolute
resize 2000 800
down 1 1000 700 40    # middle of the trackpad
move 1 1425 700 40
up 1
mode relative
down 2 1000 700 40
move 2 1010 700 40
up 2
";
    let transport = Arc::new(RecordingTransport::default());
    let (queue, sender_task) = OutboundQueue::spawn(64, Arc::clone(&transport));
    let mut use_case = ProcessTouchUseCase::new(classifier(Mode::Relative), Arc::new(queue));
    let source = TraceInputSource::from_reader("inline", Cursor::new(trace));

    // Act
    let rx = source.start().expect("start");
    use_case.run(&rx, &AtomicBool::new(true));
    drop(use_case);
    sender_task.await.expect("sender task");

    // Assert: trackpad spans 150..1850 on a 2000 px surface.
    assert_eq!(
        *transport.sent.lock().unwrap(),
        vec!["A0.5", "A0.75", "20.0"]
    );
}

#[tokio::test]
async fn test_tap_and_drag_on_pad_only_surface() {
    // Arrange: no keys, the whole surface is trackpad.
    let layout = LayoutConfig {
        left_keys: Vec::new(),
        right_keys: Vec::new(),
        trackpad_width: 1.0,
        trackpad_height: 1.0,
        trackpad_bottom_margin: 0.0,
        ..LayoutConfig::default()
    };
    let classifier = TouchClassifier::new(
        1000.0,
        800.0,
        layout,
        ClassifierConfig::default(),
        ModeHandle::new(Mode::Relative),
    );
    let transport = Arc::new(RecordingTransport::default());
    let (queue, sender_task) = OutboundQueue::spawn(64, Arc::clone(&transport));
    let mut use_case = ProcessTouchUseCase::new(classifier, Arc::new(queue));
    let source = ScriptedTouchSource::new()
        .tap(1, 150.0, 400.0)
        .drag(2, (100.0, 100.0), (140.0, 500.0), 4);

    // Act
    let rx = source.start().expect("start");
    use_case.run(&rx, &AtomicBool::new(true));
    drop(use_case);
    sender_task.await.expect("sender task");

    // Assert: the tap is silent, each 10 px step becomes a 20.0 delta.
    assert_eq!(*transport.sent.lock().unwrap(), vec!["20.0", "20.0", "20.0", "20.0"]);
}

#[tokio::test]
async fn test_disconnect_stops_sending_but_classifier_keeps_running() {
    let transport = Arc::new(RecordingTransport::default());
    let (queue, sender_task) = OutboundQueue::spawn(64, Arc::clone(&transport));
    let mut use_case = ProcessTouchUseCase::new(classifier(Mode::Relative), Arc::new(queue.clone()));

    queue.disconnect();
    let down = use_case.handle_event(RawTouchEvent::Down { id: 1, x: 150.0, y: 400.0, size: 40.0 });
    let up = use_case.handle_event(RawTouchEvent::Up { id: 1 });

    assert_eq!(down, Some(SemanticEvent::KeyDown('s')));
    assert_eq!(up, Some(SemanticEvent::KeyUp('s')));
    assert_eq!(use_case.stats().datagrams_dropped, 2);

    drop(use_case);
    drop(queue);
    let outbound = sender_task.await.expect("sender task");
    assert_eq!(outbound.sent, 0);
    assert!(transport.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_udp_loopback_delivers_decodable_datagrams() {
    // Arrange: a stand-in receiver on an ephemeral loopback port.
    let receiver = tokio::net::UdpSocket::bind("127.0.0.1:0").await.expect("bind");
    let port = receiver.local_addr().unwrap().port();
    let transport = UdpTransport::connect("127.0.0.1", "127.0.0.1", port)
        .await
        .expect("connect");
    let (queue, sender_task) = OutboundQueue::spawn(16, Arc::new(transport));
    let mut use_case = ProcessTouchUseCase::new(classifier(Mode::Relative), Arc::new(queue));

    // Act
    use_case.handle_event(RawTouchEvent::Down { id: 9, x: 600.0, y: 400.0, size: 40.0 });
    use_case.handle_event(RawTouchEvent::Up { id: 9 });
    drop(use_case);
    sender_task.await.expect("sender task");

    // Assert
    let mut received = Vec::new();
    let mut buf = [0u8; 64];
    for _ in 0..2 {
        let (len, _) = receiver.recv_from(&mut buf).await.expect("recv");
        received.push(decode_event(&buf[..len]).expect("decodable"));
    }
    assert_eq!(
        received,
        vec![SemanticEvent::KeyDown('j'), SemanticEvent::KeyUp('j')]
    );
}
