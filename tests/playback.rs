use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use approx::assert_relative_eq;
use legato_frame::{
    config::Config,
    harness::{Connection, ConnectionEntry, FrameHarness, NodeKey, get_node_test_harness},
    msg::{LegatoMsg, NodeMessage, RtValue},
    nodes::audio::{BufferPlayer, MulAdd},
    sample::{AudioSample, build_sample_slot},
};

fn entry(node_key: NodeKey, port_index: usize) -> ConnectionEntry {
    ConnectionEntry {
        node_key,
        port_index,
    }
}

fn ramp() -> Arc<AudioSample> {
    Arc::new(AudioSample::mono(vec![10.0, 20.0, 30.0, 40.0]))
}

fn first_channel(harness: &mut FrameHarness, frames: usize) -> Vec<f32> {
    (0..frames)
        .map(|_| harness.next_frame()[0].first().copied().unwrap_or(f32::NAN))
        .collect()
}

#[test]
fn one_shot_stops_and_completes_once() {
    let completed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&completed);
    let player = BufferPlayer::new(ramp(), 1.0, 0.0, false).with_on_complete(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let mut harness = get_node_test_harness(Box::new(player)).unwrap();

    let heard = first_channel(&mut harness, 3);
    assert_eq!(heard, vec![10.0, 20.0, 30.0]);
    assert_eq!(completed.load(Ordering::SeqCst), 0);

    // The fourth frame plays the last sample and runs off the end
    let heard = first_channel(&mut harness, 5);
    assert_eq!(heard, vec![40.0, 0.0, 0.0, 0.0, 0.0]);
    assert_eq!(completed.load(Ordering::SeqCst), 1);
}

#[test]
fn trigger_restarts_a_finished_player() {
    let mut harness = get_node_test_harness(Box::new(BufferPlayer::new(ramp(), 2.0, 1.0, false))).unwrap();
    let key = harness.sink_key().unwrap();

    assert_eq!(first_channel(&mut harness, 3), vec![20.0, 40.0, 0.0]);

    harness.set_input(entry(key, 1), &[1.0]).unwrap();
    assert_eq!(first_channel(&mut harness, 2), vec![20.0, 40.0]);

    // Held high, no further restarts
    assert_eq!(first_channel(&mut harness, 1), vec![0.0]);

    harness.set_input(entry(key, 1), &[0.0]).unwrap();
    harness.next_frame();
    harness.set_input(entry(key, 1), &[0.5]).unwrap();
    assert_eq!(first_channel(&mut harness, 1), vec![20.0]);
}

#[test]
fn modulated_rate_from_upstream() {
    let mut harness = FrameHarness::new(Config::default()).unwrap();

    let rate = harness
        .add_node(Box::new(MulAdd::new(0.0, 1.0)), "rate".into(), "mul_add".into())
        .unwrap();
    let player = harness
        .add_node(
            Box::new(BufferPlayer::new(ramp(), 1.0, 0.0, true)),
            "player".into(),
            "buffer_player".into(),
        )
        .unwrap();
    harness
        .connect(Connection {
            source: entry(rate, 0),
            sink: entry(player, 0),
        })
        .unwrap();
    harness.set_sink_key(player).unwrap();

    assert_eq!(first_channel(&mut harness, 3), vec![10.0, 20.0, 30.0]);

    // Rate source now outputs -1, the head walks backwards and wraps
    harness.handle_msg(LegatoMsg::NodeMessage(
        rate,
        NodeMessage::set_param("add", RtValue::F32(-1.0)),
    ));
    assert_eq!(first_channel(&mut harness, 5), vec![40.0, 30.0, 20.0, 10.0, 40.0]);
}

#[test]
fn stereo_sample_through_gain() {
    let stereo = AudioSample::from_interleaved(&[1.0, -1.0, 0.5, -0.5], 2).unwrap();

    let mut harness = FrameHarness::new(Config::default()).unwrap();
    let player = harness
        .add_node(
            Box::new(BufferPlayer::new(Arc::new(stereo), 1.0, 0.0, true)),
            "player".into(),
            "buffer_player".into(),
        )
        .unwrap();
    let gain = harness
        .add_node(Box::new(MulAdd::new(0.5, 0.25)), "gain".into(), "mul_add".into())
        .unwrap();
    harness
        .connect(Connection {
            source: entry(player, 0),
            sink: entry(gain, 0),
        })
        .unwrap();
    harness.set_sink_key(gain).unwrap();

    assert_eq!(harness.output_channels(gain, 0), Some(2));

    let out = harness.next_frame();
    assert_eq!(out[0].as_slice(), &[0.75, -0.25]);
    let out = harness.next_frame();
    assert_eq!(out[0].as_slice(), &[0.5, 0.0]);
}

#[test]
fn published_sample_plays_from_start() {
    let (handle, frontend) = build_sample_slot();
    let player = BufferPlayer::from_handle(handle, 1, 1.0, 1.0, false);
    let mut harness = get_node_test_harness(Box::new(player)).unwrap();

    // Nothing published yet
    assert_eq!(first_channel(&mut harness, 2), vec![0.0, 0.0]);

    frontend.publish(ramp());
    assert_eq!(first_channel(&mut harness, 4), vec![20.0, 30.0, 40.0, 0.0]);

    frontend.publish(Arc::new(AudioSample::mono(vec![1.0, 2.0, 3.0])));
    assert_eq!(first_channel(&mut harness, 3), vec![2.0, 3.0, 0.0]);

    frontend.clear();
    assert_eq!(first_channel(&mut harness, 1), vec![0.0]);
}

#[test]
fn fractional_rate_reads_nearest_frame() {
    let mut harness = get_node_test_harness(Box::new(BufferPlayer::new(ramp(), 0.5, 0.0, false))).unwrap();

    let heard = first_channel(&mut harness, 9);
    assert_eq!(heard, vec![10.0, 10.0, 20.0, 20.0, 30.0, 30.0, 40.0, 40.0, 0.0]);
    assert_relative_eq!(harness.get_context().elapsed_secs(), 9.0 / 48_000.0);
}
