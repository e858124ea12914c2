//! End-to-end playback: sequencer ticks through the command queue into the
//! render engine, and the workstation's clock thread drives the transport.

use std::thread;
use std::time::{Duration, Instant};

use gs_engine::{
    shared_grid, CommandSender, DrumBank, Engine, EngineSettings, StepSequencer, Track, VoiceCommand,
};
use gs_ir::{Bpm, EnvelopeMode, PatternGrid, PitchKey};
use gs_master::{TransportState, WorkstationBuilder, WorkstationConfig};

const SR: u32 = 8_000;

fn rig(grid: PatternGrid) -> (Engine, StepSequencer, CommandSender) {
    rig_with_capacity(grid, EngineSettings::default().command_capacity)
}

fn rig_with_capacity(grid: PatternGrid, command_capacity: usize) -> (Engine, StepSequencer, CommandSender) {
    let settings = EngineSettings { sample_rate: SR, command_capacity, ..EngineSettings::default() };
    let (engine, tx) = Engine::new(settings, DrumBank::builtin(SR));
    let mut sequencer = StepSequencer::new(Bpm::default());
    sequencer
        .add_track(Track::melodic(shared_grid(grid), PitchKey(0), EnvelopeMode::Hold))
        .unwrap();
    (engine, sequencer, tx)
}

#[test]
fn top_row_plays_highest_pitch() {
    // 4x4 melodic grid, one cell at row 0 column 0, base pitch C1
    let (mut engine, mut seq, mut tx) = rig(PatternGrid::from_bit_str(4, 4, "1000000000000000"));
    seq.play().unwrap();

    assert_eq!(seq.tick(&mut tx), Some(0));
    engine.render_frames(64, 1);
    let voice = engine.voices().iter().next().copied().unwrap();
    assert_eq!(voice.key, PitchKey(3));
    assert!(voice.is_held());

    // empty column 1 releases it
    assert_eq!(seq.tick(&mut tx), Some(1));
    engine.render_frames(64, 1);
    assert!(engine.voices().get(PitchKey(3)).map_or(true, |v| !v.is_held()));
}

#[test]
fn cursor_cycles_through_columns() {
    let (_engine, mut seq, mut tx) = rig(PatternGrid::new(4, 4));
    seq.play().unwrap();
    let played: Vec<_> = (0..6).map(|_| seq.tick(&mut tx)).collect();
    assert_eq!(played, vec![Some(0), Some(1), Some(2), Some(3), Some(0), Some(1)]);
}

#[test]
fn stop_silences_within_one_pass() {
    let (mut engine, mut seq, mut tx) = rig(PatternGrid::from_bit_str(4, 4, "1111000000000000"));
    seq.play().unwrap();
    seq.tick(&mut tx);
    assert!(engine.render_frames(256, 2).iter().any(|&s| s != 0.0));

    seq.stop(&mut tx);
    let out = engine.render_frames(256, 2);
    assert!(out.iter().all(|&s| s == 0.0));
    assert!(engine.voices().is_empty());
    assert_eq!(seq.state(), TransportState::Stopped);
    assert_eq!(seq.cursor(), 0);
}

#[test]
fn stop_silences_with_full_command_queue() {
    // column 0 holds all four rows
    let (mut engine, mut seq, mut tx) = rig_with_capacity(PatternGrid::from_bit_str(4, 4, "1000100010001000"), 4);
    seq.play().unwrap();
    seq.tick(&mut tx);
    assert!(engine.render_frames(256, 2).iter().any(|&s| s != 0.0));
    assert_eq!(engine.voices().active_count(), 4);

    let filler = VoiceCommand::NoteOn { key: PitchKey(9), frequency: 440.0, mode: EnvelopeMode::Hold };
    let mut queued = 0;
    while tx.send(filler) {
        queued += 1;
        assert!(queued <= 4, "queue should fill at its capacity");
    }
    assert_eq!(queued, 4);

    seq.stop(&mut tx);
    for _ in 0..2 {
        assert!(engine.render_frames(256, 2).iter().all(|&s| s == 0.0));
        assert!(engine.voices().is_empty());
    }
    assert_eq!(seq.state(), TransportState::Stopped);
}

#[test]
fn stop_from_pause_silences_held_voices() {
    let (mut engine, mut seq, mut tx) = rig(PatternGrid::from_bit_str(4, 4, "1000100000000000"));
    seq.play().unwrap();
    seq.tick(&mut tx);
    assert!(engine.render_frames(256, 2).iter().any(|&s| s != 0.0));

    seq.pause();
    assert_eq!(seq.state(), TransportState::Paused);
    assert_eq!(seq.tick(&mut tx), None);
    // held notes keep sounding while paused
    assert!(engine.render_frames(256, 2).iter().any(|&s| s != 0.0));
    assert_eq!(engine.voices().active_count(), 2);

    seq.stop(&mut tx);
    assert!(engine.render_frames(256, 2).iter().all(|&s| s == 0.0));
    assert!(engine.voices().is_empty());
    assert_eq!(seq.state(), TransportState::Stopped);
    assert_eq!(seq.highlighted_column(), None);
    assert_eq!(seq.cursor(), 0);
}

#[test]
fn workstation_clock_advances_highlight() {
    let config = WorkstationConfig { sample_rate: SR, default_bpm: 600.0, ..Default::default() };
    let mut ws = WorkstationBuilder::headless(config).build().unwrap();
    ws.drum_grid().write().unwrap().set(0, 0, true);

    ws.play().unwrap();
    let started = Instant::now();
    while ws.highlighted_column().is_none() && started.elapsed() < Duration::from_secs(5) {
        thread::sleep(Duration::from_millis(1));
    }
    assert!(ws.highlighted_column().is_some());
    assert!(ws.output_mut().render_pass(512).iter().any(|&s| s != 0.0));

    ws.pause();
    assert_eq!(ws.transport_state(), TransportState::Paused);
    let paused_at = ws.cursor();
    thread::sleep(Duration::from_millis(60));
    assert_eq!(ws.cursor(), paused_at);

    ws.stop();
    assert_eq!(ws.highlighted_column(), None);
    assert!(ws.output_mut().render_pass(512).iter().all(|&s| s == 0.0));
}
