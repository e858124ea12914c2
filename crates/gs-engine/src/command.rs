//! Command queue between control threads and the render engine.
//!
//! A bounded SPSC ring of `Copy` commands is the only hand-off point into
//! the render thread. The producer half is shared by any number of
//! non-real-time callers behind a mutex; the consumer half lives inside the
//! [`Engine`](crate::Engine) and is drained without locking at the start of
//! every render pass.
//!
//! Killing every voice does not go through the ring, so it cannot be lost
//! to a full queue. Each command is stamped with the kill generation it was
//! sent in; a kill bumps the generation, and the receiver discards anything
//! stamped before it.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use gs_ir::{EnvelopeMode, PitchKey, SynthParams};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use tracing::{debug, warn};

/// Default queue depth.
pub const DEFAULT_COMMAND_CAPACITY: usize = 1024;

/// One state change for the render engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VoiceCommand {
    NoteOn { key: PitchKey, frequency: f32, mode: EnvelopeMode },
    NoteOff { key: PitchKey },
    /// Release every voice, or silence them before the next frame.
    AllNotesOff { immediate: bool },
    TriggerDrum { lane: usize },
    /// Replace the synth parameter set (preset load).
    SetParams(SynthParams),
    SetMasterVolume(f32),
}

/// What the receiver hands out in place of a kill.
const KILL: VoiceCommand = VoiceCommand::AllNotesOff { immediate: true };

/// A queued command and the kill generation it was sent in.
#[derive(Clone, Copy, Debug)]
struct Stamped {
    generation: u32,
    command: VoiceCommand,
}

/// True if `a` was issued after `b`, allowing for wrap-around.
fn is_newer(a: u32, b: u32) -> bool {
    (a.wrapping_sub(b) as i32) > 0
}

/// Anything that accepts note events: the live queue, or a test recorder.
pub trait VoiceSink {
    fn note_on(&mut self, key: PitchKey, frequency: f32, mode: EnvelopeMode);
    fn note_off(&mut self, key: PitchKey);
    fn trigger_drum(&mut self, lane: usize);
    fn all_notes_off(&mut self, immediate: bool);
}

/// Cloneable producer handle.
#[derive(Clone)]
pub struct CommandSender {
    producer: Arc<Mutex<HeapProd<Stamped>>>,
    kills: Arc<AtomicU32>,
    drum_lanes: usize,
}

/// Consumer half, owned by the render engine.
pub struct CommandReceiver {
    consumer: HeapCons<Stamped>,
    kills: Arc<AtomicU32>,
    /// Generation of the last kill handed out.
    seen: u32,
    /// Command popped together with a kill it revealed.
    held: Option<VoiceCommand>,
}

/// Create a queue holding up to `capacity` pending commands.
///
/// `drum_lanes` is the lane count of the drum bank the receiver feeds;
/// the sender rejects triggers outside it before they are queued.
pub fn command_queue(capacity: usize, drum_lanes: usize) -> (CommandSender, CommandReceiver) {
    let (producer, consumer) = HeapRb::<Stamped>::new(capacity.max(1)).split();
    let kills = Arc::new(AtomicU32::new(0));
    (
        CommandSender { producer: Arc::new(Mutex::new(producer)), kills: kills.clone(), drum_lanes },
        CommandReceiver { consumer, kills, seen: 0, held: None },
    )
}

impl CommandSender {
    /// Queue a command. A full queue drops it with a warning and returns false.
    pub fn send(&self, command: VoiceCommand) -> bool {
        let mut producer = self.producer.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = self.kills.load(Ordering::Acquire);
        match producer.try_push(Stamped { generation, command }) {
            Ok(()) => true,
            Err(dropped) => {
                warn!(command = ?dropped.command, "command queue full, dropping command");
                false
            }
        }
    }

    /// Silence every voice and drum lane at the start of the next render
    /// pass, and discard whatever is still queued. Never dropped, even when
    /// the queue is full.
    pub fn kill(&self) {
        // Held so no send can stamp the old generation after the bump.
        let _producer = self.producer.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = self.kills.fetch_add(1, Ordering::AcqRel).wrapping_add(1);
        debug!(generation, "kill issued");
    }

    pub fn drum_lanes(&self) -> usize {
        self.drum_lanes
    }

    /// Commands waiting to be consumed.
    pub fn pending(&self) -> usize {
        self.producer.lock().unwrap_or_else(PoisonError::into_inner).occupied_len()
    }

    /// Queue a drum hit. Unknown lanes are reported and dropped.
    pub fn trigger(&self, lane: usize) -> bool {
        if lane >= self.drum_lanes {
            warn!(lane, lanes = self.drum_lanes, "drum trigger ignored: lane out of range");
            return false;
        }
        self.send(VoiceCommand::TriggerDrum { lane })
    }

    pub fn set_params(&self, params: SynthParams) -> bool {
        self.send(VoiceCommand::SetParams(params))
    }

    /// Queue a master volume change. Non-finite values are rejected.
    pub fn set_master_volume(&self, volume: f32) -> bool {
        if !volume.is_finite() {
            warn!(volume, "master volume ignored: not a finite number");
            return false;
        }
        self.send(VoiceCommand::SetMasterVolume(volume.clamp(0.0, 1.0)))
    }
}

impl VoiceSink for CommandSender {
    fn note_on(&mut self, key: PitchKey, frequency: f32, mode: EnvelopeMode) {
        self.send(VoiceCommand::NoteOn { key, frequency, mode });
    }

    fn note_off(&mut self, key: PitchKey) {
        self.send(VoiceCommand::NoteOff { key });
    }

    fn trigger_drum(&mut self, lane: usize) {
        self.trigger(lane);
    }

    fn all_notes_off(&mut self, immediate: bool) {
        if immediate {
            self.kill();
        } else {
            self.send(VoiceCommand::AllNotesOff { immediate });
        }
    }
}

impl CommandReceiver {
    /// Next command to apply. A pending kill comes out as
    /// `AllNotesOff { immediate: true }` ahead of anything sent after it;
    /// commands sent before it are skipped.
    #[inline]
    pub fn pop(&mut self) -> Option<VoiceCommand> {
        if let Some(command) = self.held.take() {
            return Some(command);
        }
        let latest = self.kills.load(Ordering::Acquire);
        if latest != self.seen {
            self.seen = latest;
            return Some(KILL);
        }
        while let Some(Stamped { generation, command }) = self.consumer.try_pop() {
            if generation == self.seen {
                return Some(command);
            }
            if is_newer(generation, self.seen) {
                self.seen = generation;
                self.held = Some(command);
                return Some(KILL);
            }
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_none() && self.consumer.is_empty() && self.kills.load(Ordering::Acquire) == self.seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_arrive_in_order() {
        let (mut tx, mut rx) = command_queue(8, 5);
        tx.note_on(PitchKey(1), 34.6, EnvelopeMode::Hold);
        tx.note_off(PitchKey(1));
        tx.trigger_drum(2);
        assert!(matches!(rx.pop(), Some(VoiceCommand::NoteOn { key: PitchKey(1), .. })));
        assert_eq!(rx.pop(), Some(VoiceCommand::NoteOff { key: PitchKey(1) }));
        assert_eq!(rx.pop(), Some(VoiceCommand::TriggerDrum { lane: 2 }));
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn full_queue_drops() {
        let (tx, mut rx) = command_queue(2, 0);
        assert!(tx.send(VoiceCommand::AllNotesOff { immediate: false }));
        assert!(tx.send(VoiceCommand::AllNotesOff { immediate: false }));
        assert!(!tx.send(VoiceCommand::AllNotesOff { immediate: true }));
        assert_eq!(tx.pending(), 2);
        rx.pop();
        rx.pop();
        assert!(rx.is_empty());
    }

    #[test]
    fn out_of_range_lane_is_not_queued() {
        let (tx, rx) = command_queue(4, 5);
        assert!(!tx.trigger(5));
        assert!(rx.is_empty());
        assert!(tx.trigger(4));
    }

    #[test]
    fn master_volume_is_validated() {
        let (tx, mut rx) = command_queue(4, 0);
        assert!(!tx.set_master_volume(f32::NAN));
        assert!(tx.set_master_volume(3.0));
        assert_eq!(rx.pop(), Some(VoiceCommand::SetMasterVolume(1.0)));
    }

    #[test]
    fn kill_gets_through_a_full_queue() {
        let (mut tx, mut rx) = command_queue(4, 0);
        for k in 0..4 {
            tx.note_on(PitchKey(k), 40.0, EnvelopeMode::Hold);
        }
        assert!(!tx.send(VoiceCommand::NoteOff { key: PitchKey(0) }));

        tx.all_notes_off(true);
        assert!(!rx.is_empty());
        assert_eq!(rx.pop(), Some(VoiceCommand::AllNotesOff { immediate: true }));
        // everything queued before the kill is gone
        assert_eq!(rx.pop(), None);
        assert!(rx.is_empty());
    }

    #[test]
    fn commands_after_kill_survive() {
        let (mut tx, mut rx) = command_queue(8, 0);
        tx.note_on(PitchKey(1), 40.0, EnvelopeMode::Hold);
        tx.all_notes_off(true);
        tx.note_on(PitchKey(2), 40.0, EnvelopeMode::Hold);
        assert_eq!(rx.pop(), Some(VoiceCommand::AllNotesOff { immediate: true }));
        assert!(matches!(rx.pop(), Some(VoiceCommand::NoteOn { key: PitchKey(2), .. })));
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn kill_during_drain_is_applied_in_order() {
        let (mut tx, mut rx) = command_queue(8, 0);
        tx.note_on(PitchKey(1), 40.0, EnvelopeMode::Hold);
        assert!(matches!(rx.pop(), Some(VoiceCommand::NoteOn { key: PitchKey(1), .. })));
        tx.note_on(PitchKey(2), 40.0, EnvelopeMode::Hold);
        tx.all_notes_off(true);
        tx.note_on(PitchKey(3), 40.0, EnvelopeMode::Hold);
        assert_eq!(rx.pop(), Some(VoiceCommand::AllNotesOff { immediate: true }));
        assert!(matches!(rx.pop(), Some(VoiceCommand::NoteOn { key: PitchKey(3), .. })));
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn generation_comparison_wraps() {
        assert!(is_newer(1, 0));
        assert!(is_newer(0, u32::MAX));
        assert!(!is_newer(5, 5));
        assert!(!is_newer(u32::MAX, 0));
    }

    #[test]
    fn clones_share_one_queue() {
        let (tx, mut rx) = command_queue(4, 0);
        let tx2 = tx.clone();
        std::thread::spawn(move || tx2.send(VoiceCommand::AllNotesOff { immediate: true }))
            .join()
            .unwrap();
        assert_eq!(rx.pop(), Some(VoiceCommand::AllNotesOff { immediate: true }));
    }
}
