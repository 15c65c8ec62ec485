//! Mechanism scheduling
//!
//! The figure has four on/off actuators. Each one is driven by a list of
//! toggle instants; the scheduler samples all four against the mechanism
//! clock and packs two consecutive samples ("half-ticks") into one byte:
//!
//! | Bits | Half-tick | Channels                           |
//! |------|-----------|------------------------------------|
//! | 0..4 | first     | Legs, Mouth, LeftEye, RightEye     |
//! | 4..8 | second    | Legs, Mouth, LeftEye, RightEye     |
//!
//! The firmware latches the low nibble when it reads the byte and the high
//! nibble half a period later.
//!
//! Half-tick `k` is evaluated at exactly `k / mech_rate`. Images built by
//! the legacy programming tool can differ for instants that sit on a
//! half-tick boundary: it accumulated `t += 1/mech_rate`, and the rounding
//! drift can push such a flip one half-tick later. A toggle at 0.2 s flips
//! on half-tick 8 here but on half-tick 9 there.

use std::fmt;

use tracing::warn;

/// Actuator channel. The discriminant is the bit position in a nibble.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Legs = 0,
    Mouth = 1,
    LeftEye = 2,
    RightEye = 3,
}

pub const CHANNEL_COUNT: usize = 4;

impl Channel {
    pub const ALL: [Channel; CHANNEL_COUNT] =
        [Channel::Legs, Channel::Mouth, Channel::LeftEye, Channel::RightEye];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Mask within a low nibble.
    pub fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Channel::Legs => "legs",
            Channel::Mouth => "mouth",
            Channel::LeftEye => "left eye",
            Channel::RightEye => "right eye",
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Toggle {
    #[default]
    Off,
    On,
}

impl Toggle {
    pub fn flipped(self) -> Self {
        match self {
            Toggle::Off => Toggle::On,
            Toggle::On => Toggle::Off,
        }
    }

    pub fn is_on(self) -> bool {
        self == Toggle::On
    }
}

/// Toggle instants in seconds for each channel, indexed by [`Channel`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MechanismProgram {
    channels: [Vec<f64>; CHANNEL_COUNT],
}

impl MechanismProgram {
    pub fn new(channels: [Vec<f64>; CHANNEL_COUNT]) -> Self {
        Self { channels }
    }

    pub fn toggles(&self, channel: Channel) -> &[f64] {
        &self.channels[channel.index()]
    }

    pub fn set_toggles(&mut self, channel: Channel, toggles: Vec<f64>) {
        self.channels[channel.index()] = toggles;
    }

    pub fn is_silent(&self) -> bool {
        self.channels.iter().all(Vec::is_empty)
    }
}

/// One channel's state machine: current state plus a cursor into its toggles.
#[derive(Clone, Debug)]
struct ChannelTrack<'a> {
    toggles: &'a [f64],
    cursor: usize,
    state: Toggle,
    /// Flips applied at least one half-tick after they were due.
    late: usize,
}

impl<'a> ChannelTrack<'a> {
    fn new(toggles: &'a [f64]) -> Self {
        Self { toggles, cursor: 0, state: Toggle::Off, late: 0 }
    }

    /// Evaluate the half-tick at `t`. At most one flip is applied per
    /// half-tick; further due instants wait for the following half-ticks.
    fn step(&mut self, t: f64, prev_t: Option<f64>) -> Toggle {
        if let Some(&due) = self.toggles.get(self.cursor) {
            if due <= t {
                self.state = self.state.flipped();
                self.cursor += 1;
                if prev_t.is_some_and(|p| due <= p) {
                    self.late += 1;
                }
            }
        }
        self.state
    }
}

/// Produces packed mechanism bytes, one per pair of half-ticks.
pub struct MechanismScheduler<'a> {
    tracks: [ChannelTrack<'a>; CHANNEL_COUNT],
    mech_rate: u32,
    half_tick: u64,
    remaining: usize,
}

impl<'a> MechanismScheduler<'a> {
    pub fn new(program: &'a MechanismProgram, mech_rate: u32, bytes: usize) -> Self {
        Self {
            tracks: Channel::ALL.map(|c| ChannelTrack::new(program.toggles(c))),
            mech_rate,
            half_tick: 0,
            remaining: bytes,
        }
    }

    // Derived from the tick index so the clock does not drift over a long song.
    fn time_of(&self, half_tick: u64) -> f64 {
        half_tick as f64 / self.mech_rate as f64
    }

    fn evaluate(&mut self) -> u8 {
        let t = self.time_of(self.half_tick);
        let prev = self.half_tick.checked_sub(1).map(|k| self.time_of(k));
        self.half_tick += 1;

        let mut nibble = 0;
        for (channel, track) in Channel::ALL.into_iter().zip(self.tracks.iter_mut()) {
            if track.step(t, prev).is_on() {
                nibble |= channel.bit();
            }
        }
        nibble
    }

    /// Flips applied late on each channel because several instants fell
    /// within one half-tick.
    pub fn late_flips(&self) -> [usize; CHANNEL_COUNT] {
        std::array::from_fn(|i| self.tracks[i].late)
    }

    /// Instants never reached before the last byte.
    pub fn unplayed(&self) -> [usize; CHANNEL_COUNT] {
        std::array::from_fn(|i| self.tracks[i].toggles.len() - self.tracks[i].cursor)
    }
}

impl Iterator for MechanismScheduler<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let low = self.evaluate();
        let high = self.evaluate();
        Some(low | (high << 4))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for MechanismScheduler<'_> {}

/// Schedule `bytes` mechanism bytes for `program`, warning about instants
/// that could not be honored on time.
pub fn schedule(program: &MechanismProgram, mech_rate: u32, bytes: usize) -> Vec<u8> {
    let mut scheduler = MechanismScheduler::new(program, mech_rate, bytes);
    let out: Vec<u8> = scheduler.by_ref().collect();

    let counts = scheduler.late_flips().into_iter().zip(scheduler.unplayed());
    for (channel, (late, unplayed)) in Channel::ALL.into_iter().zip(counts) {
        if late > 0 {
            warn!(
                "{} channel has {} toggle(s) closer than one half-tick; they are played late",
                channel, late
            );
        }
        if unplayed > 0 {
            warn!("{} channel has {} toggle(s) past the end of the audio", channel, unplayed);
        }
    }
    out
}
