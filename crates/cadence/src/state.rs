//! # Game State Machine
//!
//! The game flows through three states:
//!
//! - **Start**: title screen. Pressing `A` posts `GameStart` and switches to
//!   Rhythmic.
//! - **Rhythmic**: the song. Each beat expects one button from the pattern;
//!   a matching press within the hit window posts `PlayerSuccess`, any other
//!   press posts `PlayerFail`, and a beat whose window closes without a hit
//!   posts `PlayerFail`. After the configured number of bars the machine
//!   switches to End.
//! - **End**: shows the score. Pressing `A` returns to Start.
//!
//! States sit on a stack so an overlay can be pushed over the current state
//! and popped later. The machine is pure: it sees input and music position
//! and writes events to an [`EventSink`], nothing else.

use std::fmt;

use cadence_shared::{Buttons, GamepadSnapshot, MusicPos};

use crate::events::{EventSink, FrameEvent};

/// Timing and pattern rules for the rhythmic state.
#[derive(Clone, Debug, PartialEq)]
pub struct RhythmRules {
    /// Beats in one bar.
    pub beats_per_bar: u32,
    /// Half-width of the hit window around a beat, in beats.
    pub hit_window: f32,
    /// Song length in bars.
    pub song_bars: u32,
    /// Expected button per beat, repeating.
    pub pattern: Vec<Buttons>,
}

impl Default for RhythmRules {
    fn default() -> Self {
        Self {
            beats_per_bar: 4,
            hit_window: 0.15,
            song_bars: 8,
            pattern: vec![Buttons::A, Buttons::A, Buttons::B, Buttons::A],
        }
    }
}

impl RhythmRules {
    /// Button expected on song beat `beat` (counted from the song's start).
    #[must_use]
    pub fn expected(&self, beat: u64) -> Buttons {
        if self.pattern.is_empty() {
            return Buttons::A;
        }
        let len = self.pattern.len() as u64;
        // `beat % len < len <= usize::MAX`
        #[allow(clippy::cast_possible_truncation)]
        let index = (beat % len) as usize;
        self.pattern[index]
    }

    const fn song_beats(&self) -> u64 {
        self.song_bars as u64 * self.beats_per_bar as u64
    }
}

/// Hits and misses over one song.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Score {
    /// Beats hit on time with the right button.
    pub hits: u32,
    /// Wrong presses, off-beat presses and missed beats.
    pub misses: u32,
}

impl Score {
    fn record(&mut self, event: FrameEvent) {
        match event {
            FrameEvent::PlayerSuccess => self.hits += 1,
            FrameEvent::PlayerFail => self.misses += 1,
            FrameEvent::GameStart | FrameEvent::Destroy { .. } => {}
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} hits / {} misses", self.hits, self.misses)
    }
}

/// Which state is active, without its data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateKind {
    /// Title screen.
    Start,
    /// Song in progress.
    Rhythmic,
    /// Results screen.
    End,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::Rhythmic => "rhythmic",
            Self::End => "end",
        })
    }
}

/// Progress through one song.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RhythmicState {
    /// Absolute beat the song started on; set on the first beat after entry.
    start: Option<u64>,
    /// Song beats below this are judged.
    next_unjudged: u64,
    /// Bit `i` set: song beat `next_unjudged + i` was hit in its open window.
    hits_ahead: u8,
    score: Score,
}

impl RhythmicState {
    /// Hits and misses so far.
    #[must_use]
    pub const fn score(&self) -> Score {
        self.score
    }

    /// Whether the first beat has arrived.
    #[must_use]
    pub const fn has_started(&self) -> bool {
        self.start.is_some()
    }

    fn post(&mut self, events: &mut dyn EventSink, event: FrameEvent) {
        self.score.record(event);
        events.post(event);
    }

    #[allow(clippy::cast_precision_loss)]
    fn update(
        &mut self,
        rules: &RhythmRules,
        mp: MusicPos,
        pad: GamepadSnapshot,
        events: &mut dyn EventSink,
    ) -> Transition {
        let Some(start) = self.start else {
            return Transition::None;
        };
        let absolute = mp.absolute_beat(rules.beats_per_bar);
        let song_pos = absolute.saturating_sub(start) as f64 + f64::from(mp.beat_rel);
        let song_beats = rules.song_beats();

        // Close every beat whose window ended before now.
        let closed = song_pos - f64::from(rules.hit_window);
        while self.next_unjudged < song_beats && (self.next_unjudged as f64) < closed {
            if self.hits_ahead & 1 == 0 {
                self.post(events, FrameEvent::PlayerFail);
            }
            self.hits_ahead >>= 1;
            self.next_unjudged += 1;
        }

        if !pad.pressed.is_empty() {
            let nearest = if mp.beat_rel >= 0.5 {
                absolute + 1
            } else {
                absolute
            };
            let verdict = match self.open_slot(rules, nearest, start) {
                Some(bit) if mp.beat_offset() <= rules.hit_window
                    && pad.pressed == rules.expected(nearest - start) =>
                {
                    self.hits_ahead |= bit;
                    FrameEvent::PlayerSuccess
                }
                _ => FrameEvent::PlayerFail,
            };
            self.post(events, verdict);
        }

        if self.next_unjudged >= song_beats {
            return Transition::Switch(GameState::End(EndState { score: self.score }));
        }
        Transition::None
    }

    /// Mask bit for absolute beat `beat` if it is in the song, still open and
    /// not yet hit.
    fn open_slot(&self, rules: &RhythmRules, beat: u64, start: u64) -> Option<u8> {
        let song_beat = beat.checked_sub(start)?;
        let ahead = song_beat.checked_sub(self.next_unjudged)?;
        if song_beat >= rules.song_beats() || ahead >= u64::from(u8::BITS) {
            return None;
        }
        let bit = 1u8 << ahead;
        (self.hits_ahead & bit == 0).then_some(bit)
    }

    fn r_update(&mut self, rules: &RhythmRules, mp: MusicPos) {
        if self.start.is_none() {
            let absolute = mp.absolute_beat(rules.beats_per_bar);
            self.start = Some(absolute);
            tracing::debug!(beat = absolute, "song started");
        }
    }
}

/// The results screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EndState {
    /// Final score of the song just played.
    pub score: Score,
}

/// One entry on the state stack.
#[derive(Clone, Debug, PartialEq)]
pub enum GameState {
    /// Title screen.
    Start,
    /// Song in progress.
    Rhythmic(RhythmicState),
    /// Results screen.
    End(EndState),
}

impl GameState {
    /// The variant, without data.
    #[must_use]
    pub const fn kind(&self) -> StateKind {
        match self {
            Self::Start => StateKind::Start,
            Self::Rhythmic(_) => StateKind::Rhythmic,
            Self::End(_) => StateKind::End,
        }
    }

    /// Called when the state becomes active for the first time.
    pub fn on_enter(&mut self) {
        match self {
            Self::Start => tracing::info!("title screen"),
            Self::Rhythmic(song) => {
                *song = RhythmicState::default();
                tracing::info!("song armed, waiting for the next beat");
            }
            Self::End(end) => tracing::info!(score = %end.score, "song finished"),
        }
    }

    /// Called when the state leaves the stack.
    pub fn on_exit(&mut self) {
        tracing::debug!(state = %self.kind(), "exit");
    }

    /// Called when another state is pushed on top of this one.
    pub fn on_obscure(&mut self) {
        tracing::debug!(state = %self.kind(), "obscured");
    }

    /// Called when the state above this one is popped.
    pub fn on_reveal(&mut self) {
        tracing::debug!(state = %self.kind(), "revealed");
    }

    /// Per-frame update.
    pub fn update(
        &mut self,
        rules: &RhythmRules,
        _dt: f32,
        mp: MusicPos,
        pad: GamepadSnapshot,
        events: &mut dyn EventSink,
    ) -> Transition {
        match self {
            Self::Start | Self::End(_) if pad.just_pressed(Buttons::A) => {
                if matches!(self, Self::Start) {
                    events.post(FrameEvent::GameStart);
                    Transition::Switch(Self::Rhythmic(RhythmicState::default()))
                } else {
                    Transition::Switch(Self::Start)
                }
            }
            Self::Start | Self::End(_) => Transition::None,
            Self::Rhythmic(song) => song.update(rules, mp, pad, events),
        }
    }

    /// Update called once on every new beat, before [`GameState::update`].
    pub fn r_update(
        &mut self,
        rules: &RhythmRules,
        mp: MusicPos,
        _pad: GamepadSnapshot,
        _events: &mut dyn EventSink,
    ) -> Transition {
        if let Self::Rhythmic(song) = self {
            song.r_update(rules, mp);
        }
        Transition::None
    }
}

/// What the active state asks the machine to do next.
#[derive(Clone, Debug, PartialEq)]
pub enum Transition {
    /// Stay.
    None,
    /// Put a state on top of the current one.
    Push(GameState),
    /// Remove the current state, revealing the one below.
    Pop,
    /// Replace the current state.
    Switch(GameState),
}

/// Stack of game states with explicit transitions.
#[derive(Debug)]
pub struct StateMachine {
    stack: Vec<GameState>,
    rules: RhythmRules,
}

impl StateMachine {
    /// Creates a machine sitting in [`GameState::Start`].
    #[must_use]
    pub fn new(rules: RhythmRules) -> Self {
        let mut start = GameState::Start;
        start.on_enter();
        Self {
            stack: vec![start],
            rules,
        }
    }

    /// The active state.
    #[must_use]
    pub fn current(&self) -> Option<&GameState> {
        self.stack.last()
    }

    /// The active state's kind; `None` once the stack is empty.
    #[must_use]
    pub fn kind(&self) -> Option<StateKind> {
        self.current().map(GameState::kind)
    }

    /// Number of stacked states.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// The rules in force.
    #[must_use]
    pub const fn rules(&self) -> &RhythmRules {
        &self.rules
    }

    /// Runs the active state's per-frame update and applies its transition.
    pub fn update(&mut self, dt: f32, mp: MusicPos, pad: GamepadSnapshot, events: &mut dyn EventSink) {
        let Some(state) = self.stack.last_mut() else {
            return;
        };
        let transition = state.update(&self.rules, dt, mp, pad, events);
        self.apply(transition);
    }

    /// Runs the active state's per-beat update and applies its transition.
    pub fn r_update(&mut self, mp: MusicPos, pad: GamepadSnapshot, events: &mut dyn EventSink) {
        let Some(state) = self.stack.last_mut() else {
            return;
        };
        let transition = state.r_update(&self.rules, mp, pad, events);
        self.apply(transition);
    }

    /// Applies `transition`, calling the enter/exit/obscure/reveal hooks.
    pub fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::None => {}
            Transition::Push(mut next) => {
                if let Some(top) = self.stack.last_mut() {
                    top.on_obscure();
                }
                next.on_enter();
                tracing::info!(to = %next.kind(), depth = self.stack.len() + 1, "push state");
                self.stack.push(next);
            }
            Transition::Pop => {
                if let Some(mut top) = self.stack.pop() {
                    top.on_exit();
                    tracing::info!(from = %top.kind(), depth = self.stack.len(), "pop state");
                }
                if let Some(revealed) = self.stack.last_mut() {
                    revealed.on_reveal();
                }
            }
            Transition::Switch(mut next) => {
                let from = self.stack.pop().map(|mut top| {
                    top.on_exit();
                    top.kind()
                });
                next.on_enter();
                tracing::info!(?from, to = %next.kind(), "switch state");
                self.stack.push(next);
            }
        }
    }
}
