//! Per-session context enrichment engine.
//!
//! A `SessionContext` lives as long as one listening session (one browser
//! tab, one player instance). Player actions mutate it, and the `*_context`
//! calculators read it to derive the behavioral metadata attached to the
//! next outgoing event. It is owned by exactly one session, so every method
//! takes `&mut self` and nothing here locks.

use crate::domain::foundation::{Clock, SystemClock, Timestamp};

use super::types::{
    EngagementContext, PlayContext, PlaySource, ScrubContext, ScrubDirection, SkipContext,
    SkipDirection, SkipReason, VolumeContext,
};

/// Volume a fresh player starts at.
pub const DEFAULT_VOLUME: f64 = 0.7;

/// Running state of one listening session.
#[derive(Debug, Clone)]
pub struct SessionContext<C: Clock = SystemClock> {
    clock: C,
    session_start_time: Timestamp,
    last_play_time: Option<Timestamp>,
    last_track_id: Option<String>,
    track_start_time: Option<Timestamp>,
    last_volume: f64,
    like_start_time: Option<Timestamp>,
    is_currently_playing: bool,
}

impl SessionContext<SystemClock> {
    /// Starts a session on the wall clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for SessionContext<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> SessionContext<C> {
    /// Starts a session on the given clock.
    pub fn with_clock(clock: C) -> Self {
        let session_start_time = clock.now();
        Self {
            clock,
            session_start_time,
            last_play_time: None,
            last_track_id: None,
            track_start_time: None,
            last_volume: DEFAULT_VOLUME,
            like_start_time: None,
            is_currently_playing: false,
        }
    }

    /// Records that `track_id` began playing.
    pub fn track_started(&mut self, track_id: impl Into<String>) {
        self.last_track_id = Some(track_id.into());
        self.track_start_time = Some(self.clock.now());
        self.is_currently_playing = true;
    }

    /// Records that playback stopped.
    pub fn track_stopped(&mut self) {
        self.is_currently_playing = false;
    }

    /// Derives the context for a play event and marks this moment as the
    /// last play.
    pub fn play_context(
        &mut self,
        track_id: &str,
        is_autoplay: bool,
        source: PlaySource,
    ) -> PlayContext {
        let now = self.clock.now();
        let time_since_last_play = self
            .last_play_time
            .map(|last| now.seconds_since(&last))
            .unwrap_or(0.0);

        self.last_play_time = Some(now);

        let previous_track_id = self
            .last_track_id
            .as_ref()
            .filter(|last| last.as_str() != track_id)
            .cloned();

        PlayContext {
            previous_track_id,
            time_since_last_play,
            is_autoplay,
            source,
        }
    }

    /// Derives the context for a scrub from `from_time` to `to_time`
    /// (positions in seconds).
    ///
    /// Equal positions classify as `Backward`.
    pub fn scrub_context(&self, from_time: f64, to_time: f64) -> ScrubContext {
        let scrub_direction = if to_time > from_time {
            ScrubDirection::Forward
        } else {
            ScrubDirection::Backward
        };

        ScrubContext {
            scrub_direction,
            scrub_distance: (to_time - from_time).abs(),
            was_playing_before_scrub: self.is_currently_playing,
        }
    }

    /// Derives the context for a skip away from the current track.
    pub fn skip_context(&self, direction: SkipDirection, reason: SkipReason) -> SkipContext {
        let time_listened_before_skip = self
            .track_start_time
            .map(|start| self.clock.now().seconds_since(&start))
            .unwrap_or(0.0);

        SkipContext {
            skip_direction: direction,
            time_listened_before_skip,
            skip_reason: reason,
        }
    }

    /// Derives the context for a volume change and remembers `new_volume`.
    pub fn volume_context(&mut self, new_volume: f64) -> VolumeContext {
        let previous_volume = self.last_volume;
        let context = VolumeContext {
            previous_volume,
            volume_change_amount: new_volume - previous_volume,
            is_mute_action: new_volume == 0.0 || previous_volume == 0.0,
        };

        self.last_volume = new_volume;
        context
    }

    /// Starts the like stopwatch.
    pub fn start_like_tracking(&mut self) {
        self.like_start_time = Some(self.clock.now());
    }

    /// Clears the like stopwatch.
    pub fn reset_like_tracking(&mut self) {
        self.like_start_time = None;
    }

    /// Derives the context for a like event.
    pub fn engagement_context(&self) -> EngagementContext {
        let time_to_like = self
            .like_start_time
            .map(|start| self.clock.now().seconds_since(&start))
            .unwrap_or(0.0);

        EngagementContext { time_to_like }
    }

    /// Seconds since the session started.
    pub fn session_duration(&self) -> f64 {
        self.clock.now().seconds_since(&self.session_start_time)
    }

    pub fn is_currently_playing(&self) -> bool {
        self.is_currently_playing
    }

    pub fn last_track_id(&self) -> Option<&str> {
        self.last_track_id.as_deref()
    }

    pub fn last_volume(&self) -> f64 {
        self.last_volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ManualClock;

    fn session() -> (SessionContext<ManualClock>, ManualClock) {
        let clock = ManualClock::starting_at(Timestamp::from_unix_millis(1_705_276_800_000));
        (SessionContext::with_clock(clock.clone()), clock)
    }

    // ───────────────────────────────────────────────────────────────
    // Play
    // ───────────────────────────────────────────────────────────────

    #[test]
    fn first_play_has_no_history() {
        let (mut ctx, _clock) = session();

        let play = ctx.play_context("t1", false, PlaySource::Manual);

        assert_eq!(play.time_since_last_play, 0.0);
        assert_eq!(play.previous_track_id, None);
        assert_eq!(play.source, PlaySource::Manual);
    }

    #[test]
    fn second_play_measures_gap_since_previous_play() {
        let (mut ctx, clock) = session();

        ctx.play_context("t1", false, PlaySource::Manual);
        clock.advance_millis(12_500);
        let play = ctx.play_context("t1", true, PlaySource::Autoplay);

        assert_eq!(play.time_since_last_play, 12.5);
        assert!(play.is_autoplay);
    }

    #[test]
    fn previous_track_reported_only_when_different() {
        let (mut ctx, _clock) = session();

        ctx.track_started("t1");
        let same = ctx.play_context("t1", false, PlaySource::Replay);
        let other = ctx.play_context("t2", false, PlaySource::Skip);

        assert_eq!(same.previous_track_id, None);
        assert_eq!(other.previous_track_id.as_deref(), Some("t1"));
    }

    // ───────────────────────────────────────────────────────────────
    // Scrub
    // ───────────────────────────────────────────────────────────────

    #[test]
    fn scrub_forward() {
        let (ctx, _clock) = session();

        let scrub = ctx.scrub_context(10.0, 25.0);

        assert_eq!(scrub.scrub_direction, ScrubDirection::Forward);
        assert_eq!(scrub.scrub_distance, 15.0);
    }

    #[test]
    fn scrub_backward() {
        let (ctx, _clock) = session();

        let scrub = ctx.scrub_context(25.0, 10.0);

        assert_eq!(scrub.scrub_direction, ScrubDirection::Backward);
        assert_eq!(scrub.scrub_distance, 15.0);
    }

    #[test]
    fn scrub_to_same_position_is_backward_with_zero_distance() {
        let (ctx, _clock) = session();

        let scrub = ctx.scrub_context(42.0, 42.0);

        assert_eq!(scrub.scrub_direction, ScrubDirection::Backward);
        assert_eq!(scrub.scrub_distance, 0.0);
    }

    #[test]
    fn scrub_reflects_playing_flag() {
        let (mut ctx, _clock) = session();

        ctx.track_started("t1");
        assert!(ctx.scrub_context(0.0, 5.0).was_playing_before_scrub);

        ctx.track_stopped();
        assert!(!ctx.scrub_context(0.0, 5.0).was_playing_before_scrub);
    }

    // ───────────────────────────────────────────────────────────────
    // Skip
    // ───────────────────────────────────────────────────────────────

    #[test]
    fn skip_before_any_track_listened_zero() {
        let (ctx, _clock) = session();

        let skip = ctx.skip_context(SkipDirection::Next, SkipReason::UserInitiated);

        assert_eq!(skip.time_listened_before_skip, 0.0);
    }

    #[test]
    fn skip_measures_time_since_track_start() {
        let (mut ctx, clock) = session();

        ctx.track_started("t1");
        clock.advance_secs(31);
        let skip = ctx.skip_context(SkipDirection::Prev, SkipReason::TrackEnded);

        assert_eq!(skip.time_listened_before_skip, 31.0);
        assert_eq!(skip.skip_direction, SkipDirection::Prev);
        assert_eq!(skip.skip_reason, SkipReason::TrackEnded);
    }

    #[test]
    fn skip_never_negative_when_clock_steps_back() {
        let (mut ctx, clock) = session();

        ctx.track_started("t1");
        clock.advance_secs(-5);

        let skip = ctx.skip_context(SkipDirection::Next, SkipReason::Error);
        assert_eq!(skip.time_listened_before_skip, 0.0);
    }

    // ───────────────────────────────────────────────────────────────
    // Volume
    // ───────────────────────────────────────────────────────────────

    #[test]
    fn volume_sequence_ends_in_mute() {
        let (mut ctx, _clock) = session();

        ctx.volume_context(0.7);
        ctx.volume_context(0.3);
        let third = ctx.volume_context(0.0);

        assert!(third.is_mute_action);
        assert_eq!(third.volume_change_amount, -0.3);
        assert_eq!(third.previous_volume, 0.3);
    }

    #[test]
    fn volume_reports_value_before_change() {
        let (mut ctx, _clock) = session();

        let change = ctx.volume_context(0.9);

        assert_eq!(change.previous_volume, DEFAULT_VOLUME);
        assert_eq!(ctx.last_volume(), 0.9);
        assert!(!change.is_mute_action);
    }

    #[test]
    fn unmute_counts_as_mute_action() {
        let (mut ctx, _clock) = session();

        ctx.volume_context(0.0);
        let unmute = ctx.volume_context(0.5);

        assert!(unmute.is_mute_action);
        assert_eq!(unmute.volume_change_amount, 0.5);
    }

    // ───────────────────────────────────────────────────────────────
    // Engagement
    // ───────────────────────────────────────────────────────────────

    #[test]
    fn like_without_tracking_is_zero() {
        let (ctx, _clock) = session();
        assert_eq!(ctx.engagement_context().time_to_like, 0.0);
    }

    #[test]
    fn like_measures_time_since_tracking_started() {
        let (mut ctx, clock) = session();

        ctx.start_like_tracking();
        clock.advance_millis(7_250);

        assert_eq!(ctx.engagement_context().time_to_like, 7.25);
    }

    #[test]
    fn reset_like_tracking_stops_the_stopwatch() {
        let (mut ctx, clock) = session();

        ctx.start_like_tracking();
        clock.advance_secs(3);
        ctx.reset_like_tracking();

        assert_eq!(ctx.engagement_context().time_to_like, 0.0);
    }

    #[test]
    fn session_duration_tracks_clock() {
        let (ctx, clock) = session();

        clock.advance_secs(90);

        assert_eq!(ctx.session_duration(), 90.0);
    }
}
