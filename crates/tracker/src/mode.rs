use shared::domain::{Mode, SessionState};

pub fn confirmation(mode: Mode) -> String {
    format!("Switched to {} mode!", mode.key())
}

/// Flushes elapsed time into the active mode, restarts the timer at `now`
/// and, when asked, switches to `requested`.
///
/// Switching to the mode that is already active only moves the reference
/// point. A clock that went backwards contributes nothing.
pub fn transition(
    state: SessionState,
    now: f64,
    requested: Option<Mode>,
) -> (SessionState, Option<String>) {
    let mut next = state;

    if let (Some(active), Some(started)) = (next.mode, next.start_time) {
        let elapsed = now - started;
        if elapsed.is_finite() && elapsed > 0.0 {
            *next.total_time.slot_mut(active) += elapsed;
        }
    }

    if let Some(mode) = requested {
        next.mode = Some(mode);
    }
    next.start_time = next.mode.map(|_| now);

    (next, requested.map(confirmation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shared::domain::TotalTime;

    #[test]
    fn first_switch_starts_timer_without_accumulating() {
        let (state, message) = transition(SessionState::default(), 100.0, Some(Mode::Hacker));
        assert_eq!(state.mode, Some(Mode::Hacker));
        assert_eq!(state.start_time, Some(100.0));
        assert_eq!(state.total_time, TotalTime::default());
        assert_eq!(message.as_deref(), Some("Switched to hacker mode!"));
    }

    #[test]
    fn idle_session_stays_idle_without_request() {
        let (state, message) = transition(SessionState::default(), 100.0, None);
        assert_eq!(state, SessionState::default());
        assert!(message.is_none());
    }

    #[test]
    fn switching_credits_previous_mode() {
        let (state, _) = transition(SessionState::default(), 0.0, Some(Mode::Money));
        let (state, message) = transition(state, 90.0, Some(Mode::Playboy));
        assert_eq!(state.total_time.money, 90.0);
        assert_eq!(state.total_time.playboy, 0.0);
        assert_eq!(state.mode, Some(Mode::Playboy));
        assert_eq!(state.start_time, Some(90.0));
        assert_eq!(message.as_deref(), Some("Switched to playboy mode!"));
    }

    #[test]
    fn same_mode_switch_keeps_earlier_time() {
        let (state, _) = transition(SessionState::default(), 0.0, Some(Mode::Hacker));
        let (state, _) = transition(state, 50.0, Some(Mode::Hacker));
        let (state, _) = transition(state, 80.0, Some(Mode::Hacker));
        assert_eq!(state.total_time.hacker, 80.0);
        assert_eq!(state.start_time, Some(80.0));
    }

    #[test]
    fn flush_without_request_keeps_mode_and_advances_timer() {
        let (state, _) = transition(SessionState::default(), 10.0, Some(Mode::Playboy));
        let (state, message) = transition(state, 25.0, None);
        assert_eq!(state.mode, Some(Mode::Playboy));
        assert_eq!(state.start_time, Some(25.0));
        assert_eq!(state.total_time.playboy, 15.0);
        assert!(message.is_none());
    }

    #[test]
    fn backwards_clock_adds_nothing() {
        let (state, _) = transition(SessionState::default(), 500.0, Some(Mode::Money));
        let (state, _) = transition(state, 400.0, None);
        assert_eq!(state.total_time.money, 0.0);
        assert_eq!(state.start_time, Some(400.0));
    }

    #[test]
    fn mode_without_start_time_restarts_timer() {
        let state = SessionState {
            mode: Some(Mode::Hacker),
            start_time: None,
            total_time: TotalTime::default(),
        };
        let (state, _) = transition(state, 42.0, None);
        assert_eq!(state.total_time.hacker, 0.0);
        assert_eq!(state.start_time, Some(42.0));
    }

    fn step_strategy() -> impl Strategy<Value = (f64, Option<Mode>)> {
        (
            0.0f64..10_000.0,
            prop_oneof![
                Just(None),
                Just(Some(Mode::Hacker)),
                Just(Some(Mode::Money)),
                Just(Some(Mode::Playboy)),
            ],
        )
    }

    proptest! {
        #[test]
        fn accumulated_time_matches_elapsed_wall_clock(
            start in 0.0f64..2_000_000_000.0,
            steps in proptest::collection::vec(step_strategy(), 1..40)
        ) {
            let mut state = SessionState::default();
            let mut now = start;
            let mut first_mode_at = None;
            let mut previous = state.total_time;

            for (gap, requested) in steps {
                now += gap;
                let (next, _) = transition(state, now, requested);
                state = next;
                if first_mode_at.is_none() && state.mode.is_some() {
                    first_mode_at = Some(now);
                }
                for mode in Mode::ALL {
                    prop_assert!(state.total_time.get(mode) >= previous.get(mode));
                }
                previous = state.total_time;
                prop_assert_eq!(state.start_time.is_some(), state.mode.is_some());
            }

            let expected = first_mode_at.map(|at| now - at).unwrap_or(0.0);
            let total = state.total_time.sum();
            prop_assert!(
                (total - expected).abs() <= 1e-3 + 1e-9 * expected,
                "total {} expected {}",
                total,
                expected
            );
        }
    }
}
