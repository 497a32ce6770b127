use std::time::Duration;

use rand::seq::IndexedRandom;
use rand::Rng;

/// Scripted replies. The question a villager is asked never influences
/// which line comes back.
pub const RESPONSES: &[&str] = &[
    "I love this!",
    "I'm hungry",
    "Where am I?",
    "This is amazing!",
    "What's happening?",
    "Hello there!",
    "I'm confused",
    "This is fun!",
    "Who are you?",
    "I'm tired",
    "Let's go!",
    "Wow!",
    "Interesting...",
    "Tell me more",
    "I don't know",
    "Maybe later",
    "That's nice",
    "I agree!",
    "Not sure about that",
    "Good point",
];

pub fn pick_response(rng: &mut impl Rng) -> &'static str {
    RESPONSES.choose(rng).copied().unwrap_or("...")
}

/// A reply scheduled to start after `remaining` more simulated time.
/// The owning entity cancels it on a new question and on teardown.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SpeechTimer {
    pending: Option<PendingSpeech>,
}

#[derive(Debug, Clone, PartialEq)]
struct PendingSpeech {
    remaining: Duration,
    text: &'static str,
}

impl SpeechTimer {
    pub fn schedule(&mut self, delay: Duration, text: &'static str) {
        self.pending = Some(PendingSpeech {
            remaining: delay,
            text,
        });
    }

    /// Returns true when a pending reply was dropped.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.pending.as_ref().map(|pending| pending.remaining)
    }

    /// Advances the timer and hands back the reply once its delay has run out.
    pub fn advance(&mut self, elapsed: Duration) -> Option<&'static str> {
        let pending = self.pending.as_mut()?;
        pending.remaining = pending.remaining.saturating_sub(elapsed);
        if !pending.remaining.is_zero() {
            return None;
        }
        self.pending.take().map(|fired| fired.text)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn picked_response_comes_from_pool() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..50 {
            assert!(RESPONSES.contains(&pick_response(&mut rng)));
        }
    }

    #[test]
    fn timer_fires_once_after_delay() {
        let mut timer = SpeechTimer::default();
        timer.schedule(Duration::from_millis(30), "Wow!");
        assert_eq!(timer.advance(Duration::from_millis(20)), None);
        assert_eq!(timer.remaining(), Some(Duration::from_millis(10)));
        assert_eq!(timer.advance(Duration::from_millis(10)), Some("Wow!"));
        assert!(!timer.is_pending());
        assert_eq!(timer.advance(Duration::from_millis(10)), None);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut timer = SpeechTimer::default();
        timer.schedule(Duration::from_millis(5), "Hello there!");
        assert!(timer.cancel());
        assert!(!timer.cancel());
        assert_eq!(timer.advance(Duration::from_secs(1)), None);
    }

    #[test]
    fn zero_delay_fires_on_next_advance() {
        let mut timer = SpeechTimer::default();
        timer.schedule(Duration::ZERO, "Let's go!");
        assert_eq!(timer.advance(Duration::ZERO), Some("Let's go!"));
    }
}
