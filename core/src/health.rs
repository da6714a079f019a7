//! Clamped hit points with a one-shot death latch.

/// Result of applying damage to a [`Health`] pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Health remains above zero.
    Survived,
    /// Health reached zero and the death latch fired for the first time.
    Died,
    /// The death latch had already fired; nothing further happens.
    AlreadyDead,
}

/// Hit points clamped to `[0, max]`.
///
/// Reaching zero trips a latch exactly once so death handling (rewards,
/// notifications) never fires twice for the same owner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Health {
    current: f32,
    max: f32,
    death_processed: bool,
}

impl Health {
    /// Creates a full health pool. Negative maxima are treated as zero.
    #[must_use]
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Self {
            current: max,
            max,
            death_processed: false,
        }
    }

    /// Remaining hit points.
    #[must_use]
    pub const fn current(&self) -> f32 {
        self.current
    }

    /// Maximum hit points.
    #[must_use]
    pub const fn max(&self) -> f32 {
        self.max
    }

    /// Proportional fill for a health bar, `current / max`.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        self.current / self.max
    }

    /// Reports whether the death latch has fired.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.death_processed
    }

    /// Subtracts `amount`, clamps into `[0, max]` and fires the death latch
    /// the first time the pool is empty. A NaN amount changes nothing.
    pub fn apply_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.death_processed {
            self.current = 0.0;
            return DamageOutcome::AlreadyDead;
        }
        if amount.is_nan() {
            return DamageOutcome::Survived;
        }

        self.current = (self.current - amount).clamp(0.0, self.max);
        if self.current <= 0.0 {
            if self.trigger_death() {
                return DamageOutcome::Died;
            }
            return DamageOutcome::AlreadyDead;
        }
        DamageOutcome::Survived
    }

    /// Fires the death latch. Returns `true` only on the first call.
    pub fn trigger_death(&mut self) -> bool {
        if self.death_processed {
            return false;
        }
        self.current = 0.0;
        self.death_processed = true;
        true
    }
}
