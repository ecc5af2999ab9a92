use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PhaseError {
    #[error("{trigger:?} is not accepted while {from:?}")]
    Rejected {
        from: SessionPhase,
        trigger: SessionTrigger,
    },
}

//
// ─── STATES & TRIGGERS ────────────────────────────────────────────────────────
//

/// Lifecycle of the test-set taking page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// Stored record and catalog are being read.
    Loading,
    /// Timer running, at least one item still open.
    Active,
    /// Every item is done; final submit is unlocked but never automatic.
    AllCompleted,
    /// Final submission call in flight.
    Submitting,
    /// Final submission accepted. Terminal.
    Submitted,
    /// Missing submission id, catalog, or stored record. Terminal.
    Invalid,
}

impl SessionPhase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::Submitted | SessionPhase::Invalid)
    }

    /// Phases in which the countdown keeps ticking.
    #[must_use]
    pub fn is_running(self) -> bool {
        matches!(self, SessionPhase::Active | SessionPhase::AllCompleted)
    }
}

/// Named events that move the page between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionTrigger {
    Loaded,
    Invalidated,
    ItemCompleted,
    FocusRegained,
    TimerExpired,
    SubmitClicked,
    SubmitSucceeded,
    SubmitFailed,
}

/// Facts the transition table depends on, sampled at the time of the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhaseContext {
    pub all_completed: bool,
    pub expired: bool,
}

impl PhaseContext {
    fn settled(self) -> SessionPhase {
        if self.all_completed {
            SessionPhase::AllCompleted
        } else {
            SessionPhase::Active
        }
    }
}

impl SessionPhase {
    /// Evaluates `trigger` against the transition table.
    ///
    /// # Errors
    ///
    /// Returns `PhaseError::Rejected` when the trigger has no transition from
    /// the current phase. The caller keeps its current phase in that case.
    pub fn on(self, trigger: SessionTrigger, ctx: PhaseContext) -> Result<SessionPhase, PhaseError> {
        use SessionPhase as P;
        use SessionTrigger as T;

        let next = match (self, trigger) {
            (P::Loading, T::Loaded) => Some(ctx.settled()),
            (P::Loading, T::Invalidated) => Some(P::Invalid),
            (P::Active | P::AllCompleted, T::ItemCompleted | T::FocusRegained) => {
                Some(ctx.settled())
            }
            (P::Active | P::AllCompleted, T::TimerExpired) => Some(P::Submitting),
            (P::AllCompleted, T::SubmitClicked) => Some(P::Submitting),
            // Manual retry after a failed automatic submit.
            (P::Active, T::SubmitClicked) if ctx.expired => Some(P::Submitting),
            (P::Submitting, T::SubmitSucceeded) => Some(P::Submitted),
            (P::Submitting, T::SubmitFailed) => Some(ctx.settled()),
            _ => None,
        };

        next.ok_or(PhaseError::Rejected {
            from: self,
            trigger,
        })
    }
}
