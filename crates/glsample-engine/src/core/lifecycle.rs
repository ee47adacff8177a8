use std::fmt;

/// Where a sample is in its life.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Phase {
    Uninitialized,
    /// Initialized and waiting for the next `update`.
    Ready,
    /// `update` ran; `draw` (or a skipped frame) must follow.
    Updated,
    Released,
}

/// Lifecycle hook being attempted.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Hook {
    Initialize,
    Resize,
    Update,
    Draw,
    SkipDraw,
    Release,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Ready => "ready",
            Phase::Updated => "updated",
            Phase::Released => "released",
        })
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Hook::Initialize => "initialize",
            Hook::Resize => "on_resize",
            Hook::Update => "update",
            Hook::Draw => "draw",
            Hook::SkipDraw => "skip draw",
            Hook::Release => "release",
        })
    }
}

/// Rejected lifecycle transition.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LifecycleError {
    pub hook: Hook,
    pub phase: Phase,
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot {} a sample that is {}", self.hook, self.phase)
    }
}

impl std::error::Error for LifecycleError {}

/// `Uninitialized -> Ready -> (Updated -> Ready)* -> Released`.
///
/// `Resize` is allowed whenever the sample is live and does not change phase.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    phase: Phase,
    frames: u64,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            phase: Phase::Uninitialized,
            frames: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of completed `draw` calls.
    pub fn frames_drawn(&self) -> u64 {
        self.frames
    }

    pub fn is_live(&self) -> bool {
        matches!(self.phase, Phase::Ready | Phase::Updated)
    }

    /// Checks whether `hook` is legal now without changing phase.
    pub fn check(&self, hook: Hook) -> Result<(), LifecycleError> {
        let ok = match hook {
            Hook::Initialize => self.phase == Phase::Uninitialized,
            Hook::Resize | Hook::Release => self.is_live(),
            Hook::Update => self.phase == Phase::Ready,
            Hook::Draw | Hook::SkipDraw => self.phase == Phase::Updated,
        };
        if ok {
            Ok(())
        } else {
            Err(LifecycleError {
                hook,
                phase: self.phase,
            })
        }
    }

    /// Validates and applies `hook`.
    pub fn advance(&mut self, hook: Hook) -> Result<Phase, LifecycleError> {
        self.check(hook)?;
        self.phase = match hook {
            Hook::Initialize => Phase::Ready,
            Hook::Resize => self.phase,
            Hook::Update => Phase::Updated,
            Hook::Draw => {
                self.frames += 1;
                Phase::Ready
            }
            Hook::SkipDraw => Phase::Ready,
            Hook::Release => Phase::Released,
        };
        Ok(self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live() -> Lifecycle {
        let mut l = Lifecycle::new();
        l.advance(Hook::Initialize).unwrap();
        l
    }

    #[test]
    fn full_run() {
        let mut l = live();
        l.advance(Hook::Resize).unwrap();
        for _ in 0..3 {
            l.advance(Hook::Update).unwrap();
            l.advance(Hook::Draw).unwrap();
        }
        assert_eq!(l.frames_drawn(), 3);
        assert_eq!(l.advance(Hook::Release), Ok(Phase::Released));
    }

    #[test]
    fn draw_before_update_is_rejected() {
        let mut l = live();
        assert_eq!(
            l.advance(Hook::Draw),
            Err(LifecycleError { hook: Hook::Draw, phase: Phase::Ready })
        );
        assert_eq!(l.phase(), Phase::Ready);
    }

    #[test]
    fn hooks_before_initialize_are_rejected() {
        for hook in [Hook::Resize, Hook::Update, Hook::Draw, Hook::SkipDraw, Hook::Release] {
            assert!(Lifecycle::new().advance(hook).is_err(), "{hook}");
        }
    }

    #[test]
    fn double_initialize_is_rejected() {
        let mut l = live();
        assert!(l.advance(Hook::Initialize).is_err());
    }

    #[test]
    fn double_update_is_rejected() {
        let mut l = live();
        l.advance(Hook::Update).unwrap();
        assert!(l.advance(Hook::Update).is_err());
    }

    #[test]
    fn skipped_frame_returns_to_ready() {
        let mut l = live();
        l.advance(Hook::Update).unwrap();
        l.advance(Hook::SkipDraw).unwrap();
        assert_eq!(l.frames_drawn(), 0);
        l.advance(Hook::Update).unwrap();
    }

    #[test]
    fn nothing_is_legal_after_release() {
        let mut l = live();
        l.advance(Hook::Release).unwrap();
        for hook in [
            Hook::Initialize,
            Hook::Resize,
            Hook::Update,
            Hook::Draw,
            Hook::SkipDraw,
            Hook::Release,
        ] {
            assert!(l.advance(hook).is_err(), "{hook}");
        }
    }

    #[test]
    fn release_mid_frame_is_allowed() {
        let mut l = live();
        l.advance(Hook::Update).unwrap();
        l.advance(Hook::Release).unwrap();
    }

    #[test]
    fn error_message_names_hook_and_phase() {
        let err = Lifecycle::new().advance(Hook::Draw).unwrap_err();
        assert_eq!(err.to_string(), "cannot draw a sample that is uninitialized");
    }
}
