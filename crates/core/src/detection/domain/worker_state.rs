use thiserror::Error;

/// Lifecycle of the detection worker.
///
/// `Uninitialized -> Initializing -> Ready | Failed`. A new init round may
/// start from `Failed`, never from `Ready`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WorkerState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid worker transition from {from:?} to {to:?}")]
pub struct InvalidTransition {
    pub from: WorkerState,
    pub to: WorkerState,
}

impl WorkerState {
    pub fn begin_init(&mut self) -> Result<(), InvalidTransition> {
        match self {
            WorkerState::Uninitialized | WorkerState::Failed => {
                *self = WorkerState::Initializing;
                Ok(())
            }
            _ => Err(self.rejected(WorkerState::Initializing)),
        }
    }

    /// Completes an init round, landing in `Ready` or `Failed`.
    pub fn finish_init(&mut self, loaded: bool) -> Result<(), InvalidTransition> {
        let to = if loaded {
            WorkerState::Ready
        } else {
            WorkerState::Failed
        };
        if *self != WorkerState::Initializing {
            return Err(self.rejected(to));
        }
        *self = to;
        Ok(())
    }

    pub fn accepts_detect(self) -> bool {
        self == WorkerState::Ready
    }

    fn rejected(self, to: WorkerState) -> InvalidTransition {
        InvalidTransition { from: self, to }
    }
}
