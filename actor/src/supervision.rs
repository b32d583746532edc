//! Supervision strategies
//!

use crate::{
    Error,
    message::SystemMessage,
    reference::Reference,
};

use tracing::debug;

use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
};

/// Outcome of a supervision decision for a failed child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Keep the child's state and let it continue processing messages.
    Resume,
    /// Replace the child's actor instance with a fresh one; accumulated
    /// state is lost.
    Restart,
    /// Terminate the child.
    Stop,
    /// Decline to handle; the failure climbs to the supervisor's own parent.
    Escalate,
}

/// Maps a failure cause to a directive. Returning `None` means the cause was
/// not classified, which escalates.
pub type Decider = Arc<dyn Fn(&Error) -> Option<Directive> + Send + Sync>;

/// The default classification: construction failures stop the child, any
/// other failure restarts it.
pub fn default_decider(cause: &Error) -> Option<Directive> {
    match cause {
        Error::ActorInitialization(_) => Some(Directive::Stop),
        _ => Some(Directive::Restart),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Apply the directive to the failing child only.
    OneForOne,
    /// Apply the directive to every current sibling of the failing child.
    AllForOne,
}

/// Failure-handling policy a parent applies to its children.
///
/// A strategy pairs a [`Decider`] with a scope. `OneForOne` acts on the
/// failing child alone; `AllForOne` treats the sibling group as a unit, so a
/// `Restart` directive restarts every child and a `Stop` stops them all.
///
/// ```ignore
/// fn supervisor_strategy(&self) -> SupervisorStrategy {
///     SupervisorStrategy::one_for_one(|cause| match cause {
///         Error::Functional(_) => Some(Directive::Resume),
///         _ => None, // escalate everything else
///     })
/// }
/// ```
#[derive(Clone)]
pub struct SupervisorStrategy {
    scope: Scope,
    decider: Decider,
}

impl SupervisorStrategy {
    /// Strategy acting on the failing child only.
    pub fn one_for_one<F>(decider: F) -> Self
    where
        F: Fn(&Error) -> Option<Directive> + Send + Sync + 'static,
    {
        SupervisorStrategy {
            scope: Scope::OneForOne,
            decider: Arc::new(decider),
        }
    }

    /// Strategy acting on the whole sibling group.
    pub fn all_for_one<F>(decider: F) -> Self
    where
        F: Fn(&Error) -> Option<Directive> + Send + Sync + 'static,
    {
        SupervisorStrategy {
            scope: Scope::AllForOne,
            decider: Arc::new(decider),
        }
    }

    /// Applies the decider to a failure cause, escalating unclassified
    /// causes.
    fn decide(&self, cause: &Error) -> Directive {
        (self.decider)(cause).unwrap_or(Directive::Escalate)
    }

    /// Decides on a child failure and applies the resulting directive.
    /// Returns whether the failure was handled; `false` signals the cell to
    /// escalate to its own parent.
    pub(crate) fn handle_failure(
        &self,
        cause: &Error,
        child: &Reference,
        siblings: &[Reference],
    ) -> bool {
        match self.decide(cause) {
            Directive::Resume => {
                child.tell_system(SystemMessage::Resume {
                    cause: cause.clone(),
                });
                true
            }
            Directive::Restart => {
                self.process_failure(cause, child, siblings, true);
                true
            }
            Directive::Stop => {
                self.process_failure(cause, child, siblings, false);
                true
            }
            Directive::Escalate => {
                debug!("Failure of {} not handled, escalating.", child.path());
                false
            }
        }
    }

    /// Restarts or stops the failing child, or under `AllForOne` the whole
    /// sibling group. Group restart suspends every sibling before recreating
    /// any of them, so no sibling processes user messages against a
    /// half-restarted group.
    fn process_failure(
        &self,
        cause: &Error,
        child: &Reference,
        siblings: &[Reference],
        restart: bool,
    ) {
        match self.scope {
            Scope::OneForOne => {
                if restart {
                    // The failing child suspended itself before escalating.
                    child.tell_system(SystemMessage::Recreate {
                        cause: cause.clone(),
                    });
                } else {
                    child.tell_system(SystemMessage::Terminate);
                }
            }
            Scope::AllForOne => {
                if restart {
                    for sibling in siblings {
                        sibling.tell_system(SystemMessage::Suspend);
                    }
                    for sibling in siblings {
                        sibling.tell_system(SystemMessage::Recreate {
                            cause: cause.clone(),
                        });
                    }
                } else {
                    for sibling in siblings {
                        sibling.tell_system(SystemMessage::Terminate);
                    }
                }
            }
        }
    }
}

/// One-for-one with the default decider.
impl Default for SupervisorStrategy {
    fn default() -> Self {
        SupervisorStrategy::one_for_one(default_decider)
    }
}

impl Debug for SupervisorStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupervisorStrategy")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::message::Content;

    fn init_error() -> Error {
        Error::ActorInitialization("boom".to_owned())
    }

    fn processing_error() -> Error {
        Error::Functional("boom".to_owned())
    }

    #[test]
    fn test_default_decider() {
        assert_eq!(default_decider(&init_error()), Some(Directive::Stop));
        assert_eq!(
            default_decider(&processing_error()),
            Some(Directive::Restart)
        );
    }

    #[test]
    fn test_unclassified_cause_escalates() {
        let strategy = SupervisorStrategy::one_for_one(|_| None);
        let (child, mut inbox) = Reference::detached("/user/a");
        assert!(!strategy.handle_failure(&processing_error(), &child, &[child.clone()]));
        assert!(inbox.try_recv().is_err());
    }

    #[test]
    fn test_resume_targets_failing_child_only() {
        let strategy = SupervisorStrategy::all_for_one(|_| Some(Directive::Resume));
        let (child, mut child_inbox) = Reference::detached("/user/a");
        let (sibling, mut sibling_inbox) = Reference::detached("/user/b");

        assert!(strategy.handle_failure(
            &processing_error(),
            &child,
            &[child.clone(), sibling.clone()]
        ));

        let envelope = child_inbox.try_recv().unwrap();
        assert!(matches!(
            envelope.message,
            Content::System(SystemMessage::Resume { .. })
        ));
        assert!(sibling_inbox.try_recv().is_err());
    }

    #[test]
    fn test_one_for_one_restart() {
        let strategy = SupervisorStrategy::default();
        let (child, mut child_inbox) = Reference::detached("/user/a");
        let (sibling, mut sibling_inbox) = Reference::detached("/user/b");

        assert!(strategy.handle_failure(
            &processing_error(),
            &child,
            &[child.clone(), sibling.clone()]
        ));

        let envelope = child_inbox.try_recv().unwrap();
        assert!(matches!(
            envelope.message,
            Content::System(SystemMessage::Recreate { .. })
        ));
        assert!(child_inbox.try_recv().is_err());
        assert!(sibling_inbox.try_recv().is_err());
    }

    #[test]
    fn test_all_for_one_restart_suspends_every_sibling_first() {
        let strategy = SupervisorStrategy::all_for_one(default_decider);
        let (child, mut child_inbox) = Reference::detached("/user/a");
        let (sibling, mut sibling_inbox) = Reference::detached("/user/b");

        assert!(strategy.handle_failure(
            &processing_error(),
            &child,
            &[child.clone(), sibling.clone()]
        ));

        // Each sibling sees Suspend strictly before Recreate.
        for inbox in [&mut child_inbox, &mut sibling_inbox] {
            let first = inbox.try_recv().unwrap();
            assert!(matches!(
                first.message,
                Content::System(SystemMessage::Suspend)
            ));
            let second = inbox.try_recv().unwrap();
            assert!(matches!(
                second.message,
                Content::System(SystemMessage::Recreate { .. })
            ));
        }
    }

    #[test]
    fn test_all_for_one_stop_stops_every_sibling() {
        let strategy = SupervisorStrategy::all_for_one(default_decider);
        let (child, mut child_inbox) = Reference::detached("/user/a");
        let (sibling, mut sibling_inbox) = Reference::detached("/user/b");

        assert!(strategy.handle_failure(&init_error(), &child, &[child.clone(), sibling.clone()]));

        for inbox in [&mut child_inbox, &mut sibling_inbox] {
            let envelope = inbox.try_recv().unwrap();
            assert!(matches!(
                envelope.message,
                Content::System(SystemMessage::Terminate)
            ));
        }
    }
}
