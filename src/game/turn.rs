//! Turn scheduling for combat
//!
//! Round-robin queue of actors. Each turn is a resumable task that is driven
//! once per tick until it reports completion; only then is the actor
//! requeued and the next one started.

use std::cmp::Reverse;
use std::collections::VecDeque;
use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::events::{ListenerId, Observers};

/// Result of resuming a turn task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    /// Suspended; resume again next tick
    Running,
    Done,
}

/// An in-flight turn
pub trait TurnTask<C> {
    fn resume(&mut self, ctx: &mut C) -> TurnStatus;
}

/// Anything that can be scheduled. Implementors are lightweight handles;
/// the state they refer to lives in the context `C`.
pub trait Actable<C>: Copy + Eq + fmt::Debug {
    fn is_alive(&self, ctx: &C) -> bool;

    /// Higher acts earlier after `sort_by_speed`
    fn speed(&self, _ctx: &C) -> i32 {
        0
    }

    /// Begin a turn. The returned task is resumed until it reports `Done`.
    fn take_turn(&self, ctx: &mut C) -> Box<dyn TurnTask<C>>;
}

/// Scheduler state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No combat set up
    Idle,
    /// Between turns
    AwaitingActor,
    /// A turn is in progress
    ActorActing,
    /// Queue ran dry
    Ended,
}

/// Broadcast after each scheduler transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent<A> {
    CombatStarted { actors: usize },
    TurnStarted(A),
    TurnEnded { actor: A, requeued: bool },
    ActorRemoved(A),
    CombatEnded,
}

struct ActiveTurn<A, C> {
    actor: A,
    task: Box<dyn TurnTask<C>>,
    /// Set when the actor is removed mid-turn; suppresses the requeue
    removed: bool,
}

/// Drives actors one at a time through act-then-requeue.
pub struct TurnScheduler<A, C> {
    state: SchedulerState,
    queue: VecDeque<A>,
    active: Option<ActiveTurn<A, C>>,
    paused: bool,
    turns_completed: u64,
    observers: Observers<TurnEvent<A>>,
}

impl<A: Actable<C>, C> TurnScheduler<A, C> {
    pub fn new() -> Self {
        Self {
            state: SchedulerState::Idle,
            queue: VecDeque::new(),
            active: None,
            paused: false,
            turns_completed: 0,
            observers: Observers::new(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Actors waiting for their turn, next first. Excludes the acting one.
    pub fn queue(&self) -> impl Iterator<Item = A> + '_ {
        self.queue.iter().copied()
    }

    /// Scheduled actors, counting the acting one unless it was removed
    pub fn len(&self) -> usize {
        self.queue.len() + usize::from(self.active.as_ref().map_or(false, |t| !t.removed))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn turns_completed(&self) -> u64 {
        self.turns_completed
    }

    /// The actor whose turn is in flight, even if it has been removed
    pub fn current_actor(&self) -> Option<A> {
        self.active.as_ref().map(|t| t.actor)
    }

    pub fn is_actors_turn(&self, actor: A) -> bool {
        self.active
            .as_ref()
            .map_or(false, |t| t.actor == actor && !t.removed)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&TurnEvent<A>) + 'static) -> ListenerId {
        self.observers.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Load the living members of `roster` in order, dropping duplicates.
    ///
    /// Any turn in flight from a previous combat is discarded.
    pub fn start_combat(&mut self, roster: impl IntoIterator<Item = A>, ctx: &C) {
        self.active = None;
        self.queue.clear();
        self.turns_completed = 0;

        for actor in roster {
            if actor.is_alive(ctx) && !self.queue.contains(&actor) {
                self.queue.push_back(actor);
            }
        }

        if self.queue.is_empty() {
            log::debug!("Combat started with no living actors");
            self.state = SchedulerState::Ended;
            self.observers.notify(&TurnEvent::CombatEnded);
        } else {
            log::debug!("Combat started with {} actors", self.queue.len());
            self.state = SchedulerState::AwaitingActor;
            self.observers.notify(&TurnEvent::CombatStarted {
                actors: self.queue.len(),
            });
        }
    }

    /// Drive the scheduler one step.
    ///
    /// Starts a turn if none is running, resumes the running one, and on
    /// completion requeues the actor and starts the next actor's task. At
    /// most one turn completes per call.
    pub fn tick(&mut self, ctx: &mut C) {
        if self.paused {
            return;
        }

        match self.state {
            SchedulerState::Idle | SchedulerState::Ended => return,
            SchedulerState::AwaitingActor => {
                if !self.begin_next(ctx) {
                    return;
                }
            }
            SchedulerState::ActorActing => {}
        }

        let Some(active) = self.active.as_mut() else {
            self.state = SchedulerState::AwaitingActor;
            return;
        };
        if active.task.resume(ctx) == TurnStatus::Running {
            return;
        }

        let Some(finished) = self.active.take() else {
            return;
        };
        self.turns_completed += 1;

        let requeued = !finished.removed && finished.actor.is_alive(ctx);
        if requeued {
            self.queue.push_back(finished.actor);
        }
        log::debug!("{:?} finished its turn (requeued: {})", finished.actor, requeued);
        self.observers.notify(&TurnEvent::TurnEnded {
            actor: finished.actor,
            requeued,
        });

        self.state = SchedulerState::AwaitingActor;
        self.begin_next(ctx);
    }

    /// Dequeue the next living actor and start its task.
    /// Returns false (and ends combat) if nobody is left.
    fn begin_next(&mut self, ctx: &mut C) -> bool {
        while let Some(actor) = self.queue.pop_front() {
            if !actor.is_alive(ctx) {
                log::debug!("{:?} died while queued, dropping it", actor);
                self.observers.notify(&TurnEvent::ActorRemoved(actor));
                continue;
            }

            let task = actor.take_turn(ctx);
            self.active = Some(ActiveTurn {
                actor,
                task,
                removed: false,
            });
            self.state = SchedulerState::ActorActing;
            self.observers.notify(&TurnEvent::TurnStarted(actor));
            return true;
        }

        log::debug!("Turn queue empty, combat over");
        self.state = SchedulerState::Ended;
        self.observers.notify(&TurnEvent::CombatEnded);
        false
    }

    /// Take an actor out of the rotation for good.
    ///
    /// The order of the others is preserved. If the actor is mid-turn its
    /// task keeps running to completion but it will not be requeued.
    pub fn remove_actor(&mut self, actor: A) -> bool {
        let mut removed = false;

        if let Some(pos) = self.queue.iter().position(|a| *a == actor) {
            self.queue.remove(pos);
            removed = true;
        }
        if let Some(active) = self.active.as_mut() {
            if active.actor == actor && !active.removed {
                active.removed = true;
                removed = true;
            }
        }

        if removed {
            log::debug!("{:?} removed from combat", actor);
            self.observers.notify(&TurnEvent::ActorRemoved(actor));
        }

        if self.state == SchedulerState::AwaitingActor && self.queue.is_empty() && self.active.is_none() {
            self.state = SchedulerState::Ended;
            self.observers.notify(&TurnEvent::CombatEnded);
        }

        removed
    }

    /// Append a living actor that is not already scheduled.
    /// Joining an idle or finished scheduler resumes combat.
    pub fn add_actor(&mut self, actor: A, ctx: &C) -> bool {
        let already_scheduled = self.queue.contains(&actor) || self.current_actor() == Some(actor);
        if already_scheduled || !actor.is_alive(ctx) {
            return false;
        }

        self.queue.push_back(actor);
        if matches!(self.state, SchedulerState::Idle | SchedulerState::Ended) {
            self.state = SchedulerState::AwaitingActor;
        }
        true
    }

    /// Send a queued actor to the back of the line
    pub fn skip_turn(&mut self, actor: A) -> bool {
        match self.queue.iter().position(|a| *a == actor) {
            Some(pos) => {
                self.queue.remove(pos);
                self.queue.push_back(actor);
                true
            }
            None => false,
        }
    }

    /// Reorder waiting actors fastest first; ties keep their order
    pub fn sort_by_speed(&mut self, ctx: &C) {
        self.queue
            .make_contiguous()
            .sort_by_key(|a| Reverse(a.speed(ctx)));
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.queue.make_contiguous().shuffle(rng);
    }

    /// Stop combat now, dropping any turn in flight
    pub fn end_combat(&mut self) {
        self.active = None;
        self.queue.clear();
        if self.state != SchedulerState::Ended {
            self.state = SchedulerState::Ended;
            self.observers.notify(&TurnEvent::CombatEnded);
        }
    }

    /// Back to `Idle`. Subscriptions are kept.
    pub fn reset(&mut self) {
        self.active = None;
        self.queue.clear();
        self.paused = false;
        self.turns_completed = 0;
        self.state = SchedulerState::Idle;
    }
}

impl<A: Actable<C>, C> Default for TurnScheduler<A, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: fmt::Debug, C> fmt::Debug for TurnScheduler<A, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnScheduler")
            .field("state", &self.state)
            .field("queue", &self.queue)
            .field("active", &self.active.as_ref().map(|t| (&t.actor, t.removed)))
            .field("paused", &self.paused)
            .field("turns_completed", &self.turns_completed)
            .finish()
    }
}
