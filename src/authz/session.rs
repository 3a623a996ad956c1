use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::stores::IdentityStore;

use super::decision::{AccessState, AuthStatus, Resolution};
use super::resolver::RoleResolver;
use super::role::{ActorId, TeamId};

#[derive(Debug, Clone, Default)]
struct Context {
    actor_id: Option<ActorId>,
    team_id: Option<TeamId>,
    generation: u64,
}

/// Snapshot of the context a resolution was started for.
#[derive(Debug, Clone)]
pub struct Ticket {
    actor_id: ActorId,
    team_id: Option<TeamId>,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The result matched the live context and was published.
    Current(Resolution),
    /// The context changed while the lookup was in flight; the result was dropped.
    Stale,
}

/// Access state for one long-lived view.
///
/// Every change of actor or team bumps a generation counter and resets the
/// role to [`Resolution::Pending`]. A resolution only publishes its result if
/// the generation it started under is still current, so a late answer for a
/// previous team can never be applied to the next one.
pub struct RoleSession {
    resolver: RoleResolver,
    identity: Arc<dyn IdentityStore>,
    context: Mutex<Context>,
    state: watch::Sender<AccessState>,
}

impl RoleSession {
    pub fn new(resolver: RoleResolver, identity: Arc<dyn IdentityStore>) -> Self {
        let (state, _) = watch::channel(AccessState::default());
        Self {
            resolver,
            identity,
            context: Mutex::new(Context::default()),
            state,
        }
    }

    /// Current state; never waits on an in-flight resolution.
    pub fn state(&self) -> AccessState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AccessState> {
        self.state.subscribe()
    }

    /// Confirms who is signed in, then resolves their role for the current team.
    pub async fn authenticate(&self) -> Applied {
        let generation = self.generation();

        match self.identity.current_actor().await {
            Ok(actor_id) => {
                if self.generation() != generation {
                    return Applied::Stale;
                }
                if self.set_actor(actor_id).is_none() {
                    return Applied::Current(Resolution::Pending);
                }
                self.refresh().await
            }
            Err(err) => {
                tracing::warn!(error = %err, "identity lookup failed");
                self.publish_if_current(generation, |state| {
                    state.role = Resolution::Failed;
                })
            }
        }
    }

    /// Switches the signed-in actor. Returns a ticket unless nobody is signed in.
    pub fn set_actor(&self, actor_id: Option<ActorId>) -> Option<Ticket> {
        self.switch(true, |ctx| ctx.actor_id = actor_id)
    }

    /// Switches the team in view.
    pub fn set_team(&self, team_id: Option<TeamId>) -> Option<Ticket> {
        self.switch(false, |ctx| ctx.team_id = team_id)
    }

    /// Resolves for whatever context is live right now.
    pub async fn refresh(&self) -> Applied {
        match self.ticket() {
            Some(ticket) => self.resolve(ticket).await,
            None => Applied::Current(Resolution::Pending),
        }
    }

    /// Runs the resolution for `ticket` and publishes it if still current.
    pub async fn resolve(&self, ticket: Ticket) -> Applied {
        let role = self.resolver.resolve(&ticket.actor_id, ticket.team_id.as_ref()).await;

        let applied = self.publish_if_current(ticket.generation, |state| {
            state.auth = AuthStatus::Authenticated(ticket.actor_id.clone());
            state.role = Resolution::Resolved(role);
        });

        if applied == Applied::Stale {
            tracing::debug!(
                actor_id = %ticket.actor_id,
                team_id = ?ticket.team_id,
                "discarding stale role resolution"
            );
        }
        applied
    }

    /// Applies `change` and publishes the reset state under the same lock, so
    /// the published state always follows the order of generation bumps.
    fn switch(&self, signed_out_when_anonymous: bool, change: impl FnOnce(&mut Context)) -> Option<Ticket> {
        let mut ctx = self.lock();
        change(&mut ctx);
        ctx.generation += 1;
        let ticket = Self::ticket_for(&ctx);

        match &ticket {
            Some(ticket) => {
                let actor_id = ticket.actor_id.clone();
                self.state.send_modify(|state| {
                    state.auth = AuthStatus::Authenticated(actor_id);
                    state.role = Resolution::Pending;
                });
            }
            None if signed_out_when_anonymous => {
                self.state.send_replace(AccessState::unauthenticated());
            }
            None => {}
        }
        ticket
    }

    fn ticket(&self) -> Option<Ticket> {
        Self::ticket_for(&self.lock())
    }

    fn ticket_for(ctx: &Context) -> Option<Ticket> {
        ctx.actor_id.as_ref().map(|actor_id| Ticket {
            actor_id: actor_id.clone(),
            team_id: ctx.team_id.clone(),
            generation: ctx.generation,
        })
    }

    fn generation(&self) -> u64 {
        self.lock().generation
    }

    fn publish_if_current(&self, generation: u64, update: impl FnOnce(&mut AccessState)) -> Applied {
        let ctx = self.lock();
        if ctx.generation != generation {
            return Applied::Stale;
        }
        self.state.send_modify(update);
        Applied::Current(self.state.borrow().role)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Context> {
        // The guarded data is plain values, so a poisoned lock is still usable.
        self.context.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
