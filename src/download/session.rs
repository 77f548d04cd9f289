//! Per-user download sessions.
//!
//! One session per user, stamped with a process-wide generation. A new submission
//! overwrites the previous session, so timers and buttons of the old one find a
//! generation mismatch and do nothing.
//!
//! Resolution of the quality choice happens only in [`SessionStore::try_resolve`], under
//! the map's per-key lock, so a button press and the timeout can never both win.
//!
//! A submission reserves its generation before the (slow) format lookup starts. The newest
//! reservation of a user decides which submission may open a session, so a lookup that
//! finishes late never overwrites a later submission.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use strum::Display;
use teloxide::types::{ChatId, UserId};
use url::Url;

use crate::download::formats::{CandidateFormat, CatalogEntry, Choice};
use crate::download::pipeline::ResolvedJob;
use crate::download::transport::PromptId;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Hands out a generation that is never reused for the life of the process
pub fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Monotonic: `AwaitingChoice -> Resolved -> Consumed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ResolutionState {
    AwaitingChoice,
    Resolved,
    Consumed,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub user: UserId,
    pub chat: ChatId,
    pub generation: u64,
    pub url: Url,
    pub title: String,
    pub duration_secs: u64,
    pub candidates: Vec<CandidateFormat>,
    pub auto_pick: String,
    pub chosen: Option<String>,
    pub state: ResolutionState,
    pub prompt: Option<PromptId>,
}

/// Returned to the single winner of the selection race.
///
/// Carries the job itself, so a session superseded after this point still runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub chat: ChatId,
    pub format_id: String,
    pub automatic: bool,
    pub prompt: Option<PromptId>,
    pub job: ResolvedJob,
}

#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<UserId, Session>,
    /// Newest generation reserved per user
    reserved: DashMap<UserId, u64>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the generation of a new submission. Older reservations of `user` can no
    /// longer open a session.
    pub fn reserve(&self, user: UserId) -> u64 {
        let generation = next_generation();
        self.reserved
            .entry(user)
            .and_modify(|newest| *newest = (*newest).max(generation))
            .or_insert(generation);
        generation
    }

    /// Stores the session of a reserved generation, replacing any previous one.
    ///
    /// Refused (false) when a newer submission of the same user was reserved meanwhile.
    pub fn open(&self, user: UserId, chat: ChatId, generation: u64, entry: &CatalogEntry) -> bool {
        // Held until the insert, so a concurrent `reserve` waits for it
        let newest = self.reserved.get(&user);
        if newest.as_deref().is_some_and(|newest| *newest > generation) {
            log::debug!("Generation {} of user {} lost to a newer submission", generation, user);
            return false;
        }

        let session = Session {
            user,
            chat,
            generation,
            url: entry.url.clone(),
            title: entry.title.clone(),
            duration_secs: entry.duration_secs,
            candidates: entry.candidates.clone(),
            auto_pick: entry.auto_pick.clone(),
            chosen: None,
            state: ResolutionState::AwaitingChoice,
            prompt: None,
        };

        if let Some(previous) = self.sessions.insert(user, session) {
            log::info!(
                "Session {} of user {} superseded by {} (was {})",
                previous.generation,
                user,
                generation,
                previous.state
            );
        }
        drop(newest);
        true
    }

    /// Remembers the prompt message of a session. False if the session is gone or newer.
    pub fn set_prompt(&self, user: UserId, generation: u64, prompt: PromptId) -> bool {
        match self.sessions.get_mut(&user) {
            Some(mut session) if session.generation == generation => {
                session.prompt = Some(prompt);
                true
            }
            _ => false,
        }
    }

    /// Fixes the chosen format if, and only if, the session is current and still waiting.
    ///
    /// `Choice::Auto` maps to the session's automatic pick. A format id that was never a
    /// candidate is refused. Every refusal returns `None` without mutating anything.
    pub fn try_resolve(&self, user: UserId, generation: u64, choice: &Choice) -> Option<Resolution> {
        let mut session = self.sessions.get_mut(&user)?;
        if session.generation != generation || session.state != ResolutionState::AwaitingChoice {
            return None;
        }

        let (format_id, automatic) = match choice {
            Choice::Auto => (session.auto_pick.clone(), true),
            Choice::Format(id) if session.candidates.iter().any(|c| &c.id == id) => (id.clone(), false),
            Choice::Format(id) => {
                log::warn!("User {} selected unknown format {}", user, id);
                return None;
            }
        };

        session.chosen = Some(format_id.clone());
        session.state = ResolutionState::Resolved;
        let job = ResolvedJob {
            user,
            chat: session.chat,
            generation,
            url: session.url.clone(),
            title: session.title.clone(),
            duration_secs: session.duration_secs,
            format_id: format_id.clone(),
        };
        Some(Resolution {
            chat: session.chat,
            format_id,
            automatic,
            prompt: session.prompt,
            job,
        })
    }

    /// Moves a resolved session to `Consumed`. False if it is gone, newer or not resolved.
    pub fn consume(&self, user: UserId, generation: u64) -> bool {
        match self.sessions.get_mut(&user) {
            Some(mut session)
                if session.generation == generation && session.state == ResolutionState::Resolved =>
            {
                session.state = ResolutionState::Consumed;
                true
            }
            _ => false,
        }
    }

    /// Removes the session only if it still belongs to `generation`.
    pub fn finish(&self, user: UserId, generation: u64) -> bool {
        self.sessions
            .remove_if(&user, |_, session| session.generation == generation)
            .is_some()
    }

    pub fn is_current(&self, user: UserId, generation: u64) -> bool {
        self.sessions
            .get(&user)
            .is_some_and(|session| session.generation == generation)
    }

    pub fn snapshot(&self, user: UserId) -> Option<Session> {
        self.sessions.get(&user).map(|session| session.clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
