//! Debounced relayout scheduling.
//!
//! Requests do not compute anything. They enqueue (or join) a pending pass
//! that the host runs later from its event loop via
//! [`Root::run_pending_relayouts`](super::Root::run_pending_relayouts).
//!
//! - `request` joins the newest pass that has not started yet, so any number
//!   of requests before the pass runs collapse into one pass.
//! - `enforce` always appends a pass of its own.
//! - A pass leaves the queue when it starts; requests made after that point
//!   queue the next pass instead of joining a running one.
//!
//! Every pass owns a [`RelayoutCompletion`], a future shared by all requests
//! that joined the pass and resolved once the pass has finished.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use serde::Serialize;
use tracing::{debug, trace};

use crate::error::LayoutError;

/// Outcome of one executed relayout pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassSummary {
    /// Sequence number of the pass (first pass = 1, 0 = no pass has run).
    pub pass: u64,
    /// Number of requests that were coalesced into this pass.
    pub requests: u32,
    /// Number of visible nodes that received a new layout.
    pub laid_out: usize,
}

type PassResult = Result<PassSummary, LayoutError>;

#[derive(Debug, Default)]
struct CompletionState {
    result: Option<PassResult>,
    wakers: Vec<Waker>,
}

/// Completion signal of one relayout pass.
///
/// Clones share the same state and resolve together.
#[derive(Debug, Clone, Default)]
pub struct RelayoutCompletion {
    state: Rc<RefCell<CompletionState>>,
}

impl RelayoutCompletion {
    fn pending() -> Self {
        Self::default()
    }

    fn resolved(result: PassResult) -> Self {
        let completion = Self::default();
        completion.resolve(result);
        completion
    }

    /// True once the pass has run.
    pub fn is_done(&self) -> bool {
        self.state.borrow().result.is_some()
    }

    /// The pass result, if it has run.
    pub fn result(&self) -> Option<PassResult> {
        self.state.borrow().result
    }

    /// True if both handles belong to the same pass.
    pub fn same_pass(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    fn resolve(&self, result: PassResult) {
        let wakers = {
            let mut state = self.state.borrow_mut();
            state.result = Some(result);
            std::mem::take(&mut state.wakers)
        };
        for waker in wakers {
            waker.wake();
        }
    }
}

impl Future for RelayoutCompletion {
    type Output = PassResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.state.borrow_mut();
        match state.result {
            Some(result) => Poll::Ready(result),
            None => {
                if !state.wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    state.wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

/// A queued pass that has not started yet.
#[derive(Debug)]
pub(crate) struct PendingPass {
    pub id: u64,
    pub enforced: bool,
    pub requests: u32,
    /// Toggles waiting for this pass before their fold-finished notification.
    pub fold_finished: u32,
    pub completion: RelayoutCompletion,
}

/// Queue of relayout passes waiting to run.
#[derive(Debug, Default)]
pub struct RelayoutScheduler {
    queue: VecDeque<PendingPass>,
    next_id: u64,
    last_finished: Option<RelayoutCompletion>,
}

impl RelayoutScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a pass, joining the newest pending one if there is one.
    pub fn request(&mut self) -> RelayoutCompletion {
        if let Some(pass) = self.queue.back_mut() {
            pass.requests += 1;
            trace!(pass = pass.id, requests = pass.requests, "relayout request coalesced");
            return pass.completion.clone();
        }
        self.push(false)
    }

    /// Request a pass that is guaranteed to be distinct from every other.
    pub fn enforce(&mut self) -> RelayoutCompletion {
        self.push(true)
    }

    /// Request a pass and attach one fold-finished notification to it.
    pub(crate) fn request_with_fold_finished(&mut self) -> RelayoutCompletion {
        let completion = self.request();
        if let Some(pass) = self.queue.back_mut() {
            pass.fold_finished += 1;
        }
        completion
    }

    fn push(&mut self, enforced: bool) -> RelayoutCompletion {
        self.next_id += 1;
        let completion = RelayoutCompletion::pending();
        self.queue.push_back(PendingPass {
            id: self.next_id,
            enforced,
            requests: 1,
            fold_finished: 0,
            completion: completion.clone(),
        });
        debug!(pass = self.next_id, enforced, queued = self.queue.len(), "relayout scheduled");
        completion
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Completion of the newest pass: the last queued one, otherwise the last
    /// finished one, otherwise an already resolved handle.
    pub fn latest_completion(&self) -> RelayoutCompletion {
        self.queue
            .back()
            .map(|pass| pass.completion.clone())
            .or_else(|| self.last_finished.clone())
            .unwrap_or_else(|| RelayoutCompletion::resolved(Ok(PassSummary::default())))
    }

    /// Dequeue the next pass. From here on it no longer accepts requests.
    pub(crate) fn start_next(&mut self) -> Option<PendingPass> {
        self.queue.pop_front()
    }

    pub(crate) fn finish(&mut self, pass: PendingPass, result: PassResult) {
        trace!(pass = pass.id, ok = result.is_ok(), "relayout finished");
        pass.completion.resolve(result);
        self.last_finished = Some(pass.completion);
    }
}
