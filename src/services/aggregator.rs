//! Continuation walking over the upstream's cursor-paginated listings.
//!
//! Every listing (related videos, comments, channel videos, search) follows
//! the same shape: one initial fetch, then zero or more resume calls each
//! consuming the cursor returned by the previous page. The walk is strictly
//! sequential and never retried.

use std::collections::HashSet;
use std::future::Future;

use crate::{
    error::AppResult,
    models::{Continuation, Identified, Page, PageSlice},
};

/// Limits for one continuation walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationBudget {
    /// Stop once at least this many unique items are collected
    pub target: usize,
    /// Maximum number of resume calls after the initial fetch
    pub max_continuations: usize,
}

impl AggregationBudget {
    pub fn new(target: usize, max_continuations: usize) -> Self {
        Self {
            target,
            max_continuations,
        }
    }

    /// Page-indexed walks are bounded by their target alone
    ///
    /// Every productive resume call adds at least one item and an
    /// unproductive one ends the walk, so `target` calls is a hard ceiling.
    pub fn until(target: usize) -> Self {
        Self::new(target, target)
    }
}

/// Why a walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TargetReached,
    Exhausted,
    BudgetSpent,
    /// A page added nothing new even though more was advertised
    Stalled,
    ContinuationFailed,
}

/// Result of a continuation walk
#[derive(Debug)]
pub struct Aggregated<T> {
    /// Unique items in upstream order, first occurrence wins
    pub items: Vec<T>,
    /// Unconsumed cursor when the walk stopped early on target or budget
    pub continuation: Option<Continuation>,
    pub stop: StopReason,
}

impl<T> Aggregated<T> {
    /// True when the upstream is known to hold more than what was collected
    pub fn has_more(&self) -> bool {
        self.continuation.is_some()
    }
}

/// Order-preserving, ID-deduplicating accumulator
struct Collector<T, A> {
    seen: HashSet<String>,
    items: Vec<T>,
    accept: A,
    dropped: usize,
}

impl<T, A> Collector<T, A>
where
    T: Identified,
    A: Fn(&T) -> bool,
{
    fn new(accept: A) -> Self {
        Self {
            seen: HashSet::new(),
            items: Vec::new(),
            accept,
            dropped: 0,
        }
    }

    /// Merges a page, returning how many new unique items it contributed
    fn absorb(&mut self, page_items: Vec<T>) -> usize {
        let before = self.items.len();
        for item in page_items {
            if !(self.accept)(&item) {
                self.dropped += 1;
                continue;
            }
            if self.seen.insert(item.key().to_string()) {
                self.items.push(item);
            }
        }
        self.items.len() - before
    }
}

/// Accepts anything with a non-empty key
pub fn has_key<T: Identified>(item: &T) -> bool {
    !item.key().is_empty()
}

/// Walks continuations starting from an already-fetched first page
///
/// Stops when the target is reached, no cursor is left, the resume budget is
/// spent, a page adds zero new unique items, or a resume call fails. A
/// failure is logged and swallowed: the walk keeps what it collected.
pub async fn aggregate<T, A, F, Fut>(
    first: Page<T>,
    budget: AggregationBudget,
    accept: A,
    mut next_page: F,
) -> Aggregated<T>
where
    T: Identified,
    A: Fn(&T) -> bool,
    F: FnMut(Continuation) -> Fut,
    Fut: Future<Output = AppResult<Page<T>>>,
{
    let mut collector = Collector::new(accept);
    collector.absorb(first.items);
    let mut cursor = first.continuation;
    let mut resumes = 0;

    let stop = loop {
        if collector.items.len() >= budget.target {
            break StopReason::TargetReached;
        }
        if resumes >= budget.max_continuations && cursor.is_some() {
            break StopReason::BudgetSpent;
        }
        let Some(token) = cursor.take() else {
            break StopReason::Exhausted;
        };
        resumes += 1;

        match next_page(token).await {
            Ok(page) => {
                let added = collector.absorb(page.items);
                cursor = page.continuation;
                if added == 0 {
                    tracing::debug!(
                        resumes,
                        collected = collector.items.len(),
                        "Continuation page added nothing new, treating as exhausted"
                    );
                    cursor = None;
                    break StopReason::Stalled;
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    resumes,
                    collected = collector.items.len(),
                    "Continuation fetch failed, keeping collected items"
                );
                break StopReason::ContinuationFailed;
            }
        }
    };

    if collector.dropped > 0 {
        tracing::debug!(dropped = collector.dropped, "Dropped malformed upstream items");
    }

    Aggregated {
        items: collector.items,
        continuation: cursor,
        stop,
    }
}

/// Cuts page `page` (1-based) of `page_size` items out of a walk
///
/// The walk must have been run with a target of at least
/// `page * page_size`. A next-page token is reported whenever items beyond
/// the slice are already collected or the upstream still has a cursor.
pub fn slice_page<T>(aggregated: Aggregated<T>, page: usize, page_size: usize) -> PageSlice<T> {
    let has_more_upstream = aggregated.has_more();
    let start = page.saturating_sub(1).saturating_mul(page_size);
    let end = start.saturating_add(page_size);
    let total = aggregated.items.len();

    let items: Vec<T> = aggregated
        .items
        .into_iter()
        .skip(start)
        .take(page_size)
        .collect();

    let next_page_token = if total > end || has_more_upstream {
        Some((page + 1).to_string())
    } else {
        None
    };

    PageSlice {
        items,
        next_page_token,
    }
}
