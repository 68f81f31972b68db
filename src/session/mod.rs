//! Session controller: owns the active category, the display slots and the
//! coverage set, and drives resolution for full-category loads and targeted
//! searches.
//!
//! All state lives on the `Session` value; nothing is global, so independent
//! sessions never share coverage. Resolutions for several numbers may be in
//! flight at once, but outcomes are applied one at a time through `&mut self`,
//! and each application checks coverage before mutating anything. That check
//! is what keeps two slots from both claiming the same combined file.

mod error;
mod events;

pub use error::SessionError;
pub use events::{SessionEvent, SessionStatus};

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::coverage::CoverageSet;
use crate::models::{Category, CategoryRegistry, DisplaySlot, SlotContent, SlotImage};
use crate::resolver::{Resolution, Resolver};

/// Numbers resolved immediately by a full-category load.
pub const DEFAULT_EAGER_PREFIX: usize = 20;

/// Numbers resolved concurrently.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Scheduling knobs for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// How many leading numbers a full load resolves before waiting for
    /// viewport notifications.
    pub eager_prefix: usize,
    /// Upper bound on numbers resolving at the same time.
    pub concurrency: usize,
    /// Whether a targeted search also resolves the following number.
    pub lookahead: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            eager_prefix: DEFAULT_EAGER_PREFIX,
            concurrency: DEFAULT_CONCURRENCY,
            lookahead: true,
        }
    }
}

/// What a targeted search produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReport {
    pub number: u32,
    /// Key of the slot to scroll to.
    pub key: u32,
    pub resolution: Resolution,
    /// Resolution of the following number, when lookahead ran.
    pub next: Option<Resolution>,
}

/// Slot tally after a load step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub category: String,
    pub total: u32,
    pub images: usize,
    pub not_found: usize,
    pub suppressed: usize,
    pub pending: usize,
}

/// What happened to a resolution when it reached the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Applied {
    Rendered,
    Discarded,
}

/// One viewing session over a single active category.
pub struct Session {
    registry: CategoryRegistry,
    resolver: Arc<Resolver>,
    options: SessionOptions,
    category: Category,
    coverage: CoverageSet,
    slots: BTreeMap<u32, DisplaySlot>,
    pending: BTreeSet<u32>,
    status: SessionStatus,
    events: Option<UnboundedSender<SessionEvent>>,
}

impl Session {
    /// Create a session on the registry's default category.
    pub fn new(
        registry: CategoryRegistry,
        resolver: Arc<Resolver>,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        let category = registry
            .default_category()
            .cloned()
            .ok_or(SessionError::NoCategories)?;

        Ok(Self {
            registry,
            resolver,
            options,
            category,
            coverage: CoverageSet::new(),
            slots: BTreeMap::new(),
            pending: BTreeSet::new(),
            status: SessionStatus::Idle,
            events: None,
        })
    }

    /// Forward session events to the UI layer.
    pub fn with_events(mut self, tx: UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn coverage(&self) -> &CoverageSet {
        &self.coverage
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Slots in ascending creation order.
    pub fn slots(&self) -> impl Iterator<Item = &DisplaySlot> {
        self.slots.values()
    }

    /// The slot created for `number`, visible or not.
    pub fn slot(&self, number: u32) -> Option<&DisplaySlot> {
        self.slots.get(&number)
    }

    /// The visible slot currently rendering `number`.
    pub fn visible_slot_for(&self, number: u32) -> Option<&DisplaySlot> {
        self.slots.values().find(|s| s.renders(number))
    }

    /// Numbers waiting for a viewport notification.
    pub fn pending(&self) -> impl Iterator<Item = u32> + '_ {
        self.pending.iter().copied()
    }

    /// Every slot shows an image or a not-found marker, or is hidden.
    pub fn is_complete(&self) -> bool {
        self.slots.values().all(|s| s.is_settled())
    }

    pub fn summary(&self) -> LoadSummary {
        let mut summary = LoadSummary {
            category: self.category.id.clone(),
            total: self.category.total,
            pending: self.pending.len(),
            ..LoadSummary::default()
        };
        for slot in self.slots.values() {
            if !slot.is_visible() {
                summary.suppressed += 1;
            } else {
                match slot.content {
                    SlotContent::Images { .. } => summary.images += 1,
                    SlotContent::NotFound => summary.not_found += 1,
                    SlotContent::Placeholder => {}
                }
            }
        }
        summary
    }

    /// Make `category_id` the active category with an empty session.
    pub fn start(&mut self, category_id: &str) -> Result<(), SessionError> {
        let category = self
            .registry
            .get(category_id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownCategory(category_id.to_string()))?;

        self.reset();
        self.category = category;
        info!(
            "Category {} ({}): numbers 1-{}",
            self.category.id, self.category.name, self.category.total
        );
        self.emit(SessionEvent::Welcome {
            category: self.category.id.clone(),
            name: self.category.name.clone(),
            total: self.category.total,
        });
        Ok(())
    }

    /// Discard every slot, clear coverage and drop deferred work.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.coverage.clear();
        self.pending.clear();
    }

    /// Switch category and begin a fresh full-category load.
    pub async fn switch_category(&mut self, category_id: &str) -> Result<LoadSummary, SessionError> {
        self.start(category_id)?;
        Ok(self.load_category().await)
    }

    /// Create a slot for every number in ascending order, then resolve the
    /// eager prefix. The rest waits for `notify_visible` or `drain_pending`.
    pub async fn load_category(&mut self) -> LoadSummary {
        self.reset();
        self.set_status(SessionStatus::Loading);

        for number in 1..=self.category.total {
            self.create_slot(number);
            self.pending.insert(number);
        }

        let eager: Vec<u32> = self
            .pending
            .iter()
            .copied()
            .take(self.options.eager_prefix)
            .collect();
        self.resolve_numbers(eager).await;

        self.set_status(SessionStatus::Idle);
        self.summary()
    }

    /// Resolve a deferred number once the UI reports it visible.
    /// Returns `false` when there was nothing left to do for it.
    pub async fn notify_visible(&mut self, number: u32) -> bool {
        if !self.pending.contains(&number) {
            return false;
        }

        self.set_status(SessionStatus::Loading);
        self.resolve_numbers(vec![number]).await;
        self.set_status(SessionStatus::Idle);
        true
    }

    /// Resolve every deferred number.
    pub async fn drain_pending(&mut self) -> LoadSummary {
        if !self.pending.is_empty() {
            self.set_status(SessionStatus::Loading);
            let numbers: Vec<u32> = self.pending.iter().copied().collect();
            self.resolve_numbers(numbers).await;
            self.set_status(SessionStatus::Idle);
        }
        self.summary()
    }

    /// Full load followed by resolving everything that was deferred.
    pub async fn load_category_fully(&mut self) -> LoadSummary {
        self.load_category().await;
        self.drain_pending().await
    }

    /// Parse raw search input and run a targeted search.
    pub async fn search_input(&mut self, input: &str) -> Result<SearchReport, SessionError> {
        match input.trim().parse::<u32>() {
            Ok(number) => self.search(number).await,
            Err(_) => {
                let err = SessionError::InvalidInput {
                    input: input.to_string(),
                    name: self.category.name.clone(),
                    total: self.category.total,
                };
                self.emit(SessionEvent::ValidationError {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Show `number` alone (plus, with lookahead, the number after it).
    ///
    /// Out-of-range numbers leave the session untouched.
    pub async fn search(&mut self, number: u32) -> Result<SearchReport, SessionError> {
        if !self.category.contains(number) {
            let err = SessionError::OutOfRange {
                number,
                name: self.category.name.clone(),
                total: self.category.total,
            };
            self.emit(SessionEvent::ValidationError {
                message: err.to_string(),
            });
            return Err(err);
        }

        info!("Searching {} #{}", self.category.id, number);
        self.reset();
        self.set_status(SessionStatus::Loading);

        self.create_slot(number);
        let resolution = self.resolve_one(number).await;

        let mut next = None;
        if self.options.lookahead && !resolution.has_continuation() {
            let following = resolution.covered().end() + 1;
            if following <= self.category.total {
                debug!("Lookahead: resolving #{}", following);
                self.create_slot(following);
                next = Some(self.resolve_one(following).await);
            }
        }

        self.set_status(SessionStatus::Idle);

        let key = self
            .visible_slot_for(number)
            .map(|s| s.key)
            .unwrap_or(number);
        self.emit(SessionEvent::ScrollTo { key });

        Ok(SearchReport {
            number,
            key,
            resolution,
            next,
        })
    }

    /// Un-hide a slot suppressed by a combined winner, without re-probing.
    pub fn reveal(&mut self, number: u32) -> bool {
        let Some(slot) = self.slots.get_mut(&number) else {
            return false;
        };
        if slot.suppressed_by.take().is_none() {
            return false;
        }
        self.emit(SessionEvent::SlotRevealed { number });
        true
    }

    fn create_slot(&mut self, number: u32) {
        if self.slots.contains_key(&number) {
            return;
        }
        self.slots.insert(number, DisplaySlot::placeholder(number));
        self.emit(SessionEvent::SlotCreated { number });
    }

    async fn resolve_one(&mut self, number: u32) -> Resolution {
        let resolution = self.resolver.resolve(&self.category, number).await;
        self.pending.remove(&number);
        self.apply(resolution.clone());
        resolution
    }

    /// Resolve `numbers` with bounded concurrency, skipping any number that
    /// an earlier combined win already covered by the time it is scheduled.
    async fn resolve_numbers(&mut self, numbers: Vec<u32>) {
        let limit = self.options.concurrency.max(1);
        let mut queue = numbers.into_iter();
        let mut in_flight = FuturesUnordered::new();

        loop {
            while in_flight.len() < limit {
                let Some(number) = queue.next() else { break };
                self.pending.remove(&number);
                if self.coverage.contains(number) {
                    debug!("#{} already covered, skipping", number);
                    continue;
                }

                let resolver = Arc::clone(&self.resolver);
                let category = self.category.clone();
                in_flight.push(async move { resolver.resolve(&category, number).await });
            }

            match in_flight.next().await {
                Some(resolution) => {
                    self.apply(resolution);
                }
                None => break,
            }
        }
    }

    /// Apply one resolution. Coverage is consulted before any mutation so a
    /// number already claimed by another slot is never claimed twice.
    ///
    /// A combined win is rendered by the lowest newly claimed number that has
    /// a slot, whichever number's resolution found it. Every other claimed
    /// slot is suppressed and leaves the pending queue.
    fn apply(&mut self, resolution: Resolution) -> Applied {
        let number = resolution.number;

        if self.coverage.contains(number) {
            debug!("#{} resolved after being claimed; discarding", number);
            return Applied::Discarded;
        }
        let Some(slot) = self.slots.get_mut(&number) else {
            debug!("#{} has no slot in this session; discarding", number);
            return Applied::Discarded;
        };

        let Some(winner) = resolution.winner else {
            slot.content = SlotContent::NotFound;
            let snapshot = slot.clone();
            self.emit(SessionEvent::SlotResolved { slot: snapshot });
            return Applied::Rendered;
        };

        let claimed: Vec<u32> = winner
            .covered()
            .filter(|n| !self.coverage.contains(*n))
            .collect();
        self.coverage.add(claimed.iter().copied());
        for n in &claimed {
            self.pending.remove(n);
        }

        let owner = claimed
            .iter()
            .copied()
            .find(|n| self.slots.contains_key(n))
            .unwrap_or(number);
        let key = claimed.first().copied().unwrap_or(number);
        let last = claimed.last().copied().unwrap_or(number);

        let mut images = vec![SlotImage {
            path: winner.path.clone(),
            label: winner.label(),
        }];
        images.extend(
            resolution
                .continuations
                .into_iter()
                .enumerate()
                .map(|(i, path)| SlotImage {
                    path,
                    label: format!("{} (page {})", owner, i + 2),
                }),
        );

        if owner != number {
            debug!("#{} found {}; slot #{} renders it", number, winner.path, owner);
        }
        if let Some(slot) = self.slots.get_mut(&owner) {
            slot.key = key;
            slot.last = last;
            slot.suppressed_by = None;
            slot.content = SlotContent::Images { images };
            let snapshot = slot.clone();
            self.emit(SessionEvent::SlotResolved { slot: snapshot });
        }

        for sibling in claimed.into_iter().filter(|n| *n != owner) {
            if let Some(other) = self.slots.get_mut(&sibling) {
                other.suppressed_by = Some(owner);
                self.emit(SessionEvent::SlotSuppressed {
                    number: sibling,
                    by: owner,
                });
            }
        }

        Applied::Rendered
    }

    fn set_status(&mut self, status: SessionStatus) {
        if self.status != status {
            self.status = status;
            self.emit(SessionEvent::Status { status });
        }
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}
