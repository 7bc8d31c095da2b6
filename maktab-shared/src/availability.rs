//! Slot availability computation
//!
//! Answers the public form's question: which slots can still be booked, and
//! which of those admit an applicant with a given tajweed level?
//!
//! The computation is a pure function of {slots, admins, registrations,
//! optional level}: one pass over registrations builds a per-slot count map,
//! one pass over admins builds a per-slot tag map, and slots are filtered in
//! O(n). Re-running it with unchanged inputs yields an identical result.
//!
//! [`AvailabilityCache`] wraps the inputs in an explicit
//! `{ fetched_at, payload }` snapshot with a seconds-scale TTL, collapsing
//! bursts of change-triggered refetches. A forced refresh bypasses the TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::models::admin::{Admin, AdminRole};
use crate::models::registration::Registration;
use crate::models::slot::Slot;

/// One slot with its current occupancy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotAvailability {
    /// The slot itself
    pub slot: Slot,

    /// Current number of registrations in the slot
    pub registered: usize,

    /// Seats left (`max_registrations - registered`, floored at zero)
    pub remaining: usize,
}

/// Computes the slots an applicant may register into
///
/// A slot qualifies when its registration count is below
/// `max_registrations`, and — if `level` is given — when its assigned
/// admin's tajweed tags include that level. A slot whose admin has no tags
/// configured (or no slot admin at all) admits every applicant.
pub fn available_slots(
    slots: &[Slot],
    admins: &[Admin],
    registrations: &[Registration],
    level: Option<&str>,
) -> Vec<SlotAvailability> {
    // One pass: registrations grouped by slot.
    let mut counts: HashMap<Uuid, usize> = HashMap::new();
    for registration in registrations {
        *counts.entry(registration.slot_id).or_insert(0) += 1;
    }

    // One pass: slot admins keyed by their assigned slot.
    let mut slot_admins: HashMap<Uuid, &Admin> = HashMap::new();
    for admin in admins {
        if admin.role == AdminRole::SlotAdmin {
            if let Some(slot_id) = admin.assigned_slot_id {
                slot_admins.insert(slot_id, admin);
            }
        }
    }

    slots
        .iter()
        .filter_map(|slot| {
            let registered = counts.get(&slot.id).copied().unwrap_or(0);
            let capacity = slot.max_registrations.max(0) as usize;

            if registered >= capacity {
                return None;
            }

            if let Some(level) = level {
                // Fail-open: a slot with no configured tags admits everyone.
                let admitted = slot_admins
                    .get(&slot.id)
                    .map(|admin| admin.admits_level(level))
                    .unwrap_or(true);

                if !admitted {
                    return None;
                }
            }

            Some(SlotAvailability {
                slot: slot.clone(),
                registered,
                remaining: capacity - registered,
            })
        })
        .collect()
}

/// Point-in-time snapshot of the data availability is computed from
#[derive(Debug, Clone)]
pub struct AvailabilitySnapshot {
    /// When the snapshot was fetched
    pub fetched_at: Instant,

    /// All slots
    pub slots: Vec<Slot>,

    /// All admin accounts (for tag filtering)
    pub admins: Vec<Admin>,

    /// All registrations (for occupancy counting)
    pub registrations: Vec<Registration>,
}

impl AvailabilitySnapshot {
    /// Loads a fresh snapshot, fetching the three lists concurrently
    pub async fn load(pool: &PgPool) -> Result<Self, sqlx::Error> {
        let (slots, admins, registrations) = tokio::try_join!(
            Slot::list_all(pool),
            Admin::list_all(pool),
            Registration::list_all(pool),
        )?;

        Ok(Self {
            fetched_at: Instant::now(),
            slots,
            admins,
            registrations,
        })
    }

    /// Computes availability from this snapshot
    pub fn available(&self, level: Option<&str>) -> Vec<SlotAvailability> {
        available_slots(&self.slots, &self.admins, &self.registrations, level)
    }
}

/// TTL cache around [`AvailabilitySnapshot`]
///
/// Owned by the serving state; there is no ambient global. Writes to the
/// underlying collections call [`AvailabilityCache::invalidate`] (usually
/// through the debounced change listener) so the next read refetches.
#[derive(Debug)]
pub struct AvailabilityCache {
    ttl: Duration,
    inner: tokio::sync::Mutex<Option<Arc<AvailabilitySnapshot>>>,
}

impl AvailabilityCache {
    /// Creates a cache with the given time-to-live
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: tokio::sync::Mutex::new(None),
        }
    }

    /// Returns a fresh-enough snapshot, loading one if needed
    ///
    /// `force_refresh` bypasses the TTL check entirely.
    pub async fn snapshot(
        &self,
        pool: &PgPool,
        force_refresh: bool,
    ) -> Result<Arc<AvailabilitySnapshot>, sqlx::Error> {
        let mut guard = self.inner.lock().await;

        if !force_refresh {
            if let Some(cached) = guard.as_ref() {
                if cached.fetched_at.elapsed() < self.ttl {
                    debug!("Availability snapshot served from cache");
                    return Ok(Arc::clone(cached));
                }
            }
        }

        let snapshot = Arc::new(AvailabilitySnapshot::load(pool).await?);
        *guard = Some(Arc::clone(&snapshot));
        debug!(
            slots = snapshot.slots.len(),
            registrations = snapshot.registrations.len(),
            "Availability snapshot refreshed"
        );

        Ok(snapshot)
    }

    /// Drops the cached snapshot so the next read refetches
    pub async fn invalidate(&self) {
        let mut guard = self.inner.lock().await;
        *guard = None;
    }
}
