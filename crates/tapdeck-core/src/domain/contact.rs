//! Per-pointer contact bookkeeping.
//!
//! The [`ContactTracker`] remembers the last committed position of every
//! active pointer.  Positions are committed on every observation, before any
//! palm or ownership decision is made, so a contact that is briefly
//! classified as a palm never produces a large catch-up delta once it is
//! classified as a finger again.

use std::collections::HashMap;
use std::fmt;

use super::layout::Point;

/// Default palm-rejection threshold in reported contact-size units.
///
/// An adult fingertip reports well below this value on tablet-class
/// hardware; a resting palm exceeds it.
pub const DEFAULT_PALM_THRESHOLD: f32 = 200.0;

/// Opaque pointer identifier, stable from touch-down to lift or cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(pub i64);

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One active touch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub id: PointerId,
    pub last_position: Point,
    pub contact_size: f32,
}

/// Tracks the last known state of every active pointer.
#[derive(Debug, Clone)]
pub struct ContactTracker {
    contacts: HashMap<PointerId, Contact>,
    palm_threshold: f32,
}

impl ContactTracker {
    pub fn new(palm_threshold: f32) -> Self {
        Self {
            contacts: HashMap::new(),
            palm_threshold,
        }
    }

    /// Returns `true` if a contact of `size` should be treated as a resting palm.
    ///
    /// A `NaN` size is never trusted as a finger.
    pub fn is_palm(&self, size: f32) -> bool {
        size.is_nan() || size > self.palm_threshold
    }

    pub fn palm_threshold(&self) -> f32 {
        self.palm_threshold
    }

    /// Records a new contact.
    ///
    /// Returns the previously committed position if the id was already being
    /// tracked (a missed end event); the entry is overwritten either way.
    pub fn on_begin(&mut self, id: PointerId, position: Point, size: f32) -> Option<Point> {
        self.commit(id, position, size)
    }

    /// Records a move and returns the position committed before this update.
    ///
    /// An id that was never begun is inserted as a fresh contact and `None`
    /// is returned.
    pub fn on_move(&mut self, id: PointerId, position: Point, size: f32) -> Option<Point> {
        self.commit(id, position, size)
    }

    /// Forgets a contact, returning its final state if it was tracked.
    pub fn on_end(&mut self, id: PointerId) -> Option<Contact> {
        self.contacts.remove(&id)
    }

    pub fn last_position(&self, id: PointerId) -> Option<Point> {
        self.contacts.get(&id).map(|c| c.last_position)
    }

    pub fn get(&self, id: PointerId) -> Option<&Contact> {
        self.contacts.get(&id)
    }

    pub fn contains(&self, id: PointerId) -> bool {
        self.contacts.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Iterates over active contacts in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.values()
    }

    pub fn clear(&mut self) {
        self.contacts.clear();
    }

    fn commit(&mut self, id: PointerId, position: Point, size: f32) -> Option<Point> {
        let previous = self.contacts.insert(
            id,
            Contact {
                id,
                last_position: position,
                contact_size: size,
            },
        );
        previous.map(|c| c.last_position)
    }
}

impl Default for ContactTracker {
    fn default() -> Self {
        Self::new(DEFAULT_PALM_THRESHOLD)
    }
}
