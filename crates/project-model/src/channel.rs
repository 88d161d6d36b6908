//! Channel track buffers.
//!
//! Each channel owns its strips in declaration order. Records are only
//! ever appended, so the "left neighbor" of a strip is simply the
//! previous element of its channel.

use std::collections::BTreeMap;

use stripcut_common::clock::MediaKind;

use crate::strip::{StripId, StripRecord};

/// An ordered lane of strip records.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub id: i64,
    strips: Vec<StripRecord>,
}

impl Channel {
    pub fn new(id: i64) -> Self {
        Self { id, strips: vec![] }
    }

    pub fn push(&mut self, strip: StripRecord) {
        self.strips.push(strip);
    }

    pub fn strips(&self) -> &[StripRecord] {
        &self.strips
    }

    pub fn len(&self) -> usize {
        self.strips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strips.is_empty()
    }

    /// The strip immediately before `id` in this channel, or `None` if
    /// `id` is first or not on this channel.
    pub fn left_neighbor(&self, id: StripId) -> Option<&StripRecord> {
        let index = self.strips.iter().position(|s| s.id == id)?;
        index.checked_sub(1).map(|i| &self.strips[i])
    }

    /// Record the kind of the track this channel is being injected into.
    pub fn assign_kind(&mut self, kind: MediaKind) {
        for strip in &mut self.strips {
            strip.set_kind(kind);
        }
    }
}

/// All channels of one compilation, keyed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Channels {
    channels: BTreeMap<i64, Channel>,
}

impl Channels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to its channel, creating the channel on first use.
    pub fn assign(&mut self, strip: StripRecord) {
        self.channels
            .entry(strip.channel)
            .or_insert_with(|| Channel::new(strip.channel))
            .push(strip);
    }

    pub fn get(&self, id: i64) -> Option<&Channel> {
        self.channels.get(&id)
    }

    pub fn get_mut(&mut self, id: i64) -> Option<&mut Channel> {
        self.channels.get_mut(&id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.channels.contains_key(&id)
    }

    /// Channels in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    /// Every record across all channels, in declaration order.
    pub fn records(&self) -> Vec<&StripRecord> {
        let mut records: Vec<&StripRecord> =
            self.channels.values().flat_map(|c| c.strips()).collect();
        records.sort_by_key(|s| s.id);
        records
    }

    /// Total number of placed strips.
    pub fn strip_count(&self) -> usize {
        self.channels.values().map(Channel::len).sum()
    }
}
