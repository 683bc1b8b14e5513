//! Draft/published capability shared by record types.
//!
//! # Responsibility
//! - Describe how a record exposes its `published_at` attribute.
//! - Derive publication state from that attribute and a clock.
//! - Provide in-memory mutators and persist-immediately helpers.
//!
//! # Invariants
//! - A record is published iff `published_at` is set and `<= now`.
//! - `is_draft` is exactly `!is_published` for the same clock reading.
//! - State is derived on every call and never stored as a flag, so a
//!   scheduled record becomes published without any write.

use crate::clock::Clock;
use crate::error::PublicationError;
use crate::query::ColumnRef;
use crate::repo::Persist;
use crate::timestamp::{PublishedAtInput, Timestamp, TimestampParseError};
use log::info;
use serde::{Deserialize, Serialize};

/// Column used when a record type does not override it.
pub const DEFAULT_PUBLISHED_AT_COLUMN: &str = "published_at";

/// How the publish column is referenced inside queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnQualification {
    /// Always emit `table.column`.
    #[default]
    Always,
    /// Emit `table.column` only when the query joins other tables.
    WhenJoined,
}

/// Per-record-type publication settings, fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicationConfig {
    pub table: &'static str,
    pub column: &'static str,
    pub qualification: ColumnQualification,
}

impl PublicationConfig {
    pub const fn new(table: &'static str) -> Self {
        Self {
            table,
            column: DEFAULT_PUBLISHED_AT_COLUMN,
            qualification: ColumnQualification::Always,
        }
    }

    pub const fn with_column(self, column: &'static str) -> Self {
        Self { column, ..self }
    }

    pub const fn with_qualification(self, qualification: ColumnQualification) -> Self {
        Self {
            qualification,
            ..self
        }
    }

    pub fn bare_column(&self) -> ColumnRef {
        ColumnRef::bare(self.column)
    }

    pub fn qualified_column(&self) -> ColumnRef {
        ColumnRef::qualified(self.table, self.column)
    }
}

/// Capability implemented by records that carry a publish timestamp.
///
/// Implementors only expose storage; every policy operation comes from the
/// blanket [`Draftable`] implementation.
pub trait HasPublicationState {
    const TABLE_NAME: &'static str;
    const PUBLISHED_AT_COLUMN: &'static str = DEFAULT_PUBLISHED_AT_COLUMN;
    const COLUMN_QUALIFICATION: ColumnQualification = ColumnQualification::Always;

    fn published_at(&self) -> Option<Timestamp>;
    fn published_at_mut(&mut self) -> &mut Option<Timestamp>;

    fn publication_config() -> PublicationConfig {
        PublicationConfig::new(Self::TABLE_NAME)
            .with_column(Self::PUBLISHED_AT_COLUMN)
            .with_qualification(Self::COLUMN_QUALIFICATION)
    }
}

/// Publication state derived from a timestamp and a clock reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PublicationState {
    /// No publish timestamp.
    Draft,
    /// Publish timestamp is in the future; still a draft.
    Scheduled { at: Timestamp },
    /// Publish timestamp is in the past or equal to now.
    Published { at: Timestamp },
}

impl PublicationState {
    pub fn at(published_at: Option<Timestamp>, now: Timestamp) -> Self {
        match published_at {
            None => Self::Draft,
            Some(at) if at <= now => Self::Published { at },
            Some(at) => Self::Scheduled { at },
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published { .. })
    }

    pub fn is_draft(&self) -> bool {
        !self.is_published()
    }
}

/// Publication policy operations available on every [`HasPublicationState`].
pub trait Draftable: HasPublicationState + Sized {
    fn publication_state(&self, clock: &dyn Clock) -> PublicationState {
        PublicationState::at(self.published_at(), clock.now())
    }

    fn is_published(&self, clock: &dyn Clock) -> bool {
        self.publication_state(clock).is_published()
    }

    fn is_draft(&self, clock: &dyn Clock) -> bool {
        !self.is_published(clock)
    }

    /// Assigns the publish timestamp in memory.
    ///
    /// # Errors
    /// - Returns `TimestampParseError` when text input cannot be parsed; the
    ///   attribute is left unchanged in that case.
    fn set_published_at<D>(
        &mut self,
        date: D,
        clock: &dyn Clock,
    ) -> Result<&mut Self, TimestampParseError>
    where
        D: Into<PublishedAtInput>,
    {
        let resolved = date.into().resolve(clock)?;
        *self.published_at_mut() = resolved;
        Ok(self)
    }

    /// In-memory publish toggle.
    ///
    /// `false` clears the timestamp. `true` stamps `now` only when the record
    /// is currently a draft, so an already-published timestamp is kept.
    fn set_published(&mut self, published: bool, clock: &dyn Clock) -> &mut Self {
        if !published {
            *self.published_at_mut() = None;
        } else if self.is_draft(clock) {
            *self.published_at_mut() = Some(clock.now());
        }
        self
    }

    /// Sets the publish timestamp and persists the record once.
    fn publish_at<D, P>(
        &mut self,
        date: D,
        store: &P,
        clock: &dyn Clock,
    ) -> Result<&mut Self, PublicationError>
    where
        D: Into<PublishedAtInput>,
        P: Persist<Self> + ?Sized,
    {
        self.set_published_at(date, clock)?;
        store.save(self)?;
        let state = self.publication_state(clock);
        info!(
            "event=record_publish_at module=policy status=ok table={} state={}",
            Self::TABLE_NAME,
            state_label(&state)
        );
        Ok(self)
    }

    /// Applies [`Draftable::set_published`] and persists the record once.
    fn publish<P>(
        &mut self,
        publish: bool,
        store: &P,
        clock: &dyn Clock,
    ) -> Result<&mut Self, PublicationError>
    where
        P: Persist<Self> + ?Sized,
    {
        self.set_published(publish, clock);
        store.save(self)?;
        info!(
            "event=record_publish module=policy status=ok table={} published={}",
            Self::TABLE_NAME,
            publish
        );
        Ok(self)
    }

    /// Clears the publish timestamp and persists the record once.
    fn draft<P>(&mut self, store: &P, clock: &dyn Clock) -> Result<&mut Self, PublicationError>
    where
        P: Persist<Self> + ?Sized,
    {
        self.publish(false, store, clock)
    }
}

impl<T: HasPublicationState> Draftable for T {}

fn state_label(state: &PublicationState) -> &'static str {
    match state {
        PublicationState::Draft => "draft",
        PublicationState::Scheduled { .. } => "scheduled",
        PublicationState::Published { .. } => "published",
    }
}
