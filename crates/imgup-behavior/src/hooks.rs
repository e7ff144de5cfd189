//! Record lifecycle hooks

use async_trait::async_trait;
use imgup_core::{UploadRecord, UploadResult, UploadSource};
use serde::{Deserialize, Serialize};

use crate::behavior::ImageUploadBehavior;
use crate::thumbnail::Thumbnailer;

/// Record events the behavior subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordEvent {
    BeforeValidate,
    BeforeInsert,
    BeforeUpdate,
}

impl RecordEvent {
    pub const ALL: [RecordEvent; 3] = [
        RecordEvent::BeforeValidate,
        RecordEvent::BeforeInsert,
        RecordEvent::BeforeUpdate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordEvent::BeforeValidate => "before_validate",
            RecordEvent::BeforeInsert => "before_insert",
            RecordEvent::BeforeUpdate => "before_update",
        }
    }
}

/// Hooks a host calls around validation and persistence
///
/// Each hook returns whether the host should carry on.
#[async_trait]
pub trait LifecycleHooks<R: UploadRecord>: Send + Sync {
    async fn before_validate(
        &self,
        record: &mut R,
        source: &(dyn UploadSource + Sync),
    ) -> UploadResult<bool>;

    async fn before_insert(&self, record: &mut R) -> UploadResult<bool>;

    async fn before_update(&self, record: &mut R) -> UploadResult<bool>;

    /// Route an event to its hook
    async fn dispatch(
        &self,
        event: RecordEvent,
        record: &mut R,
        source: &(dyn UploadSource + Sync),
    ) -> UploadResult<bool> {
        match event {
            RecordEvent::BeforeValidate => self.before_validate(record, source).await,
            RecordEvent::BeforeInsert => self.before_insert(record).await,
            RecordEvent::BeforeUpdate => self.before_update(record).await,
        }
    }
}

#[async_trait]
impl<R, T> LifecycleHooks<R> for ImageUploadBehavior<R, T>
where
    R: UploadRecord + 'static,
    T: Thumbnailer + 'static,
{
    async fn before_validate(
        &self,
        record: &mut R,
        source: &(dyn UploadSource + Sync),
    ) -> UploadResult<bool> {
        self.bind(record, source);
        Ok(self.validate(record))
    }

    async fn before_insert(&self, record: &mut R) -> UploadResult<bool> {
        self.process(record).await
    }

    async fn before_update(&self, record: &mut R) -> UploadResult<bool> {
        self.process(record).await
    }
}
