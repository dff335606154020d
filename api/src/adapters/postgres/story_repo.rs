//! PostgreSQL adapter for StoryRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::domain::entities::{Story, StoryId, StoryStatus};
use crate::domain::ports::StoryRepository;
use crate::entity::{scenes, stories};
use crate::error::DomainError;

/// PostgreSQL implementation of StoryRepository
pub struct PostgresStoryRepository {
    db: DatabaseConnection,
}

impl PostgresStoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StoryRepository for PostgresStoryRepository {
    async fn find_by_id(&self, id: &StoryId) -> Result<Option<Story>, DomainError> {
        let result = stories::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        result.map(Story::try_from).transpose()
    }

    async fn list(&self, status: Option<StoryStatus>) -> Result<Vec<Story>, DomainError> {
        let mut query = stories::Entity::find();
        if let Some(status) = status {
            query = query.filter(stories::Column::Status.eq(status.to_string()));
        }

        let results = query
            .order_by_asc(stories::Column::CreatedAt)
            .order_by_asc(stories::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        results.into_iter().map(Story::try_from).collect()
    }

    async fn create(&self, story: &Story) -> Result<Story, DomainError> {
        let model = stories::ActiveModel {
            id: Set(story.id.0),
            name: Set(story.name.clone()),
            mood: Set(story.mood.clone()),
            category: Set(story.category.clone()),
            description: Set(story.description.clone()),
            customer_id: Set(story.customer_id.clone()),
            status: Set(story.status.to_string()),
            created_at: Set(story.created_at.fixed_offset()),
            updated_at: Set(story.updated_at.fixed_offset()),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        Story::try_from(result)
    }

    async fn transition_status(
        &self,
        id: &StoryId,
        from: StoryStatus,
        to: StoryStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        // Compare-and-set on the status column; a concurrent writer makes this a no-op
        let result = stories::Entity::update_many()
            .set(stories::ActiveModel {
                status: Set(to.to_string()),
                updated_at: Set(at.fixed_offset()),
                ..Default::default()
            })
            .filter(stories::Column::Id.eq(id.0))
            .filter(stories::Column::Status.eq(from.to_string()))
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    async fn complete(&self, id: &StoryId, at: DateTime<Utc>) -> Result<bool, DomainError> {
        let storage = |e: DbErr| DomainError::Storage(e.to_string());
        let txn = self.db.begin().await.map_err(storage)?;

        // Scene inserts take the same row lock, so no scene can appear between
        // the checks below and the status write
        let locked = stories::Entity::find_by_id(id.0)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(storage)?;
        match locked {
            Some(story) if story.status == StoryStatus::InProgress.to_string() => {}
            _ => return Ok(false),
        }

        let total = scenes::Entity::find()
            .filter(scenes::Column::StoryId.eq(id.0))
            .count(&txn)
            .await
            .map_err(storage)?;
        let unresolved = scenes::Entity::find()
            .filter(scenes::Column::StoryId.eq(id.0))
            .filter(scenes::Column::SelectedImage.is_null())
            .count(&txn)
            .await
            .map_err(storage)?;
        if total == 0 || unresolved > 0 {
            return Ok(false);
        }

        stories::ActiveModel {
            id: Set(id.0),
            status: Set(StoryStatus::Completed.to_string()),
            updated_at: Set(at.fixed_offset()),
            ..Default::default()
        }
        .update(&txn)
        .await
        .map_err(storage)?;

        txn.commit().await.map_err(storage)?;
        Ok(true)
    }
}

/// Convert SeaORM model to domain entity
impl TryFrom<stories::Model> for Story {
    type Error = DomainError;

    fn try_from(model: stories::Model) -> Result<Self, Self::Error> {
        let status = model
            .status
            .parse::<StoryStatus>()
            .map_err(|e: String| DomainError::Storage(format!("story {}: {}", model.id, e)))?;

        Ok(Story {
            id: StoryId(model.id),
            name: model.name,
            mood: model.mood,
            category: model.category,
            description: model.description,
            customer_id: model.customer_id,
            status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}
