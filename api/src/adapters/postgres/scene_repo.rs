//! PostgreSQL adapter for SceneRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};

use crate::domain::entities::{Image, Scene, SceneId, SceneStatus, Story, StoryId};
use crate::domain::ports::SceneRepository;
use crate::entity::{scenes, stories};
use crate::error::DomainError;

/// PostgreSQL implementation of SceneRepository
pub struct PostgresSceneRepository {
    db: DatabaseConnection,
}

impl PostgresSceneRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn storage(e: DbErr) -> DomainError {
    DomainError::Storage(e.to_string())
}

fn images_to_json(images: &[Image]) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(images).map_err(|e| DomainError::Storage(e.to_string()))
}

fn selected_to_json(image: Option<&Image>) -> Result<Option<serde_json::Value>, DomainError> {
    image
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| DomainError::Storage(e.to_string()))
}

#[async_trait]
impl SceneRepository for PostgresSceneRepository {
    async fn find_by_id(&self, id: &SceneId) -> Result<Option<Scene>, DomainError> {
        let result = scenes::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(storage)?;

        result.map(Scene::try_from).transpose()
    }

    async fn find_by_story(&self, story_id: &StoryId) -> Result<Vec<Scene>, DomainError> {
        let results = scenes::Entity::find()
            .filter(scenes::Column::StoryId.eq(story_id.0))
            .order_by_asc(scenes::Column::Position)
            .all(&self.db)
            .await
            .map_err(storage)?;

        results.into_iter().map(Scene::try_from).collect()
    }

    async fn create(&self, scene: &Scene) -> Result<Scene, DomainError> {
        let txn = self.db.begin().await.map_err(storage)?;

        // Lock the parent row so concurrent inserts for one story take turns
        // computing the next position, and completion cannot slip in between
        let story = stories::Entity::find_by_id(scene.story_id.0)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(storage)?
            .ok_or_else(|| DomainError::NotFound(format!("Story {} not found", scene.story_id)))?;
        let story = Story::try_from(story)?;
        if !story.accepts_scenes() {
            return Err(DomainError::InvalidState(format!(
                "Story {} is {}; scenes can only be added to draft or in_progress stories",
                story.id, story.status
            )));
        }

        let position = scenes::Entity::find()
            .filter(scenes::Column::StoryId.eq(scene.story_id.0))
            .count(&txn)
            .await
            .map_err(storage)?;

        let model = scenes::ActiveModel {
            id: Set(scene.id.0),
            story_id: Set(scene.story_id.0),
            position: Set(position as i32),
            description: Set(scene.description.clone()),
            style: Set(scene.style.clone()),
            candidate_count: Set(scene.candidate_count as i32),
            status: Set(scene.status.to_string()),
            candidates: Set(images_to_json(&scene.candidates)?),
            selected_image: Set(selected_to_json(scene.selected_image.as_ref())?),
            failure_reason: Set(scene.failure_reason.clone()),
            version: Set(scene.version),
            created_at: Set(scene.created_at.fixed_offset()),
            updated_at: Set(scene.updated_at.fixed_offset()),
        };

        let result = model.insert(&txn).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => DomainError::Conflict(msg),
            _ => storage(e),
        })?;

        txn.commit().await.map_err(storage)?;

        Scene::try_from(result)
    }

    async fn update(&self, scene: &Scene, expected_version: i64) -> Result<Scene, DomainError> {
        let next_version = expected_version + 1;

        let result = scenes::Entity::update_many()
            .set(scenes::ActiveModel {
                status: Set(scene.status.to_string()),
                candidates: Set(images_to_json(&scene.candidates)?),
                selected_image: Set(selected_to_json(scene.selected_image.as_ref())?),
                failure_reason: Set(scene.failure_reason.clone()),
                version: Set(next_version),
                updated_at: Set(scene.updated_at.fixed_offset()),
                ..Default::default()
            })
            .filter(scenes::Column::Id.eq(scene.id.0))
            .filter(scenes::Column::Version.eq(expected_version))
            .exec(&self.db)
            .await
            .map_err(storage)?;

        if result.rows_affected == 0 {
            return match self.find_by_id(&scene.id).await? {
                Some(_) => Err(DomainError::Conflict(format!(
                    "Scene {} was modified concurrently",
                    scene.id
                ))),
                None => Err(DomainError::NotFound(format!(
                    "Scene {} not found",
                    scene.id
                ))),
            };
        }

        Ok(Scene {
            version: next_version,
            ..scene.clone()
        })
    }
}

/// Convert SeaORM model to domain entity
impl TryFrom<scenes::Model> for Scene {
    type Error = DomainError;

    fn try_from(model: scenes::Model) -> Result<Self, Self::Error> {
        let corrupt = |what: &str, e: String| {
            DomainError::Storage(format!("scene {} has invalid {}: {}", model.id, what, e))
        };

        let status = model
            .status
            .parse::<SceneStatus>()
            .map_err(|e: String| corrupt("status", e))?;
        let candidates: Vec<Image> = serde_json::from_value(model.candidates.clone())
            .map_err(|e| corrupt("candidates", e.to_string()))?;
        let selected_image: Option<Image> = model
            .selected_image
            .clone()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| corrupt("selected_image", e.to_string()))?;
        let candidate_count = u32::try_from(model.candidate_count)
            .map_err(|e| corrupt("candidate_count", e.to_string()))?;

        Ok(Scene {
            id: SceneId(model.id),
            story_id: StoryId(model.story_id),
            position: model.position,
            description: model.description,
            style: model.style,
            candidate_count,
            status,
            candidates,
            selected_image,
            failure_reason: model.failure_reason,
            version: model.version,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}
