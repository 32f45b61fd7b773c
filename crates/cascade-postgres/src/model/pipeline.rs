//! Pipeline template model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::pipelines;

/// A pipeline template describing how to run a containerised job.
///
/// A pipeline points at either a prebuilt Docker image or a git repository
/// (with an optional branch) that the executor builds before running.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = pipelines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Pipeline {
    /// Unique pipeline identifier.
    pub id: Uuid,
    /// Human-readable pipeline name.
    pub name: String,
    /// Description of what the pipeline does.
    pub description: String,
    /// URL of the Docker image to execute.
    pub docker_image_url: Option<String>,
    /// SSH URL of the repository to build and execute.
    pub repository_ssh_url: Option<String>,
    /// Branch to check out when building from a repository.
    pub repository_branch: Option<String>,
    /// Timestamp when the pipeline was created.
    pub created_at: Timestamp,
    /// Timestamp when the pipeline was last updated.
    pub updated_at: Timestamp,
    /// Timestamp when the pipeline was soft-deleted.
    pub deleted_at: Option<Timestamp>,
}

/// Data for creating a new pipeline.
#[derive(Debug, Default, Clone, Insertable)]
#[diesel(table_name = pipelines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPipeline {
    /// Pipeline name.
    pub name: String,
    /// Pipeline description.
    pub description: String,
    /// Docker image URL.
    pub docker_image_url: Option<String>,
    /// Repository SSH URL.
    pub repository_ssh_url: Option<String>,
    /// Repository branch.
    pub repository_branch: Option<String>,
}

/// Data for updating a pipeline.
#[derive(Debug, Default, Clone, AsChangeset)]
#[diesel(table_name = pipelines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdatePipeline {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New Docker image URL (double-optional to allow clearing).
    pub docker_image_url: Option<Option<String>>,
    /// New repository SSH URL.
    pub repository_ssh_url: Option<Option<String>>,
    /// New repository branch.
    pub repository_branch: Option<Option<String>>,
}

impl Pipeline {
    /// Returns whether the pipeline is soft-deleted.
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns whether the pipeline runs from a prebuilt Docker image.
    pub fn has_docker_image(&self) -> bool {
        self.docker_image_url
            .as_deref()
            .is_some_and(|url| !url.is_empty())
    }

    /// Returns whether the pipeline builds from a git repository.
    pub fn has_repository(&self) -> bool {
        self.repository_ssh_url
            .as_deref()
            .is_some_and(|url| !url.is_empty())
    }
}
