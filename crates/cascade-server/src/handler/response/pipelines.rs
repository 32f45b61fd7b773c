//! Pipeline response types.

use cascade_postgres::model;
use jiff::Timestamp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public view of a pipeline template.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    /// Pipeline identifier.
    pub uuid: Uuid,
    /// Pipeline name.
    pub name: String,
    /// Pipeline description.
    pub description: String,
    /// Docker image to execute.
    pub docker_image_url: Option<String>,
    /// Repository to build and execute.
    pub repository_ssh_url: Option<String>,
    /// Branch to check out when building from a repository.
    pub repository_branch: Option<String>,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Last update timestamp.
    pub updated_at: Timestamp,
}

impl Pipeline {
    /// Builds the response from the database model.
    pub fn from_model(pipeline: model::Pipeline) -> Self {
        Self {
            uuid: pipeline.id,
            name: pipeline.name,
            description: pipeline.description,
            docker_image_url: pipeline.docker_image_url,
            repository_ssh_url: pipeline.repository_ssh_url,
            repository_branch: pipeline.repository_branch,
            created_at: pipeline.created_at.into(),
            updated_at: pipeline.updated_at.into(),
        }
    }
}
