//! Pipeline request types.

use cascade_postgres::model::{NewPipeline, UpdatePipeline as UpdatePipelineModel};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Request payload for creating a new pipeline.
///
/// At least one of `docker_image_url` and `repository_ssh_url` must be set;
/// a pipeline with neither has nothing to execute.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_job_source"))]
pub struct CreatePipeline {
    /// Pipeline name (1-120 characters).
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    /// Description of the pipeline (max 500 characters).
    #[validate(length(max = 500))]
    #[serde(default)]
    pub description: String,
    /// Docker image to execute.
    #[validate(length(min = 1, max = 2000))]
    pub docker_image_url: Option<String>,
    /// Repository to build and execute.
    #[validate(length(min = 1, max = 2000))]
    pub repository_ssh_url: Option<String>,
    /// Branch to check out when building from a repository.
    #[validate(length(max = 200))]
    pub repository_branch: Option<String>,
}

impl CreatePipeline {
    /// Converts this request into a [`NewPipeline`] model for insertion.
    #[inline]
    pub fn into_model(self) -> NewPipeline {
        NewPipeline {
            name: self.name,
            description: self.description,
            docker_image_url: self.docker_image_url,
            repository_ssh_url: self.repository_ssh_url,
            repository_branch: self.repository_branch,
        }
    }
}

/// Request payload to update an existing pipeline.
///
/// The update overwrites every attribute, matching PUT semantics.
#[must_use]
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_job_source"))]
pub struct UpdatePipeline {
    /// New pipeline name (1-120 characters).
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    /// New description (max 500 characters).
    #[validate(length(max = 500))]
    #[serde(default)]
    pub description: String,
    /// New Docker image URL.
    #[validate(length(min = 1, max = 2000))]
    pub docker_image_url: Option<String>,
    /// New repository SSH URL.
    #[validate(length(min = 1, max = 2000))]
    pub repository_ssh_url: Option<String>,
    /// New repository branch.
    #[validate(length(max = 200))]
    pub repository_branch: Option<String>,
}

impl UpdatePipeline {
    /// Converts this request into an [`UpdatePipelineModel`].
    pub fn into_model(self) -> UpdatePipelineModel {
        UpdatePipelineModel {
            name: Some(self.name),
            description: Some(self.description),
            docker_image_url: Some(self.docker_image_url),
            repository_ssh_url: Some(self.repository_ssh_url),
            repository_branch: Some(self.repository_branch),
        }
    }
}

/// Schema-level check shared by create and update payloads.
fn validate_job_source<T: JobSource>(request: &T) -> Result<(), ValidationError> {
    let has_image = request
        .docker_image_url()
        .is_some_and(|url| !url.is_empty());
    let has_repository = request
        .repository_ssh_url()
        .is_some_and(|url| !url.is_empty());

    if has_image || has_repository {
        Ok(())
    } else {
        Err(ValidationError::new("job_source")
            .with_message("either dockerImageUrl or repositorySshUrl is required".into()))
    }
}

trait JobSource {
    fn docker_image_url(&self) -> Option<&str>;
    fn repository_ssh_url(&self) -> Option<&str>;
}

impl<T: JobSource + ?Sized> JobSource for &T {
    fn docker_image_url(&self) -> Option<&str> {
        (**self).docker_image_url()
    }

    fn repository_ssh_url(&self) -> Option<&str> {
        (**self).repository_ssh_url()
    }
}

impl JobSource for CreatePipeline {
    fn docker_image_url(&self) -> Option<&str> {
        self.docker_image_url.as_deref()
    }

    fn repository_ssh_url(&self) -> Option<&str> {
        self.repository_ssh_url.as_deref()
    }
}

impl JobSource for UpdatePipeline {
    fn docker_image_url(&self) -> Option<&str> {
        self.docker_image_url.as_deref()
    }

    fn repository_ssh_url(&self) -> Option<&str> {
        self.repository_ssh_url.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_only_pipeline_is_valid() {
        let request = CreatePipeline {
            name: "csv import".to_owned(),
            docker_image_url: Some("registry.example.com/import:1".to_owned()),
            ..Default::default()
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn repository_only_pipeline_is_valid() {
        let request = CreatePipeline {
            name: "nightly build".to_owned(),
            repository_ssh_url: Some("git@example.com:org/job.git".to_owned()),
            repository_branch: Some("main".to_owned()),
            ..Default::default()
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn pipeline_without_job_source_is_rejected() {
        let request = CreatePipeline {
            name: "empty".to_owned(),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn empty_name_is_rejected() {
        let request = CreatePipeline {
            name: String::new(),
            docker_image_url: Some("registry.example.com/import:1".to_owned()),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }
}
