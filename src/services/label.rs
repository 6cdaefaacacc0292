use tracing::instrument;

use crate::{
    errors::ApiError,
    models::label::{LabelPayload, LabelView},
    store::LabelRepository,
};

/// Read, rename and delete for one label kind. Creation only happens through
/// nested recipe payloads.
#[derive(Clone, Debug)]
pub struct LabelService {
    repo: LabelRepository,
}

impl LabelService {
    pub fn new(repo: LabelRepository) -> Self {
        Self { repo }
    }

    #[instrument(name = "Service: List labels", skip(self), fields(kind = self.repo.kind().as_str()))]
    pub async fn list(&self, user_id: i64, assigned_only: bool) -> Result<Vec<LabelView>, ApiError> {
        let labels = self.repo.list(user_id, assigned_only).await?;
        Ok(labels.iter().map(LabelView::from).collect())
    }

    pub async fn detail(&self, user_id: i64, id: i64) -> Result<LabelView, ApiError> {
        let mut conn = self.repo.acquire().await?;
        self.repo
            .find(&mut conn, user_id, id)
            .await?
            .map(|label| LabelView::from(&label))
            .ok_or(ApiError::NotFound)
    }

    /// Renames an owned label. Ownership is settled before `payload` is
    /// validated, and both happen on the renaming transaction.
    #[instrument(name = "Service: Rename label", skip(self, payload), fields(kind = self.repo.kind().as_str()))]
    pub async fn rename(
        &self,
        user_id: i64,
        id: i64,
        payload: LabelPayload,
    ) -> Result<LabelView, ApiError> {
        let mut tx = self.repo.begin().await?;
        let current = self
            .repo
            .find(&mut tx, user_id, id)
            .await?
            .ok_or(ApiError::NotFound)?;
        let name = payload.validate()?;
        if current.name == name {
            return Ok(LabelView::from(&current));
        }

        let renamed = self.repo.rename(&mut tx, user_id, id, &name).await?;
        tx.commit().await?;
        match renamed {
            Some(renamed) => Ok(LabelView::from(&renamed)),
            None => Err(ApiError::invalid(
                "name",
                format!("A {} with this name already exists.", self.repo.kind().as_str()),
            )),
        }
    }

    #[instrument(name = "Service: Delete label", skip(self), fields(kind = self.repo.kind().as_str()))]
    pub async fn delete(&self, user_id: i64, id: i64) -> Result<(), ApiError> {
        if self.repo.delete(user_id, id).await? {
            Ok(())
        } else {
            Err(ApiError::NotFound)
        }
    }
}
