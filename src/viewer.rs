use crate::database::models::{recipe::Recipe, user::User};
use crate::error::{AppError, AppResult};

/// Who is asking. Produced by the request layer, consumed by the filters
/// and annotations, which never authenticate anything themselves.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Viewer {
    #[default]
    Anonymous,
    User(User),
}

impl Viewer {
    pub fn user_id(&self) -> Option<i32> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(user) => Some(user.id),
        }
    }

    pub fn require_user(&self) -> AppResult<&User> {
        match self {
            Viewer::Anonymous => Err(AppError::Unauthorized),
            Viewer::User(user) => Ok(user),
        }
    }

    pub fn ensure_can_edit(&self, recipe: &Recipe) -> AppResult<()> {
        let user = self.require_user()?;
        if user.is_staff || user.id == recipe.author_id {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}
