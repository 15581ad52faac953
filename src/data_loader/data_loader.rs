use diesel::{Connection, SqliteConnection};
use serde::Deserialize;
use tracing::{info, trace_span};

use crate::database::models::{
    auth_token::AuthToken,
    ingredient::NewIngredient,
    tag::NewTag,
    user::NewUser,
};
use crate::error::{AppError, AppResult};

/// Reference data a fresh database is seeded with.
#[derive(Deserialize, Debug, Default)]
pub struct Fixture {
    #[serde(default)]
    pub ingredients: Vec<NewIngredient>,
    #[serde(default)]
    pub tags: Vec<NewTag>,
    #[serde(default)]
    pub users: Vec<FixtureUser>,
}

#[derive(Deserialize, Debug)]
pub struct FixtureUser {
    #[serde(flatten)]
    pub user: NewUser,
    pub token: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub ingredients: usize,
    pub tags: usize,
    pub users: usize,
    pub tokens: usize,
}

pub trait DataLoader {
    fn load_fixture(&self) -> AppResult<Fixture>;
}

/// Writes the whole fixture or nothing.
pub fn import(connection: &mut SqliteConnection, fixture: &Fixture) -> AppResult<ImportSummary> {
    let span = trace_span!("importing fixture");
    let _guard = span.enter();

    let summary = connection.transaction::<_, AppError, _>(|connection| {
        let mut summary = ImportSummary {
            ingredients: NewIngredient::insert_all(connection, &fixture.ingredients)?,
            ..ImportSummary::default()
        };

        for tag in &fixture.tags {
            tag.insert(connection)?;
            summary.tags += 1;
        }

        for entry in &fixture.users {
            let user = entry.user.insert(connection)?;
            summary.users += 1;

            if let Some(token) = &entry.token {
                AuthToken::new(token.clone(), user.id).insert(connection)?;
                summary.tokens += 1;
            }
        }

        Ok(summary)
    })?;

    info!(
        "Imported {} ingredients, {} tags, {} users and {} tokens",
        summary.ingredients, summary.tags, summary.users, summary.tokens
    );
    Ok(summary)
}
