use std::collections::HashSet;

use diesel::prelude::*;
use lombok::AllArgsConstructor;
use tracing::{debug, trace_span};

use crate::database::models::user::User;
use crate::database::schema::{follows, users};
use crate::error::{AppError, AppResult};

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::database::schema::follows)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Follow {
    pub id: i32,
    pub user_id: i32,
    pub author_id: i32,
}

#[derive(Insertable, AllArgsConstructor, Debug)]
#[diesel(table_name = crate::database::schema::follows)]
pub struct NewFollow {
    pub user_id: i32,
    pub author_id: i32,
}

impl Follow {
    pub fn subscribe(
        connection: &mut SqliteConnection,
        user_id: i32,
        author_id: i32,
    ) -> AppResult<User> {
        let span = trace_span!("subscribing", user_id, author_id);
        let _guard = span.enter();

        if user_id == author_id {
            return Err(AppError::SelfReferenceRejected);
        }

        let author = User::find(connection, author_id)?;

        diesel::insert_into(follows::table)
            .values(NewFollow::new(user_id, author_id))
            .execute(connection)
            .map_err(|e| match AppError::from(e) {
                AppError::DuplicateRelation(_) => AppError::DuplicateRelation(
                    "You are already subscribed to this user".to_owned(),
                ),
                other => other,
            })?;

        debug!("User {user_id} subscribed to {author_id}");
        Ok(author)
    }

    pub fn unsubscribe(
        connection: &mut SqliteConnection,
        user_id: i32,
        author_id: i32,
    ) -> AppResult<()> {
        User::find(connection, author_id)?;

        let deleted = diesel::delete(
            follows::table
                .filter(follows::user_id.eq(user_id))
                .filter(follows::author_id.eq(author_id)),
        )
        .execute(connection)?;

        if deleted == 0 {
            return Err(AppError::MissingRelation(
                "You are not subscribed to this user".to_owned(),
            ));
        }

        Ok(())
    }

    /// The subset of `author_ids` that `user_id` follows.
    pub fn followed_among(
        connection: &mut SqliteConnection,
        user_id: i32,
        author_ids: &[i32],
    ) -> AppResult<HashSet<i32>> {
        let ids: Vec<i32> = follows::table
            .filter(follows::user_id.eq(user_id))
            .filter(follows::author_id.eq_any(author_ids))
            .select(follows::author_id)
            .load(connection)?;

        Ok(ids.into_iter().collect())
    }

    pub fn authors_page(
        connection: &mut SqliteConnection,
        user_id: i32,
        limit: i64,
        offset: i64,
    ) -> AppResult<(i64, Vec<User>)> {
        let followed = || {
            follows::table
                .filter(follows::user_id.eq(user_id))
                .select(follows::author_id)
        };

        let count = users::table
            .filter(users::id.eq_any(followed()))
            .count()
            .get_result(connection)?;
        let authors = users::table
            .filter(users::id.eq_any(followed()))
            .order(users::id.asc())
            .limit(limit)
            .offset(offset)
            .select(User::as_select())
            .load(connection)?;

        Ok((count, authors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::test_pool;
    use crate::test_support::user;

    fn follow_rows(connection: &mut SqliteConnection) -> i64 {
        follows::table.count().get_result(connection).unwrap()
    }

    #[test]
    fn self_follow_is_rejected() {
        let pool = test_pool();
        let mut connection = pool.get().unwrap();
        let anna = user(&mut connection, "anna");

        let error = Follow::subscribe(&mut connection, anna.id, anna.id).unwrap_err();

        assert!(matches!(error, AppError::SelfReferenceRejected));
        assert_eq!(follow_rows(&mut connection), 0);
    }

    #[test]
    fn second_subscribe_is_a_duplicate() {
        let pool = test_pool();
        let mut connection = pool.get().unwrap();
        let anna = user(&mut connection, "anna");
        let boris = user(&mut connection, "boris");

        let author = Follow::subscribe(&mut connection, boris.id, anna.id).unwrap();
        let error = Follow::subscribe(&mut connection, boris.id, anna.id).unwrap_err();

        assert_eq!(author, anna);
        assert!(matches!(error, AppError::DuplicateRelation(_)));
        assert_eq!(follow_rows(&mut connection), 1);
    }

    #[test]
    fn unsubscribe_without_follow_is_missing() {
        let pool = test_pool();
        let mut connection = pool.get().unwrap();
        let anna = user(&mut connection, "anna");
        let boris = user(&mut connection, "boris");

        let missing = Follow::unsubscribe(&mut connection, boris.id, anna.id).unwrap_err();
        let unknown = Follow::unsubscribe(&mut connection, boris.id, 9999).unwrap_err();

        assert!(matches!(missing, AppError::MissingRelation(_)));
        assert!(matches!(unknown, AppError::NotFound(_)));
    }

    #[test]
    fn followed_authors_are_paged_and_reported() {
        let pool = test_pool();
        let mut connection = pool.get().unwrap();
        let anna = user(&mut connection, "anna");
        let boris = user(&mut connection, "boris");
        let clara = user(&mut connection, "clara");
        Follow::subscribe(&mut connection, anna.id, boris.id).unwrap();
        Follow::subscribe(&mut connection, anna.id, clara.id).unwrap();
        Follow::unsubscribe(&mut connection, anna.id, clara.id).unwrap();

        let (count, authors) = Follow::authors_page(&mut connection, anna.id, 10, 0).unwrap();
        let followed =
            Follow::followed_among(&mut connection, anna.id, &[boris.id, clara.id]).unwrap();

        assert_eq!(count, 1);
        assert_eq!(authors, vec![boris.clone()]);
        assert_eq!(followed, HashSet::from([boris.id]));
    }
}
