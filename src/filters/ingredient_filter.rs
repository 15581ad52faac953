use diesel::prelude::*;
use tracing::trace_span;

use crate::database::functions::fold_case;
use crate::database::models::ingredient::Ingredient;
use crate::database::schema::ingredients;
use crate::error::AppResult;
use crate::filters::query_params::QueryParams;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngredientFilter {
    pub name: Option<String>,
}

/// `%`, `_` and the escape character itself are literal in a search term.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl IngredientFilter {
    pub fn from_params(params: &QueryParams) -> Self {
        Self {
            name: params
                .get("name")
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_owned),
        }
    }

    /// Case-insensitive substring search. Names starting with the term come
    /// first, then name, then id.
    pub fn load(&self, connection: &mut SqliteConnection) -> AppResult<Vec<Ingredient>> {
        let span = trace_span!("searching ingredients", name = ?self.name);
        let _guard = span.enter();

        let Some(name) = &self.name else {
            return Ok(ingredients::table
                .order((ingredients::name.asc(), ingredients::id.asc()))
                .select(Ingredient::as_select())
                .load(connection)?);
        };

        let needle = escape_like(&name.to_lowercase());
        let starts_with = fold_case(ingredients::name)
            .like(format!("{needle}%"))
            .escape('\\');

        let found = ingredients::table
            .filter(
                fold_case(ingredients::name)
                    .like(format!("%{needle}%"))
                    .escape('\\'),
            )
            .order((
                starts_with.desc(),
                ingredients::name.asc(),
                ingredients::id.asc(),
            ))
            .select(Ingredient::as_select())
            .load(connection)?;

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::test_pool;
    use crate::test_support::ingredient;

    fn names(connection: &mut SqliteConnection, term: &str) -> Vec<String> {
        let filter = IngredientFilter::from_params(&[("name", term)].into_iter().collect());
        filter
            .load(connection)
            .unwrap()
            .into_iter()
            .map(|ingredient| ingredient.name)
            .collect()
    }

    #[test]
    fn prefix_matches_rank_first_regardless_of_case() {
        let pool = test_pool();
        let mut connection = pool.get().unwrap();
        ingredient(&mut connection, "Сгущенное молоко", "г");
        ingredient(&mut connection, "Молоко", "мл");
        ingredient(&mut connection, "Мука", "г");

        assert_eq!(
            names(&mut connection, "мол"),
            vec!["Молоко", "Сгущенное молоко"]
        );
    }

    #[test]
    fn ties_are_ordered_by_name() {
        let pool = test_pool();
        let mut connection = pool.get().unwrap();
        ingredient(&mut connection, "Sugar syrup", "ml");
        ingredient(&mut connection, "Brown sugar", "g");
        ingredient(&mut connection, "Sugar", "g");
        ingredient(&mut connection, "Icing sugar", "g");

        assert_eq!(
            names(&mut connection, "SUGAR"),
            vec!["Sugar", "Sugar syrup", "Brown sugar", "Icing sugar"]
        );
    }

    #[test]
    fn wildcards_in_the_term_are_literal() {
        let pool = test_pool();
        let mut connection = pool.get().unwrap();
        ingredient(&mut connection, "Cocoa 100%", "g");
        ingredient(&mut connection, "Cocoa powder", "g");

        assert_eq!(names(&mut connection, "0%"), vec!["Cocoa 100%"]);
        assert!(names(&mut connection, "_").is_empty());
    }

    #[test]
    fn blank_name_lists_everything() {
        let pool = test_pool();
        let mut connection = pool.get().unwrap();
        ingredient(&mut connection, "Salt", "g");
        ingredient(&mut connection, "Butter", "g");

        assert_eq!(names(&mut connection, "  "), vec!["Butter", "Salt"]);
    }
}
