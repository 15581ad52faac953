use diesel::define_sql_function;
use diesel::sql_types::Text;

// Unicode aware lowercase. SQLite's builtin `lower` only folds ASCII, which
// breaks case-insensitive search over cyrillic ingredient names.
define_sql_function!(fn fold_case(value: Text) -> Text);
