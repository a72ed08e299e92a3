pub const KEY_VALUES_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS KeyValues (
        key            TEXT        PRIMARY KEY,
        value          TEXT        NOT NULL
    )";
