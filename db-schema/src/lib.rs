// Every submitted form lives in one table, bucketed by `collection`.
// `createdat` is filled by the database default, never by the writer.
diesel::table! {
    use diesel::sql_types::*;

    records (id) {
        id -> Int8,
        #[max_length = 64]
        collection -> Varchar,
        document -> Jsonb,
        #[max_length = 64]
        timestampfield -> Varchar,
        createdat -> Timestamp,
    }
}
