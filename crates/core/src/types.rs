/// Numeric surrogate ordering key (`idioms.num_id`, BIGSERIAL).
pub type DbId = i64;

/// Slug identifier shared by idioms and queued idiom inputs.
pub type IdiomId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
