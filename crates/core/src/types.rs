/// All primary keys are UUIDs, generated as v7 so they sort by creation time.
pub type Id = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Generate a new time-ordered id.
pub fn new_id() -> Id {
    uuid::Uuid::now_v7()
}
