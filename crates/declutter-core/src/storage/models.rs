/// One row of the hash store: everything the engine knows about a file the
/// last time it was fully hashed.
#[derive(Debug, Clone)]
pub struct HashEntry {
    pub file_path: String,
    pub quick_hash: Option<String>,
    pub secure_hash: Option<String>,
    pub file_size: i64,
    pub last_modified: i64,
    pub duplicate_group_id: Option<String>,
    pub safety_score: Option<f64>,
    pub can_delete: bool,
}
