#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct Revenue {
    pub id: String,
    pub month: String,
    /// Whole dollars
    pub revenue: i32,
}
