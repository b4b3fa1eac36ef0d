use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Directory entry referenced by attendance rows through `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1000,
        "employee_code": "EMP-001",
        "full_name": "John Doe",
        "photo_url": "https://cdn.example.com/staff/emp-001.jpg"
    })
)]
pub struct Employee {
    #[schema(example = 1000)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "John Doe")]
    pub full_name: String,

    #[schema(nullable = true)]
    pub photo_url: Option<String>,
}
