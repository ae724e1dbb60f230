// Machine domain model
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Machine {
    pub id: i64,
    pub name: String,
    pub status: String,
}

impl Machine {
    pub fn new(id: i64, name: String, status: String) -> Self {
        Self { id, name, status }
    }
}
