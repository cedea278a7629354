use serde::Serialize;

/// Standard JSON envelope for successful responses: `{ "data": ... }`.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}
