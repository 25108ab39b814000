use sqlx::PgPool;

/// Executes database query structs through `kanau::processor::Processor`.
#[derive(Debug, Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}
