use async_trait::async_trait;

use crate::error::Result;
use crate::traits::Cursor;
use crate::types::ParameterSlot;

/// Trait for database driver implementations.
/// Drivers are responsible for:
/// - Connecting to the database
/// - Converting bound parameter slots to native types
/// - Executing statements and exposing the results as a [`Cursor`]
/// - Writing values of output parameters back into their slots
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Execute a SQL statement with the given parameters.
    async fn execute(
        &self,
        sql: &str,
        parameters: &mut [ParameterSlot],
    ) -> Result<Box<dyn Cursor + Send>>;
}
