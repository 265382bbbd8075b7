use std::sync::Arc;

use log::debug;

use crate::config::ProviderSettings;
use crate::cursor::BufferedCursor;
use crate::error::Result;
use crate::parameters::ParameterMap;
use crate::traits::{Cursor, DatabaseDriver};
use crate::types::{ParameterObject, ParameterSlot};

/// Runs statements through a driver, binding parameters from a parameter map.
/// Created from a DataMapperClient.
pub struct StatementExecutor {
    driver: Arc<dyn DatabaseDriver>,
    settings: ProviderSettings,
}

impl StatementExecutor {
    pub fn new(driver: Arc<dyn DatabaseDriver>, settings: ProviderSettings) -> Self {
        Self { driver, settings }
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    /// Execute `sql` with parameters bound from `parameter_object` and return its cursor.
    ///
    /// Output parameters are written back into `parameter_object`. Providers that allow only
    /// one open cursor per connection deliver output values after the cursor is drained, so
    /// their cursor is buffered first and the returned cursor is a [`BufferedCursor`].
    pub async fn execute_query(
        &self,
        sql: &str,
        parameter_map: &ParameterMap,
        parameter_object: &mut ParameterObject,
    ) -> Result<Box<dyn Cursor + Send>> {
        let mut slots = self.bind(parameter_map, parameter_object)?;
        let cursor = self.driver.execute(sql, &mut slots).await?;

        let cursor: Box<dyn Cursor + Send> = if self.settings.allow_multiple_active_cursors {
            cursor
        } else {
            debug!(
                "Provider '{}' allows one active cursor, buffering results of '{}'.",
                self.settings.name,
                parameter_map.id()
            );
            Box::new(BufferedCursor::new(cursor)?)
        };

        apply_outputs(parameter_map, &slots, parameter_object)?;
        Ok(cursor)
    }

    /// Execute a statement that returns no rows and write back its output parameters.
    pub async fn execute_update(
        &self,
        sql: &str,
        parameter_map: &ParameterMap,
        parameter_object: &mut ParameterObject,
    ) -> Result<()> {
        let mut slots = self.bind(parameter_map, parameter_object)?;
        let mut cursor = self.driver.execute(sql, &mut slots).await?;
        cursor.close()?;
        apply_outputs(parameter_map, &slots, parameter_object)
    }

    fn bind(
        &self,
        parameter_map: &ParameterMap,
        parameter_object: &ParameterObject,
    ) -> Result<Vec<ParameterSlot>> {
        let mut slots = parameter_map.bind(parameter_object)?;
        if !self.settings.use_positional_parameters && !self.settings.parameter_prefix.is_empty() {
            for slot in &mut slots {
                slot.name = format!("{}{}", self.settings.parameter_prefix, slot.name);
            }
        }
        Ok(slots)
    }
}

fn apply_outputs(
    parameter_map: &ParameterMap,
    slots: &[ParameterSlot],
    parameter_object: &mut ParameterObject,
) -> Result<()> {
    for (property, slot) in parameter_map.binding_properties().zip(slots) {
        if property.direction().is_output() {
            parameter_map.set_output_parameter(parameter_object, property, slot.value.clone())?;
        }
    }
    Ok(())
}
