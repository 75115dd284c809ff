use crate::cli::{utils, OutputFormat};
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    match DatabaseManager::migrate().await {
        Ok(()) => utils::output_success(&output_format, "Migrations applied", None),
        Err(e) => {
            utils::output_error(&output_format, &e.to_string(), Some("MIGRATION_FAILED"))?;
            Err(e.into())
        }
    }
}
