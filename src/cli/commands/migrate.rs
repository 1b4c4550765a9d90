use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let (_, db) = super::connect().await?;
    db.migrate().await?;
    db.close().await;

    output_success(&output_format, "Migrations applied", None)
}
