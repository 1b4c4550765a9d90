use clap::Args;
use serde_json::json;
use tracing::info;

use crate::auth::{generate_password, hash_password_task};
use crate::cli::utils::{output_notice, output_success};
use crate::cli::OutputFormat;
use crate::database::accounts::NewAccount;
use crate::database::models::account::{DEFAULT_DUE_DATE, DEFAULT_PROJECT_NAME};
use crate::database::AccountRepository;
use crate::types::Role;
use crate::validation::validate_email_format;

#[derive(Args, Debug)]
pub struct CreateAdminArgs {
    #[arg(long, help = "Admin email address")]
    pub email: String,

    #[arg(long, help = "Project name shown in mails")]
    pub project_name: Option<String>,

    #[arg(long, help = "Password to set instead of a generated one")]
    pub password: Option<String>,
}

pub async fn create_admin(args: CreateAdminArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let email = args.email.trim().to_string();
    validate_email_format(&email).map_err(|e| anyhow::anyhow!(e))?;

    let (config, db) = super::connect().await?;
    let repo = AccountRepository::new(db.pool());

    if let Some(existing) = repo.first_admin().await? {
        db.close().await;
        return output_notice(
            &output_format,
            &format!("An admin account already exists ({})", existing.email),
        );
    }

    let generated = args.password.is_none();
    let password = args.password.unwrap_or_else(generate_password);
    let hash = hash_password_task(password.clone(), config.security.bcrypt_cost).await?;

    let account = repo
        .create(&NewAccount {
            project_name: args
                .project_name
                .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string()),
            email,
            role: Role::Admin,
            due_date: DEFAULT_DUE_DATE.to_string(),
            password_hash: Some(hash),
        })
        .await?;
    db.close().await;
    info!(account_id = %account.id, "Admin account created");

    let mut data = json!({ "id": account.id, "email": account.email });
    if generated {
        data["password"] = json!(password);
    }
    output_success(&output_format, "Admin account created", Some(data))?;

    if generated && matches!(output_format, OutputFormat::Text) {
        println!("Password: {}", password);
    }
    Ok(())
}
