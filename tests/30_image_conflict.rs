//! Needs a disposable Postgres in `TEST_DATABASE_URL`; skipped when unset.

use anyhow::Result;
use uuid::Uuid;

use devtrack_api::config::DatabaseConfig;
use devtrack_api::database::accounts::NewAccount;
use devtrack_api::database::pages::{NewPage, PageChanges};
use devtrack_api::database::{AccountRepository, Database, DatabaseError, PageRepository};
use devtrack_api::media::{ImageCollection, ImageRef};
use devtrack_api::types::Role;

async fn database() -> Result<Option<Database>> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return Ok(None);
    };
    let db = Database::connect(&DatabaseConfig {
        url,
        max_connections: 2,
        connection_timeout: 5,
        run_migrations: true,
    })
    .await?;
    db.migrate().await?;
    Ok(Some(db))
}

fn images(ids: &[&str]) -> ImageCollection {
    ImageCollection::from(
        ids.iter()
            .map(|id| ImageRef::new(format!("https://media.test/{id}"), *id))
            .collect::<Vec<_>>(),
    )
}

#[tokio::test]
async fn stale_image_set_is_a_conflict() -> Result<()> {
    let Some(db) = database().await? else {
        return Ok(());
    };
    let pool = db.pool();

    let owner = AccountRepository::new(pool)
        .create(&NewAccount {
            project_name: "Atlas".into(),
            email: format!("owner-{}@acme.io", Uuid::new_v4()),
            role: Role::User,
            due_date: "2030-01-01".into(),
            password_hash: None,
        })
        .await?;

    let repo = PageRepository::new(pool);
    let page = repo
        .create(&NewPage {
            page_name: "Home".into(),
            description: "Landing".into(),
            owner_id: owner.id,
            assigned_to_id: None,
            images: images(&["a"]),
        })
        .await?;

    // first writer wins
    let first = repo
        .save(page.id, &PageChanges::default(), &images(&["a"]), &images(&["a", "b"]))
        .await?;
    assert_eq!(first.images.0, images(&["a", "b"]));

    // second writer still believes the set is ["a"]
    let second = repo
        .save(page.id, &PageChanges::default(), &images(&["a"]), &images(&["c"]))
        .await;
    assert!(matches!(second, Err(DatabaseError::Conflict(_))));
    assert_eq!(repo.get(page.id).await?.images.0, images(&["a", "b"]));

    repo.delete(page.id).await?;
    AccountRepository::new(pool).delete(owner.id).await?;
    Ok(())
}
