//! Integration tests for performer merge alias stamping, rename alias
//! stamping, and redirect resolution of stale ids in scene edits.

mod common;

use common::*;
use curio_core::edit::Operation;
use curio_core::field::FieldUpdate;
use curio_core::types::{new_id, Id};
use curio_db::models::performer::CreatePerformer;
use curio_db::models::scene::CreateScene;
use curio_db::models::tag::CreateTag;
use curio_db::repositories::{PerformerRepo, SceneRepo, TagRepo};
use curio_edits::input::{
    EditInput, PerformerDetailsInput, PerformerEditInput, PerformerEditOptions, SceneDetailsInput,
    SceneEditInput, TagDetailsInput,
};
use sqlx::PgPool;

async fn seed_performer(pool: &PgPool, name: &str) -> curio_db::models::performer::Performer {
    let mut conn = pool.acquire().await.unwrap();
    PerformerRepo::create(
        &mut conn,
        &CreatePerformer {
            id: new_id(),
            name: name.to_string(),
            disambiguation: None,
            gender: None,
            birthdate: None,
            country: None,
            career_start_year: None,
            career_end_year: None,
        },
    )
    .await
    .unwrap()
}

async fn seed_scene(pool: &PgPool, title: &str) -> curio_db::models::scene::Scene {
    let mut conn = pool.acquire().await.unwrap();
    SceneRepo::create(
        &mut conn,
        &CreateScene {
            id: new_id(),
            title: Some(title.to_string()),
            details: None,
            date: None,
            studio_id: None,
            duration: None,
            director: None,
            code: None,
        },
    )
    .await
    .unwrap()
}

fn performer_merge_input(target: Id, sources: &[Id], stamp_aliases: bool) -> PerformerEditInput {
    PerformerEditInput {
        edit: EditInput {
            operation: Operation::Merge,
            id: Some(target),
            merge_source_ids: sources.to_vec(),
            comment: None,
            bot: false,
        },
        details: None,
        options: PerformerEditOptions {
            set_modify_aliases: false,
            set_merge_aliases: stamp_aliases,
        },
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn performer_merge_stamps_source_name_on_credits(pool: PgPool) {
    let service = test_service(&pool).await;
    let editor = seed_editor(&pool, "editor").await;
    let admin = seed_admin(&pool, "admin").await;

    let target = seed_performer(&pool, "Jane Hart").await;
    let source = seed_performer(&pool, "Belle Nox").await;

    let scene = seed_scene(&pool, "Morning Light").await;
    {
        let mut conn = pool.acquire().await.unwrap();
        SceneRepo::add_performer(&mut conn, scene.id, source.id, None)
            .await
            .unwrap();
    }

    let edit = service
        .performer_edit(
            &editor,
            &performer_merge_input(target.id, &[source.id], true),
        )
        .await
        .unwrap();
    service.apply_edit(&admin, edit.id).await.unwrap();

    let mut conn = pool.acquire().await.unwrap();

    // The credit moved to the target and kept the name it was filmed under.
    let credits = SceneRepo::list_performers(&mut conn, scene.id).await.unwrap();
    assert_eq!(credits.len(), 1);
    assert_eq!(credits[0].performer_id, target.id);
    assert_eq!(credits[0].alias.as_deref(), Some("Belle Nox"));

    // The source is gone, reachable only through the redirect.
    assert!(PerformerRepo::find_live(&mut conn, source.id)
        .await
        .unwrap()
        .is_none());
    let resolved = PerformerRepo::find_with_redirect(&mut conn, source.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.id, target.id);
}

#[sqlx::test(migrations = "../../migrations")]
async fn performer_merge_without_stamping_leaves_credits_bare(pool: PgPool) {
    let service = test_service(&pool).await;
    let editor = seed_editor(&pool, "editor").await;
    let admin = seed_admin(&pool, "admin").await;

    let target = seed_performer(&pool, "Jane Hart").await;
    let source = seed_performer(&pool, "Belle Nox").await;
    let scene = seed_scene(&pool, "Afternoon").await;
    {
        let mut conn = pool.acquire().await.unwrap();
        SceneRepo::add_performer(&mut conn, scene.id, source.id, None)
            .await
            .unwrap();
    }

    let edit = service
        .performer_edit(
            &editor,
            &performer_merge_input(target.id, &[source.id], false),
        )
        .await
        .unwrap();
    service.apply_edit(&admin, edit.id).await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let credits = SceneRepo::list_performers(&mut conn, scene.id).await.unwrap();
    assert_eq!(credits.len(), 1);
    assert_eq!(credits[0].performer_id, target.id);
    assert_eq!(credits[0].alias, None);
}

#[sqlx::test(migrations = "../../migrations")]
async fn rename_stamps_old_name_when_requested(pool: PgPool) {
    let service = test_service(&pool).await;
    let editor = seed_editor(&pool, "editor").await;
    let admin = seed_admin(&pool, "admin").await;

    let performer = seed_performer(&pool, "Belle Nox").await;
    let scene = seed_scene(&pool, "Evening").await;
    let credited = seed_scene(&pool, "Night").await;
    {
        let mut conn = pool.acquire().await.unwrap();
        SceneRepo::add_performer(&mut conn, scene.id, performer.id, None)
            .await
            .unwrap();
        // This credit already carries an explicit alias and must keep it.
        SceneRepo::add_performer(&mut conn, credited.id, performer.id, Some("B. Nox"))
            .await
            .unwrap();
    }

    let input = PerformerEditInput {
        edit: EditInput {
            operation: Operation::Modify,
            id: Some(performer.id),
            merge_source_ids: Vec::new(),
            comment: None,
            bot: false,
        },
        details: Some(PerformerDetailsInput {
            name: FieldUpdate::Set("Isabelle Nox".to_string()),
            ..Default::default()
        }),
        options: PerformerEditOptions {
            set_modify_aliases: true,
            set_merge_aliases: false,
        },
    };
    let edit = service.performer_edit(&editor, &input).await.unwrap();
    service.apply_edit(&admin, edit.id).await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let renamed = PerformerRepo::find_live(&mut conn, performer.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(renamed.name, "Isabelle Nox");

    let bare = SceneRepo::list_performers(&mut conn, scene.id).await.unwrap();
    assert_eq!(bare[0].alias.as_deref(), Some("Belle Nox"));

    let aliased = SceneRepo::list_performers(&mut conn, credited.id).await.unwrap();
    assert_eq!(aliased[0].alias.as_deref(), Some("B. Nox"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn scene_edit_resolves_merged_tag_ids(pool: PgPool) {
    let service = test_service(&pool).await;
    let editor = seed_editor(&pool, "editor").await;
    let admin = seed_admin(&pool, "admin").await;

    let survivor = {
        let mut conn = pool.acquire().await.unwrap();
        TagRepo::create(
            &mut conn,
            &CreateTag {
                id: new_id(),
                name: "Sunrise".to_string(),
                description: None,
            },
        )
        .await
        .unwrap()
    };
    let absorbed = {
        let mut conn = pool.acquire().await.unwrap();
        TagRepo::create(
            &mut conn,
            &CreateTag {
                id: new_id(),
                name: "Dawn".to_string(),
                description: None,
            },
        )
        .await
        .unwrap()
    };

    // Merge the tag away first.
    let merge = service
        .tag_edit(
            &editor,
            &tag_merge_input(survivor.id, &[absorbed.id], TagDetailsInput::default()),
        )
        .await
        .unwrap();
    service.apply_edit(&admin, merge.id).await.unwrap();

    // A scene edit still referencing the merged-away id lands on the survivor.
    let scene = seed_scene(&pool, "Daybreak").await;
    let input = SceneEditInput {
        edit: EditInput {
            operation: Operation::Modify,
            id: Some(scene.id),
            merge_source_ids: Vec::new(),
            comment: None,
            bot: false,
        },
        details: Some(SceneDetailsInput {
            tag_ids: Some(vec![absorbed.id]),
            ..Default::default()
        }),
    };
    let edit = service.scene_edit(&editor, &input).await.unwrap();
    service.apply_edit(&admin, edit.id).await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let tags = SceneRepo::list_tag_ids(&mut conn, scene.id).await.unwrap();
    assert_eq!(tags, vec![survivor.id]);
}
