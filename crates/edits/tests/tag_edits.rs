//! Integration tests for the tag edit lifecycle: proposal, application,
//! optimistic-concurrency failure, destroy, and merge.

mod common;

use assert_matches::assert_matches;
use common::*;
use curio_core::edit::{EditStatus, TargetType};
use curio_core::error::CoreError;
use curio_core::field::FieldUpdate;
use curio_core::types::new_id;
use curio_db::models::scene::CreateScene;
use curio_db::models::tag::CreateTag;
use curio_db::repositories::{EditRepo, SceneRepo, TagRepo};
use curio_edits::input::TagDetailsInput;
use curio_edits::EditError;
use sqlx::PgPool;

async fn seed_tag(pool: &PgPool, name: &str) -> curio_db::models::tag::Tag {
    let mut conn = pool.acquire().await.unwrap();
    TagRepo::create(
        &mut conn,
        &CreateTag {
            id: new_id(),
            name: name.to_string(),
            description: None,
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

#[sqlx::test(migrations = "../../migrations")]
async fn create_edit_applies_new_tag(pool: PgPool) {
    let service = test_service(&pool).await;
    let editor = seed_editor(&pool, "editor").await;
    let admin = seed_admin(&pool, "admin").await;

    let mut input = tag_create_input("Blonde", &["Blond", "blonde hair"]);
    input.edit.comment = Some("new hair colour tag".to_string());

    let edit = service.tag_edit(&editor, &input).await.unwrap();
    assert_eq!(edit.status().unwrap(), EditStatus::Pending);
    assert!(!edit.applied);

    // The proposal comment is recorded.
    let comments = service.list_comments(edit.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "new hair colour tag");

    let applied = service.apply_edit(&admin, edit.id).await.unwrap();
    assert_eq!(applied.status().unwrap(), EditStatus::ImmediateAccepted);
    assert!(applied.applied);

    let mut conn = pool.acquire().await.unwrap();
    let linked = EditRepo::list_linked_ids(&mut conn, edit.id, TargetType::Tag)
        .await
        .unwrap();
    assert_eq!(linked.len(), 1);

    let tag = TagRepo::find_live(&mut conn, linked[0]).await.unwrap().unwrap();
    assert_eq!(tag.name, "Blonde");

    let aliases = TagRepo::list_aliases(&mut conn, tag.id).await.unwrap();
    assert_eq!(aliases, vec!["Blond".to_string(), "blonde hair".to_string()]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_edit_honors_supplied_id(pool: PgPool) {
    let service = test_service(&pool).await;
    let editor = seed_editor(&pool, "editor").await;
    let admin = seed_admin(&pool, "admin").await;

    let wanted = new_id();
    let mut input = tag_create_input("Redhead", &[]);
    input.edit.id = Some(wanted);

    let edit = service.tag_edit(&editor, &input).await.unwrap();
    service.apply_edit(&admin, edit.id).await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let tag = TagRepo::find_live(&mut conn, wanted).await.unwrap();
    assert!(tag.is_some(), "tag should be created under the supplied id");
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_edit_requires_name(pool: PgPool) {
    let service = test_service(&pool).await;
    let editor = seed_editor(&pool, "editor").await;

    let input = curio_edits::input::TagEditInput {
        edit: edit_input(curio_core::edit::Operation::Create, None),
        details: Some(TagDetailsInput::default()),
    };
    let err = service.tag_edit(&editor, &input).await.unwrap_err();
    assert_matches!(err, EditError::Core(CoreError::MissingRequiredField("name")));
}

#[sqlx::test(migrations = "../../migrations")]
async fn modify_edit_without_changes_is_rejected(pool: PgPool) {
    let service = test_service(&pool).await;
    let editor = seed_editor(&pool, "editor").await;
    let tag = seed_tag(&pool, "Brunette").await;

    // Same name, nothing else touched.
    let input = tag_modify_input(
        tag.id,
        TagDetailsInput {
            name: FieldUpdate::Set("Brunette".to_string()),
            ..Default::default()
        },
    );
    let err = service.tag_edit(&editor, &input).await.unwrap_err();
    assert_matches!(err, EditError::Core(CoreError::NoChanges));
}

#[sqlx::test(migrations = "../../migrations")]
async fn modify_edit_applies_field_and_alias_changes(pool: PgPool) {
    let service = test_service(&pool).await;
    let editor = seed_editor(&pool, "editor").await;
    let admin = seed_admin(&pool, "admin").await;

    let tag = seed_tag(&pool, "Outdoors").await;
    {
        let mut conn = pool.acquire().await.unwrap();
        TagRepo::add_alias(&mut conn, tag.id, "outside").await.unwrap();
    }

    let input = tag_modify_input(
        tag.id,
        TagDetailsInput {
            name: FieldUpdate::Unset,
            description: FieldUpdate::Set("Filmed outside".to_string()),
            aliases: Some(vec!["open air".to_string()]),
        },
    );
    let edit = service.tag_edit(&editor, &input).await.unwrap();
    let applied = service.apply_edit(&admin, edit.id).await.unwrap();
    assert!(applied.applied);

    let mut conn = pool.acquire().await.unwrap();
    let tag = TagRepo::find_live(&mut conn, tag.id).await.unwrap().unwrap();
    assert_eq!(tag.name, "Outdoors");
    assert_eq!(tag.description.as_deref(), Some("Filmed outside"));

    let aliases = TagRepo::list_aliases(&mut conn, tag.id).await.unwrap();
    assert_eq!(aliases, vec!["open air".to_string()]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn stale_snapshot_moves_edit_to_failed(pool: PgPool) {
    let service = test_service(&pool).await;
    let editor = seed_editor(&pool, "editor").await;
    let admin = seed_admin(&pool, "admin").await;

    let tag = seed_tag(&pool, "Vintage").await;
    let input = tag_modify_input(
        tag.id,
        TagDetailsInput {
            name: FieldUpdate::Set("Retro".to_string()),
            ..Default::default()
        },
    );
    let edit = service.tag_edit(&editor, &input).await.unwrap();

    // Someone else renames the tag while the edit is pending.
    {
        let mut conn = pool.acquire().await.unwrap();
        TagRepo::update(&mut conn, tag.id, "Classic", None).await.unwrap();
    }

    let failed = service.apply_edit(&admin, edit.id).await.unwrap();
    assert_eq!(failed.status().unwrap(), EditStatus::Failed);
    assert!(!failed.applied);

    // The live row kept the concurrent rename.
    let mut conn = pool.acquire().await.unwrap();
    let tag = TagRepo::find_live(&mut conn, tag.id).await.unwrap().unwrap();
    assert_eq!(tag.name, "Classic");

    // And the failure was explained in a system comment.
    let comments = service.list_comments(edit.id).await.unwrap();
    assert!(comments
        .iter()
        .any(|c| c.text.starts_with("Edit application failed:")));
}

#[sqlx::test(migrations = "../../migrations")]
async fn amending_to_a_new_target_relinks_the_edit(pool: PgPool) {
    let service = test_service(&pool).await;
    let editor = seed_editor(&pool, "editor").await;
    let admin = seed_admin(&pool, "admin").await;

    let first = seed_tag(&pool, "Indoor").await;
    let second = seed_tag(&pool, "Warehouse").await;

    let edit = service
        .tag_edit(
            &editor,
            &tag_modify_input(
                first.id,
                TagDetailsInput {
                    name: FieldUpdate::Set("Interior".to_string()),
                    ..Default::default()
                },
            ),
        )
        .await
        .unwrap();

    // The amendment points the edit at a different tag entirely.
    service
        .tag_edit_update(
            &editor,
            edit.id,
            &tag_modify_input(
                second.id,
                TagDetailsInput {
                    name: FieldUpdate::Set("Depot".to_string()),
                    ..Default::default()
                },
            ),
        )
        .await
        .unwrap();

    // Only the new target is linked; the old link row is gone.
    {
        let mut conn = pool.acquire().await.unwrap();
        let linked = EditRepo::list_linked_ids(&mut conn, edit.id, TargetType::Tag)
            .await
            .unwrap();
        assert_eq!(linked, vec![second.id]);
    }

    service.apply_edit(&admin, edit.id).await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let untouched = TagRepo::find_live(&mut conn, first.id).await.unwrap().unwrap();
    assert_eq!(untouched.name, "Indoor");
    let renamed = TagRepo::find_live(&mut conn, second.id).await.unwrap().unwrap();
    assert_eq!(renamed.name, "Depot");
}

#[sqlx::test(migrations = "../../migrations")]
async fn destroy_edit_soft_deletes(pool: PgPool) {
    let service = test_service(&pool).await;
    let editor = seed_editor(&pool, "editor").await;
    let admin = seed_admin(&pool, "admin").await;

    let tag = seed_tag(&pool, "Obsolete").await;
    let scene = seed_scene(&pool, "Tagged").await;
    {
        let mut conn = pool.acquire().await.unwrap();
        SceneRepo::add_tag(&mut conn, scene.id, tag.id).await.unwrap();
    }

    let edit = service
        .tag_edit(&editor, &tag_destroy_input(tag.id))
        .await
        .unwrap();
    service.apply_edit(&admin, edit.id).await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    assert!(TagRepo::find_live(&mut conn, tag.id).await.unwrap().is_none());
    let row = TagRepo::find_by_id(&mut conn, tag.id).await.unwrap().unwrap();
    assert!(row.deleted);

    // Scene links to the destroyed tag are gone.
    let tags = SceneRepo::list_tag_ids(&mut conn, scene.id).await.unwrap();
    assert!(tags.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn merge_moves_scene_links_and_creates_redirect(pool: PgPool) {
    let service = test_service(&pool).await;
    let editor = seed_editor(&pool, "editor").await;
    let admin = seed_admin(&pool, "admin").await;

    let target = seed_tag(&pool, "Beach").await;
    let source = seed_tag(&pool, "Seaside").await;

    let both = seed_scene(&pool, "Sunset").await;
    let only_source = seed_scene(&pool, "Dunes").await;
    {
        let mut conn = pool.acquire().await.unwrap();
        SceneRepo::add_tag(&mut conn, both.id, target.id).await.unwrap();
        SceneRepo::add_tag(&mut conn, both.id, source.id).await.unwrap();
        SceneRepo::add_tag(&mut conn, only_source.id, source.id).await.unwrap();
    }

    let edit = service
        .tag_edit(
            &editor,
            &tag_merge_input(target.id, &[source.id], TagDetailsInput::default()),
        )
        .await
        .unwrap();
    service.apply_edit(&admin, edit.id).await.unwrap();

    let mut conn = pool.acquire().await.unwrap();

    // The source is gone and resolves to the target through the redirect.
    assert!(TagRepo::find_live(&mut conn, source.id).await.unwrap().is_none());
    let resolved = TagRepo::find_with_redirect(&mut conn, source.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.id, target.id);

    // Scene links moved without duplicating the shared scene.
    let both_tags = SceneRepo::list_tag_ids(&mut conn, both.id).await.unwrap();
    assert_eq!(both_tags, vec![target.id]);
    let moved_tags = SceneRepo::list_tag_ids(&mut conn, only_source.id).await.unwrap();
    assert_eq!(moved_tags, vec![target.id]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn merge_chains_stay_one_hop(pool: PgPool) {
    let service = test_service(&pool).await;
    let editor = seed_editor(&pool, "editor").await;
    let admin = seed_admin(&pool, "admin").await;

    let a = seed_tag(&pool, "A").await;
    let b = seed_tag(&pool, "B").await;
    let c = seed_tag(&pool, "C").await;

    // Merge B into A, then A into C. The old B redirect must now point
    // straight at C.
    let first = service
        .tag_edit(
            &editor,
            &tag_merge_input(a.id, &[b.id], TagDetailsInput::default()),
        )
        .await
        .unwrap();
    service.apply_edit(&admin, first.id).await.unwrap();

    let second = service
        .tag_edit(
            &editor,
            &tag_merge_input(c.id, &[a.id], TagDetailsInput::default()),
        )
        .await
        .unwrap();
    service.apply_edit(&admin, second.id).await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let via_b = TagRepo::find_with_redirect(&mut conn, b.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(via_b.id, c.id);
    let via_a = TagRepo::find_with_redirect(&mut conn, a.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(via_a.id, c.id);
}

#[sqlx::test(migrations = "../../migrations")]
async fn merge_target_cannot_be_source(pool: PgPool) {
    let service = test_service(&pool).await;
    let editor = seed_editor(&pool, "editor").await;
    let tag = seed_tag(&pool, "Solo").await;

    let err = service
        .tag_edit(
            &editor,
            &tag_merge_input(tag.id, &[tag.id], TagDetailsInput::default()),
        )
        .await
        .unwrap_err();
    assert_matches!(err, EditError::Core(CoreError::MergeTargetIsSource));
}
