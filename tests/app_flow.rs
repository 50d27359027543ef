mod common;

use std::time::Duration;

use common::{app_with_ttl, day, draft, initialised_app};
use trade_journal::app::{AppError, ImageUpload};
use trade_journal::journal::search::SearchField;
use trade_journal::journal::{MoveDirection, PickListError, PickListKind, SchemaError};

fn image(name: &str) -> ImageUpload {
    ImageUpload {
        file_name: name.to_string(),
        bytes: vec![0x89, b'P', b'N', b'G'],
    }
}

#[tokio::test]
async fn create_saves_row_then_numbered_images() {
    let app = initialised_app().await;

    let created = app
        .create_trade(
            draft("NQ", day(2026, 1, 4), 25.0),
            vec![image("a.png"), image("b.JPG"), image("c.bmp")],
        )
        .await
        .unwrap();

    assert_eq!(created.record.trade_id, "00001NQ04012026");
    let names: Vec<_> = created.attachments.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["00001NQ04012026_01.png", "00001NQ04012026_02.jpg"]);
    assert_eq!(created.failed_uploads, ["c.bmp"]);
    assert_eq!(app.trades().await.unwrap().len(), 1);
}

#[tokio::test]
async fn upload_failures_leave_the_row_saved() {
    let app = initialised_app().await;
    app.attachment_store().inner().fail_uploads(true);

    let created = app
        .create_trade(draft("ES", day(2026, 1, 5), -3.0), vec![image("a.png")])
        .await
        .unwrap();
    assert!(created.attachments.is_empty());
    assert_eq!(created.failed_uploads, ["a.png"]);
    assert_eq!(app.find(&created.record.trade_id).await.unwrap(), created.record);
}

#[tokio::test]
async fn unshared_images_do_not_hold_a_sequence_number() {
    let app = initialised_app().await;
    app.attachment_store().inner().fail_sharing(true);
    let created = app
        .create_trade(
            draft("NQ", day(2026, 1, 4), 1.0),
            vec![image("a.png"), image("b.png")],
        )
        .await
        .unwrap();
    assert_eq!(created.failed_uploads, ["a.png", "b.png"]);
    assert!(app.attachments(&created.record.trade_id).await.is_empty());

    app.attachment_store().inner().fail_sharing(false);
    let (stored, failed) = app
        .attach(&created.record.trade_id, vec![image("c.png")])
        .await
        .unwrap();
    assert!(failed.is_empty());
    assert_eq!(stored[0].name, "00001NQ04012026_01.png");
    assert_eq!(app.attachments(&created.record.trade_id).await.len(), 1);
}

#[tokio::test]
async fn reads_are_cached_until_a_mutation() {
    let app = initialised_app().await;
    app.create_trade(draft("NQ", day(2026, 1, 4), 1.0), vec![])
        .await
        .unwrap();
    assert_eq!(app.trades().await.unwrap().len(), 1);

    // Out-of-band change is invisible while the cache is fresh.
    let sheet = app.store().inner();
    let mut rows = sheet.rows("Trades");
    rows.truncate(1);
    sheet.put_rows("Trades", rows);
    assert_eq!(app.trades().await.unwrap().len(), 1);

    app.refresh();
    assert!(app.trades().await.unwrap().is_empty());

    app.create_trade(draft("NQ", day(2026, 1, 6), 1.0), vec![])
        .await
        .unwrap();
    assert_eq!(app.trades().await.unwrap().len(), 1);
}

#[tokio::test]
async fn zero_ttl_always_reads_through() {
    let app = app_with_ttl(Duration::ZERO);
    app.init().await.unwrap();
    app.create_trade(draft("NQ", day(2026, 1, 4), 1.0), vec![])
        .await
        .unwrap();
    let sheet = app.store().inner();
    let mut rows = sheet.rows("Trades");
    rows.truncate(1);
    sheet.put_rows("Trades", rows);
    assert!(app.trades().await.unwrap().is_empty());
}

#[tokio::test]
async fn bootstrap_falls_back_when_offline() {
    let app = initialised_app().await;
    let snapshot = app.bootstrap().await;
    assert!(snapshot.connection_ok);

    app.refresh();
    app.store().inner().set_offline(true);
    let snapshot = app.bootstrap().await;
    assert!(!snapshot.connection_ok);
    assert!(snapshot.trades.is_empty());
    assert_eq!(snapshot.settings.accounts, ["-- no account --", "Private"]);
    assert_eq!(snapshot.settings.assets, ["-- no asset --", "NQ", "ES"]);
    assert!(!snapshot.schema.is_empty());
}

#[tokio::test]
async fn concurrent_creates_get_distinct_identifiers() {
    let app = initialised_app().await;
    let (a, b) = tokio::join!(
        app.create_trade(draft("NQ", day(2026, 1, 4), 1.0), vec![]),
        app.create_trade(draft("NQ", day(2026, 1, 4), 2.0), vec![]),
    );
    let mut ids = vec![a.unwrap().record.trade_id, b.unwrap().record.trade_id];
    ids.sort();
    assert_eq!(ids, ["00001NQ04012026", "00002NQ04012026"]);
}

#[tokio::test]
async fn update_review_and_delete_by_reference() {
    let app = initialised_app().await;
    let created = app
        .create_trade(draft("NQ", day(2026, 1, 4), 1.0), vec![])
        .await
        .unwrap();
    let trade_id = created.record.trade_id.clone();

    let mut record = app.find(&trade_id).await.unwrap();
    record.notes = "moved stop too early".into();
    app.update_trade(&record).await.unwrap();
    assert_eq!(app.find(&record.id).await.unwrap().notes, "moved stop too early");

    assert!(app.toggle_reviewed(&trade_id).await.unwrap());
    assert!(app.find(&trade_id).await.unwrap().reviewed);
    assert!(!app.toggle_reviewed(&trade_id).await.unwrap());

    app.delete_trade(&record.id).await.unwrap();
    assert!(matches!(
        app.find(&trade_id).await,
        Err(AppError::TradeNotFound(_))
    ));
    assert!(matches!(
        app.update_trade(&record).await,
        Err(AppError::TradeNotFound(_))
    ));
    assert!(matches!(
        app.delete_trade(&record.id).await,
        Err(AppError::TradeNotFound(_))
    ));
}

#[tokio::test]
async fn review_flag_lands_on_its_row_during_a_delete() {
    let app = initialised_app().await;
    let mut created = Vec::new();
    for d in [4, 5, 6] {
        let c = app
            .create_trade(draft("NQ", day(2026, 1, d), 1.0), vec![])
            .await
            .unwrap();
        created.push(c.record);
    }

    let (deleted, flagged) = tokio::join!(
        app.delete_trade(&created[0].id),
        app.set_reviewed(&created[2].id, true),
    );
    deleted.unwrap();
    flagged.unwrap();

    let trades = app.trades().await.unwrap();
    assert_eq!(trades.len(), 2);
    assert!(!app.find(&created[1].trade_id).await.unwrap().reviewed);
    assert!(app.find(&created[2].trade_id).await.unwrap().reviewed);
}

#[tokio::test]
async fn preview_counts_rows_that_do_not_load() {
    let app = initialised_app().await;
    app.create_trade(draft("NQ", day(2026, 1, 4), 1.0), vec![])
        .await
        .unwrap();
    let sheet = app.store().inner();
    let mut rows = sheet.rows("Trades");
    rows[1][2] = "04.01.2026".to_string();
    sheet.put_rows("Trades", rows);
    app.refresh();

    assert!(app.trades().await.unwrap().is_empty());
    assert_eq!(
        app.preview_trade_id("NQ", day(2026, 1, 5)).await.unwrap(),
        "00002NQ05012026"
    );
}

#[tokio::test]
async fn attach_continues_the_sequence() {
    let app = initialised_app().await;
    let created = app
        .create_trade(draft("NQ", day(2026, 1, 4), 1.0), vec![image("a.png")])
        .await
        .unwrap();

    let (stored, failed) = app
        .attach(&created.record.trade_id, vec![image("b.gif")])
        .await
        .unwrap();
    assert!(failed.is_empty());
    assert_eq!(stored[0].name, "00001NQ04012026_02.gif");

    let listed = app.attachments(&created.record.trade_id).await;
    assert_eq!(listed.len(), 2);
    assert!(app.detach(&listed[0].id).await);
    assert_eq!(app.attachments(&created.record.trade_id).await.len(), 1);
}

#[tokio::test]
async fn schema_changes_persist_and_reject_bad_edits() {
    let app = initialised_app().await;

    app.update_schema(|s| s.add_category("Psychology")).await.unwrap();
    app.update_schema(|s| s.add_item("Psychology", "calm", "Calm", ""))
        .await
        .unwrap();
    let moved = app
        .update_schema(|s| s.move_item("Psychology", "calm", MoveDirection::Up))
        .await
        .unwrap();
    assert!(!moved);

    let schema = app.schema().await.unwrap();
    assert!(schema.contains_item("calm"));

    for category in schema.categories().map(str::to_string).collect::<Vec<_>>() {
        if category != "Psychology" {
            app.update_schema(|s| s.delete_category(&category)).await.unwrap();
        }
    }
    let err = app
        .update_schema(|s| s.delete_category("Psychology"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Schema(SchemaError::LastCategory)));
    assert_eq!(app.schema().await.unwrap().categories().count(), 1);
}

#[tokio::test]
async fn pick_lists_persist_and_protect_the_sentinel() {
    let app = initialised_app().await;
    app.update_settings(|s| s.add(PickListKind::Accounts, "Apex 50K"))
        .await
        .unwrap();
    let moved = app
        .update_settings(|s| s.move_entry(PickListKind::Accounts, "Private", MoveDirection::Up))
        .await
        .unwrap();
    assert!(!moved);

    let err = app
        .update_settings(|s| s.remove(PickListKind::Accounts, "-- no account --"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PickList(PickListError::Sentinel)));

    let settings = app.settings().await.unwrap();
    assert_eq!(
        settings.managed(PickListKind::Accounts),
        ["Private", "FTMO 12.2025 100K", "Apex 50K"]
    );
}

#[tokio::test]
async fn dashboard_and_search_use_current_trades() {
    let app = initialised_app().await;
    for (asset, d, pnl) in [("NQ", 4, 10.0), ("ES", 4, -5.0), ("NQ", 5, 0.0), ("DAX", 6, 20.0)] {
        app.create_trade(draft(asset, day(2026, 1, d), pnl), vec![])
            .await
            .unwrap();
    }

    let stats = app.dashboard().await.unwrap();
    assert_eq!(stats.trade_count, 4);
    assert_eq!(stats.win_rate, 50.0);
    assert_eq!(stats.net_pnl, 25.0);
    assert_eq!(stats.daily_pnl[0], (day(2026, 1, 4), 5.0));
    assert_eq!(stats.recent[0].asset, "DAX");

    let hits = app.search("nq", SearchField::Asset).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].date, day(2026, 1, 5));

    let preview = app.preview_trade_id("yen basket", day(2026, 1, 7)).await.unwrap();
    assert_eq!(preview, "00005YENBASKET07012026");
}
