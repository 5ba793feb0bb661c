mod common;

use api_videoteka::ingest::{IngestError, Reconciler, UNKNOWN_CHANNEL_KEY};

use common::{
    sample_playlist, sample_video, sample_video_from, MemoryCatalog, ScriptedSource,
};

const CHANNEL: &str = "32869212";

#[tokio::test]
async fn scraping_twice_updates_instead_of_duplicating() {
    let source = ScriptedSource::new().with_channel_videos(
        CHANNEL,
        vec![
            sample_video("v1", "Первое видео"),
            sample_video("v2", "Второе видео"),
            sample_video("v3", "Третье видео"),
        ],
    );
    let mut store = MemoryCatalog::new();

    let first = Reconciler::new(&mut store, &source)
        .scrape_channel(CHANNEL, 10)
        .await
        .unwrap();
    assert_eq!(first.fetched, 3);
    assert_eq!(first.created, 3);
    assert_eq!(first.updated, 0);

    let second = Reconciler::new(&mut store, &source)
        .scrape_channel(CHANNEL, 10)
        .await
        .unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 3);

    assert_eq!(store.movies.len(), 3);
}

#[tokio::test]
async fn duplicate_external_ids_collapse_to_one_row_with_latest_title() {
    let source = ScriptedSource::new().with_channel_videos(
        CHANNEL,
        vec![
            sample_video("v1", "Старое название"),
            sample_video("v1", "Новое название"),
        ],
    );
    let mut store = MemoryCatalog::new();

    let report = Reconciler::new(&mut store, &source)
        .scrape_channel(CHANNEL, 10)
        .await
        .unwrap();

    assert_eq!(report.created, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(store.movies.len(), 1);
    assert_eq!(
        store.movie_by_external_id("v1").unwrap().title,
        "Новое название"
    );
}

#[tokio::test]
async fn update_keeps_the_original_release_year() {
    let mut early = sample_video("v1", "Видео");
    early.published_at = Some("2020-05-01T10:00:00Z".to_string());
    let mut late = sample_video("v1", "Видео");
    late.published_at = Some("2024-02-01T10:00:00Z".to_string());

    let first_batch = ScriptedSource::new().with_channel_videos(CHANNEL, vec![early]);
    let second_batch = ScriptedSource::new().with_channel_videos(CHANNEL, vec![late]);
    let mut store = MemoryCatalog::new();

    Reconciler::new(&mut store, &first_batch)
        .scrape_channel(CHANNEL, 10)
        .await
        .unwrap();
    Reconciler::new(&mut store, &second_batch)
        .scrape_channel(CHANNEL, 10)
        .await
        .unwrap();

    let movie = store.movie_by_external_id("v1").unwrap();
    assert_eq!(movie.year, 2020);
    assert_eq!(
        movie.channel_added_at.map(|at| at.to_rfc3339()),
        Some("2024-02-01T10:00:00+00:00".to_string())
    );
}

#[tokio::test]
async fn relinking_a_playlist_pair_is_a_noop() {
    let source = ScriptedSource::new()
        .with_playlist("418054", vec![sample_video_from("v1", "Серия 1", CHANNEL)])
        .with_playlist_info(sample_playlist("418054", "Сезон 1"));
    let url = "https://rutube.ru/plst/418054/";
    let mut store = MemoryCatalog::new();

    let first = Reconciler::new(&mut store, &source)
        .import_playlist("418054", url, 10)
        .await
        .unwrap();
    assert_eq!(first.imported, 1);
    assert_eq!(first.linked, 1);

    let second = Reconciler::new(&mut store, &source)
        .import_playlist("418054", url, 10)
        .await
        .unwrap();
    assert_eq!(second.imported, 0);
    assert_eq!(second.updated, 1);
    assert_eq!(second.linked, 0);

    assert_eq!(store.links.len(), 1);
    assert_eq!(store.playlists.len(), 1);
}

#[tokio::test]
async fn video_without_author_lands_on_the_placeholder_channel() {
    let source =
        ScriptedSource::new().with_playlist("418054", vec![sample_video("v1", "Без автора")]);
    let mut store = MemoryCatalog::new();

    Reconciler::new(&mut store, &source)
        .import_playlist("418054", "https://rutube.ru/plst/418054/", 10)
        .await
        .unwrap();

    let placeholder_id = store
        .channel_id_by_key(UNKNOWN_CHANNEL_KEY)
        .expect("placeholder channel should exist");
    let movie = store.movie_by_external_id("v1").unwrap();
    assert_eq!(movie.channel_id, placeholder_id);
}

#[tokio::test]
async fn empty_playlist_fetch_is_an_error() {
    let source = ScriptedSource::new().with_playlist("418054", Vec::new());
    let mut store = MemoryCatalog::new();

    let result = Reconciler::new(&mut store, &source)
        .import_playlist("418054", "https://rutube.ru/plst/418054/", 10)
        .await;

    assert!(matches!(result, Err(IngestError::EmptyFetch(_))));
    assert!(store.playlists.is_empty());
    assert!(store.movies.is_empty());
}

#[tokio::test]
async fn failing_playlist_is_skipped_and_the_rest_import() {
    let source = ScriptedSource::new()
        .with_channel_playlists(
            CHANNEL,
            vec![
                sample_playlist("101", "Первый"),
                sample_playlist("202", "Второй"),
                sample_playlist("303", "Третий"),
            ],
        )
        .with_playlist("101", vec![sample_video_from("a1", "Видео 1", CHANNEL)])
        .with_failing_playlist("202", "connection reset")
        .with_playlist(
            "303",
            vec![
                sample_video_from("c1", "Видео 2", CHANNEL),
                sample_video_from("c2", "Видео 3", CHANNEL),
            ],
        );
    let mut store = MemoryCatalog::new();

    let report = Reconciler::new(&mut store, &source)
        .import_channel(CHANNEL, "https://rutube.ru/channel/32869212/", None, true, 10)
        .await
        .unwrap();

    assert_eq!(report.playlists_found, 3);
    assert_eq!(report.playlists_imported, 2);
    assert_eq!(report.imported_videos, 3);
    assert_eq!(store.movies.len(), 3);
    assert!(store.playlist_id_by_key("202").is_none());
}

#[tokio::test]
async fn channel_import_links_videos_to_their_playlists() {
    let source = ScriptedSource::new()
        .with_channel_info(api_videoteka::ingest::RawChannel {
            channel_id: CHANNEL.to_string(),
            title: Some("Канал кино".to_string()),
            description: Some("Фильмы и сериалы".to_string()),
            avatar_url: None,
        })
        .with_channel_playlists(
            CHANNEL,
            vec![
                sample_playlist("101", "Сезон 1"),
                sample_playlist("202", "Сезон 2"),
            ],
        )
        .with_playlist(
            "101",
            (1..=5)
                .map(|n| sample_video_from(&format!("a{}", n), &format!("Серия {}", n), CHANNEL))
                .collect(),
        )
        .with_playlist(
            "202",
            (1..=3)
                .map(|n| sample_video_from(&format!("b{}", n), &format!("Серия {}", n), CHANNEL))
                .collect(),
        );
    let mut store = MemoryCatalog::new();

    let report = Reconciler::new(&mut store, &source)
        .import_channel(CHANNEL, "https://rutube.ru/channel/32869212/", None, true, 10)
        .await
        .unwrap();

    assert_eq!(report.playlists_found, 2);
    assert_eq!(report.playlists_imported, 2);
    assert_eq!(report.imported_videos, 8);
    assert_eq!(report.title, "Канал кино");

    assert_eq!(store.channels.len(), 1);
    assert_eq!(store.movies.len(), 8);

    let first = store.playlist_id_by_key("101").unwrap();
    let second = store.playlist_id_by_key("202").unwrap();
    assert_eq!(store.links_of_playlist(first), 5);
    assert_eq!(store.links_of_playlist(second), 3);

    let channel_id = store.channel_id_by_key(CHANNEL).unwrap();
    assert!(store
        .movies
        .values()
        .all(|movie| movie.channel_id == channel_id));
}

#[tokio::test]
async fn video_shared_by_two_playlists_is_stored_once_and_linked_twice() {
    let shared = sample_video_from("shared", "Общее видео", CHANNEL);
    let source = ScriptedSource::new()
        .with_channel_playlists(
            CHANNEL,
            vec![
                sample_playlist("101", "Первый"),
                sample_playlist("202", "Второй"),
            ],
        )
        .with_playlist("101", vec![shared.clone()])
        .with_playlist("202", vec![shared]);
    let mut store = MemoryCatalog::new();

    let report = Reconciler::new(&mut store, &source)
        .import_channel(CHANNEL, "https://rutube.ru/channel/32869212/", None, true, 10)
        .await
        .unwrap();

    assert_eq!(report.imported_videos, 1);
    assert_eq!(store.movies.len(), 1);
    assert_eq!(store.links.len(), 2);
}

#[tokio::test]
async fn channel_metadata_is_refreshed_on_reimport() {
    let before = ScriptedSource::new()
        .with_channel_videos(CHANNEL, vec![sample_video("v1", "Видео")])
        .with_channel_info(api_videoteka::ingest::RawChannel {
            channel_id: CHANNEL.to_string(),
            title: Some("Старое имя".to_string()),
            description: None,
            avatar_url: None,
        });
    let after = ScriptedSource::new()
        .with_channel_videos(CHANNEL, vec![sample_video("v1", "Видео")])
        .with_channel_info(api_videoteka::ingest::RawChannel {
            channel_id: CHANNEL.to_string(),
            title: Some("Новое имя".to_string()),
            description: None,
            avatar_url: None,
        });
    let mut store = MemoryCatalog::new();

    Reconciler::new(&mut store, &before)
        .scrape_channel(CHANNEL, 10)
        .await
        .unwrap();
    Reconciler::new(&mut store, &after)
        .scrape_channel(CHANNEL, 10)
        .await
        .unwrap();

    assert_eq!(store.channels.len(), 1);
    let channel_id = store.channel_id_by_key(CHANNEL).unwrap();
    assert_eq!(store.channels[&channel_id].title, "Новое имя");
}

#[tokio::test]
async fn legacy_videos_without_ids_deduplicate_by_source_url() {
    let mut legacy = sample_video("ignored", "Старый импорт");
    legacy.video_id = None;
    legacy.video_url = "https://rutube.ru/video/legacy123/".to_string();

    let source = ScriptedSource::new()
        .with_channel_videos(CHANNEL, vec![legacy.clone(), legacy]);
    let mut store = MemoryCatalog::new();

    let first = Reconciler::new(&mut store, &source)
        .scrape_channel(CHANNEL, 10)
        .await
        .unwrap();
    assert_eq!(first.created, 1);
    assert_eq!(first.updated, 0);
    assert_eq!(store.movies.len(), 1);

    let second = Reconciler::new(&mut store, &source)
        .scrape_channel(CHANNEL, 10)
        .await
        .unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 0);
    assert_eq!(store.movies.len(), 1);
}
