//! HTTP probing against a local static file server.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;

use hymnal::config::Settings;
use hymnal::http_client::HttpClient;
use hymnal::models::AssetPath;
use hymnal::probe::{HttpProbe, Probe, ProbeOutcome};
use hymnal::{ProbeStrategy, Session};

const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];

fn write_image(root: &Path, folder: &str, file: &str) {
    let dir = root.join("images").join(folder);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(file), JPEG_HEADER).unwrap();
}

/// A JPEG with no Content-Type, sent as a two-byte chunk followed by the rest.
async fn streamed_jpeg() -> Response {
    let chunks = futures::stream::unfold(0usize, |sent| async move {
        match sent {
            0 => Some((Ok::<_, std::io::Error>(Bytes::from_static(&JPEG_HEADER[..2])), 1)),
            1 => {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Some((Ok(Bytes::from_static(&JPEG_HEADER[2..])), 2))
            }
            _ => None,
        }
    });
    Response::new(Body::from_stream(chunks))
}

async fn serve(root: &Path) -> SocketAddr {
    let app = Router::new()
        .route(
            "/limited/images/:folder/:file",
            get(|| async { StatusCode::TOO_MANY_REQUESTS }),
        )
        .route("/images/streamed/:file", get(streamed_jpeg))
        .fallback_service(ServeDir::new(root));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client() -> HttpClient {
    HttpClient::builder("test", Duration::from_secs(5), Duration::ZERO)
        .build()
        .unwrap()
}

#[tokio::test]
async fn probe_finds_served_images_only() {
    let dir = tempfile::tempdir().unwrap();
    write_image(dir.path(), "chansongga", "100.jpg");
    write_image(dir.path(), "chansongga", "찬송가 200.jpg");
    let addr = serve(dir.path()).await;

    let probe = HttpProbe::new(client(), &format!("http://{}", addr), "images").unwrap();

    assert_eq!(
        probe.probe(&AssetPath::new("chansongga", "100.jpg")).await,
        ProbeOutcome::Found
    );
    assert_eq!(
        probe.probe(&AssetPath::new("chansongga", "찬송가 200.jpg")).await,
        ProbeOutcome::Found
    );
    assert_eq!(
        probe.probe(&AssetPath::new("chansongga", "101.jpg")).await,
        ProbeOutcome::NotFound
    );
}

#[tokio::test]
async fn throttled_answer_is_not_found_and_widens_pacing() {
    let dir = tempfile::tempdir().unwrap();
    let addr = serve(dir.path()).await;

    let client = client();
    let probe = HttpProbe::new(client.clone(), &format!("http://{}/limited/", addr), "images").unwrap();

    assert_eq!(
        probe.probe(&AssetPath::new("chansongga", "1.jpg")).await,
        ProbeOutcome::NotFound
    );

    let state = client.rate_limiter().host_state("127.0.0.1").await.unwrap();
    assert!(state.in_backoff);
    assert_eq!(state.rate_limit_hits, 1);
    assert_eq!(state.current_delay_ms, 250);
}

#[tokio::test]
async fn untyped_body_split_across_chunks_is_sniffed() {
    let dir = tempfile::tempdir().unwrap();
    let addr = serve(dir.path()).await;

    let probe = HttpProbe::new(client(), &format!("http://{}", addr), "images").unwrap();
    assert_eq!(
        probe.probe(&AssetPath::new("streamed", "1.jpg")).await,
        ProbeOutcome::Found
    );
}

#[tokio::test]
async fn unreachable_server_reads_as_not_found() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let probe = HttpProbe::new(client(), &format!("http://{}", addr), "images").unwrap();
    assert_eq!(
        probe.probe(&AssetPath::new("chansongga", "1.jpg")).await,
        ProbeOutcome::NotFound
    );
}

#[tokio::test]
async fn session_search_over_http() {
    let dir = tempfile::tempdir().unwrap();
    write_image(dir.path(), "chansongga", "200-201.jpeg");
    write_image(dir.path(), "chansongga", "202.jpg");
    write_image(dir.path(), "chansongga", "202-1.jpg");
    let addr = serve(dir.path()).await;

    for strategy in [ProbeStrategy::Sequential, ProbeStrategy::Parallel] {
        let settings = Settings {
            base_url: format!("http://{}/", addr),
            strategy,
            ..Settings::default()
        };
        let probe = settings.build_probe().unwrap();
        let resolver = settings.resolver_with_probe(Arc::clone(&probe));
        let mut session = Session::new(
            settings.registry.clone(),
            Arc::new(resolver),
            settings.session_options(),
        )
        .unwrap();

        let report = session.search(201).await.unwrap();
        assert_eq!(report.key, 200);
        assert_eq!(report.resolution.covered(), 200..=201);

        let next = report.next.unwrap();
        assert_eq!(next.number, 202);
        assert_eq!(next.continuations, vec![AssetPath::new("chansongga", "202-1.jpg")]);

        let slot = session.visible_slot_for(200).unwrap();
        let url = probe.locate(&slot.images()[0].path);
        assert_eq!(url, format!("http://{}/images/chansongga/200-201.jpeg", addr));
    }
}

#[tokio::test]
async fn paced_parallel_candidates_are_not_cut_off_by_the_deadline() {
    let dir = tempfile::tempdir().unwrap();
    write_image(dir.path(), "chansongga", "100-101.jpg");
    let addr = serve(dir.path()).await;

    // The hit is the sixth candidate: its request waits 2s for a pacing slot,
    // longer than the per-request deadline.
    let settings = Settings {
        base_url: format!("http://{}/", addr),
        strategy: ProbeStrategy::Parallel,
        request_delay_ms: 400,
        probe_timeout_ms: 1500,
        lookahead: false,
        ..Settings::default()
    };
    let probe = settings.build_probe().unwrap();
    let resolver = settings.resolver_with_probe(probe);
    let mut session = Session::new(
        settings.registry.clone(),
        Arc::new(resolver),
        settings.session_options(),
    )
    .unwrap();

    let report = session.search(100).await.unwrap();
    assert!(report.resolution.is_found());
    assert_eq!(report.resolution.covered(), 100..=101);
    assert_eq!(report.key, 100);
}
