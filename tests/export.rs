use std::sync::Arc;
use std::time::Duration;

use adforge_lib::config::ExportConfig;
use adforge_lib::testing::{
    sample_carousel, sample_creatives, MemorySink, StubImageLoader, StubRasterizer,
};
use adforge_lib::{
    ActiveCreative, AspectRatio, ErrorCategory, ExportDriver, InlineMedia, SlideStatusMap,
    WorkspaceState,
};

fn quick_config() -> ExportConfig {
    ExportConfig {
        paint_delay: Duration::from_millis(1),
        settle_delay: Duration::from_millis(1),
        image_load_timeout: Duration::from_millis(50),
        single_slide_image_load_timeout: Duration::from_millis(50),
        ..ExportConfig::default()
    }
}

fn driver(
    rasterizer: StubRasterizer,
    loader: StubImageLoader,
    sink: MemorySink,
    statuses: SlideStatusMap,
) -> ExportDriver {
    ExportDriver::new(
        Arc::new(rasterizer),
        Arc::new(loader),
        Arc::new(sink),
        statuses,
        quick_config(),
    )
}

#[tokio::test]
async fn stuck_slide_does_not_halt_the_batch() {
    let mut carousel = sample_carousel(5);
    let stuck_url = InlineMedia::from_bytes(b"slide three", "image/png").data_url();
    carousel.slides[2].image_url = stuck_url.clone();
    let stuck_id = carousel.slides[2].id.clone();

    let sink = MemorySink::new();
    let statuses = SlideStatusMap::new();
    let export = driver(
        StubRasterizer::new().fail_for_image(&stuck_url),
        StubImageLoader::new().never_load(&stuck_url),
        sink.clone(),
        statuses.clone(),
    );

    let report = export.download_all_slides(&carousel, None).await;

    assert_eq!(
        sink.names(),
        vec!["slide-1.png", "slide-2.png", "slide-4.png", "slide-5.png"]
    );
    assert_eq!(report.files.len(), 4);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].position, 3);
    assert_eq!(report.failures[0].slide_id, stuck_id);
    assert_eq!(report.failures[0].category, ErrorCategory::Render);
    assert!(report.last_error.is_some());
    assert!(!report.is_success());
    assert!(!statuses.status(&stuck_id).is_downloading);
}

#[tokio::test]
async fn slide_files_follow_current_order() {
    let mut carousel = sample_carousel(3);
    carousel.slides.swap(0, 2);
    let sink = MemorySink::new();
    let rasterizer = StubRasterizer::new();
    let export = driver(
        rasterizer.clone(),
        StubImageLoader::new(),
        sink.clone(),
        SlideStatusMap::new(),
    );

    let report = export.download_all_slides(&carousel, None).await;
    assert!(report.is_success());
    assert_eq!(report.files[0].slide_id.as_deref(), Some(carousel.slides[0].id.as_str()));
    assert_eq!(report.files[0].name, "slide-1.png");
    assert_eq!(sink.bytes("slide-1.png").unwrap(), b"PNG 960x1200");
    assert!(rasterizer
        .captured()
        .iter()
        .all(|scene| scene.nodes.iter().all(|node| !node.is_toolbar())));
}

#[tokio::test]
async fn single_slide_export_uses_position_and_rejects_unknown_ids() {
    let carousel = sample_carousel(4);
    let sink = MemorySink::new();
    let export = driver(
        StubRasterizer::new(),
        StubImageLoader::new(),
        sink.clone(),
        SlideStatusMap::new(),
    );

    let report = export
        .download_one_slide(&carousel, &carousel.slides[2].id)
        .await
        .unwrap();
    assert_eq!(report.files[0].name, "slide-3.png");
    assert_eq!(report.files[0].position, Some(3));

    assert!(export.download_one_slide(&carousel, "slide-missing").await.is_err());
}

#[tokio::test]
async fn active_export_compensates_for_preview_zoom() {
    let creative = sample_creatives(1).remove(0);
    let state = WorkspaceState {
        active: Some(ActiveCreative::Single(creative.clone())),
        aspect_ratio: AspectRatio::Story,
        preview_zoom: 0.5,
        ..WorkspaceState::default()
    };
    let sink = MemorySink::new();
    let export = driver(
        StubRasterizer::new(),
        StubImageLoader::new(),
        sink.clone(),
        SlideStatusMap::new(),
    );

    let report = export.download_active(&state).await.unwrap();
    let name = format!("ad-creative-{}-9x16.png", creative.id);
    assert_eq!(report.files[0].name, name);
    // 2.0 / 0.5 = 4x the 338x601 logical canvas.
    assert_eq!(sink.bytes(&name).unwrap(), b"PNG 1352x2404");
}

#[tokio::test]
async fn active_export_requires_a_single_creative() {
    let state = WorkspaceState {
        active: Some(ActiveCreative::Carousel(sample_carousel(2))),
        ..WorkspaceState::default()
    };
    let export = driver(
        StubRasterizer::new(),
        StubImageLoader::new(),
        MemorySink::new(),
        SlideStatusMap::new(),
    );
    assert!(export.download_active(&state).await.is_err());
}
