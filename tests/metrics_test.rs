use qnap_exporter::metrics::{MetricsCollector, VolumeFamily, VolumeLabels};

/// True if some sample line of `family` carries every label and `value`
fn has_sample(rendered: &str, family: &str, labels: &[&str], value: &str) -> bool {
    rendered.lines().any(|line| {
        line.starts_with(&format!("{}{{", family))
            && labels.iter().all(|l| line.contains(l))
            && line.ends_with(&format!(" {}", value))
    })
}

#[test]
fn test_metrics_registration() {
    // Verify that all metrics can be created and registered without panicking
    let metrics = MetricsCollector::new().expect("Failed to create metrics collector");

    // Test that we can render metrics (even if empty)
    let rendered = metrics.render();
    assert!(rendered.is_ok(), "Failed to render metrics");
}

#[test]
fn test_volume_families_render_with_labels() {
    let metrics = MetricsCollector::new().expect("Failed to create metrics collector");
    let labels = VolumeLabels::new("vol1", "GB", "nas-a");

    metrics.set_volume(VolumeFamily::FreeSize, &labels, 10.0);
    metrics.set_volume(VolumeFamily::UsedSize, &labels, 5.0);
    metrics.set_volume(VolumeFamily::Capacity, &labels, 15.0);

    let rendered = metrics.render().unwrap();
    let labels = ["volume_name=\"vol1\"", "unit=\"GB\"", "host=\"nas-a\""];
    assert!(has_sample(&rendered, "qnap_volume_free_size", &labels, "10"));
    assert!(has_sample(&rendered, "qnap_volume_used_size", &labels, "5"));
    assert!(has_sample(&rendered, "qnap_volume_capacity", &labels, "15"));
}

#[test]
fn test_latest_write_wins() {
    let metrics = MetricsCollector::new().expect("Failed to create metrics collector");
    let labels = VolumeLabels::new("vol1", "GB", "nas-a");

    metrics.set_volume(VolumeFamily::FreeSize, &labels, 10.0);
    metrics.set_volume(VolumeFamily::FreeSize, &labels, 7.0);

    assert_eq!(
        metrics.volume_value(VolumeFamily::FreeSize, &labels),
        Some(7.0)
    );
    let rendered = metrics.render().unwrap();
    assert_eq!(rendered.matches("volume_name=\"vol1\"").count(), 1);
}

#[test]
fn test_same_volume_on_different_hosts_does_not_collide() {
    let metrics = MetricsCollector::new().expect("Failed to create metrics collector");
    let a = VolumeLabels::new("vol1", "GB", "nas-a");
    let b = VolumeLabels::new("vol1", "GB", "nas-b");

    metrics.set_volume(VolumeFamily::Capacity, &a, 1.0);
    metrics.set_volume(VolumeFamily::Capacity, &b, 2.0);

    assert_eq!(metrics.volume_value(VolumeFamily::Capacity, &a), Some(1.0));
    assert_eq!(metrics.volume_value(VolumeFamily::Capacity, &b), Some(2.0));
}

#[test]
fn test_unwritten_series_has_no_value() {
    let metrics = MetricsCollector::new().expect("Failed to create metrics collector");
    let labels = VolumeLabels::new("ghost", "GB", "nas-a");

    assert_eq!(metrics.volume_value(VolumeFamily::FreeSize, &labels), None);

    // Looking it up must not create the series
    let rendered = metrics.render().unwrap();
    assert!(!rendered.contains("ghost"));
}

#[test]
fn test_evict_stale_only_touches_one_host() {
    let metrics = MetricsCollector::new().expect("Failed to create metrics collector");
    let a = VolumeLabels::new("vol1", "GB", "nas-a");
    let b = VolumeLabels::new("vol1", "GB", "nas-b");
    metrics.set_volume(VolumeFamily::FreeSize, &a, 1.0);
    metrics.set_volume(VolumeFamily::FreeSize, &b, 2.0);

    let removed = metrics.evict_stale("nas-a", &Default::default());

    assert_eq!(removed, 1);
    assert_eq!(metrics.volume_value(VolumeFamily::FreeSize, &a), None);
    assert_eq!(metrics.volume_value(VolumeFamily::FreeSize, &b), Some(2.0));
}

#[test]
fn test_up_and_cycle_gauges() {
    let metrics = MetricsCollector::new().expect("Failed to create metrics collector");

    metrics.set_up("nas-a", true);
    metrics.set_session_check_cycles("nas-a", 4);

    assert!(metrics.is_up("nas-a"));
    let rendered = metrics.render().unwrap();
    assert!(rendered.contains("qnap_up{host=\"nas-a\"} 1"));
    assert!(rendered.contains("qnap_session_check_cycles{host=\"nas-a\"} 4"));

    metrics.set_up("nas-a", false);
    assert!(!metrics.is_up("nas-a"));
}
