//! ExtractorConfig, ExtractionRequest, and method parsing tests.

use framesnap::{
    DEFAULT_OUTPUT_DIR, ExtractionError, ExtractionMethod, ExtractionRequest, ExtractorConfig,
    SamplingStrategy, select_strategy,
};

// ── ExtractorConfig builder ────────────────────────────────────────

#[test]
fn config_defaults() {
    let config = ExtractorConfig::default();
    assert_eq!(config.output_dir().to_str(), Some(DEFAULT_OUTPUT_DIR));
    assert_eq!(config.jpeg_quality(), 85);
    assert_eq!(config.auto_scene_threshold(), 300.0);
    assert_eq!(config.min_scene_separation(), 10.0);
    assert_eq!(config.sample_divisor(), 100);
    assert_eq!(config.edge_trim_ratio(), 0.1);
    assert!(config.unique_file_names());
}

#[test]
fn config_debug_hides_callback() {
    let debug = format!("{:?}", ExtractorConfig::new("frames"));
    assert!(debug.contains("ExtractorConfig"));
    assert!(debug.contains("jpeg_quality: 85"));
    assert!(debug.contains(".."));
}

#[test]
fn config_builders() {
    let config = ExtractorConfig::new("a")
        .with_output_dir("b")
        .with_jpeg_quality(92)
        .with_auto_scene_threshold(120.0)
        .with_min_scene_separation(4.5)
        .with_sample_divisor(50)
        .with_edge_trim_ratio(0.2)
        .with_unique_file_names(false);
    assert_eq!(config.output_dir().to_str(), Some("b"));
    assert_eq!(config.jpeg_quality(), 92);
    assert_eq!(config.auto_scene_threshold(), 120.0);
    assert_eq!(config.min_scene_separation(), 4.5);
    assert_eq!(config.sample_divisor(), 50);
    assert_eq!(config.edge_trim_ratio(), 0.2);
    assert!(!config.unique_file_names());
}

#[test]
fn config_clamps_out_of_range_values() {
    let config = ExtractorConfig::new("frames")
        .with_jpeg_quality(0)
        .with_sample_divisor(0)
        .with_edge_trim_ratio(0.9)
        .with_min_scene_separation(-1.0);
    assert_eq!(config.jpeg_quality(), 1);
    assert_eq!(config.sample_divisor(), 1);
    assert!(config.edge_trim_ratio() < 0.5);
    assert_eq!(config.min_scene_separation(), 0.0);

    assert_eq!(ExtractorConfig::new("f").with_jpeg_quality(200).jpeg_quality(), 100);
}

// ── ExtractionRequest ──────────────────────────────────────────────

#[test]
fn request_defaults_to_auto_with_four_frames() {
    let request = ExtractionRequest::default();
    assert_eq!(request.method, ExtractionMethod::Auto);
    assert_eq!(request.frame_count, 4);
    assert_eq!(request.title, None);
}

#[test]
fn request_with_title() {
    let request = ExtractionRequest::new(ExtractionMethod::Scene, 6).with_title("Demo");
    assert_eq!(request.method, ExtractionMethod::Scene);
    assert_eq!(request.frame_count, 6);
    assert_eq!(request.title.as_deref(), Some("Demo"));
}

// ── ExtractionMethod parsing ───────────────────────────────────────

#[test]
fn method_parses_case_insensitively() {
    assert_eq!("time".parse::<ExtractionMethod>().unwrap(), ExtractionMethod::Time);
    assert_eq!(" Scene ".parse::<ExtractionMethod>().unwrap(), ExtractionMethod::Scene);
    assert_eq!("AUTO".parse::<ExtractionMethod>().unwrap(), ExtractionMethod::Auto);
}

#[test]
fn unknown_method_is_an_invalid_request() {
    let error = "keyframes".parse::<ExtractionMethod>().unwrap_err();
    assert!(matches!(error, ExtractionError::InvalidRequest(_)));
    assert!(error.to_string().contains("keyframes"));
}

#[test]
fn method_display_round_trips() {
    for method in [ExtractionMethod::Time, ExtractionMethod::Scene, ExtractionMethod::Auto] {
        assert_eq!(method.to_string().parse::<ExtractionMethod>().unwrap(), method);
    }
    assert_eq!(SamplingStrategy::Scene.to_string(), "scene");
}

// ── select_strategy ────────────────────────────────────────────────

#[test]
fn auto_threshold_is_strict() {
    assert_eq!(select_strategy(ExtractionMethod::Auto, 299.0, 300.0), SamplingStrategy::Time);
    assert_eq!(select_strategy(ExtractionMethod::Auto, 300.0, 300.0), SamplingStrategy::Time);
    assert_eq!(select_strategy(ExtractionMethod::Auto, 301.0, 300.0), SamplingStrategy::Scene);
}

#[test]
fn explicit_methods_ignore_duration() {
    assert_eq!(select_strategy(ExtractionMethod::Time, 7200.0, 300.0), SamplingStrategy::Time);
    assert_eq!(select_strategy(ExtractionMethod::Scene, 2.0, 300.0), SamplingStrategy::Scene);
}
