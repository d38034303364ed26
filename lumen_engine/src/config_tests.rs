use super::*;

#[test]
fn test_default_config_is_valid() {
    assert!(EngineConfig::default().validate().is_ok());
}

#[test]
fn test_frames_in_flight_range() {
    for frames in [0, 1, 4] {
        let config = EngineConfig { frames_in_flight: frames, ..Default::default() };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))), "{} accepted", frames);
    }
    for frames in [2, 3] {
        let config = EngineConfig { frames_in_flight: frames, ..Default::default() };
        assert!(config.validate().is_ok());
    }
}

#[test]
fn test_zero_surface_rejected() {
    let config = EngineConfig { width: 0, ..Default::default() };
    assert!(config.validate().is_err());
}

#[test]
fn test_cascade_count_range() {
    let mut config = EngineConfig::default();
    config.shadows.cascade_count = 5;
    assert!(config.validate().is_err());
    config.shadows.cascade_count = 0;
    assert!(config.validate().is_err());
    config.shadows.cascade_count = 4;
    assert!(config.validate().is_ok());
}

#[test]
fn test_post_effects_default() {
    let passes = PassConfig::default();
    assert!(passes.post_effects.contains(PostEffects::BLOOM));
    assert!(!passes.post_effects.contains(PostEffects::OUTLINE));
}
