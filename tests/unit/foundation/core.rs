use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(2, 0).is_err());
    assert!(Fps::new(2, 1).is_ok());
}

#[test]
fn default_fps_is_two() {
    let fps = Fps::default();
    assert_eq!(fps, Fps::new(2, 1).unwrap());
    assert!((fps.frame_duration_secs() - 0.5).abs() < 1e-12);
}

#[test]
fn parses_integer_and_rational_text() {
    assert_eq!("2".parse::<Fps>().unwrap(), Fps::new(2, 1).unwrap());
    assert_eq!(" 1/4 ".parse::<Fps>().unwrap(), Fps::new(1, 4).unwrap());
    assert!("0".parse::<Fps>().is_err());
    assert!("-2".parse::<Fps>().is_err());
    assert!("two".parse::<Fps>().is_err());
    assert!("1/0".parse::<Fps>().is_err());
}

#[test]
fn filter_arg_omits_unit_denominator() {
    assert_eq!(Fps::new(2, 1).unwrap().as_filter_arg(), "2");
    assert_eq!(Fps::new(30000, 1001).unwrap().as_filter_arg(), "30000/1001");
    assert_eq!(Fps::new(1, 2).unwrap().to_string(), "1/2");
}

#[test]
fn frames_to_secs_uses_sampling_interval() {
    let fps = Fps::new(1, 2).unwrap();
    assert!((fps.frames_to_secs(3) - 6.0).abs() < 1e-12);
    assert!((fps.as_f64() - 0.5).abs() < 1e-12);
}
