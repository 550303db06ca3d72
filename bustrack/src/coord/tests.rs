use super::*;

#[test]
fn test_new_rejects_out_of_range() {
    assert_eq!(
        Coordinate::new(91.0, 0.0),
        Err(CoordError::InvalidLatitude(91.0))
    );
    assert_eq!(
        Coordinate::new(0.0, -180.5),
        Err(CoordError::InvalidLongitude(-180.5))
    );
    assert!(Coordinate::new(12.9, 77.4).is_ok());
}

#[test]
fn test_parse_lat_lon_pair() {
    let coord: Coordinate = "12.907609, 77.476340".parse().unwrap();
    assert!((coord.latitude - 12.907609).abs() < 1e-9);
    assert!((coord.longitude - 77.476340).abs() < 1e-9);
}

#[test]
fn test_parse_rejects_garbage() {
    assert!(matches!(
        "12.9".parse::<Coordinate>(),
        Err(CoordError::Malformed(_))
    ));
    assert!(matches!(
        "abc,77.4".parse::<Coordinate>(),
        Err(CoordError::Malformed(_))
    ));
    assert!(matches!(
        "95.0,77.4".parse::<Coordinate>(),
        Err(CoordError::InvalidLatitude(_))
    ));
}

#[test]
fn test_display_round_trips_through_parse() {
    let coord = Coordinate::new(-33.865143, 151.2099).unwrap();
    let parsed: Coordinate = coord.to_string().parse().unwrap();
    assert!((parsed.latitude - coord.latitude).abs() < 1e-6);
    assert!((parsed.longitude - coord.longitude).abs() < 1e-6);
}

#[test]
fn test_distance_one_degree_of_latitude() {
    let a = Coordinate::new(0.0, 0.0).unwrap();
    let b = Coordinate::new(1.0, 0.0).unwrap();
    let d = distance_meters(&a, &b);
    // ~111.2 km per degree of latitude
    assert!((d - 111_195.0).abs() < 100.0, "got {}", d);
}

#[test]
fn test_distance_is_zero_for_same_point() {
    let a = Coordinate::new(12.9, 77.4).unwrap();
    assert_eq!(distance_meters(&a, &a), 0.0);
}

#[test]
fn test_interpolate_endpoints_and_midpoint() {
    let a = Coordinate::new(10.0, 20.0).unwrap();
    let b = Coordinate::new(12.0, 24.0).unwrap();

    assert_eq!(interpolate(&a, &b, 0.0), a);
    assert_eq!(interpolate(&a, &b, 1.0), b);
    let mid = interpolate(&a, &b, 0.5);
    assert!((mid.latitude - 11.0).abs() < 1e-12);
    assert!((mid.longitude - 22.0).abs() < 1e-12);
    // Clamped
    assert_eq!(interpolate(&a, &b, 2.0), b);
}
