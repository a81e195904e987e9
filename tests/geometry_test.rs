//! End-to-end tests decoding the GeoJSON geometry schema
//!
//! The schema combines nearly everything: a discriminated union, recursion,
//! nested arrays with length bounds and scalar conversions. See
//! [`test_lib::geometry_reader`] for the reader definition.

mod test_lib;

use curson::reader::*;
use test_lib::*;

fn pos(x: f64, y: f64) -> Position {
    Position::new(x, y)
}

#[test]
fn decodes_point() {
    assert_eq!(
        Geometry::Point(pos(100.0, 0.0)),
        geometry_reader().read_str(POINT_JSON).unwrap()
    );
}

#[test]
fn decodes_line_string() {
    assert_eq!(
        Geometry::LineString(vec![pos(100.0, 0.0), pos(101.0, 1.0)]),
        geometry_reader().read_str(LINE_STRING_JSON).unwrap()
    );
}

#[test]
fn decodes_polygon() {
    assert_eq!(
        Geometry::Polygon(vec![
            vec![
                pos(100.0, 0.0),
                pos(101.0, 0.0),
                pos(101.0, 1.0),
                pos(100.0, 1.0),
                pos(100.0, 0.0),
            ],
            vec![
                pos(100.8, 0.8),
                pos(100.8, 0.2),
                pos(100.2, 0.2),
                pos(100.2, 0.8),
                pos(100.8, 0.8),
            ],
        ]),
        geometry_reader().read_str(POLYGON_JSON).unwrap()
    );
}

#[test]
fn decodes_multi_point() {
    assert_eq!(
        Geometry::MultiPoint(vec![pos(100.0, 0.0), pos(101.0, 1.0)]),
        geometry_reader().read_str(MULTI_POINT_JSON).unwrap()
    );
}

#[test]
fn decodes_multi_line_string() {
    assert_eq!(
        Geometry::MultiLineString(vec![
            vec![pos(100.0, 0.0), pos(101.0, 1.0)],
            vec![pos(102.0, 2.0), pos(103.0, 3.0)],
        ]),
        geometry_reader().read_str(MULTI_LINE_STRING_JSON).unwrap()
    );
}

#[test]
fn decodes_multi_polygon() {
    assert_eq!(
        Geometry::MultiPolygon(vec![
            vec![vec![
                pos(102.0, 2.0),
                pos(103.0, 2.0),
                pos(103.0, 3.0),
                pos(102.0, 3.0),
                pos(102.0, 2.0),
            ]],
            vec![
                vec![
                    pos(100.0, 0.0),
                    pos(101.0, 0.0),
                    pos(101.0, 1.0),
                    pos(100.0, 1.0),
                    pos(100.0, 0.0),
                ],
                vec![
                    pos(100.2, 0.2),
                    pos(100.2, 0.8),
                    pos(100.8, 0.8),
                    pos(100.8, 0.2),
                    pos(100.2, 0.2),
                ],
            ],
        ]),
        geometry_reader().read_str(MULTI_POLYGON_JSON).unwrap()
    );
}

#[test]
fn decodes_geometry_collection() {
    assert_eq!(
        Geometry::GeometryCollection(vec![
            Geometry::Point(pos(100.0, 0.0)),
            Geometry::LineString(vec![pos(101.0, 0.0), pos(102.0, 1.0)]),
        ]),
        geometry_reader().read_str(GEOMETRY_COLLECTION_JSON).unwrap()
    );
}

#[test]
fn altitude_is_kept_or_defaulted() {
    let reader = geometry_reader();
    assert_eq!(
        Geometry::Point(Position {
            x: 100.0,
            y: 0.0,
            z: 7.5
        }),
        reader
            .read_str(r#"{"type": "Point", "coordinates": [100.0, 0.0, 7.5]}"#)
            .unwrap()
    );
    assert_eq!(
        Geometry::Point(Position {
            x: 100.0,
            y: 0.0,
            z: 0.0
        }),
        reader
            .read_str(r#"{"type": "Point", "coordinates": [100.0, 0.0]}"#)
            .unwrap()
    );
}

#[test]
fn position_needs_two_or_three_coordinates() {
    let reader = geometry_reader();
    assert!(matches!(
        reader.read_str(r#"{"type": "Point", "coordinates": [100.0]}"#),
        Err(ReadError::SchemaViolation { .. })
    ));
    assert!(matches!(
        reader.read_str(r#"{"type": "Point", "coordinates": [1.0, 2.0, 3.0, 4.0]}"#),
        Err(ReadError::SchemaViolation { .. })
    ));
}

#[test]
fn line_needs_two_points() {
    assert!(matches!(
        geometry_reader().read_str(r#"{"type": "LineString", "coordinates": [[100.0, 0.0]]}"#),
        Err(ReadError::SchemaViolation { .. })
    ));
}

#[test]
fn polygon_ring_needs_four_positions() {
    let open_ring = r#"
        {
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [0.0, 0.0]]]
        }"#;
    assert!(matches!(
        geometry_reader().read_str(open_ring),
        Err(ReadError::SchemaViolation { .. })
    ));
}

#[test]
fn unknown_geometry_type() {
    assert!(matches!(
        geometry_reader().read_str(r#"{"type": "Circle", "coordinates": [0.0, 0.0]}"#),
        Err(ReadError::MalformedValue { .. })
    ));
}

#[test]
fn missing_coordinates() {
    assert!(matches!(
        geometry_reader().read_str(r#"{"type": "Point"}"#),
        Err(ReadError::SchemaViolation { .. })
    ));
}

/// Extra members are allowed; real GeoJSON carries `bbox` and friends
#[test]
fn extra_members_are_skipped() {
    assert_eq!(
        Geometry::Point(pos(100.0, 0.0)),
        geometry_reader()
            .read_str(
                r#"{"type": "Point", "bbox": [100.0, 0.0, 100.0, 0.0], "coordinates": [100.0, 0.0]}"#
            )
            .unwrap()
    );
}

/// Every sample decodes to the same value regardless of where the document
/// is split in two
#[test]
fn chunking_invariance() {
    let reader = geometry_reader();
    for json in ALL_GEOMETRY_JSONS {
        assert_split_invariant(&reader, json);
    }
}

#[test]
fn decodes_from_io_source() {
    let reader = geometry_reader();
    for json in ALL_GEOMETRY_JSONS {
        assert_eq!(
            reader.read_str(json).unwrap(),
            reader.read_from(json.as_bytes()).unwrap()
        );
    }
}

#[test]
fn decodes_array_of_geometries_in_chunks() {
    let joined = format!("[{}]", ALL_GEOMETRY_JSONS.join(","));
    let reader = array(geometry_reader());
    let whole = reader.read_str(&joined).unwrap();
    assert_eq!(7, whole.len());

    let chunks: Vec<&[u8]> = joined.as_bytes().chunks(17).collect();
    assert_eq!(whole, read_in_chunks(&reader, &chunks).unwrap());
}
