//! Common library module for integration tests
// See https://doc.rust-lang.org/book/ch11-03-test-organization.html#submodules-in-integration-tests

use curson::reader::*;
use curson::scanner::{JsonScanner, ScannerState};

/// A GeoJSON position; the altitude defaults to 0 when the document gives
/// only two coordinates
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y, z: 0.0 }
    }
}

/// The GeoJSON geometry types, including the recursive collection
#[derive(PartialEq, Clone, Debug)]
pub enum Geometry {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
    GeometryCollection(Vec<Geometry>),
}

/// Builds the reader for the GeoJSON geometry schema
///
/// Exercises most of the crate: the discriminated union, recursion, nested
/// arrays with length bounds, defaults via `map` and floating-point scalars.
pub fn geometry_reader() -> Recursive<Geometry> {
    // A position is 2 or 3 numbers; a ring is a closed line, so at least
    // 4 positions
    let position = || {
        array(f64())
            .min_length(2)
            .max_length(3)
            .map(|coordinates: Vec<f64>| Position {
                x: coordinates[0],
                y: coordinates[1],
                z: coordinates.get(2).copied().unwrap_or(0.0),
            })
    };
    let line = move || array(position()).min_length(2);
    let polygon = move || array(array(position()).min_length(4)).min_length(1);

    recursive(|geometry| {
        tagged("type")
            .variant(
                "Point",
                object((prop("coordinates", position()),), Geometry::Point),
            )
            .variant(
                "MultiPoint",
                object(
                    (prop("coordinates", array(position())),),
                    Geometry::MultiPoint,
                ),
            )
            .variant(
                "LineString",
                object((prop("coordinates", line()),), Geometry::LineString),
            )
            .variant(
                "MultiLineString",
                object(
                    (prop("coordinates", array(line())),),
                    Geometry::MultiLineString,
                ),
            )
            .variant(
                "Polygon",
                object((prop("coordinates", polygon()),), Geometry::Polygon),
            )
            .variant(
                "MultiPolygon",
                object(
                    (prop("coordinates", array(polygon())),),
                    Geometry::MultiPolygon,
                ),
            )
            .variant(
                "GeometryCollection",
                object(
                    (prop("geometries", array(geometry)),),
                    Geometry::GeometryCollection,
                ),
            )
    })
}

pub const POINT_JSON: &str = r#"
    {
        "type": "Point",
        "coordinates": [100.0, 0.0]
    }"#;

pub const LINE_STRING_JSON: &str = r#"
    {
        "type": "LineString",
        "coordinates": [
            [100.0, 0.0],
            [101.0, 1.0]
        ]
    }"#;

pub const POLYGON_JSON: &str = r#"
    {
        "type": "Polygon",
        "coordinates": [
            [
                [100.0, 0.0],
                [101.0, 0.0],
                [101.0, 1.0],
                [100.0, 1.0],
                [100.0, 0.0]
            ],
            [
                [100.8, 0.8],
                [100.8, 0.2],
                [100.2, 0.2],
                [100.2, 0.8],
                [100.8, 0.8]
            ]
        ]
    }"#;

pub const MULTI_POINT_JSON: &str = r#"
    {
        "type": "MultiPoint",
        "coordinates": [
            [100.0, 0.0],
            [101.0, 1.0]
        ]
    }"#;

pub const MULTI_LINE_STRING_JSON: &str = r#"
    {
        "type": "MultiLineString",
        "coordinates": [
            [
                [100.0, 0.0],
                [101.0, 1.0]
            ],
            [
                [102.0, 2.0],
                [103.0, 3.0]
            ]
        ]
    }"#;

pub const MULTI_POLYGON_JSON: &str = r#"
    {
        "type": "MultiPolygon",
        "coordinates": [
            [
                [
                    [102.0, 2.0],
                    [103.0, 2.0],
                    [103.0, 3.0],
                    [102.0, 3.0],
                    [102.0, 2.0]
                ]
            ],
            [
                [
                    [100.0, 0.0],
                    [101.0, 0.0],
                    [101.0, 1.0],
                    [100.0, 1.0],
                    [100.0, 0.0]
                ],
                [
                    [100.2, 0.2],
                    [100.2, 0.8],
                    [100.8, 0.8],
                    [100.8, 0.2],
                    [100.2, 0.2]
                ]
            ]
        ]
    }"#;

pub const GEOMETRY_COLLECTION_JSON: &str = r#"
    {
        "type": "GeometryCollection",
        "geometries": [{
            "type": "Point",
            "coordinates": [100.0, 0.0]
        }, {
            "type": "LineString",
            "coordinates": [
                [101.0, 0.0],
                [102.0, 1.0]
            ]
        }]
    }"#;

pub const ALL_GEOMETRY_JSONS: &[&str] = &[
    POINT_JSON,
    LINE_STRING_JSON,
    POLYGON_JSON,
    MULTI_POINT_JSON,
    MULTI_LINE_STRING_JSON,
    MULTI_POLYGON_JSON,
    GEOMETRY_COLLECTION_JSON,
];

/// Decodes the document in the given chunks, pausing on every `Incomplete`
/// and carrying all state over to the next chunk
pub fn read_in_chunks<T, R: JsonReader<T>>(reader: &R, chunks: &[&[u8]]) -> Result<T, ReadError> {
    assert!(!chunks.is_empty());
    let mut session = ReadSession::new();
    let mut state = ScannerState::new();
    let mut buf: Vec<u8> = Vec::new();
    for (index, chunk) in chunks.iter().enumerate() {
        buf.extend_from_slice(chunk);
        let is_final = index == chunks.len() - 1;
        let mut scanner = JsonScanner::resume(&buf, is_final, state);
        match reader.try_read(&mut scanner, &mut session) {
            ReadResult::Value(value) => {
                scanner.finish()?;
                return Ok(value);
            }
            ReadResult::Incomplete => {
                assert!(!is_final, "scanner over final input asked for more data");
                let consumed = scanner.bytes_consumed();
                state = scanner.into_state();
                buf.drain(..consumed);
            }
            ReadResult::Error(e) => return Err(e),
        }
    }
    unreachable!("document neither completed nor failed")
}

/// Splits the document at every byte boundary into two chunks and asserts
/// that each split decodes to the same result as the whole buffer
pub fn assert_split_invariant<T, R>(reader: &R, json: &str)
where
    T: PartialEq + std::fmt::Debug,
    R: JsonReader<T>,
{
    let expected = reader.read_str(json);
    let bytes = json.as_bytes();
    for split in 0..=bytes.len() {
        let (head, tail) = bytes.split_at(split);
        let actual = read_in_chunks(reader, &[head, tail]);
        assert_eq!(expected, actual, "split at byte {split} of {json:?}");
    }
}
