//! Decodes GeoJSON geometries, first from a complete buffer and then from
//! the same document arriving in small chunks.
//!
//! Run with `cargo run --example geometry`.

use curson::reader::*;
use curson::scanner::{JsonScanner, ScannerState};

#[derive(Debug)]
enum Geometry {
    Point { x: f64, y: f64 },
    LineString(Vec<(f64, f64)>),
    Collection(Vec<Geometry>),
}

fn geometry_reader() -> Recursive<Geometry> {
    // 2 or 3 coordinates; the altitude is ignored here
    let position = || {
        array(f64())
            .min_length(2)
            .max_length(3)
            .map(|c: Vec<f64>| (c[0], c[1]))
    };
    recursive(|geometry| {
        tagged("type")
            .variant(
                "Point",
                object((prop("coordinates", position()),), |(x, y)| {
                    Geometry::Point { x, y }
                }),
            )
            .variant(
                "LineString",
                object(
                    (prop("coordinates", array(position()).min_length(2)),),
                    Geometry::LineString,
                ),
            )
            .variant(
                "GeometryCollection",
                object((prop("geometries", array(geometry)),), Geometry::Collection),
            )
    })
}

const JSON: &str = r#"
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

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let reader = geometry_reader();

    // The simple case: the whole document is already in memory
    let geometry = reader.read_str(JSON)?;
    println!("whole buffer: {geometry:?}");

    // The same document in 8-byte chunks. Every pause keeps all progress in
    // the session and the scanner state; nothing is ever re-decoded.
    let mut session = ReadSession::new();
    let mut state = ScannerState::new();
    let mut buf: Vec<u8> = Vec::new();
    let chunks: Vec<&[u8]> = JSON.as_bytes().chunks(8).collect();
    let mut pauses = 0;
    for (index, chunk) in chunks.iter().enumerate() {
        buf.extend_from_slice(chunk);
        let is_final = index == chunks.len() - 1;
        let mut scanner = JsonScanner::resume(&buf, is_final, state);
        match reader.try_read(&mut scanner, &mut session) {
            ReadResult::Value(geometry) => {
                println!("chunked, after {pauses} pauses: {geometry:?}");
                return Ok(());
            }
            ReadResult::Incomplete => {
                pauses += 1;
                let consumed = scanner.bytes_consumed();
                state = scanner.into_state();
                buf.drain(..consumed);
            }
            ReadResult::Error(e) => return Err(e.into()),
        }
    }
    unreachable!("document never completed");
}
