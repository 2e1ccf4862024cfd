//! Wire protocol for Rust <-> engine communication
//!
//! Requests are externally-tagged JSON objects, one per line:
//! `{"Domineering": {...}}` or `{"Snort": {...}}`.
//! Every response is `{"canonical_form": "...", "temperature": "..."}`.
//!
//! Field sets differ between protocol versions:
//!
//! | version | Domineering | Snort |
//! |---|---|---|
//! | V1 | `width`, `height`, `grid` | `size`, `adjacency_matrix` |
//! | V2 | `grid` | `adjacency_matrix`, `vertices` |

use cgt_core::{
    CgtError, DomineeringRequest, EngineFailure, GameValue, ProtocolVersion, Request, Result,
    SnortRequest, VertexColor,
};
use serde::Serialize;
use std::borrow::Cow;

/// Request as it appears on the wire
#[derive(Debug, Serialize)]
enum WireRequest<'a> {
    Domineering(DomineeringFields<'a>),
    Snort(SnortFields<'a>),
}

#[derive(Debug, Serialize)]
struct DomineeringFields<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
    grid: &'a str,
}

#[derive(Debug, Serialize)]
struct SnortFields<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<usize>,
    adjacency_matrix: &'a [bool],
    #[serde(skip_serializing_if = "Option::is_none")]
    vertices: Option<Cow<'a, [VertexColor]>>,
}

/// Encode any request as one line of JSON, without the terminator
pub fn encode_request(version: ProtocolVersion, request: &Request) -> Result<Vec<u8>> {
    match request {
        Request::Domineering(request) => encode_domineering(version, request),
        Request::Snort(request) => encode_snort(version, request),
    }
}

/// Encode a Domineering request. The grid is checked before anything is written.
pub fn encode_domineering(
    version: ProtocolVersion,
    request: &DomineeringRequest,
) -> Result<Vec<u8>> {
    request.validate()?;
    let fields = match version {
        ProtocolVersion::V1 => DomineeringFields {
            width: Some(request.width()),
            height: Some(request.height()),
            grid: request.grid(),
        },
        ProtocolVersion::V2 => DomineeringFields {
            width: None,
            height: None,
            grid: request.grid(),
        },
    };
    serialize(&WireRequest::Domineering(fields))
}

/// Encode a Snort request. The matrix must have a perfect-square length.
pub fn encode_snort(version: ProtocolVersion, request: &SnortRequest) -> Result<Vec<u8>> {
    let size = request.vertex_count()?;
    let vertices = request.vertices()?;
    let fields = match version {
        ProtocolVersion::V1 => {
            if let Some(color) = vertices.iter().find(|c| **c != VertexColor::Empty) {
                return Err(CgtError::Encoding(format!(
                    "protocol v1 cannot carry vertex color {:?}",
                    color
                )));
            }
            SnortFields {
                size: Some(size),
                adjacency_matrix: request.adjacency_matrix(),
                vertices: None,
            }
        }
        ProtocolVersion::V2 => SnortFields {
            size: None,
            adjacency_matrix: request.adjacency_matrix(),
            vertices: Some(vertices),
        },
    };
    serialize(&WireRequest::Snort(fields))
}

fn serialize(request: &WireRequest<'_>) -> Result<Vec<u8>> {
    serde_json::to_vec(request).map_err(|e| CgtError::Encoding(e.to_string()))
}

/// Decode one response line (terminator already stripped)
pub fn decode_response(line: &[u8]) -> Result<GameValue> {
    let text = std::str::from_utf8(line)
        .map_err(|e| CgtError::Decoding(format!("response is not UTF-8: {}", e)))?;

    if let Some(failure) = EngineFailure::from_marker(text) {
        return Err(CgtError::Engine(failure));
    }

    serde_json::from_str(text).map_err(|e| {
        let preview: String = text.chars().take(200).collect();
        CgtError::Decoding(format!("{} in response '{}'", e, preview))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgt_core::Temperature;
    use serde_json::json;

    #[test]
    fn test_domineering_v1_format() {
        let request = DomineeringRequest::new(2, 3, "..|.#|#.");
        let bytes = encode_domineering(ProtocolVersion::V1, &request).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"Domineering":{"width":2,"height":3,"grid":"..|.#|#."}}"#
        );
    }

    #[test]
    fn test_domineering_v2_format() {
        let request = DomineeringRequest::from_grid("..#|.#.|##.");
        let bytes = encode_domineering(ProtocolVersion::V2, &request).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"Domineering":{"grid":"..#|.#.|##."}}"#
        );
    }

    #[test]
    fn test_domineering_rejects_bad_grid() {
        let request = DomineeringRequest::new(3, 2, "...|..");
        let err = encode_domineering(ProtocolVersion::V2, &request).unwrap_err();
        assert!(matches!(err, CgtError::Encoding(_)));
    }

    #[test]
    fn test_snort_v2_defaults_vertices_to_empty() {
        let request = SnortRequest::new(vec![
            false, false, false, //
            false, false, true, //
            false, true, false,
        ]);
        let bytes = encode_snort(ProtocolVersion::V2, &request).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            value,
            json!({
                "Snort": {
                    "adjacency_matrix": [false, false, false, false, false, true, false, true, false],
                    "vertices": [0, 0, 0]
                }
            })
        );
    }

    #[test]
    fn test_snort_v2_colors() {
        let request = SnortRequest::new(vec![false, true, true, false]).with_vertices(vec![
            VertexColor::TintBlue,
            VertexColor::Red,
        ]);
        let bytes = encode_snort(ProtocolVersion::V2, &request).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["Snort"]["vertices"], json!([1, 4]));
    }

    #[test]
    fn test_snort_v1_format() {
        let request = SnortRequest::new(vec![false, true, true, false]);
        let bytes = encode_snort(ProtocolVersion::V1, &request).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"Snort":{"size":2,"adjacency_matrix":[false,true,true,false]}}"#
        );
    }

    #[test]
    fn test_snort_v1_rejects_colors() {
        let request = SnortRequest::new(vec![false; 4])
            .with_vertices(vec![VertexColor::Empty, VertexColor::Blue]);
        let err = encode_snort(ProtocolVersion::V1, &request).unwrap_err();
        assert!(matches!(err, CgtError::Encoding(_)));

        // Explicit all-empty coloring is representable
        let request = SnortRequest::new(vec![false; 4])
            .with_vertices(vec![VertexColor::Empty, VertexColor::Empty]);
        assert!(encode_snort(ProtocolVersion::V1, &request).is_ok());
    }

    #[test]
    fn test_snort_rejects_non_square_matrix() {
        let request = SnortRequest::new(vec![false; 5]);
        for version in [ProtocolVersion::V1, ProtocolVersion::V2] {
            let err = encode_snort(version, &request).unwrap_err();
            assert!(matches!(err, CgtError::Encoding(_)));
        }
    }

    #[test]
    fn test_encoding_preserves_caller_values() {
        let matrix = vec![
            false, true, false, true, //
            true, false, true, false, //
            false, true, false, true, //
            true, false, true, false,
        ];
        let colors = vec![
            VertexColor::Empty,
            VertexColor::TintRed,
            VertexColor::Blue,
            VertexColor::TintBlue,
        ];
        let request =
            Request::from(SnortRequest::new(matrix.clone()).with_vertices(colors.clone()));
        let bytes = encode_request(ProtocolVersion::V2, &request).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let fields = value["Snort"].as_object().unwrap();
        assert_eq!(fields.len(), 2);
        let decoded_matrix: Vec<bool> =
            serde_json::from_value(fields["adjacency_matrix"].clone()).unwrap();
        let decoded_colors: Vec<VertexColor> =
            serde_json::from_value(fields["vertices"].clone()).unwrap();
        assert_eq!(decoded_matrix, matrix);
        assert_eq!(decoded_colors, colors);
    }

    #[test]
    fn test_encoded_line_has_no_newline() {
        let request = Request::from(DomineeringRequest::empty(8, 8));
        let bytes = encode_request(ProtocolVersion::V1, &request).unwrap();
        assert!(!bytes.contains(&b'\n'));
    }

    #[test]
    fn test_decode_response() {
        let value = decode_response(br#"{"canonical_form":"*","temperature":"0"}"#).unwrap();
        assert_eq!(value.canonical_form(), "*");
        assert_eq!(value.temperature(), Temperature::from(0));

        let value =
            decode_response(br#"{"canonical_form":"{1|-1}","temperature":"1","extra":true}"#)
                .unwrap();
        assert_eq!(value.temperature(), Temperature::from(1));
    }

    #[test]
    fn test_decode_failures() {
        assert!(matches!(
            decode_response(b"not json").unwrap_err(),
            CgtError::Decoding(_)
        ));
        assert!(matches!(
            decode_response(br#"{"canonical_form":"*"}"#).unwrap_err(),
            CgtError::Decoding(_)
        ));
        assert!(matches!(
            decode_response(br#"{"canonical_form":"*","temperature":"hot"}"#).unwrap_err(),
            CgtError::Decoding(_)
        ));
        assert!(matches!(
            decode_response(br#"{"canonical_form":"*","temperature":"1.5e-2147483648"}"#)
                .unwrap_err(),
            CgtError::Decoding(_)
        ));
        assert!(matches!(
            decode_response(r#"{"canonical_form":"*","temperature":"-∞"}"#.as_bytes())
                .unwrap_err(),
            CgtError::Decoding(_)
        ));
        assert!(matches!(
            decode_response(b"[1,2]").unwrap_err(),
            CgtError::Decoding(_)
        ));
        assert!(matches!(
            decode_response(&[0xff, 0xfe]).unwrap_err(),
            CgtError::Decoding(_)
        ));
    }

    #[test]
    fn test_decode_engine_markers() {
        assert!(matches!(
            decode_response(b"Parsing").unwrap_err(),
            CgtError::Engine(EngineFailure::Parsing)
        ));
        assert!(matches!(
            decode_response(b"Decoding").unwrap_err(),
            CgtError::Engine(EngineFailure::Decoding)
        ));
    }
}
