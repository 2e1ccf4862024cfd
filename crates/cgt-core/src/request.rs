//! Game construction requests
//!
//! Requests are version independent. The client checks their structure
//! before any I/O and then encodes them for the session's protocol version.

use crate::error::{CgtError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Row separator in grid text
pub const ROW_SEPARATOR: char = '|';
/// Empty Domineering cell
pub const EMPTY_CELL: char = '.';
/// Filled Domineering cell
pub const FILLED_CELL: char = '#';

/// One request to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Domineering(DomineeringRequest),
    Snort(SnortRequest),
}

impl Request {
    /// Game kind name, as used for the wire tag
    pub fn kind(&self) -> &'static str {
        match self {
            Request::Domineering(_) => "Domineering",
            Request::Snort(_) => "Snort",
        }
    }
}

impl From<DomineeringRequest> for Request {
    fn from(request: DomineeringRequest) -> Self {
        Request::Domineering(request)
    }
}

impl From<SnortRequest> for Request {
    fn from(request: SnortRequest) -> Self {
        Request::Snort(request)
    }
}

/// Domineering position on a rectangular grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomineeringRequest {
    width: u32,
    height: u32,
    grid: String,
}

impl DomineeringRequest {
    /// Position with explicit dimensions.
    ///
    /// `grid` uses `.` for empty and `#` for filled cells, rows separated by `|`.
    pub fn new(width: u32, height: u32, grid: impl Into<String>) -> Self {
        Self {
            width,
            height,
            grid: grid.into(),
        }
    }

    /// Position whose dimensions are implied by the grid text: width is the
    /// length of the first row, height is the number of rows.
    pub fn from_grid(grid: impl Into<String>) -> Self {
        let grid = grid.into();
        let width = grid
            .split(ROW_SEPARATOR)
            .next()
            .map_or(0, |row| row.chars().count()) as u32;
        let height = grid.split(ROW_SEPARATOR).count() as u32;
        Self {
            width,
            height,
            grid,
        }
    }

    /// Position from a row-major occupancy slice, `true` meaning filled
    pub fn from_cells(width: u32, height: u32, cells: &[bool]) -> Result<Self> {
        let expected = width as usize * height as usize;
        if cells.len() != expected {
            return Err(CgtError::Encoding(format!(
                "{} cells given for a {}x{} grid",
                cells.len(),
                width,
                height
            )));
        }

        let grid = if width == 0 {
            String::new()
        } else {
            cells
                .chunks(width as usize)
                .map(|row| {
                    row.iter()
                        .map(|&filled| if filled { FILLED_CELL } else { EMPTY_CELL })
                        .collect::<String>()
                })
                .collect::<Vec<_>>()
                .join("|")
        };
        Ok(Self::new(width, height, grid))
    }

    /// Position with every cell empty
    pub fn empty(width: u32, height: u32) -> Self {
        let row: String = std::iter::repeat_n(EMPTY_CELL, width as usize).collect();
        let grid = vec![row; height as usize].join("|");
        Self::new(width, height, grid)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn grid(&self) -> &str {
        &self.grid
    }

    /// Check that the grid text describes exactly `width * height` cells
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CgtError::Encoding(format!(
                "grid dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }

        let rows: Vec<&str> = self.grid.split(ROW_SEPARATOR).collect();
        if rows.len() != self.height as usize {
            return Err(CgtError::Encoding(format!(
                "grid has {} rows, expected {}",
                rows.len(),
                self.height
            )));
        }

        for (y, row) in rows.iter().enumerate() {
            if let Some(bad) = row.chars().find(|c| *c != EMPTY_CELL && *c != FILLED_CELL) {
                return Err(CgtError::Encoding(format!(
                    "invalid cell '{}' in row {}",
                    bad, y
                )));
            }
            let len = row.chars().count();
            if len != self.width as usize {
                return Err(CgtError::Encoding(format!(
                    "row {} has {} cells, expected {} (grid is not rectangular)",
                    y, len, self.width
                )));
            }
        }

        Ok(())
    }
}

/// Color state of a Snort vertex, tagged 0..4 on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum VertexColor {
    /// Not adjacent to any taken vertex
    #[default]
    Empty = 0,
    /// Adjacent to a blue vertex
    TintBlue = 1,
    /// Adjacent to a red vertex
    TintRed = 2,
    /// Taken by blue
    Blue = 3,
    /// Taken by red
    Red = 4,
}

/// Integer tag outside `0..=4`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidVertexColor(pub u8);

impl fmt::Display for InvalidVertexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid vertex color tag {}", self.0)
    }
}

impl std::error::Error for InvalidVertexColor {}

impl TryFrom<u8> for VertexColor {
    type Error = InvalidVertexColor;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(VertexColor::Empty),
            1 => Ok(VertexColor::TintBlue),
            2 => Ok(VertexColor::TintRed),
            3 => Ok(VertexColor::Blue),
            4 => Ok(VertexColor::Red),
            other => Err(InvalidVertexColor(other)),
        }
    }
}

impl From<VertexColor> for u8 {
    fn from(color: VertexColor) -> Self {
        color as u8
    }
}

/// Initial coloring of Snort vertices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VertexColoring {
    /// Every vertex starts `Empty`
    #[default]
    AllEmpty,
    /// One color per vertex
    Explicit(Vec<VertexColor>),
}

/// Snort position on an undirected graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnortRequest {
    adjacency_matrix: Vec<bool>,
    vertices: VertexColoring,
}

impl SnortRequest {
    /// Position over a row-major `n*n` adjacency matrix, all vertices empty.
    ///
    /// Symmetry of the matrix is not checked.
    pub fn new(adjacency_matrix: Vec<bool>) -> Self {
        Self {
            adjacency_matrix,
            vertices: VertexColoring::AllEmpty,
        }
    }

    /// Build a symmetric adjacency matrix on `n` vertices from an edge list
    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Result<Self> {
        let cells = n.checked_mul(n).ok_or_else(|| {
            CgtError::Encoding(format!("{} vertices do not fit an adjacency matrix", n))
        })?;
        let mut matrix = vec![false; cells];
        for &(u, v) in edges {
            if u >= n || v >= n {
                return Err(CgtError::Encoding(format!(
                    "edge ({}, {}) out of range for {} vertices",
                    u, v, n
                )));
            }
            matrix[u * n + v] = true;
            matrix[v * n + u] = true;
        }
        Ok(Self::new(matrix))
    }

    /// Replace the initial coloring
    pub fn with_vertices(mut self, vertices: Vec<VertexColor>) -> Self {
        self.vertices = VertexColoring::Explicit(vertices);
        self
    }

    pub fn adjacency_matrix(&self) -> &[bool] {
        &self.adjacency_matrix
    }

    pub fn coloring(&self) -> &VertexColoring {
        &self.vertices
    }

    /// Number of vertices, the integer square root of the matrix length
    pub fn vertex_count(&self) -> Result<usize> {
        let len = self.adjacency_matrix.len();
        let n = len.isqrt();
        if n * n != len {
            return Err(CgtError::Encoding(format!(
                "adjacency matrix length {} is not a perfect square",
                len
            )));
        }
        Ok(n)
    }

    /// Per-vertex colors with the default applied
    pub fn vertices(&self) -> Result<Cow<'_, [VertexColor]>> {
        let n = self.vertex_count()?;
        match &self.vertices {
            VertexColoring::AllEmpty => Ok(Cow::Owned(vec![VertexColor::Empty; n])),
            VertexColoring::Explicit(colors) if colors.len() == n => {
                Ok(Cow::Borrowed(colors.as_slice()))
            }
            VertexColoring::Explicit(colors) => Err(CgtError::Encoding(format!(
                "{} vertex colors given for {} vertices",
                colors.len(),
                n
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domineering_validate() {
        assert!(DomineeringRequest::new(2, 3, "..|.#|#.").validate().is_ok());
        assert!(DomineeringRequest::new(3, 1, "#.#").validate().is_ok());

        let err = DomineeringRequest::new(2, 3, "..|.#").validate().unwrap_err();
        assert!(matches!(err, CgtError::Encoding(_)));

        let err = DomineeringRequest::new(2, 2, "..|.").validate().unwrap_err();
        assert!(err.to_string().contains("not rectangular"));

        let err = DomineeringRequest::new(2, 1, ".x").validate().unwrap_err();
        assert!(err.to_string().contains("invalid cell 'x'"));

        assert!(DomineeringRequest::new(0, 0, "").validate().is_err());
    }

    #[test]
    fn test_domineering_from_grid_infers_dimensions() {
        let request = DomineeringRequest::from_grid("..#|.#.|##.");
        assert_eq!(request.width(), 3);
        assert_eq!(request.height(), 3);
        assert!(request.validate().is_ok());

        let ragged = DomineeringRequest::from_grid("...|.");
        assert!(ragged.validate().is_err());
    }

    #[test]
    fn test_domineering_from_cells() {
        let request =
            DomineeringRequest::from_cells(2, 3, &[false, false, false, true, true, false])
                .unwrap();
        assert_eq!(request.grid(), "..|.#|#.");
        assert!(DomineeringRequest::from_cells(2, 2, &[true]).is_err());
    }

    #[test]
    fn test_domineering_empty() {
        let request = DomineeringRequest::empty(3, 2);
        assert_eq!(request.grid(), "...|...");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_vertex_count() {
        assert_eq!(SnortRequest::new(vec![false; 9]).vertex_count().unwrap(), 3);
        assert_eq!(SnortRequest::new(vec![]).vertex_count().unwrap(), 0);
        let err = SnortRequest::new(vec![false; 5]).vertex_count().unwrap_err();
        assert!(matches!(err, CgtError::Encoding(_)));
    }

    #[test]
    fn test_default_vertices_are_empty() {
        let request = SnortRequest::new(vec![false; 16]);
        let vertices = request.vertices().unwrap();
        assert_eq!(vertices.len(), 4);
        assert!(vertices.iter().all(|c| *c == VertexColor::Empty));
    }

    #[test]
    fn test_explicit_vertices_must_match() {
        let request = SnortRequest::new(vec![false; 4]).with_vertices(vec![VertexColor::Red]);
        assert!(request.vertices().is_err());

        let request = SnortRequest::new(vec![false; 4])
            .with_vertices(vec![VertexColor::TintBlue, VertexColor::Empty]);
        assert_eq!(
            request.vertices().unwrap().as_ref(),
            &[VertexColor::TintBlue, VertexColor::Empty]
        );
    }

    #[test]
    fn test_from_edges_is_symmetric() {
        let request = SnortRequest::from_edges(3, &[(1, 2)]).unwrap();
        assert_eq!(
            request.adjacency_matrix(),
            &[false, false, false, false, false, true, false, true, false]
        );
        assert!(SnortRequest::from_edges(2, &[(0, 2)]).is_err());
        assert!(matches!(
            SnortRequest::from_edges(usize::MAX, &[]),
            Err(CgtError::Encoding(_))
        ));
    }

    #[test]
    fn test_vertex_color_tags() {
        assert_eq!(serde_json::to_string(&VertexColor::Red).unwrap(), "4");
        assert_eq!(
            serde_json::from_str::<VertexColor>("1").unwrap(),
            VertexColor::TintBlue
        );
        assert!(serde_json::from_str::<VertexColor>("5").is_err());
        assert_eq!(VertexColor::try_from(7), Err(InvalidVertexColor(7)));
    }
}
