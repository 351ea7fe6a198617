/// Template matching data types
/// Best placement of a template in the search image
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Match {
    /// Top-left X coordinate in the search image
    pub x: u32,
    /// Top-left Y coordinate in the search image
    pub y: u32,
    /// Template width
    pub width: u32,
    /// Template height
    pub height: u32,
    /// Normalized correlation coefficient (-1.0 to 1.0)
    pub correlation: f32,
}

impl Match {
    /// Center of the matched window, rounding down
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }
}

impl std::fmt::Display for Match {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} at ({},{}) - {:.4}",
            self.width, self.height, self.x, self.y, self.correlation
        )
    }
}
