use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocalizationError {
    #[error("pixel ({x}, {y}) is outside the {width}x{height} depth raster")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },
    #[error("no finite, positive depth within {radius} px")]
    NoValidDepth { radius: u32 },
    #[error("expected {expected} bound points, got {actual}")]
    InvalidBounds { expected: usize, actual: usize },
    #[error("degenerate slope: horizontal run is zero")]
    DivisionByZero,
    #[error("{0} is not configured for this frame")]
    ConfigurationMissing(&'static str),
    #[error("depth raster is {depth:?} but label raster is {label:?}")]
    DimensionMismatch { depth: (u32, u32), label: (u32, u32) },
    #[error("camera intrinsics are not invertible")]
    SingularIntrinsics,
    #[error("depth sample {index} is not usable: {value}")]
    InvalidDepth { index: usize, value: f32 },
}

pub type Result<T> = std::result::Result<T, LocalizationError>;
